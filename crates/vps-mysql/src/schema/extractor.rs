//! Extracción inversa: reconstruye un documento de esquema consultando
//! `information_schema` y lo escribe con la misma forma JSON que consume el
//! aprovisionador. Cualquier consulta de metadatos que falle aborta la
//! extracción con su contexto; nunca se escriben archivos parciales.

use std::path::{Path, PathBuf};

use crate::errors::{SchemaError, SqlError};
use crate::schema::model::{Column, IndexSpec, SchemaDocument, Table};
use crate::sql_session::{Row, SqlSession};

/// Esquemas del sistema excluidos del listado seleccionable.
const SYSTEM_SCHEMAS: [&str; 4] =
    ["information_schema", "performance_schema", "mysql", "sys"];

pub struct SchemaExtractor<'a, 'r> {
    session: &'a SqlSession<'r>,
}

fn field<'a>(row: &'a Row, name: &str) -> Option<&'a str> {
    row.get(name).and_then(|v| v.as_deref())
}

fn query_context(context: &str, error: SqlError) -> SchemaError {
    SchemaError::Extraction { context: context.to_string(), detail: error.to_string() }
}

impl<'a, 'r> SchemaExtractor<'a, 'r> {
    pub fn new(session: &'a SqlSession<'r>) -> Self {
        Self { session }
    }

    /// Lista las bases seleccionables, excluyendo los esquemas del sistema.
    pub fn list_databases(&self) -> Result<Vec<String>, SchemaError> {
        let excluded: Vec<String> =
            SYSTEM_SCHEMAS.iter().map(|s| format!("'{s}'")).collect();
        let query = format!(
            "SELECT schema_name AS schema_name FROM information_schema.schemata \
             WHERE schema_name NOT IN ({}) ORDER BY schema_name;",
            excluded.join(", ")
        );
        let rows = self
            .session
            .execute_with_results(&query, None)
            .map_err(|e| query_context("schemata", e))?;
        Ok(rows
            .iter()
            .filter_map(|row| field(row, "schema_name").map(str::to_string))
            .collect())
    }

    /// Reconstruye el documento completo de una base: tablas, columnas y
    /// los índices secundarios (los PRIMARY viven en las constraints de
    /// columna).
    pub fn extract(&self, database: &str) -> Result<SchemaDocument, SchemaError> {
        let tables_query = format!(
            "SELECT table_name AS table_name FROM information_schema.tables \
             WHERE table_schema = '{database}' AND table_type = 'BASE TABLE' \
             ORDER BY table_name;"
        );
        let table_rows = self
            .session
            .execute_with_results(&tables_query, None)
            .map_err(|e| query_context("tables", e))?;

        let mut tables = Vec::new();
        for row in &table_rows {
            let table_name = field(row, "table_name").ok_or_else(|| SchemaError::Extraction {
                context: "tables".into(),
                detail: "fila sin table_name".into(),
            })?;
            tables.push(Table {
                name: table_name.to_string(),
                columns: self.extract_columns(database, table_name)?,
            });
        }

        Ok(SchemaDocument {
            database_name: database.to_string(),
            tables,
            indexes: self.extract_indexes(database)?,
        })
    }

    fn extract_columns(&self, database: &str, table: &str) -> Result<Vec<Column>, SchemaError> {
        let query = format!(
            "SELECT column_name AS column_name, column_type AS column_type, \
             is_nullable AS is_nullable, column_key AS column_key, \
             extra AS extra, column_default AS column_default \
             FROM information_schema.columns \
             WHERE table_schema = '{database}' AND table_name = '{table}' \
             ORDER BY ordinal_position;"
        );
        let rows = self
            .session
            .execute_with_results(&query, None)
            .map_err(|e| query_context(&format!("columns de {table}"), e))?;

        let mut columns = Vec::new();
        for row in &rows {
            let name = field(row, "column_name").ok_or_else(|| SchemaError::Extraction {
                context: format!("columns de {table}"),
                detail: "fila sin column_name".into(),
            })?;
            let sql_type = field(row, "column_type").unwrap_or("TEXT");
            columns.push(Column {
                name: name.to_string(),
                sql_type: sql_type.to_string(),
                constraints: reconstruct_constraints(row),
            });
        }
        Ok(columns)
    }

    fn extract_indexes(&self, database: &str) -> Result<Vec<IndexSpec>, SchemaError> {
        let query = format!(
            "SELECT table_name AS table_name, index_name AS index_name, \
             column_name AS column_name \
             FROM information_schema.statistics \
             WHERE table_schema = '{database}' AND index_name <> 'PRIMARY' \
             ORDER BY table_name, index_name, seq_in_index;"
        );
        let rows = self
            .session
            .execute_with_results(&query, None)
            .map_err(|e| query_context("statistics", e))?;

        let mut indexes: Vec<IndexSpec> = Vec::new();
        for row in &rows {
            let (Some(table), Some(index), Some(column)) = (
                field(row, "table_name"),
                field(row, "index_name"),
                field(row, "column_name"),
            ) else {
                continue;
            };
            match indexes
                .last_mut()
                .filter(|i| i.name == index && i.table == table)
            {
                Some(existing) => existing.columns.push(column.to_string()),
                None => indexes.push(IndexSpec {
                    name: index.to_string(),
                    table: table.to_string(),
                    columns: vec![column.to_string()],
                }),
            }
        }
        Ok(indexes)
    }

    /// Extrae y escribe bajo `output_dir`. Sin nombre explícito, el archivo se
    /// autonombre `{base}_{timestamp}.json`; con nombre, se añade `.json` si
    /// falta. El documento se extrae completo antes de escribir.
    pub fn extract_to_file(
        &self,
        database: &str,
        custom_name: Option<&str>,
        output_dir: &Path,
    ) -> Result<PathBuf, SchemaError> {
        let document = self.extract(database)?;

        let file_name = match custom_name {
            Some(name) if name.ends_with(".json") => name.to_string(),
            Some(name) => format!("{name}.json"),
            None => {
                let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
                format!("{database}_{timestamp}.json")
            }
        };
        std::fs::create_dir_all(output_dir)?;
        let path = output_dir.join(file_name);
        document.write_to_file(&path)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql_session::MysqlCredentials;
    use vps_remote::testing::ScriptedRunner;

    fn credentials() -> MysqlCredentials {
        MysqlCredentials { user: "ops".into(), password: "pw".into(), host: "localhost".into() }
    }

    #[test]
    fn list_databases_excluye_esquemas_del_sistema() {
        let runner = ScriptedRunner::new();
        runner.push_ok("schema_name\ninventario\nventas\n");
        let session = SqlSession::new(&runner, credentials());
        let extractor = SchemaExtractor::new(&session);

        let databases = extractor.list_databases().unwrap();
        assert_eq!(databases, vec!["inventario".to_string(), "ventas".to_string()]);
        let command = &runner.commands()[0];
        assert!(command.contains("NOT IN"));
        assert!(command.contains("'performance_schema'"));
    }

    #[test]
    fn extract_reconstruye_el_documento() {
        let runner = ScriptedRunner::new();
        // tablas
        runner.push_ok("table_name\nitems\n");
        // columnas de items
        runner.push_ok(
            "column_name\tcolumn_type\tis_nullable\tcolumn_key\textra\tcolumn_default\n\
             id\tint\tNO\tPRI\tauto_increment\t\\N\n\
             nombre\tvarchar(100)\tYES\t\t\t\\N\n",
        );
        // índices secundarios
        runner.push_ok(
            "table_name\tindex_name\tcolumn_name\nitems\tidx_nombre\tnombre\n",
        );
        let session = SqlSession::new(&runner, credentials());
        let extractor = SchemaExtractor::new(&session);

        let doc = extractor.extract("inventario").unwrap();
        assert_eq!(doc.database_name, "inventario");
        assert_eq!(doc.tables.len(), 1);
        let items = &doc.tables[0];
        assert_eq!(items.name, "items");
        assert_eq!(items.columns[0].sql_type, "int");
        assert!(items.columns[0].constraints.contains(&"NOT NULL".to_string()));
        assert!(items.columns[0].constraints.contains(&"AUTO_INCREMENT".to_string()));
        assert!(items.columns[0].constraints.contains(&"PRIMARY KEY".to_string()));
        assert!(items.columns[1].constraints.is_empty());
        assert_eq!(doc.indexes.len(), 1);
        assert_eq!(doc.indexes[0].name, "idx_nombre");
        assert_eq!(doc.indexes[0].columns, vec!["nombre".to_string()]);
    }

    #[test]
    fn fallo_de_consulta_aborta_con_contexto() {
        let runner = ScriptedRunner::new();
        runner.push_failure("ERROR 1044: acceso denegado");
        let session = SqlSession::new(&runner, credentials());
        let extractor = SchemaExtractor::new(&session);

        let err = extractor.extract("inventario").unwrap_err();
        assert!(matches!(err, SchemaError::Extraction { ref context, .. } if context == "tables"));
    }

    #[test]
    fn extract_to_file_autonombra_y_escribe() {
        let runner = ScriptedRunner::new();
        runner.push_ok("table_name\n");
        runner.push_ok("table_name\tindex_name\tcolumn_name\n");
        let session = SqlSession::new(&runner, credentials());
        let extractor = SchemaExtractor::new(&session);

        let dir = tempfile::tempdir().unwrap();
        let path = extractor.extract_to_file("ventas", None, dir.path()).unwrap();
        let file_name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(file_name.starts_with("ventas_"));
        assert!(file_name.ends_with(".json"));

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["database_name"], "ventas");
    }
}

/// Reconstruye la lista de constraints libres de una columna a partir de los
/// metadatos de `information_schema.columns`.
fn reconstruct_constraints(row: &Row) -> Vec<String> {
    let mut constraints = Vec::new();
    if field(row, "is_nullable") == Some("NO") {
        constraints.push("NOT NULL".to_string());
    }
    if field(row, "extra").is_some_and(|e| e.contains("auto_increment")) {
        constraints.push("AUTO_INCREMENT".to_string());
    }
    if field(row, "column_key") == Some("PRI") {
        constraints.push("PRIMARY KEY".to_string());
    }
    if let Some(default) = field(row, "column_default") {
        if !default.eq_ignore_ascii_case("null") {
            constraints.push(format!("DEFAULT {}", render_default(default)));
        }
    }
    constraints
}

/// Los defaults numéricos y las expresiones conocidas van crudos; el resto se
/// cita como literal de cadena.
fn render_default(default: &str) -> String {
    let is_numeric = default.parse::<f64>().is_ok();
    let is_expression = default.eq_ignore_ascii_case("current_timestamp")
        || default.to_uppercase().starts_with("CURRENT_TIMESTAMP(");
    if is_numeric || is_expression {
        default.to_string()
    } else {
        format!("'{}'", default.replace('\'', "''"))
    }
}
