//! Generación de DDL ordenado a partir del documento de esquema.
//!
//! Los pasos opcionales (el DROP de un índice que quizá no existe todavía) se
//! modelan con un descriptor explícito `PlannedStatement { sql, descripción,
//! política }` consumido por un único runner genérico, en lugar de flags
//! sueltos en cada punto de llamada.

use crate::schema::model::SchemaDocument;

/// Qué hacer cuando una sentencia planificada falla.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// El fallo aborta toda la corrida.
    Abort,
    /// El fallo se registra como warning y la corrida continúa.
    WarnAndContinue,
}

#[derive(Debug, Clone)]
pub struct PlannedStatement {
    pub sql: String,
    pub description: String,
    pub policy: FailurePolicy,
}

impl SchemaDocument {
    /// Exactamente una sentencia `CREATE TABLE IF NOT EXISTS` por tabla, en
    /// orden de documento, con cada columna como `` `nombre` tipo constraints ``.
    pub fn create_tables_sql(&self) -> Vec<String> {
        self.tables
            .iter()
            .map(|table| {
                let columns: Vec<String> = table
                    .columns
                    .iter()
                    .map(|column| {
                        let mut definition = format!("`{}` {}", column.name, column.sql_type);
                        if !column.constraints.is_empty() {
                            definition.push(' ');
                            definition.push_str(&column.constraints.join(" "));
                        }
                        definition
                    })
                    .collect();
                format!(
                    "CREATE TABLE IF NOT EXISTS `{}` ({});",
                    table.name,
                    columns.join(", ")
                )
            })
            .collect()
    }

    /// Por cada índice, el par drop-opcional seguido de create-obligatorio.
    /// El drop puede fallar sin problema porque el índice puede no existir.
    pub fn create_indexes_sql(&self) -> Vec<PlannedStatement> {
        let mut statements = Vec::new();
        for index in &self.indexes {
            let columns: Vec<String> =
                index.columns.iter().map(|c| format!("`{c}`")).collect();
            statements.push(PlannedStatement {
                sql: format!("DROP INDEX `{}` ON `{}`;", index.name, index.table),
                description: format!("Eliminando índice existente {}", index.name),
                policy: FailurePolicy::WarnAndContinue,
            });
            statements.push(PlannedStatement {
                sql: format!(
                    "CREATE INDEX `{}` ON `{}` ({});",
                    index.name,
                    index.table,
                    columns.join(", ")
                ),
                description: format!("Creando índice {}", index.name),
                policy: FailurePolicy::Abort,
            });
        }
        statements
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::model::{Column, IndexSpec, Table};

    fn columna(name: &str, sql_type: &str, constraints: &[&str]) -> Column {
        Column {
            name: name.into(),
            sql_type: sql_type.into(),
            constraints: constraints.iter().map(|c| c.to_string()).collect(),
        }
    }

    fn documento() -> SchemaDocument {
        SchemaDocument {
            database_name: "inventario".into(),
            tables: vec![
                Table {
                    name: "items".into(),
                    columns: vec![
                        columna("id", "INT", &["NOT NULL", "AUTO_INCREMENT", "PRIMARY KEY"]),
                        columna("nombre", "VARCHAR(100)", &[]),
                    ],
                },
                Table {
                    name: "movimientos".into(),
                    columns: vec![columna("item_id", "INT", &["NOT NULL"])],
                },
            ],
            indexes: vec![IndexSpec {
                name: "idx_items_nombre".into(),
                table: "items".into(),
                columns: vec!["nombre".into()],
            }],
        }
    }

    #[test]
    fn una_sentencia_por_tabla_en_orden() {
        let sql = documento().create_tables_sql();
        assert_eq!(sql.len(), 2);
        assert!(sql[0].starts_with("CREATE TABLE IF NOT EXISTS `items`"));
        assert!(sql[0].contains("`id` INT NOT NULL AUTO_INCREMENT PRIMARY KEY"));
        assert!(sql[0].contains("`nombre` VARCHAR(100)"));
        assert!(sql[1].starts_with("CREATE TABLE IF NOT EXISTS `movimientos`"));
        assert!(sql[1].contains("`item_id` INT NOT NULL"));
    }

    #[test]
    fn sin_indices_devuelve_secuencia_vacia() {
        let mut doc = documento();
        doc.indexes.clear();
        assert!(doc.create_indexes_sql().is_empty());
    }

    #[test]
    fn par_drop_opcional_luego_create_obligatorio() {
        let statements = documento().create_indexes_sql();
        assert_eq!(statements.len(), 2);
        assert!(statements[0].sql.starts_with("DROP INDEX `idx_items_nombre` ON `items`"));
        assert_eq!(statements[0].policy, FailurePolicy::WarnAndContinue);
        assert!(statements[1]
            .sql
            .starts_with("CREATE INDEX `idx_items_nombre` ON `items` (`nombre`)"));
        assert_eq!(statements[1].policy, FailurePolicy::Abort);
    }
}
