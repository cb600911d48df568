//! Documento de esquema (JSON) y su validación estructural/semántica.
//!
//! El documento es inmutable una vez cargado para una corrida de
//! aprovisionamiento: se lee una vez, se valida todo-o-nada (la primera
//! violación aborta con el fragmento ofensivo) y se consume para producir la
//! lista ordenada de sentencias.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::SchemaError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaDocument {
    pub database_name: String,
    pub tables: Vec<Table>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub indexes: Vec<IndexSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    /// Token de tipo SQL crudo (`INT`, `VARCHAR(255)`, ...). No se valida
    /// sintácticamente: un fragmento inválido sólo aflora al ejecutarse.
    #[serde(rename = "type")]
    pub sql_type: String,
    /// Lista libre anexada textualmente tras el tipo (`NOT NULL`, ...).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexSpec {
    pub name: String,
    pub table: String,
    pub columns: Vec<String>,
}

/// Recorta un fragmento JSON para mensajes de error legibles.
fn fragment(value: &Value) -> String {
    let text = value.to_string();
    if text.len() > 120 {
        format!("{}...", &text[..120])
    } else {
        text
    }
}

/// Validación estructural sobre el JSON crudo: claves requeridas presentes
/// con el tipo esperado. Distingue cada violación (documento sin `tables`,
/// tabla sin `columns`, columna sin `type`, ...) con su fragmento.
fn validate_structure(value: &Value) -> Result<(), SchemaError> {
    let root = value
        .as_object()
        .ok_or_else(|| SchemaError::Malformed("el documento no es un objeto JSON".into()))?;

    match root.get("database_name") {
        Some(Value::String(name)) if !name.is_empty() => {}
        _ => {
            return Err(SchemaError::Malformed(
                "clave requerida 'database_name' ausente o vacía".into(),
            ))
        }
    }

    let tables = match root.get("tables") {
        Some(Value::Array(tables)) => tables,
        _ => return Err(SchemaError::Malformed("clave requerida 'tables' ausente".into())),
    };

    for table in tables {
        let obj = table
            .as_object()
            .ok_or_else(|| SchemaError::Malformed(format!("tabla malformada: {}", fragment(table))))?;
        if !matches!(obj.get("name"), Some(Value::String(n)) if !n.is_empty()) {
            return Err(SchemaError::Malformed(format!(
                "tabla sin 'name': {}",
                fragment(table)
            )));
        }
        let columns = match obj.get("columns") {
            Some(Value::Array(columns)) => columns,
            _ => {
                return Err(SchemaError::Malformed(format!(
                    "tabla sin 'columns': {}",
                    fragment(table)
                )))
            }
        };
        for column in columns {
            let col = column.as_object().ok_or_else(|| {
                SchemaError::Malformed(format!("columna malformada: {}", fragment(column)))
            })?;
            if !matches!(col.get("name"), Some(Value::String(n)) if !n.is_empty()) {
                return Err(SchemaError::Malformed(format!(
                    "columna sin 'name': {}",
                    fragment(column)
                )));
            }
            if !matches!(col.get("type"), Some(Value::String(t)) if !t.is_empty()) {
                return Err(SchemaError::Malformed(format!(
                    "columna sin 'type': {}",
                    fragment(column)
                )));
            }
        }
    }
    Ok(())
}

/// Los identificadores van entre backticks sin más escape, así que un nombre
/// con backtick o `;` podría romper la sentencia. Se rechaza al validar en
/// lugar de heredar esa frontera de confianza.
fn check_identifier(kind: &str, name: &str) -> Result<(), SchemaError> {
    if name.contains('`') || name.contains(';') {
        return Err(SchemaError::Malformed(format!(
            "{kind} '{name}' contiene caracteres prohibidos (backtick o ';')"
        )));
    }
    Ok(())
}

impl SchemaDocument {
    /// Lee y valida estructuralmente un documento desde disco.
    pub fn from_file(path: &Path) -> Result<Self, SchemaError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SchemaError::NotFound(path.to_path_buf())
            } else {
                SchemaError::Io(e)
            }
        })?;
        let value: Value =
            serde_json::from_str(&raw).map_err(|e| SchemaError::Parse(e.to_string()))?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, SchemaError> {
        validate_structure(&value)?;
        serde_json::from_value(value).map_err(|e| SchemaError::Parse(e.to_string()))
    }

    /// Validación semántica: identificadores sanos y tablas sin duplicar.
    /// Todo-o-nada; la primera violación aborta.
    pub fn validate(&self) -> Result<(), SchemaError> {
        check_identifier("base de datos", &self.database_name)?;

        let mut seen = HashSet::new();
        for table in &self.tables {
            check_identifier("tabla", &table.name)?;
            if !seen.insert(table.name.as_str()) {
                return Err(SchemaError::Malformed(format!(
                    "tabla duplicada: '{}'",
                    table.name
                )));
            }
            for column in &table.columns {
                check_identifier("columna", &column.name)?;
            }
        }
        for index in &self.indexes {
            check_identifier("índice", &index.name)?;
            check_identifier("tabla", &index.table)?;
            for column in &index.columns {
                check_identifier("columna", column)?;
            }
        }
        Ok(())
    }

    /// Escribe el documento como JSON legible. Se serializa en memoria antes
    /// de tocar disco para no dejar archivos parciales.
    pub fn write_to_file(&self, path: &Path) -> Result<(), SchemaError> {
        let pretty =
            serde_json::to_string_pretty(self).map_err(|e| SchemaError::Parse(e.to_string()))?;
        std::fs::write(path, pretty)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc_minimo() -> Value {
        json!({
            "database_name": "inventario",
            "tables": [
                { "name": "items", "columns": [
                    { "name": "id", "type": "INT", "constraints": ["NOT NULL", "AUTO_INCREMENT"] },
                    { "name": "nombre", "type": "VARCHAR(100)" }
                ]}
            ]
        })
    }

    #[test]
    fn documento_valido_carga() {
        let doc = SchemaDocument::from_value(doc_minimo()).unwrap();
        assert_eq!(doc.database_name, "inventario");
        assert_eq!(doc.tables.len(), 1);
        assert_eq!(doc.tables[0].columns[0].sql_type, "INT");
        assert!(doc.indexes.is_empty());
        doc.validate().unwrap();
    }

    #[test]
    fn rechaza_documento_sin_tables() {
        let err = SchemaDocument::from_value(json!({ "database_name": "x" })).unwrap_err();
        assert!(matches!(err, SchemaError::Malformed(ref m) if m.contains("'tables'")));
    }

    #[test]
    fn rechaza_tabla_sin_columns() {
        let err = SchemaDocument::from_value(json!({
            "database_name": "x",
            "tables": [{ "name": "t" }]
        }))
        .unwrap_err();
        assert!(matches!(err, SchemaError::Malformed(ref m) if m.contains("'columns'")));
    }

    #[test]
    fn rechaza_columna_sin_type() {
        let err = SchemaDocument::from_value(json!({
            "database_name": "x",
            "tables": [{ "name": "t", "columns": [{ "name": "c" }] }]
        }))
        .unwrap_err();
        assert!(matches!(err, SchemaError::Malformed(ref m) if m.contains("'type'")));
    }

    #[test]
    fn rechaza_tablas_duplicadas() {
        let doc = SchemaDocument::from_value(json!({
            "database_name": "x",
            "tables": [
                { "name": "t", "columns": [{ "name": "c", "type": "INT" }] },
                { "name": "t", "columns": [{ "name": "d", "type": "INT" }] }
            ]
        }))
        .unwrap();
        let err = doc.validate().unwrap_err();
        assert!(matches!(err, SchemaError::Malformed(ref m) if m.contains("duplicada")));
    }

    #[test]
    fn rechaza_identificadores_con_backtick() {
        let doc = SchemaDocument::from_value(json!({
            "database_name": "x",
            "tables": [{ "name": "mala`tabla", "columns": [{ "name": "c", "type": "INT" }] }]
        }))
        .unwrap();
        assert!(doc.validate().is_err());
    }

    #[test]
    fn from_file_distingue_no_encontrado_de_parseo() {
        let missing = SchemaDocument::from_file(Path::new("/no/existe/esquema.json")).unwrap_err();
        assert!(matches!(missing, SchemaError::NotFound(_)));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roto.json");
        std::fs::write(&path, "{ esto no es json").unwrap();
        let parse = SchemaDocument::from_file(&path).unwrap_err();
        assert!(matches!(parse, SchemaError::Parse(_)));
    }
}
