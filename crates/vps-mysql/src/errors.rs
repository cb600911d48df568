//! Errores del adaptador SQL y del esquema (taxonomía de la capa MySQL).

use std::path::PathBuf;

use thiserror::Error;
use vps_remote::RemoteError;

#[derive(Debug, Error)]
pub enum SqlError {
    #[error("consulta falló (status {exit_status}): {stderr}")]
    QueryFailed { exit_status: i32, stderr: String },
    #[error("variable de entorno faltante: {0}")]
    MissingEnv(String),
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("archivo de esquema no encontrado: {}", .0.display())]
    NotFound(PathBuf),
    #[error("error al parsear JSON de esquema: {0}")]
    Parse(String),
    #[error("esquema malformado: {0}")]
    Malformed(String),
    #[error("sentencia falló: {statement} ({detail})")]
    Statement { statement: String, detail: String },
    #[error("extracción falló en consulta [{context}]: {detail}")]
    Extraction { context: String, detail: String },
    #[error("error de IO: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Sql(#[from] SqlError),
}
