//! Errores de la capa de aplicación.
//!
//! Cada crate inferior define su propio enum; aquí se agregan todos bajo
//! `AppError` para que los menús puedan imprimir cualquier fallo y volver
//! al prompt sin distinguir su origen.

use std::path::PathBuf;

use thiserror::Error;

/// Fallos al cargar o validar `config.yaml` y las variables de entorno.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("archivo de configuración no encontrado: {0}")]
    Missing(PathBuf),

    #[error("configuración inválida: {0}")]
    Invalid(String),

    #[error("variable de entorno requerida ausente: {0}")]
    MissingEnv(String),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Remote(#[from] vps_remote::RemoteError),

    #[error(transparent)]
    Sql(#[from] vps_mysql::SqlError),

    #[error(transparent)]
    Schema(#[from] vps_mysql::SchemaError),

    #[error("error de E/S: {0}")]
    Io(#[from] std::io::Error),

    #[error("error de archivo zip: {0}")]
    Zip(#[from] zip::result::ZipError),
}
