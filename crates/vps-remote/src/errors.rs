//! Errores de la capa remota.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("conexión SSH fallida: {0}")]
    ConnectionFailed(String),
    #[error("comando remoto falló (status {exit_status}): {stderr}")]
    CommandFailed { exit_status: i32, stderr: String },
    #[error("transferencia fallida: {0}")]
    TransferFailed(String),
    #[error("error de IO: {0}")]
    Io(#[from] std::io::Error),
    #[error("error SSH: {0}")]
    Ssh(#[from] ssh2::Error),
}
