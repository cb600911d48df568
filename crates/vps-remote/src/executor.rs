//! Contrato de ejecución remota.
//!
//! `CommandRunner` es el único punto por el que los componentes superiores
//! tocan el servidor. El status de salida distinto de cero NO es un error en
//! esta capa: la política de fallo pertenece a quien llama.

use crate::errors::RemoteError;

/// Captura completa de un comando remoto ya terminado.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_status: i32,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_status == 0
    }
}

/// Ejecuta un comando shell en el host remoto y bloquea hasta que termina.
pub trait CommandRunner {
    fn run(&self, command: &str) -> Result<CommandOutput, RemoteError>;
}

/// Descarga de archivos remotos con callback de progreso
/// `(bytes transferidos, bytes totales)`.
pub trait FileTransfer {
    fn download(
        &self,
        remote_path: &str,
        local_path: &std::path::Path,
        progress: &mut dyn FnMut(u64, u64),
    ) -> Result<(), RemoteError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_refleja_exit_status() {
        let ok = CommandOutput { stdout: "x".into(), stderr: String::new(), exit_status: 0 };
        let bad = CommandOutput { stdout: String::new(), stderr: "boom".into(), exit_status: 2 };
        assert!(ok.success());
        assert!(!bad.success());
    }
}
