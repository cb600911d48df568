//! Runner guionado para tests: registra cada comando recibido y responde
//! desde una cola FIFO de salidas preparadas. Cuando la cola se agota,
//! responde éxito con stdout vacío.

use std::cell::RefCell;
use std::collections::VecDeque;

use crate::errors::RemoteError;
use crate::executor::{CommandOutput, CommandRunner, FileTransfer};

#[derive(Default)]
pub struct ScriptedRunner {
    commands: RefCell<Vec<String>>,
    responses: RefCell<VecDeque<CommandOutput>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encola una respuesta exitosa (status 0) con el stdout dado.
    pub fn push_ok(&self, stdout: &str) {
        self.responses.borrow_mut().push_back(CommandOutput {
            stdout: stdout.to_string(),
            stderr: String::new(),
            exit_status: 0,
        });
    }

    /// Encola una respuesta fallida (status 1) con el stderr dado.
    pub fn push_failure(&self, stderr: &str) {
        self.responses.borrow_mut().push_back(CommandOutput {
            stdout: String::new(),
            stderr: stderr.to_string(),
            exit_status: 1,
        });
    }

    /// Comandos recibidos hasta ahora, en orden.
    pub fn commands(&self) -> Vec<String> {
        self.commands.borrow().clone()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, command: &str) -> Result<CommandOutput, RemoteError> {
        self.commands.borrow_mut().push(command.to_string());
        Ok(self.responses.borrow_mut().pop_front().unwrap_or(CommandOutput {
            stdout: String::new(),
            stderr: String::new(),
            exit_status: 0,
        }))
    }
}

impl FileTransfer for ScriptedRunner {
    /// Descarga simulada: escribe un archivo local mínimo y reporta progreso
    /// completo en un solo callback.
    fn download(
        &self,
        remote_path: &str,
        local_path: &std::path::Path,
        progress: &mut dyn FnMut(u64, u64),
    ) -> Result<(), RemoteError> {
        self.commands.borrow_mut().push(format!("<download> {remote_path}"));
        std::fs::write(local_path, b"contenido simulado")?;
        progress(18, 18);
        Ok(())
    }
}
