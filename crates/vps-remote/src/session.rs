//! Sesión SSH persistente sobre `ssh2` (libssh2, bloqueante).
//!
//! Una sola sesión autenticada por clave se comparte durante toda la corrida;
//! cada `run` abre un canal exec nuevo sobre esa sesión. La descarga SFTP
//! informa progreso por callback para que la consola pueda pintar porcentajes.

use std::fs::File;
use std::io::{Read, Write};
use std::net::TcpStream;
use std::path::Path;

use ssh2::Session;

use crate::errors::RemoteError;
use crate::executor::{CommandOutput, CommandRunner, FileTransfer};

/// Tamaño de bloque de lectura SFTP. Cada bloque dispara el callback de progreso.
const TRANSFER_CHUNK: usize = 32 * 1024;

pub struct SshSession {
    session: Session,
}

impl SshSession {
    /// Conecta al puerto 22 del host y autentica con clave privada
    /// (passphrase opcional). Cualquier fallo de red o autenticación se
    /// reporta como `ConnectionFailed` con el detalle original.
    pub fn connect(
        host: &str,
        user: &str,
        key_path: &Path,
        passphrase: Option<&str>,
    ) -> Result<Self, RemoteError> {
        let tcp = TcpStream::connect((host, 22))
            .map_err(|e| RemoteError::ConnectionFailed(format!("{host}:22: {e}")))?;
        let mut session = Session::new()
            .map_err(|e| RemoteError::ConnectionFailed(e.to_string()))?;
        session.set_tcp_stream(tcp);
        session
            .handshake()
            .map_err(|e| RemoteError::ConnectionFailed(format!("handshake: {e}")))?;
        session
            .userauth_pubkey_file(user, None, key_path, passphrase)
            .map_err(|e| RemoteError::ConnectionFailed(format!("auth de {user}: {e}")))?;
        Ok(Self { session })
    }
}

impl FileTransfer for SshSession {
    /// Descarga `remote_path` a `local_path` por SFTP, en bloques, invocando
    /// `progress(transferidos, total)` tras cada bloque. Falla con
    /// `TransferFailed` si el archivo remoto no existe o el flujo se corta.
    fn download(
        &self,
        remote_path: &str,
        local_path: &Path,
        progress: &mut dyn FnMut(u64, u64),
    ) -> Result<(), RemoteError> {
        let sftp = self.session.sftp()?;
        let stat = sftp
            .stat(Path::new(remote_path))
            .map_err(|e| RemoteError::TransferFailed(format!("{remote_path}: {e}")))?;
        let total = stat.size.unwrap_or(0);

        let mut remote_file = sftp
            .open(Path::new(remote_path))
            .map_err(|e| RemoteError::TransferFailed(format!("{remote_path}: {e}")))?;
        let mut local_file = File::create(local_path)?;

        let mut transferred: u64 = 0;
        let mut buffer = [0u8; TRANSFER_CHUNK];
        loop {
            let read = remote_file
                .read(&mut buffer)
                .map_err(|e| RemoteError::TransferFailed(format!("lectura interrumpida: {e}")))?;
            if read == 0 {
                break;
            }
            local_file.write_all(&buffer[..read])?;
            transferred += read as u64;
            progress(transferred, total);
        }
        local_file.flush()?;

        if total > 0 && transferred < total {
            return Err(RemoteError::TransferFailed(format!(
                "{remote_path}: transferidos {transferred} de {total} bytes"
            )));
        }
        Ok(())
    }
}

impl CommandRunner for SshSession {
    fn run(&self, command: &str) -> Result<CommandOutput, RemoteError> {
        let mut channel = self.session.channel_session()?;
        channel.exec(command)?;

        let mut stdout = String::new();
        channel.read_to_string(&mut stdout)?;
        let mut stderr = String::new();
        channel.stderr().read_to_string(&mut stderr)?;

        channel.wait_close()?;
        let exit_status = channel.exit_status()?;
        if exit_status != 0 {
            log::debug!("comando remoto con status {exit_status}: {command}");
        }
        Ok(CommandOutput { stdout, stderr, exit_status })
    }
}
