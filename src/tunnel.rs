//! Túnel SSH local para conectar herramientas de escritorio al MySQL remoto.
//!
//! El túnel es un proceso `ssh -L` hijo de la consola. Se consulta su estado
//! con `try_wait`, se cierra de forma explícita desde el menú y, como red de
//! seguridad, también al soltar el manejador.

use std::process::{Child, Command, Stdio};

use crate::config::TunnelConfig;
use crate::errors::AppError;

/// Puerto local por defecto cuando el usuario no escribe ninguno.
pub const DEFAULT_LOCAL_PORT: u16 = 3307;

/// Interpreta la entrada del usuario: vacío usa el puerto por defecto; un
/// número fuera de 1024..=65535 o no numérico se rechaza.
pub fn validate_port(input: &str) -> Result<u16, String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(DEFAULT_LOCAL_PORT);
    }
    let port: u16 = trimmed
        .parse()
        .map_err(|_| format!("'{trimmed}' no es un número de puerto"))?;
    if port < 1024 {
        return Err(format!("el puerto {port} está reservado; use 1024-65535"));
    }
    Ok(port)
}

/// Arma la línea de comando `ssh -L` a partir de la configuración.
pub fn assemble_command(config: &TunnelConfig, local_port: u16) -> Vec<String> {
    let mut args = vec![
        "ssh".to_string(),
        "-L".to_string(),
        format!(
            "{local_port}:{}:{}",
            config.remote_host, config.remote_port
        ),
        format!("{}@{}", config.username, config.host),
        "-N".to_string(),
    ];
    if let Some(key) = &config.key_path {
        args.push("-i".to_string());
        args.push(key.clone());
    }
    if let Some(port) = config.port {
        args.push("-p".to_string());
        args.push(port.to_string());
    }
    args
}

pub enum TunnelStatus {
    Running { local_port: u16 },
    Exited { code: Option<i32> },
    NotStarted,
}

#[derive(Default)]
pub struct TunnelManager {
    child: Option<Child>,
    local_port: u16,
}

impl TunnelManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lanza el proceso del túnel. Un túnel previo aún vivo se cierra antes.
    pub fn open(&mut self, config: &TunnelConfig, local_port: u16) -> Result<(), AppError> {
        self.close();
        let args = assemble_command(config, local_port);
        let child = Command::new(&args[0])
            .args(&args[1..])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        log::info!("túnel abierto: {}", args.join(" "));
        self.child = Some(child);
        self.local_port = local_port;
        Ok(())
    }

    pub fn status(&mut self) -> TunnelStatus {
        match self.child.as_mut() {
            None => TunnelStatus::NotStarted,
            Some(child) => match child.try_wait() {
                Ok(None) => TunnelStatus::Running { local_port: self.local_port },
                Ok(Some(status)) => TunnelStatus::Exited { code: status.code() },
                Err(_) => TunnelStatus::Exited { code: None },
            },
        }
    }

    /// Termina el proceso si sigue vivo. Silencioso si ya había salido.
    pub fn close(&mut self) {
        if let Some(mut child) = self.child.take() {
            if matches!(child.try_wait(), Ok(None)) {
                if let Err(e) = child.kill() {
                    log::warn!("no se pudo terminar el túnel: {e}");
                }
            }
            let _ = child.wait();
        }
    }
}

impl Drop for TunnelManager {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> TunnelConfig {
        TunnelConfig {
            remote_host: "127.0.0.1".into(),
            remote_port: 3306,
            username: "deploy".into(),
            host: "203.0.113.7".into(),
            key_path: None,
            port: None,
        }
    }

    #[test]
    fn arma_el_comando_minimo() {
        let args = assemble_command(&config(), 3307);
        assert_eq!(
            args,
            vec!["ssh", "-L", "3307:127.0.0.1:3306", "deploy@203.0.113.7", "-N"]
        );
    }

    #[test]
    fn agrega_clave_y_puerto_cuando_estan_configurados() {
        let mut config = config();
        config.key_path = Some("/home/deploy/.ssh/id_ed25519".into());
        config.port = Some(2222);
        let args = assemble_command(&config, 3310);
        assert_eq!(
            args,
            vec![
                "ssh",
                "-L",
                "3310:127.0.0.1:3306",
                "deploy@203.0.113.7",
                "-N",
                "-i",
                "/home/deploy/.ssh/id_ed25519",
                "-p",
                "2222",
            ]
        );
    }

    #[test]
    fn puerto_vacio_usa_el_default() {
        assert_eq!(validate_port(""), Ok(DEFAULT_LOCAL_PORT));
        assert_eq!(validate_port("  "), Ok(DEFAULT_LOCAL_PORT));
    }

    #[test]
    fn puertos_invalidos_se_rechazan() {
        assert!(validate_port("abc").is_err());
        assert!(validate_port("80").is_err());
        assert!(validate_port("70000").is_err());
        assert_eq!(validate_port("3307"), Ok(3307));
        assert_eq!(validate_port("65535"), Ok(65535));
    }

    #[test]
    fn status_sin_tunel_es_not_started() {
        let mut manager = TunnelManager::new();
        assert!(matches!(manager.status(), TunnelStatus::NotStarted));
        manager.close();
    }
}
