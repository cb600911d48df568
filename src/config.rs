//! Configuración de la consola.
//!
//! Dos fuentes: `config.yaml` (secciones de backup, túnel y VPS) y variables
//! de entorno vía `.env` (credenciales sueltas para las operaciones de base de
//! datos). Ninguna es global: la configuración cargada se pasa explícitamente
//! a quien la necesita.

use std::env;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::errors::ConfigError;

/// Configuración completa leída de `config.yaml`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub vps: VpsConfig,
    pub backup: BackupConfig,
    #[serde(default)]
    pub mysql: Option<MysqlBackupConfig>,
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub ssh_tunnel: Option<TunnelConfig>,
}

/// Datos de conexión al servidor.
#[derive(Debug, Clone, Deserialize)]
pub struct VpsConfig {
    pub ip: String,
    pub user: String,
    pub key_path: String,
    #[serde(default)]
    pub passphrase: Option<String>,
}

/// Qué respaldar y dónde dejarlo localmente.
#[derive(Debug, Clone, Deserialize)]
pub struct BackupConfig {
    pub local_save_path: String,
    pub remote_folders: Vec<String>,
}

/// Respaldo en frío de MySQL (detener servicio, empaquetar datadir).
#[derive(Debug, Clone, Deserialize)]
pub struct MysqlBackupConfig {
    pub enabled: bool,
    #[serde(default)]
    pub backup_name: Option<String>,
    #[serde(default = "default_true")]
    pub restart_after_backup: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub keep_remote_copies: bool,
}

/// Parámetros del túnel SSH local (opción del menú de desarrollo).
#[derive(Debug, Clone, Deserialize)]
pub struct TunnelConfig {
    pub remote_host: String,
    pub remote_port: u16,
    pub username: String,
    pub host: String,
    #[serde(default)]
    pub key_path: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
}

fn default_true() -> bool {
    true
}

impl AppConfig {
    /// Lee y deserializa el YAML. Distingue archivo ausente de YAML inválido.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::Missing(path.to_path_buf()));
        }
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Invalid(format!("{}: {e}", path.display())))?;
        serde_yaml::from_str(&raw).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Verifica que los campos obligatorios no estén vacíos y que la clave
    /// privada exista en disco. Primer problema encontrado aborta.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.vps.ip.trim().is_empty() {
            return Err(ConfigError::Invalid("vps.ip está vacío".into()));
        }
        if self.vps.user.trim().is_empty() {
            return Err(ConfigError::Invalid("vps.user está vacío".into()));
        }
        if self.vps.key_path.trim().is_empty() {
            return Err(ConfigError::Invalid("vps.key_path está vacío".into()));
        }
        if !Path::new(&self.vps.key_path).exists() {
            return Err(ConfigError::Invalid(format!(
                "la clave privada no existe: {}",
                self.vps.key_path
            )));
        }
        if self.backup.local_save_path.trim().is_empty() {
            return Err(ConfigError::Invalid("backup.local_save_path está vacío".into()));
        }
        if self.backup.remote_folders.is_empty() {
            return Err(ConfigError::Invalid("backup.remote_folders no tiene entradas".into()));
        }
        if self.backup.remote_folders.iter().any(|f| f.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "backup.remote_folders contiene una ruta vacía".into(),
            ));
        }
        Ok(())
    }
}

/// Credenciales SSH tomadas del entorno (`.env`), la fuente alternativa al
/// YAML para las operaciones de base de datos.
#[derive(Debug, Clone)]
pub struct VpsEnvCredentials {
    pub ip: String,
    pub username: String,
    pub private_key: PathBuf,
    pub passphrase: Option<String>,
}

impl VpsEnvCredentials {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let required = |name: &str| {
            env::var(name).map_err(|_| ConfigError::MissingEnv(name.to_string()))
        };
        Ok(Self {
            ip: required("VPS_IP")?,
            username: required("VPS_USERNAME")?,
            private_key: PathBuf::from(required("PRIVATE_KEY")?),
            passphrase: env::var("PASSPHRASE").ok().filter(|p| !p.is_empty()),
        })
    }
}
