//! Menú de respaldos. Trabaja sobre `config.yaml`; la conexión SSH se abre
//! recién cuando una acción la necesita.

use std::path::Path;

use vps_remote::SshSession;

use crate::backup::retention;
use crate::backup::BackupOrchestrator;
use crate::cli::prompt;
use crate::config::AppConfig;
use crate::errors::AppError;

const CONFIG_FILE: &str = "config.yaml";

pub fn run() {
    loop {
        println!("\n═══ Gestión de respaldos ═══");
        println!("1. Respaldo completo (carpetas + MySQL)");
        println!("2. Validar configuración");
        println!("3. Mostrar configuración");
        println!("4. Probar conexión y acceso a carpetas");
        println!("5. Respaldo solo de MySQL");
        println!("6. Respaldo solo de carpetas");
        println!("7. Limpiar respaldos locales antiguos");
        println!("0. Volver");

        let choice = match prompt::read_line("Opción: ") {
            Ok(choice) => choice,
            Err(_) => return,
        };
        let result = match choice.trim() {
            "1" => with_orchestrator(|o| o.run_full().map(|_| ())),
            "2" => validate_config(),
            "3" => show_config(),
            "4" => test_access(),
            "5" => with_orchestrator(|o| o.run_mysql_only().map(|_| ())),
            "6" => with_orchestrator(|o| o.run_directories_only().map(|_| ())),
            "7" => prune_manually(),
            "0" => return,
            other => {
                println!("Opción desconocida: {other}");
                Ok(())
            }
        };
        if let Err(e) = result {
            println!("Error: {e}");
        }
    }
}

fn load_config() -> Result<AppConfig, AppError> {
    let config = AppConfig::from_file(CONFIG_FILE)?;
    config.validate()?;
    Ok(config)
}

fn connect(config: &AppConfig) -> Result<SshSession, AppError> {
    println!("Conectando a {}...", config.vps.ip);
    let session = SshSession::connect(
        &config.vps.ip,
        &config.vps.user,
        Path::new(&config.vps.key_path),
        config.vps.passphrase.as_deref(),
    )?;
    Ok(session)
}

fn with_orchestrator(
    action: impl FnOnce(&BackupOrchestrator<SshSession>) -> Result<(), AppError>,
) -> Result<(), AppError> {
    let config = load_config()?;
    let session = connect(&config)?;
    let orchestrator = BackupOrchestrator::new(&session, &config);
    action(&orchestrator)
}

fn validate_config() -> Result<(), AppError> {
    match AppConfig::from_file(CONFIG_FILE) {
        Ok(config) => match config.validate() {
            Ok(()) => println!("✓ {CONFIG_FILE} es válido."),
            Err(e) => println!("✗ {e}"),
        },
        Err(e) => println!("✗ {e}"),
    }
    Ok(())
}

fn show_config() -> Result<(), AppError> {
    let config = AppConfig::from_file(CONFIG_FILE)?;
    println!("Servidor: {}@{}", config.vps.user, config.vps.ip);
    println!("Clave: {}", config.vps.key_path);
    println!("Destino local: {}", config.backup.local_save_path);
    println!("Carpetas remotas:");
    for folder in &config.backup.remote_folders {
        println!("  - {folder}");
    }
    match &config.mysql {
        Some(mysql) if mysql.enabled => {
            println!(
                "MySQL: habilitado (reinicio tras respaldo: {})",
                if mysql.restart_after_backup { "sí" } else { "no" }
            );
        }
        _ => println!("MySQL: deshabilitado"),
    }
    println!(
        "Conservar copias remotas: {}",
        if config.settings.keep_remote_copies { "sí" } else { "no" }
    );
    Ok(())
}

fn test_access() -> Result<(), AppError> {
    let config = load_config()?;
    let session = connect(&config)?;
    let orchestrator = BackupOrchestrator::new(&session, &config);
    let unreachable = orchestrator.test_access()?;
    if unreachable.is_empty() {
        println!("✓ Todas las carpetas configuradas son accesibles.");
    } else {
        println!("✗ Carpetas inaccesibles: {}", unreachable.join(", "));
    }
    Ok(())
}

fn prune_manually() -> Result<(), AppError> {
    let config = load_config()?;
    let answer = prompt::read_line(&format!(
        "Eliminar respaldos con más de N días (vacío = {}): ",
        retention::DEFAULT_RETENTION_DAYS
    ))?;
    let days = if answer.trim().is_empty() {
        retention::DEFAULT_RETENTION_DAYS
    } else {
        match answer.trim().parse::<i64>() {
            Ok(days) if days >= 0 => days,
            _ => {
                println!("Cantidad de días inválida.");
                return Ok(());
            }
        }
    };
    let removed = retention::prune(Path::new(&config.backup.local_save_path), days)?;
    println!("Respaldos eliminados: {removed}");
    Ok(())
}
