//! Corrida de respaldo completa.
//!
//! Cada carpeta remota configurada pasa por su propio pipeline (empaquetar,
//! verificar, medir, descargar, limpiar) de forma independiente: el fallo de
//! una se registra y la corrida sigue con las demás. El respaldo en frío de
//! MySQL detiene el servicio y lo reinicia SIEMPRE al terminar, haya fallado
//! o no el paso intermedio, salvo que la configuración pida lo contrario.

use std::path::PathBuf;
use std::time::Instant;

use chrono::Utc;
use vps_remote::{CommandRunner, FileTransfer, RemoteError};

use crate::backup::archive::{bundle_into_zip, format_file_size};
use crate::backup::retention::{self, DEFAULT_RETENTION_DAYS};
use crate::config::{AppConfig, MysqlBackupConfig};
use crate::errors::AppError;

/// Datadir estándar de MySQL en el servidor.
const MYSQL_DATA_PATH: &str = "/var/lib/mysql";
const MYSQL_SERVICE: &str = "mysql";

/// Resultado agregado de una corrida.
#[derive(Debug, Default)]
pub struct BackupRun {
    /// Archivos locales descargados con éxito.
    pub archives: Vec<PathBuf>,
    /// Descripciones de los pasos que fallaron (la corrida continuó).
    pub failures: Vec<String>,
    /// Zip consolidado, si hubo algo que empaquetar.
    pub bundle: Option<PathBuf>,
    /// Respaldos locales expirados que se eliminaron al final.
    pub pruned: usize,
    pub elapsed_secs: u64,
}

impl BackupRun {
    pub fn succeeded(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct BackupOrchestrator<'r, R: CommandRunner + FileTransfer> {
    runner: &'r R,
    config: &'r AppConfig,
}

impl<'r, R: CommandRunner + FileTransfer> BackupOrchestrator<'r, R> {
    pub fn new(runner: &'r R, config: &'r AppConfig) -> Self {
        Self { runner, config }
    }

    /// Corrida completa: carpetas + MySQL (si está habilitado) + zip + limpieza.
    pub fn run_full(&self) -> Result<BackupRun, AppError> {
        let started = Instant::now();
        let mut run = BackupRun::default();
        self.backup_folders(&mut run);
        if let Some(mysql) = self.enabled_mysql() {
            self.backup_mysql(mysql, &mut run);
        }
        self.finish(&mut run)?;
        run.elapsed_secs = started.elapsed().as_secs();
        self.print_summary(&run);
        Ok(run)
    }

    /// Solo las carpetas configuradas, sin tocar el servicio MySQL.
    pub fn run_directories_only(&self) -> Result<BackupRun, AppError> {
        let started = Instant::now();
        let mut run = BackupRun::default();
        self.backup_folders(&mut run);
        self.finish(&mut run)?;
        run.elapsed_secs = started.elapsed().as_secs();
        self.print_summary(&run);
        Ok(run)
    }

    /// Solo el respaldo en frío de MySQL.
    pub fn run_mysql_only(&self) -> Result<BackupRun, AppError> {
        let started = Instant::now();
        let mut run = BackupRun::default();
        match self.enabled_mysql() {
            Some(mysql) => self.backup_mysql(mysql, &mut run),
            None => run.failures.push("mysql.enabled es false en la configuración".into()),
        }
        self.finish(&mut run)?;
        run.elapsed_secs = started.elapsed().as_secs();
        self.print_summary(&run);
        Ok(run)
    }

    /// Prueba de acceso: identidad remota más un listado por cada carpeta
    /// configurada. Devuelve las carpetas inaccesibles.
    pub fn test_access(&self) -> Result<Vec<String>, RemoteError> {
        let whoami = self.runner.run("whoami")?;
        println!("Conectado como: {}", whoami.stdout.trim());

        let mut unreachable = Vec::new();
        for folder in &self.config.backup.remote_folders {
            let output = self.runner.run(&format!("ls {folder}"))?;
            if output.success() {
                println!("  ✓ {folder}");
            } else {
                println!("  ✗ {folder}: {}", output.stderr.trim());
                unreachable.push(folder.clone());
            }
        }
        Ok(unreachable)
    }

    fn enabled_mysql(&self) -> Option<&MysqlBackupConfig> {
        self.config.mysql.as_ref().filter(|m| m.enabled)
    }

    fn backup_folders(&self, run: &mut BackupRun) {
        let timestamp = Utc::now().format("%Y%m%d_%H%M%S").to_string();
        for folder in &self.config.backup.remote_folders {
            match self.backup_one_folder(folder, &timestamp) {
                Ok(local) => run.archives.push(local),
                Err(e) => {
                    let detail = format!("carpeta {folder}: {e}");
                    log::warn!("{detail}");
                    println!("  ✗ {detail}");
                    run.failures.push(detail);
                }
            }
        }
    }

    fn backup_one_folder(&self, folder: &str, timestamp: &str) -> Result<PathBuf, AppError> {
        let (parent, base) = split_remote_path(folder);
        let remote_archive = format!("/tmp/{base}_{timestamp}.tar.gz");

        println!("Empaquetando {folder}...");
        let tar = self
            .runner
            .run(&format!("tar -czf {remote_archive} -C {parent} {base}"))?;
        if !tar.success() {
            return Err(command_failed(tar.exit_status, &tar.stderr));
        }
        self.verify_remote_file(&remote_archive)?;
        self.report_remote_size(&remote_archive)?;

        let local = self.download_archive(&remote_archive)?;
        self.cleanup_remote(&remote_archive, false)?;
        Ok(local)
    }

    fn backup_mysql(&self, mysql: &MysqlBackupConfig, run: &mut BackupRun) {
        println!("Deteniendo el servicio {MYSQL_SERVICE}...");
        let result = self.backup_mysql_inner(mysql.backup_name.as_deref());

        // El servicio vuelve a arrancar pase lo que pase con el paso anterior.
        if mysql.restart_after_backup {
            println!("Reiniciando el servicio {MYSQL_SERVICE}...");
            match self.runner.run(&format!("sudo systemctl start {MYSQL_SERVICE}")) {
                Ok(output) if output.success() => {}
                Ok(output) => {
                    log::warn!(
                        "no se pudo reiniciar {MYSQL_SERVICE}: {}",
                        output.stderr.trim()
                    );
                }
                Err(e) => log::warn!("no se pudo reiniciar {MYSQL_SERVICE}: {e}"),
            }
        } else {
            println!("El servicio {MYSQL_SERVICE} queda detenido (restart_after_backup: false).");
        }

        match result {
            Ok(local) => run.archives.push(local),
            Err(e) => {
                let detail = format!("respaldo MySQL: {e}");
                log::warn!("{detail}");
                println!("  ✗ {detail}");
                run.failures.push(detail);
            }
        }
    }

    fn backup_mysql_inner(&self, backup_name: Option<&str>) -> Result<PathBuf, AppError> {
        let stop = self.runner.run(&format!("sudo systemctl stop {MYSQL_SERVICE}"))?;
        if !stop.success() {
            return Err(command_failed(stop.exit_status, &stop.stderr));
        }
        // is-active devuelve 0 solo cuando sigue corriendo.
        let active = self.runner.run(&format!("systemctl is-active {MYSQL_SERVICE}"))?;
        if active.success() {
            return Err(command_failed(
                active.exit_status,
                "el servicio sigue activo tras systemctl stop",
            ));
        }

        let timestamp = Utc::now().format("%Y%m%d_%H%M%S").to_string();
        let name = backup_name.unwrap_or("mysql_backup");
        let remote_archive = format!("/tmp/{name}_{timestamp}.tar.gz");
        let (parent, base) = split_remote_path(MYSQL_DATA_PATH);

        println!("Empaquetando {MYSQL_DATA_PATH}...");
        let tar = self
            .runner
            .run(&format!("sudo tar -czf {remote_archive} -C {parent} {base}"))?;
        if !tar.success() {
            return Err(command_failed(tar.exit_status, &tar.stderr));
        }
        self.verify_remote_file(&remote_archive)?;
        self.report_remote_size(&remote_archive)?;

        let local = self.download_archive(&remote_archive)?;
        self.cleanup_remote(&remote_archive, true)?;
        Ok(local)
    }

    fn verify_remote_file(&self, remote_path: &str) -> Result<(), AppError> {
        let listing = self.runner.run(&format!("ls -la {remote_path}"))?;
        if !listing.success() {
            return Err(command_failed(listing.exit_status, &listing.stderr));
        }
        Ok(())
    }

    fn report_remote_size(&self, remote_path: &str) -> Result<(), AppError> {
        let stat = self.runner.run(&format!("stat -c%s {remote_path}"))?;
        if let Ok(bytes) = stat.stdout.trim().parse::<u64>() {
            println!("  Tamaño: {}", format_file_size(bytes));
        }
        Ok(())
    }

    fn download_archive(&self, remote_path: &str) -> Result<PathBuf, AppError> {
        let save_dir = PathBuf::from(&self.config.backup.local_save_path);
        std::fs::create_dir_all(&save_dir)?;
        let file_name = remote_path.rsplit('/').next().unwrap_or(remote_path);
        let local = save_dir.join(file_name);

        self.runner.download(remote_path, &local, &mut |done, total| {
            if total > 0 {
                print!("\r  Descargando: {}%", done * 100 / total);
            }
        })?;
        println!();
        Ok(local)
    }

    fn cleanup_remote(&self, remote_path: &str, needs_sudo: bool) -> Result<(), AppError> {
        if self.config.settings.keep_remote_copies {
            return Ok(());
        }
        let prefix = if needs_sudo { "sudo " } else { "" };
        let rm = self.runner.run(&format!("{prefix}rm -f {remote_path}"))?;
        if !rm.success() {
            log::warn!("no se pudo borrar {remote_path}: {}", rm.stderr.trim());
        }
        Ok(())
    }

    fn finish(&self, run: &mut BackupRun) -> Result<(), AppError> {
        let save_dir = PathBuf::from(&self.config.backup.local_save_path);
        run.bundle = bundle_into_zip(&run.archives, &save_dir)?;
        run.pruned = retention::prune(&save_dir, DEFAULT_RETENTION_DAYS)?;
        Ok(())
    }

    fn print_summary(&self, run: &BackupRun) {
        println!("\n── Resumen ──");
        println!("Duración: {}s", run.elapsed_secs);
        println!("Destino: {}", self.config.backup.local_save_path);
        match &run.bundle {
            Some(path) => println!("Paquete: {}", path.display()),
            None => println!("Paquete: (sin archivos)"),
        }
        if run.pruned > 0 {
            println!("Respaldos antiguos eliminados: {}", run.pruned);
        }
        if run.succeeded() {
            println!("Estado: completado");
        } else {
            println!("Estado: con errores");
            for failure in &run.failures {
                println!("  - {failure}");
            }
        }
    }
}

/// Divide una ruta remota absoluta en (directorio padre, nombre base) para
/// `tar -C`. Una ruta de primer nivel usa `/` como padre.
fn split_remote_path(path: &str) -> (&str, &str) {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(0) => ("/", &trimmed[1..]),
        Some(idx) => (&trimmed[..idx], &trimmed[idx + 1..]),
        None => (".", trimmed),
    }
}

fn command_failed(exit_status: i32, stderr: &str) -> AppError {
    AppError::Remote(RemoteError::CommandFailed {
        exit_status,
        stderr: stderr.trim().to_string(),
    })
}
