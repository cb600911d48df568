//! Empaquetado local: todos los `.tar.gz` descargados de una corrida se
//! consolidan en un único `backup_completo_{timestamp}.zip` y los parciales
//! se eliminan.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::errors::AppError;

/// Tamaño legible para los reportes de consola (base 1024).
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} {}", UNITS[0])
    } else {
        format!("{value:.2} {}", UNITS[unit])
    }
}

/// Consolida `files` en un zip (deflate) dentro de `output_dir` y borra los
/// originales. Devuelve la ruta del zip, o `None` si no había nada que
/// empaquetar.
pub fn bundle_into_zip(files: &[PathBuf], output_dir: &Path) -> Result<Option<PathBuf>, AppError> {
    if files.is_empty() {
        return Ok(None);
    }
    std::fs::create_dir_all(output_dir)?;
    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    let zip_path = output_dir.join(format!("backup_completo_{timestamp}.zip"));

    let mut writer = ZipWriter::new(File::create(&zip_path)?);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    for file in files {
        let name = file
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                AppError::Io(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("nombre de archivo inválido: {}", file.display()),
                ))
            })?;
        writer.start_file(name, options)?;
        // Copia por bloques: los tarballs pueden medir gigabytes.
        io::copy(&mut File::open(file)?, &mut writer)?;
    }
    writer.finish()?;

    // Los parciales sobran una vez consolidados.
    for file in files {
        std::fs::remove_file(file)?;
    }
    Ok(Some(zip_path))
}
