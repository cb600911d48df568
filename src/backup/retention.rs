//! Limpieza de respaldos locales por antigüedad.
//!
//! La regla es estricta: se borra lo MÁS viejo que la ventana, nunca lo que
//! cae exactamente en el límite. El instante de referencia se pasa explícito
//! para poder razonar sobre la regla sin tocar el reloj.

use std::path::Path;

use chrono::{DateTime, Duration, Utc};

/// Ventana por defecto al terminar cada corrida de backup.
pub const DEFAULT_RETENTION_DAYS: i64 = 7;

/// `true` si el archivo modificado en `modified` supera la ventana de
/// `max_age_days` días contada desde `now`.
pub fn is_expired(modified: DateTime<Utc>, now: DateTime<Utc>, max_age_days: i64) -> bool {
    now - modified > Duration::days(max_age_days)
}

/// Borra del directorio los archivos regulares más viejos que la ventana.
/// Devuelve cuántos se eliminaron. Un directorio inexistente no es un error:
/// simplemente no hay nada que limpiar.
pub fn prune_older_than(
    dir: &Path,
    max_age_days: i64,
    now: DateTime<Utc>,
) -> std::io::Result<usize> {
    if !dir.is_dir() {
        return Ok(0);
    }
    let mut removed = 0;
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let metadata = entry.metadata()?;
        if !metadata.is_file() {
            continue;
        }
        let modified: DateTime<Utc> = metadata.modified()?.into();
        if is_expired(modified, now, max_age_days) {
            std::fs::remove_file(entry.path())?;
            log::info!("respaldo expirado eliminado: {}", entry.path().display());
            removed += 1;
        }
    }
    Ok(removed)
}

/// Variante con el reloj real, usada desde los menús.
pub fn prune(dir: &Path, max_age_days: i64) -> std::io::Result<usize> {
    prune_older_than(dir, max_age_days, Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::fs;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn expira_solo_lo_mas_viejo_que_la_ventana() {
        let reference = now();
        for (age_days, expired) in [(0, false), (6, false), (8, true), (10, true)] {
            let modified = reference - Duration::days(age_days);
            assert_eq!(
                is_expired(modified, reference, 7),
                expired,
                "archivo de {age_days} días"
            );
        }
    }

    #[test]
    fn el_limite_exacto_no_expira() {
        let reference = now();
        assert!(!is_expired(reference - Duration::days(7), reference, 7));
        assert!(is_expired(
            reference - Duration::days(7) - Duration::seconds(1),
            reference,
            7
        ));
    }

    #[test]
    fn prune_borra_exactamente_los_expirados() {
        let dir = tempfile::tempdir().unwrap();
        let reference = Utc::now();
        let mut names = Vec::new();
        for age_days in [0i64, 6, 8, 10] {
            let path = dir.path().join(format!("backup_{age_days}d.zip"));
            fs::write(&path, b"x").unwrap();
            let mtime = reference - Duration::days(age_days);
            let file_time = std::fs::File::open(&path).unwrap();
            file_time
                .set_modified(std::time::SystemTime::from(mtime))
                .unwrap();
            names.push(path);
        }

        let removed = prune_older_than(dir.path(), 7, reference).unwrap();
        assert_eq!(removed, 2);
        assert!(names[0].exists(), "archivo de hoy se conserva");
        assert!(names[1].exists(), "archivo de 6 días se conserva");
        assert!(!names[2].exists(), "archivo de 8 días se borra");
        assert!(!names[3].exists(), "archivo de 10 días se borra");
    }

    #[test]
    fn directorio_inexistente_no_es_error() {
        assert_eq!(prune_older_than(Path::new("/no/existe"), 7, now()).unwrap(), 0);
    }
}
