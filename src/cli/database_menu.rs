//! Menú de gestión de bases de datos.
//!
//! Las credenciales vienen del entorno (`.env`): SSH para llegar al servidor
//! y las del cliente mysql remoto. La sesión SSH se abre una vez al entrar al
//! menú y se reutiliza en todas las acciones.

use std::path::{Path, PathBuf};

use vps_mysql::{MysqlCredentials, SchemaDocument, SchemaExtractor, SchemaProvisioner, SqlSession};
use vps_remote::{CommandRunner, SshSession};

use crate::cli::prompt;
use crate::config::VpsEnvCredentials;
use crate::errors::AppError;

/// Directorio donde el extractor deja los esquemas y donde se buscan
/// candidatos para aprovisionar.
const DATA_MODELS_DIR: &str = "dataModels";

pub fn run() {
    let session = match connect() {
        Ok(session) => session,
        Err(e) => {
            println!("No se pudo conectar al servidor: {e}");
            return;
        }
    };
    let credentials = match MysqlCredentials::from_env() {
        Ok(credentials) => credentials,
        Err(e) => {
            println!("Credenciales MySQL incompletas: {e}");
            return;
        }
    };
    let sql = SqlSession::new(&session, credentials);

    loop {
        println!("\n═══ Gestión de bases de datos ═══");
        println!("1. Crear base de datos desde un esquema JSON");
        println!("2. Mostrar bases de datos");
        println!("3. Mostrar tablas de una base");
        println!("4. Probar conexión SSH y MySQL");
        println!("5. Extraer esquema de una base existente");
        println!("0. Volver");

        let choice = match prompt::read_line("Opción: ") {
            Ok(choice) => choice,
            Err(_) => return,
        };
        let result = match choice.trim() {
            "1" => provision_from_schema(&sql),
            "2" => show_databases(&sql),
            "3" => show_tables(&sql),
            "4" => test_connections(&session, &sql),
            "5" => extract_schema(&sql),
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

fn connect() -> Result<SshSession, AppError> {
    let env = VpsEnvCredentials::from_env()?;
    println!("Conectando a {}...", env.ip);
    let session = SshSession::connect(
        &env.ip,
        &env.username,
        &env.private_key,
        env.passphrase.as_deref(),
    )?;
    Ok(session)
}

/// Candidatos a esquema: archivos `.json` del directorio actual y de
/// `dataModels/` que se puedan leer como documento de esquema.
fn discover_schema_files() -> Vec<(PathBuf, SchemaDocument)> {
    let mut found = Vec::new();
    for dir in [Path::new("."), Path::new(DATA_MODELS_DIR)] {
        let Ok(entries) = std::fs::read_dir(dir) else { continue };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match SchemaDocument::from_file(&path) {
                Ok(document) => found.push((path, document)),
                Err(e) => log::debug!("descartado {}: {e}", path.display()),
            }
        }
    }
    found.sort_by(|a, b| a.0.cmp(&b.0));
    found
}

fn provision_from_schema(sql: &SqlSession) -> Result<(), AppError> {
    let candidates = discover_schema_files();
    if candidates.is_empty() {
        println!("No hay esquemas JSON en el directorio actual ni en {DATA_MODELS_DIR}/.");
        return Ok(());
    }
    println!("Esquemas disponibles:");
    for (i, (path, document)) in candidates.iter().enumerate() {
        println!(
            "{}. {} — base '{}', {} tablas",
            i + 1,
            path.display(),
            document.database_name,
            document.tables.len()
        );
    }

    let choice = prompt::read_line("Esquema a aplicar (número): ")?;
    let index: usize = match choice.trim().parse::<usize>() {
        Ok(n) if (1..=candidates.len()).contains(&n) => n - 1,
        _ => {
            println!("Selección inválida.");
            return Ok(());
        }
    };
    let (path, document) = &candidates[index];
    if !prompt::confirm(&format!("¿Aprovisionar la base '{}'?", document.database_name))? {
        return Ok(());
    }

    let mut provisioner = SchemaProvisioner::new(path);
    provisioner.provision(sql)?;
    println!("Base '{}' aprovisionada.", document.database_name);
    Ok(())
}

fn show_databases(sql: &SqlSession) -> Result<(), AppError> {
    let extractor = SchemaExtractor::new(sql);
    let databases = extractor.list_databases()?;
    if databases.is_empty() {
        println!("No hay bases de datos de usuario.");
    } else {
        println!("Bases de datos:");
        for db in databases {
            println!("  - {db}");
        }
    }
    Ok(())
}

fn show_tables(sql: &SqlSession) -> Result<(), AppError> {
    let database = prompt::read_line("Base de datos: ")?;
    let database = database.trim();
    if database.is_empty() {
        println!("Nombre vacío.");
        return Ok(());
    }
    let rows = sql.execute_with_results("SHOW TABLES;", Some(database))?;
    if rows.is_empty() {
        println!("La base '{database}' no tiene tablas.");
    } else {
        println!("Tablas de '{database}':");
        for row in &rows {
            if let Some(Some(name)) = row.values().next() {
                println!("  - {name}");
            }
        }
    }
    Ok(())
}

fn test_connections(session: &SshSession, sql: &SqlSession) -> Result<(), AppError> {
    let whoami = session.run("whoami")?;
    if whoami.success() {
        println!("✓ SSH: conectado como {}", whoami.stdout.trim());
    } else {
        println!("✗ SSH: {}", whoami.stderr.trim());
    }
    if sql.test_connection() {
        println!("✓ MySQL: el servidor responde");
    } else {
        println!("✗ MySQL: sin respuesta (revise credenciales y servicio)");
    }
    Ok(())
}

fn extract_schema(sql: &SqlSession) -> Result<(), AppError> {
    let extractor = SchemaExtractor::new(sql);
    let databases = extractor.list_databases()?;
    if databases.is_empty() {
        println!("No hay bases de datos de usuario para extraer.");
        return Ok(());
    }
    println!("Bases disponibles:");
    for (i, db) in databases.iter().enumerate() {
        println!("{}. {db}", i + 1);
    }
    let choice = prompt::read_line("Base a extraer (número): ")?;
    let index: usize = match choice.trim().parse::<usize>() {
        Ok(n) if (1..=databases.len()).contains(&n) => n - 1,
        _ => {
            println!("Selección inválida.");
            return Ok(());
        }
    };

    let name = prompt::read_line("Nombre del archivo (vacío = automático): ")?;
    let custom_name = {
        let trimmed = name.trim();
        if trimmed.is_empty() { None } else { Some(trimmed.to_string()) }
    };

    let path = extractor.extract_to_file(
        &databases[index],
        custom_name.as_deref(),
        Path::new(DATA_MODELS_DIR),
    )?;
    println!("Esquema escrito en {}", path.display());
    Ok(())
}
