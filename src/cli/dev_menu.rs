//! Menú de desarrollo: túnel SSH local hacia el MySQL del servidor.
//!
//! El manejador del túnel vive mientras el menú está abierto; al salir, el
//! proceso hijo se cierra si seguía vivo.

use crate::cli::prompt;
use crate::config::AppConfig;
use crate::errors::AppError;
use crate::tunnel::{validate_port, TunnelManager, TunnelStatus};

const CONFIG_FILE: &str = "config.yaml";

pub fn run() {
    let mut manager = TunnelManager::new();
    loop {
        println!("\n═══ Desarrollo ═══");
        println!("1. Abrir túnel SSH hacia MySQL");
        println!("2. Estado del túnel");
        println!("3. Cerrar túnel");
        println!("0. Volver");

        let choice = match prompt::read_line("Opción: ") {
            Ok(choice) => choice,
            Err(_) => break,
        };
        let result = match choice.trim() {
            "1" => open_tunnel(&mut manager),
            "2" => {
                show_status(&mut manager);
                Ok(())
            }
            "3" => {
                manager.close();
                println!("Túnel cerrado.");
                Ok(())
            }
            "0" => break,
            other => {
                println!("Opción desconocida: {other}");
                Ok(())
            }
        };
        if let Err(e) = result {
            println!("Error: {e}");
        }
    }
    // Salir del menú no deja procesos ssh colgados.
    manager.close();
}

fn open_tunnel(manager: &mut TunnelManager) -> Result<(), AppError> {
    let config = AppConfig::from_file(CONFIG_FILE)?;
    let Some(tunnel) = config.ssh_tunnel else {
        println!("config.yaml no tiene la sección ssh_tunnel.");
        return Ok(());
    };

    let answer = prompt::read_line("Puerto local (vacío = 3307): ")?;
    let local_port = match validate_port(&answer) {
        Ok(port) => port,
        Err(e) => {
            println!("{e}");
            return Ok(());
        }
    };

    manager.open(&tunnel, local_port)?;
    println!(
        "Túnel abierto: localhost:{local_port} → {}:{}",
        tunnel.remote_host, tunnel.remote_port
    );
    Ok(())
}

fn show_status(manager: &mut TunnelManager) {
    match manager.status() {
        TunnelStatus::Running { local_port } => {
            println!("Túnel activo en localhost:{local_port}");
        }
        TunnelStatus::Exited { code } => match code {
            Some(code) => println!("El túnel terminó con código {code}"),
            None => println!("El túnel terminó"),
        },
        TunnelStatus::NotStarted => println!("No hay túnel abierto."),
    }
}
