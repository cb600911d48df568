//! Punto de entrada: menú principal de la consola.

use vpsflow::cli::{backup_menu, database_menu, dev_menu, prompt};

fn main() {
    println!("╔══════════════════════════════════════╗");
    println!("║   Consola de mantenimiento del VPS   ║");
    println!("╚══════════════════════════════════════╝");

    loop {
        println!("\n═══ Menú principal ═══");
        println!("1. Gestión de bases de datos");
        println!("2. Gestión de respaldos");
        println!("3. Desarrollo (túnel SSH)");
        println!("0. Salir");

        let choice = match prompt::read_line("Opción: ") {
            Ok(choice) => choice,
            Err(_) => break,
        };
        match choice.trim() {
            "1" => database_menu::run(),
            "2" => backup_menu::run(),
            "3" => dev_menu::run(),
            "0" => break,
            other => println!("Opción desconocida: {other}"),
        }
    }
    println!("Hasta luego.");
}
