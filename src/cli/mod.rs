//! Menús interactivos de la consola.
//!
//! Cada submenú es un bucle que lee una opción, ejecuta la acción y vuelve al
//! prompt. Ningún error escapa del bucle: se imprime y se sigue.

pub mod backup_menu;
pub mod database_menu;
pub mod dev_menu;
pub mod prompt;
