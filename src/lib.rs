//! vpsflow: consola interactiva de mantenimiento de un VPS.
//!
//! La librería agrupa la orquestación de respaldos, la configuración, el
//! túnel SSH de desarrollo y los menús; el trabajo remoto vive en los crates
//! `vps-remote` (SSH/SFTP) y `vps-mysql` (esquemas y sesión SQL).

pub mod backup;
pub mod cli;
pub mod config;
pub mod errors;
pub mod tunnel;
