//! Orquestación de respaldos: empaquetado remoto, descarga, empaquetado local
//! y limpieza por antigüedad.

pub mod archive;
pub mod orchestrator;
pub mod retention;

pub use orchestrator::{BackupOrchestrator, BackupRun};
