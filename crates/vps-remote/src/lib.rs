//! vps-remote: ejecución de comandos y transferencia de archivos sobre una
//! única sesión SSH persistente.
//!
//! Expone el trait `CommandRunner` como costura principal: todo componente de
//! nivel superior (adaptador SQL, orquestador de backups) depende del trait y
//! no de la implementación concreta, lo que permite fakes en memoria en tests.

pub mod errors;
pub mod executor;
pub mod session;
pub mod testing;

pub use errors::RemoteError;
pub use executor::{CommandOutput, CommandRunner, FileTransfer};
pub use session::SshSession;
