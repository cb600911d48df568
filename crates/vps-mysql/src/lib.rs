//! vps-mysql: adaptador SQL sobre un canal exec SSH y generación de DDL
//! a partir de documentos de esquema JSON.
//!
//! - `sql_session` construye invocaciones del cliente `mysql` remoto
//!   (modo simple `-e`, modo archivo por heredoc, modo batch con resultados)
//!   y parsea la salida separada por tabs de vuelta a filas ordenadas.
//! - `schema` modela el documento de esquema, genera los `CREATE` ordenados,
//!   ejecuta el aprovisionamiento como máquina de estados y reconstruye
//!   documentos desde `information_schema` (extracción inversa).

pub mod errors;
pub mod schema;
pub mod sql_session;

pub use errors::{SchemaError, SqlError};
pub use schema::ddl::{FailurePolicy, PlannedStatement};
pub use schema::extractor::SchemaExtractor;
pub use schema::model::{Column, IndexSpec, SchemaDocument, Table};
pub use schema::provisioner::{ProvisionState, SchemaProvisioner};
pub use sql_session::{MysqlCredentials, Row, SqlSession};
