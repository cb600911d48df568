//! Modelo de esquema, generación de DDL, aprovisionamiento y extracción.

pub mod ddl;
pub mod extractor;
pub mod model;
pub mod provisioner;
