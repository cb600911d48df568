//! Aprovisionamiento: máquina de estados que lleva un documento de esquema
//! desde el archivo hasta la base remota creada.
//!
//! `Unloaded → Loaded → Validated → Provisioning → Done|Failed`. No hay
//! rollback: las tablas ya creadas quedan si una posterior falla; el error
//! terminal reporta la sentencia exacta que abortó la corrida.

use std::path::PathBuf;

use crate::errors::SchemaError;
use crate::schema::ddl::{FailurePolicy, PlannedStatement};
use crate::schema::model::SchemaDocument;
use crate::sql_session::SqlSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionState {
    Unloaded,
    Loaded,
    Validated,
    Provisioning,
    Done,
    Failed,
}

pub struct SchemaProvisioner {
    schema_path: PathBuf,
    document: Option<SchemaDocument>,
    state: ProvisionState,
}

impl SchemaProvisioner {
    pub fn new(schema_path: impl Into<PathBuf>) -> Self {
        Self { schema_path: schema_path.into(), document: None, state: ProvisionState::Unloaded }
    }

    pub fn state(&self) -> ProvisionState {
        self.state
    }

    pub fn document(&self) -> Option<&SchemaDocument> {
        self.document.as_ref()
    }

    /// `Unloaded → Loaded`: lee y valida estructuralmente el JSON.
    pub fn load(&mut self) -> Result<(), SchemaError> {
        let document = SchemaDocument::from_file(&self.schema_path)?;
        self.document = Some(document);
        self.state = ProvisionState::Loaded;
        Ok(())
    }

    /// `Loaded → Validated`: validación semántica todo-o-nada.
    pub fn validate(&mut self) -> Result<(), SchemaError> {
        let document = self
            .document
            .as_ref()
            .ok_or_else(|| SchemaError::Malformed("documento no cargado".into()))?;
        document.validate()?;
        self.state = ProvisionState::Validated;
        Ok(())
    }

    /// Ejecuta el aprovisionamiento completo contra la sesión dada. Carga y
    /// valida primero si hace falta. Termina en `Done` o en `Failed` con el
    /// primer error que abortó; nunca deshace lo ya creado.
    pub fn provision(&mut self, session: &SqlSession) -> Result<(), SchemaError> {
        if self.document.is_none() {
            self.load()?;
        }
        if self.state == ProvisionState::Loaded {
            self.validate()?;
        }
        self.state = ProvisionState::Provisioning;
        match self.run_statements(session) {
            Ok(()) => {
                self.state = ProvisionState::Done;
                Ok(())
            }
            Err(e) => {
                self.state = ProvisionState::Failed;
                Err(e)
            }
        }
    }

    fn run_statements(&self, session: &SqlSession) -> Result<(), SchemaError> {
        let document = self.document.as_ref().expect("documento cargado");
        let database_name = document.database_name.clone();

        println!("Creando base de datos: {database_name}");
        if !session.create_database(&database_name)? {
            return Err(SchemaError::Statement {
                statement: format!("CREATE DATABASE IF NOT EXISTS {database_name};"),
                detail: "el cliente mysql reportó fallo".into(),
            });
        }
        let database = Some(database_name.as_str());

        let tables_sql = document.create_tables_sql();
        let total = tables_sql.len();
        for (i, sql) in tables_sql.iter().enumerate() {
            println!("Creando tabla {}/{}...", i + 1, total);
            if !session.execute_file(sql, database, false)? {
                return Err(SchemaError::Statement {
                    statement: sql.clone(),
                    detail: "CREATE TABLE falló".into(),
                });
            }
        }

        let planned = document.create_indexes_sql();
        self.run_planned(session, database, &planned)?;

        println!("✓ Base de datos '{database_name}' creada exitosamente");
        Ok(())
    }

    /// Runner genérico de sentencias planificadas: una sola pieza decide qué
    /// hacer con cada fallo según la política del descriptor. El contador de
    /// progreso sólo cuenta los pasos obligatorios.
    fn run_planned(
        &self,
        session: &SqlSession,
        database: Option<&str>,
        planned: &[PlannedStatement],
    ) -> Result<(), SchemaError> {
        let mandatory_total = planned
            .iter()
            .filter(|s| s.policy == FailurePolicy::Abort)
            .count();
        let mut current = 0usize;

        for statement in planned {
            match statement.policy {
                FailurePolicy::WarnAndContinue => {
                    println!("⚠ {} (puede fallar sin problema)...", statement.description);
                    session.execute_file(&statement.sql, database, true)?;
                }
                FailurePolicy::Abort => {
                    current += 1;
                    println!("Creando índice {current}/{mandatory_total}...");
                    if !session.execute_file(&statement.sql, database, false)? {
                        return Err(SchemaError::Statement {
                            statement: statement.sql.clone(),
                            detail: statement.description.clone(),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}
