//! Adaptador de sesión SQL: construye invocaciones del cliente `mysql`
//! remoto como strings de shell y las despacha por el `CommandRunner`.
//!
//! Dos modos de ejecución por llamada:
//! - modo simple: sentencia inline vía `-e` (sin saltos de línea ni comillas
//!   problemáticas);
//! - modo archivo: la sentencia se escribe en un archivo temporal remoto por
//!   heredoc y se alimenta al cliente por redirección; evita los problemas de
//!   quoting de backticks en argumentos inline de algunos shells remotos.
//!
//! La base de datos de contexto es un parámetro explícito en cada llamada:
//! la sesión no guarda estado mutable de "base actual".

use indexmap::IndexMap;

use vps_remote::{CommandOutput, CommandRunner};

use crate::errors::SqlError;

/// Fila de resultado: columna → valor (o null), en orden de aparición.
pub type Row = IndexMap<String, Option<String>>;

/// Ruta fija del archivo temporal remoto para el modo archivo. La sesión es
/// serial (un solo comando en vuelo), por lo que no hay colisiones.
const REMOTE_STMT_FILE: &str = "/tmp/vpsflow_stmt.sql";

/// Delimitador del heredoc; entre comillas simples para que el shell remoto
/// no expanda nada del cuerpo SQL.
const HEREDOC_TAG: &str = "VPSFLOW_SQL";

/// Credenciales del cliente mysql remoto, tomadas del entorno.
#[derive(Debug, Clone)]
pub struct MysqlCredentials {
    pub user: String,
    pub password: String,
    pub host: String,
}

impl MysqlCredentials {
    /// Lee `MYSQL_USER`, `MYSQL_PASSWORD` y `MYSQL_HOST` (este último con
    /// default `localhost`), cargando antes el `.env` si existe. Falla con la
    /// primera variable requerida ausente.
    pub fn from_env() -> Result<Self, SqlError> {
        dotenvy::dotenv().ok();
        let user = std::env::var("MYSQL_USER")
            .map_err(|_| SqlError::MissingEnv("MYSQL_USER".into()))?;
        let password = std::env::var("MYSQL_PASSWORD")
            .map_err(|_| SqlError::MissingEnv("MYSQL_PASSWORD".into()))?;
        let host = std::env::var("MYSQL_HOST").unwrap_or_else(|_| "localhost".into());
        Ok(Self { user, password, host })
    }
}

/// Cita un valor para el shell remoto con comillas simples.
fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

pub struct SqlSession<'r> {
    runner: &'r dyn CommandRunner,
    credentials: MysqlCredentials,
}

impl<'r> SqlSession<'r> {
    pub fn new(runner: &'r dyn CommandRunner, credentials: MysqlCredentials) -> Self {
        Self { runner, credentials }
    }

    /// Prefijo `mysql -u -p -h [db]` común a todos los modos.
    fn client_command(&self, database: Option<&str>) -> String {
        let mut cmd = format!(
            "mysql -u{} -p{} -h{}",
            shell_quote(&self.credentials.user),
            shell_quote(&self.credentials.password),
            shell_quote(&self.credentials.host),
        );
        if let Some(db) = database {
            cmd.push(' ');
            cmd.push_str(&shell_quote(db));
        }
        cmd
    }

    fn report_failure(&self, sql: &str, output: &CommandOutput, ignore_errors: bool) -> bool {
        if ignore_errors {
            log::warn!(
                "sentencia falló pero se ignora (status {}): {} -- {}",
                output.exit_status,
                sql,
                output.stderr.trim()
            );
            true
        } else {
            log::error!(
                "sentencia falló (status {}): {} -- {}",
                output.exit_status,
                sql,
                output.stderr.trim()
            );
            false
        }
    }

    /// Modo simple: una sentencia inline vía `-e`. Devuelve `Ok(true)` si el
    /// cliente remoto terminó con status 0; `Ok(false)` reporta el fallo sin
    /// escalarlo. `ignore_errors` convierte el fallo en warning + éxito.
    pub fn execute(
        &self,
        sql: &str,
        database: Option<&str>,
        ignore_errors: bool,
    ) -> Result<bool, SqlError> {
        let command = format!("{} -e {}", self.client_command(database), shell_quote(sql));
        let output = self.runner.run(&command)?;
        if output.success() {
            Ok(true)
        } else {
            Ok(self.report_failure(sql, &output, ignore_errors))
        }
    }

    /// Modo archivo: escribe la sentencia (posiblemente multilínea) en un
    /// temporal remoto por heredoc, la alimenta al cliente por redirección y
    /// borra el temporal preservando el status del cliente.
    pub fn execute_file(
        &self,
        sql: &str,
        database: Option<&str>,
        ignore_errors: bool,
    ) -> Result<bool, SqlError> {
        let command = format!(
            "cat > {file} <<'{tag}'\n{sql}\n{tag}\n{client} < {file}\nstatus=$?\nrm -f {file}\nexit $status",
            file = REMOTE_STMT_FILE,
            tag = HEREDOC_TAG,
            sql = sql,
            client = self.client_command(database),
        );
        let output = self.runner.run(&command)?;
        if output.success() {
            Ok(true)
        } else {
            Ok(self.report_failure(sql, &output, ignore_errors))
        }
    }

    /// Crea la base en dos niveles: primero modo simple sin backticks; sólo si
    /// ese intento reporta fallo, reintenta en modo archivo con el nombre
    /// entre backticks (algunos shells remotos maltratan backticks inline).
    pub fn create_database(&self, name: &str) -> Result<bool, SqlError> {
        let simple = format!("CREATE DATABASE IF NOT EXISTS {name};");
        if self.execute(&simple, None, false)? {
            return Ok(true);
        }
        log::warn!("CREATE DATABASE inline falló para '{name}'; reintento en modo archivo");
        let quoted = format!("CREATE DATABASE IF NOT EXISTS `{name}`;");
        self.execute_file(&quoted, None, false)
    }

    /// Ejecuta una consulta en modo batch/raw y parsea la salida separada por
    /// tabs. Status remoto distinto de cero es `Err` (no una secuencia vacía);
    /// una salida con cabecera y sin filas es `Ok(vec![])`.
    pub fn execute_with_results(
        &self,
        query: &str,
        database: Option<&str>,
    ) -> Result<Vec<Row>, SqlError> {
        let command = format!(
            "{} --batch --raw -e {}",
            self.client_command(database),
            shell_quote(query),
        );
        let output = self.runner.run(&command)?;
        if !output.success() {
            return Err(SqlError::QueryFailed {
                exit_status: output.exit_status,
                stderr: output.stderr.trim().to_string(),
            });
        }
        Ok(parse_tab_separated(&output.stdout))
    }

    /// Sondeo `SELECT 1` para verificar que el cliente mysql remoto responde.
    pub fn test_connection(&self) -> bool {
        matches!(self.execute_with_results("SELECT 1;", None), Ok(rows) if !rows.is_empty())
    }
}

/// Parseo del protocolo de texto del cliente en modo batch: primera línea =
/// nombres de columna; cada línea no vacía siguiente se parte por tab. Filas
/// cortas se rellenan con null; los tokens literales `NULL`, `\N` y la cadena
/// vacía se normalizan a null.
fn parse_tab_separated(output: &str) -> Vec<Row> {
    let mut lines = output.lines();
    let header = match lines.next() {
        Some(h) if !h.trim().is_empty() => h,
        _ => return Vec::new(),
    };
    let columns: Vec<&str> = header.split('\t').collect();

    let mut rows = Vec::new();
    for line in lines {
        if line.is_empty() {
            continue;
        }
        let mut values = line.split('\t');
        let mut row = Row::new();
        for column in &columns {
            let value = values.next().and_then(normalize_value);
            row.insert((*column).to_string(), value);
        }
        rows.push(row);
    }
    rows
}

fn normalize_value(token: &str) -> Option<String> {
    match token {
        "" | "NULL" | r"\N" => None,
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vps_remote::testing::ScriptedRunner;

    fn credentials() -> MysqlCredentials {
        MysqlCredentials { user: "ops".into(), password: "secreta".into(), host: "localhost".into() }
    }

    #[test]
    fn execute_with_results_parsea_tabs_y_nulls() {
        let runner = ScriptedRunner::new();
        runner.push_ok("id\tname\n1\tAda\n2\t\\N\n");
        let session = SqlSession::new(&runner, credentials());
        let rows = session.execute_with_results("SELECT id, name FROM t;", Some("demo")).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("id"), Some(&Some("1".to_string())));
        assert_eq!(rows[0].get("name"), Some(&Some("Ada".to_string())));
        assert_eq!(rows[1].get("id"), Some(&Some("2".to_string())));
        assert_eq!(rows[1].get("name"), Some(&None));
    }

    #[test]
    fn execute_with_results_cabecera_sola_es_vacio() {
        let runner = ScriptedRunner::new();
        runner.push_ok("id\tname\n");
        let session = SqlSession::new(&runner, credentials());
        let rows = session.execute_with_results("SELECT * FROM vacia;", None).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn execute_with_results_status_no_cero_es_error() {
        let runner = ScriptedRunner::new();
        runner.push_failure("ERROR 1045: Access denied");
        let session = SqlSession::new(&runner, credentials());
        let result = session.execute_with_results("SELECT 1;", None);
        assert!(matches!(result, Err(SqlError::QueryFailed { exit_status: 1, .. })));
    }

    #[test]
    fn filas_cortas_se_rellenan_con_null() {
        let runner = ScriptedRunner::new();
        runner.push_ok("a\tb\tc\n1\t2\n");
        let session = SqlSession::new(&runner, credentials());
        let rows = session.execute_with_results("SELECT a, b, c FROM t;", None).unwrap();
        assert_eq!(rows[0].get("c"), Some(&None));
    }

    #[test]
    fn create_database_sin_fallback_cuando_el_modo_simple_funciona() {
        let runner = ScriptedRunner::new();
        let session = SqlSession::new(&runner, credentials());
        assert!(session.create_database("inventario").unwrap());

        let commands = runner.commands();
        assert_eq!(commands.len(), 1);
        assert!(commands[0].contains("CREATE DATABASE IF NOT EXISTS inventario;"));
        assert!(!commands[0].contains('`'));
    }

    #[test]
    fn create_database_reintenta_en_modo_archivo_tras_fallo() {
        let runner = ScriptedRunner::new();
        runner.push_failure("ERROR en -e");
        runner.push_ok("");
        let session = SqlSession::new(&runner, credentials());
        assert!(session.create_database("inventario").unwrap());

        let commands = runner.commands();
        assert_eq!(commands.len(), 2);
        assert!(commands[1].contains("CREATE DATABASE IF NOT EXISTS `inventario`;"));
        assert!(commands[1].contains("<<'VPSFLOW_SQL'"));
        assert!(commands[1].contains("rm -f /tmp/vpsflow_stmt.sql"));
    }

    #[test]
    fn ignore_errors_convierte_fallo_en_exito() {
        let runner = ScriptedRunner::new();
        runner.push_failure("ERROR 1091: index no existe");
        let session = SqlSession::new(&runner, credentials());
        let ok = session.execute("DROP INDEX `x` ON `t`;", Some("demo"), true).unwrap();
        assert!(ok);
    }

    #[test]
    fn from_env_reporta_la_variable_faltante() {
        std::env::remove_var("MYSQL_USER");
        let err = MysqlCredentials::from_env().unwrap_err();
        assert!(matches!(err, SqlError::MissingEnv(ref name) if name == "MYSQL_USER"));
    }

    #[test]
    fn execute_incluye_base_de_datos_explicita() {
        let runner = ScriptedRunner::new();
        let session = SqlSession::new(&runner, credentials());
        session.execute("SELECT 1;", Some("inventario"), false).unwrap();
        assert!(runner.commands()[0].contains("'inventario' -e"));
    }
}
