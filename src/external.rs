//! Seams to the two external collaborators the core never depends on
//! directly: the graph database holding an ingested source's call graph,
//! and whatever front-end turns source code into such a database.
//!
//! Grounded on the original `JoernBridge`/`Database`/`DatabaseManager`
//! trio: a bridge that shells out to turn source into a database id, and a
//! manager that opens named databases for querying.

use std::collections::HashMap;
use std::path::Path;
use std::process::Command;
use std::time::Duration;

use crate::error::RikaiError;

/// One result row: variable name (as it appeared in the `get` clause,
/// stripped of its leading `$`) to the `Line` attribute value matched.
pub type QueryRow = HashMap<String, i64>;

/// A database session capable of running `match ... get ...;` queries.
pub trait Database {
    fn query(&self, text: &str) -> Result<Vec<QueryRow>, RikaiError>;
}

/// Opens named databases, failing with `UnknownDatabase` if one doesn't
/// exist.
pub trait DatabaseManager {
    fn open(&self, name: &str) -> Result<Box<dyn Database>, RikaiError>;
}

/// Turns a source file into an ingested, queryable database, returning the
/// id of the database created.
pub trait Ingest {
    fn ingest(&self, source: &Path, timeout: Duration) -> Result<String, RikaiError>;
}

/// Spawns a configured external executable the way the original bridge
/// runs joern: `<path> <database-id> <source-file>`, a fresh
/// [`uuid::Uuid`] for the database id, stderr captured on non-zero exit.
pub struct ProcessIngest {
    pub executable: std::path::PathBuf,
}

impl ProcessIngest {
    pub fn new(executable: impl Into<std::path::PathBuf>) -> Self {
        ProcessIngest {
            executable: executable.into(),
        }
    }
}

impl Ingest for ProcessIngest {
    fn ingest(&self, source: &Path, _timeout: Duration) -> Result<String, RikaiError> {
        let database_id = uuid::Uuid::new_v4().to_string();
        let output = Command::new(&self.executable)
            .arg(&database_id)
            .arg(source)
            .output()
            .map_err(|e| RikaiError::IngestFailed {
                exit_code: None,
                stderr: e.to_string(),
            })?;
        if !output.status.success() {
            return Err(RikaiError::IngestFailed {
                exit_code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        Ok(database_id)
    }
}

/// A `DatabaseManager`/`Database` pair that drives queries through the same
/// kind of subprocess the ingest step uses, rather than a real TypeDB
/// driver: `<path> query --host <hostname> --port <port> <database>
/// <query-text>`, a JSON array of row objects on stdout. The real wire
/// protocol stays behind the trait seam, as intended; this is the
/// minimal-but-real CLI wiring for it.
pub struct ProcessDatabaseManager {
    pub executable: std::path::PathBuf,
    pub hostname: String,
    pub port: u16,
}

impl ProcessDatabaseManager {
    pub fn new(executable: impl Into<std::path::PathBuf>, hostname: impl Into<String>, port: u16) -> Self {
        ProcessDatabaseManager {
            executable: executable.into(),
            hostname: hostname.into(),
            port,
        }
    }
}

impl DatabaseManager for ProcessDatabaseManager {
    fn open(&self, name: &str) -> Result<Box<dyn Database>, RikaiError> {
        Ok(Box::new(ProcessDatabase {
            executable: self.executable.clone(),
            hostname: self.hostname.clone(),
            port: self.port,
            database: name.to_string(),
        }))
    }
}

pub struct ProcessDatabase {
    executable: std::path::PathBuf,
    hostname: String,
    port: u16,
    database: String,
}

impl Database for ProcessDatabase {
    fn query(&self, text: &str) -> Result<Vec<QueryRow>, RikaiError> {
        let output = Command::new(&self.executable)
            .arg("query")
            .arg("--host")
            .arg(&self.hostname)
            .arg("--port")
            .arg(self.port.to_string())
            .arg(&self.database)
            .arg(text)
            .output()
            .map_err(|e| RikaiError::QueryExecutionError(e.to_string()))?;
        if !output.status.success() {
            return Err(RikaiError::QueryExecutionError(
                String::from_utf8_lossy(&output.stderr).into_owned(),
            ));
        }
        serde_json::from_slice(&output.stdout).map_err(|e| RikaiError::QueryExecutionError(e.to_string()))
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;

    /// An in-memory `Database` backed by a fixed result set, for testing
    /// the matcher without a real graph database.
    pub struct MockDatabase {
        rows: Vec<QueryRow>,
    }

    impl MockDatabase {
        pub fn empty() -> Self {
            MockDatabase { rows: Vec::new() }
        }

        pub fn with_fixed_result(rows: Vec<QueryRow>) -> Self {
            MockDatabase { rows }
        }
    }

    impl Database for MockDatabase {
        fn query(&self, _text: &str) -> Result<Vec<QueryRow>, RikaiError> {
            Ok(self.rows.clone())
        }
    }

    pub struct MockDatabaseManager {
        pub known: Vec<String>,
    }

    impl DatabaseManager for MockDatabaseManager {
        fn open(&self, name: &str) -> Result<Box<dyn Database>, RikaiError> {
            if !self.known.contains(&name.to_string()) {
                return Err(RikaiError::UnknownDatabase(name.to_string()));
            }
            Ok(Box::new(MockDatabase::empty()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{MockDatabase, MockDatabaseManager};
    use super::*;

    #[test]
    fn mock_database_returns_fixed_rows() {
        let mut row = HashMap::new();
        row.insert("l".to_string(), 10);
        let db = MockDatabase::with_fixed_result(vec![row.clone()]);
        assert_eq!(db.query("match ...").unwrap(), vec![row]);
    }

    #[test]
    fn manager_rejects_unknown_database() {
        let manager = MockDatabaseManager { known: vec!["a".into()] };
        let err = manager.open("b").unwrap_err();
        assert!(matches!(err, RikaiError::UnknownDatabase(_)));
    }

    #[test]
    fn manager_opens_known_database() {
        let manager = MockDatabaseManager { known: vec!["a".into()] };
        assert!(manager.open("a").is_ok());
    }

    #[test]
    fn process_ingest_reports_failure_for_missing_executable() {
        let ingest = ProcessIngest::new("/nonexistent/rikai-ingest-binary");
        let result = ingest.ingest(Path::new("/tmp/does-not-matter.c"), Duration::from_secs(1));
        assert!(result.is_err());
    }

    #[test]
    fn process_database_reports_failure_for_missing_executable() {
        let manager = ProcessDatabaseManager::new("/nonexistent/rikai-ingest-binary", "localhost", 1729);
        let db = manager.open("some-db").unwrap();
        assert!(db.query("match $x isa Call; get;").is_err());
    }
}
