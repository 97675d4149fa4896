//! Open-time configuration.

use crate::error::{Result, TableError};
use crate::schema::Schema;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Where the database lives and how to prepare it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AccessorConfig {
    /// Database name; only the part before the first `.` is used.
    pub name: String,
    /// Directory holding the database file. Created if missing.
    pub path: PathBuf,
    /// How long a statement waits on a locked database before failing.
    #[serde(default)]
    pub busy_timeout_ms: Option<u64>,
    /// Tables created on open if they do not exist.
    #[serde(default)]
    pub schema: Schema,
}

impl AccessorConfig {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            busy_timeout_ms: None,
            schema: Schema::default(),
        }
    }

    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = schema;
        self
    }

    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout_ms = Some(timeout.as_millis().try_into().unwrap_or(u64::MAX));
        self
    }

    /// Check that `name` and `path` are usable.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() || self.path.as_os_str().is_empty() {
            return Err(TableError::Configuration(
                "props \"name\" and \"path\" are expected".to_string(),
            ));
        }
        if self.stem().is_empty() {
            return Err(TableError::Configuration(format!(
                "database name {:?} has an empty first segment",
                self.name
            )));
        }
        Ok(())
    }

    /// Text before the first `.` of `name`.
    fn stem(&self) -> &str {
        self.name.split('.').next().unwrap_or_default()
    }

    /// The database file: `<path>/<stem>.db`.
    pub fn db_file(&self) -> PathBuf {
        self.path.join(format!("{}.db", self.stem()))
    }

    pub(crate) fn busy_timeout(&self) -> Option<Duration> {
        self.busy_timeout_ms.map(Duration::from_millis)
    }
}

/// Create `dir` and its parents if needed.
pub fn ensure_database_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|source| TableError::Io {
        path: dir.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn db_file_uses_first_segment() {
        let config = AccessorConfig::new("users", "/data");
        assert_eq!(config.db_file(), PathBuf::from("/data/users.db"));

        let config = AccessorConfig::new("users.sqlite.bak", "/data");
        assert_eq!(config.db_file(), PathBuf::from("/data/users.db"));
    }

    #[test]
    fn rejects_missing_fields() {
        let err = AccessorConfig::new("", "/data").validate().unwrap_err();
        assert!(matches!(err, TableError::Configuration(_)));
        assert!(AccessorConfig::new("users", "").validate().is_err());
        assert!(AccessorConfig::new(".hidden", "/data").validate().is_err());
        assert!(AccessorConfig::new("users", "/data").validate().is_ok());
    }

    #[test]
    fn ensure_dir_creates_nested_directories() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("a").join("b");
        ensure_database_dir(&nested).unwrap();
        assert!(nested.is_dir());
        // Already present is fine.
        ensure_database_dir(&nested).unwrap();
    }

    #[test]
    fn loads_from_json() {
        let config: AccessorConfig = serde_json::from_value(serde_json::json!({
            "name": "app.db",
            "path": "/var/lib/app",
            "busy_timeout_ms": 250
        }))
        .unwrap();
        assert_eq!(config.db_file(), PathBuf::from("/var/lib/app/app.db"));
        assert_eq!(config.busy_timeout(), Some(Duration::from_millis(250)));
        assert!(config.schema.is_empty());
    }
}
