//! Connection settings.
//!
//! A [`Configuration`] is read once at start-up (from a JSON file, a JSON
//! string or an in-memory `serde_json::Value`) and handed to
//! [`Database::connect`](crate::Database::connect).
//!
//! ```json
//! {
//!   "database": "app",
//!   "host": "localhost",
//!   "port": 5432,
//!   "username": "app",
//!   "password": "secret",
//!   "max_connection": 10,
//!   "print_sql": false
//! }
//! ```

use crate::error::{WrapError, WrapResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Configuration file used by [`Database::instance`](crate::Database::instance)
/// when no configuration is supplied.
pub const DEFAULT_CONFIGURATION_FILE: &str = "/etc/pgwrap/configuration.json";

/// Default directory for named query files.
pub const DEFAULT_QUERIES_DIRECTORY: &str = "sql";

/// Pool and session settings.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    /// Database name.
    pub database: String,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Maximum number of pooled connections.
    pub max_connection: usize,
    /// Log every statement at INFO on the `pgwrap.sql` target.
    #[serde(default)]
    pub print_sql: bool,
    /// Directory holding `<name>.sql` files, relative paths resolve against
    /// the current directory at lookup time.
    #[serde(default = "default_queries_directory")]
    pub queries_directory: PathBuf,
}

fn default_queries_directory() -> PathBuf {
    PathBuf::from(DEFAULT_QUERIES_DIRECTORY)
}

impl Configuration {
    /// Create a configuration with a 16 connection pool and SQL logging off.
    pub fn new(
        database: impl Into<String>,
        host: impl Into<String>,
        port: u16,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            database: database.into(),
            host: host.into(),
            port,
            username: username.into(),
            password: password.into(),
            max_connection: 16,
            print_sql: false,
            queries_directory: default_queries_directory(),
        }
    }

    /// Set the pool size.
    pub fn max_connection(mut self, max: usize) -> Self {
        self.max_connection = max;
        self
    }

    /// Enable or disable statement logging.
    pub fn print_sql(mut self, enabled: bool) -> Self {
        self.print_sql = enabled;
        self
    }

    /// Set the directory searched for named queries.
    pub fn queries_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.queries_directory = dir.into();
        self
    }

    /// Build from an in-memory JSON object.
    pub fn from_value(value: serde_json::Value) -> WrapResult<Self> {
        let configuration: Self = serde_json::from_value(value)
            .map_err(|e| WrapError::invalid_configuration(e.to_string()))?;
        configuration.validate()
    }

    /// Parse a JSON document.
    pub fn from_json_str(json: &str) -> WrapResult<Self> {
        let configuration: Self = serde_json::from_str(json)
            .map_err(|e| WrapError::invalid_configuration(e.to_string()))?;
        configuration.validate()
    }

    /// Read a JSON configuration file.
    ///
    /// Fails with [`WrapError::ConfigurationNotFound`] when the file does not
    /// exist and [`WrapError::ConfigurationInvalid`] when it cannot be parsed.
    pub fn from_file(path: impl AsRef<Path>) -> WrapResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(WrapError::ConfigurationNotFound(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    fn validate(self) -> WrapResult<Self> {
        if self.max_connection == 0 {
            return Err(WrapError::invalid_configuration(
                "max_connection must be at least 1",
            ));
        }
        Ok(self)
    }
}

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("database", &self.database)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("max_connection", &self.max_connection)
            .field("print_sql", &self.print_sql)
            .field("queries_directory", &self.queries_directory)
            .finish()
    }
}
