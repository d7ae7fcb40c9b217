//! The pool handle every session is checked out from.

use crate::config::{Configuration, DEFAULT_CONFIGURATION_FILE};
use crate::error::WrapResult;
use crate::pool::create_pool;
use crate::session::{Session, SessionSettings};
use deadpool_postgres::{Pool, Status};
use futures_util::future::BoxFuture;
use std::path::Path;
use std::sync::{Arc, OnceLock};

static INSTANCE: OnceLock<Database> = OnceLock::new();

/// Owns the connection pool and the settings sessions inherit.
///
/// Cheap to clone; clones share one pool.
///
/// ```ignore
/// let db = pgwrap::Database::connect(Configuration::from_file("db.json")?)?;
/// let total = db
///     .scoped(|session| Box::pin(async move {
///         session.execute("SELECT count(*) AS n FROM test", &Params::new()).await?
///             .fetch_one().await?
///             .map(|row| row.get_as::<i64>("n"))
///             .transpose()
///     }))
///     .await?;
/// ```
#[derive(Clone)]
pub struct Database {
    pool: Pool,
    settings: Arc<SessionSettings>,
}

impl Database {
    /// Build the pool described by `configuration`.
    ///
    /// No connection is opened until the first session is requested.
    pub fn connect(configuration: Configuration) -> WrapResult<Self> {
        let pool = create_pool(&configuration)?;
        tracing::debug!(
            target: "pgwrap.pool",
            host = %configuration.host,
            port = configuration.port,
            database = %configuration.database,
            max_connection = configuration.max_connection,
            "pool created"
        );
        Ok(Self {
            pool,
            settings: Arc::new(SessionSettings {
                print_sql: configuration.print_sql,
                queries_directory: configuration.queries_directory,
            }),
        })
    }

    /// [`Database::connect`] with a configuration read from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> WrapResult<Self> {
        Self::connect(Configuration::from_file(path)?)
    }

    /// The process-wide handle, created by the first call.
    ///
    /// The first caller's configuration wins; `None` reads
    /// `/etc/pgwrap/configuration.json`. Later calls return the existing
    /// handle and ignore their argument.
    pub fn instance(configuration: Option<Configuration>) -> WrapResult<&'static Database> {
        if let Some(db) = INSTANCE.get() {
            return Ok(db);
        }
        let configuration = match configuration {
            Some(configuration) => configuration,
            None => Configuration::from_file(DEFAULT_CONFIGURATION_FILE)?,
        };
        let db = Self::connect(configuration)?;
        Ok(INSTANCE.get_or_init(|| db))
    }

    /// Underlying `deadpool-postgres` pool.
    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    pub fn status(&self) -> Status {
        self.pool.status()
    }

    /// Close the pool. Checked-out connections are dropped when returned and
    /// later checkouts fail.
    pub fn close(&self) {
        tracing::debug!(target: "pgwrap.pool", "pool closed");
        self.pool.close();
    }

    /// Check a connection out and open a transaction on it.
    ///
    /// The returned session must be ended with [`Session::finish`],
    /// [`Session::commit`] or [`Session::rollback`].
    pub async fn session(&self) -> WrapResult<Session> {
        let client = self.pool.get().await?;
        Session::begin(client, Arc::clone(&self.settings)).await
    }

    /// Run `f` inside a session: commit if it returns `Ok`, roll back if it
    /// returns `Err`. The connection goes back to the pool either way.
    pub async fn scoped<T, F>(&self, f: F) -> WrapResult<T>
    where
        F: for<'s> FnOnce(&'s Session) -> BoxFuture<'s, WrapResult<T>>,
    {
        let session = self.session().await?;
        let result = f(&session).await;
        session.finish(result).await
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("status", &self.pool.status())
            .field("settings", &self.settings)
            .finish()
    }
}
