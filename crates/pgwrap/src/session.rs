//! Connection scopes: one pooled connection, one transaction.
//!
//! A [`Session`] checks a connection out of the pool and opens a transaction
//! on it. [`Session::finish`] commits when the scoped work succeeded, rolls
//! back when it failed, and always hands the connection back to the pool.
//!
//! ```ignore
//! use pgwrap::{Database, Statement};
//!
//! # async fn demo(db: &Database) -> pgwrap::WrapResult<()> {
//! pgwrap::scope!(db, session, {
//!     session.insert("test").set("id", 1i32).set("description", "Test").execute().await?;
//!     Ok(())
//! })?;
//! # Ok(()) }
//! ```

use crate::builder::{DeleteBuilder, InsertBuilder, SelectBuilder, UpdateBuilder};
use crate::cursor::Cursor;
use crate::error::{WrapError, WrapResult};
use crate::page::{Page, windowed};
use crate::param::Params;
use crate::placeholder::translate_named;
use crate::queries::load_query;
use crate::sql_log::log_statement;
use std::path::PathBuf;
use std::sync::Arc;

/// Runs the given block inside a session.
///
/// - Checks a connection out of `$db` and begins a transaction.
/// - Commits on `Ok(_)`.
/// - Rolls back on `Err(_)`.
/// - Returns the connection to the pool in both cases.
///
/// The block must evaluate to `pgwrap::WrapResult<T>`.
#[macro_export]
macro_rules! scope {
    ($db:expr, $session:ident, $body:block) => {{
        let $session = ($db).session().await?;
        let __pgwrap_scope_result = async { $body }.await;
        $session.finish(__pgwrap_scope_result).await
    }};
}

/// Settings shared by every session of a [`Database`](crate::Database).
#[derive(Debug, Clone)]
pub(crate) struct SessionSettings {
    pub(crate) print_sql: bool,
    pub(crate) queries_directory: PathBuf,
}

/// A pooled connection with an open transaction.
pub struct Session {
    client: Option<deadpool_postgres::Client>,
    settings: Arc<SessionSettings>,
}

impl Session {
    pub(crate) async fn begin(
        client: deadpool_postgres::Client,
        settings: Arc<SessionSettings>,
    ) -> WrapResult<Self> {
        client.batch_execute("BEGIN").await?;
        tracing::debug!(target: "pgwrap.session", "transaction started");
        Ok(Self {
            client: Some(client),
            settings,
        })
    }

    fn client(&self) -> WrapResult<&deadpool_postgres::Client> {
        self.client
            .as_ref()
            .ok_or_else(|| WrapError::Other("session already finished".to_string()))
    }

    // ==================== Statement builders ====================

    /// SELECT builder bound to this session.
    pub fn select(&self, table: &str) -> SelectBuilder<'_> {
        SelectBuilder::bound(self, table)
    }

    /// INSERT builder bound to this session.
    pub fn insert(&self, table: &str) -> InsertBuilder<'_> {
        InsertBuilder::bound(self, table)
    }

    /// UPDATE builder bound to this session.
    pub fn update(&self, table: &str) -> UpdateBuilder<'_> {
        UpdateBuilder::bound(self, table)
    }

    /// DELETE builder bound to this session.
    pub fn delete(&self, table: &str) -> DeleteBuilder<'_> {
        DeleteBuilder::bound(self, table)
    }

    // ==================== Execution ====================

    /// Run a named query or literal SQL.
    ///
    /// `name_or_sql` is first looked up as `<queries_directory>/<name>.sql`;
    /// when no such file exists it is executed as SQL text.
    pub async fn execute(&self, name_or_sql: &str, params: &Params) -> WrapResult<Cursor> {
        let sql = load_query(&self.settings.queries_directory, name_or_sql).await?;
        self.execute_sql(&sql, params).await
    }

    /// Run SQL text with `%(name)s` placeholders, skipping the file lookup.
    ///
    /// Statements without a result set (plain INSERT/UPDATE/DELETE) are
    /// driven to completion before returning, so their errors surface here
    /// and the cursor only reports the affected row count.
    pub async fn execute_sql(&self, sql: &str, params: &Params) -> WrapResult<Cursor> {
        let named = translate_named(sql);
        let bound = named.bind(params)?;
        log_statement(self.settings.print_sql, sql, params);

        let client = self.client()?;
        let statement = client.prepare(&named.sql).await?;
        let columns: Arc<[String]> = statement
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();
        let stream = client.query_raw(&statement, bound).await?;
        let mut cursor = Cursor::new(columns, stream);
        if cursor.columns().is_empty() {
            cursor.row_count().await?;
        }
        Ok(cursor)
    }

    /// Run a multi-statement script without parameters.
    pub async fn execute_batch(&self, script: &str) -> WrapResult<()> {
        log_statement(self.settings.print_sql, script, &Params::new());
        self.client()?.batch_execute(script).await?;
        Ok(())
    }

    /// Fetch page `page` of `size` rows of `sql`.
    pub async fn paging(
        &self,
        sql: &str,
        params: &Params,
        page: u64,
        size: u64,
    ) -> WrapResult<Page> {
        let sql = windowed(sql, page, size);
        let rows = self.execute_sql(&sql, params).await?.fetch_all().await?;
        Ok(Page::from_overfetch(page, size, rows))
    }

    /// [`Session::paging`] for a named query (falling back to literal SQL).
    pub async fn paging_named(
        &self,
        name_or_sql: &str,
        params: &Params,
        page: u64,
        size: u64,
    ) -> WrapResult<Page> {
        let sql = load_query(&self.settings.queries_directory, name_or_sql).await?;
        self.paging(&sql, params, page, size).await
    }

    // ==================== Scope exit ====================

    /// Commit, release the connection and return `result`; or roll back and
    /// return the error when `result` is `Err`.
    pub async fn finish<T>(mut self, result: WrapResult<T>) -> WrapResult<T> {
        match result {
            Ok(value) => {
                self.end("COMMIT").await?;
                Ok(value)
            }
            Err(error) => match self.end("ROLLBACK").await {
                Ok(()) => Err(error),
                Err(rollback_err) => Err(WrapError::Other(format!(
                    "{error} (rollback failed: {rollback_err})"
                ))),
            },
        }
    }

    /// Commit and release the connection.
    pub async fn commit(mut self) -> WrapResult<()> {
        self.end("COMMIT").await
    }

    /// Roll back and release the connection.
    pub async fn rollback(mut self) -> WrapResult<()> {
        self.end("ROLLBACK").await
    }

    async fn end(&mut self, command: &str) -> WrapResult<()> {
        let client = self
            .client
            .take()
            .ok_or_else(|| WrapError::Other("session already finished".to_string()))?;
        match client.batch_execute(command).await {
            Ok(()) => {
                tracing::debug!(target: "pgwrap.session", command, "transaction ended");
                Ok(())
            }
            Err(e) => {
                // Connection state is unknown; keep it out of the pool.
                drop(deadpool_postgres::Client::take(client));
                Err(e.into())
            }
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(client) = self.client.take() {
            tracing::warn!(
                target: "pgwrap.session",
                "session dropped without commit or rollback; discarding its connection"
            );
            drop(deadpool_postgres::Client::take(client));
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("open", &self.client.is_some())
            .field("settings", &self.settings)
            .finish()
    }
}
