use crate::cursor::Cursor;
use crate::error::{WrapError, WrapResult};
use crate::param::Params;
use crate::session::Session;

/// Base trait for statement builders.
pub trait Statement: Sync {
    /// Render the statement text with `%(name)s` placeholders.
    fn render(&self) -> WrapResult<String>;

    /// Values bound so far, keyed by placeholder name.
    fn params(&self) -> &Params;

    /// Session the builder was created from, if any.
    fn session(&self) -> Option<&Session>;

    /// Render and run through `session`, skipping the named-query lookup.
    fn execute_on(
        &self,
        session: &Session,
    ) -> impl std::future::Future<Output = WrapResult<Cursor>> + Send {
        async move {
            let sql = self.render()?;
            session.execute_sql(&sql, self.params()).await
        }
    }

    /// Render and run through the owning session.
    ///
    /// Fails with [`WrapError::Unbound`] for builders created without one.
    fn execute(&self) -> impl std::future::Future<Output = WrapResult<Cursor>> + Send {
        async move {
            let session = self.session().ok_or(WrapError::Unbound)?;
            self.execute_on(session).await
        }
    }

    /// Run and return the number of rows returned or affected.
    fn execute_affected(&self) -> impl std::future::Future<Output = WrapResult<u64>> + Send {
        async move { self.execute().await?.row_count().await }
    }
}
