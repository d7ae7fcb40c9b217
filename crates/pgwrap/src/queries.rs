//! Named queries stored as `<dir>/<name>.sql` files.

use crate::error::WrapResult;
use std::borrow::Cow;
use std::io::ErrorKind;
use std::path::Path;

/// Resolve `name` to the contents of `<dir>/<name>.sql`.
///
/// When no such file exists the input itself is returned, so callers can
/// pass either a query name or literal SQL. Inputs containing whitespace or
/// `;` are never valid names and are returned without touching the
/// filesystem.
pub async fn load_query<'a>(dir: &Path, name: &'a str) -> WrapResult<Cow<'a, str>> {
    if !looks_like_name(name) {
        return Ok(Cow::Borrowed(name));
    }
    let path = dir.join(format!("{name}.sql"));
    match tokio::fs::read_to_string(&path).await {
        Ok(sql) => {
            tracing::trace!(target: "pgwrap.sql", path = %path.display(), "loaded named query");
            Ok(Cow::Owned(sql))
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(Cow::Borrowed(name)),
        Err(e) => Err(e.into()),
    }
}

fn looks_like_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(|c: char| c.is_whitespace() || c == ';')
}
