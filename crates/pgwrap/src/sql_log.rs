//! Statement logging through `tracing`.
//!
//! Every statement is emitted on the `pgwrap.sql` target before it is sent:
//! at INFO when `print_sql` is enabled, at TRACE otherwise.

use crate::param::Params;
use tracing::Level;

/// Longest SQL text (in bytes) put into a single event.
const MAX_SQL_LENGTH: usize = 4096;

/// Truncate `sql` to at most `max_bytes`, backing off to a char boundary.
pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

pub(crate) fn statement_level(print_sql: bool) -> Level {
    if print_sql { Level::INFO } else { Level::TRACE }
}

/// Emit the statement about to run together with its parameter mapping.
pub(crate) fn log_statement(print_sql: bool, sql: &str, params: &Params) {
    let shown = truncate_sql_bytes(sql, MAX_SQL_LENGTH);
    let truncated = shown.len() < sql.len();
    let params = tracing::field::debug(params);
    match statement_level(print_sql) {
        Level::INFO => tracing::info!(target: "pgwrap.sql", sql = shown, truncated, params, "SQL"),
        _ => tracing::trace!(target: "pgwrap.sql", sql = shown, truncated, params, "SQL"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_sql_bytes("SELECT 1", 100), "SELECT 1");
        assert_eq!(truncate_sql_bytes("SELECT 1", 6), "SELECT");
        // 'é' is two bytes; cutting inside it backs off
        assert_eq!(truncate_sql_bytes("é", 1), "");
    }

    #[test]
    fn level_follows_print_sql() {
        assert_eq!(statement_level(true), Level::INFO);
        assert_eq!(statement_level(false), Level::TRACE);
    }
}
