//! Translation of `%(name)s` placeholders into positional `$n` binds.
//!
//! Statements are written (and rendered by the builders) with named
//! placeholders. The driver only understands `$1, $2, ...`, so right before
//! execution every `%(name)s` is replaced by the index of `name` in order of
//! first appearance, and the bound values are collected in that same order.
//!
//! Quoted strings, quoted identifiers, comments and dollar-quoted bodies are
//! copied through untouched.

use crate::error::{WrapError, WrapResult};
use crate::param::{Param, Params};
use std::borrow::Cow;
use tokio_postgres::types::ToSql;

/// A statement with named placeholders rewritten to `$n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedSql<'a> {
    /// SQL text using positional placeholders.
    pub sql: Cow<'a, str>,
    /// Placeholder names; `names[i]` binds to `$i+1`.
    pub names: Vec<String>,
}

impl NamedSql<'_> {
    /// Collect the bound values in placeholder order.
    ///
    /// Fails with [`WrapError::MissingParameter`] when a placeholder has no
    /// value. Unused entries in `params` are ignored.
    pub fn bind<'p>(&self, params: &'p Params) -> WrapResult<Vec<&'p (dyn ToSql + Sync)>> {
        self.names
            .iter()
            .map(|name| {
                params
                    .get(name)
                    .map(Param::as_sql)
                    .ok_or_else(|| WrapError::MissingParameter(name.clone()))
            })
            .collect()
    }
}

#[derive(Clone)]
enum State {
    Normal,
    SingleQuoted,
    DoubleQuoted,
    LineComment,
    BlockComment(u32),
    DollarQuoted(String),
}

/// Rewrite `%(name)s` placeholders as `$n` and `%%` as `%`.
///
/// Returns a borrowed `Cow` when the statement contains neither.
pub fn translate_named(sql: &str) -> NamedSql<'_> {
    let bytes = sql.as_bytes();
    let mut names: Vec<String> = Vec::new();
    let mut out: Option<String> = None;
    let mut copied = 0;
    let mut state = State::Normal;
    let mut idx = 0;

    while idx < bytes.len() {
        let b = bytes[idx];
        match state {
            State::Normal => match b {
                b'\'' => state = State::SingleQuoted,
                b'"' => state = State::DoubleQuoted,
                b'-' if bytes.get(idx + 1) == Some(&b'-') => state = State::LineComment,
                b'/' if bytes.get(idx + 1) == Some(&b'*') => {
                    state = State::BlockComment(1);
                    idx += 1;
                }
                b'$' => {
                    if let Some((tag, end)) = dollar_tag(bytes, idx) {
                        state = State::DollarQuoted(tag);
                        idx = end;
                    }
                }
                b'%' if bytes.get(idx + 1) == Some(&b'%') => {
                    let buf = out.get_or_insert_with(String::new);
                    buf.push_str(&sql[copied..idx]);
                    buf.push('%');
                    idx += 2;
                    copied = idx;
                    continue;
                }
                b'%' => {
                    if let Some((name, end)) = named_placeholder(sql, idx) {
                        let position = match names.iter().position(|n| n == name) {
                            Some(pos) => pos + 1,
                            None => {
                                names.push(name.to_string());
                                names.len()
                            }
                        };
                        let buf = out.get_or_insert_with(String::new);
                        buf.push_str(&sql[copied..idx]);
                        buf.push('$');
                        buf.push_str(&position.to_string());
                        idx = end;
                        copied = idx;
                        continue;
                    }
                }
                _ => {}
            },
            State::SingleQuoted => {
                if b == b'\'' {
                    if bytes.get(idx + 1) == Some(&b'\'') {
                        idx += 1;
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::DoubleQuoted => {
                if b == b'"' {
                    if bytes.get(idx + 1) == Some(&b'"') {
                        idx += 1;
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::LineComment => {
                if b == b'\n' {
                    state = State::Normal;
                }
            }
            State::BlockComment(depth) => {
                if b == b'/' && bytes.get(idx + 1) == Some(&b'*') {
                    state = State::BlockComment(depth + 1);
                    idx += 1;
                } else if b == b'*' && bytes.get(idx + 1) == Some(&b'/') {
                    state = if depth == 1 {
                        State::Normal
                    } else {
                        State::BlockComment(depth - 1)
                    };
                    idx += 1;
                }
            }
            State::DollarQuoted(ref tag) => {
                if b == b'$' && closes_tag(bytes, idx, tag) {
                    idx += tag.len() + 1;
                    state = State::Normal;
                }
            }
        }
        idx += 1;
    }

    let sql = match out {
        Some(mut buf) => {
            buf.push_str(&sql[copied..]);
            Cow::Owned(buf)
        }
        None => Cow::Borrowed(sql),
    };
    NamedSql { sql, names }
}

/// Parse `%(name)s` starting at `start`; returns the name and the index just
/// past the trailing `s`.
fn named_placeholder(sql: &str, start: usize) -> Option<(&str, usize)> {
    let rest = sql.get(start + 1..)?;
    let inner = rest.strip_prefix('(')?;
    let close = inner.find(')')?;
    let name = &inner[..close];
    if name.is_empty() || !inner[close + 1..].starts_with('s') {
        return None;
    }
    // '%' + '(' + name + ')' + 's'
    Some((name, start + name.len() + 4))
}

/// Recognise an opening `$tag$`; returns the tag and the index of its
/// closing `$`.
fn dollar_tag(bytes: &[u8], start: usize) -> Option<(String, usize)> {
    let mut idx = start + 1;
    if bytes.get(idx).is_some_and(|b| b.is_ascii_digit()) {
        return None;
    }
    while idx < bytes.len() && bytes[idx] != b'$' {
        let b = bytes[idx];
        if !(b.is_ascii_alphanumeric() || b == b'_') {
            return None;
        }
        idx += 1;
    }
    if idx < bytes.len() {
        let tag = String::from_utf8(bytes[start + 1..idx].to_vec()).ok()?;
        Some((tag, idx))
    } else {
        None
    }
}

fn closes_tag(bytes: &[u8], idx: usize, tag: &str) -> bool {
    let end = idx + 1 + tag.len();
    end < bytes.len() && &bytes[idx + 1..end] == tag.as_bytes() && bytes[end] == b'$'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrites_named_placeholders_in_order() {
        let named = translate_named("UPDATE t SET a = %(a)s WHERE id = %(id)s");
        assert_eq!(named.sql, "UPDATE t SET a = $1 WHERE id = $2");
        assert_eq!(named.names, ["a", "id"]);
    }

    #[test]
    fn repeated_name_reuses_index() {
        let named = translate_named("SELECT * FROM t WHERE a = %(x)s OR b = %(x)s AND c = %(y)s");
        assert_eq!(named.sql, "SELECT * FROM t WHERE a = $1 OR b = $1 AND c = $2");
        assert_eq!(named.names, ["x", "y"]);
    }

    #[test]
    fn plain_sql_is_borrowed() {
        let named = translate_named("SELECT 5 % 2");
        assert!(matches!(named.sql, Cow::Borrowed(_)));
        assert!(named.names.is_empty());
    }

    #[test]
    fn double_percent_collapses() {
        let named = translate_named("SELECT 'a' || %(s)s || '%%' WHERE x LIKE 'a%%' AND y = 10 %% 3");
        assert_eq!(named.sql, "SELECT 'a' || $1 || '%%' WHERE x LIKE 'a%%' AND y = 10 % 3");
    }

    #[test]
    fn skips_literals_and_comments() {
        let sql = "SELECT '%(a)s', \"%(b)s\" -- %(c)s\n/* %(d)s /* %(e)s */ */ FROM t WHERE x = %(f)s";
        let named = translate_named(sql);
        assert_eq!(
            named.sql,
            "SELECT '%(a)s', \"%(b)s\" -- %(c)s\n/* %(d)s /* %(e)s */ */ FROM t WHERE x = $1"
        );
        assert_eq!(named.names, ["f"]);
    }

    #[test]
    fn skips_dollar_quoted_bodies() {
        let named = translate_named("SELECT $fn$ %(a)s $fn$, $$ %(c)s $$, %(b)s");
        assert_eq!(named.sql, "SELECT $fn$ %(a)s $fn$, $$ %(c)s $$, $1");
        assert_eq!(named.names, ["b"]);
    }

    #[test]
    fn dotted_names_and_utf8_survive() {
        let named = translate_named("SELECT 'é' WHERE u.id = %(u.id)s AND name = 'ü'");
        assert_eq!(named.sql, "SELECT 'é' WHERE u.id = $1 AND name = 'ü'");
        assert_eq!(named.names, ["u.id"]);
    }

    #[test]
    fn malformed_placeholders_are_left_alone() {
        let named = translate_named("SELECT %(a) , %()s, %(b)d");
        assert_eq!(named.sql, "SELECT %(a) , %()s, %(b)d");
        assert!(named.names.is_empty());
    }

    #[test]
    fn bind_orders_values_and_reports_missing() {
        let params = Params::new().with("id", 1i32).with("a", "x").with("unused", true);
        let named = translate_named("UPDATE t SET a = %(a)s WHERE id = %(id)s");
        let bound = named.bind(&params).unwrap();
        assert_eq!(bound.len(), 2);
        assert_eq!(format!("{:?}", bound[0]), "\"x\"");
        assert_eq!(format!("{:?}", bound[1]), "1");

        let missing = translate_named("SELECT %(nope)s");
        let err = missing.bind(&params).unwrap_err();
        assert!(matches!(err, WrapError::MissingParameter(ref n) if n == "nope"));
    }
}
