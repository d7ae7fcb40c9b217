//! Offset pagination with a one-row overfetch.
//!
//! A page of `size` rows is requested as `LIMIT size + 1`; the extra row,
//! if present, proves another page exists and is dropped from the result.
//! No separate COUNT query is needed.

use crate::row::Row;
use serde::Serialize;

/// One window of rows.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Page {
    /// Zero-based page number.
    pub number: u64,
    pub size: u64,
    /// At most `size` rows.
    pub data: Vec<Row>,
    /// No rows exist past this page.
    pub last: bool,
}

impl Page {
    /// Build a page from an overfetched window of up to `size + 1` rows.
    pub fn from_overfetch(number: u64, size: u64, mut rows: Vec<Row>) -> Self {
        let last = rows.len() as u64 <= size;
        if !last {
            rows.truncate(size as usize);
        }
        Self {
            number,
            size,
            data: rows,
            last,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// `LIMIT size + 1 OFFSET page * size`.
pub fn window_clause(page: u64, size: u64) -> String {
    format!(
        "LIMIT {} OFFSET {}",
        size.saturating_add(1),
        page.saturating_mul(size)
    )
}

/// Append the window to caller-supplied SQL.
///
/// The window goes on its own line so a trailing `--` comment cannot swallow
/// it. One trailing `;` is dropped.
pub fn windowed(sql: &str, page: u64, size: u64) -> String {
    let body = sql.trim_end();
    let body = body.strip_suffix(';').unwrap_or(body);
    format!("{body}\n{}", window_clause(page, size))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows(ids: std::ops::RangeInclusive<i32>) -> Vec<Row> {
        ids.map(|id| Row::from_values(vec!["id".to_string()], vec![json!(id)]))
            .collect()
    }

    #[test]
    fn window_overfetches_by_one() {
        assert_eq!(window_clause(0, 10), "LIMIT 11 OFFSET 0");
        assert_eq!(window_clause(3, 2), "LIMIT 3 OFFSET 6");
    }

    #[test]
    fn window_survives_trailing_line_comment() {
        assert_eq!(
            windowed("SELECT id FROM t ORDER BY id -- oldest first\n", 1, 2),
            "SELECT id FROM t ORDER BY id -- oldest first\nLIMIT 3 OFFSET 2"
        );
        assert_eq!(
            windowed("SELECT id FROM t;\n", 0, 5),
            "SELECT id FROM t\nLIMIT 6 OFFSET 0"
        );
    }

    #[test]
    fn full_window_is_not_last() {
        let page = Page::from_overfetch(0, 2, rows(1..=3));
        assert!(!page.last);
        assert_eq!(page.len(), 2);
        assert_eq!(page.data[1]["id"], json!(2));
    }

    #[test]
    fn short_window_is_last() {
        let page = Page::from_overfetch(1, 2, rows(3..=4));
        assert!(page.last);
        assert_eq!(page.len(), 2);

        let empty = Page::from_overfetch(5, 2, Vec::new());
        assert!(empty.last);
        assert!(empty.is_empty());
    }

    #[test]
    fn serializes_like_a_mapping() {
        let page = Page::from_overfetch(0, 1, rows(1..=1));
        assert_eq!(
            serde_json::to_value(&page).unwrap(),
            json!({"number": 0, "size": 1, "data": [{"id": 1}], "last": true})
        );
    }
}
