//! Statement builders.
//!
//! Each builder accumulates a table, field/value state and WHERE conditions,
//! then renders one statement with `%(name)s` placeholders plus the mapping
//! of bound values.
//!
//! ## Design
//!
//! - Keywords are upper-case, clauses separated by single spaces.
//! - WHERE conditions are joined with `AND` only.
//! - Values are always bound; `*_constant` methods are the explicit escape
//!   hatch for literal SQL.
//! - UPDATE requires at least one assignment.

pub mod delete;
pub mod insert;
pub mod select;
pub mod traits;
pub mod update;
pub mod where_clause;

pub use delete::DeleteBuilder;
pub use insert::InsertBuilder;
pub use select::SelectBuilder;
pub use traits::Statement;
pub use update::UpdateBuilder;
pub use where_clause::{Filter, WhereClause};

/// Standalone SELECT builder.
pub fn select(table: &str) -> SelectBuilder<'static> {
    SelectBuilder::new(table)
}

/// Standalone INSERT builder.
pub fn insert(table: &str) -> InsertBuilder<'static> {
    InsertBuilder::new(table)
}

/// Standalone UPDATE builder.
pub fn update(table: &str) -> UpdateBuilder<'static> {
    UpdateBuilder::new(table)
}

/// Standalone DELETE builder.
pub fn delete(table: &str) -> DeleteBuilder<'static> {
    DeleteBuilder::new(table)
}
