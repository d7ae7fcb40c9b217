//! Shared WHERE clause for SELECT, UPDATE and DELETE.

use crate::param::Params;
use tokio_postgres::types::ToSql;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Condition {
    /// `field <op> %(field)s`
    Bound { field: String, operator: String },
    /// `field <op> literal`
    Constant {
        field: String,
        operator: String,
        literal: String,
    },
}

impl Condition {
    fn render(&self) -> String {
        match self {
            Condition::Bound { field, operator } => format!("{field} {operator} %({field})s"),
            Condition::Constant {
                field,
                operator,
                literal,
            } => format!("{field} {operator} {literal}"),
        }
    }
}

/// Conditions joined with `AND`, in the order they were added.
#[derive(Debug, Clone, Default)]
pub struct WhereClause {
    conditions: Vec<Condition>,
}

impl WhereClause {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Number of conditions.
    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub(crate) fn push_bound(&mut self, field: &str, operator: &str) {
        self.conditions.push(Condition::Bound {
            field: field.to_string(),
            operator: operator.to_string(),
        });
    }

    pub(crate) fn push_constant(&mut self, field: &str, operator: &str, literal: &str) {
        self.conditions.push(Condition::Constant {
            field: field.to_string(),
            operator: operator.to_string(),
            literal: literal.to_string(),
        });
    }

    /// The clause without the `WHERE` keyword.
    pub fn build_clause(&self) -> String {
        self.conditions
            .iter()
            .map(Condition::render)
            .collect::<Vec<_>>()
            .join(" AND ")
    }

    /// Append ` WHERE ...` to `sql` when any condition exists.
    pub(crate) fn append_to(&self, sql: &mut String) {
        if !self.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.build_clause());
        }
    }
}

/// WHERE methods shared by the SELECT, UPDATE and DELETE builders.
///
/// Bound conditions store their value in the builder's [`Params`] under the
/// field name, so a field filtered twice keeps only the latest value.
pub trait Filter {
    #[doc(hidden)]
    fn filter_parts(&mut self) -> (&mut WhereClause, &mut Params);

    /// `field = %(field)s`
    fn where_eq<T>(&mut self, field: &str, value: T) -> &mut Self
    where
        T: ToSql + Send + Sync + 'static,
        Self: Sized,
    {
        self.where_op(field, "=", value)
    }

    /// `field <operator> %(field)s`, e.g. `where_op("description", "LIKE", "Test%")`.
    fn where_op<T>(&mut self, field: &str, operator: &str, value: T) -> &mut Self
    where
        T: ToSql + Send + Sync + 'static,
        Self: Sized,
    {
        let (clause, params) = self.filter_parts();
        clause.push_bound(field, operator);
        params.bind(field, value);
        self
    }

    /// `field <operator> literal`, nothing bound.
    ///
    /// # Safety
    ///
    /// `literal` is inserted into the statement verbatim. Never pass
    /// untrusted input here.
    fn where_constant(&mut self, field: &str, operator: &str, literal: &str) -> &mut Self
    where
        Self: Sized,
    {
        self.filter_parts().0.push_constant(field, operator, literal);
        self
    }

    /// [`Filter::where_eq`] for every entry, in order.
    fn where_all(&mut self, values: Params) -> &mut Self
    where
        Self: Sized,
    {
        let (clause, params) = self.filter_parts();
        for (field, value) in values {
            clause.push_bound(&field, "=");
            params.bind_param(field, value);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_with_and_in_insertion_order() {
        let mut clause = WhereClause::new();
        clause.push_bound("id", "=");
        clause.push_constant("created", "<", "now()");
        clause.push_bound("description", "LIKE");
        assert_eq!(
            clause.build_clause(),
            "id = %(id)s AND created < now() AND description LIKE %(description)s"
        );
        assert_eq!(clause.len(), 3);
    }

    #[test]
    fn empty_clause_appends_nothing() {
        let mut sql = String::from("DELETE FROM test");
        WhereClause::new().append_to(&mut sql);
        assert_eq!(sql, "DELETE FROM test");
    }
}
