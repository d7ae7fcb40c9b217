use super::traits::Statement;
use super::where_clause::{Filter, WhereClause};
use crate::error::{WrapError, WrapResult};
use crate::param::Params;
use crate::session::Session;
use tokio_postgres::types::ToSql;

#[derive(Debug, Clone)]
enum Assignment {
    /// `field = %(field)s`
    Bound(String),
    /// `field = literal`
    Constant(String, String),
}

/// UPDATE builder.
///
/// Assignments and bound WHERE conditions share one parameter mapping keyed
/// by field name: setting and filtering on the same field binds a single
/// value, the one given last.
#[derive(Debug, Clone)]
pub struct UpdateBuilder<'s> {
    session: Option<&'s Session>,
    table: String,
    assignments: Vec<Assignment>,
    where_clause: WhereClause,
    params: Params,
}

impl<'s> UpdateBuilder<'s> {
    /// Standalone builder; run it with [`Statement::execute_on`].
    pub fn new(table: &str) -> Self {
        Self {
            session: None,
            table: table.to_string(),
            assignments: Vec::new(),
            where_clause: WhereClause::new(),
            params: Params::new(),
        }
    }

    pub(crate) fn bound(session: &'s Session, table: &str) -> Self {
        Self {
            session: Some(session),
            ..Self::new(table)
        }
    }

    /// `field = %(field)s`
    pub fn set<T>(&mut self, field: &str, value: T) -> &mut Self
    where
        T: ToSql + Send + Sync + 'static,
    {
        self.assignments.push(Assignment::Bound(field.to_string()));
        self.params.bind(field, value);
        self
    }

    /// `field = literal`
    ///
    /// # Safety
    ///
    /// This directly concatenates SQL. Never pass untrusted input here.
    pub fn set_constant(&mut self, field: &str, literal: &str) -> &mut Self {
        self.assignments
            .push(Assignment::Constant(field.to_string(), literal.to_string()));
        self
    }

    /// [`UpdateBuilder::set`] for every entry, in order.
    pub fn set_all(&mut self, values: Params) -> &mut Self {
        for (field, value) in values {
            self.assignments.push(Assignment::Bound(field.clone()));
            self.params.bind_param(field, value);
        }
        self
    }
}

impl Filter for UpdateBuilder<'_> {
    fn filter_parts(&mut self) -> (&mut WhereClause, &mut Params) {
        (&mut self.where_clause, &mut self.params)
    }
}

impl Statement for UpdateBuilder<'_> {
    fn render(&self) -> WrapResult<String> {
        if self.assignments.is_empty() {
            return Err(WrapError::EmptyUpdate(self.table.clone()));
        }
        let set = self
            .assignments
            .iter()
            .map(|assignment| match assignment {
                Assignment::Bound(field) => format!("{field} = %({field})s"),
                Assignment::Constant(field, literal) => format!("{field} = {literal}"),
            })
            .collect::<Vec<_>>()
            .join(", ");

        let mut sql = format!("UPDATE {} SET {}", self.table, set);
        self.where_clause.append_to(&mut sql);
        Ok(sql)
    }

    fn params(&self) -> &Params {
        &self.params
    }

    fn session(&self) -> Option<&Session> {
        self.session
    }
}
