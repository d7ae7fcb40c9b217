use super::traits::Statement;
use super::where_clause::{Filter, WhereClause};
use crate::error::WrapResult;
use crate::param::Params;
use crate::session::Session;

/// DELETE builder.
///
/// Without conditions the statement removes every row of the table.
#[derive(Debug, Clone)]
pub struct DeleteBuilder<'s> {
    session: Option<&'s Session>,
    table: String,
    where_clause: WhereClause,
    params: Params,
}

impl<'s> DeleteBuilder<'s> {
    /// Standalone builder; run it with [`Statement::execute_on`].
    pub fn new(table: &str) -> Self {
        Self {
            session: None,
            table: table.to_string(),
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
}

impl Filter for DeleteBuilder<'_> {
    fn filter_parts(&mut self) -> (&mut WhereClause, &mut Params) {
        (&mut self.where_clause, &mut self.params)
    }
}

impl Statement for DeleteBuilder<'_> {
    fn render(&self) -> WrapResult<String> {
        let mut sql = format!("DELETE FROM {}", self.table);
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
