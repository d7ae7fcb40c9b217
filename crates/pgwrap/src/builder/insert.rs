use super::traits::Statement;
use crate::error::{WrapError, WrapResult};
use crate::param::Params;
use crate::session::Session;
use tokio_postgres::types::ToSql;

/// INSERT builder.
///
/// Constant columns are rendered first, then bound columns, each group in the
/// order it was set. With no columns at all the statement is
/// `INSERT INTO <table> DEFAULT VALUES`.
#[derive(Debug, Clone)]
pub struct InsertBuilder<'s> {
    session: Option<&'s Session>,
    table: String,
    params: Params,
    constants: Vec<(String, String)>,
}

impl<'s> InsertBuilder<'s> {
    /// Standalone builder; run it with [`Statement::execute_on`].
    pub fn new(table: &str) -> Self {
        Self {
            session: None,
            table: table.to_string(),
            params: Params::new(),
            constants: Vec::new(),
        }
    }

    pub(crate) fn bound(session: &'s Session, table: &str) -> Self {
        Self {
            session: Some(session),
            ..Self::new(table)
        }
    }

    /// Bind `value` to column `field`.
    pub fn set<T>(&mut self, field: &str, value: T) -> &mut Self
    where
        T: ToSql + Send + Sync + 'static,
    {
        self.params.bind(field, value);
        self
    }

    /// Insert `literal` into column `field` verbatim, e.g. `now()`.
    ///
    /// # Safety
    ///
    /// This directly concatenates SQL. Never pass untrusted input here.
    pub fn set_constant(&mut self, field: &str, literal: &str) -> &mut Self {
        match self.constants.iter_mut().find(|(f, _)| f == field) {
            Some(entry) => entry.1 = literal.to_string(),
            None => self.constants.push((field.to_string(), literal.to_string())),
        }
        self
    }

    /// [`InsertBuilder::set`] for every entry, in order.
    pub fn set_all(&mut self, values: Params) -> &mut Self {
        for (field, value) in values {
            self.params.bind_param(field, value);
        }
        self
    }

    fn validate(&self) -> WrapResult<()> {
        match self
            .constants
            .iter()
            .find(|(field, _)| self.params.contains(field))
        {
            Some((field, _)) => Err(WrapError::DuplicateField(field.clone())),
            None => Ok(()),
        }
    }
}

impl Statement for InsertBuilder<'_> {
    fn render(&self) -> WrapResult<String> {
        self.validate()?;
        if self.constants.is_empty() && self.params.is_empty() {
            return Ok(format!("INSERT INTO {} DEFAULT VALUES", self.table));
        }

        let mut columns = Vec::with_capacity(self.constants.len() + self.params.len());
        let mut values = Vec::with_capacity(columns.capacity());
        for (field, literal) in &self.constants {
            columns.push(field.as_str());
            values.push(literal.clone());
        }
        for field in self.params.names() {
            columns.push(field);
            values.push(format!("%({field})s"));
        }
        Ok(format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.table,
            columns.join(", "),
            values.join(", ")
        ))
    }

    fn params(&self) -> &Params {
        &self.params
    }

    fn session(&self) -> Option<&Session> {
        self.session
    }
}
