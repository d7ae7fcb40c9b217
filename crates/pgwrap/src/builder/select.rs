use super::traits::Statement;
use super::where_clause::{Filter, WhereClause};
use crate::error::{WrapError, WrapResult};
use crate::page::{Page, window_clause};
use crate::param::Params;
use crate::session::Session;

/// SELECT builder.
///
/// ```ignore
/// let page = session
///     .select("test")
///     .fields(["id", "description"])
///     .where_op("description", "LIKE", "Test%")
///     .order_by(["id"])
///     .paging(0, 10)
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct SelectBuilder<'s> {
    session: Option<&'s Session>,
    table: String,
    fields: Vec<String>,
    where_clause: WhereClause,
    params: Params,
    group_by: Vec<String>,
    order_by: Vec<String>,
}

impl<'s> SelectBuilder<'s> {
    /// Standalone builder; run it with [`Statement::execute_on`].
    pub fn new(table: &str) -> Self {
        Self {
            session: None,
            table: table.to_string(),
            fields: vec!["*".to_string()],
            where_clause: WhereClause::new(),
            params: Params::new(),
            group_by: Vec::new(),
            order_by: Vec::new(),
        }
    }

    pub(crate) fn bound(session: &'s Session, table: &str) -> Self {
        Self {
            session: Some(session),
            ..Self::new(table)
        }
    }

    /// Replace the selected fields (default `*`).
    pub fn fields<I, S>(&mut self, fields: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the GROUP BY list.
    pub fn group_by<I, S>(&mut self, fields: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.group_by = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the ORDER BY list. Entries may carry a direction (`"id DESC"`).
    pub fn order_by<I, S>(&mut self, fields: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.order_by = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Statement text for page `page` of `size` rows (one extra row is
    /// requested to detect the last page).
    pub fn render_page(&self, page: u64, size: u64) -> WrapResult<String> {
        Ok(format!("{} {}", self.render()?, window_clause(page, size)))
    }

    /// Fetch page `page` of `size` rows through the owning session.
    pub async fn paging(&self, page: u64, size: u64) -> WrapResult<Page> {
        let session = self.session.ok_or(WrapError::Unbound)?;
        self.paging_on(session, page, size).await
    }

    /// [`SelectBuilder::paging`] through an explicit session.
    pub async fn paging_on(&self, session: &Session, page: u64, size: u64) -> WrapResult<Page> {
        let sql = self.render_page(page, size)?;
        let rows = session.execute_sql(&sql, &self.params).await?.fetch_all().await?;
        Ok(Page::from_overfetch(page, size, rows))
    }
}

impl Filter for SelectBuilder<'_> {
    fn filter_parts(&mut self) -> (&mut WhereClause, &mut Params) {
        (&mut self.where_clause, &mut self.params)
    }
}

impl Statement for SelectBuilder<'_> {
    fn render(&self) -> WrapResult<String> {
        let mut sql = format!("SELECT {} FROM {}", self.fields.join(", "), self.table);
        self.where_clause.append_to(&mut sql);
        if !self.group_by.is_empty() {
            sql.push_str(" GROUP BY ");
            sql.push_str(&self.group_by.join(", "));
        }
        if !self.order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&self.order_by.join(", "));
        }
        Ok(sql)
    }

    fn params(&self) -> &Params {
        &self.params
    }

    fn session(&self) -> Option<&Session> {
        self.session
    }
}
