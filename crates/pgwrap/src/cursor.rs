//! Cursor over a statement's result stream.

use crate::error::{WrapError, WrapResult};
use crate::row::Row;
use futures_core::Stream;
use futures_util::StreamExt;
use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio_postgres::RowStream;

/// Wraps one open result stream.
///
/// The cursor closes itself once a fetch finds no more rows; [`Cursor::close`]
/// ends it early. Rows are also available through the [`Stream`] impl.
pub struct Cursor {
    columns: Arc<[String]>,
    stream: Option<Pin<Box<RowStream>>>,
    buffered: VecDeque<Row>,
    fetched: u64,
    rows_affected: Option<u64>,
}

impl Cursor {
    pub(crate) fn new(columns: Arc<[String]>, stream: RowStream) -> Self {
        Self {
            columns,
            stream: Some(Box::pin(stream)),
            buffered: VecDeque::new(),
            fetched: 0,
            rows_affected: None,
        }
    }

    /// Column names of the result set (empty for statements without one).
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Whether the underlying stream has been exhausted or closed.
    pub fn is_closed(&self) -> bool {
        self.stream.is_none()
    }

    /// Next row, or `None` once the result is exhausted.
    pub async fn fetch_one(&mut self) -> WrapResult<Option<Row>> {
        match self.next().await {
            Some(row) => row.map(Some),
            None => {
                self.close();
                Ok(None)
            }
        }
    }

    /// Up to `size` rows.
    pub async fn fetch_many(&mut self, size: usize) -> WrapResult<Vec<Row>> {
        let mut rows = Vec::with_capacity(size.min(1024));
        while rows.len() < size {
            match self.fetch_one().await? {
                Some(row) => rows.push(row),
                None => break,
            }
        }
        Ok(rows)
    }

    /// Every remaining row.
    pub async fn fetch_all(&mut self) -> WrapResult<Vec<Row>> {
        let mut rows = Vec::with_capacity(self.buffered.len());
        while let Some(row) = self.fetch_one().await? {
            rows.push(row);
        }
        Ok(rows)
    }

    /// Rows returned (SELECT) or affected (INSERT/UPDATE/DELETE).
    ///
    /// The server reports the count only once the stream is complete, so any
    /// unread rows are pulled into the cursor's buffer first; they can still
    /// be fetched afterwards.
    ///
    /// After an early [`Cursor::close`] the server's count is never seen, and
    /// this returns the number of rows read from the stream before closing.
    pub async fn row_count(&mut self) -> WrapResult<u64> {
        while self.stream.is_some() {
            match self.poll_stream().await {
                Some(row) => {
                    let row = row?;
                    self.buffered.push_back(row);
                }
                None => break,
            }
        }
        Ok(self.rows_affected.unwrap_or(self.fetched))
    }

    /// Drop the result stream. Buffered rows remain readable.
    ///
    /// Closing before the end freezes [`Cursor::row_count`] at the rows read
    /// so far.
    pub fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            self.rows_affected = stream.rows_affected();
        }
    }

    async fn poll_stream(&mut self) -> Option<WrapResult<Row>> {
        futures_util::future::poll_fn(|cx| self.poll_stream_inner(cx)).await
    }

    fn poll_stream_inner(&mut self, cx: &mut Context<'_>) -> Poll<Option<WrapResult<Row>>> {
        let Some(stream) = self.stream.as_mut() else {
            return Poll::Ready(None);
        };
        match stream.as_mut().poll_next(cx) {
            Poll::Ready(Some(Ok(raw))) => {
                self.fetched += 1;
                Poll::Ready(Some(Row::from_pg(raw, Arc::clone(&self.columns))))
            }
            Poll::Ready(Some(Err(e))) => {
                self.close();
                Poll::Ready(Some(Err(WrapError::Query(e))))
            }
            Poll::Ready(None) => {
                self.close();
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Stream for Cursor {
    type Item = WrapResult<Row>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if let Some(row) = this.buffered.pop_front() {
            return Poll::Ready(Some(Ok(row)));
        }
        this.poll_stream_inner(cx)
    }
}

impl std::fmt::Debug for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cursor")
            .field("columns", &self.columns)
            .field("closed", &self.is_closed())
            .field("buffered", &self.buffered.len())
            .field("fetched", &self.fetched)
            .finish()
    }
}
