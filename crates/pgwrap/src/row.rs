//! Result rows addressable by column name.
//!
//! Every column is decoded into a `serde_json::Value` when the row is built,
//! so lookups never touch the driver again and nested JSON documents are
//! directly navigable. Building a row fails with [`WrapError::Decode`] if a
//! column has a type with no JSON form. Typed access is available either
//! through serde ([`Row::get_as`], [`Row::deserialize`]) or through the
//! driver's own `FromSql` ([`Row::try_get`]).

use crate::error::{WrapError, WrapResult};
use crate::pg_value::PgValue;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde::ser::SerializeMap;
use serde_json::{Map, Value};
use std::ops::Index;
use std::sync::Arc;
use tokio_postgres::types::FromSql;

/// One result row.
#[derive(Clone, Debug)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Value>,
    raw: Option<Arc<tokio_postgres::Row>>,
}

impl Row {
    /// Decode a driver row. `columns` is shared by every row of a cursor.
    pub(crate) fn from_pg(raw: tokio_postgres::Row, columns: Arc<[String]>) -> WrapResult<Self> {
        let values = (0..raw.len())
            .map(|idx| decode_column(&raw, idx))
            .collect::<WrapResult<Vec<_>>>()?;
        Ok(Self {
            columns,
            values,
            raw: Some(Arc::new(raw)),
        })
    }

    /// Build a row from already decoded values.
    pub fn from_values(columns: impl Into<Arc<[String]>>, values: Vec<Value>) -> Self {
        Self {
            columns: columns.into(),
            values,
            raw: None,
        }
    }

    /// Column value by name.
    ///
    /// Fails with [`WrapError::NoSuchColumn`] for unknown columns.
    pub fn get(&self, column: &str) -> WrapResult<&Value> {
        self.position(column)
            .map(|idx| &self.values[idx])
            .ok_or_else(|| WrapError::NoSuchColumn(column.to_string()))
    }

    /// Column value by name, `None` for unknown columns.
    pub fn get_opt(&self, column: &str) -> Option<&Value> {
        self.position(column).map(|idx| &self.values[idx])
    }

    /// Deserialize one column into `T`.
    pub fn get_as<T: DeserializeOwned>(&self, column: &str) -> WrapResult<T> {
        let value = self.get(column)?;
        T::deserialize(value).map_err(|e| WrapError::decode(column, e.to_string()))
    }

    /// Read one column through the driver's `FromSql`.
    ///
    /// Only available on rows that came from the database.
    pub fn try_get<T>(&self, column: &str) -> WrapResult<T>
    where
        T: for<'a> FromSql<'a>,
    {
        let raw = self
            .raw
            .as_ref()
            .ok_or_else(|| WrapError::decode(column, "row was not read from the database"))?;
        if self.position(column).is_none() {
            return Err(WrapError::NoSuchColumn(column.to_string()));
        }
        raw.try_get(column)
            .map_err(|e| WrapError::decode(column, e.to_string()))
    }

    /// Deserialize the whole row into `T`.
    pub fn deserialize<T: DeserializeOwned>(&self) -> WrapResult<T> {
        serde_json::from_value(Value::Object(self.as_map()))
            .map_err(|e| WrapError::decode("*", e.to_string()))
    }

    /// Copy the row into a JSON object.
    pub fn as_map(&self) -> Map<String, Value> {
        self.iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }

    /// Column names in result order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Iterate `(column, value)` pairs in result order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn position(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }
}

impl Index<&str> for Row {
    type Output = Value;

    fn index(&self, column: &str) -> &Value {
        match self.get_opt(column) {
            Some(value) => value,
            None => panic!("{column} is not a valid column"),
        }
    }
}

impl PartialEq for Row {
    fn eq(&self, other: &Self) -> bool {
        self.columns == other.columns && self.values == other.values
    }
}

impl Serialize for Row {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Decode column `idx`; a type that cannot be decoded is an error, never `null`.
fn decode_column(row: &tokio_postgres::Row, idx: usize) -> WrapResult<Value> {
    row.try_get::<_, PgValue>(idx)
        .map(|value| value.0)
        .map_err(|e| WrapError::decode(row.columns()[idx].name(), e.to_string()))
}
