//! Named parameter storage.
//!
//! Statements address their values by name (`%(name)s`), so parameters are
//! kept in an ordered mapping rather than a positional list. The mapping is
//! translated to positional `$n` binds right before execution.

use std::fmt;
use std::sync::Arc;
use tokio_postgres::types::ToSql;

/// One bound value.
///
/// Clones share the value, so a [`Param`] can be bound under several names
/// or reused across statements without copying it.
#[derive(Clone)]
pub struct Param {
    value: Arc<dyn ToSql + Send + Sync>,
}

impl Param {
    pub fn new<T: ToSql + Send + Sync + 'static>(value: T) -> Self {
        Self {
            value: Arc::new(value),
        }
    }

    /// The value in the form the driver binds.
    pub(crate) fn as_sql(&self) -> &(dyn ToSql + Sync) {
        &*self.value
    }
}

impl fmt::Debug for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.value, f)
    }
}

/// Ordered mapping of field name to bound value.
///
/// Binding a name twice replaces the value but keeps the first position.
#[derive(Clone, Default)]
pub struct Params {
    entries: Vec<(String, Param)>,
}

impl Params {
    /// Create an empty mapping.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Bind `value` under `name`.
    pub fn bind<T: ToSql + Send + Sync + 'static>(
        &mut self,
        name: impl Into<String>,
        value: T,
    ) -> &mut Self {
        self.bind_param(name, Param::new(value))
    }

    /// Bind a pre-wrapped [`Param`] under `name`.
    pub fn bind_param(&mut self, name: impl Into<String>, param: Param) -> &mut Self {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = param,
            None => self.entries.push((name, param)),
        }
        self
    }

    /// Consuming variant of [`Params::bind`].
    pub fn with<T: ToSql + Send + Sync + 'static>(
        mut self,
        name: impl Into<String>,
        value: T,
    ) -> Self {
        self.bind(name, value);
        self
    }

    /// Look up a bound value.
    pub fn get(&self, name: &str) -> Option<&Param> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, p)| p)
    }

    /// Whether `name` is bound.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Bound names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    /// Iterate `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Param)> {
        self.entries.iter().map(|(n, p)| (n.as_str(), p))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for Params {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl IntoIterator for Params {
    type Item = (String, Param);
    type IntoIter = std::vec::IntoIter<(String, Param)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<K, T> FromIterator<(K, T)> for Params
where
    K: Into<String>,
    T: ToSql + Send + Sync + 'static,
{
    fn from_iter<I: IntoIterator<Item = (K, T)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (name, value) in iter {
            params.bind(name, value);
        }
        params
    }
}

/// Build a [`Params`] mapping inline.
///
/// ```ignore
/// let params = pgwrap::params! { "id" => 1i32, "description" => "Test" };
/// ```
#[macro_export]
macro_rules! params {
    () => { $crate::Params::new() };
    ($($name:expr => $value:expr),+ $(,)?) => {{
        let mut __pgwrap_params = $crate::Params::new();
        $( __pgwrap_params.bind($name, $value); )+
        __pgwrap_params
    }};
}
