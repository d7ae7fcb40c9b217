//! Convenient imports for typical `pgwrap` usage.
//!
//! ```ignore
//! use pgwrap::prelude::*;
//! ```

pub use crate::{
    Configuration, Cursor, Database, Filter, Page, Params, Row, Session, Statement, WrapError,
    WrapResult, params,
};
