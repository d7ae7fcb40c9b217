//! # pgwrap
//!
//! A thin convenience layer over `tokio-postgres` and `deadpool-postgres`.
//!
//! ## Features
//!
//! - **Pooled sessions**: one pooled connection and one transaction per scope,
//!   committed on `Ok`, rolled back on `Err`
//! - **Statement builders**: SELECT / INSERT / UPDATE / DELETE rendered with
//!   named `%(field)s` placeholders
//! - **Named queries**: `sql/<name>.sql` files, falling back to literal SQL
//! - **Cursors and rows**: fetch one/many/all, rows addressable by column name
//! - **Paging**: offset pages with last-page detection, no COUNT query
//!
//! ```ignore
//! use pgwrap::prelude::*;
//!
//! let db = Database::connect(Configuration::from_file("configuration.json")?)?;
//!
//! pgwrap::scope!(db, session, {
//!     session.insert("test").set("id", 1i32).set("description", "Test").execute().await?;
//!
//!     let page = session
//!         .select("test")
//!         .where_op("description", "LIKE", "Test%")
//!         .order_by(["id"])
//!         .paging(0, 10)
//!         .await?;
//!     for row in &page.data {
//!         println!("{}", row["description"]);
//!     }
//!     Ok::<(), WrapError>(())
//! })?;
//! ```

pub mod builder;
pub mod config;
pub mod cursor;
pub mod database;
pub mod error;
pub mod page;
pub mod param;
mod pg_value;
pub mod placeholder;
pub mod pool;
pub mod prelude;
pub mod queries;
pub mod row;
pub mod session;
mod sql_log;

pub use builder::{
    DeleteBuilder, Filter, InsertBuilder, SelectBuilder, Statement, UpdateBuilder, WhereClause,
    delete, insert, select, update,
};
pub use config::{Configuration, DEFAULT_CONFIGURATION_FILE, DEFAULT_QUERIES_DIRECTORY};
pub use cursor::Cursor;
pub use database::Database;
pub use error::{WrapError, WrapResult};
pub use page::Page;
pub use param::{Param, Params};
pub use placeholder::{NamedSql, translate_named};
pub use pool::{create_pool, create_pool_with_manager_config, create_pool_with_tls};
pub use row::Row;
pub use session::Session;
