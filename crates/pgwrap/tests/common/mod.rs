//! Shared setup for tests that need a running PostgreSQL server.
//!
//! Set `PGWRAP_CONFIG` (directly or through a `.env` file) to the path of a
//! configuration file; tests return early when it is unset.

#![allow(dead_code)]

use pgwrap::prelude::*;

pub fn configuration() -> Option<Configuration> {
    let _ = dotenvy::dotenv();
    let path = std::env::var("PGWRAP_CONFIG").ok()?;
    Some(Configuration::from_file(path).expect("PGWRAP_CONFIG must name a valid configuration"))
}

pub fn database() -> Option<Database> {
    configuration().map(|c| Database::connect(c).expect("pool should build"))
}

/// Drop and recreate `table` as `(id integer PRIMARY KEY, description varchar)`.
pub async fn reset_table(db: &Database, table: &str) -> WrapResult<()> {
    pgwrap::scope!(db, session, {
        session
            .execute_batch(&format!(
                "DROP TABLE IF EXISTS {table}; \
                 CREATE TABLE {table} (id integer PRIMARY KEY, description varchar(255) NOT NULL)"
            ))
            .await?;
        Ok::<(), WrapError>(())
    })
}

/// Insert rows `id` with description `Test <id>`.
pub async fn insert_rows(
    session: &Session,
    table: &str,
    ids: std::ops::RangeInclusive<i32>,
) -> WrapResult<()> {
    for id in ids {
        session
            .insert(table)
            .set("id", id)
            .set("description", format!("Test {id}"))
            .execute()
            .await?;
    }
    Ok(())
}

pub fn ids(page: &Page) -> Vec<i64> {
    page.data
        .iter()
        .map(|row| row["id"].as_i64().expect("integer id"))
        .collect()
}
