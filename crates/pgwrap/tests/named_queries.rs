//! File-backed queries resolved from the configured queries directory.

mod common;

use pgwrap::prelude::*;

#[tokio::test]
async fn named_query_is_loaded_from_file() -> WrapResult<()> {
    let Some(configuration) = common::configuration() else {
        eprintln!("PGWRAP_CONFIG not set, skipping");
        return Ok(());
    };
    let dir = tempfile::tempdir()?;
    std::fs::write(
        dir.path().join("count_named.sql"),
        "SELECT count(*) AS total FROM pgwrap_named WHERE description LIKE %(pattern)s",
    )?;
    std::fs::write(
        dir.path().join("list_named.sql"),
        "SELECT id FROM pgwrap_named ORDER BY id",
    )?;

    let db = Database::connect(configuration.queries_directory(dir.path()))?;
    common::reset_table(&db, "pgwrap_named").await?;

    pgwrap::scope!(db, session, {
        common::insert_rows(&session, "pgwrap_named", 1..=3).await?;

        let row = session
            .execute("count_named", &params! { "pattern" => "Test%" })
            .await?
            .fetch_one()
            .await?
            .expect("count row");
        assert_eq!(row.get_as::<i64>("total")?, 3);

        let page = session.paging_named("list_named", &Params::new(), 0, 2).await?;
        assert_eq!(common::ids(&page), [1, 2]);
        assert!(!page.last);
        Ok::<(), WrapError>(())
    })
}

#[tokio::test]
async fn unknown_name_runs_as_sql() -> WrapResult<()> {
    let Some(db) = common::database() else {
        eprintln!("PGWRAP_CONFIG not set, skipping");
        return Ok(());
    };

    pgwrap::scope!(db, session, {
        let row = session
            .execute("SELECT 1 AS one", &Params::new())
            .await?
            .fetch_one()
            .await?
            .expect("one row");
        assert_eq!(row.get_as::<i32>("one")?, 1);
        Ok::<(), WrapError>(())
    })
}
