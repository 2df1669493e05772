//! Schema migrations.
//!
//! Applied migrations are tracked in a `_migrations` table; pending ones run
//! in version order, each at most once.

use rusqlite::Connection;

use super::error::DatabaseError;

struct Migration {
    version: u32,
    description: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "create_journal_volumes_table",
        sql: include_str!("sql/001_create_journal_volumes.sql"),
    },
    Migration {
        version: 2,
        description: "create_pages_table",
        sql: include_str!("sql/002_create_pages.sql"),
    },
    Migration {
        version: 3,
        description: "create_articles_tables",
        sql: include_str!("sql/003_create_articles.sql"),
    },
];

/// Runs all pending migrations on the given connection.
pub fn run_all(conn: &Connection) -> Result<(), DatabaseError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;

    let current_version: u32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM _migrations",
        [],
        |r| r.get(0),
    )?;

    for migration in MIGRATIONS {
        if migration.version <= current_version {
            continue;
        }

        log::info!(
            "Running migration v{}: {}",
            migration.version,
            migration.description
        );

        conn.execute_batch(migration.sql)
            .map_err(|e| DatabaseError::Migration {
                version: migration.version,
                reason: e.to_string(),
            })?;

        conn.execute(
            "INSERT INTO _migrations (version, description) VALUES (?1, ?2)",
            rusqlite::params![migration.version, migration.description],
        )?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys=ON;").unwrap();
        run_all(&conn).unwrap();
        conn
    }

    #[test]
    fn test_migrations_run_on_fresh_db() {
        let conn = fresh();
        let count: u32 = conn
            .query_row("SELECT COUNT(*) FROM _migrations", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, MIGRATIONS.len() as u32);
    }

    #[test]
    fn test_migrations_are_idempotent() {
        let conn = fresh();
        run_all(&conn).unwrap();

        let count: u32 = conn
            .query_row("SELECT COUNT(*) FROM _migrations", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, MIGRATIONS.len() as u32);
    }

    #[test]
    fn test_volume_key_is_unique() {
        let conn = fresh();
        let insert = "INSERT INTO journal_volumes (id, type, journal, volume, created_at, updated_at)
                      VALUES (?1, 'seri', 'test.', '0001', '2026-01-01', '2026-01-01')";
        conn.execute(insert, ["a"]).unwrap();
        assert!(conn.execute(insert, ["b"]).is_err());
    }

    #[test]
    fn test_page_links_cascade_on_page_delete() {
        let conn = fresh();
        conn.execute_batch(
            "INSERT INTO journal_volumes (id, type, journal, volume, created_at, updated_at)
                 VALUES ('v', 'seri', 'test.', '0001', 'x', 'x');
             INSERT INTO pages (id, volume_id, name, label, page_type, volume_running_page_num)
                 VALUES ('p', 'v', '0000001.000', '1', 'Normal', 1);
             INSERT INTO articles (id, bibcode, volume_id) VALUES ('a', 'bib', 'v');
             INSERT INTO page_articles (article_id, page_id, position) VALUES ('a', 'p', 0);
             DELETE FROM pages WHERE id = 'p';",
        )
        .unwrap();

        let links: u32 = conn
            .query_row("SELECT COUNT(*) FROM page_articles", [], |r| r.get(0))
            .unwrap();
        assert_eq!(links, 0);
    }
}
