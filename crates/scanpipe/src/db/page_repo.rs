//! Page repository: CRUD for the `pages` table.

use std::collections::HashSet;

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DatabaseError};
use crate::catalog::model::Page;

const COLUMNS: &str = "id, volume_id, name, label, format, color_type, page_type, width, height,
    volume_running_page_num";

fn from_row(row: &Row<'_>) -> Result<Page, rusqlite::Error> {
    Ok(Page {
        id: row.get("id")?,
        volume_id: row.get("volume_id")?,
        name: row.get("name")?,
        label: row.get("label")?,
        format: row.get("format")?,
        color_type: row.get("color_type")?,
        page_type: row.get("page_type")?,
        width: row.get("width")?,
        height: row.get("height")?,
        volume_running_page_num: row.get("volume_running_page_num")?,
    })
}

/// Inserts a page or refreshes the row with the same (volume, name).
///
/// The stored id survives; image properties go back to their defaults.
pub fn upsert(db: &Database, page: &Page) -> Result<Page, DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO pages (id, volume_id, name, label, format, color_type, page_type,
                                width, height, volume_running_page_num)
             VALUES (?1, ?2, ?3, ?4, ?5, 'BW', ?6, NULL, NULL, ?7)
             ON CONFLICT (volume_id, name) DO UPDATE SET
                label = excluded.label,
                format = excluded.format,
                color_type = 'BW',
                page_type = excluded.page_type,
                width = NULL,
                height = NULL,
                volume_running_page_num = excluded.volume_running_page_num",
            params![
                page.id,
                page.volume_id,
                page.name,
                page.label,
                page.format,
                page.page_type,
                page.volume_running_page_num,
            ],
        )?;

        let stored = conn.query_row(
            &format!(
                "SELECT {} FROM pages WHERE volume_id = ?1 AND name = ?2",
                COLUMNS
            ),
            params![page.volume_id, page.name],
            from_row,
        )?;
        Ok(stored)
    })
}

/// Writes the image-derived columns of an existing page.
pub fn update_image_properties(db: &Database, page: &Page) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute(
            "UPDATE pages SET color_type = ?3, width = ?4, height = ?5
             WHERE volume_id = ?1 AND name = ?2",
            params![
                page.volume_id,
                page.name,
                page.color_type,
                page.width,
                page.height
            ],
        )?;
        if changed == 0 {
            return Err(DatabaseError::NotFound(format!("page {}", page.name)));
        }
        Ok(())
    })
}

pub fn find(db: &Database, volume_id: &str, name: &str) -> Result<Option<Page>, DatabaseError> {
    db.with_conn(|conn| {
        let page = conn
            .query_row(
                &format!(
                    "SELECT {} FROM pages WHERE volume_id = ?1 AND name = ?2",
                    COLUMNS
                ),
                params![volume_id, name],
                from_row,
            )
            .optional()?;
        Ok(page)
    })
}

pub fn list_for_volume(db: &Database, volume_id: &str) -> Result<Vec<Page>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM pages WHERE volume_id = ?1 ORDER BY volume_running_page_num",
            COLUMNS
        ))?;
        let rows = stmt
            .query_map(params![volume_id], from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Deletes the pages of a volume not named in `keep`. Article links go with
/// them through the cascading foreign key.
pub fn delete_except(
    db: &Database,
    volume_id: &str,
    keep: &HashSet<String>,
) -> Result<usize, DatabaseError> {
    db.with_conn(|conn| {
        let tx = conn.unchecked_transaction()?;

        let stale: Vec<String> = {
            let mut stmt = tx.prepare("SELECT name FROM pages WHERE volume_id = ?1")?;
            let names = stmt
                .query_map(params![volume_id], |r| r.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            names.into_iter().filter(|n| !keep.contains(n)).collect()
        };

        for name in &stale {
            tx.execute(
                "DELETE FROM pages WHERE volume_id = ?1 AND name = ?2",
                params![volume_id, name],
            )?;
        }

        tx.commit()?;
        Ok(stale.len())
    })
}
