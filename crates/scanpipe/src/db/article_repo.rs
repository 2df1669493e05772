//! Article repository: `articles` plus the `page_articles` link table.

use rusqlite::{params, Connection, OptionalExtension};

use super::{Database, DatabaseError};
use crate::catalog::model::Article;

fn load(conn: &Connection, bibcode: &str) -> Result<Option<Article>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, bibcode, volume_id, start_page_number FROM articles WHERE bibcode = ?1",
            params![bibcode],
            |r| {
                Ok(Article {
                    id: r.get(0)?,
                    bibcode: r.get(1)?,
                    volume_id: r.get(2)?,
                    start_page_number: r.get(3)?,
                    page_ids: Vec::new(),
                })
            },
        )
        .optional()?;

    let Some(mut article) = row else {
        return Ok(None);
    };

    let mut stmt = conn.prepare(
        "SELECT page_id FROM page_articles WHERE article_id = ?1 ORDER BY position",
    )?;
    article.page_ids = stmt
        .query_map(params![article.id], |r| r.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Some(article))
}

/// Get-or-create by bibcode, then replace the linked page set in one transaction.
pub fn upsert(db: &Database, article: &Article) -> Result<Article, DatabaseError> {
    db.with_conn(|conn| {
        let tx = conn.unchecked_transaction()?;

        tx.execute(
            "INSERT INTO articles (id, bibcode, volume_id, start_page_number)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (bibcode) DO UPDATE SET
                volume_id = excluded.volume_id,
                start_page_number = excluded.start_page_number",
            params![
                article.id,
                article.bibcode,
                article.volume_id,
                article.start_page_number
            ],
        )?;

        let id: String = tx.query_row(
            "SELECT id FROM articles WHERE bibcode = ?1",
            params![article.bibcode],
            |r| r.get(0),
        )?;

        tx.execute(
            "DELETE FROM page_articles WHERE article_id = ?1",
            params![id],
        )?;
        for (position, page_id) in article.page_ids.iter().enumerate() {
            tx.execute(
                "INSERT INTO page_articles (article_id, page_id, position) VALUES (?1, ?2, ?3)",
                params![id, page_id, position as i64],
            )?;
        }

        let stored = load(&tx, &article.bibcode)?
            .ok_or_else(|| DatabaseError::NotFound(format!("article {}", article.bibcode)))?;
        tx.commit()?;
        Ok(stored)
    })
}

pub fn find_by_bibcode(db: &Database, bibcode: &str) -> Result<Option<Article>, DatabaseError> {
    db.with_conn(|conn| load(conn, bibcode))
}

pub fn bibcodes_for_page(db: &Database, page_id: &str) -> Result<Vec<String>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT a.bibcode FROM articles a
             JOIN page_articles pa ON pa.article_id = a.id
             WHERE pa.page_id = ?1
             ORDER BY a.bibcode",
        )?;
        let rows = stmt
            .query_map(params![page_id], |r| r.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::model::{JournalVolume, Page};
    use crate::db::{page_repo, volume_repo};
    use crate::parser::PageCode;

    fn setup() -> (Database, JournalVolume, Vec<Page>) {
        let db = Database::open_in_memory().expect("Failed to create test database");
        let volume = JournalVolume::new("seri", "test.", "0001");
        volume_repo::insert(&db, &volume).unwrap();

        let pages = ["0000001.000", "0000002.000", "0000003.000"]
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let page = Page::new(
                    &volume.id,
                    &PageCode::decode(name).unwrap(),
                    i as u32 + 1,
                    None,
                );
                page_repo::upsert(&db, &page).unwrap()
            })
            .collect();
        (db, volume, pages)
    }

    #[test]
    fn test_upsert_replaces_page_set() {
        let (db, volume, pages) = setup();

        let first = upsert(
            &db,
            &Article::new(
                "1900Test....1....1A",
                &volume.id,
                Some(1),
                vec![pages[0].id.clone(), pages[1].id.clone()],
            ),
        )
        .unwrap();
        assert_eq!(first.page_ids.len(), 2);

        let second = upsert(
            &db,
            &Article::new(
                "1900Test....1....1A",
                &volume.id,
                Some(3),
                vec![pages[2].id.clone()],
            ),
        )
        .unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(second.page_ids, vec![pages[2].id.clone()]);
        assert_eq!(second.start_page_number, Some(3));

        assert!(bibcodes_for_page(&db, &pages[0].id).unwrap().is_empty());
        assert_eq!(
            bibcodes_for_page(&db, &pages[2].id).unwrap(),
            vec!["1900Test....1....1A".to_string()]
        );
    }

    #[test]
    fn test_link_order_is_kept() {
        let (db, volume, pages) = setup();
        let ids = vec![pages[2].id.clone(), pages[0].id.clone()];
        upsert(&db, &Article::new("bib", &volume.id, Some(3), ids.clone())).unwrap();

        let found = find_by_bibcode(&db, "bib").unwrap().unwrap();
        assert_eq!(found.page_ids, ids);
        assert!(find_by_bibcode(&db, "other").unwrap().is_none());
    }

    #[test]
    fn test_bibcodes_for_page_sorted() {
        let (db, volume, pages) = setup();
        let ids = vec![pages[0].id.clone()];
        upsert(&db, &Article::new("b-second", &volume.id, Some(1), ids.clone())).unwrap();
        upsert(&db, &Article::new("a-first", &volume.id, Some(1), ids)).unwrap();

        assert_eq!(
            bibcodes_for_page(&db, &pages[0].id).unwrap(),
            vec!["a-first".to_string(), "b-second".to_string()]
        );
    }
}
