use std::collections::HashSet;

use super::{article_repo, page_repo, volume_repo, Database, DatabaseError};
use crate::catalog::model::{Article, JournalVolume, Page, VolumeStatus};
use crate::catalog::Catalog;

/// [`Catalog`] backed by the SQLite database.
#[derive(Clone)]
pub struct SqliteCatalog {
    db: Database,
}

impl SqliteCatalog {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

impl Catalog for SqliteCatalog {
    fn insert_volume(&self, volume: &JournalVolume) -> Result<(), DatabaseError> {
        volume_repo::insert(&self.db, volume)
    }

    fn save_volume(&self, volume: &JournalVolume) -> Result<(), DatabaseError> {
        volume_repo::update(&self.db, volume)
    }

    fn find_volume(&self, id: &str) -> Result<Option<JournalVolume>, DatabaseError> {
        volume_repo::find_by_id(&self.db, id)
    }

    fn find_volume_by_key(
        &self,
        kind: &str,
        journal: &str,
        volume: &str,
    ) -> Result<Option<JournalVolume>, DatabaseError> {
        volume_repo::find_by_key(&self.db, kind, journal, volume)
    }

    fn volumes_with_status(
        &self,
        status: VolumeStatus,
    ) -> Result<Vec<JournalVolume>, DatabaseError> {
        volume_repo::list_by_status(&self.db, status)
    }

    fn upsert_page(&self, page: &Page) -> Result<Page, DatabaseError> {
        page_repo::upsert(&self.db, page)
    }

    fn save_page(&self, page: &Page) -> Result<(), DatabaseError> {
        page_repo::update_image_properties(&self.db, page)
    }

    fn find_page(&self, volume_id: &str, name: &str) -> Result<Option<Page>, DatabaseError> {
        page_repo::find(&self.db, volume_id, name)
    }

    fn pages_for_volume(&self, volume_id: &str) -> Result<Vec<Page>, DatabaseError> {
        page_repo::list_for_volume(&self.db, volume_id)
    }

    fn prune_pages(
        &self,
        volume_id: &str,
        keep: &HashSet<String>,
    ) -> Result<usize, DatabaseError> {
        page_repo::delete_except(&self.db, volume_id, keep)
    }

    fn upsert_article(&self, article: &Article) -> Result<Article, DatabaseError> {
        article_repo::upsert(&self.db, article)
    }

    fn find_article(&self, bibcode: &str) -> Result<Option<Article>, DatabaseError> {
        article_repo::find_by_bibcode(&self.db, bibcode)
    }

    fn bibcodes_for_page(&self, page_id: &str) -> Result<Vec<String>, DatabaseError> {
        article_repo::bibcodes_for_page(&self.db, page_id)
    }
}
