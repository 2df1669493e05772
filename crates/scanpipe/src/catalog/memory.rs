use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use super::model::{Article, JournalVolume, Page, VolumeStatus};
use super::Catalog;
use crate::db::DatabaseError;

#[derive(Default)]
struct State {
    volumes: BTreeMap<String, JournalVolume>,
    /// Keyed by (volume_id, name).
    pages: HashMap<(String, String), Page>,
    /// Keyed by bibcode.
    articles: BTreeMap<String, Article>,
}

/// In-process catalog used by tests and dry runs.
#[derive(Default)]
pub struct MemoryCatalog {
    state: Mutex<State>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, DatabaseError> {
        self.state.lock().map_err(|_| DatabaseError::LockPoisoned)
    }
}

impl Catalog for MemoryCatalog {
    fn insert_volume(&self, volume: &JournalVolume) -> Result<(), DatabaseError> {
        let mut state = self.lock()?;
        let duplicate = state.volumes.values().any(|v| {
            v.kind == volume.kind && v.journal == volume.journal && v.volume == volume.volume
        });
        if duplicate || state.volumes.contains_key(&volume.id) {
            return Err(DatabaseError::Conflict(format!(
                "volume {} already exists",
                volume.display_name()
            )));
        }
        state.volumes.insert(volume.id.clone(), volume.clone());
        Ok(())
    }

    fn save_volume(&self, volume: &JournalVolume) -> Result<(), DatabaseError> {
        let mut state = self.lock()?;
        match state.volumes.get_mut(&volume.id) {
            Some(stored) => {
                *stored = volume.clone();
                Ok(())
            }
            None => Err(DatabaseError::NotFound(format!("volume {}", volume.id))),
        }
    }

    fn find_volume(&self, id: &str) -> Result<Option<JournalVolume>, DatabaseError> {
        Ok(self.lock()?.volumes.get(id).cloned())
    }

    fn find_volume_by_key(
        &self,
        kind: &str,
        journal: &str,
        volume: &str,
    ) -> Result<Option<JournalVolume>, DatabaseError> {
        Ok(self
            .lock()?
            .volumes
            .values()
            .find(|v| v.kind == kind && v.journal == journal && v.volume == volume)
            .cloned())
    }

    fn volumes_with_status(
        &self,
        status: VolumeStatus,
    ) -> Result<Vec<JournalVolume>, DatabaseError> {
        let state = self.lock()?;
        let mut volumes: Vec<_> = state
            .volumes
            .values()
            .filter(|v| v.status == status)
            .cloned()
            .collect();
        volumes.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(volumes)
    }

    fn upsert_page(&self, page: &Page) -> Result<Page, DatabaseError> {
        let mut state = self.lock()?;
        let key = (page.volume_id.clone(), page.name.clone());

        let mut stored = page.clone();
        stored.color_type = Default::default();
        stored.width = None;
        stored.height = None;
        if let Some(existing) = state.pages.get(&key) {
            stored.id = existing.id.clone();
        }

        state.pages.insert(key, stored.clone());
        Ok(stored)
    }

    fn save_page(&self, page: &Page) -> Result<(), DatabaseError> {
        let mut state = self.lock()?;
        let key = (page.volume_id.clone(), page.name.clone());
        match state.pages.get_mut(&key) {
            Some(stored) => {
                stored.color_type = page.color_type;
                stored.width = page.width;
                stored.height = page.height;
                Ok(())
            }
            None => Err(DatabaseError::NotFound(format!("page {}", page.name))),
        }
    }

    fn find_page(&self, volume_id: &str, name: &str) -> Result<Option<Page>, DatabaseError> {
        Ok(self
            .lock()?
            .pages
            .get(&(volume_id.to_string(), name.to_string()))
            .cloned())
    }

    fn pages_for_volume(&self, volume_id: &str) -> Result<Vec<Page>, DatabaseError> {
        let state = self.lock()?;
        let mut pages: Vec<_> = state
            .pages
            .values()
            .filter(|p| p.volume_id == volume_id)
            .cloned()
            .collect();
        pages.sort_by_key(|p| p.volume_running_page_num);
        Ok(pages)
    }

    fn prune_pages(
        &self,
        volume_id: &str,
        keep: &HashSet<String>,
    ) -> Result<usize, DatabaseError> {
        let mut state = self.lock()?;

        let stale: Vec<(String, String)> = state
            .pages
            .iter()
            .filter(|((vol, name), _)| vol == volume_id && !keep.contains(name))
            .map(|(key, _)| key.clone())
            .collect();

        let mut removed_ids = HashSet::new();
        for key in &stale {
            if let Some(page) = state.pages.remove(key) {
                removed_ids.insert(page.id);
            }
        }

        for article in state.articles.values_mut() {
            article.page_ids.retain(|id| !removed_ids.contains(id));
        }

        Ok(stale.len())
    }

    fn upsert_article(&self, article: &Article) -> Result<Article, DatabaseError> {
        let mut state = self.lock()?;
        let mut stored = article.clone();
        if let Some(existing) = state.articles.get(&article.bibcode) {
            stored.id = existing.id.clone();
        }
        state
            .articles
            .insert(article.bibcode.clone(), stored.clone());
        Ok(stored)
    }

    fn find_article(&self, bibcode: &str) -> Result<Option<Article>, DatabaseError> {
        Ok(self.lock()?.articles.get(bibcode).cloned())
    }

    fn bibcodes_for_page(&self, page_id: &str) -> Result<Vec<String>, DatabaseError> {
        let state = self.lock()?;
        // BTreeMap iteration keeps bibcodes sorted.
        Ok(state
            .articles
            .values()
            .filter(|a| a.page_ids.iter().any(|id| id == page_id))
            .map(|a| a.bibcode.clone())
            .collect())
    }
}
