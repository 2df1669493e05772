//! Catalog repository: volumes, pages and articles behind one trait.

pub mod memory;
pub mod model;

use std::collections::HashSet;

use crate::db::DatabaseError;

pub use memory::MemoryCatalog;
pub use model::{
    Article, JournalVolume, Page, PageColor, PageType, Stage, StageFlags, VolumeStatus,
    PAGE_FORMAT,
};

/// Storage for catalog records.
///
/// Implementations must be safe to share between worker threads. Every
/// upsert is keyed on the natural identity of the record ((type, journal,
/// volume) for volumes, (volume, name) for pages, bibcode for articles) and
/// keeps the surrogate id of an existing row.
pub trait Catalog: Send + Sync {
    fn insert_volume(&self, volume: &JournalVolume) -> Result<(), DatabaseError>;

    /// Persists status, message, flags, fingerprint and `updated_at`.
    fn save_volume(&self, volume: &JournalVolume) -> Result<(), DatabaseError>;

    fn find_volume(&self, id: &str) -> Result<Option<JournalVolume>, DatabaseError>;

    fn find_volume_by_key(
        &self,
        kind: &str,
        journal: &str,
        volume: &str,
    ) -> Result<Option<JournalVolume>, DatabaseError>;

    fn volumes_with_status(
        &self,
        status: VolumeStatus,
    ) -> Result<Vec<JournalVolume>, DatabaseError>;

    /// Inserts or replaces a page parsed from a page list.
    ///
    /// Image properties are reset (color BW, no dimensions) since the image
    /// pass runs after every page-list pass. Returns the stored page.
    fn upsert_page(&self, page: &Page) -> Result<Page, DatabaseError>;

    /// Persists image properties of an existing page.
    fn save_page(&self, page: &Page) -> Result<(), DatabaseError>;

    fn find_page(&self, volume_id: &str, name: &str) -> Result<Option<Page>, DatabaseError>;

    /// Pages of a volume ordered by running page number.
    fn pages_for_volume(&self, volume_id: &str) -> Result<Vec<Page>, DatabaseError>;

    /// Deletes pages of the volume whose name is not in `keep`, with their
    /// article links. Returns the number of deleted pages.
    fn prune_pages(&self, volume_id: &str, keep: &HashSet<String>)
        -> Result<usize, DatabaseError>;

    /// Get-or-create by bibcode, replacing the page set wholesale.
    fn upsert_article(&self, article: &Article) -> Result<Article, DatabaseError>;

    fn find_article(&self, bibcode: &str) -> Result<Option<Article>, DatabaseError>;

    /// Bibcodes of the articles linking to a page, sorted.
    fn bibcodes_for_page(&self, page_id: &str) -> Result<Vec<String>, DatabaseError>;
}
