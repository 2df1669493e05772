//! Plain catalog records: volumes, pages and articles.
//!
//! These structs carry no persistence logic. Lookups and upserts live behind
//! the [`Catalog`](super::Catalog) trait.

use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::parser::PageCode;

/// MIME type recorded for every page; scans are archived as TIFF.
pub const PAGE_FORMAT: &str = "image/tiff";

/// Returned when a stored enum column holds an unknown value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Volume ingestion status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VolumeStatus {
    New,
    Processing,
    Update,
    Done,
    Error,
}

impl VolumeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VolumeStatus::New => "New",
            VolumeStatus::Processing => "Processing",
            VolumeStatus::Update => "Update",
            VolumeStatus::Done => "Done",
            VolumeStatus::Error => "Error",
        }
    }
}

impl fmt::Display for VolumeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VolumeStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "New" => Ok(VolumeStatus::New),
            "Processing" => Ok(VolumeStatus::Processing),
            "Update" => Ok(VolumeStatus::Update),
            "Done" => Ok(VolumeStatus::Done),
            "Error" => Ok(VolumeStatus::Error),
            other => Err(UnknownVariant {
                kind: "volume status",
                value: other.to_string(),
            }),
        }
    }
}

/// One phase of the per-volume pipeline, each guarded by a completion flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    /// Parse list files and image headers into the catalog (`db_done`).
    Catalog,
    /// Push the serialized volume to the remote catalog (`db_uploaded`).
    RemotePush,
    /// Copy page images to object storage (`bucket_uploaded`).
    ObjectSync,
    /// Write one search document per page (`ocr_uploaded`).
    SearchIndex,
}

impl Stage {
    pub const ALL: [Stage; 4] = [
        Stage::Catalog,
        Stage::RemotePush,
        Stage::ObjectSync,
        Stage::SearchIndex,
    ];

    /// Stages that may only start once the catalog stage is done.
    pub const PUBLISH: [Stage; 3] = [Stage::RemotePush, Stage::ObjectSync, Stage::SearchIndex];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Catalog => "catalog",
            Stage::RemotePush => "remote-push",
            Stage::ObjectSync => "object-sync",
            Stage::SearchIndex => "search-index",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Completion flags for the four pipeline stages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageFlags {
    pub db_done: bool,
    pub db_uploaded: bool,
    pub bucket_uploaded: bool,
    pub ocr_uploaded: bool,
}

impl StageFlags {
    pub fn get(&self, stage: Stage) -> bool {
        match stage {
            Stage::Catalog => self.db_done,
            Stage::RemotePush => self.db_uploaded,
            Stage::ObjectSync => self.bucket_uploaded,
            Stage::SearchIndex => self.ocr_uploaded,
        }
    }

    pub fn set(&mut self, stage: Stage, value: bool) {
        match stage {
            Stage::Catalog => self.db_done = value,
            Stage::RemotePush => self.db_uploaded = value,
            Stage::ObjectSync => self.bucket_uploaded = value,
            Stage::SearchIndex => self.ocr_uploaded = value,
        }
    }

    pub fn all_done(&self) -> bool {
        Stage::ALL.iter().all(|stage| self.get(*stage))
    }

    pub fn reset(&mut self) {
        *self = StageFlags::default();
    }
}

/// A bound volume of a journal, identified by (type, journal, volume).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalVolume {
    pub id: String,
    /// Collection type, e.g. `seri`. Stored as `type`.
    pub kind: String,
    pub journal: String,
    pub volume: String,
    pub status: VolumeStatus,
    pub status_message: Option<String>,
    pub flags: StageFlags,
    pub file_hash: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl JournalVolume {
    pub fn new(kind: &str, journal: &str, volume: &str) -> Self {
        let now = Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind: kind.to_string(),
            journal: journal.to_string(),
            volume: volume.to_string(),
            status: VolumeStatus::New,
            status_message: None,
            flags: StageFlags::default(),
            file_hash: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// `type/journal/volume`, used in logs and job labels.
    pub fn display_name(&self) -> String {
        format!("{}/{}/{}", self.kind, self.journal, self.volume)
    }

    /// Journal code with dots replaced, as used in object-storage keys.
    pub fn bucket_journal(&self) -> String {
        self.journal.replace('.', "_")
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now().to_rfc3339();
    }
}

/// Page type encoded by byte 7 of the legacy page code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PageType {
    Normal,
    FrontMatter,
    BackMatter,
    Insert,
    Plate,
}

impl PageType {
    pub fn from_separator(separator: u8) -> Option<Self> {
        match separator {
            b'.' => Some(PageType::Normal),
            b',' => Some(PageType::FrontMatter),
            b':' => Some(PageType::BackMatter),
            b'I' => Some(PageType::Insert),
            b'P' => Some(PageType::Plate),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PageType::Normal => "Normal",
            PageType::FrontMatter => "FrontMatter",
            PageType::BackMatter => "BackMatter",
            PageType::Insert => "Insert",
            PageType::Plate => "Plate",
        }
    }
}

impl fmt::Display for PageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PageType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Normal" => Ok(PageType::Normal),
            "FrontMatter" => Ok(PageType::FrontMatter),
            "BackMatter" => Ok(PageType::BackMatter),
            "Insert" => Ok(PageType::Insert),
            "Plate" => Ok(PageType::Plate),
            other => Err(UnknownVariant {
                kind: "page type",
                value: other.to_string(),
            }),
        }
    }
}

/// Color class of a page, derived from its image files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PageColor {
    #[default]
    BW,
    Greyscale,
    Color,
}

impl PageColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageColor::BW => "BW",
            PageColor::Greyscale => "Greyscale",
            PageColor::Color => "Color",
        }
    }
}

impl fmt::Display for PageColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PageColor {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BW" => Ok(PageColor::BW),
            "Greyscale" => Ok(PageColor::Greyscale),
            "Color" => Ok(PageColor::Color),
            other => Err(UnknownVariant {
                kind: "page color",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub id: String,
    pub volume_id: String,
    /// The 11-byte legacy page code.
    pub name: String,
    pub label: String,
    pub format: String,
    pub color_type: PageColor,
    pub page_type: PageType,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub volume_running_page_num: u32,
}

impl Page {
    /// Builds a page from a decoded code. A non-blank `label` replaces the
    /// label derived from the code.
    pub fn new(volume_id: &str, code: &PageCode, running_num: u32, label: Option<&str>) -> Self {
        let label = label
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| code.label());

        Self {
            id: uuid::Uuid::new_v4().to_string(),
            volume_id: volume_id.to_string(),
            name: code.as_str().to_string(),
            label,
            format: PAGE_FORMAT.to_string(),
            color_type: PageColor::BW,
            page_type: code.page_type(),
            width: None,
            height: None,
            volume_running_page_num: running_num,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    pub id: String,
    /// Globally unique across all volumes.
    pub bibcode: String,
    /// The volume whose article list last wrote this article.
    pub volume_id: String,
    pub start_page_number: Option<u32>,
    /// Linked page ids in first-reference order, without duplicates.
    pub page_ids: Vec<String>,
}

impl Article {
    pub fn new(
        bibcode: &str,
        volume_id: &str,
        start_page_number: Option<u32>,
        page_ids: Vec<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            bibcode: bibcode.to_string(),
            volume_id: volume_id.to_string(),
            start_page_number,
            page_ids,
        }
    }
}
