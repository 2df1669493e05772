use std::path::PathBuf;
use thiserror::Error;

use crate::catalog::model::{Stage, VolumeStatus};

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Image error: {0}")]
    Image(#[from] ImageError),

    #[error("Fingerprint error: {0}")]
    Fingerprint(#[from] FingerprintError),

    #[error("Publish error: {0}")]
    Publish(#[from] PublishError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("State error: {0}")]
    State(#[from] StateError),

    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),

    #[error("Failed to initialize logging: {0}")]
    Logging(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Schema validation failed: {errors}")]
    SchemaValidation { errors: String },

    #[error("Failed to load project table '{path}': {reason}")]
    ProjectTable { path: PathBuf, reason: String },
}

/// Errors raised while reading page-list and article-list files.
///
/// Malformed page codes are not errors; they are filtered out by the codec.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Failed to open list file '{path}': {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read '{path}' at line {line}: {source}")]
    Read {
        path: PathBuf,
        line: usize,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "Article '{bibcode}' ('{path}' line {line}) references page '{page}' which is not in the page list"
    )]
    UnknownPage {
        bibcode: String,
        page: String,
        path: PathBuf,
        line: usize,
    },

    #[error("Catalog lookup failed: {0}")]
    Catalog(#[from] crate::db::DatabaseError),
}

#[derive(Error, Debug)]
pub enum ImageError {
    #[error("Failed to list image directory '{path}': {source}")]
    ListDirectory {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Missing image file for page '{page}' in '{directory}'")]
    MissingImage { page: String, directory: PathBuf },

    #[error("Failed to read image header '{path}': {source}")]
    Header {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Catalog update failed: {0}")]
    Catalog(#[from] crate::db::DatabaseError),
}

#[derive(Error, Debug)]
pub enum FingerprintError {
    #[error("Failed to walk '{path}' while fingerprinting: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Failed to read metadata of '{path}' while fingerprinting: {source}")]
    Metadata {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to copy '{from}' to '{to}': {source}")]
    CopyFile {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to move file from '{from}' to '{to}': {source}")]
    MoveFile {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid object key: {0}")]
    InvalidKey(String),
}

#[derive(Error, Debug)]
pub enum PublishError {
    #[error("Request to '{url}' failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("'{url}' rejected the request with status {status}: {body}")]
    Rejected {
        url: String,
        status: u16,
        body: String,
    },

    #[error("Failed to serialize payload: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to read OCR text '{path}': {source}")]
    OcrText {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Object storage failed: {0}")]
    Storage(#[from] StorageError),

    #[error("Failed to list volume images: {0}")]
    Image(#[from] ImageError),

    #[error("Catalog read failed: {0}")]
    Catalog(#[from] crate::db::DatabaseError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("Illegal volume transition from {from} to {to}")]
    IllegalTransition {
        from: VolumeStatus,
        to: VolumeStatus,
    },

    #[error("Stage '{stage}' cannot complete before the catalog stage")]
    CatalogPending { stage: Stage },
}

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Worker channel closed unexpectedly")]
    ChannelClosed,

    #[error("Directory scan failed for '{path}': {source}")]
    ScanFailed {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Catalog access failed during scan: {0}")]
    Catalog(#[from] crate::db::DatabaseError),

    #[error("Volume state error during scan: {0}")]
    State(#[from] StateError),
}

pub type Result<T> = std::result::Result<T, ScanError>;
