use thiserror::Error;

/// Errors raised inside a pipeline step. Stage errors are recorded on the
/// volume; the others end the job.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("List file parsing failed: {0}")]
    Parse(#[from] crate::error::ParseError),

    #[error("Image metadata failed: {0}")]
    Image(#[from] crate::error::ImageError),

    #[error("Publishing failed: {0}")]
    Publish(#[from] crate::error::PublishError),

    #[error("Object storage failed: {0}")]
    Storage(#[from] crate::error::StorageError),

    #[error("Catalog access failed: {0}")]
    Database(#[from] crate::db::DatabaseError),

    #[error("Volume state error: {0}")]
    State(#[from] crate::error::StateError),

    #[error("Volume '{0}' not found in the catalog")]
    VolumeNotFound(String),
}
