pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod layout;
pub mod logging;
pub mod parser;
pub mod pipeline;
pub mod processor;
pub mod publish;
pub mod recovery;
pub mod state;
pub mod storage;
pub mod worker;

pub use catalog::{Catalog, JournalVolume, MemoryCatalog, Page, Stage, VolumeStatus};
pub use config::{load_config, Config, ProjectTable};
pub use db::{Database, DatabaseError, SqliteCatalog};
pub use error::{
    ConfigError, ImageError, ParseError, PublishError, Result, ScanError, StateError, StorageError,
    WorkerError,
};
pub use layout::InputLayout;
pub use pipeline::{Pipeline, PipelineConfig, PipelineContext};
pub use state::VolumeStateMachine;
pub use worker::{run_pass, Job, JobQueue, JobResult, PassReport, VolumeScanner, WorkerPool};
