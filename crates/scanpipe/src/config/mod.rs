pub mod loader;
pub mod projects;
pub mod schema;

pub use loader::{load_config, load_config_from_str};
pub use projects::ProjectTable;
pub use schema::{Config, LoggingConfig, RemoteConfig, SearchConfig, StorageConfig};
