pub mod coordinator;
pub mod fingerprint;
pub mod job;
pub mod pool;
pub mod scanner;

pub use coordinator::{run_pass, PassReport};
pub use fingerprint::{fingerprint_volume, Fingerprint};
pub use job::{CollectingQueue, Job, JobQueue, JobResult};
pub use pool::WorkerPool;
pub use scanner::{classify, ScanReport, VolumeChange, VolumeScanner};
