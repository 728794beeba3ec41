#![deny(clippy::all, warnings)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]

mod config;
mod create;
mod errors;
mod export;
mod output;
mod report;
mod resolver;

pub use config::{ExportFormat, LockStyle, ResolverConfiguration, DEFAULT_INDEX};
pub use create::{lock_create, CreateRequest};
pub use errors::{CommandStatus, LockError, LockGroup};
pub use export::{lock_export, ExportRequest};
pub use output::OutputTarget;
pub use resolver::{
    default_cache_dir, DistributionResolver, DownloadRequest, Downloaded, PipResolver,
};

pub const PLOCK_VERSION: &str = env!("CARGO_PKG_VERSION");
