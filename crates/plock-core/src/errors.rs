use std::io;

use plock_domain::{LocalProjectRequirement, ParseError, Target};
use thiserror::Error;

use crate::config::ExportFormat;
use crate::report;

/// One applicable locked resolve and the targets that selected it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LockGroup {
    pub platform_tag: String,
    pub targets: Vec<Target>,
}

/// Every way a lock command can fail. Nothing here is retried or downgraded:
/// each variant is a terminal result carrying its complete report.
#[derive(Debug, Error)]
pub enum LockError {
    #[error("unrecognized lock export format {value:?}; choose from: {}", ExportFormat::choices())]
    UnrecognizedFormat { value: String },
    #[error("Only the '{}' lock format is supported currently.", ExportFormat::Pip)]
    UnsupportedFormat { requested: ExportFormat },
    #[error("{0:#}")]
    Requirements(anyhow::Error),
    #[error("{}", report::local_projects(.0))]
    LocalProjects(Vec<LocalProjectRequirement>),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("{}", report::no_applicable_locks(.stored, .lockfile, .targets))]
    NoApplicableLock {
        stored: usize,
        lockfile: String,
        targets: Vec<Target>,
    },
    #[error("{}", report::multiple_applicable_locks(.stored, .lockfile, .groups))]
    MultipleApplicableLocks {
        stored: usize,
        lockfile: String,
        groups: Vec<LockGroup>,
    },
    #[error("{0:#}")]
    Resolve(anyhow::Error),
    #[error("failed to write lock output: {0}")]
    Output(#[source] io::Error),
}

impl LockError {
    pub fn status(&self) -> CommandStatus {
        match self {
            Self::UnrecognizedFormat { .. }
            | Self::UnsupportedFormat { .. }
            | Self::Requirements(_)
            | Self::LocalProjects(_)
            | Self::NoApplicableLock { .. }
            | Self::MultipleApplicableLocks { .. } => CommandStatus::UserError,
            Self::Parse(_) | Self::Resolve(_) | Self::Output(_) => CommandStatus::Failure,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandStatus {
    Ok,
    UserError,
    Failure,
}

impl CommandStatus {
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Ok => 0,
            Self::UserError => 1,
            Self::Failure => 2,
        }
    }
}
