use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use thiserror::Error;

use super::types::Lockfile;

/// Why a persisted lock document could not be loaded. Carries the underlying
/// cause verbatim so corruption and version skew stay diagnosable.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to read lock file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse lock file {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

pub fn load(path: &Path) -> Result<Lockfile, ParseError> {
    let contents = fs::read_to_string(path).map_err(|source| ParseError::Read {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| ParseError::Json {
        path: path.display().to_string(),
        source,
    })
}

pub fn to_json(lockfile: &Lockfile) -> Result<serde_json::Value> {
    serde_json::to_value(lockfile).context("failed to serialize lock document")
}

pub fn write<W: Write>(lockfile: &Lockfile, out: &mut W) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, lockfile).context("failed to serialize lock document")?;
    writeln!(out).context("failed to write lock document")?;
    Ok(())
}
