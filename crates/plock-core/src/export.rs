use std::path::PathBuf;
use std::str::FromStr;

use indexmap::IndexMap;

use plock_domain::{lockfile, LockedResolve, Target, TargetConfiguration};

use crate::config::ExportFormat;
use crate::errors::{LockError, LockGroup};
use crate::output::OutputTarget;

pub struct ExportRequest {
    pub format: String,
    pub lockfile: PathBuf,
    pub targets: TargetConfiguration,
    pub output: OutputTarget,
}

/// Computes which locked resolve(s) apply to the requested targets and either
/// exports the unique applicable resolve or reports a precise diagnostic.
///
/// Single deterministic pass: format check, load, target resolution, one fold
/// over the document's selection stream, then a decision on the cardinality
/// of the grouping.
pub fn lock_export(request: &ExportRequest) -> Result<(), LockError> {
    // Format problems must surface before the lock document is touched.
    let format = ExportFormat::from_str(request.format.trim()).map_err(|_| {
        LockError::UnrecognizedFormat {
            value: request.format.clone(),
        }
    })?;
    if format != ExportFormat::Pip {
        return Err(LockError::UnsupportedFormat { requested: format });
    }

    let document = lockfile::load(&request.lockfile)?;
    let targets = request.targets.unique_targets();

    tracing::debug!(count = targets.len(), "selecting locks for targets");
    let mut selected: IndexMap<&LockedResolve, Vec<&Target>> = IndexMap::new();
    for (target, resolve) in document.select(&targets) {
        selected.entry(resolve).or_default().push(target);
    }

    if selected.len() == 1 {
        if let Some((resolve, _)) = selected.pop() {
            let mut output = request.output.open().map_err(LockError::Output)?;
            resolve.emit_requirements(&mut output).map_err(LockError::Output)?;
            output.flush().map_err(LockError::Output)?;
            return Ok(());
        }
    }

    let stored = document.locked_resolves.len();
    let lockfile_path = request.lockfile.display().to_string();
    let groups: Vec<LockGroup> = selected
        .into_iter()
        .map(|(resolve, targets)| LockGroup {
            platform_tag: resolve.platform_tag.clone(),
            targets: targets.into_iter().cloned().collect(),
        })
        .collect();

    if groups.is_empty() {
        return Err(LockError::NoApplicableLock {
            stored,
            lockfile: lockfile_path,
            targets,
        });
    }
    Err(LockError::MultipleApplicableLocks {
        stored,
        lockfile: lockfile_path,
        groups,
    })
}
