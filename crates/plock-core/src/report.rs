//! Rendering for the multi-line selection and validation reports.

use std::fmt::Display;

use plock_domain::{LocalProjectRequirement, Target};

use crate::config::ExportFormat;
use crate::errors::LockGroup;

pub(crate) fn pluralize(count: usize, noun: &str) -> String {
    if count == 1 {
        noun.to_string()
    } else {
        format!("{noun}s")
    }
}

/// 1-indexed `N.) item` lines, one per entry, input order preserved.
pub(crate) fn enumerate<T: Display>(items: &[T]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| format!("{}.) {}", index + 1, item))
        .collect::<Vec<_>>()
        .join("\n")
}

pub(crate) fn local_projects(projects: &[LocalProjectRequirement]) -> String {
    format!(
        "Cannot create a lock for local project requirements. Given {count}:\n{projects}",
        count = projects.len(),
        projects = enumerate(projects),
    )
}

pub(crate) fn no_applicable_locks(stored: &usize, lockfile: &str, targets: &[Target]) -> String {
    format!(
        "Of the {count} {locks} stored in {lockfile}, none were applicable for the selected \
         targets:\n{targets}",
        count = stored,
        locks = pluralize(*stored, "lock"),
        targets = enumerate(targets),
    )
}

pub(crate) fn multiple_applicable_locks(
    stored: &usize,
    lockfile: &str,
    groups: &[LockGroup],
) -> String {
    let group_lines = groups
        .iter()
        .enumerate()
        .map(|(index, group)| {
            let targets = group
                .targets
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            format!("{}.) {}: {}", index + 1, group.platform_tag, targets)
        })
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "Only a single lock can be exported in the '{format}' format.\n\
         There {verb} {count} {locks} stored in {lockfile} that were applicable for the selected \
         targets:\n{group_lines}",
        format = ExportFormat::Pip,
        verb = if *stored == 1 { "was" } else { "were" },
        count = stored,
        locks = pluralize(*stored, "lock"),
    )
}
