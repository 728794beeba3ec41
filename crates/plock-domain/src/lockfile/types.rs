use std::io::{self, Write};

use pep508_rs::Requirement as PepRequirement;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::target::Target;

/// The pip resolver implementation used to produce a lock.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum ResolverVersion {
    #[strum(serialize = "pip-legacy-resolver")]
    #[serde(rename = "pip-legacy-resolver")]
    PipLegacy,
    #[default]
    #[strum(serialize = "pip-2020-resolver")]
    #[serde(rename = "pip-2020-resolver")]
    Pip2020,
}

/// One downloadable file backing a locked requirement.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LockedArtifact {
    pub url: String,
    pub algorithm: String,
    pub hash: String,
}

/// One fully pinned project within a locked resolve.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LockedRequirement {
    pub project_name: String,
    pub version: String,
    #[serde(default)]
    pub requires_python: Option<String>,
    #[serde(default)]
    pub requires_dists: Vec<String>,
    #[serde(default)]
    pub artifacts: Vec<LockedArtifact>,
}

/// A fully resolved dependency set for one target environment, tagged with a
/// human-readable platform label.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LockedResolve {
    pub platform_tag: String,
    pub locked_requirements: Vec<LockedRequirement>,
}

impl LockedResolve {
    /// Whether this resolve can satisfy the given target. The `"any"` label
    /// applies everywhere; anything else requires an exact platform match.
    pub fn applies_to(&self, target: &Target) -> bool {
        self.platform_tag == "any" || self.platform_tag == target.platform_tag
    }

    /// Writes this resolve as a flat pip requirements listing: one pinned
    /// requirement per line with a `--hash` annotation per artifact.
    pub fn emit_requirements<W: Write>(&self, out: &mut W) -> io::Result<()> {
        for requirement in &self.locked_requirements {
            write!(out, "{}=={}", requirement.project_name, requirement.version)?;
            for artifact in &requirement.artifacts {
                write!(out, " \\\n    --hash={}:{}", artifact.algorithm, artifact.hash)?;
            }
            writeln!(out)?;
        }
        Ok(())
    }
}

/// The persisted lock document: the configuration a lock was produced with
/// plus its ordered locked resolves. Created once, never mutated afterward.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lockfile {
    pub plock_version: String,
    pub resolver_version: ResolverVersion,
    pub requirements: Vec<String>,
    #[serde(default)]
    pub constraints: Vec<String>,
    pub allow_prereleases: bool,
    pub allow_wheels: bool,
    pub allow_builds: bool,
    pub transitive: bool,
    pub locked_resolves: Vec<LockedResolve>,
}

impl Lockfile {
    /// Assembles a document from the original (pre-download) requirement and
    /// constraint objects. The document records intent, not resolution detail.
    #[allow(clippy::fn_params_excessive_bools)]
    pub fn create(
        plock_version: &str,
        resolver_version: ResolverVersion,
        requirements: &[PepRequirement],
        constraints: &[PepRequirement],
        allow_prereleases: bool,
        allow_wheels: bool,
        allow_builds: bool,
        transitive: bool,
        locked_resolves: Vec<LockedResolve>,
    ) -> Self {
        Self {
            plock_version: plock_version.to_string(),
            resolver_version,
            requirements: requirements.iter().map(ToString::to_string).collect(),
            constraints: constraints.iter().map(ToString::to_string).collect(),
            allow_prereleases,
            allow_wheels,
            allow_builds,
            transitive,
            locked_resolves,
        }
    }

    /// Streams every applicable `(target, locked resolve)` pair, outer order
    /// following the target list, inner order following stored resolves.
    pub fn select<'a>(
        &'a self,
        targets: &'a [Target],
    ) -> impl Iterator<Item = (&'a Target, &'a LockedResolve)> + 'a {
        targets.iter().flat_map(move |target| {
            self.locked_resolves
                .iter()
                .filter(move |resolve| resolve.applies_to(target))
                .map(move |resolve| (target, resolve))
        })
    }
}
