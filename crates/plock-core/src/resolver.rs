//! The download/resolve collaborator seam and its pip-backed implementation.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{bail, Context, Result};
use pep508_rs::Requirement as PepRequirement;
use serde_json::Value;

use plock_domain::{LockedArtifact, LockedRequirement, LockedResolve, Target};

use crate::config::{LockStyle, ResolverConfiguration};

/// One download/resolve invocation. `dest: None` requests data-only mode:
/// the lock data is kept, the downloaded distribution files are not.
pub struct DownloadRequest<'a> {
    pub requirements: &'a [PepRequirement],
    pub constraints: &'a [PepRequirement],
    pub style: LockStyle,
    pub targets: &'a [Target],
    pub assume_manylinux: Option<&'a str>,
    pub config: &'a ResolverConfiguration,
    pub cache: PathBuf,
    pub dest: Option<PathBuf>,
}

pub struct Downloaded {
    pub locked_resolves: Vec<LockedResolve>,
}

/// The narrow interface the lock engines consume. Implementations may
/// parallelize internally; that concurrency is opaque to the engines.
pub trait DistributionResolver {
    fn download(&self, request: &DownloadRequest<'_>) -> Result<Downloaded>;
}

pub fn default_cache_dir() -> PathBuf {
    dirs_next::cache_dir().map_or_else(|| PathBuf::from(".plock"), |dir| dir.join("plock"))
}

/// Drives `pip download --report` once per target and folds each report into
/// a locked resolve tagged with that target's platform label.
pub struct PipResolver {
    python: String,
}

impl PipResolver {
    pub fn new(python: impl Into<String>) -> Self {
        Self {
            python: python.into(),
        }
    }

    fn download_one(
        &self,
        request: &DownloadRequest<'_>,
        target: Option<&Target>,
        constraints_file: Option<&Path>,
        scratch: &Path,
    ) -> Result<LockedResolve> {
        let platform_tag =
            target.map_or_else(|| "any".to_string(), |target| target.platform_tag.clone());
        let report_path = scratch.join(format!("report-{platform_tag}.json"));
        // In data-only mode the dist files land in the scratch dir and are
        // discarded with it.
        let dest = request
            .dest
            .clone()
            .unwrap_or_else(|| scratch.join("dists"));

        let mut cmd = Command::new(&self.python);
        cmd.args(["-m", "pip", "download", "--quiet"]);
        cmd.arg("--dest").arg(&dest);
        cmd.arg("--cache-dir").arg(&request.cache);
        cmd.arg("--report").arg(&report_path);
        if !request.config.transitive {
            cmd.arg("--no-deps");
        }
        if request.config.allow_prereleases {
            cmd.arg("--pre");
        }
        if !request.config.allow_builds {
            cmd.args(["--only-binary", ":all:"]);
        } else if !request.config.allow_wheels {
            cmd.args(["--no-binary", ":all:"]);
        }
        for (position, index) in request.config.indexes.iter().enumerate() {
            if position == 0 {
                cmd.arg("--index-url").arg(index);
            } else {
                cmd.arg("--extra-index-url").arg(index);
            }
        }
        for links in &request.config.find_links {
            cmd.arg("--find-links").arg(links);
        }
        if let Some(target) = target {
            // Cross-platform downloads must stick to wheels; pip refuses to
            // build sdists for a foreign platform.
            cmd.arg("--platform")
                .arg(platform_argument(target, request.assume_manylinux));
            if let Some(version) = python_version_argument(&target.python_tag) {
                cmd.arg("--python-version").arg(version);
            }
            cmd.args(["--only-binary", ":all:"]);
        }
        if let Some(constraints) = constraints_file {
            cmd.arg("--constraint").arg(constraints);
        }
        for requirement in request.requirements {
            cmd.arg(requirement.to_string());
        }

        tracing::debug!(platform = %platform_tag, "invoking pip download");
        let output = cmd
            .output()
            .with_context(|| format!("failed to run {} -m pip download", self.python))?;
        if !output.status.success() {
            bail!(
                "pip download failed for {platform_tag}:\n{}",
                String::from_utf8_lossy(&output.stderr)
            );
        }

        let report = fs::read_to_string(&report_path)
            .with_context(|| format!("failed to read pip report {}", report_path.display()))?;
        let report: Value = serde_json::from_str(&report)
            .with_context(|| format!("failed to parse pip report {}", report_path.display()))?;
        Ok(locked_resolve_from_report(&report, platform_tag))
    }
}

impl Default for PipResolver {
    fn default() -> Self {
        Self::new("python3")
    }
}

impl DistributionResolver for PipResolver {
    fn download(&self, request: &DownloadRequest<'_>) -> Result<Downloaded> {
        let scratch = tempfile::tempdir().context("failed to create download scratch dir")?;
        let constraints_file = if request.constraints.is_empty() {
            None
        } else {
            let path = scratch.path().join("constraints.txt");
            let contents = request
                .constraints
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("\n");
            fs::write(&path, contents).context("failed to write constraints file")?;
            Some(path)
        };

        let mut locked_resolves = Vec::new();
        if request.targets.is_empty() {
            locked_resolves.push(self.download_one(
                request,
                None,
                constraints_file.as_deref(),
                scratch.path(),
            )?);
        } else {
            for target in request.targets {
                locked_resolves.push(self.download_one(
                    request,
                    Some(target),
                    constraints_file.as_deref(),
                    scratch.path(),
                )?);
            }
        }
        Ok(Downloaded { locked_resolves })
    }
}

fn platform_argument(target: &Target, assume_manylinux: Option<&str>) -> String {
    match assume_manylinux {
        Some(manylinux) if target.platform_tag.starts_with("linux_") => {
            let arch = target.platform_tag.trim_start_matches("linux_");
            format!("{manylinux}_{arch}")
        }
        _ => target.platform_tag.clone(),
    }
}

fn python_version_argument(python_tag: &str) -> Option<String> {
    let digits = python_tag
        .strip_prefix("cp")
        .or_else(|| python_tag.strip_prefix("pp"))?;
    if digits.len() < 2 || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    let (major, minor) = digits.split_at(1);
    Some(format!("{major}.{minor}"))
}

fn locked_resolve_from_report(report: &Value, platform_tag: String) -> LockedResolve {
    let mut locked_requirements = Vec::new();
    if let Some(entries) = report.get("install").and_then(Value::as_array) {
        for entry in entries {
            let Some(metadata) = entry.get("metadata") else {
                continue;
            };
            let Some(name) = metadata.get("name").and_then(Value::as_str) else {
                continue;
            };
            let Some(version) = metadata.get("version").and_then(Value::as_str) else {
                continue;
            };
            let requires_python = metadata
                .get("requires_python")
                .and_then(Value::as_str)
                .map(ToString::to_string);
            let requires_dists = metadata
                .get("requires_dist")
                .and_then(Value::as_array)
                .map_or_else(Vec::new, |values| {
                    values
                        .iter()
                        .filter_map(|value| value.as_str().map(ToString::to_string))
                        .collect()
                });
            locked_requirements.push(LockedRequirement {
                project_name: name.to_string(),
                version: version.to_string(),
                requires_python,
                requires_dists,
                artifacts: artifacts_from_entry(entry),
            });
        }
    }
    // Stable output regardless of pip's download order.
    locked_requirements.sort_by(|a, b| {
        a.project_name
            .cmp(&b.project_name)
            .then_with(|| a.version.cmp(&b.version))
    });
    LockedResolve {
        platform_tag,
        locked_requirements,
    }
}

fn artifacts_from_entry(entry: &Value) -> Vec<LockedArtifact> {
    let Some(download_info) = entry.get("download_info") else {
        return Vec::new();
    };
    let Some(url) = download_info.get("url").and_then(Value::as_str) else {
        return Vec::new();
    };
    let hashes = download_info
        .get("archive_info")
        .and_then(|info| info.get("hashes"))
        .and_then(Value::as_object);
    let Some(hashes) = hashes else {
        return Vec::new();
    };
    hashes
        .iter()
        .filter_map(|(algorithm, hash)| {
            hash.as_str().map(|hash| LockedArtifact {
                url: url.to_string(),
                algorithm: algorithm.clone(),
                hash: hash.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn python_version_argument_splits_tags() {
        assert_eq!(python_version_argument("cp39").as_deref(), Some("3.9"));
        assert_eq!(python_version_argument("cp310").as_deref(), Some("3.10"));
        assert_eq!(python_version_argument("py3"), None);
        assert_eq!(python_version_argument("cpX9"), None);
    }

    #[test]
    fn platform_argument_applies_manylinux_to_linux_only() {
        let linux = Target::new("cp39", "linux_x86_64");
        assert_eq!(
            platform_argument(&linux, Some("manylinux2014")),
            "manylinux2014_x86_64"
        );
        assert_eq!(platform_argument(&linux, None), "linux_x86_64");

        let mac = Target::new("cp39", "macosx_x86_64");
        assert_eq!(platform_argument(&mac, Some("manylinux2014")), "macosx_x86_64");
    }

    #[test]
    fn report_entries_become_sorted_locked_requirements() {
        let report = json!({
            "install": [
                {
                    "metadata": { "name": "urllib3", "version": "2.0.7" },
                    "download_info": {
                        "url": "https://files.example.invalid/urllib3.whl",
                        "archive_info": { "hashes": { "sha256": "cccc" } }
                    }
                },
                {
                    "metadata": {
                        "name": "requests",
                        "version": "2.31.0",
                        "requires_python": ">=3.7",
                        "requires_dist": ["urllib3<3,>=1.21.1"]
                    },
                    "download_info": {
                        "url": "https://files.example.invalid/requests.whl",
                        "archive_info": { "hashes": { "sha256": "aaaa" } }
                    }
                }
            ]
        });
        let resolve = locked_resolve_from_report(&report, "linux_x86_64".to_string());
        assert_eq!(resolve.platform_tag, "linux_x86_64");
        assert_eq!(resolve.locked_requirements.len(), 2);
        assert_eq!(resolve.locked_requirements[0].project_name, "requests");
        assert_eq!(resolve.locked_requirements[0].artifacts[0].hash, "aaaa");
        assert_eq!(
            resolve.locked_requirements[0].requires_dists,
            ["urllib3<3,>=1.21.1"]
        );
        assert_eq!(resolve.locked_requirements[1].project_name, "urllib3");
    }

    #[test]
    fn report_entries_without_metadata_are_skipped() {
        let report = json!({ "install": [ { "download_info": { "url": "x" } } ] });
        let resolve = locked_resolve_from_report(&report, "any".to_string());
        assert!(resolve.locked_requirements.is_empty());
    }
}
