use std::path::PathBuf;

use plock_domain::{
    lockfile, Lockfile, ParsedRequirement, RequirementConfiguration, TargetConfiguration,
};

use crate::config::{LockStyle, ResolverConfiguration};
use crate::errors::LockError;
use crate::output::OutputTarget;
use crate::resolver::{DistributionResolver, DownloadRequest};

pub struct CreateRequest {
    pub style: LockStyle,
    pub requirements: RequirementConfiguration,
    pub resolver: ResolverConfiguration,
    pub targets: TargetConfiguration,
    pub cache: PathBuf,
    pub output: OutputTarget,
}

/// Turns parsed requirement/constraint input plus resolver and target
/// configuration into a persisted lock document.
///
/// Local project requirements are rejected before the download step runs:
/// they cannot be pinned as platform-independent locked coordinates. Nothing
/// is partially persisted on any failure.
pub fn lock_create(
    request: &CreateRequest,
    downloader: &dyn DistributionResolver,
    tool_version: &str,
) -> Result<Lockfile, LockError> {
    let parsed = request
        .requirements
        .parse_requirements()
        .map_err(LockError::Requirements)?;

    let mut requirements = Vec::new();
    let mut local_projects = Vec::new();
    for entry in parsed {
        match entry {
            ParsedRequirement::Named(requirement) => requirements.push(requirement),
            ParsedRequirement::LocalProject(project) => local_projects.push(project),
        }
    }
    if !local_projects.is_empty() {
        return Err(LockError::LocalProjects(local_projects));
    }

    let constraints = request
        .requirements
        .parse_constraints()
        .map_err(LockError::Requirements)?;
    let targets = request.targets.unique_targets();

    tracing::debug!(
        requirements = requirements.len(),
        targets = targets.len(),
        "requesting locked resolves"
    );
    let downloaded = downloader
        .download(&DownloadRequest {
            requirements: &requirements,
            constraints: &constraints,
            style: request.style,
            targets: &targets,
            assume_manylinux: request.targets.assume_manylinux.as_deref(),
            config: &request.resolver,
            cache: request.cache.clone(),
            // Out for the lock data, not the distribution files behind it.
            dest: None,
        })
        .map_err(LockError::Resolve)?;

    let created = Lockfile::create(
        tool_version,
        request.resolver.resolver_version,
        &requirements,
        &constraints,
        request.resolver.allow_prereleases,
        request.resolver.allow_wheels,
        request.resolver.allow_builds,
        request.resolver.transitive,
        downloaded.locked_resolves,
    );

    let mut output = request.output.open().map_err(LockError::Output)?;
    lockfile::write(&created, &mut output).map_err(LockError::Resolve)?;
    Ok(created)
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::fs;

    use anyhow::Result;
    use plock_domain::{LockedResolve, Target};

    use super::*;
    use crate::resolver::Downloaded;

    struct StubResolver {
        resolves: Vec<LockedResolve>,
        calls: Cell<usize>,
    }

    impl StubResolver {
        fn new(resolves: Vec<LockedResolve>) -> Self {
            Self {
                resolves,
                calls: Cell::new(0),
            }
        }
    }

    impl DistributionResolver for StubResolver {
        fn download(&self, _request: &DownloadRequest<'_>) -> Result<Downloaded> {
            self.calls.set(self.calls.get() + 1);
            Ok(Downloaded {
                locked_resolves: self.resolves.clone(),
            })
        }
    }

    fn linux_resolve() -> LockedResolve {
        LockedResolve {
            platform_tag: "linux_x86_64".into(),
            locked_requirements: Vec::new(),
        }
    }

    fn request(dir: &std::path::Path, specs: &[&str]) -> CreateRequest {
        CreateRequest {
            style: LockStyle::Strict,
            requirements: RequirementConfiguration {
                requirements: specs.iter().map(ToString::to_string).collect(),
                ..RequirementConfiguration::default()
            },
            resolver: ResolverConfiguration::default(),
            targets: TargetConfiguration {
                targets: vec![Target::new("cp39", "linux_x86_64")],
                assume_manylinux: None,
            },
            cache: dir.join("cache"),
            output: OutputTarget::File(dir.join("requirements.lock.json")),
        }
    }

    #[test]
    fn rejects_local_projects_before_downloading() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let resolver = StubResolver::new(vec![linux_resolve()]);
        let request = request(dir.path(), &["requests==2.31.0", "./app", "../lib"]);

        let err = lock_create(&request, &resolver, "0.1.0").unwrap_err();
        assert_eq!(resolver.calls.get(), 0, "download must not run");
        let message = err.to_string();
        assert_eq!(
            message,
            "Cannot create a lock for local project requirements. Given 2:\n1.) ./app\n2.) ../lib"
        );
        assert!(
            !dir.path().join("requirements.lock.json").exists(),
            "nothing may be persisted on failure"
        );
        Ok(())
    }

    #[test]
    fn records_original_specs_and_writes_document() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let resolver = StubResolver::new(vec![linux_resolve()]);
        let request = request(dir.path(), &["requests==2.31.0", "idna==3.4"]);

        let created = lock_create(&request, &resolver, "9.9.9")?;
        assert_eq!(resolver.calls.get(), 1);
        assert_eq!(created.plock_version, "9.9.9");
        assert_eq!(created.requirements, ["requests==2.31.0", "idna==3.4"]);
        assert!(created.constraints.is_empty());
        assert_eq!(created.locked_resolves, vec![linux_resolve()]);

        let written = fs::read_to_string(dir.path().join("requirements.lock.json"))?;
        let reloaded: Lockfile = serde_json::from_str(&written)?;
        assert_eq!(reloaded, created);
        Ok(())
    }

    #[test]
    fn download_failure_is_terminal() -> Result<()> {
        struct FailingResolver;
        impl DistributionResolver for FailingResolver {
            fn download(&self, _request: &DownloadRequest<'_>) -> Result<Downloaded> {
                anyhow::bail!("no matching distribution found")
            }
        }

        let dir = tempfile::tempdir()?;
        let request = request(dir.path(), &["requests==2.31.0"]);
        let err = lock_create(&request, &FailingResolver, "0.1.0").unwrap_err();
        assert!(matches!(err, LockError::Resolve(_)));
        assert!(!dir.path().join("requirements.lock.json").exists());
        Ok(())
    }

    #[test]
    fn invalid_spec_fails_before_downloading() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let resolver = StubResolver::new(vec![linux_resolve()]);
        let request = request(dir.path(), &["===broken==="]);

        let err = lock_create(&request, &resolver, "0.1.0").unwrap_err();
        assert!(matches!(err, LockError::Requirements(_)));
        assert_eq!(resolver.calls.get(), 0);
        Ok(())
    }
}
