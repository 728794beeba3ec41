use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use pep508_rs::Requirement as PepRequirement;

/// A requirement that points at the filesystem instead of a distributable
/// name/version. Locks cannot pin these as platform-independent coordinates,
/// so lock creation rejects them up front.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocalProjectRequirement {
    pub path: String,
}

impl fmt::Display for LocalProjectRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

#[derive(Clone, Debug)]
pub enum ParsedRequirement {
    Named(PepRequirement),
    LocalProject(LocalProjectRequirement),
}

fn is_local_project(spec: &str) -> bool {
    spec == "."
        || spec == ".."
        || spec.starts_with("./")
        || spec.starts_with("../")
        || spec.starts_with('/')
        || spec.starts_with("~/")
        || spec.starts_with("file://")
}

pub fn parse_requirement_entry(spec: &str) -> Result<ParsedRequirement> {
    let spec = spec.trim();
    if is_local_project(spec) {
        return Ok(ParsedRequirement::LocalProject(LocalProjectRequirement {
            path: spec.to_string(),
        }));
    }
    let requirement = PepRequirement::from_str(spec)
        .with_context(|| format!("invalid requirement {spec:?}"))?;
    Ok(ParsedRequirement::Named(requirement))
}

/// The raw requirement/constraint inputs of one invocation: inline specs
/// first, then file entries, input order preserved throughout.
#[derive(Clone, Debug, Default)]
pub struct RequirementConfiguration {
    pub requirements: Vec<String>,
    pub requirement_files: Vec<PathBuf>,
    pub constraint_files: Vec<PathBuf>,
}

impl RequirementConfiguration {
    pub fn parse_requirements(&self) -> Result<Vec<ParsedRequirement>> {
        let mut parsed = Vec::new();
        for spec in &self.requirements {
            parsed.push(parse_requirement_entry(spec)?);
        }
        for file in &self.requirement_files {
            for spec in read_spec_lines(file)? {
                parsed.push(
                    parse_requirement_entry(&spec)
                        .with_context(|| format!("in {}", file.display()))?,
                );
            }
        }
        Ok(parsed)
    }

    pub fn parse_constraints(&self) -> Result<Vec<PepRequirement>> {
        let mut constraints = Vec::new();
        for file in &self.constraint_files {
            for spec in read_spec_lines(file)? {
                let requirement = PepRequirement::from_str(spec.trim())
                    .with_context(|| format!("invalid constraint {spec:?} in {}", file.display()))?;
                constraints.push(requirement);
            }
        }
        Ok(constraints)
    }
}

fn read_spec_lines(path: &Path) -> Result<Vec<String>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(ToString::to_string)
        .collect())
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use super::*;

    #[test]
    fn classifies_local_projects() -> Result<()> {
        for spec in ["./app", "../sibling", "/opt/project", "~/src/project", "file:///tmp/p", "."] {
            let parsed = parse_requirement_entry(spec)?;
            assert!(
                matches!(parsed, ParsedRequirement::LocalProject(_)),
                "{spec:?} should be a local project"
            );
        }
        let parsed = parse_requirement_entry("requests[security]==2.31.0")?;
        assert!(matches!(parsed, ParsedRequirement::Named(_)));
        Ok(())
    }

    #[test]
    fn rejects_unparseable_specs() {
        assert!(parse_requirement_entry("===not-a-spec===").is_err());
    }

    #[test]
    fn requirement_files_skip_comments_and_blanks() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let file = dir.path().join("requirements.txt");
        let mut handle = fs::File::create(&file)?;
        writeln!(handle, "# pinned for prod")?;
        writeln!(handle)?;
        writeln!(handle, "requests==2.31.0")?;
        writeln!(handle, "  urllib3==2.0.7  ")?;

        let config = RequirementConfiguration {
            requirements: vec!["idna==3.4".to_string()],
            requirement_files: vec![file],
            constraint_files: Vec::new(),
        };
        let parsed = config.parse_requirements()?;
        assert_eq!(parsed.len(), 3);
        let names: Vec<String> = parsed
            .iter()
            .map(|entry| match entry {
                ParsedRequirement::Named(requirement) => requirement.name.to_string(),
                ParsedRequirement::LocalProject(project) => project.path.clone(),
            })
            .collect();
        assert_eq!(names, ["idna", "requests", "urllib3"]);
        Ok(())
    }

    #[test]
    fn constraints_parse_in_file_order() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let file = dir.path().join("constraints.txt");
        fs::write(&file, "urllib3<3\ncertifi>=2023.7.22\n")?;

        let config = RequirementConfiguration {
            constraint_files: vec![file],
            ..RequirementConfiguration::default()
        };
        let constraints = config.parse_constraints()?;
        assert_eq!(constraints.len(), 2);
        assert_eq!(constraints[0].name.to_string(), "urllib3");
        Ok(())
    }
}
