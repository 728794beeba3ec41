use std::fmt;
use std::str::FromStr;

use anyhow::bail;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// An interpreter+platform combination requirements must resolve for.
///
/// Targets are pure lookup keys: they are compared for equality during lock
/// selection and rendered verbatim in diagnostics, nothing more.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Target {
    pub python_tag: String,
    pub platform_tag: String,
}

impl Target {
    pub fn new(python_tag: impl Into<String>, platform_tag: impl Into<String>) -> Self {
        Self {
            python_tag: python_tag.into(),
            platform_tag: platform_tag.into(),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.python_tag, self.platform_tag)
    }
}

impl FromStr for Target {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let Some((python_tag, platform_tag)) = value.trim().split_once('-') else {
            bail!("invalid target {value:?}: expected <python tag>-<platform tag>, e.g. cp39-linux_x86_64");
        };
        if python_tag.is_empty() || platform_tag.is_empty() {
            bail!("invalid target {value:?}: expected <python tag>-<platform tag>, e.g. cp39-linux_x86_64");
        }
        Ok(Self::new(python_tag, platform_tag))
    }
}

/// Which targets the current invocation resolves or exports for.
///
/// Targets arrive fully formed; interpreter discovery happens upstream.
#[derive(Clone, Debug, Default)]
pub struct TargetConfiguration {
    pub targets: Vec<Target>,
    pub assume_manylinux: Option<String>,
}

impl TargetConfiguration {
    /// The de-duplicated target list, preserving first-seen order.
    pub fn unique_targets(&self) -> Vec<Target> {
        let unique: IndexSet<Target> = self.targets.iter().cloned().collect();
        unique.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_interpreter_platform_pairs() -> anyhow::Result<()> {
        let target: Target = "cp39-linux_x86_64".parse()?;
        assert_eq!(target.python_tag, "cp39");
        assert_eq!(target.platform_tag, "linux_x86_64");
        assert_eq!(target.to_string(), "cp39-linux_x86_64");

        let target: Target = "cp310-manylinux2014_x86_64".parse()?;
        assert_eq!(target.platform_tag, "manylinux2014_x86_64");
        Ok(())
    }

    #[test]
    fn rejects_malformed_targets() {
        for value in ["cp39", "-linux_x86_64", "cp39-", ""] {
            assert!(value.parse::<Target>().is_err(), "{value:?} should not parse");
        }
    }

    #[test]
    fn unique_targets_preserves_first_seen_order() {
        let config = TargetConfiguration {
            targets: vec![
                Target::new("cp310", "macosx_x86_64"),
                Target::new("cp39", "linux_x86_64"),
                Target::new("cp310", "macosx_x86_64"),
            ],
            assume_manylinux: None,
        };
        let unique = config.unique_targets();
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].to_string(), "cp310-macosx_x86_64");
        assert_eq!(unique[1].to_string(), "cp39-linux_x86_64");
    }
}
