use plock_domain::ResolverVersion;
use strum::{Display, EnumString};

pub const DEFAULT_INDEX: &str = "https://pypi.org/simple";

/// The output encoding used when flattening a locked resolve to a consumable
/// file. Recognized values form a closed set; anything unknown is rejected at
/// the boundary. Only `pip` can be exported today.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Display, EnumString)]
pub enum ExportFormat {
    #[default]
    #[strum(serialize = "pip")]
    Pip,
    #[strum(serialize = "pep-665")]
    Pep665,
}

impl ExportFormat {
    pub fn choices() -> &'static str {
        "pip, pep-665"
    }
}

/// The style of lock to generate. `strict` locks exactly the distributions a
/// local resolve would use; `sources` also includes accompanying sdists when
/// available.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Display, EnumString)]
pub enum LockStyle {
    #[default]
    #[strum(serialize = "strict")]
    Strict,
    #[strum(serialize = "sources")]
    Sources,
}

impl LockStyle {
    pub fn choices() -> &'static str {
        "strict, sources"
    }
}

/// How the download/resolve collaborator is allowed to behave.
#[derive(Clone, Debug)]
pub struct ResolverConfiguration {
    pub resolver_version: ResolverVersion,
    pub allow_prereleases: bool,
    pub allow_wheels: bool,
    pub allow_builds: bool,
    pub transitive: bool,
    pub indexes: Vec<String>,
    pub find_links: Vec<String>,
    pub max_parallel_jobs: usize,
}

impl Default for ResolverConfiguration {
    fn default() -> Self {
        Self {
            resolver_version: ResolverVersion::default(),
            allow_prereleases: false,
            allow_wheels: true,
            allow_builds: true,
            transitive: true,
            indexes: vec![DEFAULT_INDEX.to_string()],
            find_links: Vec::new(),
            max_parallel_jobs: 8,
        }
    }
}
