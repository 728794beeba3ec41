#![deny(clippy::all, warnings)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]

pub mod lockfile;
pub mod requirement;
pub mod target;

pub use lockfile::{
    load, to_json, write, LockedArtifact, LockedRequirement, LockedResolve, Lockfile, ParseError,
    ResolverVersion,
};
pub use requirement::{
    parse_requirement_entry, LocalProjectRequirement, ParsedRequirement, RequirementConfiguration,
};
pub use target::{Target, TargetConfiguration};
