pub(crate) mod io;
pub(crate) mod types;

pub use io::{load, to_json, write, ParseError};
pub use types::{LockedArtifact, LockedRequirement, LockedResolve, Lockfile, ResolverVersion};
