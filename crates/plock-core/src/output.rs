use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

/// Where an emit/dump step writes. The sink is acquired with scoped lifetime:
/// opened only once a command reaches its emit step, so error paths never
/// touch the destination.
#[derive(Clone, Debug, Default)]
pub enum OutputTarget {
    #[default]
    Stdout,
    File(PathBuf),
}

impl OutputTarget {
    pub fn open(&self) -> io::Result<Box<dyn Write>> {
        match self {
            Self::Stdout => Ok(Box::new(io::stdout().lock())),
            Self::File(path) => Ok(Box::new(File::create(path)?)),
        }
    }
}
