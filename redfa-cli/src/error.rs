use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Everything that can make the CLI exit non-zero: its own I/O, plus the
/// library's compile diagnostic (already rendered against the source that
/// was read, caret block included — see `main::run`).
#[derive(Debug, Error)]
pub enum Error {
    #[error("error reading {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("error creating directory {}: {source}", path.display())]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("error writing {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("{0}")]
    Compile(redfa::Diagnostic),
}
