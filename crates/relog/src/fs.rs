//! Proxies to FS utils that either actually write files or print the
//! pending change to stdout (for dry runs).

use std::{
    io,
    path::{Path, PathBuf},
};

use miette::Diagnostic;
use thiserror::Error;
use tracing::trace;

/// Writes to a file if this is not a dry run, or prints just the diff to
/// stdout if it is.
pub(crate) fn write(to_write: WriteType<'_>, path: &Path) -> Result<(), Error> {
    match to_write {
        WriteType::DryRun(diff) => {
            println!("Would add to {path}:\n\n{diff}", path = path.display());
            Ok(())
        }
        WriteType::Real(contents) => {
            trace!("Writing to {}", path.display());
            std::fs::write(path, contents).map_err(|source| Error::Write {
                path: path.into(),
                source,
            })
        }
    }
}

pub(crate) enum WriteType<'a> {
    /// Write the whole document.
    Real(&'a str),
    /// Only show the part that would be added.
    DryRun(&'a str),
}

pub(crate) fn read_to_string<P: AsRef<Path> + Into<PathBuf>>(path: P) -> Result<String, Error> {
    trace!("Reading {}", path.as_ref().display());
    std::fs::read_to_string(path.as_ref()).map_err(|source| Error::Read {
        path: path.into(),
        source,
    })
}

#[derive(Debug, Diagnostic, Error)]
pub(crate) enum Error {
    #[error("Error writing to {path}: {source}")]
    #[diagnostic(
        code(fs::write),
        help("Make sure you have permission to write to this file.")
    )]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Error reading from {path}: {source}")]
    #[diagnostic(
        code(fs::read),
        help("Make sure you have permission to read this file.")
    )]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
