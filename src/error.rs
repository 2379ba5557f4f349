//! Error type for the tag-emission engine.
//!
//! The library never aborts the process itself; fatal conditions (spec
//! §7) are surfaced as `Err(TagError)` and it is the caller's job — in
//! this crate, `main.rs` — to print a message and exit, the same
//! division of labor `treetags::main` uses around
//! `file_finder::determine_tag_file_path`.

use std::fmt;
use std::io;
use std::path::PathBuf;

#[derive(Debug)]
pub enum TagError {
    /// A filesystem operation on the tag file failed.
    Io { path: PathBuf, source: io::Error },
    /// An existing destination file doesn't look like a tag file and
    /// overwriting it was refused.
    NotATagFile { path: PathBuf },
    /// A write to the tag file or its etags sidecar failed.
    Write { path: PathBuf, source: io::Error },
    /// The sort stage collaborator failed.
    Sort { message: String },
}

impl fmt::Display for TagError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagError::Io { path, source } => {
                write!(f, "{}: {}", path.display(), source)
            }
            TagError::NotATagFile { path } => {
                write!(
                    f,
                    "{}: doesn't look like a tag file, refusing to overwrite",
                    path.display()
                )
            }
            TagError::Write { path, source } => {
                write!(f, "failed writing tag file {}: {}", path.display(), source)
            }
            TagError::Sort { message } => write!(f, "sort stage failed: {}", message),
        }
    }
}

impl std::error::Error for TagError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TagError::Io { source, .. } | TagError::Write { source, .. } => Some(source),
            TagError::NotATagFile { .. } | TagError::Sort { .. } => None,
        }
    }
}
