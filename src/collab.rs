//! Traits for the collaborators spec.md calls out as external: input-file
//! reading, language policy, and the sort stage. This crate only calls
//! back into them; it implements none of the real logic (that belongs to
//! parsers, the CLI's file layer, and the sort algorithm respectively).

use crate::error::TagError;
use std::path::Path;

/// Current position a parser is reporting a tag from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePosition {
    pub file_name: String,
    pub language: String,
    pub line_number: u32,
    pub byte_offset: u64,
}

/// What the pattern builder and [`crate::entry::TagEntry::init`] need from
/// whatever is reading the input file.
pub trait SourceContext {
    /// The file/language/line/byte-offset a tag constructed right now
    /// would be attributed to.
    fn position(&self) -> SourcePosition;

    /// Read the source line starting at `byte_offset`, without the
    /// trailing newline. Returns `None` if the position can't be read
    /// (e.g. past end of file).
    fn read_line_at(&self, byte_offset: u64) -> Option<String>;

    /// Whether `language` permits tags with an empty name to be emitted
    /// as placeholders rather than dropped with a warning.
    fn allows_null_tags(&self, language: &str) -> bool;
}

/// The pluggable stage invoked by [`crate::tagfile::TagFile::close`] when
/// sorting was requested. spec.md deliberately leaves the algorithm
/// unspecified; this crate ships one implementation
/// ([`crate::sort::LexicalSort`]) but callers may supply their own (e.g.
/// spawning an external `sort(1)`).
pub trait SortStage {
    fn sort(&self, path: &Path, fold_case: bool) -> Result<(), TagError>;
}
