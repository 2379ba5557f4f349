//! # Tag File Manager
//!
//! Owns the lifecycle of the destination tag file: choosing
//! stdout/append/overwrite on open, validating an existing file before
//! clobbering it, and on close running the sort stage (if requested) or
//! copying to stdout (if that's where output was headed).

use crate::collab::SortStage;
use crate::entry::TagEntry;
use crate::error::TagError;
use crate::field::{FieldRegistry, RenderContext, WriterKind};
use crate::pseudo::{self, SortedState};
use crate::writer;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// How the destination was opened, decided once at [`TagFile::open`] and
/// then driving [`TagFile::close`]'s behavior.
enum Destination {
    Stdout,
    Path { path: PathBuf, append: bool },
}

pub struct TagFile {
    destination: Destination,
    writer: Box<dyn Write>,
    format: WriterKind,
    numeric_format: u8,
    wrote_pseudo_tags: bool,
    sorted: SortedState,
    backward: bool,
}

/// A handful of bytes are enough to tell a real tag file from an
/// arbitrary file someone pointed us at by mistake (spec.md §7): either
/// it starts with a pseudo-tag line, or every non-blank line it has has
/// at least two tabs (the traditional three-column shape).
fn looks_like_tag_file(path: &Path) -> io::Result<bool> {
    let mut file = File::open(path)?;
    let mut buf = String::new();
    file.take(8192).read_to_string(&mut buf).unwrap_or(0);

    if buf.is_empty() {
        return Ok(true);
    }
    for line in buf.lines() {
        if line.is_empty() {
            continue;
        }
        if pseudo::is_pseudo_tag_line(line) {
            continue;
        }
        if line.matches('\t').count() < 2 {
            return Ok(false);
        }
    }
    Ok(true)
}

impl TagFile {
    /// `open_tag_file`. Three branches:
    /// - `path` is `-`: write to stdout, no validation, no pseudo-tags
    ///   (nothing to append to or sort afterward).
    /// - `append` is true: open for appending; if the existing file
    ///   doesn't look like a tag file, refuse.
    /// - otherwise: validate an existing file the same way, then
    ///   truncate and write fresh pseudo-tags.
    pub fn open(
        path: &Path,
        format: WriterKind,
        numeric_format: u8,
        append: bool,
        encoding: Option<&str>,
    ) -> Result<Self, TagError> {
        if path == Path::new("-") {
            return Ok(TagFile {
                destination: Destination::Stdout,
                writer: Box::new(BufWriter::new(io::stdout())),
                format,
                numeric_format,
                wrote_pseudo_tags: true,
                sorted: SortedState::Unsorted,
                backward: false,
            });
        }

        let exists = path.exists();
        if exists && !looks_like_tag_file(path).map_err(|source| TagError::Io {
            path: path.to_path_buf(),
            source,
        })? {
            return Err(TagError::NotATagFile {
                path: path.to_path_buf(),
            });
        }

        let mut open_options = OpenOptions::new();
        open_options.read(true).write(true).create(true);
        if append {
            open_options.append(true);
        } else {
            open_options.truncate(true);
        }
        let mut file = open_options.open(path).map_err(|source| TagError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let wrote_pseudo_tags = if append && exists {
            false
        } else {
            let header = pseudo::render_pseudo_tags(numeric_format, SortedState::Unsorted, encoding);
            file.write_all(header.as_bytes())
                .map_err(|source| TagError::Write {
                    path: path.to_path_buf(),
                    source,
                })?;
            true
        };

        if append && exists {
            // An append onto an already-sorted file invalidates the
            // sorted claim; flip the header's digit in place now rather
            // than deferring to close (the new entries land unsorted
            // regardless of what close() is later asked to do).
            pseudo::rewrite_sorted_flag(&mut file, SortedState::Unsorted)
                .map_err(|source| TagError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
            file.seek(SeekFrom::End(0)).map_err(|source| TagError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        }

        Ok(TagFile {
            destination: Destination::Path {
                path: path.to_path_buf(),
                append,
            },
            writer: Box::new(BufWriter::new(file)),
            format,
            numeric_format,
            wrote_pseudo_tags,
            sorted: SortedState::Unsorted,
            backward: false,
        })
    }

    pub fn set_backward(&mut self, backward: bool) {
        self.backward = backward;
    }

    /// Writes one formatted line using the configured writer kind.
    pub fn write_entry(
        &mut self,
        registry: &FieldRegistry,
        entry: &TagEntry,
        ctx: &RenderContext,
    ) -> Result<(), TagError> {
        let line = match self.format {
            WriterKind::Traditional => writer::format_traditional(registry, entry, ctx),
            WriterKind::Extended => writer::format_extended(registry, entry, ctx),
            WriterKind::Xref => writer::format_xref(registry, entry, ctx),
            WriterKind::Json => writer::format_extended(registry, entry, ctx),
        };
        self.writer
            .write_all(line.as_bytes())
            .map_err(|source| self.write_error(source))
    }

    fn write_error(&self, source: io::Error) -> TagError {
        let path = match &self.destination {
            Destination::Stdout => PathBuf::from("-"),
            Destination::Path { path, .. } => path.clone(),
        };
        TagError::Write { path, source }
    }

    /// `close_tag_file`: flushes, then for a real destination file either
    /// sorts in place (if `sort_stage` is given) or leaves the header's
    /// unsorted marker as-is. Stdout needs no further action.
    pub fn close(mut self, sort_stage: Option<(&dyn SortStage, bool)>) -> Result<(), TagError> {
        self.writer.flush().map_err(|source| self.write_error(source))?;

        let Destination::Path { path, .. } = &self.destination else {
            return Ok(());
        };

        if let Some((stage, fold_case)) = sort_stage {
            stage.sort(path, fold_case)?;
            let new_state = if fold_case {
                SortedState::FoldedCase
            } else {
                SortedState::Sorted
            };
            self.sorted = new_state;
            let mut file = OpenOptions::new()
                .read(true)
                .write(true)
                .open(path)
                .map_err(|source| TagError::Io {
                    path: path.clone(),
                    source,
                })?;
            pseudo::rewrite_sorted_flag(&mut file, new_state).map_err(|source| TagError::Io {
                path: path.clone(),
                source,
            })?;
        }

        Ok(())
    }

    pub fn wrote_pseudo_tags(&self) -> bool {
        self.wrote_pseudo_tags
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::{SourceContext, SourcePosition};
    use crate::kind::Kind;
    use std::rc::Rc;

    struct FixedSource;
    impl SourceContext for FixedSource {
        fn position(&self) -> SourcePosition {
            SourcePosition {
                file_name: "a.c".into(),
                language: "C".into(),
                line_number: 1,
                byte_offset: 0,
            }
        }
        fn read_line_at(&self, _byte_offset: u64) -> Option<String> {
            None
        }
        fn allows_null_tags(&self, _language: &str) -> bool {
            false
        }
    }

    struct NoopSort;
    impl SortStage for NoopSort {
        fn sort(&self, _path: &Path, _fold_case: bool) -> Result<(), TagError> {
            Ok(())
        }
    }

    fn scratch_path(label: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("tagwright-tagfile-test-{label}-{}.tags", std::process::id()));
        path
    }

    fn sample_entry() -> TagEntry {
        let source = FixedSource;
        let kind = Rc::new(Kind::new('f', "function", "functions"));
        let mut e = TagEntry::init(&source, "main", kind);
        e.pattern = Some("/^int main(void) {$/".to_string());
        e
    }

    #[test]
    fn fresh_overwrite_writes_pseudo_tags_then_entry() {
        let path = scratch_path("fresh");
        let _ = std::fs::remove_file(&path);
        let registry = FieldRegistry::new();
        let ctx = RenderContext {
            put_field_prefix: false,
        };

        let mut tag_file = TagFile::open(&path, WriterKind::Extended, 2, false, None).unwrap();
        assert!(tag_file.wrote_pseudo_tags());
        tag_file
            .write_entry(&registry, &sample_entry(), &ctx)
            .unwrap();
        tag_file.close(None).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("!_TAG_FILE_FORMAT"));
        assert!(contents.contains("main\ta.c\t"));
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn refuses_to_overwrite_a_file_that_does_not_look_like_tags() {
        let path = scratch_path("notatags");
        std::fs::write(&path, "this is just some prose, not a tag file at all\n").unwrap();

        let result = TagFile::open(&path, WriterKind::Extended, 2, false, None);
        assert!(matches!(result, Err(TagError::NotATagFile { .. })));
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn append_onto_existing_tag_file_skips_rewriting_pseudo_tags() {
        let path = scratch_path("append");
        let _ = std::fs::remove_file(&path);
        let registry = FieldRegistry::new();
        let ctx = RenderContext {
            put_field_prefix: false,
        };

        let mut first = TagFile::open(&path, WriterKind::Extended, 2, false, None).unwrap();
        first.write_entry(&registry, &sample_entry(), &ctx).unwrap();
        first.close(None).unwrap();

        let mut second = TagFile::open(&path, WriterKind::Extended, 2, true, None).unwrap();
        assert!(!second.wrote_pseudo_tags());
        second.write_entry(&registry, &sample_entry(), &ctx).unwrap();
        second.close(None).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.matches("!_TAG_FILE_FORMAT").count(), 1);
        assert_eq!(contents.matches("main\ta.c").count(), 2);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn close_with_sort_stage_updates_sorted_pseudo_tag() {
        let path = scratch_path("sorted");
        let _ = std::fs::remove_file(&path);
        let registry = FieldRegistry::new();
        let ctx = RenderContext {
            put_field_prefix: false,
        };

        let mut tag_file = TagFile::open(&path, WriterKind::Extended, 2, false, None).unwrap();
        tag_file.write_entry(&registry, &sample_entry(), &ctx).unwrap();
        tag_file.close(Some((&NoopSort, false))).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("!_TAG_FILE_SORTED\t1\t"));
        std::fs::remove_file(&path).unwrap();
    }
}
