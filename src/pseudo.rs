//! # Pseudo-tags
//!
//! The `!_TAG_...` metadata lines written at the head of a traditional or
//! extended tag file (spec.md §4.6): format version, sort state, and
//! program identification. Also handles the append-mode in-place rewrite
//! of `!_TAG_FILE_SORTED` when new entries are appended unsorted to an
//! already-sorted file.

use std::io::{self, Read, Seek, SeekFrom, Write};

pub const PROGRAM_NAME: &str = "tagwright";
pub const PROGRAM_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PROGRAM_URL: &str = "https://example.invalid/tagwright";
pub const PROGRAM_AUTHOR: &str = "tagwright contributors";

/// Tri-state sort flag a pseudo-tag header records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortedState {
    Unsorted,
    Sorted,
    FoldedCase,
}

impl SortedState {
    fn as_digit(self) -> u8 {
        match self {
            SortedState::Unsorted => b'0',
            SortedState::Sorted => b'1',
            SortedState::FoldedCase => b'2',
        }
    }
}

/// Builds the full block of pseudo-tag lines for a freshly written tag
/// file, in the fixed order ctags-family tools use.
pub fn render_pseudo_tags(
    format: u8,
    sorted: SortedState,
    encoding: Option<&str>,
) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "!_TAG_FILE_FORMAT\t{}\t/extended format/\n",
        format
    ));
    out.push_str(&format!(
        "!_TAG_FILE_SORTED\t{}\t/0=unsorted, 1=sorted, 2=foldcase/\n",
        sorted.as_digit() as char
    ));
    if let Some(enc) = encoding {
        out.push_str(&format!("!_TAG_FILE_ENCODING\t{enc}\t//\n"));
    }
    out.push_str(&format!(
        "!_TAG_PROGRAM_AUTHOR\t{PROGRAM_AUTHOR}\t//\n"
    ));
    out.push_str(&format!("!_TAG_PROGRAM_NAME\t{PROGRAM_NAME}\t//\n"));
    out.push_str(&format!("!_TAG_PROGRAM_URL\t{PROGRAM_URL}\t//\n"));
    out.push_str(&format!(
        "!_TAG_PROGRAM_VERSION\t{PROGRAM_VERSION}\t//\n"
    ));
    out
}

pub fn is_pseudo_tag_line(line: &str) -> bool {
    line.starts_with("!_TAG_")
}

/// Locates the byte offset and length of the `!_TAG_FILE_SORTED` line's
/// digit, if the file opens with one, by scanning only the pseudo-tag
/// header block at the start of the file.
fn find_sorted_digit_offset<R: Read + Seek>(reader: &mut R) -> io::Result<Option<u64>> {
    reader.seek(SeekFrom::Start(0))?;
    let mut buf = Vec::new();
    // Pseudo-tags are a handful of short lines; 4KiB comfortably covers
    // them without reading the whole (possibly huge) tag file.
    reader.by_ref().take(4096).read_to_end(&mut buf)?;
    let text = String::from_utf8_lossy(&buf);

    let mut offset: u64 = 0;
    for line in text.split_inclusive('\n') {
        let trimmed = line.trim_end_matches('\n');
        if !is_pseudo_tag_line(trimmed) {
            break;
        }
        if let Some(rest) = trimmed.strip_prefix("!_TAG_FILE_SORTED\t") {
            if !rest.is_empty() {
                let digit_offset = offset + "!_TAG_FILE_SORTED\t".len() as u64;
                return Ok(Some(digit_offset));
            }
        }
        offset += line.len() as u64;
    }
    Ok(None)
}

/// Rewrites the `!_TAG_FILE_SORTED` digit in place, used when append mode
/// adds unsorted entries to a file whose header claims `sorted`. A
/// single-byte overwrite, no file-length change, so it's safe to do
/// without truncating or rewriting the rest of the file.
pub fn rewrite_sorted_flag<F: Read + Write + Seek>(
    file: &mut F,
    new_state: SortedState,
) -> io::Result<bool> {
    match find_sorted_digit_offset(file)? {
        Some(offset) => {
            file.seek(SeekFrom::Start(offset))?;
            file.write_all(&[new_state.as_digit()])?;
            Ok(true)
        }
        None => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn render_includes_format_and_sorted_lines() {
        let rendered = render_pseudo_tags(2, SortedState::Sorted, None);
        assert!(rendered.contains("!_TAG_FILE_FORMAT\t2\t"));
        assert!(rendered.contains("!_TAG_FILE_SORTED\t1\t"));
        assert!(rendered.contains("!_TAG_PROGRAM_NAME\ttagwright\t"));
    }

    #[test]
    fn render_includes_encoding_line_only_when_given() {
        let without = render_pseudo_tags(2, SortedState::Sorted, None);
        assert!(!without.contains("ENCODING"));
        let with = render_pseudo_tags(2, SortedState::Sorted, Some("utf-8"));
        assert!(with.contains("!_TAG_FILE_ENCODING\tutf-8\t"));
    }

    #[test]
    fn is_pseudo_tag_line_matches_bang_underscore_tag_prefix() {
        assert!(is_pseudo_tag_line("!_TAG_FILE_FORMAT\t2\t//"));
        assert!(!is_pseudo_tag_line("main\ta.c\t/^int main(void) {$/"));
    }

    #[test]
    fn rewrite_sorted_flag_flips_digit_in_place() {
        let header = render_pseudo_tags(2, SortedState::Sorted, None);
        let mut buf = Cursor::new(header.into_bytes());
        let rewrote = rewrite_sorted_flag(&mut buf, SortedState::Unsorted).unwrap();
        assert!(rewrote);
        let text = String::from_utf8(buf.into_inner()).unwrap();
        assert!(text.contains("!_TAG_FILE_SORTED\t0\t"));
    }

    #[test]
    fn rewrite_sorted_flag_preserves_file_length() {
        let header = render_pseudo_tags(2, SortedState::Sorted, None);
        let original_len = header.len();
        let mut buf = Cursor::new(header.into_bytes());
        rewrite_sorted_flag(&mut buf, SortedState::FoldedCase).unwrap();
        assert_eq!(buf.into_inner().len(), original_len);
    }

    #[test]
    fn rewrite_sorted_flag_on_file_without_pseudo_tags_is_a_noop() {
        let mut buf = Cursor::new(b"main\ta.c\t/^int main(void) {$/\n".to_vec());
        let rewrote = rewrite_sorted_flag(&mut buf, SortedState::Unsorted).unwrap();
        assert!(!rewrote);
    }
}
