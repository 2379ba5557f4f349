//! A concrete, in-process [`crate::collab::SortStage`]: reads the whole
//! file, sorts lines byte-wise (optionally case-folded), and rewrites it.
//! spec.md deliberately leaves the algorithm a collaborator's choice;
//! this is the crate's own default rather than shelling out to `sort(1)`.

use crate::collab::SortStage;
use crate::error::TagError;
use crate::pseudo::is_pseudo_tag_line;
use std::fs;
use std::path::Path;

pub struct LexicalSort;

impl SortStage for LexicalSort {
    fn sort(&self, path: &Path, fold_case: bool) -> Result<(), TagError> {
        let contents = fs::read_to_string(path).map_err(|source| TagError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut lines: Vec<&str> = contents.lines().collect();
        let pseudo_count = lines.iter().take_while(|l| is_pseudo_tag_line(l)).count();
        let (header, body) = lines.split_at(pseudo_count);
        let mut body = body.to_vec();

        if fold_case {
            body.sort_by(|a, b| a.to_lowercase().cmp(&b.to_lowercase()));
        } else {
            body.sort_unstable();
        }

        lines = header.to_vec();
        lines.extend(body);

        let mut out = lines.join("\n");
        if !out.is_empty() {
            out.push('\n');
        }

        fs::write(path, out).map_err(|source| TagError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}
