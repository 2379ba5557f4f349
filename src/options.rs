//! Command-line configuration for the tag-emission engine.
//!
//! Mirrors the permissive string-to-enum parsing ctags-family tools use
//! for `--sort`/`--append`-style flags: a handful of recognized spellings
//! map to the real value, anything else is reported and a safe default
//! kept rather than aborting.

use crate::field::{FieldRegistry, WriterKind};
use clap::Parser;

/// Tri-state sort request (`sorted` option, spec.md §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortRequest {
    Unsorted,
    Sorted,
    FoldCase,
}

fn parse_bool_ish(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "yes" | "on" | "true" | "1" => Some(true),
        "no" | "off" | "false" | "0" => Some(false),
        _ => None,
    }
}

fn parse_sort_request(value: &str) -> SortRequest {
    match value.to_lowercase().as_str() {
        "foldcase" | "fold" | "2" => SortRequest::FoldCase,
        "yes" | "on" | "true" | "1" | "sorted" => SortRequest::Sorted,
        "no" | "off" | "false" | "0" | "unsorted" => SortRequest::Unsorted,
        other => {
            eprintln!("warning: unrecognized --sort value '{other}', defaulting to sorted");
            SortRequest::Sorted
        }
    }
}

/// Command-line options for the tag-emission engine.
#[derive(Parser, Clone)]
#[command(about = "Emit vi/ctags/etags compatible tag files from structured tag records", long_about = None)]
pub struct Options {
    /// Name to be used for the tag file; `-` writes to stdout.
    #[arg(short = 'f', long = "tag-file", default_value = "tags")]
    pub tag_file: String,

    /// Append to an existing tag file instead of overwriting it.
    /// Values of 'yes', 'on', 'true', '1' set it to true.
    #[arg(long = "append", default_value = "no", verbatim_doc_comment)]
    pub append_raw: String,
    #[arg(skip)]
    pub append: bool,

    /// Tag file format: 1 = traditional, 2 = extended.
    #[arg(long = "format", default_value = "2")]
    pub tag_file_format: u8,

    /// Sort request: 'yes'/'sorted', 'no'/'unsorted', or 'foldcase'.
    #[arg(long = "sort", default_value = "yes", verbatim_doc_comment)]
    pub sort_raw: String,
    #[arg(skip)]
    pub sort: SortRequest,

    /// Select the Emacs-style etags writer instead of traditional/extended.
    #[arg(long = "etags", default_value_t = false)]
    pub etags: bool,

    /// Select the cross-reference columnar writer.
    #[arg(long = "xref", default_value_t = false)]
    pub xref: bool,

    /// Use `?^...?` instead of `/^.../` for the search pattern.
    #[arg(long = "backward-search", default_value_t = false)]
    pub backward: bool,

    /// Maximum escaped-character length of the pattern column.
    #[arg(long = "pattern-length-limit", default_value = "96")]
    pub pattern_length_limit: usize,

    /// Honor source-file overrides recorded from `#line`-style directives.
    #[arg(long = "line-directives", default_value_t = false)]
    pub line_directives: bool,

    /// Emit `name:value` for fields normally written bare (just `kind`).
    #[arg(long = "put-field-prefix", default_value_t = false)]
    pub put_field_prefix: bool,

    /// Written verbatim as the `!_TAG_FILE_ENCODING` pseudo-tag, if set.
    #[arg(long = "output-encoding")]
    pub output_encoding: Option<String>,

    /// Reserved for a custom xref format string; currently unused.
    #[arg(long = "xformat")]
    pub custom_xfmt: Option<String>,

    /// Comma-separated `+field`/`-field` toggles, or a concatenated
    /// string of single-letter field codes (e.g. `nksSaf`).
    #[arg(long = "fields", default_value = "", verbatim_doc_comment)]
    pub fields: String,

    /// Files/directories matching the pattern will not be processed.
    #[arg(long)]
    pub exclude: Vec<String>,

    /// Input file names to process.
    pub file_names: Vec<String>,
}

impl Default for SortRequest {
    fn default() -> Self {
        SortRequest::Sorted
    }
}

impl Options {
    pub fn new() -> Self {
        let mut options = Self::parse();
        options.finish_parsing();
        options
    }

    fn finish_parsing(&mut self) {
        let mut filename_misinterpreted: Option<String> = None;

        if let Some(parsed) = parse_bool_ish(&self.append_raw) {
            self.append = parsed;
        } else {
            self.append = false;
            filename_misinterpreted = Some(self.append_raw.clone());
        }

        self.sort = parse_sort_request(&self.sort_raw);

        if let Some(filename) = filename_misinterpreted {
            self.file_names.insert(0, filename);
        }
    }

    /// Which writer flavor the current flags select; `etags` and `xref`
    /// both take priority over the plain traditional/extended choice.
    pub fn writer_kind(&self) -> WriterKind {
        if self.xref {
            WriterKind::Xref
        } else if self.tag_file_format <= 1 {
            WriterKind::Traditional
        } else {
            WriterKind::Extended
        }
    }

    /// Applies `--fields` toggles to `registry`: either a comma-separated
    /// list of `+letter`/`-letter` tokens, or (if no `+`/`-` is present) a
    /// bare concatenation of letters to enable, disabling everything else
    /// that isn't fixed.
    pub fn apply_fields(&self, registry: &mut FieldRegistry) {
        if self.fields.is_empty() {
            return;
        }

        if self.fields.contains('+') || self.fields.contains('-') {
            for token in self.fields.split(',') {
                let token = token.trim();
                if token.len() < 2 {
                    continue;
                }
                let (sign, letter) = token.split_at(1);
                let Some(letter) = letter.chars().next() else {
                    continue;
                };
                let Some(id) = registry.field_for_letter(letter) else {
                    eprintln!("warning: unknown field letter '{letter}' in --fields");
                    continue;
                };
                registry.enable_field(id, sign == "+", true);
            }
            return;
        }

        let wanted: Vec<char> = self.fields.chars().collect();
        for id in registry.iter_fields().collect::<Vec<_>>() {
            registry.enable_field(id, false, false);
        }
        for &letter in &wanted {
            match registry.field_for_letter(letter) {
                Some(id) => {
                    registry.enable_field(id, true, true);
                }
                None => eprintln!("warning: unknown field letter '{letter}' in --fields"),
            }
        }
    }
}

impl Default for Options {
    fn default() -> Self {
        Self::parse_from(std::iter::empty::<String>())
    }
}
