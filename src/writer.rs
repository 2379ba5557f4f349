//! # Writers
//!
//! Turns a [`TagEntry`] into the bytes that land in the tag file, in one
//! of four formats (spec.md §4.5). Traditional and extended both produce
//! the classic three-column-plus-suffix line; xref produces a
//! human-readable columnar report; etags bypasses the field registry
//! entirely and groups tags by source file.

use crate::entry::TagEntry;
use crate::field::{
    FieldRegistry, RenderContext, RenderOutcome, WriterKind, EXTENDED_FIELD_ORDER, FIELD_INPUT,
    FIELD_KIND, FIELD_NAME, FIELD_PATTERN,
};

fn rendered_or_warn(
    registry: &FieldRegistry,
    writer: WriterKind,
    field: u32,
    entry: &TagEntry,
    ctx: &RenderContext,
) -> Option<String> {
    match registry.render_field(writer, field, entry, ctx) {
        RenderOutcome::Rendered(text) => Some(text),
        RenderOutcome::Absent => None,
        RenderOutcome::Rejected => {
            eprintln!(
                "warning: {}: field '{}' has an unescapable value, dropping it",
                entry.effective_file_name(),
                registry.field_name(field)
            );
            None
        }
    }
}

/// Formats the traditional three-column line: `name\tfile\tpattern\n`.
/// Returns `None` if the entry's name was rejected outright (only
/// reachable if a caller mixes a [`WriterKind::Json`]-flavored registry
/// into this path, which this crate's own callers never do).
pub fn format_traditional(
    registry: &FieldRegistry,
    entry: &TagEntry,
    ctx: &RenderContext,
) -> String {
    let name = rendered_or_warn(registry, WriterKind::Traditional, FIELD_NAME, entry, ctx)
        .unwrap_or_else(|| entry.name.clone());
    let file = rendered_or_warn(registry, WriterKind::Traditional, FIELD_INPUT, entry, ctx)
        .unwrap_or_else(|| entry.effective_file_name().to_string());
    let pattern = rendered_or_warn(registry, WriterKind::Traditional, FIELD_PATTERN, entry, ctx)
        .unwrap_or_else(|| format!("{}", entry.effective_line_number()));
    format!("{name}\t{file}\t{pattern}\n")
}

/// Formats the extended line: the traditional three columns, followed by
/// `;"` and a tab-separated run of enabled extension fields, in the
/// fixed order spec.md §4.5 item 2 gives for the classic tier, with any
/// enabled universal (runtime-registered) fields trailing after those.
pub fn format_extended(registry: &FieldRegistry, entry: &TagEntry, ctx: &RenderContext) -> String {
    let name = rendered_or_warn(registry, WriterKind::Extended, FIELD_NAME, entry, ctx)
        .unwrap_or_else(|| entry.name.clone());
    let file = rendered_or_warn(registry, WriterKind::Extended, FIELD_INPUT, entry, ctx)
        .unwrap_or_else(|| entry.effective_file_name().to_string());
    let pattern = rendered_or_warn(registry, WriterKind::Extended, FIELD_PATTERN, entry, ctx)
        .unwrap_or_else(|| format!("{}", entry.effective_line_number()));

    let mut extras: Vec<String> = Vec::new();
    for &field in EXTENDED_FIELD_ORDER {
        if let Some(text) = rendered_or_warn(registry, WriterKind::Extended, field, entry, ctx) {
            extras.push(text);
        }
    }
    for field in registry.iter_fields() {
        if EXTENDED_FIELD_ORDER.contains(&field)
            || field == FIELD_NAME
            || field == FIELD_INPUT
            || field == FIELD_PATTERN
        {
            continue;
        }
        if let Some(text) = rendered_or_warn(registry, WriterKind::Extended, field, entry, ctx) {
            extras.push(text);
        }
    }

    if extras.is_empty() {
        format!("{name}\t{file}\t{pattern}\n")
    } else {
        format!("{name}\t{file}\t{pattern};\"\t{}\n", extras.join("\t"))
    }
}

/// Collapses runs of ASCII whitespace to a single space and strips the
/// pattern builder's delimiters/anchors, for a readable xref context
/// column.
fn compact_xref_context(pattern: &str) -> String {
    let mut chars = pattern.chars().peekable();
    let delimiter = chars.next();
    let mut body: String = chars.collect();
    if body.starts_with('^') {
        body.remove(0);
    }
    if let Some(d) = delimiter {
        if body.ends_with(d) {
            body.pop();
        }
    }
    if body.ends_with('$') {
        body.pop();
    }

    let mut out = String::with_capacity(body.len());
    let mut last_was_space = false;
    for c in body.chars() {
        if c.is_whitespace() {
            if !last_was_space {
                out.push(' ');
            }
            last_was_space = true;
        } else {
            out.push(c);
            last_was_space = false;
        }
    }
    out.trim().to_string()
}

/// Formats the xref report line: `name  kind  line  file  context`,
/// space-separated for human reading rather than machine parsing.
pub fn format_xref(registry: &FieldRegistry, entry: &TagEntry, ctx: &RenderContext) -> String {
    let name = rendered_or_warn(registry, WriterKind::Xref, FIELD_NAME, entry, ctx)
        .unwrap_or_else(|| entry.name.clone());
    let kind = entry
        .kind
        .as_ref()
        .map(|k| k.letter.to_string())
        .unwrap_or_else(|| "?".to_string());
    let line = entry.effective_line_number();
    let file = rendered_or_warn(registry, WriterKind::Xref, FIELD_INPUT, entry, ctx)
        .unwrap_or_else(|| entry.effective_file_name().to_string());
    let context = entry
        .pattern
        .as_deref()
        .map(compact_xref_context)
        .unwrap_or_default();
    format!("{name:<16} {kind:<2} {line:<5} {file:<24} {context}\n")
}

/// Etags groups tags by source file under a form-feed-delimited header
/// and bypasses the field registry (spec.md §4.5); built up incrementally
/// as entries arrive, one group per file.
#[derive(Debug, Default)]
pub struct EtagsGroup {
    file_name: String,
    tags_section: String,
}

impl EtagsGroup {
    pub fn new(file_name: impl Into<String>) -> Self {
        EtagsGroup {
            file_name: file_name.into(),
            tags_section: String::new(),
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Appends one tag. File-scoped entries use the short form
    /// `\x7f<name>\x01<line>,0` with no line-text prefix; everything else
    /// uses the explicit-name form `<pattern>\x7f<name>\x01<line>,<offset>\n`.
    pub fn push(&mut self, entry: &TagEntry) {
        if entry.is_file_scope {
            self.tags_section.push('\u{7f}');
            self.tags_section.push_str(&entry.name);
            self.tags_section.push('\u{01}');
            self.tags_section
                .push_str(&entry.effective_line_number().to_string());
            self.tags_section.push_str(",0\n");
            return;
        }

        let pattern_text = entry
            .pattern
            .as_deref()
            .map(|p| compact_xref_context(p))
            .unwrap_or_else(|| entry.name.clone());
        self.tags_section.push_str(&pattern_text);
        self.tags_section.push('\u{7f}');
        self.tags_section.push_str(&entry.name);
        self.tags_section.push('\u{01}');
        self.tags_section
            .push_str(&entry.effective_line_number().to_string());
        self.tags_section.push(',');
        self.tags_section
            .push_str(&entry.file_position.to_string());
        self.tags_section.push('\n');
    }

    pub fn is_empty(&self) -> bool {
        self.tags_section.is_empty()
    }

    /// Renders this group's form-feed header and tag section, sized by
    /// the byte length of the tags section itself (not the source
    /// file's size on disk).
    pub fn render(&self) -> String {
        format!(
            "\u{0c}\n{},{}\n{}",
            self.file_name,
            self.tags_section.len(),
            self.tags_section
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::{SourceContext, SourcePosition};
    use crate::field::FieldRegistry;
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

    fn sample_entry() -> TagEntry {
        let source = FixedSource;
        let kind = Rc::new(Kind::new('f', "function", "functions"));
        let mut e = TagEntry::init(&source, "main", kind);
        e.pattern = Some("/^int main(void) {$/".to_string());
        e
    }

    #[test]
    fn traditional_line_has_three_tab_separated_columns() {
        let registry = FieldRegistry::new();
        let entry = sample_entry();
        let ctx = RenderContext {
            put_field_prefix: false,
        };
        let line = format_traditional(&registry, &entry, &ctx);
        assert_eq!(line, "main\ta.c\t/^int main(void) {$/\n");
    }

    #[test]
    fn extended_line_appends_bare_kind_when_no_other_fields() {
        let registry = FieldRegistry::new();
        let entry = sample_entry();
        let ctx = RenderContext {
            put_field_prefix: false,
        };
        let line = format_extended(&registry, &entry, &ctx);
        assert_eq!(line, "main\ta.c\t/^int main(void) {$/;\"\tf\n");
    }

    #[test]
    fn extended_line_includes_scope_with_its_kind_as_key() {
        let registry = FieldRegistry::new();
        let mut entry = sample_entry();
        entry.scope_name = Some("Foo".to_string());
        entry.scope_kind = Some("class".to_string());
        let ctx = RenderContext {
            put_field_prefix: false,
        };
        let line = format_extended(&registry, &entry, &ctx);
        assert_eq!(
            line,
            "main\ta.c\t/^int main(void) {$/;\"\tf\tclass:Foo\n"
        );
    }

    #[test]
    fn extended_line_omits_suffix_when_kind_disabled_and_nothing_else_present() {
        let mut registry = FieldRegistry::new();
        registry.enable_field(crate::field::FIELD_KIND, false, false);
        let entry = sample_entry();
        let ctx = RenderContext {
            put_field_prefix: false,
        };
        let line = format_extended(&registry, &entry, &ctx);
        assert_eq!(line, "main\ta.c\t/^int main(void) {$/\n");
    }

    #[test]
    fn xref_context_strips_delimiters_and_collapses_whitespace() {
        assert_eq!(
            compact_xref_context("/^int    main(void)   {$/"),
            "int main(void) {"
        );
    }

    #[test]
    fn xref_line_includes_name_kind_line_and_file() {
        let registry = FieldRegistry::new();
        let entry = sample_entry();
        let ctx = RenderContext {
            put_field_prefix: false,
        };
        let line = format_xref(&registry, &entry, &ctx);
        assert!(line.contains("main"));
        assert!(line.contains('f'));
        assert!(line.contains("a.c"));
        assert!(line.contains("int main(void) {"));
    }

    #[test]
    fn etags_group_renders_form_feed_header_and_tag_line() {
        let mut group = EtagsGroup::new("a.c");
        group.push(&sample_entry());
        let rendered = group.render();
        assert!(rendered.starts_with("\u{0c}\na.c,"));
        assert!(rendered.contains("main\u{01}1,0"));
    }

    #[test]
    fn etags_group_byte_count_matches_tags_section_length() {
        let mut group = EtagsGroup::new("a.c");
        group.push(&sample_entry());
        let rendered = group.render();
        let header_line = rendered.lines().nth(1).unwrap();
        let count: usize = header_line.split(',').nth(1).unwrap().parse().unwrap();
        assert_eq!(count, group.tags_section.len());
    }

    #[test]
    fn etags_group_file_scope_entry_omits_line_text_and_offset() {
        let mut entry = sample_entry();
        entry.is_file_scope = true;
        let mut group = EtagsGroup::new("a.c");
        group.push(&entry);
        let rendered = group.render();
        assert!(rendered.contains("\u{7f}main\u{01}1,0\n"));
        assert!(!rendered.contains("int main(void)"));
    }
}
