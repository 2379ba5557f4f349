//! # Tag Entry Module
//!
//! `TagEntry` is the record type parsers build and hand to
//! [`crate::Engine::make_tag`]. It carries everything a writer needs to
//! format one line of output: the fixed name/file/position columns and
//! the optional extension attributes (scope, type, signature, ...).

use crate::collab::SourceContext;
use crate::kind::Kind;
use indexmap::IndexMap;
use std::rc::Rc;

/// Index into the field registry.
pub type FieldId = u32;

/// Index of a [`crate::kind::Role`] on a `Kind`. `0` is the distinguished
/// "definition" role, always valid regardless of what roles a kind
/// declares.
pub type RoleIndex = u32;
pub const ROLE_DEFINITION: RoleIndex = 0;

/// Index into a [`crate::cork::CorkQueue`]. `0` is the reserved sentinel
/// meaning "no scope".
pub type ScopeIndex = u32;
pub const SCOPE_NONE: ScopeIndex = 0;

/// A `kind:name` pair used for the `typeref` extension field.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TypeRef {
    pub kind_name: String,
    pub ref_name: String,
}

impl TypeRef {
    pub fn new(kind_name: impl Into<String>, ref_name: impl Into<String>) -> Self {
        Self {
            kind_name: kind_name.into(),
            ref_name: ref_name.into(),
        }
    }
}

/// Overrides the file/language/line a tag is reported under, used when a
/// tag was found inside a region remapped by a `#line`-style directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceOverride {
    pub file_name: String,
    pub language: String,
    pub line_number: u32,
}

/// A single tag record, as produced by a parser and consumed by a writer.
#[derive(Debug, Clone)]
pub struct TagEntry {
    pub name: String,
    /// Shared handle to the parser-owned kind; `None` only for
    /// placeholder entries.
    pub kind: Option<Rc<Kind>>,
    pub input_file: String,
    pub input_language: String,
    pub line_number: u32,
    pub file_position: u64,
    pub role_index: RoleIndex,
    pub scope_index: ScopeIndex,
    pub scope_name: Option<String>,
    pub scope_kind: Option<String>,
    pub type_ref: Option<TypeRef>,
    pub access: Option<String>,
    pub implementation: Option<String>,
    pub inheritance: Option<String>,
    pub signature: Option<String>,
    pub source_override: Option<SourceOverride>,
    pub is_file_scope: bool,
    /// Crop the pattern line at the tag name instead of emitting it whole.
    pub truncate_line: bool,
    /// Force a decimal line-number address instead of a search pattern.
    pub line_number_entry: bool,
    /// Never written; exists only so cork indices referencing it stay valid.
    pub placeholder: bool,
    /// Built lazily by the pattern builder; owned once corked.
    pub pattern: Option<String>,
    /// Values for runtime-registered (language-scoped) fields, keyed by
    /// `FieldId`.
    pub extension_fields: IndexMap<FieldId, String>,
}

impl TagEntry {
    /// `init_tag`: fills name/kind/position from the current source
    /// context, role defaulting to "definition".
    pub fn init(source: &dyn SourceContext, name: impl Into<String>, kind: Rc<Kind>) -> Self {
        Self::init_ref(source, name, kind, ROLE_DEFINITION)
    }

    /// `init_ref_tag`: like `init`, with an explicit role.
    pub fn init_ref(
        source: &dyn SourceContext,
        name: impl Into<String>,
        kind: Rc<Kind>,
        role_index: RoleIndex,
    ) -> Self {
        let pos = source.position();
        TagEntry {
            name: name.into(),
            kind: Some(kind),
            input_file: pos.file_name,
            input_language: pos.language,
            line_number: pos.line_number,
            file_position: pos.byte_offset,
            role_index,
            scope_index: SCOPE_NONE,
            scope_name: None,
            scope_kind: None,
            type_ref: None,
            access: None,
            implementation: None,
            inheritance: None,
            signature: None,
            source_override: None,
            is_file_scope: false,
            truncate_line: false,
            line_number_entry: false,
            placeholder: false,
            pattern: None,
            extension_fields: IndexMap::new(),
        }
    }

    /// The reserved sentinel stored at cork-queue index 0.
    pub fn placeholder() -> Self {
        TagEntry {
            name: String::new(),
            kind: None,
            input_file: String::new(),
            input_language: String::new(),
            line_number: 0,
            file_position: 0,
            role_index: ROLE_DEFINITION,
            scope_index: SCOPE_NONE,
            scope_name: None,
            scope_kind: None,
            type_ref: None,
            access: None,
            implementation: None,
            inheritance: None,
            signature: None,
            source_override: None,
            is_file_scope: false,
            truncate_line: false,
            line_number_entry: false,
            placeholder: true,
            pattern: None,
            extension_fields: IndexMap::new(),
        }
    }

    pub fn effective_file_name(&self) -> &str {
        self.source_override
            .as_ref()
            .map(|o| o.file_name.as_str())
            .unwrap_or(&self.input_file)
    }

    pub fn effective_language(&self) -> &str {
        self.source_override
            .as_ref()
            .map(|o| o.language.as_str())
            .unwrap_or(&self.input_language)
    }

    pub fn effective_line_number(&self) -> u32 {
        self.source_override
            .as_ref()
            .map(|o| o.line_number)
            .unwrap_or(self.line_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::SourcePosition;

    struct FixedSource(SourcePosition);
    impl SourceContext for FixedSource {
        fn position(&self) -> SourcePosition {
            self.0.clone()
        }
        fn read_line_at(&self, _byte_offset: u64) -> Option<String> {
            None
        }
        fn allows_null_tags(&self, _language: &str) -> bool {
            false
        }
    }

    #[test]
    fn init_fills_position_from_source_context() {
        let source = FixedSource(SourcePosition {
            file_name: "a.c".into(),
            language: "C".into(),
            line_number: 4,
            byte_offset: 17,
        });
        let kind = Rc::new(Kind::new('f', "function", "functions"));
        let entry = TagEntry::init(&source, "main", kind);
        assert_eq!(entry.name, "main");
        assert_eq!(entry.input_file, "a.c");
        assert_eq!(entry.line_number, 4);
        assert_eq!(entry.file_position, 17);
        assert_eq!(entry.role_index, ROLE_DEFINITION);
    }

    #[test]
    fn source_override_changes_effective_location() {
        let source = FixedSource(SourcePosition {
            file_name: "generated.c".into(),
            language: "C".into(),
            line_number: 100,
            byte_offset: 0,
        });
        let kind = Rc::new(Kind::new('f', "function", "functions"));
        let mut entry = TagEntry::init(&source, "main", kind);
        entry.source_override = Some(SourceOverride {
            file_name: "original.y".into(),
            language: "yacc".into(),
            line_number: 12,
        });
        assert_eq!(entry.effective_file_name(), "original.y");
        assert_eq!(entry.effective_language(), "yacc");
        assert_eq!(entry.effective_line_number(), 12);
    }

    #[test]
    fn placeholder_has_no_kind_and_is_marked() {
        let entry = TagEntry::placeholder();
        assert!(entry.placeholder);
        assert!(entry.kind.is_none());
    }
}
