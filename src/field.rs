//! # Field Registry
//!
//! A process-wide (in this crate: explicitly constructed and passed
//! around, never global — spec.md §9's testability-preferred option)
//! ordered catalog of named, letter-keyed tag attributes. Seeded with
//! built-in fields in three tiers (fixed, classic-extension,
//! universal-extension); parsers may register additional language-scoped
//! fields at runtime with [`FieldRegistry::define_field`].

use crate::entry::{FieldId, TagEntry};
use std::collections::HashMap;

/// Which output flavor a render is being produced for. Etags doesn't
/// route through the field registry at all (spec.md §4.5), so it has no
/// variant here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterKind {
    Traditional,
    Extended,
    Xref,
    /// Reserved seat: emits raw UTF-8 and may reject unescapable values.
    Json,
}

const N_WRITER_KINDS: usize = 4;

fn writer_slot(writer: WriterKind) -> usize {
    match writer {
        WriterKind::Traditional => 0,
        WriterKind::Extended => 1,
        WriterKind::Xref => 2,
        WriterKind::Json => 3,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldDataType {
    Str,
    Integer,
    Bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldLanguage {
    Any,
    Specific(String),
}

/// Extra inputs a renderer needs beyond the entry itself.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext {
    /// `putFieldPrefix` option: when true, fields that are normally bare
    /// (just `kind`, in this crate) are emitted as `name:value` instead.
    pub put_field_prefix: bool,
}

/// Outcome of attempting to render a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    /// Rendered text to splice into the extension-field suffix.
    Rendered(String),
    /// Field has no value on this entry, or is disabled; omit silently.
    Absent,
    /// A strict writer refused to render an unescapable value; drop the
    /// field but keep the record (spec.md §7).
    Rejected,
}

type Renderer = fn(&TagEntry, &RenderContext) -> Option<String>;

pub struct FieldDescriptor {
    pub letter: Option<char>,
    pub name: Option<String>,
    pub description: &'static str,
    pub enabled: bool,
    pub fixed: bool,
    pub language: FieldLanguage,
    pub data_type: FieldDataType,
    pub sibling: Option<FieldId>,
    renderers: [Option<Renderer>; N_WRITER_KINDS],
    availability: Option<fn(&TagEntry) -> bool>,
    /// Fields with no dedicated renderer fall back to reading
    /// `entry.extension_fields[id]` and rendering `"{name}:{value}"` for
    /// every writer kind (the "universal-extension" tier).
    generic: bool,
}

impl FieldDescriptor {
    fn builtin(
        letter: Option<char>,
        name: &str,
        description: &'static str,
        fixed: bool,
        data_type: FieldDataType,
    ) -> Self {
        Self {
            letter,
            name: Some(name.to_string()),
            description,
            enabled: true,
            fixed,
            language: FieldLanguage::Any,
            data_type,
            sibling: None,
            renderers: [None; N_WRITER_KINDS],
            availability: None,
            generic: false,
        }
    }

    fn with_renderer(mut self, writer: WriterKind, f: Renderer) -> Self {
        self.renderers[writer_slot(writer)] = Some(f);
        self
    }

    fn with_availability(mut self, f: fn(&TagEntry) -> bool) -> Self {
        self.availability = Some(f);
        self
    }

    fn disabled_by_default(mut self) -> Self {
        self.enabled = false;
        self
    }

    fn generic_field(name: &str, description: &'static str) -> Self {
        Self {
            letter: None,
            name: Some(name.to_string()),
            description,
            enabled: false,
            fixed: false,
            language: FieldLanguage::Any,
            data_type: FieldDataType::Str,
            sibling: None,
            renderers: [None; N_WRITER_KINDS],
            availability: None,
            generic: true,
        }
    }
}

// --- Dedicated renderers for the classic-extension fields -------------

fn render_kind(entry: &TagEntry, ctx: &RenderContext) -> Option<String> {
    let kind = entry.kind.as_ref()?;
    if ctx.put_field_prefix {
        Some(format!("kind:{}", kind.letter))
    } else {
        Some(kind.letter.to_string())
    }
}

fn kind_available(entry: &TagEntry) -> bool {
    entry.kind.is_some()
}

fn render_line(entry: &TagEntry, _ctx: &RenderContext) -> Option<String> {
    Some(format!("line:{}", entry.effective_line_number()))
}

fn render_language(entry: &TagEntry, _ctx: &RenderContext) -> Option<String> {
    let lang = entry.effective_language();
    if lang.is_empty() {
        None
    } else {
        Some(format!("language:{lang}"))
    }
}

fn language_available(entry: &TagEntry) -> bool {
    !entry.effective_language().is_empty()
}

fn render_scope(entry: &TagEntry, _ctx: &RenderContext) -> Option<String> {
    let name = entry.scope_name.as_ref()?;
    let kind = entry.scope_kind.as_deref().unwrap_or("scope");
    Some(format!("{kind}:{name}"))
}

fn scope_available(entry: &TagEntry) -> bool {
    entry.scope_name.is_some()
}

fn render_typeref(entry: &TagEntry, _ctx: &RenderContext) -> Option<String> {
    let t = entry.type_ref.as_ref()?;
    Some(format!("typeref:{}:{}", t.kind_name, t.ref_name))
}

fn typeref_available(entry: &TagEntry) -> bool {
    entry.type_ref.is_some()
}

fn render_file_scope(entry: &TagEntry, _ctx: &RenderContext) -> Option<String> {
    if entry.is_file_scope {
        Some("file".to_string())
    } else {
        None
    }
}

fn file_scope_available(entry: &TagEntry) -> bool {
    entry.is_file_scope
}

fn render_inherits(entry: &TagEntry, _ctx: &RenderContext) -> Option<String> {
    entry.inheritance.as_ref().map(|v| format!("inherits:{v}"))
}

fn inherits_available(entry: &TagEntry) -> bool {
    entry.inheritance.is_some()
}

fn render_access(entry: &TagEntry, _ctx: &RenderContext) -> Option<String> {
    entry.access.as_ref().map(|v| format!("access:{v}"))
}

fn access_available(entry: &TagEntry) -> bool {
    entry.access.is_some()
}

fn render_implementation(entry: &TagEntry, _ctx: &RenderContext) -> Option<String> {
    entry
        .implementation
        .as_ref()
        .map(|v| format!("implementation:{v}"))
}

fn implementation_available(entry: &TagEntry) -> bool {
    entry.implementation.is_some()
}

fn render_signature(entry: &TagEntry, _ctx: &RenderContext) -> Option<String> {
    entry.signature.as_ref().map(|v| format!("signature:{v}"))
}

fn signature_available(entry: &TagEntry) -> bool {
    entry.signature.is_some()
}

fn render_role(entry: &TagEntry, _ctx: &RenderContext) -> Option<String> {
    if entry.role_index == crate::entry::ROLE_DEFINITION {
        return None;
    }
    let kind = entry.kind.as_ref()?;
    Some(format!("role:{}", kind.role_name(entry.role_index)))
}

fn role_available(entry: &TagEntry) -> bool {
    entry.role_index != crate::entry::ROLE_DEFINITION
}

/// Escapes tabs and ASCII control characters the way the traditional and
/// extended writers do for the `name`/`input` columns.
fn control_escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\n' => out.push_str("\\n"),
            c if (c as u32) < 0x20 || (c as u32) == 0x7F => {
                out.push_str(&format!("\\x{:02x}", c as u32))
            }
            c => out.push(c),
        }
    }
    out
}

fn has_unescapable_for_json(value: &str) -> bool {
    value.chars().any(|c| c.is_whitespace() || c.is_control())
}

fn render_name_escaping(entry: &TagEntry, _ctx: &RenderContext) -> Option<String> {
    Some(control_escape(&entry.name))
}

fn render_name_strict(entry: &TagEntry, _ctx: &RenderContext) -> Option<String> {
    if has_unescapable_for_json(&entry.name) {
        None
    } else {
        Some(entry.name.clone())
    }
}

fn render_input_escaping(entry: &TagEntry, _ctx: &RenderContext) -> Option<String> {
    Some(control_escape(entry.effective_file_name()))
}

fn render_pattern(entry: &TagEntry, _ctx: &RenderContext) -> Option<String> {
    entry.pattern.clone()
}

fn always_available(_entry: &TagEntry) -> bool {
    true
}

/// `FieldId`s of the built-in fields, stable across a process since the
/// seed tables are registered in a fixed order.
pub const FIELD_NAME: FieldId = 0;
pub const FIELD_INPUT: FieldId = 1;
pub const FIELD_PATTERN: FieldId = 2;
pub const FIELD_KIND: FieldId = 3;
pub const FIELD_LINE: FieldId = 4;
pub const FIELD_LANGUAGE: FieldId = 5;
pub const FIELD_SCOPE: FieldId = 6;
pub const FIELD_TYPEREF: FieldId = 7;
pub const FIELD_FILE_SCOPE: FieldId = 8;
pub const FIELD_INHERITS: FieldId = 9;
pub const FIELD_ACCESS: FieldId = 10;
pub const FIELD_IMPLEMENTATION: FieldId = 11;
pub const FIELD_SIGNATURE: FieldId = 12;
pub const FIELD_ROLE: FieldId = 13;
pub const FIELD_END: FieldId = 14;
pub const FIELD_EXTRAS: FieldId = 15;
pub const FIELD_EPOCH: FieldId = 16;
pub const FIELD_SCOPE_KIND: FieldId = 17;
pub const FIELD_PROPERTIES: FieldId = 18;
pub const FIELD_DECORATORS: FieldId = 19;
pub const FIELD_NAMESPACE: FieldId = 20;
pub const FIELD_XPATH: FieldId = 21;

/// The fixed order extended-writer extension fields are composed in
/// (spec.md §4.5 item 2).
pub const EXTENDED_FIELD_ORDER: &[FieldId] = &[
    FIELD_KIND,
    FIELD_LINE,
    FIELD_LANGUAGE,
    FIELD_SCOPE,
    FIELD_TYPEREF,
    FIELD_FILE_SCOPE,
    FIELD_INHERITS,
    FIELD_ACCESS,
    FIELD_IMPLEMENTATION,
    FIELD_SIGNATURE,
    FIELD_ROLE,
];

pub struct FieldRegistry {
    descriptors: Vec<FieldDescriptor>,
    by_letter: HashMap<char, FieldId>,
    /// Maps a name to the *first* (oldest) registration; later
    /// same-named registrations are reached by walking `sibling` links.
    by_name: HashMap<String, FieldId>,
}

impl FieldRegistry {
    pub fn new() -> Self {
        let mut registry = FieldRegistry {
            descriptors: Vec::new(),
            by_letter: HashMap::new(),
            by_name: HashMap::new(),
        };
        registry.seed();
        registry
    }

    fn push(&mut self, descriptor: FieldDescriptor) -> FieldId {
        let id = self.descriptors.len() as FieldId;
        if let Some(letter) = descriptor.letter {
            self.by_letter.insert(letter, id);
        }
        if let Some(name) = descriptor.name.clone() {
            self.by_name.entry(name).or_insert(id);
        }
        self.descriptors.push(descriptor);
        id
    }

    fn seed(&mut self) {
        // Tier 1: fixed fields, always present, never disableable.
        self.push(
            FieldDescriptor::builtin(
                Some('N'),
                "name",
                "tag name",
                true,
                FieldDataType::Str,
            )
            .with_renderer(WriterKind::Traditional, render_name_escaping)
            .with_renderer(WriterKind::Extended, render_name_escaping)
            .with_renderer(WriterKind::Xref, render_name_escaping)
            .with_renderer(WriterKind::Json, render_name_strict)
            .with_availability(always_available),
        );
        self.push(
            FieldDescriptor::builtin(
                Some('F'),
                "input",
                "input file",
                true,
                FieldDataType::Str,
            )
            .with_renderer(WriterKind::Traditional, render_input_escaping)
            .with_renderer(WriterKind::Extended, render_input_escaping)
            .with_renderer(WriterKind::Xref, render_input_escaping)
            .with_renderer(WriterKind::Json, render_input_escaping)
            .with_availability(always_available),
        );
        self.push(
            FieldDescriptor::builtin(
                Some('P'),
                "pattern",
                "search pattern",
                true,
                FieldDataType::Str,
            )
            .with_renderer(WriterKind::Traditional, render_pattern)
            .with_renderer(WriterKind::Extended, render_pattern)
            .with_renderer(WriterKind::Json, render_pattern)
            .with_availability(|e| e.pattern.is_some() || e.line_number_entry),
        );

        // Tier 2: classic-extension fields, in the extended-writer order.
        self.push(
            FieldDescriptor::builtin(Some('k'), "kind", "tag kind", false, FieldDataType::Str)
                .with_renderer(WriterKind::Extended, render_kind)
                .with_renderer(WriterKind::Xref, render_kind)
                .with_availability(kind_available),
        );
        self.push(
            FieldDescriptor::builtin(Some('n'), "line", "line number", false, FieldDataType::Integer)
                .with_renderer(WriterKind::Extended, render_line)
                .with_availability(always_available)
                .disabled_by_default(),
        );
        self.push(
            FieldDescriptor::builtin(Some('l'), "language", "source language", false, FieldDataType::Str)
                .with_renderer(WriterKind::Extended, render_language)
                .with_availability(language_available)
                .disabled_by_default(),
        );
        self.push(
            FieldDescriptor::builtin(Some('s'), "scope", "scope of definition", false, FieldDataType::Str)
                .with_renderer(WriterKind::Extended, render_scope)
                .with_availability(scope_available),
        );
        self.push(
            FieldDescriptor::builtin(Some('t'), "typeref", "type and name of referent", false, FieldDataType::Str)
                .with_renderer(WriterKind::Extended, render_typeref)
                .with_availability(typeref_available),
        );
        self.push(
            FieldDescriptor::builtin(Some('f'), "file", "file-restricted scoping", false, FieldDataType::Bool)
                .with_renderer(WriterKind::Extended, render_file_scope)
                .with_availability(file_scope_available)
                .disabled_by_default(),
        );
        self.push(
            FieldDescriptor::builtin(Some('i'), "inherits", "inheritance list", false, FieldDataType::Str)
                .with_renderer(WriterKind::Extended, render_inherits)
                .with_availability(inherits_available)
                .disabled_by_default(),
        );
        self.push(
            FieldDescriptor::builtin(Some('a'), "access", "access modifier", false, FieldDataType::Str)
                .with_renderer(WriterKind::Extended, render_access)
                .with_availability(access_available)
                .disabled_by_default(),
        );
        self.push(
            FieldDescriptor::builtin(Some('m'), "implementation", "implementation hint", false, FieldDataType::Str)
                .with_renderer(WriterKind::Extended, render_implementation)
                .with_availability(implementation_available)
                .disabled_by_default(),
        );
        self.push(
            FieldDescriptor::builtin(Some('S'), "signature", "function/method signature", false, FieldDataType::Str)
                .with_renderer(WriterKind::Extended, render_signature)
                .with_availability(signature_available)
                .disabled_by_default(),
        );
        self.push(
            FieldDescriptor::builtin(Some('r'), "role", "non-definition role", false, FieldDataType::Str)
                .with_renderer(WriterKind::Extended, render_role)
                .with_availability(role_available),
        );

        // Tier 3: universal-extension fields, generic key:value lookup.
        for (letter, name, description) in [
            ('e', "end", "end line number"),
            ('E', "extras", "marked extras"),
            ('Z', "epoch", "modification time"),
            ('g', "scopeKind", "kind of the enclosing scope"),
            ('o', "properties", "additional properties"),
            ('d', "decorators", "attached decorators"),
            ('p', "namespace", "enclosing namespace"),
            ('x', "xpath", "xpath of the tag"),
        ] {
            let mut descriptor = FieldDescriptor::generic_field(name, description);
            descriptor.letter = Some(letter);
            self.push(descriptor);
        }
    }

    /// `define_field`: registers a parser-owned, possibly language-scoped
    /// field. If `name` already exists, the prior entry's sibling link is
    /// updated to chain forward to this one.
    pub fn define_field(
        &mut self,
        name: impl Into<String>,
        description: &'static str,
        language: FieldLanguage,
    ) -> FieldId {
        let name = name.into();
        let new_id = self.descriptors.len() as FieldId;
        let mut descriptor = FieldDescriptor::generic_field(&name, description);
        descriptor.language = language;
        descriptor.enabled = true;

        if let Some(&head) = self.by_name.get(&name) {
            let mut cursor = head;
            loop {
                let next_sibling = self.descriptors[cursor as usize].sibling;
                match next_sibling {
                    Some(next) => cursor = next,
                    None => break,
                }
            }
            self.descriptors[cursor as usize].sibling = Some(new_id);
        } else {
            self.by_name.insert(name, new_id);
        }

        self.descriptors.push(descriptor);
        new_id
    }

    pub fn field_for_letter(&self, letter: char) -> Option<FieldId> {
        self.by_letter.get(&letter).copied()
    }

    /// Walks the sibling chain starting at the first registration of
    /// `name`, preferring a sibling whose language is `Specific(requested)`
    /// over one that's `Any`, so a language-scoped override shadows the
    /// built-in generic field rather than being shadowed by it. Falls back
    /// to the first `Any` entry if no language-specific sibling matches.
    pub fn field_for_name(&self, name: &str, language: Option<&str>) -> Option<FieldId> {
        let head = *self.by_name.get(name)?;

        if let Some(requested) = language {
            let mut cursor = head;
            loop {
                let descriptor = &self.descriptors[cursor as usize];
                if let FieldLanguage::Specific(lang) = &descriptor.language {
                    if lang == requested {
                        return Some(cursor);
                    }
                }
                match descriptor.sibling {
                    Some(next) => cursor = next,
                    None => break,
                }
            }
        }

        let mut cursor = head;
        loop {
            let descriptor = &self.descriptors[cursor as usize];
            if matches!(descriptor.language, FieldLanguage::Any) {
                return Some(cursor);
            }
            match descriptor.sibling {
                Some(next) => cursor = next,
                None => return None,
            }
        }
    }

    pub fn field_name(&self, id: FieldId) -> &str {
        self.descriptors
            .get(id as usize)
            .and_then(|d| d.name.as_deref())
            .unwrap_or("unknown")
    }

    pub fn field_enabled(&self, id: FieldId) -> bool {
        self.descriptors
            .get(id as usize)
            .map(|d| d.enabled)
            .unwrap_or(false)
    }

    /// Sets the enabled state, returning the *previous* state. Refuses to
    /// disable a fixed field (warns, leaves it enabled) per spec.md §4.1/§7.
    pub fn enable_field(&mut self, id: FieldId, state: bool, warn_if_fixed: bool) -> bool {
        let Some(descriptor) = self.descriptors.get_mut(id as usize) else {
            return false;
        };
        let previous = descriptor.enabled;
        if descriptor.fixed && !state {
            if warn_if_fixed {
                eprintln!(
                    "warning: field '{}' is fixed and cannot be disabled",
                    descriptor.name.as_deref().unwrap_or("?")
                );
            }
            return previous;
        }
        descriptor.enabled = state;
        previous
    }

    pub fn field_has_value(&self, id: FieldId, entry: &TagEntry) -> bool {
        let Some(descriptor) = self.descriptors.get(id as usize) else {
            return false;
        };
        if descriptor.generic {
            return entry.extension_fields.contains_key(&id);
        }
        descriptor
            .availability
            .map(|f| f(entry))
            .unwrap_or(true)
    }

    /// Renders field `id` for `writer`. `parser_field_index` lets a
    /// parser-registered generic field be addressed the same way a
    /// built-in one is; it is otherwise unused by built-ins.
    pub fn render_field(
        &self,
        writer: WriterKind,
        id: FieldId,
        entry: &TagEntry,
        ctx: &RenderContext,
    ) -> RenderOutcome {
        let Some(descriptor) = self.descriptors.get(id as usize) else {
            return RenderOutcome::Absent;
        };
        if !descriptor.enabled {
            return RenderOutcome::Absent;
        }
        if !self.field_has_value(id, entry) {
            return RenderOutcome::Absent;
        }

        if descriptor.generic {
            return match entry.extension_fields.get(&id) {
                Some(value) => RenderOutcome::Rendered(format!(
                    "{}:{}",
                    descriptor.name.as_deref().unwrap_or("field"),
                    value
                )),
                None => RenderOutcome::Absent,
            };
        }

        match descriptor.renderers[writer_slot(writer)] {
            None => RenderOutcome::Absent,
            Some(render) => match render(entry, ctx) {
                Some(text) => RenderOutcome::Rendered(text),
                None => {
                    // A dedicated renderer returning `None` despite the
                    // value being "available" means it refused to emit
                    // an unescapable value (only the strict Json seat
                    // does this today).
                    if matches!(writer, WriterKind::Json) {
                        RenderOutcome::Rejected
                    } else {
                        RenderOutcome::Absent
                    }
                }
            },
        }
    }

    pub fn next_sibling(&self, id: FieldId) -> Option<FieldId> {
        self.descriptors.get(id as usize).and_then(|d| d.sibling)
    }

    pub fn iter_fields(&self) -> impl Iterator<Item = FieldId> {
        0..self.descriptors.len() as FieldId
    }
}

impl Default for FieldRegistry {
    fn default() -> Self {
        Self::new()
    }
}
