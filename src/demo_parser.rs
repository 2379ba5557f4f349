//! # Demo Parser
//!
//! spec.md scopes per-language parsers out as an external collaborator:
//! the engine only calls back into one via [`crate::collab::SourceContext`].
//! This module is that collaborator's simplest possible implementation —
//! a line-oriented C-ish function/struct scanner — good enough to drive
//! the CLI binary and integration tests without pulling in a real
//! grammar engine.

use crate::collab::{SourceContext, SourcePosition};
use crate::engine::Engine;
use crate::entry::TagEntry;
use crate::kind::Kind;
use regex::Regex;
use std::fs;
use std::io;
use std::rc::Rc;

/// Holds one input file's lines and reports the position of whichever
/// line is currently being inspected.
pub struct FileSource {
    file_name: String,
    language: String,
    lines: Vec<String>,
    current_line: u32,
}

impl FileSource {
    pub fn read(path: &str) -> io::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let language = guess_language(path);
        Ok(FileSource {
            file_name: path.to_string(),
            language,
            lines: contents.lines().map(|l| l.to_string()).collect(),
            current_line: 0,
        })
    }

    pub fn lines(&self) -> impl Iterator<Item = (u32, &str)> {
        self.lines
            .iter()
            .enumerate()
            .map(|(i, l)| (i as u32 + 1, l.as_str()))
    }

    fn set_current_line(&mut self, line_number: u32) {
        self.current_line = line_number;
    }
}

impl SourceContext for FileSource {
    fn position(&self) -> SourcePosition {
        SourcePosition {
            file_name: self.file_name.clone(),
            language: self.language.clone(),
            line_number: self.current_line,
            byte_offset: (self.current_line.saturating_sub(1)) as u64,
        }
    }

    /// `byte_offset` is really a 1-based line index here: a line-oriented
    /// demo has no use for true byte positions and the pattern builder
    /// only needs *some* stable key per line.
    fn read_line_at(&self, byte_offset: u64) -> Option<String> {
        self.lines.get(byte_offset as usize).cloned()
    }

    fn allows_null_tags(&self, _language: &str) -> bool {
        false
    }
}

fn guess_language(path: &str) -> String {
    match path.rsplit('.').next() {
        Some("c") | Some("h") => "C".to_string(),
        Some("rs") => "Rust".to_string(),
        Some("go") => "Go".to_string(),
        _ => "Unknown".to_string(),
    }
}

/// Scans `source`'s lines for a function definition (`name(...) {`) or a
/// struct/class definition (`struct Name {` / `class Name {`), emitting
/// one tag per match through `engine`. Functions found inside a struct's
/// braces are corked as children with `class:Name` scope.
pub fn scan_file(engine: &mut Engine, source: &mut FileSource) -> Result<(), crate::error::TagError> {
    let function_kind = Rc::new(Kind::new('f', "function", "functions"));
    let struct_kind = Rc::new(Kind::new('c', "class", "structs and classes"));

    let function_re = Regex::new(r"^\s*\w[\w\s\*]*\b(\w+)\s*\([^;]*\)\s*\{").unwrap();
    let struct_re = Regex::new(r"^\s*(?:struct|class)\s+(\w+)").unwrap();

    let mut scope_stack: Vec<u32> = Vec::new();
    let mut brace_depth_at_scope: Vec<i32> = Vec::new();
    let mut brace_depth = 0i32;

    let lines: Vec<(u32, String)> = source
        .lines()
        .map(|(n, l)| (n, l.to_string()))
        .collect();

    for (line_number, text) in lines {
        source.set_current_line(line_number);

        if let Some(captures) = struct_re.captures(&text) {
            let name = captures.get(1).unwrap().as_str();
            let mut entry = TagEntry::init(source, name, struct_kind.clone());
            entry.scope_index = scope_stack.last().copied().unwrap_or(0);
            engine.cork();
            let index = engine.make_tag(source, entry)?;
            scope_stack.push(index);
            brace_depth_at_scope.push(brace_depth);
        } else if let Some(captures) = function_re.captures(&text) {
            let name = captures.get(1).unwrap().as_str();
            let mut entry = TagEntry::init(source, name, function_kind.clone());
            entry.scope_index = scope_stack.last().copied().unwrap_or(0);
            engine.make_tag(source, entry)?;
        }

        for c in text.chars() {
            match c {
                '{' => brace_depth += 1,
                '}' => {
                    brace_depth -= 1;
                    if let Some(&scope_depth) = brace_depth_at_scope.last() {
                        if brace_depth <= scope_depth {
                            scope_stack.pop();
                            brace_depth_at_scope.pop();
                            engine.uncork(source)?;
                        }
                    }
                }
                _ => {}
            }
        }
    }

    while !scope_stack.is_empty() {
        scope_stack.pop();
        brace_depth_at_scope.pop();
        engine.uncork(source)?;
    }

    Ok(())
}

/// Same scan as [`scan_file`], but returns a flat, unscoped list of
/// entries instead of driving an [`Engine`]. Etags output has no scope
/// column, so the etags CLI path uses this rather than cork/uncork.
pub fn scan_file_flat(source: &mut FileSource) -> Vec<TagEntry> {
    let function_kind = Rc::new(Kind::new('f', "function", "functions"));
    let struct_kind = Rc::new(Kind::new('c', "class", "structs and classes"));

    let function_re = Regex::new(r"^\s*\w[\w\s\*]*\b(\w+)\s*\([^;]*\)\s*\{").unwrap();
    let struct_re = Regex::new(r"^\s*(?:struct|class)\s+(\w+)").unwrap();

    let mut entries = Vec::new();
    let mut cache = crate::pattern::PatternCache::new();
    let lines: Vec<(u32, String)> = source.lines().map(|(n, l)| (n, l.to_string())).collect();

    for (line_number, text) in lines {
        source.set_current_line(line_number);
        let kind = if let Some(captures) = struct_re.captures(&text) {
            Some((captures.get(1).unwrap().as_str().to_string(), struct_kind.clone()))
        } else {
            function_re
                .captures(&text)
                .map(|c| (c.get(1).unwrap().as_str().to_string(), function_kind.clone()))
        };
        if let Some((name, kind)) = kind {
            let mut entry = TagEntry::init(source, &name, kind);
            entry.pattern = Some(crate::pattern::build_pattern(source, &entry, false, 96, &mut cache));
            entries.push(entry);
        }
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{FieldRegistry, RenderContext, WriterKind};
    use crate::tagfile::TagFile;

    fn scratch_path(label: &str) -> std::path::PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!(
            "tagwright-demoparser-test-{label}-{}.tags",
            std::process::id()
        ));
        path
    }

    #[test]
    fn finds_top_level_function() {
        let src_path = scratch_path("src-fn.c");
        fs::write(&src_path, "int main(void) {\n    return 0;\n}\n").unwrap();
        let tag_path = scratch_path("out-fn");
        let _ = fs::remove_file(&tag_path);

        let registry = FieldRegistry::new();
        let ctx = RenderContext {
            put_field_prefix: false,
        };
        let tag_file = TagFile::open(&tag_path, WriterKind::Extended, 2, false, None).unwrap();
        let mut engine = Engine::new(tag_file, registry, ctx, false, 96);

        let mut source = FileSource::read(src_path.to_str().unwrap()).unwrap();
        scan_file(&mut engine, &mut source).unwrap();
        engine.close(None).unwrap();

        let contents = fs::read_to_string(&tag_path).unwrap();
        assert!(contents.contains("main\t"));
        fs::remove_file(&src_path).unwrap();
        fs::remove_file(&tag_path).unwrap();
    }

    #[test]
    fn nests_method_under_struct_scope() {
        let src_path = scratch_path("src-struct.c");
        fs::write(
            &src_path,
            "struct Foo {\n    int bar(void) {\n        return 1;\n    }\n};\n",
        )
        .unwrap();
        let tag_path = scratch_path("out-struct");
        let _ = fs::remove_file(&tag_path);

        let registry = FieldRegistry::new();
        let ctx = RenderContext {
            put_field_prefix: false,
        };
        let tag_file = TagFile::open(&tag_path, WriterKind::Extended, 2, false, None).unwrap();
        let mut engine = Engine::new(tag_file, registry, ctx, false, 96);

        let mut source = FileSource::read(src_path.to_str().unwrap()).unwrap();
        scan_file(&mut engine, &mut source).unwrap();
        engine.close(None).unwrap();

        let contents = fs::read_to_string(&tag_path).unwrap();
        assert!(contents.contains("Foo\t"));
        assert!(contents.contains("bar\t"));
        assert!(contents.contains("class:Foo"));
        fs::remove_file(&src_path).unwrap();
        fs::remove_file(&tag_path).unwrap();
    }
}
