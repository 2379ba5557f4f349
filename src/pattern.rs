//! # Pattern Builder & Line Cache
//!
//! Builds the `exaddr` search-pattern column (`/^...$/` or `?^...?`) from
//! the source line a tag was found on, and caches the last built pattern
//! by file position so repeated builds for the same line are free.

use crate::collab::SourceContext;
use crate::entry::TagEntry;

/// Single-slot cache keyed by file byte position, as spec.md §4.3/§9
/// describes. Cleared whenever something capable of affecting output
/// changes (a new input file, for instance).
#[derive(Debug, Default)]
pub struct PatternCache {
    position: Option<u64>,
    pattern: Option<String>,
}

impl PatternCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn get(&self, position: u64) -> Option<&str> {
        if self.position == Some(position) {
            self.pattern.as_deref()
        } else {
            None
        }
    }

    fn store(&mut self, position: u64, pattern: String) {
        self.position = Some(position);
        self.pattern = Some(pattern);
    }

    /// Drop the cached pattern; call whenever input-file identity changes.
    pub fn invalidate(&mut self) {
        self.position = None;
        self.pattern = None;
    }
}

/// Crops `line` at the first occurrence of `name`, keeping one trailing
/// character past the match (spec.md §4.3, `truncateLine` mode).
fn truncate_at_name(line: &str, name: &str) -> String {
    if name.is_empty() {
        return line.to_string();
    }
    match line.find(name) {
        Some(idx) => {
            let mut end = idx + name.len();
            if let Some(ch) = line[end..].chars().next() {
                end += ch.len_utf8();
            }
            line[..end].to_string()
        }
        None => line.to_string(),
    }
}

/// Escapes `line` for inclusion between the search delimiters, honoring
/// `pattern_length_limit`. Returns the escaped body and whether a
/// trailing `$` anchor may be appended.
fn escape_body(line: &str, delimiter: char, limit: usize) -> (String, bool) {
    let chars: Vec<char> = line.chars().take_while(|&c| c != '\n' && c != '\r').collect();
    let n = chars.len();
    let mut body = String::new();
    let mut hit_limit = false;

    for (i, &c) in chars.iter().enumerate() {
        let is_last = i + 1 == n;
        let unit = match c {
            '\\' => "\\\\".to_string(),
            d if d == delimiter => format!("\\{d}"),
            '$' if is_last => "\\$".to_string(),
            other => other.to_string(),
        };
        if body.chars().count() + unit.chars().count() > limit {
            hit_limit = true;
            break;
        }
        body.push_str(&unit);
    }

    let include_anchor = !hit_limit && body.chars().count() < limit;
    (body, include_anchor)
}

/// Builds the full `/^.../` (or `?^...?`) pattern for `entry`, reading its
/// source line through `source` and consulting/filling `cache`.
pub fn build_pattern(
    source: &dyn SourceContext,
    entry: &TagEntry,
    backward: bool,
    pattern_length_limit: usize,
    cache: &mut PatternCache,
) -> String {
    if !entry.truncate_line {
        if let Some(cached) = cache.get(entry.file_position) {
            return cached.to_string();
        }
    }

    let raw_line = source.read_line_at(entry.file_position).unwrap_or_default();
    let line = if entry.truncate_line {
        truncate_at_name(&raw_line, &entry.name)
    } else {
        raw_line
    };

    let delimiter = if backward { '?' } else { '/' };
    let (body, include_anchor) = escape_body(&line, delimiter, pattern_length_limit);

    let mut pattern = String::with_capacity(body.len() + 4);
    pattern.push(delimiter);
    pattern.push('^');
    pattern.push_str(&body);
    if include_anchor {
        pattern.push('$');
    }
    pattern.push(delimiter);

    if !entry.truncate_line {
        cache.store(entry.file_position, pattern.clone());
    }
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::SourcePosition;

    struct LineSource(&'static str);
    impl SourceContext for LineSource {
        fn position(&self) -> SourcePosition {
            SourcePosition {
                file_name: "a.c".into(),
                language: "C".into(),
                line_number: 1,
                byte_offset: 0,
            }
        }
        fn read_line_at(&self, _byte_offset: u64) -> Option<String> {
            Some(self.0.to_string())
        }
        fn allows_null_tags(&self, _language: &str) -> bool {
            false
        }
    }

    fn entry_at(position: u64) -> TagEntry {
        let source = LineSource("int main(void) {");
        let kind = std::rc::Rc::new(crate::kind::Kind::new('f', "function", "functions"));
        let mut e = TagEntry::init(&source, "main", kind);
        e.file_position = position;
        e
    }

    #[test]
    fn basic_pattern_is_anchored_both_ends() {
        let source = LineSource("int main(void) {");
        let entry = entry_at(0);
        let mut cache = PatternCache::new();
        let pattern = build_pattern(&source, &entry, false, 200, &mut cache);
        assert_eq!(pattern, "/^int main(void) {$/");
    }

    #[test]
    fn backward_search_uses_question_mark_delimiter() {
        let source = LineSource("int main(void) {");
        let entry = entry_at(0);
        let mut cache = PatternCache::new();
        let pattern = build_pattern(&source, &entry, true, 200, &mut cache);
        assert_eq!(pattern, "?^int main(void) {?");
    }

    #[test]
    fn backslash_and_delimiter_are_escaped() {
        let source = LineSource("a\\b/c");
        let entry = entry_at(0);
        let mut cache = PatternCache::new();
        let pattern = build_pattern(&source, &entry, false, 200, &mut cache);
        assert_eq!(pattern, "/^a\\\\b\\/c$/");
    }

    #[test]
    fn only_trailing_dollar_is_escaped() {
        let source = LineSource("a$b$");
        let entry = entry_at(0);
        let mut cache = PatternCache::new();
        let pattern = build_pattern(&source, &entry, false, 200, &mut cache);
        assert_eq!(pattern, "/^a$b\\$$/");
    }

    #[test]
    fn length_limit_omits_trailing_anchor() {
        let long_line = "x".repeat(4096);
        struct LongSource(String);
        impl SourceContext for LongSource {
            fn position(&self) -> SourcePosition {
                SourcePosition {
                    file_name: "a.c".into(),
                    language: "C".into(),
                    line_number: 1,
                    byte_offset: 0,
                }
            }
            fn read_line_at(&self, _byte_offset: u64) -> Option<String> {
                Some(self.0.clone())
            }
            fn allows_null_tags(&self, _language: &str) -> bool {
                false
            }
        }
        let source = LongSource(long_line);
        let entry = entry_at(0);
        let mut cache = PatternCache::new();
        let pattern = build_pattern(&source, &entry, false, 80, &mut cache);
        assert_eq!(pattern, format!("/^{}/", "x".repeat(80)));
        assert!(!pattern.contains('$'));
    }

    #[test]
    fn cache_short_circuits_repeated_builds_at_same_position() {
        let source = LineSource("int main(void) {");
        let entry = entry_at(42);
        let mut cache = PatternCache::new();
        let first = build_pattern(&source, &entry, false, 200, &mut cache);
        // Mutate cache contents directly to prove the second call reuses it
        // rather than re-reading the source line.
        let second = build_pattern(&source, &entry, false, 200, &mut cache);
        assert_eq!(first, second);
        assert_eq!(cache.get(42), Some(first.as_str()));
    }

    #[test]
    fn truncate_line_crops_at_tag_name_plus_one_char() {
        let source = LineSource("struct Foo { int x; };");
        let mut entry = entry_at(0);
        entry.truncate_line = true;
        entry.name = "Foo".to_string();
        let mut cache = PatternCache::new();
        let pattern = build_pattern(&source, &entry, false, 200, &mut cache);
        assert_eq!(pattern, "/^struct Foo {$/");
    }

    #[test]
    fn cache_invalidate_forces_rebuild() {
        let entry = entry_at(5);
        let mut cache = PatternCache::new();
        cache.store(5, "/^stale$/".to_string());
        cache.invalidate();
        assert_eq!(cache.get(5), None);
        let source = LineSource("int main(void) {");
        let rebuilt = build_pattern(&source, &entry, false, 200, &mut cache);
        assert_eq!(rebuilt, "/^int main(void) {$/");
    }
}
