//! # Cork Queue
//!
//! Buffers tags whose scope isn't known yet (a nested definition seen
//! before its enclosing one closes) so they can be emitted once the
//! scope chain is resolved. Index `0` is a reserved placeholder meaning
//! "no scope" (spec.md §4.4); every real entry's parent index is
//! guaranteed to be less than its own index, so walking parent links
//! always terminates.

use crate::entry::{ScopeIndex, TagEntry, SCOPE_NONE};

pub struct CorkQueue {
    entries: Vec<TagEntry>,
    depth: u32,
}

impl CorkQueue {
    pub fn new() -> Self {
        CorkQueue {
            entries: vec![TagEntry::placeholder()],
            depth: 0,
        }
    }

    /// `cork`: begin (or extend) a deferred region. While `depth() > 0`,
    /// [`CorkQueue::append`] holds entries instead of reporting them as
    /// immediately final.
    pub fn cork(&mut self) {
        self.depth += 1;
    }

    /// `uncork`: end one level of deferral.
    pub fn uncork(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn is_corked(&self) -> bool {
        self.depth > 0
    }

    /// Appends a deep copy of `entry` to the queue, returning its index.
    /// Callers pass this index back in as a later entry's `scope_index`
    /// to nest it.
    pub fn append(&mut self, entry: TagEntry) -> ScopeIndex {
        let index = self.entries.len() as ScopeIndex;
        self.entries.push(entry);
        index
    }

    pub fn get(&self, index: ScopeIndex) -> Option<&TagEntry> {
        self.entries.get(index as usize)
    }

    pub fn get_mut(&mut self, index: ScopeIndex) -> Option<&mut TagEntry> {
        self.entries.get_mut(index as usize)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.len() <= 1
    }

    /// Builds the dotted scope name for `index` by walking parent links
    /// back to [`SCOPE_NONE`] and joining the collected names with `.`.
    /// Returns `None` for `SCOPE_NONE` itself or a dangling index.
    pub fn scope_name_for(&self, index: ScopeIndex) -> Option<String> {
        if index == SCOPE_NONE {
            return None;
        }
        let mut names = Vec::new();
        let mut cursor = index;
        while cursor != SCOPE_NONE {
            let entry = self.entries.get(cursor as usize)?;
            names.push(entry.name.clone());
            let parent = entry.scope_index;
            if parent >= cursor {
                // Invariant violation: a parent must precede its child.
                // Stop rather than loop forever.
                break;
            }
            cursor = parent;
        }
        names.reverse();
        if names.is_empty() {
            None
        } else {
            Some(names.join("."))
        }
    }

    /// The scope *kind* name (e.g. `"class"`) of the immediate parent of
    /// `index`, used to key the `scope` extension field.
    pub fn scope_kind_for(&self, index: ScopeIndex) -> Option<String> {
        if index == SCOPE_NONE {
            return None;
        }
        self.entries
            .get(index as usize)
            .and_then(|e| e.kind.as_ref())
            .map(|k| k.name.clone())
    }

    /// Drains every buffered, non-placeholder entry in insertion order,
    /// resetting the queue to empty. Called when the cork depth returns
    /// to zero and the held entries are ready to be written.
    pub fn drain(&mut self) -> Vec<TagEntry> {
        let drained: Vec<TagEntry> = self.entries.drain(1..).collect();
        self.entries.push(TagEntry::placeholder());
        drained
    }
}

impl Default for CorkQueue {
    fn default() -> Self {
        Self::new()
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

    fn make_entry(name: &str, scope: ScopeIndex) -> TagEntry {
        let source = FixedSource;
        let kind = Rc::new(Kind::new('c', "class", "classes"));
        let mut e = TagEntry::init(&source, name, kind);
        e.scope_index = scope;
        e
    }

    #[test]
    fn new_queue_has_reserved_placeholder_at_zero() {
        let queue = CorkQueue::new();
        assert_eq!(queue.len(), 1);
        assert!(queue.is_empty());
        assert_eq!(queue.scope_name_for(SCOPE_NONE), None);
    }

    #[test]
    fn cork_uncork_tracks_depth() {
        let mut queue = CorkQueue::new();
        assert!(!queue.is_corked());
        queue.cork();
        queue.cork();
        assert_eq!(queue.depth(), 2);
        queue.uncork();
        assert!(queue.is_corked());
        queue.uncork();
        assert!(!queue.is_corked());
    }

    #[test]
    fn uncork_below_zero_saturates() {
        let mut queue = CorkQueue::new();
        queue.uncork();
        assert_eq!(queue.depth(), 0);
    }

    #[test]
    fn nested_scope_name_joins_with_dots() {
        let mut queue = CorkQueue::new();
        let outer = queue.append(make_entry("Foo", SCOPE_NONE));
        let inner = queue.append(make_entry("bar", outer));
        assert_eq!(queue.scope_name_for(outer), Some("Foo".to_string()));
        assert_eq!(queue.scope_name_for(inner), Some("Foo.bar".to_string()));
    }

    #[test]
    fn scope_kind_reflects_parent_kind_name() {
        let mut queue = CorkQueue::new();
        let outer = queue.append(make_entry("Foo", SCOPE_NONE));
        assert_eq!(queue.scope_kind_for(outer), Some("class".to_string()));
    }

    #[test]
    fn drain_returns_entries_and_resets_to_empty() {
        let mut queue = CorkQueue::new();
        queue.append(make_entry("Foo", SCOPE_NONE));
        queue.append(make_entry("bar", 1));
        let drained = queue.drain();
        assert_eq!(drained.len(), 2);
        assert!(queue.is_empty());
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn parent_index_must_precede_child_or_walk_stops() {
        let mut queue = CorkQueue::new();
        // Index 1 claiming index 1 as its own parent would loop forever
        // without the `parent >= cursor` guard.
        let mut broken = make_entry("weird", 1);
        broken.scope_index = 1;
        let idx = queue.append(broken);
        assert_eq!(queue.scope_name_for(idx), Some("weird".to_string()));
    }
}
