//! # Tag-emission Engine
//!
//! Ties the field registry, cork queue, pattern cache, and tag file
//! together behind the single entry point parsers call: [`Engine::make_tag`]
//! (spec.md §4.2). Constructed once per run and passed through the API
//! explicitly rather than reached for as a global (spec.md §9).

use crate::collab::{SortStage, SourceContext};
use crate::cork::CorkQueue;
use crate::entry::{ScopeIndex, TagEntry, SCOPE_NONE};
use crate::error::TagError;
use crate::field::{FieldRegistry, RenderContext};
use crate::pattern::{self, PatternCache};
use crate::tagfile::TagFile;

pub struct Engine {
    pub registry: FieldRegistry,
    cork: CorkQueue,
    pattern_cache: PatternCache,
    tag_file: TagFile,
    render_ctx: RenderContext,
    backward: bool,
    pattern_length_limit: usize,
    added: u64,
}

impl Engine {
    pub fn new(
        tag_file: TagFile,
        registry: FieldRegistry,
        render_ctx: RenderContext,
        backward: bool,
        pattern_length_limit: usize,
    ) -> Self {
        Engine {
            registry,
            cork: CorkQueue::new(),
            pattern_cache: PatternCache::new(),
            tag_file,
            render_ctx,
            backward,
            pattern_length_limit,
            added: 0,
        }
    }

    pub fn added(&self) -> u64 {
        self.added
    }

    /// A new input file invalidates the pattern cache; callers switch
    /// files between calls to this, not mid-entry.
    pub fn on_new_input_file(&mut self) {
        self.pattern_cache.invalidate();
    }

    pub fn cork(&mut self) {
        self.cork.cork();
    }

    /// Decrements cork depth; on the outermost uncork, resolves scope
    /// names for every buffered entry (spec.md §4.4) and writes them out
    /// in submission order.
    pub fn uncork(&mut self, source: &dyn SourceContext) -> Result<(), TagError> {
        self.cork.uncork();
        if self.cork.is_corked() {
            return Ok(());
        }

        let mut to_resolve: Vec<(ScopeIndex, ScopeIndex)> = Vec::new();
        for idx in 1..self.cork.len() as ScopeIndex {
            if let Some(entry) = self.cork.get(idx) {
                if entry.scope_index != SCOPE_NONE && entry.scope_name.is_none() {
                    to_resolve.push((idx, entry.scope_index));
                }
            }
        }
        for (idx, scope_index) in to_resolve {
            let name = self.cork.scope_name_for(scope_index);
            let kind = self.cork.scope_kind_for(scope_index);
            if let Some(entry) = self.cork.get_mut(idx) {
                entry.scope_name = name;
                entry.scope_kind = kind;
            }
        }

        let drained = self.cork.drain();
        for entry in drained {
            if entry.placeholder {
                continue;
            }
            self.write_final(source, entry)?;
        }
        Ok(())
    }

    /// `make_tag`: the single entry point for emission. Returns the
    /// cork-queue index the entry was stored at (to be passed back in as
    /// a later entry's `scopeIndex`), or `0` if the entry was written
    /// immediately or dropped.
    pub fn make_tag(
        &mut self,
        source: &dyn SourceContext,
        mut entry: TagEntry,
    ) -> Result<ScopeIndex, TagError> {
        if entry.name.is_empty() && !entry.placeholder {
            if !source.allows_null_tags(entry.effective_language()) {
                eprintln!(
                    "warning: {}: empty tag name, skipping",
                    entry.effective_file_name()
                );
                return Ok(SCOPE_NONE);
            }
        }

        if self.cork.is_corked() {
            self.ensure_pattern(source, &mut entry);
            return Ok(self.cork.append(entry));
        }

        self.write_final(source, entry)?;
        Ok(SCOPE_NONE)
    }

    fn ensure_pattern(&mut self, source: &dyn SourceContext, entry: &mut TagEntry) {
        if entry.pattern.is_none() && !entry.line_number_entry {
            entry.pattern = Some(pattern::build_pattern(
                source,
                entry,
                self.backward,
                self.pattern_length_limit,
                &mut self.pattern_cache,
            ));
        }
    }

    fn write_final(&mut self, source: &dyn SourceContext, mut entry: TagEntry) -> Result<(), TagError> {
        self.ensure_pattern(source, &mut entry);
        self.tag_file
            .write_entry(&self.registry, &entry, &self.render_ctx)?;
        self.added += 1;
        Ok(())
    }

    /// `close_tag_file`: flushes and, if `sort_stage` is given, runs it
    /// and updates the sorted pseudo-tag.
    pub fn close(self, sort_stage: Option<(&dyn SortStage, bool)>) -> Result<(), TagError> {
        self.tag_file.close(sort_stage)
    }
}
