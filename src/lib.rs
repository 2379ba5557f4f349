/*!
Emit vi/ctags/etags compatible tag files from structured tag records.

This crate is the tag-emission engine of a ctags-family tool: the part
that takes tag records a language parser produces and writes them as
textual records in the traditional, extended, etags, or xref format,
maintaining sortedness, cross-reference, and scope-nesting guarantees.
It does not parse any language itself; [`demo_parser`] is a minimal
stand-in collaborator used by the CLI binary and the integration tests.

## Usage

```rust,compile_fail
use tagwright::{Engine, FieldRegistry, RenderContext, TagFile, WriterKind};

let tag_file = TagFile::open(std::path::Path::new("tags"), WriterKind::Extended, 2, false, None)?;
let registry = FieldRegistry::new();
let ctx = RenderContext { put_field_prefix: false };
let mut engine = Engine::new(tag_file, registry, ctx, false, 96);
```
*/

pub mod collab;
pub mod cork;
pub mod demo_parser;
pub mod engine;
pub mod entry;
pub mod error;
pub mod field;
pub mod file_finder;
pub mod kind;
pub mod options;
pub mod pattern;
pub mod pseudo;
mod shell_to_regex;
pub mod sort;
pub mod tagfile;
pub mod writer;

pub use collab::{SortStage, SourceContext, SourcePosition};
pub use engine::Engine;
pub use entry::{ScopeIndex, TagEntry, TypeRef};
pub use error::TagError;
pub use field::{FieldRegistry, RenderContext, WriterKind};
pub use kind::{Kind, Role};
pub use options::Options;
pub use tagfile::TagFile;
