//! Fix application engine.
//!
//! This module turns a file's combined fix into its new contents:
//! - `span`: wire-level text changes and their offset encodings
//! - `rewriter`: right-to-left byte-range splicing
//! - `dynamic_ref`: `import("mod").Name` to `Name` rewriting
//! - `imports`: consolidation of the resulting imports
//! - `pipeline`: the per-file composition of the above
//!
//! The core component is `ByteRangeRewriter`, which applies
//! edits using byte offsets to safely modify source code.

mod demand;
mod dynamic_ref;
mod imports;
mod pipeline;
mod rewriter;
mod span;

pub use demand::{ImportDemand, ModuleImports};
pub use dynamic_ref::{rewrite_dynamic_references, DynamicRefPattern, DynamicReference};
pub use imports::{
    consolidate_imports, find_import_insertion_point, import_declarations,
    remove_jsx_runtime_import, render_import_block, ImportDeclaration, ImportError,
};
pub use pipeline::{apply_file_changes, AppliedFix, FixError, FixSettings};
pub use rewriter::{ByteRangeRewriter, Edit, RewriteError};
pub use span::{SpanEncoding, TextChange, TextSpan};
