//! Per-file application of a combined fix.

use super::demand::{ImportDemand, ModuleImports};
use super::dynamic_ref::DynamicRefPattern;
use super::imports::{consolidate_imports, ImportError};
use super::rewriter::{ByteRangeRewriter, RewriteError};
use super::span::{SpanEncoding, TextChange};
use crate::constants::DEFAULT_JSX_RUNTIME_MODULE;

/// Failure while applying one file's changes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FixError {
    /// The text changes could not be spliced in.
    #[error(transparent)]
    Rewrite(#[from] RewriteError),
    /// The required imports could not be inserted.
    #[error(transparent)]
    Import(#[from] ImportError),
}

/// Settings shared by every file of a run.
#[derive(Debug, Clone)]
pub struct FixSettings {
    /// Matcher for dynamic type references.
    pub pattern: DynamicRefPattern,
    /// Module whose lone `JSX` import is dropped when imports are added.
    pub jsx_module: String,
    /// Unit of the incoming span offsets.
    pub encoding: SpanEncoding,
}

impl Default for FixSettings {
    fn default() -> Self {
        Self {
            pattern: DynamicRefPattern::default(),
            jsx_module: DEFAULT_JSX_RUNTIME_MODULE.to_owned(),
            encoding: SpanEncoding::default(),
        }
    }
}

/// Outcome of applying one file's changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedFix {
    /// The new file contents.
    pub text: String,
    /// Whether `text` differs from the original.
    pub changed: bool,
    /// Imports inserted, in emission order.
    pub imports: Vec<ModuleImports>,
}

impl AppliedFix {
    /// Total number of imported names.
    #[must_use]
    pub fn imported_names(&self) -> usize {
        self.imports.iter().map(|m| m.identifiers.len()).sum()
    }
}

/// Apply `changes` to `source`, rewrite dynamic references and add imports.
///
/// The [`ImportDemand`] lives only for this call, so files can be processed
/// independently and concurrently.
///
/// # Errors
///
/// Returns [`FixError`] if a change cannot be applied, a reference is
/// malformed, or imports are needed in a file without import declarations.
pub fn apply_file_changes(
    source: &str,
    changes: &[TextChange],
    settings: &FixSettings,
) -> Result<AppliedFix, FixError> {
    let mut rewriter = ByteRangeRewriter::new(source);
    for (index, change) in changes.iter().enumerate() {
        rewriter.add_edit(change.to_edit(source, settings.encoding, index)?);
    }

    let mut demand = ImportDemand::new();
    let edited = rewriter.apply_rewriting(&settings.pattern, &mut demand)?;
    let text = consolidate_imports(&edited, &demand, &settings.jsx_module)?;

    Ok(AppliedFix {
        changed: text != source,
        text,
        imports: demand.into_modules(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_changes_is_identity() {
        let source = "import a from 'a';\nexport const x = a;\n";
        let applied = apply_file_changes(source, &[], &FixSettings::default()).unwrap();
        assert_eq!(applied.text, source);
        assert!(!applied.changed);
        assert!(applied.imports.is_empty());
    }

    #[test]
    fn test_annotation_with_dynamic_reference() {
        let source = "import { make } from './make';\n\nexport function build() {\n  return make();\n}\n";
        let at = source.find("() {").unwrap() + 2;
        let changes = [TextChange::new(at, 0, r#": import("./shape").Shape"#)];

        let applied = apply_file_changes(source, &changes, &FixSettings::default()).unwrap();

        assert_eq!(
            applied.text,
            "import { make } from './make';\nimport {Shape} from './shape';\n\nexport function build(): Shape {\n  return make();\n}\n"
        );
        assert!(applied.changed);
        assert_eq!(applied.imported_names(), 1);
    }

    #[test]
    fn test_demand_spans_all_changes() {
        let source = "import x from 'x';\nexport const a = x.a;\nexport const b = x.b;\n";
        let a = source.find(" = x.a").unwrap();
        let b = source.find(" = x.b").unwrap();
        let changes = [
            TextChange::new(a, 0, r#": import("m1").X"#),
            TextChange::new(b, 0, r#": import("m2").Y | import("m1").X"#),
        ];

        let applied = apply_file_changes(source, &changes, &FixSettings::default()).unwrap();

        // Later changes are processed first, so m2 is seen before m1
        assert!(applied
            .text
            .starts_with("import x from 'x';\nimport {Y} from 'm2';\nimport {X} from 'm1';\n"));
        assert!(applied.text.contains("export const a: X = x.a;"));
        assert!(applied.text.contains("export const b: Y | X = x.b;"));
    }

    #[test]
    fn test_missing_imports_is_fatal() {
        let source = "export const a = 1;\n";
        let changes = [TextChange::new(14, 0, r#": import("m").A"#)];
        let err = apply_file_changes(source, &changes, &FixSettings::default()).unwrap_err();
        assert!(matches!(
            err,
            FixError::Import(ImportError::NoImportDeclarations { .. })
        ));
    }

    #[test]
    fn test_without_references_no_imports_needed() {
        let source = "export const a = 1;\n";
        let changes = [TextChange::new(14, 0, ": number")];
        let applied = apply_file_changes(source, &changes, &FixSettings::default()).unwrap();
        assert_eq!(applied.text, "export const a: number = 1;\n");
    }

    #[test]
    fn test_jsx_import_removed_when_imports_added() {
        let source = "import type { JSX } from 'react/jsx-runtime';\nimport { C } from './c';\nexport const App = () => <C />;\n";
        let at = source.find("App").unwrap() + 3;
        let changes = [TextChange::new(at, 0, r#": import("react").JSX.Element"#)];

        let applied = apply_file_changes(source, &changes, &FixSettings::default()).unwrap();

        assert_eq!(
            applied.text,
            "import { C } from './c';\nimport {JSX} from 'react';\nexport const App: JSX.Element = () => <C />;\n"
        );
    }
}
