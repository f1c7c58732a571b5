//! Rewriting of dynamic type references into plain names.
//!
//! The analysis engine annotates exports with types it cannot name locally as
//! `import("./module").TypeName`. Those references are replaced by
//! `TypeName`, and the pair is recorded so a regular import can be added.

use super::demand::ImportDemand;
use super::rewriter::{ByteRangeRewriter, Edit, RewriteError};
use crate::constants::DEFAULT_REFERENCE_KEYWORD;
use regex::Regex;
use std::ops::Range;

/// Compiled matcher for `KEYWORD("module").Identifier`.
#[derive(Debug, Clone)]
pub struct DynamicRefPattern {
    keyword: String,
    regex: Regex,
}

/// One dynamic reference found in a text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamicReference<'t> {
    /// Byte range of the whole reference.
    pub range: Range<usize>,
    /// Quoted module specifier, without quotes.
    pub module: &'t str,
    /// Accessed member name.
    pub identifier: &'t str,
}

impl DynamicRefPattern {
    /// Build a pattern for references introduced by `keyword`.
    ///
    /// # Errors
    ///
    /// Returns an error if the keyword yields an invalid regex.
    pub fn new(keyword: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!(
            r#"\b{}\("([^"]*)"\)\.([A-Za-z0-9_]+)"#,
            regex::escape(keyword)
        ))?;
        Ok(Self {
            keyword: keyword.to_owned(),
            regex,
        })
    }

    /// The call keyword this pattern matches.
    #[must_use]
    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    /// True if `text` contains at least one reference.
    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// All non-overlapping references in `text`, left to right.
    pub fn find_iter<'p, 't>(
        &'p self,
        text: &'t str,
    ) -> impl Iterator<Item = DynamicReference<'t>> + 'p
    where
        't: 'p,
    {
        self.regex.captures_iter(text).filter_map(|caps| {
            let whole = caps.get(0)?;
            Some(DynamicReference {
                range: whole.range(),
                module: caps.get(1)?.as_str(),
                identifier: caps.get(2)?.as_str(),
            })
        })
    }
}

impl Default for DynamicRefPattern {
    #[allow(clippy::expect_used)]
    fn default() -> Self {
        Self::new(DEFAULT_REFERENCE_KEYWORD).expect("Invalid dynamic reference regex pattern")
    }
}

/// Rewrite the dynamic references in `new_text`, the replacement for `old_text`.
///
/// If `old_text` already contains a reference, the replacement is returned
/// untouched and nothing is recorded: the region held such a construct before
/// the fix and is left as the engine emitted it. This check is textual and
/// can match coincidentally.
///
/// Otherwise each reference becomes its bare identifier, and the
/// `(module, identifier)` pair is added to `demand`. The nested edits are
/// applied with the plain rewriter, so this pass never recurses.
///
/// # Errors
///
/// Returns [`RewriteError::MalformedReference`] for an empty module or an
/// identifier that starts with a digit.
pub fn rewrite_dynamic_references(
    old_text: &str,
    new_text: &str,
    pattern: &DynamicRefPattern,
    demand: &mut ImportDemand,
) -> Result<String, RewriteError> {
    if pattern.is_match(old_text) {
        tracing::debug!(
            old_text,
            "replaced text already holds a dynamic reference, leaving replacement as-is"
        );
        return Ok(new_text.to_owned());
    }

    let mut rewriter = ByteRangeRewriter::new(new_text);
    for reference in pattern.find_iter(new_text) {
        if reference.module.is_empty()
            || reference
                .identifier
                .starts_with(|c: char| c.is_ascii_digit())
        {
            return Err(RewriteError::MalformedReference {
                module: reference.module.to_owned(),
                identifier: reference.identifier.to_owned(),
            });
        }
        demand.record(reference.module, reference.identifier);
        tracing::debug!(
            module = reference.module,
            identifier = reference.identifier,
            "rewriting dynamic reference"
        );
        rewriter.add_edit(Edit::new(
            reference.range.start,
            reference.range.end,
            reference.identifier,
        ));
    }

    rewriter.apply()
}
