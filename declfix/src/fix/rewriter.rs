//! Byte-range safe code rewriter.
//!
//! This module provides the rewriter that splices a file's text changes into
//! its source using byte ranges, preserving formatting and rejecting overlaps.
//!
//! Edits are always expressed in the coordinates of the *original* text and
//! applied right to left, so an edit never sees a shift caused by another one.
//!
//! # Usage
//!
//! ```
//! use declfix::fix::{ByteRangeRewriter, Edit};
//!
//! let source = "hello world";
//! let mut rewriter = ByteRangeRewriter::new(source);
//! rewriter.add_edit(Edit::new(0, 5, "hi"));
//! let fixed = rewriter.apply().expect("should apply");
//! assert_eq!(fixed, "hi world");
//! ```

use super::demand::ImportDemand;
use super::dynamic_ref::{rewrite_dynamic_references, DynamicRefPattern};

/// A single edit operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    /// Start byte offset (inclusive)
    pub start_byte: usize,
    /// End byte offset (exclusive)
    pub end_byte: usize,
    /// Replacement content
    pub replacement: String,
}

impl Edit {
    /// Create a new edit
    #[must_use]
    pub fn new(start_byte: usize, end_byte: usize, replacement: impl Into<String>) -> Self {
        Self {
            start_byte,
            end_byte,
            replacement: replacement.into(),
        }
    }

    /// Create a deletion edit
    #[must_use]
    pub fn delete(start_byte: usize, end_byte: usize) -> Self {
        Self::new(start_byte, end_byte, "")
    }

    /// Create an insertion edit (insert before position)
    #[must_use]
    pub fn insert(position: usize, content: impl Into<String>) -> Self {
        Self::new(position, position, content)
    }

    /// Check if this edit overlaps with another.
    ///
    /// An insertion touching either boundary of a range does not overlap it.
    #[must_use]
    pub const fn overlaps(&self, other: &Self) -> bool {
        self.start_byte < other.end_byte && other.start_byte < self.end_byte
    }
}

/// Error during rewriting
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RewriteError {
    /// Two or more edits have overlapping ranges
    #[error("Overlapping edits at indices {edit_a} and {edit_b}")]
    OverlappingEdits {
        /// Index of first overlapping edit
        edit_a: usize,
        /// Index of second overlapping edit
        edit_b: usize,
    },
    /// Edit range is out of bounds
    #[error("Edit {edit_index} out of bounds: end_byte {end_byte} > source length {source_len}")]
    OutOfBounds {
        /// Index of the bad edit
        edit_index: usize,
        /// End byte of the edit
        end_byte: usize,
        /// Length of the source
        source_len: usize,
    },
    /// Edit ends before it starts
    #[error("Edit {edit_index} has an inverted range {start_byte}..{end_byte}")]
    InvertedRange {
        /// Index of the bad edit
        edit_index: usize,
        /// Start byte of the edit
        start_byte: usize,
        /// End byte of the edit
        end_byte: usize,
    },
    /// Offset cannot be mapped onto the source text
    #[error("Edit {edit_index} has offset {offset} outside the text or inside a character")]
    InvalidOffset {
        /// Index of the bad edit
        edit_index: usize,
        /// The offending offset, in the encoding it was given in
        offset: usize,
    },
    /// A dynamic reference without a usable module or identifier
    #[error("Malformed dynamic reference: module {module:?}, identifier {identifier:?}")]
    MalformedReference {
        /// Module specifier as matched
        module: String,
        /// Member name as matched
        identifier: String,
    },
}

/// Safe code rewriter using byte ranges
///
/// This rewriter applies edits in reverse order to preserve byte positions,
/// and validates that edits don't overlap.
#[derive(Debug, Clone)]
pub struct ByteRangeRewriter {
    /// Original source code
    source: String,
    /// Pending edits
    edits: Vec<Edit>,
}

impl ByteRangeRewriter {
    /// Create a new rewriter for the given source
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            edits: Vec::new(),
        }
    }

    /// Add an edit to the pending list
    pub fn add_edit(&mut self, edit: Edit) {
        self.edits.push(edit);
    }

    /// Add multiple edits
    pub fn add_edits(&mut self, edits: impl IntoIterator<Item = Edit>) {
        self.edits.extend(edits);
    }

    /// Get the number of pending edits
    #[must_use]
    pub fn edit_count(&self) -> usize {
        self.edits.len()
    }

    /// Check if there are any pending edits
    #[must_use]
    pub fn has_edits(&self) -> bool {
        !self.edits.is_empty()
    }

    /// Validate edits without applying them
    ///
    /// # Errors
    /// Returns error if an edit is out of bounds, inverted, splits a
    /// character, or overlaps another edit
    pub fn validate(&self) -> Result<(), RewriteError> {
        self.application_order().map(|_| ())
    }

    /// Apply all edits and return the modified source.
    ///
    /// Replacement texts are spliced in verbatim.
    ///
    /// # Errors
    /// Returns error if edits overlap or are out of bounds
    pub fn apply(self) -> Result<String, RewriteError> {
        self.splice(None)
    }

    /// Apply all edits, rewriting dynamic references inside each replacement.
    ///
    /// Every `import("mod").Name` (per `pattern`) introduced by an edit is
    /// replaced by `Name` and recorded in `demand`. The replacement texts are
    /// rewritten with [`ByteRangeRewriter::apply`], so rewriting never nests.
    ///
    /// # Errors
    /// Returns error if edits are invalid or a reference is malformed
    pub fn apply_rewriting(
        self,
        pattern: &DynamicRefPattern,
        demand: &mut ImportDemand,
    ) -> Result<String, RewriteError> {
        self.splice(Some((pattern, demand)))
    }

    fn splice(
        self,
        mut rewrite: Option<(&DynamicRefPattern, &mut ImportDemand)>,
    ) -> Result<String, RewriteError> {
        let order = self.application_order()?;
        let mut result = self.source;
        let mut edits: Vec<Option<Edit>> = self.edits.into_iter().map(Some).collect();

        // Right to left: everything already applied lies after the current edit
        for index in order.into_iter().rev() {
            let Some(edit) = edits[index].take() else {
                continue;
            };
            let replacement = match rewrite.as_mut() {
                Some((pattern, demand)) => {
                    let old_text = &result[edit.start_byte..edit.end_byte];
                    rewrite_dynamic_references(old_text, &edit.replacement, pattern, demand)?
                }
                None => edit.replacement,
            };
            result.replace_range(edit.start_byte..edit.end_byte, &replacement);
        }

        Ok(result)
    }

    /// Validates every edit and returns their indices sorted by
    /// `(start, end)`, stable on input order.
    ///
    /// Applying this order in reverse puts the wider of two edits sharing a
    /// start before the insertion at that start, and keeps insertions at the
    /// same offset in input order in the output.
    fn application_order(&self) -> Result<Vec<usize>, RewriteError> {
        let source_len = self.source.len();
        for (i, edit) in self.edits.iter().enumerate() {
            if edit.start_byte > edit.end_byte {
                return Err(RewriteError::InvertedRange {
                    edit_index: i,
                    start_byte: edit.start_byte,
                    end_byte: edit.end_byte,
                });
            }
            if edit.end_byte > source_len {
                return Err(RewriteError::OutOfBounds {
                    edit_index: i,
                    end_byte: edit.end_byte,
                    source_len,
                });
            }
            for offset in [edit.start_byte, edit.end_byte] {
                if !self.source.is_char_boundary(offset) {
                    return Err(RewriteError::InvalidOffset {
                        edit_index: i,
                        offset,
                    });
                }
            }
        }

        let mut order: Vec<usize> = (0..self.edits.len()).collect();
        order.sort_by_key(|&i| (self.edits[i].start_byte, self.edits[i].end_byte));

        // The edit reaching furthest right is the only one a later edit can overlap
        let mut furthest: Option<usize> = None;
        for &i in &order {
            if let Some(prev) = furthest {
                if self.edits[prev].overlaps(&self.edits[i]) {
                    return Err(RewriteError::OverlappingEdits {
                        edit_a: prev.min(i),
                        edit_b: prev.max(i),
                    });
                }
                if self.edits[i].end_byte > self.edits[prev].end_byte {
                    furthest = Some(i);
                }
            } else {
                furthest = Some(i);
            }
        }

        Ok(order)
    }
}
