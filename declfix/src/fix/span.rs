//! Wire-level text changes and the offset encodings they arrive in.
//!
//! The analysis engine reports spans as JavaScript string indices (UTF-16
//! code units). Everything downstream of this module works on UTF-8 byte
//! offsets, so each `TextChange` is converted to an [`Edit`] exactly once,
//! against the original file text.

use super::rewriter::{Edit, RewriteError};
use serde::{Deserialize, Serialize};

/// A half-open range `[start, start + length)` within a text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextSpan {
    /// Offset of the first replaced unit.
    pub start: usize,
    /// Number of replaced units.
    pub length: usize,
}

impl TextSpan {
    /// Create a new span.
    #[must_use]
    pub const fn new(start: usize, length: usize) -> Self {
        Self { start, length }
    }

    /// Exclusive end offset.
    #[must_use]
    pub const fn end(&self) -> usize {
        self.start.saturating_add(self.length)
    }
}

/// Replacement of `span` with `new_text`, as emitted by the analysis engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextChange {
    /// Region of the original text being replaced.
    pub span: TextSpan,
    /// Text spliced in place of `span`.
    pub new_text: String,
}

impl TextChange {
    /// Create a change replacing `length` units at `start`.
    #[must_use]
    pub fn new(start: usize, length: usize, new_text: impl Into<String>) -> Self {
        Self {
            span: TextSpan::new(start, length),
            new_text: new_text.into(),
        }
    }

    /// Convert this change into a byte-range [`Edit`] over `text`.
    ///
    /// `index` is the position of the change in its list and is only used
    /// for error reporting.
    ///
    /// # Errors
    ///
    /// Returns [`RewriteError::InvalidOffset`] if either end of the span falls
    /// outside `text` or splits a character.
    pub fn to_edit(
        &self,
        text: &str,
        encoding: SpanEncoding,
        index: usize,
    ) -> Result<Edit, RewriteError> {
        let convert = |offset: usize| {
            encoding
                .to_byte_offset(text, offset)
                .ok_or(RewriteError::InvalidOffset {
                    edit_index: index,
                    offset,
                })
        };
        let start_byte = convert(self.span.start)?;
        let end_byte = convert(self.span.end())?;
        Ok(Edit::new(start_byte, end_byte, self.new_text.clone()))
    }
}

/// Unit in which span offsets are measured.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum SpanEncoding {
    /// UTF-8 bytes.
    Utf8,
    /// UTF-16 code units (JavaScript string indices).
    #[default]
    Utf16,
}

impl SpanEncoding {
    /// Translate `offset` in this encoding into a UTF-8 byte offset of `text`.
    ///
    /// Returns `None` when the offset is past the end of the text or does not
    /// sit on a character boundary.
    #[must_use]
    pub fn to_byte_offset(self, text: &str, offset: usize) -> Option<usize> {
        match self {
            Self::Utf8 => text.is_char_boundary(offset).then_some(offset),
            Self::Utf16 => {
                let mut units = 0;
                for (byte, ch) in text.char_indices() {
                    if units == offset {
                        return Some(byte);
                    }
                    units += ch.len_utf16();
                    if units > offset {
                        return None;
                    }
                }
                (units == offset).then_some(text.len())
            }
        }
    }
}
