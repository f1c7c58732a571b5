//! Consolidation of required imports into the edited file.
//!
//! After a file's changes are applied, every module in the [`ImportDemand`]
//! gets one `import {A, B} from 'module';` line. The block goes right after
//! the last top-level import declaration. Locating that declaration only
//! needs a shallow scan: comments, string and template literals, and
//! bracketed regions are skipped, and only statements at depth zero that
//! start with the `import` keyword are considered.

use super::demand::ImportDemand;
use crate::constants::jsx_runtime_import_re;

/// Errors raised while inserting imports.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImportError {
    /// Imports are required but the file has nowhere to put them.
    #[error("no top-level import declarations found; cannot place {module_count} new import(s)")]
    NoImportDeclarations {
        /// Number of modules that needed an import.
        module_count: usize,
    },
    /// The configured JSX runtime module produced an invalid pattern.
    #[error("invalid JSX runtime module pattern: {0}")]
    InvalidJsxModule(String),
}

/// Byte range of a top-level import declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportDeclaration {
    /// Offset of the `import` keyword.
    pub start: usize,
    /// Offset just past the declaration, including its `;` if present.
    pub end: usize,
}

/// Insert one import line per demanded module after the last import.
///
/// Before inserting, a lone `import { JSX } from '<jsx_module>'` line is
/// removed, since rewritten annotations may have made it redundant. When the
/// demand is empty the text is returned unchanged.
///
/// # Errors
///
/// Returns [`ImportError::NoImportDeclarations`] if imports are required but
/// the file has none.
pub fn consolidate_imports(
    text: &str,
    demand: &ImportDemand,
    jsx_module: &str,
) -> Result<String, ImportError> {
    if demand.is_empty() {
        return Ok(text.to_owned());
    }

    let mut text = remove_jsx_runtime_import(text, jsx_module)?;
    let position = find_import_insertion_point(&text).ok_or(ImportError::NoImportDeclarations {
        module_count: demand.module_count(),
    })?;

    let block = render_import_block(demand);
    tracing::debug!(position, modules = demand.module_count(), "inserting imports");
    text.insert_str(position, &block);
    Ok(text)
}

/// Render the import block, starting with a newline.
///
/// ```
/// use declfix::fix::{render_import_block, ImportDemand};
///
/// let mut demand = ImportDemand::new();
/// demand.record("m1", "X");
/// demand.record("m2", "Y");
/// demand.record("m2", "Z");
/// assert_eq!(
///     render_import_block(&demand),
///     "\nimport {X} from 'm1';\nimport {Y, Z} from 'm2';"
/// );
/// ```
#[must_use]
pub fn render_import_block(demand: &ImportDemand) -> String {
    let mut block = String::new();
    for module in demand.iter() {
        block.push('\n');
        block.push_str(&format!(
            "import {{{}}} from '{}';",
            module.identifiers.join(", "),
            module.module
        ));
    }
    block
}

/// Remove lines that import only `JSX` from `jsx_module`.
///
/// # Errors
///
/// Returns [`ImportError::InvalidJsxModule`] if the module name cannot be
/// turned into a pattern.
pub fn remove_jsx_runtime_import(text: &str, jsx_module: &str) -> Result<String, ImportError> {
    let re =
        jsx_runtime_import_re(jsx_module).map_err(|e| ImportError::InvalidJsxModule(e.to_string()))?;
    Ok(re.replace_all(text, "").into_owned())
}

/// Offset just past the last top-level import declaration, if any.
#[must_use]
pub fn find_import_insertion_point(text: &str) -> Option<usize> {
    import_declarations(text).last().map(|decl| decl.end)
}

/// All top-level import declarations in source order.
///
/// Dynamic `import(...)`, `import.meta` and `import x = require(...)` are
/// not declarations and are skipped.
#[must_use]
pub fn import_declarations(text: &str) -> Vec<ImportDeclaration> {
    let mut scanner = Scanner::new(text);
    let mut found = Vec::new();
    let mut depth = 0usize;

    while let Some(token) = scanner.next_token() {
        match token {
            Token::Open(_) => depth += 1,
            Token::Close => depth = depth.saturating_sub(1),
            Token::Word(start, end)
                if depth == 0
                    && &text[start..end] == "import"
                    && !scanner.preceded_by_dot(start) =>
            {
                if let Some(end) = scanner.finish_import() {
                    found.push(ImportDeclaration { start, end });
                }
            }
            _ => {}
        }
    }

    found
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Word(usize, usize),
    Str(usize),
    Open(u8),
    Close,
    Semi,
    Punct(u8),
}

/// UTF-8 encoding of U+FEFF.
const BYTE_ORDER_MARK: &[u8] = b"\xEF\xBB\xBF";

struct Scanner<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            bytes: text.as_bytes(),
            pos: 0,
        }
    }

    fn peek(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn skip_trivia(&mut self) {
        if self.pos == 0 && self.bytes.starts_with(BYTE_ORDER_MARK) {
            self.pos = BYTE_ORDER_MARK.len();
        }
        while let Some(b) = self.peek(0) {
            match b {
                b' ' | b'\t' | b'\r' | b'\n' => self.pos += 1,
                b'/' if self.peek(1) == Some(b'/') => {
                    while self.peek(0).is_some_and(|b| b != b'\n') {
                        self.pos += 1;
                    }
                }
                b'/' if self.peek(1) == Some(b'*') => {
                    self.pos += 2;
                    while self.pos < self.bytes.len()
                        && !(self.peek(0) == Some(b'*') && self.peek(1) == Some(b'/'))
                    {
                        self.pos += 1;
                    }
                    self.pos = (self.pos + 2).min(self.bytes.len());
                }
                _ => break,
            }
        }
    }

    fn skip_quoted(&mut self, quote: u8) {
        self.pos += 1;
        while let Some(b) = self.peek(0) {
            self.pos += 1;
            if b == b'\\' {
                self.pos += 1;
            } else if b == quote || (b == b'\n' && quote != b'`') {
                break;
            }
        }
        self.pos = self.pos.min(self.bytes.len());
    }

    fn next_token(&mut self) -> Option<Token> {
        self.skip_trivia();
        let start = self.pos;
        let b = self.peek(0)?;
        let token = match b {
            b'\'' | b'"' | b'`' => {
                self.skip_quoted(b);
                Token::Str(self.pos)
            }
            b'{' | b'(' | b'[' => {
                self.pos += 1;
                Token::Open(b)
            }
            b'}' | b')' | b']' => {
                self.pos += 1;
                Token::Close
            }
            b';' => {
                self.pos += 1;
                Token::Semi
            }
            _ if is_word_byte(b) => {
                while self.peek(0).is_some_and(is_word_byte) {
                    self.pos += 1;
                }
                Token::Word(start, self.pos)
            }
            _ => {
                self.pos += 1;
                Token::Punct(b)
            }
        };
        Some(token)
    }

    fn preceded_by_dot(&self, start: usize) -> bool {
        self.bytes[..start]
            .iter()
            .rev()
            .find(|b| !b.is_ascii_whitespace())
            .is_some_and(|&b| b == b'.')
    }

    /// Consume the rest of an import declaration whose keyword was just read.
    ///
    /// Returns the declaration end, or `None` (leaving the scanner past the
    /// construct) when the keyword does not start a declaration.
    fn finish_import(&mut self) -> Option<usize> {
        let mut depth = 0usize;
        let mut first = true;
        loop {
            let token = self.next_token()?;
            if first {
                first = false;
                // import(...) or import.meta
                if matches!(token, Token::Open(b'(')) {
                    self.skip_balanced(1);
                    return None;
                }
                if matches!(token, Token::Punct(b'.')) {
                    return None;
                }
            }
            match token {
                Token::Open(_) => depth += 1,
                Token::Close => depth = depth.saturating_sub(1),
                Token::Str(end) if depth == 0 => return Some(self.finish_attributes(end)),
                Token::Punct(b'=') if depth == 0 => {
                    self.skip_statement();
                    return None;
                }
                Token::Semi if depth == 0 => return None,
                _ => {}
            }
        }
    }

    /// Consume optional `with { ... }` / `assert { ... }` and a trailing `;`.
    fn finish_attributes(&mut self, mut end: usize) -> usize {
        let checkpoint = self.pos;
        if let Some(Token::Word(s, e)) = self.next_token() {
            let word = &self.bytes[s..e];
            if (word == b"with" || word == b"assert")
                && matches!(self.next_token(), Some(Token::Open(b'{')))
            {
                self.skip_balanced(1);
                end = self.pos;
            } else {
                self.pos = checkpoint;
            }
        } else {
            self.pos = checkpoint;
        }

        let checkpoint = self.pos;
        if self.next_token() == Some(Token::Semi) {
            end = self.pos;
        } else {
            self.pos = checkpoint;
        }
        end
    }

    fn skip_balanced(&mut self, mut depth: usize) {
        while depth > 0 {
            match self.next_token() {
                Some(Token::Open(_)) => depth += 1,
                Some(Token::Close) => depth -= 1,
                Some(_) => {}
                None => return,
            }
        }
    }

    fn skip_statement(&mut self) {
        let mut depth = 0usize;
        while let Some(token) = self.next_token() {
            match token {
                Token::Open(_) => depth += 1,
                Token::Close => depth = depth.saturating_sub(1),
                Token::Semi if depth == 0 => return,
                _ => {}
            }
        }
    }
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$' || b >= 0x80
}
