//! Tokenizer, recovering parser and AST for mathbox notation markup.
//!
//! The markup is a small TeX-like language: backslash commands with up to two
//! brace arguments, `^`/`_` scripts, `{}` groups, and grid commands whose
//! argument is split on `&` and `\\`. Input is typed live, so neither the
//! [`lexer`] nor the [`parser`] ever fails: malformed input is closed off
//! implicitly and every recovery is reported as a [`SyntaxError`] next to the
//! tree rather than instead of it.
//!
//! ```
//! use mathbox_syntax::{parse, Node};
//!
//! let result = parse(r"\frac{1}{2");
//! assert!(matches!(result.root.children()[0], Node::Fraction { .. }));
//! assert_eq!(result.errors.len(), 1);
//! ```

pub mod ast;
pub mod commands;
pub mod lexer;
pub mod parser;

pub use ast::{GridKind, Node, PlaceholderKind};
pub use parser::{MAX_NESTING, MAX_STACKED_SCRIPTS, ParseResult, SyntaxError, parse, parse_with};
pub use rowan::{TextRange, TextSize};

/// Tokenizer mode. Script markers are only meaningful in math mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    #[default]
    Math,
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TokenKind {
    Command,    // \frac, \alpha, \,
    GroupOpen,  // {
    GroupClose, // }
    ScriptUp,   // ^
    ScriptDown, // _
    ColSep,     // &
    RowSep,     // \\
    Literal,    // any other character, or an escaped one (\{)
}

/// A token with its source text and byte offset in the scanned segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub value: &'a str,
    pub offset: TextSize,
}

impl<'a> Token<'a> {
    pub fn range(&self) -> TextRange {
        TextRange::at(self.offset, TextSize::of(self.value))
    }

    /// Command name without the leading backslash.
    pub fn command_name(&self) -> &'a str {
        self.value.strip_prefix('\\').unwrap_or(self.value)
    }

    /// The character a literal token stands for. Escapes such as `\{` yield
    /// the escaped character; a lone trailing `\` yields itself.
    pub fn literal_char(&self) -> char {
        let mut chars = self.value.chars();
        match (chars.next(), chars.next()) {
            (Some('\\'), Some(escaped)) => escaped,
            (Some(c), _) => c,
            (None, _) => ' ',
        }
    }
}
