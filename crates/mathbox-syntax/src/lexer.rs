use crate::{Mode, Token, TokenKind, TextSize, commands};

/// A tokenizer for one single-mode segment of markup.
///
/// ## Overview
///
/// The lexer performs **character-level scanning** and yields [`Token`]s that
/// borrow from the input. It recognizes:
///
/// - **Commands**: `\frac`, `\alpha`, and the spacing escapes `\,` `\;` `\ `
/// - **Groups**: `{` and `}`
/// - **Scripts**: `^` and `_` (math mode only; literals in text mode)
/// - **Grid separators**: `&` and `\\`
/// - **Literals**: every other character, one token each, plus escaped
///   specials such as `\{` or `\$`
///
/// Whitespace separates tokens and is otherwise dropped.
///
/// ## Command resolution
///
/// A letter run after `\` resolves to the **longest** table entry that
/// prefixes it; the letters after that entry are scanned again as literals,
/// so `\pix` is `\pi` followed by `x`. A run with no matching entry becomes a
/// command token carrying the unknown name, which later renders literally.
///
/// ## Failure policy
///
/// There is none. A lone `\` at end of input is a literal backslash, and
/// unbalanced braces are the parser's concern.
///
/// ```
/// use mathbox_syntax::lexer::Lexer;
/// use mathbox_syntax::{Mode, TokenKind};
///
/// let tokens: Vec<_> = Lexer::new(r"x^{2}", Mode::Math).collect();
/// assert_eq!(tokens[1].kind, TokenKind::ScriptUp);
/// assert_eq!(tokens[3].value, "2");
/// ```
pub struct Lexer<'a> {
    input: &'a str,
    position: usize,
    mode: Mode,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str, mode: Mode) -> Self {
        Self {
            input,
            position: 0,
            mode,
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.position..].chars().next()
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek_char() {
            if c.is_whitespace() {
                self.position += c.len_utf8();
            } else {
                break;
            }
        }
    }

    /// Returns the next token, or `None` at end of input.
    pub fn next_token(&mut self) -> Option<Token<'a>> {
        self.skip_whitespace();
        let start = self.position;
        let c = self.peek_char()?;
        self.position += c.len_utf8();

        let kind = match c {
            '\\' => self.lex_escape(),
            '{' => TokenKind::GroupOpen,
            '}' => TokenKind::GroupClose,
            '^' if self.mode == Mode::Math => TokenKind::ScriptUp,
            '_' if self.mode == Mode::Math => TokenKind::ScriptDown,
            '&' => TokenKind::ColSep,
            _ => TokenKind::Literal,
        };

        Some(Token {
            kind,
            value: &self.input[start..self.position],
            offset: TextSize::from(start as u32),
        })
    }

    /// Scans what follows a backslash. `self.position` is just past the `\`.
    fn lex_escape(&mut self) -> TokenKind {
        let Some(next) = self.peek_char() else {
            return TokenKind::Literal;
        };

        if next.is_ascii_alphabetic() {
            let run_start = self.position;
            let mut run_end = run_start;
            for n in self.input[run_start..].chars() {
                if n.is_ascii_alphabetic() {
                    run_end += n.len_utf8();
                } else {
                    break;
                }
            }
            let run = &self.input[run_start..run_end];
            self.position = match commands::longest_prefix(run) {
                Some(len) => run_start + len,
                None => run_end,
            };
            return TokenKind::Command;
        }

        self.position += next.len_utf8();
        match next {
            '\\' => TokenKind::RowSep,
            '{' | '}' | '$' | '&' | '%' | '#' | '_' | '^' => TokenKind::Literal,
            _ => TokenKind::Command,
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token()
    }
}

/// Tokenizes a whole segment.
pub fn tokenize(input: &str, mode: Mode) -> Vec<Token<'_>> {
    Lexer::new(input, mode).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<(TokenKind, &str)> {
        tokenize(input, Mode::Math)
            .into_iter()
            .map(|t| (t.kind, t.value))
            .collect()
    }

    #[test]
    fn test_basic_tokens() {
        assert_eq!(
            kinds(r"\frac{a}{b}"),
            vec![
                (TokenKind::Command, "\\frac"),
                (TokenKind::GroupOpen, "{"),
                (TokenKind::Literal, "a"),
                (TokenKind::GroupClose, "}"),
                (TokenKind::GroupOpen, "{"),
                (TokenKind::Literal, "b"),
                (TokenKind::GroupClose, "}"),
            ]
        );
    }

    #[test]
    fn test_whitespace_is_dropped_but_offsets_kept() {
        let tokens = tokenize("a  +\tb", Mode::Math);
        let offsets: Vec<u32> = tokens.iter().map(|t| u32::from(t.offset)).collect();
        assert_eq!(offsets, vec![0, 3, 5]);
    }

    #[test]
    fn test_scripts_only_in_math_mode() {
        assert_eq!(
            kinds("x^2_i"),
            vec![
                (TokenKind::Literal, "x"),
                (TokenKind::ScriptUp, "^"),
                (TokenKind::Literal, "2"),
                (TokenKind::ScriptDown, "_"),
                (TokenKind::Literal, "i"),
            ]
        );
        let text: Vec<_> = tokenize("x^2", Mode::Text)
            .into_iter()
            .map(|t| t.kind)
            .collect();
        assert_eq!(
            text,
            vec![TokenKind::Literal, TokenKind::Literal, TokenKind::Literal]
        );
    }

    #[test]
    fn test_grid_separators() {
        assert_eq!(
            kinds(r"1 & 2 \\ 3"),
            vec![
                (TokenKind::Literal, "1"),
                (TokenKind::ColSep, "&"),
                (TokenKind::Literal, "2"),
                (TokenKind::RowSep, "\\\\"),
                (TokenKind::Literal, "3"),
            ]
        );
    }

    #[test]
    fn test_longest_match_splits_trailing_letters() {
        assert_eq!(
            kinds(r"\pix"),
            vec![(TokenKind::Command, "\\pi"), (TokenKind::Literal, "x")]
        );
        assert_eq!(kinds(r"\infty"), vec![(TokenKind::Command, "\\infty")]);
    }

    #[test]
    fn test_unknown_command_keeps_whole_name() {
        assert_eq!(kinds(r"\fra"), vec![(TokenKind::Command, "\\fra")]);
        assert_eq!(kinds(r"\1"), vec![(TokenKind::Command, "\\1")]);
    }

    #[test]
    fn test_escaped_specials_are_literals() {
        let tokens = tokenize(r"\{\$\&", Mode::Math);
        assert!(tokens.iter().all(|t| t.kind == TokenKind::Literal));
        let chars: String = tokens.iter().map(Token::literal_char).collect();
        assert_eq!(chars, "{$&");
    }

    #[test]
    fn test_spacing_commands() {
        let tokens = tokenize(r"a\,b\ c", Mode::Math);
        assert_eq!(tokens[1].kind, TokenKind::Command);
        assert_eq!(tokens[1].command_name(), ",");
        assert_eq!(tokens[3].command_name(), " ");
    }

    #[test]
    fn test_trailing_backslash_is_literal() {
        let tokens = tokenize("x\\", Mode::Math);
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[1].kind, TokenKind::Literal);
        assert_eq!(tokens[1].literal_char(), '\\');
    }

    #[test]
    fn test_empty_and_blank_input() {
        assert!(tokenize("", Mode::Math).is_empty());
        assert!(tokenize("  \n\t ", Mode::Math).is_empty());
    }

    #[test]
    fn test_multi_byte_literals() {
        let tokens = tokenize("é≤", Mode::Math);
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].literal_char(), 'é');
        assert_eq!(u32::from(tokens[1].offset), 2);
    }
}
