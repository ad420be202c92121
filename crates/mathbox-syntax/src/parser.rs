use crate::ast::{GridKind, Node, PlaceholderKind};
use crate::commands::{self, CommandKind};
use crate::{Mode, TextRange, TextSize, Token, TokenKind, lexer};

/// Deepest nesting of groups, arguments and grids the parser builds.
/// Braces past it are dropped and their contents parsed in place.
pub const MAX_NESTING: usize = 64;

/// Most scripts stacked on one base, as in `x^1^2^3`.
pub const MAX_STACKED_SCRIPTS: usize = 8;

/// A recovery the parser performed. Never fatal; the tree is always built.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SyntaxError {
    pub message: String,
    pub range: TextRange,
}

pub struct ParseResult {
    /// Always a [`Node::Group`].
    pub root: Node,
    pub errors: Vec<SyntaxError>,
    /// The ordinal the next placeholder would receive; feed it to
    /// [`parse_with`] when numbering continues into another segment.
    pub next_ordinal: usize,
}

/// Recursive-descent parser over a token slice.
///
/// `end` bounds the tokens the parser may see, so grid cells are parsed in
/// place by narrowing it to the cell.
pub struct Parser<'a> {
    tokens: Vec<Token<'a>>,
    position: usize,
    end: usize,
    source_len: TextSize,
    next_ordinal: usize,
    grid_depth: usize,
    depth: usize,
    /// `{` dropped at the nesting limit whose `}` is still ahead.
    flattened: usize,
    errors: Vec<SyntaxError>,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str, mode: Mode) -> Self {
        let tokens = lexer::tokenize(input, mode);
        let end = tokens.len();
        Self {
            tokens,
            position: 0,
            end,
            source_len: TextSize::of(input),
            next_ordinal: 0,
            grid_depth: 0,
            depth: 0,
            flattened: 0,
            errors: Vec::new(),
        }
    }

    /// Starts placeholder numbering at `base` instead of zero.
    pub fn with_ordinal_base(mut self, base: usize) -> Self {
        self.next_ordinal = base;
        self
    }

    pub fn parse(mut self) -> ParseResult {
        let children = self.parse_sequence(false);
        ParseResult {
            root: Node::Group(children),
            errors: self.errors,
            next_ordinal: self.next_ordinal,
        }
    }

    fn peek(&self) -> Option<TokenKind> {
        self.current().map(|t| t.kind)
    }

    fn current(&self) -> Option<&Token<'a>> {
        if self.position < self.end {
            self.tokens.get(self.position)
        } else {
            None
        }
    }

    fn bump(&mut self) -> Option<Token<'a>> {
        let token = self.current().copied();
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    fn error(&mut self, message: String) {
        let range = match self.current() {
            Some(token) => token.range(),
            None => match self.tokens.get(self.end) {
                Some(token) => TextRange::empty(token.offset),
                None => TextRange::empty(self.source_len),
            },
        };
        self.errors.push(SyntaxError { message, range });
    }

    fn error_at(&mut self, message: String, range: TextRange) {
        self.errors.push(SyntaxError { message, range });
    }

    fn take_ordinal(&mut self) -> usize {
        let ordinal = self.next_ordinal;
        self.next_ordinal += 1;
        ordinal
    }

    /// Enters one nesting level, or records an error at the limit.
    fn enter(&mut self) -> bool {
        if self.depth >= MAX_NESTING {
            self.error("Nesting too deep".into());
            return false;
        }
        self.depth += 1;
        true
    }

    /// Parses nodes until the end of the visible tokens, or until a `}` when
    /// `in_group` is set. The `}` itself is left for the caller.
    fn parse_sequence(&mut self, in_group: bool) -> Vec<Node> {
        let mut nodes = Vec::new();
        loop {
            match self.peek() {
                None => break,
                Some(TokenKind::GroupClose) => {
                    if self.flattened > 0 {
                        self.flattened -= 1;
                        self.bump();
                        continue;
                    }
                    if in_group {
                        break;
                    }
                    self.error("Unmatched '}'".into());
                    self.bump();
                }
                Some(TokenKind::ScriptUp) | Some(TokenKind::ScriptDown) => {
                    let base = match nodes.pop() {
                        Some(node) if stacked_scripts(&node) >= MAX_STACKED_SCRIPTS => {
                            self.error("Too many stacked scripts".into());
                            nodes.push(node);
                            Node::empty_group()
                        }
                        Some(node) => node,
                        None => Node::empty_group(),
                    };
                    let script = self.parse_script(base);
                    nodes.push(script);
                }
                Some(_) => {
                    if let Some(node) = self.parse_atom() {
                        nodes.push(node);
                    }
                }
            }
        }
        nodes
    }

    /// Parses one atom. Returns `None` for tokens that produce nothing.
    fn parse_atom(&mut self) -> Option<Node> {
        match self.peek()? {
            TokenKind::GroupOpen => self.parse_group(),
            TokenKind::Command => Some(self.parse_command()),
            TokenKind::Literal => self.bump().map(|t| Node::Char(t.literal_char())),
            TokenKind::ColSep => {
                self.error("'&' outside of a grid".into());
                self.bump();
                Some(Node::Char('&'))
            }
            TokenKind::RowSep => {
                self.error("'\\\\' outside of a grid".into());
                self.bump();
                None
            }
            TokenKind::GroupClose | TokenKind::ScriptUp | TokenKind::ScriptDown => None,
        }
    }

    /// Returns `None` past the nesting limit, where the braces are dropped
    /// and the contents join the enclosing sequence.
    fn parse_group(&mut self) -> Option<Node> {
        if !self.enter() {
            self.bump();
            self.flattened += 1;
            return None;
        }
        self.bump(); // Consume '{'
        let flattened = std::mem::take(&mut self.flattened);
        let children = self.parse_sequence(true);
        if self.peek() == Some(TokenKind::GroupClose) {
            self.bump(); // Consume '}'
        } else {
            self.error("Expected '}'".into());
        }
        self.flattened = flattened;
        self.depth -= 1;
        Some(Node::Group(children))
    }

    /// Parses a command or script argument: a braced group, or else the next
    /// single atom. A missing argument is an empty list.
    fn parse_argument(&mut self) -> Vec<Node> {
        match self.peek() {
            Some(TokenKind::GroupOpen) => match self.parse_group() {
                Some(Node::Group(children)) => children,
                Some(other) => vec![other],
                None => Vec::new(),
            },
            Some(TokenKind::Command) | Some(TokenKind::Literal) => {
                if !self.enter() {
                    return Vec::new();
                }
                let atom = self.parse_atom();
                self.depth -= 1;
                atom.into_iter().collect()
            }
            _ => {
                self.error("Missing argument".into());
                Vec::new()
            }
        }
    }

    fn parse_script(&mut self, base: Node) -> Node {
        let up = self.bump().map(|t| t.kind) == Some(TokenKind::ScriptUp);
        let arg = Box::new(Node::Group(self.parse_argument()));

        match base {
            Node::Script {
                base: inner,
                sup: None,
                sub,
            } if up => Node::Script {
                base: inner,
                sup: Some(arg),
                sub,
            },
            Node::Script {
                base: inner,
                sup,
                sub: None,
            } if !up => Node::Script {
                base: inner,
                sup,
                sub: Some(arg),
            },
            base => {
                let (sup, sub) = if up { (Some(arg), None) } else { (None, Some(arg)) };
                Node::Script {
                    base: Box::new(base),
                    sup,
                    sub,
                }
            }
        }
    }

    fn parse_command(&mut self) -> Node {
        let Some(token) = self.bump() else {
            return Node::empty_group();
        };
        let name = token.command_name();

        let Some(spec) = commands::lookup(name) else {
            self.error_at(format!("Unknown command \\{name}"), token.range());
            return Node::Command {
                name: name.to_string(),
                args: Vec::new(),
            };
        };

        match spec.kind {
            CommandKind::Fraction => {
                let numerator = self.parse_argument();
                let denominator = self.parse_argument();
                Node::Fraction {
                    numerator,
                    denominator,
                }
            }
            CommandKind::Blank => Node::Placeholder {
                kind: PlaceholderKind::Box,
                ordinal: self.take_ordinal(),
            },
            CommandKind::BlankCell if self.grid_depth > 0 => Node::Placeholder {
                kind: PlaceholderKind::Gap,
                ordinal: self.take_ordinal(),
            },
            CommandKind::Grid { kind, bracketed } => {
                if !self.enter() {
                    return Node::empty_group();
                }
                let grid = self.parse_grid(kind, bracketed);
                self.depth -= 1;
                grid
            }
            _ => {
                if spec.kind == CommandKind::BlankCell {
                    self.error_at("\\gap outside of a grid".into(), token.range());
                }
                let args = (0..spec.arity())
                    .map(|_| Node::Group(self.parse_argument()))
                    .collect();
                Node::Command {
                    name: name.to_string(),
                    args,
                }
            }
        }
    }

    /// Splits the grid argument on top-level `\\` and `&`, then parses each
    /// cell in place. Rows are padded to the widest row.
    fn parse_grid(&mut self, kind: GridKind, bracketed: bool) -> Node {
        if self.peek() != Some(TokenKind::GroupOpen) {
            self.grid_depth += 1;
            let mut cell = self.parse_argument();
            self.grid_depth -= 1;
            if cell.is_empty() {
                cell = self.empty_cell(kind);
            }
            return Node::Grid {
                kind,
                rows: vec![vec![cell]],
                bracketed,
            };
        }

        self.bump(); // Consume '{'
        let (ranges, close) = self.split_cells();

        let columns = ranges.iter().map(Vec::len).max().unwrap_or(1);
        let saved_end = self.end;
        let mut rows = Vec::with_capacity(ranges.len());
        self.grid_depth += 1;
        for row_ranges in &ranges {
            let mut row = Vec::with_capacity(columns);
            for &(start, end) in row_ranges {
                self.position = start;
                self.end = end;
                let flattened = std::mem::take(&mut self.flattened);
                let mut cell = self.parse_sequence(false);
                self.flattened = flattened;
                if cell.is_empty() {
                    cell = self.empty_cell(kind);
                }
                row.push(cell);
            }
            self.end = saved_end;
            if row.len() < columns {
                self.error(format!(
                    "Row {} has {} of {} cells",
                    rows.len() + 1,
                    row.len(),
                    columns
                ));
                while row.len() < columns {
                    let cell = self.empty_cell(kind);
                    row.push(cell);
                }
            }
            rows.push(row);
        }
        self.grid_depth -= 1;
        self.end = saved_end;

        match close {
            Some(index) => self.position = index + 1,
            None => {
                self.position = self.end;
                self.error("Expected '}'".into());
            }
        }

        Node::Grid {
            kind,
            rows,
            bracketed,
        }
    }

    /// Finds the cell token ranges of a grid argument, starting just past its
    /// `{`. Returns the ranges by row and the index of the closing `}`.
    fn split_cells(&self) -> (Vec<Vec<(usize, usize)>>, Option<usize>) {
        let mut rows = Vec::new();
        let mut row = Vec::new();
        let mut cell_start = self.position;
        let mut depth = 0usize;
        let mut close = None;

        for index in self.position..self.end {
            match self.tokens[index].kind {
                TokenKind::GroupOpen => depth += 1,
                TokenKind::GroupClose if depth == 0 => {
                    close = Some(index);
                    break;
                }
                TokenKind::GroupClose => depth -= 1,
                TokenKind::ColSep if depth == 0 => {
                    row.push((cell_start, index));
                    cell_start = index + 1;
                }
                TokenKind::RowSep if depth == 0 => {
                    row.push((cell_start, index));
                    rows.push(std::mem::take(&mut row));
                    cell_start = index + 1;
                }
                _ => {}
            }
        }

        let last_end = close.unwrap_or(self.end);
        // A trailing `\\` does not open a new row.
        let trailing_break = cell_start == last_end && row.is_empty() && !rows.is_empty();
        if !trailing_break {
            row.push((cell_start, last_end));
            rows.push(row);
        }
        (rows, close)
    }

    fn empty_cell(&mut self, kind: GridKind) -> Vec<Node> {
        match kind {
            GridKind::Matrix => vec![Node::Placeholder {
                kind: PlaceholderKind::Gap,
                ordinal: self.take_ordinal(),
            }],
            GridKind::Table => vec![Node::Char(' ')],
        }
    }
}

/// Number of scripts stacked on the innermost base of `node`.
fn stacked_scripts(mut node: &Node) -> usize {
    let mut count = 0;
    while let Node::Script { base, .. } = node {
        count += 1;
        node = &**base;
    }
    count
}

/// Parses math-mode markup with placeholder numbering starting at zero.
pub fn parse(input: &str) -> ParseResult {
    Parser::new(input, Mode::Math).parse()
}

pub fn parse_with(input: &str, mode: Mode, ordinal_base: usize) -> ParseResult {
    Parser::new(input, mode)
        .with_ordinal_base(ordinal_base)
        .parse()
}
