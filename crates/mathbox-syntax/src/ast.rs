use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GridKind {
    Matrix,
    Table,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaceholderKind {
    /// Inline blank written as `\box`.
    Box,
    /// Blank grid cell, written as `\gap` or left empty.
    Gap,
}

/// A node of the notation tree. The root of every parse is a [`Node::Group`].
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Char(char),
    /// A command that is not structural. `args` are `Group`s; unknown
    /// commands have none.
    Command {
        name: String,
        args: Vec<Node>,
    },
    Group(Vec<Node>),
    Fraction {
        numerator: Vec<Node>,
        denominator: Vec<Node>,
    },
    Script {
        base: Box<Node>,
        sup: Option<Box<Node>>,
        sub: Option<Box<Node>>,
    },
    Grid {
        kind: GridKind,
        /// Rows of cells of nodes. Always rectangular.
        rows: Vec<Vec<Vec<Node>>>,
        bracketed: bool,
    },
    Placeholder {
        kind: PlaceholderKind,
        ordinal: usize,
    },
}

impl Node {
    pub fn empty_group() -> Self {
        Node::Group(Vec::new())
    }

    /// Children of a group; empty for every other node.
    pub fn children(&self) -> &[Node] {
        match self {
            Node::Group(children) => children,
            _ => &[],
        }
    }

    /// Placeholder ordinals in the order they appear.
    pub fn placeholders(&self) -> Vec<usize> {
        let mut out = Vec::new();
        self.collect_placeholders(&mut out);
        out
    }

    fn collect_placeholders(&self, out: &mut Vec<usize>) {
        match self {
            Node::Char(_) => {}
            Node::Placeholder { ordinal, .. } => out.push(*ordinal),
            Node::Command { args, .. } => args.iter().for_each(|n| n.collect_placeholders(out)),
            Node::Group(children) => children.iter().for_each(|n| n.collect_placeholders(out)),
            Node::Fraction {
                numerator,
                denominator,
            } => numerator
                .iter()
                .chain(denominator)
                .for_each(|n| n.collect_placeholders(out)),
            Node::Script { base, sup, sub } => {
                base.collect_placeholders(out);
                if let Some(sup) = sup {
                    sup.collect_placeholders(out);
                }
                if let Some(sub) = sub {
                    sub.collect_placeholders(out);
                }
            }
            Node::Grid { rows, .. } => rows
                .iter()
                .flatten()
                .flatten()
                .for_each(|n| n.collect_placeholders(out)),
        }
    }
}

fn write_seq(f: &mut fmt::Formatter<'_>, nodes: &[Node]) -> fmt::Result {
    f.write_str("{")?;
    for (i, node) in nodes.iter().enumerate() {
        if i > 0 {
            f.write_str(" ")?;
        }
        write!(f, "{node}")?;
    }
    f.write_str("}")
}

/// Compact s-expression dump, used by tests and the CLI.
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Char(c) => write!(f, "{c}"),
            Node::Group(children) => write_seq(f, children),
            Node::Command { name, args } => {
                write!(f, "(\\{name}")?;
                for arg in args {
                    write!(f, " {arg}")?;
                }
                f.write_str(")")
            }
            Node::Fraction {
                numerator,
                denominator,
            } => {
                f.write_str("(frac ")?;
                write_seq(f, numerator)?;
                f.write_str(" ")?;
                write_seq(f, denominator)?;
                f.write_str(")")
            }
            Node::Script { base, sup, sub } => {
                write!(f, "(script {base}")?;
                if let Some(sup) = sup {
                    write!(f, " ^{sup}")?;
                }
                if let Some(sub) = sub {
                    write!(f, " _{sub}")?;
                }
                f.write_str(")")
            }
            Node::Grid {
                kind,
                rows,
                bracketed,
            } => {
                let name = match kind {
                    GridKind::Matrix => "matrix",
                    GridKind::Table => "table",
                };
                write!(f, "({name}")?;
                if *bracketed {
                    f.write_str(" bracketed")?;
                }
                for row in rows {
                    f.write_str(" [")?;
                    for (i, cell) in row.iter().enumerate() {
                        if i > 0 {
                            f.write_str(" ")?;
                        }
                        write_seq(f, cell)?;
                    }
                    f.write_str("]")?;
                }
                f.write_str(")")
            }
            Node::Placeholder { kind, ordinal } => match kind {
                PlaceholderKind::Box => write!(f, "#box{ordinal}"),
                PlaceholderKind::Gap => write!(f, "#gap{ordinal}"),
            },
        }
    }
}
