//! The fixed command table.
//!
//! The tokenizer resolves a letter run after `\` to the longest entry that
//! prefixes it, and the parser reads each entry's arity from here. Anything
//! missing from the table is an unknown command and is rendered literally.

use crate::ast::GridKind;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CommandKind {
    /// `\frac{num}{den}`
    Fraction,
    /// `\box`, an inline fill-in blank.
    Blank,
    /// `\gap`, a blank cell. Only meaningful inside a grid argument.
    BlankCell,
    /// `\mat`, `\matrix`, `\table`
    Grid { kind: GridKind, bracketed: bool },
    /// `\text`, `\mathrm`, `\mathbf`, `\textbf`
    Font(FontChange),
    Sqrt,
    Overline,
    /// A single glyph such as `\alpha` or `\le`.
    Symbol(char),
    /// Horizontal space in em.
    Space(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontChange {
    /// Upright text metrics.
    Text,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommandSpec {
    pub name: &'static str,
    pub kind: CommandKind,
}

impl CommandSpec {
    /// Number of brace arguments the command consumes.
    pub fn arity(&self) -> usize {
        match self.kind {
            CommandKind::Fraction => 2,
            CommandKind::Grid { .. }
            | CommandKind::Font(_)
            | CommandKind::Sqrt
            | CommandKind::Overline => 1,
            CommandKind::Blank
            | CommandKind::BlankCell
            | CommandKind::Symbol(_)
            | CommandKind::Space(_) => 0,
        }
    }
}

const fn sym(name: &'static str, glyph: char) -> CommandSpec {
    CommandSpec {
        name,
        kind: CommandKind::Symbol(glyph),
    }
}

const fn grid(name: &'static str, kind: GridKind, bracketed: bool) -> CommandSpec {
    CommandSpec {
        name,
        kind: CommandKind::Grid { kind, bracketed },
    }
}

const fn space(name: &'static str, em: f64) -> CommandSpec {
    CommandSpec {
        name,
        kind: CommandKind::Space(em),
    }
}

pub static COMMANDS: &[CommandSpec] = &[
    CommandSpec { name: "frac", kind: CommandKind::Fraction },
    CommandSpec { name: "box", kind: CommandKind::Blank },
    CommandSpec { name: "gap", kind: CommandKind::BlankCell },
    grid("mat", GridKind::Matrix, true),
    grid("matrix", GridKind::Matrix, false),
    grid("table", GridKind::Table, false),
    CommandSpec { name: "text", kind: CommandKind::Font(FontChange::Text) },
    CommandSpec { name: "mathrm", kind: CommandKind::Font(FontChange::Text) },
    CommandSpec { name: "mathbf", kind: CommandKind::Font(FontChange::Bold) },
    CommandSpec { name: "textbf", kind: CommandKind::Font(FontChange::Bold) },
    CommandSpec { name: "sqrt", kind: CommandKind::Sqrt },
    CommandSpec { name: "overline", kind: CommandKind::Overline },
    // Spacing. `\left`/`\right` take no space; delimiters are not stretched.
    space(",", 3.0 / 18.0),
    space(":", 4.0 / 18.0),
    space(";", 5.0 / 18.0),
    space("!", 0.0),
    space(" ", 0.25),
    space("quad", 1.0),
    space("qquad", 2.0),
    space("left", 0.0),
    space("right", 0.0),
    // Greek
    sym("alpha", 'α'),
    sym("beta", 'β'),
    sym("gamma", 'γ'),
    sym("delta", 'δ'),
    sym("epsilon", 'ε'),
    sym("varepsilon", 'ϵ'),
    sym("zeta", 'ζ'),
    sym("eta", 'η'),
    sym("theta", 'θ'),
    sym("iota", 'ι'),
    sym("kappa", 'κ'),
    sym("lambda", 'λ'),
    sym("mu", 'μ'),
    sym("nu", 'ν'),
    sym("xi", 'ξ'),
    sym("pi", 'π'),
    sym("rho", 'ρ'),
    sym("sigma", 'σ'),
    sym("tau", 'τ'),
    sym("upsilon", 'υ'),
    sym("phi", 'ϕ'),
    sym("varphi", 'φ'),
    sym("chi", 'χ'),
    sym("psi", 'ψ'),
    sym("omega", 'ω'),
    sym("Gamma", 'Γ'),
    sym("Delta", 'Δ'),
    sym("Theta", 'Θ'),
    sym("Lambda", 'Λ'),
    sym("Xi", 'Ξ'),
    sym("Pi", 'Π'),
    sym("Sigma", 'Σ'),
    sym("Phi", 'Φ'),
    sym("Psi", 'Ψ'),
    sym("Omega", 'Ω'),
    // Binary operators
    sym("times", '×'),
    sym("cdot", '·'),
    sym("div", '÷'),
    sym("pm", '±'),
    sym("mp", '∓'),
    sym("ast", '∗'),
    sym("circ", '∘'),
    sym("bullet", '•'),
    sym("cup", '∪'),
    sym("cap", '∩'),
    // Relations
    sym("le", '≤'),
    sym("leq", '≤'),
    sym("ge", '≥'),
    sym("geq", '≥'),
    sym("ne", '≠'),
    sym("neq", '≠'),
    sym("approx", '≈'),
    sym("equiv", '≡'),
    sym("sim", '∼'),
    sym("propto", '∝'),
    sym("in", '∈'),
    sym("notin", '∉'),
    sym("subset", '⊂'),
    sym("subseteq", '⊆'),
    sym("perp", '⊥'),
    sym("parallel", '∥'),
    sym("mid", '∣'),
    // Arrows
    sym("to", '→'),
    sym("rightarrow", '→'),
    sym("leftarrow", '←'),
    sym("Rightarrow", '⇒'),
    sym("Leftrightarrow", '⇔'),
    sym("mapsto", '↦'),
    // Miscellaneous
    sym("infty", '∞'),
    sym("degree", '°'),
    sym("angle", '∠'),
    sym("triangle", '△'),
    sym("partial", '∂'),
    sym("nabla", '∇'),
    sym("sum", '∑'),
    sym("prod", '∏'),
    sym("int", '∫'),
    sym("ldots", '…'),
    sym("cdots", '⋯'),
    sym("prime", '′'),
    sym("emptyset", '∅'),
    sym("forall", '∀'),
    sym("exists", '∃'),
    sym("neg", '¬'),
    sym("therefore", '∴'),
    sym("langle", '⟨'),
    sym("rangle", '⟩'),
];

pub fn lookup(name: &str) -> Option<&'static CommandSpec> {
    COMMANDS.iter().find(|spec| spec.name == name)
}

/// Length in bytes of the longest table entry that prefixes `run`.
pub fn longest_prefix(run: &str) -> Option<usize> {
    COMMANDS
        .iter()
        .filter(|spec| run.starts_with(spec.name))
        .map(|spec| spec.name.len())
        .max()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_longest_prefix_prefers_longer_entry() {
        assert_eq!(longest_prefix("infty"), Some(5));
        assert_eq!(longest_prefix("in"), Some(2));
        assert_eq!(longest_prefix("mathbf"), Some(6));
        assert_eq!(longest_prefix("matrix"), Some(6));
        assert_eq!(longest_prefix("pix"), Some(2));
        assert_eq!(longest_prefix("foo"), None);
    }

    #[test]
    fn test_arity() {
        assert_eq!(lookup("frac").map(CommandSpec::arity), Some(2));
        assert_eq!(lookup("mat").map(CommandSpec::arity), Some(1));
        assert_eq!(lookup("alpha").map(CommandSpec::arity), Some(0));
        assert!(lookup("fra").is_none());
    }

    #[test]
    fn test_names_are_unique() {
        for (i, spec) in COMMANDS.iter().enumerate() {
            assert!(
                COMMANDS[i + 1..].iter().all(|other| other.name != spec.name),
                "duplicate command {}",
                spec.name
            );
        }
    }
}
