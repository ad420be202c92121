//! Static glyph metrics and the geometry constants of the layout engine.
//!
//! Every length here is in em and is multiplied by the effective font size.
//! Advance widths follow a Helvetica-like sans face; vertical extents are
//! rounded to a handful of classes (x-height, cap height, descender).

use std::collections::HashMap;

use once_cell::sync::Lazy;

pub const X_HEIGHT: f64 = 0.523;
pub const CAP_HEIGHT: f64 = 0.718;
pub const DESCENDER: f64 = 0.21;
/// Height of the math axis above the baseline; fraction rules sit on it.
pub const AXIS_HEIGHT: f64 = 0.25;

pub const SCRIPT_SHRINK: f64 = 0.7;
pub const MIN_FONT_SIZE: f64 = 6.0;

pub const ITALIC_CORRECTION: f64 = 0.06;
pub const BOLD_WIDEN: f64 = 1.06;
pub const BINARY_SPACE: f64 = 4.0 / 18.0;
pub const RELATION_SPACE: f64 = 5.0 / 18.0;
pub const PUNCT_SPACE: f64 = 3.0 / 18.0;

pub const FRACTION_RULE: f64 = 0.05;
pub const FRACTION_GAP: f64 = 0.12;
pub const FRACTION_PAD: f64 = 0.12;

pub const SUP_DROP: f64 = 0.3;
pub const SUP_MIN_RISE: f64 = 0.36;
pub const SUB_DROP: f64 = 0.05;
pub const SUB_MIN_DROP: f64 = 0.2;
pub const SCRIPT_MIN_GAP: f64 = 0.16;

pub const GRID_COL_GAP: f64 = 0.8;
pub const GRID_ROW_GAP: f64 = 0.3;
pub const BRACKET_WIDTH: f64 = 0.3;
pub const BRACKET_PAD: f64 = 0.15;
pub const BRACKET_STROKE: f64 = 0.05;

pub const OVERLINE_GAP: f64 = 0.1;
pub const OVERLINE_RULE: f64 = 0.05;

const DEFAULT_ADVANCE: f64 = 0.6;

/// Metrics of one glyph, in em.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphMetrics {
    pub advance: f64,
    pub ascent: f64,
    pub descent: f64,
}

const fn g(advance: f64, ascent: f64, descent: f64) -> GlyphMetrics {
    GlyphMetrics {
        advance,
        ascent,
        descent,
    }
}

#[rustfmt::skip]
const LOWERCASE: [f64; 26] = [
    0.556, 0.556, 0.500, 0.556, 0.556, 0.278, 0.556, 0.556, 0.222, 0.222, 0.500, 0.222, 0.833,
    0.556, 0.556, 0.556, 0.556, 0.333, 0.500, 0.278, 0.556, 0.500, 0.722, 0.500, 0.500, 0.500,
];

#[rustfmt::skip]
const UPPERCASE: [f64; 26] = [
    0.667, 0.667, 0.722, 0.722, 0.667, 0.611, 0.778, 0.722, 0.278, 0.500, 0.667, 0.556, 0.833,
    0.722, 0.778, 0.667, 0.778, 0.722, 0.667, 0.611, 0.722, 0.667, 0.944, 0.667, 0.667, 0.611,
];

#[rustfmt::skip]
const SYMBOLS: &[(char, GlyphMetrics)] = &[
    (' ', g(0.278, 0.0, 0.0)),
    ('\u{a0}', g(0.278, 0.0, 0.0)),
    ('.', g(0.278, 0.106, 0.0)),
    (',', g(0.278, 0.106, 0.147)),
    (':', g(0.278, 0.516, 0.0)),
    (';', g(0.278, 0.516, 0.147)),
    ('!', g(0.278, 0.718, 0.0)),
    ('?', g(0.556, 0.741, 0.0)),
    ('(', g(0.333, 0.728, 0.212)),
    (')', g(0.333, 0.728, 0.212)),
    ('[', g(0.278, 0.722, 0.21)),
    (']', g(0.278, 0.722, 0.21)),
    ('{', g(0.334, 0.722, 0.21)),
    ('}', g(0.334, 0.722, 0.21)),
    ('|', g(0.26, 0.718, 0.21)),
    ('/', g(0.278, 0.737, 0.019)),
    ('\\', g(0.278, 0.737, 0.019)),
    ('\'', g(0.191, 0.718, 0.0)),
    ('"', g(0.355, 0.718, 0.0)),
    ('+', g(0.584, 0.505, 0.0)),
    ('-', g(0.333, 0.325, 0.0)),
    ('=', g(0.584, 0.419, 0.0)),
    ('<', g(0.584, 0.495, 0.0)),
    ('>', g(0.584, 0.495, 0.0)),
    ('*', g(0.389, 0.718, 0.0)),
    ('%', g(0.889, 0.703, 0.019)),
    ('&', g(0.667, 0.718, 0.015)),
    ('#', g(0.556, 0.688, 0.0)),
    ('$', g(0.556, 0.775, 0.115)),
    ('@', g(1.015, 0.737, 0.142)),
    ('^', g(0.469, 0.703, 0.0)),
    ('_', g(0.556, 0.0, 0.125)),
    ('~', g(0.584, 0.326, 0.0)),
    ('−', g(0.584, 0.325, 0.0)),
    ('×', g(0.584, 0.48, 0.0)),
    ('÷', g(0.584, 0.52, 0.0)),
    ('±', g(0.584, 0.506, 0.0)),
    ('∓', g(0.584, 0.506, 0.0)),
    ('·', g(0.278, 0.315, 0.0)),
    ('∗', g(0.389, 0.5, 0.0)),
    ('∘', g(0.4, 0.5, 0.0)),
    ('•', g(0.35, 0.45, 0.0)),
    ('∪', g(0.667, 0.55, 0.0)),
    ('∩', g(0.667, 0.55, 0.0)),
    ('≤', g(0.584, 0.6, 0.1)),
    ('≥', g(0.584, 0.6, 0.1)),
    ('≠', g(0.584, 0.52, 0.05)),
    ('≈', g(0.584, 0.42, 0.0)),
    ('≡', g(0.584, 0.45, 0.0)),
    ('∼', g(0.584, 0.33, 0.0)),
    ('∝', g(0.71, 0.45, 0.0)),
    ('∈', g(0.667, 0.54, 0.04)),
    ('∉', g(0.667, 0.6, 0.1)),
    ('⊂', g(0.71, 0.54, 0.04)),
    ('⊆', g(0.71, 0.6, 0.1)),
    ('⊥', g(0.72, 0.68, 0.0)),
    ('∥', g(0.4, 0.718, 0.21)),
    ('∣', g(0.26, 0.718, 0.21)),
    ('→', g(1.0, 0.5, 0.0)),
    ('←', g(1.0, 0.5, 0.0)),
    ('⇒', g(1.0, 0.52, 0.0)),
    ('⇔', g(1.0, 0.52, 0.0)),
    ('↦', g(1.0, 0.5, 0.0)),
    ('∞', g(0.833, 0.45, 0.0)),
    ('°', g(0.4, 0.703, 0.0)),
    ('∠', g(0.72, 0.7, 0.0)),
    ('△', g(0.72, 0.7, 0.0)),
    ('∂', g(0.556, 0.72, 0.015)),
    ('∇', g(0.72, 0.72, 0.0)),
    ('∑', g(0.9, 0.75, 0.25)),
    ('∏', g(0.9, 0.75, 0.25)),
    ('∫', g(0.5, 0.82, 0.25)),
    ('…', g(1.0, 0.106, 0.0)),
    ('⋯', g(1.0, 0.3, 0.0)),
    ('′', g(0.275, 0.74, 0.0)),
    ('∅', g(0.6, 0.72, 0.04)),
    ('∀', g(0.667, 0.718, 0.0)),
    ('∃', g(0.6, 0.718, 0.0)),
    ('¬', g(0.584, 0.42, 0.0)),
    ('∴', g(0.6, 0.52, 0.0)),
    ('⟨', g(0.389, 0.73, 0.21)),
    ('⟩', g(0.389, 0.73, 0.21)),
    ('√', g(0.65, 0.78, 0.05)),
    // Greek
    ('α', g(0.6, X_HEIGHT, 0.0)),
    ('β', g(0.56, 0.72, DESCENDER)),
    ('γ', g(0.5, X_HEIGHT, DESCENDER)),
    ('δ', g(0.54, 0.72, 0.0)),
    ('ε', g(0.46, X_HEIGHT, 0.0)),
    ('ϵ', g(0.44, X_HEIGHT, 0.0)),
    ('ζ', g(0.46, 0.72, DESCENDER)),
    ('η', g(0.55, X_HEIGHT, DESCENDER)),
    ('θ', g(0.54, 0.72, 0.0)),
    ('ι', g(0.28, X_HEIGHT, 0.0)),
    ('κ', g(0.52, X_HEIGHT, 0.0)),
    ('λ', g(0.52, 0.72, 0.0)),
    ('μ', g(0.57, X_HEIGHT, DESCENDER)),
    ('ν', g(0.5, X_HEIGHT, 0.0)),
    ('ξ', g(0.46, 0.72, DESCENDER)),
    ('π', g(0.58, X_HEIGHT, 0.0)),
    ('ρ', g(0.54, X_HEIGHT, DESCENDER)),
    ('σ', g(0.57, X_HEIGHT, 0.0)),
    ('τ', g(0.46, X_HEIGHT, 0.0)),
    ('υ', g(0.54, X_HEIGHT, 0.0)),
    ('ϕ', g(0.62, 0.72, DESCENDER)),
    ('φ', g(0.62, X_HEIGHT, DESCENDER)),
    ('χ', g(0.54, X_HEIGHT, DESCENDER)),
    ('ψ', g(0.66, 0.72, DESCENDER)),
    ('ω', g(0.7, X_HEIGHT, 0.0)),
    ('Γ', g(0.58, CAP_HEIGHT, 0.0)),
    ('Δ', g(0.68, CAP_HEIGHT, 0.0)),
    ('Θ', g(0.78, CAP_HEIGHT, 0.0)),
    ('Λ', g(0.67, CAP_HEIGHT, 0.0)),
    ('Ξ', g(0.64, CAP_HEIGHT, 0.0)),
    ('Π', g(0.72, CAP_HEIGHT, 0.0)),
    ('Σ', g(0.64, CAP_HEIGHT, 0.0)),
    ('Φ', g(0.78, CAP_HEIGHT, 0.0)),
    ('Ψ', g(0.78, CAP_HEIGHT, 0.0)),
    ('Ω', g(0.76, CAP_HEIGHT, 0.0)),
];

static TABLE: Lazy<HashMap<char, GlyphMetrics>> = Lazy::new(|| {
    let mut table = HashMap::with_capacity(26 * 2 + 10 + SYMBOLS.len());
    for (i, c) in ('a'..='z').enumerate() {
        let ascent = match c {
            'b' | 'd' | 'f' | 'h' | 'k' | 'l' | 'i' | 'j' => CAP_HEIGHT,
            't' => 0.669,
            _ => X_HEIGHT,
        };
        let descent = match c {
            'g' | 'j' | 'p' | 'q' | 'y' => DESCENDER,
            _ => 0.0,
        };
        table.insert(c, g(LOWERCASE[i], ascent, descent));
    }
    for (i, c) in ('A'..='Z').enumerate() {
        let descent = if c == 'Q' { 0.056 } else { 0.0 };
        table.insert(c, g(UPPERCASE[i], CAP_HEIGHT, descent));
    }
    for c in '0'..='9' {
        table.insert(c, g(0.556, 0.703, 0.0));
    }
    table.extend(SYMBOLS.iter().copied());
    table
});

/// Spacing class of a glyph in math mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathClass {
    Ordinary,
    Binary,
    Relation,
    Punctuation,
}

pub fn math_class(c: char) -> MathClass {
    match c {
        '+' | '−' | '×' | '÷' | '±' | '∓' | '·' | '∗' | '∘' | '•' | '∪' | '∩' => MathClass::Binary,
        '=' | '<' | '>' | '≤' | '≥' | '≠' | '≈' | '≡' | '∼' | '∝' | '∈' | '∉' | '⊂' | '⊆'
        | '⊥' | '∥' | '∣' | '→' | '←' | '⇒' | '⇔' | '↦' => MathClass::Relation,
        ',' | ';' => MathClass::Punctuation,
        _ => MathClass::Ordinary,
    }
}

/// Glyph substitutions applied to math-mode literals.
pub fn math_glyph(c: char) -> char {
    match c {
        '-' => '−',
        '*' => '∗',
        '\'' => '′',
        _ => c,
    }
}

/// Letters are set in italics in math mode.
pub fn is_math_italic(c: char) -> bool {
    c.is_ascii_alphabetic() || ('α'..='ω').contains(&c) || matches!(c, 'ϵ' | 'ϕ')
}

pub fn lookup(c: char) -> GlyphMetrics {
    TABLE
        .get(&c)
        .copied()
        .unwrap_or(g(DEFAULT_ADVANCE, CAP_HEIGHT, 0.0))
}

pub fn is_known(c: char) -> bool {
    TABLE.contains_key(&c)
}

/// Effective font size at a script depth: geometric shrink, floored.
pub fn scaled_size(font_size: f64, depth: u32) -> f64 {
    if depth == 0 {
        return font_size;
    }
    let shrunk = font_size * SCRIPT_SHRINK.powi(depth as i32);
    shrunk.max(font_size.min(MIN_FONT_SIZE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_covers_ascii_alphanumerics() {
        for c in ('a'..='z').chain('A'..='Z').chain('0'..='9') {
            assert!(is_known(c), "missing {c}");
        }
    }

    #[test]
    fn test_unknown_glyph_falls_back() {
        let m = lookup('中');
        assert_eq!(m.advance, DEFAULT_ADVANCE);
        assert!(!is_known('中'));
    }

    #[test]
    fn test_scaled_size_shrinks_and_floors() {
        assert_eq!(scaled_size(20.0, 0), 20.0);
        assert!((scaled_size(20.0, 1) - 14.0).abs() < 1e-9);
        assert!((scaled_size(20.0, 2) - 9.8).abs() < 1e-9);
        assert_eq!(scaled_size(20.0, 6), MIN_FONT_SIZE);
        // Below the floor already: never grows.
        assert_eq!(scaled_size(4.0, 3), 4.0);
    }

    #[test]
    fn test_math_classes() {
        assert_eq!(math_class('+'), MathClass::Binary);
        assert_eq!(math_class('='), MathClass::Relation);
        assert_eq!(math_class('x'), MathClass::Ordinary);
        assert_eq!(math_class(math_glyph('-')), MathClass::Binary);
    }

    #[test]
    fn test_descenders() {
        assert_eq!(lookup('y').descent, DESCENDER);
        assert_eq!(lookup('x').descent, 0.0);
        assert_eq!(lookup('2').descent, 0.0);
    }
}
