//! Typesetting for mathbox markup: measure a string, or render it to
//! vector primitives.
//!
//! Markup is plain text with `$...$` notation segments; `\$` is a literal
//! dollar sign. Every call is self-contained: blank-box indices restart at
//! zero and nothing is cached between calls.
//!
//! ```
//! use mathbox_layout::{RenderOptions, measure, render};
//!
//! let m = measure(r"Solve $\frac{x}{2} = \box$", 16.0);
//! assert!(m.width > 0.0);
//!
//! let primitives = render(r"$x^2 + \box$", &RenderOptions::default());
//! assert_eq!(primitives.iter().filter_map(|p| p.index).collect::<Vec<_>>(), vec![0]);
//! ```

pub mod boxes;
pub mod layout;
pub mod metrics;
pub mod render;
pub mod style;

use mathbox_syntax::{Mode, parse_with};
use serde::{Deserialize, Serialize};

pub use boxes::LayoutBox;
pub use render::{
    Align, Bounds, Geometry, Paint, PathSegment, Primitive, bounds, dispatch_pointer, hit_test,
};
pub use style::{
    BoxInteraction, BoxStyle, CallCounters, PointerEvent, StaticInteraction, StyleContext,
    StyleParseError,
};

pub const DEFAULT_COLOR: &str = "#000000";
pub const DEFAULT_FONT_SIZE: f64 = 16.0;

const BACKGROUND_FILL: &str = "#ffffff";
const BACKGROUND_OPACITY: f64 = 0.85;
const BACKGROUND_PAD: f64 = 0.15;

/// How markup is split into text and notation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RenderMode {
    /// Text with `$...$` notation segments.
    #[default]
    Mixed,
    /// The whole string is notation.
    Math,
    /// The whole string is plain text.
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub is_math: bool,
}

/// Splits mixed markup on unescaped `$`. Segments alternate text and
/// notation starting with text; an unclosed final `$` opens a notation
/// segment that runs to the end.
pub fn split_segments(markup: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut is_math = false;
    let mut chars = markup.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&'$') => {
                chars.next();
                if is_math {
                    current.push_str("\\$");
                } else {
                    current.push('$');
                }
            }
            '\\' => {
                current.push('\\');
                // Keep `\\` together so it cannot escape a following `$`.
                if chars.peek() == Some(&'\\') {
                    current.push('\\');
                    chars.next();
                }
            }
            '$' => {
                segments.push(Segment {
                    text: std::mem::take(&mut current),
                    is_math,
                });
                is_math = !is_math;
            }
            _ => current.push(c),
        }
    }
    segments.push(Segment {
        text: current,
        is_math,
    });
    segments
}

/// Lays out a whole markup string as one row.
///
/// Placeholder ordinals continue from one notation segment to the next, so
/// they agree with the layout counter across the string.
pub fn typeset(markup: &str, mode: RenderMode, ctx: StyleContext<'_>) -> LayoutBox {
    let segments = match mode {
        RenderMode::Mixed => split_segments(markup),
        RenderMode::Math | RenderMode::Text => vec![Segment {
            text: markup.to_string(),
            is_math: mode == RenderMode::Math,
        }],
    };

    let mut ordinal = 0;
    let mut pieces = Vec::with_capacity(segments.len());
    for segment in segments.iter().filter(|s| !s.text.is_empty()) {
        if segment.is_math {
            let parsed = parse_with(&segment.text, Mode::Math, ordinal);
            ordinal = parsed.next_ordinal;
            for error in &parsed.errors {
                log::debug!(
                    "recovered in `{}` at {:?}: {}",
                    segment.text,
                    error.range,
                    error.message
                );
            }
            pieces.push(layout::layout(
                &parsed.root,
                StyleContext {
                    is_math: true,
                    ..ctx
                },
            ));
        } else {
            pieces.push(layout::layout_text(&segment.text, ctx.text()));
        }
    }
    LayoutBox::Horizontal(boxes::HorizontalBox::row(pieces))
}

/// Size of a typeset string, with the box tree that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Measurement {
    pub width: f64,
    pub height: f64,
    pub ascent: f64,
    pub descent: f64,
    pub layout: LayoutBox,
}

/// Measures mixed markup at `font_size`.
pub fn measure(markup: &str, font_size: f64) -> Measurement {
    measure_with(markup, font_size, RenderMode::Mixed)
}

pub fn measure_with(markup: &str, font_size: f64, mode: RenderMode) -> Measurement {
    let counters = CallCounters::default();
    let ctx = StyleContext::new(font_size, DEFAULT_COLOR, &counters);
    let layout = typeset(markup, mode, ctx);
    log::trace!(
        "measured {markup:?} at {font_size}: {}x{}",
        layout.width(),
        layout.height()
    );
    Measurement {
        width: layout.width(),
        height: layout.height(),
        ascent: layout.ascent(),
        descent: layout.descent(),
        layout,
    }
}

/// Options for [`render`]. `y` is the baseline of the rendered line.
#[derive(Clone, Copy)]
pub struct RenderOptions<'a> {
    pub x: f64,
    pub y: f64,
    pub font_size: f64,
    pub color: &'a str,
    pub align: Align,
    /// Emit a translucent backing rect first, for labels over busy figures.
    pub background: bool,
    pub mode: RenderMode,
    /// Outline every box.
    pub debug: bool,
    /// Block-level blank-box style.
    pub overrides: BoxStyle,
    pub interaction: Option<&'a dyn BoxInteraction>,
}

impl Default for RenderOptions<'_> {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            font_size: DEFAULT_FONT_SIZE,
            color: DEFAULT_COLOR,
            align: Align::Start,
            background: false,
            mode: RenderMode::Mixed,
            debug: false,
            overrides: BoxStyle::default(),
            interaction: None,
        }
    }
}

/// Lays out and renders markup in one pass.
pub fn render(markup: &str, options: &RenderOptions<'_>) -> Vec<Primitive> {
    let counters = CallCounters::default();
    let mut ctx = StyleContext::new(options.font_size, options.color, &counters);
    ctx.debug = options.debug;
    ctx.box_options = options.overrides;
    ctx.interaction = options.interaction;

    let layout = typeset(markup, options.mode, ctx);
    let x = options.x + options.align.shift(layout.width());

    let mut out = Vec::new();
    if options.background && layout.width() > 0.0 {
        let pad = BACKGROUND_PAD * options.font_size;
        let mut paint = Paint::fill(BACKGROUND_FILL);
        paint.opacity = BACKGROUND_OPACITY;
        out.push(Primitive::new(
            Geometry::Rect {
                x: x - pad,
                y: options.y - layout.ascent() - pad,
                width: layout.width() + 2.0 * pad,
                height: layout.height() + 2.0 * pad,
            },
            paint,
        ));
    }
    layout.render(x, options.y, &ctx, &mut out);
    log::trace!(
        "rendered {markup:?}: {} primitives, {} blanks",
        out.len(),
        counters.render.peek()
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(markup: &str) -> Vec<(&'static str, String)> {
        split_segments(markup)
            .into_iter()
            .map(|s| (if s.is_math { "math" } else { "text" }, s.text))
            .collect()
    }

    #[test]
    fn test_split_alternates() {
        assert_eq!(
            split("a $x$ b"),
            vec![
                ("text", "a ".to_string()),
                ("math", "x".to_string()),
                ("text", " b".to_string()),
            ]
        );
    }

    #[test]
    fn test_split_escaped_dollar() {
        assert_eq!(split(r"costs \$5"), vec![("text", "costs $5".to_string())]);
        assert_eq!(
            split(r"$a\$b$"),
            vec![
                ("text", String::new()),
                ("math", r"a\$b".to_string()),
                ("text", String::new()),
            ]
        );
    }

    #[test]
    fn test_split_row_break_before_dollar() {
        assert_eq!(
            split(r"$\mat{1 \\}$x"),
            vec![
                ("text", String::new()),
                ("math", r"\mat{1 \\}".to_string()),
                ("text", "x".to_string()),
            ]
        );
    }

    #[test]
    fn test_split_unclosed_math() {
        assert_eq!(
            split("a $x"),
            vec![("text", "a ".to_string()), ("math", "x".to_string())]
        );
    }

    #[test]
    fn test_empty_markup_is_zero_sized() {
        let m = measure("", 16.0);
        assert_eq!(m.width, 0.0);
        assert_eq!(m.height, 0.0);
        assert!(render("", &RenderOptions::default()).is_empty());
    }

    #[test]
    fn test_text_mode_ignores_dollars() {
        let text = measure_with("$x$", 16.0, RenderMode::Text);
        let mixed = measure("$x$", 16.0);
        assert!(text.width > mixed.width);
    }

    #[test]
    fn test_background_comes_first() {
        let options = RenderOptions {
            background: true,
            ..RenderOptions::default()
        };
        let primitives = render("label", &options);
        assert_eq!(primitives[0].paint.fill.as_deref(), Some(BACKGROUND_FILL));
        assert!(primitives[0].paint.opacity < 1.0);
        assert!(primitives.len() > 1);
    }

    #[test]
    fn test_ordinals_continue_across_segments() {
        let m = measure(r"$\box$ and $\box$", 16.0);
        let ordinals: Vec<usize> = {
            let mut found = Vec::new();
            m.layout.walk(&mut |b| {
                if let LayoutBox::Fill(fill) = b {
                    found.push(fill.ordinal);
                }
            });
            found
        };
        assert_eq!(ordinals, vec![0, 1]);
        assert_eq!(m.layout.fill_indices(), vec![0, 1]);
    }
}
