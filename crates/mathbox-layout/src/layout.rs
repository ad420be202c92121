//! Maps the notation tree to measured boxes.
//!
//! Layout is bottom-up and position-free: every node becomes a [`LayoutBox`]
//! whose size depends only on the node and the [`StyleContext`]. Nothing here
//! fails; unknown commands are set as their literal name.

use mathbox_syntax::commands::{self, CommandKind, FontChange};
use mathbox_syntax::{Node, PlaceholderKind};

use crate::boxes::{
    CharBox, FillBox, FractionBox, GridBox, HorizontalBox, LayoutBox, OverlineBox,
};
use crate::metrics::{
    self, BINARY_SPACE, BOLD_WIDEN, ITALIC_CORRECTION, MathClass, PUNCT_SPACE, RELATION_SPACE,
};
use crate::style::StyleContext;

pub fn layout(node: &Node, ctx: StyleContext<'_>) -> LayoutBox {
    match node {
        Node::Char(c) => LayoutBox::Char(char_box(*c, ctx)),
        Node::Group(children) => layout_nodes(children, ctx),
        Node::Command { name, args } => layout_command(name, args, ctx),
        Node::Fraction {
            numerator,
            denominator,
        } => {
            let inner = ctx.deeper();
            LayoutBox::Fraction(FractionBox::new(
                layout_nodes(numerator, inner),
                layout_nodes(denominator, inner),
                ctx.size(),
            ))
        }
        Node::Script { base, sup, sub } => {
            let base = layout(base, ctx);
            let inner = ctx.deeper();
            let sub_first = subscript_written_first(sup.as_deref(), sub.as_deref());
            let script = |node: &Option<Box<Node>>| node.as_deref().map(|n| layout(n, inner));
            // Blank indices are taken as boxes are laid out.
            let (sup, sub) = if sub_first {
                let sub = script(sub);
                (script(sup), sub)
            } else {
                let sup = script(sup);
                (sup, script(sub))
            };
            LayoutBox::Horizontal(HorizontalBox::scripted(base, sup, sub, sub_first, ctx.size()))
        }
        Node::Grid {
            rows, bracketed, ..
        } => {
            let cell_ctx = ctx.cell();
            let cells = rows
                .iter()
                .map(|row| row.iter().map(|cell| layout_nodes(cell, cell_ctx)).collect())
                .collect();
            LayoutBox::Grid(GridBox::new(cells, *bracketed, ctx.size()))
        }
        Node::Placeholder { kind, ordinal } => {
            let ctx = match kind {
                PlaceholderKind::Gap => ctx.cell(),
                PlaceholderKind::Box => ctx,
            };
            let index = ctx.layout_counter.next();
            let style = ctx.resolve_box_style(*ordinal);
            LayoutBox::Fill(FillBox::new(
                index,
                *ordinal,
                style,
                ctx.domain_default(),
                ctx.size(),
            ))
        }
    }
}

/// Lays out a node list left to right.
pub fn layout_nodes(nodes: &[Node], ctx: StyleContext<'_>) -> LayoutBox {
    LayoutBox::Horizontal(HorizontalBox::row(
        nodes.iter().map(|node| layout(node, ctx)).collect(),
    ))
}

/// Lays out plain text, one glyph per character, no commands.
pub fn layout_text(text: &str, ctx: StyleContext<'_>) -> LayoutBox {
    LayoutBox::Horizontal(HorizontalBox::row(
        text.chars()
            .map(|c| LayoutBox::Char(char_box(c, ctx)))
            .collect(),
    ))
}

pub fn char_box(c: char, ctx: StyleContext<'_>) -> CharBox {
    let size = ctx.size();
    let glyph = if ctx.is_math { metrics::math_glyph(c) } else { c };
    if !metrics::is_known(glyph) {
        log::trace!("no metrics for {glyph:?}, using the default advance");
    }
    let m = metrics::lookup(glyph);
    let italic = ctx.is_math && metrics::is_math_italic(glyph);

    let mut advance = m.advance;
    if italic {
        advance += ITALIC_CORRECTION;
    }
    if ctx.is_bold {
        advance *= BOLD_WIDEN;
    }

    // Operator spacing only at the top level, as scripts are set tight.
    let (left, right) = if ctx.is_math && ctx.depth == 0 {
        match metrics::math_class(glyph) {
            MathClass::Binary => (BINARY_SPACE, BINARY_SPACE),
            MathClass::Relation => (RELATION_SPACE, RELATION_SPACE),
            MathClass::Punctuation => (0.0, PUNCT_SPACE),
            MathClass::Ordinary => (0.0, 0.0),
        }
    } else {
        (0.0, 0.0)
    };

    CharBox {
        glyph,
        font_size: size,
        italic,
        bold: ctx.is_bold,
        left_bearing: left * size,
        width: (advance + left + right) * size,
        ascent: m.ascent * size,
        descent: m.descent * size,
    }
}

/// Whether `x_{..}^{..}` order was used, judged by the first blank in each
/// script. Without blanks on both sides the order is irrelevant.
fn subscript_written_first(sup: Option<&Node>, sub: Option<&Node>) -> bool {
    let first = |node: Option<&Node>| node.and_then(|n| n.placeholders().first().copied());
    matches!((first(sub), first(sup)), (Some(sub), Some(sup)) if sub < sup)
}

fn layout_command(name: &str, args: &[Node], ctx: StyleContext<'_>) -> LayoutBox {
    let arg = |i: usize, ctx: StyleContext<'_>| match args.get(i) {
        Some(node) => layout(node, ctx),
        None => LayoutBox::empty(),
    };

    match commands::lookup(name).map(|spec| spec.kind) {
        Some(CommandKind::Symbol(glyph)) => LayoutBox::Char(char_box(glyph, ctx)),
        Some(CommandKind::Space(em)) => {
            LayoutBox::Char(CharBox::space(em * ctx.size(), ctx.size()))
        }
        Some(CommandKind::Font(FontChange::Text)) => arg(0, ctx.text()),
        Some(CommandKind::Font(FontChange::Bold)) => arg(0, ctx.bold()),
        Some(CommandKind::Sqrt) => {
            let radicand = OverlineBox::new(arg(0, ctx), ctx.size());
            LayoutBox::Horizontal(HorizontalBox::row(vec![
                LayoutBox::Char(char_box('√', ctx)),
                LayoutBox::Overline(radicand),
            ]))
        }
        Some(CommandKind::Overline) => {
            LayoutBox::Overline(OverlineBox::new(arg(0, ctx), ctx.size()))
        }
        _ => {
            log::debug!("setting \\{name} literally");
            let mut pieces = vec![layout_text(&format!("\\{name}"), ctx.text())];
            pieces.extend(args.iter().map(|node| layout(node, ctx)));
            LayoutBox::Horizontal(HorizontalBox::row(pieces))
        }
    }
}
