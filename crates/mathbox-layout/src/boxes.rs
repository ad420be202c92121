//! The measured box tree.
//!
//! A box knows its width and its extent above (`ascent`) and below
//! (`descent`) its baseline, never its absolute position. Constructors here
//! do the geometric composition; [`crate::layout`] decides which one to use
//! and [`crate::render`] places the result.
//!
//! ```text
//!                  ┌───────────┐  ↑
//!                  │    ╷      │  │ ascent
//!  reference point ×──┼──┼─────│──┼── baseline
//!                  │  ╵        │  │ descent
//!                  └───────────┘  ↓
//!                  ←── width ───→
//! ```

use serde::Serialize;

use crate::metrics::{
    AXIS_HEIGHT, BRACKET_PAD, BRACKET_STROKE, BRACKET_WIDTH, FRACTION_GAP, FRACTION_PAD,
    FRACTION_RULE, GRID_COL_GAP, GRID_ROW_GAP, OVERLINE_GAP, OVERLINE_RULE, SCRIPT_MIN_GAP,
    SUB_DROP, SUB_MIN_DROP, SUP_DROP, SUP_MIN_RISE, X_HEIGHT,
};
use crate::style::{DomainDefault, FillShape, ResolvedBoxStyle};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum LayoutBox {
    Char(CharBox),
    Horizontal(HorizontalBox),
    Fraction(FractionBox),
    Grid(GridBox),
    Fill(FillBox),
    Overline(OverlineBox),
}

impl LayoutBox {
    /// A zero-size box.
    pub fn empty() -> Self {
        LayoutBox::Horizontal(HorizontalBox::row(Vec::new()))
    }

    pub fn width(&self) -> f64 {
        match self {
            LayoutBox::Char(b) => b.width,
            LayoutBox::Horizontal(b) => b.width,
            LayoutBox::Fraction(b) => b.width,
            LayoutBox::Grid(b) => b.width,
            LayoutBox::Fill(b) => b.width,
            LayoutBox::Overline(b) => b.width,
        }
    }

    pub fn ascent(&self) -> f64 {
        match self {
            LayoutBox::Char(b) => b.ascent,
            LayoutBox::Horizontal(b) => b.ascent,
            LayoutBox::Fraction(b) => b.ascent,
            LayoutBox::Grid(b) => b.ascent,
            LayoutBox::Fill(b) => b.ascent,
            LayoutBox::Overline(b) => b.ascent,
        }
    }

    pub fn descent(&self) -> f64 {
        match self {
            LayoutBox::Char(b) => b.descent,
            LayoutBox::Horizontal(b) => b.descent,
            LayoutBox::Fraction(b) => b.descent,
            LayoutBox::Grid(b) => b.descent,
            LayoutBox::Fill(b) => b.descent,
            LayoutBox::Overline(b) => b.descent,
        }
    }

    pub fn height(&self) -> f64 {
        self.ascent() + self.descent()
    }

    /// Visits this box and every descendant, parents first.
    pub fn walk<'s>(&'s self, f: &mut impl FnMut(&'s LayoutBox)) {
        f(self);
        match self {
            LayoutBox::Char(_) | LayoutBox::Fill(_) => {}
            LayoutBox::Horizontal(b) => b.children.iter().for_each(|p| p.child.walk(f)),
            LayoutBox::Fraction(b) => {
                b.numerator.walk(f);
                b.denominator.walk(f);
            }
            LayoutBox::Grid(b) => b.rows.iter().flatten().for_each(|c| c.content.walk(f)),
            LayoutBox::Overline(b) => b.child.walk(f),
        }
    }

    /// Indices of the fill boxes in render order.
    pub fn fill_indices(&self) -> Vec<usize> {
        let mut out = Vec::new();
        self.walk(&mut |b| {
            if let LayoutBox::Fill(fill) = b {
                out.push(fill.index);
            }
        });
        out
    }
}

/// One glyph. `left_bearing` is math spacing inside the box's own width.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CharBox {
    pub glyph: char,
    pub font_size: f64,
    pub italic: bool,
    pub bold: bool,
    pub left_bearing: f64,
    pub width: f64,
    pub ascent: f64,
    pub descent: f64,
}

impl CharBox {
    /// Blank horizontal space.
    pub fn space(width: f64, font_size: f64) -> Self {
        Self {
            glyph: ' ',
            font_size,
            italic: false,
            bold: false,
            left_bearing: 0.0,
            width: width.max(0.0),
            ascent: 0.0,
            descent: 0.0,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.glyph.is_whitespace()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Placement {
    pub child: LayoutBox,
    /// Horizontal offset from the parent's reference point.
    pub offset: f64,
    /// Baseline shift upward.
    pub raise: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HorizontalBox {
    pub children: Vec<Placement>,
    pub width: f64,
    pub ascent: f64,
    pub descent: f64,
}

impl HorizontalBox {
    /// Children side by side on a common baseline.
    pub fn row(children: Vec<LayoutBox>) -> Self {
        let mut offset = 0.0;
        let placements = children
            .into_iter()
            .map(|child| {
                let placement = Placement {
                    offset,
                    raise: 0.0,
                    child,
                };
                offset += placement.child.width();
                placement
            })
            .collect();
        Self::placed(placements)
    }

    pub fn placed(children: Vec<Placement>) -> Self {
        let mut width: f64 = 0.0;
        let mut ascent: f64 = 0.0;
        let mut descent: f64 = 0.0;
        for p in &children {
            width = width.max(p.offset + p.child.width());
            ascent = ascent.max(p.child.ascent() + p.raise);
            descent = descent.max(p.child.descent() - p.raise);
        }
        Self {
            children,
            width,
            ascent,
            descent,
        }
    }

    /// A base with a superscript and/or subscript hung off its right edge.
    /// `size` is the base's effective font size. Scripts are placed after the
    /// base in source order; `sub_first` puts the subscript before the
    /// superscript.
    pub fn scripted(
        base: LayoutBox,
        sup: Option<LayoutBox>,
        sub: Option<LayoutBox>,
        sub_first: bool,
        size: f64,
    ) -> Self {
        let x = base.width();
        let mut sup_raise = (base.ascent() - SUP_DROP * size).max(SUP_MIN_RISE * size);
        let mut sub_drop = (base.descent() + SUB_DROP * size).max(SUB_MIN_DROP * size);

        if let (Some(sup), Some(sub)) = (&sup, &sub) {
            let gap = (sup_raise - sup.descent()) - (sub.ascent() - sub_drop);
            let min_gap = SCRIPT_MIN_GAP * size;
            if gap < min_gap {
                // Split the correction so neither script travels too far.
                let deficit = min_gap - gap;
                sup_raise += deficit / 2.0;
                sub_drop += deficit / 2.0;
            }
        }

        let sup = sup.map(|child| Placement {
            child,
            offset: x,
            raise: sup_raise,
        });
        let sub = sub.map(|child| Placement {
            child,
            offset: x,
            raise: -sub_drop,
        });
        let (first, second) = if sub_first { (sub, sup) } else { (sup, sub) };

        let mut children = vec![Placement {
            child: base,
            offset: 0.0,
            raise: 0.0,
        }];
        children.extend(first);
        children.extend(second);
        Self::placed(children)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FractionBox {
    pub numerator: Box<LayoutBox>,
    pub denominator: Box<LayoutBox>,
    pub numerator_x: f64,
    pub denominator_x: f64,
    /// Numerator baseline above the fraction baseline.
    pub numerator_raise: f64,
    /// Denominator baseline below the fraction baseline.
    pub denominator_drop: f64,
    /// Rule center above the baseline.
    pub rule_raise: f64,
    pub rule_thickness: f64,
    pub rule_inset: f64,
    pub width: f64,
    pub ascent: f64,
    pub descent: f64,
}

impl FractionBox {
    /// `size` is the font size of the fraction itself, not of its parts.
    pub fn new(numerator: LayoutBox, denominator: LayoutBox, size: f64) -> Self {
        let thickness = FRACTION_RULE * size;
        let gap = FRACTION_GAP * size;
        let pad = FRACTION_PAD * size;
        let axis = AXIS_HEIGHT * size;

        let inner = numerator.width().max(denominator.width());
        let numerator_raise = axis + thickness / 2.0 + gap + numerator.descent();
        let denominator_drop = gap + thickness / 2.0 - axis + denominator.ascent();

        Self {
            numerator_x: pad + (inner - numerator.width()) / 2.0,
            denominator_x: pad + (inner - denominator.width()) / 2.0,
            ascent: (numerator_raise + numerator.ascent()).max(0.0),
            descent: (denominator_drop + denominator.descent()).max(0.0),
            width: inner + 2.0 * pad,
            numerator_raise,
            denominator_drop,
            rule_raise: axis,
            rule_thickness: thickness,
            rule_inset: pad / 2.0,
            numerator: Box::new(numerator),
            denominator: Box::new(denominator),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridCell {
    pub content: LayoutBox,
    pub x: f64,
    /// Cell baseline below the grid's top edge.
    pub baseline: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridBox {
    pub rows: Vec<Vec<GridCell>>,
    pub column_widths: Vec<f64>,
    pub row_heights: Vec<f64>,
    pub bracketed: bool,
    /// Horizontal room of one bracket, excluding its padding.
    pub bracket_width: f64,
    pub bracket_stroke: f64,
    pub width: f64,
    pub ascent: f64,
    pub descent: f64,
}

impl GridBox {
    pub fn new(cells: Vec<Vec<LayoutBox>>, bracketed: bool, size: f64) -> Self {
        let columns = cells.iter().map(Vec::len).max().unwrap_or(0);
        let mut column_widths = vec![0.0_f64; columns];
        let mut row_heights = Vec::with_capacity(cells.len());
        for row in &cells {
            let mut height: f64 = 0.0;
            for (j, cell) in row.iter().enumerate() {
                column_widths[j] = column_widths[j].max(cell.width());
                height = height.max(cell.height());
            }
            row_heights.push(height);
        }

        let col_gap = GRID_COL_GAP * size;
        let row_gap = GRID_ROW_GAP * size;
        let (bracket_width, side, overshoot) = if bracketed {
            let width = BRACKET_WIDTH * size;
            (width, width + BRACKET_PAD * size, BRACKET_PAD * size)
        } else {
            (0.0, 0.0, 0.0)
        };

        let gaps = |n: usize, gap: f64| if n > 1 { gap * (n - 1) as f64 } else { 0.0 };
        let content_width = column_widths.iter().sum::<f64>() + gaps(columns, col_gap);
        let content_height = row_heights.iter().sum::<f64>() + gaps(row_heights.len(), row_gap);

        let mut rows = Vec::with_capacity(cells.len());
        let mut row_top = overshoot;
        for (i, row) in cells.into_iter().enumerate() {
            let row_height = row_heights[i];
            let mut column_left = side;
            let mut placed = Vec::with_capacity(row.len());
            for (j, content) in row.into_iter().enumerate() {
                let x = column_left + (column_widths[j] - content.width()) / 2.0;
                let baseline = row_top + (row_height - content.height()) / 2.0 + content.ascent();
                column_left += column_widths[j] + col_gap;
                placed.push(GridCell {
                    content,
                    x,
                    baseline,
                });
            }
            rows.push(placed);
            row_top += row_height + row_gap;
        }

        let half = content_height / 2.0 + overshoot;
        let axis = AXIS_HEIGHT * size;
        Self {
            rows,
            column_widths,
            row_heights,
            bracketed,
            bracket_width,
            bracket_stroke: BRACKET_STROKE * size,
            width: content_width + 2.0 * side,
            ascent: (half + axis).max(0.0),
            descent: (half - axis).max(0.0),
        }
    }

    pub fn cell_count(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }
}

/// A blank, fill-in box.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FillBox {
    /// Interactive index from the layout counter.
    pub index: usize,
    /// Ordinal assigned by the parser.
    pub ordinal: usize,
    pub shape: FillShape,
    pub fill: Option<&'static str>,
    pub style: ResolvedBoxStyle,
    pub rect_width: f64,
    pub rect_height: f64,
    /// Rectangle center above the baseline.
    pub center_raise: f64,
    pub width: f64,
    pub ascent: f64,
    pub descent: f64,
}

impl FillBox {
    pub fn new(
        index: usize,
        ordinal: usize,
        style: ResolvedBoxStyle,
        default: &DomainDefault,
        size: f64,
    ) -> Self {
        let x_height = X_HEIGHT * size;
        let rect_width = (default.width_ratio * style.width_scale * x_height).max(0.0);
        let rect_height = (default.height_ratio * style.height_scale * x_height).max(0.0);
        let center_raise = default.center_ratio * x_height - style.shift_y;
        Self {
            index,
            ordinal,
            shape: default.shape,
            fill: default.fill,
            width: (style.padding_left + rect_width + style.padding_right).max(0.0),
            ascent: (center_raise + rect_height / 2.0).max(0.0),
            descent: (rect_height / 2.0 - center_raise).max(0.0),
            style,
            rect_width,
            rect_height,
            center_raise,
        }
    }
}

/// A box with a rule above it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlineBox {
    pub child: Box<LayoutBox>,
    pub gap: f64,
    pub thickness: f64,
    pub width: f64,
    pub ascent: f64,
    pub descent: f64,
}

impl OverlineBox {
    pub fn new(child: LayoutBox, size: f64) -> Self {
        let gap = OVERLINE_GAP * size;
        let thickness = OVERLINE_RULE * size;
        Self {
            gap,
            thickness,
            width: child.width(),
            ascent: child.ascent() + gap + thickness,
            descent: child.descent(),
            child: Box::new(child),
        }
    }
}
