//! Places a measured box tree and emits a flat list of drawing primitives.
//!
//! Coordinates are canvas-style: `x` grows right, `y` grows down, and the `y`
//! passed to [`LayoutBox::render`] is the baseline.

use serde::{Deserialize, Serialize};

use crate::boxes::{
    CharBox, FillBox, FractionBox, GridBox, HorizontalBox, LayoutBox, OverlineBox,
};
use crate::style::{BoxInteraction, FillShape, PointerEvent, SELECTED_FILL, StyleContext};

const DEBUG_STROKE: &str = "#e0457b";
const DEBUG_DASH: [f64; 2] = [2.0, 2.0];

/// Horizontal anchor of the rendered block relative to the requested `x`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Align {
    #[default]
    Start,
    Middle,
    End,
}

impl Align {
    /// Offset to add to the anchor `x` for a block of `width`.
    pub fn shift(self, width: f64) -> f64 {
        match self {
            Align::Start => 0.0,
            Align::Middle => -width / 2.0,
            Align::End => -width,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Paint {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    pub stroke_width: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dash: Option<[f64; 2]>,
    pub opacity: f64,
}

impl Paint {
    pub fn fill(color: &str) -> Self {
        Self {
            fill: Some(color.to_string()),
            stroke: None,
            stroke_width: 0.0,
            dash: None,
            opacity: 1.0,
        }
    }

    pub fn stroke(color: &str, width: f64) -> Self {
        Self {
            fill: None,
            stroke: Some(color.to_string()),
            stroke_width: width,
            dash: None,
            opacity: 1.0,
        }
    }

    /// Neither filled nor stroked; still hit-testable.
    pub fn none() -> Self {
        Self {
            fill: None,
            stroke: None,
            stroke_width: 0.0,
            dash: None,
            opacity: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum PathSegment {
    MoveTo { x: f64, y: f64 },
    LineTo { x: f64, y: f64 },
}

impl PathSegment {
    fn point(&self) -> (f64, f64) {
        match *self {
            PathSegment::MoveTo { x, y } | PathSegment::LineTo { x, y } => (x, y),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Geometry {
    /// A glyph run; `y` is its baseline.
    #[serde(rename_all = "camelCase")]
    GlyphRun {
        x: f64,
        y: f64,
        text: String,
        font_size: f64,
        width: f64,
        ascent: f64,
        descent: f64,
        italic: bool,
        bold: bool,
    },
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
    },
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    Path {
        segments: Vec<PathSegment>,
    },
}

/// One drawing instruction. `index` is set on the primitives of a blank box
/// and carries its render-pass index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Primitive {
    #[serde(flatten)]
    pub geometry: Geometry,
    pub paint: Paint,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
}

impl Primitive {
    pub fn new(geometry: Geometry, paint: Paint) -> Self {
        Self {
            geometry,
            paint,
            index: None,
        }
    }

    fn indexed(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    pub fn bounds(&self) -> Bounds {
        let mut bounds = Bounds::new();
        match &self.geometry {
            Geometry::GlyphRun {
                x,
                y,
                width,
                ascent,
                descent,
                ..
            } => {
                bounds.expand(*x, y - ascent);
                bounds.expand(x + width, y + descent);
            }
            Geometry::Line { x1, y1, x2, y2 } => {
                bounds.expand(*x1, *y1);
                bounds.expand(*x2, *y2);
            }
            Geometry::Rect {
                x,
                y,
                width,
                height,
            } => {
                bounds.expand(*x, *y);
                bounds.expand(x + width, y + height);
            }
            Geometry::Path { segments } => {
                for segment in segments {
                    let (x, y) = segment.point();
                    bounds.expand(x, y);
                }
            }
        }
        bounds
    }
}

/// Axis-aligned bounding box. Starts inverted so the first point sets it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Default for Bounds {
    fn default() -> Self {
        Self::new()
    }
}

impl Bounds {
    pub fn new() -> Self {
        Self {
            min_x: f64::MAX,
            min_y: f64::MAX,
            max_x: f64::MIN,
            max_y: f64::MIN,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    pub fn expand(&mut self, x: f64, y: f64) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    pub fn union(mut self, other: Bounds) -> Bounds {
        if !other.is_empty() {
            self.expand(other.min_x, other.min_y);
            self.expand(other.max_x, other.max_y);
        }
        self
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        (self.min_x..=self.max_x).contains(&x) && (self.min_y..=self.max_y).contains(&y)
    }

    pub fn width(&self) -> f64 {
        if self.is_empty() { 0.0 } else { self.max_x - self.min_x }
    }

    pub fn height(&self) -> f64 {
        if self.is_empty() { 0.0 } else { self.max_y - self.min_y }
    }
}

/// Union of the bounds of `primitives`; `None` when there are none.
pub fn bounds(primitives: &[Primitive]) -> Option<Bounds> {
    let total = primitives
        .iter()
        .map(Primitive::bounds)
        .fold(Bounds::new(), Bounds::union);
    (!total.is_empty()).then_some(total)
}

/// The index of the topmost blank whose hit area contains the point.
pub fn hit_test(primitives: &[Primitive], x: f64, y: f64) -> Option<usize> {
    primitives.iter().rev().find_map(|primitive| match primitive {
        Primitive {
            geometry: Geometry::Rect { .. },
            index: Some(index),
            ..
        } if primitive.bounds().contains(x, y) => Some(*index),
        _ => None,
    })
}

/// Hit-tests `event` and forwards a hit to `handler`. Returns the index hit.
pub fn dispatch_pointer(
    primitives: &[Primitive],
    event: PointerEvent,
    handler: &dyn BoxInteraction,
) -> Option<usize> {
    let index = hit_test(primitives, event.x, event.y)?;
    log::debug!("pointer at ({}, {}) hit box {index}", event.x, event.y);
    handler.on_box_click(index, &event);
    Some(index)
}

impl LayoutBox {
    /// Emits primitives for this box with its reference point at `(x, y)`.
    pub fn render(&self, x: f64, y: f64, ctx: &StyleContext<'_>, out: &mut Vec<Primitive>) {
        if ctx.debug {
            out.push(outline(x, y - self.ascent(), self.width(), self.height()));
        }
        match self {
            LayoutBox::Char(b) => render_char(b, x, y, ctx, out),
            LayoutBox::Horizontal(b) => render_horizontal(b, x, y, ctx, out),
            LayoutBox::Fraction(b) => render_fraction(b, x, y, ctx, out),
            LayoutBox::Grid(b) => render_grid(b, x, y, ctx, out),
            LayoutBox::Fill(b) => render_fill(b, x, y, ctx, out),
            LayoutBox::Overline(b) => render_overline(b, x, y, ctx, out),
        }
    }
}

fn outline(x: f64, y: f64, width: f64, height: f64) -> Primitive {
    let mut paint = Paint::stroke(DEBUG_STROKE, 0.5);
    paint.dash = Some(DEBUG_DASH);
    paint.opacity = 0.6;
    Primitive::new(
        Geometry::Rect {
            x,
            y,
            width,
            height,
        },
        paint,
    )
}

fn render_char(b: &CharBox, x: f64, y: f64, ctx: &StyleContext<'_>, out: &mut Vec<Primitive>) {
    if b.is_blank() {
        return;
    }
    out.push(Primitive::new(
        Geometry::GlyphRun {
            x: x + b.left_bearing,
            y,
            text: b.glyph.to_string(),
            font_size: b.font_size,
            width: b.width - b.left_bearing,
            ascent: b.ascent,
            descent: b.descent,
            italic: b.italic,
            bold: b.bold,
        },
        Paint::fill(ctx.color),
    ));
}

fn render_horizontal(
    b: &HorizontalBox,
    x: f64,
    y: f64,
    ctx: &StyleContext<'_>,
    out: &mut Vec<Primitive>,
) {
    for placement in &b.children {
        placement
            .child
            .render(x + placement.offset, y - placement.raise, ctx, out);
    }
}

fn render_fraction(
    b: &FractionBox,
    x: f64,
    y: f64,
    ctx: &StyleContext<'_>,
    out: &mut Vec<Primitive>,
) {
    b.numerator
        .render(x + b.numerator_x, y - b.numerator_raise, ctx, out);
    b.denominator
        .render(x + b.denominator_x, y + b.denominator_drop, ctx, out);
    let rule_y = y - b.rule_raise;
    out.push(Primitive::new(
        Geometry::Line {
            x1: x + b.rule_inset,
            y1: rule_y,
            x2: x + b.width - b.rule_inset,
            y2: rule_y,
        },
        Paint::stroke(ctx.color, b.rule_thickness),
    ));
}

fn render_grid(b: &GridBox, x: f64, y: f64, ctx: &StyleContext<'_>, out: &mut Vec<Primitive>) {
    let top = y - b.ascent;
    for row in &b.rows {
        for cell in row {
            cell.content.render(x + cell.x, top + cell.baseline, ctx, out);
        }
    }
    if !b.bracketed {
        return;
    }

    let bottom = y + b.descent;
    let stroke = b.bracket_stroke / 2.0;
    let (left, right) = (x + stroke, x + b.width - stroke);
    let arm = b.bracket_width - stroke;
    for (edge, tip) in [(left, left + arm), (right, right - arm)] {
        out.push(Primitive::new(
            Geometry::Path {
                segments: vec![
                    PathSegment::MoveTo { x: tip, y: top },
                    PathSegment::LineTo { x: edge, y: top },
                    PathSegment::LineTo { x: edge, y: bottom },
                    PathSegment::LineTo { x: tip, y: bottom },
                ],
            },
            Paint::stroke(ctx.color, b.bracket_stroke),
        ));
    }
}

fn render_fill(b: &FillBox, x: f64, y: f64, ctx: &StyleContext<'_>, out: &mut Vec<Primitive>) {
    let index = ctx.render_counter.next();
    let selected = ctx
        .interaction
        .is_some_and(|handler| handler.is_box_selected(index));

    let rect_x = x + b.style.padding_left + b.style.shift_x;
    let rect_y = y - b.center_raise - b.rect_height / 2.0;
    let rect = Geometry::Rect {
        x: rect_x,
        y: rect_y,
        width: b.rect_width,
        height: b.rect_height,
    };

    match b.shape {
        FillShape::Rect => {
            let mut paint = Paint::stroke(ctx.color, b.style.thickness);
            paint.fill = match (selected, b.fill) {
                (true, _) => Some(SELECTED_FILL.to_string()),
                (false, fill) => fill.map(str::to_string),
            };
            out.push(Primitive::new(rect, paint).indexed(index));
        }
        FillShape::Underline => {
            let paint = if selected {
                Paint::fill(SELECTED_FILL)
            } else {
                Paint::none()
            };
            out.push(Primitive::new(rect, paint).indexed(index));
            let line_y = rect_y + b.rect_height;
            out.push(
                Primitive::new(
                    Geometry::Line {
                        x1: rect_x,
                        y1: line_y,
                        x2: rect_x + b.rect_width,
                        y2: line_y,
                    },
                    Paint::stroke(ctx.color, b.style.thickness),
                )
                .indexed(index),
            );
        }
    }
}

fn render_overline(
    b: &OverlineBox,
    x: f64,
    y: f64,
    ctx: &StyleContext<'_>,
    out: &mut Vec<Primitive>,
) {
    b.child.render(x, y, ctx, out);
    let rule_y = y - b.child.ascent() - b.gap - b.thickness / 2.0;
    out.push(Primitive::new(
        Geometry::Line {
            x1: x,
            y1: rule_y,
            x2: x + b.width,
            y2: rule_y,
        },
        Paint::stroke(ctx.color, b.thickness),
    ));
}
