use std::collections::{BTreeMap, BTreeSet};

use mathbox_layout::boxes::{GridBox, LayoutBox};
use mathbox_layout::{
    Align, BoxStyle, Geometry, PointerEvent, RenderMode, RenderOptions, StaticInteraction, bounds,
    dispatch_pointer, hit_test, measure, measure_with, render,
};

const EPS: f64 = 1e-9;

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < EPS
}

fn math() -> RenderOptions<'static> {
    RenderOptions {
        mode: RenderMode::Math,
        ..RenderOptions::default()
    }
}

fn grids(layout: &LayoutBox) -> Vec<GridBox> {
    let mut found = Vec::new();
    layout.walk(&mut |b| {
        if let LayoutBox::Grid(grid) = b {
            found.push(grid.clone());
        }
    });
    found
}

fn fill_rects(primitives: &[mathbox_layout::Primitive]) -> Vec<(usize, f64, f64, f64, f64)> {
    primitives
        .iter()
        .filter_map(|p| match (&p.geometry, p.index) {
            (
                Geometry::Rect {
                    x,
                    y,
                    width,
                    height,
                },
                Some(index),
            ) => Some((index, *x, *y, *width, *height)),
            _ => None,
        })
        .collect()
}

#[test]
fn test_measure_is_idempotent() {
    let markup = r"Let $x_i^2 + \frac{a}{b} = \box$ where $\mat{1 & \\ 3 & 4}$";
    assert_eq!(measure(markup, 18.0), measure(markup, 18.0));
}

#[test]
fn test_rows_are_additive() {
    let m = measure(
        r"Area $A = \pi r^2 + \frac{1}{2}\sqrt{b} \le \box$ and $\table{x & y \\ 1 & 2}$",
        16.0,
    );
    let mut rows = 0;
    m.layout.walk(&mut |b| {
        if let LayoutBox::Horizontal(h) = b {
            if h.children.iter().all(|p| p.raise == 0.0) {
                rows += 1;
                let sum: f64 = h.children.iter().map(|p| p.child.width()).sum();
                assert!((h.width - sum).abs() < 1e-6, "{} != {}", h.width, sum);
                let ascent = h
                    .children
                    .iter()
                    .map(|p| p.child.ascent())
                    .fold(0.0, f64::max);
                assert!(close(h.ascent, ascent));
            }
        }
    });
    assert!(rows > 5);
}

#[test]
fn test_mixed_mode_concatenates_segments() {
    let whole = measure("plain $x^2$ more", 16.0).width;
    let parts = measure("plain ", 16.0).width
        + measure_with("x^2", 16.0, RenderMode::Math).width
        + measure(" more", 16.0).width;
    assert!(close(whole, parts), "{whole} != {parts}");
}

#[test]
fn test_unclosed_fraction_still_measures() {
    let m = measure_with(r"\frac{1}{2", 16.0, RenderMode::Math);
    assert!(m.width > 0.0);
    let m = measure(r"$\frac{1}{2", 16.0);
    assert!(m.width > 0.0);
}

#[test]
fn test_blank_indices_follow_source_order() {
    let primitives = render(r"\box + \box", &math());
    let indices: Vec<usize> = fill_rects(&primitives).iter().map(|r| r.0).collect();
    assert_eq!(indices, vec![0, 1]);
}

#[test]
fn test_script_blanks_follow_source_order() {
    let handler = StaticInteraction::new(
        BTreeMap::from([(
            0,
            BoxStyle {
                width_scale: Some(3.0),
                ..BoxStyle::default()
            },
        )]),
        BTreeSet::from([0]),
    );
    let options = RenderOptions {
        mode: RenderMode::Math,
        interaction: Some(&handler),
        ..RenderOptions::default()
    };
    let primitives = render(r"x_{\box}^{\box}", &options);
    let rects = fill_rects(&primitives);
    assert_eq!(rects.iter().map(|r| r.0).collect::<Vec<_>>(), vec![0, 1]);
    // Blank 0 is the subscript: widened, selected and below the superscript.
    let (sub, sup) = (rects[0], rects[1]);
    assert!(close(sub.3, sup.3 * 3.0), "{} vs {}", sub.3, sup.3);
    assert!(sub.2 > sup.2);
    let fills: Vec<Option<&str>> = primitives
        .iter()
        .filter(|p| p.index.is_some())
        .map(|p| p.paint.fill.as_deref())
        .collect();
    assert_eq!(fills, vec![Some(mathbox_layout::style::SELECTED_FILL), Some("#ffffff")]);
}

#[test]
fn test_blank_index_matches_ordinal_in_scripts() {
    let m = measure_with(r"x_{\box}^{\box} + y^{\box}_{\box}", 16.0, RenderMode::Math);
    let mut pairs = Vec::new();
    m.layout.walk(&mut |b| {
        if let LayoutBox::Fill(fill) = b {
            pairs.push((fill.index, fill.ordinal));
        }
    });
    assert_eq!(pairs, vec![(0, 0), (1, 1), (2, 2), (3, 3)]);
}

#[test]
fn test_pathological_nesting_still_renders() {
    let groups = "{".repeat(100_000) + "x";
    assert!(measure_with(&groups, 16.0, RenderMode::Math).width > 0.0);
    let stacked = "x".to_string() + &"^2".repeat(100_000);
    assert!(!render(&stacked, &math()).is_empty());
}

#[test]
fn test_render_indices_do_not_depend_on_earlier_measure() {
    let markup = r"$\box$";
    let _ = measure(markup, 16.0);
    let _ = measure(markup, 16.0);
    let primitives = render(markup, &RenderOptions::default());
    assert_eq!(fill_rects(&primitives)[0].0, 0);
}

#[test]
fn test_ragged_rows_lay_out_like_explicit_blanks() {
    let ragged = measure_with(r"\mat{1 & 2 & 3 \\ 4 & 5}", 16.0, RenderMode::Math);
    let explicit = measure_with(r"\mat{1 & 2 & 3 \\ 4 & 5 & }", 16.0, RenderMode::Math);
    let (ragged, explicit) = (&grids(&ragged.layout)[0], &grids(&explicit.layout)[0]);
    assert_eq!(ragged.cell_count(), 6);
    assert_eq!(ragged.column_widths, explicit.column_widths);
    assert_eq!(ragged.row_heights, explicit.row_heights);
    assert_eq!(ragged.width, explicit.width);
}

#[test]
fn test_alignment_shifts_bounds() {
    let markup = r"$y = \frac{x}{2}$";
    let width = measure(markup, 16.0).width;
    let left_edge = |align| {
        let options = RenderOptions {
            x: 100.0,
            y: 50.0,
            align,
            ..RenderOptions::default()
        };
        bounds(&render(markup, &options)).map(|b| b.min_x).unwrap_or(f64::NAN)
    };
    let start = left_edge(Align::Start);
    assert!((start - left_edge(Align::Middle) - width / 2.0).abs() < 1e-6);
    assert!((start - left_edge(Align::End) - width).abs() < 1e-6);
}

#[test]
fn test_fraction_descends_below_digit() {
    let fraction = measure(r"$\frac{1}{2}x$", 20.0);
    let digit = measure("$2$", 20.0);
    assert!(fraction.descent > digit.descent);
}

#[test]
fn test_two_by_two_matrix_has_equal_columns() {
    let m = measure(r"$\mat{1 & 2 \\ 3 & 4}$", 16.0);
    let grids = grids(&m.layout);
    assert_eq!(grids.len(), 1);
    assert_eq!(grids[0].cell_count(), 4);
    assert_eq!(grids[0].column_widths.len(), 2);
    assert!(close(grids[0].column_widths[0], grids[0].column_widths[1]));
    assert!(grids[0].bracketed);
}

#[test]
fn test_pointer_dispatch_reaches_handler() {
    let handler = StaticInteraction::default();
    let options = RenderOptions {
        mode: RenderMode::Math,
        interaction: Some(&handler),
        ..RenderOptions::default()
    };
    let primitives = render(r"\box + \box", &options);
    let (index, x, y, w, h) = fill_rects(&primitives)[1];
    let event = PointerEvent {
        x: x + w / 2.0,
        y: y + h / 2.0,
    };
    assert_eq!(dispatch_pointer(&primitives, event, &handler), Some(index));
    assert_eq!(handler.clicks(), vec![1]);

    assert_eq!(hit_test(&primitives, -100.0, -100.0), None);
    let miss = PointerEvent { x: -100.0, y: 0.0 };
    assert_eq!(dispatch_pointer(&primitives, miss, &handler), None);
    assert_eq!(handler.clicks(), vec![1]);
}

#[test]
fn test_selected_blank_is_highlighted() {
    let handler = StaticInteraction::new(BTreeMap::new(), BTreeSet::from([1]));
    let options = RenderOptions {
        mode: RenderMode::Math,
        interaction: Some(&handler),
        ..RenderOptions::default()
    };
    let primitives = render(r"\box \box", &options);
    let fills: Vec<Option<&str>> = primitives
        .iter()
        .filter(|p| p.index.is_some())
        .map(|p| p.paint.fill.as_deref())
        .collect();
    assert_eq!(fills, vec![Some("#ffffff"), Some(mathbox_layout::style::SELECTED_FILL)]);
}

#[test]
fn test_per_index_settings_beat_block_overrides() {
    let handler = StaticInteraction::new(
        BTreeMap::from([(
            1,
            BoxStyle {
                width_scale: Some(2.0),
                thickness: Some(3.0),
                ..BoxStyle::default()
            },
        )]),
        BTreeSet::new(),
    );
    let options = RenderOptions {
        mode: RenderMode::Math,
        overrides: BoxStyle {
            thickness: Some(0.5),
            ..BoxStyle::default()
        },
        interaction: Some(&handler),
        ..RenderOptions::default()
    };
    let primitives = render(r"\box \box", &options);
    let rects = fill_rects(&primitives);
    assert!(close(rects[1].3, rects[0].3 * 2.0));

    let strokes: Vec<f64> = primitives
        .iter()
        .filter(|p| p.index.is_some())
        .map(|p| p.paint.stroke_width)
        .collect();
    assert_eq!(strokes, vec![0.5, 3.0]);
}

#[test]
fn test_matrix_blanks_are_underlined() {
    let primitives = render(r"$\mat{1 & \gap}$", &RenderOptions::default());
    let tagged: Vec<&str> = primitives
        .iter()
        .filter(|p| p.index == Some(0))
        .map(|p| match p.geometry {
            Geometry::Rect { .. } => "rect",
            Geometry::Line { .. } => "line",
            _ => "other",
        })
        .collect();
    assert_eq!(tagged, vec!["rect", "line"]);
    // Two bracket paths.
    let paths = primitives
        .iter()
        .filter(|p| matches!(p.geometry, Geometry::Path { .. }))
        .count();
    assert_eq!(paths, 2);
}

#[test]
fn test_debug_outlines_wrap_every_box() {
    let markup = r"$x^2$";
    let plain = render(markup, &RenderOptions::default());
    let debug = render(
        markup,
        &RenderOptions {
            debug: true,
            ..RenderOptions::default()
        },
    );
    let outlines = debug.iter().filter(|p| p.paint.dash.is_some()).count();
    let mut boxes = 0;
    measure(markup, 16.0).layout.walk(&mut |_| boxes += 1);
    assert_eq!(outlines, boxes);
    assert_eq!(debug.len(), plain.len() + boxes);
}

#[test]
fn test_shift_overrides_move_the_blank() {
    let shifted = RenderOptions {
        mode: RenderMode::Math,
        overrides: BoxStyle {
            shift_x: Some(4.0),
            shift_y: Some(2.0),
            ..BoxStyle::default()
        },
        ..RenderOptions::default()
    };
    let base = fill_rects(&render(r"\box", &math()))[0];
    let moved = fill_rects(&render(r"\box", &shifted))[0];
    assert!(close(moved.1 - base.1, 4.0));
    assert!(close(moved.2 - base.2, 2.0));
}
