//! Per-call style context, blank-box style overrides and their resolution.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::metrics::{self, X_HEIGHT};

/// Optional geometry for a blank box. Every field left `None` falls through
/// to the next, lower-precedence source.
///
/// Scales multiply the domain default's ratios; `thickness`, paddings and
/// shifts are absolute lengths in output units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BoxStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width_scale: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height_scale: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thickness: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub padding_left: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub padding_right: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shift_x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shift_y: Option<f64>,
}

impl BoxStyle {
    /// Field-wise merge: values set on `self` win over `fallback`.
    pub fn or(self, fallback: BoxStyle) -> BoxStyle {
        BoxStyle {
            width_scale: self.width_scale.or(fallback.width_scale),
            height_scale: self.height_scale.or(fallback.height_scale),
            thickness: self.thickness.or(fallback.thickness),
            padding_left: self.padding_left.or(fallback.padding_left),
            padding_right: self.padding_right.or(fallback.padding_right),
            shift_x: self.shift_x.or(fallback.shift_x),
            shift_y: self.shift_y.or(fallback.shift_y),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == BoxStyle::default()
    }

    /// Fills every remaining gap from the domain default at `font_size`.
    pub fn resolve(self, default: &DomainDefault, font_size: f64) -> ResolvedBoxStyle {
        let x_height = X_HEIGHT * font_size;
        let padding = default.padding_ratio * x_height;
        ResolvedBoxStyle {
            width_scale: self.width_scale.unwrap_or(1.0),
            height_scale: self.height_scale.unwrap_or(1.0),
            thickness: self.thickness.unwrap_or(default.thickness),
            padding_left: self.padding_left.unwrap_or(padding),
            padding_right: self.padding_right.unwrap_or(padding),
            shift_x: self.shift_x.unwrap_or(0.0),
            shift_y: self.shift_y.unwrap_or(0.0),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum StyleParseError {
    #[error("expected `key=value`, found `{0}`")]
    MissingValue(String),
    #[error("unknown box style key `{0}`")]
    UnknownKey(String),
    #[error("invalid number `{value}` for `{key}`")]
    InvalidNumber { key: String, value: String },
}

/// Parses `widthScale=1.5, thickness=2` (`,` or `;` separated). Keys are
/// accepted in camelCase, snake_case or kebab-case.
impl FromStr for BoxStyle {
    type Err = StyleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut style = BoxStyle::default();
        for pair in s.split([',', ';']).map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| StyleParseError::MissingValue(pair.to_string()))?;
            let key = key.trim();
            let value = value.trim();
            let number: f64 = value.parse().map_err(|_| StyleParseError::InvalidNumber {
                key: key.to_string(),
                value: value.to_string(),
            })?;
            let normalized: String = key
                .chars()
                .filter(|c| *c != '_' && *c != '-')
                .map(|c| c.to_ascii_lowercase())
                .collect();
            let slot = match normalized.as_str() {
                "widthscale" => &mut style.width_scale,
                "heightscale" => &mut style.height_scale,
                "thickness" => &mut style.thickness,
                "paddingleft" => &mut style.padding_left,
                "paddingright" => &mut style.padding_right,
                "shiftx" => &mut style.shift_x,
                "shifty" => &mut style.shift_y,
                _ => return Err(StyleParseError::UnknownKey(key.to_string())),
            };
            *slot = Some(number);
        }
        Ok(style)
    }
}

/// A fully resolved blank-box style, all lengths in output units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedBoxStyle {
    pub width_scale: f64,
    pub height_scale: f64,
    pub thickness: f64,
    pub padding_left: f64,
    pub padding_right: f64,
    pub shift_x: f64,
    pub shift_y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FillShape {
    Rect,
    Underline,
}

/// Built-in blank-box geometry for one usage context. Ratios are relative
/// to the x-height at the current font size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DomainDefault {
    pub width_ratio: f64,
    pub height_ratio: f64,
    pub thickness: f64,
    pub fill: Option<&'static str>,
    pub padding_ratio: f64,
    /// Height of the box center above the baseline.
    pub center_ratio: f64,
    pub shape: FillShape,
}

/// Blank inside an equation.
pub const INLINE_BLANK: DomainDefault = DomainDefault {
    width_ratio: 2.2,
    height_ratio: 2.0,
    thickness: 1.2,
    fill: Some("#ffffff"),
    padding_ratio: 0.15,
    center_ratio: AXIS_OVER_X_HEIGHT,
    shape: FillShape::Rect,
};

/// Blank matrix or table cell.
pub const CELL_BLANK: DomainDefault = DomainDefault {
    width_ratio: 2.6,
    height_ratio: 2.2,
    thickness: 1.0,
    fill: None,
    padding_ratio: 0.1,
    center_ratio: AXIS_OVER_X_HEIGHT,
    shape: FillShape::Underline,
};

const AXIS_OVER_X_HEIGHT: f64 = metrics::AXIS_HEIGHT / X_HEIGHT;

pub const SELECTED_FILL: &str = "#cfe3ff";

/// A pointer event forwarded to [`BoxInteraction::on_box_click`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub x: f64,
    pub y: f64,
}

/// Caller-side hooks for interactive blanks, addressed by index.
pub trait BoxInteraction {
    fn on_box_click(&self, index: usize, event: &PointerEvent) {
        let _ = (index, event);
    }

    fn is_box_selected(&self, _index: usize) -> bool {
        false
    }

    /// Per-index style override; the highest-precedence source.
    fn box_settings(&self, _index: usize) -> Option<BoxStyle> {
        None
    }
}

/// Map-backed [`BoxInteraction`] that records clicks.
#[derive(Debug, Default)]
pub struct StaticInteraction {
    pub settings: BTreeMap<usize, BoxStyle>,
    pub selected: BTreeSet<usize>,
    clicks: RefCell<Vec<usize>>,
}

impl StaticInteraction {
    pub fn new(settings: BTreeMap<usize, BoxStyle>, selected: BTreeSet<usize>) -> Self {
        Self {
            settings,
            selected,
            clicks: RefCell::new(Vec::new()),
        }
    }

    pub fn clicks(&self) -> Vec<usize> {
        self.clicks.borrow().clone()
    }
}

impl BoxInteraction for StaticInteraction {
    fn on_box_click(&self, index: usize, _event: &PointerEvent) {
        self.clicks.borrow_mut().push(index);
    }

    fn is_box_selected(&self, index: usize) -> bool {
        self.selected.contains(&index)
    }

    fn box_settings(&self, index: usize) -> Option<BoxStyle> {
        self.settings.get(&index).copied()
    }
}

/// Monotonic index source shared by reference across one layout or render
/// pass.
#[derive(Debug, Default)]
pub struct IndexCounter(Cell<usize>);

impl IndexCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self) -> usize {
        let value = self.0.get();
        self.0.set(value + 1);
        value
    }

    pub fn peek(&self) -> usize {
        self.0.get()
    }
}

/// The two counters of one public call. Created fresh at the top of every
/// `measure` and `render`.
#[derive(Debug, Default)]
pub struct CallCounters {
    pub layout: IndexCounter,
    pub render: IndexCounter,
}

/// Style parameters threaded through layout and render. Copied into every
/// child except the counters, which are shared.
#[derive(Clone, Copy)]
pub struct StyleContext<'a> {
    pub font_size: f64,
    pub is_math: bool,
    pub is_bold: bool,
    pub color: &'a str,
    pub depth: u32,
    pub debug: bool,
    /// Laying out inside a grid cell.
    pub in_cell: bool,
    /// Block-level override, below per-index settings.
    pub box_options: BoxStyle,
    pub interaction: Option<&'a dyn BoxInteraction>,
    pub layout_counter: &'a IndexCounter,
    pub render_counter: &'a IndexCounter,
}

impl<'a> StyleContext<'a> {
    pub fn new(font_size: f64, color: &'a str, counters: &'a CallCounters) -> Self {
        Self {
            font_size,
            is_math: true,
            is_bold: false,
            color,
            depth: 0,
            debug: false,
            in_cell: false,
            box_options: BoxStyle::default(),
            interaction: None,
            layout_counter: &counters.layout,
            render_counter: &counters.render,
        }
    }

    /// Effective font size at the current depth.
    pub fn size(&self) -> f64 {
        metrics::scaled_size(self.font_size, self.depth)
    }

    pub fn deeper(self) -> Self {
        Self {
            depth: self.depth + 1,
            ..self
        }
    }

    pub fn text(self) -> Self {
        Self {
            is_math: false,
            ..self
        }
    }

    pub fn bold(self) -> Self {
        Self {
            is_bold: true,
            ..self
        }
    }

    pub fn cell(self) -> Self {
        Self {
            in_cell: true,
            ..self
        }
    }

    pub fn domain_default(&self) -> &'static DomainDefault {
        if self.in_cell { &CELL_BLANK } else { &INLINE_BLANK }
    }

    /// Per-index override → block override → domain default.
    pub fn resolve_box_style(&self, index: usize) -> ResolvedBoxStyle {
        let per_index = self
            .interaction
            .and_then(|handler| handler.box_settings(index))
            .unwrap_or_default();
        per_index
            .or(self.box_options)
            .resolve(self.domain_default(), self.size())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_prefers_left() {
        let high = BoxStyle {
            width_scale: Some(2.0),
            ..BoxStyle::default()
        };
        let low = BoxStyle {
            width_scale: Some(3.0),
            thickness: Some(4.0),
            ..BoxStyle::default()
        };
        let merged = high.or(low);
        assert_eq!(merged.width_scale, Some(2.0));
        assert_eq!(merged.thickness, Some(4.0));
        assert_eq!(merged.shift_x, None);
    }

    #[test]
    fn test_resolve_falls_through_to_default() {
        let resolved = BoxStyle::default().resolve(&INLINE_BLANK, 20.0);
        assert_eq!(resolved.width_scale, 1.0);
        assert_eq!(resolved.thickness, INLINE_BLANK.thickness);
        assert!((resolved.padding_left - 0.15 * X_HEIGHT * 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_precedence_chain() {
        let counters = CallCounters::default();
        let handler = StaticInteraction::new(
            BTreeMap::from([(
                1,
                BoxStyle {
                    thickness: Some(5.0),
                    ..BoxStyle::default()
                },
            )]),
            BTreeSet::new(),
        );
        let mut ctx = StyleContext::new(20.0, "black", &counters);
        ctx.box_options = BoxStyle {
            thickness: Some(3.0),
            width_scale: Some(2.0),
            ..BoxStyle::default()
        };
        ctx.interaction = Some(&handler);

        let first = ctx.resolve_box_style(0);
        assert_eq!(first.thickness, 3.0);
        assert_eq!(first.width_scale, 2.0);

        let second = ctx.resolve_box_style(1);
        assert_eq!(second.thickness, 5.0);
        assert_eq!(second.width_scale, 2.0);
    }

    #[test]
    fn test_cell_context_uses_cell_default() {
        let counters = CallCounters::default();
        let ctx = StyleContext::new(16.0, "black", &counters);
        assert_eq!(ctx.domain_default(), &INLINE_BLANK);
        assert_eq!(ctx.cell().domain_default(), &CELL_BLANK);
    }

    #[test]
    fn test_counter_is_shared_between_copies() {
        let counters = CallCounters::default();
        let ctx = StyleContext::new(16.0, "black", &counters);
        let child = ctx.deeper().text();
        assert_eq!(ctx.layout_counter.next(), 0);
        assert_eq!(child.layout_counter.next(), 1);
        assert_eq!(ctx.render_counter.peek(), 0);
    }

    #[test]
    fn test_parse_box_style() {
        let style: BoxStyle = "widthScale=1.5; thickness = 2, shift_y=-3".parse().unwrap();
        assert_eq!(style.width_scale, Some(1.5));
        assert_eq!(style.thickness, Some(2.0));
        assert_eq!(style.shift_y, Some(-3.0));
        assert_eq!(style.padding_left, None);
        assert!("".parse::<BoxStyle>().unwrap().is_empty());
    }

    #[test]
    fn test_parse_box_style_errors() {
        assert_eq!(
            "width".parse::<BoxStyle>(),
            Err(StyleParseError::MissingValue("width".into()))
        );
        assert_eq!(
            "depth=1".parse::<BoxStyle>(),
            Err(StyleParseError::UnknownKey("depth".into()))
        );
        assert!(matches!(
            "thickness=wide".parse::<BoxStyle>(),
            Err(StyleParseError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn test_box_style_json_is_camel_case() {
        let style: BoxStyle = serde_json::from_str(r#"{"paddingLeft": 4}"#).unwrap();
        assert_eq!(style.padding_left, Some(4.0));
        assert_eq!(
            serde_json::to_string(&style).unwrap(),
            r#"{"paddingLeft":4.0}"#
        );
    }
}
