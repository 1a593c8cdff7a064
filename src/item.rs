//! Item model: stamps, lines and text blocks placed on the topo.
//!
//! Every item carries a stable [`ItemId`], a shared [`Style`], a pending drag
//! offset and a variant-specific [`Shape`]. Items are read and written through
//! [`ItemParams`], a sparse parameter set using the short keys of the saved
//! document format. Actions carry `ItemParams` so that any edit can be
//! replayed or reversed field by field.

#[cfg(test)]
#[path = "item_test.rs"]
mod item_test;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::camera::Point;
use crate::config::{Defaults, is_valid_color};
use crate::consts::{
    ESTIMATED_GLYPH_RATIO, HIT_SLOP, OUTLINE_HIT_SLOP, TEXT_FONT_SIZE, TEXT_LINE_SPACING,
    TEXT_MAX_WIDTH, TEXT_PADDING,
};
use crate::geom::{self, Bounds};

/// Unique identifier for an item.
pub type ItemId = Uuid;

/// Type discriminator stored under `it`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Anchor,
    Piton,
    Rappel,
    Belay,
    Line,
    Text,
}

impl ItemType {
    /// The stamp kind for stamp types, `None` for lines and text.
    #[must_use]
    pub fn stamp_kind(self) -> Option<StampKind> {
        match self {
            Self::Anchor => Some(StampKind::Anchor),
            Self::Piton => Some(StampKind::Piton),
            Self::Rappel => Some(StampKind::Rappel),
            Self::Belay => Some(StampKind::Belay),
            Self::Line | Self::Text => None,
        }
    }
}

/// The four stamp symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StampKind {
    /// Bolted anchor: a circle crossed by both diagonals.
    Anchor,
    /// Piton: an L-shaped blade with a rounded eye.
    Piton,
    /// Rappel station: a ring with a downward arrow.
    Rappel,
    /// Belay station: a ring with an optional label inside.
    Belay,
}

impl StampKind {
    /// Width and height used when none is given.
    #[must_use]
    pub fn default_size(self) -> (f64, f64) {
        match self {
            Self::Anchor => (10.0, 10.0),
            Self::Piton => (12.0, 12.0),
            Self::Rappel | Self::Belay => (20.0, 20.0),
        }
    }

    /// Whether the stamp shows its label text.
    #[must_use]
    pub fn has_label(self) -> bool {
        matches!(self, Self::Belay)
    }

    #[must_use]
    pub fn item_type(self) -> ItemType {
        match self {
            Self::Anchor => ItemType::Anchor,
            Self::Piton => ItemType::Piton,
            Self::Rappel => ItemType::Rappel,
            Self::Belay => ItemType::Belay,
        }
    }
}

/// Horizontal alignment of a text block relative to its anchor point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TextAlign {
    #[default]
    #[serde(rename = "l")]
    Left,
    #[serde(rename = "c")]
    Center,
    #[serde(rename = "r")]
    Right,
}

/// Sparse item parameters. Only present fields are read or applied.
///
/// Serializes with the short keys of the saved document format. The id never
/// appears in serialized output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemParams {
    #[serde(skip)]
    pub id: Option<ItemId>,
    #[serde(rename = "it", skip_serializing_if = "Option::is_none")]
    pub item_type: Option<ItemType>,
    #[serde(rename = "ic", skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(rename = "is", skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
    #[serde(rename = "ia", skip_serializing_if = "Option::is_none")]
    pub alpha: Option<f64>,
    #[serde(rename = "iw", skip_serializing_if = "Option::is_none")]
    pub line_width: Option<f64>,
    #[serde(rename = "ix", skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(rename = "iy", skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(rename = "sw", skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(rename = "sh", skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(rename = "st", skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(rename = "lp", skip_serializing_if = "Option::is_none")]
    pub control_points: Option<Vec<Point>>,
    #[serde(rename = "lon", skip_serializing_if = "Option::is_none")]
    pub on_length: Option<f64>,
    #[serde(rename = "lof", skip_serializing_if = "Option::is_none")]
    pub off_length: Option<f64>,
    #[serde(rename = "lc", skip_serializing_if = "Option::is_none")]
    pub curved: Option<bool>,
    #[serde(rename = "tt", skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(rename = "ta", skip_serializing_if = "Option::is_none")]
    pub align: Option<TextAlign>,
    #[serde(rename = "tbg", skip_serializing_if = "Option::is_none")]
    pub background: Option<bool>,
}

impl ItemParams {
    /// Whether no field is present (the id is not a field).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.item_type.is_none()
            && self.color.is_none()
            && self.scale.is_none()
            && self.alpha.is_none()
            && self.line_width.is_none()
            && self.x.is_none()
            && self.y.is_none()
            && self.width.is_none()
            && self.height.is_none()
            && self.label.is_none()
            && self.control_points.is_none()
            && self.on_length.is_none()
            && self.off_length.is_none()
            && self.curved.is_none()
            && self.text.is_none()
            && self.align.is_none()
            && self.background.is_none()
    }

    /// Copy of `self` keeping only the fields that are present in `mask`.
    #[must_use]
    pub fn masked_by(&self, mask: &ItemParams) -> ItemParams {
        fn keep<T: Clone>(value: &Option<T>, present: bool) -> Option<T> {
            if present { value.clone() } else { None }
        }
        ItemParams {
            id: self.id,
            item_type: keep(&self.item_type, mask.item_type.is_some()),
            color: keep(&self.color, mask.color.is_some()),
            scale: keep(&self.scale, mask.scale.is_some()),
            alpha: keep(&self.alpha, mask.alpha.is_some()),
            line_width: keep(&self.line_width, mask.line_width.is_some()),
            x: keep(&self.x, mask.x.is_some()),
            y: keep(&self.y, mask.y.is_some()),
            width: keep(&self.width, mask.width.is_some()),
            height: keep(&self.height, mask.height.is_some()),
            label: keep(&self.label, mask.label.is_some()),
            control_points: keep(&self.control_points, mask.control_points.is_some()),
            on_length: keep(&self.on_length, mask.on_length.is_some()),
            off_length: keep(&self.off_length, mask.off_length.is_some()),
            curved: keep(&self.curved, mask.curved.is_some()),
            text: keep(&self.text, mask.text.is_some()),
            align: keep(&self.align, mask.align.is_some()),
            background: keep(&self.background, mask.background.is_some()),
        }
    }
}

/// Properties shared by every item.
#[derive(Debug, Clone, PartialEq)]
pub struct Style {
    pub scale: f64,
    pub color: String,
    pub alpha: f64,
    pub line_width: f64,
}

/// A placed symbol, centered on `position`.
#[derive(Debug, Clone, PartialEq)]
pub struct Stamp {
    pub kind: StampKind,
    pub position: Point,
    pub width: f64,
    pub height: f64,
    pub label: String,
}

impl Stamp {
    fn hit_test(&self, p: Point, style: &Style) -> bool {
        let scale = style.scale;
        let w = self.width * scale;
        let h = self.height * scale;
        let c = self.position;

        match self.kind {
            StampKind::Anchor => {
                let dist = style.line_width * scale / 2.0 + HIT_SLOP;
                let tl = Point::new(c.x - w / 2.0, c.y - h / 2.0);
                let br = Point::new(c.x + w / 2.0, c.y + h / 2.0);
                let tr = Point::new(c.x + w / 2.0, c.y - h / 2.0);
                let bl = Point::new(c.x - w / 2.0, c.y + h / 2.0);
                geom::distance_to_segment(p, tl, br) < dist
                    || geom::distance_to_segment(p, tr, bl) < dist
            }
            StampKind::Piton => {
                let dist = style.line_width * scale / 2.0 + OUTLINE_HIT_SLOP;
                if (p.x - c.x).abs() > w / 2.0 + dist || (p.y - c.y).abs() > h / 2.0 + dist {
                    return false;
                }
                let left_edge = c.x - 0.1 * w;
                let blade_bottom = c.y + 0.1 * h;
                !(p.x < left_edge - dist || (p.x > left_edge + dist && p.y > blade_bottom + dist))
            }
            StampKind::Rappel | StampKind::Belay => {
                let r = w.min(h) / 2.0;
                p.distance(c) < r + style.line_width * scale / 2.0 + OUTLINE_HIT_SLOP
            }
        }
    }
}

/// A freeform route line through user-placed control points.
///
/// Keeps a tessellated copy of its path for hit-testing, refreshed whenever the
/// control points or the curved flag change.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    control_points: Vec<Point>,
    pub on_length: f64,
    pub off_length: f64,
    curved: bool,
    points: Vec<Point>,
}

impl Line {
    #[must_use]
    pub fn new(control_points: Vec<Point>, on_length: f64, off_length: f64, curved: bool) -> Self {
        let points = geom::tessellate(&control_points, curved);
        Self { control_points, on_length, off_length, curved, points }
    }

    #[must_use]
    pub fn control_points(&self) -> &[Point] {
        &self.control_points
    }

    /// The tessellated path.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    #[must_use]
    pub fn curved(&self) -> bool {
        self.curved
    }

    pub fn set_control_points(&mut self, control_points: Vec<Point>) {
        self.control_points = control_points;
        self.refresh();
    }

    pub fn set_curved(&mut self, curved: bool) {
        self.curved = curved;
        self.refresh();
    }

    /// Move one control point in place. Out-of-range indices are ignored.
    pub fn move_control_point(&mut self, index: usize, to: Point) {
        if let Some(cp) = self.control_points.get_mut(index) {
            *cp = to;
            self.refresh();
        }
    }

    pub fn push_control_point(&mut self, p: Point) {
        self.control_points.push(p);
        self.refresh();
    }

    /// Index of the first control point within `max_dist_sq` of `p`.
    #[must_use]
    pub fn control_point_near(&self, p: Point, max_dist_sq: f64) -> Option<usize> {
        self.control_points.iter().position(|cp| cp.distance_sq(p) < max_dist_sq)
    }

    /// Bounds of the tessellated path.
    #[must_use]
    pub fn bounds(&self) -> Option<Bounds> {
        geom::bounding_box(&self.points)
    }

    fn refresh(&mut self) {
        self.points = geom::tessellate(&self.control_points, self.curved);
    }
}

/// One laid-out line of a text block, in unscaled units relative to the block.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub text: String,
    pub top: f64,
    pub size: f64,
    pub width: f64,
}

/// Measures rendered text widths.
pub trait TextMeasure {
    fn text_width(&self, text: &str, size: f64) -> f64;
}

/// Width estimate from character count, used until real font metrics exist.
#[derive(Debug, Clone, Copy, Default)]
pub struct EstimatedMeasure;

impl TextMeasure for EstimatedMeasure {
    fn text_width(&self, text: &str, size: f64) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let chars = text.chars().count() as f64;
        chars * size * ESTIMATED_GLYPH_RATIO
    }
}

/// A free text annotation anchored at `position`.
#[derive(Debug, Clone, PartialEq)]
pub struct Text {
    pub position: Point,
    text: String,
    pub align: TextAlign,
    pub background: bool,
    lines: Vec<TextLine>,
    extent: (f64, f64),
}

impl Text {
    #[must_use]
    pub fn new(position: Point, text: String, align: TextAlign, background: bool) -> Self {
        let mut t = Self { position, text, align, background, lines: Vec::new(), extent: (0.0, 0.0) };
        t.layout(&EstimatedMeasure);
        t
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn lines(&self) -> &[TextLine] {
        &self.lines
    }

    /// Unscaled width and height of the laid-out block.
    #[must_use]
    pub fn extent(&self) -> (f64, f64) {
        self.extent
    }

    /// Replace the content and re-layout with estimated metrics.
    pub fn set_text(&mut self, text: String) {
        self.text = text;
        self.layout(&EstimatedMeasure);
    }

    /// Split the content into lines and measure them.
    pub fn layout(&mut self, measure: &dyn TextMeasure) {
        let normalized = self
            .text
            .trim_end()
            .replace("\r\n", "\n")
            .replace("\n\r", "\n")
            .replace('\r', "\n")
            .replace('\t', "    ");

        let mut top = 0.0;
        let mut width: f64 = 0.0;
        self.lines = normalized
            .split('\n')
            .map(|line| {
                let w = measure.text_width(line, TEXT_FONT_SIZE);
                width = width.max(w).min(TEXT_MAX_WIDTH);
                let laid = TextLine { text: line.to_string(), top, size: TEXT_FONT_SIZE, width: w };
                top += TEXT_LINE_SPACING * TEXT_FONT_SIZE;
                laid
            })
            .collect();

        let height = self.lines.last().map_or(0.0, |l| l.top + l.size);
        self.extent = (width, height);
    }

    /// The block's box in document space at the given item scale.
    #[must_use]
    pub fn bounds(&self, scale: f64) -> Bounds {
        let w = self.extent.0 * scale;
        let h = self.extent.1 * scale;
        let x = match self.align {
            TextAlign::Left => self.position.x,
            TextAlign::Center => self.position.x - w / 2.0,
            TextAlign::Right => self.position.x - w,
        };
        Bounds { x, y: self.position.y, w, h }
    }

    fn hit_test(&self, p: Point, scale: f64, selected: bool) -> bool {
        let bb = self.bounds(scale);
        let solid = self.background || selected;
        let pad = if solid { TEXT_PADDING } else { 0.0 };
        if !bb.contains(p, pad) {
            return false;
        }
        if solid {
            return true;
        }

        let n = self.lines.len();
        self.lines.iter().enumerate().any(|(i, line)| {
            let lw = line.width * scale;
            let (left, right) = match self.align {
                TextAlign::Left => (bb.x, bb.x + lw),
                TextAlign::Center => (bb.x + bb.w / 2.0 - lw / 2.0, bb.x + bb.w / 2.0 + lw / 2.0),
                TextAlign::Right => (bb.x + bb.w - lw, bb.x + bb.w),
            };
            let bottom = if i + 1 < n { self.lines[i + 1].top } else { line.top + line.size };
            p.x >= left && p.x <= right && p.y >= bb.y + line.top * scale && p.y <= bb.y + bottom * scale
        })
    }
}

/// Variant-specific item data.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Stamp(Stamp),
    Line(Line),
    Text(Text),
}

/// Properties that change an item's pixels, compared between renders.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawSignature {
    pub params: ItemParams,
    pub scale: f64,
    pub selected: bool,
}

/// Properties that only move an already drawn item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub origin: Point,
    pub offset: Point,
    pub scale: f64,
}

/// One annotation on the topo.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub id: ItemId,
    pub style: Style,
    offset: Point,
    pub shape: Shape,
}

fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}

fn non_negative(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v >= 0.0)
}

impl Item {
    /// Build an item of `item_type` from `params`, filling gaps from `defaults`.
    ///
    /// Keeps `params.id` when present so recreated items retain their identity.
    #[must_use]
    pub fn build(item_type: ItemType, params: &ItemParams, defaults: &Defaults) -> Self {
        let style = Style {
            scale: positive(params.scale).unwrap_or(defaults.scale),
            color: params.color.clone().filter(|c| is_valid_color(c)).unwrap_or_else(|| defaults.color.clone()),
            alpha: positive(params.alpha).map_or(defaults.alpha, |a| a.min(1.0)),
            line_width: positive(params.line_width).unwrap_or(defaults.line_width),
        };
        let position = Point::new(params.x.unwrap_or(0.0), params.y.unwrap_or(0.0));

        let shape = match item_type {
            ItemType::Line => Shape::Line(Line::new(
                params.control_points.clone().unwrap_or_default(),
                positive(params.on_length).unwrap_or(defaults.on_length),
                non_negative(params.off_length).unwrap_or(defaults.off_length),
                params.curved.unwrap_or(defaults.curved),
            )),
            ItemType::Text => Shape::Text(Text::new(
                position,
                params.text.clone().unwrap_or_default(),
                params.align.unwrap_or(defaults.align),
                params.background.unwrap_or(defaults.background),
            )),
            ItemType::Anchor | ItemType::Piton | ItemType::Rappel | ItemType::Belay => {
                let kind = item_type.stamp_kind().unwrap_or(StampKind::Anchor);
                let (dw, dh) = kind.default_size();
                Shape::Stamp(Stamp {
                    kind,
                    position,
                    width: positive(params.width).unwrap_or(dw),
                    height: positive(params.height).unwrap_or(dh),
                    label: params.label.clone().unwrap_or_default(),
                })
            }
        };

        Self { id: params.id.unwrap_or_else(Uuid::new_v4), style, offset: Point::default(), shape }
    }

    #[must_use]
    pub fn item_type(&self) -> ItemType {
        match &self.shape {
            Shape::Stamp(s) => s.kind.item_type(),
            Shape::Line(_) => ItemType::Line,
            Shape::Text(_) => ItemType::Text,
        }
    }

    #[must_use]
    pub fn as_line(&self) -> Option<&Line> {
        match &self.shape {
            Shape::Line(line) => Some(line),
            _ => None,
        }
    }

    pub fn as_line_mut(&mut self) -> Option<&mut Line> {
        match &mut self.shape {
            Shape::Line(line) => Some(line),
            _ => None,
        }
    }

    /// Whether a double-click should open the text editor for this item.
    #[must_use]
    pub fn has_editable_text(&self) -> bool {
        match &self.shape {
            Shape::Stamp(s) => s.kind.has_label(),
            Shape::Text(_) => true,
            Shape::Line(_) => false,
        }
    }

    /// Current label or text content, if the item has one.
    #[must_use]
    pub fn text_content(&self) -> Option<&str> {
        match &self.shape {
            Shape::Stamp(s) if s.kind.has_label() => Some(&s.label),
            Shape::Text(t) => Some(t.text()),
            _ => None,
        }
    }

    /// Full parameter set for the saved document. Excludes the id.
    #[must_use]
    pub fn serialize(&self) -> ItemParams {
        let mut params = self.action_params();
        params.item_type = Some(self.item_type());
        if let Shape::Stamp(s) = &self.shape {
            params.width = Some(s.width);
            params.height = Some(s.height);
            if s.label.is_empty() {
                params.label = None;
            }
        }
        params
    }

    /// [`serialize`](Self::serialize) plus the id, enough to recreate the item exactly.
    #[must_use]
    pub fn snapshot(&self) -> ItemParams {
        ItemParams { id: Some(self.id), ..self.serialize() }
    }

    /// The undoable properties of this item.
    #[must_use]
    pub fn action_params(&self) -> ItemParams {
        let mut params = ItemParams {
            scale: Some(self.style.scale),
            color: Some(self.style.color.clone()),
            alpha: Some(self.style.alpha),
            ..ItemParams::default()
        };
        match &self.shape {
            Shape::Stamp(s) => {
                params.line_width = Some(self.style.line_width);
                params.x = Some(s.position.x);
                params.y = Some(s.position.y);
                params.label = Some(s.label.clone());
            }
            Shape::Line(l) => {
                params.line_width = Some(self.style.line_width);
                params.control_points = Some(l.control_points.clone());
                params.on_length = Some(l.on_length);
                params.off_length = Some(l.off_length);
                params.curved = Some(l.curved);
            }
            Shape::Text(t) => {
                params.x = Some(t.position.x);
                params.y = Some(t.position.y);
                params.text = Some(t.text.clone());
                params.align = Some(t.align);
                params.background = Some(t.background);
            }
        }
        params
    }

    /// Write every present undoable property. Fields that do not apply to this
    /// variant, and invalid numbers, are ignored.
    pub fn set_action_params(&mut self, params: &ItemParams) {
        if let Some(scale) = positive(params.scale) {
            self.style.scale = scale;
        }
        if let Some(color) = params.color.as_ref().filter(|c| is_valid_color(c)) {
            self.style.color.clone_from(color);
        }
        if let Some(alpha) = positive(params.alpha) {
            self.style.alpha = alpha.min(1.0);
        }

        match &mut self.shape {
            Shape::Stamp(s) => {
                if let Some(w) = positive(params.line_width) {
                    self.style.line_width = w;
                }
                set_position(&mut s.position, params);
                if let Some(label) = &params.label {
                    s.label.clone_from(label);
                }
            }
            Shape::Line(l) => {
                if let Some(w) = positive(params.line_width) {
                    self.style.line_width = w;
                }
                if let Some(on) = positive(params.on_length) {
                    l.on_length = on;
                }
                if let Some(off) = non_negative(params.off_length) {
                    l.off_length = off;
                }
                if let Some(cps) = &params.control_points {
                    l.control_points.clone_from(cps);
                }
                if let Some(curved) = params.curved {
                    l.curved = curved;
                }
                if params.control_points.is_some() || params.curved.is_some() {
                    l.refresh();
                }
            }
            Shape::Text(t) => {
                set_position(&mut t.position, params);
                if let Some(align) = params.align {
                    t.align = align;
                }
                if let Some(bg) = params.background {
                    t.background = bg;
                }
                if let Some(text) = &params.text {
                    t.set_text(text.clone());
                }
            }
        }
    }

    #[must_use]
    pub fn offset(&self) -> Point {
        self.offset
    }

    /// Stage a drag offset. The stored position is untouched.
    pub fn set_offset(&mut self, offset: Point) {
        self.offset = offset;
    }

    /// Fold the staged offset into new position parameters and clear it.
    ///
    /// The stored position is not written; applying the returned params as an
    /// edit does that, so the edit captures the true prior values.
    pub fn apply_offset(&mut self) -> ItemParams {
        let d = self.offset;
        self.offset = Point::default();
        match &self.shape {
            Shape::Stamp(Stamp { position, .. }) | Shape::Text(Text { position, .. }) => {
                ItemParams { x: Some(position.x + d.x), y: Some(position.y + d.y), ..ItemParams::default() }
            }
            Shape::Line(l) => ItemParams {
                control_points: Some(l.control_points.iter().map(|&p| p + d).collect()),
                ..ItemParams::default()
            },
        }
    }

    /// Whether the document-space point `p` touches this item.
    #[must_use]
    pub fn hit_test(&self, p: Point, selected: bool) -> bool {
        match &self.shape {
            Shape::Stamp(s) => s.hit_test(p, &self.style),
            Shape::Line(l) => {
                let threshold = self.style.line_width * self.style.scale / 2.0 + HIT_SLOP;
                geom::hit_test_line(p, &l.points, threshold)
            }
            Shape::Text(t) => t.hit_test(p, self.style.scale, selected),
        }
    }

    /// Re-measure text with real metrics. No-op for other variants.
    pub fn layout(&mut self, measure: &dyn TextMeasure) {
        if let Shape::Text(t) = &mut self.shape {
            t.layout(measure);
        }
    }

    /// Pixel-affecting properties at a given page scale.
    #[must_use]
    pub fn draw_signature(&self, page_scale: f64, selected: bool) -> DrawSignature {
        let mut params = self.serialize();
        if !matches!(self.shape, Shape::Line(_)) {
            params.x = None;
            params.y = None;
        }
        DrawSignature { params, scale: page_scale * self.style.scale, selected }
    }

    /// Placement-only properties at a given page scale.
    #[must_use]
    pub fn placement(&self, page_scale: f64) -> Placement {
        let origin = match &self.shape {
            Shape::Stamp(s) => s.position,
            Shape::Text(t) => t.position,
            Shape::Line(_) => Point::default(),
        };
        Placement { origin, offset: self.offset, scale: page_scale * self.style.scale }
    }
}

fn set_position(position: &mut Point, params: &ItemParams) {
    if let Some(x) = params.x.filter(|v| v.is_finite()) {
        position.x = x;
    }
    if let Some(y) = params.y.filter(|v| v.is_finite()) {
        position.y = y;
    }
}

/// A single editable property, as set from the option bar.
#[derive(Debug, Clone, PartialEq)]
pub enum Property {
    Color(String),
    Scale(f64),
    Alpha(f64),
    LineWidth(f64),
    OnLength(f64),
    OffLength(f64),
    Curved(bool),
    Align(TextAlign),
    Background(bool),
}

/// Which property to read back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKey {
    Color,
    Scale,
    Alpha,
    LineWidth,
    OnLength,
    OffLength,
    Curved,
    Align,
    Background,
}

impl Property {
    #[must_use]
    pub fn key(&self) -> PropertyKey {
        match self {
            Self::Color(_) => PropertyKey::Color,
            Self::Scale(_) => PropertyKey::Scale,
            Self::Alpha(_) => PropertyKey::Alpha,
            Self::LineWidth(_) => PropertyKey::LineWidth,
            Self::OnLength(_) => PropertyKey::OnLength,
            Self::OffLength(_) => PropertyKey::OffLength,
            Self::Curved(_) => PropertyKey::Curved,
            Self::Align(_) => PropertyKey::Align,
            Self::Background(_) => PropertyKey::Background,
        }
    }

    /// Sparse params carrying just this property.
    #[must_use]
    pub fn to_params(&self) -> ItemParams {
        let mut params = ItemParams::default();
        match self {
            Self::Color(c) => params.color = Some(c.clone()),
            Self::Scale(v) => params.scale = Some(*v),
            Self::Alpha(v) => params.alpha = Some(*v),
            Self::LineWidth(v) => params.line_width = Some(*v),
            Self::OnLength(v) => params.on_length = Some(*v),
            Self::OffLength(v) => params.off_length = Some(*v),
            Self::Curved(b) => params.curved = Some(*b),
            Self::Align(a) => params.align = Some(*a),
            Self::Background(b) => params.background = Some(*b),
        }
        params
    }

    /// Read `key` out of `params`, if present.
    #[must_use]
    pub fn from_params(params: &ItemParams, key: PropertyKey) -> Option<Property> {
        match key {
            PropertyKey::Color => params.color.clone().map(Self::Color),
            PropertyKey::Scale => params.scale.map(Self::Scale),
            PropertyKey::Alpha => params.alpha.map(Self::Alpha),
            PropertyKey::LineWidth => params.line_width.map(Self::LineWidth),
            PropertyKey::OnLength => params.on_length.map(Self::OnLength),
            PropertyKey::OffLength => params.off_length.map(Self::OffLength),
            PropertyKey::Curved => params.curved.map(Self::Curved),
            PropertyKey::Align => params.align.map(Self::Align),
            PropertyKey::Background => params.background.map(Self::Background),
        }
    }
}
