//! Rendering: paints the document onto a [`Surface`].
//!
//! This module never mutates editor state. It reads the document, camera and
//! preview line and issues drawing commands. [`RenderCache`] memoizes what each
//! item looked like when last painted, so the host can tell a full redraw from
//! a move and skip frames where nothing visible changed.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use std::collections::{HashMap, HashSet};
use std::f64::consts::{FRAC_PI_2, TAU};

use crate::camera::{Camera, Point};
use crate::dash::{DashedPath, PathSink};
use crate::doc::{Document, PreviewLine};
use crate::geom::Bounds;
use crate::item::{DrawSignature, Item, ItemId, Line, Placement, Shape, Stamp, StampKind, Text, TextAlign};

/// Halo drawn under selected items.
pub const SELECTION_COLOR: &str = "rgba(255,0,0,0.75)";

/// Font used for text blocks and stamp labels.
pub const TEXT_FONT: &str = "12px Arial, Helvetica, sans-serif";

/// Extra halo width around a selected item, in screen pixels.
const SELECTION_HALO_PX: f64 = 4.0;

/// Extra outline width in the contrast colour, in screen pixels.
const OUTLINE_PX: f64 = 2.0;

/// Margin between a text block and its background box, in item units.
const TEXT_BACKGROUND_PAD: f64 = 2.0;

/// A 2D drawing target with canvas-like state.
pub trait Surface: PathSink {
    fn clear(&mut self, width: f64, height: f64);
    fn save(&mut self);
    fn restore(&mut self);
    fn translate(&mut self, by: Point);
    fn scale(&mut self, factor: f64);

    fn begin_path(&mut self);
    /// Append a circular arc to the current path, clockwise from `start` to `end`.
    fn arc(&mut self, center: Point, radius: f64, start: f64, end: f64);
    fn stroke(&mut self);

    fn set_stroke_style(&mut self, color: &str);
    fn set_fill_style(&mut self, color: &str);
    fn set_line_width(&mut self, width: f64);
    fn set_global_alpha(&mut self, alpha: f64);

    fn set_font(&mut self, font: &str);
    /// `"left"`, `"center"` or `"right"`.
    fn set_text_align(&mut self, align: &str);
    /// `"top"` or `"middle"`.
    fn set_text_baseline(&mut self, baseline: &str);
    fn fill_text(&mut self, text: &str, at: Point);

    fn fill_rect(&mut self, rect: Bounds);
    fn stroke_rect(&mut self, rect: Bounds);
}

/// Draw the whole scene: items bottom to top, then the line preview.
pub fn draw_scene<S: Surface + ?Sized>(surface: &mut S, doc: &Document, camera: &Camera) {
    let page_scale = doc.scale();
    surface.clear(camera.viewport_width, camera.viewport_height);
    surface.save();
    surface.translate(camera.offset());
    surface.scale(page_scale);

    for item in doc.items() {
        draw_item(surface, item, doc.is_selected(item.id), page_scale);
    }
    if let Some(preview) = doc.preview() {
        draw_preview(surface, preview);
    }

    surface.restore();
}

/// Pixel size of an exported annotation layer and the scale its items are
/// drawn at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportFrame {
    pub width: u32,
    pub height: u32,
    pub scale: f64,
}

impl ExportFrame {
    /// Frame for an image of `image_w` x `image_h` document units, `width`
    /// pixels wide keeping the aspect ratio, or at actual size without one.
    /// `None` when the image size is unknown or the width is zero.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn new(image_w: f64, image_h: f64, width: Option<u32>) -> Option<Self> {
        if !(image_w.is_finite() && image_h.is_finite() && image_w >= 1.0 && image_h >= 1.0) {
            return None;
        }
        match width {
            Some(0) => None,
            Some(width) => {
                let scale = f64::from(width) / image_w;
                let height = (image_h * scale).round().max(1.0) as u32;
                Some(Self { width, height, scale })
            }
            None => Some(Self { width: image_w.round() as u32, height: image_h.round() as u32, scale: 1.0 }),
        }
    }
}

/// Draw every item unselected at `frame.scale` from the document origin,
/// without camera, zoom or preview.
pub fn draw_export<S: Surface + ?Sized>(surface: &mut S, doc: &Document, frame: ExportFrame) {
    surface.clear(f64::from(frame.width), f64::from(frame.height));
    surface.save();
    surface.scale(frame.scale);
    for item in doc.items() {
        draw_item(surface, item, false, frame.scale);
    }
    surface.restore();
}

// =============================================================
// Item dispatch
// =============================================================

/// Draw one item in document coordinates. `page_scale` is the zoom the
/// surface is currently scaled by.
pub fn draw_item<S: Surface + ?Sized>(surface: &mut S, item: &Item, selected: bool, page_scale: f64) {
    surface.save();
    surface.set_global_alpha(item.style.alpha);
    match &item.shape {
        Shape::Stamp(stamp) => draw_stamp(surface, item, stamp, selected, page_scale),
        Shape::Line(line) => draw_line(surface, item, line, selected, page_scale),
        Shape::Text(text) => draw_text(surface, item, text, selected, page_scale),
    }
    surface.restore();
}

/// Stroke `trace` once per pass: the selection halo and contrast outline when
/// selected, then the item colour. `unit` converts screen pixels to the
/// surface's current units.
fn stroke_passes<S, F>(surface: &mut S, color: &str, width: f64, selected: bool, unit: f64, mut trace: F)
where
    S: Surface + ?Sized,
    F: FnMut(&mut S),
{
    if selected {
        surface.set_stroke_style(SELECTION_COLOR);
        surface.set_line_width(width + SELECTION_HALO_PX * unit);
        trace(surface);
        surface.set_stroke_style(contrast_color(color));
        surface.set_line_width(width + OUTLINE_PX * unit);
        trace(surface);
    }
    surface.set_stroke_style(color);
    surface.set_line_width(width);
    trace(surface);
}

// =============================================================
// Stamps
// =============================================================

fn draw_stamp<S: Surface + ?Sized>(surface: &mut S, item: &Item, stamp: &Stamp, selected: bool, page_scale: f64) {
    let scale = item.style.scale;
    let (w, h) = (stamp.width, stamp.height);
    surface.translate(stamp.position + item.offset());
    surface.scale(scale);
    surface.translate(Point::new(-w / 2.0, -h / 2.0));

    let unit = 1.0 / (page_scale * scale);
    stroke_passes(surface, &item.style.color, item.style.line_width, selected, unit, |s| {
        trace_stamp(s, stamp);
    });

    if stamp.kind.has_label() && !stamp.label.is_empty() {
        surface.set_fill_style(&item.style.color);
        surface.set_font(TEXT_FONT);
        surface.set_text_align("center");
        surface.set_text_baseline("middle");
        surface.fill_text(&stamp.label, Point::new(w / 2.0, h / 2.0));
    }
}

/// Stamp outline in local coordinates spanning `(0, 0)`–`(w, h)`.
fn trace_stamp<S: Surface + ?Sized>(s: &mut S, stamp: &Stamp) {
    let (w, h) = (stamp.width, stamp.height);
    let center = Point::new(w / 2.0, h / 2.0);
    let radius = w.min(h) / 2.0;

    s.begin_path();
    match stamp.kind {
        StampKind::Anchor => {
            s.move_to(Point::new(0.0, 0.0));
            s.line_to(Point::new(w, h));
            s.move_to(Point::new(w, 0.0));
            s.line_to(Point::new(0.0, h));
            circle(s, center, radius);
        }
        StampKind::Piton => {
            let r = 0.3 * h;
            s.move_to(Point::new(0.4 * w, h));
            s.line_to(Point::new(0.4 * w, 0.0));
            s.line_to(Point::new(w - r, 0.0));
            s.arc(Point::new(w - r, r), r, -FRAC_PI_2, FRAC_PI_2);
            s.line_to(Point::new(0.4 * w, 2.0 * r));
        }
        StampKind::Rappel => {
            circle(s, center, radius);
            s.move_to(Point::new(w / 2.0, 0.25 * h));
            s.line_to(Point::new(w / 2.0, 0.75 * h));
            s.move_to(Point::new(0.25 * w, h / 2.0));
            s.line_to(Point::new(w / 2.0, 0.75 * h));
            s.line_to(Point::new(0.75 * w, h / 2.0));
        }
        StampKind::Belay => circle(s, center, radius),
    }
    s.stroke();
}

fn circle<S: Surface + ?Sized>(s: &mut S, center: Point, radius: f64) {
    s.move_to(Point::new(center.x + radius, center.y));
    s.arc(center, radius, 0.0, TAU);
}

// =============================================================
// Lines
// =============================================================

fn draw_line<S: Surface + ?Sized>(surface: &mut S, item: &Item, line: &Line, selected: bool, page_scale: f64) {
    let offset = item.offset();
    if !offset.is_zero() {
        surface.translate(offset);
    }
    let width = item.style.line_width * item.style.scale;
    stroke_passes(surface, &item.style.color, width, selected, 1.0 / page_scale, |s| {
        s.begin_path();
        stroke_line_path(s, line, line.control_points());
        s.stroke();
    });
}

/// Trace `points` with the dash pattern and curve setting of `line`.
fn stroke_line_path<S: Surface + ?Sized>(s: &mut S, line: &Line, points: &[Point]) {
    if line.off_length > 0.0 {
        let mut dashed = DashedPath::new(s, line.on_length, line.off_length);
        trace_path(&mut dashed, points, line.curved());
    } else {
        trace_path(s, points, line.curved());
    }
}

/// Emit the path through `control_points`.
///
/// Curved paths run straight to the first midpoint, bend through each
/// interior control point with a quadratic segment ending on the next
/// midpoint, and finish straight on the last point.
pub fn trace_path<P: PathSink + ?Sized>(sink: &mut P, control_points: &[Point], curved: bool) {
    let Some((&first, rest)) = control_points.split_first() else {
        return;
    };
    sink.move_to(first);
    if !curved || control_points.len() < 3 {
        for &p in rest {
            sink.line_to(p);
        }
        return;
    }

    sink.line_to(first.midpoint(control_points[1]));
    for pair in control_points.windows(2).skip(1) {
        sink.quadratic_curve_to(pair[0], pair[0].midpoint(pair[1]));
    }
    if let Some(&last) = control_points.last() {
        sink.line_to(last);
    }
}

/// The rubber band from the last placed point to the cursor.
fn draw_preview<S: Surface + ?Sized>(surface: &mut S, preview: &PreviewLine) {
    let Some(line) = preview.item.as_line() else {
        return;
    };
    let (Some(&last), Some(cursor)) = (line.control_points().last(), preview.cursor) else {
        return;
    };
    let style = &preview.item.style;
    surface.save();
    surface.set_global_alpha(style.alpha);
    surface.set_stroke_style(&style.color);
    surface.set_line_width(style.line_width * style.scale);
    surface.begin_path();
    stroke_line_path(surface, line, &[last, cursor]);
    surface.stroke();
    surface.restore();
}

// =============================================================
// Text
// =============================================================

fn draw_text<S: Surface + ?Sized>(surface: &mut S, item: &Item, text: &Text, selected: bool, page_scale: f64) {
    let scale = item.style.scale;
    surface.translate(text.position + item.offset());
    surface.scale(scale);

    let (w, h) = text.extent();
    let left = match text.align {
        TextAlign::Left => 0.0,
        TextAlign::Center => -w / 2.0,
        TextAlign::Right => -w,
    };
    let frame = Bounds {
        x: left - TEXT_BACKGROUND_PAD,
        y: -TEXT_BACKGROUND_PAD,
        w: w + 2.0 * TEXT_BACKGROUND_PAD,
        h: h + 2.0 * TEXT_BACKGROUND_PAD,
    };

    if text.background {
        surface.set_fill_style(contrast_color(&item.style.color));
        surface.fill_rect(frame);
    }
    if selected {
        surface.set_stroke_style(SELECTION_COLOR);
        surface.set_line_width(OUTLINE_PX / (page_scale * scale));
        surface.stroke_rect(frame);
    }

    surface.set_fill_style(&item.style.color);
    surface.set_font(TEXT_FONT);
    surface.set_text_align(match text.align {
        TextAlign::Left => "left",
        TextAlign::Center => "center",
        TextAlign::Right => "right",
    });
    surface.set_text_baseline("top");
    for line in text.lines() {
        surface.fill_text(&line.text, Point::new(0.0, line.top));
    }
}

// =============================================================
// Colour
// =============================================================

/// Black or white, whichever reads better against `color`.
#[must_use]
pub fn contrast_color(color: &str) -> &'static str {
    let Some((r, g, b)) = parse_rgb(color) else {
        return "#000000";
    };
    let luma = 0.299 * r + 0.587 * g + 0.114 * b;
    if luma > 128.0 { "#000000" } else { "#ffffff" }
}

fn parse_rgb(color: &str) -> Option<(f64, f64, f64)> {
    if let Some(hex) = color.strip_prefix('#') {
        let d = hex.chars().map(|c| c.to_digit(16)).collect::<Option<Vec<u32>>>()?;
        return match d.len() {
            3 => Some((f64::from(d[0] * 17), f64::from(d[1] * 17), f64::from(d[2] * 17))),
            6 => Some((f64::from(d[0] * 16 + d[1]), f64::from(d[2] * 16 + d[3]), f64::from(d[4] * 16 + d[5]))),
            _ => None,
        };
    }
    let inner = color.strip_prefix("rgba(").or_else(|| color.strip_prefix("rgb("))?.strip_suffix(')')?;
    let Ok(parts) = inner.split(',').map(|p| p.trim().parse::<f64>()).collect::<Result<Vec<_>, _>>() else {
        return None;
    };
    match parts.as_slice() {
        [r, g, b] | [r, g, b, _] => Some((*r, *g, *b)),
        _ => None,
    }
}

// =============================================================
// Render cache
// =============================================================

/// What the host must do for one item to bring the picture up to date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOp {
    /// Pixels changed.
    Redraw(ItemId),
    /// Same pixels, new position.
    Reposition(ItemId),
    /// The item is gone.
    Drop(ItemId),
}

/// Last painted signature and placement per item.
#[derive(Debug, Default)]
pub struct RenderCache {
    entries: HashMap<ItemId, (DrawSignature, Placement)>,
}

impl RenderCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare the document with what was last painted, record the new state
    /// and report the differences in document order, removals last.
    pub fn plan(&mut self, doc: &Document) -> Vec<RenderOp> {
        let page_scale = doc.scale();
        let mut ops = Vec::new();
        let mut live = HashSet::with_capacity(doc.len());

        for item in doc.items() {
            live.insert(item.id);
            let signature = item.draw_signature(page_scale, doc.is_selected(item.id));
            let placement = item.placement(page_scale);
            match self.entries.get_mut(&item.id) {
                Some((painted, placed)) if *painted == signature => {
                    if *placed != placement {
                        *placed = placement;
                        ops.push(RenderOp::Reposition(item.id));
                    }
                }
                Some(entry) => {
                    *entry = (signature, placement);
                    ops.push(RenderOp::Redraw(item.id));
                }
                None => {
                    self.entries.insert(item.id, (signature, placement));
                    ops.push(RenderOp::Redraw(item.id));
                }
            }
        }

        let gone: Vec<ItemId> = self.entries.keys().filter(|id| !live.contains(*id)).copied().collect();
        for id in gone {
            self.entries.remove(&id);
            ops.push(RenderOp::Drop(id));
        }
        ops
    }

    /// Forget everything; the next plan redraws every item.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
