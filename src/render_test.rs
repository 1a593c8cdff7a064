#![allow(clippy::float_cmp)]

use super::*;
use crate::action::Action;
use crate::config::EditorConfig;
use crate::item::{ItemParams, ItemType};

fn pt(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

#[derive(Debug, Clone, PartialEq)]
enum Op {
    Clear,
    Save,
    Restore,
    Translate(Point),
    Scale(f64),
    Begin,
    Move(Point),
    Line(Point),
    Quad(Point, Point),
    Arc(Point, f64),
    Stroke,
    StrokeStyle(String),
    FillStyle(String),
    Width(f64),
    Alpha(f64),
    Font,
    Align(String),
    Baseline(String),
    Text(String, Point),
    FillRect(Bounds),
    StrokeRect(Bounds),
}

#[derive(Default)]
struct Recorder {
    ops: Vec<Op>,
}

impl Recorder {
    fn stroke_styles(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::StrokeStyle(s) => Some(s.as_str()),
                _ => None,
            })
            .collect()
    }

    fn count(&self, f: impl Fn(&Op) -> bool) -> usize {
        self.ops.iter().filter(|op| f(op)).count()
    }
}

impl PathSink for Recorder {
    fn move_to(&mut self, p: Point) {
        self.ops.push(Op::Move(p));
    }
    fn line_to(&mut self, p: Point) {
        self.ops.push(Op::Line(p));
    }
    fn quadratic_curve_to(&mut self, control: Point, to: Point) {
        self.ops.push(Op::Quad(control, to));
    }
}

impl Surface for Recorder {
    fn clear(&mut self, _width: f64, _height: f64) {
        self.ops.push(Op::Clear);
    }
    fn save(&mut self) {
        self.ops.push(Op::Save);
    }
    fn restore(&mut self) {
        self.ops.push(Op::Restore);
    }
    fn translate(&mut self, by: Point) {
        self.ops.push(Op::Translate(by));
    }
    fn scale(&mut self, factor: f64) {
        self.ops.push(Op::Scale(factor));
    }
    fn begin_path(&mut self) {
        self.ops.push(Op::Begin);
    }
    fn arc(&mut self, center: Point, radius: f64, _start: f64, _end: f64) {
        self.ops.push(Op::Arc(center, radius));
    }
    fn stroke(&mut self) {
        self.ops.push(Op::Stroke);
    }
    fn set_stroke_style(&mut self, color: &str) {
        self.ops.push(Op::StrokeStyle(color.to_string()));
    }
    fn set_fill_style(&mut self, color: &str) {
        self.ops.push(Op::FillStyle(color.to_string()));
    }
    fn set_line_width(&mut self, width: f64) {
        self.ops.push(Op::Width(width));
    }
    fn set_global_alpha(&mut self, alpha: f64) {
        self.ops.push(Op::Alpha(alpha));
    }
    fn set_font(&mut self, _font: &str) {
        self.ops.push(Op::Font);
    }
    fn set_text_align(&mut self, align: &str) {
        self.ops.push(Op::Align(align.to_string()));
    }
    fn set_text_baseline(&mut self, baseline: &str) {
        self.ops.push(Op::Baseline(baseline.to_string()));
    }
    fn fill_text(&mut self, text: &str, at: Point) {
        self.ops.push(Op::Text(text.to_string(), at));
    }
    fn fill_rect(&mut self, rect: Bounds) {
        self.ops.push(Op::FillRect(rect));
    }
    fn stroke_rect(&mut self, rect: Bounds) {
        self.ops.push(Op::StrokeRect(rect));
    }
}

fn add(doc: &mut Document, mut action: Action) -> ItemId {
    doc.run(&mut action).unwrap()
}

// =============================================================
// Path tracing
// =============================================================

#[test]
fn straight_path_is_polyline() {
    let mut rec = Recorder::default();
    trace_path(&mut rec, &[pt(0.0, 0.0), pt(10.0, 0.0), pt(10.0, 10.0)], false);
    assert_eq!(rec.ops, vec![Op::Move(pt(0.0, 0.0)), Op::Line(pt(10.0, 0.0)), Op::Line(pt(10.0, 10.0))]);
}

#[test]
fn curved_path_bends_through_midpoints() {
    let mut rec = Recorder::default();
    trace_path(&mut rec, &[pt(0.0, 0.0), pt(10.0, 0.0), pt(10.0, 10.0)], true);
    assert_eq!(
        rec.ops,
        vec![
            Op::Move(pt(0.0, 0.0)),
            Op::Line(pt(5.0, 0.0)),
            Op::Quad(pt(10.0, 0.0), pt(10.0, 5.0)),
            Op::Line(pt(10.0, 10.0)),
        ]
    );
}

#[test]
fn curved_two_point_path_is_straight() {
    let mut rec = Recorder::default();
    trace_path(&mut rec, &[pt(0.0, 0.0), pt(10.0, 0.0)], true);
    assert_eq!(rec.ops, vec![Op::Move(pt(0.0, 0.0)), Op::Line(pt(10.0, 0.0))]);
}

#[test]
fn empty_path_emits_nothing() {
    let mut rec = Recorder::default();
    trace_path(&mut rec, &[], true);
    assert!(rec.ops.is_empty());
}

// =============================================================
// Items
// =============================================================

#[test]
fn scene_applies_camera_then_zoom() {
    let mut doc = Document::default();
    doc.zoom_in();
    let mut camera = Camera::default();
    camera.pan_x = 5.0;
    camera.pan_y = 7.0;
    let mut rec = Recorder::default();
    draw_scene(&mut rec, &doc, &camera);
    assert_eq!(rec.ops, vec![Op::Clear, Op::Save, Op::Translate(pt(5.0, 7.0)), Op::Scale(1.5), Op::Restore]);
}

#[test]
fn export_frame_scales_to_requested_width() {
    let frame = ExportFrame::new(800.0, 600.0, Some(200)).unwrap();
    assert_eq!(frame, ExportFrame { width: 200, height: 150, scale: 0.25 });

    let odd = ExportFrame::new(300.0, 100.0, Some(100)).unwrap();
    assert_eq!(odd.height, 33);
}

#[test]
fn export_frame_defaults_to_actual_size() {
    assert_eq!(ExportFrame::new(640.0, 480.0, None), Some(ExportFrame { width: 640, height: 480, scale: 1.0 }));
    assert_eq!(ExportFrame::new(0.0, 480.0, None), None);
    assert_eq!(ExportFrame::new(640.0, 480.0, Some(0)), None);
}

#[test]
fn export_ignores_camera_zoom_and_selection() {
    let config = EditorConfig { image_width: 400.0, image_height: 300.0, ..EditorConfig::default() };
    let mut doc = Document::new(&config);
    doc.zoom_in();
    let id = add(&mut doc, Action::create_stamp(StampKind::Anchor, pt(10.0, 10.0)));
    doc.select(id);

    let frame = ExportFrame::new(doc.width, doc.height, Some(200)).unwrap();
    let mut rec = Recorder::default();
    draw_export(&mut rec, &doc, frame);

    assert_eq!(&rec.ops[..3], &[Op::Clear, Op::Save, Op::Scale(0.5)]);
    assert_eq!(rec.stroke_styles(), vec!["#ffff00"]);
    assert_eq!(rec.ops.last(), Some(&Op::Restore));
}

#[test]
fn unselected_stamp_strokes_once() {
    let mut doc = Document::default();
    let id = add(&mut doc, Action::create_stamp(StampKind::Anchor, pt(10.0, 10.0)));
    let mut rec = Recorder::default();
    draw_item(&mut rec, doc.item(id).unwrap(), false, 1.0);
    assert_eq!(rec.stroke_styles(), vec!["#ffff00"]);
    assert!(rec.ops.contains(&Op::Translate(pt(10.0, 10.0))));
    assert!(rec.ops.contains(&Op::Translate(pt(-5.0, -5.0))));
    assert!(rec.ops.contains(&Op::Arc(pt(5.0, 5.0), 5.0)));
}

#[test]
fn selected_stamp_gets_halo_and_outline() {
    let mut doc = Document::default();
    let id = add(&mut doc, Action::create_stamp(StampKind::Rappel, pt(10.0, 10.0)));
    let mut rec = Recorder::default();
    draw_item(&mut rec, doc.item(id).unwrap(), true, 2.0);
    assert_eq!(rec.stroke_styles(), vec![SELECTION_COLOR, "#000000", "#ffff00"]);
    assert!(rec.ops.contains(&Op::Width(3.0 + 4.0 / 2.0)));
    assert!(rec.ops.contains(&Op::Width(3.0 + 2.0 / 2.0)));
    assert_eq!(rec.count(|op| *op == Op::Stroke), 3);
}

#[test]
fn stamp_draws_at_staged_offset() {
    let mut doc = Document::default();
    let id = add(&mut doc, Action::create_stamp(StampKind::Piton, pt(10.0, 10.0)));
    doc.item_mut(id).unwrap().set_offset(pt(5.0, 0.0));
    let mut rec = Recorder::default();
    draw_item(&mut rec, doc.item(id).unwrap(), false, 1.0);
    assert!(rec.ops.contains(&Op::Translate(pt(15.0, 10.0))));
}

#[test]
fn belay_label_is_filled() {
    let mut doc = Document::default();
    let mut action = Action::create_stamp(StampKind::Belay, pt(0.0, 0.0));
    action.params.label = Some("B3".into());
    let id = add(&mut doc, action);
    let mut rec = Recorder::default();
    draw_item(&mut rec, doc.item(id).unwrap(), false, 1.0);
    assert!(rec.ops.contains(&Op::Text("B3".into(), pt(10.0, 10.0))));
    assert!(rec.ops.contains(&Op::Align("center".into())));
}

#[test]
fn dashed_line_breaks_into_pieces() {
    let mut doc = Document::default();
    let params = ItemParams { on_length: Some(5.0), off_length: Some(5.0), ..ItemParams::default() };
    let id = add(&mut doc, Action::create_line(vec![pt(0.0, 0.0), pt(40.0, 0.0)], params));
    let mut rec = Recorder::default();
    draw_item(&mut rec, doc.item(id).unwrap(), false, 1.0);
    assert_eq!(rec.count(|op| matches!(op, Op::Line(_))), 4);
    assert!(rec.count(|op| matches!(op, Op::Move(_))) >= 4);
}

#[test]
fn solid_line_width_follows_item_scale() {
    let mut doc = Document::default();
    let params = ItemParams { scale: Some(2.0), ..ItemParams::default() };
    let id = add(&mut doc, Action::create_line(vec![pt(0.0, 0.0), pt(40.0, 0.0)], params));
    let mut rec = Recorder::default();
    draw_item(&mut rec, doc.item(id).unwrap(), false, 1.0);
    assert!(rec.ops.contains(&Op::Width(6.0)));
    assert_eq!(rec.count(|op| matches!(op, Op::Line(_))), 1);
}

#[test]
fn text_with_background_fills_box_first() {
    let mut doc = Document::default();
    let mut action = Action::create_text(pt(0.0, 0.0), "ab\ncd".into());
    action.params.background = Some(true);
    action.params.align = Some(TextAlign::Center);
    let id = add(&mut doc, action);
    let mut rec = Recorder::default();
    draw_item(&mut rec, doc.item(id).unwrap(), false, 1.0);

    let fill_rect = rec.ops.iter().position(|op| matches!(op, Op::FillRect(_))).unwrap();
    let first_text = rec.ops.iter().position(|op| matches!(op, Op::Text(..))).unwrap();
    assert!(fill_rect < first_text);
    assert!(rec.ops.contains(&Op::FillStyle("#000000".into())));
    assert!(rec.ops.contains(&Op::Align("center".into())));
    assert!(rec.ops.contains(&Op::Baseline("top".into())));
    assert_eq!(rec.count(|op| matches!(op, Op::Text(..))), 2);
    assert!(!rec.ops.iter().any(|op| matches!(op, Op::StrokeRect(_))));
}

#[test]
fn selected_text_gets_frame() {
    let mut doc = Document::default();
    let id = add(&mut doc, Action::create_text(pt(0.0, 0.0), "x".into()));
    let mut rec = Recorder::default();
    draw_item(&mut rec, doc.item(id).unwrap(), true, 1.0);
    assert_eq!(rec.count(|op| matches!(op, Op::StrokeRect(_))), 1);
    assert_eq!(rec.count(|op| matches!(op, Op::FillRect(_))), 0);
}

#[test]
fn preview_draws_rubber_band() {
    let mut doc = Document::default();
    let params = ItemParams { control_points: Some(vec![pt(1.0, 1.0)]), ..ItemParams::default() };
    let item = Item::build(ItemType::Line, &params, &doc.defaults);
    doc.set_preview(Some(PreviewLine { item, cursor: Some(pt(9.0, 9.0)) }));
    let mut rec = Recorder::default();
    draw_scene(&mut rec, &doc, &Camera::default());
    assert!(rec.ops.contains(&Op::Move(pt(1.0, 1.0))));
    assert!(rec.ops.contains(&Op::Line(pt(9.0, 9.0))));
}

// =============================================================
// Colour
// =============================================================

#[test]
fn contrast_picks_black_on_light() {
    assert_eq!(contrast_color("#ffff00"), "#000000");
    assert_eq!(contrast_color("#fff"), "#000000");
    assert_eq!(contrast_color("rgb(250, 250, 250)"), "#000000");
}

#[test]
fn contrast_picks_white_on_dark() {
    assert_eq!(contrast_color("#000"), "#ffffff");
    assert_eq!(contrast_color("#1020a0"), "#ffffff");
    assert_eq!(contrast_color("rgba(0, 0, 0, 0.5)"), "#ffffff");
}

#[test]
fn contrast_defaults_to_black() {
    assert_eq!(contrast_color("teal"), "#000000");
    assert_eq!(contrast_color("#12"), "#000000");
    assert_eq!(contrast_color("rgb(a,b,c)"), "#000000");
}

// =============================================================
// Render cache
// =============================================================

#[test]
fn first_plan_redraws_everything() {
    let mut doc = Document::default();
    let a = add(&mut doc, Action::create_stamp(StampKind::Anchor, pt(0.0, 0.0)));
    let b = add(&mut doc, Action::create_text(pt(5.0, 5.0), "t".into()));
    let mut cache = RenderCache::new();
    assert_eq!(cache.plan(&doc), vec![RenderOp::Redraw(a), RenderOp::Redraw(b)]);
    assert_eq!(cache.len(), 2);
    assert!(cache.plan(&doc).is_empty());
}

#[test]
fn moving_a_stamp_only_repositions() {
    let mut doc = Document::default();
    let id = add(&mut doc, Action::create_stamp(StampKind::Anchor, pt(0.0, 0.0)));
    let mut cache = RenderCache::new();
    cache.plan(&doc);

    doc.item_mut(id).unwrap().set_offset(pt(3.0, 3.0));
    assert_eq!(cache.plan(&doc), vec![RenderOp::Reposition(id)]);
    add(&mut doc, Action::edit(id, ItemParams { x: Some(3.0), y: Some(3.0), ..ItemParams::default() }));
    doc.item_mut(id).unwrap().set_offset(Point::default());
    assert_eq!(cache.plan(&doc), vec![RenderOp::Reposition(id)]);
}

#[test]
fn style_and_selection_changes_redraw() {
    let mut doc = Document::default();
    let id = add(&mut doc, Action::create_stamp(StampKind::Anchor, pt(0.0, 0.0)));
    let mut cache = RenderCache::new();
    cache.plan(&doc);

    add(&mut doc, Action::edit(id, ItemParams { color: Some("#00ff00".into()), ..ItemParams::default() }));
    assert_eq!(cache.plan(&doc), vec![RenderOp::Redraw(id)]);
    doc.select(id);
    assert_eq!(cache.plan(&doc), vec![RenderOp::Redraw(id)]);
}

#[test]
fn moving_line_points_redraws() {
    let mut doc = Document::default();
    let id = add(&mut doc, Action::create_line(vec![pt(0.0, 0.0), pt(5.0, 0.0)], ItemParams::default()));
    let mut cache = RenderCache::new();
    cache.plan(&doc);
    let cps = vec![pt(1.0, 0.0), pt(6.0, 0.0)];
    add(&mut doc, Action::edit(id, ItemParams { control_points: Some(cps), ..ItemParams::default() }));
    assert_eq!(cache.plan(&doc), vec![RenderOp::Redraw(id)]);
}

#[test]
fn zoom_redraws_and_removal_drops() {
    let mut doc = Document::new(&EditorConfig::default());
    let a = add(&mut doc, Action::create_stamp(StampKind::Anchor, pt(0.0, 0.0)));
    let b = add(&mut doc, Action::create_stamp(StampKind::Belay, pt(50.0, 0.0)));
    let mut cache = RenderCache::new();
    cache.plan(&doc);

    doc.zoom_in();
    assert_eq!(cache.plan(&doc), vec![RenderOp::Redraw(a), RenderOp::Redraw(b)]);

    let mut delete = Action::delete(doc.item(a).unwrap());
    doc.run(&mut delete).unwrap();
    assert_eq!(cache.plan(&doc), vec![RenderOp::Drop(a)]);
    assert_eq!(cache.len(), 1);

    cache.clear();
    assert!(cache.is_empty());
    assert_eq!(cache.plan(&doc), vec![RenderOp::Redraw(b)]);
}
