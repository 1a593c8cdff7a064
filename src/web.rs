//! Browser binding: [`TopoEditor`] owns the canvas element and forwards DOM
//! input to an [`Editor`].
//!
//! Handlers, including `loadData`, return the resulting effects as a JSON
//! array for the host page to act on (`editTextRequested`, `setCursor`, ...).
//! Painting happens from [`TopoEditor::tick`], driven by
//! `requestAnimationFrame`. Failures that have no return channel go to the
//! optional error callback.

#[cfg(test)]
#[path = "web_test.rs"]
mod web_test;

use std::fmt::Display;

use js_sys::Function;
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::camera::Point;
use crate::config::EditorConfig;
use crate::dash::PathSink;
use crate::doc::{Document, ZoomTarget};
use crate::engine::{Editor, Effect, TextTarget};
use crate::geom::Bounds;
use crate::item::{EstimatedMeasure, ItemId, Property, PropertyKey, StampKind, TextAlign, TextMeasure};
use crate::mode::{Button, Key, Modifiers, Tool};
use crate::render::{ExportFrame, RenderCache, Surface, draw_export, draw_scene};

/// Modifier bit flags as passed from the host.
pub const MOD_SHIFT: u8 = 1;
pub const MOD_CTRL: u8 = 2;
pub const MOD_ALT: u8 = 4;
pub const MOD_META: u8 = 8;

/// Host-side input the binding could not interpret.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WebError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),
    #[error("unknown stamp: {0}")]
    UnknownStamp(String),
    #[error("unknown property: {0}")]
    UnknownProperty(String),
    #[error("invalid value for {name}: {value}")]
    InvalidValue { name: String, value: String },
    #[error("invalid item id: {0}")]
    InvalidId(String),
}

// =============================================================
// Host input parsing
// =============================================================

#[must_use]
pub fn modifiers_from_bits(bits: u8) -> Modifiers {
    Modifiers {
        shift: bits & MOD_SHIFT != 0,
        ctrl: bits & MOD_CTRL != 0,
        alt: bits & MOD_ALT != 0,
        meta: bits & MOD_META != 0,
    }
}

/// `MouseEvent.button` to [`Button`].
#[must_use]
pub fn button_from_code(code: i16) -> Option<Button> {
    match code {
        0 => Some(Button::Primary),
        1 => Some(Button::Middle),
        2 => Some(Button::Secondary),
        _ => None,
    }
}

/// Parse a tool name, with the stamp kind for `"stamp"`.
///
/// # Errors
///
/// [`WebError::UnknownTool`] or [`WebError::UnknownStamp`].
pub fn parse_tool(name: &str, stamp: Option<&str>) -> Result<Tool, WebError> {
    match name {
        "select" => Ok(Tool::Select),
        "line" => Ok(Tool::Line),
        "text" => Ok(Tool::Text),
        "lineEdit" => Ok(Tool::LineEdit),
        "stamp" => match stamp {
            None | Some("") => Ok(Tool::Stamp(None)),
            Some(kind) => parse_stamp(kind).map(|k| Tool::Stamp(Some(k))),
        },
        other => Err(WebError::UnknownTool(other.to_string())),
    }
}

fn parse_stamp(kind: &str) -> Result<StampKind, WebError> {
    match kind {
        "anchor" => Ok(StampKind::Anchor),
        "piton" => Ok(StampKind::Piton),
        "rappel" => Ok(StampKind::Rappel),
        "belay" => Ok(StampKind::Belay),
        other => Err(WebError::UnknownStamp(other.to_string())),
    }
}

fn tool_name(tool: Tool) -> (&'static str, Option<StampKind>) {
    match tool {
        Tool::Select => ("select", None),
        Tool::Line => ("line", None),
        Tool::Stamp(kind) => ("stamp", kind),
        Tool::Text => ("text", None),
        Tool::LineEdit => ("lineEdit", None),
    }
}

/// # Errors
///
/// [`WebError::UnknownProperty`] for names outside the property panel.
pub fn parse_property_key(name: &str) -> Result<PropertyKey, WebError> {
    match name {
        "color" => Ok(PropertyKey::Color),
        "scale" => Ok(PropertyKey::Scale),
        "alpha" => Ok(PropertyKey::Alpha),
        "lineWidth" => Ok(PropertyKey::LineWidth),
        "onLength" => Ok(PropertyKey::OnLength),
        "offLength" => Ok(PropertyKey::OffLength),
        "curved" => Ok(PropertyKey::Curved),
        "align" => Ok(PropertyKey::Align),
        "background" => Ok(PropertyKey::Background),
        other => Err(WebError::UnknownProperty(other.to_string())),
    }
}

/// Parse a property panel value. Range checks stay with the editor.
///
/// # Errors
///
/// [`WebError::UnknownProperty`] or [`WebError::InvalidValue`].
pub fn parse_property(name: &str, value: &str) -> Result<Property, WebError> {
    let invalid = || WebError::InvalidValue { name: name.to_string(), value: value.to_string() };
    let number = || value.trim().parse::<f64>().map_err(|_| invalid());
    let flag = || match value {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(invalid()),
    };
    Ok(match parse_property_key(name)? {
        PropertyKey::Color => Property::Color(value.trim().to_string()),
        PropertyKey::Scale => Property::Scale(number()?),
        PropertyKey::Alpha => Property::Alpha(number()?),
        PropertyKey::LineWidth => Property::LineWidth(number()?),
        PropertyKey::OnLength => Property::OnLength(number()?),
        PropertyKey::OffLength => Property::OffLength(number()?),
        PropertyKey::Curved => Property::Curved(flag()?),
        PropertyKey::Background => Property::Background(flag()?),
        PropertyKey::Align => Property::Align(match value {
            "l" | "left" => TextAlign::Left,
            "c" | "center" => TextAlign::Center,
            "r" | "right" => TextAlign::Right,
            _ => return Err(invalid()),
        }),
    })
}

/// Property value in the form [`parse_property`] accepts.
#[must_use]
pub fn property_value(property: &Property) -> String {
    match property {
        Property::Color(c) => c.clone(),
        Property::Scale(v)
        | Property::Alpha(v)
        | Property::LineWidth(v)
        | Property::OnLength(v)
        | Property::OffLength(v) => v.to_string(),
        Property::Curved(b) | Property::Background(b) => b.to_string(),
        Property::Align(TextAlign::Left) => "l".to_string(),
        Property::Align(TextAlign::Center) => "c".to_string(),
        Property::Align(TextAlign::Right) => "r".to_string(),
    }
}

// =============================================================
// Effects for the host
// =============================================================

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum EffectMessage<'a> {
    RenderNeeded,
    SelectionChanged {
        ids: &'a [ItemId],
    },
    ModeChanged {
        tool: &'static str,
        #[serde(skip_serializing_if = "Option::is_none")]
        stamp: Option<StampKind>,
    },
    DocumentChanged,
    EditTextRequested {
        #[serde(skip_serializing_if = "Option::is_none")]
        item: Option<ItemId>,
        #[serde(skip_serializing_if = "Option::is_none")]
        at: Option<Point>,
        text: &'a str,
    },
    SetCursor {
        cursor: &'a str,
    },
}

impl<'a> From<&'a Effect> for EffectMessage<'a> {
    fn from(effect: &'a Effect) -> Self {
        match effect {
            Effect::RenderNeeded => Self::RenderNeeded,
            Effect::SelectionChanged(ids) => Self::SelectionChanged { ids },
            Effect::ModeChanged(tool) => {
                let (tool, stamp) = tool_name(*tool);
                Self::ModeChanged { tool, stamp }
            }
            Effect::DocumentChanged => Self::DocumentChanged,
            Effect::EditTextRequested { target, text } => {
                let (item, at) = match target {
                    TextTarget::New(at) => (None, Some(*at)),
                    TextTarget::Item(id) => (Some(*id), None),
                };
                Self::EditTextRequested { item, at, text }
            }
            Effect::SetCursor(cursor) => Self::SetCursor { cursor },
        }
    }
}

/// Effects as the JSON array handed to the host.
#[must_use]
pub fn effects_json(effects: &[Effect]) -> String {
    let messages: Vec<EffectMessage<'_>> = effects.iter().map(EffectMessage::from).collect();
    match serde_json::to_string(&messages) {
        Ok(json) => json,
        Err(e) => {
            warn!(error = %e, "effect encoding failed");
            "[]".to_string()
        }
    }
}

// =============================================================
// Canvas surface
// =============================================================

fn canvas_font(size: f64) -> String {
    format!("{size}px Arial, Helvetica, sans-serif")
}

fn measure_with(ctx: &CanvasRenderingContext2d, text: &str, size: f64) -> f64 {
    ctx.set_font(&canvas_font(size));
    match ctx.measure_text(text) {
        Ok(metrics) => metrics.width(),
        Err(_) => EstimatedMeasure.text_width(text, size),
    }
}

/// Text metrics from a live 2D context.
struct CanvasMeasure<'a>(&'a CanvasRenderingContext2d);

impl TextMeasure for CanvasMeasure<'_> {
    fn text_width(&self, text: &str, size: f64) -> f64 {
        measure_with(self.0, text, size)
    }
}

/// [`Surface`] over a 2D context. The first failed call is kept in `error`
/// and the rest of the frame still draws.
struct CanvasSurface<'a> {
    ctx: &'a CanvasRenderingContext2d,
    error: Option<JsValue>,
}

impl<'a> CanvasSurface<'a> {
    fn new(ctx: &'a CanvasRenderingContext2d) -> Self {
        Self { ctx, error: None }
    }

    fn check(&mut self, result: Result<(), JsValue>) {
        if let Err(e) = result {
            if self.error.is_none() {
                self.error = Some(e);
            }
        }
    }
}

impl PathSink for CanvasSurface<'_> {
    fn move_to(&mut self, p: Point) {
        self.ctx.move_to(p.x, p.y);
    }

    fn line_to(&mut self, p: Point) {
        self.ctx.line_to(p.x, p.y);
    }

    fn quadratic_curve_to(&mut self, control: Point, to: Point) {
        self.ctx.quadratic_curve_to(control.x, control.y, to.x, to.y);
    }
}

impl Surface for CanvasSurface<'_> {
    fn clear(&mut self, width: f64, height: f64) {
        let reset = self.ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);
        self.check(reset);
        self.ctx.clear_rect(0.0, 0.0, width, height);
    }

    fn save(&mut self) {
        self.ctx.save();
    }

    fn restore(&mut self) {
        self.ctx.restore();
    }

    fn translate(&mut self, by: Point) {
        let result = self.ctx.translate(by.x, by.y);
        self.check(result);
    }

    fn scale(&mut self, factor: f64) {
        let result = self.ctx.scale(factor, factor);
        self.check(result);
    }

    fn begin_path(&mut self) {
        self.ctx.begin_path();
    }

    fn arc(&mut self, center: Point, radius: f64, start: f64, end: f64) {
        let result = self.ctx.arc(center.x, center.y, radius, start, end);
        self.check(result);
    }

    fn stroke(&mut self) {
        self.ctx.stroke();
    }

    fn set_stroke_style(&mut self, color: &str) {
        self.ctx.set_stroke_style_str(color);
    }

    fn set_fill_style(&mut self, color: &str) {
        self.ctx.set_fill_style_str(color);
    }

    fn set_line_width(&mut self, width: f64) {
        self.ctx.set_line_width(width);
    }

    fn set_global_alpha(&mut self, alpha: f64) {
        self.ctx.set_global_alpha(alpha);
    }

    fn set_font(&mut self, font: &str) {
        self.ctx.set_font(font);
    }

    fn set_text_align(&mut self, align: &str) {
        self.ctx.set_text_align(align);
    }

    fn set_text_baseline(&mut self, baseline: &str) {
        self.ctx.set_text_baseline(baseline);
    }

    fn fill_text(&mut self, text: &str, at: Point) {
        let result = self.ctx.fill_text(text, at.x, at.y);
        self.check(result);
    }

    fn fill_rect(&mut self, rect: Bounds) {
        self.ctx.fill_rect(rect.x, rect.y, rect.w, rect.h);
    }

    fn stroke_rect(&mut self, rect: Bounds) {
        self.ctx.stroke_rect(rect.x, rect.y, rect.w, rect.h);
    }
}

// =============================================================
// Exported editor
// =============================================================

/// The editor bound to one `<canvas>`.
#[wasm_bindgen]
pub struct TopoEditor {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    editor: Editor,
    cache: RenderCache,
    on_error: Option<Function>,
    /// Camera offset and scale at the last paint.
    painted_view: Option<(Point, f64)>,
    painted_preview: bool,
}

#[wasm_bindgen]
impl TopoEditor {
    /// Bind to `canvas`. `options` is the JSON editor configuration; an empty
    /// string selects the defaults.
    ///
    /// # Errors
    ///
    /// Fails when the options do not parse or the canvas has no 2D context.
    #[wasm_bindgen(constructor)]
    pub fn new(canvas: HtmlCanvasElement, options: &str) -> Result<TopoEditor, JsValue> {
        let config = if options.trim().is_empty() {
            EditorConfig::default()
        } else {
            EditorConfig::from_json(options).map_err(|e| JsValue::from_str(&e.to_string()))?
        };
        let ctx = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| JsValue::from_str("not a 2d context"))?;

        let mut editor = Editor::new(config);
        editor.set_viewport(f64::from(canvas.width()), f64::from(canvas.height()));
        debug!(width = canvas.width(), height = canvas.height(), "editor bound to canvas");
        Ok(Self {
            canvas,
            ctx,
            editor,
            cache: RenderCache::new(),
            on_error: None,
            painted_view: None,
            painted_preview: false,
        })
    }

    /// Register `callback(message)` for errors that have no return value.
    #[wasm_bindgen(js_name = setErrorHandler)]
    pub fn set_error_handler(&mut self, callback: Option<Function>) {
        self.on_error = callback;
    }

    // --- Input ---

    #[wasm_bindgen(js_name = pointerDown)]
    pub fn pointer_down(&mut self, x: f64, y: f64, button: i16, modifiers: u8) -> String {
        let Some(button) = button_from_code(button) else {
            return "[]".to_string();
        };
        let effects = self.editor.on_pointer_down(Point::new(x, y), button, modifiers_from_bits(modifiers));
        self.finish(&effects)
    }

    #[wasm_bindgen(js_name = pointerMove)]
    pub fn pointer_move(&mut self, x: f64, y: f64) -> String {
        let effects = self.editor.on_pointer_move(Point::new(x, y));
        self.finish(&effects)
    }

    #[wasm_bindgen(js_name = pointerUp)]
    pub fn pointer_up(&mut self, x: f64, y: f64, button: i16) -> String {
        let Some(button) = button_from_code(button) else {
            return "[]".to_string();
        };
        let effects = self.editor.on_pointer_up(Point::new(x, y), button);
        self.finish(&effects)
    }

    #[wasm_bindgen(js_name = doubleClick)]
    pub fn double_click(&mut self, x: f64, y: f64) -> String {
        let effects = self.editor.on_double_click(Point::new(x, y));
        self.finish(&effects)
    }

    #[wasm_bindgen(js_name = keyDown)]
    pub fn key_down(&mut self, key: &str, modifiers: u8) -> String {
        let effects = self.editor.on_key_down(&Key(key.to_string()), modifiers_from_bits(modifiers));
        self.finish(&effects)
    }

    /// Switch tools: `"select"`, `"line"`, `"text"`, `"lineEdit"`, or
    /// `"stamp"` with `"anchor"`, `"piton"`, `"rappel"` or `"belay"`.
    #[wasm_bindgen(js_name = setMode)]
    pub fn set_mode(&mut self, tool: &str, stamp: Option<String>) -> String {
        match parse_tool(tool, stamp.as_deref()) {
            Ok(tool) => {
                let effects = self.editor.set_mode(tool);
                self.finish(&effects)
            }
            Err(e) => self.fail(&e),
        }
    }

    /// Answer an `editTextRequested` effect: `item` for an existing item,
    /// otherwise a new text block at (`x`, `y`).
    #[wasm_bindgen(js_name = submitText)]
    pub fn submit_text(&mut self, item: Option<String>, x: f64, y: f64, text: &str) -> String {
        let target = match item {
            Some(raw) => match Uuid::parse_str(&raw) {
                Ok(id) => TextTarget::Item(id),
                Err(_) => return self.fail(&WebError::InvalidId(raw)),
            },
            None => TextTarget::New(Point::new(x, y)),
        };
        match self.editor.submit_text(target, text) {
            Ok(effects) => self.finish(&effects),
            Err(e) => self.fail(&e),
        }
    }

    // --- Properties ---

    #[wasm_bindgen(js_name = setProperty)]
    pub fn set_property(&mut self, name: &str, value: &str) -> String {
        match parse_property(name, value) {
            Ok(property) => {
                let effects = self.editor.set_property(&property);
                self.finish(&effects)
            }
            Err(e) => self.fail(&e),
        }
    }

    #[wasm_bindgen(js_name = getProperty)]
    pub fn get_property(&self, name: &str) -> Option<String> {
        match parse_property_key(name) {
            Ok(key) => Some(property_value(&self.editor.property(key))),
            Err(e) => {
                self.report(&e);
                None
            }
        }
    }

    // --- History ---

    pub fn undo(&mut self) -> String {
        let effects = self.editor.undo();
        self.finish(&effects)
    }

    pub fn redo(&mut self) -> String {
        let effects = self.editor.redo();
        self.finish(&effects)
    }

    #[wasm_bindgen(js_name = canUndo)]
    pub fn can_undo(&self) -> bool {
        self.editor.can_undo()
    }

    #[wasm_bindgen(js_name = canRedo)]
    pub fn can_redo(&self) -> bool {
        self.editor.can_redo()
    }

    // --- View ---

    /// Resize the backing canvas and re-center the image.
    #[wasm_bindgen(js_name = setViewport)]
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.canvas.set_width(width);
        self.canvas.set_height(height);
        self.editor.set_viewport(f64::from(width), f64::from(height));
        self.painted_view = None;
    }

    #[wasm_bindgen(js_name = zoomIn)]
    pub fn zoom_in(&mut self) {
        self.editor.zoom_in();
    }

    #[wasm_bindgen(js_name = zoomOut)]
    pub fn zoom_out(&mut self) {
        self.editor.zoom_out();
    }

    /// Zoom to a percentage, 100 being actual size.
    #[wasm_bindgen(js_name = zoomTo)]
    pub fn zoom_to(&mut self, percent: f64) {
        self.editor.zoom_to(ZoomTarget::Percent(percent));
    }

    /// Fit the image: `"contain"` shows all of it, `"cover"` fills the view.
    #[wasm_bindgen(js_name = zoomToFit)]
    pub fn zoom_to_fit(&mut self, fit: &str) {
        let target = match fit {
            "cover" => ZoomTarget::Cover,
            "contain" => ZoomTarget::Contain,
            other => {
                self.report(&format!("unknown fit: {other}"));
                return;
            }
        };
        self.editor.zoom_to(target);
    }

    pub fn scale(&self) -> f64 {
        self.editor.scale()
    }

    #[wasm_bindgen(js_name = offsetX)]
    pub fn offset_x(&self) -> f64 {
        self.editor.camera.offset().x
    }

    #[wasm_bindgen(js_name = offsetY)]
    pub fn offset_y(&self) -> f64 {
        self.editor.camera.offset().y
    }

    // --- Document ---

    /// Replace the document. Malformed data keeps the current one and is
    /// reported to the error handler.
    #[wasm_bindgen(js_name = loadData)]
    pub fn load_data(&mut self, raw: &str) -> String {
        match self.editor.load_data(raw) {
            Ok(effects) => self.finish(&effects),
            Err(e) => self.fail(&e),
        }
    }

    #[wasm_bindgen(js_name = getData)]
    pub fn get_data(&self) -> Option<String> {
        match self.editor.get_data() {
            Ok(json) => Some(json),
            Err(e) => {
                self.report(&e);
                None
            }
        }
    }

    /// Render the annotations alone to a PNG data URL, `width` pixels wide
    /// (actual image size when omitted). `None` when the image size is
    /// unknown or the canvas fails.
    #[wasm_bindgen(js_name = getImage)]
    pub fn get_image(&self, width: Option<u32>) -> Option<String> {
        let Some(frame) = ExportFrame::new(self.editor.doc.width, self.editor.doc.height, width) else {
            self.report(&"cannot export: image size unknown or zero width");
            return None;
        };
        match export_png(frame, &self.editor.doc) {
            Ok(url) => Some(url),
            Err(e) => {
                self.report(&format!("image export failed: {e:?}"));
                None
            }
        }
    }

    // --- Frame ---

    /// Advance timers and paint if anything changed. Returns whether a frame
    /// was drawn.
    pub fn tick(&mut self, now_ms: f64) -> bool {
        let effects = self.editor.tick(now_ms);
        if effects.contains(&Effect::RenderNeeded) { self.render() } else { false }
    }

    /// Paint now unless neither the items nor the view changed since the
    /// last frame.
    pub fn render(&mut self) -> bool {
        let view = (self.editor.camera.offset(), self.editor.scale());
        let previewing = self.editor.doc.preview().is_some();
        let ops = self.cache.plan(&self.editor.doc);
        if ops.is_empty() && self.painted_view == Some(view) && !previewing && !self.painted_preview {
            return false;
        }

        let mut surface = CanvasSurface::new(&self.ctx);
        draw_scene(&mut surface, &self.editor.doc, &self.editor.camera);
        let error = surface.error.take();

        self.painted_view = Some(view);
        self.painted_preview = previewing;
        debug!(changed = ops.len(), "frame painted");
        if let Some(e) = error {
            self.report(&format!("canvas error: {e:?}"));
        }
        true
    }
}

/// Draw `doc` onto a detached canvas of `frame`'s size and encode it.
fn export_png(frame: ExportFrame, doc: &Document) -> Result<String, JsValue> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let canvas = document
        .create_element("canvas")?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| JsValue::from_str("not a canvas"))?;
    canvas.set_width(frame.width);
    canvas.set_height(frame.height);
    let ctx = canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
        .dyn_into::<CanvasRenderingContext2d>()
        .map_err(|_| JsValue::from_str("not a 2d context"))?;

    let mut surface = CanvasSurface::new(&ctx);
    draw_export(&mut surface, doc, frame);
    if let Some(e) = surface.error.take() {
        return Err(e);
    }
    debug!(width = frame.width, height = frame.height, "annotations exported");
    canvas.to_data_url()
}

impl TopoEditor {
    /// Post-process handler effects and encode them for the host.
    fn finish(&mut self, effects: &[Effect]) -> String {
        if effects.contains(&Effect::DocumentChanged) {
            self.editor.relayout_text(&CanvasMeasure(&self.ctx));
        }
        effects_json(effects)
    }

    fn fail(&self, err: &dyn Display) -> String {
        self.report(err);
        "[]".to_string()
    }

    fn report(&self, err: &dyn Display) {
        let message = err.to_string();
        warn!(error = %message, "editor error");
        if let Some(callback) = &self.on_error {
            if let Err(e) = callback.call1(&JsValue::NULL, &JsValue::from_str(&message)) {
                warn!(error = ?e, "error callback threw");
            }
        }
    }
}
