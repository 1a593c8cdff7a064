//! Input model: tools, modifier keys, and the per-tool interaction state machine.
//!
//! `Tool` is the host-facing tool selection. `Mode` is the active tool plus
//! whatever transient gesture state it tracks between pointer-down and
//! pointer-up. Handlers run against a [`Context`] borrowed from the editor and
//! return the tool to switch to, if any; the editor performs the switch so that
//! leaving a mode always discards its transient state.

#[cfg(test)]
#[path = "mode_test.rs"]
mod mode_test;

use tracing::{debug, warn};

use crate::action::Action;
use crate::camera::{Camera, Point};
use crate::consts::CONTROL_POINT_GRAB_SQ;
use crate::doc::{Document, PreviewLine};
use crate::engine::{Effect, TextTarget};
use crate::history::History;
use crate::item::{Item, ItemId, ItemParams, ItemType, StampKind};

/// Which tool is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tool {
    /// Pick, drag and pan (default).
    #[default]
    Select,
    /// Click out a line one control point at a time.
    Line,
    /// Drop a stamp. `None` until a stamp kind is chosen.
    Stamp(Option<StampKind>),
    /// Place a text block.
    Text,
    /// Move the control points of the selected line.
    LineEdit,
}

impl Tool {
    /// CSS cursor shown while the tool is active.
    #[must_use]
    pub fn cursor(self) -> &'static str {
        match self {
            Self::Select => "default",
            Self::Line | Self::Stamp(_) => "crosshair",
            Self::Text => "text",
            Self::LineEdit => "pointer",
        }
    }
}

/// Keyboard/mouse modifier keys held during an event.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    /// Ctrl on most platforms, Cmd on macOS.
    #[must_use]
    pub fn command(self) -> bool {
        self.ctrl || self.meta
    }
}

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Primary,
    Middle,
    Secondary,
}

/// A keyboard key as reported by the browser (`"Enter"`, `"a"`, `"Delete"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key(pub String);

/// Editor state a mode handler may touch.
pub struct Context<'a> {
    pub doc: &'a mut Document,
    pub history: &'a mut History,
    pub camera: &'a mut Camera,
    /// Screen pixels a drag must travel before it counts as a move.
    pub drag_threshold: f64,
    pub effects: Vec<Effect>,
    pub needs_render: bool,
}

impl Context<'_> {
    /// Map a screen point to document coordinates at the current zoom.
    #[must_use]
    pub fn to_doc(&self, screen: Point) -> Point {
        self.camera.screen_to_doc(screen, self.doc.scale())
    }

    /// Apply an action through the history, reporting the document change.
    /// Failures are logged and swallowed; the document is left as it was.
    pub fn apply(&mut self, action: Action) -> Option<ItemId> {
        let kind = action.kind;
        match self.history.apply(self.doc, action) {
            Ok(id) => {
                self.document_changed();
                Some(id)
            }
            Err(e) => {
                warn!(?kind, code = e.error_code(), error = %e, "action rejected");
                None
            }
        }
    }

    pub fn render(&mut self) {
        self.needs_render = true;
    }

    pub fn document_changed(&mut self) {
        self.needs_render = true;
        self.push_once(Effect::DocumentChanged);
    }

    pub fn selection_changed(&mut self) {
        self.needs_render = true;
        self.effects.retain(|e| !matches!(e, Effect::SelectionChanged(_)));
        self.effects.push(Effect::SelectionChanged(self.doc.selection().to_vec()));
    }

    fn push_once(&mut self, effect: Effect) {
        if !self.effects.contains(&effect) {
            self.effects.push(effect);
        }
    }
}

// ── Mode state ──────────────────────────────────────────────────

/// Select-tool gesture between pointer-down and pointer-up.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SelectGesture {
    #[default]
    Idle,
    /// Moving the selected items.
    Dragging { start: Point },
    /// Panning the canvas.
    Panning { start: Point },
}

/// Line-tool progress: the committed line once it has two points.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LineState {
    pub line: Option<ItemId>,
}

/// A control point being dragged in line-edit mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grab {
    pub index: usize,
    pub original: Point,
    /// Document point where the drag started.
    pub pressed: Point,
}

impl Grab {
    /// Where the point sits with the pointer at `p`: it follows the pointer's
    /// travel, not its absolute position.
    #[must_use]
    pub fn target(&self, p: Point) -> Point {
        self.original + (p - self.pressed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineEditState {
    pub line: ItemId,
    pub grab: Option<Grab>,
}

/// The active tool and its transient state.
#[derive(Debug, Clone, PartialEq)]
pub enum Mode {
    Select(SelectGesture),
    Line(LineState),
    Stamp(Option<StampKind>),
    Text,
    LineEdit(LineEditState),
}

impl Default for Mode {
    fn default() -> Self {
        Self::Select(SelectGesture::Idle)
    }
}

impl Mode {
    /// Enter `tool`, seeding state from the document where needed.
    ///
    /// Line-edit needs a selected line; without one the select tool is entered.
    #[must_use]
    pub fn activate(tool: Tool, doc: &Document) -> Self {
        match tool {
            Tool::Select => Self::Select(SelectGesture::Idle),
            Tool::Line => Self::Line(LineState::default()),
            Tool::Stamp(kind) => Self::Stamp(kind),
            Tool::Text => Self::Text,
            Tool::LineEdit => {
                let line = doc.selected_items().find(|i| i.item_type() == ItemType::Line).map(|i| i.id);
                match line {
                    Some(line) => Self::LineEdit(LineEditState { line, grab: None }),
                    None => {
                        debug!("line edit needs a selected line");
                        Self::Select(SelectGesture::Idle)
                    }
                }
            }
        }
    }

    #[must_use]
    pub fn tool(&self) -> Tool {
        match self {
            Self::Select(_) => Tool::Select,
            Self::Line(_) => Tool::Line,
            Self::Stamp(kind) => Tool::Stamp(*kind),
            Self::Text => Tool::Text,
            Self::LineEdit(_) => Tool::LineEdit,
        }
    }

    /// Discard transient state before leaving this mode.
    pub fn deactivate(&mut self, cx: &mut Context<'_>) {
        match self {
            Self::Select(gesture) => {
                match *gesture {
                    SelectGesture::Dragging { .. } => clear_offsets(cx),
                    SelectGesture::Panning { .. } => cx.camera.end_pan(),
                    SelectGesture::Idle => {}
                }
                *gesture = SelectGesture::Idle;
            }
            Self::Line(state) => {
                cx.doc.set_preview(None);
                state.line = None;
                cx.render();
            }
            Self::LineEdit(state) => {
                if let Some(grab) = state.grab.take() {
                    restore_point(cx.doc, state.line, grab);
                }
                cx.render();
            }
            Self::Stamp(_) | Self::Text => {}
        }
    }

    pub fn on_pointer_down(&mut self, cx: &mut Context<'_>, screen: Point, modifiers: Modifiers) -> Option<Tool> {
        let p = cx.to_doc(screen);
        match self {
            Self::Select(gesture) => {
                *gesture = select_down(cx, screen, p, modifiers);
                None
            }
            Self::Line(state) => {
                line_click(cx, state, p);
                None
            }
            Self::Stamp(Some(kind)) => {
                cx.apply(Action::create_stamp(*kind, p));
                None
            }
            Self::Stamp(None) => None,
            Self::Text => {
                cx.effects.push(Effect::EditTextRequested { target: TextTarget::New(p), text: String::new() });
                None
            }
            Self::LineEdit(state) => {
                let hit = cx
                    .doc
                    .item(state.line)
                    .and_then(Item::as_line)
                    .and_then(|line| {
                        let index = line.control_point_near(p, CONTROL_POINT_GRAB_SQ)?;
                        Some(Grab { index, original: line.control_points()[index], pressed: p })
                    });
                match hit {
                    Some(grab) => {
                        state.grab = Some(grab);
                        None
                    }
                    None => Some(Tool::Select),
                }
            }
        }
    }

    pub fn on_pointer_move(&mut self, cx: &mut Context<'_>, screen: Point) {
        match self {
            Self::Select(SelectGesture::Dragging { start }) => {
                let delta = (screen - *start) * (1.0 / cx.doc.scale());
                let selection = cx.doc.selection().to_vec();
                for id in selection {
                    if let Some(item) = cx.doc.item_mut(id) {
                        item.set_offset(delta);
                    }
                }
                cx.render();
            }
            Self::Select(SelectGesture::Panning { start }) => {
                let delta = screen - *start;
                cx.camera.pan_to(delta.x, delta.y);
                cx.render();
            }
            Self::Line(_) => {
                let p = cx.to_doc(screen);
                if let Some(preview) = cx.doc.preview_mut() {
                    preview.cursor = Some(p);
                    cx.render();
                }
            }
            Self::LineEdit(LineEditState { line, grab: Some(grab) }) => {
                let p = cx.to_doc(screen);
                if let Some(l) = cx.doc.item_mut(*line).and_then(Item::as_line_mut) {
                    l.move_control_point(grab.index, grab.target(p));
                    cx.render();
                }
            }
            Self::Select(SelectGesture::Idle) | Self::Stamp(_) | Self::Text | Self::LineEdit(_) => {}
        }
    }

    pub fn on_pointer_up(&mut self, cx: &mut Context<'_>, screen: Point) {
        match self {
            Self::Select(gesture) => {
                match *gesture {
                    SelectGesture::Dragging { start } => {
                        if screen.distance(start) > cx.drag_threshold {
                            commit_offsets(cx);
                        } else {
                            clear_offsets(cx);
                        }
                    }
                    SelectGesture::Panning { .. } => {
                        cx.camera.end_pan();
                        cx.render();
                    }
                    SelectGesture::Idle => {}
                }
                *gesture = SelectGesture::Idle;
            }
            Self::LineEdit(state) => {
                let Some(grab) = state.grab.take() else {
                    return;
                };
                let release = grab.target(cx.to_doc(screen));
                if let Some(l) = cx.doc.item_mut(state.line).and_then(Item::as_line_mut) {
                    l.move_control_point(grab.index, release);
                }
                let Some(moved) = restore_point(cx.doc, state.line, grab) else {
                    return;
                };
                if moved.len() > grab.index && moved[grab.index] != grab.original {
                    let params = ItemParams { control_points: Some(moved), ..ItemParams::default() };
                    cx.apply(Action::edit(state.line, params));
                }
            }
            Self::Line(_) | Self::Stamp(_) | Self::Text => {}
        }
    }

    /// Double-click: open a line for editing or request text entry.
    pub fn on_double_click(&mut self, cx: &mut Context<'_>, screen: Point) -> Option<Tool> {
        if !matches!(self, Self::Select(_)) {
            return None;
        }
        let p = cx.to_doc(screen);
        let item = cx.doc.hit_test(p).and_then(|id| cx.doc.item(id))?;
        let id = item.id;
        let is_line = item.item_type() == ItemType::Line;
        let text = item.has_editable_text().then(|| item.text_content().unwrap_or_default().to_string());

        if is_line {
            if cx.doc.select(id) {
                cx.selection_changed();
            }
            return Some(Tool::LineEdit);
        }
        if let Some(text) = text {
            cx.effects.push(Effect::EditTextRequested { target: TextTarget::Item(id), text });
        }
        None
    }

    /// Mode-specific keys. `None` means the key was not consumed.
    pub fn on_key_down(&mut self, _cx: &mut Context<'_>, key: &Key) -> Option<Tool> {
        match self {
            Self::Line(_) | Self::LineEdit(_) if key.0 == "Enter" => Some(Tool::Select),
            _ => None,
        }
    }
}

// ── Select helpers ──────────────────────────────────────────────

fn select_down(cx: &mut Context<'_>, screen: Point, p: Point, modifiers: Modifiers) -> SelectGesture {
    if let Some(id) = cx.doc.hit_test(p) {
        let changed = if modifiers.shift {
            cx.doc.add_to_selection(id)
        } else if cx.doc.is_selected(id) {
            false
        } else {
            cx.doc.select(id)
        };
        if changed {
            cx.selection_changed();
        }
        return SelectGesture::Dragging { start: screen };
    }

    if cx.doc.deselect_all() {
        cx.selection_changed();
    }
    let (w, h) = cx.doc.scaled_size();
    cx.camera.start_pan(w, h);
    SelectGesture::Panning { start: screen }
}

/// Commit every staged drag offset as one undo step.
fn commit_offsets(cx: &mut Context<'_>) {
    let moves: Vec<(ItemId, ItemParams)> = cx
        .doc
        .selection()
        .to_vec()
        .into_iter()
        .filter_map(|id| cx.doc.item_mut(id).map(|item| (id, item.apply_offset())))
        .collect();
    cx.history.begin_batch();
    for (id, params) in moves {
        cx.apply(Action::edit(id, params));
    }
    cx.history.end_batch();
}

fn clear_offsets(cx: &mut Context<'_>) {
    let selection = cx.doc.selection().to_vec();
    for id in selection {
        if let Some(item) = cx.doc.item_mut(id) {
            item.set_offset(Point::default());
        }
    }
    cx.render();
}

// ── Line helpers ────────────────────────────────────────────────

fn line_click(cx: &mut Context<'_>, state: &mut LineState, p: Point) {
    if state.line.is_some_and(|id| !cx.doc.contains(id)) {
        debug!("line removed while drawing; starting over");
        state.line = None;
        cx.doc.set_preview(None);
    }

    let Some(last) = cx.doc.preview().and_then(|pv| pv.item.as_line()).and_then(|l| l.control_points().last().copied())
    else {
        start_preview(cx, p);
        return;
    };

    match state.line {
        None => {
            let style = cx.doc.preview().map(|pv| pv.item.action_params()).unwrap_or_default();
            state.line = cx.apply(Action::create_line(vec![last, p], style));
        }
        Some(id) => {
            let Some(mut points) = cx.doc.item(id).and_then(Item::as_line).map(|l| l.control_points().to_vec())
            else {
                return;
            };
            points.push(p);
            cx.apply(Action::edit(id, ItemParams { control_points: Some(points), ..ItemParams::default() }));
        }
    }

    if let Some(line) = cx.doc.preview_mut().and_then(|pv| pv.item.as_line_mut()) {
        line.set_control_points(vec![p]);
    }
    cx.render();
}

/// The preview holds the last placed point; the rubber band runs from it to
/// the cursor.
fn start_preview(cx: &mut Context<'_>, p: Point) {
    let params = ItemParams { control_points: Some(vec![p]), ..ItemParams::default() };
    let item = Item::build(ItemType::Line, &params, &cx.doc.defaults);
    cx.doc.set_preview(Some(PreviewLine { item, cursor: Some(p) }));
    cx.render();
}

// ── Line-edit helpers ───────────────────────────────────────────

/// Put a dragged control point back, returning the points as they were
/// while dragged.
fn restore_point(doc: &mut Document, line: ItemId, grab: Grab) -> Option<Vec<Point>> {
    let l = doc.item_mut(line).and_then(Item::as_line_mut)?;
    let moved = l.control_points().to_vec();
    l.move_control_point(grab.index, grab.original);
    Some(moved)
}
