//! Editor context: the document, its history, the camera and the active mode.
//!
//! Every input handler returns the [`Effect`]s the host should act on, in
//! order. Redraw requests are coalesced: handlers only mark the editor dirty and
//! [`Editor::tick`] reports one [`Effect::RenderNeeded`] per burst. The same
//! tick closes any undo batch a gesture left open.

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use tracing::{debug, warn};

use crate::action::{Action, ActionError};
use crate::camera::{Camera, Point};
use crate::config::{EditorConfig, is_valid_property};
use crate::doc::{Document, ZoomTarget};
use crate::history::History;
use crate::item::{ItemId, ItemParams, ItemType, Property, PropertyKey, Shape, StampKind, TextMeasure};
use crate::mode::{Button, Context, Key, Mode, Modifiers, Tool};
use crate::snapshot::{self, SnapshotError};

/// Where submitted text goes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TextTarget {
    /// A new text block at this document point.
    New(Point),
    /// The text or label of an existing item.
    Item(ItemId),
}

/// Notifications returned from handlers for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    RenderNeeded,
    SelectionChanged(Vec<ItemId>),
    ModeChanged(Tool),
    DocumentChanged,
    /// Open the text-entry dialog; answer with [`Editor::submit_text`].
    EditTextRequested { target: TextTarget, text: String },
    SetCursor(String),
}

/// The editing session.
pub struct Editor {
    pub doc: Document,
    pub history: History,
    pub camera: Camera,
    mode: Mode,
    config: EditorConfig,
    needs_render: bool,
    last_flush_ms: Option<f64>,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl Editor {
    #[must_use]
    pub fn new(config: EditorConfig) -> Self {
        let config = config.sanitize();
        Self {
            doc: Document::new(&config),
            history: History::new(),
            camera: Camera::default(),
            mode: Mode::default(),
            config,
            needs_render: true,
            last_flush_ms: None,
        }
    }

    /// Run `f` against the mode with a context borrowed from `self`, then
    /// perform any mode switch it asked for.
    fn dispatch<F>(&mut self, f: F) -> Vec<Effect>
    where
        F: FnOnce(&mut Mode, &mut Context<'_>) -> Option<Tool>,
    {
        let mut cx = Context {
            doc: &mut self.doc,
            history: &mut self.history,
            camera: &mut self.camera,
            drag_threshold: self.config.drag_threshold_px,
            effects: Vec::new(),
            needs_render: false,
        };
        if let Some(tool) = f(&mut self.mode, &mut cx) {
            switch_mode(&mut self.mode, &mut cx, tool);
        }
        self.needs_render |= cx.needs_render;
        cx.effects
    }

    // --- Mode ---

    #[must_use]
    pub fn tool(&self) -> Tool {
        self.mode.tool()
    }

    /// Tool-selection signal. Re-selecting the active tool does nothing.
    pub fn set_mode(&mut self, tool: Tool) -> Vec<Effect> {
        if tool == self.mode.tool() {
            return Vec::new();
        }
        self.dispatch(|_, _| Some(tool))
    }

    // --- Input events ---

    pub fn on_pointer_down(&mut self, screen: Point, button: Button, modifiers: Modifiers) -> Vec<Effect> {
        if button != Button::Primary {
            return Vec::new();
        }
        self.dispatch(|mode, cx| mode.on_pointer_down(cx, screen, modifiers))
    }

    pub fn on_pointer_move(&mut self, screen: Point) -> Vec<Effect> {
        self.dispatch(|mode, cx| {
            mode.on_pointer_move(cx, screen);
            None
        })
    }

    pub fn on_pointer_up(&mut self, screen: Point, button: Button) -> Vec<Effect> {
        if button != Button::Primary {
            return Vec::new();
        }
        self.dispatch(|mode, cx| {
            mode.on_pointer_up(cx, screen);
            None
        })
    }

    pub fn on_double_click(&mut self, screen: Point) -> Vec<Effect> {
        self.dispatch(|mode, cx| mode.on_double_click(cx, screen))
    }

    /// Keys the active mode declines fall through to the global shortcuts.
    pub fn on_key_down(&mut self, key: &Key, modifiers: Modifiers) -> Vec<Effect> {
        let mut consumed = false;
        let mut effects = self.dispatch(|mode, cx| {
            let next = mode.on_key_down(cx, key);
            consumed = next.is_some();
            next
        });
        if consumed {
            return effects;
        }

        if modifiers.command() {
            match key.0.as_str() {
                "z" | "Z" if modifiers.shift => effects.extend(self.redo()),
                "z" => effects.extend(self.undo()),
                "y" | "Y" => effects.extend(self.redo()),
                "-" | "_" => effects.extend(self.zoom_out()),
                "=" | "+" => effects.extend(self.zoom_in()),
                _ => {}
            }
            return effects;
        }
        if modifiers.alt {
            return effects;
        }

        let tool = match key.0.as_str() {
            "a" => Some(Tool::Stamp(Some(StampKind::Anchor))),
            "b" => Some(Tool::Stamp(Some(StampKind::Belay))),
            "p" => Some(Tool::Stamp(Some(StampKind::Piton))),
            "r" => Some(Tool::Stamp(Some(StampKind::Rappel))),
            "l" => Some(Tool::Line),
            "t" => Some(Tool::Text),
            "v" | "Escape" => Some(Tool::Select),
            "Delete" | "Backspace" => {
                effects.extend(self.delete_selected());
                None
            }
            _ => None,
        };
        if let Some(tool) = tool {
            effects.extend(self.set_mode(tool));
        }
        effects
    }

    // --- Editing ---

    /// Answer an [`Effect::EditTextRequested`].
    ///
    /// A new target creates a text block. An existing text block gets its
    /// content replaced; a labelled stamp gets its label replaced.
    ///
    /// # Errors
    ///
    /// [`ActionError::EmptyText`] for blank text on a text block, or
    /// [`ActionError::ItemNotFound`] if the item is gone.
    pub fn submit_text(&mut self, target: TextTarget, text: &str) -> Result<Vec<Effect>, ActionError> {
        let action = match target {
            TextTarget::New(at) => Action::create_text(at, text.to_string()),
            TextTarget::Item(id) => {
                let item = self.doc.item(id).ok_or(ActionError::ItemNotFound(id))?;
                match item.item_type() {
                    ItemType::Text if text.trim().is_empty() => return Err(ActionError::EmptyText),
                    ItemType::Text => {
                        Action::edit(id, ItemParams { text: Some(text.to_string()), ..ItemParams::default() })
                    }
                    _ => Action::edit(id, ItemParams { label: Some(text.to_string()), ..ItemParams::default() }),
                }
            }
        };
        self.apply(action)?;
        Ok(self.changed())
    }

    /// Apply `action` as its own undo step (or into the open batch).
    ///
    /// # Errors
    ///
    /// Returns the [`ActionError`] if the action is invalid; nothing changes.
    pub fn apply(&mut self, action: Action) -> Result<ItemId, ActionError> {
        let id = self.history.apply(&mut self.doc, action)?;
        self.needs_render = true;
        Ok(id)
    }

    pub fn begin_batch(&mut self) {
        self.history.begin_batch();
    }

    pub fn end_batch(&mut self) {
        self.history.end_batch();
    }

    /// Delete every selected item as one undo step.
    pub fn delete_selected(&mut self) -> Vec<Effect> {
        let doomed: Vec<Action> = self.doc.selected_items().map(Action::delete).collect();
        if doomed.is_empty() {
            return Vec::new();
        }
        self.history.begin_batch();
        for action in doomed {
            if let Err(e) = self.apply(action) {
                warn!(error = %e, "delete failed");
            }
        }
        self.history.end_batch();
        let mut effects = self.changed();
        effects.push(Effect::SelectionChanged(self.doc.selection().to_vec()));
        effects
    }

    /// Apply a property to every selected item as one undo step, or to the
    /// defaults for new items when nothing is selected.
    pub fn set_property(&mut self, property: &Property) -> Vec<Effect> {
        if !is_valid_property(property) {
            debug!(?property, "ignoring invalid property value");
            return Vec::new();
        }
        let selection = self.doc.selection().to_vec();
        if selection.is_empty() {
            self.doc.defaults.set(property);
            return Vec::new();
        }
        let params = property.to_params();
        let mut applied = 0;
        self.history.begin_batch();
        for id in selection {
            let applies = self.doc.item(id).is_some_and(|item| accepts(&item.shape, property.key()));
            if !applies {
                continue;
            }
            match self.apply(Action::edit(id, params.clone())) {
                Ok(_) => applied += 1,
                Err(e) => warn!(%id, error = %e, "property edit failed"),
            }
        }
        self.history.end_batch();
        if applied == 0 { Vec::new() } else { self.changed() }
    }

    /// The property as shown for the first selected item that has it, or the
    /// default for new items.
    #[must_use]
    pub fn property(&self, key: PropertyKey) -> Property {
        self.doc
            .selected_items()
            .find_map(|item| Property::from_params(&item.action_params(), key))
            .unwrap_or_else(|| self.doc.defaults.get(key))
    }

    pub fn undo(&mut self) -> Vec<Effect> {
        if !self.history.undo(&mut self.doc) {
            return Vec::new();
        }
        self.after_replay()
    }

    pub fn redo(&mut self) -> Vec<Effect> {
        if !self.history.redo(&mut self.doc) {
            return Vec::new();
        }
        self.after_replay()
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    fn after_replay(&mut self) -> Vec<Effect> {
        let mut effects = self.changed();
        effects.push(Effect::SelectionChanged(self.doc.selection().to_vec()));
        effects
    }

    fn changed(&mut self) -> Vec<Effect> {
        self.needs_render = true;
        vec![Effect::DocumentChanged]
    }

    /// Re-measure every text block with real font metrics.
    pub fn relayout_text(&mut self, measure: &dyn TextMeasure) {
        let texts: Vec<ItemId> =
            self.doc.items().iter().filter(|item| matches!(item.shape, Shape::Text(_))).map(|item| item.id).collect();
        for id in texts {
            if let Some(item) = self.doc.item_mut(id) {
                item.layout(measure);
            }
        }
        self.needs_render = true;
    }

    // --- Zoom and viewport ---

    /// Current zoom scale.
    #[must_use]
    pub fn scale(&self) -> f64 {
        self.doc.scale()
    }

    #[must_use]
    pub fn screen_to_doc(&self, screen: Point) -> Point {
        self.camera.screen_to_doc(screen, self.doc.scale())
    }

    /// Resize the viewport and center the image in it.
    pub fn set_viewport(&mut self, width: f64, height: f64) {
        self.camera.viewport_width = width;
        self.camera.viewport_height = height;
        let (w, h) = self.doc.scaled_size();
        self.camera.center(w, h);
        self.needs_render = true;
    }

    pub fn zoom_in(&mut self) -> Vec<Effect> {
        let factor = self.doc.zoom_in();
        self.rescaled(factor)
    }

    pub fn zoom_out(&mut self) -> Vec<Effect> {
        let factor = self.doc.zoom_out();
        self.rescaled(factor)
    }

    pub fn zoom_to(&mut self, target: ZoomTarget) -> Vec<Effect> {
        let factor = self.doc.zoom_to(target, self.camera.viewport_width, self.camera.viewport_height);
        self.rescaled(factor)
    }

    fn rescaled(&mut self, factor: Option<f64>) -> Vec<Effect> {
        let Some(factor) = factor else {
            return Vec::new();
        };
        let (w, h) = self.doc.scaled_size();
        self.camera.rescale_about_center(factor, w, h);
        debug!(scale = self.doc.scale(), "zoom changed");
        self.needs_render = true;
        Vec::new()
    }

    // --- Document I/O ---

    /// Replace the document with a saved one. History and selection are reset.
    ///
    /// # Errors
    ///
    /// [`SnapshotError::InvalidData`] when the top level is malformed; the
    /// current document is kept.
    pub fn load_data(&mut self, raw: &str) -> Result<Vec<Effect>, SnapshotError> {
        let items = snapshot::parse(raw, &self.doc.defaults)?;
        let mut effects = self.set_mode(Tool::Select);
        self.doc.clear();
        for item in items {
            self.doc.insert(item);
        }
        self.history.clear();
        debug!(items = self.doc.len(), "document loaded");
        effects.extend(self.changed());
        effects.push(Effect::SelectionChanged(Vec::new()));
        Ok(effects)
    }

    /// Serialize the document.
    ///
    /// # Errors
    ///
    /// [`SnapshotError::Encode`] if serialization fails.
    pub fn get_data(&self) -> Result<String, SnapshotError> {
        snapshot::to_json(self.doc.items())
    }

    // --- Scheduler ---

    /// Advance timers to `now_ms`: flush a dangling undo batch every flush
    /// interval and report a pending redraw.
    pub fn tick(&mut self, now_ms: f64) -> Vec<Effect> {
        let due = self.last_flush_ms.is_none_or(|last| now_ms - last >= self.config.undo_flush_interval_ms);
        if due {
            self.last_flush_ms = Some(now_ms);
            if self.history.flush() {
                self.needs_render = true;
            }
        }
        if std::mem::take(&mut self.needs_render) { vec![Effect::RenderNeeded] } else { Vec::new() }
    }

    /// Whether a redraw is pending.
    #[must_use]
    pub fn needs_render(&self) -> bool {
        self.needs_render
    }
}

fn switch_mode(mode: &mut Mode, cx: &mut Context<'_>, tool: Tool) {
    mode.deactivate(cx);
    *mode = Mode::activate(tool, cx.doc);
    let tool = mode.tool();
    debug!(?tool, "mode changed");
    cx.effects.push(Effect::ModeChanged(tool));
    cx.effects.push(Effect::SetCursor(tool.cursor().to_string()));
    cx.render();
}

/// Whether a property applies to a shape.
fn accepts(shape: &Shape, key: PropertyKey) -> bool {
    match key {
        PropertyKey::Color | PropertyKey::Scale | PropertyKey::Alpha => true,
        PropertyKey::LineWidth => !matches!(shape, Shape::Text(_)),
        PropertyKey::OnLength | PropertyKey::OffLength | PropertyKey::Curved => matches!(shape, Shape::Line(_)),
        PropertyKey::Align | PropertyKey::Background => matches!(shape, Shape::Text(_)),
    }
}
