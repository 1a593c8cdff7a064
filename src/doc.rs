//! Document model: the ordered item list, selection, zoom and default properties.
//!
//! Items are kept in insertion order; the last item is top-most for drawing and
//! hit-testing. Every structural change goes through [`Document::run`], which
//! applies an [`Action`] and fills in what is needed to reverse it.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use uuid::Uuid;

use crate::action::{Action, ActionError, ActionKind};
use crate::camera::Point;
use crate::config::{Defaults, EditorConfig};
use crate::item::{Item, ItemId, ItemParams, ItemType};

/// Ways to pick a zoom scale directly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ZoomTarget {
    /// A percentage, 100 being actual size.
    Percent(f64),
    /// Smallest scale at which the image covers the viewport.
    Cover,
    /// Largest scale at which the whole image fits the viewport.
    Contain,
}

/// The in-progress line drawn by the line tool before it is committed.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewLine {
    pub item: Item,
    /// Where the next control point would go.
    pub cursor: Option<Point>,
}

/// The annotation document.
#[derive(Debug, Clone)]
pub struct Document {
    items: Vec<Item>,
    pub defaults: Defaults,
    zoom_levels: Vec<f64>,
    scale: f64,
    /// Background image size in document units.
    pub width: f64,
    pub height: f64,
    selection: Vec<ItemId>,
    preview: Option<PreviewLine>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new(&EditorConfig::default())
    }
}

impl Document {
    #[must_use]
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            items: Vec::new(),
            defaults: config.defaults.clone(),
            zoom_levels: config.zoom_levels.clone(),
            scale: config.initial_zoom,
            width: config.image_width,
            height: config.image_height,
            selection: Vec::new(),
            preview: None,
        }
    }

    // ── Items ───────────────────────────────────────────────────

    /// Items bottom to top.
    #[must_use]
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn item_mut(&mut self, id: ItemId) -> Option<&mut Item> {
        self.items.iter_mut().find(|i| i.id == id)
    }

    #[must_use]
    pub fn contains(&self, id: ItemId) -> bool {
        self.item(id).is_some()
    }

    /// Append `item` on top.
    pub fn insert(&mut self, item: Item) {
        self.items.push(item);
    }

    /// Remove an item, dropping it from the selection too.
    pub fn remove(&mut self, id: ItemId) -> Option<Item> {
        let index = self.items.iter().position(|i| i.id == id)?;
        self.selection.retain(|s| *s != id);
        Some(self.items.remove(index))
    }

    /// Drop every item, the selection and the preview.
    pub fn clear(&mut self) {
        self.items.clear();
        self.selection.clear();
        self.preview = None;
    }

    /// Top-most item under `p`, checking selected items first.
    #[must_use]
    pub fn hit_test(&self, p: Point) -> Option<ItemId> {
        let selected_hit = self
            .items
            .iter()
            .rev()
            .find(|i| self.is_selected(i.id) && i.hit_test(p, true));
        if let Some(item) = selected_hit {
            return Some(item.id);
        }
        self.items.iter().rev().find(|i| i.hit_test(p, false)).map(|i| i.id)
    }

    // ── Actions ─────────────────────────────────────────────────

    /// Apply `action`, returning the id of the affected item.
    ///
    /// Creates record their fully resolved parameters (including the new id)
    /// back into the action. Edits capture the overwritten values the first
    /// time they run. Deletes record the removed item's full parameters.
    ///
    /// # Errors
    ///
    /// Returns an [`ActionError`] when the action is invalid; the document is
    /// left untouched.
    pub fn run(&mut self, action: &mut Action) -> Result<ItemId, ActionError> {
        match action.kind {
            ActionKind::CreateStamp => {
                let item_type = action
                    .params
                    .item_type
                    .filter(|t| t.stamp_kind().is_some())
                    .ok_or(ActionError::MissingStampType)?;
                self.create(item_type, action)
            }
            ActionKind::CreateLine => {
                let enough = action.params.control_points.as_ref().is_some_and(|cps| cps.len() > 1);
                if !enough {
                    return Err(ActionError::TooFewPoints);
                }
                self.create(ItemType::Line, action)
            }
            ActionKind::CreateText => {
                let has_text = action.params.text.as_ref().is_some_and(|t| !t.trim().is_empty());
                if !has_text {
                    return Err(ActionError::EmptyText);
                }
                self.create(ItemType::Text, action)
            }
            ActionKind::EditItem => {
                let id = action.params.id.unwrap_or_else(Uuid::nil);
                let item = self.item_mut(id).ok_or(ActionError::ItemNotFound(id))?;
                if action.old_params.is_none() {
                    let old = item.action_params().masked_by(&action.params);
                    action.old_params = Some(ItemParams { id: Some(id), ..old });
                }
                item.set_action_params(&action.params);
                Ok(id)
            }
            ActionKind::DeleteStamp | ActionKind::DeleteLine | ActionKind::DeleteText => {
                let id = action.params.id.unwrap_or_else(Uuid::nil);
                let removed = self.remove(id).ok_or(ActionError::ItemNotFound(id))?;
                action.params = removed.snapshot();
                Ok(id)
            }
        }
    }

    fn create(&mut self, item_type: ItemType, action: &mut Action) -> Result<ItemId, ActionError> {
        if let Some(id) = action.params.id.filter(|id| self.contains(*id)) {
            return Err(ActionError::DuplicateItem(id));
        }
        let item = Item::build(item_type, &action.params, &self.defaults);
        let id = item.id;
        action.params = item.snapshot();
        self.insert(item);
        Ok(id)
    }

    // ── Selection ───────────────────────────────────────────────

    /// Selected ids in selection order.
    #[must_use]
    pub fn selection(&self) -> &[ItemId] {
        &self.selection
    }

    #[must_use]
    pub fn is_selected(&self, id: ItemId) -> bool {
        self.selection.contains(&id)
    }

    /// Make `id` the only selected item. Returns whether the selection changed.
    pub fn select(&mut self, id: ItemId) -> bool {
        if !self.contains(id) || self.selection == [id] {
            return false;
        }
        self.selection = vec![id];
        true
    }

    /// Add `id` to the selection. Returns whether the selection changed.
    pub fn add_to_selection(&mut self, id: ItemId) -> bool {
        if !self.contains(id) || self.is_selected(id) {
            return false;
        }
        self.selection.push(id);
        true
    }

    /// Clear the selection. Returns whether anything was selected.
    pub fn deselect_all(&mut self) -> bool {
        let changed = !self.selection.is_empty();
        self.selection.clear();
        changed
    }

    /// The selected items.
    pub fn selected_items(&self) -> impl Iterator<Item = &Item> {
        self.items.iter().filter(|i| self.is_selected(i.id))
    }

    // ── Preview line ────────────────────────────────────────────

    #[must_use]
    pub fn preview(&self) -> Option<&PreviewLine> {
        self.preview.as_ref()
    }

    pub fn preview_mut(&mut self) -> Option<&mut PreviewLine> {
        self.preview.as_mut()
    }

    pub fn set_preview(&mut self, preview: Option<PreviewLine>) {
        self.preview = preview;
    }

    // ── Zoom ────────────────────────────────────────────────────

    /// Current zoom scale.
    #[must_use]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    #[must_use]
    pub fn zoom_levels(&self) -> &[f64] {
        &self.zoom_levels
    }

    /// Step to the next larger zoom level. Returns the change factor, or
    /// `None` when already at the largest level.
    pub fn zoom_in(&mut self) -> Option<f64> {
        let next = self.zoom_levels.iter().copied().find(|l| *l > self.scale)?;
        Some(self.set_scale(next))
    }

    /// Step to the next smaller zoom level. Returns the change factor, or
    /// `None` when already at the smallest level.
    pub fn zoom_out(&mut self) -> Option<f64> {
        let prev = self.zoom_levels.iter().rev().copied().find(|l| *l < self.scale)?;
        Some(self.set_scale(prev))
    }

    /// Jump to a zoom target for the given viewport. Returns the change factor,
    /// or `None` when the target is unusable.
    pub fn zoom_to(&mut self, target: ZoomTarget, viewport_w: f64, viewport_h: f64) -> Option<f64> {
        let scale = match target {
            ZoomTarget::Percent(p) => p / 100.0,
            ZoomTarget::Cover | ZoomTarget::Contain => {
                if self.width <= 0.0 || self.height <= 0.0 {
                    return None;
                }
                let sx = viewport_w / self.width;
                let sy = viewport_h / self.height;
                if target == ZoomTarget::Cover { sx.max(sy) } else { sx.min(sy) }
            }
        };
        if !(scale.is_finite() && scale > 0.0) {
            tracing::debug!(?target, "ignoring invalid zoom target");
            return None;
        }
        Some(self.set_scale(self.clamp_scale(scale)))
    }

    /// Image size at the current scale.
    #[must_use]
    pub fn scaled_size(&self) -> (f64, f64) {
        (self.width * self.scale, self.height * self.scale)
    }

    fn clamp_scale(&self, scale: f64) -> f64 {
        match (self.zoom_levels.first(), self.zoom_levels.last()) {
            (Some(lo), Some(hi)) => scale.clamp(*lo, *hi),
            _ => scale,
        }
    }

    fn set_scale(&mut self, scale: f64) -> f64 {
        let factor = scale / self.scale;
        self.scale = scale;
        factor
    }
}
