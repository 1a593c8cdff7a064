//! Reversible edit commands.
//!
//! An [`Action`] describes one semantic edit with enough parameters to replay
//! it. [`Action::reverse`] builds the action that undoes it: creates and
//! deletes mirror each other with identical parameters, and an edit reverses
//! to an edit carrying the values it overwrote.

#[cfg(test)]
#[path = "action_test.rs"]
mod action_test;

use crate::camera::Point;
use crate::item::{Item, ItemId, ItemParams, ItemType, StampKind};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ActionError {
    #[error("item not found: {0}")]
    ItemNotFound(ItemId),
    #[error("item already exists: {0}")]
    DuplicateItem(ItemId),
    #[error("a line needs at least two control points")]
    TooFewPoints,
    #[error("text must not be empty")]
    EmptyText,
    #[error("stamp type missing")]
    MissingStampType,
    #[error("action cannot be reversed")]
    NotReversible,
}

impl ActionError {
    /// Stable code reported to the host.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ItemNotFound(_) => "E_ITEM_NOT_FOUND",
            Self::DuplicateItem(_) => "E_DUPLICATE_ITEM",
            Self::TooFewPoints => "E_TOO_FEW_POINTS",
            Self::EmptyText => "E_EMPTY_TEXT",
            Self::MissingStampType => "E_MISSING_STAMP_TYPE",
            Self::NotReversible => "E_NOT_REVERSIBLE",
        }
    }
}

/// The seven edit kinds, with stable ordinals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ActionKind {
    CreateStamp = 1,
    CreateLine = 2,
    CreateText = 3,
    EditItem = 4,
    DeleteStamp = 5,
    DeleteLine = 6,
    DeleteText = 7,
}

impl ActionKind {
    #[must_use]
    pub fn ordinal(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub fn from_ordinal(ordinal: u8) -> Option<Self> {
        match ordinal {
            1 => Some(Self::CreateStamp),
            2 => Some(Self::CreateLine),
            3 => Some(Self::CreateText),
            4 => Some(Self::EditItem),
            5 => Some(Self::DeleteStamp),
            6 => Some(Self::DeleteLine),
            7 => Some(Self::DeleteText),
            _ => None,
        }
    }

    /// The create/delete counterpart. Edits have none.
    #[must_use]
    pub fn mirror(self) -> Option<Self> {
        match self {
            Self::CreateStamp => Some(Self::DeleteStamp),
            Self::CreateLine => Some(Self::DeleteLine),
            Self::CreateText => Some(Self::DeleteText),
            Self::DeleteStamp => Some(Self::CreateStamp),
            Self::DeleteLine => Some(Self::CreateLine),
            Self::DeleteText => Some(Self::CreateText),
            Self::EditItem => None,
        }
    }

    /// The kind that deletes an item of `item_type`.
    #[must_use]
    pub fn delete_for(item_type: ItemType) -> Self {
        match item_type {
            ItemType::Line => Self::DeleteLine,
            ItemType::Text => Self::DeleteText,
            ItemType::Anchor | ItemType::Piton | ItemType::Rappel | ItemType::Belay => Self::DeleteStamp,
        }
    }
}

/// Whether an action is itself a replayed undo or redo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Replay {
    #[default]
    None,
    Undo,
    Redo,
}

/// One reversible edit.
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    pub kind: ActionKind,
    pub params: ItemParams,
    /// Prior values of the edited fields, captured on first application.
    pub old_params: Option<ItemParams>,
    pub replay: Replay,
}

impl Action {
    #[must_use]
    pub fn new(kind: ActionKind, params: ItemParams) -> Self {
        Self { kind, params, old_params: None, replay: Replay::None }
    }

    /// Place a stamp of `kind` centered on `at`.
    #[must_use]
    pub fn create_stamp(kind: StampKind, at: Point) -> Self {
        Self::new(
            ActionKind::CreateStamp,
            ItemParams { item_type: Some(kind.item_type()), x: Some(at.x), y: Some(at.y), ..ItemParams::default() },
        )
    }

    #[must_use]
    pub fn create_line(control_points: Vec<Point>, params: ItemParams) -> Self {
        Self::new(
            ActionKind::CreateLine,
            ItemParams { item_type: Some(ItemType::Line), control_points: Some(control_points), ..params },
        )
    }

    #[must_use]
    pub fn create_text(at: Point, text: String) -> Self {
        Self::new(
            ActionKind::CreateText,
            ItemParams {
                item_type: Some(ItemType::Text),
                x: Some(at.x),
                y: Some(at.y),
                text: Some(text),
                ..ItemParams::default()
            },
        )
    }

    /// Overwrite the fields present in `params` on item `id`.
    #[must_use]
    pub fn edit(id: ItemId, params: ItemParams) -> Self {
        Self::new(ActionKind::EditItem, ItemParams { id: Some(id), ..params })
    }

    /// Remove `item`, recording everything needed to recreate it.
    #[must_use]
    pub fn delete(item: &Item) -> Self {
        Self::new(ActionKind::delete_for(item.item_type()), item.snapshot())
    }

    #[must_use]
    pub fn is_replay(&self) -> bool {
        self.replay != Replay::None
    }

    /// The action that undoes this one, or `None` for an edit that never
    /// captured its prior values.
    #[must_use]
    pub fn reverse(&self) -> Option<Action> {
        match self.kind.mirror() {
            Some(kind) => Some(Action::new(kind, self.params.clone())),
            None => {
                let old = self.old_params.as_ref()?;
                Some(Action::new(ActionKind::EditItem, ItemParams { id: self.params.id, ..old.clone() }))
            }
        }
    }
}
