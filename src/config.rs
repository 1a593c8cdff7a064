//! Editor configuration parsed from the host's JSON options.
//!
//! Every field is optional. Missing fields take their defaults; present but
//! invalid values (non-finite or non-positive numbers, malformed colours, an
//! unusable zoom table) fall back to defaults during [`EditorConfig::sanitize`].

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use serde::{Deserialize, Serialize};

use crate::consts::{DRAG_THRESHOLD_PX, UNDO_FLUSH_INTERVAL_MS, ZOOM_LEVELS};
use crate::item::{Property, PropertyKey, TextAlign};

pub const DEFAULT_COLOR: &str = "#ffff00";
pub const DEFAULT_SCALE: f64 = 1.0;
pub const DEFAULT_ALPHA: f64 = 1.0;
pub const DEFAULT_LINE_WIDTH: f64 = 3.0;
pub const DEFAULT_ON_LENGTH: f64 = 10.0;
pub const DEFAULT_OFF_LENGTH: f64 = 0.0;
pub const DEFAULT_ZOOM: f64 = 1.0;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Property values used for new items when no override is given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Defaults {
    #[serde(rename = "ic")]
    pub color: String,
    #[serde(rename = "is")]
    pub scale: f64,
    #[serde(rename = "ia")]
    pub alpha: f64,
    #[serde(rename = "iw")]
    pub line_width: f64,
    #[serde(rename = "lon")]
    pub on_length: f64,
    #[serde(rename = "lof")]
    pub off_length: f64,
    #[serde(rename = "lc")]
    pub curved: bool,
    #[serde(rename = "ta")]
    pub align: TextAlign,
    #[serde(rename = "tbg")]
    pub background: bool,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            color: DEFAULT_COLOR.to_string(),
            scale: DEFAULT_SCALE,
            alpha: DEFAULT_ALPHA,
            line_width: DEFAULT_LINE_WIDTH,
            on_length: DEFAULT_ON_LENGTH,
            off_length: DEFAULT_OFF_LENGTH,
            curved: false,
            align: TextAlign::Left,
            background: false,
        }
    }
}

impl Defaults {
    /// Replace invalid values with the built-in defaults.
    #[must_use]
    pub fn sanitize(mut self) -> Self {
        let fallback = Self::default();
        if !is_valid_color(&self.color) {
            tracing::debug!(color = %self.color, "invalid default colour; using fallback");
            self.color = fallback.color;
        }
        self.scale = positive_or(self.scale, fallback.scale);
        self.alpha = positive_or(self.alpha, fallback.alpha).min(1.0);
        self.line_width = positive_or(self.line_width, fallback.line_width);
        self.on_length = positive_or(self.on_length, fallback.on_length);
        if !(self.off_length.is_finite() && self.off_length >= 0.0) {
            self.off_length = fallback.off_length;
        }
        self
    }

    /// Current value of `key`.
    #[must_use]
    pub fn get(&self, key: PropertyKey) -> Property {
        match key {
            PropertyKey::Color => Property::Color(self.color.clone()),
            PropertyKey::Scale => Property::Scale(self.scale),
            PropertyKey::Alpha => Property::Alpha(self.alpha),
            PropertyKey::LineWidth => Property::LineWidth(self.line_width),
            PropertyKey::OnLength => Property::OnLength(self.on_length),
            PropertyKey::OffLength => Property::OffLength(self.off_length),
            PropertyKey::Curved => Property::Curved(self.curved),
            PropertyKey::Align => Property::Align(self.align),
            PropertyKey::Background => Property::Background(self.background),
        }
    }

    /// Store `property`. Invalid values keep the previous one.
    pub fn set(&mut self, property: &Property) {
        if !is_valid_property(property) {
            tracing::debug!(?property, "ignoring invalid default property");
            return;
        }
        match property {
            Property::Color(c) => self.color.clone_from(c),
            Property::Scale(v) => self.scale = *v,
            Property::Alpha(v) => self.alpha = v.min(1.0),
            Property::LineWidth(v) => self.line_width = *v,
            Property::OnLength(v) => self.on_length = *v,
            Property::OffLength(v) => self.off_length = *v,
            Property::Curved(b) => self.curved = *b,
            Property::Align(a) => self.align = *a,
            Property::Background(b) => self.background = *b,
        }
    }
}

/// Host-supplied editor options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub defaults: Defaults,
    /// Ascending discrete zoom scales.
    pub zoom_levels: Vec<f64>,
    pub initial_zoom: f64,
    pub undo_flush_interval_ms: f64,
    pub drag_threshold_px: f64,
    /// Background image size in document units.
    pub image_width: f64,
    pub image_height: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            defaults: Defaults::default(),
            zoom_levels: ZOOM_LEVELS.to_vec(),
            initial_zoom: DEFAULT_ZOOM,
            undo_flush_interval_ms: UNDO_FLUSH_INTERVAL_MS,
            drag_threshold_px: DRAG_THRESHOLD_PX,
            image_width: 0.0,
            image_height: 0.0,
        }
    }
}

impl EditorConfig {
    /// Parse options JSON and sanitize the result.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when `raw` is not a JSON object of the
    /// expected shape.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        Ok(config.sanitize())
    }

    /// Replace invalid values with defaults.
    #[must_use]
    pub fn sanitize(mut self) -> Self {
        let fallback = Self::default();
        self.defaults = self.defaults.sanitize();

        let mut levels: Vec<f64> = self.zoom_levels.iter().copied().filter(|v| is_positive(*v)).collect();
        levels.sort_by(f64::total_cmp);
        levels.dedup();
        if levels.is_empty() {
            tracing::debug!("empty zoom table; using built-in levels");
            levels = fallback.zoom_levels;
        }
        self.zoom_levels = levels;

        if !is_positive(self.initial_zoom) {
            self.initial_zoom = fallback.initial_zoom;
        }
        self.initial_zoom = nearest_level(&self.zoom_levels, self.initial_zoom);

        self.undo_flush_interval_ms = positive_or(self.undo_flush_interval_ms, fallback.undo_flush_interval_ms);
        if !(self.drag_threshold_px.is_finite() && self.drag_threshold_px >= 0.0) {
            self.drag_threshold_px = fallback.drag_threshold_px;
        }
        if !(self.image_width.is_finite() && self.image_width >= 0.0) {
            self.image_width = 0.0;
        }
        if !(self.image_height.is_finite() && self.image_height >= 0.0) {
            self.image_height = 0.0;
        }
        self
    }
}

/// Whether `color` is a CSS hex (`#rgb`, `#rrggbb`) or functional `rgb()`/`rgba()` colour.
#[must_use]
pub fn is_valid_color(color: &str) -> bool {
    if let Some(hex) = color.strip_prefix('#') {
        return matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit());
    }
    (color.starts_with("rgb(") || color.starts_with("rgba(")) && color.ends_with(')')
}

/// Whether a widget value is acceptable: a known colour format, a positive
/// finite number, or a finite non-negative dash gap.
#[must_use]
pub fn is_valid_property(property: &Property) -> bool {
    match property {
        Property::Color(c) => is_valid_color(c),
        Property::Scale(v) | Property::Alpha(v) | Property::LineWidth(v) | Property::OnLength(v) => is_positive(*v),
        Property::OffLength(v) => v.is_finite() && *v >= 0.0,
        Property::Curved(_) | Property::Align(_) | Property::Background(_) => true,
    }
}

fn is_positive(v: f64) -> bool {
    v.is_finite() && v > 0.0
}

fn positive_or(v: f64, fallback: f64) -> f64 {
    if is_positive(v) { v } else { fallback }
}

/// The level in `levels` closest to `target`.
fn nearest_level(levels: &[f64], target: f64) -> f64 {
    levels
        .iter()
        .copied()
        .min_by(|a, b| (a - target).abs().total_cmp(&(b - target).abs()))
        .unwrap_or(DEFAULT_ZOOM)
}
