//! Shared numeric constants for the editor.

// ── Geometry ────────────────────────────────────────────────────

/// Arc-length spacing between resampled points on curved lines.
pub const TESSELLATION_STEP: f64 = 10.0;

/// Uniform parameter steps used to approximate a quadratic curve's length.
pub const CURVE_ACCURACY: usize = 6;

/// Bisection rounds when inverting arc length to a curve parameter.
pub const ARC_SEARCH_ITERATIONS: usize = 32;

// ── Hit-testing ─────────────────────────────────────────────────

/// Slop added to half the stroke width for lines and anchor diagonals.
pub const HIT_SLOP: f64 = 6.0;

/// Slop added to half the stroke width for piton and ring outlines.
pub const OUTLINE_HIT_SLOP: f64 = 1.0;

/// Squared document-space distance for grabbing a line control point.
pub const CONTROL_POINT_GRAB_SQ: f64 = 100.0;

/// Padding around a text item's box when its background is shown or it is selected.
pub const TEXT_PADDING: f64 = 15.0;

// ── Interaction ─────────────────────────────────────────────────

/// Screen-space distance a drag must exceed before it counts as a move.
pub const DRAG_THRESHOLD_PX: f64 = 3.0;

/// Interval of the undo-batch safety flush.
pub const UNDO_FLUSH_INTERVAL_MS: f64 = 100.0;

// ── Text layout ─────────────────────────────────────────────────

/// Font size used for every text line.
pub const TEXT_FONT_SIZE: f64 = 12.0;

/// Line height as a multiple of the font size.
pub const TEXT_LINE_SPACING: f64 = 1.5;

/// Widest a text block's bounding box may grow.
pub const TEXT_MAX_WIDTH: f64 = 2048.0;

/// Average glyph advance relative to font size, used before real metrics exist.
pub const ESTIMATED_GLYPH_RATIO: f64 = 0.6;

// ── Zoom ────────────────────────────────────────────────────────

/// Discrete zoom levels, ascending.
pub const ZOOM_LEVELS: [f64; 12] = [0.1, 0.25, 0.5, 0.75, 1.0, 1.5, 2.0, 3.0, 4.0, 6.0, 8.0, 12.0];
