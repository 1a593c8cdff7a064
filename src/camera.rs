#[cfg(test)]
#[path = "camera_test.rs"]
mod camera_test;

use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};

/// A point in either screen or document space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    #[must_use]
    pub fn distance(self, other: Point) -> f64 {
        self.distance_sq(other).sqrt()
    }

    /// Squared Euclidean distance to `other`.
    #[must_use]
    pub fn distance_sq(self, other: Point) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        dx * dx + dy * dy
    }

    /// Point halfway between `self` and `other`.
    #[must_use]
    pub fn midpoint(self, other: Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    /// Linear interpolation from `self` towards `other`.
    #[must_use]
    pub fn lerp(self, other: Point, t: f64) -> Point {
        Point::new(self.x + (other.x - self.x) * t, self.y + (other.y - self.y) * t)
    }

    /// Whether this point is exactly the origin.
    #[must_use]
    pub fn is_zero(self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point {
    type Output = Point;

    fn mul(self, rhs: f64) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

/// Allowed pan deltas captured when a pan gesture starts.
#[derive(Debug, Clone, Copy, PartialEq)]
struct PanBounds {
    min_dx: f64,
    max_dx: f64,
    min_dy: f64,
    max_dy: f64,
}

/// Pan state for the viewport over the scaled background image.
///
/// `pan_x` / `pan_y` are the screen position of the document origin in CSS
/// pixels. The zoom scale lives on the document; every mapping takes it as an
/// argument.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub pan_x: f64,
    pub pan_y: f64,
    pub viewport_width: f64,
    pub viewport_height: f64,
    pan_bounds: Option<PanBounds>,
    pan_delta: Point,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            pan_x: 0.0,
            pan_y: 0.0,
            viewport_width: 0.0,
            viewport_height: 0.0,
            pan_bounds: None,
            pan_delta: Point::default(),
        }
    }
}

impl Camera {
    /// The current document origin in screen space, including any in-flight pan.
    #[must_use]
    pub fn offset(&self) -> Point {
        Point::new(self.pan_x + self.pan_delta.x, self.pan_y + self.pan_delta.y)
    }

    /// Convert a screen-space point (CSS pixels) to document coordinates.
    #[must_use]
    pub fn screen_to_doc(&self, screen: Point, scale: f64) -> Point {
        let offset = self.offset();
        Point { x: (screen.x - offset.x) / scale, y: (screen.y - offset.y) / scale }
    }

    /// Convert a document-space point to screen coordinates (CSS pixels).
    #[must_use]
    pub fn doc_to_screen(&self, doc: Point, scale: f64) -> Point {
        let offset = self.offset();
        Point { x: doc.x * scale + offset.x, y: doc.y * scale + offset.y }
    }

    /// Whether a pan gesture is in progress.
    #[must_use]
    pub fn is_panning(&self) -> bool {
        self.pan_bounds.is_some()
    }

    /// Begin a pan gesture over content of the given scaled size.
    ///
    /// The allowed range keeps the content covering the viewport where it is
    /// larger than the viewport.
    pub fn start_pan(&mut self, content_w: f64, content_h: f64) {
        let w = content_w.round();
        let h = content_h.round();
        self.pan_bounds = Some(PanBounds {
            min_dx: -(self.pan_x + w - self.viewport_width).max(0.0),
            max_dx: (-self.pan_x).max(0.0),
            min_dy: -(self.pan_y + h - self.viewport_height).max(0.0),
            max_dy: (-self.pan_y).max(0.0),
        });
        self.pan_delta = Point::default();
    }

    /// Move the in-flight pan to `(dx, dy)` from where it started, clamped.
    pub fn pan_to(&mut self, dx: f64, dy: f64) {
        let Some(bounds) = self.pan_bounds else {
            return;
        };
        self.pan_delta = Point::new(
            dx.clamp(bounds.min_dx, bounds.max_dx),
            dy.clamp(bounds.min_dy, bounds.max_dy),
        );
    }

    /// Commit the in-flight pan into the resting offset.
    pub fn end_pan(&mut self) {
        self.pan_x += self.pan_delta.x;
        self.pan_y += self.pan_delta.y;
        self.pan_delta = Point::default();
        self.pan_bounds = None;
    }

    /// Center content of the given scaled size in the viewport.
    pub fn center(&mut self, content_w: f64, content_h: f64) {
        self.pan_x = (self.viewport_width / 2.0 - content_w / 2.0).round();
        self.pan_y = (self.viewport_height / 2.0 - content_h / 2.0).round();
    }

    /// Re-anchor the offset after the scale changed by `factor`, keeping the
    /// viewport center fixed and the content clamped to the viewport.
    pub fn rescale_about_center(&mut self, factor: f64, content_w: f64, content_h: f64) {
        let center_x = factor * (self.viewport_width / 2.0 - self.pan_x);
        let center_y = factor * (self.viewport_height / 2.0 - self.pan_y);

        self.pan_x = -(center_x - self.viewport_width / 2.0).round();
        self.pan_y = -(center_y - self.viewport_height / 2.0).round();

        self.pan_x = clamp_axis(self.pan_x, content_w, self.viewport_width);
        self.pan_y = clamp_axis(self.pan_y, content_h, self.viewport_height);
    }
}

fn clamp_axis(offset: f64, content: f64, viewport: f64) -> f64 {
    if content <= viewport {
        (viewport / 2.0 - content / 2.0).round()
    } else {
        offset.clamp(viewport - content, 0.0)
    }
}
