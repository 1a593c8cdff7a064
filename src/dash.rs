//! Dash-pattern stroking over straight and quadratic path segments.
//!
//! [`DashedPath`] sits between a path builder and a [`PathSink`]. It keeps the
//! dash phase across consecutive segments so a pattern flows around corners
//! and along chains of curves without restarting.

#[cfg(test)]
#[path = "dash_test.rs"]
mod dash_test;

use crate::camera::Point;
use crate::consts::CURVE_ACCURACY;
use crate::geom::{QuadCurve, curve_length, curve_slice, param_at_length};

/// Anything that accepts path-building commands.
pub trait PathSink {
    fn move_to(&mut self, p: Point);
    fn line_to(&mut self, p: Point);
    fn quadratic_curve_to(&mut self, control: Point, to: Point);
}

/// A path builder that applies an on/off dash pattern before forwarding to a sink.
///
/// An `off` length of zero (or a non-positive cycle) makes the path solid, in
/// which case every command passes straight through.
pub struct DashedPath<'a, S: PathSink + ?Sized> {
    sink: &'a mut S,
    on: f64,
    off: f64,
    pen: Point,
    cursor: Option<Point>,
    drawing: bool,
    overflow: f64,
}

impl<'a, S: PathSink + ?Sized> DashedPath<'a, S> {
    pub fn new(sink: &'a mut S, on: f64, off: f64) -> Self {
        Self {
            sink,
            on: on.max(0.0),
            off: off.max(0.0),
            pen: Point::default(),
            cursor: None,
            drawing: true,
            overflow: 0.0,
        }
    }

    /// Whether the pattern degenerates to a solid stroke.
    #[must_use]
    pub fn is_solid(&self) -> bool {
        self.off <= 0.0 || self.on + self.off <= 0.0
    }

    /// Distance along the path until the next dash begins.
    #[must_use]
    pub fn phase_remaining(&self) -> f64 {
        if self.drawing { self.overflow + self.off } else { self.overflow }
    }

    /// Whether the pen is currently inside a dash.
    #[must_use]
    pub fn is_drawing(&self) -> bool {
        self.drawing
    }

    /// Lift the pen to `p`. The dash phase carries over.
    pub fn move_to(&mut self, p: Point) {
        self.sink.move_to(p);
        self.pen = p;
        self.cursor = Some(p);
    }

    /// Stroke a straight segment from the pen to `to`.
    pub fn line_to(&mut self, to: Point) {
        if self.is_solid() {
            self.sink.line_to(to);
            self.pen = to;
            self.cursor = Some(to);
            return;
        }

        let from = self.pen;
        let total = from.distance(to);
        let mut travelled = 0.0;
        while travelled < total {
            let span = self.next_span();
            let remaining = total - travelled;
            if span > remaining {
                self.emit_point(to);
                self.overflow = span - remaining;
                break;
            }
            travelled += span;
            self.emit_point(from.lerp(to, travelled / total));
            self.drawing = !self.drawing;
            self.overflow = 0.0;
        }
        self.pen = to;
    }

    /// Stroke a quadratic segment from the pen through `control` to `to`,
    /// measuring the pattern in arc length.
    pub fn quadratic_curve_to(&mut self, control: Point, to: Point) {
        if self.is_solid() {
            self.sink.quadratic_curve_to(control, to);
            self.pen = to;
            self.cursor = Some(to);
            return;
        }

        let curve = QuadCurve::new(self.pen, control, to);
        let total = curve_length(&curve, CURVE_ACCURACY);
        let mut travelled = 0.0;
        let mut t_start = 0.0;
        while travelled < total {
            let span = self.next_span();
            let remaining = total - travelled;
            let partial = span > remaining;
            let t_end = if partial {
                1.0
            } else {
                param_at_length(&curve, travelled + span, CURVE_ACCURACY)
            };
            self.emit_curve(&curve, t_start, t_end);

            if partial {
                self.overflow = span - remaining;
                break;
            }
            travelled += span;
            t_start = t_end;
            self.drawing = !self.drawing;
            self.overflow = 0.0;
        }
        self.pen = to;
    }

    fn next_span(&self) -> f64 {
        if self.overflow > 0.0 {
            self.overflow
        } else if self.drawing {
            self.on
        } else {
            self.off
        }
    }

    fn emit_point(&mut self, p: Point) {
        if self.drawing {
            if self.cursor == Some(p) {
                return;
            }
            self.sink.line_to(p);
        } else {
            self.sink.move_to(p);
        }
        self.cursor = Some(p);
    }

    fn emit_curve(&mut self, curve: &QuadCurve, t1: f64, t2: f64) {
        if t2 <= t1 {
            return;
        }
        if self.drawing {
            let piece = curve_slice(curve, t1, t2);
            self.sink.quadratic_curve_to(piece.control, piece.end);
            self.cursor = Some(piece.end);
        } else {
            let p = curve.point_at(t2);
            self.sink.move_to(p);
            self.cursor = Some(p);
        }
    }
}

impl<S: PathSink + ?Sized> PathSink for DashedPath<'_, S> {
    fn move_to(&mut self, p: Point) {
        DashedPath::move_to(self, p);
    }

    fn line_to(&mut self, p: Point) {
        DashedPath::line_to(self, p);
    }

    fn quadratic_curve_to(&mut self, control: Point, to: Point) {
        DashedPath::quadratic_curve_to(self, control, to);
    }
}
