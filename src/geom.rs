//! Geometry kernel: quadratic curves, tessellation, distances and bounds.
//!
//! Everything here is a pure function of its arguments. Curved lines are drawn
//! as a chain of quadratic Béziers running between the midpoints of adjacent
//! control points, with each interior control point as the Bézier control. The
//! dense polylines produced here are only used for hit-testing and bounds; the
//! visible stroke draws the true curve.

#[cfg(test)]
#[path = "geom_test.rs"]
mod geom_test;

use crate::camera::Point;
use crate::consts::{ARC_SEARCH_ITERATIONS, CURVE_ACCURACY, TESSELLATION_STEP};

/// A quadratic Bézier segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadCurve {
    pub start: Point,
    pub control: Point,
    pub end: Point,
}

impl QuadCurve {
    #[must_use]
    pub fn new(start: Point, control: Point, end: Point) -> Self {
        Self { start, control, end }
    }

    /// Point on the curve at parameter `t`.
    #[must_use]
    pub fn point_at(&self, t: f64) -> Point {
        let it = 1.0 - t;
        let a = it * it;
        let b = 2.0 * t * it;
        let c = t * t;
        Point::new(
            a * self.start.x + b * self.control.x + c * self.end.x,
            a * self.start.y + b * self.control.y + c * self.end.y,
        )
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Bounds {
    /// Whether `p` lies inside the box grown by `pad` on every side.
    #[must_use]
    pub fn contains(&self, p: Point, pad: f64) -> bool {
        (p.x - self.x - self.w / 2.0).abs() <= self.w / 2.0 + pad
            && (p.y - self.y - self.h / 2.0).abs() <= self.h / 2.0 + pad
    }
}

/// Length of a straight segment.
#[must_use]
pub fn line_length(a: Point, b: Point) -> f64 {
    a.distance(b)
}

/// Arc length of `curve`, approximated by a polyline over `accuracy` uniform
/// parameter steps.
#[must_use]
pub fn curve_length(curve: &QuadCurve, accuracy: usize) -> f64 {
    let n = accuracy.max(1);
    let mut total = 0.0;
    let mut prev = curve.start;
    for i in 1..=n {
        #[allow(clippy::cast_precision_loss)]
        let t = i as f64 / n as f64;
        let p = curve.point_at(t);
        total += prev.distance(p);
        prev = p;
    }
    total
}

/// The part of `curve` between parameter 0 and `t`.
#[must_use]
pub fn curve_slice_up_to(curve: &QuadCurve, t: f64) -> QuadCurve {
    if t >= 1.0 {
        return *curve;
    }
    let mid = curve.control.lerp(curve.end, t);
    let control = curve.start.lerp(curve.control, t);
    let end = control.lerp(mid, t);
    QuadCurve::new(curve.start, control, end)
}

/// The part of `curve` between parameter `t` and 1.
#[must_use]
pub fn curve_slice_from(curve: &QuadCurve, t: f64) -> QuadCurve {
    if t <= 0.0 {
        return *curve;
    }
    let mid = curve.start.lerp(curve.control, t);
    let control = curve.control.lerp(curve.end, t);
    let start = mid.lerp(control, t);
    QuadCurve::new(start, control, curve.end)
}

/// The part of `curve` between parameters `t1` and `t2`.
///
/// Slices "up to `t2`" first, then "from `t1 / t2`" within that result.
#[must_use]
pub fn curve_slice(curve: &QuadCurve, t1: f64, t2: f64) -> QuadCurve {
    if t1 <= 0.0 {
        return curve_slice_up_to(curve, t2);
    }
    if t2 >= 1.0 {
        return curve_slice_from(curve, t1);
    }
    let head = curve_slice_up_to(curve, t2);
    curve_slice_from(&head, t1 / t2)
}

/// Parameter `t` at which the arc length from the start of `curve` equals
/// `length`. Lengths outside `[0, total]` clamp to the endpoints.
#[must_use]
pub fn param_at_length(curve: &QuadCurve, length: f64, accuracy: usize) -> f64 {
    let total = curve_length(curve, accuracy);
    if length <= 0.0 || total <= 0.0 {
        return 0.0;
    }
    if length >= total {
        return 1.0;
    }

    let (mut lo, mut hi) = (0.0_f64, 1.0_f64);
    for _ in 0..ARC_SEARCH_ITERATIONS {
        let mid = (lo + hi) / 2.0;
        if curve_length(&curve_slice_up_to(curve, mid), accuracy) < length {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    (lo + hi) / 2.0
}

/// Points along `curve` spaced `step` apart in arc length, excluding the start
/// and ending exactly on `curve.end`.
#[must_use]
pub fn resample_curve(curve: &QuadCurve, step: f64) -> Vec<Point> {
    let accuracy = CURVE_ACCURACY * 4;
    let total = curve_length(curve, accuracy);
    let mut out = Vec::new();
    if step > 0.0 {
        let mut travelled = step;
        while travelled < total {
            let t = param_at_length(curve, travelled, accuracy);
            out.push(curve_slice_up_to(curve, t).end);
            travelled += step;
        }
    }
    out.push(curve.end);
    out
}

/// Dense polyline through a line's control points.
///
/// Straight lines return the control points unchanged. Curved lines start at
/// the first control point, run straight to the first midpoint, follow each
/// interior quadratic segment resampled every [`TESSELLATION_STEP`] units, and
/// end straight on the last control point.
#[must_use]
pub fn tessellate(control_points: &[Point], curved: bool) -> Vec<Point> {
    if !curved || control_points.len() < 2 {
        return control_points.to_vec();
    }

    let mut out = vec![control_points[0]];
    let mut prev_mid = control_points[0].midpoint(control_points[1]);
    out.push(prev_mid);

    for pair in control_points.windows(2).skip(1) {
        let (control, next) = (pair[0], pair[1]);
        let mid = control.midpoint(next);
        let curve = QuadCurve::new(prev_mid, control, mid);
        out.extend(resample_curve(&curve, TESSELLATION_STEP));
        prev_mid = mid;
    }

    if let Some(&last) = control_points.last() {
        out.push(last);
    }
    out
}

/// Shortest distance from `p` to the segment `a`–`b`.
#[must_use]
pub fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let len_sq = a.distance_sq(b);
    if len_sq == 0.0 {
        return p.distance(a);
    }

    let r = ((p.x - a.x) * (b.x - a.x) + (p.y - a.y) * (b.y - a.y)) / len_sq;
    if (0.0..=1.0).contains(&r) {
        let s = ((a.y - p.y) * (b.x - a.x) - (a.x - p.x) * (b.y - a.y)) / len_sq;
        s.abs() * len_sq.sqrt()
    } else {
        p.distance(a).min(p.distance(b))
    }
}

/// Whether `p` is strictly within `threshold` of the polyline through `points`.
#[must_use]
pub fn hit_test_line(p: Point, points: &[Point], threshold: f64) -> bool {
    match points {
        [] => false,
        [only] => p.distance(*only) < threshold,
        _ => points
            .windows(2)
            .any(|seg| distance_to_segment(p, seg[0], seg[1]) < threshold),
    }
}

/// Axis-aligned bounds of `points`, or `None` when empty.
#[must_use]
pub fn bounding_box(points: &[Point]) -> Option<Bounds> {
    let first = points.first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in &points[1..] {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    Some(Bounds { x: min_x, y: min_y, w: max_x - min_x, h: max_y - min_y })
}
