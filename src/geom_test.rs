#![allow(clippy::float_cmp)]

use super::*;

const EPSILON: f64 = 1e-9;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

fn pt(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

fn elbow() -> QuadCurve {
    QuadCurve::new(pt(50.0, 0.0), pt(100.0, 0.0), pt(100.0, 50.0))
}

// =============================================================
// QuadCurve
// =============================================================

#[test]
fn point_at_endpoints() {
    let c = elbow();
    assert_eq!(c.point_at(0.0), c.start);
    assert_eq!(c.point_at(1.0), c.end);
}

#[test]
fn point_at_midparameter() {
    let c = QuadCurve::new(pt(0.0, 0.0), pt(10.0, 10.0), pt(20.0, 0.0));
    let p = c.point_at(0.5);
    assert!(approx_eq(p.x, 10.0));
    assert!(approx_eq(p.y, 5.0));
}

// =============================================================
// curve_length
// =============================================================

#[test]
fn curve_length_of_straight_curve_is_chord() {
    let c = QuadCurve::new(pt(0.0, 0.0), pt(5.0, 0.0), pt(10.0, 0.0));
    assert!(approx_eq(curve_length(&c, 6), 10.0));
}

#[test]
fn curve_length_grows_with_accuracy() {
    let c = elbow();
    let coarse = curve_length(&c, 2);
    let fine = curve_length(&c, 64);
    assert!(fine >= coarse);
    // Chord is a lower bound, control polygon an upper bound.
    assert!(fine > c.start.distance(c.end));
    assert!(fine < c.start.distance(c.control) + c.control.distance(c.end));
}

#[test]
fn curve_length_zero_accuracy_does_not_divide_by_zero() {
    let c = elbow();
    assert!(curve_length(&c, 0).is_finite());
}

// =============================================================
// curve_slice
// =============================================================

#[test]
fn slice_up_to_one_is_identity() {
    let c = elbow();
    assert_eq!(curve_slice_up_to(&c, 1.0), c);
}

#[test]
fn slice_from_zero_is_identity() {
    let c = elbow();
    assert_eq!(curve_slice_from(&c, 0.0), c);
}

#[test]
fn slice_endpoints_lie_on_curve() {
    let c = elbow();
    let s = curve_slice(&c, 0.25, 0.75);
    let a = c.point_at(0.25);
    let b = c.point_at(0.75);
    assert!(approx_eq(s.start.x, a.x) && approx_eq(s.start.y, a.y));
    assert!(approx_eq(s.end.x, b.x) && approx_eq(s.end.y, b.y));
}

#[test]
fn slice_traces_same_curve() {
    let c = elbow();
    let s = curve_slice(&c, 0.2, 0.6);
    // Halfway through the slice is parameter 0.4 on the original.
    let p = s.point_at(0.5);
    let q = c.point_at(0.4);
    assert!(approx_eq(p.x, q.x) && approx_eq(p.y, q.y));
}

#[test]
fn slice_with_open_ends_delegates() {
    let c = elbow();
    assert_eq!(curve_slice(&c, 0.0, 0.5), curve_slice_up_to(&c, 0.5));
    assert_eq!(curve_slice(&c, 0.5, 1.0), curve_slice_from(&c, 0.5));
}

// =============================================================
// param_at_length
// =============================================================

#[test]
fn param_at_length_clamps() {
    let c = elbow();
    assert_eq!(param_at_length(&c, -1.0, 6), 0.0);
    assert_eq!(param_at_length(&c, 1e9, 6), 1.0);
}

#[test]
fn param_at_length_on_straight_curve_is_linear() {
    let c = QuadCurve::new(pt(0.0, 0.0), pt(50.0, 0.0), pt(100.0, 0.0));
    let t = param_at_length(&c, 30.0, 6);
    assert!((c.point_at(t).x - 30.0).abs() < 1e-6);
}

// =============================================================
// tessellate
// =============================================================

#[test]
fn tessellate_straight_returns_control_points() {
    let cps = vec![pt(0.0, 0.0), pt(10.0, 0.0), pt(10.0, 10.0)];
    assert_eq!(tessellate(&cps, false), cps);
}

#[test]
fn tessellate_curved_two_points_runs_through_midpoint() {
    let cps = vec![pt(0.0, 0.0), pt(20.0, 0.0)];
    let pts = tessellate(&cps, true);
    assert_eq!(pts, vec![pt(0.0, 0.0), pt(10.0, 0.0), pt(20.0, 0.0)]);
}

#[test]
fn tessellate_curved_keeps_literal_endpoints_and_midpoints() {
    let cps = vec![pt(0.0, 0.0), pt(100.0, 0.0), pt(100.0, 100.0)];
    let pts = tessellate(&cps, true);
    assert_eq!(pts[0], pt(0.0, 0.0));
    assert_eq!(pts[1], pt(50.0, 0.0));
    assert_eq!(pts[pts.len() - 2], pt(100.0, 50.0));
    assert_eq!(pts[pts.len() - 1], pt(100.0, 100.0));
}

#[test]
fn tessellate_curved_spacing_matches_step() {
    let cps = vec![pt(0.0, 0.0), pt(100.0, 0.0), pt(100.0, 100.0)];
    let pts = tessellate(&cps, true);
    assert!(pts.len() > 6);
    // Skip the straight lead-in, the snapped segment end and the lead-out.
    for i in 1..pts.len() - 3 {
        let d = pts[i].distance(pts[i + 1]);
        assert!((d - TESSELLATION_STEP).abs() < 0.1, "pair {i} spaced {d}");
    }
}

#[test]
fn tessellate_short_curve_still_reaches_segment_end() {
    let cps = vec![pt(0.0, 0.0), pt(4.0, 0.0), pt(4.0, 4.0)];
    let pts = tessellate(&cps, true);
    assert_eq!(pts, vec![pt(0.0, 0.0), pt(2.0, 0.0), pt(4.0, 2.0), pt(4.0, 4.0)]);
}

// =============================================================
// distance_to_segment
// =============================================================

#[test]
fn distance_perpendicular_inside_segment() {
    let d = distance_to_segment(pt(5.0, 3.0), pt(0.0, 0.0), pt(10.0, 0.0));
    assert!(approx_eq(d, 3.0));
}

#[test]
fn distance_beyond_end_uses_nearer_endpoint() {
    let d = distance_to_segment(pt(13.0, 4.0), pt(0.0, 0.0), pt(10.0, 0.0));
    assert!(approx_eq(d, 5.0));
    let d = distance_to_segment(pt(-3.0, -4.0), pt(0.0, 0.0), pt(10.0, 0.0));
    assert!(approx_eq(d, 5.0));
}

#[test]
fn distance_on_segment_is_zero() {
    let d = distance_to_segment(pt(2.5, 2.5), pt(0.0, 0.0), pt(10.0, 10.0));
    assert!(approx_eq(d, 0.0));
}

#[test]
fn distance_to_degenerate_segment() {
    let d = distance_to_segment(pt(3.0, 4.0), pt(0.0, 0.0), pt(0.0, 0.0));
    assert!(approx_eq(d, 5.0));
}

// =============================================================
// hit_test_line
// =============================================================

#[test]
fn hit_on_segment() {
    let cps = vec![pt(0.0, 0.0), pt(100.0, 0.0), pt(100.0, 100.0)];
    let pts = tessellate(&cps, false);
    assert!(hit_test_line(pt(50.0, 0.0), &pts, 1.0));
}

#[test]
fn miss_far_away() {
    let cps = vec![pt(0.0, 0.0), pt(100.0, 0.0), pt(100.0, 100.0)];
    let pts = tessellate(&cps, true);
    assert!(!hit_test_line(pt(0.0, 100.0), &pts, 5.0));
}

#[test]
fn hit_threshold_is_strict() {
    let pts = vec![pt(0.0, 0.0), pt(10.0, 0.0)];
    assert!(!hit_test_line(pt(5.0, 2.0), &pts, 2.0));
    assert!(hit_test_line(pt(5.0, 1.999), &pts, 2.0));
}

#[test]
fn hit_on_curved_tessellation() {
    let cps = vec![pt(0.0, 0.0), pt(100.0, 0.0), pt(100.0, 100.0)];
    let pts = tessellate(&cps, true);
    let on_curve = QuadCurve::new(pt(50.0, 0.0), pt(100.0, 0.0), pt(100.0, 50.0)).point_at(0.5);
    assert!(hit_test_line(on_curve, &pts, 1.0));
}

#[test]
fn hit_empty_and_single() {
    assert!(!hit_test_line(pt(0.0, 0.0), &[], 10.0));
    assert!(hit_test_line(pt(1.0, 0.0), &[pt(0.0, 0.0)], 2.0));
}

// =============================================================
// bounding_box
// =============================================================

#[test]
fn bounding_box_covers_all_points() {
    let b = bounding_box(&[pt(5.0, -2.0), pt(-1.0, 8.0), pt(3.0, 3.0)]).unwrap();
    assert_eq!(b, Bounds { x: -1.0, y: -2.0, w: 6.0, h: 10.0 });
}

#[test]
fn bounding_box_empty_is_none() {
    assert!(bounding_box(&[]).is_none());
}

#[test]
fn bounds_contains_with_padding() {
    let b = Bounds { x: 0.0, y: 0.0, w: 10.0, h: 10.0 };
    assert!(b.contains(pt(5.0, 5.0), 0.0));
    assert!(!b.contains(pt(12.0, 5.0), 0.0));
    assert!(b.contains(pt(12.0, 5.0), 2.0));
}
