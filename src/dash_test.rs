#![allow(clippy::float_cmp)]

use super::*;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Op {
    Move(Point),
    Line(Point),
    Quad(Point, Point),
}

#[derive(Default)]
struct Recorder {
    ops: Vec<Op>,
}

impl PathSink for Recorder {
    fn move_to(&mut self, p: Point) {
        self.ops.push(Op::Move(p));
    }

    fn line_to(&mut self, p: Point) {
        self.ops.push(Op::Line(p));
    }

    fn quadratic_curve_to(&mut self, control: Point, to: Point) {
        self.ops.push(Op::Quad(control, to));
    }
}

impl Recorder {
    /// Total stroked length, measuring straight pieces only.
    fn inked_length(&self) -> f64 {
        let mut pen = Point::default();
        let mut total = 0.0;
        for op in &self.ops {
            match *op {
                Op::Move(p) => pen = p,
                Op::Line(p) => {
                    total += pen.distance(p);
                    pen = p;
                }
                Op::Quad(_, p) => pen = p,
            }
        }
        total
    }
}

fn pt(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

// =============================================================
// Solid patterns
// =============================================================

#[test]
fn zero_off_is_solid_pass_through() {
    let mut rec = Recorder::default();
    {
        let mut path = DashedPath::new(&mut rec, 10.0, 0.0);
        assert!(path.is_solid());
        path.move_to(pt(0.0, 0.0));
        path.line_to(pt(20.0, 0.0));
        path.quadratic_curve_to(pt(30.0, 0.0), pt(30.0, 10.0));
    }
    assert_eq!(
        rec.ops,
        vec![
            Op::Move(pt(0.0, 0.0)),
            Op::Line(pt(20.0, 0.0)),
            Op::Quad(pt(30.0, 0.0), pt(30.0, 10.0)),
        ]
    );
}

#[test]
fn zero_cycle_is_solid() {
    let mut rec = Recorder::default();
    let path = DashedPath::new(&mut rec, 0.0, 0.0);
    assert!(path.is_solid());
}

// =============================================================
// Straight segments
// =============================================================

#[test]
fn dashes_along_single_line() {
    let mut rec = Recorder::default();
    let remaining = {
        let mut path = DashedPath::new(&mut rec, 5.0, 3.0);
        path.move_to(pt(0.0, 0.0));
        path.line_to(pt(20.0, 0.0));
        path.phase_remaining()
    };
    assert_eq!(
        rec.ops,
        vec![
            Op::Move(pt(0.0, 0.0)),
            Op::Line(pt(5.0, 0.0)),
            Op::Move(pt(8.0, 0.0)),
            Op::Line(pt(13.0, 0.0)),
            Op::Move(pt(16.0, 0.0)),
            Op::Line(pt(20.0, 0.0)),
        ]
    );
    assert!(approx(rec.inked_length(), 14.0));
    // One unit of dash left, then a full gap.
    assert!(approx(remaining, 4.0));
}

#[test]
fn phase_carries_across_corner() {
    let mut rec = Recorder::default();
    {
        let mut path = DashedPath::new(&mut rec, 5.0, 3.0);
        path.move_to(pt(0.0, 0.0));
        path.line_to(pt(20.0, 0.0));
        path.line_to(pt(20.0, 10.0));
        assert!(!path.is_drawing());
        assert!(approx(path.phase_remaining(), 2.0));
    }
    let tail: Vec<Op> = rec.ops[6..].to_vec();
    assert_eq!(
        tail,
        vec![
            Op::Line(pt(20.0, 1.0)),
            Op::Move(pt(20.0, 4.0)),
            Op::Line(pt(20.0, 9.0)),
            Op::Move(pt(20.0, 10.0)),
        ]
    );
}

#[test]
fn phase_survives_move_to() {
    let mut rec = Recorder::default();
    let mut path = DashedPath::new(&mut rec, 5.0, 3.0);
    path.move_to(pt(0.0, 0.0));
    path.line_to(pt(2.0, 0.0));
    path.move_to(pt(100.0, 100.0));
    // Three units of dash were still owed when the pen lifted.
    assert!(approx(path.phase_remaining(), 6.0));
}

#[test]
fn zero_length_segment_emits_nothing() {
    let mut rec = Recorder::default();
    {
        let mut path = DashedPath::new(&mut rec, 5.0, 3.0);
        path.move_to(pt(4.0, 4.0));
        path.line_to(pt(4.0, 4.0));
    }
    assert_eq!(rec.ops, vec![Op::Move(pt(4.0, 4.0))]);
}

#[test]
fn exact_fit_toggles_at_segment_end() {
    let mut rec = Recorder::default();
    {
        let mut path = DashedPath::new(&mut rec, 5.0, 3.0);
        path.move_to(pt(0.0, 0.0));
        path.line_to(pt(5.0, 0.0));
        assert!(!path.is_drawing());
        assert!(approx(path.phase_remaining(), 0.0));
    }
    assert_eq!(rec.ops, vec![Op::Move(pt(0.0, 0.0)), Op::Line(pt(5.0, 0.0))]);
}

// =============================================================
// Curves
// =============================================================

#[test]
fn dashed_curve_alternates_pieces_and_gaps() {
    let mut rec = Recorder::default();
    {
        let mut path = DashedPath::new(&mut rec, 10.0, 10.0);
        path.move_to(pt(0.0, 0.0));
        path.quadratic_curve_to(pt(50.0, 50.0), pt(100.0, 0.0));
    }
    let quads = rec.ops.iter().filter(|op| matches!(op, Op::Quad(..))).count();
    let moves = rec.ops.iter().filter(|op| matches!(op, Op::Move(..))).count();
    assert!(quads >= 3, "expected several dash pieces, got {quads}");
    // Each gap lifts the pen once, plus the initial move.
    assert!(moves + 1 >= quads);
    match rec.ops.last() {
        Some(Op::Quad(_, end) | Op::Move(end)) => {
            assert!(approx(end.x, 100.0) && approx(end.y, 0.0));
        }
        other => panic!("unexpected last op {other:?}"),
    }
}

#[test]
fn dashed_curve_pieces_have_pattern_length() {
    let mut rec = Recorder::default();
    {
        let mut path = DashedPath::new(&mut rec, 10.0, 5.0);
        path.move_to(pt(0.0, 0.0));
        path.quadratic_curve_to(pt(60.0, 0.0), pt(60.0, 60.0));
    }
    let mut pen = Point::default();
    let mut full_pieces = 0;
    for (i, op) in rec.ops.iter().enumerate() {
        match *op {
            Op::Move(p) | Op::Line(p) => pen = p,
            Op::Quad(control, end) => {
                let len = curve_length(&QuadCurve::new(pen, control, end), CURVE_ACCURACY);
                if i + 1 < rec.ops.len() {
                    assert!((len - 10.0).abs() < 0.25, "piece {i} measured {len}");
                    full_pieces += 1;
                }
                pen = end;
            }
        }
    }
    assert!(full_pieces >= 3);
}

#[test]
fn phase_carries_from_line_into_curve() {
    let mut rec = Recorder::default();
    {
        let mut path = DashedPath::new(&mut rec, 5.0, 5.0);
        path.move_to(pt(0.0, 0.0));
        path.line_to(pt(7.0, 0.0));
        // Pen is in a gap with three units left.
        assert!(!path.is_drawing());
        path.quadratic_curve_to(pt(20.0, 0.0), pt(20.0, 13.0));
    }
    // After the line: move to 0, line to 5, move to 7 (end of line, mid-gap).
    assert_eq!(rec.ops[2], Op::Move(pt(7.0, 0.0)));
    // The curve opens with the rest of the gap, not a dash.
    assert!(matches!(rec.ops[3], Op::Move(_)));
    assert!(matches!(rec.ops[4], Op::Quad(..)));
}
