//! Approximation of circular arcs with cubic bézier curves.

use crate::bezier::{transform_segment, BezierSegment};
use crate::math::{point, vector, Point};
use crate::EPSILON;

use arrayvec::ArrayVec;
use core::f32::consts::{FRAC_PI_2, PI};

#[cfg(not(feature = "std"))]
use num_traits::Float;

const TAU: f32 = 2.0 * PI;

/// A single cubic curve approximating an arc of the unit circle.
///
/// The arc starts at `start_angle` and sweeps `sweep` radians. The approximation
/// degrades as the sweep grows, so it should not exceed a quarter turn. See
/// [`make_arc_segments`] for longer arcs.
pub fn make_arc(center: Point, start_angle: f32, sweep: f32) -> BezierSegment {
    let k = 4.0 / 3.0 * (sweep / 4.0).tan();
    let (s, c) = sweep.sin_cos();

    let arc = BezierSegment {
        p0: point(1.0, 0.0),
        p1: point(1.0, k),
        p2: point(c + k * s, s - k * c),
        p3: point(c, s),
    };

    transform_segment(&arc, center.to_vector(), start_angle, vector(1.0, 1.0))
}

/// The quadrant of the unit circle `angle` falls into, `0` being the first
/// quarter turn counter-clockwise from the positive x axis.
pub fn quadrant_at_angle(angle: f32) -> usize {
    let mut angle = angle % TAU;
    if angle < 0.0 {
        angle += TAU;
    }
    if angle <= FRAC_PI_2 {
        0
    } else if angle <= PI {
        1
    } else if angle <= PI + FRAC_PI_2 {
        2
    } else {
        3
    }
}

/// A quarter of the unit circle, covering the given quadrant.
pub fn arc_segment_for_quadrant(quadrant: usize) -> BezierSegment {
    make_arc(point(0.0, 0.0), quadrant as f32 * FRAC_PI_2, FRAC_PI_2)
}

/// Up to four cubic curves approximating an arc of the unit circle centered at `center`.
///
/// Negative sweeps produce segments going clockwise. Sweeps are clamped to a full turn.
pub fn make_arc_segments(center: Point, start_angle: f32, sweep: f32) -> ArrayVec<BezierSegment, 4> {
    let mut segments = ArrayVec::new();
    if sweep.abs() < EPSILON {
        return segments;
    }

    let mut start_angle = start_angle;
    let mut sweep = sweep;
    let reversed = sweep < 0.0;
    if reversed {
        start_angle += sweep;
        sweep = -sweep;
    }

    let full_turn = sweep >= TAU - EPSILON;
    let sweep = sweep.min(TAU);
    let end_quadrant = if full_turn { 3 } else { quadrant_at_angle(sweep) };

    let origin = point(0.0, 0.0);
    let (sin, cos) = sweep.sin_cos();
    let end_ray = point(cos * 2.0, sin * 2.0);

    for quadrant in 0..=end_quadrant {
        let mut segment = arc_segment_for_quadrant(quadrant);

        if quadrant == end_quadrant && !full_turn {
            if let Some(t) = segment.line_intersections(origin, end_ray).first() {
                let (before, _) = segment.split(*t);
                if before.is_point() {
                    continue;
                }
                segment = before;
            }
        }

        segments.push(segment);
    }

    for segment in &mut segments {
        *segment = transform_segment(segment, center.to_vector(), start_angle, vector(1.0, 1.0));
    }

    if reversed {
        segments.reverse();
        for segment in &mut segments {
            *segment = segment.flip();
        }
    }

    segments
}

#[test]
fn arc_points_are_on_the_circle() {
    let arc = make_arc(point(0.0, 0.0), 0.0, FRAC_PI_2);
    for i in 0..=10 {
        let p = arc.sample(i as f32 / 10.0);
        assert!((p.to_vector().length() - 1.0).abs() < 0.001);
    }

    assert!((arc.p0 - point(1.0, 0.0)).length() < 1e-6);
    assert!((arc.p3 - point(0.0, 1.0)).length() < 1e-6);
}

#[test]
fn rotated_arc() {
    let arc = make_arc(point(2.0, 3.0), FRAC_PI_2, FRAC_PI_2);
    assert!((arc.p0 - point(2.0, 4.0)).length() < 1e-5);
    assert!((arc.p3 - point(1.0, 3.0)).length() < 1e-5);
}

#[test]
fn quadrants() {
    assert_eq!(quadrant_at_angle(0.1), 0);
    assert_eq!(quadrant_at_angle(FRAC_PI_2 + 0.1), 1);
    assert_eq!(quadrant_at_angle(PI + 0.1), 2);
    assert_eq!(quadrant_at_angle(PI + FRAC_PI_2 + 0.1), 3);
    assert_eq!(quadrant_at_angle(TAU + 0.1), 0);
    assert_eq!(quadrant_at_angle(-0.1), 3);
}

#[test]
fn half_circle() {
    let segments = make_arc_segments(point(0.0, 0.0), 0.0, PI);
    assert_eq!(segments.len(), 2);
    for segment in &segments {
        for i in 0..=10 {
            let p = segment.sample(i as f32 / 10.0);
            assert!((p.to_vector().length() - 1.0).abs() < 0.001);
        }
    }
    assert!((segments[0].p0 - point(1.0, 0.0)).length() < 1e-5);
    assert!((segments[1].p3 - point(-1.0, 0.0)).length() < 1e-3);
}

#[test]
fn partial_arc() {
    let sweep = PI * 0.75;
    let segments = make_arc_segments(point(1.0, 1.0), 0.0, sweep);
    assert_eq!(segments.len(), 2);
    let end = segments[1].p3;
    let expected = point(1.0 + sweep.cos(), 1.0 + sweep.sin());
    assert!((end - expected).length() < 1e-3);
    assert!(((segments[0].p3 - point(1.0, 1.0)).length() - 1.0).abs() < 1e-3);
}

#[test]
fn full_circle() {
    let segments = make_arc_segments(point(0.0, 0.0), 0.0, TAU);
    assert_eq!(segments.len(), 4);
    assert!((segments[3].p3 - point(1.0, 0.0)).length() < 1e-5);

    let segments = make_arc_segments(point(0.0, 0.0), 0.0, 10.0);
    assert_eq!(segments.len(), 4);
}

#[test]
fn negative_sweep() {
    let segments = make_arc_segments(point(0.0, 0.0), 0.0, -FRAC_PI_2);
    assert_eq!(segments.len(), 1);
    assert!((segments[0].p0 - point(1.0, 0.0)).length() < 1e-4);
    assert!((segments[0].p3 - point(0.0, -1.0)).length() < 1e-4);
}

#[test]
fn empty_sweep() {
    assert!(make_arc_segments(point(0.0, 0.0), 1.0, 0.0).is_empty());
}
