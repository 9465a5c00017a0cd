use crate::math::{point, Point};
use crate::EPSILON;

#[cfg(not(feature = "std"))]
use num_traits::Float;

const NO_INTERSECTION: Point = Point::new(f32::INFINITY, f32::INFINITY);

/// Returns false for the point at infinity used to signal the absence of an
/// intersection.
#[inline]
pub fn is_finite_point(p: Point) -> bool {
    p.x.is_finite() && p.y.is_finite()
}

/// Intersection of the infinite lines passing through `a0, a1` and `b0, b1`.
///
/// Returns a point at infinity for parallel or coincident lines.
pub fn intersect_lines(a0: Point, a1: Point, b0: Point, b1: Point) -> Point {
    let a_1 = a1.y - a0.y;
    let b_1 = a0.x - a1.x;
    let a_2 = b1.y - b0.y;
    let b_2 = b0.x - b1.x;

    let det = a_1 * b_2 - a_2 * b_1;
    if det.abs() <= EPSILON {
        return NO_INTERSECTION;
    }

    let c_1 = a_1 * a0.x + b_1 * a0.y;
    let c_2 = a_2 * b0.x + b_2 * b0.y;

    point((b_2 * c_1 - b_1 * c_2) / det, (a_1 * c_2 - a_2 * c_1) / det)
}

/// Intersection of the line segments `a0, a1` and `b0, b1`.
///
/// Returns a point at infinity if the segments don't cross.
pub fn intersect_line_segments(a0: Point, a1: Point, b0: Point, b1: Point) -> Point {
    let area1 = signed_triangle_area(a0, a1, b1);
    let area2 = signed_triangle_area(a0, a1, b0);

    if area1 * area2 <= 0.0 {
        let area3 = signed_triangle_area(b0, b1, a0);
        let area4 = area3 + area2 - area1;
        if area3 * area4 <= 0.0 {
            let t = area3 / (area3 - area4);
            return a0 + (a1 - a0) * t;
        }
    }

    NO_INTERSECTION
}

fn signed_triangle_area(a: Point, b: Point, c: Point) -> f32 {
    (a.x - c.x) * (b.y - c.y) - (a.y - c.y) * (b.x - c.x)
}

/// Whether `p` is on the left of the directed line going from `from` to `to`.
///
/// Points exactly on the line are not on the left.
#[inline]
pub fn point_on_the_left_of_line(from: Point, to: Point, p: Point) -> bool {
    (from.x - to.x) * (p.y - to.y) - (from.y - to.y) * (p.x - to.x) > 0.0
}

/// Squared distance between `p` and the infinite line passing through `start` and `end`.
pub fn point_to_line_distance_sq(p: Point, start: Point, end: Point) -> f32 {
    let d = end - start;
    let len_sq = d.square_length();
    if len_sq < EPSILON {
        return (p - start).square_length();
    }

    let n = d.x * (start.y - p.y) - (start.x - p.x) * d.y;
    n * n / len_sq
}

/// Assuming `p` lies on the line passing through `from` and `to`, tells whether
/// it is located between the two endpoints.
pub fn point_on_line_is_within_segment(from: Point, to: Point, p: Point) -> bool {
    if !is_finite_point(p) {
        return false;
    }

    let d = to - from;
    let len = d.length();
    if len < EPSILON {
        return (p - from).square_length() < EPSILON;
    }

    let v = d / len;
    if (p - from).dot(v) < -EPSILON {
        return false;
    }

    (p - to).dot(v) <= EPSILON
}

#[test]
fn intersecting_lines() {
    let p = intersect_lines(point(0.0, 0.0), point(1.0, 1.0), point(0.0, 1.0), point(1.0, 0.0));
    assert!((p - point(0.5, 0.5)).length() < 1e-5);

    let p = intersect_lines(point(0.0, 0.0), point(1.0, 1.0), point(2.0, 2.0), point(3.0, 3.0));
    assert!(!is_finite_point(p));

    let p = intersect_lines(point(0.0, 0.0), point(1.0, 0.0), point(0.0, 1.0), point(1.0, 1.0));
    assert!(!is_finite_point(p));
}

#[test]
fn intersecting_line_segments() {
    let p = intersect_line_segments(point(0.0, 0.0), point(1.0, 1.0), point(0.0, 1.0), point(1.0, 0.0));
    assert!((p - point(0.5, 0.5)).length() < 1e-5);

    // The lines cross at (0.5, 0.5) but the first segment stops before.
    let p = intersect_line_segments(point(0.0, 0.0), point(0.25, 0.25), point(0.0, 1.0), point(1.0, 0.0));
    assert!(!is_finite_point(p));
}

#[test]
fn side_of_line() {
    let from = point(0.0, 0.0);
    let to = point(1.0, 0.0);
    assert!(point_on_the_left_of_line(from, to, point(0.5, 1.0)));
    assert!(!point_on_the_left_of_line(from, to, point(0.5, -1.0)));
    assert!(!point_on_the_left_of_line(from, to, point(3.0, 0.0)));
}

#[test]
fn distance_to_line() {
    let d = point_to_line_distance_sq(point(5.0, 3.0), point(0.0, 0.0), point(1.0, 0.0));
    assert!((d - 9.0).abs() < 1e-4);

    let d = point_to_line_distance_sq(point(1.0, 1.0), point(0.0, 0.0), point(2.0, 2.0));
    assert!(d.abs() < 1e-5);
}

#[test]
fn within_segment() {
    let from = point(0.0, 0.0);
    let to = point(2.0, 0.0);
    assert!(point_on_line_is_within_segment(from, to, point(1.0, 0.0)));
    assert!(point_on_line_is_within_segment(from, to, point(0.0, 0.0)));
    assert!(point_on_line_is_within_segment(from, to, point(2.0, 0.0)));
    assert!(!point_on_line_is_within_segment(from, to, point(-0.5, 0.0)));
    assert!(!point_on_line_is_within_segment(from, to, point(2.5, 0.0)));
    assert!(!point_on_line_is_within_segment(from, to, NO_INTERSECTION));
}
