use crate::math::{perpendicular, point, Box2D, Point, Transform, Vector};
#[cfg(test)]
use crate::math::vector;
use crate::roots::{cubic_roots_in_unit_interval, solve_quadratic};
use crate::traits::Transformation;
use crate::EPSILON;

use arrayvec::ArrayVec;

#[cfg(not(feature = "std"))]
use num_traits::Float;

/// A cubic bézier curve segment.
///
/// The curve starts at `p0` heading towards `p1` and lands at `p3` coming
/// from the direction of `p2`.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct BezierSegment {
    pub p0: Point,
    pub p1: Point,
    pub p2: Point,
    pub p3: Point,
}

/// An element of a chain of connected cubic bézier curves.
///
/// The curve described by the element at index `i` of a chain ends at the `p0`
/// of the element at index `i + 1`. The last element of a chain only provides
/// its `p0`.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct BezierPathSegment {
    pub p0: Point,
    pub p1: Point,
    pub p2: Point,
}

impl BezierPathSegment {
    /// The trailing element of a chain, that only carries an endpoint.
    #[inline]
    pub fn end(p: Point) -> Self {
        BezierPathSegment { p0: p, p1: p, p2: p }
    }
}

impl BezierSegment {
    #[inline]
    pub fn new(p0: Point, p1: Point, p2: Point, p3: Point) -> Self {
        BezierSegment { p0, p1, p2, p3 }
    }

    /// A straight line expressed as a cubic bézier curve, with the control
    /// points at one third and two thirds of the way.
    pub fn line(from: Point, to: Point) -> Self {
        let d = to - from;
        BezierSegment {
            p0: from,
            p1: from + d / 3.0,
            p2: from + d * (2.0 / 3.0),
            p3: to,
        }
    }

    /// The coefficients of the power basis, from the cubic term down to the constant.
    pub fn coefficients(&self) -> [Vector; 4] {
        let p0 = self.p0.to_vector();
        let p1 = self.p1.to_vector();
        let p2 = self.p2.to_vector();
        let p3 = self.p3.to_vector();

        [
            p3 - p0 + (p1 - p2) * 3.0,
            (p0 + p2) * 3.0 - p1 * 6.0,
            (p1 - p0) * 3.0,
            p0,
        ]
    }

    /// Sample the curve at t (expecting t between 0 and 1).
    pub fn sample(&self, t: f32) -> Point {
        let [a, b, c, d] = self.coefficients();
        (((a * t + b) * t + c) * t + d).to_point()
    }

    /// The first derivative of the curve at t.
    pub fn derivative(&self, t: f32) -> Vector {
        let one_t = 1.0 - t;
        let d0 = self.p1 - self.p0;
        let d1 = self.p2 - self.p1;
        let d2 = self.p3 - self.p2;

        (d0 * (one_t * one_t) + d1 * (2.0 * one_t * t) + d2 * (t * t)) * 3.0
    }

    /// The unit tangent of the curve at t.
    ///
    /// Where the derivative vanishes (for example when a control point sits on
    /// top of an endpoint), the tangent is approximated with a nearby sample.
    pub fn tangent(&self, t: f32) -> Vector {
        let mut d = self.derivative(t);
        if d.square_length() < EPSILON {
            d = if t > 0.5 {
                self.sample(t) - self.sample(t - 0.01)
            } else {
                self.sample(t + 0.01) - self.sample(t)
            };
        }

        normalized(d)
    }

    /// The unit normal of the curve at t.
    #[inline]
    pub fn normal(&self, t: f32) -> Vector {
        perpendicular(self.tangent(t))
    }

    /// Position and tangent at t.
    #[inline]
    pub fn sample_with_tangent(&self, t: f32) -> (Point, Vector) {
        (self.sample(t), self.tangent(t))
    }

    /// Position, tangent and normal at t.
    #[inline]
    pub fn sample_full(&self, t: f32) -> (Point, Vector, Vector) {
        let tangent = self.tangent(t);
        (self.sample(t), tangent, perpendicular(tangent))
    }

    /// Split this curve into two sub-curves at t.
    pub fn split(&self, t: f32) -> (BezierSegment, BezierSegment) {
        let a = self.p0.lerp(self.p1, t);
        let b = self.p1.lerp(self.p2, t);
        let c = self.p2.lerp(self.p3, t);
        let ab = a.lerp(b, t);
        let bc = b.lerp(c, t);
        let p = ab.lerp(bc, t);

        (
            BezierSegment {
                p0: self.p0,
                p1: a,
                p2: ab,
                p3: p,
            },
            BezierSegment {
                p0: p,
                p1: bc,
                p2: c,
                p3: self.p3,
            },
        )
    }

    /// The same curve traversed in the opposite direction.
    #[inline]
    pub fn flip(&self) -> Self {
        BezierSegment {
            p0: self.p3,
            p1: self.p2,
            p2: self.p1,
            p3: self.p0,
        }
    }

    /// Applies the transform to all control points.
    pub fn transformed<T: Transformation>(&self, transform: &T) -> Self {
        BezierSegment {
            p0: transform.transform_point(self.p0),
            p1: transform.transform_point(self.p1),
            p2: transform.transform_point(self.p2),
            p3: transform.transform_point(self.p3),
        }
    }

    /// Whether all control points are the same point.
    pub fn is_point(&self) -> bool {
        self.p0 == self.p1 && self.p0 == self.p2 && self.p0 == self.p3
    }

    /// Approximates the arc length of the curve.
    ///
    /// The curve is subdivided adaptively into pieces that are each measured
    /// with the closed form length of a quadratic curve. `precision` is the
    /// allowed error for each piece.
    pub fn length(&self, precision: f32) -> f32 {
        let mut curve = *self;
        let mut length = 0.0;
        loop {
            let split_t = adaptive_split_point(&curve, precision);
            if !(split_t < 1.0) {
                length += mid_point_quadratic_length(&curve);
                return length;
            }

            let (before, after) = curve.split(split_t);
            length += mid_point_quadratic_length(&before);
            curve = after;
        }
    }

    /// The tight axis-aligned bounding box of the curve.
    pub fn bounding_box(&self) -> Box2D {
        let mut min = self.p0.min(self.p3);
        let mut max = self.p0.max(self.p3);

        let a = (self.p1 - self.p2) * 3.0 + self.p3.to_vector() - self.p0.to_vector();
        let b = (self.p0.to_vector() + self.p2.to_vector() - self.p1.to_vector() * 2.0) * 2.0;
        let c = self.p1 - self.p0;

        let extrema_x = solve_quadratic(a.x, b.x, c.x);
        let extrema_y = solve_quadratic(a.y, b.y, c.y);
        for t in extrema_x.iter().chain(extrema_y.iter()) {
            if *t > 0.0 && *t < 1.0 {
                let p = self.sample(*t);
                min = min.min(p);
                max = max.max(p);
            }
        }

        Box2D::new(min, max)
    }

    /// Parameters along the curve where it crosses the line segment
    /// going from `from` to `to`, sorted in increasing order.
    pub fn line_intersections(&self, from: Point, to: Point) -> ArrayVec<f32, 3> {
        let a = (to.y - from.y) as f64;
        let b = (from.x - to.x) as f64;
        let c = (from.x * (from.y - to.y) + from.y * (to.x - from.x)) as f64;

        let [c0, c1, c2, c3] = self.coefficients();
        let poly = |v: Vector| a * v.x as f64 + b * v.y as f64;

        let roots = cubic_roots_in_unit_interval(poly(c0), poly(c1), poly(c2), poly(c3) + c);

        let line = to - from;
        let mut result = ArrayVec::new();
        for t in roots {
            let t = t as f32;
            let p = self.sample(t);
            let s = if line.x.abs() > EPSILON {
                (p.x - from.x) / line.x
            } else {
                (p.y - from.y) / line.y
            };

            if (0.0..=1.0).contains(&s) {
                result.push(t);
            }
        }

        result
    }
}

/// Scales, rotates then translates all control points of a segment.
pub fn transform_segment(
    segment: &BezierSegment,
    translation: Vector,
    rotation: f32,
    scaling: Vector,
) -> BezierSegment {
    let (sin, cos) = rotation.sin_cos();
    let transform = Transform::new(
        cos * scaling.x,
        sin * scaling.x,
        -sin * scaling.y,
        cos * scaling.y,
        translation.x,
        translation.y,
    );

    segment.transformed(&transform)
}

fn normalized(v: Vector) -> Vector {
    let len = v.length();
    if len > 0.0 {
        v / len
    } else {
        v
    }
}

fn adaptive_split_point(curve: &BezierSegment, precision: f32) -> f32 {
    let third_derivative = curve.p3.to_vector() - curve.p2.to_vector() * 3.0
        + curve.p1.to_vector() * 3.0
        - curve.p0.to_vector();
    let quad_dist = third_derivative.length() * 0.5;

    let ratio = (18.0 / 3f32.sqrt()) * precision / quad_dist;
    ratio.powf(1.0 / 3.0)
}

// Length of the quadratic curve that best approximates the cubic curve around its
// middle point.
fn mid_point_quadratic_length(curve: &BezierSegment) -> f32 {
    let a = curve.p0.to_vector();
    let b = (curve.p2.to_vector() * 3.0 - curve.p3.to_vector() + curve.p1.to_vector() * 3.0
        - curve.p0.to_vector())
        / 4.0;
    let c = curve.p3.to_vector();

    if a == c {
        return if a == b { 0.0 } else { (a - b).length() };
    }
    if b == a || b == c {
        return (a - c).length();
    }

    let ax = a.x as f64;
    let ay = a.y as f64;
    let bx = b.x as f64;
    let by = b.y as f64;
    let cx = c.x as f64;
    let cy = c.y as f64;

    let a0 = (bx - ax, by - ay);
    let a1 = (ax - 2.0 * bx + cx, ay - 2.0 * by + cy);

    let dot = |u: (f64, f64), v: (f64, f64)| u.0 * v.0 + u.1 * v.1;

    // Straight (or numerically straight) quadratic.
    if dot(a1, a1) <= 1e-10 * dot(a0, a0) {
        return (2.0 * dot(a0, a0).sqrt()) as f32;
    }

    let c = 4.0 * dot(a1, a1);
    let b = 8.0 * dot(a0, a1);
    let a = 4.0 * dot(a0, a0);
    let q = 4.0 * a * c - b * b;

    let two_c_plus_b = 2.0 * c + b;
    let sum_cba = c + b + a;

    let l0 = (0.25 / c) * (two_c_plus_b * sum_cba.sqrt() - b * a.sqrt());
    if q == 0.0 {
        return l0 as f32;
    }

    let l1 = (q / (8.0 * c.powf(1.5)))
        * ((2.0 * (c * sum_cba).sqrt() + two_c_plus_b).ln() - (2.0 * (c * a).sqrt() + b).ln());

    (l0 + l1) as f32
}

impl Default for BezierSegment {
    fn default() -> Self {
        let p = point(0.0, 0.0);
        BezierSegment::new(p, p, p, p)
    }
}

#[test]
fn line_evaluation() {
    let line = BezierSegment::line(point(0.0, 0.0), point(1.0, 1.0));
    let p = line.sample(0.5);
    assert!((p - point(0.5, 0.5)).length() < 1e-5);

    let tangent = line.tangent(0.3);
    let expected = vector(1.0, 1.0) / 2f32.sqrt();
    assert!((tangent - expected).length() < 1e-5);
}

#[test]
fn line_normal() {
    let line = BezierSegment::line(point(0.0, 0.0), point(1.0, 0.0));
    let n = line.normal(0.5);
    assert!((n - vector(0.0, 1.0)).length() < 1e-5);
}

#[test]
fn degenerate_tangent() {
    // The first control point is on top of the start point.
    let curve = BezierSegment::new(point(0.0, 0.0), point(0.0, 0.0), point(1.0, 0.0), point(2.0, 0.0));
    let t = curve.tangent(0.0);
    assert!((t - vector(1.0, 0.0)).length() < 1e-4);

    let t = curve.tangent(1.0);
    assert!((t - vector(1.0, 0.0)).length() < 1e-4);
}

#[test]
fn line_length() {
    let line = BezierSegment::line(point(0.0, 0.0), point(1.0, 1.0));
    assert!((line.length(0.001) - 2f32.sqrt()).abs() < 1e-4);

    let line = BezierSegment::line(point(10.0, 0.0), point(10.0, -30.0));
    assert!((line.length(0.001) - 30.0).abs() < 1e-3);
}

#[test]
fn quarter_circle_length() {
    let arc = crate::make_arc(point(0.0, 0.0), 0.0, core::f32::consts::FRAC_PI_2);
    let expected = core::f32::consts::FRAC_PI_2;
    assert!((arc.length(0.0001) - expected).abs() < 1e-3);
}

#[test]
fn split_line() {
    let line = BezierSegment::line(point(0.0, 0.0), point(1.0, 0.0));
    let (a, b) = line.split(0.5);
    assert_eq!(a.p0, point(0.0, 0.0));
    assert!((a.p3 - point(0.5, 0.0)).length() < 1e-6);
    assert!((b.p0 - point(0.5, 0.0)).length() < 1e-6);
    assert_eq!(b.p3, point(1.0, 0.0));

    let curve = BezierSegment::new(point(0.0, 0.0), point(1.0, 2.0), point(3.0, -1.0), point(4.0, 1.0));
    let (a, b) = curve.split(0.3);
    for i in 0..=10 {
        let t = i as f32 / 10.0;
        assert!((a.sample(t) - curve.sample(t * 0.3)).length() < 1e-4);
        assert!((b.sample(t) - curve.sample(0.3 + t * 0.7)).length() < 1e-4);
    }
}

#[test]
fn flipped() {
    let curve = BezierSegment::new(point(0.0, 0.0), point(1.0, 2.0), point(3.0, -1.0), point(4.0, 1.0));
    let flipped = curve.flip();
    assert!((flipped.sample(0.25) - curve.sample(0.75)).length() < 1e-5);
    assert_eq!(flipped.flip(), curve);
}

#[test]
fn curve_bounding_box() {
    let curve = BezierSegment::new(point(0.0, 0.0), point(0.0, 1.0), point(1.0, 1.0), point(1.0, 0.0));
    let bb = curve.bounding_box();
    assert!((bb.min - point(0.0, 0.0)).length() < 1e-5);
    assert!((bb.max - point(1.0, 0.75)).length() < 1e-5);

    let line = BezierSegment::line(point(3.0, -2.0), point(-1.0, 5.0));
    let bb = line.bounding_box();
    assert!((bb.min - point(-1.0, -2.0)).length() < 1e-5);
    assert!((bb.max - point(3.0, 5.0)).length() < 1e-5);
}

#[test]
fn arc_line_intersection() {
    let arc = crate::make_arc(point(0.0, 0.0), 0.0, core::f32::consts::FRAC_PI_2);
    let from = point(0.0, 1.1);
    let to = point(1.1, 0.0);
    let ts = arc.line_intersections(from, to);
    assert_eq!(ts.len(), 2);
    assert!(ts[0] < ts[1]);
    for t in ts {
        let p = arc.sample(t);
        // On the line.
        assert!((p.x + p.y - 1.1).abs() < 1e-3);
        // On the unit circle.
        assert!((p.to_vector().length() - 1.0).abs() < 1e-3);
    }

    // The segment stops before reaching the curve.
    let ts = arc.line_intersections(point(0.0, 0.0), point(0.5, 0.5));
    assert!(ts.is_empty());
}

#[test]
fn transform_segments() {
    let line = BezierSegment::line(point(1.0, 0.0), point(2.0, 0.0));
    let s = transform_segment(&line, vector(1.0, 1.0), core::f32::consts::FRAC_PI_2, vector(2.0, 2.0));
    assert!((s.p0 - point(1.0, 3.0)).length() < 1e-5);
    assert!((s.p3 - point(1.0, 5.0)).length() < 1e-5);
}
