//! Tessellation routines for simple shapes.

use crate::geom::{arc::arc_segment_for_quadrant, transform_segment};
use crate::math::*;
use crate::path::{make_path_line, BezierContour, BezierPathSegment};
use crate::{VertexBuffers, EPSILON};

/// Two triangles covering `rect`.
pub fn tessellate_rect(rect: &Box2D) -> VertexBuffers<Point, u16> {
    let mut output = VertexBuffers::with_capacity(4, 6);

    output.vertices.extend_from_slice(&[
        rect.min,
        top_right(rect),
        rect.max,
        bottom_left(rect),
    ]);
    output.indices.extend_from_slice(&[1, 0, 2, 2, 0, 3]);

    output
}

/// A frame of `2 * half_thickness` centered on the edges of `rect`.
///
/// Each edge is a quad that extends over the corners so that the frame has no
/// gap, the corners being covered twice.
pub fn tessellate_rect_border(rect: &Box2D, half_thickness: f32) -> VertexBuffers<Point, u16> {
    let h = half_thickness;
    let mut output = VertexBuffers::with_capacity(16, 24);

    // Each edge goes from p0 to p1, turning around the rectangle.
    let edges = [
        (bottom_left(rect), rect.min, vector(-h, h), vector(-h, -h), vector(h, h), vector(h, -h)),
        (rect.min, top_right(rect), vector(-h, -h), vector(h, -h), vector(-h, h), vector(h, h)),
        (top_right(rect), rect.max, vector(h, -h), vector(h, h), vector(-h, -h), vector(-h, h)),
        (rect.max, bottom_left(rect), vector(h, h), vector(-h, h), vector(h, -h), vector(-h, -h)),
    ];

    for (i, (p0, p1, d0, d1, d2, d3)) in edges.iter().enumerate() {
        let base = (i * 4) as u16;
        output.vertices.extend_from_slice(&[*p0 + *d0, *p1 + *d1, *p1 + *d2, *p0 + *d3]);
        output.indices.extend([0, 3, 2, 2, 1, 0].iter().map(|idx| base + idx));
    }

    output
}

#[inline]
fn top_right(rect: &Box2D) -> Point {
    point(rect.max.x, rect.min.y)
}

#[inline]
fn bottom_left(rect: &Box2D) -> Point {
    point(rect.min.x, rect.max.y)
}

/// The radii of the four corners of a rectangle, horizontal then vertical.
///
/// The y axis points down: the top corners are at the smallest y.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct CornerRadii {
    pub top_left: Vector,
    pub top_right: Vector,
    pub bottom_left: Vector,
    pub bottom_right: Vector,
}

impl CornerRadii {
    pub const ZERO: Self = CornerRadii {
        top_left: Vector::new(0.0, 0.0),
        top_right: Vector::new(0.0, 0.0),
        bottom_left: Vector::new(0.0, 0.0),
        bottom_right: Vector::new(0.0, 0.0),
    };

    /// The same circular radius on every corner.
    pub fn new(radius: f32) -> Self {
        let r = radius.abs();
        CornerRadii {
            top_left: vector(r, r),
            top_right: vector(r, r),
            bottom_left: vector(r, r),
            bottom_right: vector(r, r),
        }
    }

    /// Whether any corner is rounded.
    pub fn is_rounded(&self) -> bool {
        [self.top_left, self.top_right, self.bottom_left, self.bottom_right]
            .iter()
            .any(|r| r.length() > EPSILON)
    }
}

impl Default for CornerRadii {
    fn default() -> Self {
        Self::ZERO
    }
}

impl std::fmt::Display for CornerRadii {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Clockwise from top left, like CSS.
        write!(
            f,
            "CornerRadii({:?}, {:?}, {:?}, {:?})",
            self.top_left.to_tuple(),
            self.top_right.to_tuple(),
            self.bottom_right.to_tuple(),
            self.bottom_left.to_tuple()
        )
    }
}

/// Builds the closed contour of a rectangle with elliptical corners.
///
/// Radii are clamped to half the size of the rectangle. Straight sides that
/// would be empty are left out, so a square with radii of half its size is a
/// circle made of four arcs.
pub fn build_rounded_rectangle_contour(position: Point, size: Size, radii: &CornerRadii) -> BezierContour {
    let width = size.width;
    let height = size.height;
    let half_size = vector(width / 2.0, height / 2.0);

    let clamp = |r: Vector| r.min(half_size).max(Vector::zero());
    let tl = clamp(radii.top_left);
    let tr = clamp(radii.top_right);
    let br = clamp(radii.bottom_right);
    let bl = clamp(radii.bottom_left);

    let left_size = height - (bl.y + tl.y);
    let top_size = width - (tl.x + tr.x);
    let right_size = height - (br.y + tr.y);
    let bottom_size = width - (bl.x + br.x);

    let mut segments = Vec::with_capacity(9);

    let corner = |segments: &mut Vec<BezierPathSegment>, quadrant: usize, center: Vector, radius: Vector| {
        if radius.length() > EPSILON {
            let arc = transform_segment(&arc_segment_for_quadrant(quadrant), center, 0.0, radius);
            segments.push(BezierPathSegment { p0: arc.p0, p1: arc.p1, p2: arc.p2 });
        }
    };

    if left_size > EPSILON {
        segments.push(make_path_line(point(0.0, tl.y + left_size), point(0.0, tl.y))[0]);
    }

    corner(&mut segments, 2, tl, tl);

    if top_size > EPSILON {
        segments.push(make_path_line(point(tl.x, 0.0), point(tl.x + top_size, 0.0))[0]);
    }

    corner(&mut segments, 3, vector(width - tr.x, tr.y), tr);

    if right_size > EPSILON {
        segments.push(make_path_line(point(width, tr.y), point(width, tr.y + right_size))[0]);
    }

    corner(&mut segments, 0, vector(width - br.x, height - br.y), br);

    if bottom_size > EPSILON {
        segments.push(make_path_line(point(width - br.x, height), point(width - (br.x + bottom_size), height))[0]);
    }

    corner(&mut segments, 1, vector(bl.x, height - bl.y), bl);

    segments.push(BezierPathSegment::end(point(0.0, height - bl.y)));

    let offset = position.to_vector();
    for segment in &mut segments {
        segment.p0 += offset;
        segment.p1 += offset;
        segment.p2 += offset;
    }

    BezierContour::new(segments, true)
}

#[test]
fn rect() {
    let geometry = tessellate_rect(&Box2D::new(point(1.0, 2.0), point(11.0, 7.0)));
    assert_eq!(
        geometry.vertices,
        vec![point(1.0, 2.0), point(11.0, 2.0), point(11.0, 7.0), point(1.0, 7.0)]
    );
    assert_eq!(geometry.indices, vec![1, 0, 2, 2, 0, 3]);
}

#[test]
fn rect_border() {
    let geometry = tessellate_rect_border(&Box2D::new(point(0.0, 0.0), point(10.0, 10.0)), 1.0);
    assert_eq!(geometry.vertices.len(), 16);
    assert_eq!(geometry.indices.len(), 24);
    assert!(geometry.indices.iter().all(|i| *i < 16));

    // Left edge.
    assert_eq!(geometry.vertices[0], point(-1.0, 11.0));
    assert_eq!(geometry.vertices[1], point(-1.0, -1.0));
    assert_eq!(geometry.vertices[2], point(1.0, 1.0));
    assert_eq!(geometry.vertices[3], point(1.0, 9.0));

    for v in &geometry.vertices {
        assert!(v.x >= -1.0 && v.x <= 11.0 && v.y >= -1.0 && v.y <= 11.0);
    }
}

#[test]
fn rounded_rectangle() {
    let radii = CornerRadii::new(2.0);
    let contour = build_rounded_rectangle_contour(point(5.0, 5.0), size(10.0, 6.0), &radii);
    assert!(contour.closed);
    // Four sides, four corners and the closing anchor.
    assert_eq!(contour.segments.len(), 9);
    assert_eq!(contour.segments[0].p0, point(5.0, 9.0));
    assert_eq!(contour.segments[8].p0, point(5.0, 9.0));

    let bounds = contour.bounding_box();
    assert!((bounds.min - point(5.0, 5.0)).length() < 1e-4);
    assert!((bounds.max - point(15.0, 11.0)).length() < 1e-4);

    // Consecutive curves are connected.
    let curves: Vec<_> = contour.curves().collect();
    for pair in curves.windows(2) {
        assert!((pair[0].p3 - pair[1].p0).length() < 1e-4);
    }
}

#[test]
fn fully_rounded_square() {
    let contour = build_rounded_rectangle_contour(point(0.0, 0.0), size(10.0, 10.0), &CornerRadii::new(5.0));
    // No straight sides, only arcs.
    assert_eq!(contour.segments.len(), 5);
    for curve in contour.curves() {
        for t in &[0.0, 0.5, 1.0] {
            let r = (curve.sample(*t) - point(5.0, 5.0)).length();
            assert!((r - 5.0).abs() < 0.01);
        }
    }
}

#[test]
fn radii_are_clamped() {
    let radii = CornerRadii {
        top_left: vector(100.0, 100.0),
        ..CornerRadii::ZERO
    };
    let contour = build_rounded_rectangle_contour(point(0.0, 0.0), size(4.0, 2.0), &radii);
    let bounds = contour.bounding_box();
    assert!((bounds.min - point(0.0, 0.0)).length() < 1e-4);
    assert!((bounds.max - point(4.0, 2.0)).length() < 1e-4);
    assert!(radii.is_rounded());
    assert!(!CornerRadii::ZERO.is_rounded());
    assert_eq!(format!("{}", CornerRadii::new(1.0)), "CornerRadii((1.0, 1.0), (1.0, 1.0), (1.0, 1.0), (1.0, 1.0))");
}
