//! Filling polygons with a winding rule.
//!
//! The triangulation itself is delegated to lyon's sweep line fill tessellator.
//! Polygons are rotated by 45 degrees before being triangulated and the output
//! is rotated back, which keeps axis-aligned outlines (rectangles and most
//! user interface shapes) away from the degenerate configurations of the
//! sweep line.

use crate::math::*;
use crate::{TessellationResult, VertexBuffers, EPSILON};

use lyon_tessellation::path::Path;
use lyon_tessellation::{BuffersBuilder, FillOptions, FillRule, FillTessellator, FillVertex};

use std::f32::consts::FRAC_PI_4;

/// How overlapping and nested polygons are filled.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum FillMode {
    /// Any point with a non-zero winding number is inside.
    #[default]
    NonZero,
    /// Points inside an odd number of polygons are inside.
    OddEven,
}

impl FillMode {
    fn fill_rule(self) -> FillRule {
        match self {
            FillMode::NonZero => FillRule::NonZero,
            FillMode::OddEven => FillRule::EvenOdd,
        }
    }
}

/// Triangulates sets of closed polygons, reusing the sweep line's
/// allocations from one call to the next.
pub struct PolygonFiller {
    tessellator: FillTessellator,
}

impl PolygonFiller {
    pub fn new() -> Self {
        PolygonFiller {
            tessellator: FillTessellator::new(),
        }
    }

    /// See [`fill_polygons`].
    pub fn fill(&mut self, polygons: &[Vec<Point>], mode: FillMode) -> TessellationResult<VertexBuffers<Point, u32>> {
        let mut output = VertexBuffers::new();

        let rotation = Rotation::radians(FRAC_PI_4);
        let inverse = rotation.inverse();

        let mut builder = Path::builder();
        let mut contours = 0;
        let mut winding = 0.0;
        for polygon in polygons.iter().filter(|polygon| polygon.len() >= 3) {
            winding += polygon_signed_area(polygon);

            let mut points = polygon.iter().map(|p| {
                let p = rotation.transform_point(*p);
                lyon_tessellation::math::point(p.x, p.y)
            });

            if let Some(first) = points.next() {
                builder.begin(first);
                for p in points {
                    builder.line_to(p);
                }
                builder.end(true);
                contours += 1;
            }
        }

        if contours == 0 {
            return Ok(output);
        }

        let path = builder.build();
        let options = FillOptions::default().with_fill_rule(mode.fill_rule());

        self.tessellator.tessellate_path(
            &path,
            &options,
            &mut BuffersBuilder::new(&mut output, |vertex: FillVertex| {
                let p = vertex.position();
                inverse.transform_point(point(p.x, p.y))
            }),
        )?;

        orient_triangles(&mut output, winding);

        tracing::trace!(
            contours,
            vertices = output.vertices.len(),
            triangles = output.indices.len() / 3,
            "polygons filled"
        );

        Ok(output)
    }
}

impl Default for PolygonFiller {
    fn default() -> Self {
        PolygonFiller::new()
    }
}

/// Triangulates a set of closed polygons.
///
/// Polygons with less than three points are ignored. The vertices of the
/// result are in the same space as the input, and the triangles turn the
/// same way as the polygons taken together: their signed areas add up to the
/// signed area of the filled region.
pub fn fill_polygons(polygons: &[Vec<Point>], mode: FillMode) -> TessellationResult<VertexBuffers<Point, u32>> {
    PolygonFiller::new().fill(polygons, mode)
}

/// Shoelace formula, positive when the polygon turns from the x axis
/// towards the y axis.
pub fn polygon_signed_area(polygon: &[Point]) -> f32 {
    let mut area = 0.0;
    for i in 0..polygon.len() {
        let a = polygon[i].to_vector();
        let b = polygon[(i + 1) % polygon.len()].to_vector();
        area += a.cross(b);
    }

    area * 0.5
}

fn orient_triangles(geometry: &mut VertexBuffers<Point, u32>, winding: f32) {
    if winding.abs() <= EPSILON {
        return;
    }

    let vertices = &geometry.vertices;
    for tri in geometry.indices.chunks_exact_mut(3) {
        let a = vertices[tri[0] as usize];
        let b = vertices[tri[1] as usize];
        let c = vertices[tri[2] as usize];
        if (b - a).cross(c - a) * winding < 0.0 {
            tri.swap(1, 2);
        }
    }
}

#[cfg(test)]
fn covered_area(geometry: &VertexBuffers<Point, u32>) -> f32 {
    geometry
        .indices
        .chunks(3)
        .map(|tri| {
            let a = geometry.vertices[tri[0] as usize];
            let b = geometry.vertices[tri[1] as usize];
            let c = geometry.vertices[tri[2] as usize];
            (b - a).cross(c - a).abs() * 0.5
        })
        .sum()
}

#[cfg(test)]
fn square(min: f32, max: f32) -> Vec<Point> {
    vec![point(min, min), point(max, min), point(max, max), point(min, max)]
}

#[cfg(test)]
fn signed_area(geometry: &VertexBuffers<Point, u32>) -> f32 {
    geometry
        .indices
        .chunks(3)
        .map(|tri| {
            let a = geometry.vertices[tri[0] as usize];
            let b = geometry.vertices[tri[1] as usize];
            let c = geometry.vertices[tri[2] as usize];
            (b - a).cross(c - a) * 0.5
        })
        .sum()
}

#[test]
fn fill_a_square() {
    let geometry = fill_polygons(&[square(0.0, 10.0)], FillMode::NonZero).unwrap();
    assert_eq!(geometry.vertices.len(), 4);
    assert_eq!(geometry.indices.len(), 6);

    for corner in &square(0.0, 10.0) {
        assert!(geometry.vertices.iter().any(|v| (*v - *corner).length() < 1e-3));
    }
    assert!((covered_area(&geometry) - 100.0).abs() < 1e-2);
}

#[test]
fn fill_rules() {
    let polygons = [square(0.0, 10.0), square(2.0, 8.0)];

    let non_zero = fill_polygons(&polygons, FillMode::NonZero).unwrap();
    assert!((covered_area(&non_zero) - 100.0).abs() < 1e-2);

    let odd_even = fill_polygons(&polygons, FillMode::OddEven).unwrap();
    assert!((covered_area(&odd_even) - 64.0).abs() < 1e-2);
}

#[test]
fn fill_nothing() {
    let geometry = fill_polygons(&[], FillMode::NonZero).unwrap();
    assert!(geometry.vertices.is_empty());

    let degenerate = vec![point(0.0, 0.0), point(1.0, 1.0)];
    let geometry = fill_polygons(&[degenerate], FillMode::OddEven).unwrap();
    assert!(geometry.indices.is_empty());
}

#[test]
fn fill_area_matches_the_outline() {
    use crate::{build_rounded_rectangle_contour, trace_shape, CornerRadii, TessellationOptions};

    let circle = build_rounded_rectangle_contour(point(0.0, 0.0), size(100.0, 100.0), &CornerRadii::new(50.0));
    let mut outline = trace_shape(&circle, &[], 0.0, &TessellationOptions::DEFAULT).unwrap();
    let expected = polygon_signed_area(&outline);
    assert!(expected.abs() > 7000.0);

    let geometry = fill_polygons(&[outline.clone()], FillMode::NonZero).unwrap();
    assert!((signed_area(&geometry) - expected).abs() < expected.abs() * 1e-3);

    outline.reverse();
    let geometry = fill_polygons(&[outline], FillMode::NonZero).unwrap();
    assert!((signed_area(&geometry) + expected).abs() < expected.abs() * 1e-3);
}

#[test]
fn triangles_follow_the_polygon_winding() {
    let ccw = square(0.0, 10.0);
    assert_eq!(polygon_signed_area(&ccw), 100.0);
    let geometry = fill_polygons(&[ccw.clone()], FillMode::NonZero).unwrap();
    assert!((signed_area(&geometry) - 100.0).abs() < 1e-2);

    let mut cw = ccw;
    cw.reverse();
    let geometry = fill_polygons(&[cw], FillMode::NonZero).unwrap();
    assert!((signed_area(&geometry) + 100.0).abs() < 1e-2);

    // A hole winding the other way.
    let mut hole = square(2.0, 8.0);
    hole.reverse();
    let geometry = fill_polygons(&[square(0.0, 10.0), hole], FillMode::NonZero).unwrap();
    assert!((signed_area(&geometry) - 64.0).abs() < 1e-2);
}

#[test]
fn reused_filler() {
    let mut filler = PolygonFiller::new();
    let first = filler.fill(&[square(0.0, 10.0)], FillMode::NonZero).unwrap();
    let polygons = [square(0.0, 10.0), square(2.0, 8.0)];
    let second = filler.fill(&polygons, FillMode::OddEven).unwrap();
    let third = filler.fill(&[square(0.0, 10.0)], FillMode::NonZero).unwrap();

    assert!((signed_area(&second) - 64.0).abs() < 1e-2);
    assert_eq!(first.vertices, third.vertices);
    assert_eq!(first.indices, third.indices);
}
