//! Clipping geometry against nested sets of polygons.
//!
//! Each level of a [`ClipStack`] is a set of polygons in world space, filled
//! with the non-zero rule. Geometry is kept where all levels overlap.
//!
//! Triangles are clipped one at a time: a triangle is convex, so each clip
//! polygon can be reduced to its intersection with the triangle with the
//! Sutherland-Hodgman algorithm, using the triangle as the clipping window.
//! The pieces are then triangulated again.

use crate::math::*;
use crate::tessellation::{FillMode, PolygonFiller};
use crate::EPSILON;

use std::collections::HashMap;

type Triangle = [Point; 3];

/// A set of polygons and their bounds.
struct ClipLevel {
    polygons: Vec<(Vec<Point>, Box2D)>,
}

/// Nested clip regions, pushed and popped while walking a hierarchy.
#[derive(Default)]
pub struct ClipStack {
    levels: Vec<ClipLevel>,
}

impl ClipStack {
    pub fn new() -> Self {
        ClipStack { levels: Vec::new() }
    }

    /// Pushes a clip region given as polygons in the space `transform` maps to
    /// world space.
    pub fn push(&mut self, polygons: Vec<Vec<Point>>, transform: &Transform) {
        let polygons = polygons
            .into_iter()
            .filter(|polygon| polygon.len() >= 3)
            .map(|polygon| {
                let polygon: Vec<Point> = polygon.iter().map(|p| transform.transform_point(*p)).collect();
                let bounds = Box2D::from_points(polygon.iter());
                (polygon, bounds)
            })
            .collect();

        self.levels.push(ClipLevel { polygons });
    }

    pub fn pop(&mut self) {
        self.levels.pop();
    }

    pub fn clear(&mut self) {
        self.levels.clear();
    }

    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Clips a triangle list in world space against every level.
    pub fn clip_triangles(&self, mut triangles: Vec<Triangle>) -> Vec<Triangle> {
        let mut filler = PolygonFiller::new();
        for level in &self.levels {
            if triangles.is_empty() {
                break;
            }

            let mut clipped = Vec::with_capacity(triangles.len());
            for triangle in &triangles {
                clip_triangle(triangle, level, &mut filler, &mut clipped);
            }
            triangles = clipped;
        }

        triangles
    }

    /// Clips indexed geometry given in local space.
    ///
    /// Returns `None` when `world_transform` can't be inverted, in which case
    /// nothing of the geometry can be placed back in local space.
    pub fn clip_indexed(
        &self,
        vertices: &[Point],
        indices: &[u16],
        world_transform: &Transform,
    ) -> Option<(Vec<Point>, Vec<u32>)> {
        let inverse = world_transform.inverse()?;

        let triangles = indices
            .chunks_exact(3)
            .filter(|tri| tri.iter().all(|idx| (*idx as usize) < vertices.len()))
            .map(|tri| {
                [
                    world_transform.transform_point(vertices[tri[0] as usize]),
                    world_transform.transform_point(vertices[tri[1] as usize]),
                    world_transform.transform_point(vertices[tri[2] as usize]),
                ]
            })
            .collect();

        let triangles = self.clip_triangles(triangles);

        let mut out_vertices = Vec::new();
        let mut out_indices = Vec::with_capacity(triangles.len() * 3);
        let mut index_of: HashMap<(u32, u32), u32> = HashMap::new();
        for triangle in &triangles {
            for p in triangle {
                let key = (p.x.to_bits(), p.y.to_bits());
                let idx = *index_of.entry(key).or_insert_with(|| {
                    out_vertices.push(inverse.transform_point(*p));
                    out_vertices.len() as u32 - 1
                });
                out_indices.push(idx);
            }
        }

        Some((out_vertices, out_indices))
    }
}

fn signed_area(t: &Triangle) -> f32 {
    (t[1] - t[0]).cross(t[2] - t[0]) * 0.5
}

fn clip_triangle(triangle: &Triangle, level: &ClipLevel, filler: &mut PolygonFiller, output: &mut Vec<Triangle>) {
    let area = signed_area(triangle);
    if area.abs() <= EPSILON {
        return;
    }

    // The window must turn counter-clockwise for the inside test.
    let window = if area > 0.0 {
        *triangle
    } else {
        [triangle[0], triangle[2], triangle[1]]
    };
    let window_bounds = Box2D::from_points(window.iter());

    let mut pieces = Vec::new();
    for (polygon, bounds) in &level.polygons {
        if !bounds.intersects(&window_bounds) {
            continue;
        }

        let piece = sutherland_hodgman(polygon, &window);
        if piece.len() >= 3 {
            pieces.push(piece);
        }
    }

    if pieces.is_empty() {
        return;
    }

    match filler.fill(&pieces, FillMode::NonZero) {
        Ok(geometry) => {
            for tri in geometry.indices.chunks_exact(3) {
                output.push([
                    geometry.vertices[tri[0] as usize],
                    geometry.vertices[tri[1] as usize],
                    geometry.vertices[tri[2] as usize],
                ]);
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to triangulate a clipped triangle, dropping it");
        }
    }
}

/// Clips `subject` against a counter-clockwise convex `window`.
///
/// The subject may be concave, in which case disjoint parts of the result are
/// connected by zero-width bridges along the window's edges.
fn sutherland_hodgman(subject: &[Point], window: &[Point]) -> Vec<Point> {
    let mut output = subject.to_vec();

    for i in 0..window.len() {
        if output.is_empty() {
            break;
        }

        let edge_start = window[i];
        let edge_end = window[(i + 1) % window.len()];
        output = clip_polygon_to_edge(&output, edge_start, edge_end);
    }

    output
}

fn clip_polygon_to_edge(polygon: &[Point], edge_start: Point, edge_end: Point) -> Vec<Point> {
    let mut output = Vec::with_capacity(polygon.len() + 2);

    for i in 0..polygon.len() {
        let current = polygon[i];
        let next = polygon[(i + 1) % polygon.len()];

        let current_inside = is_inside_edge(current, edge_start, edge_end);
        let next_inside = is_inside_edge(next, edge_start, edge_end);

        if current_inside {
            output.push(current);
            if !next_inside {
                output.push(edge_intersection(current, next, edge_start, edge_end));
            }
        } else if next_inside {
            output.push(edge_intersection(current, next, edge_start, edge_end));
        }
    }

    output
}

fn is_inside_edge(p: Point, edge_start: Point, edge_end: Point) -> bool {
    (edge_end - edge_start).cross(p - edge_start) >= 0.0
}

// Only called when the points are on different sides of the edge, so the
// lines can't be parallel.
fn edge_intersection(a: Point, b: Point, edge_start: Point, edge_end: Point) -> Point {
    let d1 = b - a;
    let d2 = edge_end - edge_start;
    let denom = d1.cross(d2);
    if denom.abs() <= f32::MIN_POSITIVE {
        return a;
    }

    let t = (edge_start - a).cross(d2) / denom;
    a + d1 * t
}

#[cfg(test)]
fn covered_area(triangles: &[Triangle]) -> f32 {
    triangles.iter().map(|t| signed_area(t).abs()).sum()
}

#[cfg(test)]
fn square(min: f32, max: f32) -> Vec<Point> {
    vec![point(min, min), point(max, min), point(max, max), point(min, max)]
}

#[cfg(test)]
fn square_triangles(min: f32, max: f32) -> Vec<Triangle> {
    vec![
        [point(min, min), point(max, min), point(max, max)],
        [point(min, min), point(max, max), point(min, max)],
    ]
}

#[test]
fn window_clipping() {
    let window = [point(0.0, 0.0), point(10.0, 0.0), point(0.0, 10.0)];
    let clipped = sutherland_hodgman(&square(-5.0, 5.0), &window);
    // The square's quarter in the positive quadrant.
    assert_eq!(clipped.len(), 4);
    for p in &clipped {
        assert!(p.x >= -1e-5 && p.y >= -1e-5 && p.x <= 5.0 + 1e-5 && p.y <= 5.0 + 1e-5);
    }

    assert!(sutherland_hodgman(&square(20.0, 30.0), &window).is_empty());
}

#[test]
fn empty_stack_keeps_everything() {
    let stack = ClipStack::new();
    let triangles = square_triangles(0.0, 10.0);
    assert_eq!(stack.clip_triangles(triangles.clone()), triangles);
}

#[test]
fn clip_against_a_square() {
    let mut stack = ClipStack::new();
    stack.push(vec![square(5.0, 15.0)], &Transform::identity());
    assert_eq!(stack.depth(), 1);

    let clipped = stack.clip_triangles(square_triangles(0.0, 10.0));
    assert!((covered_area(&clipped) - 25.0).abs() < 1e-2);
    for tri in &clipped {
        for p in tri {
            assert!(p.x >= 5.0 - 1e-3 && p.y >= 5.0 - 1e-3);
            assert!(p.x <= 10.0 + 1e-3 && p.y <= 10.0 + 1e-3);
        }
    }

    stack.pop();
    assert!(stack.is_empty());
}

#[test]
fn nested_levels_intersect() {
    let mut stack = ClipStack::new();
    stack.push(vec![square(0.0, 6.0)], &Transform::identity());
    // Pushed in a translated space: covers [4, 10] in world space.
    stack.push(vec![square(0.0, 6.0)], &Transform::translation(4.0, 4.0));

    let clipped = stack.clip_triangles(square_triangles(0.0, 10.0));
    assert!((covered_area(&clipped) - 4.0).abs() < 1e-2);
}

#[test]
fn clip_with_a_concave_polygon() {
    // An L shape covering three quarters of the square.
    let l_shape = vec![
        point(0.0, 0.0),
        point(10.0, 0.0),
        point(10.0, 5.0),
        point(5.0, 5.0),
        point(5.0, 10.0),
        point(0.0, 10.0),
    ];

    let mut stack = ClipStack::new();
    stack.push(vec![l_shape], &Transform::identity());
    let clipped = stack.clip_triangles(square_triangles(0.0, 10.0));
    assert!((covered_area(&clipped) - 75.0).abs() < 1e-2);
}

#[test]
fn union_of_polygons() {
    let mut stack = ClipStack::new();
    stack.push(vec![square(0.0, 2.0), square(8.0, 10.0)], &Transform::identity());
    let clipped = stack.clip_triangles(square_triangles(0.0, 10.0));
    assert!((covered_area(&clipped) - 8.0).abs() < 1e-2);
}

#[test]
fn indexed_geometry() {
    let mut stack = ClipStack::new();
    stack.push(vec![square(0.0, 10.0)], &Transform::identity());

    // Local square [0, 10] placed at [5, 15] in world space.
    let vertices = square(0.0, 10.0);
    let indices = [0u16, 1, 2, 0, 2, 3];
    let world = Transform::translation(5.0, 5.0);
    let (clipped_vertices, clipped_indices) = stack.clip_indexed(&vertices, &indices, &world).unwrap();

    assert!(clipped_indices.len() >= 6);
    let mut area = 0.0;
    for tri in clipped_indices.chunks(3) {
        let t = [
            clipped_vertices[tri[0] as usize],
            clipped_vertices[tri[1] as usize],
            clipped_vertices[tri[2] as usize],
        ];
        area += signed_area(&t).abs();
        for p in &t {
            // Back in local space.
            assert!(p.x <= 5.0 + 1e-3 && p.y <= 5.0 + 1e-3);
        }
    }
    assert!((area - 25.0).abs() < 1e-2);

    let singular = Transform::scale(0.0, 1.0);
    assert!(stack.clip_indexed(&vertices, &indices, &singular).is_none());
}

#[test]
fn clip_a_triangle_grid() {
    let mut stack = ClipStack::new();
    stack.push(vec![square(5.0, 15.0)], &Transform::identity());
    stack.push(vec![square(0.0, 12.0)], &Transform::identity());

    let mut triangles = Vec::new();
    for i in 0..4 {
        for j in 0..4 {
            let mut cell = square_triangles(0.0, 5.0);
            for tri in &mut cell {
                for p in tri.iter_mut() {
                    *p += vector(i as f32 * 5.0, j as f32 * 5.0);
                }
            }
            triangles.extend(cell);
        }
    }

    // [5, 12] on both axes.
    let clipped = stack.clip_triangles(triangles);
    assert!((covered_area(&clipped) - 49.0).abs() < 1e-2);
}
