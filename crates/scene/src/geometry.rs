use crate::color::Color;
use crate::math::*;
use crate::nodes::points_bounds;
use crate::scene::Fill;
use crate::tessellation::{split_into_batches, VertexBuffers};

use std::sync::Arc;

/// Triangles produced by the tessellation of a drawable.
///
/// Vertices stay in the space of the node that holds the drawable, and
/// `world_transform` places them in the scene. Index buffers are 16 bits
/// wide: larger tessellations are split into several geometries sharing the
/// same properties.
#[derive(Clone, Debug, PartialEq)]
pub struct Geometry {
    pub vertices: Vec<Point>,
    /// Texture coordinates, filled in by the atlas generation.
    pub uvs: Option<Vec<Point>>,
    pub indices: Vec<u16>,
    pub color: Color,
    pub world_transform: Transform,
    pub fill: Option<Arc<Fill>>,
    pub fill_transform: Transform,
    /// Bounds of the vertices before clipping, used to map the fill.
    pub unclipped_bounds: Rect,
    /// The slot of the fill's settings in the atlas, 0 being plain white.
    pub setting_index: u16,
}

impl Geometry {
    pub fn new(vertices: Vec<Point>, indices: Vec<u16>, color: Color) -> Self {
        let unclipped_bounds = points_bounds(vertices.iter().cloned());
        Geometry {
            vertices,
            uvs: None,
            indices,
            color,
            world_transform: Transform::identity(),
            fill: None,
            fill_transform: Transform::identity(),
            unclipped_bounds,
            setting_index: 0,
        }
    }

    pub fn with_fill(mut self, fill: Option<Arc<Fill>>, fill_transform: Transform) -> Self {
        self.fill = fill;
        self.fill_transform = fill_transform;
        self
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Creates geometries from 32 bit indexed buffers, splitting them as
    /// needed. All parts share the bounds of the whole buffers.
    pub(crate) fn from_buffers(
        buffers: &VertexBuffers<Point, u32>,
        template: &Geometry,
        output: &mut Vec<Geometry>,
    ) {
        let unclipped_bounds = points_bounds(buffers.vertices.iter().cloned());
        for batch in split_into_batches(buffers) {
            if batch.indices.is_empty() {
                continue;
            }

            output.push(Geometry {
                vertices: batch.vertices,
                indices: batch.indices,
                uvs: None,
                unclipped_bounds,
                ..template.clone()
            });
        }
    }

    /// An empty geometry carrying the given properties, used as a template.
    pub(crate) fn template(color: Color, fill: Option<Arc<Fill>>, fill_transform: Transform) -> Self {
        Geometry::new(Vec::new(), Vec::new(), color).with_fill(fill, fill_transform)
    }
}

#[test]
fn bounds_of_new_geometry() {
    let g = Geometry::new(vec![point(1.0, 2.0), point(3.0, -1.0), point(0.0, 0.0)], vec![0, 1, 2], Color::WHITE);
    assert_eq!(g.unclipped_bounds, rect(0.0, -1.0, 3.0, 3.0));
    assert_eq!(g.triangle_count(), 1);
    assert!(g.uvs.is_none());
}

#[test]
fn large_buffers_are_split() {
    let mut buffers: VertexBuffers<Point, u32> = VertexBuffers::new();
    for i in 0..70_000u32 {
        buffers.vertices.push(point(i as f32, (i % 2) as f32));
    }
    for i in 0..69_998u32 {
        buffers.indices.extend_from_slice(&[i, i + 1, i + 2]);
    }

    let mut output = Vec::new();
    let template = Geometry::template(Color::BLACK, None, Transform::identity());
    Geometry::from_buffers(&buffers, &template, &mut output);

    assert_eq!(output.len(), 2);
    for g in &output {
        assert_eq!(g.color, Color::BLACK);
        assert_eq!(g.unclipped_bounds, rect(0.0, 0.0, 69_999.0, 1.0));
    }
}
