//! Splitting geometry into batches addressable with 16 bit indices.

use crate::VertexBuffers;

/// Maximum number of vertices in a batch. The largest index is one less, which
/// leaves `u16::MAX` free as a marker.
pub const MAX_BATCH_VERTICES: usize = u16::MAX as usize;

const UNMAPPED: u16 = u16::MAX;

/// Splits a triangle list into batches of at most [`MAX_BATCH_VERTICES`]
/// vertices each.
///
/// Triangles are never split and keep their order. Vertices shared by
/// triangles that end up in different batches are copied into each of them.
/// Trailing indices that don't form a full triangle are ignored.
pub fn split_into_batches<V: Clone>(geometry: &VertexBuffers<V, u32>) -> Vec<VertexBuffers<V, u16>> {
    let mut batches = Vec::new();
    if geometry.vertices.len() <= MAX_BATCH_VERTICES {
        let triangles = geometry.indices.len() / 3 * 3;
        let in_range = geometry.indices[..triangles]
            .iter()
            .all(|idx| (*idx as usize) < geometry.vertices.len());
        if in_range {
            batches.push(VertexBuffers {
                vertices: geometry.vertices.clone(),
                indices: geometry.indices[..triangles].iter().map(|idx| *idx as u16).collect(),
            });
            return batches;
        }
    }

    let mut remap = vec![UNMAPPED; geometry.vertices.len()];
    let mut sources: Vec<u32> = Vec::new();
    let mut current: VertexBuffers<V, u16> = VertexBuffers::new();

    for triangle in geometry.indices.chunks_exact(3) {
        if triangle.iter().any(|idx| *idx as usize >= geometry.vertices.len()) {
            tracing::warn!(?triangle, "skipping triangle with out of range indices");
            continue;
        }

        let missing = triangle
            .iter()
            .enumerate()
            .filter(|(i, idx)| remap[**idx as usize] == UNMAPPED && !triangle[..*i].contains(*idx))
            .count();

        if current.vertices.len() + missing > MAX_BATCH_VERTICES {
            for src in sources.drain(..) {
                remap[src as usize] = UNMAPPED;
            }
            batches.push(std::mem::replace(&mut current, VertexBuffers::new()));
        }

        for idx in triangle {
            let slot = &mut remap[*idx as usize];
            if *slot == UNMAPPED {
                *slot = current.vertices.len() as u16;
                current.vertices.push(geometry.vertices[*idx as usize].clone());
                sources.push(*idx);
            }
            current.indices.push(*slot);
        }
    }

    if !current.indices.is_empty() {
        batches.push(current);
    }

    tracing::trace!(
        vertices = geometry.vertices.len(),
        batches = batches.len(),
        "geometry split into 16 bit batches"
    );

    batches
}

#[cfg(test)]
use crate::math::{point, Point};

#[test]
fn small_geometry_is_a_single_batch() {
    let geometry = VertexBuffers {
        vertices: vec![point(0.0, 0.0), point(1.0, 0.0), point(1.0, 1.0)],
        indices: vec![0, 1, 2],
    };

    let batches = split_into_batches(&geometry);
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].vertices, geometry.vertices);
    assert_eq!(batches[0].indices, vec![0u16, 1, 2]);
}

#[test]
fn large_geometry_is_split() {
    let n = 70_000u32;
    let mut geometry: VertexBuffers<Point, u32> = VertexBuffers::new();
    for i in 0..n {
        geometry.vertices.push(point(i as f32, (i % 2) as f32));
    }
    for i in 0..(n - 2) {
        geometry.indices.extend_from_slice(&[i, i + 1, i + 2]);
    }

    let batches = split_into_batches(&geometry);
    assert_eq!(batches.len(), 2);

    let mut triangles = 0;
    for batch in &batches {
        assert!(batch.vertices.len() <= MAX_BATCH_VERTICES);
        for idx in &batch.indices {
            assert!((*idx as usize) < batch.vertices.len());
        }
        triangles += batch.indices.len() / 3;
    }
    assert_eq!(triangles, (n - 2) as usize);

    // Triangles keep their order and their positions.
    let mut original = geometry.indices.chunks(3);
    for batch in &batches {
        for tri in batch.indices.chunks(3) {
            let expected = original.next().unwrap();
            for k in 0..3 {
                assert_eq!(batch.vertices[tri[k] as usize], geometry.vertices[expected[k] as usize]);
            }
        }
    }
}

#[test]
fn invalid_triangles_are_dropped() {
    let geometry = VertexBuffers {
        vertices: vec![point(0.0, 0.0), point(1.0, 0.0), point(1.0, 1.0)],
        indices: vec![0, 1, 2, 0, 1, 7, 2],
    };

    let batches = split_into_batches(&geometry);
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].indices, vec![0u16, 1, 2]);
}
