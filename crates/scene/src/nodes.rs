//! Walking scene hierarchies and measuring them.

use crate::math::*;
use crate::scene::{Drawable, NodeOpacities, SceneNode};

/// Iterates over every node of a hierarchy in pre-order, starting with `root`.
pub fn scene_nodes(root: &SceneNode) -> SceneNodes<'_> {
    SceneNodes { stack: vec![root] }
}

pub struct SceneNodes<'l> {
    stack: Vec<&'l SceneNode>,
}

impl<'l> Iterator for SceneNodes<'l> {
    type Item = &'l SceneNode;

    fn next(&mut self) -> Option<&'l SceneNode> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());

        Some(node)
    }
}

/// A node visited by [`world_transformed_nodes`].
#[derive(Copy, Clone, Debug)]
pub struct NodeWorldTransform<'l> {
    pub node: &'l SceneNode,
    pub parent: Option<&'l SceneNode>,
    /// Product of the transforms from the node up to the root, included.
    pub world_transform: Transform,
    /// Product of the opacities from the node up to the root, included.
    pub world_opacity: f32,
}

/// Iterates over every node of a hierarchy in pre-order, along with their
/// accumulated transforms and opacities.
pub fn world_transformed_nodes<'l>(
    root: &'l SceneNode,
    opacities: Option<&'l NodeOpacities>,
) -> WorldTransformedNodes<'l> {
    WorldTransformedNodes {
        stack: vec![(root, None, Transform::identity(), 1.0)],
        opacities,
    }
}

pub struct WorldTransformedNodes<'l> {
    stack: Vec<(&'l SceneNode, Option<&'l SceneNode>, Transform, f32)>,
    opacities: Option<&'l NodeOpacities>,
}

impl<'l> Iterator for WorldTransformedNodes<'l> {
    type Item = NodeWorldTransform<'l>;

    fn next(&mut self) -> Option<NodeWorldTransform<'l>> {
        let (node, parent, parent_transform, parent_opacity) = self.stack.pop()?;

        let item = NodeWorldTransform {
            node,
            parent,
            world_transform: node.transform.then(&parent_transform),
            world_opacity: parent_opacity * node_opacity(node, self.opacities),
        };

        for child in node.children.iter().rev() {
            self.stack.push((child, Some(node), item.world_transform, item.world_opacity));
        }

        Some(item)
    }
}

pub(crate) fn node_opacity(node: &SceneNode, opacities: Option<&NodeOpacities>) -> f32 {
    match (node.id, opacities) {
        (Some(id), Some(opacities)) => opacities.get(&id).cloned().unwrap_or(1.0),
        _ => 1.0,
    }
}

/// The bounding rectangle of a set of points, empty at the origin if there
/// is none.
pub fn points_bounds<I: IntoIterator<Item = Point>>(points: I) -> Rect {
    let mut points = points.into_iter();
    let first = match points.next() {
        Some(p) => p,
        None => return Rect::zero(),
    };

    let mut bounds = Box2D::new(first, first);
    for p in points {
        bounds.min = bounds.min.min(p);
        bounds.max = bounds.max.max(p);
    }

    bounds.to_rect()
}

fn rectangle_corners(position: Point, size: Size, transform: &Transform) -> [Point; 4] {
    [
        transform.transform_point(position),
        transform.transform_point(point(position.x + size.width, position.y)),
        transform.transform_point(position + size.to_vector()),
        transform.transform_point(point(position.x, position.y + size.height)),
    ]
}

/// The bounds of the drawables of a hierarchy, in the space of `root`'s
/// parent.
///
/// Curves are measured exactly, stroke widths are ignored.
pub fn scene_node_bounds(root: &SceneNode) -> Rect {
    let mut bounds: Option<Box2D> = None;
    let mut add = |b: Box2D| {
        bounds = Some(match bounds {
            Some(bounds) => bounds.union(&b),
            None => b,
        });
    };

    for item in world_transformed_nodes(root, None) {
        for drawable in &item.node.drawables {
            match drawable {
                Drawable::Path(path) => {
                    add(path.contour.transformed(&item.world_transform).bounding_box());
                }
                Drawable::Shape(shape) => {
                    for contour in &shape.contours {
                        add(contour.transformed(&item.world_transform).bounding_box());
                    }
                }
                Drawable::Rectangle(rect) => {
                    let corners = rectangle_corners(rect.position, rect.size, &item.world_transform);
                    add(points_bounds(corners.iter().cloned()).to_box2d());
                }
            }
        }
    }

    bounds.map_or(Rect::zero(), |b| b.to_rect())
}

/// A cheaper estimate of [`scene_node_bounds`], using the control points of
/// the curves. The result contains the exact bounds.
pub fn approximate_scene_node_bounds(root: &SceneNode) -> Rect {
    let mut points = Vec::with_capacity(100);

    for item in world_transformed_nodes(root, None) {
        let transform = &item.world_transform;
        for drawable in &item.node.drawables {
            let contours = match drawable {
                Drawable::Path(path) => std::slice::from_ref(&path.contour),
                Drawable::Shape(shape) => &shape.contours[..],
                Drawable::Rectangle(rect) => {
                    points.extend_from_slice(&rectangle_corners(rect.position, rect.size, transform));
                    continue;
                }
            };

            for contour in contours {
                for segment in &contour.segments {
                    points.push(transform.transform_point(segment.p0));
                    points.push(transform.transform_point(segment.p1));
                    points.push(transform.transform_point(segment.p2));
                }
            }
        }
    }

    points_bounds(points)
}

/// Translates vertices so that their bounding box starts at the origin,
/// optionally flipping the y axis within the box.
///
/// Returns the bounding box of the vertices before the translation.
pub fn realign_vertices_in_bounds(vertices: &mut [Point], flip_y: bool) -> Rect {
    let bounds = points_bounds(vertices.iter().cloned());
    let origin = bounds.origin.to_vector();
    let height = bounds.size.height;

    for v in vertices.iter_mut() {
        *v -= origin;
        if flip_y {
            v.y = height - v.y;
        }
    }

    bounds
}

#[cfg(test)]
use crate::path::{make_path_line, BezierContour, BezierPathSegment};
#[cfg(test)]
use crate::scene::{NodeId, Rectangle, Shape};

#[cfg(test)]
fn test_tree() -> SceneNode {
    let mut a = SceneNode::new();
    a.id = Some(NodeId(1));
    a.transform = Transform::translation(10.0, 0.0);

    let mut b = SceneNode::new();
    b.id = Some(NodeId(2));
    b.transform = Transform::scale(2.0, 2.0);
    b.drawables.push(Rectangle::new(point(0.0, 0.0), size(1.0, 1.0), None).into());

    let mut c = SceneNode::new();
    c.id = Some(NodeId(3));
    a.children.push(b);

    let mut root = SceneNode::with_children(vec![a, c]);
    root.id = Some(NodeId(0));
    root
}

#[test]
fn pre_order() {
    let root = test_tree();
    let ids: Vec<_> = scene_nodes(&root).map(|n| n.id.unwrap().0).collect();
    assert_eq!(ids, vec![0, 1, 2, 3]);
}

#[test]
fn world_transforms_and_opacities() {
    let root = test_tree();
    let mut opacities = NodeOpacities::new();
    opacities.insert(NodeId(1), 0.5);
    opacities.insert(NodeId(2), 0.5);

    let items: Vec<_> = world_transformed_nodes(&root, Some(&opacities)).collect();
    assert_eq!(items.len(), 4);
    assert!(items[0].parent.is_none());
    assert_eq!(items[2].parent.unwrap().id, Some(NodeId(1)));
    assert_eq!(items[2].world_opacity, 0.25);
    assert_eq!(items[3].world_opacity, 1.0);

    // The child's transform applies first, then the parent's.
    let p = items[2].world_transform.transform_point(point(1.0, 1.0));
    assert_eq!(p, point(12.0, 2.0));
}

#[test]
fn bounds() {
    let root = test_tree();
    assert_eq!(scene_node_bounds(&root), rect(10.0, 0.0, 2.0, 2.0));
    assert_eq!(approximate_scene_node_bounds(&root), rect(10.0, 0.0, 2.0, 2.0));
    assert_eq!(scene_node_bounds(&SceneNode::new()), Rect::zero());
}

#[test]
fn curve_bounds_are_tighter_than_control_points() {
    let arc = crate::geom::make_arc(point(0.0, 0.0), 0.0, std::f32::consts::FRAC_PI_2);
    let segments = vec![
        BezierPathSegment { p0: arc.p0, p1: arc.p1, p2: arc.p2 },
        make_path_line(arc.p3, point(0.0, 0.0))[0],
        BezierPathSegment::end(point(0.0, 0.0)),
    ];
    let contour = BezierContour::new(segments, true);

    let root = SceneNode::with_drawables(vec![Shape::new(vec![contour], None).into()]);
    let exact = scene_node_bounds(&root);
    let approx = approximate_scene_node_bounds(&root);
    assert!((exact.max_x() - 1.0).abs() < 1e-4);
    assert!((exact.max_y() - 1.0).abs() < 1e-4);
    assert!(approx.contains_rect(&exact) || approx == exact);
}

#[test]
fn realign() {
    let mut vertices = vec![point(2.0, 3.0), point(4.0, 7.0)];
    let bounds = realign_vertices_in_bounds(&mut vertices, false);
    assert_eq!(bounds, rect(2.0, 3.0, 2.0, 4.0));
    assert_eq!(vertices, vec![point(0.0, 0.0), point(2.0, 4.0)]);

    let mut vertices = vec![point(2.0, 3.0), point(4.0, 7.0)];
    realign_vertices_in_bounds(&mut vertices, true);
    assert_eq!(vertices, vec![point(0.0, 4.0), point(2.0, 0.0)]);
}
