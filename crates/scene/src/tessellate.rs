//! Turning scene hierarchies into geometry.

use crate::clip::ClipStack;
use crate::geometry::Geometry;
use crate::math::*;
use crate::nodes::{node_opacity, world_transformed_nodes};
use crate::path::BezierContour;
use crate::scene::*;
use crate::tessellation::{
    build_rounded_rectangle_contour, fill_polygons, tessellate_path, tessellate_rect,
    tessellate_rect_border, trace_shape, TessellationOptions, VertexBuffers,
};
use crate::{SceneResult, EPSILON};

use tracing::{debug_span, trace, warn};

/// Tessellates every drawable of a scene.
///
/// See [`tessellate_node_hierarchy`].
pub fn tessellate_scene(
    scene: &Scene,
    options: &TessellationOptions,
    opacities: Option<&NodeOpacities>,
) -> SceneResult<Vec<Geometry>> {
    tessellate_node_hierarchy(&scene.root, options, opacities)
}

enum Visit<'l> {
    Enter {
        node: &'l SceneNode,
        parent_transform: Transform,
        parent_opacity: f32,
    },
    PopClip,
}

/// Tessellates the drawables of a hierarchy, in pre-order.
///
/// Each geometry records the world transform of its node, and its alpha is
/// multiplied by the node's world opacity. Geometry under a node with a
/// clipper is clipped by the clipper's shapes, as well as by the clippers of
/// the ancestors.
///
/// Errors are only caused by invalid options or contours. Fill triangulation
/// failures skip the fill of the shape and are logged.
pub fn tessellate_node_hierarchy(
    root: &SceneNode,
    options: &TessellationOptions,
    opacities: Option<&NodeOpacities>,
) -> SceneResult<Vec<Geometry>> {
    let _span = debug_span!("tessellate_scene").entered();

    let mut geoms = Vec::new();
    let mut clip = ClipStack::new();
    let mut node_geoms = Vec::new();

    let mut stack = vec![Visit::Enter {
        node: root,
        parent_transform: Transform::identity(),
        parent_opacity: 1.0,
    }];

    while let Some(visit) = stack.pop() {
        let (node, parent_transform, parent_opacity) = match visit {
            Visit::Enter { node, parent_transform, parent_opacity } => (node, parent_transform, parent_opacity),
            Visit::PopClip => {
                clip.pop();
                continue;
            }
        };

        let world_transform = node.transform.then(&parent_transform);
        let world_opacity = parent_opacity * node_opacity(node, opacities);

        if let Some(clipper) = &node.clipper {
            let polygons = trace_node_hierarchy_shapes(clipper, options)?;
            clip.push(polygons, &world_transform);
            stack.push(Visit::PopClip);
        }

        for drawable in &node.drawables {
            tessellate_drawable(drawable, options, &mut node_geoms)?;
        }

        for mut geometry in node_geoms.drain(..) {
            geometry.color.a *= world_opacity;
            geometry.world_transform = world_transform;
            clip_geometry(&clip, geometry, &mut geoms);
        }

        for child in node.children.iter().rev() {
            stack.push(Visit::Enter {
                node: child,
                parent_transform: world_transform,
                parent_opacity: world_opacity,
            });
        }
    }

    trace!(geometries = geoms.len(), "scene tessellated");

    Ok(geoms)
}

fn clip_geometry(clip: &ClipStack, geometry: Geometry, output: &mut Vec<Geometry>) {
    if clip.is_empty() {
        output.push(geometry);
        return;
    }

    match clip.clip_indexed(&geometry.vertices, &geometry.indices, &geometry.world_transform) {
        Some((vertices, indices)) => {
            if indices.is_empty() {
                return;
            }

            let unclipped_bounds = geometry.unclipped_bounds;
            let template = Geometry {
                vertices: Vec::new(),
                indices: Vec::new(),
                ..geometry
            };

            let start = output.len();
            Geometry::from_buffers(&VertexBuffers { vertices, indices }, &template, output);
            for g in &mut output[start..] {
                g.unclipped_bounds = unclipped_bounds;
            }
        }
        None => {
            warn!(
                transform = ?geometry.world_transform,
                "dropping clipped geometry with a non-invertible world transform"
            );
        }
    }
}

/// Tessellates a single drawable in its local space.
pub fn tessellate_drawable(
    drawable: &Drawable,
    options: &TessellationOptions,
    output: &mut Vec<Geometry>,
) -> SceneResult<()> {
    match drawable {
        Drawable::Path(path) => tessellate_stroked_path(path, options, output),
        Drawable::Shape(shape) => tessellate_shape(shape, options, output),
        Drawable::Rectangle(rect) => tessellate_rectangle(rect, options, output),
    }
}

/// Generates the stroke of a path. Paths without a stroke produce nothing.
pub fn tessellate_stroked_path(
    path: &Path,
    options: &TessellationOptions,
    output: &mut Vec<Geometry>,
) -> SceneResult<()> {
    stroke_contours(std::slice::from_ref(&path.contour), &path.path_props, options, output)
}

fn stroke_contours(
    contours: &[BezierContour],
    props: &PathProperties,
    options: &TessellationOptions,
    output: &mut Vec<Geometry>,
) -> SceneResult<()> {
    let (stroke, stroke_options) = match (&props.stroke, props.stroke_options()) {
        (Some(stroke), Some(stroke_options)) => (stroke, stroke_options),
        _ => return Ok(()),
    };

    if stroke.half_thickness <= EPSILON {
        return Ok(());
    }

    let template = Geometry::template(stroke.color, None, Transform::identity());
    for contour in contours {
        let buffers = tessellate_path(contour, &stroke_options, options)?;
        Geometry::from_buffers(&buffers, &template, output);
    }

    Ok(())
}

/// Fills the contours of a shape with its fill's winding rule, then strokes
/// them.
///
/// Pattern fills produce no fill geometry: the pattern's own hierarchy is
/// tessellated separately.
pub fn tessellate_shape(
    shape: &Shape,
    options: &TessellationOptions,
    output: &mut Vec<Geometry>,
) -> SceneResult<()> {
    let _span = debug_span!("tessellate_shape", contours = shape.contours.len()).entered();

    let fill = shape
        .fill
        .as_ref()
        .filter(|fill| !matches!(***fill, Fill::Pattern(_)));

    if let Some(fill) = fill {
        let (pattern, pattern_offset) = shape.path_props.pattern();
        let mut polygons = Vec::with_capacity(shape.contours.len());
        for contour in &shape.contours {
            polygons.push(trace_shape(contour, pattern, pattern_offset, options)?);
        }

        match fill_polygons(&polygons, fill.mode()) {
            Ok(buffers) => {
                let template = Geometry::template(fill.vertex_color(), Some(fill.clone()), shape.fill_transform);
                Geometry::from_buffers(&buffers, &template, output);
            }
            Err(e) => {
                warn!(error = %e, "failed to fill a shape, only its stroke is kept");
            }
        }
    }

    stroke_contours(&shape.contours, &shape.path_props, options, output)
}

/// Tessellates a rectangle, directly as quads when it has square corners and
/// a plain border, otherwise through its rounded contour.
///
/// Rectangles with no width or no height produce nothing.
pub fn tessellate_rectangle(
    rect: &Rectangle,
    options: &TessellationOptions,
    output: &mut Vec<Geometry>,
) -> SceneResult<()> {
    if rect.size.width <= EPSILON || rect.size.height <= EPSILON {
        return Ok(());
    }

    if !rect.is_simple() {
        let shape = Shape {
            contours: vec![build_rounded_rectangle_contour(rect.position, rect.size, &rect.radii)],
            fill: rect.fill.clone(),
            fill_transform: rect.fill_transform,
            path_props: rect.path_props.clone(),
        };

        return tessellate_shape(&shape, options, output);
    }

    let bounds = rect.bounds();

    if let Some(fill) = &rect.fill {
        if !matches!(**fill, Fill::Pattern(_)) {
            let quad = tessellate_rect(&bounds);
            output.push(
                Geometry::new(quad.vertices, quad.indices, fill.vertex_color())
                    .with_fill(Some(fill.clone()), rect.fill_transform),
            );
        }
    }

    if let Some(stroke) = &rect.path_props.stroke {
        if stroke.half_thickness > EPSILON {
            let border = tessellate_rect_border(&bounds, stroke.half_thickness);
            output.push(Geometry::new(border.vertices, border.indices, stroke.color));
        }
    }

    Ok(())
}

/// The outline of a rectangle as a polygon, `None` if it has no area.
pub fn trace_rectangle(rect: &Rectangle, options: &TessellationOptions) -> SceneResult<Option<Vec<Point>>> {
    if rect.size.width <= EPSILON || rect.size.height <= EPSILON {
        return Ok(None);
    }

    if rect.is_simple() {
        let b = rect.bounds();
        return Ok(Some(vec![
            b.min,
            point(b.max.x, b.min.y),
            b.max,
            point(b.min.x, b.max.y),
        ]));
    }

    let contour = build_rounded_rectangle_contour(rect.position, rect.size, &rect.radii);
    let (pattern, pattern_offset) = rect.path_props.pattern();

    Ok(Some(trace_shape(&contour, pattern, pattern_offset, options)?))
}

/// The outlines of the shapes and rectangles of a hierarchy, in the space of
/// `root`'s parent. Paths have no area and are ignored.
pub fn trace_node_hierarchy_shapes(
    root: &SceneNode,
    options: &TessellationOptions,
) -> SceneResult<Vec<Vec<Point>>> {
    let mut polygons = Vec::new();

    for item in world_transformed_nodes(root, None) {
        let transform = &item.world_transform;
        for drawable in &item.node.drawables {
            match drawable {
                Drawable::Shape(shape) => {
                    let (pattern, pattern_offset) = shape.path_props.pattern();
                    for contour in &shape.contours {
                        let mut polygon = trace_shape(contour, pattern, pattern_offset, options)?;
                        transform_points(&mut polygon, transform);
                        polygons.push(polygon);
                    }
                }
                Drawable::Rectangle(rect) => {
                    if let Some(mut polygon) = trace_rectangle(rect, options)? {
                        transform_points(&mut polygon, transform);
                        polygons.push(polygon);
                    }
                }
                Drawable::Path(_) => {}
            }
        }
    }

    Ok(polygons)
}

fn transform_points(points: &mut [Point], transform: &Transform) {
    for p in points {
        *p = transform.transform_point(*p);
    }
}

#[cfg(test)]
use crate::path::{make_path_line, BezierPathSegment};
#[cfg(test)]
use crate::tessellation::{FillMode, TessellationError};
#[cfg(test)]
use crate::{color::Color, SceneError};
#[cfg(test)]
use std::sync::Arc;

#[cfg(test)]
fn polygon_contour(points: &[Point]) -> BezierContour {
    let mut segments = Vec::new();
    for i in 0..points.len() - 1 {
        segments.push(make_path_line(points[i], points[i + 1])[0]);
    }
    segments.push(BezierPathSegment::end(points[points.len() - 1]));

    BezierContour::new(segments, true)
}

#[cfg(test)]
fn solid(color: Color) -> Option<Arc<Fill>> {
    Some(Arc::new(SolidFill::new(color).into()))
}

#[cfg(test)]
fn world_area(geoms: &[Geometry]) -> f32 {
    let mut area = 0.0;
    for g in geoms {
        for tri in g.indices.chunks(3) {
            let a = g.world_transform.transform_point(g.vertices[tri[0] as usize]);
            let b = g.world_transform.transform_point(g.vertices[tri[1] as usize]);
            let c = g.world_transform.transform_point(g.vertices[tri[2] as usize]);
            area += (b - a).cross(c - a).abs() * 0.5;
        }
    }
    area
}

#[test]
fn filled_square_takes_the_fast_path() {
    let square = Rectangle::new(point(0.0, 0.0), size(10.0, 10.0), solid(Color::WHITE));
    let scene = Scene::new(SceneNode::with_drawables(vec![square.into()]));

    let geoms = tessellate_scene(&scene, &TessellationOptions::DEFAULT, None).unwrap();
    assert_eq!(geoms.len(), 1);
    assert_eq!(geoms[0].vertices.len(), 4);
    assert_eq!(geoms[0].indices.len(), 6);
    for corner in &[point(0.0, 0.0), point(10.0, 0.0), point(10.0, 10.0), point(0.0, 10.0)] {
        assert!(geoms[0].vertices.contains(corner));
    }
    assert_eq!(geoms[0].color, Color::WHITE);
    assert_eq!(geoms[0].unclipped_bounds, rect(0.0, 0.0, 10.0, 10.0));
    assert!(geoms[0].fill.is_some());
}

#[test]
fn stroked_line() {
    let path = Path {
        contour: BezierContour::new(make_path_line(point(0.0, 0.0), point(100.0, 0.0)).to_vec(), false),
        path_props: PathProperties::stroked(Stroke::new(Color::BLACK, 5.0)),
    };
    let scene = Scene::new(SceneNode::with_drawables(vec![path.into()]));

    let geoms = tessellate_scene(&scene, &TessellationOptions::DEFAULT, None).unwrap();
    assert_eq!(geoms.len(), 1);
    assert_eq!(geoms[0].indices.len(), 6);
    assert_eq!(geoms[0].vertices.len(), 4);
    for expected in &[point(0.0, 5.0), point(0.0, -5.0), point(100.0, 5.0), point(100.0, -5.0)] {
        assert!(geoms[0].vertices.iter().any(|v| (*v - *expected).length() < 1e-4));
    }
    assert_eq!(geoms[0].color, Color::BLACK);
    assert!(geoms[0].fill.is_none());
}

#[test]
fn transforms_and_opacities_accumulate() {
    let square = Rectangle::new(point(0.0, 0.0), size(1.0, 1.0), solid(Color::WHITE));

    let mut child = SceneNode::with_drawables(vec![square.into()]);
    child.id = Some(NodeId(2));
    child.transform = Transform::scale(2.0, 2.0);

    let mut parent = SceneNode::with_children(vec![child]);
    parent.id = Some(NodeId(1));
    parent.transform = Transform::translation(5.0, 0.0);

    let mut opacities = NodeOpacities::new();
    opacities.insert(NodeId(1), 0.5);
    opacities.insert(NodeId(2), 0.5);

    let geoms = tessellate_node_hierarchy(&parent, &TessellationOptions::DEFAULT, Some(&opacities)).unwrap();
    assert_eq!(geoms.len(), 1);
    assert_eq!(geoms[0].color.a, 0.25);
    // Vertices stay local.
    assert_eq!(geoms[0].unclipped_bounds, rect(0.0, 0.0, 1.0, 1.0));
    assert_eq!(geoms[0].world_transform.transform_point(point(1.0, 1.0)), point(7.0, 2.0));
}

#[test]
fn clipper_applies_to_the_subtree_only() {
    let big = || Rectangle::new(point(0.0, 0.0), size(10.0, 10.0), solid(Color::WHITE)).into();

    let clipper = SceneNode::with_drawables(vec![Rectangle::new(point(0.0, 0.0), size(5.0, 5.0), None).into()]);
    let mut clipped = SceneNode::with_drawables(vec![big()]);
    clipped.clipper = Some(Arc::new(clipper));
    clipped.children.push(SceneNode::with_drawables(vec![big()]));

    let sibling = SceneNode::with_drawables(vec![big()]);
    let root = SceneNode::with_children(vec![clipped, sibling]);

    let geoms = tessellate_node_hierarchy(&root, &TessellationOptions::DEFAULT, None).unwrap();
    assert_eq!(geoms.len(), 3);

    for g in &geoms[..2] {
        assert!((world_area(std::slice::from_ref(g)) - 25.0).abs() < 1e-2);
        for v in &g.vertices {
            assert!(v.x <= 5.0 + 1e-3 && v.y <= 5.0 + 1e-3);
        }
        // The fill keeps mapping the whole rectangle.
        assert_eq!(g.unclipped_bounds, rect(0.0, 0.0, 10.0, 10.0));
    }

    assert_eq!(geoms[2].vertices.len(), 4);
    assert!((world_area(&geoms[2..]) - 100.0).abs() < 1e-3);
}

#[test]
fn clipper_follows_the_node_transform() {
    let clipper = SceneNode::with_drawables(vec![Rectangle::new(point(0.0, 0.0), size(5.0, 10.0), None).into()]);

    let mut node = SceneNode::with_drawables(vec![
        Rectangle::new(point(0.0, 0.0), size(10.0, 10.0), solid(Color::WHITE)).into(),
    ]);
    node.transform = Transform::translation(100.0, 0.0);
    node.clipper = Some(Arc::new(clipper));

    let geoms = tessellate_node_hierarchy(&node, &TessellationOptions::DEFAULT, None).unwrap();
    assert!((world_area(&geoms) - 50.0).abs() < 1e-2);
    for g in &geoms {
        for v in &g.vertices {
            assert!(v.x <= 5.0 + 1e-3);
        }
    }
}

#[test]
fn non_invertible_clipped_geometry_is_dropped() {
    let clipper = SceneNode::with_drawables(vec![Rectangle::new(point(0.0, 0.0), size(5.0, 5.0), None).into()]);
    let mut node = SceneNode::with_drawables(vec![
        Rectangle::new(point(0.0, 0.0), size(10.0, 10.0), solid(Color::WHITE)).into(),
    ]);
    node.transform = Transform::scale(0.0, 1.0);
    node.clipper = Some(Arc::new(clipper));

    let geoms = tessellate_node_hierarchy(&node, &TessellationOptions::DEFAULT, None).unwrap();
    assert!(geoms.is_empty());
}

#[test]
fn shape_with_a_hole() {
    let outer = polygon_contour(&[point(0.0, 0.0), point(10.0, 0.0), point(10.0, 10.0), point(0.0, 10.0)]);
    let inner = polygon_contour(&[point(2.0, 2.0), point(2.0, 8.0), point(8.0, 8.0), point(8.0, 2.0)]);

    let shape = Shape::new(vec![outer.clone(), inner.clone()], solid(Color::WHITE));
    let mut geoms = Vec::new();
    tessellate_shape(&shape, &TessellationOptions::DEFAULT, &mut geoms).unwrap();
    assert_eq!(geoms.len(), 1);
    assert!((world_area(&geoms) - 64.0).abs() < 1e-2);

    // Same orientation: the inner contour only cuts a hole with the odd-even rule.
    let same_way = polygon_contour(&[point(2.0, 2.0), point(8.0, 2.0), point(8.0, 8.0), point(2.0, 8.0)]);
    let fill = SolidFill { mode: FillMode::OddEven, ..SolidFill::new(Color::WHITE) };
    let shape = Shape::new(vec![outer, same_way], Some(Arc::new(fill.into())));
    let mut geoms = Vec::new();
    tessellate_shape(&shape, &TessellationOptions::DEFAULT, &mut geoms).unwrap();
    assert!((world_area(&geoms) - 64.0).abs() < 1e-2);
}

#[test]
fn filled_and_stroked_shape() {
    let contour = polygon_contour(&[point(0.0, 0.0), point(10.0, 0.0), point(10.0, 10.0), point(0.0, 10.0)]);
    let mut shape = Shape::new(vec![contour], solid(Color::WHITE));
    shape.path_props = PathProperties::stroked(Stroke::new(Color::BLACK, 1.0));

    let mut geoms = Vec::new();
    tessellate_shape(&shape, &TessellationOptions::DEFAULT, &mut geoms).unwrap();
    assert_eq!(geoms.len(), 2);
    assert_eq!(geoms[0].color, Color::WHITE);
    assert_eq!(geoms[1].color, Color::BLACK);
    assert!(geoms[1].fill.is_none());
}

#[test]
fn rounded_rectangle_goes_through_the_contour() {
    let mut rect = Rectangle::new(point(0.0, 0.0), size(20.0, 10.0), solid(Color::WHITE));
    rect.radii = crate::tessellation::CornerRadii::new(3.0);

    let mut geoms = Vec::new();
    tessellate_rectangle(&rect, &TessellationOptions::DEFAULT, &mut geoms).unwrap();
    assert_eq!(geoms.len(), 1);
    assert!(geoms[0].vertices.len() > 4);
    for v in &geoms[0].vertices {
        assert!(v.x >= -1e-3 && v.x <= 20.0 + 1e-3);
        assert!(v.y >= -1e-3 && v.y <= 10.0 + 1e-3);
    }
    // Slightly less than the full rectangle, the corners being cut.
    let area = world_area(&geoms);
    assert!(area < 200.0 && area > 190.0);
}

#[test]
fn nothing_to_draw() {
    let mut geoms = Vec::new();
    let options = TessellationOptions::DEFAULT;

    let flat = Rectangle::new(point(0.0, 0.0), size(10.0, 0.0), solid(Color::WHITE));
    tessellate_rectangle(&flat, &options, &mut geoms).unwrap();
    assert!(trace_rectangle(&flat, &options).unwrap().is_none());

    let pattern = PatternFill {
        mode: FillMode::NonZero,
        opacity: 1.0,
        pattern: Arc::new(SceneNode::new()),
        rect: rect(0.0, 0.0, 1.0, 1.0),
    };
    let patterned = Rectangle::new(point(0.0, 0.0), size(10.0, 10.0), Some(Arc::new(pattern.into())));
    tessellate_rectangle(&patterned, &options, &mut geoms).unwrap();

    let unstroked = Path {
        contour: BezierContour::new(make_path_line(point(0.0, 0.0), point(1.0, 0.0)).to_vec(), false),
        path_props: PathProperties::default(),
    };
    tessellate_stroked_path(&unstroked, &options, &mut geoms).unwrap();

    assert!(geoms.is_empty());
}

#[test]
fn invalid_contours_are_errors() {
    let path = Path {
        contour: BezierContour::new(vec![BezierPathSegment::end(point(0.0, 0.0))], false),
        path_props: PathProperties::stroked(Stroke::new(Color::BLACK, 1.0)),
    };
    let scene = Scene::new(SceneNode::with_drawables(vec![path.into()]));

    let result = tessellate_scene(&scene, &TessellationOptions::DEFAULT, None);
    assert_eq!(
        result,
        Err(SceneError::Tessellation(TessellationError::Path(
            crate::path::PathError::NotEnoughSegments
        )))
    );
}

#[test]
fn traced_clipper_shapes() {
    let mut clipper = SceneNode::with_drawables(vec![
        Rectangle::new(point(0.0, 0.0), size(2.0, 2.0), None).into(),
        Rectangle::circle(point(0.0, 0.0), 1.0, None).into(),
    ]);
    clipper.transform = Transform::translation(10.0, 0.0);

    let polygons = trace_node_hierarchy_shapes(&clipper, &TessellationOptions::DEFAULT).unwrap();
    assert_eq!(polygons.len(), 2);
    assert_eq!(polygons[0], vec![point(10.0, 0.0), point(12.0, 0.0), point(12.0, 2.0), point(10.0, 2.0)]);
    for p in &polygons[1] {
        assert!(((*p - point(10.0, 0.0)).length() - 1.0).abs() < 0.01);
    }
}
