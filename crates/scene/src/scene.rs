//! The scene description consumed by the tessellator.
//!
//! A [`Scene`] is a tree of [`SceneNode`]s. Each node owns its children and a
//! list of [`Drawable`]s expressed in the node's local space, and places them
//! in its parent's space with an affine transform. A node can also reference
//! a separate hierarchy, its clipper, whose shapes restrict where the node's
//! subtree is visible.

use crate::color::{Color, Rgba8};
use crate::math::*;
use crate::path::BezierContour;
use crate::tessellation::{CornerRadii, FillMode, PathCorner, PathEnding, StrokeOptions};

use std::collections::HashMap;
use std::sync::Arc;

/// Identifies a node in a [`NodeOpacities`] map.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct NodeId(pub u32);

/// Per-node opacities. Nodes that are not in the map are fully opaque.
pub type NodeOpacities = HashMap<NodeId, f32>;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum GradientType {
    Linear,
    Radial,
}

/// How texture and gradient coordinates outside of `[0, 1]` are mapped back.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum AddressMode {
    /// Repeat.
    Wrap,
    /// Stretch the edges.
    Clamp,
    /// Repeat, every other repetition being mirrored.
    Mirror,
}

/// A color at a given position along a gradient, `offset` being in `[0, 1]`.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct GradientStop {
    pub color: Color,
    pub offset: f32,
}

impl GradientStop {
    pub fn new(offset: f32, color: Color) -> Self {
        GradientStop { color, offset }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct SolidFill {
    pub color: Color,
    pub mode: FillMode,
    pub opacity: f32,
}

impl SolidFill {
    pub fn new(color: Color) -> Self {
        SolidFill {
            color,
            mode: FillMode::NonZero,
            opacity: 1.0,
        }
    }
}

/// A gradient covering the bounding box of the filled element.
///
/// Linear gradients go from the left edge to the right edge. Radial gradients
/// are centered in the box with radii of half its size, and `radial_focus` is
/// a position in the unit circle where the gradient starts.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct GradientFill {
    pub gradient_type: GradientType,
    pub stops: Vec<GradientStop>,
    pub mode: FillMode,
    pub opacity: f32,
    pub tint: Color,
    pub addressing: AddressMode,
    pub radial_focus: Point,
}

impl GradientFill {
    pub fn linear(stops: Vec<GradientStop>) -> Self {
        GradientFill {
            gradient_type: GradientType::Linear,
            stops,
            mode: FillMode::NonZero,
            opacity: 1.0,
            tint: Color::WHITE,
            addressing: AddressMode::Clamp,
            radial_focus: Point::origin(),
        }
    }

    pub fn radial(stops: Vec<GradientStop>, focus: Point) -> Self {
        GradientFill {
            gradient_type: GradientType::Radial,
            radial_focus: focus,
            ..GradientFill::linear(stops)
        }
    }
}

/// A row-major RGBA8 image, the first row being the top one.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct Texture {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Rgba8>,
}

impl Texture {
    pub fn new(width: u32, height: u32, pixels: Vec<Rgba8>) -> Self {
        Texture { width, height, pixels }
    }

    /// A texture filled with a single color.
    pub fn filled(width: u32, height: u32, color: Rgba8) -> Self {
        Texture {
            width,
            height,
            pixels: vec![color; (width * height) as usize],
        }
    }

    /// The pixel at `(x, y)`, `None` outside of the texture.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba8> {
        if x >= self.width {
            return None;
        }

        self.pixels.get(y as usize * self.width as usize + x as usize).cloned()
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct TextureFill {
    pub texture: Texture,
    pub mode: FillMode,
    pub opacity: f32,
    pub tint: Color,
    pub addressing: AddressMode,
}

impl TextureFill {
    pub fn new(texture: Texture) -> Self {
        TextureFill {
            texture,
            mode: FillMode::NonZero,
            opacity: 1.0,
            tint: Color::WHITE,
            addressing: AddressMode::Wrap,
        }
    }
}

/// A fill repeating the content of another hierarchy.
///
/// Patterns are expanded into regular nodes before tessellation, elements
/// filled with a pattern produce no fill geometry of their own.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct PatternFill {
    pub mode: FillMode,
    pub opacity: f32,
    pub pattern: Arc<SceneNode>,
    pub rect: Rect,
}

/// How the inside of a shape is colored.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum Fill {
    Solid(SolidFill),
    Gradient(GradientFill),
    Texture(TextureFill),
    Pattern(PatternFill),
}

impl Fill {
    pub fn mode(&self) -> FillMode {
        match self {
            Fill::Solid(fill) => fill.mode,
            Fill::Gradient(fill) => fill.mode,
            Fill::Texture(fill) => fill.mode,
            Fill::Pattern(fill) => fill.mode,
        }
    }

    pub fn opacity(&self) -> f32 {
        match self {
            Fill::Solid(fill) => fill.opacity,
            Fill::Gradient(fill) => fill.opacity,
            Fill::Texture(fill) => fill.opacity,
            Fill::Pattern(fill) => fill.opacity,
        }
    }

    /// The vertex color of the fill geometry.
    ///
    /// Gradients and textures are white modulated by their tint, their texels
    /// come from the atlas.
    pub fn vertex_color(&self) -> Color {
        let color = match self {
            Fill::Solid(fill) => fill.color,
            Fill::Gradient(fill) => fill.tint,
            Fill::Texture(fill) => fill.tint,
            Fill::Pattern(_) => Color::WHITE,
        };

        color.with_alpha(color.a * self.opacity())
    }

    /// Whether the fill needs texels in the atlas.
    pub fn is_textured(&self) -> bool {
        matches!(self, Fill::Gradient(_) | Fill::Texture(_))
    }
}

impl From<SolidFill> for Fill {
    fn from(fill: SolidFill) -> Self {
        Fill::Solid(fill)
    }
}

impl From<GradientFill> for Fill {
    fn from(fill: GradientFill) -> Self {
        Fill::Gradient(fill)
    }
}

impl From<TextureFill> for Fill {
    fn from(fill: TextureFill) -> Self {
        Fill::Texture(fill)
    }
}

impl From<PatternFill> for Fill {
    fn from(fill: PatternFill) -> Self {
        Fill::Pattern(fill)
    }
}

/// Outline of a path or shape.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct Stroke {
    pub color: Color,
    pub half_thickness: f32,
    /// Alternating dash and gap lengths, empty for a solid stroke.
    pub pattern: Vec<f32>,
    pub pattern_offset: f32,
    pub tipped_corner_limit: f32,
}

impl Stroke {
    pub fn new(color: Color, half_thickness: f32) -> Self {
        Stroke {
            color,
            half_thickness,
            pattern: Vec::new(),
            pattern_offset: 0.0,
            tipped_corner_limit: StrokeOptions::DEFAULT_TIPPED_CORNER_LIMIT,
        }
    }

    pub fn with_pattern(mut self, pattern: Vec<f32>, offset: f32) -> Self {
        self.pattern = pattern;
        self.pattern_offset = offset;
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct PathProperties {
    pub stroke: Option<Stroke>,
    pub head: PathEnding,
    pub tail: PathEnding,
    pub corners: PathCorner,
}

impl PathProperties {
    pub fn stroked(stroke: Stroke) -> Self {
        PathProperties {
            stroke: Some(stroke),
            ..PathProperties::default()
        }
    }

    /// The stroke tessellator parameters, if there is a stroke.
    pub fn stroke_options(&self) -> Option<StrokeOptions<'_>> {
        self.stroke.as_ref().map(|stroke| {
            StrokeOptions::half_thickness(stroke.half_thickness)
                .with_pattern(&stroke.pattern, stroke.pattern_offset)
                .with_tipped_corner_limit(stroke.tipped_corner_limit)
                .with_head(self.head)
                .with_tail(self.tail)
                .with_corners(self.corners)
        })
    }

    /// The dash pattern and its offset, empty without a stroke.
    pub(crate) fn pattern(&self) -> (&[f32], f32) {
        match &self.stroke {
            Some(stroke) => (&stroke.pattern, stroke.pattern_offset),
            None => (&[], 0.0),
        }
    }
}

impl Default for PathProperties {
    fn default() -> Self {
        PathProperties {
            stroke: None,
            head: PathEnding::Chop,
            tail: PathEnding::Chop,
            corners: PathCorner::Tipped,
        }
    }
}

/// A stroked contour, with no fill.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct Path {
    pub contour: BezierContour,
    pub path_props: PathProperties,
}

/// A region made of one or several contours, filled and optionally stroked.
///
/// Holes are contours winding the other way (or any nested contour in
/// [`FillMode::OddEven`]).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct Shape {
    pub contours: Vec<BezierContour>,
    pub fill: Option<Arc<Fill>>,
    /// Maps the unit square of the shape's bounds to the fill's space.
    pub fill_transform: Transform,
    pub path_props: PathProperties,
}

impl Shape {
    pub fn new(contours: Vec<BezierContour>, fill: Option<Arc<Fill>>) -> Self {
        Shape {
            contours,
            fill,
            fill_transform: Transform::identity(),
            path_props: PathProperties::default(),
        }
    }
}

/// An axis-aligned rectangle with optional elliptical corners.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct Rectangle {
    pub position: Point,
    pub size: Size,
    pub radii: CornerRadii,
    pub fill: Option<Arc<Fill>>,
    pub fill_transform: Transform,
    pub path_props: PathProperties,
}

impl Rectangle {
    pub fn new(position: Point, size: Size, fill: Option<Arc<Fill>>) -> Self {
        Rectangle {
            position,
            size,
            radii: CornerRadii::ZERO,
            fill,
            fill_transform: Transform::identity(),
            path_props: PathProperties::default(),
        }
    }

    /// A rectangle rounded into the ellipse of radii `rx`, `ry` around `center`.
    pub fn ellipse(center: Point, rx: f32, ry: f32, fill: Option<Arc<Fill>>) -> Self {
        Rectangle {
            radii: CornerRadii {
                top_left: vector(rx, ry),
                top_right: vector(rx, ry),
                bottom_left: vector(rx, ry),
                bottom_right: vector(rx, ry),
            },
            ..Rectangle::new(center - vector(rx, ry), size(rx + rx, ry + ry), fill)
        }
    }

    pub fn circle(center: Point, radius: f32, fill: Option<Arc<Fill>>) -> Self {
        Rectangle::ellipse(center, radius, radius, fill)
    }

    pub fn bounds(&self) -> Box2D {
        Box2D::new(self.position, self.position + self.size.to_vector())
    }

    /// Rectangles with square corners and plain tipped borders are emitted as
    /// quads, without going through the curve machinery.
    pub fn is_simple(&self) -> bool {
        let dashed = self
            .path_props
            .stroke
            .as_ref()
            .map_or(false, |stroke| !stroke.pattern.is_empty());

        !self.radii.is_rounded() && !dashed && self.path_props.corners == PathCorner::Tipped
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum Drawable {
    Path(Path),
    Shape(Shape),
    Rectangle(Rectangle),
}

impl From<Path> for Drawable {
    fn from(path: Path) -> Self {
        Drawable::Path(path)
    }
}

impl From<Shape> for Drawable {
    fn from(shape: Shape) -> Self {
        Drawable::Shape(shape)
    }
}

impl From<Rectangle> for Drawable {
    fn from(rect: Rectangle) -> Self {
        Drawable::Rectangle(rect)
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct SceneNode {
    /// Key of the node in a [`NodeOpacities`] map.
    pub id: Option<NodeId>,
    pub children: Vec<SceneNode>,
    pub drawables: Vec<Drawable>,
    /// Maps the node's space into its parent's space.
    pub transform: Transform,
    /// A hierarchy whose shapes clip this node and its descendants. It is
    /// positioned in this node's space and may be shared by several nodes.
    pub clipper: Option<Arc<SceneNode>>,
}

impl SceneNode {
    pub fn new() -> Self {
        SceneNode {
            id: None,
            children: Vec::new(),
            drawables: Vec::new(),
            transform: Transform::identity(),
            clipper: None,
        }
    }

    pub fn with_drawables(drawables: Vec<Drawable>) -> Self {
        SceneNode {
            drawables,
            ..SceneNode::new()
        }
    }

    pub fn with_children(children: Vec<SceneNode>) -> Self {
        SceneNode {
            children,
            ..SceneNode::new()
        }
    }
}

impl Default for SceneNode {
    fn default() -> Self {
        SceneNode::new()
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct Scene {
    pub root: SceneNode,
}

impl Scene {
    pub fn new(root: SceneNode) -> Self {
        Scene { root }
    }
}

#[test]
fn fill_vertex_colors() {
    let solid = Fill::Solid(SolidFill {
        opacity: 0.5,
        ..SolidFill::new(Color::new(1.0, 0.0, 0.0, 0.8))
    });
    assert_eq!(solid.vertex_color(), Color::new(1.0, 0.0, 0.0, 0.4));
    assert!(!solid.is_textured());

    let mut gradient = GradientFill::linear(vec![]);
    gradient.tint = Color::new(0.5, 0.5, 0.5, 1.0);
    let gradient = Fill::from(gradient);
    assert_eq!(gradient.vertex_color(), Color::new(0.5, 0.5, 0.5, 1.0));
    assert!(gradient.is_textured());
}

#[test]
fn ellipse_rectangle() {
    let ellipse = Rectangle::ellipse(point(10.0, 10.0), 4.0, 2.0, None);
    assert_eq!(ellipse.position, point(6.0, 8.0));
    assert_eq!(ellipse.size, size(8.0, 4.0));
    assert_eq!(ellipse.radii.bottom_right, vector(4.0, 2.0));
    assert!(!ellipse.is_simple());

    let square = Rectangle::new(point(0.0, 0.0), size(1.0, 1.0), None);
    assert!(square.is_simple());
    assert_eq!(square.bounds(), Box2D::new(point(0.0, 0.0), point(1.0, 1.0)));
}

#[test]
fn stroke_options_follow_path_properties() {
    let mut props = PathProperties::stroked(Stroke::new(Color::BLACK, 2.0).with_pattern(vec![1.0, 2.0], 0.5));
    props.head = PathEnding::Round;
    props.corners = PathCorner::Beveled;

    let options = props.stroke_options().unwrap();
    assert_eq!(options.half_thickness, 2.0);
    assert_eq!(options.pattern, &[1.0, 2.0]);
    assert_eq!(options.pattern_offset, 0.5);
    assert_eq!(options.head, PathEnding::Round);
    assert_eq!(options.tail, PathEnding::Chop);
    assert_eq!(options.corners, PathCorner::Beveled);

    assert!(PathProperties::default().stroke_options().is_none());
}

#[test]
fn texture_pixels() {
    let mut texture = Texture::filled(3, 2, [1, 2, 3, 4]);
    texture.pixels[5] = [9, 9, 9, 9];
    assert_eq!(texture.pixel(0, 0), Some([1, 2, 3, 4]));
    assert_eq!(texture.pixel(2, 1), Some([9, 9, 9, 9]));
    // Past the end of a row, not wrapping to the next one.
    assert_eq!(texture.pixel(3, 0), None);
    assert_eq!(texture.pixel(0, 2), None);
    assert_eq!(texture.pixel(u32::MAX, u32::MAX), None);
}
