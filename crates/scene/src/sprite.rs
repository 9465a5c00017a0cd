//! Assembling geometry into a single mesh.

use crate::atlas::{generate_atlas_and_fill_uvs, AtlasOptions, TextureAtlas};
use crate::color::Color;
use crate::geometry::Geometry;
use crate::math::*;
use crate::nodes::realign_vertices_in_bounds;
use crate::tessellation::MAX_BATCH_VERTICES;
use crate::{SceneError, SceneResult, EPSILON};

use std::ops::Range;

/// The vertex channels of a list of geometries, concatenated.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<Point>,
    pub indices: Vec<u16>,
    pub colors: Vec<Color>,
    /// Present when the geometries have texture coordinates.
    pub uvs: Option<Vec<Point>>,
    /// The atlas setting of each vertex, present along with `uvs`.
    pub setting_indices: Option<Vec<u16>>,
}

impl MeshData {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Concatenates the geometries' channels, without fixing the winding order.
///
/// Returns the index range of each geometry along with the mesh.
fn collect_vertex_channels(
    geoms: &[Geometry],
    pixels_per_unit: f32,
    has_uvs: bool,
) -> SceneResult<(MeshData, Vec<Range<usize>>)> {
    let geoms: Vec<&Geometry> = geoms.iter().filter(|g| !g.is_empty()).collect();

    let vertex_count: usize = geoms.iter().map(|g| g.vertices.len()).sum();
    let index_count: usize = geoms.iter().map(|g| g.indices.len()).sum();
    if vertex_count > MAX_BATCH_VERTICES {
        return Err(SceneError::TooManyVertices { count: vertex_count });
    }

    let scale = if pixels_per_unit.abs() > EPSILON { 1.0 / pixels_per_unit } else { 1.0 };

    let mut mesh = MeshData {
        vertices: Vec::with_capacity(vertex_count),
        indices: Vec::with_capacity(index_count),
        colors: Vec::with_capacity(vertex_count),
        uvs: if has_uvs { Some(Vec::with_capacity(vertex_count)) } else { None },
        setting_indices: if has_uvs { Some(Vec::with_capacity(vertex_count)) } else { None },
    };
    let mut ranges = Vec::with_capacity(geoms.len());

    for g in geoms {
        let n = g.vertices.len();
        let base = mesh.vertices.len() as u16;
        let start = mesh.indices.len();

        mesh.indices.extend(g.indices.iter().map(|idx| idx + base));
        mesh.vertices.extend(
            g.vertices
                .iter()
                .map(|v| (g.world_transform.transform_point(*v).to_vector() * scale).to_point()),
        );
        mesh.colors.extend(std::iter::repeat(g.color).take(n));

        if let Some(uvs) = &mut mesh.uvs {
            let geom_uvs = g.uvs.iter().flatten().cloned();
            uvs.extend(geom_uvs.chain(std::iter::repeat(Point::origin())).take(n));
        }
        if let Some(settings) = &mut mesh.setting_indices {
            settings.extend(std::iter::repeat(g.setting_index).take(n));
        }

        ranges.push(start..mesh.indices.len());
    }

    Ok((mesh, ranges))
}

fn fix_winding(mesh: &mut MeshData, ranges: &[Range<usize>]) {
    for range in ranges {
        flip_shape_if_necessary(&mesh.vertices, &mut mesh.indices[range.clone()]);
    }
}

/// Reverses the triangles of a shape if they turn counter-clockwise in a y-up
/// space.
///
/// Contours may have been traced in either direction, so the orientation is
/// taken from the first triangle that isn't degenerate and applied to the
/// whole shape.
pub fn flip_shape_if_necessary(vertices: &[Point], indices: &mut [u16]) {
    let area = indices
        .chunks_exact(3)
        .map(|tri| {
            let v0 = vertices[tri[0] as usize];
            let v1 = vertices[tri[1] as usize];
            let v2 = vertices[tri[2] as usize];
            (v1 - v0).cross(v2 - v0) * 0.5
        })
        .find(|area| area.abs() > EPSILON);

    if let Some(area) = area {
        if area > 0.0 {
            for tri in indices.chunks_exact_mut(3) {
                tri.swap(1, 2);
            }
        }
    }
}

/// Concatenates the geometries into a single mesh, placing the vertices in
/// world space divided by `pixels_per_unit`.
///
/// Empty geometries are skipped. Texture coordinates and setting indices are
/// emitted when `has_uvs` is true. The triangles of each geometry are made
/// clockwise.
pub fn fill_vertex_channels(geoms: &[Geometry], pixels_per_unit: f32, has_uvs: bool) -> SceneResult<MeshData> {
    let (mut mesh, ranges) = collect_vertex_channels(geoms, pixels_per_unit, has_uvs)?;
    fix_winding(&mut mesh, &ranges);

    Ok(mesh)
}

/// Like [`fill_vertex_channels`], with texture coordinates if any geometry
/// has them, and the y axis optionally pointing down.
pub fn fill_mesh(geoms: &[Geometry], pixels_per_unit: f32, flip_y: bool) -> SceneResult<MeshData> {
    let has_uvs = geoms.iter().any(|g| g.uvs.is_some());
    let (mut mesh, ranges) = collect_vertex_channels(geoms, pixels_per_unit, has_uvs)?;

    if flip_y {
        for v in &mut mesh.vertices {
            v.y = -v.y;
        }
    }
    fix_winding(&mut mesh, &ranges);

    Ok(mesh)
}

/// Where the origin of a sprite is, relative to its bounds.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum Alignment {
    Center,
    TopLeft,
    TopCenter,
    TopRight,
    LeftCenter,
    RightCenter,
    BottomLeft,
    BottomCenter,
    BottomRight,
    /// The origin of the scene.
    SvgOrigin,
    /// The pivot given by the options.
    Custom,
}

impl Alignment {
    /// The pivot in the unit square of `bounds`, y going up.
    pub fn pivot(self, custom_pivot: Vector, bounds: &Rect) -> Vector {
        match self {
            Alignment::Center => vector(0.5, 0.5),
            Alignment::TopLeft => vector(0.0, 1.0),
            Alignment::TopCenter => vector(0.5, 1.0),
            Alignment::TopRight => vector(1.0, 1.0),
            Alignment::LeftCenter => vector(0.0, 0.5),
            Alignment::RightCenter => vector(1.0, 0.5),
            Alignment::BottomLeft => vector(0.0, 0.0),
            Alignment::BottomCenter => vector(0.5, 0.0),
            Alignment::BottomRight => vector(1.0, 0.0),
            Alignment::SvgOrigin => {
                let ratio = |pos: f32, size: f32| if size > EPSILON { -pos / size } else { 0.0 };
                vector(
                    ratio(bounds.origin.x, bounds.size.width),
                    ratio(bounds.origin.y, bounds.size.height),
                )
            }
            Alignment::Custom => custom_pivot,
        }
    }
}

impl Default for Alignment {
    fn default() -> Self {
        Alignment::Center
    }
}

/// Parameters of [`build_sprite`].
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct SpriteOptions {
    /// How many scene units map to one sprite unit.
    pub pixels_per_unit: f32,
    pub alignment: Alignment,
    /// Used with [`Alignment::Custom`].
    pub custom_pivot: Vector,
    /// Whether the y axis points down.
    pub flip_y: bool,
    /// See [`AtlasOptions::raster_size`].
    pub raster_size: u32,
}

impl SpriteOptions {
    pub const DEFAULT: Self = SpriteOptions {
        pixels_per_unit: 100.0,
        alignment: Alignment::Center,
        custom_pivot: Vector::new(0.0, 0.0),
        flip_y: false,
        raster_size: AtlasOptions::DEFAULT_RASTER_SIZE,
    };

    pub const fn with_pixels_per_unit(mut self, pixels_per_unit: f32) -> Self {
        self.pixels_per_unit = pixels_per_unit;
        self
    }

    pub const fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn with_custom_pivot(mut self, pivot: Vector) -> Self {
        self.alignment = Alignment::Custom;
        self.custom_pivot = pivot;
        self
    }

    pub const fn with_flip_y(mut self, flip_y: bool) -> Self {
        self.flip_y = flip_y;
        self
    }

    pub const fn with_raster_size(mut self, raster_size: u32) -> Self {
        self.raster_size = raster_size;
        self
    }
}

impl Default for SpriteOptions {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Creates the sprite objects of the host from assembled meshes.
pub trait SpriteFactory {
    type Sprite;

    /// `rect` is the size of the sprite with its origin at zero, and `pivot`
    /// is relative to it.
    fn create_sprite(
        &mut self,
        rect: Rect,
        pivot: Vector,
        pixels_per_unit: f32,
        texture: Option<TextureAtlas>,
        mesh: MeshData,
    ) -> Self::Sprite;
}

/// A plain sprite value.
#[derive(Clone, Debug, PartialEq)]
pub struct Sprite {
    pub rect: Rect,
    pub pivot: Vector,
    pub pixels_per_unit: f32,
    pub texture: Option<TextureAtlas>,
    pub mesh: MeshData,
}

/// Produces [`Sprite`] values.
#[derive(Copy, Clone, Debug, Default)]
pub struct DefaultSpriteFactory;

impl SpriteFactory for DefaultSpriteFactory {
    type Sprite = Sprite;

    fn create_sprite(
        &mut self,
        rect: Rect,
        pivot: Vector,
        pixels_per_unit: f32,
        texture: Option<TextureAtlas>,
        mesh: MeshData,
    ) -> Sprite {
        Sprite {
            rect,
            pivot,
            pixels_per_unit,
            texture,
            mesh,
        }
    }
}

/// Builds a sprite out of tessellated geometry.
///
/// Generates the atlas of the geometries' fills, which sets their texture
/// coordinates, then assembles a mesh whose vertices start at the origin.
pub fn build_sprite<F: SpriteFactory>(
    geoms: &mut [Geometry],
    options: &SpriteOptions,
    factory: &mut F,
) -> SceneResult<F::Sprite> {
    let atlas = generate_atlas_and_fill_uvs(geoms, &AtlasOptions::raster_size(options.raster_size));

    let (mut mesh, ranges) = collect_vertex_channels(geoms, 1.0, atlas.is_some())?;
    let bounds = realign_vertices_in_bounds(&mut mesh.vertices, options.flip_y);
    fix_winding(&mut mesh, &ranges);

    let rect = Rect::new(Point::origin(), bounds.size);
    let pivot = options.alignment.pivot(options.custom_pivot, &bounds);

    Ok(factory.create_sprite(rect, pivot, options.pixels_per_unit, atlas, mesh))
}

#[cfg(test)]
use crate::scene::{Fill, GradientFill, GradientStop, Rectangle, Scene, SceneNode, SolidFill};
#[cfg(test)]
use crate::tessellate::tessellate_scene;
#[cfg(test)]
use crate::tessellation::TessellationOptions;
#[cfg(test)]
use std::sync::Arc;

#[cfg(test)]
fn triangle(a: Point, b: Point, c: Point, color: Color) -> Geometry {
    Geometry::new(vec![a, b, c], vec![0, 1, 2], color)
}

#[cfg(test)]
fn signed_areas(mesh: &MeshData) -> Vec<f32> {
    mesh.indices
        .chunks(3)
        .map(|tri| {
            let v0 = mesh.vertices[tri[0] as usize];
            (mesh.vertices[tri[1] as usize] - v0).cross(mesh.vertices[tri[2] as usize] - v0)
        })
        .collect()
}

#[cfg(test)]
fn square_scene(fill: Fill) -> Scene {
    let square = Rectangle::new(point(10.0, 20.0), size(10.0, 10.0), Some(Arc::new(fill)));
    Scene::new(SceneNode::with_drawables(vec![square.into()]))
}

#[test]
fn channels_are_concatenated() {
    let red = Color::rgb(1.0, 0.0, 0.0);
    let mut moved = triangle(point(0.0, 0.0), point(0.0, 4.0), point(4.0, 0.0), red);
    moved.world_transform = Transform::translation(10.0, 0.0);

    let geoms = vec![
        triangle(point(0.0, 0.0), point(0.0, 2.0), point(2.0, 0.0), Color::BLACK),
        Geometry::new(vec![point(1.0, 1.0)], vec![], Color::WHITE),
        moved,
    ];

    let mesh = fill_vertex_channels(&geoms, 2.0, false).unwrap();
    assert_eq!(mesh.vertices.len(), 6);
    assert_eq!(mesh.indices, vec![0, 1, 2, 3, 4, 5]);
    assert_eq!(mesh.colors, vec![Color::BLACK, Color::BLACK, Color::BLACK, red, red, red]);
    assert_eq!(mesh.vertices[1], point(0.0, 1.0));
    assert_eq!(mesh.vertices[4], point(5.0, 2.0));
    assert!(mesh.uvs.is_none());
    assert!(mesh.setting_indices.is_none());
    assert_eq!(mesh.triangle_count(), 2);
}

#[test]
fn shapes_are_made_clockwise() {
    let ccw = triangle(point(0.0, 0.0), point(1.0, 0.0), point(0.0, 1.0), Color::WHITE);
    let cw = triangle(point(0.0, 0.0), point(0.0, 1.0), point(1.0, 0.0), Color::WHITE);
    let mesh = fill_vertex_channels(&[ccw, cw], 1.0, false).unwrap();
    assert!(signed_areas(&mesh).iter().all(|a| *a < 0.0));
    assert_eq!(&mesh.indices[..3], &[0, 2, 1]);
    assert_eq!(&mesh.indices[3..], &[3, 4, 5]);

    // The first triangle is degenerate, the second one decides.
    let mut vertices = vec![point(0.0, 0.0), point(1.0, 0.0), point(2.0, 0.0), point(0.0, 1.0)];
    let mut indices = vec![0u16, 1, 2, 0, 1, 3];
    flip_shape_if_necessary(&vertices, &mut indices);
    assert_eq!(indices, vec![0, 2, 1, 0, 3, 1]);

    vertices.truncate(3);
    let mut degenerate = vec![0u16, 1, 2];
    flip_shape_if_necessary(&vertices, &mut degenerate);
    assert_eq!(degenerate, vec![0, 1, 2]);
}

#[test]
fn too_many_vertices() {
    let vertices = vec![point(0.0, 0.0); 70_000];
    let big = Geometry::new(vertices, vec![0, 1, 2], Color::WHITE);
    assert_eq!(
        fill_vertex_channels(&[big], 1.0, false),
        Err(SceneError::TooManyVertices { count: 70_000 })
    );
}

#[test]
fn flipped_mesh() {
    let ccw = triangle(point(0.0, 0.0), point(10.0, 0.0), point(0.0, 10.0), Color::WHITE);

    let mesh = fill_mesh(&[ccw.clone()], 1.0, false).unwrap();
    assert_eq!(mesh.indices, vec![0, 2, 1]);

    let mesh = fill_mesh(&[ccw], 1.0, true).unwrap();
    assert_eq!(mesh.vertices[2], point(0.0, -10.0));
    assert_eq!(mesh.indices, vec![0, 1, 2]);
    assert!(mesh.uvs.is_none());
}

#[test]
fn pivots() {
    let bounds = rect(10.0, 20.0, 10.0, 10.0);
    let custom = vector(0.25, 0.75);
    assert_eq!(Alignment::Center.pivot(custom, &bounds), vector(0.5, 0.5));
    assert_eq!(Alignment::TopLeft.pivot(custom, &bounds), vector(0.0, 1.0));
    assert_eq!(Alignment::BottomRight.pivot(custom, &bounds), vector(1.0, 0.0));
    assert_eq!(Alignment::SvgOrigin.pivot(custom, &bounds), vector(-1.0, -2.0));
    assert_eq!(Alignment::SvgOrigin.pivot(custom, &Rect::zero()), vector(0.0, 0.0));
    assert_eq!(Alignment::Custom.pivot(custom, &bounds), custom);
}

#[test]
fn solid_sprite() {
    let scene = square_scene(SolidFill::new(Color::WHITE).into());
    let mut geoms = tessellate_scene(&scene, &TessellationOptions::DEFAULT, None).unwrap();

    let options = SpriteOptions::DEFAULT.with_alignment(Alignment::SvgOrigin);
    let sprite = build_sprite(&mut geoms, &options, &mut DefaultSpriteFactory).unwrap();

    assert_eq!(sprite.rect, rect(0.0, 0.0, 10.0, 10.0));
    assert_eq!(sprite.pivot, vector(-1.0, -2.0));
    assert_eq!(sprite.pixels_per_unit, 100.0);
    assert!(sprite.texture.is_none());
    assert!(sprite.mesh.uvs.is_none());
    assert_eq!(sprite.mesh.vertices.len(), 4);
    for v in &sprite.mesh.vertices {
        assert!(v.x >= 0.0 && v.x <= 10.0 && v.y >= 0.0 && v.y <= 10.0);
    }
    assert!(signed_areas(&sprite.mesh).iter().all(|a| *a < 0.0));
}

#[test]
fn gradient_sprite() {
    let gradient = GradientFill::linear(vec![
        GradientStop::new(0.0, Color::BLACK),
        GradientStop::new(1.0, Color::WHITE),
    ]);
    let scene = square_scene(gradient.into());
    let mut geoms = tessellate_scene(&scene, &TessellationOptions::DEFAULT, None).unwrap();

    let options = SpriteOptions::DEFAULT.with_raster_size(8).with_flip_y(true);
    let sprite = build_sprite(&mut geoms, &options, &mut DefaultSpriteFactory).unwrap();

    let atlas = sprite.texture.unwrap();
    assert_eq!(atlas.entries.len(), 2);
    let uvs = sprite.mesh.uvs.as_ref().unwrap();
    assert_eq!(uvs.len(), sprite.mesh.vertices.len());
    assert_eq!(sprite.mesh.setting_indices, Some(vec![1; uvs.len()]));
    assert!(signed_areas(&sprite.mesh).iter().all(|a| *a < 0.0));
}
