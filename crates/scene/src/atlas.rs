//! Packing the texels of gradients and textures into a single atlas.
//!
//! The first row of the atlas holds the settings of each fill, three pixels
//! per setting index:
//!
//! * the fill type, addressing mode and radial focus,
//! * the position of the fill's texels in the atlas,
//! * the size of the fill's texels minus one.
//!
//! Setting 0 is a 2x2 white block used by geometry without texels.

use crate::color::{to_byte, Rgba8};
use crate::geometry::Geometry;
use crate::gradient::rasterize_gradient_stripe;
use crate::math::*;
use crate::scene::{AddressMode, Fill, GradientType};
use crate::EPSILON;

use std::convert::TryFrom;
use std::sync::Arc;
use tracing::{debug_span, trace, warn};

/// Parameters of the atlas generation.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct AtlasOptions {
    /// Width of the rasterized gradient stripes, the maximum size of the
    /// gradients' texels.
    pub raster_size: u32,
}

impl AtlasOptions {
    pub const DEFAULT_RASTER_SIZE: u32 = 64;

    pub const DEFAULT: Self = AtlasOptions {
        raster_size: Self::DEFAULT_RASTER_SIZE,
    };

    pub const fn raster_size(raster_size: u32) -> Self {
        AtlasOptions { raster_size }
    }
}

impl Default for AtlasOptions {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// A rectangle placed in an atlas, in pixels.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PackedRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PackedRect {
    pub fn intersects(&self, other: &PackedRect) -> bool {
        self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }
}

/// A row of the shelf packer.
#[derive(Debug)]
struct Shelf {
    y: u32,
    height: u32,
    x: u32,
}

/// Places rectangles on shelves, tallest first.
///
/// Returns the placements in the order of `sizes` and the size of the
/// smallest box containing them. The shelves are about as wide as the square
/// root of the total area, and never narrower than the widest rectangle.
pub fn pack_rects(sizes: &[(u32, u32)]) -> (Vec<PackedRect>, (u32, u32)) {
    let total_area: u64 = sizes.iter().map(|(w, h)| *w as u64 * *h as u64).sum();
    let widest = sizes.iter().map(|(w, _)| *w).max().unwrap_or(0);
    let shelf_width = widest.max((total_area as f64).sqrt().ceil() as u32);

    let mut order: Vec<usize> = (0..sizes.len()).collect();
    order.sort_by(|a, b| {
        let (wa, ha) = sizes[*a];
        let (wb, hb) = sizes[*b];
        hb.cmp(&ha).then(wb.cmp(&wa))
    });

    let mut placements = vec![PackedRect { x: 0, y: 0, width: 0, height: 0 }; sizes.len()];
    let mut shelves: Vec<Shelf> = Vec::new();
    let mut atlas_width = 0;

    for idx in order {
        let (width, height) = sizes[idx];
        if width == 0 || height == 0 {
            continue;
        }

        let shelf = shelves
            .iter()
            .position(|shelf| height <= shelf.height && shelf.x + width <= shelf_width);

        let shelf = match shelf {
            Some(i) => &mut shelves[i],
            None => {
                let y = shelves.last().map_or(0, |s| s.y + s.height);
                shelves.push(Shelf { y, height, x: 0 });
                let last = shelves.len() - 1;
                &mut shelves[last]
            }
        };

        placements[idx] = PackedRect { x: shelf.x, y: shelf.y, width, height };
        shelf.x += width;
        atlas_width = atlas_width.max(shelf.x);
    }

    let atlas_height = shelves.last().map_or(0, |s| s.y + s.height);

    (placements, (atlas_width, atlas_height))
}

/// Where a fill's texels and settings are in an atlas. The white block has no
/// fill.
#[derive(Clone, Debug, PartialEq)]
pub struct AtlasEntry {
    pub fill: Option<Arc<Fill>>,
    pub rect: PackedRect,
    pub setting_index: u16,
}

/// The texels of the fills of a list of geometries.
#[derive(Clone, Debug, PartialEq)]
pub struct TextureAtlas {
    pub width: u32,
    pub height: u32,
    /// Row-major, starting with the settings row.
    pub pixels: Vec<Rgba8>,
    /// The fills' entries followed by the white block's.
    pub entries: Vec<AtlasEntry>,
}

impl TextureAtlas {
    /// The pixel at `(x, y)`, `None` outside of the texture.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba8> {
        if x >= self.width {
            return None;
        }

        self.pixels.get(y as usize * self.width as usize + x as usize).cloned()
    }

    /// The entry of a fill, compared by identity.
    pub fn entry(&self, fill: &Arc<Fill>) -> Option<&AtlasEntry> {
        self.entries
            .iter()
            .find(|entry| entry.fill.as_ref().map_or(false, |f| Arc::ptr_eq(f, fill)))
    }

    fn put(&mut self, x: u32, y: u32, value: Rgba8) {
        if x < self.width && y < self.height {
            let idx = (y * self.width + x) as usize;
            self.pixels[idx] = value;
        }
    }

    fn blit(&mut self, pixels: &[Rgba8], width: u32, height: u32, x: u32, y: u32) {
        for row in 0..height {
            for col in 0..width {
                if let Some(value) = pixels.get((row * width + col) as usize) {
                    self.put(x + col, y + row, *value);
                }
            }
        }
    }
}

const TEXTURE_FILL_TYPE: u8 = 2;

fn fill_type_code(fill: &Fill) -> u8 {
    match fill {
        Fill::Gradient(gradient) => match gradient.gradient_type {
            GradientType::Linear => 0,
            GradientType::Radial => 1,
        },
        _ => TEXTURE_FILL_TYPE,
    }
}

fn address_mode_code(mode: AddressMode) -> u8 {
    match mode {
        AddressMode::Wrap => 0,
        AddressMode::Clamp => 1,
        AddressMode::Mirror => 2,
    }
}

/// Two 16 bit integers, most significant bytes first.
///
/// Values that don't fit in 16 bits saturate to `u16::MAX`.
fn int2_packed(x: u32, y: u32) -> Rgba8 {
    let (x, y) = match (u16::try_from(x), u16::try_from(y)) {
        (Ok(x16), Ok(y16)) => (x16, y16),
        (x16, y16) => {
            warn!(x, y, "atlas coordinates don't fit in 16 bits");
            (x16.unwrap_or(u16::MAX), y16.unwrap_or(u16::MAX))
        }
    };

    let [x_hi, x_lo] = x.to_be_bytes();
    let [y_hi, y_lo] = y.to_be_bytes();
    [x_hi, x_lo, y_hi, y_lo]
}

fn texel_size(fill: &Fill, raster_size: u32) -> Option<(u32, u32)> {
    match fill {
        Fill::Gradient(_) => Some((raster_size, 1)),
        Fill::Texture(texture) => Some((texture.texture.width, texture.texture.height)),
        _ => None,
    }
}

/// Packs the texels of the gradients and textures used by `geoms`.
///
/// Fills are compared by identity: geometries sharing the same `Arc` share
/// the same entry. Geometries without such a fill get texture coordinates
/// pointing to the white block. Returns `None`, and leaves the geometries
/// untouched, when no fill needs texels.
pub fn generate_atlas(geoms: &mut [Geometry], options: &AtlasOptions) -> Option<TextureAtlas> {
    let _span = debug_span!("generate_atlas", geometries = geoms.len()).entered();

    let raster_size = options.raster_size.max(1);

    let mut fills: Vec<(Arc<Fill>, (u32, u32))> = Vec::new();
    for g in geoms.iter() {
        if let Some(fill) = &g.fill {
            if fills.iter().any(|(f, _)| Arc::ptr_eq(f, fill)) {
                continue;
            }
            if let Some(size) = texel_size(fill, raster_size) {
                fills.push((fill.clone(), size));
            }
        }
    }

    if fills.is_empty() {
        return None;
    }

    let mut sizes: Vec<(u32, u32)> = fills.iter().map(|(_, size)| *size).collect();
    sizes.push((2, 2));
    let (mut placements, (packed_width, packed_height)) = pack_rects(&sizes);

    // The first row is reserved for the settings.
    for rect in &mut placements {
        rect.y += 1;
    }

    let setting_count = fills.len() as u32 + 1;
    let width = packed_width.max(setting_count * 3);
    let height = packed_height + 1;

    let mut atlas = TextureAtlas {
        width,
        height,
        pixels: vec![[0, 0, 0, 0]; (width * height) as usize],
        entries: Vec::with_capacity(placements.len()),
    };

    for (i, ((fill, (w, h)), rect)) in fills.iter().zip(placements.iter()).enumerate() {
        let setting_index = i as u16 + 1;
        let x = setting_index as u32 * 3;

        match &**fill {
            Fill::Gradient(gradient) => {
                let stripe = rasterize_gradient_stripe(gradient, *w);
                atlas.blit(&stripe, *w, *h, rect.x, rect.y);

                let focus = (gradient.radial_focus.to_vector() + vector(1.0, 1.0)) / 2.0;
                atlas.put(
                    x,
                    0,
                    [
                        fill_type_code(fill),
                        address_mode_code(gradient.addressing),
                        to_byte(focus.x),
                        to_byte(1.0 - focus.y),
                    ],
                );
            }
            Fill::Texture(texture) => {
                atlas.blit(&texture.texture.pixels, *w, *h, rect.x, rect.y);
                atlas.put(x, 0, [TEXTURE_FILL_TYPE, address_mode_code(texture.addressing), 0, 0]);
            }
            _ => {}
        }

        atlas.put(x + 1, 0, int2_packed(rect.x, rect.y));
        atlas.put(x + 2, 0, int2_packed(w - 1, h - 1));

        atlas.entries.push(AtlasEntry {
            fill: Some(fill.clone()),
            rect: *rect,
            setting_index,
        });
    }

    let white = placements[placements.len() - 1];
    atlas.blit(&[[255, 255, 255, 255]; 4], 2, 2, white.x, white.y);
    atlas.put(0, 0, [TEXTURE_FILL_TYPE, address_mode_code(AddressMode::Clamp), 0, 0]);
    atlas.put(1, 0, int2_packed(white.x, white.y));
    atlas.put(2, 0, int2_packed(1, 1));
    atlas.entries.push(AtlasEntry {
        fill: None,
        rect: white,
        setting_index: 0,
    });

    let white_uv = point(
        (white.x + 1) as f32 / width as f32,
        (white.y + 1) as f32 / height as f32,
    );
    for g in geoms.iter_mut() {
        let textured = g.fill.as_ref().map_or(false, |fill| fill.is_textured());
        if !textured {
            g.uvs = Some(vec![white_uv; g.vertices.len()]);
        }
    }

    trace!(width, height, entries = atlas.entries.len(), "atlas generated");

    Some(atlas)
}

/// Maps vertices to the unit square of `bounds`, transformed by
/// `uv_transform`, with v going up.
pub fn generate_shape_uvs(vertices: &[Point], bounds: &Rect, uv_transform: &Transform) -> Vec<Point> {
    let _span = debug_span!("generate_shape_uvs", vertices = vertices.len()).entered();

    let sx = if bounds.size.width > EPSILON { 1.0 / bounds.size.width } else { 1.0 };
    let sy = if bounds.size.height > EPSILON { 1.0 / bounds.size.height } else { 1.0 };

    let transform = Transform::translation(-bounds.origin.x, -bounds.origin.y)
        .then_scale(sx, sy)
        .then(uv_transform)
        .then_scale(1.0, -1.0)
        .then_translate(vector(0.0, 1.0));

    vertices.iter().map(|v| transform.transform_point(*v)).collect()
}

/// Sets the texture coordinates and setting index of every geometry.
pub fn fill_uvs(geoms: &mut [Geometry], atlas: &TextureAtlas) {
    let _span = debug_span!("fill_uvs", geometries = geoms.len()).entered();

    for g in geoms.iter_mut() {
        let setting_index = g
            .fill
            .as_ref()
            .and_then(|fill| atlas.entry(fill))
            .map_or(0, |entry| entry.setting_index);

        g.uvs = Some(generate_shape_uvs(&g.vertices, &g.unclipped_bounds, &g.fill_transform));
        g.setting_index = setting_index;
    }
}

/// [`generate_atlas`] followed by [`fill_uvs`].
pub fn generate_atlas_and_fill_uvs(geoms: &mut [Geometry], options: &AtlasOptions) -> Option<TextureAtlas> {
    let atlas = generate_atlas(geoms, options)?;
    fill_uvs(geoms, &atlas);

    Some(atlas)
}

#[cfg(test)]
use crate::color::Color;
#[cfg(test)]
use crate::scene::{GradientFill, GradientStop, SolidFill, Texture, TextureFill};

#[cfg(test)]
fn quad(fill: Option<Arc<Fill>>) -> Geometry {
    Geometry::new(
        vec![point(0.0, 0.0), point(10.0, 0.0), point(10.0, 10.0), point(0.0, 10.0)],
        vec![0, 1, 2, 0, 2, 3],
        Color::WHITE,
    )
    .with_fill(fill, Transform::identity())
}

#[cfg(test)]
fn gradient() -> Arc<Fill> {
    Arc::new(
        GradientFill::linear(vec![
            GradientStop::new(0.0, Color::BLACK),
            GradientStop::new(1.0, Color::WHITE),
        ])
        .into(),
    )
}

#[test]
fn packed_rects_do_not_overlap() {
    let sizes = [(8, 1), (2, 2), (5, 5), (3, 7), (16, 1), (1, 1), (4, 4), (0, 3)];
    let (placements, (width, height)) = pack_rects(&sizes);
    assert_eq!(placements.len(), sizes.len());

    for (i, a) in placements.iter().enumerate() {
        assert_eq!((a.width, a.height), if sizes[i].0 == 0 { (0, 0) } else { sizes[i] });
        assert!(a.x + a.width <= width);
        assert!(a.y + a.height <= height);
        for b in &placements[i + 1..] {
            assert!(!a.intersects(b));
        }
    }

    assert_eq!(pack_rects(&[]), (vec![], (0, 0)));
}

#[test]
fn no_atlas_without_texels() {
    let mut geoms = vec![quad(Some(Arc::new(SolidFill::new(Color::BLACK).into()))), quad(None)];
    assert!(generate_atlas(&mut geoms, &AtlasOptions::DEFAULT).is_none());
    assert!(generate_atlas_and_fill_uvs(&mut geoms, &AtlasOptions::DEFAULT).is_none());
    assert!(geoms.iter().all(|g| g.uvs.is_none()));
}

#[test]
fn gradient_atlas_layout() {
    let fill = gradient();
    let mut geoms = vec![quad(Some(fill.clone())), quad(None)];

    let atlas = generate_atlas(&mut geoms, &AtlasOptions::raster_size(8)).unwrap();
    assert_eq!((atlas.width, atlas.height), (8, 4));
    assert_eq!(atlas.pixels.len(), 32);
    assert_eq!(atlas.entries.len(), 2);

    let white = atlas.entries[1].rect;
    assert_eq!((white.x, white.y), (0, 1));
    for (x, y) in &[(0, 1), (1, 1), (0, 2), (1, 2)] {
        assert_eq!(atlas.pixel(*x, *y), Some([255, 255, 255, 255]));
    }

    let stripe = atlas.entry(&fill).unwrap();
    assert_eq!(stripe.setting_index, 1);
    assert_eq!((stripe.rect.x, stripe.rect.y), (0, 3));
    assert_eq!(atlas.pixel(0, 3), Some([0, 0, 0, 255]));
    assert_eq!(atlas.pixel(7, 3), Some([255, 255, 255, 255]));
    assert_eq!(atlas.pixel(8, 0), None);
    assert_eq!(atlas.pixel(0, 4), None);

    // Settings of the white block.
    assert_eq!(atlas.pixel(0, 0), Some([2, 1, 0, 0]));
    assert_eq!(atlas.pixel(1, 0), Some([0, 0, 0, 1]));
    assert_eq!(atlas.pixel(2, 0), Some([0, 1, 0, 1]));
    // Settings of the gradient: linear, clamped, centered focus.
    assert_eq!(atlas.pixel(3, 0), Some([0, 1, 128, 128]));
    assert_eq!(atlas.pixel(4, 0), Some([0, 0, 0, 3]));
    assert_eq!(atlas.pixel(5, 0), Some([0, 7, 0, 0]));

    // Untextured geometry points to the middle of the white block.
    assert!(geoms[0].uvs.is_none());
    assert_eq!(geoms[1].uvs, Some(vec![point(0.125, 0.5); 4]));
}

#[test]
fn fills_are_shared_by_identity() {
    let shared = gradient();
    let texture = Arc::new(Fill::from(TextureFill::new(Texture::filled(3, 2, [10, 20, 30, 255]))));
    let mut geoms = vec![
        quad(Some(shared.clone())),
        quad(Some(shared.clone())),
        quad(Some(gradient())),
        quad(Some(texture.clone())),
    ];

    let atlas = generate_atlas(&mut geoms, &AtlasOptions::raster_size(4)).unwrap();
    // Two distinct gradients, one texture and the white block.
    assert_eq!(atlas.entries.len(), 4);

    let entry = atlas.entry(&texture).unwrap();
    assert_eq!((entry.rect.width, entry.rect.height), (3, 2));
    assert_eq!(atlas.pixel(entry.rect.x + 2, entry.rect.y + 1), Some([10, 20, 30, 255]));
    let x = entry.setting_index as u32 * 3;
    assert_eq!(atlas.pixel(x, 0), Some([2, 0, 0, 0]));
    assert_eq!(atlas.pixel(x + 2, 0), Some([0, 2, 0, 1]));

    for (i, a) in atlas.entries.iter().enumerate() {
        assert!(a.rect.y >= 1);
        assert!(a.rect.x + a.rect.width <= atlas.width);
        assert!(a.rect.y + a.rect.height <= atlas.height);
        for b in &atlas.entries[i + 1..] {
            assert!(!a.rect.intersects(&b.rect));
        }
    }
}

#[test]
fn shape_uvs() {
    let vertices = [point(0.0, 0.0), point(10.0, 10.0), point(5.0, 0.0)];
    let uvs = generate_shape_uvs(&vertices, &rect(0.0, 0.0, 10.0, 10.0), &Transform::identity());
    assert_eq!(uvs, vec![point(0.0, 1.0), point(1.0, 0.0), point(0.5, 1.0)]);

    let uvs = generate_shape_uvs(&vertices, &rect(0.0, 0.0, 10.0, 10.0), &Transform::scale(2.0, 1.0));
    assert_eq!(uvs[1], point(2.0, 0.0));
}

#[test]
fn uvs_and_setting_indices() {
    let fill = gradient();
    let mut geoms = vec![quad(None), quad(Some(fill))];

    let atlas = generate_atlas_and_fill_uvs(&mut geoms, &AtlasOptions::raster_size(8)).unwrap();
    assert_eq!(atlas.entries.len(), 2);
    assert_eq!(geoms[0].setting_index, 0);
    assert_eq!(geoms[1].setting_index, 1);
    for g in &geoms {
        let uvs = g.uvs.as_ref().unwrap();
        assert_eq!(uvs[0], point(0.0, 1.0));
        assert_eq!(uvs[2], point(1.0, 0.0));
    }
}

#[test]
fn packed_coordinates() {
    assert_eq!(int2_packed(0, 0), [0, 0, 0, 0]);
    assert_eq!(int2_packed(0x1234, 7), [0x12, 0x34, 0, 7]);
    assert_eq!(int2_packed(65535, 256), [255, 255, 1, 0]);
    // Out of range values saturate instead of wrapping around.
    assert_eq!(int2_packed(70000, 1), [255, 255, 0, 1]);
    assert_eq!(int2_packed(3, 65536), [0, 3, 255, 255]);
}
