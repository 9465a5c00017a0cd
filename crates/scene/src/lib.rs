#![deny(bare_trait_objects)]
#![deny(unconditional_recursion)]
#![allow(clippy::float_cmp)]
#![allow(clippy::too_many_arguments)]

//! Tessellation of scene hierarchies into sprite meshes.
//!
//! This crate is reexported in [quill](https://docs.rs/quill/).
//!
//! ## Overview
//!
//! A [`Scene`] is a tree of nodes holding paths, shapes and rectangles. Turning it into a mesh
//! goes through three steps:
//!
//! * [`tessellate_scene`] walks the hierarchy and produces a list of [`Geometry`], one or more
//!   per drawable, clipped by the clippers of the nodes.
//! * [`generate_atlas_and_fill_uvs`] packs the texels of the gradients and textures into a
//!   [`TextureAtlas`] and computes the texture coordinates of every geometry.
//! * [`fill_mesh`] or [`build_sprite`] concatenate the geometries into a single [`MeshData`].
//!
//! ## Example
//!
//! ```
//! use quill_scene::math::{point, size};
//! use quill_scene::tessellation::TessellationOptions;
//! use quill_scene::*;
//! use std::sync::Arc;
//!
//! let fill = Arc::new(Fill::from(SolidFill::new(Color::BLACK)));
//! let square = Rectangle::new(point(0.0, 0.0), size(10.0, 10.0), Some(fill));
//! let scene = Scene::new(SceneNode::with_drawables(vec![square.into()]));
//!
//! let mut geoms = tessellate_scene(&scene, &TessellationOptions::DEFAULT, None).unwrap();
//! let sprite = build_sprite(&mut geoms, &SpriteOptions::DEFAULT, &mut DefaultSpriteFactory).unwrap();
//!
//! assert_eq!(sprite.mesh.triangle_count(), 2);
//! assert!(sprite.texture.is_none());
//! ```

pub use quill_tessellation as tessellation;

#[cfg(feature = "serialization")]
#[macro_use]
pub extern crate serde;

mod atlas;
mod clip;
mod color;
mod error;
mod geometry;
mod gradient;
mod nodes;
mod scene;
mod sprite;
mod tessellate;

pub use crate::tessellation::{geom, math, path};

#[doc(inline)]
pub use crate::atlas::*;
#[doc(inline)]
pub use crate::clip::ClipStack;
#[doc(inline)]
pub use crate::color::*;
#[doc(inline)]
pub use crate::error::*;
#[doc(inline)]
pub use crate::geometry::Geometry;
#[doc(inline)]
pub use crate::gradient::*;
#[doc(inline)]
pub use crate::nodes::*;
#[doc(inline)]
pub use crate::scene::*;
#[doc(inline)]
pub use crate::sprite::*;
#[doc(inline)]
pub use crate::tessellate::*;

pub use crate::tessellation::EPSILON;
