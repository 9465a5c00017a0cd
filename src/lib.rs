#![deny(bare_trait_objects)]

//! Tessellation of 2D vector graphics scenes into meshes.
//!
//! # Crates
//!
//! This meta-crate (`quill`) reexports the following sub-crates for convenience:
//!
//! * **quill_geom** - Cubic bézier segments, circular arcs, line intersections and root solvers.
//! * **quill_path** - Bézier contours, distance based iteration along them and dash patterns.
//! * **quill_tessellation** - Stroke, outline and fill tessellation of contours, rectangles.
//! * **quill_scene** - Scene hierarchies, clipping, gradient atlases and mesh assembly.
//!
//! Each `quill_<name>` crate is reexported as a `<name>` module in `quill`. For example:
//!
//! ```ignore
//! use quill_tessellation::tessellate_path;
//! ```
//!
//! Is equivalent to:
//!
//! ```ignore
//! use quill::tessellation::tessellate_path;
//! ```
//!
//! # Feature flags
//!
//! serialization using serde can be enabled on each crate using the
//! `serialization` feature flag (disabled by default).
//!
//! # Examples
//!
//! ## Stroking a contour
//!
//! ```
//! use quill::math::point;
//! use quill::path::{make_path_line, BezierContour};
//! use quill::tessellation::{tessellate_path, StrokeOptions, TessellationOptions};
//!
//! let contour = BezierContour::new(make_path_line(point(0.0, 0.0), point(100.0, 0.0)).to_vec(), false);
//! let geometry = tessellate_path(
//!     &contour,
//!     &StrokeOptions::half_thickness(5.0),
//!     &TessellationOptions::DEFAULT,
//! ).unwrap();
//!
//! // A single quad.
//! assert_eq!(geometry.vertices.len(), 4);
//! assert_eq!(geometry.indices.len(), 6);
//! ```
//!
//! ## From a scene to a sprite
//!
//! ```
//! use quill::math::{point, size};
//! use quill::scene::*;
//! use quill::tessellation::TessellationOptions;
//! use std::sync::Arc;
//!
//! let gradient = GradientFill::linear(vec![
//!     GradientStop::new(0.0, Color::BLACK),
//!     GradientStop::new(1.0, Color::WHITE),
//! ]);
//! let square = Rectangle::new(point(0.0, 0.0), size(10.0, 10.0), Some(Arc::new(gradient.into())));
//! let scene = Scene::new(SceneNode::with_drawables(vec![square.into()]));
//!
//! let mut geoms = tessellate_scene(&scene, &TessellationOptions::DEFAULT, None).unwrap();
//! let sprite = build_sprite(&mut geoms, &SpriteOptions::DEFAULT, &mut DefaultSpriteFactory).unwrap();
//!
//! // The gradient's texels are packed in the sprite's texture.
//! assert!(sprite.texture.is_some());
//! assert!(sprite.mesh.uvs.is_some());
//! ```

pub extern crate quill_scene;
pub extern crate quill_tessellation;

pub use quill_scene as scene;
pub use quill_tessellation as tessellation;
pub use tessellation::geom;
pub use tessellation::path;

pub use path::math;
