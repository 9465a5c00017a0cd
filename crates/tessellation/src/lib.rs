#![deny(bare_trait_objects)]
#![deny(unconditional_recursion)]
#![allow(clippy::float_cmp)]
#![allow(clippy::too_many_arguments)]

//! Tessellation of bézier contours into triangles.
//!
//! This crate is reexported in [quill](https://docs.rs/quill/).
//!
//! ## Overview
//!
//! The most interesting items of this crate are:
//!
//! * [`tessellate_path`] - Generates the triangles of the stroke of a contour, with dashes,
//!   corners and endings.
//! * [`trace_shape`] - Approximates a contour with a polygon.
//! * [`fill_polygons`] - Triangulates polygons with a [`FillMode`]. [`PolygonFiller`] does the
//!   same and reuses its allocations across calls.
//! * [`tessellate_rect`], [`tessellate_rect_border`] and [`build_rounded_rectangle_contour`]
//!   for rectangles.
//! * [`split_into_batches`] - Splits geometry into batches that 16 bit indices can address.
//!
//! ## Tolerance
//!
//! Curves are walked in small parametric steps (see
//! [`TessellationOptions::sampling_step_size`]) and a vertex is emitted whenever the chord
//! of the walked portion deviates from the curve by more than the maximum cord deviation,
//! or whenever the tangent turns by more than the maximum tangent angle deviation.
//! On straight stretches, vertices are emitted every `step_distance` units.
//!
//! ## Output
//!
//! Geometry is returned as lyon's [`VertexBuffers`]: a vertex vector and an index vector
//! describing a triangle list, to be rendered with the equivalent of `glDrawElements`
//! in `GL_TRIANGLES` mode.

pub use quill_path as path;

#[cfg(feature = "serialization")]
#[macro_use]
pub extern crate serde;

mod basic_shapes;
mod batch;
mod error;
mod fill;
mod options;
mod outline;
pub mod stroke;

pub use crate::path::geom;
pub use crate::path::math;

#[doc(inline)]
pub use crate::basic_shapes::*;
#[doc(inline)]
pub use crate::batch::*;
#[doc(inline)]
pub use crate::error::*;
#[doc(inline)]
pub use crate::fill::*;
#[doc(inline)]
pub use crate::options::*;
#[doc(inline)]
pub use crate::outline::*;
#[doc(inline)]
pub use crate::stroke::{calculate_arc_steps, tessellate_path};

pub use crate::path::EPSILON;

pub use lyon_tessellation::VertexBuffers;
