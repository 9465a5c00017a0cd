#![deny(bare_trait_objects)]
#![deny(unconditional_recursion)]
#![allow(clippy::excessive_precision)]
#![allow(clippy::many_single_char_names)]
#![no_std]

//! Cubic bézier segments, circular arcs and line math on top of euclid.
//!
//! This crate is reexported in [quill](https://docs.rs/quill/).
//!
//! # Overview.
//!
//! Everything in quill is expressed in terms of cubic bézier curves. This crate
//! implements the maths to work with them:
//!
//! - evaluation of positions, tangents and normals,
//! - splitting, flipping and transforming,
//! - arc length approximation,
//! - bounding boxes,
//! - intersections with lines,
//! - approximation of circular arcs.
//!
//! # Conventions
//!
//! Angles are in radians and grow counter-clockwise in a y-up frame. The normal
//! of a curve is its tangent rotated by a quarter turn, which points to the right
//! of the direction of travel in a y-down frame: the normal of a segment going
//! from `(0, 0)` to `(1, 0)` is `(0, 1)`.
//!
//! Functions that intersect infinite lines return a point at infinity when there
//! is no solution, see [`is_finite_point`].

#[cfg(any(test, feature = "std"))]
extern crate std;

// Reexport dependencies.
pub use arrayvec;
pub use euclid;

#[cfg(feature = "serialization")]
#[macro_use]
pub extern crate serde;

pub mod arc;
mod bezier;
mod line;
pub mod roots;

#[doc(inline)]
pub use crate::arc::{make_arc, make_arc_segments};
#[doc(inline)]
pub use crate::bezier::{transform_segment, BezierPathSegment, BezierSegment};
#[doc(inline)]
pub use crate::line::{
    intersect_line_segments, intersect_lines, is_finite_point, point_on_line_is_within_segment,
    point_on_the_left_of_line, point_to_line_distance_sq,
};

/// Tolerance used for all geometric comparisons.
pub const EPSILON: f32 = 1e-6;

pub mod math {
    //! Basic types that are used everywhere. Most other quill crates
    //! reexport them.

    /// Alias for `euclid::default::Point2D<f32>`.
    pub type Point = euclid::default::Point2D<f32>;

    /// Alias for `euclid::default::Vector2D<f32>`.
    pub type Vector = euclid::default::Vector2D<f32>;

    /// Alias for `euclid::default::Size2D<f32>`.
    pub type Size = euclid::default::Size2D<f32>;

    /// Alias for `euclid::default::Rect<f32>`
    pub type Rect = euclid::default::Rect<f32>;

    /// Alias for `euclid::default::Box2D<f32>`
    pub type Box2D = euclid::default::Box2D<f32>;

    /// Alias for `euclid::default::Transform2D<f32>`
    pub type Transform = euclid::default::Transform2D<f32>;

    /// Alias for `euclid::default::Rotation2D<f32>`
    pub type Rotation = euclid::default::Rotation2D<f32>;

    /// Alias for `euclid::Translation2D<f32, UnknownUnit, UnknownUnit>`
    pub type Translation = euclid::Translation2D<f32, euclid::UnknownUnit, euclid::UnknownUnit>;

    /// An angle in radians (f32).
    pub type Angle = euclid::Angle<f32>;

    /// Shorthand for `Rect::new(Point::new(x, y), Size::new(w, h))`.
    #[inline]
    pub fn rect(x: f32, y: f32, w: f32, h: f32) -> Rect {
        Rect::new(Point::new(x, y), Size::new(w, h))
    }

    /// Shorthand for `Vector::new(x, y)`.
    #[inline]
    pub fn vector(x: f32, y: f32) -> Vector {
        Vector::new(x, y)
    }

    /// Shorthand for `Point::new(x, y)`.
    #[inline]
    pub fn point(x: f32, y: f32) -> Point {
        Point::new(x, y)
    }

    /// Shorthand for `Size::new(x, y)`.
    #[inline]
    pub fn size(w: f32, h: f32) -> Size {
        Size::new(w, h)
    }

    /// The vector rotated by a quarter turn, `(-v.y, v.x)`.
    #[inline]
    pub fn perpendicular(v: Vector) -> Vector {
        Vector::new(-v.y, v.x)
    }
}

pub mod traits {
    use crate::math::{Point, Rotation, Transform, Translation, Vector};

    pub trait Transformation {
        fn transform_point(&self, p: Point) -> Point;
        fn transform_vector(&self, v: Vector) -> Vector;
    }

    impl Transformation for Transform {
        fn transform_point(&self, p: Point) -> Point {
            self.transform_point(p)
        }

        fn transform_vector(&self, v: Vector) -> Vector {
            self.transform_vector(v)
        }
    }

    impl Transformation for Rotation {
        fn transform_point(&self, p: Point) -> Point {
            self.transform_point(p)
        }

        fn transform_vector(&self, v: Vector) -> Vector {
            self.transform_vector(v)
        }
    }

    impl Transformation for Translation {
        fn transform_point(&self, p: Point) -> Point {
            self.transform_point(p)
        }

        fn transform_vector(&self, v: Vector) -> Vector {
            v
        }
    }

    // Automatically implement Transformation for all &Transformation.
    impl<'l, T: Transformation> Transformation for &'l T {
        #[inline]
        fn transform_point(&self, p: Point) -> Point {
            (*self).transform_point(p)
        }

        #[inline]
        fn transform_vector(&self, v: Vector) -> Vector {
            (*self).transform_vector(v)
        }
    }
}
