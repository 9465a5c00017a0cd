#![deny(bare_trait_objects)]
#![deny(unconditional_recursion)]

//! Bézier contours and the iterators that walk them.
//!
//! This crate is reexported in [quill](https://docs.rs/quill/).
//!
//! A [`BezierContour`] is a chain of connected cubic bézier curves, optionally
//! closed. Tessellators don't consume contours curve by curve. Instead they walk
//! them by distance with a [`PathDistanceIterator`], while a [`PatternIterator`]
//! tells which stretches of the walk are covered by dashes.
//!
//! # Examples
//!
//! ```
//! use quill_path::{make_path_line, BezierContour, PathDistanceIterator, SamplingParameters};
//! use quill_path::math::point;
//!
//! let contour = BezierContour::new(
//!     make_path_line(point(0.0, 0.0), point(10.0, 0.0)).to_vec(),
//!     false,
//! );
//!
//! let mut it = PathDistanceIterator::new(
//!     &contour.segments,
//!     contour.closed,
//!     &SamplingParameters::DEFAULT,
//! ).unwrap();
//!
//! it.advance_by(4.0);
//! assert!((it.length_so_far() - 4.0).abs() < 0.01);
//! ```

pub use quill_geom as geom;

#[cfg(feature = "serialization")]
#[macro_use]
pub extern crate serde;

mod contour;
pub mod iterator;
pub mod pattern;

#[doc(inline)]
pub use crate::contour::*;
#[doc(inline)]
pub use crate::iterator::{Advance, PathDistanceIterator, SamplingParameters, SegmentChain};
#[doc(inline)]
pub use crate::pattern::PatternIterator;
pub use crate::geom::{BezierPathSegment, BezierSegment, EPSILON};

use std::fmt;

pub mod math {
    //! The f32 euclid types used everywhere. Most other quill crates
    //! reexport them.
    pub use crate::geom::math::*;
}

/// Error returned when a contour can't be walked.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PathError {
    /// A contour needs at least two elements to describe a curve.
    NotEnoughSegments,
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathError::NotEnoughSegments => {
                write!(f, "A path needs at least two segments")
            }
        }
    }
}

impl std::error::Error for PathError {}
