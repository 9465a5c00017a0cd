use crate::geom::traits::Transformation;
use crate::math::{Box2D, Point};
use crate::{BezierPathSegment, BezierSegment, EPSILON};

/// A chain of connected bézier curves, optionally closed.
///
/// Closed contours don't need a dedicated closing curve: when the last endpoint
/// doesn't match the first one, a straight line is implied between them.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct BezierContour {
    pub segments: Vec<BezierPathSegment>,
    pub closed: bool,
}

impl BezierContour {
    pub fn new(segments: Vec<BezierPathSegment>, closed: bool) -> Self {
        BezierContour { segments, closed }
    }

    /// Iterates over the curves of the contour, not including the implicit
    /// closing line.
    pub fn curves(&self) -> SegmentsInPath<'_> {
        segments_in_path(&self.segments)
    }

    /// The union of the bounding boxes of all curves, or an empty box at the
    /// origin if the contour has no curve.
    pub fn bounding_box(&self) -> Box2D {
        let mut curves = self.curves();
        let mut bounds = match curves.next() {
            Some(curve) => curve.bounding_box(),
            None => return Box2D::zero(),
        };

        for curve in curves {
            bounds = bounds.union(&curve.bounding_box());
        }

        bounds
    }

    pub fn transformed<T: Transformation>(&self, transform: &T) -> Self {
        BezierContour {
            segments: self
                .segments
                .iter()
                .map(|s| BezierPathSegment {
                    p0: transform.transform_point(s.p0),
                    p1: transform.transform_point(s.p1),
                    p2: transform.transform_point(s.p2),
                })
                .collect(),
            closed: self.closed,
        }
    }
}

/// The curve starting at `path[index]`.
///
/// Panics if `index + 1` is out of bounds.
#[inline]
pub fn path_segment(path: &[BezierPathSegment], index: usize) -> BezierSegment {
    BezierSegment {
        p0: path[index].p0,
        p1: path[index].p1,
        p2: path[index].p2,
        p3: path[index + 1].p0,
    }
}

/// The two chain elements describing a single curve.
#[inline]
pub fn path_segments(segment: &BezierSegment) -> [BezierPathSegment; 2] {
    [
        BezierPathSegment {
            p0: segment.p0,
            p1: segment.p1,
            p2: segment.p2,
        },
        BezierPathSegment::end(segment.p3),
    ]
}

/// The two chain elements describing a straight line.
#[inline]
pub fn make_path_line(from: Point, to: Point) -> [BezierPathSegment; 2] {
    path_segments(&BezierSegment::line(from, to))
}

/// Iterator over the curves of a chain.
#[derive(Clone)]
pub struct SegmentsInPath<'l> {
    path: &'l [BezierPathSegment],
    index: usize,
}

impl<'l> Iterator for SegmentsInPath<'l> {
    type Item = BezierSegment;

    fn next(&mut self) -> Option<BezierSegment> {
        if self.index + 1 >= self.path.len() {
            return None;
        }

        let segment = path_segment(self.path, self.index);
        self.index += 1;

        Some(segment)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.path.len().saturating_sub(self.index + 1);
        (n, Some(n))
    }
}

impl<'l> ExactSizeIterator for SegmentsInPath<'l> {}

pub fn segments_in_path(path: &[BezierPathSegment]) -> SegmentsInPath<'_> {
    SegmentsInPath { path, index: 0 }
}

/// Whether the last endpoint of the chain is on top of the first one.
pub fn path_ends_perfectly_match(path: &[BezierPathSegment]) -> bool {
    match (path.first(), path.last()) {
        (Some(first), Some(last)) if path.len() >= 2 => {
            (first.p0 - last.p0).square_length() <= EPSILON
        }
        _ => false,
    }
}

/// The length of each curve of the chain.
///
/// Closed chains whose ends don't match get an extra entry for the implicit
/// closing line.
pub fn segments_lengths(path: &[BezierPathSegment], closed: bool, precision: f32) -> Vec<f32> {
    let mut lengths: Vec<f32> = segments_in_path(path)
        .map(|curve| curve.length(precision))
        .collect();

    if closed && !path_ends_perfectly_match(path) {
        if let (Some(first), Some(last)) = (path.first(), path.last()) {
            lengths.push((first.p0 - last.p0).length());
        }
    }

    lengths
}

/// The total length of the chain.
pub fn segments_length(path: &[BezierPathSegment], closed: bool, precision: f32) -> f32 {
    segments_lengths(path, closed, precision).iter().sum()
}

/// Removes the curves that collapse to a single point.
pub fn remove_empty_segments(path: &[BezierPathSegment]) -> Vec<BezierPathSegment> {
    let mut result = Vec::with_capacity(path.len());
    for (i, segment) in path.iter().enumerate() {
        if let Some(next) = path.get(i + 1) {
            let empty = segment.p0 == segment.p1 && segment.p0 == segment.p2 && segment.p0 == next.p0;
            if empty {
                continue;
            }
        }
        result.push(*segment);
    }

    result
}

#[cfg(test)]
use crate::math::point;

#[test]
fn curves_of_a_path() {
    let mut path = make_path_line(point(0.0, 0.0), point(1.0, 0.0)).to_vec();
    path.push(BezierPathSegment::end(point(1.0, 1.0)));

    let curves: Vec<BezierSegment> = segments_in_path(&path).collect();
    assert_eq!(curves.len(), 2);
    assert_eq!(curves[0].p3, point(1.0, 0.0));
    assert_eq!(curves[1].p0, point(1.0, 0.0));
    assert_eq!(curves[1].p3, point(1.0, 1.0));

    assert!(segments_in_path(&path[..1]).next().is_none());
}

#[test]
fn lengths() {
    let mut path = make_path_line(point(0.0, 0.0), point(10.0, 0.0)).to_vec();
    path.pop();
    path.extend_from_slice(&make_path_line(point(10.0, 0.0), point(10.0, 10.0)));

    let open = segments_lengths(&path, false, 0.001);
    assert_eq!(open.len(), 2);
    assert!((open[0] - 10.0).abs() < 1e-3);
    assert!((open[1] - 10.0).abs() < 1e-3);

    let closed = segments_lengths(&path, true, 0.001);
    assert_eq!(closed.len(), 3);
    assert!((closed[2] - 200f32.sqrt()).abs() < 1e-3);
    assert!((segments_length(&path, true, 0.001) - (20.0 + 200f32.sqrt())).abs() < 1e-2);
}

#[test]
fn matching_ends() {
    let mut path = make_path_line(point(0.0, 0.0), point(1.0, 0.0)).to_vec();
    assert!(!path_ends_perfectly_match(&path));
    path.pop();
    path.extend_from_slice(&make_path_line(point(1.0, 0.0), point(0.0, 0.0)));
    assert!(path_ends_perfectly_match(&path));
    assert!(!path_ends_perfectly_match(&path[..1]));
}

#[test]
fn empty_segments() {
    let path = vec![
        BezierPathSegment::end(point(0.0, 0.0)),
        BezierPathSegment::end(point(0.0, 0.0)),
        BezierPathSegment::end(point(5.0, 0.0)),
    ];
    let cleaned = remove_empty_segments(&path);
    assert_eq!(cleaned.len(), 2);
    assert_eq!(cleaned[0].p0, point(0.0, 0.0));
    assert_eq!(cleaned[1].p0, point(5.0, 0.0));
}

#[test]
fn quarter_arc_bounds() {
    let arc = crate::geom::make_arc(point(0.0, 0.0), 0.0, std::f32::consts::FRAC_PI_2);
    let contour = BezierContour::new(path_segments(&arc).to_vec(), false);
    let bounds = contour.bounding_box();
    assert!((bounds.min - point(0.0, 0.0)).length() < 1e-5);
    assert!((bounds.max - point(1.0, 1.0)).length() < 1e-5);
}

#[test]
fn transformed_contour() {
    let contour = BezierContour::new(make_path_line(point(0.0, 0.0), point(1.0, 0.0)).to_vec(), true);
    let t = crate::math::Transform::translation(2.0, 3.0);
    let moved = contour.transformed(&t);
    assert!(moved.closed);
    assert_eq!(moved.segments[0].p0, point(2.0, 3.0));
    assert_eq!(moved.segments[1].p0, point(3.0, 3.0));
}
