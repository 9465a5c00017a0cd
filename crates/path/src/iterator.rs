//! Walking along contours by distance.
//!
//! The [`PathDistanceIterator`] advances along a chain of curves by a given
//! distance, sampling the curves in small parametric steps. It stops early
//! wherever a linear approximation of the walked portion would deviate too much
//! from the curve so that consumers can emit a vertex there.

use crate::contour::{make_path_line, path_ends_perfectly_match, path_segment};
use crate::geom::{point_to_line_distance_sq, BezierPathSegment, BezierSegment};
use crate::math::{Point, Vector};
use crate::{PathError, EPSILON};

/// Controls how finely the [`PathDistanceIterator`] samples curves.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct SamplingParameters {
    /// Maximum squared distance between the curve and the chord of a step.
    ///
    /// `f32::MAX` disables the check.
    pub max_cord_deviation_sq: f32,
    /// Cosine of the maximum angle between tangents at the two ends of a step.
    ///
    /// Values of 1 or more disable the check.
    pub max_tan_angle_deviation_cos: f32,
    /// Parametric step used to sample each curve.
    pub step_size_t: f32,
}

impl SamplingParameters {
    pub const DEFAULT: Self = SamplingParameters {
        max_cord_deviation_sq: f32::MAX,
        max_tan_angle_deviation_cos: 1.0,
        step_size_t: 0.01,
    };
}

impl Default for SamplingParameters {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// A read-only view over a chain of curves, with the closing line of closed
/// contours appended when the ends of the chain don't match.
#[derive(Copy, Clone, Debug)]
pub struct SegmentChain<'l> {
    path: &'l [BezierPathSegment],
    closing: Option<[BezierPathSegment; 2]>,
}

impl<'l> SegmentChain<'l> {
    pub fn new(path: &'l [BezierPathSegment], closed: bool) -> Self {
        let closing = match (path.first(), path.last()) {
            (Some(first), Some(last)) if closed && !path_ends_perfectly_match(path) => {
                Some(make_path_line(last.p0, first.p0))
            }
            _ => None,
        };

        SegmentChain { path, closing }
    }

    /// Number of chain elements, one more than the number of curves.
    #[inline]
    pub fn len(&self) -> usize {
        self.path.len() + if self.closing.is_some() { 1 } else { 0 }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a closing line was appended to the chain.
    #[inline]
    pub fn has_closing_line(&self) -> bool {
        self.closing.is_some()
    }

    /// The chain element at `index`.
    pub fn get(&self, index: usize) -> BezierPathSegment {
        match &self.closing {
            Some(closing) if index + 1 >= self.path.len() => closing[index + 1 - self.path.len()],
            _ => self.path[index],
        }
    }

    /// The curve starting at element `index`.
    pub fn segment(&self, index: usize) -> BezierSegment {
        if self.closing.is_none() {
            return path_segment(self.path, index);
        }

        let from = self.get(index);
        BezierSegment {
            p0: from.p0,
            p1: from.p1,
            p2: from.p2,
            p3: self.get(index + 1).p0,
        }
    }
}

/// What happened during a call to [`PathDistanceIterator::advance_by`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Advance {
    /// Stopped within the current curve.
    Stepped,
    /// Crossed into the next curve.
    NewSegment,
    /// Reached the end of the contour.
    Ended,
}

/// Walks a contour by distance.
pub struct PathDistanceIterator<'l> {
    segments: SegmentChain<'l>,
    closed: bool,
    need_tangents: bool,
    max_cord_deviation_sq: f32,
    max_tan_angle_deviation_cos: f32,
    step_size_t: f32,

    current_segment: usize,
    current_t: f32,
    current_curve: BezierSegment,
    current_tangent: Vector,
    last_point_eval: Point,
    length_so_far: f32,
    segment_length_so_far: f32,
}

impl<'l> PathDistanceIterator<'l> {
    /// Fails if `path` has less than two elements.
    pub fn new(
        path: &'l [BezierPathSegment],
        closed: bool,
        params: &SamplingParameters,
    ) -> Result<Self, PathError> {
        if path.len() < 2 {
            return Err(PathError::NotEnoughSegments);
        }

        let segments = SegmentChain::new(path, closed);
        let current_curve = segments.segment(0);
        let need_tangents = params.max_tan_angle_deviation_cos < 1.0;
        let current_tangent = if need_tangents {
            current_curve.tangent(0.0)
        } else {
            Vector::zero()
        };

        Ok(PathDistanceIterator {
            segments,
            closed,
            need_tangents,
            max_cord_deviation_sq: params.max_cord_deviation_sq,
            max_tan_angle_deviation_cos: params.max_tan_angle_deviation_cos,
            step_size_t: params.step_size_t.max(EPSILON),
            current_segment: 0,
            current_t: 0.0,
            current_curve,
            current_tangent,
            last_point_eval: current_curve.p0,
            length_so_far: 0.0,
            segment_length_so_far: 0.0,
        })
    }

    /// Advances by `units`, or less if the sampling parameters require a stop.
    ///
    /// Returns what happened along with the distance that was left to walk.
    pub fn advance_by(&mut self, units: f32) -> (Advance, f32) {
        if self.ended() {
            return (Advance::Ended, units);
        }

        let mut units_remaining = units;
        let mut t = self.current_t;
        loop {
            let mut next_t = (t + self.step_size_t).min(1.0);
            let mut point = self.current_curve.sample(next_t);
            let tangent = if self.need_tangents {
                self.current_curve.tangent(next_t)
            } else {
                Vector::zero()
            };

            let mut split = false;
            if self.need_tangents && tangent.dot(self.current_tangent) < self.max_tan_angle_deviation_cos {
                split = true;
            } else if self.max_cord_deviation_sq != f32::MAX {
                let current_pos = self.current_curve.sample(self.current_t);
                if (point - current_pos).square_length() > EPSILON {
                    let ahead_t = ((next_t - self.current_t) * 2.0 + self.current_t).min(1.0);
                    let ahead = self.current_curve.sample(ahead_t);
                    split = point_to_line_distance_sq(point, current_pos, ahead) >= self.max_cord_deviation_sq;
                }
            }

            let mut dist = (point - self.last_point_eval).length();
            if dist > units_remaining {
                next_t = t + (next_t - t) * (units_remaining / dist);
                dist = units_remaining;
                point = self.current_curve.sample(next_t);
            }

            self.segment_length_so_far += dist;
            self.length_so_far += dist;
            units_remaining -= dist;
            self.last_point_eval = point;
            t = next_t;

            if next_t < 1.0 {
                if units_remaining > 0.0 && !split {
                    continue;
                }

                self.current_t = next_t;
                self.current_tangent = tangent;
                return (Advance::Stepped, units_remaining);
            }

            if self.current_segment + 1 == self.segments.len() - 1 {
                self.current_t = 1.0;
                return (Advance::Ended, units_remaining);
            }

            self.current_segment += 1;
            self.current_curve = self.segments.segment(self.current_segment);
            self.segment_length_so_far = 0.0;
            self.current_t = 0.0;
            self.last_point_eval = self.current_curve.p0;
            self.current_tangent = tangent;

            return (Advance::NewSegment, units_remaining);
        }
    }

    /// Whether the end of the last curve was reached.
    #[inline]
    pub fn ended(&self) -> bool {
        self.current_t == 1.0 && self.current_segment + 1 == self.segments.len() - 1
    }

    #[inline]
    pub fn closed(&self) -> bool {
        self.closed
    }

    #[inline]
    pub fn segments(&self) -> &SegmentChain<'l> {
        &self.segments
    }

    /// Number of elements in the walked chain, including the closing line if any.
    #[inline]
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    #[inline]
    pub fn current_segment(&self) -> usize {
        self.current_segment
    }

    #[inline]
    pub fn current_curve(&self) -> &BezierSegment {
        &self.current_curve
    }

    #[inline]
    pub fn current_t(&self) -> f32 {
        self.current_t
    }

    /// Distance walked since the start of the contour.
    #[inline]
    pub fn length_so_far(&self) -> f32 {
        self.length_so_far
    }

    /// Distance walked since the start of the current curve.
    #[inline]
    pub fn segment_length_so_far(&self) -> f32 {
        self.segment_length_so_far
    }

    /// Position at the current location.
    #[inline]
    pub fn eval_current(&self) -> Point {
        self.current_curve.sample(self.current_t)
    }
}

#[cfg(test)]
use crate::math::point;

#[cfg(test)]
fn square() -> Vec<BezierPathSegment> {
    let mut path = Vec::new();
    let corners = [point(0.0, 0.0), point(10.0, 0.0), point(10.0, 10.0), point(0.0, 10.0)];
    for i in 0..3 {
        path.extend_from_slice(&make_path_line(corners[i], corners[i + 1])[..1]);
    }
    path.push(BezierPathSegment::end(corners[3]));
    path
}

#[test]
fn not_enough_segments() {
    let path = vec![BezierPathSegment::end(point(0.0, 0.0))];
    let it = PathDistanceIterator::new(&path, false, &SamplingParameters::DEFAULT);
    assert_eq!(it.err(), Some(PathError::NotEnoughSegments));
}

#[test]
fn walk_a_line() {
    let path = make_path_line(point(0.0, 0.0), point(10.0, 0.0));
    let mut it = PathDistanceIterator::new(&path, false, &SamplingParameters::DEFAULT).unwrap();

    let (result, remaining) = it.advance_by(2.5);
    assert_eq!(result, Advance::Stepped);
    assert!(remaining.abs() < 1e-5);
    assert!((it.length_so_far() - 2.5).abs() < 1e-3);
    assert!((it.eval_current() - point(2.5, 0.0)).length() < 1e-3);

    let (result, remaining) = it.advance_by(100.0);
    assert_eq!(result, Advance::Ended);
    assert!((remaining - 92.5).abs() < 1e-2);
    assert!(it.ended());
    assert!((it.length_so_far() - 10.0).abs() < 1e-2);

    let (result, remaining) = it.advance_by(1.0);
    assert_eq!(result, Advance::Ended);
    assert_eq!(remaining, 1.0);
}

#[test]
fn walk_across_segments() {
    let path = square();
    let mut it = PathDistanceIterator::new(&path, false, &SamplingParameters::DEFAULT).unwrap();
    assert_eq!(it.segment_count(), 4);

    let (result, _) = it.advance_by(15.0);
    assert_eq!(result, Advance::NewSegment);
    assert_eq!(it.current_segment(), 1);
    assert_eq!(it.current_t(), 0.0);
    assert!((it.length_so_far() - 10.0).abs() < 1e-2);

    let (result, remaining) = it.advance_by(5.0);
    assert_eq!(result, Advance::Stepped);
    assert!(remaining.abs() < 1e-5);
    assert!((it.eval_current() - point(10.0, 5.0)).length() < 1e-2);
    assert!((it.segment_length_so_far() - 5.0).abs() < 1e-2);
}

#[test]
fn closed_walk_includes_closing_line() {
    let path = square();
    let mut it = PathDistanceIterator::new(&path, true, &SamplingParameters::DEFAULT).unwrap();
    assert_eq!(it.segment_count(), 5);
    assert!(it.segments().has_closing_line());

    let closing = it.segments().segment(3);
    assert_eq!(closing.p0, point(0.0, 10.0));
    assert_eq!(closing.p3, point(0.0, 0.0));

    let mut new_segments = 0;
    loop {
        match it.advance_by(f32::MAX).0 {
            Advance::NewSegment => new_segments += 1,
            Advance::Ended => break,
            Advance::Stepped => {}
        }
    }

    assert_eq!(new_segments, 3);
    assert!((it.length_so_far() - 40.0).abs() < 1e-2);
    assert!((it.eval_current() - point(0.0, 0.0)).length() < 1e-3);
}

#[test]
fn tangent_deviation_splits() {
    let arc = crate::geom::make_arc(point(0.0, 0.0), 0.0, std::f32::consts::FRAC_PI_2);
    let path = crate::path_segments(&arc);
    let params = SamplingParameters {
        max_tan_angle_deviation_cos: 0.1f32.cos(),
        ..SamplingParameters::DEFAULT
    };

    let mut it = PathDistanceIterator::new(&path, false, &params).unwrap();
    let mut steps = 0;
    while it.advance_by(f32::MAX).0 == Advance::Stepped {
        steps += 1;
    }

    // A quarter turn with at most 0.1 radians per step.
    assert!(steps >= 10);
    assert!(it.ended());
}

#[test]
fn steps_stay_close_to_the_curve() {
    let curve = BezierSegment {
        p0: point(0.0, 0.0),
        p1: point(0.0, 100.0),
        p2: point(100.0, 100.0),
        p3: point(100.0, 0.0),
    };
    let path = crate::path_segments(&curve);

    for &max_deviation in &[0.1f32, 0.5, 2.0] {
        let params = SamplingParameters {
            max_cord_deviation_sq: max_deviation * max_deviation,
            ..SamplingParameters::DEFAULT
        };

        let mut it = PathDistanceIterator::new(&path, false, &params).unwrap();
        let mut steps = 0;
        let mut worst: f32 = 0.0;
        let mut t0 = 0.0;
        loop {
            let advance = it.advance_by(f32::MAX).0;
            let t1 = it.current_t();
            let a = curve.sample(t0);
            let b = curve.sample(t1);
            for i in 1..64 {
                let t = t0 + (t1 - t0) * i as f32 / 64.0;
                worst = worst.max(point_to_line_distance_sq(curve.sample(t), a, b).sqrt());
            }

            steps += 1;
            t0 = t1;
            if advance == Advance::Ended {
                break;
            }
        }

        assert!(it.ended());
        assert!(steps > 1);
        assert!(worst <= max_deviation * 1.1 + 0.01, "{} > {}", worst, max_deviation);
    }
}
