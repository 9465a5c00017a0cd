//! Tracing the outline of a contour as a polygon.

use crate::math::Point;
use crate::path::{segments_length, Advance, BezierContour, PathDistanceIterator, PatternIterator};
use crate::stroke::{try_get_more_remaining_units, LENGTH_PRECISION};
use crate::{TessellationOptions, TessellationResult, EPSILON};

/// Approximates a contour with a closed polygon.
///
/// The contour is always treated as closed. A vertex is emitted at every
/// curve boundary, wherever the sampling tolerances require one, every
/// `step_distance` units, and at each boundary between the runs of
/// `pattern`. The last vertex is dropped when it lands on the first one.
pub fn trace_shape(
    contour: &BezierContour,
    pattern: &[f32],
    pattern_offset: f32,
    options: &TessellationOptions,
) -> TessellationResult<Vec<Point>> {
    options.validate()?;

    let _span = tracing::debug_span!("trace_shape", curves = contour.segments.len()).entered();

    let mut path_it =
        PathDistanceIterator::new(&contour.segments, true, &options.sampling_parameters())?;
    let mut pattern_it = PatternIterator::new(pattern, pattern_offset);

    let step = options.step_distance();
    let approx_steps = if step == f32::MAX {
        contour.segments.len() * 4
    } else {
        let total_length = segments_length(&contour.segments, true, LENGTH_PRECISION);
        (total_length / step + 0.5) as usize
    };
    let capacity = (approx_steps + pattern.len() * 2).clamp(2, 1 << 16);

    let mut vertices = Vec::with_capacity(capacity);
    vertices.push(path_it.eval_current());

    while !path_it.ended() {
        let distance = pattern_it.segment_length();
        let start_length = path_it.length_so_far();
        let mut units_remaining = step.min(distance);
        let mut ended = false;

        loop {
            let (result, remaining) = path_it.advance_by(units_remaining);
            units_remaining = remaining;

            match result {
                Advance::Ended => {
                    ended = true;
                    break;
                }
                Advance::NewSegment => vertices.push(path_it.eval_current()),
                Advance::Stepped => {}
            }

            if units_remaining <= EPSILON
                && !try_get_more_remaining_units(&mut units_remaining, &path_it, start_length, distance, step)
            {
                break;
            }

            if result == Advance::Stepped {
                vertices.push(path_it.eval_current());
            }
        }

        if ended {
            break;
        }

        vertices.push(path_it.eval_current());
        pattern_it.advance();
    }

    let n = vertices.len();
    if n > 1 && (vertices[0] - vertices[n - 1]).square_length() < EPSILON {
        vertices.pop();
    }

    Ok(vertices)
}

#[cfg(test)]
use crate::math::point;
#[cfg(test)]
use crate::path::{make_path_line, BezierPathSegment};

#[cfg(test)]
fn square_contour() -> BezierContour {
    let corners = [point(0.0, 0.0), point(10.0, 0.0), point(10.0, 10.0), point(0.0, 10.0)];
    let mut segments = Vec::new();
    for i in 0..3 {
        segments.push(make_path_line(corners[i], corners[i + 1])[0]);
    }
    segments.push(BezierPathSegment::end(corners[3]));

    BezierContour::new(segments, true)
}

#[test]
fn trace_square() {
    let polygon = trace_shape(&square_contour(), &[], 0.0, &TessellationOptions::DEFAULT).unwrap();
    assert_eq!(polygon.len(), 4);
    assert_eq!(polygon[0], point(0.0, 0.0));
    assert!((polygon[1] - point(10.0, 0.0)).length() < 1e-4);
    assert!((polygon[2] - point(10.0, 10.0)).length() < 1e-4);
    assert!((polygon[3] - point(0.0, 10.0)).length() < 1e-4);
}

#[test]
fn trace_with_steps() {
    let options = TessellationOptions::DEFAULT.with_step_distance(7.0);
    let polygon = trace_shape(&square_contour(), &[], 0.0, &options).unwrap();
    // The start, the three corners and every 7 units along the perimeter of 40.
    assert_eq!(polygon.len(), 9);
    for v in &polygon {
        assert!(v.x >= -1e-4 && v.x <= 10.0 + 1e-4);
        assert!(v.y >= -1e-4 && v.y <= 10.0 + 1e-4);
    }
}

#[test]
fn trace_circle_closes_without_duplicate() {
    let arcs = crate::geom::make_arc_segments(point(0.0, 0.0), 0.0, std::f32::consts::TAU);
    let mut segments: Vec<BezierPathSegment> = arcs
        .iter()
        .map(|arc| BezierPathSegment { p0: arc.p0, p1: arc.p1, p2: arc.p2 })
        .collect();
    segments.push(BezierPathSegment::end(arcs[0].p0));
    let contour = BezierContour::new(segments, true);
    let contour = contour.transformed(&crate::math::Transform::scale(20.0, 20.0));

    let polygon = trace_shape(&contour, &[], 0.0, &TessellationOptions::DEFAULT).unwrap();
    assert!(polygon.len() > 8);
    assert!((polygon[0] - *polygon.last().unwrap()).length() > 1e-3);
    for v in &polygon {
        assert!((v.to_vector().length() - 20.0).abs() < 0.05);
    }
}

#[test]
fn trace_too_short() {
    let contour = BezierContour::new(vec![BezierPathSegment::end(point(1.0, 1.0))], true);
    assert!(trace_shape(&contour, &[], 0.0, &TessellationOptions::DEFAULT).is_err());
}
