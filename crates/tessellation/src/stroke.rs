//! Stroke tessellation.
//!
//! ## Overview
//!
//! The stroke is generated as a strip of quads along the contour. The contour is
//! walked by distance with a [`PathDistanceIterator`] while a [`PatternIterator`]
//! splits the walk into dashes and gaps. Each dash starts and ends with a tip
//! (see [`PathEnding`]) and consecutive curves within a dash are connected with
//! a corner (see [`PathCorner`]).
//!
//! On the inner side of a corner the two offset curves overlap. The tessellator
//! looks ahead at each corner to find where they cross, and pulls the inner
//! vertices that would overshoot back to that crossing point.
//!
//! Like most strip based approaches, self-intersecting contours produce
//! overlapping triangles.

use crate::geom::{
    intersect_lines, is_finite_point, point_on_line_is_within_segment, point_on_the_left_of_line,
    BezierSegment,
};
use crate::math::*;
use crate::path::{segments_lengths, Advance, BezierContour, PathDistanceIterator, PatternIterator};
use crate::{
    PathCorner, PathEnding, StrokeOptions, TessellationOptions, TessellationResult, VertexBuffers,
    EPSILON,
};

use std::f32::consts::{PI, TAU};

/// Precision used when measuring the curves of a contour.
pub(crate) const LENGTH_PRECISION: f32 = 0.001;

/// Upper bound on the number of vertices generated for a single arc.
const MAX_ARC_STEPS: usize = 4096;

/// Tessellates the stroke of a contour into a triangle list.
///
/// Fails if the contour has less than two elements or if the step distance of
/// `options` is invalid.
///
/// ```
/// use quill_tessellation::{tessellate_path, StrokeOptions, TessellationOptions};
/// use quill_tessellation::path::{make_path_line, BezierContour};
/// use quill_tessellation::math::point;
///
/// let contour = BezierContour::new(
///     make_path_line(point(0.0, 0.0), point(100.0, 0.0)).to_vec(),
///     false,
/// );
///
/// let geometry = tessellate_path(
///     &contour,
///     &StrokeOptions::half_thickness(5.0),
///     &TessellationOptions::DEFAULT,
/// ).unwrap();
///
/// assert_eq!(geometry.vertices.len(), 4);
/// assert_eq!(geometry.indices.len(), 6);
/// ```
pub fn tessellate_path(
    contour: &BezierContour,
    stroke: &StrokeOptions,
    options: &TessellationOptions,
) -> TessellationResult<VertexBuffers<Point, u32>> {
    options.validate()?;

    let _span = tracing::debug_span!("tessellate_path", curves = contour.segments.len()).entered();

    let mut path_it =
        PathDistanceIterator::new(&contour.segments, contour.closed, &options.sampling_parameters())?;
    let mut pattern_it = PatternIterator::new(stroke.pattern, stroke.pattern_offset);

    let segment_lengths = segments_lengths(&contour.segments, contour.closed, LENGTH_PRECISION);
    let total_length: f32 = segment_lengths.iter().sum();

    let approx_steps = if options.step_distance() == f32::MAX {
        contour.segments.len() * 4
    } else {
        (total_length / options.step_distance()) as usize + 1
    };
    let approx_steps = (approx_steps + stroke.pattern.len() * 2).min(1 << 16);

    let mut builder = StrokeBuilder {
        stroke,
        options,
        segment_lengths,
        total_length,
        joins: [None, None],
        output: VertexBuffers::with_capacity(approx_steps * 2, approx_steps * 6),
    };

    builder.handle_new_segment_joining(&path_it, &pattern_it);

    let mut range_index = 0;
    while !path_it.ended() {
        let distance = pattern_it.segment_length();
        if pattern_it.is_solid() {
            builder.tessellate_range(distance, &mut path_it, &pattern_it, range_index);
            range_index += 1;
        } else {
            builder.skip_range(distance, &mut path_it, &pattern_it);
        }

        pattern_it.advance();
    }

    tracing::trace!(
        vertices = builder.output.vertices.len(),
        indices = builder.output.indices.len(),
        dashes = range_index,
        "stroke tessellated"
    );

    Ok(builder.output)
}

/// Everything needed to draw the corner between two curves, computed ahead of
/// reaching it.
#[derive(Copy, Clone, Debug)]
struct JoiningInfo {
    join_pos: Point,
    tan_at_end: Vector,
    tan_at_start: Vector,
    norm_at_end: Vector,
    norm_at_start: Vector,
    pos_thickness_start: Point,
    neg_thickness_start: Point,
    pos_thickness_end: Point,
    neg_thickness_end: Point,
    pos_thickness_closing_point: Point,
    neg_thickness_closing_point: Point,
    /// Whether the outer side of the corner is on the positive side of the normal.
    round_pos_thickness: bool,
    inner_corner_vertex: Point,
    inner_corner_dist_to_end: f32,
    inner_corner_dist_from_start: f32,
}

/// Where an offset curve crosses a line.
struct ThicknessTrail {
    from: Point,
    to: Point,
    distance: f32,
    intersection: Point,
}

struct StrokeBuilder<'a, 'l> {
    stroke: &'a StrokeOptions<'l>,
    options: &'a TessellationOptions,
    segment_lengths: Vec<f32>,
    total_length: f32,
    /// The corner at the start of the current curve and the one at its end.
    joins: [Option<JoiningInfo>; 2],
    output: VertexBuffers<Point, u32>,
}

impl<'a, 'l> StrokeBuilder<'a, 'l> {
    #[inline]
    fn vertex_count(&self) -> u32 {
        self.output.vertices.len() as u32
    }

    #[inline]
    fn push_indices(&mut self, base: u32, offsets: &[u32]) {
        self.output.indices.extend(offsets.iter().map(|i| base + i));
    }

    fn tessellate_range(
        &mut self,
        distance: f32,
        path_it: &mut PathDistanceIterator,
        pattern_it: &PatternIterator,
        range_index: usize,
    ) {
        let start_of_loop =
            path_it.closed() && path_it.current_segment() == 0 && path_it.current_t() == 0.0;

        match self.joins[0] {
            Some(join) if start_of_loop => self.generate_joining(&join),
            _ => {
                // The closing corner of a loop that is solid on both ends is
                // stitched at the end, no need for a tip.
                let ending = if path_it.closed()
                    && range_index == 0
                    && pattern_it.is_solid_at(path_it.length_so_far())
                    && pattern_it.is_solid_at(self.total_length)
                {
                    PathEnding::Chop
                } else {
                    self.stroke.head
                };

                self.generate_tip(path_it.current_curve(), true, path_it.current_t(), ending);
            }
        }

        let step = self.options.step_distance();
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
                Advance::NewSegment => {
                    match self.joins[1] {
                        Some(join) => self.generate_joining(&join),
                        None => {
                            let curve = *path_it.current_curve();
                            self.add_segment(&curve, path_it.current_t(), path_it.segment_length_so_far(), false);
                        }
                    }
                    self.handle_new_segment_joining(path_it, pattern_it);
                }
                Advance::Stepped => {}
            }

            if units_remaining <= EPSILON
                && !try_get_more_remaining_units(&mut units_remaining, path_it, start_length, distance, step)
            {
                break;
            }

            if result == Advance::Stepped {
                let curve = *path_it.current_curve();
                self.add_segment(&curve, path_it.current_t(), path_it.segment_length_so_far(), true);
            }
        }

        if ended && path_it.closed() && pattern_it.is_solid_at(0.0) {
            stitch_loop(&mut self.output);
            return;
        }

        let curve = *path_it.current_curve();
        let t = path_it.current_t();
        self.add_segment(&curve, t, path_it.segment_length_so_far(), true);
        self.generate_tip(&curve, false, t, self.stroke.tail);
    }

    fn skip_range(
        &mut self,
        distance: f32,
        path_it: &mut PathDistanceIterator,
        pattern_it: &PatternIterator,
    ) {
        let mut units_remaining = distance;
        while units_remaining > EPSILON {
            let (result, remaining) = path_it.advance_by(units_remaining);
            units_remaining = remaining;
            match result {
                Advance::Ended => return,
                Advance::Stepped if units_remaining < EPSILON => return,
                Advance::NewSegment => self.handle_new_segment_joining(path_it, pattern_it),
                Advance::Stepped => {}
            }
        }
    }

    /// Called each time the walk enters a new curve. Shifts the upcoming corner
    /// into the current one and computes the next one.
    fn handle_new_segment_joining(&mut self, path_it: &PathDistanceIterator, pattern_it: &PatternIterator) {
        self.joins[0] = self.joins[1].take();

        let current = path_it.current_segment();
        if !pattern_it.is_solid_at(path_it.length_so_far() + self.segment_lengths[current]) {
            return;
        }

        let half_thickness = self.stroke.half_thickness;
        let chain = *path_it.segments();
        let count = chain.len();

        if path_it.closed() {
            if current == 0 || current == count - 2 {
                let closing = foresee_joining(
                    &chain.segment(count - 2),
                    &chain.segment(0),
                    half_thickness,
                    self.segment_lengths[count - 2],
                );

                if current == 0 {
                    self.joins[0] = closing;
                } else {
                    self.joins[1] = closing;
                    return;
                }
            } else if current > count - 2 {
                return;
            }
        }

        if current + 2 >= count {
            return;
        }

        self.joins[1] = foresee_joining(
            &chain.segment(current),
            &chain.segment(current + 1),
            half_thickness,
            self.segment_lengths[current],
        );
    }

    /// Adds the cross section of the stroke at `t` and the quad connecting it
    /// to the previous cross section.
    fn add_segment(&mut self, curve: &BezierSegment, t: f32, segment_length_so_far: f32, use_joins: bool) {
        let (pos, _, nrm) = curve.sample_full(t);
        let offset = nrm * self.stroke.half_thickness;
        let mut pos_thickness = pos + offset;
        let mut neg_thickness = pos - offset;

        if use_joins {
            // Inner vertices that would overshoot a corner are pulled back to
            // where the two offset curves cross.
            if let Some(join) = &self.joins[0] {
                if segment_length_so_far < join.inner_corner_dist_from_start {
                    if join.round_pos_thickness {
                        neg_thickness = join.inner_corner_vertex;
                    } else {
                        pos_thickness = join.inner_corner_vertex;
                    }
                }
            }

            if let Some(join) = &self.joins[1] {
                if segment_length_so_far > join.inner_corner_dist_to_end {
                    if join.round_pos_thickness {
                        neg_thickness = join.inner_corner_vertex;
                    } else {
                        pos_thickness = join.inner_corner_vertex;
                    }
                }
            }
        }

        self.output.vertices.push(pos_thickness);
        self.output.vertices.push(neg_thickness);

        if let Some(s) = self.vertex_count().checked_sub(4) {
            self.push_indices(s, &[0, 3, 1, 0, 2, 3]);
        }
    }

    fn generate_joining(&mut self, join: &JoiningInfo) {
        let round = join.round_pos_thickness;

        if self.output.vertices.is_empty() {
            self.output.vertices.push(if round { join.pos_thickness_end } else { join.inner_corner_vertex });
            self.output.vertices.push(if round { join.inner_corner_vertex } else { join.neg_thickness_end });
        }

        let s = self.vertex_count() - 2;

        let mut corners = self.stroke.corners;
        if corners == PathCorner::Tipped && self.stroke.tipped_corner_limit >= 1.0 {
            let theta = (-join.tan_at_end).dot(join.tan_at_start).clamp(-1.0, 1.0).acos();
            let ratio = 1.0 / (theta / 2.0).sin();
            if ratio > self.stroke.tipped_corner_limit {
                corners = PathCorner::Beveled;
            }
        }

        match corners {
            PathCorner::Tipped => {
                self.output.vertices.extend_from_slice(&[
                    join.pos_thickness_closing_point,
                    join.neg_thickness_closing_point,
                    if round { join.pos_thickness_start } else { join.inner_corner_vertex },
                    if round { join.inner_corner_vertex } else { join.neg_thickness_start },
                ]);
                self.push_indices(s, &[0, 3, 1, 0, 2, 3, 4, 3, 2, 4, 5, 3]);
            }
            PathCorner::Beveled => {
                self.output.vertices.extend_from_slice(&[
                    if round { join.pos_thickness_end } else { join.inner_corner_vertex },
                    if round { join.inner_corner_vertex } else { join.neg_thickness_end },
                    if round { join.pos_thickness_start } else { join.inner_corner_vertex },
                    if round { join.inner_corner_vertex } else { join.neg_thickness_start },
                ]);
                self.push_indices(s, &[0, 2, 1, 1, 2, 3]);
                if round {
                    self.push_indices(s, &[2, 4, 3]);
                } else {
                    self.push_indices(s, &[3, 2, 5]);
                }
            }
            PathCorner::Round => {
                let mut sweep = join.norm_at_end.dot(join.norm_at_start).clamp(-1.0, 1.0).acos();
                let mut flip = false;
                if !point_on_the_left_of_line(Point::origin(), join.norm_at_end.to_point(), join.norm_at_start.to_point()) {
                    sweep = -sweep;
                    flip = true;
                }

                let half_thickness = self.stroke.half_thickness;
                let inner_index = self.vertex_count();
                self.output.vertices.push(join.inner_corner_vertex);

                let steps = calculate_arc_steps(half_thickness, 0.0, sweep, self.options);
                for i in 0..=steps {
                    let angle = sweep * i as f32 / steps as f32;
                    let mut nrm = rotate_cw(join.norm_at_end, angle);
                    if flip {
                        nrm = -nrm;
                    }

                    self.output.vertices.push(join.join_pos + nrm * half_thickness);

                    if i == 0 {
                        self.push_indices(s, &[0, 3, if round { 2 } else { 1 }]);
                        self.push_indices(s, &[0, 2, if round { 1 } else { 3 }]);
                    } else {
                        let i = i as u32;
                        let a = s + i + if flip { 3 } else { 2 };
                        let b = s + i + if flip { 2 } else { 3 };
                        self.output.indices.extend_from_slice(&[a, b, inner_index]);
                    }
                }

                let end_index = self.vertex_count();
                if round {
                    self.output.vertices.push(join.pos_thickness_start);
                    self.output.vertices.push(join.inner_corner_vertex);
                } else {
                    self.output.vertices.push(join.inner_corner_vertex);
                    self.output.vertices.push(join.neg_thickness_start);
                }

                self.output.indices.extend_from_slice(&[end_index - 1, end_index, inner_index]);
            }
        }
    }

    fn generate_tip(&mut self, curve: &BezierSegment, at_start: bool, t: f32, ending: PathEnding) {
        let (pos, tan, nrm) = curve.sample_full(t);
        let half_thickness = self.stroke.half_thickness;
        let offset = nrm * half_thickness;
        let start = self.vertex_count();

        if !at_start && start < 2 {
            return;
        }

        match ending {
            PathEnding::Chop => {
                if at_start {
                    self.output.vertices.push(pos + offset);
                    self.output.vertices.push(pos - offset);
                }
            }
            PathEnding::Square => {
                let extension = tan * half_thickness;
                if at_start {
                    self.output.vertices.extend_from_slice(&[
                        pos + offset - extension,
                        pos - offset - extension,
                        pos + offset,
                        pos - offset,
                    ]);
                    self.push_indices(start, &[0, 3, 1, 0, 2, 3]);
                } else {
                    self.output.vertices.push(pos + offset + extension);
                    self.output.vertices.push(pos - offset + extension);
                    self.output.indices.extend_from_slice(&[
                        start - 2,
                        start + 1,
                        start - 1,
                        start - 2,
                        start,
                        start + 1,
                    ]);
                }
            }
            PathEnding::Round => {
                let sign = if at_start { -1.0 } else { 1.0 };
                let steps = calculate_arc_steps(half_thickness, 0.0, PI, self.options) as u32;
                for i in 1..steps {
                    let angle = PI * i as f32 / steps as f32;
                    self.output.vertices.push(pos + rotate_cw(nrm, angle) * half_thickness * sign);
                }

                if at_start {
                    let tip_start = self.vertex_count();
                    self.output.vertices.push(pos + offset);
                    self.output.vertices.push(pos - offset);
                    for i in 1..steps {
                        self.output.indices.extend_from_slice(&[tip_start + 1, start + i - 1, start + i]);
                    }
                } else {
                    self.output.indices.extend_from_slice(&[start - 1, start - 2, start]);
                    for i in 1..steps.saturating_sub(1) {
                        self.output.indices.extend_from_slice(&[start - 1, start + i - 1, start + i]);
                    }
                }
            }
        }
    }
}

/// Number of steps needed to approximate an arc of `radius` between two
/// angles within the tolerances of `options`. Never less than 3.
pub fn calculate_arc_steps(radius: f32, from_angle: f32, to_angle: f32, options: &TessellationOptions) -> usize {
    let mut divisor = f32::MAX;

    if options.step_distance() != f32::MAX {
        divisor = options.step_distance() / radius;
    }

    let max_cord = options.max_cord_deviation();
    if max_cord != f32::MAX {
        let y = radius - max_cord;
        let half_cord = (radius * radius - y * y).sqrt();
        let d = divisor.min((half_cord / radius).asin());
        if d > EPSILON {
            divisor = d;
        }
    }

    let max_tan = options.max_tan_angle_deviation();
    if max_tan < PI / 2.0 {
        divisor = divisor.min(max_tan * 2.0);
    }

    let sweep_pct = (from_angle - to_angle).abs() / TAU;
    let steps = (TAU / divisor * sweep_pct + 0.5) as usize;

    steps.clamp(3, MAX_ARC_STEPS)
}

/// Extends the remaining distance of a dash by one more step when the dash
/// isn't fully walked yet.
pub(crate) fn try_get_more_remaining_units(
    units_remaining: &mut f32,
    path_it: &PathDistanceIterator,
    start_length: f32,
    distance: f32,
    step: f32,
) -> bool {
    let crossed = path_it.length_so_far() - start_length;
    if crossed >= distance - EPSILON * 100.0 {
        return false;
    }

    *units_remaining = if crossed + step > distance { distance - crossed } else { step };

    true
}

/// Rotates `v` clockwise by `angle` radians in a y-up frame.
#[inline]
fn rotate_cw(v: Vector, angle: f32) -> Vector {
    let (s, c) = angle.sin_cos();
    vector(v.x * c + v.y * s, -v.x * s + v.y * c)
}

fn foresee_joining(
    end: &BezierSegment,
    start: &BezierSegment,
    half_thickness: f32,
    end_segment_length: f32,
) -> Option<JoiningInfo> {
    let (join_pos, tan_at_end, norm_at_end) = end.sample_full(1.0);
    let (_, tan_at_start, norm_at_start) = start.sample_full(0.0);

    // Nearly collinear curves don't need a corner.
    if (tan_at_end.dot(tan_at_start).abs() - 1.0).abs() < EPSILON * 10.0 {
        return None;
    }

    let pos_thickness_end = join_pos + norm_at_end * half_thickness;
    let neg_thickness_end = join_pos - norm_at_end * half_thickness;
    let pos_thickness_start = join_pos + norm_at_start * half_thickness;
    let neg_thickness_start = join_pos - norm_at_start * half_thickness;

    let closing_point = |from_end: Point, from_start: Point| {
        let p = intersect_lines(from_end, from_end + tan_at_end, from_start, from_start + tan_at_start);
        if is_finite_point(p) {
            p
        } else {
            join_pos
        }
    };

    let pos_thickness_closing_point = closing_point(pos_thickness_end, pos_thickness_start);
    let neg_thickness_closing_point = closing_point(neg_thickness_end, neg_thickness_start);

    let round_pos_thickness =
        point_on_the_left_of_line(Point::origin(), tan_at_end.to_point(), tan_at_start.to_point());

    // The diagonal going from the corner through its outer tip.
    let meeting = join_pos;
    let outer_closing_point = if round_pos_thickness {
        pos_thickness_closing_point
    } else {
        neg_thickness_closing_point
    };
    let diagonal_end = meeting + (outer_closing_point - meeting) * 10.0;

    let inner_thickness = if round_pos_thickness { -half_thickness } else { half_thickness };
    let start_trail = line_bezier_thickness_intersect(start, inner_thickness, meeting, diagonal_end);
    let end_trail = line_bezier_thickness_intersect(&end.flip(), -inner_thickness, meeting, diagonal_end);

    let mut inner = None;
    if let (Some(start_trail), Some(end_trail)) = (&start_trail, &end_trail) {
        let p = intersect_lines(start_trail.from, start_trail.to, end_trail.from, end_trail.to);
        if is_finite_point(p)
            && point_on_line_is_within_segment(start_trail.from, start_trail.to, p)
            && point_on_line_is_within_segment(end_trail.from, end_trail.to, p)
        {
            let from_start = start_trail.distance + (start_trail.intersection - p).length();
            let to_end = end_segment_length - (end_trail.distance + (end_trail.intersection - p).length());
            inner = Some((p, from_start, to_end));
        }
    }

    let (inner_corner_vertex, inner_corner_dist_from_start, inner_corner_dist_to_end) =
        inner.unwrap_or_else(|| {
            let bisector = ((tan_at_start - tan_at_end) / 2.0).normalize();
            (join_pos + bisector * half_thickness, 0.0, end_segment_length)
        });

    Some(JoiningInfo {
        join_pos,
        tan_at_end,
        tan_at_start,
        norm_at_end,
        norm_at_start,
        pos_thickness_start,
        neg_thickness_start,
        pos_thickness_end,
        neg_thickness_end,
        pos_thickness_closing_point,
        neg_thickness_closing_point,
        round_pos_thickness,
        inner_corner_vertex,
        inner_corner_dist_to_end,
        inner_corner_dist_from_start,
    })
}

/// Walks the curve offset by `thickness` until it crosses the line
/// `line_from`-`line_to`.
fn line_bezier_thickness_intersect(
    curve: &BezierSegment,
    thickness: f32,
    line_from: Point,
    line_to: Point,
) -> Option<ThicknessTrail> {
    let (p0, _, n0) = curve.sample_full(0.0);
    let mut last = p0 + n0 * thickness;
    let mut distance = 0.0;

    for i in 1..=100 {
        let t = i as f32 / 100.0;
        let (pos, _, nrm) = curve.sample_full(t);
        let point = pos + nrm * thickness;

        let intersection = intersect_lines(line_from, line_to, last, point);
        if point_on_line_is_within_segment(last, point, intersection) {
            distance += (last - intersection).length();
            return Some(ThicknessTrail {
                from: last,
                to: point,
                distance,
                intersection,
            });
        }

        distance += (last - point).length();
        last = point;
    }

    None
}

/// Connects the last cross section of a closed stroke to the first one.
/// Needs at least two cross sections.
fn stitch_loop(output: &mut VertexBuffers<Point, u32>) {
    let n = output.vertices.len() as u32;
    if n < 4 {
        return;
    }

    output.indices.extend_from_slice(&[0, 1, n - 2, n - 1, n - 2, 1]);
}

#[cfg(test)]
use crate::path::{make_path_line, BezierPathSegment};

#[cfg(test)]
fn polyline(points: &[Point], closed: bool) -> BezierContour {
    let mut segments = Vec::new();
    for pair in points.windows(2) {
        segments.push(make_path_line(pair[0], pair[1])[0]);
    }
    if let Some(last) = points.last() {
        segments.push(BezierPathSegment::end(*last));
    }

    BezierContour::new(segments, closed)
}

#[cfg(test)]
fn check_indices(geometry: &VertexBuffers<Point, u32>) {
    assert_eq!(geometry.indices.len() % 3, 0);
    let n = geometry.vertices.len() as u32;
    for idx in &geometry.indices {
        assert!(*idx < n, "index {} out of {} vertices", idx, n);
    }
}

#[cfg(test)]
fn has_vertex(geometry: &VertexBuffers<Point, u32>, p: Point, tolerance: f32) -> bool {
    geometry.vertices.iter().any(|v| (*v - p).length() < tolerance)
}

#[test]
fn straight_line() {
    let contour = polyline(&[point(0.0, 0.0), point(100.0, 0.0)], false);
    let geometry = tessellate_path(
        &contour,
        &StrokeOptions::half_thickness(5.0),
        &TessellationOptions::DEFAULT,
    )
    .unwrap();

    assert_eq!(geometry.vertices.len(), 4);
    assert_eq!(geometry.indices.len(), 6);
    check_indices(&geometry);

    assert!(has_vertex(&geometry, point(0.0, 5.0), 1e-3));
    assert!(has_vertex(&geometry, point(0.0, -5.0), 1e-3));
    assert!(has_vertex(&geometry, point(100.0, 5.0), 1e-3));
    assert!(has_vertex(&geometry, point(100.0, -5.0), 1e-3));
}

#[test]
fn step_distance_subdivides_lines() {
    let contour = polyline(&[point(0.0, 0.0), point(10.0, 0.0)], false);
    let options = TessellationOptions::DEFAULT.with_step_distance(3.0);
    let geometry = tessellate_path(&contour, &StrokeOptions::DEFAULT, &options).unwrap();

    assert_eq!(geometry.vertices.len(), 10);
    assert_eq!(geometry.indices.len(), 24);
    check_indices(&geometry);
}

#[test]
fn square_endings() {
    let contour = polyline(&[point(0.0, 0.0), point(10.0, 0.0)], false);
    let stroke = StrokeOptions::half_thickness(1.0).with_endings(PathEnding::Square);
    let geometry = tessellate_path(&contour, &stroke, &TessellationOptions::DEFAULT).unwrap();

    check_indices(&geometry);
    assert!(has_vertex(&geometry, point(-1.0, 1.0), 1e-3));
    assert!(has_vertex(&geometry, point(-1.0, -1.0), 1e-3));
    assert!(has_vertex(&geometry, point(11.0, 1.0), 1e-3));
    assert!(has_vertex(&geometry, point(11.0, -1.0), 1e-3));
}

#[test]
fn round_endings() {
    let contour = polyline(&[point(0.0, 0.0), point(10.0, 0.0)], false);
    let stroke = StrokeOptions::half_thickness(1.0).with_endings(PathEnding::Round);
    let geometry = tessellate_path(&contour, &stroke, &TessellationOptions::DEFAULT).unwrap();

    check_indices(&geometry);
    assert!(geometry.vertices.len() > 8);
    assert!(has_vertex(&geometry, point(-1.0, 0.0), 1e-3));
    assert!(has_vertex(&geometry, point(11.0, 0.0), 1e-3));

    for v in &geometry.vertices {
        let closest = point(v.x.max(0.0).min(10.0), 0.0);
        assert!((*v - closest).length() <= 1.0 + 1e-3);
    }
}

#[test]
fn tipped_corner() {
    let contour = polyline(&[point(0.0, 0.0), point(10.0, 0.0), point(10.0, 10.0)], false);
    let stroke = StrokeOptions::half_thickness(1.0);
    let geometry = tessellate_path(&contour, &stroke, &TessellationOptions::DEFAULT).unwrap();

    check_indices(&geometry);
    assert_eq!(geometry.vertices.len(), 8);
    assert_eq!(geometry.indices.len(), 18);
    // Outer tip and inner crossing.
    assert!(has_vertex(&geometry, point(11.0, -1.0), 1e-3));
    assert!(has_vertex(&geometry, point(9.0, 1.0), 1e-2));
}

#[test]
fn beveled_corner() {
    let contour = polyline(&[point(0.0, 0.0), point(10.0, 0.0), point(10.0, 10.0)], false);

    let bevel = StrokeOptions::half_thickness(1.0).with_corners(PathCorner::Beveled);
    let geometry = tessellate_path(&contour, &bevel, &TessellationOptions::DEFAULT).unwrap();
    check_indices(&geometry);
    assert!(!has_vertex(&geometry, point(11.0, -1.0), 1e-2));
    assert!(has_vertex(&geometry, point(10.0, -1.0), 1e-3));
    assert!(has_vertex(&geometry, point(11.0, 0.0), 1e-3));

    // A right angle extrudes by sqrt(2), past a limit of 1.2.
    let limited = StrokeOptions::half_thickness(1.0).with_tipped_corner_limit(1.2);
    let geometry = tessellate_path(&contour, &limited, &TessellationOptions::DEFAULT).unwrap();
    assert!(!has_vertex(&geometry, point(11.0, -1.0), 1e-2));
}

#[test]
fn round_corner() {
    let contour = polyline(&[point(0.0, 0.0), point(10.0, 0.0), point(10.0, 10.0)], false);
    let stroke = StrokeOptions::half_thickness(1.0).with_corners(PathCorner::Round);
    let geometry = tessellate_path(&contour, &stroke, &TessellationOptions::DEFAULT).unwrap();

    check_indices(&geometry);
    assert!(geometry.vertices.len() > 8);
    // The arc stays on the circle around the corner.
    let corner = point(10.0, 0.0);
    let outer: Vec<&Point> = geometry
        .vertices
        .iter()
        .filter(|v| v.x > 10.0 + 1e-3 && v.y < -1e-3)
        .collect();
    assert!(!outer.is_empty());
    for v in outer {
        assert!(((*v - corner).length() - 1.0).abs() < 1e-3);
    }
}

#[test]
fn closed_square() {
    let contour = polyline(
        &[point(0.0, 0.0), point(10.0, 0.0), point(10.0, 10.0), point(0.0, 10.0)],
        true,
    );
    let stroke = StrokeOptions::half_thickness(1.0);
    let geometry = tessellate_path(&contour, &stroke, &TessellationOptions::DEFAULT).unwrap();

    check_indices(&geometry);
    assert!(!geometry.indices.is_empty());
    // All four outer tips are present.
    assert!(has_vertex(&geometry, point(-1.0, -1.0), 1e-3) || has_vertex(&geometry, point(-1.0, 11.0), 1e-3));
    assert!(has_vertex(&geometry, point(11.0, -1.0), 1e-3) || has_vertex(&geometry, point(11.0, 11.0), 1e-3));
    for v in &geometry.vertices {
        assert!(v.x >= -1.0 - 1e-3 && v.x <= 11.0 + 1e-3);
        assert!(v.y >= -1.0 - 1e-3 && v.y <= 11.0 + 1e-3);
    }
}

#[test]
fn dashed_line() {
    let contour = polyline(&[point(0.0, 0.0), point(90.0, 0.0)], false);
    let pattern = [10.0, 15.0];
    let stroke = StrokeOptions::half_thickness(1.0).with_pattern(&pattern, 0.0);
    let geometry = tessellate_path(&contour, &stroke, &TessellationOptions::DEFAULT).unwrap();

    check_indices(&geometry);
    // Dashes at 0-10, 25-35, 50-60 and 75-85.
    assert_eq!(geometry.vertices.len(), 16);
    assert_eq!(geometry.indices.len(), 24);
    for x in &[0.0, 10.0, 25.0, 35.0, 50.0, 60.0, 75.0, 85.0] {
        assert!(has_vertex(&geometry, point(*x, 1.0), 1e-2), "missing dash end at {}", x);
    }
    for v in &geometry.vertices {
        assert!(!(v.x > 10.1 && v.x < 24.9));
    }
}

#[test]
fn curved_stroke_stays_on_the_offset_curves() {
    let arc = crate::geom::make_arc(point(0.0, 0.0), 0.0, PI / 2.0);
    let arc = arc.transformed(&Transform::scale(10.0, 10.0));
    let contour = BezierContour::new(crate::path::path_segments(&arc).to_vec(), false);
    let stroke = StrokeOptions::half_thickness(1.0);
    let geometry = tessellate_path(&contour, &stroke, &TessellationOptions::DEFAULT).unwrap();

    check_indices(&geometry);
    assert!(geometry.vertices.len() > 4);
    for v in &geometry.vertices {
        let r = v.to_vector().length();
        assert!((r - 9.0).abs() < 0.05 || (r - 11.0).abs() < 0.05, "radius {}", r);
    }
}

#[test]
fn invalid_inputs() {
    let contour = polyline(&[point(0.0, 0.0), point(10.0, 0.0)], false);
    let options = TessellationOptions::DEFAULT.with_step_distance(0.0);
    assert!(matches!(
        tessellate_path(&contour, &StrokeOptions::DEFAULT, &options),
        Err(crate::TessellationError::InvalidStepDistance { .. })
    ));

    let single = BezierContour::new(vec![BezierPathSegment::end(point(0.0, 0.0))], false);
    assert!(matches!(
        tessellate_path(&single, &StrokeOptions::DEFAULT, &TessellationOptions::DEFAULT),
        Err(crate::TessellationError::Path(_))
    ));
}

#[test]
fn arc_steps() {
    let options = TessellationOptions::DEFAULT;
    // The tangent budget of 0.1 radians allows 0.2 radians per step.
    assert_eq!(calculate_arc_steps(1.0, 0.0, PI, &options), 16);
    assert_eq!(calculate_arc_steps(1.0, 0.0, 0.01, &options), 3);

    let coarse = TessellationOptions::DEFAULT
        .with_max_tan_angle_deviation(PI / 2.0)
        .with_max_cord_deviation(f32::MAX);
    assert_eq!(calculate_arc_steps(1.0, 0.0, PI, &coarse), 3);

    let stepped = coarse.with_step_distance(0.5);
    // Half a turn of radius 2 is about 6.28 units long.
    assert_eq!(calculate_arc_steps(2.0, PI, 0.0, &stepped), 13);
}

#[test]
fn loop_stitching() {
    let mut geometry: VertexBuffers<Point, u32> = VertexBuffers::new();
    geometry.vertices.extend_from_slice(&[point(0.0, 0.0), point(0.0, 1.0)]);
    stitch_loop(&mut geometry);
    assert!(geometry.indices.is_empty());

    geometry.vertices.extend_from_slice(&[point(1.0, 0.0), point(1.0, 1.0)]);
    stitch_loop(&mut geometry);
    assert_eq!(geometry.indices, vec![0, 1, 2, 3, 2, 1]);
    check_indices(&geometry);
}
