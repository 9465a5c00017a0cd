use crate::path::SamplingParameters;
use crate::{TessellationError, EPSILON};

/// Controls the quality of the generated geometry.
///
/// The setters clamp their input to the valid range so that the options are
/// always usable, with the exception of the step distance, which is validated
/// when tessellating.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(Serialize, Deserialize),
    serde(from = "TessellationSettings", into = "TessellationSettings")
)]
pub struct TessellationOptions {
    step_distance: f32,
    max_cord_deviation: f32,
    max_cord_deviation_sq: f32,
    max_tan_angle_deviation: f32,
    max_tan_angle_deviation_cos: f32,
    sampling_step_size: f32,
}

impl TessellationOptions {
    pub const DEFAULT_STEP_DISTANCE: f32 = f32::MAX;
    pub const DEFAULT_MAX_CORD_DEVIATION: f32 = 0.5;
    pub const DEFAULT_MAX_TAN_ANGLE_DEVIATION: f32 = 0.1;
    pub const DEFAULT_SAMPLING_STEP_SIZE: f32 = 0.01;

    pub const DEFAULT: Self = TessellationOptions {
        step_distance: Self::DEFAULT_STEP_DISTANCE,
        max_cord_deviation: Self::DEFAULT_MAX_CORD_DEVIATION,
        max_cord_deviation_sq: 0.25,
        max_tan_angle_deviation: Self::DEFAULT_MAX_TAN_ANGLE_DEVIATION,
        // cos(0.1)
        max_tan_angle_deviation_cos: 0.995_004_2,
        sampling_step_size: Self::DEFAULT_SAMPLING_STEP_SIZE,
    };

    /// Distance between two vertices emitted along a straight stretch.
    ///
    /// `f32::MAX` only emits vertices where the curvature requires it.
    #[inline]
    pub fn step_distance(&self) -> f32 {
        self.step_distance
    }

    #[inline]
    pub fn max_cord_deviation(&self) -> f32 {
        self.max_cord_deviation
    }

    #[inline]
    pub fn max_tan_angle_deviation(&self) -> f32 {
        self.max_tan_angle_deviation
    }

    #[inline]
    pub fn sampling_step_size(&self) -> f32 {
        self.sampling_step_size
    }

    pub fn set_step_distance(&mut self, distance: f32) {
        self.step_distance = distance;
    }

    /// Maximum distance between a curve and its approximation.
    ///
    /// `f32::MAX` disables the check. Negative values are clamped to zero.
    pub fn set_max_cord_deviation(&mut self, deviation: f32) {
        self.max_cord_deviation = deviation.max(0.0);
        self.max_cord_deviation_sq = if self.max_cord_deviation == f32::MAX {
            f32::MAX
        } else {
            self.max_cord_deviation * self.max_cord_deviation
        };
    }

    /// Maximum angle in radians between the tangents at both ends of an approximated
    /// stretch, clamped between `EPSILON` and a quarter turn.
    pub fn set_max_tan_angle_deviation(&mut self, angle: f32) {
        self.max_tan_angle_deviation = angle.clamp(EPSILON, std::f32::consts::FRAC_PI_2);
        self.max_tan_angle_deviation_cos = self.max_tan_angle_deviation.cos();
    }

    /// Parametric step used to sample curves, clamped between `EPSILON` and 1.
    pub fn set_sampling_step_size(&mut self, step: f32) {
        self.sampling_step_size = step.clamp(EPSILON, 1.0);
    }

    #[inline]
    pub fn with_step_distance(mut self, distance: f32) -> Self {
        self.set_step_distance(distance);
        self
    }

    #[inline]
    pub fn with_max_cord_deviation(mut self, deviation: f32) -> Self {
        self.set_max_cord_deviation(deviation);
        self
    }

    #[inline]
    pub fn with_max_tan_angle_deviation(mut self, angle: f32) -> Self {
        self.set_max_tan_angle_deviation(angle);
        self
    }

    #[inline]
    pub fn with_sampling_step_size(mut self, step: f32) -> Self {
        self.set_sampling_step_size(step);
        self
    }

    /// The parameters for walking contours with these options.
    pub fn sampling_parameters(&self) -> SamplingParameters {
        SamplingParameters {
            max_cord_deviation_sq: self.max_cord_deviation_sq,
            max_tan_angle_deviation_cos: self.max_tan_angle_deviation_cos,
            step_size_t: self.sampling_step_size,
        }
    }

    pub(crate) fn validate(&self) -> Result<(), TessellationError> {
        if self.step_distance < EPSILON || self.step_distance.is_nan() {
            return Err(TessellationError::InvalidStepDistance {
                value: self.step_distance,
                min: EPSILON,
            });
        }

        Ok(())
    }
}

impl Default for TessellationOptions {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Plain representation of [`TessellationOptions`] used for serialization.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct TessellationSettings {
    pub step_distance: f32,
    pub max_cord_deviation: f32,
    pub max_tan_angle_deviation: f32,
    pub sampling_step_size: f32,
}

impl From<TessellationSettings> for TessellationOptions {
    fn from(settings: TessellationSettings) -> Self {
        TessellationOptions::DEFAULT
            .with_step_distance(settings.step_distance)
            .with_max_cord_deviation(settings.max_cord_deviation)
            .with_max_tan_angle_deviation(settings.max_tan_angle_deviation)
            .with_sampling_step_size(settings.sampling_step_size)
    }
}

impl From<TessellationOptions> for TessellationSettings {
    fn from(options: TessellationOptions) -> Self {
        TessellationSettings {
            step_distance: options.step_distance,
            max_cord_deviation: options.max_cord_deviation,
            max_tan_angle_deviation: options.max_tan_angle_deviation,
            sampling_step_size: options.sampling_step_size,
        }
    }
}

/// How the ends of a stroke are drawn.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum PathEnding {
    /// The stroke stops exactly at the end of the path.
    Chop,
    /// The stroke extends past the end of the path by half its thickness.
    Square,
    /// The stroke ends with a half disc.
    Round,
}

/// How two consecutive curves of a stroke are joined.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum PathCorner {
    /// A sharp corner, falling back to a bevel past the tipped corner limit.
    Tipped,
    Round,
    Beveled,
}

/// Parameters of the stroke tessellator.
#[derive(Copy, Clone, Debug, PartialEq)]
#[non_exhaustive]
pub struct StrokeOptions<'l> {
    /// Half of the width of the stroke.
    ///
    /// Default value: `StrokeOptions::DEFAULT_HALF_THICKNESS`.
    pub half_thickness: f32,

    /// Dash pattern, alternating dashes and gaps. Empty means solid.
    ///
    /// Default value: empty.
    pub pattern: &'l [f32],

    /// Distance into the pattern where the stroke starts.
    ///
    /// Default value: 0.
    pub pattern_offset: f32,

    /// How far tipped corners may extrude relative to the half thickness
    /// before being beveled. Values below 1 never bevel.
    ///
    /// Default value: `StrokeOptions::DEFAULT_TIPPED_CORNER_LIMIT`.
    pub tipped_corner_limit: f32,

    /// Default value: `PathEnding::Chop`.
    pub head: PathEnding,

    /// Default value: `PathEnding::Chop`.
    pub tail: PathEnding,

    /// Default value: `PathCorner::Tipped`.
    pub corners: PathCorner,
}

impl<'l> StrokeOptions<'l> {
    pub const DEFAULT_HALF_THICKNESS: f32 = 0.5;
    pub const DEFAULT_TIPPED_CORNER_LIMIT: f32 = 4.0;

    pub const DEFAULT: Self = StrokeOptions {
        half_thickness: Self::DEFAULT_HALF_THICKNESS,
        pattern: &[],
        pattern_offset: 0.0,
        tipped_corner_limit: Self::DEFAULT_TIPPED_CORNER_LIMIT,
        head: PathEnding::Chop,
        tail: PathEnding::Chop,
        corners: PathCorner::Tipped,
    };

    #[inline]
    pub fn half_thickness(half_thickness: f32) -> Self {
        Self::DEFAULT.with_half_thickness(half_thickness)
    }

    #[inline]
    pub const fn with_half_thickness(mut self, half_thickness: f32) -> Self {
        self.half_thickness = half_thickness;
        self
    }

    #[inline]
    pub const fn with_pattern(mut self, pattern: &'l [f32], offset: f32) -> Self {
        self.pattern = pattern;
        self.pattern_offset = offset;
        self
    }

    #[inline]
    pub const fn with_tipped_corner_limit(mut self, limit: f32) -> Self {
        self.tipped_corner_limit = limit;
        self
    }

    #[inline]
    pub const fn with_endings(mut self, ending: PathEnding) -> Self {
        self.head = ending;
        self.tail = ending;
        self
    }

    #[inline]
    pub const fn with_head(mut self, ending: PathEnding) -> Self {
        self.head = ending;
        self
    }

    #[inline]
    pub const fn with_tail(mut self, ending: PathEnding) -> Self {
        self.tail = ending;
        self
    }

    #[inline]
    pub const fn with_corners(mut self, corners: PathCorner) -> Self {
        self.corners = corners;
        self
    }
}

impl<'l> Default for StrokeOptions<'l> {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[test]
fn options_are_clamped() {
    let options = TessellationOptions::DEFAULT
        .with_max_tan_angle_deviation(10.0)
        .with_sampling_step_size(-1.0)
        .with_max_cord_deviation(-2.0);

    assert_eq!(options.max_tan_angle_deviation(), std::f32::consts::FRAC_PI_2);
    assert_eq!(options.sampling_step_size(), EPSILON);
    assert_eq!(options.max_cord_deviation(), 0.0);

    let params = options.sampling_parameters();
    assert!(params.max_tan_angle_deviation_cos.abs() < 1e-6);
}

#[test]
fn default_options_are_consistent() {
    let defaults = TessellationOptions::DEFAULT;
    let recomputed = TessellationOptions::DEFAULT
        .with_max_cord_deviation(TessellationOptions::DEFAULT_MAX_CORD_DEVIATION)
        .with_max_tan_angle_deviation(TessellationOptions::DEFAULT_MAX_TAN_ANGLE_DEVIATION);

    let a = defaults.sampling_parameters();
    let b = recomputed.sampling_parameters();
    assert_eq!(a.max_cord_deviation_sq, b.max_cord_deviation_sq);
    assert!((a.max_tan_angle_deviation_cos - b.max_tan_angle_deviation_cos).abs() < 1e-6);
}

#[test]
fn step_distance_validation() {
    assert!(TessellationOptions::DEFAULT.validate().is_ok());
    let options = TessellationOptions::DEFAULT.with_step_distance(0.0);
    assert_eq!(
        options.validate(),
        Err(TessellationError::InvalidStepDistance { value: 0.0, min: EPSILON })
    );
}
