use std::ops::Mul;

/// An RGBA8 pixel.
pub type Rgba8 = [u8; 4];

/// A linear RGBA color with f32 components, nominally in `[0, 1]`.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Self = Color::new(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Self = Color::new(0.0, 0.0, 0.0, 1.0);
    pub const TRANSPARENT: Self = Color::new(0.0, 0.0, 0.0, 0.0);

    #[inline]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Color { r, g, b, a }
    }

    #[inline]
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Color { r, g, b, a: 1.0 }
    }

    #[inline]
    pub fn with_alpha(mut self, a: f32) -> Self {
        self.a = a;
        self
    }

    /// Linear interpolation, `t = 0` gives `self`.
    pub fn lerp(&self, other: &Color, t: f32) -> Color {
        Color {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
            a: self.a + (other.a - self.a) * t,
        }
    }

    /// Quantizes the color, clamping each component to `[0, 1]`.
    pub fn to_rgba8(&self) -> Rgba8 {
        [
            to_byte(self.r),
            to_byte(self.g),
            to_byte(self.b),
            to_byte(self.a),
        ]
    }

    pub fn from_rgba8(c: Rgba8) -> Self {
        Color {
            r: c[0] as f32 / 255.0,
            g: c[1] as f32 / 255.0,
            b: c[2] as f32 / 255.0,
            a: c[3] as f32 / 255.0,
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::WHITE
    }
}

/// Component-wise product, used to tint colors.
impl Mul for Color {
    type Output = Color;
    fn mul(self, other: Color) -> Color {
        Color {
            r: self.r * other.r,
            g: self.g * other.g,
            b: self.b * other.b,
            a: self.a * other.a,
        }
    }
}

#[inline]
pub(crate) fn to_byte(v: f32) -> u8 {
    (v.max(0.0).min(1.0) * 255.0 + 0.5) as u8
}

#[test]
fn quantize() {
    assert_eq!(Color::WHITE.to_rgba8(), [255, 255, 255, 255]);
    assert_eq!(Color::new(0.5, -1.0, 2.0, 0.0).to_rgba8(), [128, 0, 255, 0]);
    assert_eq!(Color::from_rgba8([255, 0, 255, 0]), Color::new(1.0, 0.0, 1.0, 0.0));
}

#[test]
fn tint_and_lerp() {
    let c = Color::new(1.0, 0.5, 0.25, 1.0) * Color::new(0.5, 0.5, 1.0, 0.5);
    assert_eq!(c, Color::new(0.5, 0.25, 0.25, 0.5));
    assert_eq!(Color::BLACK.lerp(&Color::WHITE, 0.5), Color::new(0.5, 0.5, 0.5, 1.0));
}
