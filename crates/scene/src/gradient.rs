//! Sampling and rasterizing gradients.

use crate::color::{Color, Rgba8};
use crate::math::*;
use crate::scene::{AddressMode, GradientFill, GradientStop, GradientType};
use crate::EPSILON;

/// The color of a gradient at `u`.
///
/// Colors are interpolated linearly between the two stops surrounding `u`,
/// and are those of the first and last stops before and after them. An empty
/// gradient is white. Stops must be sorted by offset.
pub fn sample_gradient(stops: &[GradientStop], u: f32) -> Color {
    let (first, last) = match (stops.first(), stops.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Color::WHITE,
    };

    if u <= first.offset {
        return first.color;
    }
    if u >= last.offset {
        return last.color;
    }

    for pair in stops.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        if u >= a.offset && u <= b.offset {
            let span = b.offset - a.offset;
            if span <= EPSILON {
                return b.color;
            }
            return a.color.lerp(&b.color, (u - a.offset) / span);
        }
    }

    last.color
}

/// Maps a gradient or texture coordinate into `[0, 1]`.
pub fn address(mode: AddressMode, u: f32) -> f32 {
    match mode {
        AddressMode::Wrap => u - u.floor(),
        AddressMode::Clamp => u.max(0.0).min(1.0),
        AddressMode::Mirror => {
            let m = u.abs() % 2.0;
            if m > 1.0 {
                2.0 - m
            } else {
                m
            }
        }
    }
}

/// The parameter of a radial gradient at `uv`, in the unit circle space where
/// the gradient circle has a radius of 1.
///
/// The ray from `focus` through `uv` leaves the circle at some point; the
/// result is the position of `uv` between the focus (0) and that point (1),
/// measured along the axis where they are the furthest apart. At the focus,
/// the result is 0.
pub fn radial_address(uv: Point, focus: Point) -> f32 {
    let dir = uv - focus;
    let len_sq = dir.square_length();
    if len_sq <= EPSILON * EPSILON {
        return 0.0;
    }

    // |focus + t * dir| = 1
    let f = focus.to_vector();
    let a = len_sq;
    let b = 2.0 * f.dot(dir);
    let c = f.square_length() - 1.0;
    let discriminant = (b * b - 4.0 * a * c).max(0.0);
    let t = (-b + discriminant.sqrt()) / (2.0 * a);
    if t <= EPSILON {
        // The focus is outside of the circle and the ray doesn't cross it.
        return 1.0;
    }

    let exit = focus + dir * t;
    let span = exit - focus;
    if span.x.abs() >= span.y.abs() {
        (uv.x - focus.x) / span.x
    } else {
        (uv.y - focus.y) / span.y
    }
}

/// Rasterizes the color ramp of a gradient into a `width` x 1 stripe.
///
/// The stripe doesn't depend on the gradient's type or addressing, these are
/// left to the renderer.
pub fn rasterize_gradient_stripe(fill: &GradientFill, width: u32) -> Vec<Rgba8> {
    let last = (width.max(2) - 1) as f32;
    (0..width)
        .map(|x| sample_gradient(&fill.stops, x as f32 / last).to_rgba8())
        .collect()
}

/// Rasterizes a gradient into a `width` x `height` row-major image.
///
/// Pixels are sampled at their centers. The first row is the top of the
/// gradient's box, where the unit circle space of radial gradients has y = 1.
pub fn rasterize_gradient(fill: &GradientFill, width: u32, height: u32) -> Vec<Rgba8> {
    let mut pixels = Vec::with_capacity((width * height) as usize);
    if width == 0 || height == 0 {
        return pixels;
    }

    match fill.gradient_type {
        GradientType::Linear => {
            let row: Vec<Rgba8> = (0..width)
                .map(|x| {
                    let u = address(fill.addressing, (x as f32 + 0.5) / width as f32);
                    sample_gradient(&fill.stops, u).to_rgba8()
                })
                .collect();

            for _ in 0..height {
                pixels.extend_from_slice(&row);
            }
        }
        GradientType::Radial => {
            for y in 0..height {
                let v = 1.0 - (y as f32 + 0.5) / height as f32 * 2.0;
                for x in 0..width {
                    let u = (x as f32 + 0.5) / width as f32 * 2.0 - 1.0;
                    let t = address(fill.addressing, radial_address(point(u, v), fill.radial_focus));
                    pixels.push(sample_gradient(&fill.stops, t).to_rgba8());
                }
            }
        }
    }

    pixels
}

#[cfg(test)]
fn black_to_white() -> Vec<GradientStop> {
    vec![
        GradientStop::new(0.0, Color::BLACK),
        GradientStop::new(1.0, Color::WHITE),
    ]
}

#[test]
fn sampling() {
    let stops = vec![
        GradientStop::new(0.25, Color::new(1.0, 0.0, 0.0, 1.0)),
        GradientStop::new(0.75, Color::new(0.0, 0.0, 1.0, 1.0)),
    ];

    assert_eq!(sample_gradient(&stops, 0.0), Color::new(1.0, 0.0, 0.0, 1.0));
    assert_eq!(sample_gradient(&stops, -3.0), Color::new(1.0, 0.0, 0.0, 1.0));
    assert_eq!(sample_gradient(&stops, 1.0), Color::new(0.0, 0.0, 1.0, 1.0));
    assert_eq!(sample_gradient(&stops, 0.5), Color::new(0.5, 0.0, 0.5, 1.0));
    assert_eq!(sample_gradient(&[], 0.5), Color::WHITE);

    let hard = vec![
        GradientStop::new(0.0, Color::BLACK),
        GradientStop::new(0.5, Color::BLACK),
        GradientStop::new(0.5, Color::WHITE),
        GradientStop::new(1.0, Color::WHITE),
    ];
    assert_eq!(sample_gradient(&hard, 0.25), Color::BLACK);
    assert_eq!(sample_gradient(&hard, 0.75), Color::WHITE);
}

#[test]
fn addressing() {
    assert!((address(AddressMode::Wrap, 1.25) - 0.25).abs() < 1e-6);
    assert!((address(AddressMode::Wrap, -0.25) - 0.75).abs() < 1e-6);
    assert_eq!(address(AddressMode::Clamp, 1.5), 1.0);
    assert_eq!(address(AddressMode::Clamp, -0.5), 0.0);
    assert!((address(AddressMode::Mirror, 1.25) - 0.75).abs() < 1e-6);
    assert!((address(AddressMode::Mirror, -0.25) - 0.25).abs() < 1e-6);
    assert!((address(AddressMode::Mirror, 2.25) - 0.25).abs() < 1e-6);
}

#[test]
fn radial_addresses() {
    let center = point(0.0, 0.0);
    assert_eq!(radial_address(center, center), 0.0);
    assert!((radial_address(point(0.5, 0.0), center) - 0.5).abs() < 1e-5);
    assert!((radial_address(point(0.0, -0.25), center) - 0.25).abs() < 1e-5);
    assert!((radial_address(point(1.0, 0.0), center) - 1.0).abs() < 1e-5);

    // Off-center focus: the points between the focus and the circle are
    // spread over the whole range.
    let focus = point(0.5, 0.0);
    assert_eq!(radial_address(focus, focus), 0.0);
    assert!((radial_address(point(0.75, 0.0), focus) - 0.5).abs() < 1e-5);
    assert!((radial_address(point(-0.25, 0.0), focus) - 0.5).abs() < 1e-5);

    // Same value twice in a row.
    let a = radial_address(point(0.3, 0.7), point(-0.2, 0.1));
    let b = radial_address(point(0.3, 0.7), point(-0.2, 0.1));
    assert_eq!(a, b);
    assert!(a > 0.0 && a < 1.0);
}

#[test]
fn stripe() {
    let fill = GradientFill::linear(black_to_white());
    let stripe = rasterize_gradient_stripe(&fill, 5);
    assert_eq!(stripe.len(), 5);
    assert_eq!(stripe[0], [0, 0, 0, 255]);
    assert_eq!(stripe[2], [128, 128, 128, 255]);
    assert_eq!(stripe[4], [255, 255, 255, 255]);
}

#[test]
fn linear_raster() {
    let fill = GradientFill::linear(black_to_white());
    let pixels = rasterize_gradient(&fill, 4, 3);
    assert_eq!(pixels.len(), 12);
    for y in 0..3 {
        assert_eq!(pixels[y * 4], pixels[0]);
        assert!(pixels[y * 4][0] < pixels[y * 4 + 3][0]);
    }
}

#[test]
fn radial_raster() {
    let fill = GradientFill::radial(black_to_white(), point(0.0, 0.0));
    let pixels = rasterize_gradient(&fill, 8, 8);
    assert_eq!(pixels.len(), 64);
    // Dark in the middle, bright in the corners, symmetric.
    assert!(pixels[3 * 8 + 3][0] < 64);
    assert_eq!(pixels[0][0], 255);
    assert_eq!(pixels[0], pixels[63]);
    assert_eq!(pixels[7], pixels[56]);
}
