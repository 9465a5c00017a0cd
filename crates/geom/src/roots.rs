//! Polynomial root finding.
//!
//! The cubic solver works in double precision since the coefficients of the
//! bézier/line intersection polynomial lose a lot of accuracy in f32.

use arrayvec::ArrayVec;

#[cfg(not(feature = "std"))]
use num_traits::Float;

const ROOT_EPSILON: f64 = 1e-7;

/// Real roots of `a*x^2 + b*x + c`.
///
/// Degrades to the linear case when `a` is negligible. Roots are not sorted.
pub fn solve_quadratic(a: f32, b: f32, c: f32) -> ArrayVec<f32, 2> {
    let mut result = ArrayVec::new();

    if a.abs() < crate::EPSILON {
        if b.abs() > crate::EPSILON {
            result.push(-c / b);
        }
        return result;
    }

    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return result;
    }

    let sqrt_discriminant = discriminant.sqrt();
    result.push((-b + sqrt_discriminant) / (2.0 * a));
    if sqrt_discriminant > 0.0 {
        result.push((-b - sqrt_discriminant) / (2.0 * a));
    }

    result
}

/// Roots of `a*t^3 + b*t^2 + c*t + d` that lie in the unit interval.
///
/// Uses Cardano's method. When the discriminant is close to zero the repeated
/// root is only reported once. The results are sorted in increasing order.
pub fn cubic_roots_in_unit_interval(a: f64, b: f64, c: f64, d: f64) -> ArrayVec<f64, 3> {
    let mut roots: ArrayVec<f64, 3> = ArrayVec::new();

    if a.abs() < ROOT_EPSILON {
        quadratic_roots_f64(b, c, d, &mut roots);
    } else {
        let a1 = b / a;
        let b1 = c / a;
        let c1 = d / a;

        let q = (3.0 * b1 - a1 * a1) / 9.0;
        let r = (9.0 * a1 * b1 - 27.0 * c1 - 2.0 * a1 * a1 * a1) / 54.0;
        let discriminant = q * q * q + r * r;

        if discriminant >= 0.0 {
            let sqrt_d = discriminant.sqrt();
            let s = (r + sqrt_d).cbrt();
            let t = (r - sqrt_d).cbrt();

            roots.push(-a1 / 3.0 + (s + t));
            let imaginary = (3f64.sqrt() * (s - t) / 2.0).abs();
            if imaginary <= ROOT_EPSILON {
                roots.push(-a1 / 3.0 - (s + t) / 2.0);
            }
        } else {
            let theta = (r / (-q * q * q).sqrt()).acos();
            let m = 2.0 * (-q).sqrt();
            let tau = 2.0 * core::f64::consts::PI;
            roots.push(m * (theta / 3.0).cos() - a1 / 3.0);
            roots.push(m * ((theta + tau) / 3.0).cos() - a1 / 3.0);
            roots.push(m * ((theta + 2.0 * tau) / 3.0).cos() - a1 / 3.0);
        }
    }

    roots.retain(|t| t.is_finite() && *t >= 0.0 && *t <= 1.0);
    roots.sort_by(|a, b| a.partial_cmp(b).unwrap_or(core::cmp::Ordering::Equal));

    roots
}

fn quadratic_roots_f64(a: f64, b: f64, c: f64, output: &mut ArrayVec<f64, 3>) {
    if a.abs() < ROOT_EPSILON {
        if b.abs() > ROOT_EPSILON {
            output.push(-c / b);
        }
        return;
    }

    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return;
    }

    let sqrt_discriminant = discriminant.sqrt();
    output.push((-b + sqrt_discriminant) / (2.0 * a));
    if sqrt_discriminant > 0.0 {
        output.push((-b - sqrt_discriminant) / (2.0 * a));
    }
}

#[test]
fn three_distinct_roots() {
    // (t - 0.2) * (t - 0.5) * (t - 0.8)
    let roots = cubic_roots_in_unit_interval(1.0, -1.5, 0.66, -0.08);
    assert_eq!(roots.len(), 3);
    assert!((roots[0] - 0.2).abs() < 1e-6);
    assert!((roots[1] - 0.5).abs() < 1e-6);
    assert!((roots[2] - 0.8).abs() < 1e-6);
}

#[test]
fn roots_outside_of_the_unit_interval() {
    // (t - 0.5) * (t - 2.0) * (t + 1.0)
    let roots = cubic_roots_in_unit_interval(1.0, -1.5, -1.5, 1.0);
    assert_eq!(roots.len(), 1);
    assert!((roots[0] - 0.5).abs() < 1e-6);
}

#[test]
fn degenerate_leading_coefficient() {
    // 2t - 1
    let roots = cubic_roots_in_unit_interval(0.0, 0.0, 2.0, -1.0);
    assert_eq!(roots.len(), 1);
    assert!((roots[0] - 0.5).abs() < 1e-9);

    // (t - 0.25) * (t - 0.75)
    let roots = cubic_roots_in_unit_interval(0.0, 1.0, -1.0, 0.1875);
    assert_eq!(roots.len(), 2);
    assert!((roots[0] - 0.25).abs() < 1e-9);
    assert!((roots[1] - 0.75).abs() < 1e-9);
}

#[test]
fn quadratic() {
    let mut roots = solve_quadratic(1.0, -1.0, 0.0);
    roots.sort_by(|a, b| a.partial_cmp(b).unwrap());
    assert_eq!(&roots[..], &[0.0, 1.0]);

    assert!(solve_quadratic(1.0, 0.0, 1.0).is_empty());
    assert_eq!(&solve_quadratic(0.0, 2.0, -1.0)[..], &[0.5]);
}
