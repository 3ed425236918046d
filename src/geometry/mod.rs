use nalgebra::Vector3;
use std::f64::consts::{FRAC_PI_2, PI};

/// Affine map of `x` from the range `[x0, x1]` onto `[y0, y1]`
///
/// Values outside `[x0, x1]` are extrapolated along the same line, which is
/// what the pixel <-> normalized conversions rely on in both directions.
///
/// # Arguments
///
/// * `y0`, `y1` - Target range
/// * `x0`, `x1` - Source range, must satisfy `x0 != x1`
/// * `x` - Value to map
///
/// # Returns
///
/// The interpolated (or extrapolated) value
pub fn lerp(y0: f64, y1: f64, x0: f64, x1: f64, x: f64) -> f64 {
    debug_assert!(x0 != x1, "lerp source range is empty");
    let m = (y1 - y0) / (x1 - x0);
    m * (x - x0) + y0
}

/// Map a pixel index onto `[-1, 1]` given the extent of its axis
pub fn normalize_pixel(index: f64, extent: u32) -> f64 {
    lerp(-1.0, 1.0, 0.0, extent as f64, index)
}

/// Map a normalized coordinate back onto `[0, extent]`
pub fn denormalize_pixel(value: f64, extent: u32) -> f64 {
    lerp(0.0, extent as f64, -1.0, 1.0, value)
}

/// Unit viewing direction for a normalized equirectangular coordinate
///
/// `x_norm` spans the full longitude circle `[-π, π]`, `y_norm` the latitude
/// range `[-π/2, π/2]`. The `z` axis points to the pole.
pub fn equirect_direction(x_norm: f64, y_norm: f64) -> Vector3<f64> {
    let longitude = x_norm * PI;
    let latitude = y_norm * FRAC_PI_2;
    let (sin_lat, cos_lat) = latitude.sin_cos();
    let (sin_lon, cos_lon) = longitude.sin_cos();
    Vector3::new(cos_lat * cos_lon, cos_lat * sin_lon, sin_lat)
}
