use std::f64::consts::PI;

/// Longitude in degrees to projected x in `[0, 1]` (for lon in `[-180, 180]`).
#[inline]
pub(crate) fn project_x(lng: f64) -> f64 { lng / 360.0 + 0.5 }

/// Latitude in degrees to spherical-Mercator y in `[0, 1]`, north up.
/// Latitudes beyond the Mercator limit clamp to the edges.
#[inline]
pub(crate) fn project_y(lat: f64) -> f64 {
    let sin = (lat * PI / 180.0).sin();
    let y = 0.5 - 0.25 * ((1.0 + sin) / (1.0 - sin)).ln() / PI;
    y.clamp(0.0, 1.0)
}

/// Inverse of [`project_x`].
#[inline]
pub(crate) fn unproject_x(x: f64) -> f64 { (x - 0.5) * 360.0 }

/// Inverse of [`project_y`].
#[inline]
pub(crate) fn unproject_y(y: f64) -> f64 {
    let y2 = (180.0 - y * 360.0) * PI / 180.0;
    360.0 * y2.exp().atan() / PI - 90.0
}
