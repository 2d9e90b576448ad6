//! Flat-earth projection between metric displacements and degrees

use glam::DVec3;

/// One degree of latitude: 60 nautical miles
pub const METERS_PER_DEGREE: f64 = 60.0 * 1852.0;

/// Convert a metric displacement `(east, north, down)` at `latitude` (degrees)
/// to `(d_lon, d_lat, d_depth)`. Depth stays in meters.
pub fn meters_to_degrees(delta: DVec3, latitude: f64) -> DVec3 {
    let lon_scale = METERS_PER_DEGREE * latitude.to_radians().cos();
    DVec3::new(
        delta.x / lon_scale,
        delta.y / METERS_PER_DEGREE,
        delta.z,
    )
}

/// Inverse of [`meters_to_degrees`]
pub fn degrees_to_meters(delta: DVec3, latitude: f64) -> DVec3 {
    let lon_scale = METERS_PER_DEGREE * latitude.to_radians().cos();
    DVec3::new(
        delta.x * lon_scale,
        delta.y * METERS_PER_DEGREE,
        delta.z,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equator() {
        let d = meters_to_degrees(DVec3::new(METERS_PER_DEGREE, METERS_PER_DEGREE, 5.0), 0.0);
        assert!((d.x - 1.0).abs() < 1e-12);
        assert!((d.y - 1.0).abs() < 1e-12);
        assert_eq!(d.z, 5.0);
    }

    #[test]
    fn test_longitude_stretches_with_latitude() {
        let at_60 = meters_to_degrees(DVec3::new(1000.0, 0.0, 0.0), 60.0);
        let at_0 = meters_to_degrees(DVec3::new(1000.0, 0.0, 0.0), 0.0);
        assert!((at_60.x - 2.0 * at_0.x).abs() < 1e-12);
        assert_eq!(at_60.y, 0.0);
    }

    #[test]
    fn test_round_trip() {
        let delta = DVec3::new(123.4, -56.7, 1.5);
        let back = degrees_to_meters(meters_to_degrees(delta, 47.0), 47.0);
        assert!((back - delta).length() < 1e-9);
    }
}
