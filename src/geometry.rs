//! Pixel→world projection, lat/lon offset math, and vector rotation
//! (spec.md §4.1).

use crate::types::{GeoLocation, PixelCoords};
use crate::vehicle::VehiclePort;

/// Radius of the "spherical" earth used by the equirectangular
/// approximation, meters. Matches the ArduPilot test code this was
/// ported from.
const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Camera horizontal field of view, degrees (spec.md §6 `WIDTH_FOV`).
const WIDTH_FOV_DEG: f64 = 69.0;
/// Camera vertical field of view, degrees (spec.md §6 `HEIGHT_FOV`).
const HEIGHT_FOV_DEG: f64 = 55.0;

/// Local equirectangular distance approximation used by the
/// Conductor's blobbing check: accurate at short range, not a great
/// circle distance.
pub(crate) fn local_dist(a: GeoLocation, b: GeoLocation) -> f64 {
    let dlat = b.lat - a.lat;
    let dlon = b.lon - a.lon;
    (dlat * dlat + dlon * dlon).sqrt() * 1.113195e5
}

/// Given altitude, normalized pixel coords, and vehicle yaw (degrees,
/// mathematically positive CCW), returns the world-frame horizontal
/// offset `(east, north)` in meters from the vehicle to that pixel.
///
/// Degenerate cases: `alt <= 0.0` returns `(0.0, 0.0)`; a
/// zero-magnitude vector is preserved (testable properties 1, 3, 4).
pub fn relative_distance(alt: f64, coords: PixelCoords, yaw_deg: f64) -> (f64, f64) {
    if alt <= 0.0 {
        return (0.0, 0.0);
    }

    let viewport_width = 2.0 * (WIDTH_FOV_DEG / 2.0).to_radians().tan() * alt;
    let viewport_height = 2.0 * (HEIGHT_FOV_DEG / 2.0).to_radians().tan() * alt;

    // Shift to a centered frame, flipping y (image y-down -> world y-up).
    let shifted_x = coords.x - 0.5;
    let shifted_y = (1.0 - coords.y) - 0.5;

    let vector = (shifted_x * viewport_width, shifted_y * viewport_height);

    let magnitude = (vector.0 * vector.0 + vector.1 * vector.1).sqrt();
    let mut angle = vector.1.atan2(vector.0);
    angle += yaw_deg.to_radians();

    (magnitude * angle.cos(), magnitude * angle.sin())
}

/// Applies the equirectangular approximation to move `origin` by
/// `(east, north)` meters. The result's altitude equals `origin`'s.
///
/// Accurate within 1 m over 1 km away from the poles; near `|lat| >
/// 85°` behavior is unspecified (spec.md §4.1).
pub fn distance_to_location(origin: GeoLocation, offset: (f64, f64)) -> GeoLocation {
    let (d_east, d_north) = offset;

    let d_lat = d_north / EARTH_RADIUS_M;
    let d_lon = d_east / (EARTH_RADIUS_M * origin.lat.to_radians().cos());

    GeoLocation::new(
        origin.lat + d_lat.to_degrees(),
        origin.lon + d_lon.to_degrees(),
        origin.alt,
    )
}

/// Returns `(atan2(dy, altDiff), atan2(dx, altDiff))` in degrees — the
/// look-down angle to each horizontal component.
///
/// The pair is returned in `(y-angle, x-angle)` order; this mirrors
/// the original implementation's swapped naming (spec.md §9) and is
/// behaviorally inert because callers compare both components against
/// the same threshold.
pub fn angle_diff(distances: (f64, f64), alt_diff: f64) -> (f64, f64) {
    let x_angle = distances.0.atan2(alt_diff).to_degrees();
    let y_angle = distances.1.atan2(alt_diff).to_degrees();
    (y_angle, x_angle)
}

/// Rescales a 2-vector to magnitude `mag`, preserving direction. The
/// zero vector maps to itself.
pub fn change_magnitude(vector: (f64, f64), mag: f64) -> (f64, f64) {
    if vector == (0.0, 0.0) {
        return (0.0, 0.0);
    }
    let angle = vector.1.atan2(vector.0);
    (mag * angle.cos(), mag * angle.sin())
}

/// Per-axis ground distance between two locations, computed the way
/// the original implementation does: independently collapse the
/// other axis to zero and reuse the 2D distance formula.
pub fn individual_dist(a: GeoLocation, b: GeoLocation) -> (f64, f64) {
    let lat_a = GeoLocation::new(a.lat, 0.0, 0.0);
    let lat_b = GeoLocation::new(b.lat, 0.0, 0.0);
    let lon_a = GeoLocation::new(0.0, a.lon, 0.0);
    let lon_b = GeoLocation::new(0.0, b.lon, 0.0);
    (local_dist(lat_a, lat_b), local_dist(lon_a, lon_b))
}

/// Returns rangefinder distance when all of {rangefinder present,
/// distance non-null, distance != 0, GPS-relative alt <= 2.0 m} hold;
/// otherwise returns GPS-relative altitude.
pub fn get_agl(vehicle: &dyn VehiclePort) -> f64 {
    let relative_alt = vehicle.relative_altitude();
    if let Some(distance) = vehicle.rangefinder_distance() {
        if distance != 0.0 && relative_alt <= 2.0 {
            return distance;
        }
    }
    relative_alt
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn centering_returns_zero_offset() {
        let (e, n) = relative_distance(100.0, PixelCoords::new(0.5, 0.5), 0.0);
        assert_relative_eq!(e, 0.0, epsilon = 1e-9);
        assert_relative_eq!(n, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn sign_quadrants_at_yaw_zero() {
        let (e, n) = relative_distance(69.0, PixelCoords::new(0.95, 0.12), 0.0);
        assert!(e > 0.0);
        assert!(n > 0.0);

        let (e, n) = relative_distance(13.0, PixelCoords::new(0.4, 0.6), 0.0);
        assert!(e < 0.0);
        assert!(n < 0.0);
    }

    #[test]
    fn yaw_90_rotation_law() {
        let (rx0, ry0) = relative_distance(71.0, PixelCoords::new(0.5, 0.4), 0.0);
        let (rx90, ry90) = relative_distance(71.0, PixelCoords::new(0.5, 0.4), 90.0);
        assert_relative_eq!(rx90, ry0, epsilon = 1e-9);
        assert_relative_eq!(ry90, -rx0, epsilon = 1e-9);
    }

    #[test]
    fn altitude_zero_is_degenerate() {
        assert_eq!(relative_distance(0.0, PixelCoords::new(0.0, 0.0), 10.0), (0.0, 0.0));
        assert_eq!(relative_distance(-5.0, PixelCoords::new(0.3, 0.7), 10.0), (0.0, 0.0));
    }

    #[test]
    fn round_trip_offset_within_one_percent() {
        let origin = GeoLocation::new(37.7749, -122.4194, 50.0);
        let offset = (40.0, 60.0);
        let moved = distance_to_location(origin, offset);
        let recovered = individual_dist(origin, moved);
        let recovered_mag = (recovered.0 * recovered.0 + recovered.1 * recovered.1).sqrt();
        let original_mag = (offset.0 * offset.0 + offset.1 * offset.1).sqrt();
        assert_relative_eq!(recovered_mag, original_mag, max_relative = 0.01);
    }

    #[test]
    fn change_magnitude_preserves_direction() {
        assert_eq!(change_magnitude((0.0, 0.0), 5.0), (0.0, 0.0));
        let (x, y) = change_magnitude((3.0, 4.0), 10.0);
        assert_relative_eq!((x * x + y * y).sqrt(), 10.0, epsilon = 1e-9);
        assert_relative_eq!(y / x, 4.0 / 3.0, epsilon = 1e-9);
    }

    #[test]
    fn angle_diff_is_swapped_but_symmetric_about_threshold() {
        let (y_angle, x_angle) = angle_diff((3.0, 4.0), 10.0);
        assert_relative_eq!(y_angle, 4.0_f64.atan2(10.0).to_degrees(), epsilon = 1e-9);
        assert_relative_eq!(x_angle, 3.0_f64.atan2(10.0).to_degrees(), epsilon = 1e-9);
    }
}
