//! WGS84 helpers.

use crate::geometry::Point3;

/// Semi-major axis (meters).
pub const WGS84_A: f64 = 6378137.0;
/// First eccentricity squared.
pub const WGS84_E2: f64 = 0.00669437999014;

/// Geodetic (lon, lat degrees, elevation meters) to earth-centered
/// cartesian meters.
pub fn geodetic_to_cart(lon: f64, lat: f64, elev: f64) -> Point3 {
    let lambda = lon.to_radians();
    let phi = lat.to_radians();
    let (sphi, cphi) = phi.sin_cos();
    let (slambda, clambda) = lambda.sin_cos();

    let n = WGS84_A / (1.0 - WGS84_E2 * sphi * sphi).sqrt();
    Point3::new(
        (elev + n) * cphi * clambda,
        (elev + n) * cphi * slambda,
        (elev + n * (1.0 - WGS84_E2)) * sphi,
    )
}

/// Unit vector from the earth center through `p` at sea level.
///
/// Stands in for a surface normal where none was computed.
pub fn fake_normal(p: Point3) -> Point3 {
    geodetic_to_cart(p.x, p.y, 0.0).normalized()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equator_and_pole() {
        let p = geodetic_to_cart(0.0, 0.0, 0.0);
        assert!((p.x - WGS84_A).abs() < 1e-6);
        assert!(p.y.abs() < 1e-6 && p.z.abs() < 1e-6);

        let p = geodetic_to_cart(0.0, 90.0, 0.0);
        let b = WGS84_A * (1.0 - WGS84_E2).sqrt();
        assert!((p.z - b).abs() < 1e-3);
    }

    #[test]
    fn elevation_moves_outward() {
        let low = geodetic_to_cart(10.0, 45.0, 0.0);
        let high = geodetic_to_cart(10.0, 45.0, 1000.0);
        assert!((high.length() - low.length() - 1000.0).abs() < 1.0);
    }

    #[test]
    fn fake_normal_is_unit_length_and_ignores_z() {
        let n = fake_normal(Point3::new(-122.375, 37.5, 300.0));
        assert!((n.length() - 1.0).abs() < 1e-12);
        assert_eq!(n, fake_normal(Point3::new(-122.375, 37.5, 0.0)));
        // points roughly away from the earth center
        let up = geodetic_to_cart(-122.375, 37.5, 0.0);
        assert!(n.dot(up) > 0.0);
    }
}
