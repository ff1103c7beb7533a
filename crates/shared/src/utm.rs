/// UTM zone 32N (EPSG:25832) coordinate conversion.
///
/// The public bunker dataset and parts of the population grid store
/// positions as zone 32N easting/northing on the GRS80 ellipsoid, while the
/// map works in WGS84 latitude/longitude. Series expansion of the
/// transverse Mercator projection, good to well under a meter inside the
/// zone.
// GRS80 ellipsoid
const A: f64 = 6_378_137.0;
const F: f64 = 1.0 / 298.257_222_101;

// UTM parameters
const K0: f64 = 0.9996;
const FALSE_EASTING: f64 = 500_000.0;
/// Central meridian of zone 32, degrees east.
const LON_ORIGIN_DEG: f64 = 9.0;

// First and second eccentricity squared
const E2: f64 = F * (2.0 - F);
const EP2: f64 = E2 / (1.0 - E2);

/// Meridian arc length from the equator to latitude `phi` (radians).
fn meridian_arc(phi: f64) -> f64 {
    A * ((1.0 - E2 / 4.0 - 3.0 * E2 * E2 / 64.0 - 5.0 * E2 * E2 * E2 / 256.0) * phi
        - (3.0 * E2 / 8.0 + 3.0 * E2 * E2 / 32.0 + 45.0 * E2 * E2 * E2 / 1024.0)
            * (2.0 * phi).sin()
        + (15.0 * E2 * E2 / 256.0 + 45.0 * E2 * E2 * E2 / 1024.0) * (4.0 * phi).sin()
        - (35.0 * E2 * E2 * E2 / 3072.0) * (6.0 * phi).sin())
}

/// Convert UTM zone 32N easting/northing (meters) to WGS84 `(lat, lng)`
/// in degrees.
pub fn utm32_to_wgs84(easting: f64, northing: f64) -> (f64, f64) {
    let m = northing / K0;
    let mu = m / (A * (1.0 - E2 / 4.0 - 3.0 * E2 * E2 / 64.0 - 5.0 * E2 * E2 * E2 / 256.0));

    let e1 = (1.0 - (1.0 - E2).sqrt()) / (1.0 + (1.0 - E2).sqrt());
    let phi1 = mu
        + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
        + (21.0 * e1 * e1 / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
        + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin()
        + (1097.0 * e1.powi(4) / 512.0) * (8.0 * mu).sin();

    let sin1 = phi1.sin();
    let cos1 = phi1.cos();
    let tan1 = phi1.tan();

    let c1 = EP2 * cos1 * cos1;
    let t1 = tan1 * tan1;
    let n1 = A / (1.0 - E2 * sin1 * sin1).sqrt();
    let r1 = A * (1.0 - E2) / (1.0 - E2 * sin1 * sin1).powf(1.5);
    let d = (easting - FALSE_EASTING) / (n1 * K0);

    let lat_rad = phi1
        - (n1 * tan1 / r1)
            * (d * d / 2.0
                - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * EP2) * d.powi(4) / 24.0
                + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1 - 252.0 * EP2 - 3.0 * c1 * c1)
                    * d.powi(6)
                    / 720.0);
    let lng_rad = (d - (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0
        + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * EP2 + 24.0 * t1 * t1) * d.powi(5)
            / 120.0)
        / cos1;

    (lat_rad.to_degrees(), LON_ORIGIN_DEG + lng_rad.to_degrees())
}

/// Convert WGS84 `(lat, lng)` in degrees to UTM zone 32N
/// `(easting, northing)` in meters (northern hemisphere).
pub fn wgs84_to_utm32(lat: f64, lng: f64) -> (f64, f64) {
    let phi = lat.to_radians();
    let lam = (lng - LON_ORIGIN_DEG).to_radians();

    let sin_phi = phi.sin();
    let cos_phi = phi.cos();
    let tan_phi = phi.tan();

    let n = A / (1.0 - E2 * sin_phi * sin_phi).sqrt();
    let t = tan_phi * tan_phi;
    let c = EP2 * cos_phi * cos_phi;
    let a = cos_phi * lam;
    let m = meridian_arc(phi);

    let easting = FALSE_EASTING
        + K0 * n
            * (a + (1.0 - t + c) * a.powi(3) / 6.0
                + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * EP2) * a.powi(5) / 120.0);
    let northing = K0
        * (m + n * tan_phi
            * (a * a / 2.0
                + (5.0 - t + 9.0 * c + 4.0 * c * c) * a.powi(4) / 24.0
                + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * EP2) * a.powi(6) / 720.0));

    (easting, northing)
}
