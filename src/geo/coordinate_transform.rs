//! Forward Transverse Mercator projection on the WGS84 ellipsoid.
//!
//! Positions are first quantised to the fixed-point angular unit used by navigation
//! data (`180° / 2 / 2^30` per step), then projected with Krüger's sixth-order series
//! around the meridian of the zone origin. The northing of the origin itself is
//! subtracted so the origin lies on the `northing = 0` line.

use super::{NtmCoord, Wgs84Coord};

const PI_IN_DEG: f64 = 180.0;
/// Degrees per fixed-point step.
pub const COORDINATE_SCALING: f64 = PI_IN_DEG / 2.0 / (1u64 << 30) as f64;
const MIN_VALID_LONGITUDE_IN_DEG: f64 = -PI_IN_DEG;
const MAX_VALID_LONGITUDE_IN_NDS: f64 = i32::MAX as f64;
const MIN_VALID_LATITUDE_IN_DEG: f64 = -90.0;
const MAX_VALID_LATITUDE_IN_DEG: f64 = 90.0;
/// Transverse Mercator loses accuracy quickly beyond this distance from the central meridian.
const MAX_MERIDIAN_DISTANCE_IN_DEG: f64 = 75.0;

const WGS84_A: f64 = 6_378_137.0;
const WGS84_F: f64 = 1.0 / 298.257_223_563;
const SCALE_FACTOR: f64 = 1.0;

/// Position in fixed-point navigation units.
#[derive(Debug, Clone, Copy)]
struct NdsCoord {
    longitude: f64,
    latitude: f64,
}

fn from_deg(longitude: f64, latitude: f64) -> Option<NdsCoord> {
    let longitude_nds = (longitude / COORDINATE_SCALING).trunc();
    if !(longitude >= MIN_VALID_LONGITUDE_IN_DEG)
        || !(longitude_nds <= MAX_VALID_LONGITUDE_IN_NDS)
        || !(latitude >= MIN_VALID_LATITUDE_IN_DEG)
        || !(latitude <= MAX_VALID_LATITUDE_IN_DEG)
    {
        return None;
    }

    Some(NdsCoord { longitude: longitude_nds, latitude: (latitude / COORDINATE_SCALING).trunc() })
}

fn in_deg(value: f64) -> f64 {
    value * COORDINATE_SCALING
}

/// Signed difference `angle2 - angle1` normalised to [-180, 180].
fn angle_difference(angle1: f64, angle2: f64) -> f64 {
    let mut diff = angle2 - angle1;
    let offset = if diff > 0.0 { 180.0 } else { -180.0 };
    diff += offset;
    diff -= (diff / 360.0).trunc() * 360.0;
    diff - offset
}

fn is_in_origin_range(origin: &NdsCoord, longitude: f64, latitude: f64) -> bool {
    angle_difference(in_deg(origin.longitude), longitude).abs() <= MAX_MERIDIAN_DISTANCE_IN_DEG
        && latitude.abs() <= MAX_VALID_LATITUDE_IN_DEG
}

/// Transverse Mercator on WGS84 using the Krüger n-series.
struct TransverseMercator {
    /// Rectifying radius scaled by the central scale factor.
    a1: f64,
    e: f64,
    alpha: [f64; 6],
}

impl TransverseMercator {
    fn wgs84() -> Self {
        let n = WGS84_F / (2.0 - WGS84_F);
        let n2 = n * n;
        let n3 = n2 * n;
        let n4 = n3 * n;
        let n5 = n4 * n;
        let n6 = n5 * n;

        let a1 = SCALE_FACTOR * WGS84_A / (1.0 + n) * (1.0 + n2 / 4.0 + n4 / 64.0 + n6 / 256.0);
        let alpha = [
            n / 2.0 - 2.0 * n2 / 3.0 + 5.0 * n3 / 16.0 + 41.0 * n4 / 180.0 - 127.0 * n5 / 288.0
                + 7891.0 * n6 / 37800.0,
            13.0 * n2 / 48.0 - 3.0 * n3 / 5.0 + 557.0 * n4 / 1440.0 + 281.0 * n5 / 630.0
                - 1_983_433.0 * n6 / 1_935_360.0,
            61.0 * n3 / 240.0 - 103.0 * n4 / 140.0 + 15061.0 * n5 / 26880.0
                + 167_603.0 * n6 / 181_440.0,
            49561.0 * n4 / 161_280.0 - 179.0 * n5 / 168.0 + 6_601_661.0 * n6 / 7_257_600.0,
            34729.0 * n5 / 80640.0 - 3_418_889.0 * n6 / 1_995_840.0,
            212_378_941.0 * n6 / 319_334_400.0,
        ];

        Self { a1, e: (WGS84_F * (2.0 - WGS84_F)).sqrt(), alpha }
    }

    /// Returns `(easting, northing)` in meters for a point given in degrees.
    fn forward(&self, central_longitude: f64, latitude: f64, longitude: f64) -> (f64, f64) {
        let phi = latitude.to_radians();
        let lambda = angle_difference(central_longitude, longitude).to_radians();

        let sin_phi = phi.sin();
        let tau = (sin_phi.atanh() - self.e * (self.e * sin_phi).atanh()).sinh();

        let xi_prime = tau.atan2(lambda.cos());
        let eta_prime = (lambda.sin() / (1.0 + tau * tau).sqrt()).atanh();

        let mut xi = xi_prime;
        let mut eta = eta_prime;
        for (j, alpha) in self.alpha.iter().enumerate() {
            let k = 2.0 * (j as f64 + 1.0);
            xi += alpha * (k * xi_prime).sin() * (k * eta_prime).cosh();
            eta += alpha * (k * xi_prime).cos() * (k * eta_prime).sinh();
        }

        (self.a1 * eta, self.a1 * xi)
    }
}

fn transform_wgs84_to_ntm(
    coordinate: &NdsCoord,
    origin: &NdsCoord,
    mercator: &TransverseMercator,
) -> Option<NtmCoord> {
    let latitude = in_deg(coordinate.latitude);
    let longitude = in_deg(coordinate.longitude);

    if !is_in_origin_range(origin, longitude, latitude) {
        return None;
    }

    let central_longitude = in_deg(origin.longitude);
    let (easting, northing) = mercator.forward(central_longitude, latitude, longitude);
    let (_, origin_northing) =
        mercator.forward(central_longitude, in_deg(origin.latitude), central_longitude);

    let ntm = NtmCoord { easting, northing: northing - origin_northing, ..NtmCoord::default() };
    (ntm.easting.is_finite() && ntm.northing.is_finite()).then_some(ntm)
}

/// Projects `point` on the Transverse Mercator plane centred on `origin`.
///
/// Returns `None` when either position is outside the valid WGS84 range, or when the
/// point is more than 75° of longitude away from the origin meridian.
pub fn ntm_from_wgs84(origin: &Wgs84Coord, point: &Wgs84Coord) -> Option<NtmCoord> {
    let mercator = TransverseMercator::wgs84();

    let origin = from_deg(origin.longitude, origin.latitude)?;
    let coordinate = from_deg(point.longitude, point.latitude)?;

    transform_wgs84_to_ntm(&coordinate, &origin, &mercator)
}
