//! Geodetic coordinate types and the WGS84 to NTM projection

pub mod coordinate_transform;

pub use coordinate_transform::ntm_from_wgs84;

/// A WGS84 position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Wgs84Coord {
    pub longitude: f64,
    pub latitude: f64,
    pub altitude: f64,
}

impl Wgs84Coord {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { longitude, latitude, altitude: 0.0 }
    }
}

/// A position projected on a local Transverse Mercator plane.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NtmCoord {
    /// Easting in meters. Value range with guaranteed precision: 0..1000000.
    pub easting: f64,
    /// Northing in meters. Value range with guaranteed precision: 0..9600000.
    pub northing: f64,
    pub altitude: f64,
    pub projection_id: u32,
}
