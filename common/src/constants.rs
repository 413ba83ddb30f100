//! Useful constants to have

/// WGS-84 semi-major axis in meters
pub const WGS84_A: f64 = 6_378_137.0;

/// WGS-84 flattening
pub const WGS84_F: f64 = 1.0 / 298.257_223_563;

/// The mean radius of the Earth in meters, used by the spherical fallback
pub const EARTH_R: f64 = 6_371_008.8;

/// One international nautical mile
pub const METERS_PER_NAUTICAL_MILE: f64 = 1852.0;

/// HURDAT2 marker for a value that was not recorded
pub const SENTINEL: i32 = -999;

/// Sustained wind (knots) at which a storm counts as a hurricane
pub const HURRICANE_THRESHOLD_KT: u16 = 64;

/// Storm name used by HURDAT2 for systems that were never named
pub const UNNAMED: &str = "UNNAMED";

/// Unicode's degree symbol
pub const DEGREE_SYM: char = '\u{00b0}';
