use std::fmt;

use thiserror::Error;

use crate::constants::DEGREE_SYM;

/// Compass letter attached to a coordinate magnitude
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hemisphere {
    North,
    South,
    East,
    West,
}

impl Hemisphere {
    pub fn from_letter(letter: char) -> Option<Self> {
        match letter {
            'N' => Some(Self::North),
            'S' => Some(Self::South),
            'E' => Some(Self::East),
            'W' => Some(Self::West),
            _ => None,
        }
    }

    pub fn letter(self) -> char {
        match self {
            Self::North => 'N',
            Self::South => 'S',
            Self::East => 'E',
            Self::West => 'W',
        }
    }

    /// The opposite compass direction
    pub fn flip(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::South => Self::North,
            Self::East => Self::West,
            Self::West => Self::East,
        }
    }

    pub fn is_latitude(self) -> bool {
        matches!(self, Self::North | Self::South)
    }

    fn sign(self) -> f64 {
        match self {
            Self::North | Self::East => 1.0,
            Self::South | Self::West => -1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordinateError {
    #[error("coordinate {0:?} has no hemisphere letter")]
    MissingHemisphere(String),
    #[error("coordinate {0:?} is not a number")]
    InvalidNumber(String),
    #[error("coordinate {value:?} is not a {expected}")]
    WrongAxis {
        value: String,
        expected: &'static str,
    },
    #[error("{axis} of {magnitude} degrees is out of range")]
    OutOfRange { axis: &'static str, magnitude: f64 },
}

/// A non-negative magnitude in degrees together with its hemisphere
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub magnitude: f64,
    pub hemisphere: Hemisphere,
}

impl Coordinate {
    pub fn new(magnitude: f64, hemisphere: Hemisphere) -> Self {
        if magnitude < 0.0 {
            Self {
                magnitude: -magnitude,
                hemisphere: hemisphere.flip(),
            }
        } else {
            Self {
                magnitude,
                hemisphere,
            }
        }
    }

    /// Parse the HURDAT2 `<number><letter>` form, e.g. `28.0N` or `93.5W`
    pub fn parse(text: &str) -> Result<Self, CoordinateError> {
        let text = text.trim();
        let (number, hemisphere) = text
            .chars()
            .last()
            .and_then(Hemisphere::from_letter)
            .map(|h| (&text[..text.len() - 1], h))
            .ok_or_else(|| CoordinateError::MissingHemisphere(text.to_owned()))?;
        let magnitude: f64 = number
            .trim()
            .parse()
            .map_err(|_| CoordinateError::InvalidNumber(text.to_owned()))?;
        if !magnitude.is_finite() {
            return Err(CoordinateError::InvalidNumber(text.to_owned()));
        }
        Ok(Self::new(magnitude, hemisphere))
    }

    /// Signed degrees: north and east positive
    pub fn degrees(self) -> f64 {
        self.magnitude * self.hemisphere.sign()
    }

    /// Fold a longitude into `[-180, 180]`.
    ///
    /// A magnitude above 180 is replaced by `360 - magnitude` and the E/W letter is flipped.
    /// Latitudes are returned unchanged.
    pub fn normalized(self) -> Self {
        if !self.hemisphere.is_latitude() && self.magnitude > 180.0 {
            Self {
                magnitude: 360.0 - self.magnitude,
                hemisphere: self.hemisphere.flip(),
            }
        } else {
            self
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.1}{}{}",
            self.magnitude,
            DEGREE_SYM,
            self.hemisphere.letter()
        )
    }
}

/// A normalized geographic position.
///
/// Latitude magnitude never exceeds 90 degrees and longitude magnitude never exceeds 180.
/// Two positions are equal when their signed coordinates are equal.
#[derive(Debug, Clone, Copy)]
pub struct Position {
    latitude: Coordinate,
    longitude: Coordinate,
}

impl Position {
    pub fn new(latitude: Coordinate, longitude: Coordinate) -> Result<Self, CoordinateError> {
        if !latitude.hemisphere.is_latitude() {
            return Err(CoordinateError::WrongAxis {
                value: latitude.to_string(),
                expected: "latitude",
            });
        }
        if longitude.hemisphere.is_latitude() {
            return Err(CoordinateError::WrongAxis {
                value: longitude.to_string(),
                expected: "longitude",
            });
        }
        if latitude.magnitude > 90.0 {
            return Err(CoordinateError::OutOfRange {
                axis: "latitude",
                magnitude: latitude.magnitude,
            });
        }
        if longitude.magnitude > 360.0 {
            return Err(CoordinateError::OutOfRange {
                axis: "longitude",
                magnitude: longitude.magnitude,
            });
        }
        Ok(Self {
            latitude,
            longitude: longitude.normalized(),
        })
    }

    /// Parse a HURDAT2 latitude/longitude pair such as `("28.0N", "93.5W")`
    pub fn parse(lat: &str, lon: &str) -> Result<Self, CoordinateError> {
        Self::new(Coordinate::parse(lat)?, Coordinate::parse(lon)?)
    }

    /// Build a position from signed degrees (north and east positive)
    pub fn from_degrees(lat: f64, lon: f64) -> Result<Self, CoordinateError> {
        Self::new(
            Coordinate::new(lat, Hemisphere::North),
            Coordinate::new(lon, Hemisphere::East),
        )
    }

    pub fn latitude(&self) -> Coordinate {
        self.latitude
    }

    pub fn longitude(&self) -> Coordinate {
        self.longitude
    }

    pub fn lat_deg(&self) -> f64 {
        self.latitude.degrees()
    }

    pub fn lon_deg(&self) -> f64 {
        self.longitude.degrees()
    }
}

impl PartialEq for Position {
    fn eq(&self, other: &Self) -> bool {
        self.lat_deg() == other.lat_deg() && self.lon_deg() == other.lon_deg()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.latitude, self.longitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_hurdat_pair() {
        let p = Position::parse("28.0N", " 93.5W").unwrap();
        assert_eq!(p.lat_deg(), 28.0);
        assert_eq!(p.lon_deg(), -93.5);
        assert_eq!(p.longitude().hemisphere, Hemisphere::West);
    }

    #[test]
    fn longitude_past_antimeridian_is_folded() {
        let p = Position::parse("45.1N", "182.0W").unwrap();
        assert_eq!(p.longitude().magnitude, 178.0);
        assert_eq!(p.longitude().hemisphere, Hemisphere::East);
        assert_eq!(p.lon_deg(), 178.0);

        let q = Position::parse("10.0S", "190.5E").unwrap();
        assert_eq!(q.lon_deg(), -169.5);
        assert_eq!(q.latitude().hemisphere, Hemisphere::South);
    }

    #[test]
    fn normalization_is_idempotent() {
        for raw in ["0.0E", "93.5W", "180.0E", "180.0W", "182.0W", "359.9E"] {
            let once = Coordinate::parse(raw).unwrap().normalized();
            assert_eq!(once.normalized(), once, "{raw}");
            assert!(once.magnitude <= 180.0);
        }
    }

    #[test]
    fn latitude_hemisphere_never_flips() {
        let c = Coordinate::parse("89.0S").unwrap();
        assert_eq!(c.normalized(), c);
    }

    #[test]
    fn rejects_malformed() {
        assert!(matches!(
            Coordinate::parse("28.0"),
            Err(CoordinateError::MissingHemisphere(_))
        ));
        assert!(matches!(
            Coordinate::parse("abcN"),
            Err(CoordinateError::InvalidNumber(_))
        ));
        assert!(matches!(
            Position::parse("93.5W", "28.0N"),
            Err(CoordinateError::WrongAxis { .. })
        ));
        assert!(matches!(
            Position::parse("91.0N", "28.0W"),
            Err(CoordinateError::OutOfRange { .. })
        ));
    }

    #[test]
    fn equality_is_by_signed_coordinates() {
        let a = Position::parse("28.0N", "93.5W").unwrap();
        let b = Position::from_degrees(28.0, -93.5).unwrap();
        let c = Position::from_degrees(28.0, 93.5).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
