use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// A latitude/longitude pair in decimal degrees.
///
/// Both values are guaranteed to be finite. No range checks are made beyond that; the distance
/// provider is the authority on whether a point exists.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Coordinate {
    lat: f64,
    lng: f64,
}

impl Coordinate {
    /// Creates a `Coordinate`, rejecting `NaN` and infinite values.
    pub fn new(lat: f64, lng: f64) -> CoreResult<Self> {
        if !lat.is_finite() || !lng.is_finite() {
            return Err(CoreError::InvalidCoordinate(format!("{lat},{lng}")));
        }
        Ok(Self { lat, lng })
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lng(&self) -> f64 {
        self.lng
    }

    /// The literal `"lat,lng"` text used as a cache key and in provider query strings.
    pub fn key(&self) -> String {
        self.to_string()
    }

    /// Parses the two trailing fields of a stop string. Whitespace around each number is ignored.
    pub(crate) fn from_parts(lat: &str, lng: &str) -> Option<Self> {
        let lat = lat.trim().parse::<f64>().ok()?;
        let lng = lng.trim().parse::<f64>().ok()?;
        Coordinate::new(lat, lng).ok()
    }

    /// Great-circle distance in meters between two coordinates.
    pub fn haversine_meters(&self, other: &Coordinate) -> f64 {
        const EARTH_RADIUS_METERS: f64 = 6_371_008.8;
        let (lat1, lat2) = (self.lat.to_radians(), other.lat.to_radians());
        let d_lat = lat2 - lat1;
        let d_lng = (other.lng - self.lng).to_radians();
        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_METERS * a.sqrt().asin()
    }
}

impl Display for Coordinate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.lat, self.lng)
    }
}

impl FromStr for Coordinate {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lat, lng) = s
            .split_once(',')
            .ok_or_else(|| CoreError::InvalidCoordinate(s.to_string()))?;
        Coordinate::from_parts(lat, lng).ok_or_else(|| CoreError::InvalidCoordinate(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let c = Coordinate::from_str("13.56, 100.67").unwrap();
        assert_eq!(c.lat(), 13.56);
        assert_eq!(c.lng(), 100.67);
        assert_eq!(c.key(), "13.56,100.67");
    }

    #[test]
    fn test_rejects_nan() {
        assert!(Coordinate::new(f64::NAN, 100.0).is_err());
        assert!(Coordinate::new(13.0, f64::INFINITY).is_err());
        assert!(Coordinate::from_str("NaN,100.0").is_err());
        assert!(Coordinate::from_str("abc,100.0").is_err());
        assert!(Coordinate::from_str("13.0").is_err());
    }

    #[test]
    fn test_haversine() {
        let a = Coordinate::new(13.7563, 100.5018).unwrap();
        let b = Coordinate::new(13.7563, 100.5018).unwrap();
        assert_eq!(a.haversine_meters(&b), 0.0);

        // One degree of latitude is roughly 111 km.
        let c = Coordinate::new(14.7563, 100.5018).unwrap();
        let d = a.haversine_meters(&c);
        assert!((d - 111_195.0).abs() < 100.0, "{d}");
    }
}
