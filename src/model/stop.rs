//! The `Stop` type: a pickup or drop-off location.
//!
//! The dashboard API stores stops as a single string, `"<address>,<lat>,<lng>"`, or sometimes just
//! `"<lat>,<lng>"`. Addresses contain commas of their own, so a stop is parsed from the right: the
//! last two fields are the coordinate and everything before them is the address.

use crate::error::{CoreError, CoreResult};
use crate::model::Coordinate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// A location with optional address text.
///
/// A parsed `Stop` remembers the exact text it came from and serializes back to it, so that
/// reordering stops never rewrites what the API sent us.
#[derive(Debug, Clone, PartialEq)]
pub struct Stop {
    address: String,
    coordinate: Coordinate,
    encoded: String,
}

impl Stop {
    /// Builds a stop from its parts. The encoded form is `address,lat,lng`, or `lat,lng` when the
    /// address is empty.
    pub fn new(address: impl Into<String>, coordinate: Coordinate) -> Self {
        let address = address.into();
        let encoded = if address.is_empty() {
            coordinate.to_string()
        } else {
            format!("{address},{coordinate}")
        };
        Self {
            address,
            coordinate,
            encoded,
        }
    }

    /// Parses `"<address>,<lat>,<lng>"` or `"<lat>,<lng>"`.
    pub fn parse(s: &str) -> CoreResult<Self> {
        let mut fields = s.rsplitn(3, ',');
        let lng = fields.next();
        let lat = fields.next();
        let address = fields.next().unwrap_or_default();
        let coordinate = match (lat, lng) {
            (Some(lat), Some(lng)) => Coordinate::from_parts(lat, lng),
            _ => None,
        }
        .ok_or_else(|| CoreError::InvalidStop(s.to_string()))?;

        Ok(Self {
            address: address.trim().to_string(),
            coordinate,
            encoded: s.to_string(),
        })
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn coordinate(&self) -> Coordinate {
        self.coordinate
    }

    /// The text this stop serializes to.
    pub fn encoded(&self) -> &str {
        &self.encoded
    }

    /// Returns a copy of this stop carrying `address`. The coordinate is unchanged.
    pub fn with_address(&self, address: impl Into<String>) -> Self {
        Stop::new(address, self.coordinate)
    }
}

impl Display for Stop {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.encoded)
    }
}

impl FromStr for Stop {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Stop::parse(s)
    }
}

impl Serialize for Stop {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.encoded)
    }
}

impl<'de> Deserialize<'de> for Stop {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Stop::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trip() {
        let s = "123 Main St,13.72,100.52";
        let stop = Stop::parse(s).unwrap();
        assert_eq!(stop.address(), "123 Main St");
        assert_eq!(stop.coordinate(), Coordinate::new(13.72, 100.52).unwrap());
        assert_eq!(stop.to_string(), s);

        let rebuilt = Stop::new(stop.address(), stop.coordinate());
        assert_eq!(rebuilt.to_string(), s);
    }

    #[test]
    fn test_parse_bare_coordinate() {
        let stop = Stop::parse("13.72,100.52").unwrap();
        assert_eq!(stop.address(), "");
        assert_eq!(stop.coordinate().lat(), 13.72);
        assert_eq!(Stop::new("", stop.coordinate()).to_string(), "13.72,100.52");
    }

    #[test]
    fn test_address_with_commas() {
        let s = "99/1 Moo 4, Bang Phli, Samut Prakan,13.6,100.7";
        let stop = Stop::parse(s).unwrap();
        assert_eq!(stop.address(), "99/1 Moo 4, Bang Phli, Samut Prakan");
        assert_eq!(stop.coordinate().lng(), 100.7);
        assert_eq!(stop.encoded(), s);
    }

    #[test]
    fn test_encoded_text_is_preserved() {
        // Trailing zeros and spaces would be lost if we re-formatted the coordinate.
        let s = "Depot, 13.720, 100.520";
        let stop = Stop::parse(s).unwrap();
        assert_eq!(stop.to_string(), s);
        assert_eq!(serde_json::to_string(&stop).unwrap(), format!("\"{s}\""));
    }

    #[test]
    fn test_invalid_stops() {
        for s in ["", "Main St", "Main St,abc,100.5", "Main St,13.5", "x,NaN,1.0"] {
            assert_eq!(
                Stop::parse(s).unwrap_err(),
                CoreError::InvalidStop(s.to_string()),
                "{s}"
            );
        }
    }

    #[test]
    fn test_with_address() {
        let stop = Stop::parse("13.72,100.52").unwrap();
        let labeled = stop.with_address("Lat Krabang Depot");
        assert_eq!(labeled.to_string(), "Lat Krabang Depot,13.72,100.52");
    }
}
