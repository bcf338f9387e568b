//! Response shapes of the distance-matrix and reverse-geocoding services. These follow the Google
//! Maps JSON format; the in-memory test service produces the same shapes.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};

/// The status string every Google Maps response carries on success.
pub const STATUS_OK: &str = "OK";

/// The status reported when a query matched nothing.
pub const STATUS_ZERO_RESULTS: &str = "ZERO_RESULTS";

/// A distance-matrix response. We always send one origin, so we only ever look at the first row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DistanceMatrix {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default)]
    pub rows: Vec<MatrixRow>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatrixRow {
    #[serde(default)]
    pub elements: Vec<MatrixElement>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatrixElement {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<Measure>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<Measure>,
}

/// A measured quantity: `value` is the scalar (meters or seconds), `text` is for display only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Measure {
    pub value: f64,
    #[serde(default)]
    pub text: String,
}

impl DistanceMatrix {
    /// Builds a successful one-row matrix from distances in meters.
    pub fn from_meters(meters: impl IntoIterator<Item = f64>) -> Self {
        let elements = meters
            .into_iter()
            .map(|m| MatrixElement {
                status: STATUS_OK.to_string(),
                distance: Some(Measure {
                    value: m,
                    text: format!("{:.1} km", m / 1000.0),
                }),
                duration: None,
            })
            .collect();
        Self {
            status: STATUS_OK.to_string(),
            error_message: None,
            rows: vec![MatrixRow { elements }],
        }
    }

    /// A failed response carrying only `status`.
    pub fn failed(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            ..Self::default()
        }
    }

    /// Reads the origin-to-destination distances out of the first row.
    ///
    /// The whole response is rejected as `ServiceUnavailable` unless the overall status is `OK` and
    /// there is exactly one usable distance per destination. A partially usable matrix is never
    /// returned.
    pub fn origin_distances(&self, destinations: usize) -> CoreResult<Vec<f64>> {
        if self.status != STATUS_OK {
            let detail = self
                .error_message
                .as_deref()
                .map(|m| format!(": {m}"))
                .unwrap_or_default();
            return Err(CoreError::unavailable(format!(
                "distance query returned status {}{detail}",
                self.status
            )));
        }
        let row = self
            .rows
            .first()
            .ok_or_else(|| CoreError::unavailable("distance query returned no rows"))?;
        if row.elements.len() != destinations {
            return Err(CoreError::unavailable(format!(
                "distance query returned {} elements for {destinations} destinations",
                row.elements.len()
            )));
        }
        row.elements
            .iter()
            .enumerate()
            .map(|(ix, element)| match (&element.distance, element.status.as_str()) {
                (Some(distance), STATUS_OK) if distance.value.is_finite() => Ok(distance.value),
                _ => Err(CoreError::unavailable(format!(
                    "no distance for destination {ix} (status {})",
                    element.status
                ))),
            })
            .collect()
    }
}

/// A reverse-geocoding response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeocodeResponse {
    pub status: String,
    #[serde(default)]
    pub results: Vec<GeocodeResult>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeocodeResult {
    pub formatted_address: String,
}

impl GeocodeResponse {
    pub fn found(address: impl Into<String>) -> Self {
        Self {
            status: STATUS_OK.to_string(),
            results: vec![GeocodeResult {
                formatted_address: address.into(),
            }],
        }
    }

    pub fn zero_results() -> Self {
        Self {
            status: STATUS_ZERO_RESULTS.to_string(),
            results: Vec::new(),
        }
    }

    /// The best (first) match. `key` names the coordinate in the error.
    pub fn best_match(&self, key: &str) -> CoreResult<String> {
        if self.status != STATUS_OK {
            return Err(CoreError::GeocodeNotFound(key.to_string()));
        }
        self.results
            .iter()
            .map(|r| r.formatted_address.trim())
            .find(|a| !a.is_empty())
            .map(str::to_string)
            .ok_or_else(|| CoreError::GeocodeNotFound(key.to_string()))
    }
}
