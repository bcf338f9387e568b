//! Implements the location service traits using the Google Maps web services.

use crate::error::{CoreError, CoreResult};
use crate::geo::{DistanceMatrix, DistanceService, GeocodeResponse, GeocodeService};
use crate::model::Coordinate;
use crate::Transport;
use serde::de::DeserializeOwned;
use tracing::trace;
use url::Url;

/// Talks to the Distance Matrix and Geocoding APIs. All state (the API key, the HTTP client, the
/// timeout) lives in the `Transport` passed into each call.
#[derive(Debug, Clone, Copy, Default)]
pub struct GoogleMaps;

#[async_trait::async_trait]
impl DistanceService for GoogleMaps {
    async fn distance_matrix(
        &self,
        transport: &Transport,
        origin: Coordinate,
        destinations: &[Coordinate],
    ) -> CoreResult<DistanceMatrix> {
        let destinations = destinations
            .iter()
            .map(Coordinate::key)
            .collect::<Vec<_>>()
            .join("|");
        let url = endpoint(
            transport,
            "distancematrix/json",
            &[("origins", origin.key()), ("destinations", destinations)],
        )?;
        get_json(transport, url).await
    }
}

#[async_trait::async_trait]
impl GeocodeService for GoogleMaps {
    async fn reverse_geocode(
        &self,
        transport: &Transport,
        at: Coordinate,
    ) -> CoreResult<GeocodeResponse> {
        let url = endpoint(transport, "geocode/json", &[("latlng", at.key())])?;
        get_json(transport, url).await
    }
}

/// Builds `{maps_url}/{path}?{params}&key={key}`.
fn endpoint(transport: &Transport, path: &str, params: &[(&str, String)]) -> CoreResult<Url> {
    let key = transport
        .maps_key()
        .ok_or_else(|| CoreError::unavailable("no maps API key is configured"))?;
    let mut url = transport
        .maps_url()
        .join(path)
        .map_err(|e| CoreError::unavailable(format!("invalid maps URL: {e}")))?;
    url.query_pairs_mut()
        .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())))
        .append_pair("key", key);
    Ok(url)
}

async fn get_json<T>(transport: &Transport, url: Url) -> CoreResult<T>
where
    T: DeserializeOwned,
{
    trace!("GET {}{}", url.origin().ascii_serialization(), url.path());
    let response = transport
        .client()
        .get(url)
        .send()
        .await
        .map_err(|e| CoreError::unavailable(format!("request failed: {}", e.without_url())))?;

    let status = response.status();
    if !status.is_success() {
        return Err(CoreError::unavailable(format!(
            "provider answered with HTTP {status}"
        )));
    }

    response
        .json::<T>()
        .await
        .map_err(|e| CoreError::unavailable(format!("malformed response: {}", e.without_url())))
}
