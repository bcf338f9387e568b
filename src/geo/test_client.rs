//! Implements the location service traits using in-memory data for testing purposes.
//!
//! Note: this is compiled even in the "production" version of this app so that we can run the whole
//! app, top-to-bottom, without calling Google Maps.

use crate::error::{CoreError, CoreResult};
use crate::geo::{DistanceMatrix, DistanceService, GeocodeResponse, GeocodeService};
use crate::model::Coordinate;
use crate::{Result, Transport};
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::warn;

/// An implementation of the location service traits that does not use Google Maps. Distances are
/// looked up by destination and otherwise computed as straight-line meters from the origin.
/// Addresses are looked up by coordinate key and, by default, seeded with a few known places.
#[derive(Debug)]
pub struct TestMaps {
    distances: HashMap<String, f64>,
    addresses: HashMap<String, String>,
    status: Option<String>,
    delay: Option<Duration>,
    distance_calls: AtomicUsize,
    geocode_calls: AtomicUsize,
}

impl TestMaps {
    /// An instance with no seeded addresses.
    pub fn empty() -> Self {
        Self {
            distances: HashMap::new(),
            addresses: HashMap::new(),
            status: None,
            delay: None,
            distance_calls: AtomicUsize::new(0),
            geocode_calls: AtomicUsize::new(0),
        }
    }

    /// Loads the seed addresses from this module.
    pub fn seeded() -> Self {
        let mut maps = Self::empty();
        match load_csv(ADDRESS_DATA) {
            Ok(rows) => {
                for (coordinate, address) in rows {
                    maps.addresses.insert(coordinate.key(), address);
                }
            }
            Err(e) => warn!("Unable to load the seed addresses: {e:#}"),
        }
        maps
    }

    /// Answers distance queries for `destination` with `meters`, regardless of origin.
    pub fn with_distance(mut self, destination: Coordinate, meters: f64) -> Self {
        self.distances.insert(destination.key(), meters);
        self
    }

    pub fn with_address(mut self, at: Coordinate, address: impl Into<String>) -> Self {
        self.addresses.insert(at.key(), address.into());
        self
    }

    /// Makes every distance query report `status` instead of succeeding.
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Makes every query wait `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn distance_calls(&self) -> usize {
        self.distance_calls.load(Ordering::SeqCst)
    }

    pub fn geocode_calls(&self) -> usize {
        self.geocode_calls.load(Ordering::SeqCst)
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

impl Default for TestMaps {
    /// Loads seed data from this module.
    fn default() -> Self {
        Self::seeded()
    }
}

#[async_trait::async_trait]
impl DistanceService for TestMaps {
    async fn distance_matrix(
        &self,
        _transport: &Transport,
        origin: Coordinate,
        destinations: &[Coordinate],
    ) -> CoreResult<DistanceMatrix> {
        self.distance_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if let Some(status) = &self.status {
            return Ok(DistanceMatrix::failed(status.clone()));
        }
        Ok(DistanceMatrix::from_meters(destinations.iter().map(|d| {
            self.distances
                .get(&d.key())
                .copied()
                .unwrap_or_else(|| origin.haversine_meters(d))
        })))
    }
}

#[async_trait::async_trait]
impl GeocodeService for TestMaps {
    async fn reverse_geocode(
        &self,
        _transport: &Transport,
        at: Coordinate,
    ) -> CoreResult<GeocodeResponse> {
        self.geocode_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if self.status.is_some() {
            return Err(CoreError::unavailable("test geocoder is failing"));
        }
        Ok(match self.addresses.get(&at.key()) {
            Some(address) => GeocodeResponse::found(address.clone()),
            None => GeocodeResponse::zero_results(),
        })
    }
}

/// Loads `latitude,longitude,address` rows from a CSV-formatted string.
fn load_csv(csv_data: &str) -> Result<Vec<(Coordinate, String)>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(Cursor::new(csv_data.as_bytes()));

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let (Some(lat), Some(lng), Some(address)) = (record.get(0), record.get(1), record.get(2))
        else {
            anyhow::bail!("Seed address row is missing fields: {record:?}");
        };
        let coordinate = Coordinate::from_parts(lat, lng)
            .ok_or_else(|| anyhow::anyhow!("Bad seed coordinate '{lat},{lng}'"))?;
        rows.push((coordinate, address.to_string()));
    }
    Ok(rows)
}

/// Seed address data.
const ADDRESS_DATA: &str = r##"latitude,longitude,address
13.7563,100.5018,"Phra Borom Maha Ratchawang, Phra Nakhon, Bangkok 10200, Thailand"
13.7466,100.5393,"Siam Paragon, 991 Rama I Rd, Pathum Wan, Bangkok 10330, Thailand"
13.6900,100.7501,"Suvarnabhumi Airport, Racha Thewa, Bang Phli District, Samut Prakan 10540, Thailand"
13.7308,100.5695,"Sukhumvit Soi 24, Khlong Tan, Khlong Toei, Bangkok 10110, Thailand"
13.8127,100.5523,"Chatuchak Weekend Market, Kamphaeng Phet 2 Rd, Chatuchak, Bangkok 10900, Thailand"
"##;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::transport;

    #[tokio::test]
    async fn test_seeded_address() {
        let maps = TestMaps::seeded();
        let at = Coordinate::new(13.7466, 100.5393).unwrap();
        let response = maps.reverse_geocode(&transport(), at).await.unwrap();
        assert!(response.best_match(&at.key()).unwrap().starts_with("Siam Paragon"));
        assert_eq!(maps.geocode_calls(), 1);
    }

    #[tokio::test]
    async fn test_distance_override_and_fallback() {
        let origin = Coordinate::new(13.7563, 100.5018).unwrap();
        let near = Coordinate::new(13.7466, 100.5393).unwrap();
        let far = Coordinate::new(13.6900, 100.7501).unwrap();
        let maps = TestMaps::empty().with_distance(far, 5.0);
        let matrix = maps
            .distance_matrix(&transport(), origin, &[near, far])
            .await
            .unwrap();
        let distances = matrix.origin_distances(2).unwrap();
        assert!(distances[0] > 3000.0 && distances[0] < 5000.0, "{distances:?}");
        assert_eq!(distances[1], 5.0);
        assert_eq!(maps.distance_calls(), 1);
    }
}
