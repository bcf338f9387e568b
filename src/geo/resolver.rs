//! Turns coordinates into human-readable addresses, remembering every answer for the session.

use crate::error::CoreResult;
use crate::geo::{guarded, GeocodeService, QueryOptions};
use crate::model::{Coordinate, Stop};
use crate::Transport;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Resolves coordinates to addresses through a `GeocodeService`.
///
/// Successful lookups are cached under the coordinate's `"lat,lng"` key for as long as the
/// resolver (or any clone of it) lives. The cache only grows. Failed lookups are not cached, so
/// they are retried the next time they are asked for.
#[derive(Clone)]
pub struct AddressResolver {
    service: Arc<dyn GeocodeService>,
    cache: Arc<RwLock<HashMap<String, String>>>,
}

impl AddressResolver {
    pub fn new(service: Arc<dyn GeocodeService>) -> Self {
        Self {
            service,
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Returns the best-match address for `at`.
    ///
    /// Fails with `GeocodeNotFound` when the provider has no result, `ServiceUnavailable` when it
    /// cannot be reached in time, and `Cancelled` when `options` carries a token that fires first.
    pub async fn resolve_address(
        &self,
        transport: &Transport,
        at: Coordinate,
        options: &QueryOptions,
    ) -> CoreResult<String> {
        let key = at.key();
        if let Some(address) = self.cached(&key).await {
            debug!("Address cache hit for {key}");
            return Ok(address);
        }

        let response = guarded(
            "reverse geocode",
            options,
            self.service.reverse_geocode(transport, at),
        )
        .await?;
        let address = response.best_match(&key)?;
        self.cache
            .write()
            .await
            .entry(key)
            .or_insert_with(|| address.clone());
        Ok(address)
    }

    /// Looks `key` up in the cache only.
    pub async fn cached(&self, key: &str) -> Option<String> {
        self.cache.read().await.get(key).cloned()
    }

    /// Returns `stops` with every empty address filled in from the geocoder. A stop whose lookup
    /// fails keeps its empty address and the failure is logged. Stops that already have an address
    /// are returned untouched.
    pub async fn label_stops(
        &self,
        transport: &Transport,
        stops: &[Stop],
        options: &QueryOptions,
    ) -> Vec<Stop> {
        let mut labelled = Vec::with_capacity(stops.len());
        for stop in stops {
            if !stop.address().is_empty() {
                labelled.push(stop.clone());
                continue;
            }
            match self
                .resolve_address(transport, stop.coordinate(), options)
                .await
            {
                Ok(address) => labelled.push(stop.with_address(address)),
                Err(e) => {
                    warn!("Unable to resolve an address for {}: {e}", stop.coordinate());
                    labelled.push(stop.clone());
                }
            }
        }
        labelled
    }
}

impl std::fmt::Debug for AddressResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AddressResolver").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::geo::{cancel_pair, TestMaps};
    use crate::test::transport;
    use std::time::Duration;

    fn coord(lat: f64, lng: f64) -> Coordinate {
        Coordinate::new(lat, lng).unwrap()
    }

    #[tokio::test]
    async fn test_resolve_is_cached() {
        let at = coord(13.7308, 100.5695);
        let maps = Arc::new(TestMaps::empty().with_address(at, "Sukhumvit Soi 24, Bangkok"));
        let resolver = AddressResolver::new(maps.clone());
        let options = QueryOptions::default();

        let first = resolver
            .resolve_address(&transport(), at, &options)
            .await
            .unwrap();
        let second = resolver
            .resolve_address(&transport(), at, &options)
            .await
            .unwrap();
        assert_eq!(first, "Sukhumvit Soi 24, Bangkok");
        assert_eq!(first, second);
        assert_eq!(maps.geocode_calls(), 1);
        assert_eq!(resolver.cached(&at.key()).await.unwrap(), first);
    }

    #[tokio::test]
    async fn test_not_found_is_not_cached() {
        let maps = Arc::new(TestMaps::empty());
        let resolver = AddressResolver::new(maps.clone());
        let at = coord(0.0, 0.0);
        for _ in 0..2 {
            let err = resolver
                .resolve_address(&transport(), at, &QueryOptions::default())
                .await
                .unwrap_err();
            assert_eq!(err, CoreError::GeocodeNotFound(at.key()));
        }
        assert_eq!(maps.geocode_calls(), 2);
        assert!(resolver.cached(&at.key()).await.is_none());
    }

    #[tokio::test]
    async fn test_label_stops_fails_soft() {
        let known = coord(13.7466, 100.5393);
        let maps = Arc::new(TestMaps::seeded());
        let resolver = AddressResolver::new(maps.clone());
        let stops = vec![
            Stop::new("", known),
            Stop::new("", coord(1.0, 1.0)),
            Stop::parse("Warehouse 7,13.9,100.6").unwrap(),
        ];
        let labelled = resolver
            .label_stops(&transport(), &stops, &QueryOptions::default())
            .await;
        assert!(labelled[0].address().starts_with("Siam Paragon"));
        assert_eq!(labelled[0].coordinate(), known);
        assert_eq!(labelled[1].address(), "");
        assert_eq!(labelled[2], stops[2]);
        assert_eq!(maps.geocode_calls(), 2);
    }

    #[tokio::test]
    async fn test_resolve_timeout_is_unavailable_and_not_cached() {
        let at = coord(13.7308, 100.5695);
        let maps = Arc::new(
            TestMaps::empty()
                .with_address(at, "Sukhumvit Soi 24, Bangkok")
                .with_delay(Duration::from_secs(5)),
        );
        let resolver = AddressResolver::new(maps.clone());
        let options = QueryOptions::new(Duration::from_millis(20));
        let err = resolver
            .resolve_address(&transport(), at, &options)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::ServiceUnavailable(_)), "{err:?}");
        assert!(resolver.cached(&at.key()).await.is_none());
    }

    #[tokio::test]
    async fn test_resolve_cancel_in_flight() {
        let at = coord(13.7308, 100.5695);
        let maps = Arc::new(
            TestMaps::empty()
                .with_address(at, "Sukhumvit Soi 24, Bangkok")
                .with_delay(Duration::from_secs(5)),
        );
        let resolver = AddressResolver::new(maps.clone());
        let (handle, token) = cancel_pair();
        let options = QueryOptions::default().with_cancel(token);
        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            handle.cancel();
        });
        let err = resolver
            .resolve_address(&transport(), at, &options)
            .await
            .unwrap_err();
        canceller.await.unwrap();
        assert_eq!(err, CoreError::Cancelled);
        assert_eq!(maps.geocode_calls(), 1);
        assert!(resolver.cached(&at.key()).await.is_none());
    }
}
