//! Orders the drop-off stops of a job by their distance from the pickup point.
//!
//! This is a sort by a precomputed key, not route optimization: only origin-to-stop distances are
//! considered, never stop-to-stop.

use crate::error::CoreResult;
use crate::geo::{guarded, DistanceService, QueryOptions};
use crate::model::{Coordinate, Order, Stop};
use crate::Transport;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, trace};

/// Sorts `stops` ascending by distance from `origin` using one batched distance query.
///
/// The returned stops are the input stops, unchanged apart from their position. Stops at equal
/// distances keep their relative input order. An empty list is returned as-is without a query.
///
/// Fails with `ServiceUnavailable` when the provider fails, times out, or answers with anything
/// other than one usable distance per stop, and with `Cancelled` when `options` carries a token
/// that fires first. No partially sorted list is ever returned.
pub async fn sort_stops_by_distance(
    service: &dyn DistanceService,
    transport: &Transport,
    origin: Coordinate,
    stops: &[Stop],
    options: &QueryOptions,
) -> CoreResult<Vec<Stop>> {
    if stops.is_empty() {
        return Ok(Vec::new());
    }
    let destinations: Vec<Coordinate> = stops.iter().map(Stop::coordinate).collect();
    debug!(
        "Querying distances from {origin} to {} stops",
        destinations.len()
    );
    let matrix = guarded(
        "distance query",
        options,
        service.distance_matrix(transport, origin, &destinations),
    )
    .await?;
    let distances = matrix.origin_distances(stops.len())?;

    let mut ranked: Vec<(f64, &Stop)> = distances.into_iter().zip(stops).collect();
    // `sort_by` is stable.
    ranked.sort_by(|a, b| a.0.total_cmp(&b.0));
    for (meters, stop) in &ranked {
        trace!("{meters:>10.1} m  {stop}");
    }
    Ok(ranked.into_iter().map(|(_, stop)| stop.clone()).collect())
}

#[derive(Debug, Clone)]
struct CachedRoute {
    origin: String,
    input: Vec<String>,
    sorted: Vec<Stop>,
}

/// Remembers the sorted drop-off list of each order so that asking again for the same order, with
/// the same origin and the same stops, does not query the distance service again. Clones share the same cache.
#[derive(Debug, Clone, Default)]
pub struct RouteCache {
    routes: Arc<RwLock<HashMap<String, CachedRoute>>>,
}

impl RouteCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `order`'s stops sorted by distance from its origin, from the cache when the order's
    /// origin and stop list are unchanged since the last successful sort. Failures are not cached.
    pub async fn sorted_stops(
        &self,
        service: &dyn DistanceService,
        transport: &Transport,
        order: &Order,
        options: &QueryOptions,
    ) -> CoreResult<Vec<Stop>> {
        let origin = order.origin.encoded().to_string();
        let input: Vec<String> = order.stops.iter().map(|s| s.encoded().to_string()).collect();
        if let Some(cached) = self.routes.read().await.get(&order.id) {
            if cached.origin == origin && cached.input == input {
                debug!("Using the cached route for order {}", order.id);
                return Ok(cached.sorted.clone());
            }
        }

        let sorted = sort_stops_by_distance(
            service,
            transport,
            order.origin.coordinate(),
            &order.stops,
            options,
        )
        .await?;
        self.routes.write().await.insert(
            order.id.clone(),
            CachedRoute {
                origin,
                input,
                sorted: sorted.clone(),
            },
        );
        Ok(sorted)
    }

    pub async fn len(&self) -> usize {
        self.routes.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.routes.read().await.is_empty()
    }
}
