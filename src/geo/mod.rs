//! Location services: drop-off sequencing and address resolution.
//!
//! The distance-matrix and reverse-geocoding providers are reached through the `DistanceService`
//! and `GeocodeService` traits. `GoogleMaps` implements them against the Google Maps web services
//! and `TestMaps` implements them in memory.

mod cancel;
mod google;
mod resolver;
mod response;
mod sequencer;
mod test_client;

pub use cancel::{cancel_pair, CancelHandle, CancelToken};
pub use google::GoogleMaps;
pub use resolver::AddressResolver;
pub use response::{
    DistanceMatrix, GeocodeResponse, GeocodeResult, MatrixElement, MatrixRow, Measure, STATUS_OK,
    STATUS_ZERO_RESULTS,
};
pub use sequencer::{sort_stops_by_distance, RouteCache};
pub use test_client::TestMaps;

use crate::error::{CoreError, CoreResult};
use crate::model::Coordinate;
use crate::{Mode, Transport};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// A provider of origin-to-destination travel distances.
#[async_trait::async_trait]
pub trait DistanceService: Send + Sync {
    /// Issues one distance-matrix request with `origin` as the only row and every destination as a
    /// column. Implementations return the provider's response as-is; validating it is the
    /// caller's job.
    async fn distance_matrix(
        &self,
        transport: &Transport,
        origin: Coordinate,
        destinations: &[Coordinate],
    ) -> CoreResult<DistanceMatrix>;
}

/// A provider of addresses for coordinates.
#[async_trait::async_trait]
pub trait GeocodeService: Send + Sync {
    async fn reverse_geocode(
        &self,
        transport: &Transport,
        at: Coordinate,
    ) -> CoreResult<GeocodeResponse>;
}

/// Creates the distance service for `mode`.
pub fn distance_service(mode: Mode) -> Arc<dyn DistanceService> {
    match mode {
        Mode::Live => Arc::new(GoogleMaps),
        Mode::Test => Arc::new(TestMaps::default()),
    }
}

/// Creates the geocoding service for `mode`.
pub fn geocode_service(mode: Mode) -> Arc<dyn GeocodeService> {
    match mode {
        Mode::Live => Arc::new(GoogleMaps),
        Mode::Test => Arc::new(TestMaps::default()),
    }
}

/// Limits applied to one location query.
#[derive(Debug, Clone)]
pub struct QueryOptions {
    timeout: Duration,
    cancel: Option<CancelToken>,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self::new(Duration::from_secs(15))
    }
}

impl QueryOptions {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            cancel: None,
        }
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Runs `query`, giving up with `ServiceUnavailable` after the timeout and with `Cancelled` when
/// the token fires.
pub(crate) async fn guarded<T, F>(what: &str, options: &QueryOptions, query: F) -> CoreResult<T>
where
    F: Future<Output = CoreResult<T>>,
{
    let mut cancel = options.cancel.clone().unwrap_or_else(CancelToken::never);
    if cancel.is_cancelled() {
        return Err(CoreError::Cancelled);
    }
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(CoreError::Cancelled),
        result = tokio::time::timeout(options.timeout(), query) => match result {
            Ok(inner) => inner,
            Err(_) => Err(CoreError::unavailable(format!(
                "{what} timed out after {:?}",
                options.timeout()
            ))),
        },
    }
}
