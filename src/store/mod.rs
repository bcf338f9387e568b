//! The record store: a read-only view of the dashboard API's order, invoice and receipt lists.

mod http;
mod test_store;

pub use http::HttpRecordStore;
pub use test_store::TestRecordStore;

use crate::model::{FinancialRecord, Month, RecordKind};
use crate::{Mode, Result, Transport};
use std::sync::Arc;

/// Supplies the records of one kind for one month. Filtering by month is the store's job; the
/// core neither paginates nor writes through this interface.
#[async_trait::async_trait]
pub trait RecordStore: Send + Sync {
    async fn fetch_month(
        &self,
        transport: &Transport,
        kind: RecordKind,
        month: Month,
    ) -> Result<Vec<FinancialRecord>>;
}

/// Creates the record store for `mode`.
pub fn record_store(mode: Mode) -> Arc<dyn RecordStore> {
    match mode {
        Mode::Live => Arc::new(HttpRecordStore),
        Mode::Test => Arc::new(TestRecordStore::default()),
    }
}
