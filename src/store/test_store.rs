//! Implements `RecordStore` using in-memory data for testing purposes.
//!
//! Note: this is compiled even in the "production" version of this app so that we can run the whole
//! app, top-to-bottom, without the dashboard API.

use crate::model::{ingest, DayZone, FinancialRecord, Month, RecordKind};
use crate::store::RecordStore;
use crate::{Result, Transport};
use anyhow::bail;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::warn;

/// An implementation of `RecordStore` that holds its records in memory. By default it is seeded
/// with a few weeks of orders, invoices and receipts.
#[derive(Debug)]
pub struct TestRecordStore {
    records: HashMap<RecordKind, Vec<FinancialRecord>>,
    failures: AtomicUsize,
    calls: AtomicUsize,
}

impl TestRecordStore {
    /// Creates a store holding `records`, each listed under its own kind.
    pub fn new(records: impl IntoIterator<Item = FinancialRecord>) -> Self {
        let mut map: HashMap<RecordKind, Vec<FinancialRecord>> = HashMap::new();
        for record in records {
            map.entry(record.kind()).or_default().push(record);
        }
        Self {
            records: map,
            failures: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    /// Loads seed data from this module.
    pub fn seeded() -> Self {
        let mut records = Vec::new();
        for (kind, json) in [
            (RecordKind::Orders, ORDER_DATA),
            (RecordKind::Invoices, INVOICE_DATA),
            (RecordKind::Receipts, RECEIPT_DATA),
        ] {
            match ingest(kind, json) {
                Ok(mut seeded) => records.append(&mut seeded),
                Err(e) => warn!("Unable to load the seed {kind}: {e}"),
            }
        }
        Self::new(records)
    }

    /// Makes the next `count` fetches fail.
    pub fn fail_next(self, count: usize) -> Self {
        self.failures.store(count, Ordering::SeqCst);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for TestRecordStore {
    fn default() -> Self {
        Self::seeded()
    }
}

#[async_trait::async_trait]
impl RecordStore for TestRecordStore {
    async fn fetch_month(
        &self,
        _transport: &Transport,
        kind: RecordKind,
        month: Month,
    ) -> Result<Vec<FinancialRecord>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            bail!("The test record store is unavailable");
        }
        Ok(self
            .records
            .get(&kind)
            .map(|records| {
                records
                    .iter()
                    .filter(|r| month.contains(r.day_key(DayZone::Utc)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

/// Seed order data.
const ORDER_DATA: &str = r##"[
  {"_id": "ord-0301-a", "createdAt": "2024-03-01 08:30:00", "customer": "Siam Cement",
   "income": "12,000", "oilFee": "1,850.00", "tollwayFee": "120", "otherFee": "0"},
  {"_id": "ord-0301-b", "createdAt": "2024-03-01 13:05:00", "customer": "Thai Beverage",
   "income": "8,500", "oilFee": "1,200.00", "tollwayFee": "90", "otherFee": "150"},
  {"_id": "ord-0304-a", "createdAt": "2024-03-04 07:45:00", "customer": "CP Foods",
   "income": "15,000", "oilFee": "2,400.00", "tollwayFee": "210", "otherFee": "300"},
  {"_id": "ord-0402-a", "createdAt": "2024-04-02 09:00:00", "customer": "Siam Cement",
   "income": "9,000", "oilFee": "1,500.00", "tollwayFee": "120", "otherFee": "0"}
]"##;

/// Seed invoice data.
const INVOICE_DATA: &str = r##"[
  {"id": "inv-1001", "createdAt": "2024-03-01 10:00:00", "customer": "Siam Cement", "amount": "12,000"},
  {"id": "inv-1002", "createdAt": "2024-03-05 16:20:00", "customer": "CP Foods", "amount": "15,000"}
]"##;

/// Seed receipt data.
const RECEIPT_DATA: &str = r##"[
  {"id": "rcp-1", "createdAt": "2024-03-01", "customer": "Siam Cement", "amount": 100},
  {"id": "rcp-2", "createdAt": "2024-03-01", "customer": "Thai Beverage", "amount": 50},
  {"id": "rcp-3", "createdAt": "2024-03-02", "customer": "CP Foods", "amount": 200}
]"##;
