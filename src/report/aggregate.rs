//! Buckets a month's financial records by calendar day and totals them.
//!
//! Everything here is synchronous and pure. The buckets borrow from the fetched record list and
//! are rebuilt from scratch whenever that list changes.

use crate::model::{Amount, DayKey, DayZone, FinancialRecord};
use std::collections::BTreeMap;

/// Records grouped by the day they were created on. Days iterate in ascending order and records
/// within a day keep their input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DayBuckets<'a> {
    zone: DayZone,
    buckets: BTreeMap<DayKey, Vec<&'a FinancialRecord>>,
}

/// Groups `records` by the day their timestamp falls on in `zone`. Empty input gives no buckets.
pub fn group_by_day(records: &[FinancialRecord], zone: DayZone) -> DayBuckets<'_> {
    let mut buckets: BTreeMap<DayKey, Vec<&FinancialRecord>> = BTreeMap::new();
    for record in records {
        buckets.entry(record.day_key(zone)).or_default().push(record);
    }
    DayBuckets { zone, buckets }
}

/// Sums `selector` over one bucket. An empty bucket totals zero.
pub fn daily_total<F>(bucket: &[&FinancialRecord], selector: F) -> Amount
where
    F: Fn(&FinancialRecord) -> Amount,
{
    bucket.iter().copied().map(selector).sum()
}

/// Sums `selector` over every record, regardless of day. An empty list totals zero.
pub fn grand_total<F>(records: &[FinancialRecord], selector: F) -> Amount
where
    F: Fn(&FinancialRecord) -> Amount,
{
    records.iter().map(selector).sum()
}

/// The records of `day`, or nothing when no record falls on it. An absent day is normal, e.g.
/// when no day has been picked yet.
pub fn selected_day_records<'b, 'a>(
    buckets: &'b DayBuckets<'a>,
    day: DayKey,
) -> &'b [&'a FinancialRecord] {
    buckets.get(day)
}

impl<'a> DayBuckets<'a> {
    pub fn zone(&self) -> DayZone {
        self.zone
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn days(&self) -> impl Iterator<Item = DayKey> + '_ {
        self.buckets.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (DayKey, &[&'a FinancialRecord])> + '_ {
        self.buckets.iter().map(|(day, records)| (*day, records.as_slice()))
    }

    pub fn get(&self, day: DayKey) -> &[&'a FinancialRecord] {
        self.buckets.get(&day).map(Vec::as_slice).unwrap_or_default()
    }

    /// The total of `day`, zero when the day has no records.
    pub fn daily_total<F>(&self, day: DayKey, selector: F) -> Amount
    where
        F: Fn(&FinancialRecord) -> Amount,
    {
        daily_total(self.get(day), selector)
    }
}

/// The monetary value a report sums for each record.
pub mod selectors {
    use crate::model::{Amount, FinancialRecord, RecordKind};

    /// The invoice or receipt amount, or an order's income.
    pub fn amount(record: &FinancialRecord) -> Amount {
        record.amount()
    }

    /// An order's oil, tollway and other fees. Invoices and receipts contribute their amount.
    pub fn expenses(record: &FinancialRecord) -> Amount {
        record.expenses()
    }

    /// The selector a report section sums by default: expenses for orders, amounts otherwise.
    pub fn for_kind(kind: RecordKind) -> fn(&FinancialRecord) -> Amount {
        match kind {
            RecordKind::Orders => expenses,
            RecordKind::Invoices | RecordKind::Receipts => amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ingest, RecordKind};
    use std::str::FromStr;

    fn amount(s: &str) -> Amount {
        Amount::from_str(s).unwrap()
    }

    fn day(s: &str) -> DayKey {
        DayKey::from_str(s).unwrap()
    }

    fn march_receipts() -> Vec<FinancialRecord> {
        ingest(
            RecordKind::Receipts,
            r#"[
                {"id": "a", "date": "2024-03-01", "amount": 100},
                {"id": "b", "date": "2024-03-01", "amount": 50},
                {"id": "c", "date": "2024-03-02", "amount": 200}
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn test_monthly_report_scenario() {
        let records = march_receipts();
        let buckets = group_by_day(&records, DayZone::Utc);
        assert_eq!(
            buckets.days().map(|d| d.to_string()).collect::<Vec<_>>(),
            vec!["2024-03-01", "2024-03-02"]
        );
        let first = buckets.get(day("2024-03-01"));
        assert_eq!(
            first.iter().map(|r| r.id()).collect::<Vec<_>>(),
            vec!["a", "b"]
        );
        assert_eq!(buckets.get(day("2024-03-02")).len(), 1);
        assert_eq!(
            buckets.daily_total(day("2024-03-01"), selectors::amount),
            amount("150")
        );
        assert_eq!(grand_total(&records, selectors::amount), amount("350"));
    }

    #[test]
    fn test_daily_totals_sum_to_grand_total() {
        let records = ingest(
            RecordKind::Orders,
            r#"[
                {"id": "1", "createdAt": "2024-03-01T23:30:00+00:00", "oilFee": 10, "tollwayFee": 1},
                {"id": "2", "createdAt": "2024-03-01T16:59:00+00:00", "oilFee": 20, "otherFee": 2.5},
                {"id": "3", "createdAt": "2024-03-03 09:00", "oilFee": 30},
                {"id": "4", "createdAt": "2024-03-31T18:00:00+07:00", "tollwayFee": 40},
                {"id": "5", "createdAt": "2024-03-15", "income": 999}
            ]"#,
        )
        .unwrap();
        for zone in [
            DayZone::Utc,
            DayZone::from_str("+07:00").unwrap(),
            DayZone::from_str("-05:00").unwrap(),
        ] {
            let buckets = group_by_day(&records, zone);
            let summed: Amount = buckets
                .iter()
                .map(|(_, bucket)| daily_total(bucket, selectors::expenses))
                .sum();
            assert_eq!(summed, grand_total(&records, selectors::expenses), "{zone}");
            let counted: usize = buckets.iter().map(|(_, bucket)| bucket.len()).sum();
            assert_eq!(counted, records.len());
        }
    }

    #[test]
    fn test_zone_moves_records_across_midnight() {
        let records = ingest(
            RecordKind::Invoices,
            r#"[{"id": "late", "createdAt": "2024-03-01T20:00:00Z", "amount": 5}]"#,
        )
        .unwrap();
        let utc = group_by_day(&records, DayZone::Utc);
        assert_eq!(utc.get(day("2024-03-01")).len(), 1);
        let bangkok = group_by_day(&records, DayZone::from_str("+07:00").unwrap());
        assert!(bangkok.get(day("2024-03-01")).is_empty());
        assert_eq!(bangkok.get(day("2024-03-02")).len(), 1);
    }

    #[test]
    fn test_empty_inputs() {
        let buckets = group_by_day(&[], DayZone::Local);
        assert!(buckets.is_empty());
        assert_eq!(grand_total(&[], selectors::amount), Amount::ZERO);
        assert_eq!(daily_total(&[], selectors::amount), Amount::ZERO);
        assert_eq!(
            buckets.daily_total(day("2024-03-09"), selectors::amount),
            Amount::ZERO
        );
        assert!(selected_day_records(&buckets, day("2024-03-09")).is_empty());
    }

    #[test]
    fn test_custom_selector() {
        let records = march_receipts();
        let doubled = grand_total(&records, |r| r.amount() + r.amount());
        assert_eq!(doubled, amount("700"));
    }

    #[test]
    fn test_selector_for_kind() {
        let orders = ingest(
            RecordKind::Orders,
            r#"[{"id": "o", "createdAt": "2024-03-01", "income": 500, "oilFee": 7}]"#,
        )
        .unwrap();
        assert_eq!(
            grand_total(&orders, selectors::for_kind(RecordKind::Orders)),
            amount("7")
        );
        assert_eq!(
            grand_total(&march_receipts(), selectors::for_kind(RecordKind::Receipts)),
            amount("350")
        );
    }
}
