//! Financial records as returned by the dashboard API: order expenses, invoices and receipts.

use crate::error::{CoreError, CoreResult};
use crate::model::{Amount, DayKey, DayZone, Timestamp};
use serde::{Deserialize, Serialize};

/// The report section a record belongs to. This is also the record-store endpoint it comes from.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// Order-derived expenses, summed over the oil, tollway and other fees.
    #[default]
    Orders,
    Invoices,
    Receipts,
}

serde_plain::derive_display_from_serialize!(RecordKind);
serde_plain::derive_fromstr_from_deserialize!(RecordKind);

/// The kind-specific monetary fields of a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecordDetail {
    OrderExpense {
        income: Amount,
        oil_fee: Amount,
        tollway_fee: Amount,
        other_fee: Amount,
    },
    Invoice {
        amount: Amount,
    },
    Receipt {
        amount: Amount,
    },
}

/// A single financial record. Timestamps are validated when the record is created, so a record
/// always belongs to exactly one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FinancialRecord {
    id: String,
    created_at: Timestamp,
    customer: String,
    #[serde(flatten)]
    detail: RecordDetail,
}

impl FinancialRecord {
    pub fn new(
        id: impl Into<String>,
        created_at: Timestamp,
        customer: impl Into<String>,
        detail: RecordDetail,
    ) -> Self {
        Self {
            id: id.into(),
            created_at,
            customer: customer.into(),
            detail,
        }
    }

    /// Builds a receipt. Mostly useful in tests and seed data.
    pub fn receipt(id: &str, created_at: &str, customer: &str, amount: Amount) -> CoreResult<Self> {
        Ok(Self::new(
            id,
            Timestamp::parse(id, created_at)?,
            customer,
            RecordDetail::Receipt { amount },
        ))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn customer(&self) -> &str {
        &self.customer
    }

    pub fn detail(&self) -> &RecordDetail {
        &self.detail
    }

    pub fn kind(&self) -> RecordKind {
        match self.detail {
            RecordDetail::OrderExpense { .. } => RecordKind::Orders,
            RecordDetail::Invoice { .. } => RecordKind::Invoices,
            RecordDetail::Receipt { .. } => RecordKind::Receipts,
        }
    }

    pub fn day_key(&self, zone: DayZone) -> DayKey {
        self.created_at.day_key(zone)
    }

    /// The invoice or receipt amount, or an order's income.
    pub fn amount(&self) -> Amount {
        match &self.detail {
            RecordDetail::OrderExpense { income, .. } => *income,
            RecordDetail::Invoice { amount } | RecordDetail::Receipt { amount } => *amount,
        }
    }

    /// The sum of an order's oil, tollway and other fees. Invoices and receipts have no fee
    /// breakdown, so their amount is returned.
    pub fn expenses(&self) -> Amount {
        match &self.detail {
            RecordDetail::OrderExpense {
                oil_fee,
                tollway_fee,
                other_fee,
                ..
            } => *oil_fee + *tollway_fee + *other_fee,
            RecordDetail::Invoice { amount } | RecordDetail::Receipt { amount } => *amount,
        }
    }
}

/// The JSON shape of a record in a record-store array. Field names vary between endpoints, hence
/// the aliases.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireRecord {
    #[serde(alias = "_id")]
    id: WireId,
    #[serde(alias = "created_at", alias = "date")]
    created_at: String,
    #[serde(default, alias = "consumer", alias = "customerName")]
    customer: String,
    #[serde(default)]
    amount: Amount,
    #[serde(default)]
    income: Amount,
    #[serde(default)]
    oil_fee: Amount,
    #[serde(default)]
    tollway_fee: Amount,
    #[serde(default)]
    other_fee: Amount,
}

/// Ids are strings on some endpoints and integers on others.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum WireId {
    Text(String),
    Number(i64),
}

impl WireId {
    fn into_string(self) -> String {
        match self {
            WireId::Text(s) => s,
            WireId::Number(n) => n.to_string(),
        }
    }
}

impl WireRecord {
    fn into_record(self, kind: RecordKind) -> CoreResult<FinancialRecord> {
        let id = self.id.into_string();
        let created_at = Timestamp::parse(&id, &self.created_at)?;
        let detail = match kind {
            RecordKind::Orders => RecordDetail::OrderExpense {
                income: self.income,
                oil_fee: self.oil_fee,
                tollway_fee: self.tollway_fee,
                other_fee: self.other_fee,
            },
            RecordKind::Invoices => RecordDetail::Invoice {
                amount: self.amount,
            },
            RecordKind::Receipts => RecordDetail::Receipt {
                amount: self.amount,
            },
        };
        Ok(FinancialRecord::new(id, created_at, self.customer, detail))
    }
}

/// Parses a JSON array from the record store into records of `kind`.
///
/// Fails with `InvalidTimestamp` on the first record whose timestamp cannot be truncated to a day,
/// and with `InvalidRecord` when the JSON does not have the expected shape.
pub fn ingest(kind: RecordKind, json: &str) -> CoreResult<Vec<FinancialRecord>> {
    let wire: Vec<WireRecord> = serde_json::from_str(json)
        .map_err(|e| CoreError::InvalidRecord(format!("unable to parse {kind}: {e}")))?;
    ingest_wire(kind, wire)
}

/// Same as `ingest` for a body that has already been parsed into a JSON value.
pub fn ingest_value(kind: RecordKind, value: serde_json::Value) -> CoreResult<Vec<FinancialRecord>> {
    let wire: Vec<WireRecord> = serde_json::from_value(value)
        .map_err(|e| CoreError::InvalidRecord(format!("unable to parse {kind}: {e}")))?;
    ingest_wire(kind, wire)
}

fn ingest_wire(kind: RecordKind, wire: Vec<WireRecord>) -> CoreResult<Vec<FinancialRecord>> {
    wire.into_iter().map(|w| w.into_record(kind)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_ingest_orders() {
        let json = r#"[
            {"_id": "o1", "createdAt": "2024-03-01T09:15:00+07:00", "customer": "Siam Cement",
             "income": 12000, "oilFee": "1,500.00", "tollwayFee": 120, "otherFee": 80.5}
        ]"#;
        let records = ingest(RecordKind::Orders, json).unwrap();
        assert_eq!(records.len(), 1);
        let order = &records[0];
        assert_eq!(order.id(), "o1");
        assert_eq!(order.kind(), RecordKind::Orders);
        assert_eq!(order.customer(), "Siam Cement");
        assert_eq!(order.amount(), Amount::from_str("12000").unwrap());
        assert_eq!(order.expenses(), Amount::from_str("1700.50").unwrap());
    }

    #[test]
    fn test_ingest_receipts_with_aliases() {
        let json = r#"[
            {"id": 7, "date": "2024-03-02", "consumer": "Thai Beverage", "amount": "฿2,500"},
            {"id": "r8", "created_at": "2024-03-02 17:00:00", "amount": 100}
        ]"#;
        let records = ingest(RecordKind::Receipts, json).unwrap();
        assert_eq!(records[0].id(), "7");
        assert_eq!(records[0].customer(), "Thai Beverage");
        assert_eq!(records[0].amount(), Amount::from_str("2500").unwrap());
        assert_eq!(records[0].expenses(), records[0].amount());
        assert_eq!(records[1].customer(), "");
        assert_eq!(records[1].kind(), RecordKind::Receipts);
    }

    #[test]
    fn test_ingest_rejects_bad_timestamp() {
        let json = r#"[
            {"id": "i1", "createdAt": "2024-03-01", "amount": 1},
            {"id": "i2", "createdAt": "Invalid date", "amount": 2}
        ]"#;
        let err = ingest(RecordKind::Invoices, json).unwrap_err();
        assert_eq!(
            err,
            CoreError::InvalidTimestamp {
                id: "i2".to_string(),
                value: "Invalid date".to_string(),
            }
        );
    }

    #[test]
    fn test_ingest_rejects_missing_timestamp() {
        let json = r#"[{"id": "i1", "amount": 1}]"#;
        let err = ingest(RecordKind::Invoices, json).unwrap_err();
        assert!(matches!(err, CoreError::InvalidRecord(_)), "{err:?}");
    }

    #[test]
    fn test_record_kind_plain() {
        assert_eq!(RecordKind::from_str("receipts").unwrap(), RecordKind::Receipts);
        assert_eq!(RecordKind::Invoices.to_string(), "invoices");
        assert!(RecordKind::from_str("vouchers").is_err());
    }
}
