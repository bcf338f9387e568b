//! Types that represent the core data model, such as `Stop` and `FinancialRecord`.
mod amount;
mod coordinate;
mod day;
mod record;
mod selection;
mod stop;

pub use amount::{Amount, AmountError};
pub use coordinate::Coordinate;
pub use day::{DayKey, DayZone, Month, Timestamp};
pub use record::{ingest, ingest_value, FinancialRecord, RecordDetail, RecordKind};
pub use selection::{select_all, selected_records, selected_total, Selection};
pub use stop::Stop;

use serde::{Deserialize, Serialize};

/// A pickup/drop-off job. The order owns its stop list; sequencing produces a new list and never
/// touches this one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(alias = "_id")]
    pub id: String,
    /// The pickup point.
    pub origin: Stop,
    /// The drop-off points, in the order they were entered.
    #[serde(alias = "dropoffs")]
    pub stops: Vec<Stop>,
}
