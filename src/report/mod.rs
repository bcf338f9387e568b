//! The financial period aggregator and the voucher reports built on it.

mod aggregate;
mod period;
mod state;

pub use aggregate::{
    daily_total, grand_total, group_by_day, selected_day_records, selectors, DayBuckets,
};
pub use period::{day_table, DayRow, FeeBreakdown, PeriodReport, NO_DATA};
pub use state::{ReportRequest, ReportState, Snapshot};
