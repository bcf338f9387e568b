//! Voucher and payment-voucher reports: one row per day of a month with running totals.

use crate::model::{Amount, DayKey, DayZone, FinancialRecord, Month, RecordDetail, RecordKind};
use crate::report::aggregate::{daily_total, grand_total, group_by_day, selectors};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, Table};
use serde::Serialize;
use std::ops::AddAssign;
use tracing::warn;

/// Shown in place of a day table when the selected day has no records.
pub const NO_DATA: &str = "No data available for the selected date";

/// The fee columns of the order section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FeeBreakdown {
    pub income: Amount,
    pub oil_fee: Amount,
    pub tollway_fee: Amount,
    pub other_fee: Amount,
}

impl FeeBreakdown {
    /// The breakdown of an order expense, `None` for other kinds.
    pub fn of(record: &FinancialRecord) -> Option<Self> {
        match record.detail() {
            RecordDetail::OrderExpense {
                income,
                oil_fee,
                tollway_fee,
                other_fee,
            } => Some(Self {
                income: *income,
                oil_fee: *oil_fee,
                tollway_fee: *tollway_fee,
                other_fee: *other_fee,
            }),
            RecordDetail::Invoice { .. } | RecordDetail::Receipt { .. } => None,
        }
    }
}

impl AddAssign for FeeBreakdown {
    fn add_assign(&mut self, rhs: Self) {
        self.income += rhs.income;
        self.oil_fee += rhs.oil_fee;
        self.tollway_fee += rhs.tollway_fee;
        self.other_fee += rhs.other_fee;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayRow {
    pub day: DayKey,
    pub count: usize,
    pub subtotal: Amount,
    /// The sum of this row's subtotal and every earlier row's.
    pub running_total: Amount,
    /// False for a day that the day zone pushed past either end of the month.
    pub in_month: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fees: Option<FeeBreakdown>,
}

/// The summary of one section for one month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodReport {
    month: Month,
    section: RecordKind,
    zone: DayZone,
    rows: Vec<DayRow>,
    grand_total: Amount,
    dropped: usize,
    outside_month: usize,
}

impl PeriodReport {
    /// Builds the report of `section` for `month`, cutting days in `zone`.
    ///
    /// Records of another kind are left out and logged. Records of the right kind always count
    /// towards the grand total, even when `zone` moves them onto a day of the neighboring month:
    /// the store cuts months in its own timezone, so such a record is in no other report. Their
    /// days get rows of their own, marked as outside the month.
    pub fn build(
        month: Month,
        section: RecordKind,
        records: &[FinancialRecord],
        zone: DayZone,
    ) -> Self {
        let kept: Vec<FinancialRecord> = records
            .iter()
            .filter(|r| {
                if r.kind() != section {
                    warn!("Leaving {} {} out of the {section} report", r.kind(), r.id());
                    false
                } else {
                    true
                }
            })
            .cloned()
            .collect();
        let outside_month = kept
            .iter()
            .filter(|r| !month.contains(r.day_key(zone)))
            .inspect(|r| {
                warn!(
                    "{} {} falls on {} in {zone}, outside {month}",
                    r.kind(),
                    r.id(),
                    r.day_key(zone)
                )
            })
            .count();

        let selector = selectors::for_kind(section);
        let mut running_total = Amount::ZERO;
        let rows = group_by_day(&kept, zone)
            .iter()
            .map(|(day, bucket)| {
                let subtotal = daily_total(bucket, selector);
                running_total += subtotal;
                let fees = bucket
                    .iter()
                    .filter_map(|r| FeeBreakdown::of(r))
                    .fold(None, |acc: Option<FeeBreakdown>, fees| {
                        let mut sum = acc.unwrap_or_default();
                        sum += fees;
                        Some(sum)
                    });
                DayRow {
                    day,
                    count: bucket.len(),
                    subtotal,
                    running_total,
                    in_month: month.contains(day),
                    fees,
                }
            })
            .collect();

        Self {
            month,
            section,
            zone,
            rows,
            grand_total: grand_total(&kept, selector),
            dropped: records.len() - kept.len(),
            outside_month,
        }
    }

    pub fn month(&self) -> Month {
        self.month
    }

    pub fn section(&self) -> RecordKind {
        self.section
    }

    pub fn zone(&self) -> DayZone {
        self.zone
    }

    pub fn rows(&self) -> &[DayRow] {
        &self.rows
    }

    pub fn grand_total(&self) -> Amount {
        self.grand_total
    }

    /// How many input records were left out for being of another kind.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// How many records landed on a day outside the month in this report's day zone.
    pub fn outside_month(&self) -> usize {
        self.outside_month
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Renders the day rows with a closing total row.
    pub fn table(&self) -> Table {
        let orders = self.section == RecordKind::Orders;
        let mut headers = vec!["Day", "Records"];
        if orders {
            headers.extend(["Income", "Oil", "Tollway", "Other"]);
        }
        headers.extend(["Subtotal", "Running total"]);

        let mut table = new_table(&headers);
        let mut totals = FeeBreakdown::default();
        let mut count = 0;
        for row in &self.rows {
            count += row.count;
            let day = if row.in_month {
                Cell::new(row.day)
            } else {
                Cell::new(format!("{} (outside {})", row.day, self.month))
            };
            let mut cells = vec![day, Cell::new(row.count)];
            if orders {
                let fees = row.fees.unwrap_or_default();
                totals += fees;
                cells.extend(fee_cells(&fees));
            }
            cells.push(money(row.subtotal));
            cells.push(money(row.running_total));
            table.add_row(cells);
        }

        let mut cells = vec![Cell::new("Total"), Cell::new(count)];
        if orders {
            cells.extend(fee_cells(&totals));
        }
        cells.push(money(self.grand_total));
        cells.push(Cell::new(""));
        table.add_row(cells);
        table
    }
}

/// Renders the records of one day, or `NO_DATA` when there are none.
pub fn day_table(section: RecordKind, records: &[&FinancialRecord]) -> String {
    if records.is_empty() {
        return NO_DATA.to_string();
    }
    let orders = section == RecordKind::Orders;
    let mut headers = vec!["Id", "Created", "Customer"];
    if orders {
        headers.extend(["Income", "Oil", "Tollway", "Other"]);
    }
    headers.push(if orders { "Expenses" } else { "Amount" });

    let mut table = new_table(&headers);
    for record in records {
        let mut cells = vec![
            Cell::new(record.id()),
            Cell::new(record.created_at()),
            Cell::new(record.customer()),
        ];
        if let (true, Some(fees)) = (orders, FeeBreakdown::of(record)) {
            cells.extend(fee_cells(&fees));
        }
        cells.push(money(selectors::for_kind(section)(*record)));
        table.add_row(cells);
    }
    table.to_string()
}

fn new_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(headers.iter().map(|h| Cell::new(*h)));
    table
}

fn money(amount: Amount) -> Cell {
    Cell::new(amount).set_alignment(CellAlignment::Right)
}

fn fee_cells(fees: &FeeBreakdown) -> [Cell; 4] {
    [
        money(fees.income),
        money(fees.oil_fee),
        money(fees.tollway_fee),
        money(fees.other_fee),
    ]
}
