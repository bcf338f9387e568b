//! The lifecycle of a report screen: which month and section is being looked at, whether its
//! records are loading, loaded or failed, and which day is selected.

use crate::model::{DayKey, DayZone, FinancialRecord, Month, RecordKind};
use crate::report::{group_by_day, DayBuckets, PeriodReport};
use crate::Result;
use anyhow::bail;
use serde::Serialize;
use std::fmt::{Display, Formatter};

/// What the user asked to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReportRequest {
    pub month: Month,
    pub section: RecordKind,
}

impl Display for ReportRequest {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.section, self.month)
    }
}

/// The records fetched for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    request: ReportRequest,
    records: Vec<FinancialRecord>,
}

impl Snapshot {
    pub fn request(&self) -> ReportRequest {
        self.request
    }

    pub fn records(&self) -> &[FinancialRecord] {
        &self.records
    }

    pub fn buckets(&self, zone: DayZone) -> DayBuckets<'_> {
        group_by_day(&self.records, zone)
    }

    pub fn report(&self, zone: DayZone) -> PeriodReport {
        PeriodReport::build(self.request.month, self.request.section, &self.records, zone)
    }
}

/// The report screen's state.
///
/// ```text
/// Idle --request--> Loading --loaded--> Ready --request--> Loading
///                   Loading --failed--> Error --retry----> Loading
/// ```
///
/// While loading or after a failure the last good snapshot is kept so it can still be shown.
/// Selecting a day is only possible in `Ready` and leaves the state as it is.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ReportState {
    #[default]
    Idle,
    Loading {
        request: ReportRequest,
        last_good: Option<Snapshot>,
    },
    Ready {
        snapshot: Snapshot,
        selected_day: Option<DayKey>,
    },
    Error {
        request: ReportRequest,
        reason: String,
        last_good: Option<Snapshot>,
    },
}

impl ReportState {
    /// Starts loading `request`. Valid in every state; a request made while loading replaces the
    /// one in flight.
    pub fn request(&mut self, request: ReportRequest) {
        let last_good = self.take_last_good();
        *self = ReportState::Loading { request, last_good };
    }

    /// Completes the load in flight. Records of any other request are refused.
    pub fn loaded(&mut self, request: ReportRequest, records: Vec<FinancialRecord>) -> Result<()> {
        match self {
            ReportState::Loading { request: pending, .. } if *pending == request => {
                *self = ReportState::Ready {
                    snapshot: Snapshot { request, records },
                    selected_day: None,
                };
                Ok(())
            }
            ReportState::Loading { request: pending, .. } => {
                bail!("Received {request} while loading {pending}")
            }
            other => bail!("Cannot accept records while {}", other.name()),
        }
    }

    /// Fails the load in flight, keeping the last good snapshot.
    pub fn failed(&mut self, reason: impl Into<String>) -> Result<()> {
        let ReportState::Loading { request, .. } = self else {
            bail!("Cannot fail a load while {}", self.name())
        };
        let request = *request;
        let last_good = self.take_last_good();
        *self = ReportState::Error {
            request,
            reason: reason.into(),
            last_good,
        };
        Ok(())
    }

    /// Re-issues the failed request. Returns the request to load.
    pub fn retry(&mut self) -> Result<ReportRequest> {
        let ReportState::Error { request, .. } = self else {
            bail!("Nothing to retry while {}", self.name())
        };
        let request = *request;
        self.request(request);
        Ok(request)
    }

    /// Picks the day whose records are shown.
    pub fn select_day(&mut self, day: DayKey) -> Result<()> {
        match self {
            ReportState::Ready { selected_day, .. } => {
                *selected_day = Some(day);
                Ok(())
            }
            other => bail!("Cannot select a day while {}", other.name()),
        }
    }

    pub fn selected_day(&self) -> Option<DayKey> {
        match self {
            ReportState::Ready { selected_day, .. } => *selected_day,
            _ => None,
        }
    }

    /// The snapshot to display: the current one when ready, otherwise the last good one.
    pub fn visible(&self) -> Option<&Snapshot> {
        match self {
            ReportState::Idle => None,
            ReportState::Ready { snapshot, .. } => Some(snapshot),
            ReportState::Loading { last_good, .. } | ReportState::Error { last_good, .. } => {
                last_good.as_ref()
            }
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ReportState::Error { reason, .. } => Some(reason),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, ReportState::Loading { .. })
    }

    pub fn name(&self) -> &'static str {
        match self {
            ReportState::Idle => "idle",
            ReportState::Loading { .. } => "loading",
            ReportState::Ready { .. } => "ready",
            ReportState::Error { .. } => "in error",
        }
    }

    fn take_last_good(&mut self) -> Option<Snapshot> {
        match std::mem::take(self) {
            ReportState::Idle => None,
            ReportState::Ready { snapshot, .. } => Some(snapshot),
            ReportState::Loading { last_good, .. } | ReportState::Error { last_good, .. } => {
                last_good
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Amount, FinancialRecord};
    use std::str::FromStr;

    fn request(month: u32) -> ReportRequest {
        ReportRequest {
            month: Month::new(2024, month).unwrap(),
            section: RecordKind::Receipts,
        }
    }

    fn receipt(id: &str, date: &str) -> FinancialRecord {
        FinancialRecord::receipt(id, date, "", Amount::from_str("10").unwrap()).unwrap()
    }

    #[test]
    fn test_happy_path() {
        let mut state = ReportState::default();
        assert_eq!(state.name(), "idle");
        state.request(request(3));
        assert!(state.is_loading());
        state
            .loaded(request(3), vec![receipt("a", "2024-03-01")])
            .unwrap();
        let day = DayKey::from_str("2024-03-01").unwrap();
        state.select_day(day).unwrap();
        assert_eq!(state.name(), "ready");
        assert_eq!(state.selected_day(), Some(day));
        assert_eq!(state.visible().unwrap().records().len(), 1);
    }

    #[test]
    fn test_failure_keeps_last_good_and_retries() {
        let mut state = ReportState::default();
        state.request(request(3));
        state
            .loaded(request(3), vec![receipt("a", "2024-03-01")])
            .unwrap();

        state.request(request(4));
        assert_eq!(state.visible().unwrap().request(), request(3));
        state.failed("HTTP 503").unwrap();
        assert_eq!(state.error(), Some("HTTP 503"));
        assert_eq!(state.visible().unwrap().request(), request(3));

        assert_eq!(state.retry().unwrap(), request(4));
        assert!(state.is_loading());
        state.loaded(request(4), Vec::new()).unwrap();
        assert_eq!(state.visible().unwrap().request(), request(4));
        assert_eq!(state.selected_day(), None);
    }

    #[test]
    fn test_invalid_transitions() {
        let mut state = ReportState::default();
        assert!(state.loaded(request(3), Vec::new()).is_err());
        assert!(state.failed("nope").is_err());
        assert!(state.retry().is_err());
        assert!(state
            .select_day(DayKey::from_str("2024-03-01").unwrap())
            .is_err());

        state.request(request(3));
        assert!(state.select_day(DayKey::from_str("2024-03-01").unwrap()).is_err());
        assert!(state.loaded(request(4), Vec::new()).is_err());
        assert!(state.is_loading());
    }

    #[test]
    fn test_report_from_snapshot() {
        let mut state = ReportState::default();
        state.request(request(3));
        state
            .loaded(
                request(3),
                vec![receipt("a", "2024-03-01"), receipt("b", "2024-03-02")],
            )
            .unwrap();
        let snapshot = state.visible().unwrap();
        assert_eq!(snapshot.buckets(DayZone::Utc).len(), 2);
        assert_eq!(
            snapshot.report(DayZone::Utc).grand_total(),
            Amount::from_str("20").unwrap()
        );
    }
}
