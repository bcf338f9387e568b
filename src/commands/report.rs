use crate::args::ReportArgs;
use crate::commands::Out;
use crate::model::{
    ingest, select_all, selected_total, Amount, DayKey, FinancialRecord, Selection,
};
use crate::report::{
    day_table, selected_day_records, selectors, PeriodReport, ReportRequest, ReportState,
};
use crate::store::{record_store, RecordStore};
use crate::{utils, Config, Mode, Result, Session, Transport};
use anyhow::{bail, Context};
use serde::Serialize;
use std::fmt::Write;
use std::path::Path;
use tracing::{debug, info, warn};

/// The structured output of `haulboard report`.
#[derive(Debug, Clone, Serialize)]
pub struct ReportOutput {
    pub report: PeriodReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_day: Option<DayKey>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day_total: Option<Amount>,
    #[serde(skip_serializing_if = "Selection::is_empty")]
    pub selection: Selection,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_total: Option<Amount>,
}

/// Loads the records of one section for one month and prints the daily report, optionally
/// followed by the records of one day and the total of a selection.
pub async fn report(config: &Config, mode: Mode, args: &ReportArgs) -> Result<Out<ReportOutput>> {
    let config = match args.day_zone() {
        Some(zone) => config.clone().with_day_zone(zone),
        None => config.clone(),
    };
    let zone = config.day_zone();
    let request = ReportRequest {
        month: args.month(),
        section: args.section(),
    };
    let source = match args.input() {
        Some(path) => Source::File(path),
        None => Source::Store {
            store: record_store(mode),
            transport: Session::load(&config).await?.transport(&config).await?,
        },
    };

    let mut state = ReportState::default();
    state.request(request);
    let mut attempt = 0;
    loop {
        match source.fetch(request).await {
            Ok(records) => {
                state.loaded(request, records)?;
                break;
            }
            Err(e) => {
                state.failed(format!("{e:#}"))?;
                if attempt >= args.retries() {
                    break;
                }
                attempt += 1;
                warn!("Loading {request} failed, retrying ({attempt}/{}): {e:#}", args.retries());
                state.retry()?;
            }
        }
    }
    if let Some(reason) = state.error() {
        bail!("Unable to load {request}: {reason}");
    }
    if let Some(day) = args.day() {
        state.select_day(day)?;
    }
    let Some(snapshot) = state.visible() else {
        bail!("No records were loaded for {request}");
    };

    let records = snapshot.records();
    let report = snapshot.report(zone);
    let mut message = String::new();
    let _ = writeln!(message, "{request} (days in {zone})");
    if report.is_empty() {
        let _ = writeln!(message, "No records");
    } else {
        let _ = writeln!(message, "{}", report.table());
    }

    let mut day_total = None;
    if let Some(day) = state.selected_day() {
        let buckets = snapshot.buckets(zone);
        let day_records = selected_day_records(&buckets, day);
        let _ = writeln!(message, "\n{day}");
        let _ = writeln!(message, "{}", day_table(request.section, day_records));
        if !day_records.is_empty() {
            let total = buckets.daily_total(day, selectors::for_kind(request.section));
            let _ = writeln!(message, "Day total: {total}");
            day_total = Some(total);
        }
    }

    let selection = build_selection(args, records);
    let selected = (!selection.is_empty())
        .then(|| selected_total(records, &selection, selectors::for_kind(request.section)));
    if let Some(total) = selected {
        let _ = writeln!(
            message,
            "\nSelected {} records: total {total}",
            selection.len()
        );
    }

    let output = ReportOutput {
        report,
        selected_day: state.selected_day(),
        day_total,
        selection,
        selected_total: selected,
    };
    Ok(Out::new(message.trim_end(), output))
}

/// Where the records come from.
enum Source<'a> {
    File(&'a Path),
    Store {
        store: std::sync::Arc<dyn RecordStore>,
        transport: Transport,
    },
}

impl Source<'_> {
    async fn fetch(&self, request: ReportRequest) -> Result<Vec<FinancialRecord>> {
        match self {
            Source::File(path) => {
                let json = utils::read(path).await?;
                let records = ingest(request.section, &json)
                    .with_context(|| format!("Unable to read records from {}", path.display()))?;
                debug!("Read {} records from {}", records.len(), path.display());
                Ok(records)
            }
            Source::Store { store, transport } => {
                store
                    .fetch_month(transport, request.section, request.month)
                    .await
            }
        }
    }
}

fn build_selection(args: &ReportArgs, records: &[FinancialRecord]) -> Selection {
    let mut selection = Selection::new(args.select().iter().map(String::as_str));
    for id in selection.ids() {
        if !records.iter().any(|r| r.id() == id) {
            warn!("Selected record '{id}' is not in this report");
        }
    }
    if args.select_all() {
        selection = select_all(&selection, records.iter().map(FinancialRecord::id));
        info!("Select all: {} records selected", selection.len());
    }
    selection
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DayZone, Month, RecordKind};
    use crate::report::NO_DATA;
    use crate::test::TestEnv;
    use std::str::FromStr;

    fn march(section: RecordKind) -> ReportArgs {
        ReportArgs::new(Month::new(2024, 3).unwrap(), section).with_day_zone(DayZone::Utc)
    }

    fn amount(s: &str) -> Amount {
        Amount::from_str(s).unwrap()
    }

    #[tokio::test]
    async fn test_receipts_report_in_test_mode() {
        let env = TestEnv::new().await;
        let args = march(RecordKind::Receipts)
            .with_day(DayKey::from_str("2024-03-01").unwrap())
            .with_select(vec!["rcp-1".to_string(), "rcp-3".to_string()], false);
        let out = report(&env.config(), Mode::Test, &args).await.unwrap();
        let output = out.structure().unwrap();
        assert_eq!(output.report.grand_total(), amount("350"));
        assert_eq!(output.day_total, Some(amount("150")));
        assert_eq!(output.selected_total, Some(amount("300")));
        assert!(out.message().contains("Day total: 150.00"), "{}", out.message());
    }

    #[tokio::test]
    async fn test_empty_day() {
        let env = TestEnv::new().await;
        let args = march(RecordKind::Invoices).with_day(DayKey::from_str("2024-03-20").unwrap());
        let out = report(&env.config(), Mode::Test, &args).await.unwrap();
        assert!(out.message().contains(NO_DATA), "{}", out.message());
        assert_eq!(out.structure().unwrap().day_total, None);
    }

    #[tokio::test]
    async fn test_select_all_orders() {
        let env = TestEnv::new().await;
        let args = march(RecordKind::Orders).with_select(Vec::new(), true);
        let out = report(&env.config(), Mode::Test, &args).await.unwrap();
        let output = out.structure().unwrap();
        assert_eq!(output.selection.len(), 3);
        assert_eq!(output.selected_total, Some(output.report.grand_total()));
    }

    #[tokio::test]
    async fn test_report_from_file() {
        let env = TestEnv::new().await;
        let path = env.config().root().join("invoices.json");
        utils::write(
            &path,
            r#"[{"id": "x", "createdAt": "2024-03-09T01:00:00+07:00", "amount": "1,000"}]"#,
        )
        .await
        .unwrap();
        let args = march(RecordKind::Invoices).with_input(&path);
        let out = report(&env.config(), Mode::Test, &args).await.unwrap();
        let rows = out.structure().unwrap().report.rows().to_vec();
        // 01:00 in Bangkok is still the previous day in UTC.
        assert_eq!(rows[0].day.to_string(), "2024-03-08");
        assert_eq!(rows[0].subtotal, amount("1000"));
    }

    #[tokio::test]
    async fn test_bad_file_fails() {
        let env = TestEnv::new().await;
        let path = env.config().root().join("bad.json");
        utils::write(&path, r#"[{"id": "x", "createdAt": "yesterday", "amount": 1}]"#)
            .await
            .unwrap();
        let args = march(RecordKind::Invoices).with_input(&path).with_retries(2);
        let err = report(&env.config(), Mode::Test, &args).await.unwrap_err();
        assert!(format!("{err:#}").contains("yesterday"), "{err:#}");
    }
}
