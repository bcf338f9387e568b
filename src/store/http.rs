//! Implements `RecordStore` against the dashboard REST API.

use crate::model::{ingest_value, FinancialRecord, Month, RecordKind};
use crate::store::RecordStore;
use crate::{Result, Transport};
use anyhow::{bail, Context};
use reqwest::StatusCode;
use serde_json::Value;
use tracing::{debug, trace};
use url::Url;

/// Fetches `GET {api_url}/{kind}?year=Y&month=M` with the session's bearer token.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpRecordStore;

#[async_trait::async_trait]
impl RecordStore for HttpRecordStore {
    async fn fetch_month(
        &self,
        transport: &Transport,
        kind: RecordKind,
        month: Month,
    ) -> Result<Vec<FinancialRecord>> {
        let url = month_url(transport.api_url(), kind, month)?;
        trace!("GET {url}");

        let mut request = transport.client().get(url);
        match transport.bearer() {
            Some(token) => request = request.bearer_auth(token),
            None => debug!("No session token, fetching {kind} without authorization"),
        }
        let response = request
            .send()
            .await
            .with_context(|| format!("Unable to fetch {kind} for {month}"))?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                bail!("The dashboard API rejected the session, run 'haulboard login'")
            }
            status if !status.is_success() => {
                bail!("The dashboard API answered {status} when fetching {kind} for {month}")
            }
            _ => {}
        }

        let body: Value = response
            .json()
            .await
            .with_context(|| format!("The {kind} response for {month} is not JSON"))?;
        let records = ingest_value(kind, unwrap_data(body))
            .with_context(|| format!("Unable to read the {kind} for {month}"))?;
        debug!("Fetched {} {kind} for {month}", records.len());
        Ok(records)
    }
}

fn month_url(api_url: &Url, kind: RecordKind, month: Month) -> Result<Url> {
    let mut url = api_url
        .join(&kind.to_string())
        .with_context(|| format!("Unable to build the {kind} URL"))?;
    url.query_pairs_mut()
        .append_pair("year", &month.year().to_string())
        .append_pair("month", &month.month().to_string());
    Ok(url)
}

/// Some endpoints wrap the list as `{"data": [...]}`.
fn unwrap_data(body: Value) -> Value {
    match body {
        Value::Object(mut map) if map.get("data").is_some_and(Value::is_array) => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}
