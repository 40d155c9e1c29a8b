//! Soroban RPC client — polls `getEvents` and decodes FundChain events.
//!
//! ## Resilience
//!
//! * Exponential back-off is applied when the RPC returns an error or rate-limit
//!   response, up to [`MAX_BACKOFF_SECS`] seconds.
//! * Transient network errors (connection reset, timeout) are retried silently.
//! * Malformed individual events are logged and dropped (see [`decode_events`]).

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::errors::{IndexerError, Result};
use crate::events::{EventKind, FundEvent};

const MAX_BACKOFF_SECS: u64 = 60;
const INITIAL_BACKOFF_SECS: u64 = 2;

/// JSON-RPC codes that retrying will not fix (invalid request / unknown method).
const HARD_ERROR_CODES: [i64; 2] = [-32600, -32601];

// ─────────────────────────────────────────────────────────
// JSON-RPC response shapes
// ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RpcResponse {
    pub result: Option<EventsResult>,
    pub error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct EventsResult {
    pub events: Vec<RawEvent>,
    pub cursor: Option<String>,
    #[serde(rename = "latestLedger")]
    pub latest_ledger: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RawEvent {
    /// XDR-decoded topic list
    pub topic: Vec<String>,
    /// XDR-decoded event value / data
    pub value: Value,
    #[serde(rename = "contractId")]
    pub contract_id: Option<String>,
    #[serde(rename = "txHash")]
    pub tx_hash: Option<String>,
    pub id: Option<String>,
    pub ledger: Option<u64>,
    #[serde(rename = "ledgerClosedAt")]
    pub ledger_closed_at: Option<String>,
    #[serde(rename = "inSuccessfulContractCall")]
    pub in_successful_contract_call: Option<bool>,
    #[serde(rename = "pagingToken")]
    pub paging_token: Option<String>,
}

/// One page of `getEvents` output.
#[derive(Debug)]
pub struct EventsPage {
    pub events: Vec<RawEvent>,
    /// Opaque cursor to continue from, if the RPC returned one.
    pub cursor: Option<String>,
    pub latest_ledger: Option<u64>,
}

struct Backoff {
    secs: u64,
}

impl Backoff {
    fn new() -> Self {
        Backoff {
            secs: INITIAL_BACKOFF_SECS,
        }
    }

    async fn wait(&mut self, reason: &str) {
        warn!("{reason} (will retry in {}s)", self.secs);
        tokio::time::sleep(Duration::from_secs(self.secs)).await;
        self.secs = (self.secs * 2).min(MAX_BACKOFF_SECS);
    }
}

// ─────────────────────────────────────────────────────────
// Public API
// ─────────────────────────────────────────────────────────

/// Fetch a page of events from the RPC.
///
/// * `start_ledger` — the ledger sequence to scan from (inclusive).
/// * `cursor`       — optional opaque pagination cursor from a previous response.
/// * `limit`        — maximum number of events to return.
pub async fn fetch_events(
    client: &Client,
    rpc_url: &str,
    contract_id: &str,
    start_ledger: u32,
    cursor: Option<&str>,
    limit: u32,
) -> Result<EventsPage> {
    let mut backoff = Backoff::new();
    let request = json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "getEvents",
        "params": build_params(contract_id, start_ledger, cursor, limit),
    });

    loop {
        let resp = match client.post(rpc_url).json(&request).send().await {
            Ok(resp) => resp,
            Err(e) => {
                backoff.wait(&format!("RPC request failed: {e}")).await;
                continue;
            }
        };

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            backoff.wait("Rate-limited by RPC").await;
            continue;
        }

        let response: RpcResponse = resp.json().await?;

        if let Some(err) = response.error {
            if HARD_ERROR_CODES.contains(&err.code) {
                return Err(IndexerError::EventParse(format!(
                    "RPC hard error {}: {}",
                    err.code, err.message
                )));
            }
            backoff
                .wait(&format!("RPC soft error {} {}", err.code, err.message))
                .await;
            continue;
        }

        let result = response.result.ok_or_else(|| {
            IndexerError::EventParse("Empty result from getEvents".to_string())
        })?;

        debug!(
            "Fetched {} events (latest_ledger={:?})",
            result.events.len(),
            result.latest_ledger
        );

        // Events from failed invocations were rolled back on-chain.
        let events = result
            .events
            .into_iter()
            .filter(|e| e.in_successful_contract_call != Some(false))
            .collect();

        return Ok(EventsPage {
            events,
            cursor: result.cursor,
            latest_ledger: result.latest_ledger,
        });
    }
}

fn build_params(contract_id: &str, start_ledger: u32, cursor: Option<&str>, limit: u32) -> Value {
    let mut params = json!({
        "filters": [
            {
                "type": "contract",
                "contractIds": [contract_id]
            }
        ],
        "pagination": {
            "limit": limit
        }
    });

    if let Some(cur) = cursor {
        params["pagination"]["cursor"] = json!(cur);
    } else {
        params["startLedger"] = json!(start_ledger);
    }

    params
}

// ─────────────────────────────────────────────────────────
// Event decoding
// ─────────────────────────────────────────────────────────

/// Decode a list of raw RPC events into [`FundEvent`] structs.
///
/// Events that cannot be decoded are logged and skipped; one bad event
/// never blocks the rest of the page.
pub fn decode_events(raw: &[RawEvent], contract_id: &str) -> Vec<FundEvent> {
    raw.iter()
        .filter_map(|e| match decode_single(e, contract_id) {
            Ok(event) => Some(event),
            Err(err) => {
                warn!("Skipping undecodable event {:?}: {err}", e.id);
                None
            }
        })
        .collect()
}

fn decode_single(raw: &RawEvent, contract_id: &str) -> Result<FundEvent> {
    // Extract leading topic symbol to determine event type.
    let first_topic = raw
        .topic
        .first()
        .ok_or_else(|| IndexerError::EventParse("event has no topics".to_string()))?;
    let kind = EventKind::from_topic(&extract_symbol(first_topic));

    let event_id = raw
        .id
        .clone()
        .or_else(|| raw.paging_token.clone())
        .ok_or_else(|| IndexerError::EventParse("event has no id".to_string()))?;

    let ledger = raw.ledger.unwrap_or(0) as i64;
    let timestamp = raw
        .ledger_closed_at
        .as_deref()
        .and_then(parse_iso_to_unix)
        .unwrap_or(0);

    let fund_id = raw
        .topic
        .get(1)
        .and_then(|t| extract_u64_or_raw(t).parse::<i64>().ok())
        .or_else(|| extract_i64(&raw.value, "fund_id"));

    let mut event = FundEvent {
        event_id,
        kind,
        fund_id,
        request_id: None,
        actor: None,
        amount: None,
        detail: None,
        description: None,
        image_uri: None,
        deadline: None,
        approvals: None,
        ledger,
        timestamp,
        contract_id: raw
            .contract_id
            .clone()
            .unwrap_or_else(|| contract_id.to_string()),
        tx_hash: raw.tx_hash.clone(),
    };
    decode_data(&raw.value, &mut event);

    if kind != EventKind::Unknown && event.fund_id.is_none() {
        return Err(IndexerError::EventParse(format!(
            "{} event without fund id",
            kind.as_str()
        )));
    }
    Ok(event)
}

/// Pull apart the JSON `value` blob that Soroban returns for event data.
/// The XDR is decoded by the RPC into a `{"type":…, …}` JSON object.
fn decode_data(value: &Value, event: &mut FundEvent) {
    match event.kind {
        EventKind::FundCreated => {
            event.actor = extract_field(value, &["creator", "address"])
                .or_else(|| find_nested(value, "creator"));
            event.amount = extract_field(value, &["goal"]);
            event.detail = extract_field(value, &["name"]);
            event.description = extract_field(value, &["description"]);
            event.image_uri = extract_field(value, &["image_uri"]);
            event.deadline = extract_i64(value, "deadline");
        }
        EventKind::Funded | EventKind::Refunded => {
            event.actor = extract_field(value, &["contributor", "address"]);
            event.amount = extract_field(value, &["amount"]);
        }
        EventKind::RequestCreated => {
            event.request_id = extract_i64(value, "request_id");
            event.amount = extract_field(value, &["amount"]);
            event.detail = extract_field(value, &["purpose"]);
        }
        EventKind::VoteCast => {
            event.request_id = extract_i64(value, "request_id");
            event.actor = extract_field(value, &["voter", "address"]);
            event.approvals = extract_i64(value, "approvals");
        }
        EventKind::Withdrawn => {
            event.request_id = extract_i64(value, "request_id");
            event.amount = extract_field(value, &["amount"]);
        }
        EventKind::Unknown => {}
    }
}

fn extract_field(value: &Value, keys: &[&str]) -> Option<String> {
    for key in keys {
        if let Some(v) = value.get(key) {
            let s = match v {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                // Typed wrapper, e.g. {"type":"i128","value":"5000"}.
                Value::Object(_) => v.get("value").and_then(|inner| match inner {
                    Value::String(s) => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                }),
                _ => None,
            };
            if s.is_some() {
                return s;
            }
        }
    }
    None
}

fn extract_i64(value: &Value, key: &str) -> Option<i64> {
    extract_field(value, &[key]).and_then(|s| s.parse().ok())
}

fn find_nested(value: &Value, key: &str) -> Option<String> {
    if let Value::Object(map) = value {
        for (k, v) in map {
            if k == key {
                return v.as_str().map(String::from);
            }
            if let Some(found) = find_nested(v, key) {
                return Some(found);
            }
        }
    }
    None
}

/// Extract a Soroban Symbol from the XDR-decoded topic string.
/// The RPC may return `{"type":"symbol","value":"created"}` or just the raw string.
fn extract_symbol(raw: &str) -> String {
    if let Ok(v) = serde_json::from_str::<Value>(raw) {
        if let Some(s) = v.get("value").and_then(|x| x.as_str()) {
            return s.to_string();
        }
    }
    // Fallback: treat the raw string as the symbol
    raw.to_string()
}

/// Extract the fund id from a topic entry that might be a JSON object or raw number/string.
fn extract_u64_or_raw(raw: &str) -> String {
    if let Ok(v) = serde_json::from_str::<Value>(raw) {
        if let Some(n) = v.get("value").and_then(|x| x.as_u64()) {
            return n.to_string();
        }
        if let Some(s) = v.get("value").and_then(|x| x.as_str()) {
            return s.to_string();
        }
    }
    raw.to_string()
}

/// Parse an ISO-8601 timestamp string into a Unix epoch (seconds).
fn parse_iso_to_unix(s: &str) -> Option<i64> {
    use chrono::DateTime;
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.timestamp())
}

// ─────────────────────────────────────────────────────────
// Unit tests
// ─────────────────────────────────────────────────────────
