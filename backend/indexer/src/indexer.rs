//! Long-running background task that polls the Soroban RPC and writes
//! decoded FundChain events to the database.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use sqlx::SqlitePool;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::Config;
use crate::db;
use crate::errors::Result;
use crate::rpc;

pub struct IndexerState {
    pub pool: SqlitePool,
    pub config: Config,
    pub client: Client,
}

/// Poll until `shutdown` is cancelled. Meant to be spawned as a [`tokio`] task.
pub async fn run(state: Arc<IndexerState>, shutdown: CancellationToken) {
    info!(contract = %state.config.contract_id, "Indexer starting");

    // Resume from the persisted cursor; fall back to config start_ledger.
    let last_ledger = db::get_last_ledger(&state.pool).await.unwrap_or(0);
    let mut cursor = db::get_cursor_string(&state.pool).await.unwrap_or(None);

    let mut current_ledger = match u32::try_from(last_ledger) {
        Ok(ledger) if ledger > 0 => ledger,
        _ => state.config.start_ledger,
    };

    info!("Resuming from ledger {current_ledger}");

    let interval = Duration::from_secs(state.config.poll_interval_secs);
    loop {
        let poll = poll_once(
            &state.pool,
            &state.client,
            &state.config,
            current_ledger,
            cursor.as_deref(),
        );

        tokio::select! {
            _ = shutdown.cancelled() => break,
            result = poll => match result {
                Ok((next_ledger, next_cursor)) => {
                    current_ledger = next_ledger;
                    cursor = next_cursor;
                }
                Err(e) => error!("Indexer poll error: {e}"),
            },
        }

        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }

    info!(ledger = current_ledger, "Indexer stopped");
}

/// Perform a single poll iteration.
///
/// Returns `(next_start_ledger, next_cursor)`.
async fn poll_once(
    pool: &SqlitePool,
    client: &Client,
    config: &Config,
    start_ledger: u32,
    cursor: Option<&str>,
) -> Result<(u32, Option<String>)> {
    let page = rpc::fetch_events(
        client,
        &config.rpc_url,
        &config.contract_id,
        start_ledger,
        cursor,
        config.events_per_page,
    )
    .await?;

    if !page.events.is_empty() {
        let decoded = rpc::decode_events(&page.events, &config.contract_id);
        let inserted = db::insert_events(pool, &decoded).await?;
        info!(
            "Polled {} raw events → {} new records stored",
            page.events.len(),
            inserted
        );
    }

    // With a cursor the next call paginates from it and start_ledger is
    // ignored; otherwise move up to the newest ledger the RPC knows about.
    let next_ledger = page
        .latest_ledger
        .and_then(|l| u32::try_from(l).ok())
        .map_or(start_ledger, |l| l.max(start_ledger));
    let next_cursor = page.cursor.or_else(|| cursor.map(str::to_owned));

    // Persisted before returning so a restart resumes at the same point.
    db::save_cursor(pool, i64::from(next_ledger), next_cursor.as_deref()).await?;

    Ok((next_ledger, next_cursor))
}
