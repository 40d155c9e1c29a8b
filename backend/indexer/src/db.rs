//! Database layer: migrations, queries, and cursor management.

use std::str::FromStr;

use serde::Deserialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Connection, SqlitePool};
use tracing::{info, warn};

use crate::errors::{IndexerError, Result};
use crate::events::{ContributionRecord, EventRecord, FundEvent, FundRecord, RequestRecord};
use crate::projection;

/// Establish a SQLite connection pool and run pending migrations.
pub async fn init_pool(database_url: &str) -> Result<SqlitePool> {
    let url = if database_url.starts_with("sqlite:") {
        database_url.to_string()
    } else {
        format!("sqlite:{database_url}")
    };

    let options = SqliteConnectOptions::from_str(&url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    run_migrations(&pool).await?;
    Ok(pool)
}

pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("Database migrations applied successfully");
    Ok(())
}

// ─────────────────────────────────────────────────────────
// Cursor helpers
// ─────────────────────────────────────────────────────────

/// Read the last-seen ledger from the cursor row.
/// Returns `0` when no cursor has been persisted yet.
pub async fn get_last_ledger(pool: &SqlitePool) -> Result<i64> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT last_ledger FROM indexer_cursor WHERE id = 1")
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|(v,)| v).unwrap_or(0))
}

/// Persist the last-seen ledger (and optionally a pagination cursor string).
pub async fn save_cursor(
    pool: &SqlitePool,
    last_ledger: i64,
    last_cursor: Option<&str>,
) -> Result<()> {
    sqlx::query("UPDATE indexer_cursor SET last_ledger = ?1, last_cursor = ?2 WHERE id = 1")
        .bind(last_ledger)
        .bind(last_cursor)
        .execute(pool)
        .await?;
    Ok(())
}

/// Read back the raw cursor string (used to resume pagination mid-ledger).
pub async fn get_cursor_string(pool: &SqlitePool) -> Result<Option<String>> {
    let row: Option<(Option<String>,)> =
        sqlx::query_as("SELECT last_cursor FROM indexer_cursor WHERE id = 1")
            .fetch_optional(pool)
            .await?;
    Ok(row.and_then(|(v,)| v))
}

// ─────────────────────────────────────────────────────────
// Event writes
// ─────────────────────────────────────────────────────────

/// Persist a batch of decoded events and fold each new one into the read
/// model. Events whose `event_id` is already stored are ignored, which makes
/// re-polling a ledger range harmless.
///
/// The whole batch is one transaction: readers see all of it or none of it.
/// An event whose amounts cannot be folded into the read model is logged and
/// left unprojected, so one bad event never holds back the cursor.
pub async fn insert_events(pool: &SqlitePool, events: &[FundEvent]) -> Result<usize> {
    let mut tx = pool.begin().await?;
    let mut count = 0usize;

    for ev in events {
        let rows_affected = sqlx::query(
            r#"
            INSERT OR IGNORE INTO events
                (event_id, event_type, fund_id, request_id, actor, amount, detail,
                 description, image_uri, deadline, approvals, ledger, timestamp,
                 contract_id, tx_hash)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            "#,
        )
        .bind(&ev.event_id)
        .bind(ev.kind.as_str())
        .bind(ev.fund_id)
        .bind(ev.request_id)
        .bind(&ev.actor)
        .bind(&ev.amount)
        .bind(&ev.detail)
        .bind(&ev.description)
        .bind(&ev.image_uri)
        .bind(ev.deadline)
        .bind(ev.approvals)
        .bind(ev.ledger)
        .bind(ev.timestamp)
        .bind(&ev.contract_id)
        .bind(&ev.tx_hash)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if rows_affected == 0 {
            continue;
        }
        count += 1;

        // Savepoint per event: a read-model failure undoes only this event's
        // projection. The raw event stays stored and the batch still commits.
        let mut savepoint = tx.begin().await?;
        match projection::apply(&mut *savepoint, ev).await {
            Ok(()) => savepoint.commit().await?,
            Err(IndexerError::Projection(reason)) => {
                savepoint.rollback().await?;
                warn!(event_id = %ev.event_id, "Event not projected: {reason}");
            }
            Err(e) => return Err(e),
        }
    }

    tx.commit().await?;
    Ok(count)
}

// ─────────────────────────────────────────────────────────
// Event reads
// ─────────────────────────────────────────────────────────

const EVENT_COLUMNS: &str = "id, event_id, event_type, fund_id, request_id, actor, amount, \
     detail, description, image_uri, deadline, approvals, ledger, timestamp, contract_id, tx_hash, created_at";

/// Fetch all events for a given fund, ordered by ledger ascending.
pub async fn get_events_for_fund(pool: &SqlitePool, fund_id: i64) -> Result<Vec<EventRecord>> {
    let sql = format!(
        "SELECT {EVENT_COLUMNS} FROM events WHERE fund_id = ?1 ORDER BY ledger ASC, id ASC"
    );
    let rows = sqlx::query_as::<_, EventRecord>(&sql)
        .bind(fund_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Fetch all events, ordered by ledger ascending.
pub async fn get_all_events(pool: &SqlitePool) -> Result<Vec<EventRecord>> {
    let sql = format!("SELECT {EVENT_COLUMNS} FROM events ORDER BY ledger ASC, id ASC");
    let rows = sqlx::query_as::<_, EventRecord>(&sql)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

// ─────────────────────────────────────────────────────────
// Read model
// ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    CreatedAt,
    Name,
    Goal,
    TotalRaised,
    Deadline,
    ContributorCount,
}

impl SortField {
    /// SQL expression to order by. Amount columns hold decimal strings, so
    /// they are compared numerically.
    fn order_expr(self) -> &'static str {
        match self {
            SortField::CreatedAt => "created_at",
            SortField::Name => "name COLLATE NOCASE",
            SortField::Goal => "CAST(goal AS REAL)",
            SortField::TotalRaised => "CAST(total_raised AS REAL)",
            SortField::Deadline => "deadline",
            SortField::ContributorCount => "contributor_count",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// `GET /funds` query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FundQuery {
    /// Case-insensitive substring of the name or creator address.
    pub search: Option<String>,
    #[serde(default)]
    pub sort_by: SortField,
    #[serde(default)]
    pub order: SortOrder,
}

const FUND_COLUMNS: &str = "fund_id, name, creator, description, image_uri, category, goal, deadline, total_raised, \
     goal_reached, contributor_count, request_count, balance, created_at, updated_at";

pub async fn list_funds(pool: &SqlitePool, query: &FundQuery) -> Result<Vec<FundRecord>> {
    let direction = match query.order {
        SortOrder::Asc => "ASC",
        SortOrder::Desc => "DESC",
    };
    let search = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let filter = if search.is_some() {
        "WHERE name LIKE ?1 ESCAPE '\\' OR creator LIKE ?1 ESCAPE '\\'"
    } else {
        ""
    };
    let sql = format!(
        "SELECT {FUND_COLUMNS} FROM funds {filter} ORDER BY {} {direction}, fund_id ASC",
        query.sort_by.order_expr()
    );

    let mut q = sqlx::query_as::<_, FundRecord>(&sql);
    if let Some(term) = search {
        q = q.bind(format!("%{}%", escape_like(term)));
    }
    Ok(q.fetch_all(pool).await?)
}

fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

pub async fn get_fund(pool: &SqlitePool, fund_id: i64) -> Result<Option<FundRecord>> {
    let sql = format!("SELECT {FUND_COLUMNS} FROM funds WHERE fund_id = ?1");
    let row = sqlx::query_as::<_, FundRecord>(&sql)
        .bind(fund_id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn get_requests(pool: &SqlitePool, fund_id: i64) -> Result<Vec<RequestRecord>> {
    let rows = sqlx::query_as::<_, RequestRecord>(
        r#"
        SELECT fund_id, request_id, purpose, amount, completed, approvals
        FROM   requests
        WHERE  fund_id = ?1
        ORDER  BY request_id ASC
        "#,
    )
    .bind(fund_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn get_contributions(pool: &SqlitePool, fund_id: i64) -> Result<Vec<ContributionRecord>> {
    let rows = sqlx::query_as::<_, ContributionRecord>(
        r#"
        SELECT fund_id, contributor, amount
        FROM   contributions
        WHERE  fund_id = ?1
        ORDER  BY contributor ASC
        "#,
    )
    .bind(fund_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Single-connection in-memory database with migrations applied.
#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");
    run_migrations(&pool).await.expect("migrations");
    pool
}
