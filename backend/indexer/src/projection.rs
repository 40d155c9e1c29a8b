//! Folds contract events into the `funds`, `contributions` and `requests`
//! tables.
//!
//! The contract is the source of truth; this module only replays what its
//! events say. Each event is applied exactly once (the caller deduplicates on
//! `event_id`) inside the caller's transaction.

use sqlx::SqliteConnection;
use tracing::{debug, warn};

use crate::category::categorize;
use crate::errors::{IndexerError, Result};
use crate::events::{EventKind, FundEvent};

/// Apply one freshly inserted event to the read model.
pub async fn apply(conn: &mut SqliteConnection, ev: &FundEvent) -> Result<()> {
    let Some(fund_id) = ev.fund_id else {
        debug!(event_id = %ev.event_id, "Event has no fund id; not projected");
        return Ok(());
    };

    match ev.kind {
        EventKind::FundCreated => fund_created(conn, fund_id, ev).await,
        EventKind::Funded => funded(conn, fund_id, ev).await,
        EventKind::Refunded => refunded(conn, fund_id, ev).await,
        EventKind::RequestCreated => request_created(conn, fund_id, ev).await,
        EventKind::VoteCast => vote_cast(conn, fund_id, ev).await,
        EventKind::Withdrawn => withdrawn(conn, fund_id, ev).await,
        EventKind::Unknown => {
            debug!(event_id = %ev.event_id, "Unknown event kind; not projected");
            Ok(())
        }
    }
}

async fn fund_created(conn: &mut SqliteConnection, fund_id: i64, ev: &FundEvent) -> Result<()> {
    let name = ev.detail.clone().unwrap_or_default();
    let goal = parse_amount(ev.amount.as_deref().unwrap_or("0"))?;

    sqlx::query(
        r#"
        INSERT OR IGNORE INTO funds
            (fund_id, name, creator, description, image_uri, category, goal, deadline,
             created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
        "#,
    )
    .bind(fund_id)
    .bind(&name)
    .bind(ev.actor.as_deref().unwrap_or_default())
    .bind(ev.description.as_deref().unwrap_or_default())
    .bind(ev.image_uri.as_deref().unwrap_or_default())
    .bind(categorize(&name))
    .bind(goal.to_string())
    .bind(ev.deadline.unwrap_or_default())
    .bind(ev.timestamp)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Running totals of a fund row, parsed out of their decimal columns.
struct Totals {
    goal: i128,
    total_raised: i128,
    balance: i128,
    goal_reached: bool,
}

async fn load_totals(conn: &mut SqliteConnection, fund_id: i64) -> Result<Option<Totals>> {
    let row: Option<(String, String, String, bool)> = sqlx::query_as(
        "SELECT goal, total_raised, balance, goal_reached FROM funds WHERE fund_id = ?1",
    )
    .bind(fund_id)
    .fetch_optional(&mut *conn)
    .await?;

    row.map(|(goal, total_raised, balance, goal_reached)| {
        Ok(Totals {
            goal: parse_amount(&goal)?,
            total_raised: parse_amount(&total_raised)?,
            balance: parse_amount(&balance)?,
            goal_reached,
        })
    })
    .transpose()
}

async fn funded(conn: &mut SqliteConnection, fund_id: i64, ev: &FundEvent) -> Result<()> {
    let (Some(contributor), Some(amount)) = (ev.actor.as_deref(), ev.amount.as_deref()) else {
        warn!(event_id = %ev.event_id, "Funded event without contributor or amount; skipping");
        return Ok(());
    };
    let amount = parse_amount(amount)?;
    let Some(mut totals) = load_totals(conn, fund_id).await? else {
        warn!(fund_id, event_id = %ev.event_id, "Deposit for unknown fund; skipping");
        return Ok(());
    };

    let previous: Option<(String,)> = sqlx::query_as(
        "SELECT amount FROM contributions WHERE fund_id = ?1 AND contributor = ?2",
    )
    .bind(fund_id)
    .bind(contributor)
    .fetch_optional(&mut *conn)
    .await?;
    let first_deposit = previous.is_none();
    let previous = match previous {
        Some((amount,)) => parse_amount(&amount)?,
        None => 0,
    };

    sqlx::query(
        r#"
        INSERT INTO contributions (fund_id, contributor, amount) VALUES (?1, ?2, ?3)
        ON CONFLICT (fund_id, contributor) DO UPDATE SET amount = excluded.amount
        "#,
    )
    .bind(fund_id)
    .bind(contributor)
    .bind(checked_add(previous, amount)?.to_string())
    .execute(&mut *conn)
    .await?;

    totals.total_raised = checked_add(totals.total_raised, amount)?;
    totals.balance = checked_add(totals.balance, amount)?;
    totals.goal_reached = totals.goal_reached || totals.total_raised >= totals.goal;

    sqlx::query(
        r#"
        UPDATE funds
        SET    total_raised      = ?2,
               balance           = ?3,
               goal_reached      = ?4,
               contributor_count = contributor_count + ?5,
               updated_at        = ?6
        WHERE  fund_id = ?1
        "#,
    )
    .bind(fund_id)
    .bind(totals.total_raised.to_string())
    .bind(totals.balance.to_string())
    .bind(totals.goal_reached)
    .bind(i64::from(first_deposit))
    .bind(ev.timestamp)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn refunded(conn: &mut SqliteConnection, fund_id: i64, ev: &FundEvent) -> Result<()> {
    let (Some(contributor), Some(amount)) = (ev.actor.as_deref(), ev.amount.as_deref()) else {
        warn!(event_id = %ev.event_id, "Refunded event without contributor or amount; skipping");
        return Ok(());
    };
    let amount = parse_amount(amount)?;
    let Some(totals) = load_totals(conn, fund_id).await? else {
        warn!(fund_id, event_id = %ev.event_id, "Refund for unknown fund; skipping");
        return Ok(());
    };

    // total_raised and contributor_count are historical and stay put.
    sqlx::query("UPDATE contributions SET amount = '0' WHERE fund_id = ?1 AND contributor = ?2")
        .bind(fund_id)
        .bind(contributor)
        .execute(&mut *conn)
        .await?;
    update_balance(conn, fund_id, checked_sub(totals.balance, amount)?, ev.timestamp).await
}

async fn request_created(conn: &mut SqliteConnection, fund_id: i64, ev: &FundEvent) -> Result<()> {
    let (Some(request_id), Some(amount)) = (ev.request_id, ev.amount.as_deref()) else {
        warn!(event_id = %ev.event_id, "Request event without id or amount; skipping");
        return Ok(());
    };
    let amount = parse_amount(amount)?;

    sqlx::query(
        r#"
        INSERT OR IGNORE INTO requests (fund_id, request_id, purpose, amount)
        VALUES (?1, ?2, ?3, ?4)
        "#,
    )
    .bind(fund_id)
    .bind(request_id)
    .bind(ev.detail.as_deref().unwrap_or_default())
    .bind(amount.to_string())
    .execute(&mut *conn)
    .await?;

    sqlx::query(
        r#"
        UPDATE funds
        SET    request_count = MAX(request_count, ?2 + 1),
               updated_at    = ?3
        WHERE  fund_id = ?1
        "#,
    )
    .bind(fund_id)
    .bind(request_id)
    .bind(ev.timestamp)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn vote_cast(conn: &mut SqliteConnection, fund_id: i64, ev: &FundEvent) -> Result<()> {
    let Some(request_id) = ev.request_id else {
        warn!(event_id = %ev.event_id, "Vote event without request id; skipping");
        return Ok(());
    };

    // The event carries the post-vote tally; fall back to counting.
    let query = match ev.approvals {
        Some(approvals) => sqlx::query(
            "UPDATE requests SET approvals = MAX(approvals, ?3) \
             WHERE fund_id = ?1 AND request_id = ?2",
        )
        .bind(fund_id)
        .bind(request_id)
        .bind(approvals),
        None => sqlx::query(
            "UPDATE requests SET approvals = approvals + 1 \
             WHERE fund_id = ?1 AND request_id = ?2",
        )
        .bind(fund_id)
        .bind(request_id),
    };

    if query.execute(&mut *conn).await?.rows_affected() == 0 {
        warn!(fund_id, request_id, "Vote for unknown request; skipping");
    }
    Ok(())
}

async fn withdrawn(conn: &mut SqliteConnection, fund_id: i64, ev: &FundEvent) -> Result<()> {
    let (Some(request_id), Some(amount)) = (ev.request_id, ev.amount.as_deref()) else {
        warn!(event_id = %ev.event_id, "Withdrawn event without request id or amount; skipping");
        return Ok(());
    };
    let amount = parse_amount(amount)?;
    let Some(totals) = load_totals(conn, fund_id).await? else {
        warn!(fund_id, event_id = %ev.event_id, "Withdrawal for unknown fund; skipping");
        return Ok(());
    };

    sqlx::query("UPDATE requests SET completed = 1 WHERE fund_id = ?1 AND request_id = ?2")
        .bind(fund_id)
        .bind(request_id)
        .execute(&mut *conn)
        .await?;
    update_balance(conn, fund_id, checked_sub(totals.balance, amount)?, ev.timestamp).await
}

async fn update_balance(
    conn: &mut SqliteConnection,
    fund_id: i64,
    balance: i128,
    timestamp: i64,
) -> Result<()> {
    sqlx::query("UPDATE funds SET balance = ?2, updated_at = ?3 WHERE fund_id = ?1")
        .bind(fund_id)
        .bind(balance.to_string())
        .bind(timestamp)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

fn parse_amount(raw: &str) -> Result<i128> {
    raw.trim()
        .parse::<i128>()
        .map_err(|e| IndexerError::Projection(format!("bad amount {raw:?}: {e}")))
}

fn checked_add(a: i128, b: i128) -> Result<i128> {
    a.checked_add(b)
        .ok_or_else(|| IndexerError::Projection("amount overflow".into()))
}

fn checked_sub(a: i128, b: i128) -> Result<i128> {
    a.checked_sub(b)
        .ok_or_else(|| IndexerError::Projection("amount overflow".into()))
}
