//! Canonical event types emitted by the FundChain contract, plus the
//! read-model rows the API serves.
//!
//! These mirror the Soroban contract events defined in
//! `contracts/fundchain/src/events.rs`.

use serde::{Deserialize, Serialize};

/// All recognised event kinds from the FundChain contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A fund was registered (`created` topic).
    FundCreated,
    /// A contributor deposited (`funded` topic).
    Funded,
    /// A contributor took their deposit back (`refunded` topic).
    Refunded,
    /// The creator proposed a spending request (`req_new` topic).
    RequestCreated,
    /// A contributor approved a request (`voted` topic).
    VoteCast,
    /// A request was paid out to the creator (`withdrawn` topic).
    Withdrawn,
    /// An event from this contract that we don't recognise yet.
    Unknown,
}

impl EventKind {
    /// Parse the leading topic symbol string produced by Soroban into an [`EventKind`].
    pub fn from_topic(topic: &str) -> Self {
        match topic {
            "created" => Self::FundCreated,
            "funded" => Self::Funded,
            "refunded" => Self::Refunded,
            "req_new" => Self::RequestCreated,
            "voted" => Self::VoteCast,
            "withdrawn" => Self::Withdrawn,
            _ => Self::Unknown,
        }
    }

    /// Return a short identifier string suitable for storage in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FundCreated => "fund_created",
            Self::Funded => "funded",
            Self::Refunded => "refunded",
            Self::RequestCreated => "request_created",
            Self::VoteCast => "vote_cast",
            Self::Withdrawn => "withdrawn",
            Self::Unknown => "unknown",
        }
    }
}

/// A fully decoded FundChain event, ready to be stored in the database.
///
/// Which optional fields are set depends on `kind`:
///
/// | kind              | actor       | amount | detail  | other               |
/// |-------------------|-------------|--------|---------|---------------------|
/// | `FundCreated`     | creator     | goal   | name    | `deadline`, `description`, `image_uri` |
/// | `Funded`          | contributor | amount |         |                     |
/// | `Refunded`        | contributor | amount |         |                     |
/// | `RequestCreated`  |             | amount | purpose | `request_id`        |
/// | `VoteCast`        | voter       |        |         | `request_id`, `approvals` |
/// | `Withdrawn`       |             | amount |         | `request_id`        |
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundEvent {
    /// RPC event id; unique per contract event.
    pub event_id: String,
    pub kind: EventKind,
    pub fund_id: Option<i64>,
    pub request_id: Option<i64>,
    pub actor: Option<String>,
    pub amount: Option<String>,
    pub detail: Option<String>,
    pub description: Option<String>,
    pub image_uri: Option<String>,
    pub deadline: Option<i64>,
    pub approvals: Option<i64>,
    pub ledger: i64,
    pub timestamp: i64,
    pub contract_id: String,
    pub tx_hash: Option<String>,
}

/// A raw event record as stored in / read from the database.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct EventRecord {
    pub id: i64,
    pub event_id: String,
    pub event_type: String,
    pub fund_id: Option<i64>,
    pub request_id: Option<i64>,
    pub actor: Option<String>,
    pub amount: Option<String>,
    pub detail: Option<String>,
    pub description: Option<String>,
    pub image_uri: Option<String>,
    pub deadline: Option<i64>,
    pub approvals: Option<i64>,
    pub ledger: i64,
    pub timestamp: i64,
    pub contract_id: String,
    pub tx_hash: Option<String>,
    pub created_at: i64,
}

/// Mirrored fund state. Amounts are decimal strings (the contract uses i128).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct FundRecord {
    pub fund_id: i64,
    pub name: String,
    pub creator: String,
    pub description: String,
    pub image_uri: String,
    pub category: String,
    pub goal: String,
    pub deadline: i64,
    pub total_raised: String,
    pub goal_reached: bool,
    pub contributor_count: i64,
    pub request_count: i64,
    pub balance: String,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RequestRecord {
    pub fund_id: i64,
    pub request_id: i64,
    pub purpose: String,
    pub amount: String,
    pub completed: bool,
    pub approvals: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ContributionRecord {
    pub fund_id: i64,
    pub contributor: String,
    pub amount: String,
}
