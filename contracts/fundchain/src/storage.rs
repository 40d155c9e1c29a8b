//! # Storage
//!
//! Provides typed helpers over Soroban's two storage tiers used by FundChain:
//!
//! ## Instance storage (contract-lifetime TTL)
//!
//! | Key         | Type      | Description                             |
//! |-------------|-----------|-----------------------------------------|
//! | `Token`     | `Address` | Token every fund is denominated in      |
//! | `FundCount` | `u64`     | Auto-increment fund ID counter          |
//!
//! Instance TTL is bumped by **7 days** whenever it falls below 1 day remaining.
//!
//! ## Persistent storage (per-entry TTL)
//!
//! | Key                          | Type              | Description                     |
//! |------------------------------|-------------------|---------------------------------|
//! | `FundConfig(id)`             | `FundConfig`      | Immutable fund configuration    |
//! | `FundState(id)`              | `FundState`       | Mutable fund state              |
//! | `Contribution(id, addr)`     | `i128`            | Cumulative deposit of `addr`    |
//! | `Request(id, index)`         | `SpendingRequest` | Spending request `index`        |
//! | `Vote(id, index, addr)`      | `bool`            | `addr` approved request `index` |
//!
//! Persistent TTL is bumped by **30 days** whenever it falls below 7 days remaining.
//!
//! A `Contribution` entry is created on an address's first deposit and is
//! never removed; a refund writes zero. Presence of the key is therefore the
//! "has ever contributed" flag that drives `contributor_count`.

use soroban_sdk::{contracttype, Address, Env, Vec};

use crate::types::{Fund, FundConfig, FundState, SpendingRequest};
use crate::Error;

// ── TTL Constants ────────────────────────────────────────────────────

/// Approximate ledgers per day (~5 seconds per ledger).
const DAY_IN_LEDGERS: u32 = 17_280;

const INSTANCE_BUMP_AMOUNT: u32 = 7 * DAY_IN_LEDGERS;
const INSTANCE_LIFETIME_THRESHOLD: u32 = DAY_IN_LEDGERS;

const PERSISTENT_BUMP_AMOUNT: u32 = 30 * DAY_IN_LEDGERS;
const PERSISTENT_LIFETIME_THRESHOLD: u32 = 7 * DAY_IN_LEDGERS;

// ── Storage Keys ─────────────────────────────────────────────────────

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DataKey {
    /// Denomination token (Instance).
    Token,
    /// Global auto-increment counter for fund IDs (Instance).
    FundCount,
    /// Immutable fund configuration keyed by ID (Persistent).
    FundConfig(u64),
    /// Mutable fund state keyed by ID (Persistent).
    FundState(u64),
    /// Per-contributor cumulative deposit (Persistent).
    Contribution(u64, Address),
    /// Spending request by fund and index (Persistent).
    Request(u64, u32),
    /// Vote marker by fund, request index and voter (Persistent).
    Vote(u64, u32, Address),
}

// ── Instance Storage Helpers ─────────────────────────────────────────

fn bump_instance(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
}

pub fn has_token(env: &Env) -> bool {
    env.storage().instance().has(&DataKey::Token)
}

pub fn set_token(env: &Env, token: &Address) {
    env.storage().instance().set(&DataKey::Token, token);
    bump_instance(env);
}

pub fn get_token(env: &Env) -> Result<Address, Error> {
    bump_instance(env);
    env.storage()
        .instance()
        .get(&DataKey::Token)
        .ok_or(Error::NotInitialized)
}

pub fn fund_count(env: &Env) -> u64 {
    env.storage()
        .instance()
        .get(&DataKey::FundCount)
        .unwrap_or(0)
}

/// Reads, increments, and stores the fund counter.
/// Returns the ID to use for the *current* fund (pre-increment value).
pub fn get_and_increment_fund_id(env: &Env) -> u64 {
    bump_instance(env);
    let current = fund_count(env);
    env.storage()
        .instance()
        .set(&DataKey::FundCount, &(current + 1));
    current
}

/// All registered fund IDs in creation order.
pub fn list_fund_ids(env: &Env) -> Vec<u64> {
    let mut ids = Vec::new(env);
    for id in 0..fund_count(env) {
        ids.push_back(id);
    }
    ids
}

// ── Persistent Storage Helpers ───────────────────────────────────────

fn bump_persistent(env: &Env, key: &DataKey) {
    env.storage()
        .persistent()
        .extend_ttl(key, PERSISTENT_LIFETIME_THRESHOLD, PERSISTENT_BUMP_AMOUNT);
}

/// Save the immutable config and the initial mutable state for a new fund.
pub fn save_fund(env: &Env, config: &FundConfig, state: &FundState) {
    let config_key = DataKey::FundConfig(config.id);
    let state_key = DataKey::FundState(config.id);

    env.storage().persistent().set(&config_key, config);
    env.storage().persistent().set(&state_key, state);
    bump_persistent(env, &config_key);
    bump_persistent(env, &state_key);
}

pub fn load_fund_config(env: &Env, id: u64) -> Result<FundConfig, Error> {
    let key = DataKey::FundConfig(id);
    let config: FundConfig = env
        .storage()
        .persistent()
        .get(&key)
        .ok_or(Error::FundNotFound)?;
    bump_persistent(env, &key);
    Ok(config)
}

pub fn load_fund_state(env: &Env, id: u64) -> Result<FundState, Error> {
    let key = DataKey::FundState(id);
    let state: FundState = env
        .storage()
        .persistent()
        .get(&key)
        .ok_or(Error::FundNotFound)?;
    bump_persistent(env, &key);
    Ok(state)
}

/// Load config and state together; most entry points need both.
pub fn load_fund_pair(env: &Env, id: u64) -> Result<(FundConfig, FundState), Error> {
    Ok((load_fund_config(env, id)?, load_fund_state(env, id)?))
}

pub fn save_fund_state(env: &Env, id: u64, state: &FundState) {
    let key = DataKey::FundState(id);
    env.storage().persistent().set(&key, state);
    bump_persistent(env, &key);
}

/// Load the full `Fund` by combining config and state.
pub fn load_fund(env: &Env, id: u64) -> Result<Fund, Error> {
    let (config, state) = load_fund_pair(env, id)?;
    Ok(Fund {
        id: config.id,
        creator: config.creator,
        name: config.name,
        description: config.description,
        image_uri: config.image_uri,
        goal: config.goal,
        deadline: config.deadline,
        created_at: config.created_at,
        total_raised: state.total_raised,
        goal_reached: state.goal_reached,
        contributor_count: state.contributor_count,
        request_count: state.request_count,
        balance: state.balance,
    })
}

// ── Contribution ledger ──────────────────────────────────────────────

/// `None` when `contributor` never deposited into `fund_id`.
pub fn get_contribution(env: &Env, fund_id: u64, contributor: &Address) -> Option<i128> {
    let key = DataKey::Contribution(fund_id, contributor.clone());
    let amount: Option<i128> = env.storage().persistent().get(&key);
    if amount.is_some() {
        bump_persistent(env, &key);
    }
    amount
}

pub fn set_contribution(env: &Env, fund_id: u64, contributor: &Address, amount: i128) {
    let key = DataKey::Contribution(fund_id, contributor.clone());
    env.storage().persistent().set(&key, &amount);
    bump_persistent(env, &key);
}

// ── Spending requests ────────────────────────────────────────────────

pub fn load_request(env: &Env, fund_id: u64, index: u32) -> Result<SpendingRequest, Error> {
    let key = DataKey::Request(fund_id, index);
    let request: SpendingRequest = env
        .storage()
        .persistent()
        .get(&key)
        .ok_or(Error::RequestNotFound)?;
    bump_persistent(env, &key);
    Ok(request)
}

pub fn save_request(env: &Env, fund_id: u64, index: u32, request: &SpendingRequest) {
    let key = DataKey::Request(fund_id, index);
    env.storage().persistent().set(&key, request);
    bump_persistent(env, &key);
}

pub fn has_voted(env: &Env, fund_id: u64, index: u32, voter: &Address) -> bool {
    env.storage()
        .persistent()
        .has(&DataKey::Vote(fund_id, index, voter.clone()))
}

pub fn record_vote(env: &Env, fund_id: u64, index: u32, voter: &Address) {
    let key = DataKey::Vote(fund_id, index, voter.clone());
    env.storage().persistent().set(&key, &true);
    bump_persistent(env, &key);
}
