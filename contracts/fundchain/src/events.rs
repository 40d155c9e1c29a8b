//! # Events
//!
//! Every state change publishes one event with topics `(symbol, fund_id)`
//! and a `#[contracttype]` struct as data. The off-chain indexer keys on
//! the leading symbol, so these strings are part of the public interface:
//!
//! | Topic       | Data               |
//! |-------------|--------------------|
//! | `created`   | [`FundCreated`]    |
//! | `funded`    | [`Funded`]         |
//! | `refunded`  | [`Refunded`]       |
//! | `req_new`   | [`RequestCreated`] |
//! | `voted`     | [`Voted`]          |
//! | `withdrawn` | [`Withdrawn`]      |

use soroban_sdk::{contracttype, symbol_short, Address, Env, String};

use crate::types::FundConfig;

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FundCreated {
    pub fund_id: u64,
    pub creator: Address,
    pub name: String,
    /// Empty when created through `create_fund`.
    pub description: String,
    pub image_uri: String,
    pub goal: i128,
    pub deadline: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Funded {
    pub fund_id: u64,
    pub contributor: Address,
    pub amount: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Refunded {
    pub fund_id: u64,
    pub contributor: Address,
    pub amount: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RequestCreated {
    pub fund_id: u64,
    pub request_id: u32,
    pub purpose: String,
    pub amount: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Voted {
    pub fund_id: u64,
    pub request_id: u32,
    pub voter: Address,
    /// Approval count after this vote.
    pub approvals: u32,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Withdrawn {
    pub fund_id: u64,
    pub request_id: u32,
    pub amount: i128,
}

pub fn emit_fund_created(env: &Env, config: &FundConfig) {
    env.events().publish(
        (symbol_short!("created"), config.id),
        FundCreated {
            fund_id: config.id,
            creator: config.creator.clone(),
            name: config.name.clone(),
            description: config.description.clone(),
            image_uri: config.image_uri.clone(),
            goal: config.goal,
            deadline: config.deadline,
        },
    );
}

pub fn emit_funded(env: &Env, fund_id: u64, contributor: Address, amount: i128) {
    env.events().publish(
        (symbol_short!("funded"), fund_id),
        Funded {
            fund_id,
            contributor,
            amount,
        },
    );
}

pub fn emit_refunded(env: &Env, fund_id: u64, contributor: Address, amount: i128) {
    env.events().publish(
        (symbol_short!("refunded"), fund_id),
        Refunded {
            fund_id,
            contributor,
            amount,
        },
    );
}

pub fn emit_request_created(
    env: &Env,
    fund_id: u64,
    request_id: u32,
    purpose: String,
    amount: i128,
) {
    env.events().publish(
        (symbol_short!("req_new"), fund_id),
        RequestCreated {
            fund_id,
            request_id,
            purpose,
            amount,
        },
    );
}

pub fn emit_voted(env: &Env, fund_id: u64, request_id: u32, voter: Address, approvals: u32) {
    env.events().publish(
        (symbol_short!("voted"), fund_id),
        Voted {
            fund_id,
            request_id,
            voter,
            approvals,
        },
    );
}

pub fn emit_withdrawn(env: &Env, fund_id: u64, request_id: u32, amount: i128) {
    env.events().publish(
        (symbol_short!("withdrawn"), fund_id),
        Withdrawn {
            fund_id,
            request_id,
            amount,
        },
    );
}
