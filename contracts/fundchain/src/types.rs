//! # Types
//!
//! Shared data structures used across all modules of the FundChain contract.
//!
//! ## Design decisions
//!
//! ### Config / State split
//!
//! A `Fund` is internally stored as two separate ledger entries:
//!
//! - [`FundConfig`] — written once by the registry; never mutated.
//! - [`FundState`] — written on every deposit, refund, request and payout.
//!
//! The public API exposes the reconstructed [`Fund`] struct for convenience.
//!
//! ### Status is derived, not stored
//!
//! [`FundStatus`] is computed from the ledger clock and the goal flag:
//!
//! ```text
//! Open ──(deadline passes, goal_reached)──► Succeeded
//!   └───(deadline passes, !goal_reached)──► Failed
//! ```
//!
//! Both closed states are terminal. `Failed` is the only state in which
//! refunds are accepted.

use soroban_sdk::{contracttype, Address, String};

/// Lifecycle status of a fund, derived from time and the goal flag.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FundStatus {
    /// Accepting deposits.
    Open,
    /// Deadline passed with the goal reached.
    Succeeded,
    /// Deadline passed without reaching the goal; refunds enabled.
    Failed,
}

impl FundStatus {
    pub fn derive(now: u64, deadline: u64, goal_reached: bool) -> Self {
        if now < deadline {
            FundStatus::Open
        } else if goal_reached {
            FundStatus::Succeeded
        } else {
            FundStatus::Failed
        }
    }
}

/// Immutable fund configuration, written once at creation.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FundConfig {
    pub id: u64,
    pub creator: Address,
    pub name: String,
    pub description: String,
    pub image_uri: String,
    pub goal: i128,
    pub deadline: u64,
    pub created_at: u64,
}

/// Mutable fund state.
///
/// `balance` is what the fund still holds; `total_raised` only ever grows.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FundState {
    pub total_raised: i128,
    pub goal_reached: bool,
    pub contributor_count: u32,
    pub request_count: u32,
    pub balance: i128,
}

impl FundState {
    pub fn initial() -> Self {
        FundState {
            total_raised: 0,
            goal_reached: false,
            contributor_count: 0,
            request_count: 0,
            balance: 0,
        }
    }
}

/// Full on-chain representation of a crowdfunding campaign.
///
/// Used as the public API return type; reconstructed internally from
/// the split `FundConfig` + `FundState` storage entries.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Fund {
    /// Registry index (auto-incremented).
    pub id: u64,
    /// Campaign owner; the only address allowed to create and finalize requests.
    pub creator: Address,
    /// Project name shown to contributors.
    pub name: String,
    /// Optional long description (empty when not supplied).
    pub description: String,
    /// Optional image reference, e.g. an IPFS URI (empty when not supplied).
    pub image_uri: String,
    /// Target amount in the token's smallest unit.
    pub goal: i128,
    /// Ledger timestamp at which deposits stop being accepted.
    pub deadline: u64,
    /// Ledger timestamp at creation.
    pub created_at: u64,
    /// Sum of all accepted deposits.
    pub total_raised: i128,
    /// Latched once `total_raised >= goal`.
    pub goal_reached: bool,
    /// Distinct addresses that ever deposited.
    pub contributor_count: u32,
    /// Number of spending requests created so far.
    pub request_count: u32,
    /// Tokens currently held for this fund.
    pub balance: i128,
}

/// A creator-proposed withdrawal subject to contributor vote.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SpendingRequest {
    pub purpose: String,
    pub amount: i128,
    pub completed: bool,
    pub approvals: u32,
}
