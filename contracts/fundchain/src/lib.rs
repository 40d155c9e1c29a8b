//! # FundChain Contract
//!
//! A Soroban crowdfunding registry. Each fund is an independent escrow with
//! a goal and a deadline; contributors deposit while the fund is open, get
//! their money back if the goal was missed, and otherwise approve the
//! creator's spending requests by strict-majority vote.
//!
//! | Phase        | Entry Point(s)                                        |
//! |--------------|-------------------------------------------------------|
//! | Bootstrap    | [`FundChain::init`]                                   |
//! | Registry     | `create_fund`, `create_fund_with_details`, `get_funds`|
//! | Funding      | [`FundChain::deposit`], [`FundChain::refund`]         |
//! | Spending     | `create_request`, `vote_request`, `finalize_request`  |
//! | Queries      | `get_fund`, `get_status`, `get_request`, field getters|
//!
//! ## Architecture
//!
//! Storage access is delegated to [`storage`] and event publishing to
//! [`events`]. Every entry point validates all of its preconditions before
//! the first transfer or storage write, so a rejected call has no effect.

#![no_std]

use soroban_sdk::{contract, contracterror, contractimpl, token, Address, Env, String, Vec};

pub mod events;
mod storage;
mod types;

#[cfg(test)]
mod test_events;
#[cfg(test)]
mod test_requests;

pub use types::{Fund, FundStatus, SpendingRequest};
use types::{FundConfig, FundState};

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    AlreadyInitialized = 1,
    NotInitialized = 2,
    FundNotFound = 3,
    RequestNotFound = 4,
    InvalidAmount = 5,
    InvalidGoal = 6,
    InvalidDuration = 7,
    Overflow = 8,
    FundingClosed = 9,
    FundingStillActive = 10,
    GoalWasReached = 11,
    NoContribution = 12,
    NotCreator = 13,
    NotContributor = 14,
    AlreadyVoted = 15,
    InsufficientApprovals = 16,
    AlreadyCompleted = 17,
    InsufficientBalance = 18,
}

#[contract]
pub struct FundChain;

#[contractimpl]
impl FundChain {
    // ─────────────────────────────────────────────────────────
    // Initialisation
    // ─────────────────────────────────────────────────────────

    /// Set the token every fund is denominated in.
    ///
    /// Must be called exactly once after deployment; later calls fail with
    /// `Error::AlreadyInitialized`.
    pub fn init(env: Env, token: Address) -> Result<(), Error> {
        if storage::has_token(&env) {
            return Err(Error::AlreadyInitialized);
        }
        storage::set_token(&env, &token);
        Ok(())
    }

    pub fn token(env: Env) -> Result<Address, Error> {
        storage::get_token(&env)
    }

    // ─────────────────────────────────────────────────────────
    // Registry
    // ─────────────────────────────────────────────────────────

    /// Create and register a fund without optional metadata.
    ///
    /// The deadline is `now + duration`. Returns the new fund id.
    pub fn create_fund(
        env: Env,
        creator: Address,
        name: String,
        goal: i128,
        duration: u64,
    ) -> Result<u64, Error> {
        let empty = String::from_str(&env, "");
        Self::create_fund_with_details(env, creator, name, empty.clone(), empty, goal, duration)
    }

    /// Create and register a fund carrying a description and image URI.
    pub fn create_fund_with_details(
        env: Env,
        creator: Address,
        name: String,
        description: String,
        image_uri: String,
        goal: i128,
        duration: u64,
    ) -> Result<u64, Error> {
        storage::get_token(&env)?;
        creator.require_auth();

        if goal <= 0 {
            return Err(Error::InvalidGoal);
        }
        if duration == 0 {
            return Err(Error::InvalidDuration);
        }

        let now = env.ledger().timestamp();
        let deadline = now.checked_add(duration).ok_or(Error::Overflow)?;

        let id = storage::get_and_increment_fund_id(&env);
        let config = FundConfig {
            id,
            creator,
            name,
            description,
            image_uri,
            goal,
            deadline,
            created_at: now,
        };
        storage::save_fund(&env, &config, &FundState::initial());

        events::emit_fund_created(&env, &config);
        Ok(id)
    }

    /// All fund ids in creation order.
    pub fn get_funds(env: Env) -> Vec<u64> {
        storage::list_fund_ids(&env)
    }

    pub fn fund_count(env: Env) -> u64 {
        storage::fund_count(&env)
    }

    // ─────────────────────────────────────────────────────────
    // Funding
    // ─────────────────────────────────────────────────────────

    /// Deposit `amount` of the fund token from `contributor`.
    ///
    /// Only accepted while `now < deadline`. The first deposit of an address
    /// increments `contributor_count`; reaching the goal latches
    /// `goal_reached`.
    pub fn deposit(env: Env, fund_id: u64, contributor: Address, amount: i128) -> Result<(), Error> {
        contributor.require_auth();

        if amount <= 0 {
            return Err(Error::InvalidAmount);
        }

        let token = storage::get_token(&env)?;
        let (config, mut state) = storage::load_fund_pair(&env, fund_id)?;

        if env.ledger().timestamp() >= config.deadline {
            return Err(Error::FundingClosed);
        }

        let previous = storage::get_contribution(&env, fund_id, &contributor);
        let contribution = previous
            .unwrap_or(0)
            .checked_add(amount)
            .ok_or(Error::Overflow)?;
        state.total_raised = state
            .total_raised
            .checked_add(amount)
            .ok_or(Error::Overflow)?;
        state.balance = state.balance.checked_add(amount).ok_or(Error::Overflow)?;
        if previous.is_none() {
            state.contributor_count = state
                .contributor_count
                .checked_add(1)
                .ok_or(Error::Overflow)?;
        }
        if state.total_raised >= config.goal {
            state.goal_reached = true;
        }

        token::Client::new(&env, &token).transfer(
            &contributor,
            &env.current_contract_address(),
            &amount,
        );

        storage::set_contribution(&env, fund_id, &contributor, contribution);
        storage::save_fund_state(&env, fund_id, &state);

        events::emit_funded(&env, fund_id, contributor, amount);
        Ok(())
    }

    /// Return the caller's whole contribution from a failed fund.
    ///
    /// `total_raised` and `contributor_count` keep their historical values;
    /// only the contributor's ledger entry and the fund balance change.
    pub fn refund(env: Env, fund_id: u64, contributor: Address) -> Result<(), Error> {
        contributor.require_auth();

        let token = storage::get_token(&env)?;
        let (config, mut state) = storage::load_fund_pair(&env, fund_id)?;

        if env.ledger().timestamp() < config.deadline {
            return Err(Error::FundingStillActive);
        }
        if state.goal_reached {
            return Err(Error::GoalWasReached);
        }

        let amount = storage::get_contribution(&env, fund_id, &contributor).unwrap_or(0);
        if amount <= 0 {
            return Err(Error::NoContribution);
        }
        // A failed fund may already have paid out a request.
        if state.balance < amount {
            return Err(Error::InsufficientBalance);
        }
        state.balance -= amount;

        token::Client::new(&env, &token).transfer(
            &env.current_contract_address(),
            &contributor,
            &amount,
        );

        storage::set_contribution(&env, fund_id, &contributor, 0);
        storage::save_fund_state(&env, fund_id, &state);

        events::emit_refunded(&env, fund_id, contributor, amount);
        Ok(())
    }

    // ─────────────────────────────────────────────────────────
    // Spending requests
    // ─────────────────────────────────────────────────────────

    /// Propose a withdrawal. Creator only; not gated on fund status.
    ///
    /// Returns the request index.
    pub fn create_request(
        env: Env,
        fund_id: u64,
        caller: Address,
        purpose: String,
        amount: i128,
    ) -> Result<u32, Error> {
        caller.require_auth();

        let (config, mut state) = storage::load_fund_pair(&env, fund_id)?;
        if caller != config.creator {
            return Err(Error::NotCreator);
        }
        if amount <= 0 {
            return Err(Error::InvalidAmount);
        }

        let index = state.request_count;
        state.request_count = index.checked_add(1).ok_or(Error::Overflow)?;

        let request = SpendingRequest {
            purpose: purpose.clone(),
            amount,
            completed: false,
            approvals: 0,
        };
        storage::save_request(&env, fund_id, index, &request);
        storage::save_fund_state(&env, fund_id, &state);

        events::emit_request_created(&env, fund_id, index, purpose, amount);
        Ok(index)
    }

    /// Approve request `request_id`. One vote per contributor per request.
    ///
    /// The voter must hold a nonzero contribution at vote time, so a
    /// refunded contributor can no longer vote.
    pub fn vote_request(env: Env, fund_id: u64, caller: Address, request_id: u32) -> Result<(), Error> {
        caller.require_auth();

        storage::load_fund_config(&env, fund_id)?;
        let mut request = storage::load_request(&env, fund_id, request_id)?;

        if request.completed {
            return Err(Error::AlreadyCompleted);
        }
        if storage::get_contribution(&env, fund_id, &caller).unwrap_or(0) <= 0 {
            return Err(Error::NotContributor);
        }
        if storage::has_voted(&env, fund_id, request_id, &caller) {
            return Err(Error::AlreadyVoted);
        }

        request.approvals = request.approvals.checked_add(1).ok_or(Error::Overflow)?;

        storage::record_vote(&env, fund_id, request_id, &caller);
        storage::save_request(&env, fund_id, request_id, &request);

        events::emit_voted(&env, fund_id, request_id, caller, request.approvals);
        Ok(())
    }

    /// Pay request `request_id` out to the creator.
    ///
    /// Needs a strict majority of all-time contributors
    /// (`approvals * 2 > contributor_count`) and enough fund balance.
    pub fn finalize_request(
        env: Env,
        fund_id: u64,
        caller: Address,
        request_id: u32,
    ) -> Result<(), Error> {
        caller.require_auth();

        let token = storage::get_token(&env)?;
        let (config, mut state) = storage::load_fund_pair(&env, fund_id)?;
        if caller != config.creator {
            return Err(Error::NotCreator);
        }

        let mut request = storage::load_request(&env, fund_id, request_id)?;
        if request.completed {
            return Err(Error::AlreadyCompleted);
        }
        if !has_quorum(request.approvals, state.contributor_count) {
            return Err(Error::InsufficientApprovals);
        }
        if state.balance < request.amount {
            return Err(Error::InsufficientBalance);
        }

        state.balance -= request.amount;
        request.completed = true;

        token::Client::new(&env, &token).transfer(
            &env.current_contract_address(),
            &config.creator,
            &request.amount,
        );

        storage::save_request(&env, fund_id, request_id, &request);
        storage::save_fund_state(&env, fund_id, &state);

        events::emit_withdrawn(&env, fund_id, request_id, request.amount);
        Ok(())
    }

    // ─────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────

    pub fn get_fund(env: Env, fund_id: u64) -> Result<Fund, Error> {
        storage::load_fund(&env, fund_id)
    }

    pub fn get_status(env: Env, fund_id: u64) -> Result<FundStatus, Error> {
        let (config, state) = storage::load_fund_pair(&env, fund_id)?;
        Ok(FundStatus::derive(
            env.ledger().timestamp(),
            config.deadline,
            state.goal_reached,
        ))
    }

    pub fn creator(env: Env, fund_id: u64) -> Result<Address, Error> {
        Ok(storage::load_fund_config(&env, fund_id)?.creator)
    }

    pub fn project_name(env: Env, fund_id: u64) -> Result<String, Error> {
        Ok(storage::load_fund_config(&env, fund_id)?.name)
    }

    pub fn description(env: Env, fund_id: u64) -> Result<String, Error> {
        Ok(storage::load_fund_config(&env, fund_id)?.description)
    }

    pub fn image_uri(env: Env, fund_id: u64) -> Result<String, Error> {
        Ok(storage::load_fund_config(&env, fund_id)?.image_uri)
    }

    pub fn goal(env: Env, fund_id: u64) -> Result<i128, Error> {
        Ok(storage::load_fund_config(&env, fund_id)?.goal)
    }

    pub fn deadline(env: Env, fund_id: u64) -> Result<u64, Error> {
        Ok(storage::load_fund_config(&env, fund_id)?.deadline)
    }

    pub fn total_raised(env: Env, fund_id: u64) -> Result<i128, Error> {
        Ok(storage::load_fund_state(&env, fund_id)?.total_raised)
    }

    pub fn goal_reached(env: Env, fund_id: u64) -> Result<bool, Error> {
        Ok(storage::load_fund_state(&env, fund_id)?.goal_reached)
    }

    pub fn contributor_count(env: Env, fund_id: u64) -> Result<u32, Error> {
        Ok(storage::load_fund_state(&env, fund_id)?.contributor_count)
    }

    pub fn request_count(env: Env, fund_id: u64) -> Result<u32, Error> {
        Ok(storage::load_fund_state(&env, fund_id)?.request_count)
    }

    /// Tokens the fund currently holds.
    pub fn get_balance(env: Env, fund_id: u64) -> Result<i128, Error> {
        Ok(storage::load_fund_state(&env, fund_id)?.balance)
    }

    /// Cumulative deposit of `contributor`; zero after a refund.
    pub fn contribution(env: Env, fund_id: u64, contributor: Address) -> Result<i128, Error> {
        storage::load_fund_config(&env, fund_id)?;
        Ok(storage::get_contribution(&env, fund_id, &contributor).unwrap_or(0))
    }

    pub fn get_request(env: Env, fund_id: u64, request_id: u32) -> Result<SpendingRequest, Error> {
        storage::load_fund_config(&env, fund_id)?;
        storage::load_request(&env, fund_id, request_id)
    }

    pub fn has_voted(env: Env, fund_id: u64, request_id: u32, voter: Address) -> Result<bool, Error> {
        storage::load_fund_config(&env, fund_id)?;
        storage::load_request(&env, fund_id, request_id)?;
        Ok(storage::has_voted(&env, fund_id, request_id, &voter))
    }
}

/// Strict majority of all-time distinct contributors.
pub(crate) fn has_quorum(approvals: u32, contributor_count: u32) -> bool {
    u64::from(approvals) * 2 > u64::from(contributor_count)
}
