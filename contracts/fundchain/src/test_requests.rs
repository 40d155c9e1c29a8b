extern crate std;

use soroban_sdk::{testutils::Address as _, token, Address, Env, String};

use crate::invariants::{assert_all_fund_invariants, assert_approvals_bounded};
use crate::test::{advance, create_fund, funded_user, setup, DAY, UNIT};
use crate::{has_quorum, Error, FundChainClient};

/// Fund with `shares.len()` contributors depositing the given amounts.
fn fund_with_contributors(
    env: &Env,
    client: &FundChainClient,
    token: &token::Client,
    shares: &[i128],
) -> (u64, Address, std::vec::Vec<Address>) {
    let (id, creator) = create_fund(env, client);
    let mut contributors = std::vec::Vec::new();
    for share in shares {
        let who = funded_user(env, token, *share);
        client.deposit(&id, &who, share);
        contributors.push(who);
    }
    (id, creator, contributors)
}

fn purpose(env: &Env) -> String {
    String::from_str(env, "Buy gear")
}

#[test]
fn test_quorum_is_strict_majority() {
    assert!(!has_quorum(0, 0));
    assert!(has_quorum(1, 1));
    assert!(!has_quorum(1, 2));
    assert!(has_quorum(2, 2));
    assert!(!has_quorum(1, 3));
    assert!(has_quorum(2, 3));
    assert!(!has_quorum(2, 4));
    assert!(has_quorum(3, 4));
    assert!(has_quorum(u32::MAX, u32::MAX));
}

#[test]
fn test_create_request_by_creator() {
    let (env, client, token) = setup();
    let (id, creator, _) = fund_with_contributors(&env, &client, &token, &[6 * UNIT]);

    let index = client.create_request(&id, &creator, &purpose(&env), &(2 * UNIT));

    assert_eq!(index, 0);
    assert_eq!(client.request_count(&id), 1);
    let request = client.get_request(&id, &0);
    assert_eq!(request.purpose, purpose(&env));
    assert_eq!(request.amount, 2 * UNIT);
    assert!(!request.completed);
    assert_eq!(request.approvals, 0);

    let second = client.create_request(&id, &creator, &String::from_str(&env, "Rent"), &UNIT);
    assert_eq!(second, 1);
    assert_eq!(client.request_count(&id), 2);
}

#[test]
fn test_create_request_by_non_creator_fails() {
    let (env, client, token) = setup();
    let (id, _creator, contributors) = fund_with_contributors(&env, &client, &token, &[UNIT]);

    assert_eq!(
        client.try_create_request(&id, &contributors[0], &purpose(&env), &(2 * UNIT)),
        Err(Ok(Error::NotCreator))
    );
    assert_eq!(client.request_count(&id), 0);
}

#[test]
fn test_create_request_rejects_zero_amount() {
    let (env, client, _token) = setup();
    let (id, creator) = create_fund(&env, &client);

    assert_eq!(
        client.try_create_request(&id, &creator, &purpose(&env), &0),
        Err(Ok(Error::InvalidAmount))
    );
}

#[test]
fn test_create_request_not_gated_on_status() {
    let (env, client, token) = setup();
    let (id, creator, _) = fund_with_contributors(&env, &client, &token, &[UNIT]);

    // Open, then failed.
    client.create_request(&id, &creator, &purpose(&env), &UNIT);
    advance(&env, 8 * DAY);
    client.create_request(&id, &creator, &purpose(&env), &UNIT);
    assert_eq!(client.request_count(&id), 2);
}

#[test]
fn test_contributors_vote() {
    let (env, client, token) = setup();
    let (id, creator, contributors) =
        fund_with_contributors(&env, &client, &token, &[3 * UNIT, 3 * UNIT]);
    client.create_request(&id, &creator, &purpose(&env), &(2 * UNIT));

    client.vote_request(&id, &contributors[0], &0);
    client.vote_request(&id, &contributors[1], &0);

    let request = client.get_request(&id, &0);
    assert_eq!(request.approvals, 2);
    assert!(client.has_voted(&id, &0, &contributors[0]));
    assert_approvals_bounded(&request, &client.get_fund(&id));
}

#[test]
fn test_vote_from_non_contributor_fails() {
    let (env, client, token) = setup();
    let (id, creator, _) = fund_with_contributors(&env, &client, &token, &[6 * UNIT]);
    client.create_request(&id, &creator, &purpose(&env), &(2 * UNIT));
    let stranger = Address::generate(&env);

    assert_eq!(
        client.try_vote_request(&id, &stranger, &0),
        Err(Ok(Error::NotContributor))
    );
    assert_eq!(client.get_request(&id, &0).approvals, 0);
    assert!(!client.has_voted(&id, &0, &stranger));
}

#[test]
fn test_duplicate_vote_fails_but_other_request_succeeds() {
    let (env, client, token) = setup();
    let (id, creator, contributors) = fund_with_contributors(&env, &client, &token, &[6 * UNIT]);
    let alice = &contributors[0];
    client.create_request(&id, &creator, &purpose(&env), &(2 * UNIT));
    client.create_request(&id, &creator, &String::from_str(&env, "Venue"), &UNIT);

    client.vote_request(&id, alice, &0);
    assert_eq!(
        client.try_vote_request(&id, alice, &0),
        Err(Ok(Error::AlreadyVoted))
    );
    assert_eq!(client.get_request(&id, &0).approvals, 1);

    client.vote_request(&id, alice, &1);
    assert_eq!(client.get_request(&id, &1).approvals, 1);
}

#[test]
fn test_vote_on_missing_request_fails() {
    let (env, client, token) = setup();
    let (id, _creator, contributors) = fund_with_contributors(&env, &client, &token, &[UNIT]);

    assert_eq!(
        client.try_vote_request(&id, &contributors[0], &0),
        Err(Ok(Error::RequestNotFound))
    );
}

#[test]
fn test_voting_not_gated_by_deadline() {
    let (env, client, token) = setup();
    let (id, creator, contributors) =
        fund_with_contributors(&env, &client, &token, &[3 * UNIT, 3 * UNIT]);
    advance(&env, 30 * DAY);

    client.create_request(&id, &creator, &purpose(&env), &UNIT);
    client.vote_request(&id, &contributors[0], &0);
    assert_eq!(client.get_request(&id, &0).approvals, 1);
}

#[test]
fn test_refunded_contributor_cannot_vote() {
    let (env, client, token) = setup();
    let (id, creator, contributors) = fund_with_contributors(&env, &client, &token, &[UNIT]);
    advance(&env, 8 * DAY);
    client.refund(&id, &contributors[0]);
    client.create_request(&id, &creator, &purpose(&env), &UNIT);

    assert_eq!(
        client.try_vote_request(&id, &contributors[0], &0),
        Err(Ok(Error::NotContributor))
    );
}

#[test]
fn test_finalize_with_majority_pays_creator() {
    let (env, client, token) = setup();
    let (id, creator, contributors) =
        fund_with_contributors(&env, &client, &token, &[2 * UNIT, 2 * UNIT, 2 * UNIT]);
    client.create_request(&id, &creator, &purpose(&env), &UNIT);

    client.vote_request(&id, &contributors[0], &0);
    client.vote_request(&id, &contributors[1], &0);
    client.finalize_request(&id, &creator, &0);

    assert_eq!(token.balance(&creator), UNIT);
    assert_eq!(client.get_balance(&id), 5 * UNIT);
    assert_eq!(token.balance(&client.address), 5 * UNIT);
    assert!(client.get_request(&id, &0).completed);
    assert_all_fund_invariants(&client.get_fund(&id));
}

#[test]
fn test_finalize_buy_gear_scenario() {
    let (env, client, token) = setup();
    let (id, creator, contributors) =
        fund_with_contributors(&env, &client, &token, &[2 * UNIT, 3 * UNIT]);
    assert!(client.goal_reached(&id));

    client.create_request(&id, &creator, &purpose(&env), &(2 * UNIT));
    client.vote_request(&id, &contributors[0], &0);
    client.vote_request(&id, &contributors[1], &0);
    client.finalize_request(&id, &creator, &0);

    assert_eq!(token.balance(&creator), 2 * UNIT);
    assert!(client.get_request(&id, &0).completed);
}

#[test]
fn test_finalize_without_majority_fails() {
    let (env, client, token) = setup();
    let (id, creator, contributors) =
        fund_with_contributors(&env, &client, &token, &[2 * UNIT, 2 * UNIT, 2 * UNIT]);
    client.create_request(&id, &creator, &purpose(&env), &UNIT);
    client.vote_request(&id, &contributors[0], &0);

    assert_eq!(
        client.try_finalize_request(&id, &creator, &0),
        Err(Ok(Error::InsufficientApprovals))
    );
    assert!(!client.get_request(&id, &0).completed);
    assert_eq!(token.balance(&creator), 0);
}

#[test]
fn test_finalize_with_no_votes_fails() {
    let (env, client, token) = setup();
    let (id, creator, _) = fund_with_contributors(&env, &client, &token, &[7 * UNIT]);
    client.create_request(&id, &creator, &purpose(&env), &UNIT);

    assert_eq!(
        client.try_finalize_request(&id, &creator, &0),
        Err(Ok(Error::InsufficientApprovals))
    );
}

#[test]
fn test_half_of_two_is_not_a_majority() {
    let (env, client, token) = setup();
    let (id, creator, contributors) =
        fund_with_contributors(&env, &client, &token, &[3 * UNIT, 3 * UNIT]);
    client.create_request(&id, &creator, &purpose(&env), &UNIT);
    client.vote_request(&id, &contributors[0], &0);

    assert_eq!(
        client.try_finalize_request(&id, &creator, &0),
        Err(Ok(Error::InsufficientApprovals))
    );
}

#[test]
fn test_finalize_by_non_creator_fails() {
    let (env, client, token) = setup();
    let (id, creator, contributors) = fund_with_contributors(&env, &client, &token, &[6 * UNIT]);
    client.create_request(&id, &creator, &purpose(&env), &UNIT);
    client.vote_request(&id, &contributors[0], &0);

    assert_eq!(
        client.try_finalize_request(&id, &contributors[0], &0),
        Err(Ok(Error::NotCreator))
    );
    assert!(!client.get_request(&id, &0).completed);
}

#[test]
fn test_finalize_twice_fails_without_second_transfer() {
    let (env, client, token) = setup();
    let (id, creator, contributors) = fund_with_contributors(&env, &client, &token, &[6 * UNIT]);
    client.create_request(&id, &creator, &purpose(&env), &UNIT);
    client.vote_request(&id, &contributors[0], &0);
    client.finalize_request(&id, &creator, &0);

    assert_eq!(
        client.try_finalize_request(&id, &creator, &0),
        Err(Ok(Error::AlreadyCompleted))
    );
    assert_eq!(token.balance(&creator), UNIT);
    assert_eq!(client.get_balance(&id), 5 * UNIT);
}

#[test]
fn test_vote_on_completed_request_fails() {
    let (env, client, token) = setup();
    let (id, creator, contributors) =
        fund_with_contributors(&env, &client, &token, &[3 * UNIT, 3 * UNIT, 3 * UNIT]);
    client.create_request(&id, &creator, &purpose(&env), &UNIT);
    client.vote_request(&id, &contributors[0], &0);
    client.vote_request(&id, &contributors[1], &0);
    client.finalize_request(&id, &creator, &0);

    assert_eq!(
        client.try_vote_request(&id, &contributors[2], &0),
        Err(Ok(Error::AlreadyCompleted))
    );
    assert_eq!(client.get_request(&id, &0).approvals, 2);
}

#[test]
fn test_finalize_cannot_overdraw_balance() {
    let (env, client, token) = setup();
    let (id, creator, contributors) = fund_with_contributors(&env, &client, &token, &[6 * UNIT]);
    client.create_request(&id, &creator, &purpose(&env), &(4 * UNIT));
    client.create_request(&id, &creator, &purpose(&env), &(4 * UNIT));
    client.vote_request(&id, &contributors[0], &0);
    client.vote_request(&id, &contributors[0], &1);

    client.finalize_request(&id, &creator, &0);
    assert_eq!(
        client.try_finalize_request(&id, &creator, &1),
        Err(Ok(Error::InsufficientBalance))
    );
    assert!(!client.get_request(&id, &1).completed);
    assert_eq!(client.get_balance(&id), 2 * UNIT);
    assert_eq!(token.balance(&creator), 4 * UNIT);
}

#[test]
fn test_refund_limited_by_remaining_balance() {
    let (env, client, token) = setup();
    // 4 units against a 5 unit goal: the fund fails.
    let (id, creator, contributors) =
        fund_with_contributors(&env, &client, &token, &[2 * UNIT, 2 * UNIT]);
    client.create_request(&id, &creator, &purpose(&env), &UNIT);
    client.vote_request(&id, &contributors[0], &0);
    client.vote_request(&id, &contributors[1], &0);
    client.finalize_request(&id, &creator, &0);

    advance(&env, 8 * DAY);
    client.refund(&id, &contributors[0]);
    assert_eq!(token.balance(&contributors[0]), 2 * UNIT);
    assert_eq!(client.get_balance(&id), UNIT);

    assert_eq!(
        client.try_refund(&id, &contributors[1]),
        Err(Ok(Error::InsufficientBalance))
    );
    assert_eq!(client.contribution(&id, &contributors[1]), 2 * UNIT);
}
