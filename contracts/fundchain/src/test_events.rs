extern crate std;

use soroban_sdk::{
    symbol_short,
    testutils::{Address as _, Events},
    vec, Address, Env, IntoVal, String, Symbol, TryIntoVal,
};

use crate::events::{FundCreated, Funded, Refunded, RequestCreated, Voted, Withdrawn};
use crate::test::{advance, create_fund, funded_user, setup, DAY, START, UNIT};
use crate::Error;

#[test]
fn test_fund_created_event() {
    let (env, client, _token) = setup();
    let (id, creator) = create_fund(&env, &client);

    let all_events = env.events().all();
    let last_event = all_events.last().expect("No events found");

    // Topic: (symbol_short!("created"), fund_id)
    assert_eq!(last_event.0, client.address);
    let expected_topics = vec![
        &env,
        symbol_short!("created").into_val(&env),
        id.into_val(&env),
    ];
    assert_eq!(last_event.1, expected_topics);

    let event_data: FundCreated = last_event.2.try_into_val(&env).unwrap();
    assert_eq!(
        event_data,
        FundCreated {
            fund_id: id,
            creator,
            name: String::from_str(&env, "Test Campaign"),
            description: String::from_str(&env, ""),
            image_uri: String::from_str(&env, ""),
            goal: 5 * UNIT,
            deadline: START + 7 * DAY,
        }
    );
}

#[test]
fn test_fund_created_event_carries_details() {
    let (env, client, _token) = setup();
    let creator = Address::generate(&env);
    let id = client.create_fund_with_details(
        &creator,
        &String::from_str(&env, "Community Garden"),
        &String::from_str(&env, "Raised beds for the block"),
        &String::from_str(&env, "ipfs://bafy-garden"),
        &(10 * UNIT),
        &(30 * DAY),
    );

    let last_event = env.events().all().last().expect("No events found");
    let event_data: FundCreated = last_event.2.try_into_val(&env).unwrap();
    assert_eq!(
        event_data,
        FundCreated {
            fund_id: id,
            creator,
            name: String::from_str(&env, "Community Garden"),
            description: String::from_str(&env, "Raised beds for the block"),
            image_uri: String::from_str(&env, "ipfs://bafy-garden"),
            goal: 10 * UNIT,
            deadline: START + 30 * DAY,
        }
    );
}

#[test]
fn test_funded_event() {
    let (env, client, token) = setup();
    let (id, _creator) = create_fund(&env, &client);
    let alice = funded_user(&env, &token, UNIT);

    client.deposit(&id, &alice, &UNIT);

    let all_events = env.events().all();
    let last_event = all_events.last().expect("No events found");

    assert_eq!(last_event.0, client.address);
    let expected_topics = vec![
        &env,
        symbol_short!("funded").into_val(&env),
        id.into_val(&env),
    ];
    assert_eq!(last_event.1, expected_topics);

    let event_data: Funded = last_event.2.try_into_val(&env).unwrap();
    assert_eq!(
        event_data,
        Funded {
            fund_id: id,
            contributor: alice,
            amount: UNIT,
        }
    );
}

#[test]
fn test_refunded_event() {
    let (env, client, token) = setup();
    let (id, _creator) = create_fund(&env, &client);
    let alice = funded_user(&env, &token, UNIT);
    client.deposit(&id, &alice, &UNIT);
    advance(&env, 8 * DAY);

    client.refund(&id, &alice);

    let last_event = env.events().all().last().expect("No events found");
    let expected_topics = vec![
        &env,
        symbol_short!("refunded").into_val(&env),
        id.into_val(&env),
    ];
    assert_eq!(last_event.1, expected_topics);

    let event_data: Refunded = last_event.2.try_into_val(&env).unwrap();
    assert_eq!(
        event_data,
        Refunded {
            fund_id: id,
            contributor: alice,
            amount: UNIT,
        }
    );
}

#[test]
fn test_request_lifecycle_events() {
    let (env, client, token) = setup();
    let (id, creator) = create_fund(&env, &client);
    let alice = funded_user(&env, &token, 6 * UNIT);
    client.deposit(&id, &alice, &(6 * UNIT));

    let purpose = String::from_str(&env, "Buy gear");
    client.create_request(&id, &creator, &purpose, &(2 * UNIT));
    let last_event = env.events().all().last().expect("No events found");
    assert_eq!(
        last_event.1,
        vec![
            &env,
            symbol_short!("req_new").into_val(&env),
            id.into_val(&env)
        ]
    );
    let created: RequestCreated = last_event.2.try_into_val(&env).unwrap();
    assert_eq!(
        created,
        RequestCreated {
            fund_id: id,
            request_id: 0,
            purpose,
            amount: 2 * UNIT,
        }
    );

    client.vote_request(&id, &alice, &0);
    let last_event = env.events().all().last().expect("No events found");
    assert_eq!(
        last_event.1,
        vec![&env, symbol_short!("voted").into_val(&env), id.into_val(&env)]
    );
    let voted: Voted = last_event.2.try_into_val(&env).unwrap();
    assert_eq!(
        voted,
        Voted {
            fund_id: id,
            request_id: 0,
            voter: alice.clone(),
            approvals: 1,
        }
    );

    client.finalize_request(&id, &creator, &0);
    let last_event = env.events().all().last().expect("No events found");
    assert_eq!(
        last_event.1,
        vec![
            &env,
            symbol_short!("withdrawn").into_val(&env),
            id.into_val(&env)
        ]
    );
    let withdrawn: Withdrawn = last_event.2.try_into_val(&env).unwrap();
    assert_eq!(
        withdrawn,
        Withdrawn {
            fund_id: id,
            request_id: 0,
            amount: 2 * UNIT,
        }
    );
}

#[test]
fn test_rejected_call_emits_nothing() {
    let (env, client, _token) = setup();
    let (id, _creator) = create_fund(&env, &client);
    let stranger = Address::generate(&env);

    assert_eq!(
        client.try_create_request(&id, &stranger, &String::from_str(&env, "x"), &UNIT),
        Err(Ok(Error::NotCreator))
    );

    for event in env.events().all().iter() {
        let topic = event.1.get(0).expect("topic");
        let symbol: Result<Symbol, _> = topic.try_into_val(&env);
        assert_ne!(symbol.ok(), Some(symbol_short!("req_new")));
    }
}
