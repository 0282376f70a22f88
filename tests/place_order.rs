#![allow(non_snake_case)]

use ethers::types::{
    Address,
    U256,
};
use fanpredix::{
    abi::Side,
    gateway::{
        GatewayError,
        MarketContract,
        MarketDraft,
        TxOptions,
    },
    test_helpers::InMemoryFanPredix,
};

fn account() -> Address {
    Address::repeat_byte(0x11)
}

async fn contract_with_open_market() -> (InMemoryFanPredix, U256) {
    let contract = InMemoryFanPredix::new(account());
    contract.seed_team("FC Example", account(), Address::repeat_byte(0x22));
    let draft = MarketDraft {
        category: "Football".to_string(),
        question: "Who wins?".to_string(),
        description: "desc".to_string(),
        options: vec!["A".to_string(), "B".to_string()],
        start_time: 1_700_000_000,
        end_time: 1_700_100_000,
    };
    let handle = contract
        .create_market(draft, TxOptions::default())
        .await
        .unwrap();
    contract.await_confirmation(handle).await.unwrap();
    let team_ids = contract.get_all_teams().await.unwrap();
    let market_ids = contract
        .get_markets_by_team(team_ids[0].id)
        .await
        .unwrap();
    (contract, market_ids[0])
}

#[tokio::test]
async fn place_order__confirmed_bet_appears_in_user_bets() {
    // given
    let (contract, market_id) = contract_with_open_market().await;

    // when
    let handle = contract
        .place_order(
            market_id,
            U256::zero(),
            Side::Back,
            U256::from(100u64),
            U256::from(2500u64),
            TxOptions::default(),
        )
        .await
        .unwrap();
    contract.await_confirmation(handle).await.unwrap();

    // then
    let bet_ids = contract.get_user_bets(market_id, account()).await.unwrap();
    assert_eq!(bet_ids.len(), 1);
    let bet = contract.get_bet(bet_ids[0]).await.unwrap();
    assert_eq!(bet.market_id, market_id);
    assert_eq!(bet.outcome_index, U256::zero());
    assert_eq!(bet.amount, U256::from(100u64));
    assert_eq!(bet.odds, U256::from(2500u64));
    assert_eq!(bet.order_type, Side::Back.ordinal());
}

#[tokio::test]
async fn place_order__out_of_range_outcome_is_rejected() {
    // given
    let (contract, market_id) = contract_with_open_market().await;

    // when
    let result = contract
        .place_order(
            market_id,
            U256::from(2u64),
            Side::Back,
            U256::from(100u64),
            U256::from(2500u64),
            TxOptions::default(),
        )
        .await;

    // then
    assert!(matches!(result, Err(GatewayError::Submission(_))));
}

#[tokio::test]
async fn place_order__odds_below_minimum_are_rejected() {
    // given
    let (contract, market_id) = contract_with_open_market().await;

    // when
    let result = contract
        .place_order(
            market_id,
            U256::zero(),
            Side::Lay,
            U256::from(100u64),
            U256::from(1000u64),
            TxOptions::default(),
        )
        .await;

    // then
    assert!(matches!(result, Err(GatewayError::Submission(_))));
    assert!(contract
        .get_user_bets(market_id, account())
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn place_order__resolved_market_rejects_new_orders() {
    // given
    let (contract, market_id) = contract_with_open_market().await;
    contract.resolve_market(market_id, U256::from(1u64));

    // when
    let result = contract
        .place_order(
            market_id,
            U256::zero(),
            Side::Back,
            U256::from(100u64),
            U256::from(2500u64),
            TxOptions::default(),
        )
        .await;

    // then
    assert!(matches!(result, Err(GatewayError::Submission(_))));
}
