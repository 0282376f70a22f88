#![allow(non_snake_case)]

use ethers::types::{
    Address,
    U256,
};
use fanpredix::{
    gateway::{
        GatewayError,
        MarketContract,
        MarketDraft,
        TxOptions,
    },
    test_helpers::InMemoryFanPredix,
};

fn manager() -> Address {
    Address::repeat_byte(0x11)
}

fn football_draft() -> MarketDraft {
    MarketDraft {
        category: "Football".to_string(),
        question: "Who wins?".to_string(),
        description: "desc".to_string(),
        options: vec!["A".to_string(), "B".to_string()],
        start_time: 1_700_000_000,
        end_time: 1_700_100_000,
    }
}

#[tokio::test]
async fn create_market__confirmed_market_listed_for_team_as_open() {
    // given
    let contract = InMemoryFanPredix::new(manager());
    let team_id = contract.seed_team("FC Example", manager(), Address::repeat_byte(0x22));

    // when
    let handle = contract
        .create_market(football_draft(), TxOptions::default())
        .await
        .unwrap();
    contract.await_confirmation(handle).await.unwrap();

    // then
    let ids = contract.get_markets_by_team(team_id).await.unwrap();
    assert_eq!(ids.len(), 1);
    let market = contract.get_market(ids[0]).await.unwrap();
    assert_eq!(market.status, 0);
    assert_eq!(market.question, "Who wins?");
    assert_eq!(market.options, vec!["A".to_string(), "B".to_string()]);
    assert_eq!(market.start_time, U256::from(1_700_000_000u64));
    assert_eq!(market.end_time, U256::from(1_700_100_000u64));
}

#[tokio::test]
async fn create_market__not_visible_before_confirmation() {
    // given
    let contract = InMemoryFanPredix::new(manager());
    let team_id = contract.seed_team("FC Example", manager(), Address::repeat_byte(0x22));

    // when
    let _handle = contract
        .create_market(football_draft(), TxOptions::default())
        .await
        .unwrap();

    // then
    let ids = contract.get_markets_by_team(team_id).await.unwrap();
    assert!(ids.is_empty());
}

#[tokio::test]
async fn create_market__non_manager_is_rejected_at_submission() {
    // given
    let outsider = Address::repeat_byte(0x99);
    let contract = InMemoryFanPredix::new(outsider);
    contract.seed_team("FC Example", manager(), Address::repeat_byte(0x22));

    // when
    let result = contract
        .create_market(football_draft(), TxOptions::default())
        .await;

    // then
    assert!(matches!(result, Err(GatewayError::Submission(_))));
    assert_eq!(contract.submission_count(), 0);
}

#[tokio::test]
async fn create_market__wrong_network_fails_without_dispatch() {
    // given
    let contract = InMemoryFanPredix::new(manager());
    contract.seed_team("FC Example", manager(), Address::repeat_byte(0x22));
    contract.set_wrong_network(true);

    // when
    let result = contract
        .create_market(football_draft(), TxOptions::default())
        .await;

    // then
    assert!(matches!(
        result,
        Err(GatewayError::WrongNetwork { expected: _, actual: _ })
    ));
    assert_eq!(contract.submission_count(), 0);
}
