//! In-memory stand-in for the deployed contract, mirroring its asserted
//! invariants closely enough to drive the controller and integration tests.
//! All mock data lives here; production code paths never reference it.

use crate::{
    abi::{
        Bet,
        Market,
        Side,
        Team,
    },
    gateway::{
        GatewayError,
        MarketContract,
        MarketDraft,
        TxHandle,
        TxOptions,
    },
    view::MIN_ODDS,
};
use ethers::types::{
    Address,
    TxHash,
    U256,
};
use std::{
    collections::{
        HashMap,
        HashSet,
    },
    sync::{
        Arc,
        Mutex,
    },
};

#[derive(Clone, Debug)]
enum PendingWrite {
    AddTeam {
        name: String,
        manager: Address,
        fan_token: Address,
    },
    CreateMarket {
        team_id: U256,
        manager: Address,
        fan_token: Address,
        draft: MarketDraft,
    },
    PlaceOrder {
        market_id: U256,
        outcome_index: U256,
        side: Side,
        amount: U256,
        odds: U256,
    },
    CancelOrder {
        order_id: U256,
    },
}

#[derive(Debug, Default)]
struct State {
    teams: Vec<Team>,
    markets: Vec<Market>,
    bets: Vec<Bet>,
    matched: HashSet<U256>,
    pending: HashMap<TxHash, PendingWrite>,
    next_team_id: u64,
    next_market_id: u64,
    next_bet_id: u64,
    next_tx: u64,
    submissions: u64,
    wrong_network: bool,
    fail_reads: bool,
}

/// The chain id the fake pretends to run on when `set_wrong_network` is
/// flipped, versus what callers expect.
const EXPECTED_CHAIN_ID: u64 = 31337;
const MISMATCHED_CHAIN_ID: u64 = 1;

#[derive(Clone)]
pub struct InMemoryFanPredix {
    account: Address,
    state: Arc<Mutex<State>>,
}

impl InMemoryFanPredix {
    pub fn new(account: Address) -> Self {
        Self {
            account,
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    pub fn seed_team(&self, name: &str, manager: Address, fan_token: Address) -> U256 {
        let mut state = self.lock();
        state.next_team_id += 1;
        let id = U256::from(state.next_team_id);
        state.teams.push(Team {
            id,
            name: name.to_string(),
            team_manager: manager,
            fan_token,
        });
        id
    }

    /// Simulates the matching engine taking the other side of an order.
    pub fn mark_matched(&self, bet_id: U256) {
        self.lock().matched.insert(bet_id);
    }

    /// Contract-side resolution, outside the client's write surface.
    pub fn resolve_market(&self, market_id: U256, outcome_index: U256) {
        let mut state = self.lock();
        if let Some(market) = state.markets.iter_mut().find(|m| m.id == market_id) {
            market.status = 2;
            market.resolved_outcome_index = outcome_index;
        }
    }

    pub fn set_wrong_network(&self, mismatched: bool) {
        self.lock().wrong_network = mismatched;
    }

    pub fn set_fail_reads(&self, failing: bool) {
        self.lock().fail_reads = failing;
    }

    /// How many writes made it past validation onto the (fake) wire.
    pub fn submission_count(&self) -> u64 {
        self.lock().submissions
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().expect("fake contract state poisoned")
    }

    fn guard_reads(state: &State) -> Result<(), GatewayError> {
        if state.fail_reads {
            return Err(GatewayError::Read("RPC node unreachable".to_string()));
        }
        Ok(())
    }

    fn submit(&self, write: PendingWrite) -> Result<TxHandle, GatewayError> {
        let mut state = self.lock();
        if state.wrong_network {
            return Err(GatewayError::WrongNetwork {
                expected: EXPECTED_CHAIN_ID,
                actual: MISMATCHED_CHAIN_ID,
            });
        }
        self.validate(&state, &write)?;
        state.next_tx += 1;
        state.submissions += 1;
        let hash = TxHash::from_low_u64_be(state.next_tx);
        state.pending.insert(hash, write);
        Ok(TxHandle(hash))
    }

    /// Mirrors the contract's require() checks, surfaced at estimate time
    /// the way a node would reject them.
    fn validate(&self, state: &State, write: &PendingWrite) -> Result<(), GatewayError> {
        match write {
            PendingWrite::AddTeam { name, .. } => {
                if name.trim().is_empty() {
                    return Err(GatewayError::Submission(
                        "rejected by contract: team name is empty".to_string(),
                    ));
                }
            }
            PendingWrite::CreateMarket { draft, .. } => {
                if draft.options.len() < 2 {
                    return Err(GatewayError::Submission(
                        "rejected by contract: a market needs at least two options".to_string(),
                    ));
                }
                if draft.end_time <= draft.start_time {
                    return Err(GatewayError::Submission(
                        "rejected by contract: market ends before it starts".to_string(),
                    ));
                }
            }
            PendingWrite::PlaceOrder {
                market_id,
                outcome_index,
                amount,
                odds,
                ..
            } => {
                let market = state
                    .markets
                    .iter()
                    .find(|m| m.id == *market_id)
                    .ok_or_else(|| {
                        GatewayError::Submission(
                            "rejected by contract: unknown market".to_string(),
                        )
                    })?;
                if market.status != 0 {
                    return Err(GatewayError::Submission(
                        "rejected by contract: market is not open".to_string(),
                    ));
                }
                if outcome_index.as_usize() >= market.options.len() {
                    return Err(GatewayError::Submission(
                        "rejected by contract: outcome index out of range".to_string(),
                    ));
                }
                if amount.is_zero() {
                    return Err(GatewayError::Submission(
                        "rejected by contract: amount is zero".to_string(),
                    ));
                }
                if *odds < U256::from(MIN_ODDS) {
                    return Err(GatewayError::Submission(
                        "rejected by contract: odds below minimum".to_string(),
                    ));
                }
            }
            PendingWrite::CancelOrder { order_id } => {
                let bet = state.bets.iter().find(|b| b.id == *order_id).ok_or_else(|| {
                    GatewayError::Submission(
                        "rejected by contract: unknown order".to_string(),
                    )
                })?;
                if state.matched.contains(order_id) {
                    return Err(GatewayError::Submission(
                        "rejected by contract: order already matched".to_string(),
                    ));
                }
                if bet.user != self.account {
                    return Err(GatewayError::Submission(
                        "rejected by contract: not the order owner".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }

    fn apply(&self, state: &mut State, write: PendingWrite) {
        match write {
            PendingWrite::AddTeam {
                name,
                manager,
                fan_token,
            } => {
                state.next_team_id += 1;
                let id = U256::from(state.next_team_id);
                state.teams.push(Team {
                    id,
                    name,
                    team_manager: manager,
                    fan_token,
                });
            }
            PendingWrite::CreateMarket {
                team_id,
                manager,
                fan_token,
                draft,
            } => {
                state.next_market_id += 1;
                let id = U256::from(state.next_market_id);
                state.markets.push(Market {
                    id,
                    team_id,
                    team_manager: manager,
                    fan_token,
                    category: draft.category,
                    question: draft.question,
                    description: draft.description,
                    options: draft.options,
                    start_time: U256::from(draft.start_time),
                    end_time: U256::from(draft.end_time),
                    status: 0,
                    resolved_outcome_index: U256::zero(),
                });
            }
            PendingWrite::PlaceOrder {
                market_id,
                outcome_index,
                side,
                amount,
                odds,
            } => {
                state.next_bet_id += 1;
                let id = U256::from(state.next_bet_id);
                state.bets.push(Bet {
                    id,
                    market_id,
                    user: self.account,
                    outcome_index,
                    amount,
                    odds,
                    order_type: side.ordinal(),
                });
            }
            PendingWrite::CancelOrder { order_id } => {
                state.bets.retain(|b| b.id != order_id);
            }
        }
    }
}

impl MarketContract for InMemoryFanPredix {
    fn account(&self) -> Address {
        self.account
    }

    async fn get_all_teams(&self) -> Result<Vec<Team>, GatewayError> {
        let state = self.lock();
        Self::guard_reads(&state)?;
        Ok(state.teams.clone())
    }

    async fn get_markets_by_team(&self, team_id: U256) -> Result<Vec<U256>, GatewayError> {
        let state = self.lock();
        Self::guard_reads(&state)?;
        Ok(state
            .markets
            .iter()
            .filter(|m| m.team_id == team_id)
            .map(|m| m.id)
            .collect())
    }

    async fn get_market(&self, market_id: U256) -> Result<Market, GatewayError> {
        let state = self.lock();
        Self::guard_reads(&state)?;
        state
            .markets
            .iter()
            .find(|m| m.id == market_id)
            .cloned()
            .ok_or_else(|| GatewayError::Read(format!("no market with id {market_id}")))
    }

    async fn get_user_bets(
        &self,
        market_id: U256,
        user: Address,
    ) -> Result<Vec<U256>, GatewayError> {
        let state = self.lock();
        Self::guard_reads(&state)?;
        Ok(state
            .bets
            .iter()
            .filter(|b| b.market_id == market_id && b.user == user)
            .map(|b| b.id)
            .collect())
    }

    async fn get_bet(&self, bet_id: U256) -> Result<Bet, GatewayError> {
        let state = self.lock();
        Self::guard_reads(&state)?;
        state
            .bets
            .iter()
            .find(|b| b.id == bet_id)
            .cloned()
            .ok_or_else(|| GatewayError::Read(format!("no bet with id {bet_id}")))
    }

    async fn add_team(
        &self,
        name: String,
        manager: Address,
        fan_token: Address,
        _opts: TxOptions,
    ) -> Result<TxHandle, GatewayError> {
        self.submit(PendingWrite::AddTeam {
            name,
            manager,
            fan_token,
        })
    }

    async fn create_market(
        &self,
        draft: MarketDraft,
        _opts: TxOptions,
    ) -> Result<TxHandle, GatewayError> {
        let team = {
            let state = self.lock();
            state
                .teams
                .iter()
                .find(|t| t.team_manager == self.account)
                .cloned()
        };
        let team = team.ok_or_else(|| {
            GatewayError::Submission(
                "rejected by contract: caller does not manage a team".to_string(),
            )
        })?;
        self.submit(PendingWrite::CreateMarket {
            team_id: team.id,
            manager: team.team_manager,
            fan_token: team.fan_token,
            draft,
        })
    }

    async fn place_order(
        &self,
        market_id: U256,
        outcome_index: U256,
        side: Side,
        amount: U256,
        odds: U256,
        _opts: TxOptions,
    ) -> Result<TxHandle, GatewayError> {
        self.submit(PendingWrite::PlaceOrder {
            market_id,
            outcome_index,
            side,
            amount,
            odds,
        })
    }

    async fn cancel_order(
        &self,
        order_id: U256,
        _opts: TxOptions,
    ) -> Result<TxHandle, GatewayError> {
        self.submit(PendingWrite::CancelOrder { order_id })
    }

    async fn await_confirmation(&self, handle: TxHandle) -> Result<(), GatewayError> {
        let mut state = self.lock();
        let write = state.pending.remove(&handle.0).ok_or_else(|| {
            GatewayError::Submission("transaction dropped before it was mined".to_string())
        })?;
        self.apply(&mut state, write);
        Ok(())
    }
}
