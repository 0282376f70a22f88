use crate::{
    abi::{
        MarketStatus,
        Side,
    },
    deployment::{
        self,
        DeploymentEnv,
    },
    gateway::{
        self,
        GatewayConfig,
        MarketContract,
        MarketDraft,
        TxOptions,
        WalletConfig,
    },
    ui,
    view::{
        self,
        BetView,
        MarketView,
        TeamView,
    },
};
use color_eyre::eyre::{
    Result,
    WrapErr,
    eyre,
};
use ethers::types::U256;
use std::time::Duration;
use tokio::time;
use tracing::{
    error,
    info,
};

const MAX_ERROR_LOG: usize = 50;
const POLL_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub env: DeploymentEnv,
    pub rpc_url: Option<String>,
    pub wallet: WalletConfig,
}

/// Everything the renderer needs for one frame. Built fresh from the
/// controller's caches; the UI never reaches back into the controller.
#[derive(Clone, Debug, Default)]
pub struct AppSnapshot {
    pub account: String,
    pub network: String,
    pub team_count: usize,
    pub market_count: usize,
    pub teams: Vec<TeamView>,
    pub markets: Vec<MarketView>,
    pub market_detail: Option<MarketView>,
    pub my_bets: Vec<BetView>,
    pub token_decimals: u32,
    pub status: String,
    pub errors: Vec<String>,
}

pub struct AppController<C: MarketContract> {
    contract: C,
    network: String,
    token_decimals: u32,
    tx_options: TxOptions,
    pub status: String,
    teams: Vec<TeamView>,
    market_count: usize,
    selected_team: Option<U256>,
    markets: Vec<MarketView>,
    selected_market: Option<U256>,
    market_detail: Option<MarketView>,
    my_bets: Vec<BetView>,
    errors: Vec<String>,
}

impl<C: MarketContract> AppController<C> {
    pub fn from_contract(contract: C, network: String, token_decimals: u32) -> Self {
        Self {
            contract,
            network,
            token_decimals,
            tx_options: TxOptions::default(),
            status: String::from("Ready"),
            teams: Vec::new(),
            market_count: 0,
            selected_team: None,
            markets: Vec::new(),
            selected_market: None,
            market_detail: None,
            my_bets: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn snapshot(&self) -> AppSnapshot {
        AppSnapshot {
            account: view::short_address(self.contract.account()),
            network: self.network.clone(),
            team_count: self.teams.len(),
            market_count: self.market_count,
            teams: self.teams.clone(),
            markets: self.markets.clone(),
            market_detail: self.market_detail.clone(),
            my_bets: self.my_bets.clone(),
            token_decimals: self.token_decimals,
            status: self.status.clone(),
            errors: self.errors.iter().rev().take(5).cloned().collect(),
        }
    }

    fn set_status(&mut self, message: impl Into<String>) {
        self.status = message.into();
    }

    fn push_errors(&mut self, mut items: Vec<String>) {
        if items.is_empty() {
            return;
        }
        for item in &items {
            error!("{}", item);
        }
        self.errors.append(&mut items);
        if self.errors.len() > MAX_ERROR_LOG {
            let drain = self.errors.len() - MAX_ERROR_LOG;
            self.errors.drain(0..drain);
        }
    }

    /// Leaving a screen drops its caches; the next visit refetches.
    pub fn select_team(&mut self, team_id: U256) {
        self.selected_team = Some(team_id);
        self.selected_market = None;
        self.markets.clear();
        self.market_detail = None;
        self.my_bets.clear();
    }

    pub fn select_market(&mut self, market_id: U256) {
        self.selected_market = Some(market_id);
        self.market_detail = None;
        self.my_bets.clear();
    }

    pub fn deselect_market(&mut self) {
        self.selected_market = None;
        self.market_detail = None;
        self.my_bets.clear();
    }

    pub fn deselect_team(&mut self) {
        self.selected_team = None;
        self.markets.clear();
        self.deselect_market();
    }

    /// Refetch whatever the current selection needs. Any failure leaves the
    /// previously cached lists untouched.
    pub async fn refresh(&mut self) -> Result<()> {
        self.refresh_teams().await?;
        if self.selected_team.is_some() {
            self.refresh_markets().await?;
        }
        if self.selected_market.is_some() {
            self.refresh_market_detail().await?;
            self.refresh_my_bets().await?;
        }
        Ok(())
    }

    pub async fn refresh_teams(&mut self) -> Result<()> {
        let raw = self
            .contract
            .get_all_teams()
            .await
            .wrap_err("fetching teams failed")?;
        let mut market_count = 0;
        for team in &raw {
            market_count += self
                .contract
                .get_markets_by_team(team.id)
                .await
                .wrap_err("counting team markets failed")?
                .len();
        }
        self.teams = raw.into_iter().map(TeamView::from_record).collect();
        self.market_count = market_count;
        Ok(())
    }

    pub async fn refresh_markets(&mut self) -> Result<()> {
        let team_id = self
            .selected_team
            .ok_or_else(|| eyre!("no team selected"))?;
        let ids = self
            .contract
            .get_markets_by_team(team_id)
            .await
            .wrap_err("fetching team market ids failed")?;
        let mut markets = Vec::with_capacity(ids.len());
        for id in ids {
            let record = self
                .contract
                .get_market(id)
                .await
                .wrap_err("fetching market failed")?;
            markets.push(MarketView::from_record(record)?);
        }
        self.markets = markets;
        Ok(())
    }

    pub async fn refresh_market_detail(&mut self) -> Result<()> {
        let market_id = self
            .selected_market
            .ok_or_else(|| eyre!("no market selected"))?;
        let record = self
            .contract
            .get_market(market_id)
            .await
            .wrap_err("fetching market detail failed")?;
        self.market_detail = Some(MarketView::from_record(record)?);
        Ok(())
    }

    pub async fn refresh_my_bets(&mut self) -> Result<()> {
        let market_id = self
            .selected_market
            .ok_or_else(|| eyre!("no market selected"))?;
        let (options, market_status) = match &self.market_detail {
            Some(market) => (market.options.clone(), market.status),
            None => (Vec::new(), MarketStatus::Open),
        };
        let ids = self
            .contract
            .get_user_bets(market_id, self.contract.account())
            .await
            .wrap_err("fetching bet ids failed")?;
        let mut bets = Vec::with_capacity(ids.len());
        for id in ids {
            let record = self
                .contract
                .get_bet(id)
                .await
                .wrap_err("fetching bet failed")?;
            bets.push(BetView::from_record(
                record,
                &options,
                market_status,
                self.token_decimals,
            )?);
        }
        self.my_bets = bets;
        Ok(())
    }

    pub async fn add_team(
        &mut self,
        name: String,
        manager: String,
        fan_token: String,
    ) -> Result<()> {
        let manager = view::parse_address(&manager)?;
        let fan_token = view::parse_address(&fan_token)?;
        let handle = self
            .contract
            .add_team(name.clone(), manager, fan_token, self.tx_options)
            .await?;
        self.set_status(format!("Add team '{name}' submitted; awaiting confirmation..."));
        self.contract.await_confirmation(handle).await?;
        self.refresh_teams().await?;
        self.set_status(format!("Team '{name}' added"));
        Ok(())
    }

    pub async fn create_market(&mut self, form: MarketForm) -> Result<()> {
        let start_time = view::parse_timestamp(&form.start_time)?;
        let end_time = view::parse_timestamp(&form.end_time)?;
        if end_time <= start_time {
            return Err(eyre!("market end must be after its start"));
        }
        let options: Vec<String> = form
            .options
            .iter()
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();
        if options.len() < 2 {
            return Err(eyre!("a market needs at least two options"));
        }
        let question = form.question.clone();
        let draft = MarketDraft {
            category: form.category,
            question: form.question,
            description: form.description,
            options,
            start_time,
            end_time,
        };
        let handle = self.contract.create_market(draft, self.tx_options).await?;
        self.set_status(format!(
            "Market '{question}' submitted; awaiting confirmation..."
        ));
        self.contract.await_confirmation(handle).await?;
        self.refresh_markets().await?;
        self.set_status(format!("Market '{question}' created"));
        Ok(())
    }

    pub async fn place_order(
        &mut self,
        outcome_index: usize,
        side: Side,
        amount: String,
        odds: String,
    ) -> Result<()> {
        let market_id = self
            .selected_market
            .ok_or_else(|| eyre!("no market selected"))?;
        let outcome = self
            .market_detail
            .as_ref()
            .and_then(|m| m.options.get(outcome_index))
            .cloned()
            .ok_or_else(|| eyre!("no outcome at index {outcome_index}"))?;
        let amount = view::parse_amount(&amount, self.token_decimals)?;
        let odds = view::parse_odds(&odds)?;
        let handle = self
            .contract
            .place_order(
                market_id,
                U256::from(outcome_index),
                side,
                amount,
                odds,
                self.tx_options,
            )
            .await?;
        self.set_status(format!(
            "{} order submitted; awaiting confirmation...",
            side.label()
        ));
        self.contract.await_confirmation(handle).await?;
        self.refresh_market_detail().await?;
        self.refresh_my_bets().await?;
        self.set_status(format!(
            "{} {} @ {} on '{}'",
            side.label(),
            view::format_amount(amount, self.token_decimals),
            view::format_odds(odds),
            outcome
        ));
        Ok(())
    }

    pub async fn cancel_order(&mut self, bet_id: U256) -> Result<()> {
        let handle = self.contract.cancel_order(bet_id, self.tx_options).await?;
        self.set_status(format!(
            "Cancel of order {bet_id} submitted; awaiting confirmation..."
        ));
        self.contract.await_confirmation(handle).await?;
        self.refresh_my_bets().await?;
        self.set_status(format!("Order {bet_id} cancelled"));
        Ok(())
    }
}

/// Raw form input for a new market, exactly as typed.
#[derive(Clone, Debug, Default)]
pub struct MarketForm {
    pub category: String,
    pub question: String,
    pub description: String,
    pub options: Vec<String>,
    pub start_time: String,
    pub end_time: String,
}

pub async fn run_app(config: AppConfig) -> Result<()> {
    let AppConfig {
        env,
        rpc_url,
        wallet,
    } = config;
    deployment::ensure_structure()?;
    let record = deployment::resolve_record(env)?;
    let rpc_url = rpc_url.unwrap_or_else(|| record.network_url.clone());
    info!("Connecting to {env} at {rpc_url}");

    let contract_address = record
        .contract_address
        .parse()
        .wrap_err("deployment record contains an invalid contract address")?;
    let gateway_config = GatewayConfig {
        rpc_url,
        wallet,
        contract_address,
        expected_chain_id: record.chain_id,
    };
    let contract = gateway::connect(gateway_config).await?;
    let mut controller =
        AppController::from_contract(contract, env.to_string(), record.token_decimals);
    controller.refresh_teams().await?;

    let mut ui_state = ui::UiState::default();
    let mut input_events = ui::input_event_stream();

    info!("Starting UI");
    ui::terminal_enter(&mut ui_state)?;
    let res = run_loop(controller, &mut ui_state, &mut input_events).await;
    ui::terminal_exit()?;
    res
}

fn report_failure<C: MarketContract>(
    controller: &mut AppController<C>,
    context: &str,
    err: color_eyre::Report,
) {
    controller.status = format!("{context} failed");
    controller.push_errors(vec![format!("{context}: {err:#}")]);
}

async fn run_loop<C: MarketContract>(
    mut controller: AppController<C>,
    ui_state: &mut ui::UiState,
    input_events: &mut ui::InputEventReceiver,
) -> Result<()> {
    info!("Running app loop");
    let mut ticker = time::interval(POLL_INTERVAL);
    ticker.set_missed_tick_behavior(time::MissedTickBehavior::Skip);
    let mut snapshot = controller.snapshot();
    ui::draw(ui_state, &snapshot)?;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(err) = controller.refresh().await {
                    report_failure(&mut controller, "Background refresh", err);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                break;
            }
            raw_ev = ui::next_raw_event(input_events) => {
                let event = raw_ev?;
                let Some(ev) = ui::interpret_event(ui_state, &snapshot, event) else {
                    snapshot = controller.snapshot();
                    ui::draw(ui_state, &snapshot)?;
                    continue;
                };
                match ev {
                    ui::UserEvent::Quit => break,
                    ui::UserEvent::Redraw => {}
                    ui::UserEvent::Refresh => {
                        controller.set_status("Refreshing...");
                        if let Err(err) = controller.refresh().await {
                            report_failure(&mut controller, "Refresh", err);
                        } else {
                            controller.set_status("Ready");
                        }
                    }
                    ui::UserEvent::OpenTeam(team_id) => {
                        controller.select_team(team_id);
                        if let Err(err) = controller.refresh_markets().await {
                            report_failure(&mut controller, "Loading team markets", err);
                        }
                    }
                    ui::UserEvent::OpenMarket(market_id) => {
                        controller.select_market(market_id);
                        let loaded = match controller.refresh_market_detail().await {
                            Ok(()) => controller.refresh_my_bets().await,
                            Err(err) => Err(err),
                        };
                        if let Err(err) = loaded {
                            report_failure(&mut controller, "Loading market", err);
                        }
                    }
                    ui::UserEvent::CloseMarket => {
                        controller.deselect_market();
                    }
                    ui::UserEvent::CloseTeam => {
                        controller.deselect_team();
                    }
                    ui::UserEvent::ConfirmAddTeam {
                        name,
                        manager,
                        fan_token,
                    } => {
                        controller.set_status("Submitting team...");
                        snapshot = controller.snapshot();
                        ui::draw(ui_state, &snapshot)?;
                        if let Err(err) = controller.add_team(name, manager, fan_token).await {
                            report_failure(&mut controller, "Adding team", err);
                        }
                    }
                    ui::UserEvent::ConfirmCreateMarket(form) => {
                        controller.set_status("Submitting market...");
                        snapshot = controller.snapshot();
                        ui::draw(ui_state, &snapshot)?;
                        if let Err(err) = controller.create_market(form).await {
                            report_failure(&mut controller, "Creating market", err);
                        }
                    }
                    ui::UserEvent::ConfirmOrder {
                        outcome_index,
                        side,
                        amount,
                        odds,
                    } => {
                        controller.set_status("Submitting order...");
                        snapshot = controller.snapshot();
                        ui::draw(ui_state, &snapshot)?;
                        if let Err(err) = controller
                            .place_order(outcome_index, side, amount, odds)
                            .await
                        {
                            report_failure(&mut controller, "Placing order", err);
                        }
                    }
                    ui::UserEvent::ConfirmCancel { bet_id } => {
                        controller.set_status("Submitting cancel...");
                        snapshot = controller.snapshot();
                        ui::draw(ui_state, &snapshot)?;
                        if let Err(err) = controller.cancel_order(bet_id).await {
                            report_failure(&mut controller, "Cancelling order", err);
                        }
                    }
                }
            }
        }

        snapshot = controller.snapshot();
        ui::draw(ui_state, &snapshot)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;
    use crate::test_helpers::InMemoryFanPredix;
    use ethers::types::Address;

    fn controller_with_seeded_team() -> (AppController<InMemoryFanPredix>, U256) {
        let account = Address::repeat_byte(0x11);
        let contract = InMemoryFanPredix::new(account);
        let team_id =
            contract.seed_team("FC Example", account, Address::repeat_byte(0x22));
        (
            AppController::from_contract(contract.clone(), "Local".to_string(), 18),
            team_id,
        )
    }

    fn market_form() -> MarketForm {
        MarketForm {
            category: "Football".to_string(),
            question: "Who wins?".to_string(),
            description: "desc".to_string(),
            options: vec!["A".to_string(), "B".to_string()],
            start_time: "1700000000".to_string(),
            end_time: "1700100000".to_string(),
        }
    }

    #[tokio::test]
    async fn create_market__appears_in_team_list_as_open() {
        // given
        let (mut controller, team_id) = controller_with_seeded_team();
        controller.select_team(team_id);

        // when
        controller.create_market(market_form()).await.unwrap();

        // then
        assert_eq!(controller.markets.len(), 1);
        let market = &controller.markets[0];
        assert_eq!(market.status_label(), "Open");
        assert_eq!(market.question, "Who wins?");
        assert_eq!(market.options, vec!["A".to_string(), "B".to_string()]);
    }

    #[tokio::test]
    async fn create_market__rejects_single_option_before_submission() {
        // given
        let (mut controller, team_id) = controller_with_seeded_team();
        controller.select_team(team_id);
        let mut form = market_form();
        form.options = vec!["A".to_string(), "  ".to_string()];

        // when
        let result = controller.create_market(form).await;

        // then
        assert!(result.is_err());
        assert!(controller.markets.is_empty());
    }

    #[tokio::test]
    async fn refresh_teams__failure_preserves_cached_list() {
        // given
        let account = Address::repeat_byte(0x11);
        let contract = InMemoryFanPredix::new(account);
        contract.seed_team("FC Example", account, Address::repeat_byte(0x22));
        let mut controller =
            AppController::from_contract(contract.clone(), "Local".to_string(), 18);
        controller.refresh_teams().await.unwrap();
        assert_eq!(controller.teams.len(), 1);

        // when
        contract.set_fail_reads(true);
        let result = controller.refresh_teams().await;

        // then
        assert!(result.is_err());
        assert_eq!(controller.teams.len(), 1);
        assert_eq!(controller.teams[0].name, "FC Example");
    }

    #[tokio::test]
    async fn place_order__refetches_bets_after_confirmation() {
        // given
        let (mut controller, team_id) = controller_with_seeded_team();
        controller.select_team(team_id);
        controller.create_market(market_form()).await.unwrap();
        let market_id = controller.markets[0].id;
        controller.select_market(market_id);
        controller.refresh_market_detail().await.unwrap();

        // when
        controller
            .place_order(0, Side::Back, "10".to_string(), "2.50".to_string())
            .await
            .unwrap();

        // then
        assert_eq!(controller.my_bets.len(), 1);
        let bet = &controller.my_bets[0];
        assert_eq!(bet.outcome, "A");
        assert_eq!(bet.odds, "2.50");
        assert_eq!(bet.potential_payout, "15");
    }

    #[tokio::test]
    async fn my_bets__badge_turns_settled_after_market_resolves() {
        // given
        let account = Address::repeat_byte(0x11);
        let contract = InMemoryFanPredix::new(account);
        let team_id = contract.seed_team("FC Example", account, Address::repeat_byte(0x22));
        let mut controller =
            AppController::from_contract(contract.clone(), "Local".to_string(), 18);
        controller.select_team(team_id);
        controller.create_market(market_form()).await.unwrap();
        let market_id = controller.markets[0].id;
        controller.select_market(market_id);
        controller.refresh_market_detail().await.unwrap();
        controller
            .place_order(0, Side::Back, "10".to_string(), "2.50".to_string())
            .await
            .unwrap();
        assert_eq!(controller.my_bets[0].status_badge(), "Open");

        // when
        contract.resolve_market(market_id, U256::zero());
        controller.refresh_market_detail().await.unwrap();
        controller.refresh_my_bets().await.unwrap();

        // then
        assert_eq!(controller.my_bets[0].status_badge(), "Settled");
    }

    #[tokio::test]
    async fn place_order__wrong_network_dispatches_nothing() {
        // given
        let account = Address::repeat_byte(0x11);
        let contract = InMemoryFanPredix::new(account);
        let team_id = contract.seed_team("FC Example", account, Address::repeat_byte(0x22));
        let mut controller =
            AppController::from_contract(contract.clone(), "Local".to_string(), 18);
        controller.select_team(team_id);
        controller.create_market(market_form()).await.unwrap();
        let market_id = controller.markets[0].id;
        controller.select_market(market_id);
        controller.refresh_market_detail().await.unwrap();
        let submissions_before = contract.submission_count();

        // when
        contract.set_wrong_network(true);
        let result = controller
            .place_order(0, Side::Back, "10".to_string(), "2.50".to_string())
            .await;

        // then
        assert!(result.is_err());
        assert_eq!(contract.submission_count(), submissions_before);
        assert!(controller.my_bets.is_empty());
    }

    #[tokio::test]
    async fn errors__bounded_at_fifty_most_recent() {
        // given
        let (mut controller, _) = controller_with_seeded_team();

        // when
        for i in 0..60 {
            controller.push_errors(vec![format!("error {i}")]);
        }

        // then
        assert_eq!(controller.errors.len(), 50);
        assert_eq!(controller.errors.first().unwrap(), "error 10");
        assert_eq!(controller.errors.last().unwrap(), "error 59");
    }
}
