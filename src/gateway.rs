use crate::{
    abi::{
        Bet,
        FanPredix,
        Market,
        Side,
        Team,
    },
    wallets,
};
use ethers::{
    abi::Detokenize,
    contract::{
        ContractCall,
        ContractError,
    },
    middleware::SignerMiddleware,
    providers::{
        Http,
        Middleware,
        PendingTransaction,
        Provider,
    },
    signers::{
        LocalWallet,
        Signer,
    },
    types::{
        Address,
        BlockId,
        TxHash,
        U256,
        transaction::eip2718::TypedTransaction,
    },
};
use std::{
    path::PathBuf,
    sync::Arc,
};
use thiserror::Error;
use tracing::{
    debug,
    info,
};

/// Fallback gas ceiling applied when the user does not override it. The
/// contract's heaviest call (market creation with a long option list) stays
/// well under this.
pub const DEFAULT_GAS_LIMIT: u64 = 3_000_000;

type Client = SignerMiddleware<Provider<Http>, LocalWallet>;

/// Failure taxonomy for every wallet/contract interaction. All variants
/// surface to the UI verbatim; none are retried automatically because a
/// resubmission needs user-driven nonce/gas adjustment.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("no wallet keystore found in {}", .dir.display())]
    ProviderUnavailable { dir: PathBuf },
    #[error("wallet unlock declined or failed for '{name}'")]
    UserRejected { name: String },
    #[error("RPC node is on chain {actual}, expected chain {expected}")]
    WrongNetwork { expected: u64, actual: u64 },
    #[error("contract read failed: {0}")]
    Read(String),
    #[error("transaction submission failed: {0}")]
    Submission(String),
    #[error("transaction reverted: {}", .reason.as_deref().unwrap_or("no revert reason returned"))]
    Reverted { reason: Option<String> },
}

/// Explicit gas parameters attached to every state-changing call.
#[derive(Clone, Copy, Debug)]
pub struct TxOptions {
    pub gas_limit: U256,
    pub gas_price: Option<U256>,
}

impl Default for TxOptions {
    fn default() -> Self {
        Self {
            gas_limit: U256::from(DEFAULT_GAS_LIMIT),
            gas_price: None,
        }
    }
}

/// Handle for a submitted, not-yet-confirmed transaction.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct TxHandle(pub TxHash);

/// Everything a user draft of a new market carries to the chain. Amount
/// scaling and timestamp parsing happen before this point; fields here are
/// already in wire units.
#[derive(Clone, Debug, Default)]
pub struct MarketDraft {
    pub category: String,
    pub question: String,
    pub description: String,
    pub options: Vec<String>,
    pub start_time: u64,
    pub end_time: u64,
}

/// The fixed function surface of the FanPredix contract. Reads are
/// side-effect free; writes return a [`TxHandle`] that must be passed to
/// [`MarketContract::await_confirmation`] before any dependent refetch.
pub trait MarketContract {
    fn account(&self) -> Address;

    async fn get_all_teams(&self) -> Result<Vec<Team>, GatewayError>;
    async fn get_markets_by_team(&self, team_id: U256) -> Result<Vec<U256>, GatewayError>;
    async fn get_market(&self, market_id: U256) -> Result<Market, GatewayError>;
    async fn get_user_bets(
        &self,
        market_id: U256,
        user: Address,
    ) -> Result<Vec<U256>, GatewayError>;
    async fn get_bet(&self, bet_id: U256) -> Result<Bet, GatewayError>;

    async fn add_team(
        &self,
        name: String,
        manager: Address,
        fan_token: Address,
        opts: TxOptions,
    ) -> Result<TxHandle, GatewayError>;
    async fn create_market(
        &self,
        draft: MarketDraft,
        opts: TxOptions,
    ) -> Result<TxHandle, GatewayError>;
    async fn place_order(
        &self,
        market_id: U256,
        outcome_index: U256,
        side: Side,
        amount: U256,
        odds: U256,
        opts: TxOptions,
    ) -> Result<TxHandle, GatewayError>;
    async fn cancel_order(
        &self,
        order_id: U256,
        opts: TxOptions,
    ) -> Result<TxHandle, GatewayError>;

    async fn await_confirmation(&self, handle: TxHandle) -> Result<(), GatewayError>;
}

#[derive(Clone, Debug)]
pub struct WalletConfig {
    pub name: String,
    pub dir: PathBuf,
}

#[derive(Clone, Debug)]
pub struct GatewayConfig {
    pub rpc_url: String,
    pub wallet: WalletConfig,
    pub contract_address: Address,
    pub expected_chain_id: u64,
}

/// Live binding against the deployed contract, signing with the unlocked
/// keystore account.
pub struct LiveContract {
    contract: FanPredix<Client>,
    provider: Provider<Http>,
    expected_chain_id: u64,
    account: Address,
}

/// The `requestAccess` step: locate and unlock the keystore wallet, connect
/// the RPC provider, verify the chain id, and bind the contract.
pub async fn connect(config: GatewayConfig) -> Result<LiveContract, GatewayError> {
    let GatewayConfig {
        rpc_url,
        wallet,
        contract_address,
        expected_chain_id,
    } = config;

    let descriptor = wallets::find_wallet(&wallet.dir, &wallet.name).map_err(|err| {
        debug!(?err, "wallet lookup failed");
        GatewayError::ProviderUnavailable { dir: wallet.dir }
    })?;

    let signer = wallets::unlock_wallet(&descriptor).map_err(|err| {
        debug!(?err, "wallet unlock failed");
        GatewayError::UserRejected {
            name: descriptor.name.clone(),
        }
    })?;

    let provider = Provider::<Http>::try_from(rpc_url.as_str())
        .map_err(|err| GatewayError::Read(format!("invalid RPC URL {rpc_url}: {err}")))?;

    let actual_chain_id = fetch_chain_id(&provider).await.map_err(GatewayError::Read)?;
    if actual_chain_id != expected_chain_id {
        return Err(GatewayError::WrongNetwork {
            expected: expected_chain_id,
            actual: actual_chain_id,
        });
    }

    let signer = signer.with_chain_id(expected_chain_id);
    let account = signer.address();
    let client = Arc::new(SignerMiddleware::new(provider.clone(), signer));
    let contract = FanPredix::new(contract_address, client);

    info!(
        %account,
        contract = %contract_address,
        chain_id = expected_chain_id,
        "connected to FanPredix deployment"
    );

    Ok(LiveContract {
        contract,
        provider,
        expected_chain_id,
        account,
    })
}

impl LiveContract {
    /// The active account and network belong to the node/keystore, not to
    /// us, so the chain id is re-read before every submission rather than
    /// trusted from connect time.
    async fn ensure_network(&self) -> Result<(), GatewayError> {
        let actual = fetch_chain_id(&self.provider)
            .await
            .map_err(GatewayError::Submission)?;
        if actual != self.expected_chain_id {
            return Err(GatewayError::WrongNetwork {
                expected: self.expected_chain_id,
                actual,
            });
        }
        Ok(())
    }

    async fn submit<D>(
        &self,
        call: ContractCall<Client, D>,
        opts: TxOptions,
    ) -> Result<TxHandle, GatewayError>
    where
        D: Detokenize,
    {
        self.ensure_network().await?;
        let call = with_tx_options(call, opts);
        let pending = call.send().await.map_err(submission_error)?;
        let hash = *pending;
        debug!(tx = %hash, "transaction submitted");
        Ok(TxHandle(hash))
    }

    /// Best-effort revert reason for a mined-but-failed transaction: replay
    /// the call at the block it was mined in and surface the node's error.
    async fn mined_revert_reason(&self, handle: TxHandle, block: Option<BlockId>) -> Option<String> {
        let tx = self.provider.get_transaction(handle.0).await.ok()??;
        let replay: TypedTransaction = (&tx).into();
        match self.provider.call(&replay, block).await {
            Ok(_) => None,
            Err(err) => extract_revert_reason(&err.to_string()),
        }
    }
}

impl MarketContract for LiveContract {
    fn account(&self) -> Address {
        self.account
    }

    async fn get_all_teams(&self) -> Result<Vec<Team>, GatewayError> {
        self.contract.get_all_teams().call().await.map_err(read_error)
    }

    async fn get_markets_by_team(&self, team_id: U256) -> Result<Vec<U256>, GatewayError> {
        self.contract
            .get_markets_by_team(team_id)
            .call()
            .await
            .map_err(read_error)
    }

    async fn get_market(&self, market_id: U256) -> Result<Market, GatewayError> {
        self.contract.get_market(market_id).call().await.map_err(read_error)
    }

    async fn get_user_bets(
        &self,
        market_id: U256,
        user: Address,
    ) -> Result<Vec<U256>, GatewayError> {
        self.contract
            .get_user_bets(market_id, user)
            .call()
            .await
            .map_err(read_error)
    }

    async fn get_bet(&self, bet_id: U256) -> Result<Bet, GatewayError> {
        self.contract.get_bet(bet_id).call().await.map_err(read_error)
    }

    async fn add_team(
        &self,
        name: String,
        manager: Address,
        fan_token: Address,
        opts: TxOptions,
    ) -> Result<TxHandle, GatewayError> {
        let call = self.contract.add_team(name, manager, fan_token);
        self.submit(call, opts).await
    }

    async fn create_market(
        &self,
        draft: MarketDraft,
        opts: TxOptions,
    ) -> Result<TxHandle, GatewayError> {
        let call = self.contract.create_market(
            draft.category,
            draft.question,
            draft.description,
            draft.options,
            U256::from(draft.start_time),
            U256::from(draft.end_time),
        );
        self.submit(call, opts).await
    }

    async fn place_order(
        &self,
        market_id: U256,
        outcome_index: U256,
        side: Side,
        amount: U256,
        odds: U256,
        opts: TxOptions,
    ) -> Result<TxHandle, GatewayError> {
        let call = self.contract.place_order(
            market_id,
            outcome_index,
            side.ordinal(),
            amount,
            odds,
        );
        self.submit(call, opts).await
    }

    async fn cancel_order(
        &self,
        order_id: U256,
        opts: TxOptions,
    ) -> Result<TxHandle, GatewayError> {
        let call = self.contract.cancel_order(order_id);
        self.submit(call, opts).await
    }

    async fn await_confirmation(&self, handle: TxHandle) -> Result<(), GatewayError> {
        let pending = PendingTransaction::new(handle.0, &self.provider);
        let receipt = pending.await.map_err(|err| {
            GatewayError::Submission(format!("awaiting confirmation failed: {err}"))
        })?;
        let receipt = receipt.ok_or_else(|| {
            GatewayError::Submission("transaction dropped before it was mined".to_string())
        })?;
        if matches!(receipt.status, Some(status) if status.is_zero()) {
            let block = receipt.block_number.map(|n| BlockId::from(n.as_u64()));
            let reason = self.mined_revert_reason(handle, block).await;
            return Err(GatewayError::Reverted { reason });
        }
        debug!(tx = %handle.0, block = ?receipt.block_number, "transaction confirmed");
        Ok(())
    }
}

async fn fetch_chain_id(provider: &Provider<Http>) -> Result<u64, String> {
    provider
        .get_chainid()
        .await
        .map(|id| id.as_u64())
        .map_err(|err| format!("fetching chain id failed: {err}"))
}

fn with_tx_options<D>(call: ContractCall<Client, D>, opts: TxOptions) -> ContractCall<Client, D>
where
    D: Detokenize,
{
    let call = call.gas(opts.gas_limit);
    match opts.gas_price {
        Some(price) => call.gas_price(price),
        None => call,
    }
}

fn read_error(err: ContractError<Client>) -> GatewayError {
    GatewayError::Read(err.to_string())
}

fn submission_error(err: ContractError<Client>) -> GatewayError {
    match err.decode_revert::<String>() {
        Some(reason) => GatewayError::Submission(format!("rejected by contract: {reason}")),
        None => GatewayError::Submission(err.to_string()),
    }
}

/// Pull the human-readable part out of a node "execution reverted" error
/// string, if one is present.
fn extract_revert_reason(message: &str) -> Option<String> {
    let idx = message.find("execution reverted")?;
    let tail = &message[idx..];
    let reason = match tail.strip_prefix("execution reverted:") {
        Some(rest) => rest,
        None => tail,
    };
    let reason = reason
        .split(|c| c == ',' || c == ')' || c == '\n')
        .next()
        .unwrap_or(reason)
        .trim();
    if reason.is_empty() {
        None
    } else {
        Some(reason.to_string())
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;

    #[test]
    fn extract_revert_reason__surfaces_contract_message() {
        // given
        let message =
            "(code: 3, message: execution reverted: order already matched, data: Some(...))";

        // when
        let reason = extract_revert_reason(message);

        // then
        assert_eq!(reason, Some("order already matched".to_string()));
    }

    #[test]
    fn extract_revert_reason__none_when_not_a_revert() {
        // given
        let message = "connection refused";

        // when
        let reason = extract_revert_reason(message);

        // then
        assert_eq!(reason, None);
    }

    #[test]
    fn wrong_network__display_names_both_chains() {
        let err = GatewayError::WrongNetwork {
            expected: 88882,
            actual: 1,
        };
        assert_eq!(
            err.to_string(),
            "RPC node is on chain 1, expected chain 88882"
        );
    }

    #[test]
    fn reverted__display_falls_back_without_reason() {
        let err = GatewayError::Reverted { reason: None };
        assert_eq!(
            err.to_string(),
            "transaction reverted: no revert reason returned"
        );
    }
}
