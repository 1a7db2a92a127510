use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use error_stack::{Report, ResultExt, report};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use swapper_models::constants::chains::{
    BCH_ADDRESS_PREFIX, ChainId, EVM_NULL_ADDRESS, wallet_address_from_thorchain,
};
use swapper_models::models::{AccountId, Asset, BaseUnits};
use swapper_models::network::client_rate_limit::Client;
use tracing::{debug, info, warn};

use crate::chain::{ContractCall, TransactionInput};
use crate::error::{EngineResult, Error, ReportDisplayExt, from_model_report};
use crate::execution::broadcast::Broadcaster;
use crate::swappers::thorchain::requests::ThorchainSaversWithdrawQuoteRequest;
use crate::swappers::thorchain::responses::ThorchainSaversWithdrawQuote;
use crate::swappers::thorchain::thorchain::{
    thorchain_get_inbound_address, thorchain_get_saver_position,
    thorchain_get_saver_withdraw_quote, thorchain_is_trading_active,
};
use crate::utils::bps::{slippage_amount, withdraw_bps};
use crate::utils::evm::encode_deposit_with_expiry;
use crate::utils::units::{from_base_unit, thor_to_base_unit, to_plain_string, to_thor_base_unit};
use crate::utils::{Clock, is_expired};

lazy_static! {
    /// Smallest inbound amount THORChain observes per fee asset, in base units
    pub static ref THORCHAIN_SAVERS_DUST_THRESHOLDS: HashMap<ChainId, BaseUnits> = {
        let mut thresholds = HashMap::new();
        // 10 gwei
        thresholds.insert(ChainId::Ethereum, BaseUnits::from(10_000_000_000u64));
        thresholds.insert(ChainId::Avalanche, BaseUnits::from(10_000_000_000u64));
        thresholds.insert(ChainId::BnbSmartChain, BaseUnits::from(10_000_000_000u64));
        thresholds.insert(ChainId::Bitcoin, BaseUnits::from(10_000u64));
        thresholds.insert(ChainId::BitcoinCash, BaseUnits::from(10_000u64));
        thresholds.insert(ChainId::Litecoin, BaseUnits::from(10_000u64));
        thresholds.insert(ChainId::Dogecoin, BaseUnits::from(100_000_000u64));
        thresholds.insert(ChainId::Cosmos, BaseUnits::zero());
        thresholds
    };
}

pub fn savers_dust_threshold(chain_id: ChainId) -> BaseUnits {
    THORCHAIN_SAVERS_DUST_THRESHOLDS
        .get(&chain_id)
        .cloned()
        .unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaversWithdrawRequest {
    pub asset: Asset,
    pub account_id: AccountId,
    pub account_number: u32,
    /// Base units of `asset`
    pub withdraw_amount: BaseUnits,
    pub staked_amount: BaseUnits,
    pub rewards_amount: BaseUnits,
}

/// Everything known before sending, shown to the user for confirmation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaversWithdrawPlan {
    pub withdraw_bps: u32,
    /// Address holding the position, the withdraw must come from it on UTXO chains
    pub from_address: String,
    pub quote: ThorchainSaversWithdrawQuote,
    /// Base units of the withdrawn asset
    pub protocol_fee: BaseUnits,
    /// Base units of the withdrawn asset
    pub dust_amount: BaseUnits,
    /// Human amount of the withdrawn asset lost to slippage
    pub slippage_amount: String,
    pub network_fee: BaseUnits,
    pub input: TransactionInput,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawReceipt {
    pub tx_id: String,
    pub protocol_fee: BaseUnits,
    pub dust_amount: BaseUnits,
    pub network_fee: BaseUnits,
    pub from_address: String,
}

/// THORChain savers withdraw: a dust send carrying the withdraw memo
pub struct SaversWithdraw {
    client: Client,
    thornode_url: String,
    broadcaster: Broadcaster,
    clock: Arc<dyn Clock>,
    utxo_retry_delay: Duration,
}

impl SaversWithdraw {
    pub fn new(
        client: Client,
        thornode_url: &str,
        broadcaster: Broadcaster,
        clock: Arc<dyn Clock>,
        utxo_retry_delay: Duration,
    ) -> Self {
        SaversWithdraw {
            client,
            thornode_url: thornode_url.to_string(),
            broadcaster,
            clock,
            utxo_retry_delay,
        }
    }

    /// Address the position lives on. UTXO positions are tied to one address
    /// which thornode reports without the BCH cashaddr prefix.
    async fn position_address(&self, request: &SaversWithdrawRequest) -> EngineResult<String> {
        let address = self
            .broadcaster
            .wallet()
            .address(&request.account_id, request.account_number)
            .await?;

        if !request.asset.chain_id.is_utxo() {
            return Ok(address);
        }

        let position = thorchain_get_saver_position(
            &self.client,
            &self.thornode_url,
            &request.asset.thorchain_pool_asset(),
            address.trim_start_matches(BCH_ADDRESS_PREFIX),
        )
        .await
        .attach_printable("Fetching savers position")?;

        Ok(wallet_address_from_thorchain(
            request.asset.chain_id,
            &position.asset_address,
        ))
    }

    async fn withdraw_input(
        &self,
        request: &SaversWithdrawRequest,
        quote: &ThorchainSaversWithdrawQuote,
        from_address: &str,
        dust_amount: &BaseUnits,
    ) -> EngineResult<TransactionInput> {
        let asset = &request.asset;

        if asset.is_token() && asset.chain_id.is_evm() {
            // Tokens cannot carry a memo, the router is called with a native dust amount
            let router = match &quote.router {
                Some(router) => router.clone(),
                None => thorchain_get_inbound_address(&self.client, &self.thornode_url, asset.chain_id)
                    .await?
                    .router
                    .ok_or_else(|| {
                        report!(Error::TransactionBuildFailure(format!(
                            "No THORChain router for {}",
                            asset.chain_id
                        )))
                    })?,
            };
            let amount = savers_dust_threshold(asset.chain_id);
            let data = encode_deposit_with_expiry(
                &quote.inbound_address,
                EVM_NULL_ADDRESS,
                &amount,
                &quote.memo,
                quote.expiry,
            )?;
            let fee_asset = Asset::fee_asset(asset.chain_id).map_err(from_model_report)?;
            let mut input = TransactionInput::new(
                request.account_id.clone(),
                request.account_number,
                fee_asset,
                router.clone(),
                amount.clone(),
            );
            input.contract_call = Some(ContractCall {
                to: router,
                data,
                value: amount,
            });
            return Ok(input);
        }

        let input = TransactionInput::new(
            request.account_id.clone(),
            request.account_number,
            asset.clone(),
            quote.inbound_address.clone(),
            dust_amount.clone(),
        )
        .with_memo(quote.memo.clone());

        Ok(if asset.chain_id.is_utxo() {
            input.with_from(from_address)
        } else {
            input
        })
    }

    /// Resolves the withdraw without sending anything.
    ///
    /// A share that rounds to zero basis points fails with
    /// `Error::NothingToWithdraw` before any request is made.
    pub async fn prepare(&self, request: &SaversWithdrawRequest) -> EngineResult<SaversWithdrawPlan> {
        let withdraw_bps = withdraw_bps(
            &request.withdraw_amount,
            &request.staked_amount,
            &request.rewards_amount,
        )?;
        let chain_id = request.asset.chain_id;
        self.broadcaster.ensure_supported(chain_id)?;

        let from_address = self.position_address(request).await?;
        let pool_asset = request.asset.thorchain_pool_asset();

        debug!(pool = %pool_asset, withdraw_bps, from = %from_address, "Requesting savers withdraw quote");

        let quote = thorchain_get_saver_withdraw_quote(
            &self.client,
            &self.thornode_url,
            &ThorchainSaversWithdrawQuoteRequest {
                asset: pool_asset.clone(),
                address: from_address.trim_start_matches(BCH_ADDRESS_PREFIX).to_string(),
                withdraw_bps,
            },
        )
        .await?;

        let precision = request.asset.precision;
        let withdraw_thor = to_thor_base_unit(&request.withdraw_amount, precision);
        let protocol_fee = thor_to_base_unit(
            &withdraw_thor.saturating_sub(&quote.expected_amount_out),
            precision,
        );
        let dust_amount = thor_to_base_unit(&quote.dust_amount, precision);
        let slippage_amount = to_plain_string(&slippage_amount(
            &from_base_unit(&request.withdraw_amount, precision),
            quote.slippage_bps,
        ));

        let now = self.clock.now();
        if is_expired(quote.expiry, now) {
            return Err(report!(Error::QuoteExpired)
                .attach_printable(format!("Savers withdraw quote expired at {}, now {now}", quote.expiry)));
        }

        if !thorchain_is_trading_active(&self.client, &self.thornode_url, &request.asset).await? {
            return Err(report!(Error::TradingHalted(pool_asset)));
        }

        let input = self
            .withdraw_input(request, &quote, &from_address, &dust_amount)
            .await?;
        let network_fee = self
            .broadcaster
            .adapter(input.chain_id())?
            .estimate_fee(&input)
            .await?
            .network_fee;

        Ok(SaversWithdrawPlan {
            withdraw_bps,
            from_address,
            quote,
            protocol_fee,
            dust_amount,
            slippage_amount,
            network_fee,
            input,
        })
    }

    /// Prepares and sends the withdraw
    pub async fn execute(&self, request: &SaversWithdrawRequest) -> EngineResult<WithdrawReceipt> {
        let plan = self.prepare(request).await?;
        self.send(request, &plan).await
    }

    /// Sends a prepared withdraw.
    ///
    /// On UTXO chains a build failure is taken as the position address lacking
    /// funds: the shortfall is sent to it first and the withdraw retried once.
    pub async fn send(
        &self,
        request: &SaversWithdrawRequest,
        plan: &SaversWithdrawPlan,
    ) -> EngineResult<WithdrawReceipt> {
        if is_expired(plan.quote.expiry, self.clock.now()) {
            return Err(report!(Error::QuoteExpired));
        }

        let tx_id = match self.broadcaster.broadcast(plan.input.clone()).await {
            Ok(tx_id) => tx_id,
            Err(report)
                if request.asset.chain_id.is_utxo()
                    && matches!(report.current_context(), Error::TransactionBuildFailure(_)) =>
            {
                self.fund_and_retry(request, plan, report).await?
            }
            Err(report) => return Err(report),
        };

        info!(%tx_id, from = %plan.from_address, "Savers withdraw sent");
        Ok(WithdrawReceipt {
            tx_id,
            protocol_fee: plan.protocol_fee.clone(),
            dust_amount: plan.dust_amount.clone(),
            network_fee: plan.network_fee.clone(),
            from_address: plan.from_address.clone(),
        })
    }

    async fn fund_and_retry(
        &self,
        request: &SaversWithdrawRequest,
        plan: &SaversWithdrawPlan,
        build_failure: Report<Error>,
    ) -> EngineResult<String> {
        warn!(
            error = %build_failure.format(),
            address = %plan.from_address,
            "Withdraw could not be built from the position address, funding it first"
        );

        let balance = self
            .broadcaster
            .adapter(request.asset.chain_id)?
            .address_balance(&plan.from_address, &request.asset)
            .await?;
        let required = &plan.dust_amount + &plan.network_fee;
        let mut shortfall = required.saturating_sub(&balance);
        if shortfall.is_zero() {
            // TODO: tell coin selection failures apart from a short balance once adapters report it
            warn!(%balance, %required, "Position address looks funded, sending the full withdraw cost");
            shortfall = required;
        }

        let funding = TransactionInput::new(
            request.account_id.clone(),
            request.account_number,
            request.asset.clone(),
            plan.from_address.clone(),
            shortfall.clone(),
        );
        let funding_tx_id = self.broadcaster.broadcast(funding).await?;
        info!(%funding_tx_id, %shortfall, "Funding tx sent to the position address");

        tokio::time::sleep(self.utxo_retry_delay).await;

        let now = self.clock.now();
        if is_expired(plan.quote.expiry, now) {
            return Err(report!(Error::QuoteExpired).attach_printable(format!(
                "Savers withdraw quote expired at {} while funding tx {funding_tx_id} settled, now {now}",
                plan.quote.expiry
            )));
        }

        self.broadcaster
            .broadcast(plan.input.clone())
            .await
            .attach_printable("Withdraw retry after funding failed")
    }
}
