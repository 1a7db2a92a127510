use std::sync::Arc;

use bigdecimal::BigDecimal;
use error_stack::{ResultExt, report};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use swapper_models::constants::chains::ChainId;
use swapper_models::models::Asset;
use swapper_models::network::client_rate_limit::Client;
use swapper_models::network::http::build_url;
use tracing::debug;

use crate::error::{EngineResult, Error};
use crate::prices::PriceProvider;
use crate::swappers::thorchain::ThorchainRawQuote;
use crate::swappers::thorchain::requests::{
    ThorchainSaversWithdrawQuoteRequest, ThorchainSwapQuoteRequest,
};
use crate::swappers::thorchain::responses::{
    InboundAddress, ThorchainSaverPosition, ThorchainSaversWithdrawQuote,
    ThorchainSwapQuoteResponse, ThornodePool,
};
use crate::swappers::{QuoteRequest, RawQuote, Swapper, SwapperName, map_source_error};
use crate::utils::bps::BASE_BPS_POINTS;
use crate::utils::units::to_thor_base_unit;

async fn thornode_get<T: DeserializeOwned>(
    client: &Client,
    base_url: &str,
    path: &str,
    query: Option<&Value>,
) -> EngineResult<T> {
    let url = build_url(base_url, path, query).change_context(Error::ParseError)?;

    let body: Value = client
        .get_json(&url, &[])
        .await
        .map_err(map_source_error)
        .attach_printable_lazy(|| format!("Thornode request {path}"))?;

    if let Some(error) = body.get("error").and_then(Value::as_str) {
        return Err(report!(Error::NoRouteAvailable(error.to_string()))
            .attach_printable(format!("Thornode request {path}")));
    }

    serde_json::from_value(body)
        .change_context(Error::ResponseError)
        .attach_printable_lazy(|| format!("Unexpected thornode response for {path}"))
}

pub async fn thorchain_get_swap_quote(
    client: &Client,
    base_url: &str,
    request: &ThorchainSwapQuoteRequest,
) -> EngineResult<ThorchainSwapQuoteResponse> {
    let query = json!({
        "from_asset": request.from_asset,
        "to_asset": request.to_asset,
        "amount": request.amount.to_string(),
        "destination": request.destination,
        "tolerance_bps": request.tolerance_bps,
    });
    thornode_get(client, base_url, "lcd/thorchain/quote/swap", Some(&query)).await
}

pub async fn thorchain_get_inbound_addresses(
    client: &Client,
    base_url: &str,
) -> EngineResult<Vec<InboundAddress>> {
    thornode_get(client, base_url, "lcd/thorchain/inbound_addresses", None).await
}

/// Vault of `chain_id`, with the router contract on EVM chains
pub async fn thorchain_get_inbound_address(
    client: &Client,
    base_url: &str,
    chain_id: ChainId,
) -> EngineResult<InboundAddress> {
    let chain = chain_id.thorchain_chain();
    thorchain_get_inbound_addresses(client, base_url)
        .await?
        .into_iter()
        .find(|inbound| inbound.chain.eq_ignore_ascii_case(chain))
        .ok_or_else(|| report!(Error::NoRouteAvailable(format!("No inbound address for {chain}"))))
}

pub async fn thorchain_get_pools(client: &Client, base_url: &str) -> EngineResult<Vec<ThornodePool>> {
    thornode_get(client, base_url, "lcd/thorchain/pools", None).await
}

pub async fn thorchain_get_pool(
    client: &Client,
    base_url: &str,
    pool_asset: &str,
) -> EngineResult<ThornodePool> {
    thornode_get(
        client,
        base_url,
        &format!("lcd/thorchain/pool/{pool_asset}"),
        None,
    )
    .await
}

pub async fn thorchain_get_saver_position(
    client: &Client,
    base_url: &str,
    pool_asset: &str,
    address: &str,
) -> EngineResult<ThorchainSaverPosition> {
    thornode_get(
        client,
        base_url,
        &format!("lcd/thorchain/pool/{pool_asset}/saver/{address}"),
        None,
    )
    .await
}

pub async fn thorchain_get_saver_withdraw_quote(
    client: &Client,
    base_url: &str,
    request: &ThorchainSaversWithdrawQuoteRequest,
) -> EngineResult<ThorchainSaversWithdrawQuote> {
    let query = json!({
        "asset": request.asset,
        "address": request.address,
        "withdraw_bps": request.withdraw_bps,
    });
    thornode_get(
        client,
        base_url,
        "lcd/thorchain/quote/saver/withdraw",
        Some(&query),
    )
    .await
}

/// The pool is `Available` and its chain is neither halted nor paused
pub async fn thorchain_is_trading_active(
    client: &Client,
    base_url: &str,
    asset: &Asset,
) -> EngineResult<bool> {
    if asset.chain_id == ChainId::Thorchain {
        return Ok(true);
    }

    let pool_asset = asset.thorchain_pool_asset();
    let (pool, inbound) = tokio::try_join!(
        thorchain_get_pool(client, base_url, &pool_asset),
        thorchain_get_inbound_address(client, base_url, asset.chain_id),
    )?;

    Ok(pool.is_available() && !inbound.is_trading_halted())
}

fn fraction_to_bps(fraction: Decimal) -> Option<u32> {
    (fraction * Decimal::from(BASE_BPS_POINTS)).round().to_u32()
}

pub struct ThorchainSwapper {
    client: Client,
    base_url: String,
    prices: Arc<dyn PriceProvider>,
}

impl ThorchainSwapper {
    pub fn new(client: Client, base_url: &str, prices: Arc<dyn PriceProvider>) -> Self {
        ThorchainSwapper {
            client,
            base_url: base_url.to_string(),
            prices,
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn sell_chain_inbound(&self, chain_id: ChainId) -> EngineResult<Option<InboundAddress>> {
        // RUNE is deposited with a native MsgDeposit, there is no vault to send to
        if chain_id == ChainId::Thorchain {
            return Ok(None);
        }
        thorchain_get_inbound_address(&self.client, &self.base_url, chain_id)
            .await
            .map(Some)
    }

    async fn usd_rate(&self, asset: &Asset) -> EngineResult<BigDecimal> {
        self.prices
            .get_usd_rate(asset)
            .await
            .attach_printable_lazy(|| format!("USD rate of {}", asset.asset_id))
    }
}

#[async_trait::async_trait]
impl Swapper for ThorchainSwapper {
    fn name(&self) -> SwapperName {
        SwapperName::Thorchain
    }

    fn supports(&self, sell_asset: &Asset, buy_asset: &Asset) -> bool {
        sell_asset.asset_id != buy_asset.asset_id
    }

    async fn fetch_quote(&self, request: &QuoteRequest) -> EngineResult<RawQuote> {
        let amount = to_thor_base_unit(&request.sell_amount, request.sell_asset.precision);
        if amount.is_zero() {
            return Err(report!(Error::NoRouteAvailable(format!(
                "Sell amount {} is below THORChain precision",
                request.sell_amount
            ))));
        }

        let quote_request = ThorchainSwapQuoteRequest {
            from_asset: request.sell_asset.thorchain_pool_asset(),
            to_asset: request.buy_asset.thorchain_pool_asset(),
            amount,
            destination: request.receive_address.clone(),
            tolerance_bps: request.slippage_tolerance.and_then(fraction_to_bps),
        };

        debug!(
            from_asset = %quote_request.from_asset,
            to_asset = %quote_request.to_asset,
            amount = %quote_request.amount,
            "Requesting THORChain swap quote"
        );

        let (quote, inbound, sell_asset_usd_rate, buy_asset_usd_rate) = tokio::try_join!(
            thorchain_get_swap_quote(&self.client, &self.base_url, &quote_request),
            self.sell_chain_inbound(request.sell_asset.chain_id),
            self.usd_rate(&request.sell_asset),
            self.usd_rate(&request.buy_asset),
        )?;

        if let Some(inbound) = &inbound {
            if inbound.is_trading_halted() {
                return Err(report!(Error::NoRouteAvailable(format!(
                    "THORChain trading halted on {}",
                    inbound.chain
                ))));
            }
        }

        Ok(RawQuote::Thorchain(ThorchainRawQuote {
            router: inbound
                .and_then(|inbound| inbound.router)
                .or_else(|| quote.router.clone()),
            quote,
            sell_asset_usd_rate,
            buy_asset_usd_rate,
        }))
    }
}
