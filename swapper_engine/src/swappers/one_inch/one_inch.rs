use error_stack::{ResultExt as _, report};
use rust_decimal::Decimal;
use serde_json::json;
use swapper_models::models::Asset;
use swapper_models::network::client_rate_limit::Client;
use swapper_models::network::http::build_url;
use tracing::debug;

use crate::error::{EngineResult, Error};
use crate::swappers::one_inch::requests::OneInchSwapRequest;
use crate::swappers::one_inch::responses::{OneInchApproveResponse, OneInchSwapResponse};
use crate::swappers::{
    QuoteRequest, RawQuote, Swapper, SwapperName, evm_token_address, is_same_chain_evm_pair,
    map_source_error,
};

/// Percent applied when the request carries no tolerance
pub const ONE_INCH_DEFAULT_SLIPPAGE_PERCENT: u32 = 1;

fn auth_header(api_key: Option<&str>) -> Option<String> {
    api_key.map(|key| format!("Bearer {key}"))
}

async fn one_inch_get<T: serde::de::DeserializeOwned>(
    client: &Client,
    url: &str,
    api_key: Option<&str>,
) -> EngineResult<T> {
    let authorization = auth_header(api_key);
    let headers: Vec<(&str, &str)> = authorization
        .as_deref()
        .map(|value| vec![("Authorization", value)])
        .unwrap_or_default();

    client
        .get_json(url, &headers)
        .await
        .map_err(map_source_error)
        .attach_printable("Error in 1inch request")
}

pub async fn one_inch_swap(
    client: &Client,
    base_url: &str,
    api_key: Option<&str>,
    request: OneInchSwapRequest,
) -> EngineResult<OneInchSwapResponse> {
    let mut query = json!({
        "src": request.src,
        "dst": request.dst,
        "amount": request.amount.to_string(),
        "from": request.from,
        "origin": request.origin,
        "slippage": request.slippage.normalize().to_string(),
        "disableEstimate": true,
    });

    if let Some(receiver) = request.receiver {
        query["receiver"] = json!(receiver);
    }

    let url = build_url(base_url, &format!("{}/swap", request.chain), Some(&query))
        .change_context(Error::ParseError)?;

    one_inch_get(client, &url, api_key).await
}

pub async fn one_inch_get_approve_address(
    client: &Client,
    base_url: &str,
    api_key: Option<&str>,
    chain: u64,
) -> EngineResult<String> {
    let url = build_url(base_url, &format!("{chain}/approve/spender"), None)
        .change_context(Error::ParseError)?;

    let response: OneInchApproveResponse = one_inch_get(client, &url, api_key).await?;
    Ok(response.address)
}

pub struct OneInchSwapper {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl OneInchSwapper {
    pub fn new(client: Client, base_url: &str, api_key: Option<String>) -> Self {
        OneInchSwapper {
            client,
            base_url: base_url.to_string(),
            api_key,
        }
    }
}

#[async_trait::async_trait]
impl Swapper for OneInchSwapper {
    fn name(&self) -> SwapperName {
        SwapperName::OneInch
    }

    fn supports(&self, sell_asset: &Asset, buy_asset: &Asset) -> bool {
        is_same_chain_evm_pair(sell_asset, buy_asset)
    }

    async fn fetch_quote(&self, request: &QuoteRequest) -> EngineResult<RawQuote> {
        let chain = request.sell_asset.chain_id.evm_chain_id().ok_or_else(|| {
            report!(Error::NoRouteAvailable(format!(
                "1inch does not serve {}",
                request.sell_asset.chain_id
            )))
        })?;

        let from = request.account_id.account.clone();
        let receiver =
            (!request.receive_address.eq_ignore_ascii_case(&from)).then(|| request.receive_address.clone());
        let slippage = request
            .slippage_tolerance
            .map(|fraction| fraction * Decimal::ONE_HUNDRED)
            .unwrap_or_else(|| Decimal::from(ONE_INCH_DEFAULT_SLIPPAGE_PERCENT));

        let swap_request = OneInchSwapRequest {
            chain,
            src: evm_token_address(&request.sell_asset),
            dst: evm_token_address(&request.buy_asset),
            amount: request.sell_amount.clone(),
            origin: from.clone(),
            from,
            receiver,
            slippage,
        };

        debug!(
            chain,
            src = %swap_request.src,
            dst = %swap_request.dst,
            amount = %swap_request.amount,
            "Requesting 1inch swap"
        );

        let api_key = self.api_key.as_deref();
        let (swap, spender) = tokio::try_join!(
            one_inch_swap(&self.client, &self.base_url, api_key, swap_request),
            one_inch_get_approve_address(&self.client, &self.base_url, api_key, chain),
        )?;

        Ok(RawQuote::OneInch { swap, spender })
    }
}
