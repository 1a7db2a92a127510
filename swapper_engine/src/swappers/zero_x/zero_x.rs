use error_stack::{ResultExt as _, report};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde_json::{Value, json};
use swapper_models::models::Asset;
use swapper_models::network::client_rate_limit::Client;
use swapper_models::network::http::build_url;
use tracing::debug;

use crate::error::{EngineResult, Error};
use crate::swappers::zero_x::ZERO_X_QUOTE_PATH;
use crate::swappers::zero_x::requests::ZeroXGetQuoteRequest;
use crate::swappers::zero_x::responses::{ZeroXLiquidityResponse, ZeroXQuoteResponse};
use crate::swappers::{
    QuoteRequest, RawQuote, Swapper, SwapperName, evm_token_address, is_same_chain_evm_pair,
    map_source_error,
};
use crate::utils::bps::BASE_BPS_POINTS;

/// 0x applies 1% when `slippageBps` is omitted, sent explicitly so the quote is reproducible
pub const ZERO_X_DEFAULT_SLIPPAGE_BPS: u32 = 100;

pub async fn zero_x_get_quote(
    client: &Client,
    base_url: &str,
    api_key: Option<&str>,
    request: ZeroXGetQuoteRequest,
) -> EngineResult<ZeroXQuoteResponse> {
    let mut query = json!({
        "chainId": request.chain_id,
        "buyToken": request.buy_token,
        "sellToken": request.sell_token,
        "sellAmount": request.sell_amount.to_string(),
        "slippageBps": request.slippage_bps,
        "taker": request.taker,
    });

    if let Some(recipient) = request.recipient {
        query["recipient"] = json!(recipient);
    }

    let url = build_url(base_url, ZERO_X_QUOTE_PATH, Some(&query)).change_context(Error::ParseError)?;

    let mut headers = vec![("0x-version", "v2")];
    if let Some(api_key) = api_key {
        headers.push(("0x-api-key", api_key));
    }

    let body: Value = client
        .get_json(&url, &headers)
        .await
        .map_err(map_source_error)
        .attach_printable("Error in 0x request")?;

    // Unroutable pairs come back as 200 with only `liquidityAvailable: false`
    if let Ok(ZeroXLiquidityResponse {
        liquidity_available: false,
    }) = serde_json::from_value::<ZeroXLiquidityResponse>(body.clone())
    {
        return Err(report!(Error::NoRouteAvailable(
            "No liquidity available for 0x swap".to_string()
        )));
    }

    serde_json::from_value(body)
        .change_context(Error::ResponseError)
        .attach_printable("Unexpected 0x quote response")
}

fn slippage_to_bps(slippage: Option<Decimal>) -> EngineResult<u32> {
    let Some(slippage) = slippage else {
        return Ok(ZERO_X_DEFAULT_SLIPPAGE_BPS);
    };
    let bps = (slippage * Decimal::from(BASE_BPS_POINTS))
        .round()
        .to_u32()
        .ok_or_else(|| report!(Error::ParseError).attach_printable(format!("Slippage {slippage}")))?;
    if bps > BASE_BPS_POINTS {
        return Err(report!(Error::ParseError)
            .attach_printable("Slippage percent cannot be more than 100%"));
    }
    Ok(bps)
}

pub struct ZeroXSwapper {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl ZeroXSwapper {
    pub fn new(client: Client, base_url: &str, api_key: Option<String>) -> Self {
        ZeroXSwapper {
            client,
            base_url: base_url.to_string(),
            api_key,
        }
    }
}

#[async_trait::async_trait]
impl Swapper for ZeroXSwapper {
    fn name(&self) -> SwapperName {
        SwapperName::ZeroX
    }

    fn supports(&self, sell_asset: &Asset, buy_asset: &Asset) -> bool {
        is_same_chain_evm_pair(sell_asset, buy_asset)
    }

    async fn fetch_quote(&self, request: &QuoteRequest) -> EngineResult<RawQuote> {
        let chain_id = request.sell_asset.chain_id.evm_chain_id().ok_or_else(|| {
            report!(Error::NoRouteAvailable(format!(
                "0x does not serve {}",
                request.sell_asset.chain_id
            )))
        })?;

        let taker = request.account_id.account.clone();
        let recipient =
            (!request.receive_address.eq_ignore_ascii_case(&taker)).then(|| request.receive_address.clone());

        let quote_request = ZeroXGetQuoteRequest {
            chain_id,
            buy_token: evm_token_address(&request.buy_asset),
            sell_token: evm_token_address(&request.sell_asset),
            sell_amount: request.sell_amount.clone(),
            slippage_bps: slippage_to_bps(request.slippage_tolerance)?,
            taker,
            recipient,
        };

        debug!(
            chain_id,
            sell_token = %quote_request.sell_token,
            buy_token = %quote_request.buy_token,
            sell_amount = %quote_request.sell_amount,
            "Requesting 0x quote"
        );

        let response = zero_x_get_quote(
            &self.client,
            &self.base_url,
            self.api_key.as_deref(),
            quote_request,
        )
        .await?;

        Ok(RawQuote::ZeroX(response))
    }
}
