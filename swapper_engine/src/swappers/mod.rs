use error_stack::Report;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum_macros::{Display, EnumIter, EnumString};
use swapper_models::constants::chains::is_native_token_evm_address;
use swapper_models::error::Error as ModelError;
use swapper_models::models::{AccountId, Asset, BaseUnits};

use crate::error::{EngineResult, Error, from_model_report};
use crate::quote::TradeExecutionData;
use crate::swappers::one_inch::responses::OneInchSwapResponse;
use crate::swappers::thorchain::ThorchainRawQuote;
use crate::swappers::zero_x::responses::ZeroXQuoteResponse;

pub mod one_inch;
pub mod thorchain;
pub mod zero_x;

/// Sources are matched case-insensitively when parsed from config
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[strum(ascii_case_insensitive)]
pub enum SwapperName {
    #[strum(to_string = "THORChain")]
    #[serde(rename = "THORChain")]
    Thorchain,
    #[strum(to_string = "0x")]
    #[serde(rename = "0x")]
    ZeroX,
    #[strum(to_string = "1inch")]
    #[serde(rename = "1inch")]
    OneInch,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuoteRequest {
    pub sell_asset: Asset,
    pub buy_asset: Asset,
    pub sell_amount: BaseUnits,
    pub account_id: AccountId,
    pub account_number: u32,
    pub receive_address: String,
    /// Decimal fraction, `0.005` is half a percent
    pub slippage_tolerance: Option<Decimal>,
}

/// Source specific answer, kept untouched until normalization
#[derive(Debug, Clone, PartialEq)]
pub enum RawQuote {
    Thorchain(ThorchainRawQuote),
    ZeroX(ZeroXQuoteResponse),
    OneInch {
        swap: OneInchSwapResponse,
        spender: String,
    },
}

impl RawQuote {
    pub fn swapper(&self) -> SwapperName {
        match self {
            RawQuote::Thorchain(_) => SwapperName::Thorchain,
            RawQuote::ZeroX(_) => SwapperName::ZeroX,
            RawQuote::OneInch { .. } => SwapperName::OneInch,
        }
    }

    /// What the planner has to send to execute this quote
    pub fn execution_data(&self) -> TradeExecutionData {
        match self {
            RawQuote::Thorchain(raw) => TradeExecutionData::Thorchain {
                memo: raw.quote.memo.clone(),
                inbound_address: raw.quote.inbound_address.clone(),
                router: raw.router.clone(),
                expiry: raw.quote.expiry,
            },
            RawQuote::ZeroX(response) => TradeExecutionData::EvmCall {
                to: response.transaction.to.clone(),
                data: response.transaction.data.clone(),
                value: response.transaction.value.clone(),
            },
            RawQuote::OneInch { swap, .. } => TradeExecutionData::EvmCall {
                to: swap.tx.to.clone(),
                data: swap.tx.data.clone(),
                value: swap.tx.value.clone(),
            },
        }
    }
}

#[async_trait::async_trait]
pub trait Swapper: Send + Sync {
    fn name(&self) -> SwapperName;

    /// Cheap pair check, sources answering `false` are never queried
    fn supports(&self, sell_asset: &Asset, buy_asset: &Asset) -> bool;

    /// Returns `Error::NoRouteAvailable` when the source cannot quote the pair
    async fn fetch_quote(&self, request: &QuoteRequest) -> EngineResult<RawQuote>;
}

/// A 4xx answer usually means the source declined the pair, its body says why.
/// Rate limiting stays retryable and rejected credentials are reported.
pub fn map_source_error(report: Report<ModelError>) -> Report<Error> {
    match report.current_context() {
        ModelError::ClientError { status, body } => {
            let status = *status;
            let reason = serde_json::from_str::<Value>(body)
                .ok()
                .and_then(|value| {
                    ["error", "reason", "description", "message"]
                        .iter()
                        .find_map(|key| value.get(key).and_then(Value::as_str).map(str::to_string))
                })
                .unwrap_or_else(|| body.clone());
            let context = match status {
                401 | 403 => Error::Unauthorized(reason),
                408 | 429 => Error::TransportFailure(format!("HTTP {status}: {reason}")),
                _ => Error::NoRouteAvailable(reason),
            };
            report.change_context(context)
        }
        _ => from_model_report(report),
    }
}

/// Token address as EVM aggregators expect it, native assets use `0xeeee...`
pub fn evm_token_address(asset: &Asset) -> String {
    match asset.contract_address() {
        Some(address) if !is_native_token_evm_address(address) => address.to_string(),
        _ => swapper_models::constants::chains::NATIVE_TOKEN_EVM_ADDRESS.to_string(),
    }
}

/// Same chain EVM pairs, the only ones aggregators can route
pub fn is_same_chain_evm_pair(sell_asset: &Asset, buy_asset: &Asset) -> bool {
    sell_asset.chain_id.is_evm()
        && sell_asset.chain_id == buy_asset.chain_id
        && sell_asset.asset_id != buy_asset.asset_id
}
