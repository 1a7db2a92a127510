use error_stack::report;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use swapper_models::constants::chains::{ChainType, EVM_NULL_ADDRESS};
use swapper_models::models::{AccountId, Asset, BaseUnits};

use crate::chain::{ContractCall, EvmFeeData, TransactionInput};
use crate::error::{EngineResult, Error};
use crate::swappers::SwapperName;
use crate::utils::evm::encode_deposit_with_expiry;

pub mod aggregate;
pub mod normalize;
pub mod session;

/// Upper bound reported by sources without a maximum trade size
pub const DEFAULT_MAXIMUM_CRYPTO_HUMAN: &str = "100000000000000000000000000";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapSource {
    pub name: SwapperName,
    pub proportion: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvmChainSpecificFees {
    pub estimated_gas: BaseUnits,
    pub gas_price: BaseUnits,
    pub approval_fee: Option<BaseUnits>,
    pub max_fee_per_gas: Option<BaseUnits>,
    pub max_priority_fee_per_gas: Option<BaseUnits>,
}

impl EvmChainSpecificFees {
    pub fn from_fee_data(fee_data: &EvmFeeData, approval_fee: Option<BaseUnits>) -> Self {
        EvmChainSpecificFees {
            estimated_gas: fee_data.gas_limit.clone(),
            gas_price: fee_data.gas_price.clone(),
            approval_fee,
            max_fee_per_gas: fee_data.max_fee_per_gas.clone(),
            max_priority_fee_per_gas: fee_data.max_priority_fee_per_gas.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteFeeData {
    /// Paid in the sell chain's fee asset
    pub network_fee: BaseUnits,
    pub buy_asset_trade_fee_usd: String,
    pub sell_asset_trade_fee_usd: String,
    pub chain_specific: Option<EvmChainSpecificFees>,
    /// Deducted from the buy amount, in buy asset base units
    pub affiliate_fee: Option<BaseUnits>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum TradeExecutionData {
    Thorchain {
        memo: String,
        inbound_address: String,
        router: Option<String>,
        expiry: u64,
    },
    EvmCall {
        to: String,
        data: String,
        value: BaseUnits,
    },
}

impl TradeExecutionData {
    pub fn expiry(&self) -> Option<u64> {
        match self {
            TradeExecutionData::Thorchain { expiry, .. } => Some(*expiry),
            TradeExecutionData::EvmCall { .. } => None,
        }
    }

    /// The transaction selling `sell_amount` of `sell_asset` through this route.
    ///
    /// THORChain EVM sells go through the router's `depositWithExpiry`, native
    /// assets attach the amount as value. Other chains send to the vault with
    /// the memo.
    pub fn to_transaction_input(
        &self,
        account_id: &AccountId,
        account_number: u32,
        sell_asset: &Asset,
        sell_amount: &BaseUnits,
    ) -> EngineResult<TransactionInput> {
        let mut input = TransactionInput::new(
            account_id.clone(),
            account_number,
            sell_asset.clone(),
            String::new(),
            sell_amount.clone(),
        );

        match self {
            TradeExecutionData::Thorchain {
                memo,
                inbound_address,
                router,
                expiry,
            } => match sell_asset.chain_id.to_chain_type() {
                ChainType::Evm => {
                    let router = router.as_ref().ok_or_else(|| {
                        report!(Error::TransactionBuildFailure(format!(
                            "No THORChain router for {}",
                            sell_asset.chain_id
                        )))
                    })?;
                    let (asset_address, value) = match sell_asset.contract_address() {
                        Some(token) => (token.to_string(), BaseUnits::zero()),
                        None => (EVM_NULL_ADDRESS.to_string(), sell_amount.clone()),
                    };
                    let data = encode_deposit_with_expiry(
                        inbound_address,
                        &asset_address,
                        sell_amount,
                        memo,
                        *expiry,
                    )?;
                    input.to = router.clone();
                    input.contract_call = Some(ContractCall {
                        to: router.clone(),
                        data,
                        value,
                    });
                }
                ChainType::Utxo | ChainType::Cosmos => {
                    input.to = inbound_address.clone();
                    input.memo = Some(memo.clone());
                }
            },
            TradeExecutionData::EvmCall { to, data, value } => {
                input.to = to.clone();
                input.contract_call = Some(ContractCall {
                    to: to.clone(),
                    data: data.clone(),
                    value: value.clone(),
                });
            }
        }

        Ok(input)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeQuote {
    pub swapper: SwapperName,
    pub sell_asset: Asset,
    pub buy_asset: Asset,
    pub account_id: AccountId,
    pub account_number: u32,
    pub receive_address: String,
    pub sell_amount_before_fees: BaseUnits,
    pub buy_amount_before_fees: BaseUnits,
    pub buy_amount_after_fees: BaseUnits,
    pub rate: String,
    pub fee_data: QuoteFeeData,
    pub minimum_crypto_human: String,
    pub maximum_crypto_human: String,
    /// Decimal fraction
    pub recommended_slippage: Option<Decimal>,
    pub allowance_contract: Option<String>,
    pub sources: Vec<SwapSource>,
    pub execution: TradeExecutionData,
}

impl TradeQuote {
    pub fn expiry(&self) -> Option<u64> {
        self.execution.expiry()
    }

    pub fn transaction_input(&self) -> EngineResult<TransactionInput> {
        self.execution.to_transaction_input(
            &self.account_id,
            self.account_number,
            &self.sell_asset,
            &self.sell_amount_before_fees,
        )
    }
}
