use serde::{Deserialize, Serialize};
use swapper_models::models::BaseUnits;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThorchainQuoteFees {
    #[serde(default)]
    pub affiliate: BaseUnits,
    /// Asset the fees are denominated in, `ETH.ETH`
    pub asset: String,
    pub outbound: BaseUnits,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThorchainSwapQuoteResponse {
    pub inbound_address: String,
    /// Thor units, fees already deducted
    pub expected_amount_out: BaseUnits,
    pub expiry: u64,
    pub fees: ThorchainQuoteFees,
    pub slippage_bps: u32,
    pub memo: String,
    #[serde(default)]
    pub router: Option<String>,
    #[serde(default)]
    pub dust_threshold: Option<BaseUnits>,
    #[serde(default)]
    pub recommended_min_amount_in: Option<BaseUnits>,
    #[serde(default)]
    pub inbound_confirmation_seconds: Option<u64>,
    #[serde(default)]
    pub outbound_delay_seconds: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundAddress {
    /// THORChain chain notation, `ETH`
    pub chain: String,
    pub address: String,
    #[serde(default)]
    pub router: Option<String>,
    #[serde(default)]
    pub halted: bool,
    #[serde(default)]
    pub chain_trading_paused: bool,
    #[serde(default)]
    pub gas_rate: Option<String>,
    #[serde(default)]
    pub dust_threshold: Option<BaseUnits>,
}

impl InboundAddress {
    pub fn is_trading_halted(&self) -> bool {
        self.halted || self.chain_trading_paused
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThornodePool {
    pub asset: String,
    pub status: String,
    pub balance_asset: BaseUnits,
    pub balance_rune: BaseUnits,
}

impl ThornodePool {
    pub fn is_available(&self) -> bool {
        self.status == "Available"
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThorchainSaverPosition {
    pub asset: String,
    /// Address the position was opened from, without cashaddr prefix for BCH
    pub asset_address: String,
    #[serde(default)]
    pub units: Option<BaseUnits>,
    #[serde(default)]
    pub asset_deposit_value: Option<BaseUnits>,
    #[serde(default)]
    pub asset_redeem_value: Option<BaseUnits>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThorchainSaversWithdrawQuote {
    pub inbound_address: String,
    pub memo: String,
    pub expiry: u64,
    /// Thor units the saver has to send to trigger the withdraw
    pub dust_amount: BaseUnits,
    #[serde(default)]
    pub dust_threshold: Option<BaseUnits>,
    pub expected_amount_out: BaseUnits,
    pub slippage_bps: u32,
    pub fees: ThorchainQuoteFees,
    #[serde(default)]
    pub router: Option<String>,
    #[serde(default)]
    pub outbound_delay_seconds: Option<u64>,
}
