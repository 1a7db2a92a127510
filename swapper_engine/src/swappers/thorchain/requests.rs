use serde::{Deserialize, Serialize};
use swapper_models::models::BaseUnits;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThorchainSwapQuoteRequest {
    /// Pool notation, `ETH.FOX-0XC770...`
    pub from_asset: String,
    pub to_asset: String,
    /// Thor units
    pub amount: BaseUnits,
    pub destination: String,
    pub tolerance_bps: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThorchainSaversWithdrawQuoteRequest {
    pub asset: String,
    pub address: String,
    pub withdraw_bps: u32,
}
