use serde::{Deserialize, Serialize};
use swapper_models::models::BaseUnits;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZeroXQuoteResponse {
    pub buy_amount: BaseUnits,
    pub min_buy_amount: BaseUnits,
    pub sell_amount: BaseUnits,
    /// Spender to approve, absent for native sells
    pub allowance_target: Option<String>,
    pub transaction: ZeroXTransaction,
    #[serde(default)]
    pub route: Option<ZeroXRoute>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZeroXTransaction {
    pub to: String,
    pub data: String,
    pub value: BaseUnits,
    pub gas: Option<BaseUnits>,
    pub gas_price: BaseUnits,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZeroXRoute {
    #[serde(default)]
    pub fills: Vec<ZeroXFill>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZeroXFill {
    pub source: String,
    pub proportion_bps: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZeroXLiquidityResponse {
    pub liquidity_available: bool,
}
