use serde::{Deserialize, Serialize};
use swapper_models::models::BaseUnits;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZeroXGetQuoteRequest {
    pub chain_id: u64,
    pub buy_token: String,
    pub sell_token: String,
    pub sell_amount: BaseUnits,
    pub slippage_bps: u32, // integer [ 0 .. 10000 ]
    pub taker: String,
    pub recipient: Option<String>,
}
