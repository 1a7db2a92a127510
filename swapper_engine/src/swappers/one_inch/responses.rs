use serde::{Deserialize, Serialize};
use swapper_models::models::BaseUnits;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OneInchSwapResponse {
    pub dst_amount: BaseUnits,
    pub tx: OneInchTx,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OneInchTx {
    pub from: String,
    pub to: String,
    pub data: String,
    pub value: BaseUnits,
    /// Zero when the estimate is disabled
    #[serde(default)]
    pub gas: u64,
    pub gas_price: Option<BaseUnits>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OneInchApproveResponse {
    pub address: String,
}
