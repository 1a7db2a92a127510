use rust_decimal::Decimal;
use swapper_models::models::BaseUnits;

#[derive(Debug, Clone)]
pub struct OneInchSwapRequest {
    pub chain: u64,
    pub src: String,
    pub dst: String,
    pub amount: BaseUnits,
    pub from: String,
    pub origin: String,
    pub receiver: Option<String>,
    /// Percent, `1` means 1%
    pub slippage: Decimal,
}
