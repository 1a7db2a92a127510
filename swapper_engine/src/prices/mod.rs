use bigdecimal::BigDecimal;
use swapper_models::models::Asset;

use crate::error::EngineResult;

pub mod thorchain;

#[async_trait::async_trait]
pub trait PriceProvider: Send + Sync {
    /// USD value of one whole unit of `asset`
    async fn get_usd_rate(&self, asset: &Asset) -> EngineResult<BigDecimal>;
}
