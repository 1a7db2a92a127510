use bigdecimal::BigDecimal;
use error_stack::report;
use num::Zero;
use swapper_models::constants::chains::ChainId;
use swapper_models::models::Asset;
use swapper_models::network::client_rate_limit::Client;
use tracing::debug;

use crate::error::{EngineResult, Error};
use crate::prices::PriceProvider;
use crate::swappers::thorchain::responses::ThornodePool;
use crate::swappers::thorchain::thorchain::thorchain_get_pools;
use crate::utils::units::{DIVISION_DECIMAL_PLACES, bn_div_round, from_thor_base_unit, round_half_up};

/// Pools whose asset is worth one USD, used to price RUNE
pub const USD_STABLE_POOLS: [&str; 4] = [
    "ETH.USDC-0XA0B86991C6218B36C1D19D4A2E9EB0CE3606EB48",
    "ETH.USDT-0XDAC17F958D2EE523A2206206994597C13D831EC7",
    "AVAX.USDC-0XB97EF9EF8734C71904D8002F8B6BC66DD9C48A6E",
    "BSC.USDT-0X55D398326F99059FF775485246999027B3197955",
];

/// USD rates derived from thornode pool depths
pub struct ThorchainPoolsPriceProvider {
    client: Client,
    base_url: String,
}

impl ThorchainPoolsPriceProvider {
    pub fn new(client: Client, base_url: &str) -> Self {
        ThorchainPoolsPriceProvider {
            client,
            base_url: base_url.to_string(),
        }
    }
}

#[async_trait::async_trait]
impl PriceProvider for ThorchainPoolsPriceProvider {
    async fn get_usd_rate(&self, asset: &Asset) -> EngineResult<BigDecimal> {
        let pools = thorchain_get_pools(&self.client, &self.base_url).await?;
        usd_rate_from_pools(&pools, asset)
    }
}

/// Average RUNE price over the available stable pools
pub fn rune_usd_rate(pools: &[ThornodePool]) -> EngineResult<BigDecimal> {
    let rates = pools
        .iter()
        .filter(|pool| pool.is_available() && !pool.balance_rune.is_zero())
        .filter(|pool| USD_STABLE_POOLS.contains(&pool.asset.to_uppercase().as_str()))
        .map(|pool| {
            bn_div_round(
                &from_thor_base_unit(&pool.balance_asset),
                &from_thor_base_unit(&pool.balance_rune),
                DIVISION_DECIMAL_PLACES,
            )
        })
        .collect::<EngineResult<Vec<BigDecimal>>>()?;

    if rates.is_empty() {
        return Err(report!(Error::ResponseError)
            .attach_printable("No available USD stable pool to price RUNE"));
    }

    let total = rates.iter().fold(BigDecimal::zero(), |acc, rate| acc + rate);
    bn_div_round(
        &total,
        &BigDecimal::from(rates.len() as u64),
        DIVISION_DECIMAL_PLACES,
    )
}

pub fn usd_rate_from_pools(pools: &[ThornodePool], asset: &Asset) -> EngineResult<BigDecimal> {
    let rune_usd = rune_usd_rate(pools)?;
    if asset.chain_id == ChainId::Thorchain {
        return Ok(rune_usd);
    }

    let pool_asset = asset.thorchain_pool_asset();
    let pool = pools
        .iter()
        .find(|pool| pool.asset.eq_ignore_ascii_case(&pool_asset) && pool.is_available())
        .ok_or_else(|| {
            report!(Error::NoRouteAvailable(format!(
                "No available THORChain pool for {pool_asset}"
            )))
        })?;

    let price_in_rune = bn_div_round(
        &from_thor_base_unit(&pool.balance_rune),
        &from_thor_base_unit(&pool.balance_asset),
        DIVISION_DECIMAL_PLACES,
    )?;
    let usd_rate = round_half_up(&(price_in_rune * rune_usd), DIVISION_DECIMAL_PLACES)?;

    debug!(pool = %pool_asset, usd_rate = %usd_rate, "Priced asset from THORChain pools");
    Ok(usd_rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::thorchain_fixtures::pools_json;
    use crate::tests::{btc, eth, fox};
    use crate::utils::units::to_plain_string;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn pools() -> Vec<ThornodePool> {
        serde_json::from_value(pools_json()).unwrap()
    }

    #[test]
    fn test_rune_usd_rate_averages_stable_pools() {
        // 2.0 and 1.5 USD per RUNE, the staged USDT pool is ignored
        assert_eq!(to_plain_string(&rune_usd_rate(&pools()).unwrap()), "1.75");
    }

    #[test]
    fn test_usd_rate_from_pools() {
        // 1 ETH = 1000 RUNE
        assert_eq!(
            to_plain_string(&usd_rate_from_pools(&pools(), &eth()).unwrap()),
            "1750"
        );
        // 1 FOX = 0.04 RUNE
        assert_eq!(
            to_plain_string(&usd_rate_from_pools(&pools(), &fox()).unwrap()),
            "0.07"
        );
        let err = usd_rate_from_pools(&pools(), &btc()).unwrap_err();
        assert!(matches!(err.current_context(), Error::NoRouteAvailable(_)));
    }

    #[test]
    fn test_no_stable_pool() {
        let pools: Vec<ThornodePool> = serde_json::from_value(json!([{
            "asset": "ETH.ETH",
            "status": "Available",
            "balance_asset": "100000000",
            "balance_rune": "100000000000"
        }]))
        .unwrap();
        assert!(rune_usd_rate(&pools).is_err());
    }

    #[tokio::test]
    async fn test_price_provider_reads_pools() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/lcd/thorchain/pools"))
            .respond_with(ResponseTemplate::new(200).set_body_json(pools_json()))
            .expect(1)
            .mount(&server)
            .await;

        let provider =
            ThorchainPoolsPriceProvider::new(Client::unrestricted(Duration::from_secs(2)), &server.uri());
        let rate = provider.get_usd_rate(&eth()).await.unwrap();
        assert_eq!(to_plain_string(&rate), "1750");
    }
}
