use std::sync::Arc;
use std::time::Duration;

use error_stack::{ResultExt, report};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use swapper_models::network::client_rate_limit::{Client, RateLimitedClient};
use tracing::{debug, warn};

use crate::chain::{ChainAdapters, FeeEstimate};
use crate::config::EngineConfig;
use crate::error::{EngineResult, Error, ReportDisplayExt, from_model_report};
use crate::prices::PriceProvider;
use crate::quote::TradeQuote;
use crate::quote::normalize::normalize_quote;
use crate::swappers::one_inch::OneInchSwapper;
use crate::swappers::thorchain::ThorchainSwapper;
use crate::swappers::zero_x::ZeroXSwapper;
use crate::swappers::{QuoteRequest, RawQuote, Swapper, SwapperName};

/// A source that was asked and failed for a reason other than not serving the pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceFailure {
    pub swapper: SwapperName,
    pub error: Error,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedQuotes {
    /// Best first
    pub ranked: Vec<TradeQuote>,
    pub failures: Vec<SourceFailure>,
}

impl AggregatedQuotes {
    pub fn active(&self) -> Option<&TradeQuote> {
        self.ranked.first()
    }
}

/// Highest buy amount after fees first, the cheaper network fee wins a tie
pub fn rank_quotes(mut quotes: Vec<TradeQuote>) -> Vec<TradeQuote> {
    quotes.sort_by(|a, b| {
        b.buy_amount_after_fees
            .cmp(&a.buy_amount_after_fees)
            .then_with(|| a.fee_data.network_fee.cmp(&b.fee_data.network_fee))
    });
    quotes
}

async fn with_deadline<T>(
    deadline: Duration,
    what: &str,
    future: impl Future<Output = EngineResult<T>>,
) -> EngineResult<T> {
    tokio::time::timeout(deadline, future)
        .await
        .map_err(|_| {
            report!(Error::TransportFailure(format!(
                "{what} timed out after {}ms",
                deadline.as_millis()
            )))
        })?
}

pub struct QuoteAggregator {
    swappers: Vec<Arc<dyn Swapper>>,
    adapters: ChainAdapters,
    config: EngineConfig,
}

impl QuoteAggregator {
    pub fn new(adapters: ChainAdapters, config: EngineConfig) -> Self {
        QuoteAggregator {
            swappers: Vec::new(),
            adapters,
            config,
        }
    }

    pub fn with_swapper(mut self, swapper: Arc<dyn Swapper>) -> Self {
        self.swappers.push(swapper);
        self
    }

    /// Every source the config can reach, sharing one HTTP client
    pub fn from_config(
        config: EngineConfig,
        adapters: ChainAdapters,
        prices: Arc<dyn PriceProvider>,
    ) -> EngineResult<Self> {
        let client = match config.source_rate_limit {
            Some(window) => Client::RateLimited(
                RateLimitedClient::new(window, None, config.quote_timeout)
                    .map_err(from_model_report)
                    .attach_printable("Invalid source rate limit")?,
            ),
            None => Client::unrestricted(config.quote_timeout),
        };

        let thorchain = ThorchainSwapper::new(client.clone(), &config.thornode_url, prices);
        let zero_x = ZeroXSwapper::new(
            client.clone(),
            &config.zero_x_url,
            config.zero_x_api_key.clone(),
        );
        let one_inch = OneInchSwapper::new(client, &config.one_inch_url, config.one_inch_api_key.clone());

        Ok(QuoteAggregator::new(adapters, config)
            .with_swapper(Arc::new(thorchain))
            .with_swapper(Arc::new(zero_x))
            .with_swapper(Arc::new(one_inch)))
    }

    pub fn swappers(&self) -> Vec<SwapperName> {
        self.swappers.iter().map(|swapper| swapper.name()).collect()
    }

    async fn estimate_fee(&self, request: &QuoteRequest, raw: &RawQuote) -> EngineResult<FeeEstimate> {
        let adapter = self.adapters.get(request.sell_asset.chain_id)?;
        let input = raw.execution_data().to_transaction_input(
            &request.account_id,
            request.account_number,
            &request.sell_asset,
            &request.sell_amount,
        )?;
        with_deadline(
            self.config.fee_estimate_timeout,
            "Fee estimate",
            adapter.estimate_fee(&input),
        )
        .await
    }

    /// Fetch, fee estimate and normalization of a single source
    pub async fn quote_from(
        &self,
        swapper: &dyn Swapper,
        request: &QuoteRequest,
    ) -> EngineResult<TradeQuote> {
        let name = swapper.name();
        let raw = with_deadline(
            self.config.quote_timeout,
            &format!("{name} quote"),
            swapper.fetch_quote(request),
        )
        .await?;

        let fee_estimate = self.estimate_fee(request, &raw).await?;
        normalize_quote(
            request,
            &raw,
            &fee_estimate,
            self.config.affiliate_bps_for(name),
        )
        .attach_printable_lazy(|| format!("Normalizing {name} quote"))
    }

    /// Asks every source serving the pair at once and ranks what comes back
    pub async fn get_quotes(&self, request: &QuoteRequest) -> EngineResult<AggregatedQuotes> {
        let candidates: Vec<&Arc<dyn Swapper>> = self
            .swappers
            .iter()
            .filter(|swapper| swapper.supports(&request.sell_asset, &request.buy_asset))
            .collect();

        debug!(
            sell_asset = %request.sell_asset.asset_id,
            buy_asset = %request.buy_asset.asset_id,
            sell_amount = %request.sell_amount,
            sources = candidates.len(),
            "Fetching quotes"
        );

        let results = join_all(candidates.iter().copied().map(|swapper| async move {
            (swapper.name(), self.quote_from(swapper.as_ref(), request).await)
        }))
        .await;

        let mut quotes = Vec::new();
        let mut failures = Vec::new();
        for (swapper, result) in results {
            match result {
                Ok(quote) => quotes.push(quote),
                Err(report) => match report.current_context() {
                    Error::NoRouteAvailable(reason) => {
                        debug!(%swapper, %reason, "Source has no route");
                    }
                    error => {
                        warn!(%swapper, error = %report.format(), "Source failed to quote");
                        failures.push(SourceFailure {
                            swapper,
                            error: error.clone(),
                            message: report.format(),
                        });
                    }
                },
            }
        }

        if quotes.is_empty() {
            return Err(report!(Error::NoQuotesAvailable).attach_printable(format!(
                "{} of {} sources failed",
                failures.len(),
                candidates.len()
            )));
        }

        Ok(AggregatedQuotes {
            ranked: rank_quotes(quotes),
            failures,
        })
    }
}
