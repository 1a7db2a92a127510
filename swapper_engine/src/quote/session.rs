use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::{EngineResult, Error};
use crate::quote::TradeQuote;
use crate::quote::aggregate::{AggregatedQuotes, QuoteAggregator};
use crate::swappers::QuoteRequest;

/// Quotes of the latest request, tagged with the token that asked for them
#[derive(Debug, Clone)]
struct SessionQuotes {
    token: u64,
    quotes: AggregatedQuotes,
}

/// Keeps the quotes of the most recent request only.
///
/// Every fetch takes a new token. A result arriving after a newer token was
/// issued is dropped and never becomes the active quote.
#[derive(Clone)]
pub struct QuoteSession {
    aggregator: Arc<QuoteAggregator>,
    latest_token: Arc<AtomicU64>,
    current: Arc<RwLock<Option<SessionQuotes>>>,
}

impl QuoteSession {
    pub fn new(aggregator: Arc<QuoteAggregator>) -> Self {
        QuoteSession {
            aggregator,
            latest_token: Arc::new(AtomicU64::new(0)),
            current: Arc::new(RwLock::new(None)),
        }
    }

    fn issue_token(&self) -> u64 {
        self.latest_token.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn is_current(&self, token: u64) -> bool {
        self.latest_token.load(Ordering::SeqCst) == token
    }

    /// Supersedes whatever is in flight, its results will be discarded
    pub fn cancel(&self) -> u64 {
        self.issue_token()
    }

    /// Fetches quotes for `request`. `Ok(None)` means a newer request superseded this one.
    pub async fn fetch(&self, request: &QuoteRequest) -> EngineResult<Option<AggregatedQuotes>> {
        let token = self.issue_token();
        let result = self.aggregator.get_quotes(request).await;

        let mut current = self.current.write().await;
        if !self.is_current(token) {
            debug!(token, "Discarding quotes of a superseded request");
            return Ok(None);
        }

        match result {
            Ok(quotes) => {
                info!(
                    token,
                    quotes = quotes.ranked.len(),
                    failures = quotes.failures.len(),
                    "Quotes updated"
                );
                *current = Some(SessionQuotes {
                    token,
                    quotes: quotes.clone(),
                });
                Ok(Some(quotes))
            }
            Err(report) => {
                if matches!(report.current_context(), Error::NoQuotesAvailable) {
                    *current = None;
                }
                Err(report)
            }
        }
    }

    pub async fn quotes(&self) -> Option<AggregatedQuotes> {
        self.current
            .read()
            .await
            .as_ref()
            .map(|session| session.quotes.clone())
    }

    /// Best quote of the latest completed request
    pub async fn active_quote(&self) -> Option<TradeQuote> {
        self.current
            .read()
            .await
            .as_ref()
            .and_then(|session| session.quotes.active().cloned())
    }

    pub async fn active_token(&self) -> Option<u64> {
        self.current.read().await.as_ref().map(|session| session.token)
    }
}
