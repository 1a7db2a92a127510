use governor::middleware::NoOpMiddleware;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter, clock::DefaultClock};
use reqwest::Client as ReqwestClient;
use serde::de::DeserializeOwned;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{Error, ModelResult};
use crate::network::RateLimitWindow;
use crate::network::http::{classify_reqwest_error, handle_reqwest_response};
use error_stack::report;

type DirectLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>;

/// HTTP client shared by the quote sources. Every request carries a deadline.
#[derive(Debug, Clone)]
pub enum Client {
    RateLimited(RateLimitedClient),
    Unrestricted {
        inner: ReqwestClient,
        timeout: Duration,
    },
}

impl Client {
    pub fn unrestricted(timeout: Duration) -> Self {
        Client::Unrestricted {
            inner: ReqwestClient::new(),
            timeout,
        }
    }

    pub fn inner_client(&self) -> &ReqwestClient {
        match self {
            Client::RateLimited(rate_limited_client) => &rate_limited_client.inner,
            Client::Unrestricted { inner, .. } => inner,
        }
    }

    pub fn timeout(&self) -> Duration {
        match self {
            Client::RateLimited(rate_limited_client) => rate_limited_client.timeout,
            Client::Unrestricted { timeout, .. } => *timeout,
        }
    }

    /// GET `url` and deserialize the JSON body
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        headers: &[(&str, &str)],
    ) -> ModelResult<T> {
        if let Client::RateLimited(rate_limited_client) = self {
            rate_limited_client.limiter.until_ready().await;
        }

        let mut request = self.inner_client().get(url).timeout(self.timeout());
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        tracing::debug!(url, "Sending GET request");

        let response = request
            .send()
            .await
            .map_err(|e| report!(classify_reqwest_error(&e)))
            .map_err(|e| e.attach_printable(format!("GET {url}")))?;

        handle_reqwest_response(response).await
    }
}

#[derive(Debug, Clone)]
pub struct RateLimitedClient {
    inner: ReqwestClient,
    limiter: Arc<DirectLimiter>,
    timeout: Duration,
}

impl RateLimitedClient {
    pub fn new(
        limit: RateLimitWindow,
        burst: Option<NonZeroU32>,
        timeout: Duration,
    ) -> ModelResult<Self> {
        let mut quota = match limit {
            RateLimitWindow::PerSecond(allowed) => Quota::per_second(allowed),
            RateLimitWindow::PerMinute(allowed) => Quota::per_minute(allowed),
            RateLimitWindow::Custom { period } => Quota::with_period(period).ok_or_else(|| {
                report!(Error::ParseError).attach_printable("Rate limit period must be non-zero")
            })?,
        };
        if let Some(burst) = burst {
            quota = quota.allow_burst(burst);
        }
        Ok(Self {
            inner: ReqwestClient::new(),
            limiter: Arc::new(RateLimiter::direct(quota)),
            timeout,
        })
    }
}
