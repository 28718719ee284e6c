//! HTTP fetch layer.
//!
//! One [`Fetcher`] is built per site from its [`FetchStrategy`]: headers
//! and timeouts live in configuration passed at construction time, not in
//! globals. The contract is deliberately small: `text(url)` returns the
//! body or an error, and every caller treats an error as skip-this-URL.
//!
//! Some origins reject the aggregator User-Agent with 403/406. For those
//! sites the strategy configures an alternate UA which is tried exactly
//! once per request. That is a per-site compatibility workaround, not a
//! retry policy; there is no backoff and no circuit breaking.

use crate::sites::FetchStrategy;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use std::error::Error;
use std::time::Duration;
use tracing::{debug, warn};

pub struct Fetcher {
    client: Client,
    alternate: Option<Client>,
}

fn build_client(
    user_agent: &str,
    strategy: &FetchStrategy,
) -> Result<Client, Box<dyn Error>> {
    let mut headers = HeaderMap::new();
    if let Some(accept) = strategy.accept {
        headers.insert(ACCEPT, HeaderValue::from_static(accept));
    }
    if let Some(lang) = strategy.accept_language {
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(lang));
    }
    let client = Client::builder()
        .user_agent(user_agent)
        .default_headers(headers)
        .timeout(Duration::from_secs(strategy.timeout_secs))
        .build()?;
    Ok(client)
}

impl Fetcher {
    pub fn new(strategy: &FetchStrategy) -> Result<Self, Box<dyn Error>> {
        let client = build_client(strategy.user_agent, strategy)?;
        let alternate = match strategy.alternate_user_agent {
            Some(ua) => Some(build_client(ua, strategy)?),
            None => None,
        };
        Ok(Fetcher { client, alternate })
    }

    /// GET a URL and return the body text. Redirects are followed; any
    /// transport failure or non-2xx status is an error.
    pub async fn text(&self, url: &str) -> Result<String, Box<dyn Error>> {
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if status == StatusCode::FORBIDDEN || status == StatusCode::NOT_ACCEPTABLE {
            if let Some(alternate) = &self.alternate {
                warn!(%url, %status, "Origin rejected default User-Agent; retrying with alternate");
                let retry = alternate.get(url).send().await?.error_for_status()?;
                return Ok(retry.text().await?);
            }
        }

        let body = response.error_for_status()?.text().await?;
        debug!(%url, bytes = body.len(), "Fetched");
        Ok(body)
    }
}
