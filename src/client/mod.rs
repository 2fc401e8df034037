pub mod rate_limiter;
pub mod sources;

pub use rate_limiter::{RateBudget, RateLimiter};

use crate::config::HttpConfig;
use crate::error::Result;
use std::time::Duration;

/// Build the shared HTTP client every catalog integration uses.
///
/// One client per process is enough; sources clone the handle (reqwest
/// clients are cheap to clone and share their connection pool).
pub fn build_http_client(config: &HttpConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .redirect(reqwest::redirect::Policy::limited(
            config.max_redirects as usize,
        ))
        .user_agent(config.user_agent.clone())
        .build()
        .map_err(|e| crate::error::Error::InvalidInput {
            field: "http".to_string(),
            reason: format!("failed to build HTTP client: {e}"),
        })?;
    Ok(client)
}
