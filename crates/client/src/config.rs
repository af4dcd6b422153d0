//! Client configuration
//!
//! Loaded from CLI arguments with environment-variable fallbacks, after a
//! best-effort `.env` bootstrap.

use clap::Parser;

use crate::api::ApiConfig;

/// Connection and logging settings for the Peony client.
#[derive(Debug, Clone, Parser)]
pub struct ClientConfig {
    /// Backend base URL.
    #[arg(long, env = "PEONY_API_URL")]
    pub api_url: String,

    /// Buyer bearer token; omit for guest-only commands.
    #[arg(long, env = "PEONY_API_TOKEN", hide_env_values = true)]
    pub api_token: Option<String>,

    /// Log filter, e.g. `info` or `peony_client=debug`.
    #[arg(long, env = "PEONY_LOG", default_value = "info")]
    pub log: String,
}

impl ClientConfig {
    /// The API connection settings.
    #[must_use]
    pub fn api(&self) -> ApiConfig {
        ApiConfig {
            base_url: self.api_url.trim_end_matches('/').to_owned(),
            auth_token: self.api_token.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_stripped_from_base_url() {
        let config = ClientConfig {
            api_url: "https://api.peony.example/".to_owned(),
            api_token: None,
            log: "info".to_owned(),
        };

        assert_eq!(config.api().base_url, "https://api.peony.example");
    }
}
