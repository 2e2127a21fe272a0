//! Relay configuration parsed from environment variables at cold start.

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_SLACK_API_BASE_URL: &str = "https://slack.com/api";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    pub slack_token: String,
    pub slack_channel_id: String,
    pub slack_api_base_url: String,
    pub port: u16,
    pub timeouts: HttpTimeouts,
}

impl RelayConfig {
    /// Build typed relay config from environment variables.
    ///
    /// - `SLACK_TOKEN`: bot token
    /// - `SLACK_CHANNEL_ID`: target channel
    /// - `SLACK_API_BASE_URL`: default `https://slack.com/api`
    /// - `PORT`: default 8000
    /// - `SLACK_REQUEST_TIMEOUT_SECS`: default 30
    /// - `SLACK_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// Missing Slack credentials are not fatal: the relay starts and every
    /// delivery fails with Slack's own error until they are provided.
    #[must_use]
    pub fn from_env() -> Self {
        let slack_token = env_or_empty("SLACK_TOKEN");
        let slack_channel_id = env_or_empty("SLACK_CHANNEL_ID");
        let slack_api_base_url = std::env::var("SLACK_API_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_SLACK_API_BASE_URL.to_owned())
            .trim_end_matches('/')
            .to_owned();

        Self {
            slack_token,
            slack_channel_id,
            slack_api_base_url,
            port: env_parse("PORT", DEFAULT_PORT),
            timeouts: HttpTimeouts {
                request_secs: env_parse("SLACK_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
                connect_secs: env_parse("SLACK_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
            },
        }
    }
}

fn env_or_empty(key: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| {
        tracing::warn!(var = key, "env var not set; Slack delivery will fail");
        String::new()
    })
}

fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
