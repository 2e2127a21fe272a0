//! Supabase configuration parsed from environment variables.

use super::BackendError;

pub const DEFAULT_PROFILE_BUCKET: &str = "profiles";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupabaseConfig {
    /// Project URL without trailing slash, e.g. `https://abc.supabase.co`.
    pub url: String,
    /// Public anon key sent as `apikey` on every request.
    pub anon_key: String,
    /// Storage bucket holding avatar files.
    pub profile_bucket: String,
    pub timeouts: HttpTimeouts,
}

impl SupabaseConfig {
    /// Build typed config from environment variables.
    ///
    /// Required:
    /// - `SUPABASE_URL`
    /// - `SUPABASE_ANON_KEY`
    ///
    /// Optional:
    /// - `SUPABASE_PROFILE_BUCKET`: default `profiles`
    /// - `SUPABASE_REQUEST_TIMEOUT_SECS`: default 30
    /// - `SUPABASE_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::MissingConfig`] if a required variable is
    /// unset, or [`BackendError::ConfigParse`] if the URL is not http(s).
    pub fn from_env() -> Result<Self, BackendError> {
        let url = required("SUPABASE_URL")?;
        let anon_key = required("SUPABASE_ANON_KEY")?;
        let profile_bucket =
            std::env::var("SUPABASE_PROFILE_BUCKET").unwrap_or_else(|_| DEFAULT_PROFILE_BUCKET.to_owned());
        let timeouts = HttpTimeouts {
            request_secs: env_parse_u64("SUPABASE_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse_u64("SUPABASE_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        };
        Self::new(&url, anon_key, profile_bucket, timeouts)
    }

    /// Build config from explicit values.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::ConfigParse`] if `url` is not http(s).
    pub fn new(url: &str, anon_key: String, profile_bucket: String, timeouts: HttpTimeouts) -> Result<Self, BackendError> {
        let url = url.trim().trim_end_matches('/').to_owned();
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(BackendError::ConfigParse(format!("SUPABASE_URL must be http(s): {url}")));
        }
        Ok(Self { url, anon_key, profile_bucket, timeouts })
    }
}

fn required(key: &str) -> Result<String, BackendError> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| BackendError::MissingConfig { var: key.to_owned() })
}

fn env_parse_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
