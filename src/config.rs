use std::env;

/// Process-wide configuration, built once in `main` and shared with the
/// handlers through poem's `Data` extension.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_address: String,
    pub redis_url: String,
    /// Deployment-mode switch: when disabled, `/get-audio` is open and no
    /// usage logging happens.
    pub require_api_key: bool,
    /// Explicit yt-dlp binary path. `None` means resolve at startup
    /// (local binary, downloaded binary, or PATH lookup in that order).
    pub yt_dlp_path: Option<String>,
    /// Upper bound on a single yt-dlp invocation, in seconds.
    pub extraction_timeout: u64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "127.0.0.1:3000".to_string()),
            redis_url: env::var("REDIS").unwrap_or_else(|_| "redis://127.0.0.1".to_string()),
            require_api_key: env::var("REQUIRE_API_KEY")
                .map(|v| !matches!(v.to_lowercase().as_str(), "0" | "false" | "no"))
                .unwrap_or(true),
            yt_dlp_path: env::var("YT_DLP_PATH").ok(),
            extraction_timeout: env::var("EXTRACTION_TIMEOUT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
        }
    }
}
