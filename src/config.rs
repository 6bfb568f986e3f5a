use url::Url;

/// Runtime configuration, read from the environment.
///
/// The remote blog API owns all durable state; the only things this
/// application needs to know are where that API lives and how to
/// authenticate against it.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the remote blog API, e.g. "https://blog-api.example.net".
    pub api_url: Url,
    /// Static API key sent with every request.
    pub api_key: String,
    /// Request timeout in seconds for gateway calls.
    pub timeout: u64,
    /// Whether session cookies are marked Secure.
    pub secure_cookies: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let api_url = std::env::var("API_URL").map_err(|_| "API_URL is not set".to_string())?;
        let api_url = Url::parse(&api_url).map_err(|e| format!("API_URL is not a valid URL: {e}"))?;

        let api_key = std::env::var("API_KEY").unwrap_or_default();

        let timeout = std::env::var("API_TIMEOUT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(30);

        let secure_cookies = std::env::var("SECURE_COOKIES")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Ok(Self {
            api_url,
            api_key,
            timeout,
            secure_cookies,
        })
    }
}
