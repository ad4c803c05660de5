use thiserror::Error;

/// Failure inside a single provider adapter. Always handled by the router
/// (cache miss + fallback); never surfaced to callers directly.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{provider} returned status {status}")]
    Status { provider: &'static str, status: u16 },

    #[error("{provider} payload could not be decoded: {message}")]
    Decode {
        provider: &'static str,
        message: String,
    },

    #[error("{provider} payload is unusable: {message}")]
    Payload {
        provider: &'static str,
        message: String,
    },
}

/// One failed provider call, recorded while the router works through its
/// degradation path.
#[derive(Debug)]
pub struct ProviderAttempt {
    pub provider: String,
    pub error: FetchError,
}

/// The only error type that crosses the core boundary. Terminal for the
/// request: the router performs no retries beyond the single fallback hop.
#[derive(Debug, Error)]
pub enum WeatherProviderError {
    #[error("invalid forecast request: {0}")]
    InvalidRequest(String),

    #[error("all weather providers failed for {country_code}: {}", summarize(.attempts))]
    Exhausted {
        country_code: String,
        attempts: Vec<ProviderAttempt>,
    },
}

fn summarize(attempts: &[ProviderAttempt]) -> String {
    attempts
        .iter()
        .map(|a| format!("{}: {}", a.provider, a.error))
        .collect::<Vec<_>>()
        .join("; ")
}
