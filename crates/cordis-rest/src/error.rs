//! Mapping HTTP failures onto `DomainError`

use std::time::Duration;

use cordis_core::DomainError;
use reqwest::StatusCode;
use serde::Deserialize;

use crate::routes::Route;

/// JSON error body the API returns on non-2xx responses
#[derive(Debug, Default, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub code: u64,
    #[serde(default)]
    pub message: String,
}

/// Body of a 429 response
#[derive(Debug, Deserialize)]
pub struct RateLimitBody {
    /// Seconds, fractional
    pub retry_after: f64,
    #[serde(default)]
    pub global: bool,
}

/// Longest wait honoured for a single 429
pub const MAX_RETRY_AFTER: Duration = Duration::from_secs(60);

impl RateLimitBody {
    /// `retry_after` as a duration, clamped to `[0, MAX_RETRY_AFTER]`
    pub fn delay(&self) -> Duration {
        if self.retry_after.is_nan() || self.retry_after <= 0.0 {
            return Duration::ZERO;
        }
        Duration::try_from_secs_f64(self.retry_after)
            .map_or(MAX_RETRY_AFTER, |delay| delay.min(MAX_RETRY_AFTER))
    }
}

/// Translate a failed response into a domain error
///
/// A 404 on a route with a specific "unknown entity" meaning maps to that
/// variant. Everything else keeps status, vendor code and message in `Api`.
pub fn map_status(route: &Route, status: StatusCode, body: &[u8]) -> DomainError {
    if status == StatusCode::NOT_FOUND {
        if let Some(err) = route.not_found() {
            return err;
        }
    }

    let parsed: ApiErrorBody = serde_json::from_slice(body).unwrap_or_default();
    let message = if parsed.message.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_string()
    } else {
        parsed.message
    };

    DomainError::Api {
        status: status.as_u16(),
        code: parsed.code,
        message,
    }
}

pub fn transport(err: &reqwest::Error) -> DomainError {
    DomainError::Transport(err.to_string())
}
