//! Delay schedule between a socket close and the next connect attempt

use std::time::Duration;

use rand::Rng;

/// How long to wait before reconnecting
///
/// `Constant` is the default. `Backoff` doubles from `base` per consecutive
/// failure, caps at `max`, and adds up to 25% random jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectPolicy {
    Constant(Duration),
    Backoff { base: Duration, max: Duration },
}

impl ReconnectPolicy {
    /// Default fixed delay
    pub const DEFAULT_DELAY: Duration = Duration::from_millis(5000);

    /// Delay before attempt number `attempt` (1 for the first retry)
    pub fn delay(&self, attempt: u32) -> Duration {
        match *self {
            Self::Constant(delay) => delay,
            Self::Backoff { base, max } => {
                let exp = attempt.saturating_sub(1).min(16);
                let raw = base.saturating_mul(1u32 << exp).min(max);
                let jitter_cap = raw.as_millis() as u64 / 4;
                let jitter = if jitter_cap == 0 {
                    0
                } else {
                    rand::thread_rng().gen_range(0..=jitter_cap)
                };
                (raw + Duration::from_millis(jitter)).min(max)
            }
        }
    }

    /// Parse the `CORDIS_RECONNECT_POLICY` value
    pub fn from_name(name: &str, delay: Duration, max: Duration) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "constant" => Some(Self::Constant(delay)),
            "backoff" | "exponential" => Some(Self::Backoff { base: delay, max }),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_constant(&self) -> bool {
        matches!(self, Self::Constant(_))
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::Constant(Self::DEFAULT_DELAY)
    }
}
