//! Gateway error types

use thiserror::Error;
use tokio_tungstenite::tungstenite;

use crate::protocol::CloseCode;

/// Why a connection attempt ended
///
/// None of these reach the caller. Transport faults and closes schedule a
/// reconnect; decode and protocol faults drop the offending frame.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("WebSocket error: {0}")]
    Transport(#[from] tungstenite::Error),

    #[error("Malformed frame: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Protocol violation: {0}")]
    Protocol(String),

    #[error("Timed out opening the gateway socket")]
    ConnectTimeout,

    #[error("Socket closed{}", close_suffix(.0))]
    Closed(Option<CloseCode>),

    #[error("Outbound queue closed")]
    ChannelClosed,
}

impl GatewayError {
    /// Frame-level fault; the frame is dropped and the connection kept
    pub fn is_frame_fault(&self) -> bool {
        matches!(self, Self::Decode(_) | Self::Protocol(_))
    }

    pub fn close_code(&self) -> Option<CloseCode> {
        match self {
            Self::Closed(code) => *code,
            _ => None,
        }
    }

    /// Whether the session survives this failure
    pub fn can_resume(&self) -> bool {
        self.close_code().map_or(true, CloseCode::can_resume)
    }
}

fn close_suffix(code: &Option<CloseCode>) -> String {
    code.map(|c| format!(": {c}")).unwrap_or_default()
}

pub type GatewayResult<T> = Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_close_display() {
        assert_eq!(GatewayError::Closed(None).to_string(), "Socket closed");
        assert_eq!(
            GatewayError::Closed(Some(CloseCode::SessionTimedOut)).to_string(),
            "Socket closed: Session timed out (4009)"
        );
    }

    #[test]
    fn test_resumability() {
        assert!(GatewayError::ConnectTimeout.can_resume());
        assert!(GatewayError::Closed(None).can_resume());
        assert!(GatewayError::Closed(Some(CloseCode::UnknownError)).can_resume());
        assert!(!GatewayError::Closed(Some(CloseCode::InvalidSequence)).can_resume());
        assert!(!GatewayError::Closed(Some(CloseCode::AuthenticationFailed)).can_resume());
    }

    #[test]
    fn test_frame_faults() {
        assert!(GatewayError::Protocol("x".into()).is_frame_fault());
        assert!(!GatewayError::ChannelClosed.is_frame_fault());
    }
}
