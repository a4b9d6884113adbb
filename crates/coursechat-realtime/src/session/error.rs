//! Rejections of client events.

use coursechat_core::error::{AppError, ErrorKind};

/// Code sent to a connection replaced by a newer one for the same user.
pub const SESSION_SUPERSEDED: &str = "SESSION_SUPERSEDED";

/// Why a client event was rejected.
///
/// Every variant maps to a stable wire code sent back in an `error` event.
/// A rejection never changes shared state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// The frame could not be decoded as a known event
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    /// A required field is missing or malformed
    #[error("{0}")]
    Malformed(String),

    /// The event requires an authenticated connection
    #[error("Not authenticated")]
    Unauthenticated,

    /// The payload names a different user than the one bound
    #[error("Payload user does not match the authenticated user")]
    IdentityMismatch,

    /// The user is not a member of the room
    #[error("Not a member of room {0}")]
    NotMember(String),

    /// The user already belongs to the maximum number of rooms
    #[error("Room limit of {0} reached")]
    RoomLimit(usize),

    /// The connection has been closed
    #[error("Connection closed")]
    ConnectionClosed,
}

impl SessionError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidMessage(_) => "INVALID_MESSAGE",
            Self::Malformed(_) => "INVALID_PAYLOAD",
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::IdentityMismatch => "IDENTITY_MISMATCH",
            Self::NotMember(_) => "NOT_A_MEMBER",
            Self::RoomLimit(_) => "ROOM_LIMIT",
            Self::ConnectionClosed => "CONNECTION_CLOSED",
        }
    }
}

impl From<AppError> for SessionError {
    fn from(e: AppError) -> Self {
        Self::Malformed(e.message)
    }
}

impl From<SessionError> for AppError {
    fn from(e: SessionError) -> Self {
        let kind = match e {
            SessionError::InvalidMessage(_) | SessionError::Malformed(_) => ErrorKind::Validation,
            SessionError::Unauthenticated => ErrorKind::Authentication,
            SessionError::IdentityMismatch | SessionError::NotMember(_) => {
                ErrorKind::Authorization
            }
            SessionError::RoomLimit(_) => ErrorKind::Conflict,
            SessionError::ConnectionClosed => ErrorKind::NotFound,
        };
        AppError::new(kind, e.to_string())
    }
}
