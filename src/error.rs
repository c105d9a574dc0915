use std::fmt;

use thiserror::Error;


/// An input that must be non-empty before anything is sent to the server.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum RequiredField {
    ServerAddress,
    Username,
    Password,
    Filter,
}
impl fmt::Display for RequiredField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ServerAddress => write!(f, "server address"),
            Self::Username => write!(f, "username"),
            Self::Password => write!(f, "password"),
            Self::Filter => write!(f, "search filter"),
        }
    }
}


/// Failure of a single session call.
///
/// None of these leave the session unusable; the next call may succeed.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("{field} is required")]
    Validation { field: RequiredField },

    #[error("cannot reach directory server: {reason}")]
    Connection { reason: String },

    #[error("directory server rejected the query: {reason}")]
    Protocol { reason: String },

    #[error("unexpected directory error: {reason}")]
    Unexpected { reason: String },
}
impl SessionError {
    pub fn validation(field: RequiredField) -> Self {
        Self::Validation { field }
    }

    /// Whether the connection that produced this error should be thrown away.
    pub fn invalidates_connection(&self) -> bool {
        matches!(self, Self::Connection { .. } | Self::Unexpected { .. })
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_missing_field() {
        assert_eq!(
            SessionError::validation(RequiredField::ServerAddress).to_string(),
            "server address is required",
        );
        assert_eq!(
            SessionError::validation(RequiredField::Filter).to_string(),
            "search filter is required",
        );
    }

    #[test]
    fn only_transport_failures_drop_the_connection() {
        assert!(SessionError::Connection { reason: "refused".to_owned() }.invalidates_connection());
        assert!(SessionError::Unexpected { reason: "odd".to_owned() }.invalidates_connection());
        assert!(!SessionError::Protocol { reason: "bad filter".to_owned() }.invalidates_connection());
        assert!(!SessionError::validation(RequiredField::Username).invalidates_connection());
    }
}
