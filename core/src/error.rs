//! Error types for the BarterUp API client.
//!
//! # Design
//! Three families reach callers: a missing token detected before any
//! request exists (`AuthenticationRequired`), a non-2xx answer from the
//! server (`Http`), and transport or parse failures. `user_message` turns
//! any of them into text a page can show.

/// Shown when the backend cannot be reached at all.
pub const UNREACHABLE_MESSAGE: &str =
    "Backend server tidak tersedia. Pastikan server berjalan di port 8080.";

/// Shown when an error carries no text of its own.
pub const UNKNOWN_ERROR_MESSAGE: &str = "Terjadi kesalahan yang tidak diketahui";

/// Errors returned by `BarterClient` and `ApiService`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The operation needs a bearer token and the credential provider has none.
    #[error("Authentication required")]
    AuthenticationRequired,

    /// The server answered outside the 2xx range. `message` comes from the
    /// payload's `message` or `error` field, else a status-coded fallback.
    #[error("{message}")]
    Http { status: u16, message: String },

    /// The backend could not be reached (refused connection, DNS, socket I/O).
    #[error("{0}")]
    Unreachable(String),

    /// Any other failure inside the transport.
    #[error("{0}")]
    Transport(String),

    /// A success payload did not match the expected envelope shape.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl ApiError {
    /// Status code for `Http` errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Normalize an error into a user-displayable string.
pub fn user_message(error: &ApiError) -> String {
    if let ApiError::Unreachable(_) = error {
        return UNREACHABLE_MESSAGE.to_string();
    }
    let text = error.to_string();
    if text.trim().is_empty() {
        UNKNOWN_ERROR_MESSAGE.to_string()
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreachable_maps_to_fixed_message() {
        let err = ApiError::Unreachable("connection refused".to_string());
        assert_eq!(user_message(&err), UNREACHABLE_MESSAGE);
    }

    #[test]
    fn http_error_shows_server_message() {
        let err = ApiError::Http {
            status: 401,
            message: "Invalid email or password".to_string(),
        };
        assert_eq!(user_message(&err), "Invalid email or password");
        assert_eq!(err.status(), Some(401));
    }

    #[test]
    fn empty_message_falls_back_to_unknown() {
        let err = ApiError::Transport(String::new());
        assert_eq!(user_message(&err), UNKNOWN_ERROR_MESSAGE);
    }

    #[test]
    fn authentication_required_text() {
        assert_eq!(user_message(&ApiError::AuthenticationRequired), "Authentication required");
    }
}
