use std::fmt;

/// Failure of a call to the user-management API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The request never reached the server, or its response was unusable.
    Network(String),
    /// HTTP 401 on an authenticated call: the session token is no longer valid.
    Unauthorized,
    /// Any other non-2xx status, carrying the server message.
    Api { status: u16, message: String },
    /// An authenticated call was attempted without a session token.
    MissingToken,
}

impl ApiError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Network(e) => write!(f, "Unable to reach the server: {e}"),
            ApiError::Unauthorized => write!(f, "Session expired. Please log in again."),
            ApiError::Api { message, .. } => f.write_str(message),
            ApiError::MissingToken => {
                write!(f, "No authentication token found. Please login again.")
            }
        }
    }
}

impl std::error::Error for ApiError {}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        ApiError::Network(e.to_string())
    }
}
