use thiserror::Error;

/// Failure of a call to the auth or product service.
///
/// `Display` is what views show in notifications, so the HTTP case renders
/// the server's `detail` verbatim.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    /// The request never produced a response (offline, CORS, DNS).
    #[error("Network error: {0}")]
    Network(String),

    /// Non-2xx response.
    #[error("{detail}")]
    Http { status: u16, detail: String },

    /// 2xx response whose body did not match the expected schema.
    #[error("Unexpected response: {0}")]
    Decode(String),

    #[error("Could not encode request: {0}")]
    Encode(String),

    /// The operation needs a signed-in user.
    #[error("Please log in first")]
    NotAuthenticated,
}

impl ApiError {
    /// Builds the HTTP variant, falling back to a generic status message when
    /// the server sent no detail.
    pub fn http(status: u16, detail: Option<String>) -> Self {
        Self::Http {
            status,
            detail: detail.unwrap_or_else(|| format!("HTTP error! status: {status}")),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<gloo_net::Error> for ApiError {
    fn from(e: gloo_net::Error) -> Self {
        match e {
            gloo_net::Error::SerdeError(e) => Self::Decode(e.to_string()),
            other => Self::Network(other.to_string()),
        }
    }
}

/// Local storage could not be reached or written.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StorageError {
    #[error("local storage is unavailable")]
    Unavailable,

    #[error("local storage rejected {key:?}: {reason}")]
    Write { key: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_shows_server_detail() {
        let err = ApiError::http(400, Some("Invalid Password".into()));
        assert_eq!(err.to_string(), "Invalid Password");
        assert_eq!(err.status(), Some(400));
    }

    #[test]
    fn http_error_without_detail_names_the_status() {
        let err = ApiError::http(502, None);
        assert_eq!(err.to_string(), "HTTP error! status: 502");
        assert_eq!(ApiError::Network("offline".into()).status(), None);
    }
}
