use thiserror::Error;

/// Failure of a request against the plugin endpoint.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server answered with a non-2xx status. `message` holds the response body text,
    /// which may be empty.
    #[error("{url} responded with {status_code}: {message}")]
    Status {
        server_url: String,
        url: String,
        status_code: u16,
        message: String,
    },

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid header '{name}': {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error("Invalid server url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl ClientError {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ClientError::Status { status_code, .. } => Some(*status_code),
            ClientError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
