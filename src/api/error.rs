use thiserror::Error;

pub const GENERIC_VAULTS_MESSAGE: &str = "Failed to load vaults. Please try again later.";
pub const GENERIC_DETAIL_MESSAGE: &str = "Failed to load vault details.";

#[derive(Error, Debug)]
pub enum FetchError {
    /// Network failure or timeout reaching the backend.
    #[error("transport error: {0}")]
    Transport(String),
    /// The backend answered but reported failure.
    #[error("provider error: {}", .0.as_deref().unwrap_or("no message"))]
    Provider(Option<String>),
    /// The backend answered with a body that could not be decoded.
    #[error("malformed response: {0}")]
    Decode(String),
}

impl FetchError {
    /// Text safe to show to the user. Only provider-supplied messages pass through.
    pub fn user_message(&self, generic: &str) -> String {
        match self {
            FetchError::Provider(Some(message)) => message.clone(),
            FetchError::Provider(None) | FetchError::Transport(_) | FetchError::Decode(_) => {
                generic.to_string()
            }
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            FetchError::Decode(err.to_string())
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Decode(err.to_string())
    }
}
