use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication rejected: {0}")]
    Auth(String),

    #[error("Source returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("JSON parse error: {0}")]
    JsonParse(String),

    #[error("Missing credentials: {0}")]
    Credentials(String),
}

impl FetchError {
    /// Auth failures will not get better by retrying the same request.
    pub fn is_auth(&self) -> bool {
        matches!(self, FetchError::Auth(_) | FetchError::Credentials(_))
    }
}
