use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    // Display leaks no upstream detail; the source is kept for logging.
    #[error("Internal server error")]
    Upstream(#[source] anyhow::Error),
}

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    pub fn upstream(err: anyhow::Error) -> Self {
        Error::Upstream(err)
    }

    /// HTTP status the (out of scope) transport layer should map this to.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Validation(_) => 400,
            Error::NotFound(_) => 404,
            Error::Upstream(_) => 500,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
