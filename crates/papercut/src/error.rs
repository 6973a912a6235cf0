use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid endpoint {url:?}: {reason}")]
    InvalidEndpoint { url: String, reason: String },

    #[error("unsupported endpoint scheme {0:?}, expected http or https")]
    UnsupportedScheme(String),

    #[error("request timed out after {0} ms")]
    Timeout(u64),

    #[error("network error: {0}")]
    Transport(String),

    #[error("HTTP error: {0}")]
    HttpStatus(String),

    #[error("malformed XML-RPC response: {0}")]
    Decode(#[from] xmlrpc::Error),

    #[error("XML-RPC fault: {message}")]
    Fault { code: i32, message: String },
}

impl From<xmlrpc::Fault> for Error {
    fn from(fault: xmlrpc::Fault) -> Self {
        Self::Fault {
            code: fault.code,
            message: fault.message,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
