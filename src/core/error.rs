use thiserror::Error as ThisError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,        // Missing or malformed required input (4xx)
    NotFound,          // By-key lookup matched nothing (404)
    StoreUnavailable,  // Connection or query failure (5xx)
    Timeout,           // Store round-trip exceeded the request deadline (5xx)
    Parse,
    InvalidInput,
    Internal,
}

#[derive(Debug, ThisError)]
#[error("{kind:?}: {context}")]
pub struct Error {
    pub kind: ErrorKind,
    pub context: String,
}

impl Error {
    pub fn new(kind: ErrorKind, context: String) -> Self {
        Error { kind, context }
    }

    pub fn validation(context: impl Into<String>) -> Self {
        Error::new(ErrorKind::Validation, context.into())
    }

    pub fn not_found(context: impl Into<String>) -> Self {
        Error::new(ErrorKind::NotFound, context.into())
    }

    pub fn store_unavailable(context: impl Into<String>) -> Self {
        Error::new(ErrorKind::StoreUnavailable, context.into())
    }

    /// Errors the caller caused; never retried.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::Validation | ErrorKind::NotFound | ErrorKind::InvalidInput | ErrorKind::Parse
        )
    }

    pub fn is_server_error(&self) -> bool {
        !self.is_client_error()
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error {
            kind: ErrorKind::Parse,
            context: err.to_string(),
        }
    }
}

impl From<regex::Error> for Error {
    fn from(err: regex::Error) -> Self {
        Error {
            kind: ErrorKind::InvalidInput,
            context: format!("Regex error: {}", err),
        }
    }
}

impl From<tokio::time::error::Elapsed> for Error {
    fn from(err: tokio::time::error::Elapsed) -> Self {
        Error {
            kind: ErrorKind::Timeout,
            context: format!("Store round-trip {}", err),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_kind_and_context() {
        let err = Error::not_found("no record with slug 'x'");
        assert_eq!(err.to_string(), "NotFound: no record with slug 'x'");
    }

    #[test]
    fn kinds_split_into_client_and_server_classes() {
        assert!(Error::validation("slug is required").is_client_error());
        assert!(Error::not_found("gone").is_client_error());
        assert!(Error::store_unavailable("down").is_server_error());
        assert!(Error::new(ErrorKind::Timeout, "slow".to_string()).is_server_error());
    }

    #[test]
    fn json_errors_map_to_parse() {
        let err: Error = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert_eq!(err.kind, ErrorKind::Parse);
    }
}
