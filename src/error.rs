use thiserror::Error;

/// Every way a board refresh can fail.
///
/// The board collapses all of these into a single "Error" badge; the
/// variant only matters for the log line.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("client error: {0}")]
    Client(String),

    #[error("request failed: {0}")]
    Transport(String),

    #[error("HTTP {0}")]
    Status(u16),

    #[error("invalid JSON body: {0}")]
    Decode(String),

    #[error("invalid data format: missing version marker")]
    MissingVersion,

    #[error("backend reported: {0}")]
    Backend(String),
}

impl FetchError {
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_decode() {
            FetchError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            FetchError::Status(status.as_u16())
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::FetchError;

    #[test]
    fn messages_name_the_cause() {
        assert_eq!(FetchError::Status(503).to_string(), "HTTP 503");
        assert_eq!(
            FetchError::Backend("maintenance".to_string()).to_string(),
            "backend reported: maintenance"
        );
        assert!(FetchError::MissingVersion.to_string().contains("version"));
    }
}
