use thiserror::Error;

/// Errors raised while compiling a text filter
#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Invalid regex: {0}")]
    InvalidRegex(#[from] regex::Error),

    #[error("Field filter '{0}' is missing a value (expected metadata.<field>:<value>)")]
    MissingFieldValue(String),
}

/// Errors raised while reading exported log events
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Failed to read log file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid JSON document: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_error_display() {
        let err = FilterError::MissingFieldValue("metadata.requestId".to_string());
        assert!(err.to_string().contains("metadata.<field>:<value>"));
    }

    #[test]
    fn test_ingest_error_display() {
        let err = IngestError::Read {
            path: "/tmp/missing.json".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert_eq!(
            err.to_string(),
            "Failed to read log file /tmp/missing.json: not found"
        );
    }
}
