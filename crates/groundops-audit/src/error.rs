//! Error types for the audit crate.

/// Errors raised while exporting the audit log.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    /// Writing a CSV row failed.
    #[error("CSV export error: {source}")]
    Csv {
        /// Underlying CSV error.
        #[from]
        source: csv::Error,
    },

    /// Flushing the CSV writer failed.
    #[error("CSV flush error: {0}")]
    Flush(String),

    /// JSON serialization failed.
    #[error("JSON export error: {source}")]
    Json {
        /// Underlying JSON error.
        #[from]
        source: serde_json::Error,
    },

    /// The CSV output was not valid UTF-8.
    #[error("export encoding error: {source}")]
    Encoding {
        /// Underlying conversion error.
        #[from]
        source: std::string::FromUtf8Error,
    },
}
