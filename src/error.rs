//! Error types for the repair core.
//!
//! Repairs themselves never fail: a span that cannot be repaired keeps its
//! original text. Errors only surface at the collaborator seams (glyph
//! sources, extractors), while loading configuration or document models,
//! and when validating configuration values.

/// Result type alias for repair library operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur at the repair core's boundaries.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Bounding box is degenerate or carries non-finite coordinates
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    /// A glyph source query failed
    #[error("Glyph source error on page {page}: {message}")]
    GlyphSource {
        /// Page the query was issued against
        page: u32,
        /// Collaborator-provided reason
        message: String,
    },

    /// Page is not known to the document or glyph source
    #[error("Page not found: {0}")]
    PageNotFound(u32),

    /// An extraction attempt failed in the document pipeline
    #[error("Extraction failed: {0}")]
    Extraction(String),

    /// Configuration value out of range or inconsistent
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A configured pattern failed to compile
    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        /// Pattern text as configured
        pattern: String,
        /// Compilation error
        #[source]
        source: regex::Error,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glyph_source_error() {
        let err = Error::GlyphSource {
            page: 3,
            message: "clip outside page".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("page 3"));
        assert!(msg.contains("clip outside page"));
    }

    #[test]
    fn test_config_error() {
        let err = Error::Config("line_ratio must be positive".to_string());
        let msg = format!("{}", err);
        assert!(msg.contains("Invalid configuration"));
        assert!(msg.contains("line_ratio"));
    }

    #[test]
    fn test_invalid_pattern_error() {
        let source = regex::Regex::new("(unclosed").unwrap_err();
        let err = Error::InvalidPattern {
            pattern: "(unclosed".to_string(),
            source,
        };
        assert!(format!("{}", err).contains("(unclosed"));
    }

    #[test]
    fn test_json_error_conversion() {
        let parse: std::result::Result<serde_json::Value, _> = serde_json::from_str("{");
        let err: Error = parse.unwrap_err().into();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}
