//! Codec error types
//!
//! Error codes:
//! - DIRDB_CODEC_PARSE_ERROR
//! - DIRDB_CODEC_UNSUPPORTED_TYPE
//! - DIRDB_CODEC_MALFORMED_ENVELOPE
//! - DIRDB_CODEC_RESERVED_ATTRIBUTE
//! - DIRDB_CODEC_INVALID_TIMESTAMP
//! - DIRDB_CODEC_OPAQUE_FAILED

use thiserror::Error;

/// Result type for codec operations
pub type CodecResult<T> = Result<T, CodecError>;

/// Codec errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Row text is not valid JSON or not a mapping
    #[error("malformed row content: {0}")]
    Parse(String),

    /// Envelope with a marker this codec does not know
    #[error("unsupported envelope type: {0}")]
    UnsupportedType(String),

    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// Attribute name collides with the envelope marker
    #[error("attribute name '{0}' is reserved")]
    ReservedAttribute(String),

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// Fallback serializer failure
    #[error("opaque value encoding failed: {0}")]
    Opaque(String),
}

impl CodecError {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            CodecError::Parse(_) => "DIRDB_CODEC_PARSE_ERROR",
            CodecError::UnsupportedType(_) => "DIRDB_CODEC_UNSUPPORTED_TYPE",
            CodecError::MalformedEnvelope(_) => "DIRDB_CODEC_MALFORMED_ENVELOPE",
            CodecError::ReservedAttribute(_) => "DIRDB_CODEC_RESERVED_ATTRIBUTE",
            CodecError::InvalidTimestamp(_) => "DIRDB_CODEC_INVALID_TIMESTAMP",
            CodecError::Opaque(_) => "DIRDB_CODEC_OPAQUE_FAILED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(CodecError::Parse("x".into()).code(), "DIRDB_CODEC_PARSE_ERROR");
        assert_eq!(
            CodecError::UnsupportedType("x".into()).code(),
            "DIRDB_CODEC_UNSUPPORTED_TYPE"
        );
        assert_eq!(
            CodecError::ReservedAttribute("_marker".into()).code(),
            "DIRDB_CODEC_RESERVED_ATTRIBUTE"
        );
    }

    #[test]
    fn test_display() {
        let err = CodecError::UnsupportedType("frobnicated".into());
        assert_eq!(err.to_string(), "unsupported envelope type: frobnicated");
    }
}
