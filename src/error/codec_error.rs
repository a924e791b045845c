use thiserror::Error;

/// Per-message decode failure. The caller treats the single document as
/// malformed and drops it; a partially populated model never escapes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("malformed XML: {0}")]
    MalformedXml(String),

    #[error("unknown root element '{0}'")]
    UnknownRootElement(String),

    #[error("missing required field at {0}")]
    MissingRequiredField(String),

    #[error("invalid value at {location}: {reason}")]
    InvalidValue { location: String, reason: String },
}

/// Per-message encode failure: a message whose required fields are unset
/// (empty after XSD whitespace handling) must not reach the wire.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("required field {0} is empty or unset")]
    IncompleteRequiredField(String),

    #[error("failed to write XML: {0}")]
    Write(String),
}
