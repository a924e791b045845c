use thiserror::Error;

/// Failure to assemble a schema bundle. Fatal at startup: a process that
/// cannot build its bundle must not go on to accept documents.
#[derive(Debug, Error)]
pub enum SchemaLoadError {
    #[error("schema source '{path}' is unreadable: {reason}")]
    Unreadable { path: String, reason: String },

    #[error("schema source '{source_name}' is malformed: {reason}")]
    Malformed { source_name: String, reason: String },

    #[error("unresolved type reference '{reference}' in schema for namespace '{namespace}'")]
    UnresolvedReference {
        reference: String,
        namespace: String,
    },

    #[error("invalid pattern facet '{pattern}' in schema for namespace '{namespace}': {reason}")]
    InvalidPattern {
        pattern: String,
        namespace: String,
        reason: String,
    },

    #[error("no schema sources given")]
    NoSources,
}
