pub mod codec_error;
pub mod schema_error;

pub use codec_error::{DecodeError, EncodeError};
pub use schema_error::SchemaLoadError;
