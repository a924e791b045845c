//! # ebics-messages
//!
//! Structural model, schema validator and XML codec for the EBICS
//! host-version-exchange (HEV) and key-management message families. This
//! crate covers message structure and schema conformance only: it never
//! computes signatures, encrypts payloads or talks to a bank.
//!
//! ## Quick Start
//!
//! ```rust
//! use ebics_messages::{decode, encode, EbicsMessage, Validator};
//! use ebics_messages::model::HostVersionRequest;
//! use ebics_messages::schema::builtin_bundle;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Build a host-version query and put it on the wire.
//!     let message = EbicsMessage::HevRequest(HostVersionRequest::new("EBIXHOST"));
//!     let xml = encode(&message)?;
//!
//!     // Check schema conformance before trusting inbound text.
//!     let validator = Validator::new(builtin_bundle()?);
//!     validator.validate_text(&xml)?;
//!
//!     let decoded = decode(&xml)?;
//!     assert_eq!(decoded, message);
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod error;
pub mod model;
pub mod schema;
pub mod validator;
pub mod xml;

// Codec exports (wire format layer)
pub use codec::{decode, encode, EbicsMessage};

// Model exports (typed message entities)
pub use model::{
    HostVersionRequest, HostVersionResponse, KeyManagementRequest, KeyRequestKind,
    StaticHeader, SystemReturnCode, VersionNumber,
};

// Schema exports (definition loading and compilation)
pub use schema::{builtin_bundle, SchemaBundle, SchemaLoader};

// Validator exports
pub use validator::{ValidationError, Validator, Violation, ViolationRule};

// Error exports
pub use error::{DecodeError, EncodeError, SchemaLoadError};

/// Prelude module for convenient importing
pub mod prelude {
    pub use crate::codec::{decode, encode, EbicsMessage};
    pub use crate::error::{DecodeError, EncodeError, SchemaLoadError};
    pub use crate::model::{
        HostVersionRequest, HostVersionResponse, KeyManagementRequest, KeyRequestKind,
        OrderDetails, Product, RequestBody, StaticHeader, SystemReturnCode, VersionNumber,
    };
    pub use crate::schema::{builtin_bundle, SchemaBundle, SchemaLoader};
    pub use crate::validator::{ValidationError, Validator, Violation, ViolationRule};
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
