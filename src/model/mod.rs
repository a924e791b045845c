/*!
 * Typed entity graph for the supported EBICS message kinds.
 *
 * Every entity is immutable after construction: values are assembled via
 * factories or builder methods that return new values, or by the codec's
 * decode path. Nothing hands out aliasable internal state.
 */

pub mod hev;
pub mod key_request;

pub use hev::{HostVersionRequest, HostVersionResponse, SystemReturnCode, VersionNumber};
pub use key_request::{
    KeyManagementRequest, KeyRequestKind, MutableHeader, OrderDetails, Product, RequestBody,
    RequestHeader, SignaturePlaceholder, StaticHeader, EBICS_VERSION_H004,
};

/// Namespace of the H000 host-version-exchange schema.
pub const EBICS_HEV_NS: &str = "http://www.ebics.org/H000";

/// Namespace of the H004 protocol schema.
pub const EBICS_H004_NS: &str = "urn:org:ebics:H004";

/// XML-Signature namespace referenced by the authentication slot.
pub const XMLDSIG_NS: &str = "http://www.w3.org/2000/09/xmldsig#";
