/*!
 * Wire codec between XML text and the typed message entities.
 *
 * `decode` is strict about structure (missing required elements and
 * uninterpretable values fail) but does not re-check pattern facets; run
 * the validator first when conformance matters. `encode` always produces
 * documents that pass validation, provided every required field was
 * populated.
 */

pub mod decode;
pub mod encode;

pub use decode::{decode, decode_tree};
pub use encode::{encode, encode_tree};

use crate::model::{HostVersionRequest, HostVersionResponse, KeyManagementRequest};

/// Any message this crate can put on or take off the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EbicsMessage {
    HevRequest(HostVersionRequest),
    HevResponse(HostVersionResponse),
    KeyManagement(KeyManagementRequest),
}

impl EbicsMessage {
    /// Local name of the root element this message serializes to.
    pub fn root_element(&self) -> &'static str {
        match self {
            EbicsMessage::HevRequest(_) => "ebicsHEVRequest",
            EbicsMessage::HevResponse(_) => "ebicsHEVResponse",
            EbicsMessage::KeyManagement(request) => request.kind().root_element(),
        }
    }

    /// Namespace of the root element.
    pub fn namespace(&self) -> &'static str {
        match self {
            EbicsMessage::HevRequest(_) | EbicsMessage::HevResponse(_) => {
                crate::model::EBICS_HEV_NS
            }
            EbicsMessage::KeyManagement(_) => crate::model::EBICS_H004_NS,
        }
    }
}
