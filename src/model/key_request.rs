/*!
 * Key-management request family: the unauthenticated and
 * pre-authentication messages (HPB retrieval, INI/HIA key submission)
 * that share one static-header field set.
 *
 * The source protocol describes these as a class hierarchy over an
 * abstract static-header base; here the shared field set lives in one
 * struct and a `KeyRequestKind` discriminant selects the variant, so
 * variant handling stays exhaustively checkable.
 */

use crate::xml::XmlElement;
use chrono::{DateTime, Utc};

pub const EBICS_VERSION_H004: &str = "H004";

/// Which root element of the family a request serializes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyRequestKind {
    /// `ebicsNoPubKeyDigestsRequest`: authenticated-scope request sent
    /// before the bank keys are known (HPB). Carries nonce, timestamp and
    /// an authentication-signature slot.
    NoPubKeyDigests,
    /// `ebicsUnsecuredRequest`: INI/HIA key submission, no signature.
    Unsecured,
    /// `ebicsUnsignedRequest`: like unsecured, distinct order attribute.
    Unsigned,
}

impl KeyRequestKind {
    pub fn root_element(&self) -> &'static str {
        match self {
            KeyRequestKind::NoPubKeyDigests => "ebicsNoPubKeyDigestsRequest",
            KeyRequestKind::Unsecured => "ebicsUnsecuredRequest",
            KeyRequestKind::Unsigned => "ebicsUnsignedRequest",
        }
    }

    pub fn from_root_element(local: &str) -> Option<Self> {
        match local {
            "ebicsNoPubKeyDigestsRequest" => Some(KeyRequestKind::NoPubKeyDigests),
            "ebicsUnsecuredRequest" => Some(KeyRequestKind::Unsecured),
            "ebicsUnsignedRequest" => Some(KeyRequestKind::Unsigned),
            _ => None,
        }
    }

    /// Whether the wire form carries an `AuthSignature` slot.
    pub fn carries_signature(&self) -> bool {
        matches!(self, KeyRequestKind::NoPubKeyDigests)
    }
}

/// Order type plus order attribute ("HPB"/"DZHNN", "INI"/"DZNNN", ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDetails {
    order_type: String,
    order_attribute: String,
}

impl OrderDetails {
    pub fn new(order_type: impl Into<String>, order_attribute: impl Into<String>) -> Self {
        Self {
            order_type: crate::xml::text::collapse(&order_type.into()),
            order_attribute: crate::xml::text::collapse(&order_attribute.into()),
        }
    }

    pub fn order_type(&self) -> &str {
        &self.order_type
    }

    pub fn order_attribute(&self) -> &str {
        &self.order_attribute
    }
}

/// Client product label with its required language tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    value: String,
    language: String,
}

impl Product {
    pub fn new(value: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            value: crate::xml::text::normalize(&value.into()),
            language: crate::xml::text::collapse(&language.into()),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn language(&self) -> &str {
        &self.language
    }
}

/// Reserved slot for a detached authentication signature. This layer
/// carries the content verbatim and never computes or verifies anything.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SignaturePlaceholder {
    content: Vec<XmlElement>,
}

impl SignaturePlaceholder {
    /// Empty slot, as emitted before a signature pass fills it.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_content(content: Vec<XmlElement>) -> Self {
        let mut content = content;
        for element in &mut content {
            element.make_self_contained();
        }
        Self { content }
    }

    pub fn content(&self) -> &[XmlElement] {
        &self.content
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// Transaction-phase header. Empty for every message in this family; kept
/// as its own type because the slot itself is required on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MutableHeader;

/// The shared static-header field set: identity, anti-replay fields and
/// order description, invariant within a single message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticHeader {
    host_id: String,
    nonce: Option<Vec<u8>>,
    timestamp: Option<DateTime<Utc>>,
    partner_id: String,
    user_id: String,
    system_id: Option<String>,
    product: Option<Product>,
    order_details: OrderDetails,
    security_medium: String,
    extensions: Vec<XmlElement>,
}

impl StaticHeader {
    pub fn new(
        host_id: impl Into<String>,
        partner_id: impl Into<String>,
        user_id: impl Into<String>,
        order_details: OrderDetails,
        security_medium: impl Into<String>,
    ) -> Self {
        Self {
            host_id: crate::xml::text::collapse(&host_id.into()),
            nonce: None,
            timestamp: None,
            partner_id: crate::xml::text::collapse(&partner_id.into()),
            user_id: crate::xml::text::collapse(&user_id.into()),
            system_id: None,
            product: None,
            order_details,
            security_medium: crate::xml::text::collapse(&security_medium.into()),
            extensions: Vec::new(),
        }
    }

    pub fn with_nonce(mut self, nonce: Vec<u8>) -> Self {
        self.nonce = Some(nonce);
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn with_system_id(mut self, system_id: impl Into<String>) -> Self {
        self.system_id = Some(crate::xml::text::collapse(&system_id.into()));
        self
    }

    pub fn with_product(mut self, product: Product) -> Self {
        self.product = Some(product);
        self
    }

    pub fn with_extension(mut self, element: XmlElement) -> Self {
        let mut element = element;
        element.make_self_contained();
        self.extensions.push(element);
        self
    }

    pub fn host_id(&self) -> &str {
        &self.host_id
    }

    pub fn nonce(&self) -> Option<&[u8]> {
        self.nonce.as_deref()
    }

    pub fn timestamp(&self) -> Option<&DateTime<Utc>> {
        self.timestamp.as_ref()
    }

    pub fn partner_id(&self) -> &str {
        &self.partner_id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn system_id(&self) -> Option<&str> {
        self.system_id.as_deref()
    }

    pub fn product(&self) -> Option<&Product> {
        self.product.as_ref()
    }

    pub fn order_details(&self) -> &OrderDetails {
        &self.order_details
    }

    pub fn security_medium(&self) -> &str {
        &self.security_medium
    }

    pub fn extensions(&self) -> &[XmlElement] {
        &self.extensions
    }
}

/// Request header: the static part, the (empty) mutable part, and the
/// attribute marking the header as part of the authentication scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHeader {
    authenticate: bool,
    static_header: StaticHeader,
    mutable: MutableHeader,
}

impl RequestHeader {
    pub fn new(authenticate: bool, static_header: StaticHeader) -> Self {
        Self {
            authenticate,
            static_header,
            mutable: MutableHeader,
        }
    }

    pub fn authenticate(&self) -> bool {
        self.authenticate
    }

    pub fn static_header(&self) -> &StaticHeader {
        &self.static_header
    }

    pub fn mutable(&self) -> &MutableHeader {
        &self.mutable
    }
}

/// Request body: empty for HPB-style requests, an order-data payload for
/// key submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    Empty,
    DataTransfer { order_data: String },
}

impl RequestBody {
    pub fn order_data(&self) -> Option<&str> {
        match self {
            RequestBody::Empty => None,
            RequestBody::DataTransfer { order_data } => Some(order_data),
        }
    }
}

/// One message of the key-management request family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyManagementRequest {
    kind: KeyRequestKind,
    version: String,
    revision: Option<i32>,
    header: RequestHeader,
    auth_signature: Option<SignaturePlaceholder>,
    body: RequestBody,
}

impl KeyManagementRequest {
    /// Factory for the HPB retrieval request: H004, revision 1, HPB order
    /// with attribute DZHNN, security medium 0000, authenticated scope,
    /// empty body and an empty signature slot.
    pub fn no_pub_key_digests(
        host_id: impl Into<String>,
        partner_id: impl Into<String>,
        user_id: impl Into<String>,
        nonce: Vec<u8>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let static_header = StaticHeader::new(
            host_id,
            partner_id,
            user_id,
            OrderDetails::new("HPB", "DZHNN"),
            "0000",
        )
        .with_nonce(nonce)
        .with_timestamp(timestamp);

        Self {
            kind: KeyRequestKind::NoPubKeyDigests,
            version: EBICS_VERSION_H004.to_string(),
            revision: Some(1),
            header: RequestHeader::new(true, static_header),
            auth_signature: Some(SignaturePlaceholder::empty()),
            body: RequestBody::Empty,
        }
    }

    /// Factory for INI/HIA key submission: unsecured request carrying the
    /// given order type and payload, order attribute DZNNN.
    pub fn unsecured(
        order_type: impl Into<String>,
        host_id: impl Into<String>,
        partner_id: impl Into<String>,
        user_id: impl Into<String>,
        order_data: impl Into<String>,
    ) -> Self {
        let static_header = StaticHeader::new(
            host_id,
            partner_id,
            user_id,
            OrderDetails::new(order_type, "DZNNN"),
            "0000",
        );

        Self {
            kind: KeyRequestKind::Unsecured,
            version: EBICS_VERSION_H004.to_string(),
            revision: Some(1),
            header: RequestHeader::new(true, static_header),
            auth_signature: None,
            body: RequestBody::DataTransfer {
                order_data: order_data.into(),
            },
        }
    }

    /// General constructor for callers assembling a request field by field
    /// (the codec's decode path uses this).
    pub fn from_parts(
        kind: KeyRequestKind,
        version: impl Into<String>,
        revision: Option<i32>,
        header: RequestHeader,
        auth_signature: Option<SignaturePlaceholder>,
        body: RequestBody,
    ) -> Self {
        Self {
            kind,
            version: crate::xml::text::collapse(&version.into()),
            revision,
            header,
            auth_signature,
            body,
        }
    }

    /// Replace the signature slot content, returning the updated value.
    pub fn with_auth_signature(mut self, signature: SignaturePlaceholder) -> Self {
        self.auth_signature = Some(signature);
        self
    }

    pub fn kind(&self) -> KeyRequestKind {
        self.kind
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn revision(&self) -> Option<i32> {
        self.revision
    }

    pub fn header(&self) -> &RequestHeader {
        &self.header
    }

    pub fn auth_signature(&self) -> Option<&SignaturePlaceholder> {
        self.auth_signature.as_ref()
    }

    pub fn body(&self) -> &RequestBody {
        &self.body
    }
}
