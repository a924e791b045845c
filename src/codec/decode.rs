/*!
 * XML to entity decoding. The root element name and namespace select the
 * message kind; everything below it is pulled out field by field.
 */

use crate::codec::EbicsMessage;
use crate::error::DecodeError;
use crate::model::{
    HostVersionRequest, HostVersionResponse, KeyManagementRequest, KeyRequestKind, OrderDetails,
    Product, RequestBody, RequestHeader, SignaturePlaceholder, StaticHeader, SystemReturnCode,
    EBICS_H004_NS, EBICS_HEV_NS,
};
use crate::xml::{self, text, XmlElement};

/// Decode one EBICS document from XML text.
pub fn decode(input: &str) -> Result<EbicsMessage, DecodeError> {
    let root =
        xml::parse_document(input).map_err(|e| DecodeError::MalformedXml(e.to_string()))?;
    decode_tree(&root)
}

/// Decode from an already-parsed element tree.
pub fn decode_tree(root: &XmlElement) -> Result<EbicsMessage, DecodeError> {
    let namespace = root.name.namespace.as_deref().unwrap_or("");
    match (namespace, root.name.local.as_str()) {
        (EBICS_HEV_NS, "ebicsHEVRequest") => {
            decode_hev_request(root).map(EbicsMessage::HevRequest)
        }
        (EBICS_HEV_NS, "ebicsHEVResponse") => {
            decode_hev_response(root).map(EbicsMessage::HevResponse)
        }
        (EBICS_H004_NS, local) => match KeyRequestKind::from_root_element(local) {
            Some(kind) => decode_key_request(root, kind).map(EbicsMessage::KeyManagement),
            None => Err(DecodeError::UnknownRootElement(root.name.qualified())),
        },
        _ => Err(DecodeError::UnknownRootElement(root.name.qualified())),
    }
}

fn decode_hev_request(root: &XmlElement) -> Result<HostVersionRequest, DecodeError> {
    let path = "ebicsHEVRequest";
    let host_id = required_text(require_child(root, EBICS_HEV_NS, "HostID", path)?, path)?;
    Ok(HostVersionRequest::new(host_id))
}

fn decode_hev_response(root: &XmlElement) -> Result<HostVersionResponse, DecodeError> {
    let path = "ebicsHEVResponse";
    let src = require_child(root, EBICS_HEV_NS, "SystemReturnCode", path)?;
    let src_path = "ebicsHEVResponse/SystemReturnCode";
    let return_code =
        required_text(require_child(src, EBICS_HEV_NS, "ReturnCode", src_path)?, src_path)?;
    let report_text =
        required_normalized_text(require_child(src, EBICS_HEV_NS, "ReportText", src_path)?, src_path)?;

    let mut response =
        HostVersionResponse::from_return_code(SystemReturnCode::new(return_code, report_text));

    for version in root.children_named(EBICS_HEV_NS, "VersionNumber") {
        let version_path = "ebicsHEVResponse/VersionNumber";
        let protocol = require_attribute(version, "ProtocolVersion", version_path)?;
        let value = required_text(version, version_path)?;
        response = response.with_version(protocol, value);
    }

    for extension in foreign_children(root, EBICS_HEV_NS) {
        response = response.with_extension(extension);
    }

    Ok(response)
}

fn decode_key_request(
    root: &XmlElement,
    kind: KeyRequestKind,
) -> Result<KeyManagementRequest, DecodeError> {
    let root_path = kind.root_element();
    let version = require_attribute(root, "Version", root_path)?;
    let revision = match root.attribute("Revision") {
        Some(raw) => Some(text::collapse(raw).parse::<i32>().map_err(|_| {
            DecodeError::InvalidValue {
                location: format!("{}/@Revision", root_path),
                reason: format!("'{}' is not an integer", text::collapse(raw)),
            }
        })?),
        None => None,
    };

    let header_el = require_child(root, EBICS_H004_NS, "header", root_path)?;
    let header_path = format!("{}/header", root_path);
    let authenticate_raw = require_attribute(header_el, "authenticate", &header_path)?;
    let authenticate =
        text::parse_boolean(&authenticate_raw).ok_or_else(|| DecodeError::InvalidValue {
            location: format!("{}/@authenticate", header_path),
            reason: format!("'{}' is not a boolean", authenticate_raw),
        })?;

    let static_el = require_child(header_el, EBICS_H004_NS, "static", &header_path)?;
    let static_header = decode_static_header(static_el, kind, &header_path)?;
    require_child(header_el, EBICS_H004_NS, "mutable", &header_path)?;

    let auth_signature = if kind.carries_signature() {
        let slot = require_child(root, EBICS_H004_NS, "AuthSignature", root_path)?;
        let content: Vec<XmlElement> = slot.child_elements().cloned().collect();
        Some(SignaturePlaceholder::from_content(content))
    } else {
        None
    };

    let body_el = require_child(root, EBICS_H004_NS, "body", root_path)?;
    let body = decode_body(body_el, kind, root_path)?;

    Ok(KeyManagementRequest::from_parts(
        kind,
        version,
        revision,
        RequestHeader::new(authenticate, static_header),
        auth_signature,
        body,
    ))
}

fn decode_static_header(
    static_el: &XmlElement,
    kind: KeyRequestKind,
    header_path: &str,
) -> Result<StaticHeader, DecodeError> {
    let path = format!("{}/static", header_path);
    let host_id = required_text(require_child(static_el, EBICS_H004_NS, "HostID", &path)?, &path)?;
    let partner_id =
        required_text(require_child(static_el, EBICS_H004_NS, "PartnerID", &path)?, &path)?;
    let user_id = required_text(require_child(static_el, EBICS_H004_NS, "UserID", &path)?, &path)?;

    let order_el = require_child(static_el, EBICS_H004_NS, "OrderDetails", &path)?;
    let order_path = format!("{}/OrderDetails", path);
    let order_type = required_text(
        require_child(order_el, EBICS_H004_NS, "OrderType", &order_path)?,
        &order_path,
    )?;
    let order_attribute = required_text(
        require_child(order_el, EBICS_H004_NS, "OrderAttribute", &order_path)?,
        &order_path,
    )?;

    let security_medium = required_text(
        require_child(static_el, EBICS_H004_NS, "SecurityMedium", &path)?,
        &path,
    )?;

    let mut static_header = StaticHeader::new(
        host_id,
        partner_id,
        user_id,
        OrderDetails::new(order_type, order_attribute),
        security_medium,
    );

    if kind == KeyRequestKind::NoPubKeyDigests {
        let nonce_el = require_child(static_el, EBICS_H004_NS, "Nonce", &path)?;
        let nonce = text::decode_hex(&nonce_el.text()).map_err(|e| DecodeError::InvalidValue {
            location: format!("{}/Nonce", path),
            reason: e.to_string(),
        })?;
        let timestamp_el = require_child(static_el, EBICS_H004_NS, "Timestamp", &path)?;
        let timestamp = text::parse_timestamp(&timestamp_el.text()).map_err(|e| {
            DecodeError::InvalidValue {
                location: format!("{}/Timestamp", path),
                reason: e.to_string(),
            }
        })?;
        static_header = static_header.with_nonce(nonce).with_timestamp(timestamp);
    }

    if let Some(system_el) = static_el.child(EBICS_H004_NS, "SystemID") {
        static_header = static_header.with_system_id(required_text(system_el, &path)?);
    }

    if let Some(product_el) = static_el.child(EBICS_H004_NS, "Product") {
        let product_path = format!("{}/Product", path);
        let language = require_attribute(product_el, "Language", &product_path)?;
        let value = required_normalized_text(product_el, &product_path)?;
        static_header = static_header.with_product(Product::new(value, language));
    }

    for extension in foreign_children(static_el, EBICS_H004_NS) {
        static_header = static_header.with_extension(extension);
    }

    Ok(static_header)
}

fn decode_body(
    body_el: &XmlElement,
    kind: KeyRequestKind,
    root_path: &str,
) -> Result<RequestBody, DecodeError> {
    match kind {
        KeyRequestKind::NoPubKeyDigests => Ok(RequestBody::Empty),
        KeyRequestKind::Unsecured | KeyRequestKind::Unsigned => {
            let body_path = format!("{}/body", root_path);
            let transfer = require_child(body_el, EBICS_H004_NS, "DataTransfer", &body_path)?;
            let transfer_path = format!("{}/DataTransfer", body_path);
            let order_data =
                require_child(transfer, EBICS_H004_NS, "OrderData", &transfer_path)?;
            // OrderData is an opaque payload string, taken verbatim.
            Ok(RequestBody::DataTransfer {
                order_data: order_data.text(),
            })
        }
    }
}

fn require_child<'a>(
    parent: &'a XmlElement,
    namespace: &str,
    local: &str,
    parent_path: &str,
) -> Result<&'a XmlElement, DecodeError> {
    parent.child(namespace, local).ok_or_else(|| {
        DecodeError::MissingRequiredField(format!("{}/{}", parent_path, local))
    })
}

fn require_attribute(
    element: &XmlElement,
    local: &str,
    element_path: &str,
) -> Result<String, DecodeError> {
    match element.attribute(local) {
        Some(value) => Ok(text::collapse(value)),
        None => Err(DecodeError::MissingRequiredField(format!(
            "{}/@{}",
            element_path, local
        ))),
    }
}

/// Collapsed text content; a required element that collapses to nothing
/// carries no usable value.
fn required_text(element: &XmlElement, parent_path: &str) -> Result<String, DecodeError> {
    let value = text::collapse(&element.text());
    if value.is_empty() {
        return Err(DecodeError::InvalidValue {
            location: format!("{}/{}", parent_path, element.name.local),
            reason: "element has no text content".to_string(),
        });
    }
    Ok(value)
}

/// Text content of a `normalizedString` element. Tabs and line breaks
/// become spaces but interior runs of spaces are kept as written, so
/// re-encoding reproduces the original value.
fn required_normalized_text(
    element: &XmlElement,
    parent_path: &str,
) -> Result<String, DecodeError> {
    let value = text::normalize(&element.text());
    if text::collapse(&value).is_empty() {
        return Err(DecodeError::InvalidValue {
            location: format!("{}/{}", parent_path, element.name.local),
            reason: "element has no text content".to_string(),
        });
    }
    Ok(value)
}

/// Children outside the given namespace, detached and made re-emittable
/// on their own.
fn foreign_children(parent: &XmlElement, namespace: &str) -> Vec<XmlElement> {
    parent
        .child_elements()
        .filter(|el| el.name.namespace.as_deref() != Some(namespace))
        .map(|el| {
            let mut owned = el.clone();
            owned.make_self_contained();
            owned
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_hev_request() {
        let doc = r#"<?xml version="1.0" encoding="UTF-8"?>
            <ebicsHEVRequest xmlns="http://www.ebics.org/H000">
                <HostID>EBIXHOST</HostID>
            </ebicsHEVRequest>"#;
        let message = decode(doc).unwrap();
        match message {
            EbicsMessage::HevRequest(request) => assert_eq!(request.host_id(), "EBIXHOST"),
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_decode_hev_response_with_versions() {
        let doc = r#"<ebicsHEVResponse xmlns="http://www.ebics.org/H000">
                <SystemReturnCode>
                    <ReturnCode>000000</ReturnCode>
                    <ReportText>[EBICS_OK]</ReportText>
                </SystemReturnCode>
                <VersionNumber ProtocolVersion="H004">02.50</VersionNumber>
                <VersionNumber ProtocolVersion="H005">03.00</VersionNumber>
            </ebicsHEVResponse>"#;
        let message = decode(doc).unwrap();
        match message {
            EbicsMessage::HevResponse(response) => {
                assert_eq!(response.system_return_code().return_code(), "000000");
                assert_eq!(response.version_numbers().len(), 2);
                assert_eq!(response.version_numbers()[1].protocol_version(), "H005");
                assert_eq!(response.version_numbers()[1].value(), "03.00");
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_decode_unknown_root() {
        let doc = r#"<InvalidRoot/>"#;
        let err = decode(doc).unwrap_err();
        assert!(matches!(err, DecodeError::UnknownRootElement(name) if name == "InvalidRoot"));
    }

    #[test]
    fn test_decode_missing_required_field_names_path() {
        let doc = r#"<ebicsHEVResponse xmlns="http://www.ebics.org/H000"/>"#;
        let err = decode(doc).unwrap_err();
        match err {
            DecodeError::MissingRequiredField(path) => {
                assert_eq!(path, "ebicsHEVResponse/SystemReturnCode");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_decode_malformed_xml() {
        let err = decode("<ebicsHEVRequest>").unwrap_err();
        assert!(matches!(err, DecodeError::MalformedXml(_)));
    }

    #[test]
    fn test_decode_no_pub_key_digests_request() {
        let doc = r#"<ebicsNoPubKeyDigestsRequest xmlns="urn:org:ebics:H004"
                Version="H004" Revision="1">
                <header authenticate="true">
                    <static>
                        <HostID>myhost</HostID>
                        <Nonce>0A0B0C0D0E0F00010203040506070809</Nonce>
                        <Timestamp>2020-01-15T09:30:00Z</Timestamp>
                        <PartnerID>PARTNER1</PartnerID>
                        <UserID>USER1</UserID>
                        <OrderDetails>
                            <OrderType>HPB</OrderType>
                            <OrderAttribute>DZHNN</OrderAttribute>
                        </OrderDetails>
                        <SecurityMedium>0000</SecurityMedium>
                    </static>
                    <mutable/>
                </header>
                <AuthSignature/>
                <body/>
            </ebicsNoPubKeyDigestsRequest>"#;
        let message = decode(doc).unwrap();
        match message {
            EbicsMessage::KeyManagement(request) => {
                assert_eq!(request.kind(), KeyRequestKind::NoPubKeyDigests);
                assert_eq!(request.version(), "H004");
                assert_eq!(request.revision(), Some(1));
                let header = request.header().static_header();
                assert_eq!(header.nonce().map(|n| n.len()), Some(16));
                assert!(header.timestamp().is_some());
                assert!(request.auth_signature().map(|s| s.is_empty()).unwrap_or(false));
                assert_eq!(request.body(), &RequestBody::Empty);
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_decode_rejects_header_without_mutable() {
        let doc = r#"<ebicsNoPubKeyDigestsRequest xmlns="urn:org:ebics:H004" Version="H004">
                <header authenticate="true">
                    <static>
                        <HostID>myhost</HostID>
                        <Nonce>0A0B0C0D0E0F00010203040506070809</Nonce>
                        <Timestamp>2020-01-15T09:30:00Z</Timestamp>
                        <PartnerID>PARTNER1</PartnerID>
                        <UserID>USER1</UserID>
                        <OrderDetails>
                            <OrderType>HPB</OrderType>
                            <OrderAttribute>DZHNN</OrderAttribute>
                        </OrderDetails>
                        <SecurityMedium>0000</SecurityMedium>
                    </static>
                </header>
                <AuthSignature/>
                <body/>
            </ebicsNoPubKeyDigestsRequest>"#;
        let err = decode(doc).unwrap_err();
        match err {
            DecodeError::MissingRequiredField(path) => {
                assert_eq!(path, "ebicsNoPubKeyDigestsRequest/header/mutable");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_decode_report_text_keeps_interior_spacing() {
        let doc = r#"<ebicsHEVResponse xmlns="http://www.ebics.org/H000">
                <SystemReturnCode>
                    <ReturnCode>000000</ReturnCode>
                    <ReportText>[EBICS_OK]  double  spaced</ReportText>
                </SystemReturnCode>
            </ebicsHEVResponse>"#;
        let message = decode(doc).unwrap();
        match message {
            EbicsMessage::HevResponse(response) => {
                assert_eq!(
                    response.system_return_code().report_text(),
                    "[EBICS_OK]  double  spaced"
                );
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_decode_unsecured_request_with_payload() {
        let doc = r#"<ebicsUnsecuredRequest xmlns="urn:org:ebics:H004" Version="H004">
                <header authenticate="true">
                    <static>
                        <HostID>myhost</HostID>
                        <PartnerID>PARTNER1</PartnerID>
                        <UserID>USER1</UserID>
                        <OrderDetails>
                            <OrderType>INI</OrderType>
                            <OrderAttribute>DZNNN</OrderAttribute>
                        </OrderDetails>
                        <SecurityMedium>0000</SecurityMedium>
                    </static>
                    <mutable/>
                </header>
                <body>
                    <DataTransfer>
                        <OrderData>eJxLzs8=</OrderData>
                    </DataTransfer>
                </body>
            </ebicsUnsecuredRequest>"#;
        let message = decode(doc).unwrap();
        match message {
            EbicsMessage::KeyManagement(request) => {
                assert_eq!(request.kind(), KeyRequestKind::Unsecured);
                assert_eq!(request.revision(), None);
                assert!(request.auth_signature().is_none());
                assert_eq!(request.body().order_data(), Some("eJxLzs8="));
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_decode_invalid_nonce_hex() {
        let doc = r#"<ebicsNoPubKeyDigestsRequest xmlns="urn:org:ebics:H004" Version="H004">
                <header authenticate="true">
                    <static>
                        <HostID>myhost</HostID>
                        <Nonce>not-hex</Nonce>
                        <Timestamp>2020-01-15T09:30:00Z</Timestamp>
                        <PartnerID>P</PartnerID>
                        <UserID>U</UserID>
                        <OrderDetails>
                            <OrderType>HPB</OrderType>
                            <OrderAttribute>DZHNN</OrderAttribute>
                        </OrderDetails>
                        <SecurityMedium>0000</SecurityMedium>
                    </static>
                    <mutable/>
                </header>
                <AuthSignature/>
                <body/>
            </ebicsNoPubKeyDigestsRequest>"#;
        let err = decode(doc).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidValue { location, .. }
            if location.ends_with("/Nonce")));
    }

    #[test]
    fn test_decode_collects_foreign_extensions() {
        let doc = r#"<ebicsHEVResponse xmlns="http://www.ebics.org/H000"
                xmlns:v="urn:vendor">
                <SystemReturnCode>
                    <ReturnCode>000000</ReturnCode>
                    <ReportText>ok</ReportText>
                </SystemReturnCode>
                <v:Extra>payload</v:Extra>
            </ebicsHEVResponse>"#;
        let message = decode(doc).unwrap();
        match message {
            EbicsMessage::HevResponse(response) => {
                assert_eq!(response.extensions().len(), 1);
                let extra = &response.extensions()[0];
                assert!(extra.name.matches("urn:vendor", "Extra"));
                // The detached subtree must carry its own prefix binding.
                assert!(extra
                    .attributes
                    .iter()
                    .any(|a| a.name.qualified() == "xmlns:v" && a.value == "urn:vendor"));
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }
}
