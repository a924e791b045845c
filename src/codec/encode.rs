/*!
 * Entity to XML encoding. The element tree is rebuilt in schema sequence
 * order from the typed fields, so any message whose required fields are
 * populated serializes to a conformant document.
 */

use crate::codec::EbicsMessage;
use crate::error::EncodeError;
use crate::model::{
    HostVersionRequest, HostVersionResponse, KeyManagementRequest, KeyRequestKind, RequestBody,
    StaticHeader, EBICS_H004_NS, EBICS_HEV_NS,
};
use crate::xml::{self, text, QName, XmlElement};

/// Serialize one message to XML text with a document declaration.
pub fn encode(message: &EbicsMessage) -> Result<String, EncodeError> {
    let tree = encode_tree(message)?;
    xml::write_document(&tree).map_err(|e| EncodeError::Write(e.to_string()))
}

/// Build the element tree for a message without serializing it.
pub fn encode_tree(message: &EbicsMessage) -> Result<XmlElement, EncodeError> {
    match message {
        EbicsMessage::HevRequest(request) => encode_hev_request(request),
        EbicsMessage::HevResponse(response) => encode_hev_response(response),
        EbicsMessage::KeyManagement(request) => encode_key_request(request),
    }
}

fn encode_hev_request(request: &HostVersionRequest) -> Result<XmlElement, EncodeError> {
    let mut root = root_element("ebicsHEVRequest", EBICS_HEV_NS);
    root.push_child(required_text_element(
        "HostID",
        EBICS_HEV_NS,
        request.host_id(),
        "ebicsHEVRequest/HostID",
    )?);
    Ok(root)
}

fn encode_hev_response(response: &HostVersionResponse) -> Result<XmlElement, EncodeError> {
    let mut root = root_element("ebicsHEVResponse", EBICS_HEV_NS);

    let mut return_code = element("SystemReturnCode", EBICS_HEV_NS);
    return_code.push_child(required_text_element(
        "ReturnCode",
        EBICS_HEV_NS,
        response.system_return_code().return_code(),
        "ebicsHEVResponse/SystemReturnCode/ReturnCode",
    )?);
    return_code.push_child(required_text_element(
        "ReportText",
        EBICS_HEV_NS,
        response.system_return_code().report_text(),
        "ebicsHEVResponse/SystemReturnCode/ReportText",
    )?);
    root.push_child(return_code);

    for version in response.version_numbers() {
        let mut el = required_text_element(
            "VersionNumber",
            EBICS_HEV_NS,
            version.value(),
            "ebicsHEVResponse/VersionNumber",
        )?;
        if version.protocol_version().is_empty() {
            return Err(EncodeError::IncompleteRequiredField(
                "ebicsHEVResponse/VersionNumber/@ProtocolVersion".to_string(),
            ));
        }
        el.push_attribute(QName::local("ProtocolVersion"), version.protocol_version());
        root.push_child(el);
    }

    for extension in response.extensions() {
        root.push_child(detached(extension));
    }

    Ok(root)
}

fn encode_key_request(request: &KeyManagementRequest) -> Result<XmlElement, EncodeError> {
    let root_path = request.kind().root_element();
    let mut root = root_element(root_path, EBICS_H004_NS);
    if request.version().is_empty() {
        return Err(EncodeError::IncompleteRequiredField(format!(
            "{}/@Version",
            root_path
        )));
    }
    root.push_attribute(QName::local("Version"), request.version());
    if let Some(revision) = request.revision() {
        root.push_attribute(QName::local("Revision"), revision.to_string());
    }

    let mut header = element("header", EBICS_H004_NS);
    header.push_attribute(
        QName::local("authenticate"),
        text::format_boolean(request.header().authenticate()),
    );
    header.push_child(encode_static_header(
        request.header().static_header(),
        request.kind(),
        root_path,
    )?);
    header.push_child(element("mutable", EBICS_H004_NS));
    root.push_child(header);

    if request.kind().carries_signature() {
        let mut slot = element("AuthSignature", EBICS_H004_NS);
        if let Some(signature) = request.auth_signature() {
            for child in signature.content() {
                slot.push_child(detached(child));
            }
        }
        root.push_child(slot);
    }

    root.push_child(encode_body(request.body(), request.kind(), root_path)?);
    Ok(root)
}

fn encode_static_header(
    header: &StaticHeader,
    kind: KeyRequestKind,
    root_path: &str,
) -> Result<XmlElement, EncodeError> {
    let path = format!("{}/header/static", root_path);
    let mut static_el = element("static", EBICS_H004_NS);

    static_el.push_child(required_text_element(
        "HostID",
        EBICS_H004_NS,
        header.host_id(),
        &format!("{}/HostID", path),
    )?);

    if kind == KeyRequestKind::NoPubKeyDigests {
        let nonce = header.nonce().filter(|n| !n.is_empty()).ok_or_else(|| {
            EncodeError::IncompleteRequiredField(format!("{}/Nonce", path))
        })?;
        static_el.push_child(XmlElement::with_text(
            QName::namespaced("Nonce", EBICS_H004_NS),
            text::encode_hex(nonce),
        ));
        let timestamp = header.timestamp().ok_or_else(|| {
            EncodeError::IncompleteRequiredField(format!("{}/Timestamp", path))
        })?;
        static_el.push_child(XmlElement::with_text(
            QName::namespaced("Timestamp", EBICS_H004_NS),
            text::format_timestamp(timestamp),
        ));
    }

    static_el.push_child(required_text_element(
        "PartnerID",
        EBICS_H004_NS,
        header.partner_id(),
        &format!("{}/PartnerID", path),
    )?);
    static_el.push_child(required_text_element(
        "UserID",
        EBICS_H004_NS,
        header.user_id(),
        &format!("{}/UserID", path),
    )?);

    if let Some(system_id) = header.system_id() {
        static_el.push_child(required_text_element(
            "SystemID",
            EBICS_H004_NS,
            system_id,
            &format!("{}/SystemID", path),
        )?);
    }

    if let Some(product) = header.product() {
        let mut product_el = required_text_element(
            "Product",
            EBICS_H004_NS,
            product.value(),
            &format!("{}/Product", path),
        )?;
        if product.language().is_empty() {
            return Err(EncodeError::IncompleteRequiredField(format!(
                "{}/Product/@Language",
                path
            )));
        }
        product_el.push_attribute(QName::local("Language"), product.language());
        static_el.push_child(product_el);
    }

    let mut order_el = element("OrderDetails", EBICS_H004_NS);
    order_el.push_child(required_text_element(
        "OrderType",
        EBICS_H004_NS,
        header.order_details().order_type(),
        &format!("{}/OrderDetails/OrderType", path),
    )?);
    order_el.push_child(required_text_element(
        "OrderAttribute",
        EBICS_H004_NS,
        header.order_details().order_attribute(),
        &format!("{}/OrderDetails/OrderAttribute", path),
    )?);
    static_el.push_child(order_el);

    static_el.push_child(required_text_element(
        "SecurityMedium",
        EBICS_H004_NS,
        header.security_medium(),
        &format!("{}/SecurityMedium", path),
    )?);

    for extension in header.extensions() {
        static_el.push_child(detached(extension));
    }

    Ok(static_el)
}

fn encode_body(
    body: &RequestBody,
    kind: KeyRequestKind,
    root_path: &str,
) -> Result<XmlElement, EncodeError> {
    let mut body_el = element("body", EBICS_H004_NS);
    match (kind, body) {
        (KeyRequestKind::NoPubKeyDigests, _) => {}
        (_, RequestBody::DataTransfer { order_data }) => {
            let mut transfer = element("DataTransfer", EBICS_H004_NS);
            transfer.push_child(XmlElement::with_text(
                QName::namespaced("OrderData", EBICS_H004_NS),
                order_data.as_str(),
            ));
            body_el.push_child(transfer);
        }
        (_, RequestBody::Empty) => {
            return Err(EncodeError::IncompleteRequiredField(format!(
                "{}/body/DataTransfer",
                root_path
            )));
        }
    }
    Ok(body_el)
}

fn root_element(local: &str, namespace: &'static str) -> XmlElement {
    let mut root = XmlElement::new(QName::namespaced(local, namespace));
    root.push_attribute(QName::local("xmlns"), namespace);
    root
}

fn element(local: &str, namespace: &'static str) -> XmlElement {
    XmlElement::new(QName::namespaced(local, namespace))
}

fn required_text_element(
    local: &str,
    namespace: &'static str,
    value: &str,
    location: &str,
) -> Result<XmlElement, EncodeError> {
    if value.trim().is_empty() {
        return Err(EncodeError::IncompleteRequiredField(location.to_string()));
    }
    Ok(XmlElement::with_text(
        QName::namespaced(local, namespace),
        value,
    ))
}

/// Clone an opaque subtree so it re-emits with its own prefix bindings.
fn detached(element: &XmlElement) -> XmlElement {
    let mut owned = element.clone();
    owned.make_self_contained();
    owned
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::decode;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_encode_hev_request() {
        let message = EbicsMessage::HevRequest(HostVersionRequest::new("EBIXHOST"));
        let xml = encode(&message).unwrap();
        assert!(xml.contains(r#"xmlns="http://www.ebics.org/H000""#));
        assert!(xml.contains("<HostID>EBIXHOST</HostID>"));
    }

    #[test]
    fn test_encode_rejects_empty_host_id() {
        let message = EbicsMessage::HevRequest(HostVersionRequest::new("   "));
        let err = encode(&message).unwrap_err();
        assert!(matches!(err, EncodeError::IncompleteRequiredField(path)
            if path == "ebicsHEVRequest/HostID"));
    }

    #[test]
    fn test_encode_decode_round_trip_no_pub_key_digests() {
        let timestamp = Utc.with_ymd_and_hms(2020, 1, 15, 9, 30, 0).unwrap();
        let request = KeyManagementRequest::no_pub_key_digests(
            "myhost",
            "PARTNER1",
            "USER1",
            vec![0xAB; 16],
            timestamp,
        );
        let message = EbicsMessage::KeyManagement(request);
        let xml = encode(&message).unwrap();
        assert!(xml.contains("<Nonce>ABABABABABABABABABABABABABABABAB</Nonce>"));
        assert!(xml.contains("<Timestamp>2020-01-15T09:30:00Z</Timestamp>"));
        assert_eq!(decode(&xml).unwrap(), message);
    }

    #[test]
    fn test_encode_decode_round_trip_unsecured() {
        let request =
            KeyManagementRequest::unsecured("INI", "myhost", "PARTNER1", "USER1", "eJxLzs8=");
        let message = EbicsMessage::KeyManagement(request);
        let xml = encode(&message).unwrap();
        assert!(!xml.contains("AuthSignature"));
        assert_eq!(decode(&xml).unwrap(), message);
    }

    #[test]
    fn test_encode_unsecured_without_payload_fails() {
        let timestamp = Utc.with_ymd_and_hms(2020, 1, 15, 9, 30, 0).unwrap();
        let base = KeyManagementRequest::no_pub_key_digests(
            "myhost",
            "PARTNER1",
            "USER1",
            vec![0u8; 16],
            timestamp,
        );
        // Rebuild the same fields under an unsecured root, which requires a
        // data transfer body.
        let request = KeyManagementRequest::from_parts(
            KeyRequestKind::Unsecured,
            base.version(),
            base.revision(),
            base.header().clone(),
            None,
            RequestBody::Empty,
        );
        let err = encode(&EbicsMessage::KeyManagement(request)).unwrap_err();
        assert!(matches!(err, EncodeError::IncompleteRequiredField(_)));
    }

    #[test]
    fn test_encode_decode_round_trip_hev_response_with_extension() {
        let mut extra = XmlElement::new(QName::prefixed("v", "Extra", "urn:vendor"));
        extra.push_text("payload");
        let response = HostVersionResponse::new("000000", "[EBICS_OK]")
            .with_version("H004", "02.50")
            .with_extension(extra);
        let message = EbicsMessage::HevResponse(response);
        let xml = encode(&message).unwrap();
        assert!(xml.contains(r#"<v:Extra xmlns:v="urn:vendor">payload</v:Extra>"#));
        assert_eq!(decode(&xml).unwrap(), message);
    }
}
