/*!
 * Key-management request tests: the HPB, INI/HIA and unsigned request
 * factories, optional header fields, and codec round trips.
 */

use ebics_messages::model::{
    KeyManagementRequest, KeyRequestKind, Product, RequestBody, RequestHeader,
};
use ebics_messages::xml::{QName, XmlElement};
use ebics_messages::{decode, encode, EbicsMessage};
use test_utils::*;

#[test]
fn test_no_pub_key_digests_round_trip() {
    let message = EbicsMessage::KeyManagement(sample_no_pub_key_digests());
    let xml = encode(&message).unwrap();

    assert!(xml.contains(r#"xmlns="urn:org:ebics:H004""#));
    assert!(xml.contains(r#"Version="H004""#));
    assert!(xml.contains(r#"Revision="1""#));
    assert!(xml.contains("<AuthSignature/>"));
    builtin_validator().validate_text(&xml).unwrap();
    assert_eq!(decode(&xml).unwrap(), message);
}

#[test]
fn test_ini_request_round_trip() {
    let message = EbicsMessage::KeyManagement(sample_ini_request());
    let xml = encode(&message).unwrap();

    assert!(xml.contains("<OrderType>INI</OrderType>"));
    assert!(xml.contains("<OrderAttribute>DZNNN</OrderAttribute>"));
    assert!(!xml.contains("AuthSignature"));
    assert!(!xml.contains("Nonce"));
    builtin_validator().validate_text(&xml).unwrap();
    assert_eq!(decode(&xml).unwrap(), message);
}

#[test]
fn test_hia_request_uses_same_wire_shape() {
    let request =
        KeyManagementRequest::unsecured("HIA", "EBIXHOST", "PARTNER1", "USER0001", "cGF5bG9hZA==");
    assert_eq!(request.kind(), KeyRequestKind::Unsecured);

    let xml = encode(&EbicsMessage::KeyManagement(request)).unwrap();
    assert!(xml.contains("<OrderType>HIA</OrderType>"));
    builtin_validator().validate_text(&xml).unwrap();
}

#[test]
fn test_unsigned_request_round_trip() {
    let base = sample_ini_request();
    let request = KeyManagementRequest::from_parts(
        KeyRequestKind::Unsigned,
        base.version(),
        base.revision(),
        base.header().clone(),
        None,
        base.body().clone(),
    );
    let message = EbicsMessage::KeyManagement(request);
    let xml = encode(&message).unwrap();

    assert!(xml.contains("<ebicsUnsignedRequest"));
    builtin_validator().validate_text(&xml).unwrap();
    assert_eq!(decode(&xml).unwrap(), message);
}

#[test]
fn test_optional_header_fields_round_trip() {
    let base = sample_no_pub_key_digests();
    let static_header = base
        .header()
        .static_header()
        .clone()
        .with_system_id("SYS01")
        .with_product(Product::new("Example Client 1.0", "de"));
    let request = KeyManagementRequest::from_parts(
        base.kind(),
        base.version(),
        base.revision(),
        RequestHeader::new(base.header().authenticate(), static_header),
        base.auth_signature().cloned(),
        base.body().clone(),
    );
    let message = EbicsMessage::KeyManagement(request);
    let xml = encode(&message).unwrap();

    assert!(xml.contains("<SystemID>SYS01</SystemID>"));
    assert!(xml.contains(r#"<Product Language="de">Example Client 1.0</Product>"#));
    builtin_validator().validate_text(&xml).unwrap();
    assert_eq!(decode(&xml).unwrap(), message);
}

#[test]
fn test_static_header_extension_round_trip() {
    let base = sample_no_pub_key_digests();
    let mut extra = XmlElement::new(QName::prefixed("v", "Trace", "urn:vendor:trace"));
    extra.push_text("abc123");
    let static_header = base.header().static_header().clone().with_extension(extra);
    let request = KeyManagementRequest::from_parts(
        base.kind(),
        base.version(),
        base.revision(),
        RequestHeader::new(base.header().authenticate(), static_header),
        base.auth_signature().cloned(),
        base.body().clone(),
    );
    let message = EbicsMessage::KeyManagement(request);
    let xml = encode(&message).unwrap();

    assert!(xml.contains(r#"<v:Trace xmlns:v="urn:vendor:trace">abc123</v:Trace>"#));
    builtin_validator().validate_text(&xml).unwrap();
    assert_eq!(decode(&xml).unwrap(), message);
}

#[test]
fn test_factory_defaults_match_protocol_conventions() {
    let request = sample_no_pub_key_digests();
    let header = request.header().static_header();

    assert_eq!(request.version(), "H004");
    assert_eq!(request.revision(), Some(1));
    assert!(request.header().authenticate());
    assert_eq!(header.order_details().order_type(), "HPB");
    assert_eq!(header.order_details().order_attribute(), "DZHNN");
    assert_eq!(header.security_medium(), "0000");
    assert_eq!(request.body(), &RequestBody::Empty);

    let ini = sample_ini_request();
    assert_eq!(ini.header().static_header().order_details().order_attribute(), "DZNNN");
    assert!(ini.body().order_data().is_some());
}
