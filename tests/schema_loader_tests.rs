/*!
 * Schema loader tests: loading definitions from files, composing several
 * namespaces into one bundle, and the load-time failure modes.
 */

use ebics_messages::error::SchemaLoadError;
use ebics_messages::schema::{builtin_bundle, SchemaLoader};
use std::fs;

const VENDOR_SCHEMA: &str = r#"{
    "namespace": "urn:vendor:test",
    "roots": { "report": "ReportType" },
    "types": {
        "ReportType": {
            "kind": "complex",
            "children": [
                { "name": "Code", "type": "CodeType" }
            ]
        },
        "CodeType": { "kind": "simple", "base": "token", "pattern": "[0-9]{4}" }
    }
}"#;

#[test]
fn test_load_schema_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vendor.json");
    fs::write(&path, VENDOR_SCHEMA).unwrap();

    let bundle = SchemaLoader::load(&[&path]).unwrap();
    assert!(bundle.is_known_root("urn:vendor:test", "report"));
    assert_eq!(bundle.root_count(), 1);
}

#[test]
fn test_load_rejects_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("does-not-exist.json");
    let err = SchemaLoader::load(&[&path]).unwrap_err();
    assert!(matches!(err, SchemaLoadError::Unreadable { .. }));
}

#[test]
fn test_load_rejects_empty_source_list() {
    let err = SchemaLoader::from_json_sources(&[]).unwrap_err();
    assert!(matches!(err, SchemaLoadError::NoSources));
}

#[test]
fn test_load_rejects_malformed_definition() {
    let err = SchemaLoader::from_json_sources(&["{ not json"]).unwrap_err();
    assert!(matches!(err, SchemaLoadError::Malformed { .. }));
}

#[test]
fn test_load_rejects_unresolved_type_reference() {
    let schema = r#"{
        "namespace": "urn:vendor:test",
        "roots": { "report": "ReportType" },
        "types": {
            "ReportType": {
                "kind": "complex",
                "children": [
                    { "name": "Code", "type": "MissingType" }
                ]
            }
        }
    }"#;
    let err = SchemaLoader::from_json_sources(&[schema]).unwrap_err();
    match err {
        SchemaLoadError::UnresolvedReference { reference, .. } => {
            assert_eq!(reference, "MissingType");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_load_rejects_invalid_pattern_facet() {
    let schema = r#"{
        "namespace": "urn:vendor:test",
        "roots": { "report": "CodeType" },
        "types": {
            "CodeType": { "kind": "simple", "base": "token", "pattern": "[unclosed" }
        }
    }"#;
    let err = SchemaLoader::from_json_sources(&[schema]).unwrap_err();
    assert!(matches!(err, SchemaLoadError::InvalidPattern { .. }));
}

#[test]
fn test_bundle_composes_additional_namespaces() {
    let bundle = SchemaLoader::from_json_sources(&[
        ebics_messages::schema::EBICS_HEV_SCHEMA,
        ebics_messages::schema::EBICS_H004_SCHEMA,
        ebics_messages::schema::XMLDSIG_SCHEMA,
        VENDOR_SCHEMA,
    ])
    .unwrap();

    assert!(bundle.is_known_root("http://www.ebics.org/H000", "ebicsHEVRequest"));
    assert!(bundle.is_known_root("urn:vendor:test", "report"));
}

#[test]
fn test_builtin_bundle_declares_all_roots() {
    let bundle = builtin_bundle().unwrap();
    assert_eq!(bundle.root_count(), 5);
    assert!(bundle.type_count() > 10);
}
