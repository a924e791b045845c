/*!
 * Schema definitions, loader, and the compiled validation bundle.
 */

pub mod bundle;
pub mod definition;
pub mod loader;

pub use bundle::{CompiledType, SchemaBundle, TypeKey};
pub use definition::{
    AnyDef, AttributeDef, ElementDef, MaxOccurs, Particle, SchemaDefinition, TypeDef, ValueType,
};
pub use loader::SchemaLoader;

use crate::error::SchemaLoadError;
use std::sync::{Arc, OnceLock};

/// Embedded EBICS schema definitions, mirroring the schema set the
/// protocol ships: the H000 host-version-exchange schema, the H004
/// key-management subset, and the XML-Signature types they reference.
pub const EBICS_HEV_SCHEMA: &str = include_str!("../../schemas/ebics_hev.json");
pub const EBICS_H004_SCHEMA: &str = include_str!("../../schemas/ebics_h004.json");
pub const XMLDSIG_SCHEMA: &str = include_str!("../../schemas/xmldsig_core.json");

static BUILTIN: OnceLock<Arc<SchemaBundle>> = OnceLock::new();

/// The compiled EBICS bundle, built once per process and shared.
pub fn builtin_bundle() -> Result<Arc<SchemaBundle>, SchemaLoadError> {
    if let Some(bundle) = BUILTIN.get() {
        return Ok(bundle.clone());
    }
    let bundle = Arc::new(SchemaLoader::from_json_sources(&[
        EBICS_HEV_SCHEMA,
        EBICS_H004_SCHEMA,
        XMLDSIG_SCHEMA,
    ])?);
    Ok(BUILTIN.get_or_init(|| bundle).clone())
}
