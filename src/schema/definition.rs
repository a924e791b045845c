/*!
 * Serde data model for structural schema-definition documents.
 *
 * A definition file declares one target namespace: its named types, its
 * root elements, and a prefix table for references into other loaded
 * namespaces. The loader composes any number of these into one bundle.
 */

use serde::de::{self, Deserializer, Visitor};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaDefinition {
    /// Target namespace every element and type in this document belongs to.
    pub namespace: String,

    /// Prefix table for cross-namespace type references ("ds" -> xmldsig).
    #[serde(default)]
    pub prefixes: HashMap<String, String>,

    /// Root element local name -> type reference.
    #[serde(default)]
    pub roots: HashMap<String, String>,

    #[serde(default)]
    pub types: HashMap<String, TypeDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum TypeDef {
    /// Element-only content: an ordered sequence of particles plus attributes.
    Complex {
        #[serde(default)]
        children: Vec<Particle>,
        #[serde(default)]
        attributes: Vec<AttributeDef>,
    },

    /// Text-only content.
    Simple {
        base: ValueType,
        #[serde(default)]
        pattern: Option<String>,
    },

    /// Text content carrying attributes (e.g. the HEV VersionNumber entry).
    SimpleContent {
        value: ValueType,
        #[serde(default)]
        pattern: Option<String>,
        #[serde(default)]
        attributes: Vec<AttributeDef>,
    },
}

/// One entry of a sequence: either a named element or an `any` extension
/// point. Untagged: element entries carry `name`, extension points carry
/// `any: true`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Particle {
    Element(ElementDef),
    Any(AnyDef),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementDef {
    pub name: String,

    /// Type reference, optionally prefix-qualified ("ds:SignatureType").
    #[serde(rename = "type")]
    pub type_ref: String,

    #[serde(default = "default_one", rename = "minOccurs")]
    pub min_occurs: u32,

    #[serde(default = "MaxOccurs::one", rename = "maxOccurs")]
    pub max_occurs: MaxOccurs,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnyDef {
    /// Marker field distinguishing extension points from element entries.
    pub any: bool,

    /// Namespace constraint: "##other" (default) or "##any".
    #[serde(default = "default_other")]
    pub namespace: String,

    #[serde(default, rename = "minOccurs")]
    pub min_occurs: u32,

    #[serde(default = "MaxOccurs::unbounded", rename = "maxOccurs")]
    pub max_occurs: MaxOccurs,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeDef {
    pub name: String,

    #[serde(rename = "type")]
    pub value_type: ValueType,

    #[serde(default)]
    pub required: bool,

    #[serde(default)]
    pub pattern: Option<String>,
}

/// Value spaces the validator and codec understand, named as XSD names them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValueType {
    Token,
    NormalizedString,
    String,
    Boolean,
    Integer,
    HexBinary,
    DateTime,
}

impl ValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::Token => "token",
            ValueType::NormalizedString => "normalizedString",
            ValueType::String => "string",
            ValueType::Boolean => "boolean",
            ValueType::Integer => "integer",
            ValueType::HexBinary => "hexBinary",
            ValueType::DateTime => "dateTime",
        }
    }
}

/// `maxOccurs`: a number or the keyword "unbounded".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxOccurs {
    Bounded(u32),
    Unbounded,
}

impl MaxOccurs {
    pub fn one() -> Self {
        MaxOccurs::Bounded(1)
    }

    pub fn unbounded() -> Self {
        MaxOccurs::Unbounded
    }

    pub fn admits(&self, count: u32) -> bool {
        match self {
            MaxOccurs::Bounded(max) => count <= *max,
            MaxOccurs::Unbounded => true,
        }
    }
}

fn default_one() -> u32 {
    1
}

fn default_other() -> String {
    "##other".to_string()
}

impl Serialize for MaxOccurs {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MaxOccurs::Bounded(n) => serializer.serialize_u32(*n),
            MaxOccurs::Unbounded => serializer.serialize_str("unbounded"),
        }
    }
}

impl<'de> Deserialize<'de> for MaxOccurs {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MaxOccursVisitor;

        impl<'de> Visitor<'de> for MaxOccursVisitor {
            type Value = MaxOccurs;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a non-negative integer or \"unbounded\"")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<MaxOccurs, E> {
                u32::try_from(v)
                    .map(MaxOccurs::Bounded)
                    .map_err(|_| E::custom("maxOccurs out of range"))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<MaxOccurs, E> {
                u32::try_from(v)
                    .map(MaxOccurs::Bounded)
                    .map_err(|_| E::custom("maxOccurs out of range"))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<MaxOccurs, E> {
                if v == "unbounded" {
                    Ok(MaxOccurs::Unbounded)
                } else {
                    Err(E::custom(format!("invalid maxOccurs keyword '{}'", v)))
                }
            }
        }

        deserializer.deserialize_any(MaxOccursVisitor)
    }
}
