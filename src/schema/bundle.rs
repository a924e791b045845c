/*!
 * Compiled schema bundle: the composed, reference-resolved form of one or
 * more schema definitions. Immutable once built; share it behind an `Arc`
 * across any number of concurrent validations.
 */

use crate::error::SchemaLoadError;
use crate::schema::definition::{
    AttributeDef, MaxOccurs, Particle, SchemaDefinition, TypeDef, ValueType,
};
use regex::Regex;
use std::collections::HashMap;

/// Types are addressed by (namespace, local type name) across the bundle.
pub type TypeKey = (String, String);

#[derive(Debug, Clone)]
pub enum CompiledType {
    Complex(ComplexType),
    Simple(SimpleType),
    SimpleContent(SimpleContentType),
}

#[derive(Debug, Clone)]
pub struct ComplexType {
    pub particles: Vec<CompiledParticle>,
    pub attributes: Vec<CompiledAttribute>,
}

#[derive(Debug, Clone)]
pub enum CompiledParticle {
    Element(CompiledElement),
    Any(CompiledAny),
}

#[derive(Debug, Clone)]
pub struct CompiledElement {
    /// Element namespace; definitions are element-form qualified, so this
    /// is the target namespace of the defining schema.
    pub namespace: String,
    pub name: String,
    pub type_key: TypeKey,
    pub min_occurs: u32,
    pub max_occurs: MaxOccurs,
}

#[derive(Debug, Clone)]
pub struct CompiledAny {
    /// For "##other": the namespace foreign content must differ from.
    /// `None` means "##any".
    pub other_than: Option<String>,
    pub min_occurs: u32,
    pub max_occurs: MaxOccurs,
}

impl CompiledAny {
    pub fn admits_namespace(&self, namespace: Option<&str>) -> bool {
        match (&self.other_than, namespace) {
            (None, _) => true,
            // "##other" excludes both the target namespace and unqualified
            // content.
            (Some(target), Some(ns)) => ns != target,
            (Some(_), None) => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SimpleType {
    pub base: ValueType,
    pub pattern: Option<Regex>,
}

#[derive(Debug, Clone)]
pub struct SimpleContentType {
    pub value: ValueType,
    pub pattern: Option<Regex>,
    pub attributes: Vec<CompiledAttribute>,
}

#[derive(Debug, Clone)]
pub struct CompiledAttribute {
    pub name: String,
    pub value_type: ValueType,
    pub required: bool,
    pub pattern: Option<Regex>,
}

/// The compiled validation unit. Read-only after construction.
#[derive(Debug)]
pub struct SchemaBundle {
    types: HashMap<TypeKey, CompiledType>,
    roots: HashMap<(String, String), TypeKey>,
}

impl SchemaBundle {
    /// Compose a set of parsed definitions into one bundle, resolving all
    /// cross-references. Any reference that no loaded definition satisfies
    /// fails the whole build.
    pub(crate) fn from_definitions(
        definitions: &[SchemaDefinition],
    ) -> Result<Self, SchemaLoadError> {
        let mut types = HashMap::new();
        let mut roots = HashMap::new();

        // First pass: register every type key so cross-references between
        // definitions resolve regardless of load order.
        let mut declared: Vec<TypeKey> = Vec::new();
        for def in definitions {
            for name in def.types.keys() {
                declared.push((def.namespace.clone(), name.clone()));
            }
        }

        for def in definitions {
            for (name, type_def) in &def.types {
                let compiled = compile_type(def, type_def, &declared)?;
                types.insert((def.namespace.clone(), name.clone()), compiled);
            }
            for (root, type_ref) in &def.roots {
                let key = resolve_ref(def, type_ref, &declared)?;
                roots.insert((def.namespace.clone(), root.clone()), key);
            }
        }

        log::debug!(
            "compiled schema bundle: {} types, {} root elements from {} definition(s)",
            types.len(),
            roots.len(),
            definitions.len()
        );
        Ok(Self { types, roots })
    }

    pub fn lookup(&self, key: &TypeKey) -> Option<&CompiledType> {
        self.types.get(key)
    }

    /// Compiled type a root element of the given name conforms to.
    pub fn root_type(&self, namespace: &str, local: &str) -> Option<&CompiledType> {
        let key = self
            .roots
            .get(&(namespace.to_string(), local.to_string()))?;
        self.types.get(key)
    }

    pub fn is_known_root(&self, namespace: &str, local: &str) -> bool {
        self.roots
            .contains_key(&(namespace.to_string(), local.to_string()))
    }

    pub fn root_count(&self) -> usize {
        self.roots.len()
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }
}

fn compile_type(
    def: &SchemaDefinition,
    type_def: &TypeDef,
    declared: &[TypeKey],
) -> Result<CompiledType, SchemaLoadError> {
    match type_def {
        TypeDef::Complex {
            children,
            attributes,
        } => {
            let mut particles = Vec::with_capacity(children.len());
            for particle in children {
                particles.push(compile_particle(def, particle, declared)?);
            }
            Ok(CompiledType::Complex(ComplexType {
                particles,
                attributes: compile_attributes(def, attributes)?,
            }))
        }
        TypeDef::Simple { base, pattern } => Ok(CompiledType::Simple(SimpleType {
            base: *base,
            pattern: compile_pattern(def, pattern.as_deref())?,
        })),
        TypeDef::SimpleContent {
            value,
            pattern,
            attributes,
        } => Ok(CompiledType::SimpleContent(SimpleContentType {
            value: *value,
            pattern: compile_pattern(def, pattern.as_deref())?,
            attributes: compile_attributes(def, attributes)?,
        })),
    }
}

fn compile_particle(
    def: &SchemaDefinition,
    particle: &Particle,
    declared: &[TypeKey],
) -> Result<CompiledParticle, SchemaLoadError> {
    match particle {
        Particle::Element(el) => Ok(CompiledParticle::Element(CompiledElement {
            namespace: def.namespace.clone(),
            name: el.name.clone(),
            type_key: resolve_ref(def, &el.type_ref, declared)?,
            min_occurs: el.min_occurs,
            max_occurs: el.max_occurs,
        })),
        Particle::Any(any) => {
            let other_than = match any.namespace.as_str() {
                "##any" => None,
                // "##other" and anything else: foreign relative to the
                // defining schema.
                _ => Some(def.namespace.clone()),
            };
            Ok(CompiledParticle::Any(CompiledAny {
                other_than,
                min_occurs: any.min_occurs,
                max_occurs: any.max_occurs,
            }))
        }
    }
}

fn compile_attributes(
    def: &SchemaDefinition,
    attributes: &[AttributeDef],
) -> Result<Vec<CompiledAttribute>, SchemaLoadError> {
    attributes
        .iter()
        .map(|attr| {
            Ok(CompiledAttribute {
                name: attr.name.clone(),
                value_type: attr.value_type,
                required: attr.required,
                pattern: compile_pattern(def, attr.pattern.as_deref())?,
            })
        })
        .collect()
}

fn compile_pattern(
    def: &SchemaDefinition,
    pattern: Option<&str>,
) -> Result<Option<Regex>, SchemaLoadError> {
    match pattern {
        None => Ok(None),
        // XSD patterns are implicitly anchored.
        Some(p) => Regex::new(&format!("^(?:{})$", p))
            .map(Some)
            .map_err(|e| SchemaLoadError::InvalidPattern {
                pattern: p.to_string(),
                namespace: def.namespace.clone(),
                reason: e.to_string(),
            }),
    }
}

/// Resolve "Name" against the defining schema's namespace, or
/// "prefix:Name" through its prefix table.
fn resolve_ref(
    def: &SchemaDefinition,
    reference: &str,
    declared: &[TypeKey],
) -> Result<TypeKey, SchemaLoadError> {
    let (namespace, name) = match reference.split_once(':') {
        Some((prefix, local)) => {
            let ns = def.prefixes.get(prefix).ok_or_else(|| {
                SchemaLoadError::UnresolvedReference {
                    reference: reference.to_string(),
                    namespace: def.namespace.clone(),
                }
            })?;
            (ns.clone(), local.to_string())
        }
        None => (def.namespace.clone(), reference.to_string()),
    };

    let key = (namespace, name);
    if declared.contains(&key) {
        Ok(key)
    } else {
        Err(SchemaLoadError::UnresolvedReference {
            reference: reference.to_string(),
            namespace: def.namespace.clone(),
        })
    }
}
