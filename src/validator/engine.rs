/*!
 * Structural conformance engine.
 *
 * Applies a compiled schema bundle to a parsed element tree: element and
 * attribute presence, cardinality, schema-declared child order, namespace
 * conformance, and simple-value conformance after XSD whitespace handling.
 * Extension points accept foreign-namespace content without looking inside.
 */

use crate::schema::bundle::{
    CompiledAttribute, CompiledParticle, CompiledType, ComplexType, SchemaBundle,
    SimpleContentType, SimpleType,
};
use crate::schema::ValueType;
use crate::xml::{self, parse_document, XmlElement};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Structural rule a violation reports against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViolationRule {
    MalformedDocument,
    UnknownRoot,
    RequiredMissing,
    Cardinality,
    SequenceOrder,
    UnexpectedElement,
    TypeMismatch,
    PatternMismatch,
    RequiredAttributeMissing,
}

impl ViolationRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationRule::MalformedDocument => "malformed-document",
            ViolationRule::UnknownRoot => "unknown-root",
            ViolationRule::RequiredMissing => "required-missing",
            ViolationRule::Cardinality => "cardinality",
            ViolationRule::SequenceOrder => "sequence-order",
            ViolationRule::UnexpectedElement => "unexpected-element",
            ViolationRule::TypeMismatch => "type-mismatch",
            ViolationRule::PatternMismatch => "pattern-mismatch",
            ViolationRule::RequiredAttributeMissing => "required-attribute-missing",
        }
    }
}

impl fmt::Display for ViolationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One structural violation: where, which rule, and a readable message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub location: String,
    pub rule: ViolationRule,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.location, self.rule, self.message)
    }
}

/// Document-level validation failure with the ordered violation list.
#[derive(Debug, Error)]
#[error("document failed structural validation with {} violation(s)", .violations.len())]
pub struct ValidationError {
    pub violations: Vec<Violation>,
}

/// Validator over a shared compiled bundle. Cheap to construct; each call
/// runs with private per-call state, so one bundle serves any number of
/// concurrent validations.
pub struct Validator {
    bundle: Arc<SchemaBundle>,
}

impl Validator {
    pub fn new(bundle: Arc<SchemaBundle>) -> Self {
        Self { bundle }
    }

    pub fn bundle(&self) -> &Arc<SchemaBundle> {
        &self.bundle
    }

    /// Parse and validate raw XML text. Malformed XML surfaces as a
    /// violation, not a panic or a separate error channel.
    pub fn validate_text(&self, text: &str) -> Result<(), ValidationError> {
        let root = match parse_document(text) {
            Ok(root) => root,
            Err(e) => {
                return Err(ValidationError {
                    violations: vec![Violation {
                        location: "/".to_string(),
                        rule: ViolationRule::MalformedDocument,
                        message: e.to_string(),
                    }],
                });
            }
        };
        self.validate_tree(&root)
    }

    /// Validate an already-parsed tree. Never mutates the input.
    pub fn validate_tree(&self, root: &XmlElement) -> Result<(), ValidationError> {
        let mut session = Session {
            bundle: &self.bundle,
            violations: Vec::new(),
        };
        session.validate_root(root);
        if session.violations.is_empty() {
            Ok(())
        } else {
            log::debug!(
                "validation of <{}> failed with {} violation(s)",
                root.name.qualified(),
                session.violations.len()
            );
            Err(ValidationError {
                violations: session.violations,
            })
        }
    }
}

/// Per-call state; never shared between validations.
struct Session<'a> {
    bundle: &'a SchemaBundle,
    violations: Vec<Violation>,
}

impl<'a> Session<'a> {
    fn validate_root(&mut self, root: &XmlElement) {
        let namespace = root.name.namespace.as_deref().unwrap_or("");
        match self.bundle.root_type(namespace, &root.name.local) {
            Some(compiled) => {
                let path = format!("/{}", root.name.local);
                self.validate_element(root, compiled, &path);
            }
            None => self.push(
                "/",
                ViolationRule::UnknownRoot,
                format!(
                    "root element '{}' is not declared by any loaded schema",
                    root.name.qualified()
                ),
            ),
        }
    }

    fn validate_element(&mut self, element: &XmlElement, compiled: &CompiledType, path: &str) {
        match compiled {
            CompiledType::Complex(t) => self.validate_complex(element, t, path),
            CompiledType::Simple(t) => self.validate_simple(element, t, path),
            CompiledType::SimpleContent(t) => self.validate_simple_content(element, t, path),
        }
    }

    fn validate_complex(&mut self, element: &XmlElement, t: &ComplexType, path: &str) {
        self.validate_attributes(element, &t.attributes, path);

        if !element.text().trim().is_empty() {
            self.push(
                path,
                ViolationRule::TypeMismatch,
                "unexpected text content in element-only type".to_string(),
            );
        }

        let children: Vec<&XmlElement> = element.child_elements().collect();
        let mut next = 0usize;
        let mut consumed: Vec<u32> = vec![0; t.particles.len()];

        for (index, particle) in t.particles.iter().enumerate() {
            match particle {
                CompiledParticle::Element(decl) => {
                    let mut count = 0u32;
                    while next < children.len()
                        && children[next]
                            .name
                            .matches(&decl.namespace, &decl.name)
                        && decl.max_occurs.admits(count + 1)
                    {
                        let child = children[next];
                        let child_path = format!("{}/{}", path, decl.name);
                        match self.bundle.lookup(&decl.type_key) {
                            Some(child_type) => {
                                self.validate_element(child, child_type, &child_path)
                            }
                            // Unreachable for bundles built by the loader,
                            // which resolves every reference up front.
                            None => self.push(
                                &child_path,
                                ViolationRule::TypeMismatch,
                                "no compiled type for element".to_string(),
                            ),
                        }
                        next += 1;
                        count += 1;
                    }
                    consumed[index] = count;
                    if count < decl.min_occurs {
                        let rule = if count == 0 && decl.min_occurs == 1 {
                            ViolationRule::RequiredMissing
                        } else {
                            ViolationRule::Cardinality
                        };
                        self.push(
                            &format!("{}/{}", path, decl.name),
                            rule,
                            format!(
                                "expected at least {} occurrence(s) of '{}', found {}",
                                decl.min_occurs, decl.name, count
                            ),
                        );
                    }
                }
                CompiledParticle::Any(any) => {
                    let mut count = 0u32;
                    while next < children.len()
                        && any.admits_namespace(children[next].name.namespace.as_deref())
                        && any.max_occurs.admits(count + 1)
                    {
                        // Lax processing: structurally legal, not inspected.
                        next += 1;
                        count += 1;
                    }
                    consumed[index] = count;
                    if count < any.min_occurs {
                        self.push(
                            path,
                            ViolationRule::Cardinality,
                            format!(
                                "expected at least {} extension element(s), found {}",
                                any.min_occurs, count
                            ),
                        );
                    }
                }
            }
        }

        // Anything left over matched an earlier particle out of order,
        // exceeded its particle's maximum, or matches nothing in the type.
        for leftover in &children[next..] {
            let leftover_path = format!("{}/{}", path, leftover.name.local);
            match self.matching_particle(leftover, t) {
                Some(index) if !Self::particle_max(&t.particles[index]).admits(consumed[index] + 1) => {
                    self.push(
                        &leftover_path,
                        ViolationRule::Cardinality,
                        format!(
                            "element '{}' occurs more often than the declared maximum",
                            leftover.name.qualified()
                        ),
                    );
                }
                Some(_) => {
                    self.push(
                        &leftover_path,
                        ViolationRule::SequenceOrder,
                        format!(
                            "element '{}' appears outside the schema-declared order",
                            leftover.name.qualified()
                        ),
                    );
                }
                None => {
                    self.push(
                        &leftover_path,
                        ViolationRule::UnexpectedElement,
                        format!(
                            "element '{}' is not declared in this content model",
                            leftover.name.qualified()
                        ),
                    );
                }
            }
        }
    }

    fn matching_particle(&self, element: &XmlElement, t: &ComplexType) -> Option<usize> {
        t.particles.iter().position(|p| match p {
            CompiledParticle::Element(decl) => {
                element.name.matches(&decl.namespace, &decl.name)
            }
            CompiledParticle::Any(any) => {
                any.admits_namespace(element.name.namespace.as_deref())
            }
        })
    }

    fn particle_max(particle: &CompiledParticle) -> crate::schema::MaxOccurs {
        match particle {
            CompiledParticle::Element(decl) => decl.max_occurs,
            CompiledParticle::Any(any) => any.max_occurs,
        }
    }

    fn validate_simple(&mut self, element: &XmlElement, t: &SimpleType, path: &str) {
        if element.child_elements().next().is_some() {
            self.push(
                path,
                ViolationRule::TypeMismatch,
                "unexpected child elements in text-only type".to_string(),
            );
            return;
        }
        self.validate_value(&element.text(), t.base, t.pattern.as_ref(), path);
    }

    fn validate_simple_content(
        &mut self,
        element: &XmlElement,
        t: &SimpleContentType,
        path: &str,
    ) {
        self.validate_attributes(element, &t.attributes, path);
        if element.child_elements().next().is_some() {
            self.push(
                path,
                ViolationRule::TypeMismatch,
                "unexpected child elements in text-only type".to_string(),
            );
            return;
        }
        self.validate_value(&element.text(), t.value, t.pattern.as_ref(), path);
    }

    fn validate_attributes(
        &mut self,
        element: &XmlElement,
        attributes: &[CompiledAttribute],
        path: &str,
    ) {
        for decl in attributes {
            let attr_path = format!("{}/@{}", path, decl.name);
            match element.attribute(&decl.name) {
                Some(value) => {
                    self.validate_value(value, decl.value_type, decl.pattern.as_ref(), &attr_path)
                }
                None if decl.required => self.push(
                    &attr_path,
                    ViolationRule::RequiredAttributeMissing,
                    format!("required attribute '{}' is missing", decl.name),
                ),
                None => {}
            }
        }
    }

    /// Check one text value against its declared value space, applying the
    /// XSD whitespace facet first (token collapse, normalizedString
    /// replace), then the lexical rules and any pattern facet.
    fn validate_value(
        &mut self,
        raw: &str,
        value_type: ValueType,
        pattern: Option<&regex::Regex>,
        path: &str,
    ) {
        let prepared = match value_type {
            ValueType::String => raw.to_string(),
            ValueType::NormalizedString => xml::text::normalize(raw),
            // All other value spaces collapse whitespace.
            _ => xml::text::collapse(raw),
        };

        let lexical_ok = match value_type {
            ValueType::Token | ValueType::NormalizedString | ValueType::String => true,
            ValueType::Boolean => xml::text::parse_boolean(&prepared).is_some(),
            ValueType::Integer => xml::text::is_integer(&prepared),
            ValueType::HexBinary => xml::text::decode_hex(&prepared).is_ok(),
            ValueType::DateTime => xml::text::parse_timestamp(&prepared).is_ok(),
        };
        if !lexical_ok {
            self.push(
                path,
                ViolationRule::TypeMismatch,
                format!("'{}' is not a valid {}", prepared, value_type.as_str()),
            );
            return;
        }

        if let Some(re) = pattern {
            if !re.is_match(&prepared) {
                self.push(
                    path,
                    ViolationRule::PatternMismatch,
                    format!("'{}' does not match the declared pattern", prepared),
                );
            }
        }
    }

    fn push(&mut self, location: &str, rule: ViolationRule, message: String) {
        self.violations.push(Violation {
            location: location.to_string(),
            rule,
            message,
        });
    }
}
