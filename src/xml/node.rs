use std::collections::HashMap;
use std::fmt;

/// Qualified XML name: optional prefix, local part, resolved namespace URI.
///
/// The prefix is kept alongside the resolved namespace so that opaque
/// subtrees re-serialize with the prefixes they arrived with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QName {
    pub prefix: Option<String>,
    pub local: String,
    pub namespace: Option<String>,
}

impl QName {
    /// Name without a namespace.
    pub fn local(local: impl Into<String>) -> Self {
        Self {
            prefix: None,
            local: local.into(),
            namespace: None,
        }
    }

    /// Name bound to a namespace through the default (unprefixed) binding.
    pub fn namespaced(local: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            prefix: None,
            local: local.into(),
            namespace: Some(namespace.into()),
        }
    }

    /// Name bound to a namespace through an explicit prefix.
    pub fn prefixed(
        prefix: impl Into<String>,
        local: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            prefix: Some(prefix.into()),
            local: local.into(),
            namespace: Some(namespace.into()),
        }
    }

    /// True when this name resolves to the given namespace/local pair.
    pub fn matches(&self, namespace: &str, local: &str) -> bool {
        self.local == local && self.namespace.as_deref() == Some(namespace)
    }

    /// Serialized form, `prefix:local` or bare `local`.
    pub fn qualified(&self) -> String {
        match &self.prefix {
            Some(p) => format!("{}:{}", p, self.local),
            None => self.local.clone(),
        }
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.qualified())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlAttribute {
    pub name: QName,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

/// Owned, namespace-resolved element tree.
///
/// Namespace declarations (`xmlns`, `xmlns:p`) stay in `attributes` verbatim,
/// which keeps decoded foreign-namespace subtrees round-trip faithful.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    pub name: QName,
    pub attributes: Vec<XmlAttribute>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new(name: QName) -> Self {
        Self {
            name,
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Leaf element holding a single text node.
    pub fn with_text(name: QName, text: impl Into<String>) -> Self {
        let mut el = Self::new(name);
        el.children.push(XmlNode::Text(text.into()));
        el
    }

    pub fn push_attribute(&mut self, name: QName, value: impl Into<String>) {
        self.attributes.push(XmlAttribute {
            name,
            value: value.into(),
        });
    }

    pub fn push_child(&mut self, child: XmlElement) {
        self.children.push(XmlNode::Element(child));
    }

    pub fn push_text(&mut self, text: impl Into<String>) {
        self.children.push(XmlNode::Text(text.into()));
    }

    /// Child elements in document order.
    pub fn child_elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|n| match n {
            XmlNode::Element(el) => Some(el),
            XmlNode::Text(_) => None,
        })
    }

    /// First child element with the given namespace and local name.
    pub fn child(&self, namespace: &str, local: &str) -> Option<&XmlElement> {
        self.child_elements()
            .find(|el| el.name.matches(namespace, local))
    }

    /// All child elements with the given namespace and local name.
    pub fn children_named<'a>(
        &'a self,
        namespace: &'a str,
        local: &'a str,
    ) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.child_elements()
            .filter(move |el| el.name.matches(namespace, local))
    }

    /// Unqualified attribute value, if present.
    pub fn attribute(&self, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name.prefix.is_none() && a.name.local == local)
            .map(|a| a.value.as_str())
    }

    /// Concatenated text content of direct text children.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for node in &self.children {
            if let XmlNode::Text(t) = node {
                out.push_str(t);
            }
        }
        out
    }

    /// Namespace bindings declared directly on this element.
    fn declared_bindings(&self) -> HashMap<Option<String>, String> {
        let mut map = HashMap::new();
        for attr in &self.attributes {
            if attr.name.prefix.is_none() && attr.name.local == "xmlns" {
                map.insert(None, attr.value.clone());
            } else if attr.name.prefix.as_deref() == Some("xmlns") {
                map.insert(Some(attr.name.local.clone()), attr.value.clone());
            }
        }
        map
    }

    /// Add the namespace declarations this subtree relies on but does not
    /// declare itself, so the element stays well-formed when re-emitted
    /// outside its original document. Idempotent.
    pub fn make_self_contained(&mut self) {
        let mut needed: Vec<(Option<String>, String)> = Vec::new();
        let scope = self.declared_bindings();
        collect_missing_bindings(self, &scope, &mut needed);
        for (prefix, namespace) in needed {
            match prefix {
                None => self.push_attribute(QName::local("xmlns"), namespace),
                Some(p) => self.push_attribute(
                    QName {
                        prefix: Some("xmlns".to_string()),
                        local: p,
                        namespace: None,
                    },
                    namespace,
                ),
            }
        }
    }
}

fn collect_missing_bindings(
    el: &XmlElement,
    scope: &HashMap<Option<String>, String>,
    needed: &mut Vec<(Option<String>, String)>,
) {
    let mut local_scope = scope.clone();
    for (prefix, ns) in el.declared_bindings() {
        local_scope.insert(prefix, ns);
    }

    let mut note = |prefix: &Option<String>, namespace: &Option<String>| {
        if let Some(ns) = namespace {
            if local_scope.get(prefix).map(String::as_str) != Some(ns.as_str())
                && !needed.iter().any(|(p, _)| p == prefix)
            {
                needed.push((prefix.clone(), ns.clone()));
            }
        }
    };

    note(&el.name.prefix, &el.name.namespace);
    for attr in &el.attributes {
        if attr.name.prefix.as_deref() != Some("xmlns") && attr.name.local != "xmlns" {
            note(&attr.name.prefix, &attr.name.namespace);
        }
    }

    for child in el.child_elements() {
        collect_missing_bindings(child, &local_scope, needed);
    }
}
