use crate::xml::node::{QName, XmlElement, XmlNode};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use thiserror::Error;

/// XML namespace bound to the reserved `xml` prefix.
const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

#[derive(Debug, Error)]
pub enum XmlParseError {
    #[error("malformed XML: {0}")]
    Malformed(String),

    #[error("document has no root element")]
    NoRoot,

    #[error("unbound namespace prefix '{0}'")]
    UnboundPrefix(String),
}

/// Parse UTF-8 XML text into an owned element tree, resolving namespace
/// prefixes against the declarations in scope. Comments, processing
/// instructions and whitespace-only text between elements are dropped.
pub fn parse_document(text: &str) -> Result<XmlElement, XmlParseError> {
    let mut reader = Reader::from_str(text);
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut scopes: Vec<HashMap<Option<String>, String>> = vec![initial_scope()];
    let mut root: Option<XmlElement> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) => {
                if root.is_some() && stack.is_empty() {
                    return Err(XmlParseError::Malformed(
                        "multiple root elements".to_string(),
                    ));
                }
                let element = open_element(&start, &mut scopes)?;
                stack.push(element);
            }
            Ok(Event::Empty(start)) => {
                if root.is_some() && stack.is_empty() {
                    return Err(XmlParseError::Malformed(
                        "multiple root elements".to_string(),
                    ));
                }
                let element = open_element(&start, &mut scopes)?;
                scopes.pop();
                attach(element, &mut stack, &mut root);
            }
            Ok(Event::End(_)) => {
                let element = stack.pop().ok_or_else(|| {
                    XmlParseError::Malformed("unbalanced end tag".to_string())
                })?;
                scopes.pop();
                attach(element, &mut stack, &mut root);
            }
            Ok(Event::Text(t)) => {
                let value = t
                    .unescape()
                    .map_err(|e| XmlParseError::Malformed(e.to_string()))?;
                push_text(&value, &mut stack)?;
            }
            Ok(Event::CData(c)) => {
                let bytes = c.into_inner();
                let value = std::str::from_utf8(&bytes)
                    .map_err(|e| XmlParseError::Malformed(e.to_string()))?;
                push_text(value, &mut stack)?;
            }
            Ok(Event::Decl(_)) | Ok(Event::Comment(_)) | Ok(Event::PI(_))
            | Ok(Event::DocType(_)) => {}
            Ok(Event::Eof) => break,
            Err(e) => return Err(XmlParseError::Malformed(e.to_string())),
        }
    }

    if !stack.is_empty() {
        return Err(XmlParseError::Malformed(
            "unexpected end of document".to_string(),
        ));
    }
    root.ok_or(XmlParseError::NoRoot)
}

fn initial_scope() -> HashMap<Option<String>, String> {
    let mut scope = HashMap::new();
    scope.insert(Some("xml".to_string()), XML_NS.to_string());
    scope
}

/// Build an element from a start tag and push its namespace scope.
fn open_element(
    start: &BytesStart<'_>,
    scopes: &mut Vec<HashMap<Option<String>, String>>,
) -> Result<XmlElement, XmlParseError> {
    // Raw attributes first: namespace declarations on this very element
    // take part in resolving its own name.
    let mut raw_attrs: Vec<(Option<String>, String, String)> = Vec::new();
    let mut scope = scopes
        .last()
        .cloned()
        .unwrap_or_default();

    for attr in start.attributes() {
        let attr = attr.map_err(|e| XmlParseError::Malformed(e.to_string()))?;
        let (prefix, local) = split_name(attr.key.as_ref())?;
        let value = attr
            .unescape_value()
            .map_err(|e| XmlParseError::Malformed(e.to_string()))?
            .into_owned();
        if prefix.is_none() && local == "xmlns" {
            scope.insert(None, value.clone());
        } else if prefix.as_deref() == Some("xmlns") {
            scope.insert(Some(local.clone()), value.clone());
        }
        raw_attrs.push((prefix, local, value));
    }

    let (elem_prefix, elem_local) = split_name(start.name().as_ref())?;
    let namespace = resolve_element_ns(&elem_prefix, &scope)?;
    let mut element = XmlElement::new(QName {
        prefix: elem_prefix,
        local: elem_local,
        namespace,
    });

    for (prefix, local, value) in raw_attrs {
        let is_xmlns = (prefix.is_none() && local == "xmlns")
            || prefix.as_deref() == Some("xmlns");
        // Unprefixed attributes carry no namespace; xmlns declarations are
        // kept verbatim as attributes for round-trip fidelity.
        let namespace = if is_xmlns || prefix.is_none() {
            None
        } else {
            Some(lookup_prefix(prefix.as_ref(), &scope)?)
        };
        element.push_attribute(
            QName {
                prefix,
                local,
                namespace,
            },
            value,
        );
    }

    scopes.push(scope);
    Ok(element)
}

fn attach(element: XmlElement, stack: &mut Vec<XmlElement>, root: &mut Option<XmlElement>) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(XmlNode::Element(element)),
        None => *root = Some(element),
    }
}

fn push_text(value: &str, stack: &mut Vec<XmlElement>) -> Result<(), XmlParseError> {
    match stack.last_mut() {
        // Whitespace-only runs are indentation between elements, not data.
        Some(_) if value.trim().is_empty() => Ok(()),
        Some(parent) => {
            parent.children.push(XmlNode::Text(value.to_string()));
            Ok(())
        }
        None if value.trim().is_empty() => Ok(()),
        None => Err(XmlParseError::Malformed(
            "text content outside the root element".to_string(),
        )),
    }
}

fn split_name(raw: &[u8]) -> Result<(Option<String>, String), XmlParseError> {
    let name = std::str::from_utf8(raw)
        .map_err(|e| XmlParseError::Malformed(e.to_string()))?;
    match name.split_once(':') {
        Some((prefix, local)) => Ok((Some(prefix.to_string()), local.to_string())),
        None => Ok((None, name.to_string())),
    }
}

fn resolve_element_ns(
    prefix: &Option<String>,
    scope: &HashMap<Option<String>, String>,
) -> Result<Option<String>, XmlParseError> {
    match prefix {
        Some(_) => Ok(Some(lookup_prefix(prefix.as_ref(), scope)?)),
        // Unprefixed element names follow the default namespace, which may
        // be unset (or reset to "" meaning no namespace).
        None => Ok(scope.get(&None).filter(|ns| !ns.is_empty()).cloned()),
    }
}

fn lookup_prefix(
    prefix: Option<&String>,
    scope: &HashMap<Option<String>, String>,
) -> Result<String, XmlParseError> {
    let key = prefix.cloned();
    scope
        .get(&key)
        .cloned()
        .ok_or_else(|| XmlParseError::UnboundPrefix(key.unwrap_or_default()))
}
