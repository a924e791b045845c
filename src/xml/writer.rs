use crate::xml::node::{XmlElement, XmlNode};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("failed to write XML: {0}")]
pub struct XmlWriteError(String);

/// Serialize an element tree back to UTF-8 XML text, with an XML
/// declaration and no added indentation. Attribute order and namespace
/// prefixes are emitted exactly as stored on the tree.
pub fn write_document(root: &XmlElement) -> Result<String, XmlWriteError> {
    let mut writer = Writer::new(Vec::new());
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(|e| XmlWriteError(e.to_string()))?;
    write_element(&mut writer, root)?;
    let bytes = writer.into_inner();
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn write_element(
    writer: &mut Writer<Vec<u8>>,
    element: &XmlElement,
) -> Result<(), XmlWriteError> {
    let name = element.name.qualified();
    let mut start = BytesStart::new(name.clone());
    for attr in &element.attributes {
        start.push_attribute((attr.name.qualified().as_str(), attr.value.as_str()));
    }

    if element.children.is_empty() {
        writer
            .write_event(Event::Empty(start))
            .map_err(|e| XmlWriteError(e.to_string()))?;
        return Ok(());
    }

    writer
        .write_event(Event::Start(start))
        .map_err(|e| XmlWriteError(e.to_string()))?;
    for child in &element.children {
        match child {
            XmlNode::Element(el) => write_element(writer, el)?,
            XmlNode::Text(t) => writer
                .write_event(Event::Text(BytesText::new(t)))
                .map_err(|e| XmlWriteError(e.to_string()))?,
        }
    }
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(|e| XmlWriteError(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::node::QName;
    use crate::xml::reader::parse_document;

    #[test]
    fn test_write_then_parse_round_trip() {
        let mut root = XmlElement::new(QName::namespaced("root", "urn:a"));
        root.push_attribute(QName::local("xmlns"), "urn:a");
        root.push_attribute(QName::local("Version"), "H004");
        root.push_child(XmlElement::with_text(
            QName::namespaced("child", "urn:a"),
            "a < b",
        ));

        let text = write_document(&root).unwrap();
        let reparsed = parse_document(&text).unwrap();
        assert_eq!(reparsed, root);
    }

    #[test]
    fn test_empty_element_form() {
        let root = XmlElement::new(QName::local("empty"));
        let text = write_document(&root).unwrap();
        assert!(text.contains("<empty/>"));
    }
}
