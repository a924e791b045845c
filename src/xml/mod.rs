/*!
 * Owned XML element tree plus reader/writer and XSD lexical helpers.
 *
 * Both the validator and the codec operate on this tree, so a document
 * parses once and the two layers are guaranteed to see identical structure.
 */

pub mod node;
pub mod reader;
pub mod text;
pub mod writer;

pub use node::{QName, XmlAttribute, XmlElement, XmlNode};
pub use reader::{parse_document, XmlParseError};
pub use writer::{write_document, XmlWriteError};
