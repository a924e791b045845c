/*!
 * HEV (Host EBICS Version) message family: the handshake pair through
 * which a client asks a host which protocol versions it supports.
 */

use crate::xml::XmlElement;

/// `ebicsHEVRequest`: names the host whose version list is requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostVersionRequest {
    host_id: String,
}

impl HostVersionRequest {
    pub fn new(host_id: impl Into<String>) -> Self {
        Self {
            host_id: crate::xml::text::collapse(&host_id.into()),
        }
    }

    pub fn host_id(&self) -> &str {
        &self.host_id
    }
}

/// Protocol status code plus its human-readable report text. Both fields
/// are required; values are stored in their normalized lexical form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemReturnCode {
    return_code: String,
    report_text: String,
}

impl SystemReturnCode {
    pub fn new(return_code: impl Into<String>, report_text: impl Into<String>) -> Self {
        Self {
            return_code: crate::xml::text::collapse(&return_code.into()),
            report_text: crate::xml::text::normalize(&report_text.into()),
        }
    }

    pub fn return_code(&self) -> &str {
        &self.return_code
    }

    pub fn report_text(&self) -> &str {
        &self.report_text
    }
}

/// One supported protocol version: the protocol identifier attribute
/// ("H004") and the release label carried as element text ("02.50").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionNumber {
    protocol_version: String,
    value: String,
}

impl VersionNumber {
    pub fn new(protocol_version: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            protocol_version: crate::xml::text::collapse(&protocol_version.into()),
            value: crate::xml::text::collapse(&value.into()),
        }
    }

    pub fn protocol_version(&self) -> &str {
        &self.protocol_version
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

/// `ebicsHEVResponse`: a system return code (never absent — the type makes
/// an absent code unrepresentable), zero or more version records, and any
/// foreign-namespace extension elements carried opaquely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostVersionResponse {
    system_return_code: SystemReturnCode,
    version_numbers: Vec<VersionNumber>,
    extensions: Vec<XmlElement>,
}

impl HostVersionResponse {
    /// Factory: fully valid response with an empty version list and no
    /// extensions.
    pub fn new(return_code: impl Into<String>, report_text: impl Into<String>) -> Self {
        Self::from_return_code(SystemReturnCode::new(return_code, report_text))
    }

    pub fn from_return_code(system_return_code: SystemReturnCode) -> Self {
        Self {
            system_return_code,
            version_numbers: Vec::new(),
            extensions: Vec::new(),
        }
    }

    /// Append one supported version, returning the extended value.
    pub fn with_version(
        mut self,
        protocol_version: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.version_numbers
            .push(VersionNumber::new(protocol_version, value));
        self
    }

    pub fn with_versions(mut self, versions: impl IntoIterator<Item = VersionNumber>) -> Self {
        self.version_numbers.extend(versions);
        self
    }

    /// Append an opaque extension element. Content from the protocol's own
    /// namespace does not belong here; extension positions are reserved for
    /// foreign namespaces.
    pub fn with_extension(mut self, element: XmlElement) -> Self {
        let mut element = element;
        element.make_self_contained();
        self.extensions.push(element);
        self
    }

    pub fn system_return_code(&self) -> &SystemReturnCode {
        &self.system_return_code
    }

    pub fn version_numbers(&self) -> &[VersionNumber] {
        &self.version_numbers
    }

    pub fn extensions(&self) -> &[XmlElement] {
        &self.extensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_builds_complete_response() {
        let response = HostVersionResponse::new("000000", "[EBICS_OK]");
        assert_eq!(response.system_return_code().return_code(), "000000");
        assert_eq!(response.system_return_code().report_text(), "[EBICS_OK]");
        assert!(response.version_numbers().is_empty());
        assert!(response.extensions().is_empty());
    }

    #[test]
    fn test_with_version_returns_new_value() {
        let response = HostVersionResponse::new("000000", "[EBICS_OK]")
            .with_version("H004", "02.50")
            .with_version("H005", "03.00");
        assert_eq!(response.version_numbers().len(), 2);
        assert_eq!(response.version_numbers()[0].protocol_version(), "H004");
        assert_eq!(response.version_numbers()[1].value(), "03.00");
    }

    #[test]
    fn test_construction_normalizes_lexical_forms() {
        let code = SystemReturnCode::new("  000000  ", "report\ttext");
        assert_eq!(code.return_code(), "000000");
        assert_eq!(code.report_text(), "report text");
    }
}
