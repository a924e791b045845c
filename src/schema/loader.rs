use crate::error::SchemaLoadError;
use crate::schema::bundle::SchemaBundle;
use crate::schema::definition::SchemaDefinition;
use std::fs;
use std::path::Path;

/// Loads schema-definition sources and compiles them into one bundle.
///
/// Sources are JSON documents (YAML behind the `yaml-support` feature,
/// chosen by file extension). Build the bundle once at startup and reuse
/// it; rebuilding per validation is wasteful.
pub struct SchemaLoader;

impl SchemaLoader {
    /// Read every source file, parse it, and compose the set into a single
    /// bundle so cross-namespace references resolve. Fails on the first
    /// unreadable or malformed source, or on any unsatisfied reference.
    pub fn load<P: AsRef<Path>>(paths: &[P]) -> Result<SchemaBundle, SchemaLoadError> {
        if paths.is_empty() {
            return Err(SchemaLoadError::NoSources);
        }

        let mut definitions = Vec::with_capacity(paths.len());
        for path in paths {
            let path = path.as_ref();
            let display = path.display().to_string();
            let content =
                fs::read_to_string(path).map_err(|e| SchemaLoadError::Unreadable {
                    path: display.clone(),
                    reason: e.to_string(),
                })?;

            let definition = if has_yaml_extension(path) {
                Self::parse_yaml_source(&display, &content)?
            } else {
                Self::parse_json_source(&display, &content)?
            };
            definitions.push(definition);
        }

        log::info!("loaded {} schema source(s)", definitions.len());
        SchemaBundle::from_definitions(&definitions)
    }

    /// Compile a bundle straight from JSON definition texts (used for the
    /// embedded EBICS schemas and in tests).
    pub fn from_json_sources(sources: &[&str]) -> Result<SchemaBundle, SchemaLoadError> {
        if sources.is_empty() {
            return Err(SchemaLoadError::NoSources);
        }
        let definitions = sources
            .iter()
            .enumerate()
            .map(|(i, text)| Self::parse_json_source(&format!("source[{}]", i), text))
            .collect::<Result<Vec<_>, _>>()?;
        SchemaBundle::from_definitions(&definitions)
    }

    /// Parse a single JSON schema definition.
    pub fn parse_json(text: &str) -> Result<SchemaDefinition, SchemaLoadError> {
        Self::parse_json_source("<json>", text)
    }

    /// Parse a single YAML schema definition.
    #[cfg(feature = "yaml-support")]
    pub fn parse_yaml(text: &str) -> Result<SchemaDefinition, SchemaLoadError> {
        Self::parse_yaml_source("<yaml>", text)
    }

    fn parse_json_source(
        source_name: &str,
        text: &str,
    ) -> Result<SchemaDefinition, SchemaLoadError> {
        serde_json::from_str(text).map_err(|e| SchemaLoadError::Malformed {
            source_name: source_name.to_string(),
            reason: e.to_string(),
        })
    }

    #[cfg(feature = "yaml-support")]
    fn parse_yaml_source(
        source_name: &str,
        text: &str,
    ) -> Result<SchemaDefinition, SchemaLoadError> {
        serde_yaml::from_str(text).map_err(|e| SchemaLoadError::Malformed {
            source_name: source_name.to_string(),
            reason: e.to_string(),
        })
    }

    #[cfg(not(feature = "yaml-support"))]
    fn parse_yaml_source(
        source_name: &str,
        _text: &str,
    ) -> Result<SchemaDefinition, SchemaLoadError> {
        Err(SchemaLoadError::Malformed {
            source_name: source_name.to_string(),
            reason: "YAML support not enabled; enable the 'yaml-support' feature".to_string(),
        })
    }
}

fn has_yaml_extension(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}
