/*!
 * XSD lexical-space helpers shared by the validator and the codec.
 *
 * Whitespace handling follows the schema facets the EBICS types declare:
 * `token` values are collapsed, `normalizedString` values have tabs and
 * line breaks replaced by spaces, plain `string` values pass through.
 */

use chrono::{DateTime, SecondsFormat, Utc};

/// `xsd:token` whitespace collapse: trim, and squeeze internal runs of
/// whitespace to a single space.
pub fn collapse(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `xsd:normalizedString` whitespace replace: tabs, carriage returns and
/// newlines become spaces; nothing is trimmed or squeezed.
pub fn normalize(value: &str) -> String {
    value.replace(['\t', '\r', '\n'], " ")
}

/// Wire form for `xsd:hexBinary` values (EBICS nonces). Upper case out.
pub fn encode_hex(bytes: &[u8]) -> String {
    hex::encode_upper(bytes)
}

/// Accepts either case on the way in.
pub fn decode_hex(text: &str) -> Result<Vec<u8>, hex::FromHexError> {
    hex::decode(collapse(text))
}

/// Canonical `xsd:dateTime` text form: RFC 3339, UTC, second precision.
pub fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn parse_timestamp(text: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(&collapse(text)).map(|t| t.with_timezone(&Utc))
}

/// `xsd:boolean` lexical space: true/false/1/0.
pub fn parse_boolean(text: &str) -> Option<bool> {
    match collapse(text).as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

pub fn format_boolean(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

/// `xsd:integer` lexical check: optional sign followed by digits.
pub fn is_integer(text: &str) -> bool {
    let collapsed = collapse(text);
    let digits = collapsed
        .strip_prefix('-')
        .or_else(|| collapsed.strip_prefix('+'))
        .unwrap_or(&collapsed);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}
