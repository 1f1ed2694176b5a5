//! Delimited codec for interactive component ids. The wire format is
//! `{command},{action},{field}...`; fields are only ever appended to a
//! schema, never inserted, so older and shorter ids stay decodable by
//! defaulting the missing trailing fields.

use thiserror::Error;

/// Reserved field separator, guaranteed absent from field values.
pub const CONFIG_DELIMITER: &str = ",";
/// Separator inside list-valued fields.
pub const LIST_DELIMITER: &str = ";";
/// Sentinel carried in place of an empty list field.
pub const EMPTY_FIELD: &str = "EMPTY";
/// Platform ceiling for one encoded component id.
pub const CUSTOM_ID_CEILING: usize = 100;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum EncodeError {
    #[error("field `{field}` contains the reserved delimiter `{CONFIG_DELIMITER}`")]
    FieldContainsDelimiter { field: String },
    #[error("encoded id is {len} characters long, the limit is {CUSTOM_ID_CEILING}")]
    LengthExceeded { len: usize },
}

pub fn encode(fields: &[&str]) -> Result<String, EncodeError> {
    for field in fields {
        if field.contains(CONFIG_DELIMITER) {
            return Err(EncodeError::FieldContainsDelimiter { field: (*field).to_owned() });
        }
    }
    let joined = fields.join(CONFIG_DELIMITER);
    let len = joined.chars().count();
    if len > CUSTOM_ID_CEILING {
        return Err(EncodeError::LengthExceeded { len });
    }
    Ok(joined)
}

pub fn decode(encoded: &str) -> Vec<String> {
    encoded.split(CONFIG_DELIMITER).map(str::to_owned).collect()
}

/// Parsed component id: the owning command, the triggering action and the
/// remaining configuration fields.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CustomId {
    pub command: String,
    pub action: String,
    pub config_fields: Vec<String>,
}

impl CustomId {
    /// None when the id carries no action field at all.
    pub fn parse(encoded: &str) -> Option<Self> {
        let mut fields = encoded.split(CONFIG_DELIMITER).map(str::to_owned);
        let command = fields.next()?;
        let action = fields.next()?;
        Some(Self { command, action, config_fields: fields.collect() })
    }
}

/// Prefix test used for component routing: `{name},` starts the id.
pub fn matches_command(encoded: &str, name: &str) -> bool {
    encoded.strip_prefix(name).map_or(false, |rest| rest.starts_with(CONFIG_DELIMITER))
}

/// Accessor defaulting missing trailing fields of legacy ids.
pub fn field_or<'a>(fields: &'a [String], index: usize, default: &'a str) -> &'a str {
    fields.get(index).map(String::as_str).unwrap_or(default)
}

pub fn encode_list(values: &[i32]) -> String {
    if values.is_empty() {
        return EMPTY_FIELD.to_owned();
    }
    values.iter().map(ToString::to_string).collect::<Vec<_>>().join(LIST_DELIMITER)
}

/// None when a list member is not a number.
pub fn decode_list(field: &str) -> Option<Vec<i32>> {
    if field.is_empty() || field == EMPTY_FIELD {
        return Some(Vec::new());
    }
    field.split(LIST_DELIMITER).map(|member| member.trim().parse().ok()).collect()
}
