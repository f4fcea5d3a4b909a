//! # Value Model
//!
//! This module defines the data types that flow between form scripts, the
//! coordinators and the host page: attribute type tags, requirement levels,
//! submit modes, entity references and the runtime [`AttributeValue`].
//!
//! ## Lookups Are Arrays
//!
//! The host stores every lookup as an array of [`EntityReference`]s, even when
//! the field only ever holds one. The coordinator layer hides this:
//!
//! - On write, every [`ValueInput`] shape is normalized to
//!   `AttributeValue::Lookup(vec![..])`. Clearing writes an empty array.
//! - On read, the array is collapsed to `AttributeValue::Reference(first)`
//!   or `Null`. Callers of `get_value` never see an array for a lookup.
//!
//! ## Set vs. Unset
//!
//! Template compaction and "does any field have a value" checks rely on
//! [`AttributeValue::is_set`]:
//!
//! | Value | Set? |
//! |-------|------|
//! | `Null` | no |
//! | `Text("")` | no |
//! | empty `MultiSelect` / `Lookup` | no |
//! | everything else (including `0` and `false`) | yes |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::DEFAULT_LOOKUP_NAME_SEPARATOR;
use crate::error::FormError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeType {
    String,
    Number,
    Date,
    OptionSet,
    MultiSelectOptionSet,
    Lookup,
    Boolean,
}

impl AttributeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttributeType::String => "string",
            AttributeType::Number => "number",
            AttributeType::Date => "date",
            AttributeType::OptionSet => "optionset",
            AttributeType::MultiSelectOptionSet => "multiselectoptionset",
            AttributeType::Lookup => "lookup",
            AttributeType::Boolean => "boolean",
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequiredLevel {
    #[default]
    None,
    Required,
    Recommended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmitMode {
    Always,
    Never,
    #[default]
    Dirty,
}

impl SubmitMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmitMode::Always => "always",
            SubmitMode::Never => "never",
            SubmitMode::Dirty => "dirty",
        }
    }
}

impl fmt::Display for SubmitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubmitMode {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "always" => Ok(SubmitMode::Always),
            "never" => Ok(SubmitMode::Never),
            "dirty" => Ok(SubmitMode::Dirty),
            other => Err(FormError::InvalidSubmitMode(other.to_string())),
        }
    }
}

/// Argument accepted by `set_submit_mode`.
///
/// Booleans are shorthand (`true` → always, `false` → never). Text is parsed
/// at call time and rejected when it names no mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitModeArg {
    Flag(bool),
    Mode(SubmitMode),
    Text(String),
}

impl SubmitModeArg {
    pub fn resolve(&self) -> Result<SubmitMode, FormError> {
        match self {
            SubmitModeArg::Flag(true) => Ok(SubmitMode::Always),
            SubmitModeArg::Flag(false) => Ok(SubmitMode::Never),
            SubmitModeArg::Mode(mode) => Ok(*mode),
            SubmitModeArg::Text(text) => text.parse(),
        }
    }
}

impl From<bool> for SubmitModeArg {
    fn from(value: bool) -> Self {
        SubmitModeArg::Flag(value)
    }
}

impl From<SubmitMode> for SubmitModeArg {
    fn from(value: SubmitMode) -> Self {
        SubmitModeArg::Mode(value)
    }
}

impl From<&str> for SubmitModeArg {
    fn from(value: &str) -> Self {
        SubmitModeArg::Text(value.to_string())
    }
}

/// A reference to a CRM record, as held by lookup attributes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityReference {
    pub id: String,
    #[serde(rename = "entityType")]
    pub entity_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl EntityReference {
    pub fn new(id: impl Into<String>, entity_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            entity_type: entity_type.into(),
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Returns the reference with `{` and `}` removed from its id.
    pub(crate) fn without_braces(mut self) -> Self {
        self.id.retain(|c| c != '{' && c != '}');
        self
    }
}

/// One entry of an option set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionSetValue {
    pub text: String,
    pub value: i32,
}

impl OptionSetValue {
    pub fn new(text: impl Into<String>, value: i32) -> Self {
        Self {
            text: text.into(),
            value,
        }
    }
}

/// Runtime representation of an attribute value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum AttributeValue {
    #[default]
    Null,
    Text(String),
    Number(f64),
    Boolean(bool),
    Date(DateTime<Utc>),
    OptionSet(i32),
    MultiSelect(Vec<i32>),
    /// Stored form of a lookup value.
    Lookup(Vec<EntityReference>),
    /// Single-reference projection returned by `get_value` for lookups.
    Reference(EntityReference),
}

impl AttributeValue {
    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }

    /// Whether the value counts as populated (see module docs).
    pub fn is_set(&self) -> bool {
        match self {
            AttributeValue::Null => false,
            AttributeValue::Text(s) => !s.is_empty(),
            AttributeValue::MultiSelect(v) => !v.is_empty(),
            AttributeValue::Lookup(v) => !v.is_empty(),
            AttributeValue::Number(_)
            | AttributeValue::Boolean(_)
            | AttributeValue::Date(_)
            | AttributeValue::OptionSet(_)
            | AttributeValue::Reference(_) => true,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_option(&self) -> Option<i32> {
        match self {
            AttributeValue::OptionSet(v) => Some(*v),
            _ => None,
        }
    }

    /// The references held by a lookup value, `None` when the value holds none.
    pub fn as_references(&self) -> Option<&[EntityReference]> {
        match self {
            AttributeValue::Lookup(v) => Some(v),
            AttributeValue::Reference(r) => Some(std::slice::from_ref(r)),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<&EntityReference> {
        self.as_references().and_then(|refs| refs.first())
    }

    pub fn as_multi_select(&self) -> Option<&[i32]> {
        match self {
            AttributeValue::MultiSelect(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Null => Ok(()),
            AttributeValue::Text(s) => f.write_str(s),
            AttributeValue::Number(n) => write!(f, "{}", n),
            AttributeValue::Boolean(b) => write!(f, "{}", b),
            AttributeValue::Date(d) => f.write_str(&d.to_rfc3339()),
            AttributeValue::OptionSet(v) => write!(f, "{}", v),
            AttributeValue::MultiSelect(values) => {
                let parts: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                f.write_str(&parts.join(","))
            }
            AttributeValue::Lookup(refs) => {
                f.write_str(&lookup_names(refs, DEFAULT_LOOKUP_NAME_SEPARATOR))
            }
            AttributeValue::Reference(r) => f.write_str(r.name.as_deref().unwrap_or_default()),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Text(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Text(value)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Number(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Boolean(value)
    }
}

impl From<DateTime<Utc>> for AttributeValue {
    fn from(value: DateTime<Utc>) -> Self {
        AttributeValue::Date(value)
    }
}

impl From<Vec<EntityReference>> for AttributeValue {
    fn from(value: Vec<EntityReference>) -> Self {
        AttributeValue::Lookup(value)
    }
}

/// Joins the names of `refs`; unnamed references contribute empty text.
pub fn lookup_names(refs: &[EntityReference], separator: &str) -> String {
    refs.iter()
        .map(|r| r.name.as_deref().unwrap_or_default())
        .collect::<Vec<_>>()
        .join(separator)
}

/// The three call shapes of `set_value`.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueInput {
    /// A value written as-is (lookups still get normalized to an array).
    Value(AttributeValue),
    /// A single record reference.
    Reference(EntityReference),
    /// A reference given by its parts.
    Lookup {
        id: String,
        entity_type: String,
        name: Option<String>,
    },
}

impl ValueInput {
    pub fn lookup(
        id: impl Into<String>,
        entity_type: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        ValueInput::Lookup {
            id: id.into(),
            entity_type: entity_type.into(),
            name: Some(name.into()),
        }
    }

    /// Normalizes the input for a lookup attribute: always an array of
    /// brace-free references, empty when there are none.
    pub(crate) fn into_lookup_value(self) -> AttributeValue {
        let refs = match self {
            ValueInput::Value(AttributeValue::Null) => Vec::new(),
            ValueInput::Value(AttributeValue::Lookup(refs)) => refs,
            ValueInput::Value(AttributeValue::Reference(r)) | ValueInput::Reference(r) => {
                vec![r]
            }
            ValueInput::Lookup {
                id,
                entity_type,
                name,
            } => vec![EntityReference {
                id,
                entity_type,
                name,
            }],
            ValueInput::Value(other) => {
                tracing::warn!(
                    value = %other,
                    "non-reference value written to a lookup attribute"
                );
                return other;
            }
        };
        AttributeValue::Lookup(refs.into_iter().map(|r| r.without_braces()).collect())
    }

    /// Normalizes the input for every other attribute type.
    pub(crate) fn into_value(self) -> AttributeValue {
        match self {
            ValueInput::Value(value) => value,
            ValueInput::Reference(r) => AttributeValue::Lookup(vec![r]),
            ValueInput::Lookup {
                id,
                entity_type,
                name,
            } => AttributeValue::Lookup(vec![EntityReference {
                id,
                entity_type,
                name,
            }]),
        }
    }
}

impl From<AttributeValue> for ValueInput {
    fn from(value: AttributeValue) -> Self {
        ValueInput::Value(value)
    }
}

impl From<EntityReference> for ValueInput {
    fn from(value: EntityReference) -> Self {
        ValueInput::Reference(value)
    }
}

impl From<Vec<EntityReference>> for ValueInput {
    fn from(value: Vec<EntityReference>) -> Self {
        ValueInput::Value(AttributeValue::Lookup(value))
    }
}

impl From<&str> for ValueInput {
    fn from(value: &str) -> Self {
        ValueInput::Value(value.into())
    }
}

impl From<String> for ValueInput {
    fn from(value: String) -> Self {
        ValueInput::Value(value.into())
    }
}

impl From<f64> for ValueInput {
    fn from(value: f64) -> Self {
        ValueInput::Value(value.into())
    }
}

impl From<bool> for ValueInput {
    fn from(value: bool) -> Self {
        ValueInput::Value(value.into())
    }
}
