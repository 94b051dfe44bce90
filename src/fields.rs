//! Typed structured fields and the merge engine behind the GELF extension
//! mapping.
//!
//! Fields keep their original type until they reach a transport boundary;
//! the GELF extension fields are string-valued, so [`merge`] coerces every
//! layer to text. Merge precedence is fixed: structural seed, then
//! contextual fields, then call-site fields, then entry-derived fields —
//! each later layer overwrites same-keyed earlier entries.

use std::collections::BTreeMap;
use std::fmt;

/// A single structured key/value pair.
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    pub key: String,
    pub value: FieldValue,
}

/// Typed field payload.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Str(String),
    Int(i64),
    Uint(u64),
    Float(f64),
    Bool(bool),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Str(v) => f.write_str(v),
            FieldValue::Int(v) => write!(f, "{v}"),
            FieldValue::Uint(v) => write!(f, "{v}"),
            FieldValue::Float(v) => write!(f, "{v}"),
            FieldValue::Bool(v) => write!(f, "{v}"),
        }
    }
}

/// Construct a string field.
pub fn string(key: impl Into<String>, value: impl Into<String>) -> Field {
    Field {
        key: key.into(),
        value: FieldValue::Str(value.into()),
    }
}

/// Construct a signed integer field.
pub fn int(key: impl Into<String>, value: i64) -> Field {
    Field {
        key: key.into(),
        value: FieldValue::Int(value),
    }
}

/// Construct an unsigned integer field.
pub fn uint(key: impl Into<String>, value: u64) -> Field {
    Field {
        key: key.into(),
        value: FieldValue::Uint(value),
    }
}

/// Construct a floating-point field.
pub fn float(key: impl Into<String>, value: f64) -> Field {
    Field {
        key: key.into(),
        value: FieldValue::Float(value),
    }
}

/// Construct a boolean field.
pub fn boolean(key: impl Into<String>, value: bool) -> Field {
    Field {
        key: key.into(),
        value: FieldValue::Bool(value),
    }
}

/// Construct a field from any `Display` value.
pub fn display(key: impl Into<String>, value: impl fmt::Display) -> Field {
    string(key, value.to_string())
}

/// Shorthand for the common `error` key.
pub fn error_field(err: &dyn std::error::Error) -> Field {
    string("error", err.to_string())
}

/// An ordered collection of fields.
///
/// Later insertions with an existing key win at merge time; the set itself
/// preserves insertion order and never deduplicates.
#[derive(Clone, Debug, Default)]
pub struct FieldSet {
    fields: Vec<Field>,
}

impl FieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: Field) {
        self.fields.push(field);
    }

    /// Return a new set with `extra` appended; the receiver is untouched.
    pub fn extended(&self, extra: &[Field]) -> Self {
        let mut fields = self.fields.clone();
        fields.extend_from_slice(extra);
        Self { fields }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl From<&[Field]> for FieldSet {
    fn from(fields: &[Field]) -> Self {
        Self {
            fields: fields.to_vec(),
        }
    }
}

/// Flatten all field layers into one string-to-string mapping.
///
/// `structural` seeds the map (source location, logger and application
/// names); `contextual` fields were attached to a logger earlier;
/// `call_site` fields arrived with this log call; `entry` fields were
/// stamped onto the encoded record itself. Later layers overwrite earlier
/// ones by key.
pub fn merge(
    structural: &[(&str, String)],
    contextual: &FieldSet,
    call_site: &[Field],
    entry: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    let mut merged = BTreeMap::new();
    for (key, value) in structural {
        merged.insert((*key).to_owned(), value.clone());
    }
    for field in contextual.iter() {
        merged.insert(field.key.clone(), field.value.to_string());
    }
    for field in call_site {
        merged.insert(field.key.clone(), field.value.to_string());
    }
    for (key, value) in entry {
        merged.insert(key.clone(), value.clone());
    }
    merged
}
