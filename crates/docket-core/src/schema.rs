use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// FieldType
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    String,
    Number,
    Date,
    Email,
    Enum,
}

impl FieldType {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Date => "date",
            FieldType::Email => "email",
            FieldType::Enum => "enum",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// FieldRule / FieldDef
// ---------------------------------------------------------------------------

/// Validation rule for one frontmatter field. Rules are configuration data;
/// the validator never hardcodes field names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldRule {
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    /// Value used by the fix engine to populate a missing required field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    /// Canonical values for `enum` fields. Matching is case-sensitive; the
    /// fix engine normalizes case-insensitive matches to the canonical form.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed: Vec<String>,
    /// Extra regex constraint for `string` fields (e.g. the id pattern).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl FieldRule {
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            required: false,
            default: None,
            allowed: Vec::new(),
            format: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn with_allowed<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_format(mut self, pattern: impl Into<String>) -> Self {
        self.format = Some(pattern.into());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(flatten)]
    pub rule: FieldRule,
}

// ---------------------------------------------------------------------------
// FieldSchema
// ---------------------------------------------------------------------------

/// Ordered field schema. Declaration order is meaningful: findings for one
/// document are reported in this order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldSchema {
    pub fields: Vec<FieldDef>,
}

impl FieldSchema {
    pub fn field(mut self, name: impl Into<String>, rule: FieldRule) -> Self {
        self.fields.push(FieldDef {
            name: name.into(),
            rule,
        });
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldRule> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| &f.rule)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
