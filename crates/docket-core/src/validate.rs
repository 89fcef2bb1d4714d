use crate::item::WorkItem;
use crate::schema::{FieldSchema, FieldType};
use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::sync::OnceLock;

/// Canonical date format for document date fields.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// ---------------------------------------------------------------------------
// Rule
// ---------------------------------------------------------------------------

/// Closed taxonomy of reportable conditions. `missing-field` (required,
/// absent, default available) is separate from `missing-default` (no usable
/// default) because only the former is auto-fixable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Rule {
    MissingField,
    MissingDefault,
    Type,
    Enum,
    Date,
    Email,
    UnknownField,
    Workflow,
    Duplicate,
    MissingSection,
    DuplicateTaskId,
    DuplicateSliceName,
}

impl Rule {
    pub fn as_str(self) -> &'static str {
        match self {
            Rule::MissingField => "missing-field",
            Rule::MissingDefault => "missing-default",
            Rule::Type => "type",
            Rule::Enum => "enum",
            Rule::Date => "date",
            Rule::Email => "email",
            Rule::UnknownField => "unknown-field",
            Rule::Workflow => "workflow",
            Rule::Duplicate => "duplicate",
            Rule::MissingSection => "missing-section",
            Rule::DuplicateTaskId => "duplicate-task-id",
            Rule::DuplicateSliceName => "duplicate-slice-name",
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Finding
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct Finding {
    pub file: PathBuf,
    pub rule: Rule,
    pub message: String,
}

impl Finding {
    pub fn new(file: impl Into<PathBuf>, rule: Rule, message: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            rule,
            message: message.into(),
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: [{}] {}", self.file.display(), self.rule, self.message)
    }
}

// ---------------------------------------------------------------------------
// Field validation
// ---------------------------------------------------------------------------

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_re() -> &'static Regex {
    EMAIL_RE.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap())
}

pub fn is_canonical_date(value: &str) -> bool {
    NaiveDate::parse_from_str(value, DATE_FORMAT).is_ok()
}

pub fn is_valid_email(value: &str) -> bool {
    email_re().is_match(value)
}

/// Validate one document's frontmatter against the schema. Pure: never
/// mutates the document. Findings come out in schema declaration order, then
/// (in strict mode) frontmatter order for unknown keys.
pub fn validate_item(item: &WorkItem, schema: &FieldSchema, strict: bool) -> Vec<Finding> {
    let mut findings = Vec::new();

    for def in schema.iter() {
        let name = def.name.as_str();
        let rule = &def.rule;

        let Some(value) = item.frontmatter.get(name) else {
            if rule.required {
                if rule.default.is_some() {
                    findings.push(Finding::new(
                        &item.path,
                        Rule::MissingField,
                        format!("missing required field '{name}'"),
                    ));
                } else {
                    findings.push(Finding::new(
                        &item.path,
                        Rule::MissingDefault,
                        format!("missing required field '{name}' and no default is defined"),
                    ));
                }
            }
            continue;
        };

        match rule.field_type {
            FieldType::String => {
                if let Some(pattern) = &rule.format {
                    if let Ok(re) = Regex::new(pattern) {
                        if !re.is_match(value) {
                            findings.push(Finding::new(
                                &item.path,
                                Rule::Type,
                                format!("field '{name}' value '{value}' does not match pattern '{pattern}'"),
                            ));
                        }
                    }
                }
            }
            FieldType::Number => {
                if value.parse::<f64>().is_err() {
                    findings.push(Finding::new(
                        &item.path,
                        Rule::Type,
                        format!("field '{name}' value '{value}' is not a number"),
                    ));
                }
            }
            FieldType::Date => {
                if !is_canonical_date(value) {
                    findings.push(Finding::new(
                        &item.path,
                        Rule::Date,
                        format!("field '{name}' value '{value}' is not a {DATE_FORMAT} date"),
                    ));
                }
            }
            FieldType::Email => {
                if !email_re().is_match(value) {
                    findings.push(Finding::new(
                        &item.path,
                        Rule::Email,
                        format!("field '{name}' value '{value}' is not a valid email"),
                    ));
                }
            }
            FieldType::Enum => {
                if !rule.allowed.iter().any(|a| a == value) {
                    findings.push(Finding::new(
                        &item.path,
                        Rule::Enum,
                        format!(
                            "field '{name}' value '{value}' is not one of: {}",
                            rule.allowed.join(", ")
                        ),
                    ));
                }
            }
        }
    }

    if strict {
        for key in item.frontmatter.keys() {
            if !schema.contains(key) {
                findings.push(Finding::new(
                    &item.path,
                    Rule::UnknownField,
                    format!("field '{key}' is not declared in the schema"),
                ));
            }
        }
    }

    findings
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
