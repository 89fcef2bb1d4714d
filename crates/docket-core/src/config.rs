use crate::error::{DocketError, Result};
use crate::paths;
use crate::schema::{FieldRule, FieldSchema, FieldType};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// StatusDef / GitConfig
// ---------------------------------------------------------------------------

/// One workflow status and the folder that stores items in that status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusDef {
    pub name: String,
    pub folder: String,
}

impl StatusDef {
    fn same(name: &str) -> Self {
        Self {
            name: name.to_string(),
            folder: name.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GitConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_email: Option<String>,
    /// Commit document edits (slice changes, moves, fixes) automatically.
    #[serde(default)]
    pub auto_commit: bool,
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    pub project: String,
    /// Directory under the root that holds the per-status folders.
    #[serde(default = "default_items_dir")]
    pub items_dir: String,
    #[serde(default = "default_statuses")]
    pub statuses: Vec<StatusDef>,
    /// Allowed status transitions: from → list of targets.
    #[serde(default = "default_transitions")]
    pub transitions: HashMap<String, Vec<String>>,
    /// Flag frontmatter keys that are absent from the schema.
    #[serde(default)]
    pub strict: bool,
    /// Whether a missing `## Slices` section is a lint finding.
    #[serde(default)]
    pub require_slices: bool,
    #[serde(default = "default_id_digits")]
    pub id_digits: usize,
    #[serde(default = "default_schema")]
    pub schema: FieldSchema,
    #[serde(default)]
    pub git: GitConfig,
}

fn default_version() -> u32 {
    1
}

fn default_items_dir() -> String {
    "work".to_string()
}

fn default_id_digits() -> usize {
    3
}

fn default_statuses() -> Vec<StatusDef> {
    ["backlog", "doing", "review", "done"]
        .iter()
        .map(|s| StatusDef::same(s))
        .collect()
}

fn default_transitions() -> HashMap<String, Vec<String>> {
    let mut m = HashMap::new();
    m.insert("backlog".to_string(), vec!["doing".to_string()]);
    m.insert(
        "doing".to_string(),
        vec!["review".to_string(), "backlog".to_string()],
    );
    m.insert(
        "review".to_string(),
        vec!["done".to_string(), "doing".to_string()],
    );
    m.insert("done".to_string(), Vec::new());
    m
}

fn default_schema() -> FieldSchema {
    FieldSchema::default()
        .field(
            "id",
            FieldRule::new(FieldType::String)
                .required()
                .with_format(r"^\d{3}$"),
        )
        .field(
            "status",
            FieldRule::new(FieldType::Enum)
                .required()
                .with_allowed(["backlog", "doing", "review", "done"]),
        )
        .field(
            "kind",
            FieldRule::new(FieldType::Enum)
                .required()
                .with_allowed(["task", "bug", "feature"]),
        )
        .field("created", FieldRule::new(FieldType::Date).required())
        .field("updated", FieldRule::new(FieldType::Date))
        .field(
            "priority",
            FieldRule::new(FieldType::Enum)
                .required()
                .with_default("medium")
                .with_allowed(["low", "medium", "high"]),
        )
        .field("assigned", FieldRule::new(FieldType::Email))
        .field("estimate", FieldRule::new(FieldType::Number))
}

impl Config {
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            version: 1,
            project: project.into(),
            items_dir: default_items_dir(),
            statuses: default_statuses(),
            transitions: default_transitions(),
            strict: false,
            require_slices: false,
            id_digits: default_id_digits(),
            schema: default_schema(),
            git: GitConfig::default(),
        }
    }

    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Err(DocketError::NotInitialized);
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    // -----------------------------------------------------------------------
    // Status lookups
    // -----------------------------------------------------------------------

    pub fn is_status(&self, name: &str) -> bool {
        self.statuses.iter().any(|s| s.name == name)
    }

    pub fn folder_for_status(&self, name: &str) -> Option<&str> {
        self.statuses
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.folder.as_str())
    }

    /// Canonical status implied by a storage folder name.
    pub fn status_for_folder(&self, folder: &str) -> Option<&str> {
        self.statuses
            .iter()
            .find(|s| s.folder == folder)
            .map(|s| s.name.as_str())
    }

    /// The status assigned to newly created items (first in declaration order).
    pub fn initial_status(&self) -> &str {
        self.statuses
            .first()
            .map(|s| s.name.as_str())
            .unwrap_or("backlog")
    }

    pub fn transitions_from(&self, status: &str) -> &[String] {
        self.transitions
            .get(status)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        let warn = |warnings: &mut Vec<ConfigWarning>, message: String| {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message,
            });
        };

        if self.statuses.is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "no statuses configured".to_string(),
            });
        }

        if self.id_digits == 0 || self.id_digits > 9 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!("id_digits={} is out of range (1-9)", self.id_digits),
            });
        }

        // Duplicate status names or folders collapse two states into one.
        for (i, s) in self.statuses.iter().enumerate() {
            if self.statuses[..i].iter().any(|o| o.name == s.name) {
                warn(&mut warnings, format!("duplicate status '{}'", s.name));
            }
            if self.statuses[..i].iter().any(|o| o.folder == s.folder) {
                warn(
                    &mut warnings,
                    format!("folder '{}' is mapped to more than one status", s.folder),
                );
            }
        }

        // Transition endpoints must be known statuses.
        for (from, targets) in &self.transitions {
            if !self.is_status(from) {
                warn(
                    &mut warnings,
                    format!("transition source '{from}' is not a configured status"),
                );
            }
            for to in targets {
                if !self.is_status(to) {
                    warn(
                        &mut warnings,
                        format!("transition target '{to}' is not a configured status"),
                    );
                }
            }
        }

        // Schema smells: empty enums, invalid format patterns, and a status
        // enum that disagrees with the configured statuses.
        for def in self.schema.iter() {
            if def.rule.field_type == FieldType::Enum && def.rule.allowed.is_empty() {
                warn(
                    &mut warnings,
                    format!("enum field '{}' has no allowed values", def.name),
                );
            }
            if let Some(pattern) = &def.rule.format {
                if regex::Regex::new(pattern).is_err() {
                    warn(
                        &mut warnings,
                        format!("field '{}' has an invalid format pattern", def.name),
                    );
                }
            }
        }
        if let Some(rule) = self.schema.get("status") {
            for s in &self.statuses {
                if !rule.allowed.is_empty() && !rule.allowed.contains(&s.name) {
                    warn(
                        &mut warnings,
                        format!(
                            "status '{}' is not allowed by the schema's status field",
                            s.name
                        ),
                    );
                }
            }
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::new("tracker");
        let yaml = serde_yaml::to_string(&cfg).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.project, "tracker");
        assert_eq!(parsed.version, 1);
        assert_eq!(parsed.statuses.len(), 4);
        assert_eq!(parsed.id_digits, 3);
    }

    #[test]
    fn minimal_yaml_gets_defaults() {
        let yaml = "project: my-tracker\n";
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.items_dir, "work");
        assert_eq!(cfg.statuses, default_statuses());
        assert!(!cfg.strict);
        assert!(!cfg.git.auto_commit);
        assert!(cfg.schema.contains("id"));
    }

    #[test]
    fn save_and_load() {
        let dir = TempDir::new().unwrap();
        let cfg = Config::new("tracker");
        cfg.save(dir.path()).unwrap();
        let loaded = Config::load(dir.path()).unwrap();
        assert_eq!(loaded.project, "tracker");
    }

    #[test]
    fn load_uninitialized_fails() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            Config::load(dir.path()),
            Err(DocketError::NotInitialized)
        ));
    }

    #[test]
    fn status_folder_lookups() {
        let cfg = Config::new("t");
        assert!(cfg.is_status("doing"));
        assert!(!cfg.is_status("shipped"));
        assert_eq!(cfg.folder_for_status("review"), Some("review"));
        assert_eq!(cfg.status_for_folder("backlog"), Some("backlog"));
        assert_eq!(cfg.status_for_folder("nope"), None);
        assert_eq!(cfg.initial_status(), "backlog");
    }

    #[test]
    fn default_transitions_shape() {
        let cfg = Config::new("t");
        assert_eq!(cfg.transitions_from("backlog"), ["doing"]);
        assert!(cfg
            .transitions_from("review")
            .contains(&"doing".to_string()));
        assert!(cfg.transitions_from("done").is_empty());
        assert!(cfg.transitions_from("unknown").is_empty());
    }

    #[test]
    fn validate_clean_config() {
        let cfg = Config::new("t");
        assert!(cfg.validate().is_empty());
    }

    #[test]
    fn validate_duplicate_folder() {
        let mut cfg = Config::new("t");
        cfg.statuses.push(StatusDef {
            name: "blocked".to_string(),
            folder: "doing".to_string(),
        });
        let warnings = cfg.validate();
        assert!(warnings
            .iter()
            .any(|w| w.message.contains("mapped to more than one status")));
    }

    #[test]
    fn validate_unknown_transition_target() {
        let mut cfg = Config::new("t");
        cfg.transitions
            .insert("doing".to_string(), vec!["shipped".to_string()]);
        let warnings = cfg.validate();
        assert!(warnings
            .iter()
            .any(|w| w.message.contains("target 'shipped'")));
    }

    #[test]
    fn validate_schema_status_mismatch() {
        let mut cfg = Config::new("t");
        cfg.statuses.push(StatusDef::same("blocked"));
        let warnings = cfg.validate();
        assert!(warnings
            .iter()
            .any(|w| w.message.contains("status 'blocked'")));
    }

    #[test]
    fn validate_bad_format_pattern() {
        let mut cfg = Config::new("t");
        cfg.schema = FieldSchema::default().field(
            "id",
            FieldRule::new(FieldType::String).with_format(r"([unclosed"),
        );
        let warnings = cfg.validate();
        assert!(warnings
            .iter()
            .any(|w| w.message.contains("invalid format pattern")));
    }

    #[test]
    fn validate_id_digits_out_of_range() {
        let mut cfg = Config::new("t");
        cfg.id_digits = 0;
        assert!(cfg
            .validate()
            .iter()
            .any(|w| w.level == WarnLevel::Error && w.message.contains("id_digits")));
    }
}
