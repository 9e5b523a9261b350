//! Style configuration
//!
//! This module defines the `StyleSettings` struct: the ordered style
//! vocabulary, the designated default style, the markup root tag, and the
//! conflict rules, with serde support for JSON and TOML persistence.

use crate::markup::is_valid_tag_name;
use crate::style::{normalize_definitions, StyleDefinition, StyleTable};
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

// ─────────────────────────────────────────────────────────────────────────────
// Conflict Rules
// ─────────────────────────────────────────────────────────────────────────────

/// Declarative conflict table consumed by `RulePolicy`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConflictRules {
    /// Groups of keys of which at most one may be active
    pub exclusive: Vec<Vec<String>>,
    /// Keys forced active alongside a key
    pub implies: BTreeMap<String, Vec<String>>,
    /// Keys disabled while a key is active
    pub disables: BTreeMap<String, Vec<String>>,
}

impl ConflictRules {
    /// Remove every reference to keys outside `known`. Returns `true` if
    /// anything was dropped.
    fn retain_known(&mut self, known: &HashSet<String>) -> bool {
        let mut dropped = false;
        let mut keep = |key: &String| {
            let ok = known.contains(key);
            if !ok {
                warn!("Conflict rules reference unknown style key '{}'", key);
                dropped = true;
            }
            ok
        };

        for group in &mut self.exclusive {
            group.retain(&mut keep);
        }
        for map in [&mut self.implies, &mut self.disables] {
            map.retain(|key, _| keep(key));
            for targets in map.values_mut() {
                targets.retain(&mut keep);
            }
        }
        self.exclusive.retain(|group| group.len() > 1);
        dropped
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Main Settings Struct
// ─────────────────────────────────────────────────────────────────────────────

/// Complete style configuration, supplied once when an engine is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleSettings {
    /// Style active after a reset; text with no tags carries it
    pub default_key: String,

    /// Element name used when a whole document is wrapped
    pub root_tag: String,

    /// Ordered style vocabulary; order decides tag nesting
    pub styles: Vec<StyleDefinition>,

    /// How toggles interact
    pub rules: ConflictRules,
}

impl Default for StyleSettings {
    fn default() -> Self {
        crate::presets::standard_settings()
    }
}

impl StyleSettings {
    /// Root tag used when none is configured.
    pub const DEFAULT_ROOT_TAG: &'static str = "document";

    /// Settings with no rules; styles toggle independently of each other.
    pub fn new(styles: Vec<StyleDefinition>, default_key: impl Into<String>) -> Self {
        let mut settings = Self {
            default_key: default_key.into(),
            root_tag: Self::DEFAULT_ROOT_TAG.to_string(),
            styles,
            rules: ConflictRules::default(),
        };
        settings.sanitize();
        settings
    }

    /// Repair settings that were hand-edited into an inconsistent state.
    ///
    /// - duplicate style keys are dropped (first wins)
    /// - the default key is declared if missing
    /// - rules naming unknown keys are pruned
    /// - an empty or clashing root tag falls back to the default
    pub fn sanitize(&mut self) {
        if self.default_key.trim().is_empty() {
            warn!("Empty default style key, using 'plain'");
            self.default_key = "plain".to_string();
        }

        normalize_definitions(&mut self.styles, &self.default_key);

        let known: HashSet<String> = self.styles.iter().map(|d| d.key.clone()).collect();
        self.rules.retain_known(&known);

        let clashes = self.styles.iter().any(|d| d.tag == self.root_tag);
        if !is_valid_tag_name(&self.root_tag) || clashes {
            if clashes {
                warn!(
                    "Root tag <{}> collides with a style tag, using <{}>",
                    self.root_tag,
                    Self::DEFAULT_ROOT_TAG
                );
            } else {
                warn!(
                    "Invalid root tag name {:?}, using <{}>",
                    self.root_tag,
                    Self::DEFAULT_ROOT_TAG
                );
            }
            self.root_tag = Self::DEFAULT_ROOT_TAG.to_string();
        }
    }

    /// The shared key/tag table for these settings.
    pub fn table(&self) -> StyleTable {
        StyleTable::new(self.styles.clone(), self.default_key.clone())
    }

    /// Load settings from JSON and sanitize them.
    pub fn from_json_sanitized(json: &str) -> Result<Self, serde_json::Error> {
        let mut settings: Self = serde_json::from_str(json)?;
        settings.sanitize();
        Ok(settings)
    }

    /// Load settings from TOML and sanitize them.
    pub fn from_toml_sanitized(source: &str) -> Result<Self, toml::de::Error> {
        let mut settings: Self = toml::from_str(source)?;
        settings.sanitize();
        Ok(settings)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_are_standard_preset() {
        let settings = StyleSettings::default();
        assert_eq!(settings.default_key, "plain");
        assert_eq!(settings.root_tag, "document");
        assert!(settings.styles.iter().any(|d| d.key == "bold"));
        assert_eq!(settings.styles[0].key, "plain");
    }

    #[test]
    fn test_settings_serialization_roundtrip() {
        let original = StyleSettings::default();
        let json = serde_json::to_string_pretty(&original).unwrap();
        let deserialized: StyleSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(original, deserialized);
    }

    #[test]
    fn test_settings_deserialize_empty_json() {
        let settings: StyleSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, StyleSettings::default());
    }

    #[test]
    fn test_new_declares_missing_default() {
        let settings = StyleSettings::new(
            vec![
                StyleDefinition::inline("b", "bold"),
                StyleDefinition::inline("i", "italic"),
            ],
            "none",
        );
        let keys: Vec<&str> = settings.styles.iter().map(|d| d.key.as_str()).collect();
        assert_eq!(keys, vec!["none", "b", "i"]);
    }

    #[test]
    fn test_sanitize_prunes_unknown_rule_keys() {
        let json = r#"{
            "default_key": "none",
            "styles": [{"key": "b", "tag": "bold"}, {"key": "i", "tag": "italic"}],
            "rules": {
                "exclusive": [["b", "ghost"], ["b", "i"]],
                "implies": {"ghost": ["b"], "b": ["ghost", "i"]}
            }
        }"#;
        let settings = StyleSettings::from_json_sanitized(json).unwrap();
        assert_eq!(settings.rules.exclusive, vec![vec!["b".to_string(), "i".to_string()]]);
        assert!(!settings.rules.implies.contains_key("ghost"));
        assert_eq!(settings.rules.implies["b"], vec!["i".to_string()]);
    }

    #[test]
    fn test_sanitize_root_tag_clash() {
        let json = r#"{
            "default_key": "none",
            "root_tag": "bold",
            "styles": [{"key": "b", "tag": "bold"}]
        }"#;
        let settings = StyleSettings::from_json_sanitized(json).unwrap();
        assert_eq!(settings.root_tag, StyleSettings::DEFAULT_ROOT_TAG);
    }

    #[test]
    fn test_sanitize_invalid_root_tag() {
        for root_tag in ["my doc", "", "9doc"] {
            let mut settings = StyleSettings::default();
            settings.root_tag = root_tag.to_string();
            settings.sanitize();
            assert_eq!(settings.root_tag, StyleSettings::DEFAULT_ROOT_TAG);
        }
    }

    #[test]
    fn test_sanitize_repairs_style_tags() {
        let json = r#"{
            "default_key": "none",
            "styles": [{"key": "b", "tag": "my bold"}]
        }"#;
        let settings = StyleSettings::from_json_sanitized(json).unwrap();
        assert_eq!(settings.table().tag_for_key("b"), Some("my-bold"));
    }

    #[test]
    fn test_from_toml_sanitized() {
        let source = r#"
default_key = "none"
root_tag = "doc"

[[styles]]
key = "b"
tag = "bold"
attributes = { font-weight = "bold" }

[[styles]]
key = "quote"
tag = "blockquote"
block = true
"#;
        let settings = StyleSettings::from_toml_sanitized(source).unwrap();
        assert_eq!(settings.root_tag, "doc");
        assert_eq!(settings.styles.len(), 3);
        assert!(settings.styles[2].block);
        assert!(settings.styles[1].attributes.contains("font-weight"));
    }
}
