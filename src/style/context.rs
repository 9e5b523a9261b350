//! Style identities, statuses and the shared key/tag table

use crate::attributes::{ActiveKeys, AttributeBag, AttributeValue};
use crate::markup::{is_valid_tag_name, repair_tag_name};
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

// ─────────────────────────────────────────────────────────────────────────────
// Style Definition
// ─────────────────────────────────────────────────────────────────────────────

fn default_interactive() -> bool {
    true
}

/// The immutable identity of one toggleable style.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleDefinition {
    /// Unique identifier, e.g. `"bold"`
    pub key: String,
    /// Element name used in markup, e.g. `"strong"`
    pub tag: String,
    /// Wraps whole paragraphs instead of character runs
    #[serde(default)]
    pub block: bool,
    /// Toggled by explicit user action rather than purely structural
    #[serde(default = "default_interactive")]
    pub interactive: bool,
    /// Attributes contributed by this style when active
    #[serde(default, skip_serializing_if = "AttributeBag::is_empty")]
    pub attributes: AttributeBag,
}

impl StyleDefinition {
    /// An interactive inline style.
    pub fn inline(key: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            tag: tag.into(),
            block: false,
            interactive: true,
            attributes: AttributeBag::new(),
        }
    }

    /// An interactive paragraph-level style.
    pub fn block(key: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            block: true,
            ..Self::inline(key, tag)
        }
    }

    /// The non-interactive base style that stands for "no formatting".
    pub fn plain(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            interactive: false,
            ..Self::inline(key.clone(), key)
        }
    }

    pub fn with_attribute(
        mut self,
        name: impl Into<String>,
        value: impl Into<AttributeValue>,
    ) -> Self {
        self.attributes.insert(name, value);
        self
    }
}

/// Drop duplicate keys, make sure the default key is declared and give
/// every style a usable tag name.
///
/// The first declaration of a key wins. A missing default is prepended as a
/// plain, non-interactive style. Tag names that cannot be written as markup
/// are repaired. Returns `true` if anything changed.
pub(crate) fn normalize_definitions(
    definitions: &mut Vec<StyleDefinition>,
    default_key: &str,
) -> bool {
    let before = definitions.len();
    let mut seen_keys = HashSet::new();
    definitions.retain(|definition| {
        let fresh = seen_keys.insert(definition.key.clone());
        if !fresh {
            warn!("Dropping duplicate style key '{}'", definition.key);
        }
        fresh
    });

    let mut changed = definitions.len() != before;
    if !definitions.iter().any(|d| d.key == default_key) {
        definitions.insert(0, StyleDefinition::plain(default_key));
        changed = true;
    }

    for definition in definitions.iter_mut() {
        if !is_valid_tag_name(&definition.tag) {
            let repaired = repair_tag_name(&definition.tag);
            warn!(
                "Style '{}' has invalid tag name {:?}, using <{}>",
                definition.key, definition.tag, repaired
            );
            definition.tag = repaired;
            changed = true;
        }
    }

    let mut seen_tags = HashSet::new();
    for definition in definitions.iter() {
        if !seen_tags.insert(definition.tag.as_str()) {
            warn!(
                "Style '{}' reuses tag <{}>; the first declaration wins on import",
                definition.key, definition.tag
            );
        }
    }
    changed
}

// ─────────────────────────────────────────────────────────────────────────────
// Status
// ─────────────────────────────────────────────────────────────────────────────

/// Toggle status of a style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StyleStatus {
    /// Cannot be toggled until re-enabled
    Disabled,
    /// Currently applied
    Active,
    /// Enabled but not applied
    #[default]
    Inactive,
}

impl StyleStatus {
    pub fn is_active(self) -> bool {
        matches!(self, StyleStatus::Active)
    }

    pub fn is_enabled(self) -> bool {
        !matches!(self, StyleStatus::Disabled)
    }
}

/// A style identity plus its mutable status cell.
///
/// Contexts live in the state machine's arena; the status is only changed by
/// the machine, and observers follow it through the machine's event streams.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleContext {
    definition: StyleDefinition,
    status: StyleStatus,
}

impl StyleContext {
    pub fn new(definition: StyleDefinition) -> Self {
        Self {
            definition,
            status: StyleStatus::Inactive,
        }
    }

    pub fn key(&self) -> &str {
        &self.definition.key
    }

    pub fn markup_tag(&self) -> &str {
        &self.definition.tag
    }

    pub fn is_block_style(&self) -> bool {
        self.definition.block
    }

    pub fn is_interactive_only(&self) -> bool {
        self.definition.interactive
    }

    pub fn status(&self) -> StyleStatus {
        self.status
    }

    pub fn definition(&self) -> &StyleDefinition {
        &self.definition
    }

    /// Returns `true` if the status actually changed.
    pub(crate) fn set_status(&mut self, status: StyleStatus) -> bool {
        let changed = self.status != status;
        self.status = status;
        changed
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Style Table
// ─────────────────────────────────────────────────────────────────────────────

/// Shared, immutable view of the configured styles.
///
/// Cheap to clone; handed to the markup codec and resolvers (including the
/// decode worker thread). Lookups are linear scans: vocabularies are small.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleTable {
    definitions: Arc<[StyleDefinition]>,
    default_key: String,
}

impl StyleTable {
    pub fn new(mut definitions: Vec<StyleDefinition>, default_key: impl Into<String>) -> Self {
        let default_key = default_key.into();
        normalize_definitions(&mut definitions, &default_key);
        Self {
            definitions: definitions.into(),
            default_key,
        }
    }

    pub fn definitions(&self) -> &[StyleDefinition] {
        &self.definitions
    }

    pub fn default_key(&self) -> &str {
        &self.default_key
    }

    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.definitions.iter().position(|d| d.key == key)
    }

    pub fn definition(&self, key: &str) -> Option<&StyleDefinition> {
        self.definitions.iter().find(|d| d.key == key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index_of(key).is_some()
    }

    pub fn is_block(&self, key: &str) -> bool {
        self.definition(key).is_some_and(|d| d.block)
    }

    pub fn key_for_tag(&self, tag: &str) -> Option<&str> {
        self.definitions
            .iter()
            .find(|d| d.tag == tag)
            .map(|d| d.key.as_str())
    }

    pub fn tag_for_key(&self, key: &str) -> Option<&str> {
        self.definition(key).map(|d| d.tag.as_str())
    }

    /// Configured keys among `keys`, in declaration order. Unknown keys are dropped.
    pub fn ordered<'a>(&self, keys: impl IntoIterator<Item = &'a str>) -> ActiveKeys {
        let mut indices: Vec<usize> = keys.into_iter().filter_map(|k| self.index_of(k)).collect();
        indices.sort_unstable();
        indices.dedup();
        indices
            .into_iter()
            .map(|i| self.definitions[i].key.clone())
            .collect()
    }

    /// The marker for unstyled text.
    pub fn default_keys(&self) -> ActiveKeys {
        std::iter::once(self.default_key.clone()).collect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
