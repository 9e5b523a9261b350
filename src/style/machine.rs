//! The typing-context state machine
//!
//! Owns the arena of [`StyleContext`]s, applies toggle requests through the
//! configured [`ConflictPolicy`], and publishes the resulting key sets and
//! attribute bags on its event streams.

use super::context::{StyleContext, StyleStatus, StyleTable};
use super::events::EventStream;
use super::policy::{ConflictPolicy, RulePolicy, StatusManageContext};
use crate::attributes::{ActiveKeys, AttributeResolver, TextAttributes};
use crate::config::StyleSettings;
use crate::error::StyleError;
use log::{debug, info};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// A set of style keys as published on the event streams.
pub type KeySet = BTreeSet<String>;

// ─────────────────────────────────────────────────────────────────────────────
// Events and Outcomes
// ─────────────────────────────────────────────────────────────────────────────

/// Per-context status notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub key: String,
    pub status: StyleStatus,
}

/// Where the attributes produced by a toggle should be applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeTarget {
    /// Whole paragraphs (the toggled style is a block style)
    Block,
    /// The typing attribute for subsequent input
    Typing,
}

/// The effect of a toggle that was not vetoed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleOutcome {
    pub key: String,
    pub partition: StatusManageContext,
    /// Attributes for the full set of active keys after the toggle
    pub attributes: TextAttributes,
    pub target: AttributeTarget,
}

/// All streams published by the state machine.
#[derive(Debug, Default)]
pub struct StyleEvents {
    pub active: EventStream<KeySet>,
    pub inactive: EventStream<KeySet>,
    pub enabled: EventStream<KeySet>,
    pub disabled: EventStream<KeySet>,
    pub status: EventStream<StatusChange>,
    pub block_attributes: EventStream<TextAttributes>,
    pub typing_attributes: EventStream<TextAttributes>,
}

// ─────────────────────────────────────────────────────────────────────────────
// State Machine
// ─────────────────────────────────────────────────────────────────────────────

/// Tracks which styles are active, inactive or disabled.
pub struct StyleStateMachine {
    contexts: Vec<StyleContext>,
    table: StyleTable,
    policy: Box<dyn ConflictPolicy>,
    resolver: Arc<dyn AttributeResolver>,
    events: StyleEvents,
}

impl fmt::Debug for StyleStateMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StyleStateMachine")
            .field("contexts", &self.contexts)
            .field("default_key", &self.table.default_key())
            .finish_non_exhaustive()
    }
}

impl StyleStateMachine {
    /// Build a machine over `table`. The machine starts in the reset state.
    pub fn new(
        table: StyleTable,
        policy: impl ConflictPolicy + 'static,
        resolver: Arc<dyn AttributeResolver>,
    ) -> Self {
        let contexts = table
            .definitions()
            .iter()
            .cloned()
            .map(StyleContext::new)
            .collect();
        let mut machine = Self {
            contexts,
            table,
            policy: Box::new(policy),
            resolver,
            events: StyleEvents::default(),
        };
        machine.reset();
        machine
    }

    /// Build a machine from settings, using the settings' conflict rules.
    pub fn from_settings(settings: &StyleSettings, resolver: Arc<dyn AttributeResolver>) -> Self {
        let table = settings.table();
        let policy = RulePolicy::new(settings.rules.clone(), table.default_key());
        Self::new(table, policy, resolver)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Reset and Sync
    // ─────────────────────────────────────────────────────────────────────────

    /// Activate the default style and set every other style inactive.
    ///
    /// Returns the default attributes, which are also published as the
    /// typing attribute.
    pub fn reset(&mut self) -> TextAttributes {
        let default_key = self.table.default_key().to_string();
        for index in 0..self.contexts.len() {
            let status = if self.contexts[index].key() == default_key {
                StyleStatus::Active
            } else {
                StyleStatus::Inactive
            };
            self.set_status(index, status);
        }

        let others: KeySet = self
            .contexts
            .iter()
            .filter(|c| c.key() != default_key)
            .map(|c| c.key().to_string())
            .collect();
        self.events.active.emit(KeySet::from([default_key]));
        self.events.inactive.emit(others.clone());
        self.events.enabled.emit(others);
        self.events.disabled.emit(KeySet::new());

        let attributes = self.default_attributes();
        self.events.typing_attributes.emit(attributes.clone());
        debug!("Style state reset to default '{}'", self.table.default_key());
        attributes
    }

    /// Make exactly `keys` active without consulting the conflict policy.
    ///
    /// Used when the caret lands in text whose styles are already known.
    /// Disabled styles not in `keys` stay disabled; unknown keys are ignored.
    pub fn sync_active(&mut self, keys: &ActiveKeys) {
        for index in 0..self.contexts.len() {
            let wanted = keys.contains(self.contexts[index].key());
            let status = self.contexts[index].status();
            if wanted {
                self.set_status(index, StyleStatus::Active);
            } else if status.is_active() {
                self.set_status(index, StyleStatus::Inactive);
            }
        }
        let active = self.keys_with(StyleStatus::Active);
        let inactive = self.keys_with(StyleStatus::Inactive);
        self.events.active.emit(active);
        self.events.inactive.emit(inactive);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Toggle
    // ─────────────────────────────────────────────────────────────────────────

    /// Toggle `key`, panicking if it is not configured.
    ///
    /// Returns `None` when the style is disabled or the policy vetoed.
    pub fn toggle(&mut self, key: &str) -> Option<ToggleOutcome> {
        match self.try_toggle(key) {
            Ok(outcome) => outcome,
            Err(err) => panic!("style toggle misuse: {}", err),
        }
    }

    /// Toggle `key`, reporting misuse as an error instead of panicking.
    ///
    /// Nothing changes when an error is returned.
    pub fn try_toggle(&mut self, key: &str) -> Result<Option<ToggleOutcome>, StyleError> {
        let index = self
            .index_of(key)
            .ok_or_else(|| StyleError::UnknownKey(key.to_string()))?;

        let will_be_active = match self.contexts[index].status() {
            StyleStatus::Active => false,
            StyleStatus::Inactive => true,
            StyleStatus::Disabled => {
                debug!("Ignoring toggle of disabled style '{}'", key);
                return Ok(None);
            }
        };

        let previously_active: Vec<String> = self
            .contexts
            .iter()
            .filter(|c| c.key() != key && c.status().is_active())
            .map(|c| c.key().to_string())
            .collect();

        let Some(partition) = self
            .policy
            .resolve(key, will_be_active, &previously_active)
        else {
            debug!("Conflict policy vetoed toggle of '{}'", key);
            return Ok(None);
        };

        if let Some(unknown) = partition.keys().find(|k| self.index_of(k).is_none()) {
            return Err(StyleError::UnknownPartitionKey {
                toggled: key.to_string(),
                key: unknown.clone(),
            });
        }

        self.apply_partition(&partition);
        self.events.active.emit(partition.active.clone());
        self.events.inactive.emit(partition.inactive.clone());
        self.events.disabled.emit(partition.disable.clone());
        self.events.enabled.emit(partition.inactive.clone());

        let attributes = self.attributes_for(&self.active_keys());
        let target = if self.contexts[index].is_block_style() {
            self.events.block_attributes.emit(attributes.clone());
            AttributeTarget::Block
        } else {
            self.events.typing_attributes.emit(attributes.clone());
            AttributeTarget::Typing
        };

        info!(
            "Toggled '{}' {}; active: {:?}",
            key,
            if will_be_active { "on" } else { "off" },
            self.active_keys().as_slice()
        );

        Ok(Some(ToggleOutcome {
            key: key.to_string(),
            partition,
            attributes,
            target,
        }))
    }

    fn apply_partition(&mut self, partition: &StatusManageContext) {
        let assignments = [
            (&partition.active, StyleStatus::Active),
            (&partition.inactive, StyleStatus::Inactive),
            (&partition.disable, StyleStatus::Disabled),
        ];
        for (keys, status) in assignments {
            for key in keys {
                if let Some(index) = self.index_of(key) {
                    self.set_status(index, status);
                }
            }
        }
    }

    fn set_status(&mut self, index: usize, status: StyleStatus) {
        if self.contexts[index].set_status(status) {
            self.events.status.emit(StatusChange {
                key: self.contexts[index].key().to_string(),
                status,
            });
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Attributes
    // ─────────────────────────────────────────────────────────────────────────

    /// Resolve `keys` to concrete attributes, tagged with the key marker.
    pub fn attributes_for(&self, keys: &ActiveKeys) -> TextAttributes {
        TextAttributes::new(self.resolver.resolve_attributes(keys), keys.clone())
    }

    /// Resolve `keys` for text that currently carries `previous`.
    ///
    /// Entries of `previous` that its own keys do not explain (imported tag
    /// attributes such as `link.href`) are carried over, unless they are
    /// scoped to a style (`"<key>.<name>"`) that is not in `keys`.
    pub fn rederive_attributes(&self, keys: &ActiveKeys, previous: &TextAttributes) -> TextAttributes {
        let mut attributes = self.attributes_for(keys);
        let previous_keys = previous
            .marker()
            .cloned()
            .unwrap_or_else(|| self.table.default_keys());
        let explained = self.resolver.resolve_attributes(&previous_keys);

        for (name, value) in previous.bag.iter() {
            if explained.get(name) == Some(value) {
                continue;
            }
            let owner_dropped = self.table.definitions().iter().any(|definition| {
                name.strip_prefix(definition.key.as_str())
                    .is_some_and(|rest| rest.starts_with('.'))
                    && !keys.contains(&definition.key)
            });
            if !owner_dropped {
                attributes.bag.insert(name.clone(), value.clone());
            }
        }
        attributes
    }

    /// Attributes of unstyled text.
    pub fn default_attributes(&self) -> TextAttributes {
        self.attributes_for(&self.table.default_keys())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    /// All currently active keys, in declaration order.
    pub fn active_keys(&self) -> ActiveKeys {
        self.contexts
            .iter()
            .filter(|c| c.status().is_active())
            .map(|c| c.key().to_string())
            .collect()
    }

    fn keys_with(&self, status: StyleStatus) -> KeySet {
        self.contexts
            .iter()
            .filter(|c| c.status() == status)
            .map(|c| c.key().to_string())
            .collect()
    }

    fn index_of(&self, key: &str) -> Option<usize> {
        self.contexts.iter().position(|c| c.key() == key)
    }

    pub fn context(&self, key: &str) -> Option<&StyleContext> {
        self.contexts.iter().find(|c| c.key() == key)
    }

    pub fn contexts(&self) -> &[StyleContext] {
        &self.contexts
    }

    pub fn status_of(&self, key: &str) -> Option<StyleStatus> {
        self.context(key).map(StyleContext::status)
    }

    pub fn is_active(&self, key: &str) -> bool {
        self.status_of(key).is_some_and(StyleStatus::is_active)
    }

    pub fn is_enabled(&self, key: &str) -> bool {
        self.status_of(key).is_some_and(StyleStatus::is_enabled)
    }

    pub fn key_for_tag(&self, tag: &str) -> Option<&str> {
        self.table.key_for_tag(tag)
    }

    pub fn tag_for_key(&self, key: &str) -> Option<&str> {
        self.table.tag_for_key(key)
    }

    pub fn table(&self) -> &StyleTable {
        &self.table
    }

    pub fn resolver(&self) -> &Arc<dyn AttributeResolver> {
        &self.resolver
    }

    pub fn events(&self) -> &StyleEvents {
        &self.events
    }

    /// Subscribe to the event streams.
    pub fn events_mut(&mut self) -> &mut StyleEvents {
        &mut self.events
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
