//! The attribute resolver collaborator
//!
//! The engine never decides on its own what "bold" looks like. It hands the
//! set of active style keys to an [`AttributeResolver`] and applies whatever
//! bag comes back. During markup import the same collaborator may synthesize
//! attribute entries from tag attributes (link targets, custom metadata).

use super::{ActiveKeys, AttributeBag, AttributeValue};
use crate::style::StyleTable;

/// Maps style keys to concrete attributes.
///
/// Implementations must be shareable across threads because markup decoding
/// may run on a worker thread.
pub trait AttributeResolver: Send + Sync {
    /// Produce the attribute bag for text styled with `active_keys`.
    fn resolve_attributes(&self, active_keys: &ActiveKeys) -> AttributeBag;

    /// Handle the raw attributes of an imported tag.
    ///
    /// `tag_key` is the style key for style tags, or the raw tag name for
    /// tags that are not part of the style vocabulary. The returned entries
    /// are layered over the resolved style bag for all text inside the
    /// element. Returning `None` declines: unknown tags then fail the decode.
    fn remap_on_import(
        &self,
        _tag_key: &str,
        _raw_attributes: &[(String, String)],
        _current: &AttributeBag,
    ) -> Option<AttributeBag> {
        None
    }

    /// Tag attributes to emit when encoding `key` for a run carrying `bag`.
    fn export_tag_attributes(&self, _key: &str, _bag: &AttributeBag) -> Vec<(String, String)> {
        Vec::new()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Configured Resolver
// ─────────────────────────────────────────────────────────────────────────────

/// Resolver driven by the `attributes` declared on each style definition.
///
/// Bags of the active keys are merged in key order, so later keys win on
/// conflicting entries. Tag attributes on style tags are kept under
/// `"<key>.<attribute>"` entries and exported back on encode.
#[derive(Debug, Clone)]
pub struct ConfiguredResolver {
    table: StyleTable,
}

impl ConfiguredResolver {
    pub fn new(table: StyleTable) -> Self {
        Self { table }
    }

    fn entry_name(key: &str, attribute: &str) -> String {
        format!("{}.{}", key, attribute)
    }
}

impl AttributeResolver for ConfiguredResolver {
    fn resolve_attributes(&self, active_keys: &ActiveKeys) -> AttributeBag {
        let mut bag = AttributeBag::new();
        for key in active_keys.iter() {
            if let Some(definition) = self.table.definition(key) {
                bag.merge(&definition.attributes);
            }
        }
        bag
    }

    fn remap_on_import(
        &self,
        tag_key: &str,
        raw_attributes: &[(String, String)],
        _current: &AttributeBag,
    ) -> Option<AttributeBag> {
        if !self.table.contains(tag_key) {
            return None;
        }
        Some(
            raw_attributes
                .iter()
                .map(|(name, value)| (Self::entry_name(tag_key, name), value.as_str()))
                .collect(),
        )
    }

    fn export_tag_attributes(&self, key: &str, bag: &AttributeBag) -> Vec<(String, String)> {
        let prefix = format!("{}.", key);
        bag.iter()
            .filter_map(|(name, value)| {
                let attribute = name.strip_prefix(&prefix)?;
                let text = match value {
                    AttributeValue::Text(s) => s.clone(),
                    AttributeValue::Int(i) => i.to_string(),
                    AttributeValue::Bool(b) => b.to_string(),
                };
                Some((attribute.to_string(), text))
            })
            .collect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
