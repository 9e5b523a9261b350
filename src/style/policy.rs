//! Conflict resolution between styles
//!
//! Toggling one style is rarely independent: a heading may force bold on and
//! lock lists out. The state machine does not know these rules. It asks a
//! [`ConflictPolicy`] for the resulting partition and applies it verbatim.

use crate::config::ConflictRules;
use std::collections::BTreeSet;

// ─────────────────────────────────────────────────────────────────────────────
// Partition
// ─────────────────────────────────────────────────────────────────────────────

/// The outcome of one toggle request: three disjoint key sets.
///
/// Keys not mentioned keep their previous status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusManageContext {
    pub active: BTreeSet<String>,
    pub inactive: BTreeSet<String>,
    pub disable: BTreeSet<String>,
}

impl StatusManageContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn activate(mut self, key: impl Into<String>) -> Self {
        self.active.insert(key.into());
        self
    }

    pub fn deactivate(mut self, key: impl Into<String>) -> Self {
        self.inactive.insert(key.into());
        self
    }

    pub fn disable(mut self, key: impl Into<String>) -> Self {
        self.disable.insert(key.into());
        self
    }

    /// Every key mentioned in any of the three sets.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.active
            .iter()
            .chain(self.inactive.iter())
            .chain(self.disable.iter())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Policy Trait
// ─────────────────────────────────────────────────────────────────────────────

/// Decides the status partition for a toggle request.
pub trait ConflictPolicy {
    /// `previously_active` holds every currently active key except
    /// `toggled_key`, in declaration order. Returning `None` vetoes the
    /// toggle.
    fn resolve(
        &self,
        toggled_key: &str,
        will_be_active: bool,
        previously_active: &[String],
    ) -> Option<StatusManageContext>;
}

impl<F> ConflictPolicy for F
where
    F: Fn(&str, bool, &[String]) -> Option<StatusManageContext>,
{
    fn resolve(
        &self,
        toggled_key: &str,
        will_be_active: bool,
        previously_active: &[String],
    ) -> Option<StatusManageContext> {
        self(toggled_key, will_be_active, previously_active)
    }
}

/// Every style toggles on its own; nothing else changes.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndependentToggles;

impl ConflictPolicy for IndependentToggles {
    fn resolve(
        &self,
        toggled_key: &str,
        will_be_active: bool,
        _previously_active: &[String],
    ) -> Option<StatusManageContext> {
        let partition = StatusManageContext::new();
        Some(if will_be_active {
            partition.activate(toggled_key)
        } else {
            partition.deactivate(toggled_key)
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Rule Policy
// ─────────────────────────────────────────────────────────────────────────────

/// Table-driven policy built from [`ConflictRules`].
///
/// - Activating a key activates the keys it implies.
/// - Activated keys deactivate the other active members of their exclusive groups.
/// - Activated keys disable the keys they list under `disables`; deactivating
///   re-enables those keys unless another active key still disables them.
/// - Activating the default key clears every other active key; the default
///   key itself cannot be switched off.
#[derive(Debug, Clone)]
pub struct RulePolicy {
    rules: ConflictRules,
    default_key: String,
}

impl RulePolicy {
    pub fn new(rules: ConflictRules, default_key: impl Into<String>) -> Self {
        Self {
            rules,
            default_key: default_key.into(),
        }
    }

    fn implied(&self, key: &str) -> Vec<String> {
        let mut keys = vec![key.to_string()];
        if let Some(extra) = self.rules.implies.get(key) {
            for k in extra {
                if !keys.contains(k) {
                    keys.push(k.clone());
                }
            }
        }
        keys
    }

    fn disabled_by(&self, key: &str) -> impl Iterator<Item = &String> {
        self.rules.disables.get(key).into_iter().flatten()
    }

    fn group_peers<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a String> + 'a {
        self.rules
            .exclusive
            .iter()
            .filter(move |group| group.iter().any(|k| k == key))
            .flatten()
            .filter(move |k| *k != key)
    }
}

impl ConflictPolicy for RulePolicy {
    fn resolve(
        &self,
        toggled_key: &str,
        will_be_active: bool,
        previously_active: &[String],
    ) -> Option<StatusManageContext> {
        let mut partition = StatusManageContext::new();

        if toggled_key == self.default_key {
            if !will_be_active {
                return None;
            }
            partition.active.insert(toggled_key.to_string());
            for key in previously_active {
                if *key != self.default_key {
                    partition.inactive.insert(key.clone());
                }
            }
            return Some(partition);
        }

        if will_be_active {
            let turned_on = self.implied(toggled_key);
            for key in &turned_on {
                for disabled in self.disabled_by(key) {
                    partition.disable.insert(disabled.clone());
                }
            }
            for key in &turned_on {
                if partition.disable.contains(key) {
                    continue;
                }
                partition.active.insert(key.clone());
                for peer in self.group_peers(key) {
                    if previously_active.contains(peer) && !turned_on.contains(peer) {
                        partition.inactive.insert(peer.clone());
                    }
                }
            }
            for disabled in &partition.disable {
                partition.inactive.remove(disabled);
            }
        } else {
            partition.inactive.insert(toggled_key.to_string());
            let still_disabled: BTreeSet<&String> = previously_active
                .iter()
                .flat_map(|key| self.disabled_by(key))
                .collect();
            for key in self.disabled_by(toggled_key) {
                if !still_disabled.contains(key) {
                    partition.inactive.insert(key.clone());
                }
            }
        }

        Some(partition)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn set(keys: &[&str]) -> BTreeSet<String> {
        keys.iter().map(|k| k.to_string()).collect()
    }

    fn policy() -> RulePolicy {
        let rules = ConflictRules {
            exclusive: vec![vec!["h1".into(), "h2".into()]],
            implies: BTreeMap::from([("h1".to_string(), vec!["b".to_string()])]),
            disables: BTreeMap::from([
                ("h1".to_string(), vec!["ul".to_string()]),
                ("h2".to_string(), vec!["ul".to_string()]),
            ]),
        };
        RulePolicy::new(rules, "plain")
    }

    #[test]
    fn test_independent_toggles_are_symmetric() {
        let on = IndependentToggles.resolve("b", true, &[]).unwrap();
        assert_eq!(on.active, set(&["b"]));
        let off = IndependentToggles.resolve("b", false, &[]).unwrap();
        assert_eq!(off.inactive, set(&["b"]));
    }

    #[test]
    fn test_closure_policy_can_veto() {
        let veto = |_: &str, _: bool, _: &[String]| -> Option<StatusManageContext> { None };
        assert!(veto.resolve("b", true, &[]).is_none());
    }

    #[test]
    fn test_heading_implies_bold_and_disables_list() {
        let partition = policy().resolve("h1", true, &["plain".to_string()]).unwrap();
        assert_eq!(partition.active, set(&["b", "h1"]));
        assert_eq!(partition.disable, set(&["ul"]));
        assert!(partition.inactive.is_empty());
    }

    #[test]
    fn test_exclusive_group_switches_peer_off() {
        let previous = vec!["plain".to_string(), "h1".to_string()];
        let partition = policy().resolve("h2", true, &previous).unwrap();
        assert!(partition.active.contains("h2"));
        assert_eq!(partition.inactive, set(&["h1"]));
    }

    #[test]
    fn test_deactivation_reenables_unless_still_disabled() {
        let partition = policy().resolve("h1", false, &["b".to_string()]).unwrap();
        assert_eq!(partition.inactive, set(&["h1", "ul"]));

        let partition = policy().resolve("h1", false, &["h2".to_string()]).unwrap();
        assert_eq!(partition.inactive, set(&["h1"]));
    }

    #[test]
    fn test_default_key_clears_and_cannot_be_switched_off() {
        let previous = vec!["b".to_string(), "i".to_string()];
        let partition = policy().resolve("plain", true, &previous).unwrap();
        assert_eq!(partition.active, set(&["plain"]));
        assert_eq!(partition.inactive, set(&["b", "i"]));

        assert!(policy().resolve("plain", false, &[]).is_none());
    }
}
