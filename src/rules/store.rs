use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::assertion::Assertion;
use crate::types::RuleType;

/// A single stored rule: an outcome plus an optional assertion gating it.
#[derive(Clone)]
pub struct Rule {
    pub kind: RuleType,
    pub assertion: Option<Arc<dyn Assertion>>,
}

impl Rule {
    pub fn new(kind: RuleType) -> Self {
        Self {
            kind,
            assertion: None,
        }
    }

    pub fn with_assertion(kind: RuleType, assertion: Option<Arc<dyn Assertion>>) -> Self {
        Self { kind, assertion }
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("kind", &self.kind)
            .field("assertion", &self.assertion.is_some())
            .finish()
    }
}

/// Rules stored at one (resource scope, role scope) coordinate: one optional
/// all-privileges rule plus per-privilege rules.
#[derive(Debug, Clone, Default)]
pub struct PrivilegeRules {
    pub all_privileges: Option<Rule>,
    pub by_privilege: HashMap<String, Rule>,
}

impl PrivilegeRules {
    pub fn is_empty(&self) -> bool {
        self.all_privileges.is_none() && self.by_privilege.is_empty()
    }
}

/// One axis of a rule coordinate: a concrete id or the wildcard.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    Any,
    Id(String),
}

impl Scope {
    pub fn from_id(id: Option<&str>) -> Self {
        match id {
            Some(id) => Scope::Id(id.to_string()),
            None => Scope::Any,
        }
    }
}

/// Composite key addressing one bucket of rules.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RuleKey {
    pub resource: Scope,
    pub role: Scope,
}

impl RuleKey {
    pub fn new(resource: Option<&str>, role: Option<&str>) -> Self {
        Self {
            resource: Scope::from_id(resource),
            role: Scope::from_id(role),
        }
    }

    /// The fully-wildcard coordinate holding the default rule.
    pub fn root() -> Self {
        Self {
            resource: Scope::Any,
            role: Scope::Any,
        }
    }

    pub fn is_root(&self) -> bool {
        self.resource == Scope::Any && self.role == Scope::Any
    }
}

/// Flat rule storage.
///
/// The root coordinate always holds an all-privileges rule; it starts as an
/// unconditioned DENY, which is what makes the engine whitelist-by-default.
/// Every other bucket exists only while it holds at least one rule.
#[derive(Debug, Clone)]
pub struct RuleStore {
    rules: HashMap<RuleKey, PrivilegeRules>,
}

impl RuleStore {
    pub fn new() -> Self {
        let mut rules = HashMap::new();
        rules.insert(
            RuleKey::root(),
            PrivilegeRules {
                all_privileges: Some(Rule::new(RuleType::Deny)),
                by_privilege: HashMap::new(),
            },
        );
        Self { rules }
    }

    pub fn get(&self, resource: Option<&str>, role: Option<&str>) -> Option<&PrivilegeRules> {
        self.rules.get(&RuleKey::new(resource, role))
    }

    pub fn get_by_key(&self, key: &RuleKey) -> Option<&PrivilegeRules> {
        self.rules.get(key)
    }

    pub fn get_mut(&mut self, key: &RuleKey) -> Option<&mut PrivilegeRules> {
        self.rules.get_mut(key)
    }

    /// The bucket at `key`, created empty on first use.
    pub fn bucket_mut(&mut self, key: RuleKey) -> &mut PrivilegeRules {
        self.rules.entry(key).or_default()
    }

    /// Restores the root bucket to the hard-coded default.
    pub fn reset_root(&mut self) {
        self.rules.insert(
            RuleKey::root(),
            PrivilegeRules {
                all_privileges: Some(Rule::new(RuleType::Deny)),
                by_privilege: HashMap::new(),
            },
        );
    }

    /// Drops the bucket at `key` if it no longer holds any rule. The root
    /// bucket is never dropped.
    pub fn prune(&mut self, key: &RuleKey) {
        if key.is_root() {
            return;
        }
        if self.rules.get(key).is_some_and(PrivilegeRules::is_empty) {
            self.rules.remove(key);
        }
    }

    /// Drops every bucket keyed to the given role id.
    pub fn purge_role(&mut self, role_id: &str) {
        self.rules
            .retain(|key, _| key.role != Scope::Id(role_id.to_string()));
    }

    /// Drops every bucket keyed to a concrete role, keeping wildcard-role
    /// buckets.
    pub fn purge_roles(&mut self) {
        self.rules.retain(|key, _| key.role == Scope::Any);
    }

    /// Drops every bucket keyed to one of the given resource ids.
    pub fn purge_resources(&mut self, resource_ids: &[String]) {
        self.rules.retain(|key, _| match &key.resource {
            Scope::Id(id) => !resource_ids.contains(id),
            Scope::Any => true,
        });
    }

    /// Drops every bucket keyed to a concrete resource.
    pub fn purge_all_resources(&mut self) {
        self.rules.retain(|key, _| key.resource == Scope::Any);
    }
}

impl Default for RuleStore {
    fn default() -> Self {
        Self::new()
    }
}
