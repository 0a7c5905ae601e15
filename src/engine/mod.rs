//! The `Acl` facade: registration, rule mutation, and decision queries

mod query;

use std::sync::Arc;

use tracing::debug;

use crate::assertion::Assertion;
use crate::error::{AclError, Result};
use crate::resource::ResourceTree;
use crate::role::RoleRegistry;
use crate::rules::{Rule, RuleKey, RuleStore};
use crate::types::{Operation, Resource, ResourceIdentity, Role, RoleIdentity, RuleType};

/// Whitelist-by-default access control list.
///
/// Everything is denied until a rule allows it. Rules are scoped by role,
/// resource, and privilege; unscoped axes act as wildcards. Decision queries
/// walk the resource ancestry outward and the role inheritance graph
/// depth-first, most specific rule first, and always terminate at the
/// built-in deny-all default.
#[derive(Debug, Clone, Default)]
pub struct Acl {
    pub(crate) roles: RoleRegistry,
    pub(crate) resources: ResourceTree,
    pub(crate) rules: RuleStore,
}

impl Acl {
    pub fn new() -> Self {
        Self {
            roles: RoleRegistry::new(),
            resources: ResourceTree::new(),
            rules: RuleStore::new(),
        }
    }

    // ---- roles ----

    /// Registers a role. Parents must already be registered; their order
    /// matters, the most recently listed parent is consulted first when
    /// resolving queries.
    pub fn add_role(&mut self, role: impl Into<Role>, parents: &[&str]) -> Result<()> {
        self.roles.add(role.into(), parents)
    }

    pub fn has_role(&self, id: &str) -> bool {
        self.roles.has(id)
    }

    pub fn get_role(&self, id: &str) -> Option<&Role> {
        self.roles.get(id)
    }

    /// Registered role ids, in registration order.
    pub fn role_ids(&self) -> Vec<&str> {
        self.roles.role_ids()
    }

    pub fn inherits_role(&self, role: &str, ancestor: &str, only_parents: bool) -> Result<bool> {
        self.roles.inherits(role, ancestor, only_parents)
    }

    /// Unregisters a role and drops every rule scoped to it.
    pub fn remove_role(&mut self, id: &str) -> Result<()> {
        self.roles.remove(id)?;
        self.rules.purge_role(id);
        debug!(role = id, "removed role");
        Ok(())
    }

    pub fn remove_all_roles(&mut self) {
        self.roles.remove_all();
        self.rules.purge_roles();
    }

    // ---- resources ----

    /// Registers a resource, optionally under a parent resource.
    pub fn add_resource(&mut self, resource: impl Into<Resource>, parent: Option<&str>) -> Result<()> {
        self.resources.add(resource.into(), parent)
    }

    pub fn has_resource(&self, id: &str) -> bool {
        self.resources.has(id)
    }

    pub fn get_resource(&self, id: &str) -> Option<&Resource> {
        self.resources.get(id)
    }

    /// Registered resource ids, in registration order.
    pub fn resource_ids(&self) -> Vec<&str> {
        self.resources.resource_ids()
    }

    pub fn inherits_resource(&self, resource: &str, ancestor: &str, only_parent: bool) -> Result<bool> {
        self.resources.inherits(resource, ancestor, only_parent)
    }

    /// Unregisters a resource and its whole subtree, dropping every rule
    /// scoped to any of them.
    pub fn remove_resource(&mut self, id: &str) -> Result<()> {
        let removed = self.resources.remove(id)?;
        self.rules.purge_resources(&removed);
        debug!(resource = id, subtree = removed.len(), "removed resource");
        Ok(())
    }

    pub fn remove_all_resources(&mut self) {
        self.resources.remove_all();
        self.rules.purge_all_resources();
    }

    // ---- rule mutation ----

    /// Grants the given privileges (all privileges when `None`/empty) on the
    /// given resources to the given roles. `None` on an axis means the
    /// wildcard scope.
    pub fn allow(
        &mut self,
        roles: Option<&[&str]>,
        resources: Option<&[&str]>,
        privileges: Option<&[&str]>,
    ) -> Result<()> {
        self.set_rule(Operation::Add, RuleType::Allow, roles, resources, privileges, None)
    }

    /// Like [`allow`](Self::allow), gated by an assertion.
    pub fn allow_assert(
        &mut self,
        roles: Option<&[&str]>,
        resources: Option<&[&str]>,
        privileges: Option<&[&str]>,
        assertion: Arc<dyn Assertion>,
    ) -> Result<()> {
        self.set_rule(
            Operation::Add,
            RuleType::Allow,
            roles,
            resources,
            privileges,
            Some(assertion),
        )
    }

    /// Denies the given privileges on the given resources to the given roles.
    pub fn deny(
        &mut self,
        roles: Option<&[&str]>,
        resources: Option<&[&str]>,
        privileges: Option<&[&str]>,
    ) -> Result<()> {
        self.set_rule(Operation::Add, RuleType::Deny, roles, resources, privileges, None)
    }

    /// Like [`deny`](Self::deny), gated by an assertion.
    pub fn deny_assert(
        &mut self,
        roles: Option<&[&str]>,
        resources: Option<&[&str]>,
        privileges: Option<&[&str]>,
        assertion: Arc<dyn Assertion>,
    ) -> Result<()> {
        self.set_rule(
            Operation::Add,
            RuleType::Deny,
            roles,
            resources,
            privileges,
            Some(assertion),
        )
    }

    /// Removes matching ALLOW rules at the given coordinates.
    pub fn remove_allow(
        &mut self,
        roles: Option<&[&str]>,
        resources: Option<&[&str]>,
        privileges: Option<&[&str]>,
    ) -> Result<()> {
        self.set_rule(Operation::Remove, RuleType::Allow, roles, resources, privileges, None)
    }

    /// Removes matching DENY rules at the given coordinates.
    pub fn remove_deny(
        &mut self,
        roles: Option<&[&str]>,
        resources: Option<&[&str]>,
        privileges: Option<&[&str]>,
    ) -> Result<()> {
        self.set_rule(Operation::Remove, RuleType::Deny, roles, resources, privileges, None)
    }

    /// Adds or removes rules over the cartesian product of the normalized
    /// role and resource scopes.
    ///
    /// All identifiers are validated before anything is written, so a failed
    /// call leaves the store untouched. A named resource covers its whole
    /// subtree. `resources = None` expands to the wildcard scope plus every
    /// resource registered at call time; resources registered later are
    /// reached only through the wildcard copy.
    pub fn set_rule(
        &mut self,
        operation: Operation,
        kind: RuleType,
        roles: Option<&[&str]>,
        resources: Option<&[&str]>,
        privileges: Option<&[&str]>,
        assertion: Option<Arc<dyn Assertion>>,
    ) -> Result<()> {
        let role_tokens = self.normalize_roles(roles)?;
        let resource_tokens = self.normalize_resources(resources)?;
        let privileges: Vec<&str> = privileges.unwrap_or_default().to_vec();

        debug!(
            ?operation,
            %kind,
            roles = ?role_tokens,
            resources = ?resource_tokens,
            privileges = ?privileges,
            "applying rule mutation"
        );

        for resource_token in &resource_tokens {
            for role_token in &role_tokens {
                let key = RuleKey::new(resource_token.as_deref(), role_token.as_deref());
                match operation {
                    Operation::Add => {
                        let bucket = self.rules.bucket_mut(key);
                        if privileges.is_empty() {
                            bucket.all_privileges =
                                Some(Rule::with_assertion(kind, assertion.clone()));
                        } else {
                            for privilege in &privileges {
                                bucket.by_privilege.insert(
                                    (*privilege).to_string(),
                                    Rule::with_assertion(kind, assertion.clone()),
                                );
                            }
                        }
                    }
                    Operation::Remove => self.remove_at(&key, kind, &privileges),
                }
            }
        }
        Ok(())
    }

    /// Removes rules of `kind` at one coordinate. Rules of the opposite kind
    /// are left alone, and removing a rule that does not exist is a no-op.
    fn remove_at(&mut self, key: &RuleKey, kind: RuleType, privileges: &[&str]) {
        if privileges.is_empty() && key.is_root() {
            let matches = self
                .rules
                .get(None, None)
                .and_then(|bucket| bucket.all_privileges.as_ref())
                .is_some_and(|rule| rule.kind == kind);
            if matches {
                self.rules.reset_root();
            }
            return;
        }
        if let Some(bucket) = self.rules.get_mut(key) {
            if privileges.is_empty() {
                if bucket.all_privileges.as_ref().is_some_and(|rule| rule.kind == kind) {
                    bucket.all_privileges = None;
                }
            } else {
                for privilege in privileges {
                    if bucket.by_privilege.get(*privilege).is_some_and(|rule| rule.kind == kind) {
                        bucket.by_privilege.remove(*privilege);
                    }
                }
            }
            self.rules.prune(key);
        }
    }

    fn normalize_roles(&self, roles: Option<&[&str]>) -> Result<Vec<Option<String>>> {
        let ids = match roles {
            None => return Ok(vec![None]),
            Some(ids) if ids.is_empty() => return Ok(vec![None]),
            Some(ids) => ids,
        };
        let mut tokens: Vec<Option<String>> = Vec::with_capacity(ids.len());
        for id in ids {
            if !self.roles.has(id) {
                return Err(AclError::UnknownRole((*id).to_string()));
            }
            let token = Some((*id).to_string());
            if !tokens.contains(&token) {
                tokens.push(token);
            }
        }
        Ok(tokens)
    }

    fn normalize_resources(&self, resources: Option<&[&str]>) -> Result<Vec<Option<String>>> {
        let ids = match resources {
            None => {
                // Wildcard plus a per-id copy for every resource registered
                // right now. Resources added later only see the wildcard.
                let mut tokens: Vec<Option<String>> = vec![None];
                tokens.extend(self.resources.resource_ids().into_iter().map(|id| Some(id.to_string())));
                return Ok(tokens);
            }
            Some(ids) if ids.is_empty() => return Ok(vec![None]),
            Some(ids) => ids,
        };
        let mut tokens: Vec<Option<String>> = Vec::with_capacity(ids.len());
        for id in ids {
            if !self.resources.has(id) {
                return Err(AclError::UnknownResource((*id).to_string()));
            }
            let token = Some((*id).to_string());
            if !tokens.contains(&token) {
                tokens.push(token);
            }
            for child in self.resources.descendants(id) {
                let token = Some(child);
                if !tokens.contains(&token) {
                    tokens.push(token);
                }
            }
        }
        Ok(tokens)
    }

    // ---- decision queries ----

    /// Decides whether `role` may exercise `privilege` on `resource`.
    ///
    /// `None` for the role or resource queries the wildcard scope; `None`
    /// for the privilege asks "is every privilege allowed", which a single
    /// applicable per-privilege DENY answers negatively.
    pub fn is_allowed(
        &self,
        role: Option<&str>,
        resource: Option<&str>,
        privilege: Option<&str>,
    ) -> Result<bool> {
        let role_obj = match role {
            Some(id) => Some(
                self.roles
                    .get(id)
                    .ok_or_else(|| AclError::UnknownRole(id.to_string()))?,
            ),
            None => None,
        };
        let resource_obj = match resource {
            Some(id) => Some(
                self.resources
                    .get(id)
                    .ok_or_else(|| AclError::UnknownResource(id.to_string()))?,
            ),
            None => None,
        };
        self.resolve(
            role_obj.map(|r| r as &dyn RoleIdentity),
            resource_obj.map(|r| r as &dyn ResourceIdentity),
            privilege,
        )
    }

    /// Like [`is_allowed`](Self::is_allowed), but takes identity objects and
    /// hands those exact objects to any assertion consulted along the way,
    /// so assertions can downcast them back to application types.
    pub fn is_allowed_with(
        &self,
        role: Option<&dyn RoleIdentity>,
        resource: Option<&dyn ResourceIdentity>,
        privilege: Option<&str>,
    ) -> Result<bool> {
        if let Some(role) = role {
            if !self.roles.has(role.role_id()) {
                return Err(AclError::UnknownRole(role.role_id().to_string()));
            }
        }
        if let Some(resource) = resource {
            if !self.resources.has(resource.resource_id()) {
                return Err(AclError::UnknownResource(resource.resource_id().to_string()));
            }
        }
        self.resolve(role, resource, privilege)
    }
}
