//! Decision resolution
//!
//! A query is answered by walking the resource ancestry from the queried
//! resource up to the wildcard scope. At each level the role inheritance
//! graph is searched depth-first (most recently added parent first), then
//! the wildcard-role rules for that level are consulted. The first
//! applicable rule decides; the walk always terminates because the
//! fully-wildcard coordinate holds the default rule.

use std::collections::HashSet;

use tracing::{debug, trace};

use crate::error::Result;
use crate::types::{ResourceIdentity, RoleIdentity, RuleType};

use super::Acl;

/// The identities and privilege as originally supplied, carried alongside
/// the walk so assertions see what the caller passed in.
struct Query<'a> {
    role: Option<&'a dyn RoleIdentity>,
    resource: Option<&'a dyn ResourceIdentity>,
    privilege: Option<&'a str>,
}

impl Acl {
    pub(crate) fn resolve<'a>(
        &'a self,
        role: Option<&'a dyn RoleIdentity>,
        resource: Option<&'a dyn ResourceIdentity>,
        privilege: Option<&'a str>,
    ) -> Result<bool> {
        let query = Query {
            role,
            resource,
            privilege,
        };
        let role_id = role.map(|r| r.role_id());
        let mut current: Option<&str> = resource.map(|r| r.resource_id());

        let allowed = match privilege {
            None => self.resolve_all_privileges(role_id, &mut current, &query)?,
            Some(privilege) => self.resolve_one_privilege(role_id, &mut current, privilege, &query)?,
        };
        debug!(role = ?role_id, resource = ?resource.map(|r| r.resource_id()), ?privilege, allowed, "decision");
        Ok(allowed)
    }

    /// All-privileges mode: the role must be allowed everything at some
    /// level, so any applicable per-privilege DENY at a level decides
    /// negatively before the level's all-privileges rule is consulted.
    fn resolve_all_privileges<'a>(
        &'a self,
        role_id: Option<&'a str>,
        current: &mut Option<&'a str>,
        query: &Query<'_>,
    ) -> Result<bool> {
        loop {
            if let Some(role_id) = role_id {
                if let Some(decided) = self.role_dfs_all_privileges(role_id, *current, query)? {
                    return Ok(decided);
                }
            }
            if let Some(bucket) = self.rules.get(*current, None) {
                for privilege in bucket.by_privilege.keys() {
                    if self.rule_type(*current, None, Some(privilege.as_str()), query)?
                        == Some(RuleType::Deny)
                    {
                        return Ok(false);
                    }
                }
                if let Some(kind) = self.rule_type(*current, None, None, query)? {
                    return Ok(kind == RuleType::Allow);
                }
            }
            match *current {
                Some(id) => *current = self.resources.parent_of(id),
                // The root bucket always holds an all-privileges rule, so
                // the wildcard level above has already returned.
                None => return Ok(false),
            }
            trace!(resource = ?current, "climbing to parent resource");
        }
    }

    /// Single-privilege mode. An applicable per-privilege rule decides
    /// either way. A wildcard-role all-privileges ALLOW decides too, but a
    /// DENY from that slot below the wildcard level falls through to the
    /// parent resource, where a more specific grant may still apply.
    fn resolve_one_privilege<'a>(
        &'a self,
        role_id: Option<&'a str>,
        current: &mut Option<&'a str>,
        privilege: &str,
        query: &Query<'_>,
    ) -> Result<bool> {
        loop {
            if let Some(role_id) = role_id {
                if let Some(decided) =
                    self.role_dfs_one_privilege(role_id, *current, privilege, query)?
                {
                    return Ok(decided);
                }
            }
            if let Some(kind) = self.rule_type(*current, None, Some(privilege), query)? {
                return Ok(kind == RuleType::Allow);
            } else if let Some(kind) = self.rule_type(*current, None, None, query)? {
                let allowed = kind == RuleType::Allow;
                if allowed || current.is_none() {
                    return Ok(allowed);
                }
            }
            match *current {
                Some(id) => *current = self.resources.parent_of(id),
                None => return Ok(false),
            }
            trace!(resource = ?current, "climbing to parent resource");
        }
    }

    fn role_dfs_all_privileges<'a>(
        &'a self,
        role_id: &'a str,
        resource: Option<&str>,
        query: &Query<'_>,
    ) -> Result<Option<bool>> {
        let mut visited: HashSet<&str> = HashSet::new();
        let mut stack: Vec<&str> = Vec::new();
        if let Some(decided) =
            self.visit_all_privileges(role_id, resource, query, &mut visited, &mut stack)?
        {
            return Ok(Some(decided));
        }
        while let Some(next) = stack.pop() {
            if visited.contains(next) {
                continue;
            }
            if let Some(decided) =
                self.visit_all_privileges(next, resource, query, &mut visited, &mut stack)?
            {
                return Ok(Some(decided));
            }
        }
        Ok(None)
    }

    fn visit_all_privileges<'a>(
        &'a self,
        role_id: &'a str,
        resource: Option<&str>,
        query: &Query<'_>,
        visited: &mut HashSet<&'a str>,
        stack: &mut Vec<&'a str>,
    ) -> Result<Option<bool>> {
        if let Some(bucket) = self.rules.get(resource, Some(role_id)) {
            for privilege in bucket.by_privilege.keys() {
                if self.rule_type(resource, Some(role_id), Some(privilege.as_str()), query)?
                    == Some(RuleType::Deny)
                {
                    return Ok(Some(false));
                }
            }
            if let Some(kind) = self.rule_type(resource, Some(role_id), None, query)? {
                return Ok(Some(kind == RuleType::Allow));
            }
        }
        visited.insert(role_id);
        // Pushed in declaration order so the pop visits the most recently
        // added parent first.
        for parent in self.roles.parents(role_id)? {
            stack.push(parent.as_str());
        }
        Ok(None)
    }

    fn role_dfs_one_privilege<'a>(
        &'a self,
        role_id: &'a str,
        resource: Option<&str>,
        privilege: &str,
        query: &Query<'_>,
    ) -> Result<Option<bool>> {
        let mut visited: HashSet<&str> = HashSet::new();
        let mut stack: Vec<&str> = Vec::new();
        if let Some(decided) =
            self.visit_one_privilege(role_id, resource, privilege, query, &mut visited, &mut stack)?
        {
            return Ok(Some(decided));
        }
        while let Some(next) = stack.pop() {
            if visited.contains(next) {
                continue;
            }
            if let Some(decided) =
                self.visit_one_privilege(next, resource, privilege, query, &mut visited, &mut stack)?
            {
                return Ok(Some(decided));
            }
        }
        Ok(None)
    }

    fn visit_one_privilege<'a>(
        &'a self,
        role_id: &'a str,
        resource: Option<&str>,
        privilege: &str,
        query: &Query<'_>,
        visited: &mut HashSet<&'a str>,
        stack: &mut Vec<&'a str>,
    ) -> Result<Option<bool>> {
        if let Some(kind) = self.rule_type(resource, Some(role_id), Some(privilege), query)? {
            return Ok(Some(kind == RuleType::Allow));
        }
        if let Some(kind) = self.rule_type(resource, Some(role_id), None, query)? {
            return Ok(Some(kind == RuleType::Allow));
        }
        visited.insert(role_id);
        for parent in self.roles.parents(role_id)? {
            stack.push(parent.as_str());
        }
        Ok(None)
    }

    /// The effective rule type at one coordinate, or `None` when no rule is
    /// stored there or a failed assertion voids it.
    ///
    /// A failed assertion on the fully-wildcard all-privileges rule (the
    /// default rule) inverts the outcome instead of voiding it, so a
    /// conditioned default DENY acts as an ALLOW when its condition fails.
    fn rule_type(
        &self,
        resource: Option<&str>,
        role: Option<&str>,
        privilege: Option<&str>,
        query: &Query<'_>,
    ) -> Result<Option<RuleType>> {
        let Some(bucket) = self.rules.get(resource, role) else {
            return Ok(None);
        };
        let rule = match privilege {
            None => match &bucket.all_privileges {
                Some(rule) => rule,
                None => return Ok(None),
            },
            Some(privilege) => match bucket.by_privilege.get(privilege) {
                Some(rule) => rule,
                None => return Ok(None),
            },
        };

        let Some(assertion) = &rule.assertion else {
            return Ok(Some(rule.kind));
        };
        // The assertion sees the original query identities and the queried
        // privilege, not the coordinate this rule happens to be stored at.
        if assertion.assert(self, query.role, query.resource, query.privilege)? {
            Ok(Some(rule.kind))
        } else if resource.is_some() || role.is_some() || privilege.is_some() {
            Ok(None)
        } else {
            Ok(Some(rule.kind.inverted()))
        }
    }
}
