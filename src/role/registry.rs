use indexmap::IndexMap;

use crate::error::{AclError, Result};
use crate::types::Role;

#[derive(Debug, Clone)]
struct RoleNode {
    role: Role,
    /// Direct parents in the order they were declared. Later entries take
    /// priority during decision traversal, so the inner walk visits the most
    /// recently added parent first.
    parents: Vec<String>,
    children: Vec<String>,
}

/// Registry of roles and their inheritance relationships.
///
/// Roles form a directed acyclic graph: a role may inherit from any number of
/// parents, and parents must be registered before their children reference
/// them. Removal detaches a role from both its parents and its children; the
/// children are not re-wired to the removed role's parents.
#[derive(Debug, Clone, Default)]
pub struct RoleRegistry {
    roles: IndexMap<String, RoleNode>,
}

impl RoleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `role` inheriting from the given parents, in order.
    pub fn add(&mut self, role: Role, parents: &[&str]) -> Result<()> {
        let id = role.id().to_string();
        if self.roles.contains_key(&id) {
            return Err(AclError::DuplicateRole(id));
        }

        let mut parent_ids: Vec<String> = Vec::with_capacity(parents.len());
        for parent in parents {
            if !self.roles.contains_key(*parent) {
                return Err(AclError::UnknownParentRole((*parent).to_string()));
            }
            if !parent_ids.iter().any(|p| p == parent) {
                parent_ids.push((*parent).to_string());
            }
        }

        for parent in &parent_ids {
            if let Some(node) = self.roles.get_mut(parent) {
                node.children.push(id.clone());
            }
        }
        self.roles.insert(
            id,
            RoleNode {
                role,
                parents: parent_ids,
                children: Vec::new(),
            },
        );
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Role> {
        self.roles.get(id).map(|node| &node.role)
    }

    pub fn has(&self, id: &str) -> bool {
        self.roles.contains_key(id)
    }

    /// Direct parents of `id`, in declaration order.
    pub fn parents(&self, id: &str) -> Result<&[String]> {
        self.roles
            .get(id)
            .map(|node| node.parents.as_slice())
            .ok_or_else(|| AclError::UnknownRole(id.to_string()))
    }

    /// Registered role ids in registration order.
    pub fn role_ids(&self) -> Vec<&str> {
        self.roles.keys().map(String::as_str).collect()
    }

    /// Whether `role` inherits from `ancestor`, directly when `only_parents`
    /// is set, otherwise through any chain of parents.
    pub fn inherits(&self, role: &str, ancestor: &str, only_parents: bool) -> Result<bool> {
        let node = self
            .roles
            .get(role)
            .ok_or_else(|| AclError::UnknownRole(role.to_string()))?;
        if !self.roles.contains_key(ancestor) {
            return Err(AclError::UnknownRole(ancestor.to_string()));
        }

        if node.parents.iter().any(|p| p == ancestor) {
            return Ok(true);
        }
        if only_parents {
            return Ok(false);
        }
        for parent in &node.parents {
            if self.inherits(parent, ancestor, false)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Unregisters `id`, detaching it from its parents and children.
    pub fn remove(&mut self, id: &str) -> Result<()> {
        let node = self
            .roles
            .shift_remove(id)
            .ok_or_else(|| AclError::UnknownRole(id.to_string()))?;
        for child in &node.children {
            if let Some(child_node) = self.roles.get_mut(child) {
                child_node.parents.retain(|p| p != id);
            }
        }
        for parent in &node.parents {
            if let Some(parent_node) = self.roles.get_mut(parent) {
                parent_node.children.retain(|c| c != id);
            }
        }
        Ok(())
    }

    pub fn remove_all(&mut self) {
        self.roles.clear();
    }
}
