//! Core value types shared across the crate

use std::any::Any;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A role: an actor (or actor class) that requests access.
///
/// Roles are identified by an opaque string id. Construct one directly or
/// convert from a string; `&str` and `String` also implement [`RoleIdentity`]
/// so plain ids can be passed wherever a role is expected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Role {
    id: String,
}

impl Role {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

impl From<&str> for Role {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for Role {
    fn from(id: String) -> Self {
        Self { id }
    }
}

/// A resource: a target that access is requested to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resource {
    id: String,
}

impl Resource {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

impl From<&str> for Resource {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for Resource {
    fn from(id: String) -> Self {
        Self { id }
    }
}

/// The outcome a rule encodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleType {
    Allow,
    Deny,
}

impl RuleType {
    /// The opposite outcome. Used when the root default rule's assertion
    /// fails and the default flips.
    pub fn inverted(self) -> Self {
        match self {
            RuleType::Allow => RuleType::Deny,
            RuleType::Deny => RuleType::Allow,
        }
    }
}

impl fmt::Display for RuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleType::Allow => f.write_str("allow"),
            RuleType::Deny => f.write_str("deny"),
        }
    }
}

/// Whether a rule mutation adds or removes rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Add,
    Remove,
}

/// Anything that can stand in for a role in a query.
///
/// The `Any` supertrait lets assertions downcast back to the concrete caller
/// type, so an application can pass its own user object through
/// [`Acl::is_allowed_with`](crate::Acl::is_allowed_with) and inspect its
/// state inside an [`Assertion`](crate::Assertion).
pub trait RoleIdentity: Any {
    fn role_id(&self) -> &str;
}

/// Anything that can stand in for a resource in a query.
///
/// See [`RoleIdentity`] for the downcasting contract.
pub trait ResourceIdentity: Any {
    fn resource_id(&self) -> &str;
}

impl RoleIdentity for Role {
    fn role_id(&self) -> &str {
        self.id()
    }
}

impl ResourceIdentity for Resource {
    fn resource_id(&self) -> &str {
        self.id()
    }
}

impl RoleIdentity for &'static str {
    fn role_id(&self) -> &str {
        self
    }
}

impl ResourceIdentity for &'static str {
    fn resource_id(&self) -> &str {
        self
    }
}

impl RoleIdentity for String {
    fn role_id(&self) -> &str {
        self
    }
}

impl ResourceIdentity for String {
    fn resource_id(&self) -> &str {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_type_inversion() {
        assert_eq!(RuleType::Allow.inverted(), RuleType::Deny);
        assert_eq!(RuleType::Deny.inverted(), RuleType::Allow);
    }

    #[test]
    fn role_display_and_conversion() {
        let role: Role = "editor".into();
        assert_eq!(role.id(), "editor");
        assert_eq!(role.to_string(), "editor");
        assert_eq!(role, Role::new(String::from("editor")));
    }

    #[test]
    fn plain_strings_are_identities() {
        let id = String::from("area51");
        assert_eq!(ResourceIdentity::resource_id(&id), "area51");
        assert_eq!(RoleIdentity::role_id(&"guest"), "guest");
    }
}
