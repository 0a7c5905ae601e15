//! Hierarchical, whitelist-by-default access control lists.
//!
//! An [`Acl`] holds roles (who asks), resources (what is asked about), and
//! rules (who may do what, where). Nothing is permitted until a rule allows
//! it. Roles inherit from any number of parents, resources form a tree, and
//! rules can be scoped to single privileges and gated by runtime
//! [`Assertion`]s.
//!
//! ```
//! use gatewarden::Acl;
//!
//! let mut acl = Acl::new();
//! acl.add_role("guest", &[])?;
//! acl.add_role("editor", &["guest"])?;
//! acl.add_resource("article", None)?;
//!
//! acl.allow(Some(&["guest"]), Some(&["article"]), Some(&["read"]))?;
//! acl.allow(Some(&["editor"]), Some(&["article"]), Some(&["write"]))?;
//!
//! assert!(acl.is_allowed(Some("editor"), Some("article"), Some("read"))?);
//! assert!(acl.is_allowed(Some("editor"), Some("article"), Some("write"))?);
//! assert!(!acl.is_allowed(Some("guest"), Some("article"), Some("write"))?);
//! # Ok::<(), gatewarden::AclError>(())
//! ```

mod assertion;
mod engine;
mod error;
mod resource;
mod role;
mod rules;
mod types;

pub use assertion::{
    AggregateAssertion, AggregateMode, Assertion, AssertionRegistry, AssertionResolver,
    CallbackAssertion,
};
pub use engine::Acl;
pub use error::{AclError, Result};
pub use role::RoleRegistry;
pub use resource::ResourceTree;
pub use types::{Operation, Resource, ResourceIdentity, Role, RoleIdentity, RuleType};

/// Crate version, for embedding in diagnostics.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
