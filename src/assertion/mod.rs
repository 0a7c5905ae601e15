//! Conditional rules
//!
//! A rule may carry an assertion: a predicate consulted whenever that rule is
//! about to decide a query. When the assertion holds the rule applies as
//! written; when it fails a non-default rule is skipped and the search
//! continues, while the engine's default rule flips its outcome.

mod aggregate;

pub use aggregate::{AggregateAssertion, AggregateMode, AssertionRegistry, AssertionResolver};

use crate::engine::Acl;
use crate::error::Result;
use crate::types::{ResourceIdentity, RoleIdentity};

/// A predicate attached to a rule.
///
/// `role` and `resource` are the identities originally supplied to the query,
/// not the registered stand-ins, so an assertion can downcast them (via the
/// `Any` supertrait of the identity traits) to application types and inspect
/// their state. `privilege` is the privilege under query, `None` for
/// all-privileges queries.
pub trait Assertion: Send + Sync {
    fn assert(
        &self,
        acl: &Acl,
        role: Option<&dyn RoleIdentity>,
        resource: Option<&dyn ResourceIdentity>,
        privilege: Option<&str>,
    ) -> Result<bool>;
}

type AssertFn = dyn Fn(&Acl, Option<&dyn RoleIdentity>, Option<&dyn ResourceIdentity>, Option<&str>) -> bool
    + Send
    + Sync;

/// Ad-hoc assertion from a closure.
pub struct CallbackAssertion {
    callback: Box<AssertFn>,
}

impl CallbackAssertion {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&Acl, Option<&dyn RoleIdentity>, Option<&dyn ResourceIdentity>, Option<&str>) -> bool
            + Send
            + Sync
            + 'static,
    {
        Self {
            callback: Box::new(callback),
        }
    }
}

impl Assertion for CallbackAssertion {
    fn assert(
        &self,
        acl: &Acl,
        role: Option<&dyn RoleIdentity>,
        resource: Option<&dyn ResourceIdentity>,
        privilege: Option<&str>,
    ) -> Result<bool> {
        Ok((self.callback)(acl, role, resource, privilege))
    }
}
