use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::engine::Acl;
use crate::error::{AclError, Result};
use crate::types::{ResourceIdentity, RoleIdentity};

use super::Assertion;

/// How an [`AggregateAssertion`] combines its members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateMode {
    /// Every member must hold.
    All,
    /// At least one member must hold.
    AtLeastOne,
}

/// Resolves assertion names to assertions.
///
/// Named members of an aggregate are looked up lazily, at evaluation time, so
/// an assertion can be referenced before it is defined.
pub trait AssertionResolver: Send + Sync {
    fn resolve(&self, name: &str) -> Option<Arc<dyn Assertion>>;
}

/// A plain name-to-assertion map.
#[derive(Default)]
pub struct AssertionRegistry {
    assertions: HashMap<String, Arc<dyn Assertion>>,
}

impl AssertionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, assertion: Arc<dyn Assertion>) {
        self.assertions.insert(name.into(), assertion);
    }
}

impl AssertionResolver for AssertionRegistry {
    fn resolve(&self, name: &str) -> Option<Arc<dyn Assertion>> {
        self.assertions.get(name).cloned()
    }
}

enum Member {
    Direct(Arc<dyn Assertion>),
    Named(String),
}

/// Combines several assertions into one.
///
/// Members are either assertions supplied directly or names resolved through
/// an [`AssertionResolver`] at evaluation time. Evaluating an empty aggregate
/// is an error rather than a vacuous pass.
pub struct AggregateAssertion {
    members: Vec<Member>,
    mode: AggregateMode,
    resolver: Option<Arc<dyn AssertionResolver>>,
}

impl AggregateAssertion {
    pub fn new() -> Self {
        Self {
            members: Vec::new(),
            mode: AggregateMode::All,
            resolver: None,
        }
    }

    pub fn with_mode(mut self, mode: AggregateMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn AssertionResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn with_assertion(mut self, assertion: Arc<dyn Assertion>) -> Self {
        self.members.push(Member::Direct(assertion));
        self
    }

    pub fn with_named(mut self, name: impl Into<String>) -> Self {
        self.members.push(Member::Named(name.into()));
        self
    }

    pub fn mode(&self) -> AggregateMode {
        self.mode
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn clear(&mut self) {
        self.members.clear();
    }

    fn evaluate_member(
        &self,
        member: &Member,
        acl: &Acl,
        role: Option<&dyn RoleIdentity>,
        resource: Option<&dyn ResourceIdentity>,
        privilege: Option<&str>,
    ) -> Result<bool> {
        match member {
            Member::Direct(assertion) => assertion.assert(acl, role, resource, privilege),
            Member::Named(name) => {
                let resolver = self
                    .resolver
                    .as_ref()
                    .ok_or_else(|| AclError::NoAssertionResolver(name.clone()))?;
                let assertion = resolver
                    .resolve(name)
                    .ok_or_else(|| AclError::UnresolvedAssertion(name.clone()))?;
                assertion.assert(acl, role, resource, privilege)
            }
        }
    }
}

impl Default for AggregateAssertion {
    fn default() -> Self {
        Self::new()
    }
}

impl Assertion for AggregateAssertion {
    fn assert(
        &self,
        acl: &Acl,
        role: Option<&dyn RoleIdentity>,
        resource: Option<&dyn ResourceIdentity>,
        privilege: Option<&str>,
    ) -> Result<bool> {
        if self.members.is_empty() {
            return Err(AclError::EmptyAggregate);
        }
        match self.mode {
            AggregateMode::All => {
                for member in &self.members {
                    if !self.evaluate_member(member, acl, role, resource, privilege)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            AggregateMode::AtLeastOne => {
                for member in &self.members {
                    if self.evaluate_member(member, acl, role, resource, privilege)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(bool);

    impl Assertion for Fixed {
        fn assert(
            &self,
            _acl: &Acl,
            _role: Option<&dyn RoleIdentity>,
            _resource: Option<&dyn ResourceIdentity>,
            _privilege: Option<&str>,
        ) -> Result<bool> {
            Ok(self.0)
        }
    }

    fn run(aggregate: &AggregateAssertion) -> Result<bool> {
        let acl = Acl::new();
        aggregate.assert(&acl, None, None, None)
    }

    #[test]
    fn empty_aggregate_is_an_error() {
        let aggregate = AggregateAssertion::new();
        assert_eq!(run(&aggregate).unwrap_err(), AclError::EmptyAggregate);
    }

    #[test]
    fn all_mode_requires_every_member() {
        let passing = AggregateAssertion::new()
            .with_assertion(Arc::new(Fixed(true)))
            .with_assertion(Arc::new(Fixed(true)));
        assert!(run(&passing).unwrap());

        let failing = AggregateAssertion::new()
            .with_assertion(Arc::new(Fixed(true)))
            .with_assertion(Arc::new(Fixed(false)));
        assert!(!run(&failing).unwrap());
    }

    #[test]
    fn at_least_one_mode_requires_any_member() {
        let passing = AggregateAssertion::new()
            .with_mode(AggregateMode::AtLeastOne)
            .with_assertion(Arc::new(Fixed(false)))
            .with_assertion(Arc::new(Fixed(true)));
        assert!(run(&passing).unwrap());

        let failing = AggregateAssertion::new()
            .with_mode(AggregateMode::AtLeastOne)
            .with_assertion(Arc::new(Fixed(false)));
        assert!(!run(&failing).unwrap());
    }

    #[test]
    fn named_member_without_resolver_is_an_error() {
        let aggregate = AggregateAssertion::new().with_named("owner");
        assert_eq!(
            run(&aggregate).unwrap_err(),
            AclError::NoAssertionResolver("owner".into())
        );
    }

    #[test]
    fn named_member_resolves_lazily() {
        let mut registry = AssertionRegistry::new();
        registry.register("owner", Arc::new(Fixed(true)));
        let aggregate = AggregateAssertion::new()
            .with_resolver(Arc::new(registry))
            .with_named("owner")
            .with_named("missing");
        assert_eq!(
            run(&aggregate).unwrap_err(),
            AclError::UnresolvedAssertion("missing".into())
        );
    }
}
