use std::any::Any;
use std::sync::Arc;

use gatewarden::{
    Acl, AclError, AggregateAssertion, AggregateMode, Assertion, AssertionRegistry,
    CallbackAssertion, Resource, ResourceIdentity, Result, Role, RoleIdentity,
};

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

#[test]
fn failed_assertion_voids_the_rule() {
    let mut acl = Acl::new();
    acl.add_role("user", &[]).unwrap();
    acl.allow_assert(Some(&["user"]), None, None, Arc::new(Fixed(false))).unwrap();
    assert!(!acl.is_allowed(Some("user"), None, None).unwrap());
    assert!(!acl.is_allowed(Some("user"), None, Some("read")).unwrap());

    let mut acl = Acl::new();
    acl.add_role("user", &[]).unwrap();
    acl.allow_assert(Some(&["user"]), None, None, Arc::new(Fixed(true))).unwrap();
    assert!(acl.is_allowed(Some("user"), None, None).unwrap());
}

#[test]
fn failed_assertion_on_the_default_rule_inverts_it() {
    // a conditioned default deny behaves as an allow when its condition
    // does not hold
    let mut acl = Acl::new();
    acl.deny_assert(None, None, None, Arc::new(Fixed(false))).unwrap();
    assert!(acl.is_allowed(None, None, None).unwrap());
    assert!(acl.is_allowed(None, None, Some("somePrivilege")).unwrap());

    let mut acl = Acl::new();
    acl.deny_assert(None, None, None, Arc::new(Fixed(true))).unwrap();
    assert!(!acl.is_allowed(None, None, None).unwrap());
    assert!(!acl.is_allowed(None, None, Some("somePrivilege")).unwrap());
}

#[test]
fn voided_rule_lets_the_search_continue_up_the_tree() {
    let mut acl = Acl::new();
    acl.add_role("user", &[]).unwrap();
    acl.add_resource("root", None).unwrap();
    acl.add_resource("leaf", Some("root")).unwrap();
    acl.allow(Some(&["user"]), Some(&["root"]), Some(&["read"])).unwrap();
    // the cascaded copy on "leaf" would shadow the ancestor; replace it with
    // a conditioned deny that never holds
    acl.deny_assert(Some(&["user"]), Some(&["leaf"]), Some(&["read"]), Arc::new(Fixed(false)))
        .unwrap();
    assert!(acl.is_allowed(Some("user"), Some("leaf"), Some("read")).unwrap());
}

#[test]
fn callback_assertion_sees_the_queried_privilege() {
    let mut acl = Acl::new();
    acl.add_role("user", &[]).unwrap();
    let reads_only = CallbackAssertion::new(|_acl, _role, _resource, privilege| {
        privilege == Some("read")
    });
    acl.allow_assert(Some(&["user"]), None, None, Arc::new(reads_only)).unwrap();
    assert!(acl.is_allowed(Some("user"), None, Some("read")).unwrap());
    assert!(!acl.is_allowed(Some("user"), None, Some("write")).unwrap());
    assert!(!acl.is_allowed(Some("user"), None, None).unwrap());
}

// ---- original query identities reach the assertion ----

struct User {
    name: String,
}

impl RoleIdentity for User {
    fn role_id(&self) -> &str {
        "contributor"
    }
}

struct BlogPost {
    author: String,
}

impl ResourceIdentity for BlogPost {
    fn resource_id(&self) -> &str {
        "blog_post"
    }
}

struct OwnerAssertion;

impl Assertion for OwnerAssertion {
    fn assert(
        &self,
        _acl: &Acl,
        role: Option<&dyn RoleIdentity>,
        resource: Option<&dyn ResourceIdentity>,
        _privilege: Option<&str>,
    ) -> Result<bool> {
        let (Some(role), Some(resource)) = (role, resource) else {
            return Ok(false);
        };
        let user = (role as &dyn Any).downcast_ref::<User>();
        let post = (resource as &dyn Any).downcast_ref::<BlogPost>();
        match (user, post) {
            (Some(user), Some(post)) => Ok(user.name == post.author),
            _ => Ok(false),
        }
    }
}

#[test]
fn assertions_can_downcast_to_caller_types() {
    let mut acl = Acl::new();
    acl.add_role("contributor", &[]).unwrap();
    acl.add_resource("blog_post", None).unwrap();
    acl.allow_assert(
        Some(&["contributor"]),
        Some(&["blog_post"]),
        Some(&["edit"]),
        Arc::new(OwnerAssertion),
    )
    .unwrap();

    let martha = User { name: "martha".into() };
    let john = User { name: "john".into() };
    let post = BlogPost { author: "martha".into() };

    assert!(acl.is_allowed_with(Some(&martha), Some(&post), Some("edit")).unwrap());
    assert!(!acl.is_allowed_with(Some(&john), Some(&post), Some("edit")).unwrap());
    // id-based queries hand the registered stand-ins to the assertion, which
    // are not the caller's types
    assert!(!acl.is_allowed(Some("contributor"), Some("blog_post"), Some("edit")).unwrap());
}

#[test]
fn identity_queries_still_require_registration() {
    let acl = Acl::new();
    let ghost = Role::new("ghost");
    let nowhere = Resource::new("nowhere");
    assert_eq!(
        acl.is_allowed_with(Some(&ghost), None, None).unwrap_err(),
        AclError::UnknownRole("ghost".into())
    );
    assert_eq!(
        acl.is_allowed_with(None, Some(&nowhere), None).unwrap_err(),
        AclError::UnknownResource("nowhere".into())
    );
}

// ---- aggregates through the engine ----

#[test]
fn aggregate_gates_a_rule() {
    let mut acl = Acl::new();
    acl.add_role("user", &[]).unwrap();

    let mut registry = AssertionRegistry::new();
    registry.register("always", Arc::new(Fixed(true)));
    let aggregate = AggregateAssertion::new()
        .with_resolver(Arc::new(registry))
        .with_assertion(Arc::new(Fixed(true)))
        .with_named("always");
    acl.allow_assert(Some(&["user"]), None, None, Arc::new(aggregate)).unwrap();
    assert!(acl.is_allowed(Some("user"), None, None).unwrap());
}

#[test]
fn at_least_one_aggregate_needs_a_single_pass() {
    let mut acl = Acl::new();
    acl.add_role("user", &[]).unwrap();
    let aggregate = AggregateAssertion::new()
        .with_mode(AggregateMode::AtLeastOne)
        .with_assertion(Arc::new(Fixed(false)))
        .with_assertion(Arc::new(Fixed(true)));
    acl.allow_assert(Some(&["user"]), None, None, Arc::new(aggregate)).unwrap();
    assert!(acl.is_allowed(Some("user"), None, None).unwrap());
}

#[test]
fn empty_aggregate_surfaces_as_an_error() {
    let mut acl = Acl::new();
    acl.add_role("user", &[]).unwrap();
    acl.allow_assert(Some(&["user"]), None, None, Arc::new(AggregateAssertion::new())).unwrap();
    assert_eq!(
        acl.is_allowed(Some("user"), None, None).unwrap_err(),
        AclError::EmptyAggregate
    );
}
