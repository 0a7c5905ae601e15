//! Error types for the access control engine

use thiserror::Error;

/// Access control engine errors
///
/// Every error is local and synchronous: the engine performs no I/O, so there
/// is no transient-failure class and nothing is retryable. A failed mutation
/// leaves the rule store unchanged.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AclError {
    /// Role referenced in a query or rule is not registered
    #[error("role '{0}' not found")]
    UnknownRole(String),

    /// Role id is already registered
    #[error("role id '{0}' already exists in the registry")]
    DuplicateRole(String),

    /// Parent role named at registration is not registered
    #[error("parent role id '{0}' does not exist")]
    UnknownParentRole(String),

    /// Resource referenced in a query or rule is not registered
    #[error("resource '{0}' not found")]
    UnknownResource(String),

    /// Resource id is already registered
    #[error("resource id '{0}' already exists in the ACL")]
    DuplicateResource(String),

    /// Parent resource named at registration is not registered
    #[error("parent resource id '{0}' does not exist")]
    UnknownParentResource(String),

    /// Aggregate assertion evaluated with no member assertions
    #[error("no assertions have been aggregated")]
    EmptyAggregate,

    /// Aggregate holds a named assertion but no resolver is configured
    #[error("no assertion resolver is set - cannot look up '{0}'")]
    NoAssertionResolver(String),

    /// Named assertion is not known to the configured resolver
    #[error("assertion '{0}' is not defined in the assertion resolver")]
    UnresolvedAssertion(String),
}

/// Result type for access control operations
pub type Result<T> = std::result::Result<T, AclError>;
