//! Rule storage keyed by (resource scope, role scope) coordinates

mod store;

pub use store::{PrivilegeRules, Rule, RuleKey, RuleStore, Scope};
