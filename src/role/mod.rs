//! Role registry: a DAG of roles with ordered multi-parent inheritance

mod registry;

pub use registry::RoleRegistry;
