//! Resource tree: a single-parent hierarchy of protected resources

mod tree;

pub use tree::ResourceTree;
