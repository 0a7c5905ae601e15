use indexmap::IndexMap;

use crate::error::{AclError, Result};
use crate::types::Resource;

#[derive(Debug, Clone)]
struct ResourceNode {
    resource: Resource,
    parent: Option<String>,
    children: Vec<String>,
}

/// Hierarchy of resources.
///
/// Each resource has at most one parent. A rule placed on a resource covers
/// its whole subtree unless a more specific rule overrides it, and removing a
/// resource removes the subtree below it as well.
#[derive(Debug, Clone, Default)]
pub struct ResourceTree {
    resources: IndexMap<String, ResourceNode>,
}

impl ResourceTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `resource`, optionally as a child of `parent`.
    pub fn add(&mut self, resource: Resource, parent: Option<&str>) -> Result<()> {
        let id = resource.id().to_string();
        if self.resources.contains_key(&id) {
            return Err(AclError::DuplicateResource(id));
        }
        if let Some(parent_id) = parent {
            match self.resources.get_mut(parent_id) {
                Some(node) => node.children.push(id.clone()),
                None => return Err(AclError::UnknownParentResource(parent_id.to_string())),
            }
        }
        self.resources.insert(
            id,
            ResourceNode {
                resource,
                parent: parent.map(str::to_string),
                children: Vec::new(),
            },
        );
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Resource> {
        self.resources.get(id).map(|node| &node.resource)
    }

    pub fn has(&self, id: &str) -> bool {
        self.resources.contains_key(id)
    }

    /// The direct parent of `id`, if any. `None` for unregistered ids too;
    /// callers validate registration separately.
    pub fn parent_of(&self, id: &str) -> Option<&str> {
        self.resources
            .get(id)
            .and_then(|node| node.parent.as_deref())
    }

    /// Registered resource ids in registration order.
    pub fn resource_ids(&self) -> Vec<&str> {
        self.resources.keys().map(String::as_str).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Whether `resource` sits below `ancestor`, directly when `only_parent`
    /// is set, otherwise anywhere up the parent chain.
    pub fn inherits(&self, resource: &str, ancestor: &str, only_parent: bool) -> Result<bool> {
        if !self.resources.contains_key(resource) {
            return Err(AclError::UnknownResource(resource.to_string()));
        }
        if !self.resources.contains_key(ancestor) {
            return Err(AclError::UnknownResource(ancestor.to_string()));
        }

        let mut current = self.parent_of(resource);
        if only_parent {
            return Ok(current == Some(ancestor));
        }
        while let Some(id) = current {
            if id == ancestor {
                return Ok(true);
            }
            current = self.parent_of(id);
        }
        Ok(false)
    }

    /// All transitive children of `id`, top-down.
    pub fn descendants(&self, id: &str) -> Vec<String> {
        let mut out = Vec::new();
        let mut stack = vec![id.to_string()];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.resources.get(&current) {
                for child in &node.children {
                    out.push(child.clone());
                    stack.push(child.clone());
                }
            }
        }
        out
    }

    /// Unregisters `id` and its whole subtree, returning every removed id so
    /// the caller can drop the rules keyed to them.
    pub fn remove(&mut self, id: &str) -> Result<Vec<String>> {
        if !self.resources.contains_key(id) {
            return Err(AclError::UnknownResource(id.to_string()));
        }
        let mut removed = self.descendants(id);
        removed.push(id.to_string());

        if let Some(parent_id) = self.parent_of(id).map(str::to_string) {
            if let Some(parent_node) = self.resources.get_mut(&parent_id) {
                parent_node.children.retain(|c| c != id);
            }
        }
        for victim in &removed {
            self.resources.shift_remove(victim);
        }
        Ok(removed)
    }

    pub fn remove_all(&mut self) {
        self.resources.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn city_tree() -> ResourceTree {
        let mut tree = ResourceTree::new();
        tree.add(Resource::new("city"), None).unwrap();
        tree.add(Resource::new("building"), Some("city")).unwrap();
        tree.add(Resource::new("room"), Some("building")).unwrap();
        tree
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut tree = city_tree();
        let err = tree.add(Resource::new("city"), None).unwrap_err();
        assert_eq!(err, AclError::DuplicateResource("city".into()));
    }

    #[test]
    fn unknown_parent_is_rejected() {
        let mut tree = ResourceTree::new();
        let err = tree.add(Resource::new("room"), Some("building")).unwrap_err();
        assert_eq!(err, AclError::UnknownParentResource("building".into()));
        assert!(!tree.has("room"));
    }

    #[test]
    fn inherits_walks_the_parent_chain() {
        let tree = city_tree();
        assert!(tree.inherits("room", "building", false).unwrap());
        assert!(tree.inherits("room", "city", false).unwrap());
        assert!(tree.inherits("room", "building", true).unwrap());
        assert!(!tree.inherits("room", "city", true).unwrap());
        assert!(!tree.inherits("city", "room", false).unwrap());
    }

    #[test]
    fn descendants_cover_the_subtree() {
        let mut tree = city_tree();
        tree.add(Resource::new("closet"), Some("room")).unwrap();
        let mut descendants = tree.descendants("city");
        descendants.sort();
        assert_eq!(descendants, ["building", "closet", "room"]);
        assert!(tree.descendants("closet").is_empty());
    }

    #[test]
    fn remove_cascades_and_reports_victims() {
        let mut tree = city_tree();
        let mut removed = tree.remove("building").unwrap();
        removed.sort();
        assert_eq!(removed, ["building", "room"]);
        assert!(tree.has("city"));
        assert!(!tree.has("building"));
        assert!(!tree.has("room"));
        assert!(tree.descendants("city").is_empty());
    }

    #[test]
    fn resource_ids_report_registration_order() {
        let tree = city_tree();
        assert_eq!(tree.resource_ids(), ["city", "building", "room"]);
    }
}
