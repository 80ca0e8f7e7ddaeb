//! Slab-backed node arena holding the volume roots and every materialized
//! descendant.
//!
//! Parents own their children through `Children::Loaded`; the arena is just
//! storage. Releasing a listing frees the whole subtree, and because each
//! insert takes a fresh generation, handles to released nodes stop
//! resolving even if their slot is reused.

use slab::Slab;

use crate::fs::node::{Children, Node, NodeId, Separator};
use crate::fs::provider::{Listing, VolumeInfo};

#[derive(Debug)]
struct Slot {
    generation: u64,
    node: Node,
}

#[derive(Debug)]
pub struct Tree {
    slots: Slab<Slot>,
    roots: Vec<NodeId>,
    separator: Separator,
    next_generation: u64,
    revision: u64,
}

impl Tree {
    /// An empty tree with no volumes.
    pub fn new(separator: Separator) -> Self {
        Self {
            slots: Slab::new(),
            roots: Vec::new(),
            separator,
            next_generation: 1,
            revision: 0,
        }
    }

    /// A tree whose roots are exactly the given volumes.
    pub fn from_volumes(volumes: &[VolumeInfo], separator: Separator) -> Self {
        let mut tree = Self::new(separator);
        for volume in volumes {
            let id = tree.insert(Node::from_volume(&volume.path, separator));
            tree.roots.push(id);
        }
        tree
    }

    fn insert(&mut self, node: Node) -> NodeId {
        let generation = self.next_generation;
        self.next_generation += 1;
        let slot = self.slots.insert(Slot { generation, node });
        NodeId { slot, generation }
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn separator(&self) -> Separator {
        self.separator
    }

    /// Bumped on every structural change.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Continue numbering after `previous` so this tree, swapped in for
    /// another, never reports one of that tree's revisions.
    pub fn continue_after(&mut self, previous: u64) {
        self.revision = self.revision.max(previous) + 1;
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.slots
            .get(id.slot)
            .filter(|slot| slot.generation == id.generation)
            .map(|slot| &slot.node)
    }

    fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.slot)
            .filter(|slot| slot.generation == id.generation)
            .map(|slot| &mut slot.node)
    }

    /// Whether `id` still refers to a node in this tree.
    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|node| node.parent)
    }

    /// Children of `id` if its listing is loaded.
    pub fn loaded_children(&self, id: NodeId) -> Option<&[NodeId]> {
        self.get(id).and_then(|node| node.children.loaded())
    }

    /// Number of ancestors above `id`.
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = self.parent(id);
        while let Some(parent) = current {
            depth += 1;
            current = self.parent(parent);
        }
        depth
    }

    /// Whether `ancestor` is `id` or one of its ancestors.
    pub fn is_within(&self, id: NodeId, ancestor: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    /// First node in `scope` whose stripped name equals `name`.
    pub fn find_by_name(&self, scope: &[NodeId], name: &str) -> Option<NodeId> {
        scope
            .iter()
            .copied()
            .find(|&id| self.get(id).is_some_and(|node| node.name == name))
    }

    /// Full paths of every loaded node at or below `id`, parents first.
    pub fn loaded_paths_under(&self, id: NodeId) -> Vec<String> {
        let mut paths = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.get(current) else {
                continue;
            };
            if let Some(children) = node.children.loaded() {
                paths.push(node.full_path.clone());
                stack.extend(children.iter().rev());
            }
        }
        paths
    }

    /// Replace `id`'s children with nodes built from `listing`.
    ///
    /// Any previous subtree is released first. Returns the new child
    /// handles, or `None` if `id` is not live.
    pub fn apply_listing(&mut self, id: NodeId, listing: Listing) -> Option<Vec<NodeId>> {
        self.release_children(id);
        let parent = self.get(id)?.clone();
        let separator = self.separator;
        let children: Vec<NodeId> = listing
            .entries
            .iter()
            .map(|entry| self.insert(Node::from_listing_entry(entry, &parent, id, separator)))
            .collect();
        let node = self.get_mut(id)?;
        node.children = Children::Loaded(children.clone());
        self.revision += 1;
        Some(children)
    }

    /// Record a failed fetch for `id`. Any previous subtree is released.
    pub fn mark_failed(&mut self, id: NodeId, reason: String) {
        self.release_children(id);
        if let Some(node) = self.get_mut(id) {
            node.children = Children::Failed(reason);
            self.revision += 1;
        }
    }

    /// Set `id` back to `NotLoaded`, freeing its entire subtree.
    pub fn release_children(&mut self, id: NodeId) {
        let Some(node) = self.get_mut(id) else {
            return;
        };
        let previous = std::mem::replace(&mut node.children, Children::NotLoaded);
        let mut stack = match previous {
            Children::Loaded(ids) => ids,
            Children::Failed(_) => {
                self.revision += 1;
                return;
            }
            Children::NotLoaded => return,
        };
        while let Some(child) = stack.pop() {
            if self.get(child).is_none() {
                continue;
            }
            let slot = self.slots.remove(child.slot);
            if let Children::Loaded(grandchildren) = slot.node.children {
                stack.extend(grandchildren);
            }
        }
        self.revision += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::provider::ListingEntry;

    const SEP: Separator = Separator::new('\\');

    fn volumes(paths: &[&str]) -> Vec<VolumeInfo> {
        paths
            .iter()
            .map(|p| VolumeInfo {
                path: p.to_string(),
            })
            .collect()
    }

    fn listing(entries: Vec<ListingEntry>) -> Listing {
        Listing { entries }
    }

    #[test]
    fn roots_are_the_reported_volumes() {
        let tree = Tree::from_volumes(&volumes(&["C:\\", "D:\\"]), SEP);
        let names: Vec<&str> = tree
            .roots()
            .iter()
            .map(|&id| tree.get(id).map(|n| n.name.as_str()).unwrap_or(""))
            .collect();
        assert_eq!(names, vec!["C:", "D:"]);
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn apply_listing_links_children_to_parent() {
        let mut tree = Tree::from_volumes(&volumes(&["C:\\"]), SEP);
        let root = tree.roots()[0];
        let kids = tree
            .apply_listing(
                root,
                listing(vec![ListingEntry::directory("Users"), ListingEntry::file("a.txt")]),
            )
            .unwrap();
        assert_eq!(kids.len(), 2);
        assert_eq!(tree.parent(kids[0]), Some(root));
        assert_eq!(tree.get(kids[0]).unwrap().full_path, "C:\\Users");
        assert_eq!(tree.depth(kids[1]), 1);
        assert_eq!(tree.loaded_children(root), Some(&kids[..]));
    }

    #[test]
    fn empty_listing_is_loaded_not_collapsed() {
        let mut tree = Tree::from_volumes(&volumes(&["C:\\"]), SEP);
        let root = tree.roots()[0];
        tree.apply_listing(root, Listing::default());
        assert_eq!(tree.get(root).unwrap().children, Children::Loaded(vec![]));
    }

    #[test]
    fn release_frees_whole_subtree() {
        let mut tree = Tree::from_volumes(&volumes(&["C:\\"]), SEP);
        let root = tree.roots()[0];
        let kids = tree
            .apply_listing(root, listing(vec![ListingEntry::directory("Users")]))
            .unwrap();
        let grandkids = tree
            .apply_listing(kids[0], listing(vec![ListingEntry::file("x"), ListingEntry::file("y")]))
            .unwrap();
        assert_eq!(tree.len(), 4);

        tree.release_children(root);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.get(root).unwrap().children, Children::NotLoaded);
        assert!(!tree.contains(kids[0]));
        assert!(!tree.contains(grandkids[1]));
    }

    #[test]
    fn reload_invalidates_old_handles() {
        let mut tree = Tree::from_volumes(&volumes(&["C:\\"]), SEP);
        let root = tree.roots()[0];
        let first = tree
            .apply_listing(root, listing(vec![ListingEntry::file("a")]))
            .unwrap();
        let second = tree
            .apply_listing(root, listing(vec![ListingEntry::file("a")]))
            .unwrap();
        assert_ne!(first[0], second[0]);
        assert!(!tree.contains(first[0]));
        assert_eq!(tree.get(second[0]).unwrap().full_path, "C:\\a");
    }

    #[test]
    fn revision_moves_on_every_mutation() {
        let mut tree = Tree::from_volumes(&volumes(&["C:\\"]), SEP);
        let root = tree.roots()[0];
        let r0 = tree.revision();
        tree.apply_listing(root, Listing::default());
        let r1 = tree.revision();
        tree.release_children(root);
        let r2 = tree.revision();
        tree.mark_failed(root, "denied".into());
        assert!(r0 < r1 && r1 < r2 && r2 < tree.revision());
    }

    #[test]
    fn continued_tree_counts_past_the_previous_one() {
        let mut tree = Tree::from_volumes(&volumes(&["C:\\"]), SEP);
        tree.continue_after(7);
        assert_eq!(tree.revision(), 8);
        let root = tree.roots()[0];
        tree.apply_listing(root, Listing::default());
        assert_eq!(tree.revision(), 9);

        // A counter already ahead still moves forward.
        tree.continue_after(2);
        assert_eq!(tree.revision(), 10);
    }

    #[test]
    fn release_on_collapsed_node_changes_nothing() {
        let mut tree = Tree::from_volumes(&volumes(&["C:\\"]), SEP);
        let root = tree.roots()[0];
        let before = tree.revision();
        tree.release_children(root);
        assert_eq!(tree.revision(), before);
        assert_eq!(tree.get(root).unwrap().children, Children::NotLoaded);
    }

    #[test]
    fn loaded_paths_and_ancestry() {
        let mut tree = Tree::from_volumes(&volumes(&["C:\\", "D:\\"]), SEP);
        let c = tree.roots()[0];
        let kids = tree
            .apply_listing(c, listing(vec![ListingEntry::directory("Users")]))
            .unwrap();
        tree.apply_listing(kids[0], Listing::default());
        assert_eq!(
            tree.loaded_paths_under(c),
            vec!["C:\\".to_string(), "C:\\Users".to_string()]
        );
        assert!(tree.is_within(kids[0], c));
        assert!(!tree.is_within(c, kids[0]));
    }
}
