//! Flattened index over the visible part of the tree.
//!
//! Row `i` is the `i`-th node of a pre-order walk over the roots that only
//! descends into loaded listings. Nothing is cached: every query re-walks
//! the current tree.

use crate::fs::arena::Tree;
use crate::fs::node::NodeId;

enum Step {
    Found(NodeId, usize),
    Next(usize),
}

/// Pre-order walk that stops at the first node for which `hit` returns true.
/// The running position is threaded through return values.
fn walk<F>(tree: &Tree, ids: &[NodeId], position: usize, hit: &F) -> Step
where
    F: Fn(NodeId, usize) -> bool,
{
    let mut position = position;
    for &id in ids {
        if hit(id, position) {
            return Step::Found(id, position);
        }
        position += 1;
        if let Some(children) = tree.loaded_children(id) {
            match walk(tree, children, position, hit) {
                found @ Step::Found(..) => return found,
                Step::Next(next) => position = next,
            }
        }
    }
    Step::Next(position)
}

/// Visible rows contributed by `ids` and their loaded descendants.
pub fn count_visible(tree: &Tree, ids: &[NodeId]) -> usize {
    ids.iter()
        .map(|&id| 1 + tree.loaded_children(id).map_or(0, |c| count_visible(tree, c)))
        .sum()
}

/// Total visible rows of the whole tree.
pub fn total_visible(tree: &Tree) -> usize {
    count_visible(tree, tree.roots())
}

/// Node at visible row `n`, or `None` when out of range.
pub fn nth_visible(tree: &Tree, n: usize) -> Option<NodeId> {
    match walk(tree, tree.roots(), 0, &|_, position| position == n) {
        Step::Found(id, _) => Some(id),
        Step::Next(_) => None,
    }
}

/// Visible row of `target`, or `None` if it is not reachable (released,
/// replaced by a reload, or under a collapsed ancestor).
pub fn index_of(tree: &Tree, target: NodeId) -> Option<usize> {
    match walk(tree, tree.roots(), 0, &|id, _| id == target) {
        Step::Found(_, position) => Some(position),
        Step::Next(_) => None,
    }
}

/// A row handed to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibleRow {
    pub id: NodeId,
    pub index: usize,
    pub depth: usize,
}

/// Up to `len` rows starting at row `start`, in one pass.
pub fn visible_window(tree: &Tree, start: usize, len: usize) -> Vec<VisibleRow> {
    let mut rows = Vec::with_capacity(len);
    if len == 0 {
        return rows;
    }
    let mut stack: Vec<(NodeId, usize)> = tree.roots().iter().rev().map(|&id| (id, 0)).collect();
    let mut index = 0;
    while let Some((id, depth)) = stack.pop() {
        if index >= start {
            rows.push(VisibleRow { id, index, depth });
            if rows.len() == len {
                break;
            }
        }
        index += 1;
        if let Some(children) = tree.loaded_children(id) {
            stack.extend(children.iter().rev().map(|&child| (child, depth + 1)));
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::node::Separator;
    use crate::fs::provider::{Listing, ListingEntry, VolumeInfo};
    use proptest::prelude::*;

    const SEP: Separator = Separator::new('\\');

    fn volumes(paths: &[&str]) -> Vec<VolumeInfo> {
        paths
            .iter()
            .map(|p| VolumeInfo {
                path: p.to_string(),
            })
            .collect()
    }

    fn files(names: &[&str]) -> Listing {
        Listing {
            entries: names.iter().map(|n| ListingEntry::file(*n)).collect(),
        }
    }

    /// `C:\` with three files, `D:\` collapsed.
    fn two_volumes_one_expanded() -> (Tree, Vec<NodeId>) {
        let mut tree = Tree::from_volumes(&volumes(&["C:\\", "D:\\"]), SEP);
        let c = tree.roots()[0];
        let kids = tree.apply_listing(c, files(&["a", "b", "c"])).unwrap();
        (tree, kids)
    }

    #[test]
    fn collapsed_roots_count_once_each() {
        let tree = Tree::from_volumes(&volumes(&["C:\\", "D:\\"]), SEP);
        assert_eq!(total_visible(&tree), 2);
        assert_eq!(nth_visible(&tree, 1), Some(tree.roots()[1]));
        assert_eq!(nth_visible(&tree, 2), None);
    }

    #[test]
    fn expanded_volume_rows_follow_pre_order() {
        let (tree, kids) = two_volumes_one_expanded();
        assert_eq!(total_visible(&tree), 5);
        assert_eq!(nth_visible(&tree, 0), Some(tree.roots()[0]));
        assert_eq!(nth_visible(&tree, 2), Some(kids[1]));
        assert_eq!(nth_visible(&tree, 3), Some(kids[2]));
        assert_eq!(nth_visible(&tree, 4), Some(tree.roots()[1]));
        assert_eq!(index_of(&tree, tree.roots()[1]), Some(4));
        assert_eq!(index_of(&tree, kids[0]), Some(1));
    }

    #[test]
    fn empty_listing_adds_no_rows() {
        let mut tree = Tree::from_volumes(&volumes(&["C:\\"]), SEP);
        let c = tree.roots()[0];
        tree.apply_listing(c, Listing::default());
        assert_eq!(total_visible(&tree), 1);
    }

    #[test]
    fn released_node_has_no_index() {
        let (mut tree, kids) = two_volumes_one_expanded();
        let c = tree.roots()[0];
        tree.release_children(c);
        assert_eq!(index_of(&tree, kids[1]), None);
        assert_eq!(total_visible(&tree), 2);
    }

    #[test]
    fn window_matches_nth_visible() {
        let (tree, kids) = two_volumes_one_expanded();
        let rows = visible_window(&tree, 1, 3);
        let ids: Vec<NodeId> = rows.iter().map(|r| r.id).collect();
        assert_eq!(ids, kids);
        assert!(rows.iter().all(|r| r.depth == 1));
        assert_eq!(rows[0].index, 1);

        let tail = visible_window(&tree, 4, 10);
        assert_eq!(tail.len(), 1);
        assert_eq!(tail[0].depth, 0);
        assert!(visible_window(&tree, 9, 3).is_empty());
        assert!(visible_window(&tree, 0, 0).is_empty());
    }

    #[derive(Debug, Clone)]
    struct Shape(Option<Vec<Shape>>);

    fn shape() -> impl Strategy<Value = Shape> {
        let leaf = prop_oneof![Just(Shape(None)), Just(Shape(Some(vec![])))];
        leaf.prop_recursive(4, 48, 4, |inner| {
            prop::collection::vec(inner, 0..4).prop_map(|c| Shape(Some(c)))
        })
    }

    fn grow(tree: &mut Tree, id: NodeId, shape: &Shape) {
        let Some(children) = &shape.0 else {
            return;
        };
        let listing = Listing {
            entries: (0..children.len())
                .map(|i| ListingEntry::directory(format!("n{i}")))
                .collect(),
        };
        let ids = tree.apply_listing(id, listing).unwrap_or_default();
        for (child, child_shape) in ids.into_iter().zip(children) {
            grow(tree, child, child_shape);
        }
    }

    proptest! {
        #[test]
        fn count_nth_and_index_agree(roots in prop::collection::vec(shape(), 1..4)) {
            let paths: Vec<String> = (0..roots.len()).map(|i| format!("/v{i}")).collect();
            let vols: Vec<VolumeInfo> = paths.iter().map(|p| VolumeInfo { path: p.clone() }).collect();
            let mut tree = Tree::from_volumes(&vols, Separator::new('/'));
            let root_ids = tree.roots().to_vec();
            for (id, s) in root_ids.into_iter().zip(&roots) {
                grow(&mut tree, id, s);
            }

            let total = total_visible(&tree);
            for i in 0..total {
                let id = nth_visible(&tree, i);
                prop_assert!(id.is_some());
                prop_assert_eq!(index_of(&tree, id.unwrap()), Some(i));
            }
            prop_assert_eq!(nth_visible(&tree, total), None);
            prop_assert_eq!(visible_window(&tree, 0, total + 5).len(), total);
        }
    }
}
