//! Keyboard navigation over the flattened rows.

use crate::fs::arena::Tree;
use crate::fs::flatten;
use crate::fs::node::NodeId;

/// Direction or action requested by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavKey {
    Up,
    Down,
    Left,
    Activate,
    First,
    Last,
}

/// Effect of a navigation key on the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavOutcome {
    Select(NodeId),
    /// Toggle this directory; the selection stays where it is.
    Toggle(NodeId),
    Unchanged,
}

/// Resolve `key` against the current selection.
///
/// Up, Down, Left and Activate do nothing without a selection. First and
/// Last work from any state as long as there is at least one row.
pub fn navigate(tree: &Tree, selected: Option<NodeId>, key: NavKey) -> NavOutcome {
    let outcome = match key {
        NavKey::First => flatten::nth_visible(tree, 0).map(NavOutcome::Select),
        NavKey::Last => flatten::total_visible(tree)
            .checked_sub(1)
            .and_then(|last| flatten::nth_visible(tree, last))
            .map(NavOutcome::Select),
        NavKey::Down => selected
            .and_then(|id| flatten::index_of(tree, id))
            .and_then(|i| flatten::nth_visible(tree, i + 1))
            .map(NavOutcome::Select),
        NavKey::Up => selected
            .and_then(|id| flatten::index_of(tree, id))
            .and_then(|i| i.checked_sub(1))
            .and_then(|i| flatten::nth_visible(tree, i))
            .map(NavOutcome::Select),
        NavKey::Left => selected
            .and_then(|id| tree.parent(id))
            .map(NavOutcome::Select),
        NavKey::Activate => selected
            .filter(|&id| tree.get(id).is_some_and(|node| node.is_dir()))
            .map(NavOutcome::Toggle),
    };
    outcome.unwrap_or(NavOutcome::Unchanged)
}
