//! Path hydration: resolve an absolute path into a chain of expanded nodes.

use crate::fs::arena::Tree;
use crate::fs::flatten;
use crate::fs::node::{NodeId, Separator};
use crate::fs::order::OrderSpec;
use crate::fs::provider::Provider;
use crate::fs::tree::{Applied, TreeState};

/// Path that hydrates to the bare volume roots.
pub const ROOT_SENTINEL: &str = "/";

/// A freshly built tree ready to be swapped in.
#[derive(Debug)]
pub struct Hydrated {
    pub tree: Tree,
    /// Deepest node matched along the path.
    pub selected: Option<NodeId>,
    /// Visible row of `selected` in `tree`.
    pub index: Option<usize>,
}

/// Walk from fresh volume roots down to `full_path`, expanding every
/// ancestor on the way.
///
/// A segment that cannot be found, or a directory that cannot be listed,
/// ends the walk early; the result then holds the deepest match so far.
pub async fn hydrate(
    provider: &dyn Provider,
    full_path: &str,
    order: &OrderSpec,
    separator: Separator,
) -> Hydrated {
    let volumes = provider.list_volumes().await;
    let mut state = TreeState::new(separator, order.clone());
    state.tree = Tree::from_volumes(&volumes, separator);

    if full_path == ROOT_SENTINEL {
        return Hydrated {
            tree: state.tree,
            selected: None,
            index: None,
        };
    }

    let segments = separator.segments(full_path);
    let mut scope: Vec<NodeId> = state.tree.roots().to_vec();
    let mut selected = None;

    for (i, segment) in segments.iter().enumerate() {
        let Some(found) = state.tree.find_by_name(&scope, segment) else {
            tracing::debug!(path = full_path, segment, "hydration stopped at missing segment");
            break;
        };
        selected = Some(found);
        if i + 1 == segments.len() {
            break;
        }
        match state.expand(found, provider).await {
            Applied::Loaded { .. } => {}
            Applied::Failed { .. } | Applied::Stale => {
                tracing::debug!(path = full_path, segment, "hydration stopped at unreadable segment");
                break;
            }
        }
        scope = state
            .tree
            .loaded_children(found)
            .map(<[NodeId]>::to_vec)
            .unwrap_or_default();
    }

    let index = selected.and_then(|id| flatten::index_of(&state.tree, id));
    Hydrated {
        tree: state.tree,
        selected,
        index,
    }
}
