use std::collections::{HashMap, HashSet};

use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::fs::arena::Tree;
use crate::fs::flatten;
use crate::fs::hydrate::Hydrated;
use crate::fs::node::{Node, NodeId, Separator};
use crate::fs::order::{Direction, OrderSpec, SortKey};
use crate::fs::provider::{Listing, Provider, TREE_METADATA};

/// A listing the tree is waiting for.
#[derive(Debug, Clone)]
pub struct ListingRequest {
    pub node: NodeId,
    pub path: String,
    pub order: OrderSpec,
    pub token: u64,
    pub cancel: CancellationToken,
}

/// Provider answer for a `ListingRequest`.
#[derive(Debug)]
pub struct ListingResponse {
    pub node: NodeId,
    pub token: u64,
    pub outcome: Result<Listing>,
}

/// What `complete_listing` did with a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    Loaded { node: NodeId, children: usize },
    Failed { node: NodeId },
    /// The node was collapsed, replaced, or already loaded; nothing changed.
    Stale,
}

#[derive(Debug)]
struct InFlight {
    token: u64,
    cancel: CancellationToken,
}

/// State for the tree view: the node arena plus selection, ordering, and
/// the bookkeeping for listings still in flight.
#[derive(Debug)]
pub struct TreeState {
    pub tree: Tree,
    selected: Option<NodeId>,
    order: OrderSpec,
    in_flight: HashMap<NodeId, InFlight>,
    next_token: u64,
    /// Directories to re-expand when their node re-appears after a reload.
    restore_expanded: HashSet<String>,
    /// Selection to re-establish after a reload.
    restore_selection: Option<String>,
    hydration_epoch: u64,
}

impl TreeState {
    pub fn new(separator: Separator, order: OrderSpec) -> Self {
        Self {
            tree: Tree::new(separator),
            selected: None,
            order,
            in_flight: HashMap::new(),
            next_token: 1,
            restore_expanded: HashSet::new(),
            restore_selection: None,
            hydration_epoch: 0,
        }
    }

    pub fn order(&self) -> &OrderSpec {
        &self.order
    }

    /// Currently selected node, if it is still part of the tree.
    pub fn selected(&self) -> Option<NodeId> {
        self.selected.filter(|&id| self.tree.contains(id))
    }

    pub fn selected_node(&self) -> Option<&Node> {
        self.selected().and_then(|id| self.tree.get(id))
    }

    /// Select `id`. Returns false (and leaves selection alone) for a handle
    /// that is not in the tree.
    pub fn select(&mut self, id: NodeId) -> bool {
        if !self.tree.contains(id) {
            return false;
        }
        self.selected = Some(id);
        self.restore_selection = None;
        true
    }

    pub fn is_pending(&self, id: NodeId) -> bool {
        self.in_flight.contains_key(&id)
    }

    /// Whether any listing is still outstanding.
    pub fn has_pending(&self) -> bool {
        !self.in_flight.is_empty()
    }

    /// Start loading `id`'s children.
    ///
    /// Returns `None` for files, already loaded nodes, released handles, and
    /// nodes that already have a request in flight.
    pub fn begin_expand(&mut self, id: NodeId) -> Option<ListingRequest> {
        let node = self.tree.get(id)?;
        if !node.is_dir() || node.children.is_loaded() || self.in_flight.contains_key(&id) {
            return None;
        }
        let token = self.next_token;
        self.next_token += 1;
        let cancel = CancellationToken::new();
        self.in_flight.insert(
            id,
            InFlight {
                token,
                cancel: cancel.clone(),
            },
        );
        tracing::debug!(path = %node.full_path, token, "listing requested");
        Some(ListingRequest {
            node: id,
            path: node.full_path.clone(),
            order: self.order.clone(),
            token,
            cancel,
        })
    }

    /// Apply a provider response if it still belongs to the current tree.
    ///
    /// Also returns follow-up requests for directories being restored after
    /// a reorder or refresh.
    pub fn complete_listing(&mut self, response: ListingResponse) -> (Applied, Vec<ListingRequest>) {
        let result = self.apply_response(response);
        self.prune_restores();
        result
    }

    fn apply_response(&mut self, response: ListingResponse) -> (Applied, Vec<ListingRequest>) {
        let ListingResponse {
            node,
            token,
            outcome,
        } = response;

        let registered = self.in_flight.get(&node).map(|f| f.token);
        if registered != Some(token) {
            tracing::debug!(token, "discarding listing for a superseded request");
            return (Applied::Stale, Vec::new());
        }
        self.in_flight.remove(&node);

        let loaded = match self.tree.get(node) {
            Some(n) => n.children.is_loaded(),
            None => {
                tracing::debug!(token, "discarding listing for a released node");
                return (Applied::Stale, Vec::new());
            }
        };
        if loaded {
            return (Applied::Stale, Vec::new());
        }

        match outcome {
            Ok(listing) => {
                let children = self.tree.apply_listing(node, listing).unwrap_or_default();
                let follow_ups = self.restore_among(&children);
                (
                    Applied::Loaded {
                        node,
                        children: children.len(),
                    },
                    follow_ups,
                )
            }
            Err(err) => {
                tracing::warn!(error = %err, "listing failed");
                self.tree.mark_failed(node, err.to_string());
                (Applied::Failed { node }, Vec::new())
            }
        }
    }

    fn restore_among(&mut self, children: &[NodeId]) -> Vec<ListingRequest> {
        let mut follow_ups = Vec::new();
        for &child in children {
            let Some(path) = self.tree.get(child).map(|n| n.full_path.clone()) else {
                continue;
            };
            if self.restore_selection.as_deref() == Some(path.as_str()) {
                self.selected = Some(child);
                self.restore_selection = None;
            }
            if self.restore_expanded.remove(&path) {
                follow_ups.extend(self.begin_expand(child));
            }
        }
        follow_ups
    }

    /// Discard `id`'s children. Any listing in flight for `id` or its
    /// descendants is cancelled. A selection inside the subtree moves to `id`.
    pub fn collapse(&mut self, id: NodeId) {
        self.release(id);
        self.prune_restores();
    }

    fn release(&mut self, id: NodeId) {
        if !self.tree.contains(id) {
            return;
        }
        if let Some(selected) = self.selected() {
            if selected != id && self.tree.is_within(selected, id) {
                self.selected = Some(id);
            }
        }
        self.cancel_within(id);
        self.tree.release_children(id);
    }

    fn cancel_within(&mut self, id: NodeId) {
        let tree = &self.tree;
        self.in_flight.retain(|&node, flight| {
            let inside = !tree.contains(node) || tree.is_within(node, id);
            if inside {
                flight.cancel.cancel();
            }
            !inside
        });
    }

    fn cancel_all(&mut self) {
        for (_, flight) in self.in_flight.drain() {
            flight.cancel.cancel();
        }
    }

    /// Expand a collapsed directory or collapse an expanded one.
    pub fn toggle(&mut self, id: NodeId) -> Option<ListingRequest> {
        let node = self.tree.get(id)?;
        if !node.is_dir() {
            return None;
        }
        if node.children.is_loaded() {
            self.collapse(id);
            None
        } else {
            self.begin_expand(id)
        }
    }

    /// Fetch `id`'s listing and apply it, waiting on the provider inline.
    pub async fn expand(&mut self, id: NodeId, provider: &dyn Provider) -> Applied {
        let Some(request) = self.begin_expand(id) else {
            return Applied::Stale;
        };
        let outcome = provider
            .list_directory(&request.path, &request.order, TREE_METADATA)
            .await;
        let (applied, _) = self.complete_listing(ListingResponse {
            node: request.node,
            token: request.token,
            outcome,
        });
        applied
    }

    /// Re-fetch `id` (or the directory holding it), restoring expanded
    /// descendants by path as their listings arrive.
    pub fn refresh(&mut self, id: NodeId) -> Option<ListingRequest> {
        let target = match self.tree.get(id) {
            Some(node) if node.is_dir() => id,
            Some(_) => self.tree.parent(id)?,
            None => return None,
        };
        self.remember_selection_within(target);
        let expanded = self.expanded_paths_within(target);
        self.release(target);
        self.restore_expanded.extend(expanded);
        let request = self.begin_expand(target);
        self.prune_restores();
        request
    }

    /// Switch ordering. Every loaded or loading listing is discarded and
    /// re-fetched with the new order.
    pub fn set_order(&mut self, sort_key: SortKey, direction: Direction) -> Vec<ListingRequest> {
        let order = OrderSpec::new(sort_key, direction);
        if order == self.order {
            return Vec::new();
        }
        tracing::info!(order = %order.label(), "ordering changed");
        self.order = order;

        let roots: Vec<NodeId> = self
            .tree
            .roots()
            .iter()
            .copied()
            .filter(|&r| self.tree.loaded_children(r).is_some() || self.in_flight.contains_key(&r))
            .collect();
        if let Some(selected) = self.selected() {
            if let Some(&root) = roots.iter().find(|&&r| self.tree.is_within(selected, r)) {
                self.remember_selection_within(root);
            }
        }
        let expanded: Vec<String> = roots
            .iter()
            .flat_map(|&root| self.expanded_paths_within(root))
            .collect();
        self.cancel_all();
        self.restore_expanded.extend(expanded);

        let mut requests = Vec::new();
        for root in roots {
            self.tree.release_children(root);
            requests.extend(self.begin_expand(root));
        }
        self.prune_restores();
        requests
    }

    /// Paths strictly below `ancestor` that are expanded or being expanded.
    fn expanded_paths_within(&self, ancestor: NodeId) -> Vec<String> {
        let mut paths: Vec<String> = self
            .tree
            .loaded_paths_under(ancestor)
            .into_iter()
            .skip(1)
            .collect();
        for &node in self.in_flight.keys() {
            if node != ancestor && self.tree.is_within(node, ancestor) {
                paths.extend(self.tree.get(node).map(|n| n.full_path.clone()));
            }
        }
        paths
    }

    /// Drop restore targets no outstanding listing can bring back.
    fn prune_restores(&mut self) {
        let sep = self.tree.separator();
        let loading: Vec<&str> = self
            .in_flight
            .keys()
            .filter_map(|&id| self.tree.get(id))
            .map(|n| n.full_path.as_str())
            .collect();
        let reachable = |path: &str| loading.iter().any(|a| sep.is_under(path, a));
        self.restore_expanded.retain(|p| reachable(p.as_str()));
        if self
            .restore_selection
            .as_deref()
            .is_some_and(|p| !reachable(p))
        {
            self.restore_selection = None;
        }
    }

    fn remember_selection_within(&mut self, ancestor: NodeId) {
        if let Some(selected) = self.selected() {
            if selected != ancestor && self.tree.is_within(selected, ancestor) {
                self.restore_selection = self.tree.get(selected).map(|n| n.full_path.clone());
                self.selected = Some(ancestor);
            }
        }
    }

    /// Start a new hydration and return its epoch. Earlier epochs become stale.
    pub fn begin_hydration(&mut self) -> u64 {
        self.hydration_epoch += 1;
        self.hydration_epoch
    }

    /// Swap in a hydrated tree unless a newer hydration has started.
    pub fn complete_hydration(&mut self, epoch: u64, hydrated: Hydrated) -> bool {
        if epoch != self.hydration_epoch {
            tracing::debug!(epoch, current = self.hydration_epoch, "discarding stale hydration");
            return false;
        }
        self.cancel_all();
        self.restore_expanded.clear();
        self.restore_selection = None;
        let mut tree = hydrated.tree;
        tree.continue_after(self.tree.revision());
        self.tree = tree;
        self.selected = hydrated.selected;
        true
    }

    /// Number of visible rows right now.
    pub fn visible_count(&self) -> usize {
        flatten::total_visible(&self.tree)
    }

    /// Visible row of the selection.
    pub fn selected_index(&self) -> Option<usize> {
        self.selected().and_then(|id| flatten::index_of(&self.tree, id))
    }
}
