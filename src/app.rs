use std::time::{Duration, Instant};

use chrono::FixedOffset;
use ratatui::layout::Rect;

use crate::components::tree::hits_fold_marker;
use crate::config::AppConfig;
use crate::error::Result;
use crate::event::Event;
use crate::format::{format_modified, format_size};
use crate::fs::flatten;
use crate::fs::hydrate::{Hydrated, ROOT_SENTINEL};
use crate::fs::node::{Children, NodeId};
use crate::fs::order::{Direction, SortKey};
use crate::fs::places::Place;
use crate::fs::provider::TextContent;
use crate::fs::tree::{Applied, ListingRequest, ListingResponse, TreeState};
use crate::navigator::{self, NavKey, NavOutcome};
use crate::scroll::{ScrollPlan, ScrollSync, Viewport};
use crate::tasks::Dispatcher;
use crate::theme::{self, ThemeColors};

/// How long a status message stays on screen.
const STATUS_TTL: Duration = Duration::from_secs(3);

/// Content shown in the preview pane for the selected file.
#[derive(Debug, Default)]
pub struct PreviewState {
    /// Node the content belongs to.
    pub node: Option<NodeId>,
    pub lines: Vec<String>,
    /// Shown instead of `lines` when there is nothing to print.
    pub placeholder: Option<String>,
    pub scroll_offset: usize,
}

impl PreviewState {
    fn message(node: Option<NodeId>, msg: impl Into<String>) -> Self {
        Self {
            node,
            placeholder: Some(msg.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
    created: Instant,
}

/// Main application state.
pub struct App {
    pub tree_state: TreeState,
    pub viewport: Viewport,
    pub scroll_sync: ScrollSync,
    pub preview: PreviewState,
    pub status_message: Option<StatusMessage>,
    pub theme_colors: ThemeColors,
    pub use_icons: bool,
    pub utc_offset: FixedOffset,
    /// Inner area of the tree panel from the last frame, for mouse hits.
    pub tree_area: Rect,
    pub should_quit: bool,
    hydrating: bool,
    dispatcher: Dispatcher,
}

impl App {
    pub fn new(config: &AppConfig, dispatcher: Dispatcher) -> Self {
        Self {
            tree_state: TreeState::new(config.separator(), config.order()),
            viewport: Viewport::default(),
            scroll_sync: ScrollSync::new(config.row_height(), config.settle_retry()),
            preview: PreviewState::default(),
            status_message: None,
            theme_colors: theme::resolve_theme(&config.theme),
            use_icons: config.use_icons(),
            utc_offset: config.utc_offset(),
            tree_area: Rect::default(),
            should_quit: false,
            hydrating: false,
            dispatcher,
        }
    }

    /// Hydrate the provider's startup path, or show the bare volumes.
    pub fn start(&mut self) {
        let path = self
            .dispatcher
            .provider()
            .startup_path()
            .unwrap_or_else(|| ROOT_SENTINEL.to_string());
        tracing::info!(path = %path, "starting");
        self.go_to_path(path);
    }

    /// Rebuild the tree from the volumes down to `path`.
    pub fn go_to_path(&mut self, path: String) {
        let epoch = self.tree_state.begin_hydration();
        self.hydrating = true;
        self.dispatcher.spawn_hydrate(
            epoch,
            path,
            self.tree_state.order().clone(),
            self.tree_state.tree.separator(),
        );
    }

    /// Jump to a well-known directory.
    pub fn go_to_place(&mut self, place: Place) {
        match place.resolve() {
            Some(path) => {
                self.set_status_message(format!("{}: {}", place.label(), path));
                self.go_to_path(path);
            }
            None => self.set_error_message(format!("{} folder not found", place.label())),
        }
    }

    /// Whether background work the user is waiting on is still running.
    pub fn is_loading(&self) -> bool {
        self.hydrating || self.tree_state.has_pending()
    }

    // ── Background completions ──────────────────────────────────────────────

    /// Route a completion from a background task. Terminal input events are
    /// ignored here.
    pub fn handle_background(&mut self, event: Event) {
        match event {
            Event::ListingLoaded(response) => self.handle_listing(response),
            Event::Hydrated { epoch, hydrated } => self.handle_hydrated(epoch, hydrated),
            Event::ScrollRetry(target) => self.handle_scroll_retry(target),
            Event::TextLoaded { node, result } => self.handle_text_loaded(node, result),
            Event::Key(_) | Event::Mouse(_) | Event::Tick | Event::Resize(_, _) => {}
        }
    }

    pub fn handle_listing(&mut self, response: ListingResponse) {
        let (applied, follow_ups) = self.tree_state.complete_listing(response);
        self.dispatcher.spawn_listings(follow_ups);
        match applied {
            Applied::Loaded { node, .. } => {
                if let Some(selected) = self.tree_state.selected() {
                    if selected == node {
                        self.preview.node = None;
                    }
                    self.sync_scroll(selected);
                    self.load_preview();
                }
            }
            Applied::Failed { node } => {
                let reason = match self.tree_state.tree.get(node).map(|n| &n.children) {
                    Some(Children::Failed(reason)) => reason.clone(),
                    _ => "listing failed".to_string(),
                };
                self.set_error_message(reason);
            }
            Applied::Stale => {}
        }
    }

    pub fn handle_hydrated(&mut self, epoch: u64, hydrated: Hydrated) {
        let index = hydrated.index;
        if !self.tree_state.complete_hydration(epoch, hydrated) {
            return;
        }
        tracing::debug!(epoch, ?index, "hydrated tree swapped in");
        self.hydrating = false;
        if self.tree_state.tree.roots().is_empty() {
            self.set_error_message("No volumes found".to_string());
        }
        match self.tree_state.selected() {
            Some(selected) => self.sync_scroll(selected),
            None => self.viewport.request(0),
        }
        self.load_preview();
    }

    /// A delayed scroll fires: scroll to wherever the node is now.
    pub fn handle_scroll_retry(&mut self, target: NodeId) {
        if let Some(index) = self.scroll_sync.retry(&self.tree_state.tree, target) {
            self.viewport.request(index);
        }
    }

    pub fn handle_text_loaded(&mut self, node: NodeId, result: Result<TextContent>) {
        if self.preview.node != Some(node) || self.tree_state.selected() != Some(node) {
            return;
        }
        self.preview = match result {
            Ok(TextContent {
                text: Some(text), ..
            }) if text.is_empty() => PreviewState::message(Some(node), "Empty file"),
            Ok(TextContent {
                text: Some(text), ..
            }) => PreviewState {
                node: Some(node),
                lines: text.lines().map(str::to_string).collect(),
                ..PreviewState::default()
            },
            Ok(TextContent {
                text: None,
                mime_type,
                ..
            }) => PreviewState::message(Some(node), format!("Binary file ({mime_type})")),
            Err(e) => PreviewState::message(Some(node), format!("Cannot read file: {e}")),
        };
    }

    // ── User actions ────────────────────────────────────────────────────────

    pub fn navigate(&mut self, key: NavKey) {
        match navigator::navigate(&self.tree_state.tree, self.tree_state.selected(), key) {
            NavOutcome::Select(id) => self.select_node(id),
            NavOutcome::Toggle(id) => self.toggle(id),
            NavOutcome::Unchanged => {}
        }
    }

    pub fn select_node(&mut self, id: NodeId) {
        if self.tree_state.select(id) {
            self.sync_scroll(id);
            self.load_preview();
        }
    }

    /// Expand or collapse a directory.
    pub fn toggle(&mut self, id: NodeId) {
        if let Some(request) = self.tree_state.toggle(id) {
            self.spawn(request);
        } else if let Some(selected) = self.tree_state.selected() {
            // A collapse may have moved the selection up.
            self.sync_scroll(selected);
            self.load_preview();
        }
    }

    /// Reload the selected directory, or the directory holding the selected
    /// file.
    pub fn refresh_selected(&mut self) {
        let Some(selected) = self.tree_state.selected() else {
            return;
        };
        if let Some(request) = self.tree_state.refresh(selected) {
            self.set_status_message(format!("Refreshing {}", request.path));
            self.spawn(request);
        }
    }

    /// Cycle Name → Ext → Size → Modified, keeping the direction.
    pub fn cycle_sort_key(&mut self) {
        let order = self.tree_state.order();
        let (key, direction) = (order.sort_key().next(), order.direction());
        self.apply_order(key, direction);
    }

    pub fn reverse_order(&mut self) {
        let order = self.tree_state.order();
        let (key, direction) = (order.sort_key(), order.direction().reversed());
        self.apply_order(key, direction);
    }

    fn apply_order(&mut self, key: SortKey, direction: Direction) {
        let requests = self.tree_state.set_order(key, direction);
        self.dispatcher.spawn_listings(requests);
        self.set_status_message(format!("Sort: {}", self.tree_state.order().label()));
    }

    /// Handle a click on a viewport-relative position inside the tree panel.
    /// A click on a directory's fold marker toggles it; anything else on a
    /// row selects it.
    pub fn click(&mut self, column: u16, line: u16) {
        let line = (line / self.scroll_sync.row_height()) as usize;
        let Some(index) = self.viewport.row_at(line) else {
            return;
        };
        let tree = &self.tree_state.tree;
        let Some(id) = flatten::nth_visible(tree, index) else {
            return;
        };
        let on_marker = tree.get(id).is_some_and(|n| n.is_dir())
            && hits_fold_marker(tree.depth(id), column as usize);
        if on_marker {
            self.toggle(id);
        } else {
            self.select_node(id);
        }
    }

    pub fn scroll_preview(&mut self, delta: isize) {
        let max = self.preview.lines.len().saturating_sub(1);
        let offset = self.preview.scroll_offset.saturating_add_signed(delta);
        self.preview.scroll_offset = offset.min(max);
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    // ── Helpers ─────────────────────────────────────────────────────────────

    fn spawn(&self, request: ListingRequest) {
        self.dispatcher.spawn_listing(request);
    }

    /// Bring `target` into view once the layout has caught up.
    fn sync_scroll(&mut self, target: NodeId) {
        match self
            .scroll_sync
            .plan(&self.tree_state.tree, target, self.viewport.layout())
        {
            Some(ScrollPlan::NextFrame(index)) => self.viewport.request(index),
            Some(ScrollPlan::Delayed { target, delay }) => {
                self.dispatcher.spawn_scroll_retry(target, delay)
            }
            None => {}
        }
    }

    /// Point the preview at the selection, fetching file text when needed.
    fn load_preview(&mut self) {
        let Some(id) = self.tree_state.selected() else {
            self.preview = PreviewState::default();
            return;
        };
        if self.preview.node == Some(id) {
            return;
        }
        let Some(node) = self.tree_state.tree.get(id) else {
            return;
        };
        if node.is_dir() {
            let msg = match &node.children {
                Children::Loaded(ids) => format!("{} items", ids.len()),
                Children::Failed(reason) => reason.clone(),
                Children::NotLoaded => "Directory".to_string(),
            };
            self.preview = PreviewState::message(Some(id), msg);
            return;
        }
        let path = node.full_path.clone();
        self.preview = PreviewState::message(Some(id), "Loading…");
        self.dispatcher.spawn_read_text(id, path);
    }

    /// Full path of the selection, for the status bar.
    pub fn selected_path(&self) -> String {
        self.tree_state
            .selected_node()
            .map(|n| n.full_path.clone())
            .unwrap_or_default()
    }

    /// Size, modification time, and MIME type of the selection.
    pub fn selected_info(&self) -> String {
        let Some(node) = self.tree_state.selected_node() else {
            return String::new();
        };
        let mut parts = Vec::new();
        let size = format_size(node.meta.size_bytes);
        if !node.is_dir() && !size.is_empty() {
            parts.push(size);
        }
        let modified = format_modified(node.meta.modified_secs, self.utc_offset);
        if !modified.is_empty() {
            parts.push(modified);
        }
        if let Some(mime) = &node.meta.mime_type {
            parts.push(mime.clone());
        }
        parts.join("  ")
    }

    pub fn set_status_message(&mut self, text: String) {
        self.status_message = Some(StatusMessage {
            text,
            is_error: false,
            created: Instant::now(),
        });
    }

    pub fn set_error_message(&mut self, text: String) {
        tracing::warn!("{}", text);
        self.status_message = Some(StatusMessage {
            text,
            is_error: true,
            created: Instant::now(),
        });
    }

    /// Clear the status message once it has been displayed long enough.
    pub fn clear_expired_status(&mut self) {
        if let Some(msg) = &self.status_message {
            if msg.created.elapsed() > STATUS_TTL {
                self.status_message = None;
            }
        }
    }
}
