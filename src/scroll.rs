//! Keeps the tree viewport in step with the selection.
//!
//! A scroll request is only applied once the renderer has drawn rows for the
//! latest tree mutation. The renderer reports what it drew after each frame;
//! when that report names the current tree revision the layout is settled.
//! Otherwise the measured extent is compared against the expected one, and
//! a mismatch falls back to one delayed retry.

use std::time::Duration;

use crate::fs::arena::Tree;
use crate::fs::flatten;
use crate::fs::node::NodeId;

pub const DEFAULT_ROW_HEIGHT: u16 = 1;
pub const DEFAULT_SETTLE_RETRY: Duration = Duration::from_millis(100);

/// What the renderer drew in its last frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LayoutReport {
    /// Height of the laid-out row content, in cells.
    pub measured_extent: u32,
    /// Tree revision the frame was drawn from, when known.
    pub rendered_revision: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollPlan {
    /// Scroll on the next frame.
    NextFrame(usize),
    /// Re-resolve `target` after `delay`, then scroll regardless.
    Delayed { target: NodeId, delay: Duration },
}

#[derive(Debug, Clone, Copy)]
pub struct ScrollSync {
    row_height: u16,
    retry_delay: Duration,
}

impl Default for ScrollSync {
    fn default() -> Self {
        Self::new(DEFAULT_ROW_HEIGHT, DEFAULT_SETTLE_RETRY)
    }
}

impl ScrollSync {
    pub fn new(row_height: u16, retry_delay: Duration) -> Self {
        Self {
            row_height: row_height.max(1),
            retry_delay,
        }
    }

    pub fn row_height(&self) -> u16 {
        self.row_height
    }

    /// Whether `layout` reflects the current state of `tree`.
    pub fn is_settled(&self, tree: &Tree, layout: Option<&LayoutReport>) -> bool {
        let layout = layout.copied().unwrap_or_default();
        if layout.rendered_revision == Some(tree.revision()) {
            return true;
        }
        let row = u64::from(self.row_height);
        let measured = u64::from(layout.measured_extent) / row * row;
        let expected = flatten::total_visible(tree) as u64 * row;
        measured == expected
    }

    /// Decide how to bring `target` into view. `None` when the node is not
    /// visible in `tree`.
    pub fn plan(&self, tree: &Tree, target: NodeId, layout: Option<&LayoutReport>) -> Option<ScrollPlan> {
        let index = flatten::index_of(tree, target)?;
        if self.is_settled(tree, layout) {
            Some(ScrollPlan::NextFrame(index))
        } else {
            tracing::trace!(index, "layout not settled, retrying later");
            Some(ScrollPlan::Delayed {
                target,
                delay: self.retry_delay,
            })
        }
    }

    /// Index to scroll to when a delayed retry fires.
    pub fn retry(&self, tree: &Tree, target: NodeId) -> Option<usize> {
        flatten::index_of(tree, target)
    }

    /// Extent the renderer should report for `rows` drawn rows.
    pub fn extent_of(&self, rows: usize) -> u32 {
        u32::try_from(rows)
            .unwrap_or(u32::MAX)
            .saturating_mul(u32::from(self.row_height))
    }
}

/// Visible slice of the flattened rows.
#[derive(Debug, Default)]
pub struct Viewport {
    offset: usize,
    height: usize,
    pending: Option<usize>,
    layout: Option<LayoutReport>,
}

impl Viewport {
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn layout(&self) -> Option<&LayoutReport> {
        self.layout.as_ref()
    }

    pub fn pending(&self) -> Option<usize> {
        self.pending
    }

    /// Queue a scroll for the next frame. A later request replaces it.
    pub fn request(&mut self, index: usize) {
        self.pending = Some(index);
    }

    /// Called by the renderer before drawing: adopt the area height and
    /// apply any queued scroll.
    pub fn prepare(&mut self, height: usize, total: usize) {
        self.height = height;
        if let Some(index) = self.pending.take() {
            self.scroll_to(index);
        }
        let max_offset = total.saturating_sub(self.height);
        if self.offset > max_offset {
            self.offset = max_offset;
        }
    }

    /// Move the smallest distance that puts `index` inside the viewport.
    pub fn scroll_to(&mut self, index: usize) {
        if self.height == 0 {
            return;
        }
        if index < self.offset {
            self.offset = index;
        } else if index >= self.offset + self.height {
            self.offset = index - self.height + 1;
        }
    }

    pub fn record_layout(&mut self, report: LayoutReport) {
        self.layout = Some(report);
    }

    /// Row index under a viewport-relative line, if any.
    pub fn row_at(&self, line: usize) -> Option<usize> {
        (line < self.height).then_some(self.offset + line)
    }
}
