use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Widget},
};

use crate::fs::flatten::{self, VisibleRow};
use crate::fs::node::{Children, Node};
use crate::fs::tree::TreeState;
use crate::theme::ThemeColors;

/// Columns of indentation per depth level.
pub const INDENT: usize = 2;

/// Whether column `x` (relative to the tree area) hits the fold marker of a
/// row at `depth`.
pub fn hits_fold_marker(depth: usize, x: usize) -> bool {
    let start = depth * INDENT;
    (start..start + INDENT).contains(&x)
}

/// Tree widget drawing the visible window of the flattened rows.
pub struct TreeWidget<'a> {
    tree_state: &'a TreeState,
    theme: &'a ThemeColors,
    offset: usize,
    row_height: u16,
    use_icons: bool,
    block: Option<Block<'a>>,
}

impl<'a> TreeWidget<'a> {
    pub fn new(tree_state: &'a TreeState, theme: &'a ThemeColors, use_icons: bool) -> Self {
        Self {
            tree_state,
            theme,
            offset: 0,
            row_height: 1,
            use_icons,
            block: None,
        }
    }

    /// First visible row.
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn row_height(mut self, row_height: u16) -> Self {
        self.row_height = row_height.max(1);
        self
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = block.into();
        self
    }

    fn fold_marker(node: &Node, pending: bool) -> &'static str {
        if !node.is_dir() {
            return "  ";
        }
        match node.children {
            Children::Loaded(_) => "▾ ",
            _ if pending => "⋯ ",
            _ => "▸ ",
        }
    }

    fn item_indicator(&self, node: &Node) -> &'static str {
        let expanded = node.children.is_loaded();
        if self.use_icons {
            match node.is_dir() {
                true if expanded => " ",
                true => " ",
                false => Self::file_icon_by_ext(node.meta.extension.as_deref().unwrap_or("")),
            }
        } else if node.is_dir() {
            "[D] "
        } else {
            "[F] "
        }
    }

    /// Nerd Font icon for a file extension.
    fn file_icon_by_ext(ext: &str) -> &'static str {
        match ext.to_lowercase().as_str() {
            "rs" => " ",
            "py" => " ",
            "js" | "jsx" => " ",
            "ts" | "tsx" => " ",
            "html" | "htm" => " ",
            "css" | "scss" | "sass" => " ",
            "json" => " ",
            "toml" | "yaml" | "yml" | "ini" | "cfg" => " ",
            "md" | "markdown" | "rst" | "txt" => " ",
            "sh" | "bash" | "zsh" | "fish" => " ",
            "go" => " ",
            "c" | "h" => " ",
            "cpp" | "cxx" | "cc" | "hpp" => " ",
            "lock" => " ",
            "png" | "jpg" | "jpeg" | "gif" | "bmp" | "svg" | "ico" | "webp" => " ",
            "mp3" | "wav" | "flac" | "ogg" | "aac" => " ",
            "mp4" | "mkv" | "avi" | "mov" | "webm" => " ",
            "zip" | "tar" | "gz" | "xz" | "bz2" | "rar" | "7z" => " ",
            "pdf" => " ",
            "exe" | "dll" | "msi" => " ",
            _ => " ",
        }
    }

    fn row_style(&self, node: &Node, selected: bool) -> Style {
        if selected {
            return Style::default()
                .bg(self.theme.tree_selected_bg)
                .fg(self.theme.tree_selected_fg)
                .add_modifier(Modifier::BOLD);
        }
        match (&node.children, node.is_dir()) {
            (Children::Failed(_), _) => Style::default()
                .fg(self.theme.tree_failed_fg)
                .add_modifier(Modifier::ITALIC),
            (_, true) => Style::default()
                .fg(self.theme.tree_dir_fg)
                .add_modifier(Modifier::BOLD),
            (_, false) => Style::default().fg(self.theme.tree_file_fg),
        }
    }

    fn render_row(&self, row: &VisibleRow, node: &Node, y: u16, area: Rect, buf: &mut Buffer) {
        let selected = self.tree_state.selected() == Some(row.id);
        let pending = self.tree_state.is_pending(row.id);
        let style = self.row_style(node, selected);

        let mut text = format!(
            "{}{}{}{}",
            " ".repeat(row.depth * INDENT),
            Self::fold_marker(node, pending),
            self.item_indicator(node),
            node.name
        );
        if matches!(node.children, Children::Failed(_)) {
            text.push_str(" ✗");
        }
        if selected {
            let width = area.width as usize;
            let len = text.chars().count();
            if len < width {
                text.push_str(&" ".repeat(width - len));
            }
        }
        buf.set_line(area.x, y, &Line::from(Span::styled(text, style)), area.width);
    }
}

impl<'a> Widget for TreeWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner_area = if let Some(block) = &self.block {
            let inner = block.inner(area);
            block.clone().render(area, buf);
            inner
        } else {
            area
        };

        let rows_fit = (inner_area.height / self.row_height) as usize;
        if rows_fit == 0 || inner_area.width == 0 {
            return;
        }

        let tree = &self.tree_state.tree;
        for (i, row) in flatten::visible_window(tree, self.offset, rows_fit)
            .iter()
            .enumerate()
        {
            let Some(node) = tree.get(row.id) else {
                continue;
            };
            let y = inner_area.y + i as u16 * self.row_height;
            self.render_row(row, node, y, inner_area, buf);
        }
    }
}
