//! Theme data model: built-in palettes and resolution from config.
//!
//! Two built-in palettes (dark and light) plus custom hex overrides from the
//! config file.

use ratatui::style::Color;

use crate::config::{ThemeColorsConfig, ThemeConfig};

// ── Runtime theme colors ─────────────────────────────────────────────────────

/// All runtime colors used in the UI.
///
/// Constructed from a config-level `ThemeConfig` via `resolve_theme()`.
#[derive(Debug, Clone)]
pub struct ThemeColors {
    // Tree panel
    pub tree_bg: Color,
    pub tree_fg: Color,
    pub tree_selected_bg: Color,
    pub tree_selected_fg: Color,
    pub tree_dir_fg: Color,
    pub tree_file_fg: Color,
    /// Directories whose last listing failed.
    pub tree_failed_fg: Color,

    // Preview panel
    pub preview_bg: Color,
    pub preview_fg: Color,
    pub preview_line_nr_fg: Color,

    // Status bar
    pub status_bg: Color,
    pub status_fg: Color,

    // Borders
    pub border_fg: Color,
    pub border_focused_fg: Color,

    // Semantic colors (not configurable)
    pub error_fg: Color,
    pub info_fg: Color,
    pub accent_fg: Color,
    pub dim_fg: Color,
}

// ── Built-in palettes ────────────────────────────────────────────────────────

/// Dark theme using Catppuccin Mocha palette.
pub fn dark_theme() -> ThemeColors {
    ThemeColors {
        tree_bg: Color::Reset,
        tree_fg: Color::Rgb(205, 214, 244),          // #cdd6f4 (text)
        tree_selected_bg: Color::Rgb(69, 71, 90),    // #45475a (surface1)
        tree_selected_fg: Color::Rgb(205, 214, 244), // #cdd6f4
        tree_dir_fg: Color::Rgb(137, 180, 250),      // #89b4fa (blue)
        tree_file_fg: Color::Rgb(205, 214, 244),     // #cdd6f4
        tree_failed_fg: Color::Rgb(243, 139, 168),   // #f38ba8 (red)

        preview_bg: Color::Reset,
        preview_fg: Color::Rgb(205, 214, 244),
        preview_line_nr_fg: Color::Rgb(108, 112, 134), // #6c7086 (overlay0)

        status_bg: Color::Rgb(30, 30, 46), // #1e1e2e (base)
        status_fg: Color::Rgb(205, 214, 244),

        border_fg: Color::Rgb(88, 91, 112),           // #585b70 (surface2)
        border_focused_fg: Color::Rgb(137, 180, 250), // #89b4fa (blue)

        error_fg: Color::Rgb(243, 139, 168), // #f38ba8 (red)
        info_fg: Color::Rgb(137, 180, 250),  // #89b4fa (blue)
        accent_fg: Color::Rgb(203, 166, 247), // #cba6f7 (mauve)
        dim_fg: Color::Rgb(108, 112, 134),   // #6c7086
    }
}

/// Light theme: Catppuccin Latte.
pub fn light_theme() -> ThemeColors {
    ThemeColors {
        tree_bg: Color::Reset,
        tree_fg: Color::Rgb(76, 79, 105),            // #4c4f69 (text)
        tree_selected_bg: Color::Rgb(204, 208, 218), // #ccd0da (surface1)
        tree_selected_fg: Color::Rgb(76, 79, 105),
        tree_dir_fg: Color::Rgb(30, 102, 245), // #1e66f5 (blue)
        tree_file_fg: Color::Rgb(76, 79, 105),
        tree_failed_fg: Color::Rgb(210, 15, 57), // #d20f39 (red)

        preview_bg: Color::Reset,
        preview_fg: Color::Rgb(76, 79, 105),
        preview_line_nr_fg: Color::Rgb(156, 160, 176), // #9ca0b0 (overlay0)

        status_bg: Color::Rgb(239, 241, 245), // #eff1f5 (base)
        status_fg: Color::Rgb(76, 79, 105),

        border_fg: Color::Rgb(172, 176, 190), // #acb0be (surface2)
        border_focused_fg: Color::Rgb(30, 102, 245),

        error_fg: Color::Rgb(210, 15, 57),
        info_fg: Color::Rgb(30, 102, 245),
        accent_fg: Color::Rgb(136, 57, 239), // #8839ef (mauve)
        dim_fg: Color::Rgb(156, 160, 176),
    }
}

// ── Color parsing ────────────────────────────────────────────────────────────

/// Parse a hex color string like `"#aabbcc"` into a `ratatui::style::Color`.
/// Returns `None` for malformed input.
pub fn parse_hex_color(hex: &str) -> Option<Color> {
    let hex = hex.strip_prefix('#').unwrap_or(hex);
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(Color::Rgb(r, g, b))
}

/// Overwrite `slot` when `hex` is present and valid.
fn override_color(slot: &mut Color, hex: Option<&str>) {
    if let Some(color) = hex.and_then(parse_hex_color) {
        *slot = color;
    }
}

// ── Theme resolution ─────────────────────────────────────────────────────────

/// Resolve the final `ThemeColors` from config.
///
/// - `"dark"` (default): dark Catppuccin palette
/// - `"light"`: light Catppuccin palette
/// - `"custom"`: dark palette with custom hex values on top
pub fn resolve_theme(config: &ThemeConfig) -> ThemeColors {
    match config.scheme.as_deref().unwrap_or("dark") {
        "light" => light_theme(),
        "custom" => {
            let mut theme = dark_theme();
            if let Some(custom) = &config.custom {
                apply_custom_colors(&mut theme, custom);
            }
            theme
        }
        _ => dark_theme(),
    }
}

fn apply_custom_colors(theme: &mut ThemeColors, custom: &ThemeColorsConfig) {
    let pairs: [(&mut Color, &Option<String>); 13] = [
        (&mut theme.tree_bg, &custom.tree_bg),
        (&mut theme.tree_fg, &custom.tree_fg),
        (&mut theme.tree_selected_bg, &custom.tree_selected_bg),
        (&mut theme.tree_selected_fg, &custom.tree_selected_fg),
        (&mut theme.tree_dir_fg, &custom.tree_dir_fg),
        (&mut theme.tree_file_fg, &custom.tree_file_fg),
        (&mut theme.tree_failed_fg, &custom.tree_failed_fg),
        (&mut theme.preview_bg, &custom.preview_bg),
        (&mut theme.preview_fg, &custom.preview_fg),
        (&mut theme.preview_line_nr_fg, &custom.preview_line_nr_fg),
        (&mut theme.status_bg, &custom.status_bg),
        (&mut theme.status_fg, &custom.status_fg),
        (&mut theme.border_fg, &custom.border_fg),
    ];
    for (slot, hex) in pairs {
        override_color(slot, hex.as_deref());
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
