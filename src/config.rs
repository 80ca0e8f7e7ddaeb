//! Application configuration: TOML file loading, CLI overrides, and defaults.
//!
//! Resolution order (first found wins, values merge/override):
//! 1. CLI flags (`PATH`, `--sort`, `--desc`, `--no-mouse`)
//! 2. `--config <FILE>`
//! 3. `$TNAV_CONFIG` environment variable (path to config file)
//! 4. Project-local `.tnav.toml` in the current working directory
//! 5. Global `<config_dir>/tnav/config.toml`
//! 6. Built-in defaults

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{FixedOffset, Local, Offset};
use serde::Deserialize;

use crate::format::parse_utc_offset;
use crate::fs::node::Separator;
use crate::fs::order::{Direction, OrderSpec, SortKey};
use crate::scroll::{DEFAULT_ROW_HEIGHT, DEFAULT_SETTLE_RETRY};

// ── Section configs ──────────────────────────────────────────────────────────

/// General application settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct GeneralConfig {
    /// Path hydrated at launch (overridden by CLI positional arg).
    pub startup_path: Option<String>,
    /// Enable mouse support.
    pub mouse: Option<bool>,
}

/// Tree panel settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TreeConfig {
    /// Sort key: "name", "extension", "size", "modified".
    pub sort_by: Option<String>,
    /// "asc" or "desc".
    pub sort_direction: Option<String>,
    /// Path separator used to split and join paths.
    pub separator: Option<String>,
    /// Use nerd font icons (false = ASCII fallback).
    pub use_icons: Option<bool>,
}

/// Scroll synchronization settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ScrollConfig {
    /// Height of one tree row in terminal lines.
    pub row_height: Option<u16>,
    /// Delay before the single scroll retry, in milliseconds.
    pub settle_retry_ms: Option<u64>,
}

/// Display formatting settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct DisplayConfig {
    /// "local", "utc", or a fixed offset like "+09:00".
    pub utc_offset: Option<String>,
}

/// Color settings for a single theme palette.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ThemeColorsConfig {
    pub tree_bg: Option<String>,
    pub tree_fg: Option<String>,
    pub tree_selected_bg: Option<String>,
    pub tree_selected_fg: Option<String>,
    pub tree_dir_fg: Option<String>,
    pub tree_file_fg: Option<String>,
    pub tree_failed_fg: Option<String>,
    pub preview_bg: Option<String>,
    pub preview_fg: Option<String>,
    pub preview_line_nr_fg: Option<String>,
    pub status_bg: Option<String>,
    pub status_fg: Option<String>,
    pub border_fg: Option<String>,
}

/// Theme configuration section.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ThemeConfig {
    /// Color scheme: "dark", "light", "custom".
    pub scheme: Option<String>,
    /// Custom color overrides.
    pub custom: Option<ThemeColorsConfig>,
}

// ── Top-level config ─────────────────────────────────────────────────────────

/// Top-level application configuration.
///
/// All fields are optional so that partial configs from different sources
/// can be merged together (CLI overrides file, file overrides defaults).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub tree: TreeConfig,
    pub scroll: ScrollConfig,
    pub display: DisplayConfig,
    pub theme: ThemeConfig,
}

// ── Config file locator ──────────────────────────────────────────────────────

/// Candidate config file paths in priority order, highest first.
///
/// Does NOT include the CLI `--config` path.
fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(env_path) = std::env::var("TNAV_CONFIG") {
        paths.push(PathBuf::from(env_path));
    }

    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join(".tnav.toml"));
    }

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("tnav").join("config.toml"));
    }

    paths
}

/// Read and parse a TOML config file. Returns `None` if the file doesn't
/// exist or can't be parsed (logged as a warning).
fn load_file(path: &Path) -> Option<AppConfig> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str::<AppConfig>(&content) {
        Ok(cfg) => {
            tracing::info!("loaded config from {}", path.display());
            Some(cfg)
        }
        Err(e) => {
            tracing::warn!("failed to parse config file {}: {}", path.display(), e);
            None
        }
    }
}

// ── Merge logic ──────────────────────────────────────────────────────────────

impl AppConfig {
    /// Merge `other` on top of `self`; `other`'s `Some` values win.
    pub fn merge(self, other: &AppConfig) -> AppConfig {
        AppConfig {
            general: GeneralConfig {
                startup_path: other
                    .general
                    .startup_path
                    .clone()
                    .or(self.general.startup_path),
                mouse: other.general.mouse.or(self.general.mouse),
            },
            tree: TreeConfig {
                sort_by: other.tree.sort_by.clone().or(self.tree.sort_by),
                sort_direction: other
                    .tree
                    .sort_direction
                    .clone()
                    .or(self.tree.sort_direction),
                separator: other.tree.separator.clone().or(self.tree.separator),
                use_icons: other.tree.use_icons.or(self.tree.use_icons),
            },
            scroll: ScrollConfig {
                row_height: other.scroll.row_height.or(self.scroll.row_height),
                settle_retry_ms: other.scroll.settle_retry_ms.or(self.scroll.settle_retry_ms),
            },
            display: DisplayConfig {
                utc_offset: other
                    .display
                    .utc_offset
                    .clone()
                    .or(self.display.utc_offset),
            },
            theme: ThemeConfig {
                scheme: other.theme.scheme.clone().or(self.theme.scheme),
                custom: other.theme.custom.clone().or(self.theme.custom),
            },
        }
    }

    /// Load the final merged configuration.
    ///
    /// `cli_config_path` is an explicit config file path from `--config`.
    /// `cli_overrides` are partial overrides derived from CLI flags.
    pub fn load(cli_config_path: Option<&Path>, cli_overrides: Option<&AppConfig>) -> AppConfig {
        let mut config = AppConfig::default();

        // Lowest priority first so higher ones overwrite.
        for path in candidate_paths().iter().rev() {
            if let Some(file_cfg) = load_file(path) {
                config = config.merge(&file_cfg);
            }
        }

        if let Some(cli_path) = cli_config_path {
            match load_file(cli_path) {
                Some(file_cfg) => config = config.merge(&file_cfg),
                None => tracing::warn!("config file {} not loaded", cli_path.display()),
            }
        }

        if let Some(overrides) = cli_overrides {
            config = config.merge(overrides);
        }

        config
    }

    // ── Convenience getters with built-in defaults ──────────────────────────

    /// Whether mouse support is enabled.
    pub fn mouse_enabled(&self) -> bool {
        self.general.mouse.unwrap_or(true)
    }

    pub fn startup_path(&self) -> Option<&str> {
        self.general.startup_path.as_deref()
    }

    pub fn sort_key(&self) -> SortKey {
        self.tree
            .sort_by
            .as_deref()
            .map_or(SortKey::Name, SortKey::from_config)
    }

    pub fn sort_direction(&self) -> Direction {
        self.tree
            .sort_direction
            .as_deref()
            .map_or(Direction::Asc, Direction::from_config)
    }

    /// Initial ordering for listings.
    pub fn order(&self) -> OrderSpec {
        OrderSpec::new(self.sort_key(), self.sort_direction())
    }

    /// Configured separator, or the platform one when unset or invalid.
    pub fn separator(&self) -> Separator {
        match self.tree.separator.as_deref() {
            None => Separator::default(),
            Some(s) => Separator::parse(s).unwrap_or_else(|| {
                tracing::warn!("ignoring invalid separator {:?}", s);
                Separator::default()
            }),
        }
    }

    /// Whether to use nerd font icons.
    pub fn use_icons(&self) -> bool {
        self.tree.use_icons.unwrap_or(true)
    }

    pub fn row_height(&self) -> u16 {
        self.scroll.row_height.unwrap_or(DEFAULT_ROW_HEIGHT).max(1)
    }

    pub fn settle_retry(&self) -> Duration {
        self.scroll
            .settle_retry_ms
            .map_or(DEFAULT_SETTLE_RETRY, Duration::from_millis)
    }

    /// Offset used to display modification times.
    pub fn utc_offset(&self) -> FixedOffset {
        let raw = self.display.utc_offset.as_deref().unwrap_or("local");
        parse_utc_offset(raw).unwrap_or_else(|| {
            tracing::warn!("ignoring invalid utc_offset {:?}", raw);
            Local::now().offset().fix()
        })
    }

    /// Theme scheme: "dark", "light", or "custom".
    pub fn theme_scheme(&self) -> &str {
        self.theme.scheme.as_deref().unwrap_or("dark")
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
