//! Well-known directories that can be jumped to directly.

use std::path::PathBuf;

use crate::fs::hydrate::ROOT_SENTINEL;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Place {
    Root,
    Home,
    Downloads,
    Documents,
    Desktop,
    Pictures,
    Music,
    Videos,
}

impl Place {
    /// Places bound to the number keys, in key order.
    pub const NUMBERED: [Place; 7] = [
        Place::Home,
        Place::Downloads,
        Place::Documents,
        Place::Desktop,
        Place::Pictures,
        Place::Music,
        Place::Videos,
    ];

    /// Place bound to a key: `/` for the root, `1`-`7` for the rest.
    pub fn from_key(c: char) -> Option<Self> {
        if c == '/' {
            return Some(Place::Root);
        }
        let n = c.to_digit(10)? as usize;
        n.checked_sub(1)
            .and_then(|i| Self::NUMBERED.get(i))
            .copied()
    }

    pub fn label(&self) -> &'static str {
        match self {
            Place::Root => "Root",
            Place::Home => "Home",
            Place::Downloads => "Downloads",
            Place::Documents => "Documents",
            Place::Desktop => "Desktop",
            Place::Pictures => "Pictures",
            Place::Music => "Music",
            Place::Videos => "Videos",
        }
    }

    /// Path to hydrate, or `None` when the platform has no such directory.
    pub fn resolve(&self) -> Option<String> {
        let dir: Option<PathBuf> = match self {
            Place::Root => return Some(ROOT_SENTINEL.to_string()),
            Place::Home => dirs::home_dir(),
            Place::Downloads => dirs::download_dir(),
            Place::Documents => dirs::document_dir(),
            Place::Desktop => dirs::desktop_dir(),
            Place::Pictures => dirs::picture_dir(),
            Place::Music => dirs::audio_dir(),
            Place::Videos => dirs::video_dir(),
        };
        dir.map(|p| p.to_string_lossy().into_owned())
    }
}
