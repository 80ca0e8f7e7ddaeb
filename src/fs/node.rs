//! Tree entities: node handles, the tri-state children variant, and the
//! path separator every join/split goes through.

use crate::fs::provider::ListingEntry;

/// Path separator used for every join and split in the tree engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Separator(char);

impl Default for Separator {
    fn default() -> Self {
        Self(std::path::MAIN_SEPARATOR)
    }
}

impl Separator {
    pub const fn new(sep: char) -> Self {
        Self(sep)
    }

    pub fn as_char(self) -> char {
        self.0
    }

    /// Parse a separator from config (`"/"`, `"\\"`). Anything that is not a
    /// single character is rejected.
    pub fn parse(s: &str) -> Option<Self> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Some(Self(c)),
            _ => None,
        }
    }

    /// Copy of `name` with every separator character removed.
    pub fn strip(self, name: &str) -> String {
        name.chars().filter(|&c| c != self.0).collect()
    }

    /// Join a child name onto a parent path. Trailing separators on the
    /// parent are dropped first, so `C:\` + `Users` gives `C:\Users`.
    pub fn join(self, parent: &str, name: &str) -> String {
        let base = parent.trim_end_matches(self.0);
        let mut joined = String::with_capacity(base.len() + name.len() + 1);
        joined.push_str(base);
        joined.push(self.0);
        joined.push_str(name);
        joined
    }

    /// Whether `path` lies strictly below `ancestor`.
    pub fn is_under(self, path: &str, ancestor: &str) -> bool {
        let base = ancestor.trim_end_matches(self.0);
        path.strip_prefix(base)
            .and_then(|rest| rest.strip_prefix(self.0))
            .is_some_and(|rest| !rest.is_empty())
    }

    /// Non-empty path segments.
    pub fn segments(self, path: &str) -> Vec<&str> {
        path.split(self.0).filter(|s| !s.is_empty()).collect()
    }
}

/// Handle to a node in the arena.
///
/// Equality is instance identity: a node released and re-created for the
/// same path gets a different handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    pub(crate) slot: usize,
    pub(crate) generation: u64,
}

/// Load state of a node's children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Children {
    /// Collapsed or never fetched.
    NotLoaded,
    /// Fetched; may be empty.
    Loaded(Vec<NodeId>),
    /// The last fetch failed. Behaves like `NotLoaded` for navigation.
    Failed(String),
}

impl Children {
    pub fn is_loaded(&self) -> bool {
        matches!(self, Children::Loaded(_))
    }

    /// Child handles when loaded, `None` otherwise.
    pub fn loaded(&self) -> Option<&[NodeId]> {
        match self {
            Children::Loaded(ids) => Some(ids),
            _ => None,
        }
    }
}

/// Optional metadata; `None` means "not yet known".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeMeta {
    pub extension: Option<String>,
    pub mime_type: Option<String>,
    pub size_bytes: Option<u64>,
    pub modified_secs: Option<i64>,
}

/// One filesystem entry: volume, directory, or file.
#[derive(Debug, Clone)]
pub struct Node {
    /// Display segment, separator characters removed.
    pub name: String,
    /// Absolute path, unique among live nodes.
    pub full_path: String,
    /// `None` when the provider did not say; treated as a file.
    pub is_directory: Option<bool>,
    pub meta: NodeMeta,
    pub children: Children,
    /// Non-owning link used only for upward traversal.
    pub(crate) parent: Option<NodeId>,
}

impl Node {
    /// Root node for a mounted volume such as `C:\` or `/home`.
    pub fn from_volume(path: &str, sep: Separator) -> Self {
        Self {
            name: sep.strip(path),
            full_path: path.to_string(),
            is_directory: Some(true),
            meta: NodeMeta::default(),
            children: Children::NotLoaded,
            parent: None,
        }
    }

    /// Child node for one entry of `parent`'s listing.
    pub fn from_listing_entry(
        entry: &ListingEntry,
        parent: &Node,
        parent_id: NodeId,
        sep: Separator,
    ) -> Self {
        Self {
            name: sep.strip(&entry.name),
            full_path: sep.join(&parent.full_path, &entry.name),
            is_directory: entry.is_directory,
            meta: NodeMeta {
                extension: entry.extension.clone(),
                mime_type: entry.mime_type.clone(),
                size_bytes: entry.size_bytes,
                modified_secs: entry.modified_secs,
            },
            children: Children::NotLoaded,
            parent: Some(parent_id),
        }
    }

    pub fn is_dir(&self) -> bool {
        self.is_directory == Some(true)
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WIN: Separator = Separator::new('\\');
    const UNIX: Separator = Separator::new('/');

    fn handle() -> NodeId {
        NodeId {
            slot: 0,
            generation: 1,
        }
    }

    #[test]
    fn is_under_respects_segment_boundaries() {
        assert!(WIN.is_under("C:\\Users", "C:\\"));
        assert!(WIN.is_under("C:\\Users\\me", "C:\\Users"));
        assert!(!WIN.is_under("C:\\Users", "C:\\Users"));
        assert!(!WIN.is_under("C:\\Usersx", "C:\\Users"));
        assert!(!WIN.is_under("D:\\Users", "C:\\"));
        assert!(UNIX.is_under("/home", "/"));
    }

    #[test]
    fn join_trims_trailing_separator_of_volume_root() {
        assert_eq!(WIN.join("C:\\", "Users"), "C:\\Users");
        assert_eq!(WIN.join("C:\\Users", "me"), "C:\\Users\\me");
        assert_eq!(UNIX.join("/", "etc"), "/etc");
        assert_eq!(UNIX.join("/home", "me"), "/home/me");
    }

    #[test]
    fn segments_drop_empty_parts() {
        assert_eq!(WIN.segments("C:\\Users\\\\me\\"), vec!["C:", "Users", "me"]);
        assert_eq!(UNIX.segments("/"), Vec::<&str>::new());
        assert_eq!(UNIX.segments("/home/me"), vec!["home", "me"]);
    }

    #[test]
    fn parse_accepts_single_char_only() {
        assert_eq!(Separator::parse("\\"), Some(WIN));
        assert_eq!(Separator::parse("/"), Some(UNIX));
        assert_eq!(Separator::parse(""), None);
        assert_eq!(Separator::parse("//"), None);
    }

    #[test]
    fn volume_name_is_stripped() {
        let node = Node::from_volume("C:\\", WIN);
        assert_eq!(node.name, "C:");
        assert_eq!(node.full_path, "C:\\");
        assert!(node.is_dir());
        assert_eq!(node.children, Children::NotLoaded);
    }

    #[test]
    fn listing_entry_copies_only_present_metadata() {
        let parent = Node::from_volume("C:\\", WIN);
        let entry = ListingEntry {
            name: "report.pdf".into(),
            is_directory: Some(false),
            extension: Some("pdf".into()),
            mime_type: None,
            size_bytes: Some(0),
            modified_secs: None,
        };
        let node = Node::from_listing_entry(&entry, &parent, handle(), WIN);
        assert_eq!(node.full_path, "C:\\report.pdf");
        assert_eq!(node.meta.extension.as_deref(), Some("pdf"));
        assert_eq!(node.meta.size_bytes, Some(0));
        assert!(node.meta.mime_type.is_none());
        assert!(node.meta.modified_secs.is_none());
        assert_eq!(node.parent(), Some(handle()));
    }

    #[test]
    fn unknown_directory_flag_counts_as_file() {
        let parent = Node::from_volume("/srv", UNIX);
        let entry = ListingEntry::named("mystery");
        let node = Node::from_listing_entry(&entry, &parent, handle(), UNIX);
        assert_eq!(node.is_directory, None);
        assert!(!node.is_dir());
    }

    #[test]
    fn children_states_are_distinct() {
        assert!(!Children::NotLoaded.is_loaded());
        assert!(Children::Loaded(vec![]).is_loaded());
        assert_eq!(Children::Loaded(vec![]).loaded(), Some(&[][..]));
        assert_eq!(Children::Failed("denied".into()).loaded(), None);
    }
}
