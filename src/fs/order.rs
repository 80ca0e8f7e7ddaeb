//! Ordering policy: turns a user sort choice into the term list sent to the
//! provider. The client never sorts a listing itself.

/// Sort key selectable by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortKey {
    Name,
    Extension,
    Size,
    ModifiedTime,
}

impl SortKey {
    /// Parse from config string; unknown values fall back to `Name`.
    pub fn from_config(s: &str) -> Self {
        match s {
            "extension" | "ext" => SortKey::Extension,
            "size" => SortKey::Size,
            "modified" | "time" => SortKey::ModifiedTime,
            _ => SortKey::Name,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SortKey::Name => "Name",
            SortKey::Extension => "Ext",
            SortKey::Size => "Size",
            SortKey::ModifiedTime => "Modified",
        }
    }

    /// Cycle to the next sort key.
    pub fn next(&self) -> Self {
        match self {
            SortKey::Name => SortKey::Extension,
            SortKey::Extension => SortKey::Size,
            SortKey::Size => SortKey::ModifiedTime,
            SortKey::ModifiedTime => SortKey::Name,
        }
    }

    fn term_key(self) -> OrderKey {
        match self {
            SortKey::Name => OrderKey::Name,
            SortKey::Extension => OrderKey::Extension,
            SortKey::Size => OrderKey::Size,
            SortKey::ModifiedTime => OrderKey::ModifiedTime,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn from_config(s: &str) -> Self {
        match s {
            "desc" | "descending" => Direction::Desc,
            _ => Direction::Asc,
        }
    }

    pub fn reversed(&self) -> Self {
        match self {
            Direction::Asc => Direction::Desc,
            Direction::Desc => Direction::Asc,
        }
    }

    pub fn arrow(&self) -> &'static str {
        match self {
            Direction::Asc => "↑",
            Direction::Desc => "↓",
        }
    }
}

/// Key of one ordering term as understood by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderKey {
    IsDirectory,
    Name,
    Extension,
    MimeType,
    Size,
    ModifiedTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OrderTerm {
    pub key: OrderKey,
    pub direction: Direction,
}

impl OrderTerm {
    pub const fn new(key: OrderKey, direction: Direction) -> Self {
        Self { key, direction }
    }
}

/// Ordered term list requested from the provider.
///
/// Always starts with the directory flag and always ends with `Name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrderSpec {
    sort_key: SortKey,
    direction: Direction,
    terms: Vec<OrderTerm>,
}

impl Default for OrderSpec {
    fn default() -> Self {
        Self::new(SortKey::Name, Direction::Asc)
    }
}

impl OrderSpec {
    pub fn new(sort_key: SortKey, direction: Direction) -> Self {
        let mut terms = vec![OrderTerm::new(OrderKey::IsDirectory, direction)];
        if sort_key != SortKey::Name {
            terms.push(OrderTerm::new(sort_key.term_key(), direction));
        }
        terms.push(OrderTerm::new(OrderKey::Name, direction));
        Self {
            sort_key,
            direction,
            terms,
        }
    }

    pub fn terms(&self) -> &[OrderTerm] {
        &self.terms
    }

    pub fn sort_key(&self) -> SortKey {
        self.sort_key
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Short label for the status bar, e.g. `Size ↓`.
    pub fn label(&self) -> String {
        format!("{} {}", self.sort_key.label(), self.direction.arrow())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_KEYS: [SortKey; 4] = [
        SortKey::Name,
        SortKey::Extension,
        SortKey::Size,
        SortKey::ModifiedTime,
    ];

    #[test]
    fn name_order_has_two_terms() {
        let spec = OrderSpec::new(SortKey::Name, Direction::Asc);
        assert_eq!(
            spec.terms(),
            &[
                OrderTerm::new(OrderKey::IsDirectory, Direction::Asc),
                OrderTerm::new(OrderKey::Name, Direction::Asc),
            ]
        );
    }

    #[test]
    fn size_desc_matches_provider_request() {
        let spec = OrderSpec::new(SortKey::Size, Direction::Desc);
        assert_eq!(
            spec.terms(),
            &[
                OrderTerm::new(OrderKey::IsDirectory, Direction::Desc),
                OrderTerm::new(OrderKey::Size, Direction::Desc),
                OrderTerm::new(OrderKey::Name, Direction::Desc),
            ]
        );
    }

    #[test]
    fn name_is_always_last_and_unique() {
        for key in ALL_KEYS {
            for direction in [Direction::Asc, Direction::Desc] {
                let spec = OrderSpec::new(key, direction);
                let terms = spec.terms();
                assert_eq!(terms.first().map(|t| t.key), Some(OrderKey::IsDirectory));
                assert_eq!(terms.last().map(|t| t.key), Some(OrderKey::Name));
                assert_eq!(terms.iter().filter(|t| t.key == OrderKey::Name).count(), 1);
                assert!(terms.iter().all(|t| t.direction == direction));
            }
        }
    }

    #[test]
    fn cycle_visits_every_key() {
        let mut key = SortKey::Name;
        for expected in [
            SortKey::Extension,
            SortKey::Size,
            SortKey::ModifiedTime,
            SortKey::Name,
        ] {
            key = key.next();
            assert_eq!(key, expected);
        }
    }

    #[test]
    fn config_strings_parse() {
        assert_eq!(SortKey::from_config("size"), SortKey::Size);
        assert_eq!(SortKey::from_config("modified"), SortKey::ModifiedTime);
        assert_eq!(SortKey::from_config("ext"), SortKey::Extension);
        assert_eq!(SortKey::from_config("bogus"), SortKey::Name);
        assert_eq!(Direction::from_config("desc"), Direction::Desc);
        assert_eq!(Direction::from_config("up"), Direction::Asc);
    }

    #[test]
    fn label_shows_key_and_arrow() {
        assert_eq!(OrderSpec::new(SortKey::Size, Direction::Desc).label(), "Size ↓");
        assert_eq!(OrderSpec::default().label(), "Name ↑");
    }
}
