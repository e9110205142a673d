//! Tags
//!
//! Free-text product tags, kept in the order the catalog lists them.

use smallvec::SmallVec;

/// A deduplicated list of product tags using `SmallVec<[String; 5]>` for the common case.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet {
    tags: SmallVec<[String; 5]>,
}

impl TagSet {
    /// Create a new tag set, dropping exact duplicates while keeping first occurrences in order.
    #[must_use]
    pub fn new(tags: SmallVec<[String; 5]>) -> Self {
        let mut set = Self::default();

        for tag in tags {
            set.add(tag);
        }

        set
    }

    /// Create a new tag set from string slices.
    pub fn from_strs(tags: &[&str]) -> Self {
        tags.iter().map(ToString::to_string).collect()
    }

    /// Add a tag unless the exact same text is already present.
    pub fn add(&mut self, tag: impl Into<String>) {
        let tag = tag.into();

        if !self.contains(&tag) {
            self.tags.push(tag);
        }
    }

    /// Check if the set contains the exact tag text.
    pub fn contains(&self, tag: &str) -> bool {
        self.tags.iter().any(|existing| existing == tag)
    }

    /// Check whether any tag contains `needle` as a substring, ignoring case.
    ///
    /// `needle` must already be lowercase.
    pub fn any_contains_lowercase(&self, needle: &str) -> bool {
        self.tags
            .iter()
            .any(|tag| tag.to_lowercase().contains(needle))
    }

    /// Iterate over the tags in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }

    /// Number of tags.
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Check if there are no tags.
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Copy the tags out as owned strings.
    #[must_use]
    pub fn to_strs(&self) -> SmallVec<[String; 5]> {
        self.tags.clone()
    }
}

impl FromIterator<String> for TagSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let mut set = Self::default();

        for tag in iter {
            set.add(tag);
        }

        set
    }
}

#[cfg(test)]
mod tests {
    use smallvec::smallvec;

    use super::*;

    #[test]
    fn new_keeps_order_and_drops_duplicates() {
        let tags = TagSet::new(smallvec![
            "wallet".to_string(),
            "leather".to_string(),
            "wallet".to_string(),
        ]);

        assert_eq!(tags.iter().collect::<Vec<_>>(), vec!["wallet", "leather"]);
    }

    #[test]
    fn duplicates_are_case_sensitive() {
        let tags = TagSet::from_strs(&["Wallet", "wallet"]);

        assert_eq!(tags.len(), 2);
    }

    #[test]
    fn contains_is_exact() {
        let tags = TagSet::from_strs(&["Hardware"]);

        assert!(tags.contains("Hardware"));
        assert!(!tags.contains("hardware"));
    }

    #[test]
    fn any_contains_lowercase_matches_substrings_ignoring_case() {
        let tags = TagSet::from_strs(&["Security", "Wallet", "2FA"]);

        assert!(tags.any_contains_lowercase("wall"));
        assert!(tags.any_contains_lowercase("2fa"));
        assert!(!tags.any_contains_lowercase("leather"));
    }

    #[test]
    fn empty_set() {
        let tags = TagSet::default();

        assert!(tags.is_empty());
        assert_eq!(tags.len(), 0);
        assert!(!tags.any_contains_lowercase(""));
    }
}
