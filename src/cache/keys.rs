//! Query keys.
//!
//! A cached result is identified either by a list query (page + search term) or by
//! a recipe id.

use std::fmt;

/// Key of a paginated, optionally filtered recipe list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListKey {
    page_index: u32,
    search: String,
}

impl ListKey {
    /// Build a key; the search term is trimmed and an empty term means "no filter".
    pub fn new(page_index: u32, search: impl AsRef<str>) -> Self {
        Self {
            page_index,
            search: search.as_ref().trim().to_string(),
        }
    }

    /// First page, unfiltered.
    pub fn first_page() -> Self {
        Self::new(0, "")
    }

    /// Key for a 1-based page number as shown to users.
    pub fn from_page_number(page: u32, search: impl AsRef<str>) -> Self {
        Self::new(page.saturating_sub(1), search)
    }

    pub fn page_index(&self) -> u32 {
        self.page_index
    }

    pub fn search(&self) -> Option<&str> {
        (!self.search.is_empty()).then_some(self.search.as_str())
    }

    /// Query parameters for `GET /recipes`.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("pageIndex", self.page_index.to_string())];
        if let Some(search) = self.search() {
            pairs.push(("recipeName", search.to_string()));
        }
        pairs
    }
}

impl fmt::Display for ListKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.search() {
            Some(search) => write!(f, "recipes[page={}, search={search:?}]", self.page_index),
            None => write!(f, "recipes[page={}]", self.page_index),
        }
    }
}

/// Either key shape, for callers that enumerate resident entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    List(ListKey),
    Detail(String),
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::List(key) => key.fmt(f),
            Self::Detail(id) => write!(f, "recipe[{id}]"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_is_trimmed_and_empty_means_unfiltered() {
        assert_eq!(ListKey::new(0, "  "), ListKey::first_page());
        assert_eq!(ListKey::new(2, " bolo ").search(), Some("bolo"));
        assert_eq!(ListKey::new(2, "").search(), None);
    }

    #[test]
    fn page_numbers_are_one_based() {
        assert_eq!(ListKey::from_page_number(1, "").page_index(), 0);
        assert_eq!(ListKey::from_page_number(3, "").page_index(), 2);
        assert_eq!(ListKey::from_page_number(0, "").page_index(), 0);
    }

    #[test]
    fn query_pairs_omit_empty_search() {
        assert_eq!(
            ListKey::new(1, "").query_pairs(),
            vec![("pageIndex", "1".to_string())]
        );
        assert_eq!(
            ListKey::new(0, "pão").query_pairs(),
            vec![
                ("pageIndex", "0".to_string()),
                ("recipeName", "pão".to_string())
            ]
        );
    }

    #[test]
    fn keys_render_for_display() {
        assert_eq!(
            QueryKey::List(ListKey::new(1, "bolo")).to_string(),
            "recipes[page=1, search=\"bolo\"]"
        );
        assert_eq!(QueryKey::Detail("r1".into()).to_string(), "recipe[r1]");
    }
}
