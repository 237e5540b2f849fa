//! Catalog query parameter types.

use super::types::ItemKind;

/// Fields requested on every item lookup so guide metadata is complete.
pub(crate) const ITEM_FIELDS: &str = "Overview,Genres,ProviderIds,PremiereDate,ProductionYear,OfficialRating,CommunityRating,Width,Height,Video3DFormat";

/// Filter criteria for `find_items`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogQuery {
    /// User whose library view (and favorites) is queried.
    pub user_id: String,
    /// Item type filter (empty = all types).
    pub include_item_types: Vec<ItemKind>,
    /// Restrict to the user's favorites.
    pub is_favorite: bool,
    /// Search folders recursively.
    pub recursive: bool,
}

impl CatalogQuery {
    /// Creates a recursive favorites query for the given user.
    #[must_use]
    pub fn favorites(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            include_item_types: Vec::new(),
            is_favorite: true,
            recursive: true,
        }
    }

    /// Restricts the query to the given item types.
    #[must_use]
    pub fn with_item_types(mut self, kinds: &[ItemKind]) -> Self {
        self.include_item_types = kinds.to_vec();
        self
    }

    /// Builds the query-string pairs for the `Users/{id}/Items` endpoint.
    pub(crate) fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut query: Vec<(&'static str, String)> = vec![
            ("Recursive", self.recursive.to_string()),
            ("Fields", String::from(ITEM_FIELDS)),
        ];
        if self.is_favorite {
            query.push(("IsFavorite", String::from("true")));
        }
        if !self.include_item_types.is_empty() {
            let types = self
                .include_item_types
                .iter()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(",");
            query.push(("IncludeItemTypes", types));
        }
        query
    }
}
