//! Declared taxonomy
//!
//! The taxonomy is the desired state every member's sidebar converges to:
//! an ordered list of categories, each holding an ordered list of channel
//! display names. It is validated once on construction and treated as
//! immutable afterwards.

use crate::error::TaxonomyError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One declared sidebar category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Display name, matched exactly against remote categories
    pub name: String,
    /// Channel display names in their declared order
    pub channels: Vec<String>,
}

impl Category {
    /// Create a category from a name and its channels
    #[must_use]
    pub fn new<I, S>(name: impl Into<String>, channels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            channels: channels.into_iter().map(Into::into).collect(),
        }
    }

    /// Check whether a channel is declared in this category
    #[inline]
    #[must_use]
    pub fn contains(&self, channel: &str) -> bool {
        self.channels.iter().any(|c| c == channel)
    }
}

/// Ordered set of declared categories
///
/// Invariants:
/// - category names are unique and non-empty
/// - channel names are unique within a category
///
/// A channel may appear in several categories; the engine does not
/// deduplicate across categories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Category>", into = "Vec<Category>")]
pub struct Taxonomy {
    categories: Vec<Category>,
}

impl Taxonomy {
    /// Build a taxonomy, validating its invariants
    ///
    /// # Errors
    /// - `TaxonomyError::EmptyCategoryName` for a blank category name
    /// - `TaxonomyError::DuplicateCategory` when a name repeats
    /// - `TaxonomyError::DuplicateChannel` when a channel repeats inside one category
    pub fn new(categories: Vec<Category>) -> Result<Self, TaxonomyError> {
        let mut seen = HashSet::new();

        for category in &categories {
            if category.name.trim().is_empty() {
                return Err(TaxonomyError::EmptyCategoryName);
            }
            if !seen.insert(category.name.as_str()) {
                return Err(TaxonomyError::DuplicateCategory(category.name.clone()));
            }

            let mut channels = HashSet::new();
            for channel in &category.channels {
                if !channels.insert(channel.as_str()) {
                    return Err(TaxonomyError::DuplicateChannel {
                        category: category.name.clone(),
                        channel: channel.clone(),
                    });
                }
            }
        }

        Ok(Self { categories })
    }

    /// Build a taxonomy from a category map plus an explicit display order
    ///
    /// This is the shape configuration files use: channel lists keyed by
    /// category name, and a separate list fixing the category order.
    ///
    /// # Errors
    /// Every error of [`Taxonomy::new`], plus `UndeclaredInOrder` and
    /// `MissingFromOrder` when the order list and the map disagree.
    pub fn from_parts(
        order: &[String],
        channels: &IndexMap<String, Vec<String>>,
    ) -> Result<Self, TaxonomyError> {
        if let Some(missing) = channels.keys().find(|name| !order.contains(name)) {
            return Err(TaxonomyError::MissingFromOrder(missing.clone()));
        }

        let categories = order
            .iter()
            .map(|name| {
                channels
                    .get(name)
                    .map(|list| Category::new(name.clone(), list.iter().cloned()))
                    .ok_or_else(|| TaxonomyError::UndeclaredInOrder(name.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(categories)
    }

    /// Categories in declared order
    #[inline]
    #[must_use]
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Look up a declared category by name
    #[must_use]
    pub fn category(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.name == name)
    }

    /// Category names in declared order
    pub fn category_names(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|c| c.name.as_str())
    }

    /// Every declared channel, category by category
    ///
    /// A channel declared in two categories is yielded twice.
    pub fn channel_names(&self) -> impl Iterator<Item = &str> {
        self.categories
            .iter()
            .flat_map(|c| c.channels.iter().map(String::as_str))
    }

    /// The first category declaring a channel
    #[must_use]
    pub fn expected_category(&self, channel: &str) -> Option<&str> {
        self.categories
            .iter()
            .find(|c| c.contains(channel))
            .map(|c| c.name.as_str())
    }

    /// Number of declared categories
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// Whether no category is declared
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

impl TryFrom<Vec<Category>> for Taxonomy {
    type Error = TaxonomyError;

    fn try_from(categories: Vec<Category>) -> Result<Self, Self::Error> {
        Self::new(categories)
    }
}

impl From<Taxonomy> for Vec<Category> {
    fn from(taxonomy: Taxonomy) -> Self {
        taxonomy.categories
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sailing() -> Taxonomy {
        Taxonomy::new(vec![
            Category::new("Club Life", ["Town Square", "Club News"]),
            Category::new("Racing", ["Monday Races", "Kaag Cup"]),
            Category::new("Cruising", ["Cruising"]),
        ])
        .unwrap()
    }

    #[test]
    fn keeps_declared_order() {
        let taxonomy = sailing();
        let names: Vec<_> = taxonomy.category_names().collect();
        assert_eq!(names, vec!["Club Life", "Racing", "Cruising"]);

        let channels: Vec<_> = taxonomy.channel_names().collect();
        assert_eq!(
            channels,
            vec!["Town Square", "Club News", "Monday Races", "Kaag Cup", "Cruising"]
        );
    }

    #[test]
    fn rejects_duplicate_category() {
        let result = Taxonomy::new(vec![
            Category::new("Racing", ["Kaag Cup"]),
            Category::new("Racing", ["ESA Cup"]),
        ]);
        assert_eq!(result, Err(TaxonomyError::DuplicateCategory("Racing".into())));
    }

    #[test]
    fn rejects_duplicate_channel_in_category() {
        let result = Taxonomy::new(vec![Category::new("Fleet", ["Laser", "Laser"])]);
        assert!(matches!(
            result,
            Err(TaxonomyError::DuplicateChannel { ref channel, .. }) if channel == "Laser"
        ));
    }

    #[test]
    fn allows_channel_in_two_categories() {
        let taxonomy = Taxonomy::new(vec![
            Category::new("Racing", ["Booking"]),
            Category::new("Fleet", ["Booking"]),
        ])
        .unwrap();

        assert_eq!(taxonomy.channel_names().count(), 2);
        assert_eq!(taxonomy.expected_category("Booking"), Some("Racing"));
    }

    #[test]
    fn rejects_blank_name() {
        let result = Taxonomy::new(vec![Category::new("  ", ["x"])]);
        assert_eq!(result, Err(TaxonomyError::EmptyCategoryName));
    }

    #[test]
    fn from_parts_follows_order_list() {
        let mut map = IndexMap::new();
        map.insert("Racing".to_string(), vec!["Kaag Cup".to_string()]);
        map.insert("Club Life".to_string(), vec!["Town Square".to_string()]);

        let order = vec!["Club Life".to_string(), "Racing".to_string()];
        let taxonomy = Taxonomy::from_parts(&order, &map).unwrap();

        let names: Vec<_> = taxonomy.category_names().collect();
        assert_eq!(names, vec!["Club Life", "Racing"]);
    }

    #[test]
    fn from_parts_detects_mismatch() {
        let mut map = IndexMap::new();
        map.insert("Racing".to_string(), vec![]);

        let order = vec!["Racing".to_string(), "Fleet".to_string()];
        assert_eq!(
            Taxonomy::from_parts(&order, &map),
            Err(TaxonomyError::UndeclaredInOrder("Fleet".into()))
        );

        let order: Vec<String> = Vec::new();
        assert_eq!(
            Taxonomy::from_parts(&order, &map),
            Err(TaxonomyError::MissingFromOrder("Racing".into()))
        );
    }

    #[test]
    fn deserialization_validates() {
        let json = r#"[{"name":"A","channels":["x"]},{"name":"A","channels":[]}]"#;
        let result: Result<Taxonomy, _> = serde_json::from_str(json);
        assert!(result.is_err());

        let json = r#"[{"name":"A","channels":["x","y"]}]"#;
        let taxonomy: Taxonomy = serde_json::from_str(json).unwrap();
        assert_eq!(taxonomy.category("A").unwrap().channels, vec!["x", "y"]);
    }
}
