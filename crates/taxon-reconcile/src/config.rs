//! Engine configuration

use serde::{Deserialize, Serialize};

/// Tunables for one engine instance
///
/// Immutable for the lifetime of a [`crate::Reconciler`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Page size for public channel listing
    pub channel_page_size: usize,
    /// Page size for team member listing
    pub member_page_size: usize,
    /// Sort order of the first declared category
    pub sort_base: i64,
    /// Sort order gap between consecutive categories; must be positive to keep
    /// declared categories strictly ordered
    pub sort_step: i64,
    /// Category names purge never deletes
    pub protected_categories: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            channel_page_size: 100,
            member_page_size: 100,
            sort_base: 10,
            sort_step: 10,
            protected_categories: vec![
                "Favorites".to_string(),
                "Channels".to_string(),
                "Direct Messages".to_string(),
            ],
        }
    }
}

impl EngineConfig {
    /// Set the channel page size
    #[must_use]
    pub fn with_channel_page_size(mut self, size: usize) -> Self {
        self.channel_page_size = size.max(1);
        self
    }

    /// Set the member page size
    #[must_use]
    pub fn with_member_page_size(mut self, size: usize) -> Self {
        self.member_page_size = size.max(1);
        self
    }

    /// Set sort base and step
    #[must_use]
    pub fn with_sort_positions(mut self, base: i64, step: i64) -> Self {
        self.sort_base = base;
        self.sort_step = step;
        self
    }

    /// Replace the protected category names
    #[must_use]
    pub fn with_protected_categories<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.protected_categories = names.into_iter().map(Into::into).collect();
        self
    }

    /// Whether purge must leave this category alone
    #[must_use]
    pub fn is_protected(&self, display_name: &str) -> bool {
        self.protected_categories.iter().any(|p| p == display_name)
    }

    /// Sort order of the category declared at `index`
    #[must_use]
    pub fn sort_order(&self, index: usize) -> i64 {
        let index = i64::try_from(index).unwrap_or(i64::MAX);
        self.sort_base
            .saturating_add(self.sort_step.saturating_mul(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.sort_order(0), 10);
        assert_eq!(config.sort_order(2), 30);
        assert!(config.is_protected("Direct Messages"));
        assert!(!config.is_protected("Racing"));
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{"sort_base": 100}"#).unwrap();
        assert_eq!(config.sort_base, 100);
        assert_eq!(config.sort_step, 10);
        assert_eq!(config.channel_page_size, 100);
    }

    #[test]
    fn page_sizes_never_zero() {
        let config = EngineConfig::default()
            .with_channel_page_size(0)
            .with_member_page_size(0);
        assert_eq!(config.channel_page_size, 1);
        assert_eq!(config.member_page_size, 1);
    }

    proptest! {
        #[test]
        fn sort_orders_strictly_increase(
            base in -1_000i64..1_000,
            step in 1i64..1_000,
            index in 0usize..500,
        ) {
            let config = EngineConfig::default().with_sort_positions(base, step);
            prop_assert!(config.sort_order(index) < config.sort_order(index + 1));
            prop_assert_eq!(config.sort_order(index), base + step * index as i64);
        }
    }
}
