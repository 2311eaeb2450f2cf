//! Testing utilities for the Taxon workspace
//!
//! Shared fixtures and an in-memory platform implementing `RemotePort`.

#![allow(missing_docs)]

pub mod fake;

pub use fake::{Call, FakePlatform, Fault};

use std::sync::Arc;
use taxon_model::{Category, Taxonomy};

/// Team id every fixture platform uses
pub const TEAM: &str = "team-1";

/// Single category: `Racing` with two channels
pub fn racing_taxonomy() -> Taxonomy {
    Taxonomy::new(vec![Category::new("Racing", ["Monday Races", "Kaag Cup"])]).unwrap()
}

/// Three categories, small enough to reason about in assertions
pub fn three_category_taxonomy() -> Taxonomy {
    Taxonomy::new(vec![
        Category::new("Club Life", ["Town Square", "Club News"]),
        Category::new("Racing", ["Monday Races", "Kaag Cup"]),
        Category::new("Fleet", ["Laser", "Wayfarer"]),
    ])
    .unwrap()
}

/// Full sailing club layout
pub fn sailing_club_taxonomy() -> Taxonomy {
    Taxonomy::new(vec![
        Category::new(
            "Club Life",
            [
                "Town Square",
                "Club News",
                "Club House",
                "Crew Finder",
                "Market Place",
                "Car Pool",
                "Off-Topic",
            ],
        ),
        Category::new(
            "Racing",
            [
                "Monday Races",
                "Seven Bars",
                "Kaag Cup",
                "ESA Cup",
                "Arianes Cup",
                "Other Races",
            ],
        ),
        Category::new("Cruising", ["Cruising"]),
        Category::new(
            "Fleet",
            [
                "Wayfarer",
                "Randmeer",
                "Venture",
                "Laser",
                "Buzz",
                "Fox",
                "Safety Boat",
                "Booking",
            ],
        ),
        Category::new("Training", ["Sign Up"]),
    ])
    .unwrap()
}

/// Platform with every channel of `taxonomy` already created
pub fn seeded_platform(taxonomy: &Taxonomy) -> Arc<FakePlatform> {
    let platform = FakePlatform::new(TEAM);
    for channel in taxonomy.channel_names() {
        if platform.channel_by_display_name(channel).is_none() {
            platform.add_channel(channel);
        }
    }
    Arc::new(platform)
}
