//! Keyword-based category classification for feed events.
//!
//! Rules are evaluated top to bottom and the first rule with any keyword
//! present in the text wins, so the order of [`CATEGORY_RULES`] is part of the
//! contract: "Festival concert" is a concert, not a festival.

use crate::models::Category;

/// Ordered `(category, keywords)` rules. Keywords are lower-case substrings.
pub const CATEGORY_RULES: &[(Category, &[&str])] = &[
    (
        Category::Concerts,
        &["concert", "musique", "music", "spectacle", "scène", "live"],
    ),
    (Category::Festivals, &["festival"]),
    (
        Category::Sports,
        &["sport", "match", "rugby", "football", "basket", "tournoi"],
    ),
    (Category::Markets, &["marché", "market", "brocante", "foire"]),
    (
        Category::Nightlife,
        &["soirée", "night", "bar", "discothèque", "dj", "clubbing"],
    ),
    (
        Category::Clubs,
        &["club", "restaurant", "resto", "café", "dîner", "gastronomie"],
    ),
    (
        Category::Culture,
        &["expo", "musée", "museum", "art", "galerie", "théâtre", "cinéma", "film"],
    ),
];

/// Used when no rule matches.
pub const FALLBACK_CATEGORY: Category = Category::Culture;

/// Classify an event from its title and description. Callers that have several
/// locale variants should join them into each argument. Always succeeds.
pub fn classify(title: &str, description: &str) -> Category {
    let haystack = format!("{} {}", title, description).to_lowercase();
    CATEGORY_RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| haystack.contains(k)))
        .map(|(category, _)| *category)
        .unwrap_or(FALLBACK_CATEGORY)
}
