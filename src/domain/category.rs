//! Category index and filtered views over a quote collection.

use rand::Rng;

use super::models::{Quote, QuoteCollection};

/// Persisted spelling of the "no restriction" selector.
pub const ALL_CATEGORIES: &str = "all";

/// A category filter: either every quote or one exact category.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum CategorySelector {
    /// Matches every quote.
    #[default]
    All,
    /// Matches quotes whose category equals this label exactly.
    Named(String),
}

impl CategorySelector {
    /// Whether this selector admits the given quote.
    #[must_use]
    pub fn matches(&self, quote: &Quote) -> bool {
        match self {
            Self::All => true,
            Self::Named(name) => quote.category == *name,
        }
    }
}

impl From<String> for CategorySelector {
    fn from(value: String) -> Self {
        if value == ALL_CATEGORIES {
            Self::All
        } else {
            Self::Named(value)
        }
    }
}

impl From<&str> for CategorySelector {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl std::fmt::Display for CategorySelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => write!(f, "{ALL_CATEGORIES}"),
            Self::Named(name) => write!(f, "{name}"),
        }
    }
}

/// Distinct categories in order of first occurrence, preceded by `All`.
#[must_use]
pub fn derive_categories(collection: &QuoteCollection) -> Vec<CategorySelector> {
    let mut categories = vec![CategorySelector::All];

    for quote in collection {
        let selector = CategorySelector::Named(quote.category.clone());
        if !categories.contains(&selector) {
            categories.push(selector);
        }
    }

    categories
}

/// Quotes admitted by the selector, in collection order.
#[must_use]
pub fn filter<'a>(collection: &'a QuoteCollection, selector: &CategorySelector) -> Vec<&'a Quote> {
    collection.iter().filter(|q| selector.matches(q)).collect()
}

/// Pick one quote uniformly at random, or `None` for an empty subset.
pub fn pick_random<'a, R: Rng>(subset: &[&'a Quote], rng: &mut R) -> Option<&'a Quote> {
    if subset.is_empty() {
        return None;
    }

    // floor(random() * len)
    let index = (rng.gen::<f64>() * subset.len() as f64) as usize;
    subset.get(index.min(subset.len() - 1)).copied()
}
