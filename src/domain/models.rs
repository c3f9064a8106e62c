//! Domain models for the quote collection.
//!
//! A quote is an immutable (text, category) pair; the collection is an
//! append-only ordered list of them.

use serde::{Deserialize, Serialize};

use super::error::{AppError, Result};

/// A single quote.
///
/// Equality over both fields is the identity used when merging remote data.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Quote {
    /// The quote text.
    pub text: String,
    /// Category label the quote belongs to.
    pub category: String,
}

impl Quote {
    /// Create a validated quote from user input.
    ///
    /// Both fields are trimmed; an empty field is rejected.
    ///
    /// # Errors
    /// Returns `AppError::Validation` if text or category is empty after trimming.
    pub fn new(text: &str, category: &str) -> Result<Self> {
        let text = text.trim();
        let category = category.trim();

        if text.is_empty() || category.is_empty() {
            return Err(AppError::validation(
                "Please provide both a quote and a category",
            ));
        }

        Ok(Self {
            text: text.to_string(),
            category: category.to_string(),
        })
    }
}

impl std::fmt::Display for Quote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "\"{}\" — {}", self.text, self.category)
    }
}

/// Ordered collection of quotes. Insertion order is display and export order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuoteCollection {
    quotes: Vec<Quote>,
}

/// Counts produced by merging a remote batch into the local collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Remote quotes appended to the collection.
    pub added: usize,
    /// Remote quotes already present and therefore discarded.
    pub skipped: usize,
}

impl QuoteCollection {
    /// Wrap an existing list of quotes.
    #[must_use]
    pub const fn new(quotes: Vec<Quote>) -> Self {
        Self { quotes }
    }

    /// The seed collection used when nothing usable is persisted.
    #[must_use]
    pub fn defaults() -> Self {
        let seed = [
            (
                "The best way to get started is to quit talking and begin doing.",
                "Motivation",
            ),
            (
                "Life is what happens when you're busy making other plans.",
                "Life",
            ),
            (
                "Do what you can with what you have, wherever you are.",
                "Inspiration",
            ),
        ];

        Self::new(
            seed.iter()
                .map(|(text, category)| Quote {
                    text: (*text).to_string(),
                    category: (*category).to_string(),
                })
                .collect(),
        )
    }

    /// Number of quotes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    /// Whether the collection holds no quotes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    /// Iterate quotes in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Quote> {
        self.quotes.iter()
    }

    /// Borrow the quotes as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[Quote] {
        &self.quotes
    }

    /// Whether a quote with identical text and category is present.
    #[must_use]
    pub fn contains(&self, quote: &Quote) -> bool {
        self.quotes.iter().any(|q| q == quote)
    }

    /// Append a validated quote built from user input.
    ///
    /// # Errors
    /// Returns `AppError::Validation` if either field is empty after trimming,
    /// leaving the collection untouched.
    pub fn add(&mut self, text: &str, category: &str) -> Result<&Quote> {
        let quote = Quote::new(text, category)?;
        self.quotes.push(quote);
        Ok(&self.quotes[self.quotes.len() - 1])
    }

    /// Append every quote from a raw JSON array, verbatim and in order.
    ///
    /// Returns the number of quotes appended.
    ///
    /// # Errors
    /// Returns `AppError::Format` if the input is not JSON, the top-level value
    /// is not an array, or an element lacks string `text`/`category` fields.
    /// Nothing is appended on error.
    pub fn import_batch(&mut self, raw_json: &str) -> Result<usize> {
        let value: serde_json::Value = serde_json::from_str(raw_json)
            .map_err(|e| AppError::format("Input is not valid JSON", Some(e)))?;

        if !value.is_array() {
            return Err(AppError::format("Invalid JSON format: expected an array", None));
        }

        let imported: Vec<Quote> = serde_json::from_value(value).map_err(|e| {
            AppError::format("Every element needs a text and a category", Some(e))
        })?;

        let count = imported.len();
        tracing::debug!(count, "Parsed import batch");
        self.quotes.extend(imported);
        Ok(count)
    }

    /// Merge remote quotes using the additive server-wins policy.
    ///
    /// A remote quote is appended only when no local quote has the same
    /// (text, category) pair. Existing quotes are never removed or changed.
    pub fn merge_remote(&mut self, remote: impl IntoIterator<Item = Quote>) -> MergeOutcome {
        let mut outcome = MergeOutcome::default();

        for quote in remote {
            if self.contains(&quote) {
                tracing::trace!(text = %quote.text, "Remote quote already present");
                outcome.skipped += 1;
            } else {
                self.quotes.push(quote);
                outcome.added += 1;
            }
        }

        outcome
    }
}

impl<'a> IntoIterator for &'a QuoteCollection {
    type Item = &'a Quote;
    type IntoIter = std::slice::Iter<'a, Quote>;

    fn into_iter(self) -> Self::IntoIter {
        self.quotes.iter()
    }
}
