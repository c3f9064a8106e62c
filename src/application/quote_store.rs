//! Quote store service.
//!
//! Owns the persisted quote collection and the last selected category,
//! on top of the local key-value storage.

use std::path::Path;

use crate::domain::{AppError, CategorySelector, QuoteCollection, Result};
use crate::infrastructure::LocalStorage;

/// Storage key holding the JSON array of quotes.
pub const QUOTES_KEY: &str = "quotes";

/// Storage key holding the last selected category.
pub const LAST_CATEGORY_KEY: &str = "lastSelectedCategory";

/// Persisted quote collection.
pub struct QuoteStore {
    storage: LocalStorage,
}

impl QuoteStore {
    /// Open the store at the given database path.
    ///
    /// # Errors
    /// Returns error if local storage cannot be opened.
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self {
            storage: LocalStorage::open(path)?,
        })
    }

    /// Create with an existing storage instance.
    #[must_use]
    pub const fn with_storage(storage: LocalStorage) -> Self {
        Self { storage }
    }

    /// Load the persisted collection for display.
    ///
    /// Never fails: missing, unreadable or malformed data yields the default
    /// collection. Callers that write the collection back use
    /// [`Self::try_load`] instead.
    pub fn load(&self) -> QuoteCollection {
        self.try_load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to read stored quotes, using defaults");
            QuoteCollection::defaults()
        })
    }

    /// Load the persisted collection before modifying it.
    ///
    /// Malformed data counts as absent and yields the defaults without touching
    /// the stored value. Defaults are written back only when nothing was stored.
    ///
    /// # Errors
    /// Returns `AppError::Storage` if the stored value cannot be read, so the
    /// caller never overwrites data it could not see.
    pub fn try_load(&self) -> Result<QuoteCollection> {
        let Some(raw) = self.storage.get_item(QUOTES_KEY)? else {
            let defaults = QuoteCollection::defaults();
            if let Err(e) = self.save(&defaults) {
                tracing::warn!(error = %e, "Failed to seed default quotes");
            }
            return Ok(defaults);
        };

        Ok(serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Stored quotes are malformed, using defaults");
            QuoteCollection::defaults()
        }))
    }

    /// Persist the full collection, replacing the stored value.
    ///
    /// # Errors
    /// Returns error if serialization or the storage write fails.
    pub fn save(&self, collection: &QuoteCollection) -> Result<()> {
        let raw = serde_json::to_string(collection).map_err(AppError::json_parse)?;
        self.storage.set_item(QUOTES_KEY, &raw)?;

        tracing::debug!(count = collection.len(), "Saved quotes");
        Ok(())
    }

    /// Validate and append a quote, returning the updated collection.
    ///
    /// The caller persists it with [`Self::save`].
    ///
    /// # Errors
    /// Returns `AppError::Validation` if either field is blank.
    pub fn add(
        mut collection: QuoteCollection,
        text: &str,
        category: &str,
    ) -> Result<QuoteCollection> {
        collection.add(text, category)?;
        Ok(collection)
    }

    /// Append every quote from a raw JSON array, returning the updated collection.
    ///
    /// # Errors
    /// Returns `AppError::Format` if the payload is not an array of quotes.
    pub fn import_batch(
        mut collection: QuoteCollection,
        raw_json: &str,
    ) -> Result<QuoteCollection> {
        let count = collection.import_batch(raw_json)?;
        tracing::info!(count, "Imported quotes");
        Ok(collection)
    }

    /// Render the collection as pretty-printed JSON for export.
    ///
    /// # Errors
    /// Returns error if serialization fails.
    pub fn export(collection: &QuoteCollection) -> Result<String> {
        serde_json::to_string_pretty(collection).map_err(AppError::json_parse)
    }

    /// The category selected in a previous session, or `All`.
    pub fn last_selected_category(&self) -> CategorySelector {
        match self.storage.get_item(LAST_CATEGORY_KEY) {
            Ok(Some(raw)) => CategorySelector::from(raw),
            Ok(None) => CategorySelector::All,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read last selected category");
                CategorySelector::All
            }
        }
    }

    /// Remember the selected category across sessions.
    ///
    /// # Errors
    /// Returns error if the storage write fails.
    pub fn set_last_selected_category(&self, selector: &CategorySelector) -> Result<()> {
        self.storage
            .set_item(LAST_CATEGORY_KEY, &selector.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn store() -> QuoteStore {
        QuoteStore::with_storage(LocalStorage::open_in_memory().unwrap())
    }

    #[test]
    fn test_load_seeds_defaults() {
        let store = store();

        let loaded = store.load();

        assert_eq!(loaded, QuoteCollection::defaults());
        assert!(store.storage.get_item(QUOTES_KEY).unwrap().is_some());
    }

    #[test]
    fn test_load_fails_open_on_malformed_data() {
        let store = store();
        store.storage.set_item(QUOTES_KEY, "{not json").unwrap();

        assert_eq!(store.load(), QuoteCollection::defaults());
        // Malformed data is left for the next explicit save to replace.
        assert_eq!(
            store.storage.get_item(QUOTES_KEY).unwrap().as_deref(),
            Some("{not json")
        );
    }

    #[test]
    fn test_try_load_propagates_unreadable_value() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("quotes.db");
        let store = QuoteStore::open(&path).unwrap();
        store.save(&QuoteCollection::default()).unwrap();
        rusqlite::Connection::open(&path)
            .unwrap()
            .execute("UPDATE storage SET value = x'00ff' WHERE key = 'quotes'", [])
            .unwrap();

        assert!(matches!(store.try_load(), Err(AppError::Storage { .. })));
        // Display still works off the defaults, and nothing is overwritten.
        assert_eq!(store.load(), QuoteCollection::defaults());
        assert!(store.storage.get_item(QUOTES_KEY).is_err());
    }

    #[test]
    fn test_load_accepts_empty_array() {
        let store = store();
        store.storage.set_item(QUOTES_KEY, "[]").unwrap();

        assert!(store.load().is_empty());
    }

    #[test]
    fn test_add_then_save_persists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("quotes.db");

        {
            let store = QuoteStore::open(&path).unwrap();
            let collection = QuoteStore::add(store.try_load().unwrap(), "Be bold", "A").unwrap();
            store.save(&collection).unwrap();
        }

        let reopened = QuoteStore::open(&path).unwrap().load();
        assert_eq!(reopened.len(), 4);
        assert_eq!(reopened.as_slice()[3].text, "Be bold");
    }

    #[test]
    fn test_add_rejects_blank() {
        let store = store();
        let result = QuoteStore::add(store.load(), "", "Life");
        assert!(matches!(result, Err(AppError::Validation { .. })));
    }

    #[test]
    fn test_import_bare_object_is_format_error() {
        let store = store();
        let collection = store.load();

        let result = QuoteStore::import_batch(collection.clone(), "{}");

        assert!(matches!(result, Err(AppError::Format { .. })));
        assert_eq!(store.load().len(), collection.len());
    }

    #[test]
    fn test_export_is_pretty_array() {
        let collection = QuoteStore::add(QuoteCollection::default(), "Hi", "Greeting").unwrap();

        let exported = QuoteStore::export(&collection).unwrap();

        assert_eq!(
            exported,
            "[\n  {\n    \"text\": \"Hi\",\n    \"category\": \"Greeting\"\n  }\n]"
        );
    }

    #[test]
    fn test_export_then_import_restores_contents() {
        let store = store();
        let original = store.load();
        let exported = QuoteStore::export(&original).unwrap();

        let restored = QuoteStore::import_batch(QuoteCollection::default(), &exported).unwrap();

        assert_eq!(restored, original);
    }

    #[test]
    fn test_last_selected_category() {
        let store = store();
        assert_eq!(store.last_selected_category(), CategorySelector::All);

        store
            .set_last_selected_category(&CategorySelector::Named("Life".into()))
            .unwrap();
        assert_eq!(
            store.last_selected_category(),
            CategorySelector::Named("Life".into())
        );

        store
            .set_last_selected_category(&CategorySelector::All)
            .unwrap();
        assert_eq!(
            store.storage.get_item(LAST_CATEGORY_KEY).unwrap().as_deref(),
            Some("all")
        );
    }
}
