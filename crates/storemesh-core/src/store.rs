//! The `Store` configuration entity.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A store configuration record.
///
/// Stores are the unit of multi-tenancy configuration: each one describes a
/// public endpoint (url, host bindings, TLS) plus display metadata. The
/// collection is small, read-heavy, and mutated rarely, which is why reads
/// are served through the cache tiers rather than the repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Store {
    /// Unique identifier. Generated as a UUID v4 when the store is built
    /// through [`Store::new`]; callers may supply their own ids.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Public URL of the store front.
    pub url: String,
    /// Whether the endpoint is served over TLS.
    #[serde(default)]
    pub ssl_enabled: bool,
    /// Comma-separated HTTP host values this store answers for.
    #[serde(default)]
    pub hosts: String,
    /// Company name shown in store-owned documents.
    #[serde(default)]
    pub company_name: String,
    /// Explicit ordering field; `get_all` sorts ascending by this value.
    #[serde(default)]
    pub display_order: i32,
}

impl Store {
    /// Build a new store with a generated id and default metadata.
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            url: url.into(),
            ssl_enabled: false,
            hosts: String::new(),
            company_name: String::new(),
            display_order: 0,
        }
    }

    /// Builder-style setter for the ordering field.
    #[must_use]
    pub fn with_display_order(mut self, display_order: i32) -> Self {
        self.display_order = display_order;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_generates_unique_ids() {
        let a = Store::new("Main", "https://shop.example.com");
        let b = Store::new("Outlet", "https://outlet.example.com");
        assert_ne!(a.id, b.id);
        assert_eq!(a.display_order, 0);
    }

    #[test]
    fn serde_round_trip() {
        let store = Store::new("Main", "https://shop.example.com").with_display_order(3);
        let json = serde_json::to_string(&store).unwrap();
        let back: Store = serde_json::from_str(&json).unwrap();
        assert_eq!(store, back);
    }

    #[test]
    fn missing_optional_fields_default() {
        let store: Store = serde_json::from_str(
            r#"{"id":"s1","name":"Main","url":"https://shop.example.com"}"#,
        )
        .unwrap();
        assert!(!store.ssl_enabled);
        assert_eq!(store.display_order, 0);
    }
}
