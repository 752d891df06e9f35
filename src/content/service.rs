//! Page content and product listing retrieval.
//!
//! # Responsibilities
//! - Fetch text sections by key and language
//! - Cache sections per language and publish the active language's snapshot
//! - Degrade to built-in text and sample products when the backend fails
//!
//! # Design Decisions
//! - Fallback paths log the error and never surface it; pages always render
//! - Switching back to an already loaded language is served from the cache

use std::collections::BTreeMap;
use std::sync::Arc;

use dashmap::DashMap;
use reqwest::Method;
use serde_json::{json, Map, Value};
use tokio::sync::watch;

use crate::content::products::ProductCatalog;
use crate::content::types::{ContentSection, ContentSnapshot, MainPage};
use crate::http::{ApiClient, ApiError, RequestBody, RequestOptions};
use crate::store::Store;

/// Sections loaded by default when the language changes.
pub const DEFAULT_SECTIONS: [&str; 3] = ["head", "home", "auth"];

#[derive(Clone)]
pub struct ContentService {
    api: ApiClient,
    content_endpoint: String,
    products_endpoint: String,
    cache: Arc<DashMap<(String, String), ContentSection>>,
    current: Arc<Store<ContentSnapshot>>,
}

impl ContentService {
    pub fn new(api: ApiClient, content_endpoint: &str, products_endpoint: &str, language: &str) -> Self {
        Self {
            api,
            content_endpoint: content_endpoint.to_string(),
            products_endpoint: products_endpoint.to_string(),
            cache: Arc::new(DashMap::new()),
            current: Arc::new(Store::new(ContentSnapshot {
                language: language.to_string(),
                sections: BTreeMap::new(),
            })),
        }
    }

    /// Fetch the named sections for `language`.
    ///
    /// Sections the backend does not return are absent from the result.
    pub async fn fetch_sections(
        &self,
        language: &str,
        keys: &[&str],
    ) -> Result<BTreeMap<String, ContentSection>, ApiError> {
        tracing::debug!(language, sections = ?keys, "Fetching content");

        let data: Map<String, Value> = self
            .api
            .call(
                Method::POST,
                &self.content_endpoint,
                &RequestBody::Json(json!({ "key": keys, "language": language })),
                &RequestOptions::default(),
            )
            .await?;

        let sections: BTreeMap<String, ContentSection> = data
            .iter()
            .filter_map(|(name, value)| Some((name.clone(), ContentSection::from_value(value)?)))
            .collect();

        for (name, section) in &sections {
            self.cache
                .insert((language.to_string(), name.clone()), section.clone());
        }
        self.publish(language, &sections);

        tracing::debug!(
            language,
            loaded = sections.len(),
            requested = keys.len(),
            "Content loaded"
        );
        Ok(sections)
    }

    /// Header and home sections, or built-in text if the backend fails.
    pub async fn main_page(&self, language: &str) -> MainPage {
        match self.fetch_sections(language, &["head", "home"]).await {
            Ok(mut sections) => MainPage {
                head: sections.remove("head").unwrap_or_default(),
                home: sections.remove("home").unwrap_or_default(),
                fallback: false,
            },
            Err(e) => {
                tracing::error!(language, error = %e, "Error loading main page content, using fallback");
                MainPage::fallback()
            }
        }
    }

    /// Product listing, or sample products if the backend fails.
    pub async fn products(&self, language: &str, promote: Option<&str>) -> ProductCatalog {
        let result: Result<ProductCatalog, ApiError> = self
            .api
            .call(
                Method::POST,
                &self.products_endpoint,
                &RequestBody::Json(json!({ "language": language, "promote": promote })),
                &RequestOptions::default(),
            )
            .await;

        match result {
            Ok(catalog) => {
                tracing::debug!(
                    language,
                    categories = catalog.list.len(),
                    "Streaming products loaded"
                );
                catalog
            }
            Err(e) => {
                tracing::error!(language, error = %e, "Error loading streaming products, using fallback");
                ProductCatalog::fallback()
            }
        }
    }

    /// Make `language` active, loading `keys` unless all are cached.
    pub async fn change_language(
        &self,
        language: &str,
        keys: &[&str],
    ) -> Result<BTreeMap<String, ContentSection>, ApiError> {
        if let Some(sections) = self.cached_all(language, keys) {
            tracing::info!(language, "Language changed (cached)");
            self.publish(language, &sections);
            return Ok(sections);
        }
        let sections = self.fetch_sections(language, keys).await?;
        tracing::info!(language, "Language changed");
        Ok(sections)
    }

    /// A cached section, without a request.
    pub fn cached(&self, language: &str, name: &str) -> Option<ContentSection> {
        self.cache
            .get(&(language.to_string(), name.to_string()))
            .map(|entry| entry.value().clone())
    }

    pub fn current(&self) -> ContentSnapshot {
        self.current.get()
    }

    pub fn language(&self) -> String {
        self.current.with(|s| s.language.clone())
    }

    pub fn subscribe(&self) -> watch::Receiver<ContentSnapshot> {
        self.current.subscribe()
    }

    fn cached_all(&self, language: &str, keys: &[&str]) -> Option<BTreeMap<String, ContentSection>> {
        keys.iter()
            .map(|name| Some((name.to_string(), self.cached(language, name)?)))
            .collect()
    }

    fn publish(&self, language: &str, sections: &BTreeMap<String, ContentSection>) {
        self.current.update(|snapshot| {
            if snapshot.language != language {
                snapshot.language = language.to_string();
                snapshot.sections.clear();
            }
            snapshot
                .sections
                .extend(sections.iter().map(|(k, v)| (k.clone(), v.clone())));
        });
    }
}
