//! SKU catalog retrieval.

use std::time::Duration;

use reqwest::Method;
use serde_json::json;

use crate::catalog::types::SkuData;
use crate::config::CatalogConfig;
use crate::http::{ApiClient, ApiError, RequestBody, RequestOptions};

/// Fetches the plan catalog of a product.
#[derive(Clone)]
pub struct SkuService {
    api: ApiClient,
    endpoint: String,
    config: CatalogConfig,
}

impl SkuService {
    pub fn new(api: ApiClient, endpoint: &str, config: CatalogConfig) -> Self {
        Self {
            api,
            endpoint: endpoint.to_string(),
            config,
        }
    }

    /// Fetch the SKU payload for product `type_id`.
    pub async fn sku_list(&self, type_id: u64, language: &str) -> Result<SkuData, ApiError> {
        let body = RequestBody::Json(json!({
            "type_id": type_id,
            "source": self.config.source,
            "language": language,
        }));
        let options = RequestOptions::new()
            .timeout(Duration::from_millis(self.config.timeout_ms))
            .retries(self.config.max_retries);

        let sku: SkuData = self
            .api
            .call(Method::POST, &self.endpoint, &body, &options)
            .await?;

        tracing::info!(
            type_id,
            type_name = %sku.type_name,
            months = sku.plan.month.len(),
            screens = sku.plan.screen.len(),
            has_repayment = sku.repayment.is_some(),
            "SKU catalog loaded"
        );
        Ok(sku)
    }
}
