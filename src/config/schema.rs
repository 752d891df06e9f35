//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the storefront
//! client. All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the storefront client.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ClientConfig {
    /// Backend connection settings (base URL, timeouts, retries).
    pub api: ApiConfig,

    /// Endpoint paths relative to the base URL.
    pub endpoints: EndpointConfig,

    /// SKU catalog request settings.
    pub catalog: CatalogConfig,

    /// Session and credential persistence.
    pub session: SessionConfig,

    /// Order and receipt settings.
    pub checkout: CheckoutConfig,

    /// Logging and metrics settings.
    pub observability: ObservabilityConfig,
}

/// Backend connection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the backend (e.g., "http://localhost:3000").
    pub base_url: String,

    /// Value sent in the `X-API-Version` header.
    pub api_version: String,

    /// Content language requested from the backend.
    pub language: String,

    /// Default request timeout in milliseconds.
    pub timeout_ms: u64,

    /// Additional attempts after the first failure.
    pub max_retries: u32,

    /// Delay before the first retry; doubles on each further retry.
    pub retry_base_delay_ms: u64,

    /// Upper bound for a single retry delay.
    pub retry_max_delay_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            api_version: "v1".to_string(),
            language: "es".to_string(),
            timeout_ms: 10_000,
            max_retries: 2,
            retry_base_delay_ms: 1_000,
            retry_max_delay_ms: 30_000,
        }
    }
}

/// Endpoint paths.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EndpointConfig {
    pub content: String,
    pub products: String,
    pub sku: String,
    /// Prefix for `check-email`, `login`, `send-code`, etc.
    pub auth: String,
    pub orders: String,
    pub order_history: String,
    pub order_statistics: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            content: "/api/webpage/key".to_string(),
            products: "/index/getTypeClassifyList".to_string(),
            sku: "/api/index/getSkuList".to_string(),
            auth: "/api/customer/auth".to_string(),
            orders: "/api/orders".to_string(),
            order_history: "/api/orders/my/history".to_string(),
            order_statistics: "/api/orders/my/statistics".to_string(),
        }
    }
}

/// SKU catalog request configuration.
///
/// The plan catalog is larger than other payloads, so it gets a longer
/// timeout and a single retry.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub timeout_ms: u64,
    pub max_retries: u32,
    /// `source` field sent with every SKU request.
    pub source: u32,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 15_000,
            max_retries: 1,
            source: 1,
        }
    }
}

/// Session configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Optional JSON file holding the stored token, refresh token and customer.
    pub credentials_path: Option<String>,

    /// A token expiring within this many seconds is considered stale.
    pub expiry_margin_secs: u64,

    /// Cooldown before a verification code may be re-sent.
    pub otp_resend_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            credentials_path: None,
            expiry_margin_secs: 300,
            otp_resend_secs: 60,
        }
    }
}

/// Checkout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CheckoutConfig {
    /// Largest accepted receipt image in bytes.
    pub max_receipt_bytes: u64,

    /// Accepted receipt MIME types.
    pub receipt_types: Vec<String>,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            max_receipt_bytes: 5 * 1024 * 1024,
            receipt_types: vec![
                "image/jpeg".to_string(),
                "image/jpg".to_string(),
                "image/png".to_string(),
                "image/webp".to_string(),
            ],
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub log_filter: String,

    pub log_format: LogFormat,

    /// Record request counters and latency histograms.
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_filter: "storefront_client=info,storefront=info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.api.timeout_ms, 10_000);
        assert_eq!(config.api.max_retries, 2);
        assert_eq!(config.catalog.timeout_ms, 15_000);
        assert_eq!(config.catalog.max_retries, 1);
        assert_eq!(config.checkout.max_receipt_bytes, 5 * 1024 * 1024);
        assert!(config.checkout.receipt_types.iter().any(|t| t == "image/webp"));
    }

    #[test]
    fn test_partial_toml() {
        let config: ClientConfig = toml::from_str(
            r#"
            [api]
            base_url = "https://api.example.com"

            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.api.base_url, "https://api.example.com");
        assert_eq!(config.api.language, "es");
        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert_eq!(config.endpoints.sku, "/api/index/getSkuList");
    }
}
