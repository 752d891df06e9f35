//! Configuration validation.
//!
//! Serde handles syntax; this module checks value ranges and URL shapes.
//! Every problem is reported, not just the first.

use thiserror::Error;

use crate::config::schema::ClientConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("api.base_url '{0}' is not an absolute http(s) URL")]
    InvalidBaseUrl(String),

    #[error("{0} must be greater than 0")]
    NotPositive(&'static str),

    #[error("endpoint '{name}' must start with '/', got '{path}'")]
    RelativeEndpoint { name: &'static str, path: String },

    #[error("api.language must not be empty")]
    EmptyLanguage,

    #[error("checkout.receipt_types must list at least one type")]
    NoReceiptTypes,

    #[error("checkout.receipt_types entry '{0}' is not an image type")]
    NonImageReceiptType(String),
}

/// Validate a configuration, returning every problem found.
pub fn validate_config(config: &ClientConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match url::Url::parse(&config.api.base_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => {}
        _ => errors.push(ValidationError::InvalidBaseUrl(config.api.base_url.clone())),
    }

    if config.api.timeout_ms == 0 {
        errors.push(ValidationError::NotPositive("api.timeout_ms"));
    }
    if config.api.retry_base_delay_ms == 0 {
        errors.push(ValidationError::NotPositive("api.retry_base_delay_ms"));
    }
    if config.catalog.timeout_ms == 0 {
        errors.push(ValidationError::NotPositive("catalog.timeout_ms"));
    }
    if config.checkout.max_receipt_bytes == 0 {
        errors.push(ValidationError::NotPositive("checkout.max_receipt_bytes"));
    }
    if config.api.language.trim().is_empty() {
        errors.push(ValidationError::EmptyLanguage);
    }

    let endpoints = &config.endpoints;
    for (name, path) in [
        ("content", &endpoints.content),
        ("products", &endpoints.products),
        ("sku", &endpoints.sku),
        ("auth", &endpoints.auth),
        ("orders", &endpoints.orders),
        ("order_history", &endpoints.order_history),
        ("order_statistics", &endpoints.order_statistics),
    ] {
        if !path.starts_with('/') {
            errors.push(ValidationError::RelativeEndpoint {
                name,
                path: path.clone(),
            });
        }
    }

    if config.checkout.receipt_types.is_empty() {
        errors.push(ValidationError::NoReceiptTypes);
    }
    for mime in &config.checkout.receipt_types {
        if !mime.starts_with("image/") {
            errors.push(ValidationError::NonImageReceiptType(mime.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&ClientConfig::default()).is_ok());
    }

    #[test]
    fn test_reports_all_errors() {
        let mut config = ClientConfig::default();
        config.api.base_url = "localhost:3000/api".to_string();
        config.api.timeout_ms = 0;
        config.endpoints.sku = "api/index/getSkuList".to_string();
        config.checkout.receipt_types = vec!["application/pdf".to_string()];

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::NotPositive("api.timeout_ms")));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::RelativeEndpoint { name: "sku", .. })));
    }
}
