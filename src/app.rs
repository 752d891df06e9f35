//! Application wiring.
//!
//! # Startup Sequence
//! 1. Validate configuration
//! 2. Apply metrics switch
//! 3. Open the credential store (resume a saved session if configured)
//! 4. Build the shared API client
//! 5. Build the domain services on top of it
//!
//! # Shutdown
//! `dispose` signals the [`Lifetime`], which stops every timer started under
//! it, and releases the observable stores owned by the services.

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

use crate::catalog::SkuService;
use crate::config::{load_config, validation::validate_config, ClientConfig, ConfigError};
use crate::content::ContentService;
use crate::http::ApiClient;
use crate::lifecycle::Lifetime;
use crate::observability::metrics;
use crate::orders::{CheckoutFlow, OrderService};
use crate::session::{AuthService, CredentialStore};

#[derive(Debug, Error)]
pub enum StorefrontError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("credential store error: {0}")]
    Credentials(#[from] std::io::Error),
}

/// All services of one storefront session, sharing one API client.
pub struct Storefront {
    config: ClientConfig,
    lifetime: Lifetime,
    credentials: Arc<CredentialStore>,
    api: ApiClient,
    content: ContentService,
    sku: SkuService,
    auth: AuthService,
    orders: OrderService,
}

impl Storefront {
    pub fn init(config: ClientConfig) -> Result<Self, StorefrontError> {
        validate_config(&config).map_err(ConfigError::Validation)?;
        metrics::set_enabled(config.observability.metrics_enabled);

        let credentials = Arc::new(match &config.session.credentials_path {
            Some(path) => CredentialStore::load_from_file(Path::new(path))?,
            None => CredentialStore::new(None),
        });
        let api = ApiClient::new(&config.api, credentials.clone())?;
        let lifetime = Lifetime::new();

        let content = ContentService::new(
            api.clone(),
            &config.endpoints.content,
            &config.endpoints.products,
            &config.api.language,
        );
        let sku = SkuService::new(api.clone(), &config.endpoints.sku, config.catalog.clone());
        let auth = AuthService::new(
            api.clone(),
            &config.endpoints.auth,
            config.session.clone(),
            lifetime.clone(),
        );
        let orders = OrderService::new(api.clone(), &config.endpoints, config.checkout.clone());

        tracing::info!(
            base_url = %api.base_url(),
            language = %config.api.language,
            authenticated = credentials.is_authenticated(),
            "Storefront initialized"
        );

        Ok(Self {
            config,
            lifetime,
            credentials,
            api,
            content,
            sku,
            auth,
            orders,
        })
    }

    /// Load configuration from `path` and initialize.
    pub fn from_path(path: &Path) -> Result<Self, StorefrontError> {
        Self::init(load_config(path)?)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn credentials(&self) -> &Arc<CredentialStore> {
        &self.credentials
    }

    pub fn content(&self) -> &ContentService {
        &self.content
    }

    pub fn sku(&self) -> &SkuService {
        &self.sku
    }

    pub fn auth(&self) -> &AuthService {
        &self.auth
    }

    pub fn orders(&self) -> &OrderService {
        &self.orders
    }

    /// A fresh checkout flow over the shared order service.
    pub fn checkout(&self) -> CheckoutFlow {
        CheckoutFlow::new(self.orders.clone())
    }

    pub fn lifetime(&self) -> &Lifetime {
        &self.lifetime
    }

    /// Stop timers and release per-session state. Returns `false` if already disposed.
    pub fn dispose(&self) -> bool {
        if !self.lifetime.dispose() {
            return false;
        }
        self.orders.clear_current_order();
        tracing::info!("Storefront disposed");
        true
    }
}
