//! REST resource service client
//!
//! Provides a typed HTTP client for the finance backend's four CRUD
//! resources plus its health probe. Handles authentication headers, JSON
//! deserialization, endpoint construction, and error classification.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use ledgersync_api::client::ApiClient;
//! use ledgersync_core::config::ApiConfig;
//! use ledgersync_core::ports::IResourceService;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = ApiClient::new(&ApiConfig::default(), "access-token-here")?;
//! client.health_check().await?;
//! let cards = client.list_cards().await?;
//! println!("{} cards", cards.len());
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use ledgersync_core::config::ApiConfig;
use ledgersync_core::domain::{
    Account, AccountPatch, Budget, BudgetPatch, Card, CardPatch, EntityId, Transaction,
    TransactionPatch,
};
use ledgersync_core::ports::{IResourceService, ServiceError};

/// Resource endpoints under the common base path
const HEALTH_PATH: &str = "/api/health";
const CARDS_PATH: &str = "/api/cards";
const ACCOUNTS_PATH: &str = "/api/accounts";
const TRANSACTIONS_PATH: &str = "/api/transactions";
const BUDGETS_PATH: &str = "/api/budgets";

/// HTTP client for the remote resource service
///
/// Wraps `reqwest::Client` with bearer authentication and base URL
/// construction. All calls are scoped server-side to the bearer's
/// identity; the client carries no user parameter.
pub struct ApiClient {
    /// The underlying HTTP client (carries the default request timeout)
    client: Client,
    /// Base URL for API requests
    base_url: String,
    /// Bearer credential issued by the external auth provider
    access_token: String,
    /// Tighter bound applied to the startup health probe
    health_timeout: Duration,
}

impl ApiClient {
    /// Creates a new ApiClient from configuration
    ///
    /// # Arguments
    /// * `config` - API section of the application configuration
    /// * `access_token` - A bearer token for the signed-in principal
    ///
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &ApiConfig, access_token: impl Into<String>) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            access_token: access_token.into(),
            health_timeout: Duration::from_secs(config.health_timeout_secs),
        })
    }

    /// Creates an ApiClient with a custom base URL (useful for testing)
    ///
    /// Uses the default timeouts from [`ApiConfig::default`].
    pub fn with_base_url(
        access_token: impl Into<String>,
        base_url: impl Into<String>,
    ) -> anyhow::Result<Self> {
        let config = ApiConfig {
            base_url: base_url.into(),
            ..ApiConfig::default()
        };
        Self::new(&config, access_token)
    }

    /// Updates the access token (e.g., after a re-authentication)
    pub fn set_access_token(&mut self, token: impl Into<String>) {
        self.access_token = token.into();
        debug!("Updated ApiClient access token");
    }

    /// Creates an authenticated request builder for the given method and path
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.client
            .request(method, &url)
            .bearer_auth(&self.access_token)
    }

    /// Classifies a transport-level failure from reqwest
    fn classify_transport(err: reqwest::Error) -> ServiceError {
        if err.is_timeout() || err.is_connect() || err.is_request() {
            ServiceError::Connectivity(err.to_string())
        } else if err.is_decode() {
            ServiceError::Unexpected(format!("malformed response body: {err}"))
        } else {
            ServiceError::Unexpected(err.to_string())
        }
    }

    /// Maps a non-success response to the error taxonomy
    async fn classify_status(response: Response) -> ServiceError {
        let status = response.status();
        let message = response.text().await.unwrap_or_default();
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ServiceError::Auth(message),
            StatusCode::NOT_FOUND => ServiceError::NotFound(message),
            _ => ServiceError::Rejected {
                status: status.as_u16(),
                message,
            },
        }
    }

    /// Sends a request and resolves non-success statuses into errors
    async fn send(&self, builder: RequestBuilder) -> Result<Response, ServiceError> {
        let response = builder.send().await.map_err(Self::classify_transport)?;
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(Self::classify_status(response).await)
        }
    }

    // --- Generic resource operations ---

    async fn list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, ServiceError> {
        let response = self.send(self.request(Method::GET, path)).await?;
        response
            .json::<Vec<T>>()
            .await
            .map_err(Self::classify_transport)
    }

    async fn create<B: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, ServiceError> {
        let response = self
            .send(self.request(Method::POST, path).json(body))
            .await?;
        response.json::<R>().await.map_err(Self::classify_transport)
    }

    async fn patch<B: Serialize>(
        &self,
        path: &str,
        id: &EntityId,
        body: &B,
    ) -> Result<(), ServiceError> {
        let path = format!("{}/{}", path, id.to_wire());
        self.send(self.request(Method::PATCH, &path).json(body))
            .await?;
        Ok(())
    }

    async fn delete(&self, path: &str, id: &EntityId) -> Result<(), ServiceError> {
        let path = format!("{}/{}", path, id.to_wire());
        self.send(self.request(Method::DELETE, &path)).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl IResourceService for ApiClient {
    async fn health_check(&self) -> Result<(), ServiceError> {
        debug!("Probing {}", HEALTH_PATH);
        // The probe gets a tighter bound than ordinary calls so a dead
        // backend degrades into the offline path quickly.
        let builder = self
            .request(Method::GET, HEALTH_PATH)
            .timeout(self.health_timeout);
        self.send(builder).await?;
        Ok(())
    }

    async fn list_cards(&self) -> Result<Vec<Card>, ServiceError> {
        self.list(CARDS_PATH).await
    }

    async fn create_card(&self, card: &Card) -> Result<Card, ServiceError> {
        self.create(CARDS_PATH, card).await
    }

    async fn update_card(&self, id: &EntityId, updates: &CardPatch) -> Result<(), ServiceError> {
        self.patch(CARDS_PATH, id, updates).await
    }

    async fn delete_card(&self, id: &EntityId) -> Result<(), ServiceError> {
        self.delete(CARDS_PATH, id).await
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, ServiceError> {
        self.list(ACCOUNTS_PATH).await
    }

    async fn create_account(&self, account: &Account) -> Result<Account, ServiceError> {
        self.create(ACCOUNTS_PATH, account).await
    }

    async fn update_account(
        &self,
        id: &EntityId,
        updates: &AccountPatch,
    ) -> Result<(), ServiceError> {
        self.patch(ACCOUNTS_PATH, id, updates).await
    }

    async fn delete_account(&self, id: &EntityId) -> Result<(), ServiceError> {
        self.delete(ACCOUNTS_PATH, id).await
    }

    async fn list_transactions(&self) -> Result<Vec<Transaction>, ServiceError> {
        self.list(TRANSACTIONS_PATH).await
    }

    async fn create_transaction(&self, tx: &Transaction) -> Result<Transaction, ServiceError> {
        self.create(TRANSACTIONS_PATH, tx).await
    }

    async fn update_transaction(
        &self,
        id: &EntityId,
        updates: &TransactionPatch,
    ) -> Result<(), ServiceError> {
        self.patch(TRANSACTIONS_PATH, id, updates).await
    }

    async fn delete_transaction(&self, id: &EntityId) -> Result<(), ServiceError> {
        self.delete(TRANSACTIONS_PATH, id).await
    }

    async fn list_budgets(&self) -> Result<Vec<Budget>, ServiceError> {
        self.list(BUDGETS_PATH).await
    }

    async fn create_budget(&self, budget: &Budget) -> Result<Budget, ServiceError> {
        self.create(BUDGETS_PATH, budget).await
    }

    async fn update_budget(
        &self,
        id: &EntityId,
        updates: &BudgetPatch,
    ) -> Result<(), ServiceError> {
        self.patch(BUDGETS_PATH, id, updates).await
    }

    async fn delete_budget(&self, id: &EntityId) -> Result<(), ServiceError> {
        self.delete(BUDGETS_PATH, id).await
    }
}
