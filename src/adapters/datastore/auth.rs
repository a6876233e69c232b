//! Access token providers
//!
//! Supported credential sources, in resolution order:
//! 1. Emulator mode: no authentication
//! 2. An explicit access token (`datastore.access_token` / `DATASTORE_BACKUP_ACCESS_TOKEN`)
//! 3. A service-account key file named by `datastore.credentials_file`
//! 4. Application default credentials: `GOOGLE_APPLICATION_CREDENTIALS`, the
//!    gcloud user credentials, or the GCE/Cloud Run metadata server
//!
//! Token exchange and caching for 3 and 4 are handled by `gcp_auth`.

use crate::config::{DatastoreConfig, SecretString};
use crate::domain::{BackupError, Result};
use async_trait::async_trait;
use gcp_auth::{CustomServiceAccount, TokenProvider as GcpTokenProvider};
use secrecy::ExposeSecret;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Environment variable naming the credentials file
pub const CREDENTIALS_ENV: &str = "GOOGLE_APPLICATION_CREDENTIALS";

/// OAuth scope for the Datastore API
pub const DATASTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";

/// Source of the `Authorization` header for Datastore requests
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Header value, or `None` for unauthenticated access
    async fn authorization(&self) -> Result<Option<String>>;

    /// Short name of the credential source, safe to log
    fn kind(&self) -> &'static str;
}

/// No authentication (Datastore emulator)
pub struct NoAuth;

#[async_trait]
impl TokenProvider for NoAuth {
    async fn authorization(&self) -> Result<Option<String>> {
        Ok(None)
    }

    fn kind(&self) -> &'static str {
        "none"
    }
}

/// A fixed, externally obtained access token
pub struct StaticToken {
    token: SecretString,
}

impl StaticToken {
    pub fn new(token: SecretString) -> Self {
        Self { token }
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn authorization(&self) -> Result<Option<String>> {
        Ok(Some(self.token.expose_secret().bearer()))
    }

    fn kind(&self) -> &'static str {
        "access_token"
    }
}

/// Google credentials backed by `gcp_auth`
///
/// Application default credentials are discovered on first use, so building
/// a client never touches the network.
pub struct GoogleCredentials {
    kind: &'static str,
    provider: OnceCell<Arc<dyn GcpTokenProvider>>,
}

impl GoogleCredentials {
    /// Loads a service-account key file
    pub fn from_service_account_file(path: &Path) -> Result<Self> {
        let account = CustomServiceAccount::from_file(path).map_err(|e| {
            BackupError::Configuration(format!(
                "Invalid service account file {}: {e}",
                path.display()
            ))
        })?;
        let provider: Arc<dyn GcpTokenProvider> = Arc::new(account);

        Ok(Self {
            kind: "service_account",
            provider: OnceCell::new_with(Some(provider)),
        })
    }

    /// Application default credentials, resolved on the first token request
    pub fn application_default() -> Self {
        Self {
            kind: "application_default",
            provider: OnceCell::new(),
        }
    }

    async fn provider(&self) -> Result<&Arc<dyn GcpTokenProvider>> {
        self.provider
            .get_or_try_init(|| async {
                gcp_auth::provider().await.map_err(|e| {
                    BackupError::Authentication(format!(
                        "No application default credentials found ({e}). Set {CREDENTIALS_ENV} \
                         or DATASTORE_BACKUP_ACCESS_TOKEN"
                    ))
                })
            })
            .await
    }
}

#[async_trait]
impl TokenProvider for GoogleCredentials {
    async fn authorization(&self) -> Result<Option<String>> {
        let token = self
            .provider()
            .await?
            .token(&[DATASTORE_SCOPE])
            .await
            .map_err(|e| BackupError::Authentication(format!("Token request failed: {e}")))?;

        Ok(Some(format!("Bearer {}", token.as_str())))
    }

    fn kind(&self) -> &'static str {
        self.kind
    }
}

/// Picks the credential source for a Datastore configuration
///
/// # Errors
///
/// Returns a configuration error when the configured key file is unreadable
/// or not a service-account key.
pub fn token_provider_from_config(config: &DatastoreConfig) -> Result<Arc<dyn TokenProvider>> {
    if config.emulator {
        return Ok(Arc::new(NoAuth));
    }

    if let Some(token) = &config.access_token {
        if !token.expose_secret().is_empty() {
            return Ok(Arc::new(StaticToken::new(token.clone())));
        }
    }

    match config.credentials_file.as_deref().filter(|p| !p.is_empty()) {
        Some(path) => Ok(Arc::new(GoogleCredentials::from_service_account_file(
            Path::new(path),
        )?)),
        None => Ok(Arc::new(GoogleCredentials::application_default())),
    }
}
