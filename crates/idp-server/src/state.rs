//! Application state management.
//!
//! This module defines the shared state that is passed to all request handlers.

use std::sync::Arc;

use idp_saml::{DocumentSigner, SamlResult, XmlSigner};

use crate::config::IdpConfig;
use crate::directory::{StaticUserDirectory, UserDirectory};

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Identity provider configuration.
    pub config: Arc<IdpConfig>,

    /// Signer, normally built from the configured key pair.
    pub signer: Arc<dyn DocumentSigner>,

    /// Where credentials and sessions are resolved.
    pub directory: Arc<dyn UserDirectory>,
}

impl AppState {
    /// Creates application state over the configured static users.
    ///
    /// # Errors
    ///
    /// Returns `SamlError::Signing` if the key pair is unusable.
    pub fn new(config: IdpConfig) -> SamlResult<Self> {
        let directory = Arc::new(StaticUserDirectory::new(config.users.clone()));
        Self::with_directory(config, directory)
    }

    /// Creates application state with a custom user directory.
    ///
    /// # Errors
    ///
    /// Returns `SamlError::Signing` if the key pair is unusable.
    pub fn with_directory(
        config: IdpConfig,
        directory: Arc<dyn UserDirectory>,
    ) -> SamlResult<Self> {
        let signer = XmlSigner::from_pem(&config.key_pem, &config.cert_pem)?;
        Ok(Self {
            config: Arc::new(config),
            signer: Arc::new(signer),
            directory,
        })
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &IdpConfig {
        &self.config
    }
}
