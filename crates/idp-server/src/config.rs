//! Server configuration.
//!
//! Configuration is loaded from `SAML_IDP_*` environment variables, with an
//! optional `.env` file read first.

use anyhow::Context;
use idp_saml::{join_url, User};

/// Identity provider configuration.
#[derive(Clone)]
pub struct IdpConfig {
    /// Host to bind to.
    pub host: String,

    /// Port to bind to.
    pub port: u16,

    /// Entity ID published in metadata and used as the response issuer.
    pub entity_id: String,

    /// Public base URL; endpoint URLs are derived from it.
    pub base_url: String,

    /// PEM certificate published in metadata and embedded in signatures.
    pub cert_pem: String,

    /// PEM private key matching `cert_pem`.
    pub key_pem: String,

    /// Users that can sign in.
    pub users: Vec<User>,

    /// Where LogoutResponses are delivered. Defaults to the request issuer.
    pub logout_url: Option<String>,

    /// List configured users on the login page.
    pub show_users: bool,
}

impl IdpConfig {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();

        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads configuration through `lookup`, which maps a variable name to
    /// its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |name: &str| lookup(name).filter(|value| !value.is_empty());

        let host = var("SAML_IDP_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = match var("SAML_IDP_PORT") {
            Some(port) => port
                .parse()
                .with_context(|| format!("SAML_IDP_PORT is not a port number: {port}"))?,
            None => 8000,
        };

        let entity_id = var("SAML_IDP_ENTITY_ID")
            .ok_or_else(|| anyhow::anyhow!("SAML_IDP_ENTITY_ID environment variable is required"))?;
        let base_url = var("SAML_IDP_BASE_URL")
            .ok_or_else(|| anyhow::anyhow!("SAML_IDP_BASE_URL environment variable is required"))?;

        let cert_pem = inline_or_file(
            var("SAML_IDP_METADATA_CERT"),
            var("SAML_IDP_METADATA_CERT_FILE"),
        )?;
        let key_pem = inline_or_file(
            var("SAML_IDP_METADATA_KEY"),
            var("SAML_IDP_METADATA_KEY_FILE"),
        )?;

        let users = match var("SAML_IDP_USERS") {
            Some(json) => serde_json::from_str(&json).context("SAML_IDP_USERS is not a valid user list")?,
            None => Vec::new(),
        };

        let logout_url = var("SAML_IDP_LOGOUT_URL");

        let show_users = var("SAML_IDP_SHOW_USERS")
            .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            host,
            port,
            entity_id,
            base_url,
            cert_pem,
            key_pem,
            users,
            logout_url,
            show_users,
        })
    }

    /// Creates a configuration for testing.
    #[must_use]
    pub fn for_testing(cert_pem: &str, key_pem: &str) -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            entity_id: "http://example.com/saml".to_string(),
            base_url: "http://localhost:8000".to_string(),
            cert_pem: cert_pem.to_string(),
            key_pem: key_pem.to_string(),
            users: vec![User::new("taylorswift", "all2well")],
            logout_url: None,
            show_users: false,
        }
    }

    /// Single sign-on endpoint.
    #[must_use]
    pub fn signon_url(&self) -> String {
        join_url(&self.base_url, "/signin")
    }

    /// Single logout endpoint.
    #[must_use]
    pub fn logout_endpoint_url(&self) -> String {
        join_url(&self.base_url, "/logout")
    }
}

impl std::fmt::Debug for IdpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("entity_id", &self.entity_id)
            .field("base_url", &self.base_url)
            .field("key_pem", &"<redacted>")
            .field("users", &self.users)
            .field("logout_url", &self.logout_url)
            .field("show_users", &self.show_users)
            .finish_non_exhaustive()
    }
}

fn inline_or_file(inline: Option<String>, path: Option<String>) -> anyhow::Result<String> {
    match (inline, path) {
        (Some(pem), _) => Ok(pem),
        (None, Some(path)) => {
            std::fs::read_to_string(&path).with_context(|| format!("failed to read {path}"))
        }
        (None, None) => Ok(String::new()),
    }
}
