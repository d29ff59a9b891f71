//! Common test utilities and fixtures.

use std::net::TcpListener;
use std::time::Duration;

use reqwest::{header, redirect, Client, Response};
use tokio::sync::oneshot;
use tokio::time::sleep;

use idp_integration_tests::redirect_params;
use idp_saml::User;
use idp_server::{IdpConfig, Server};

pub const CERT_PEM: &str = include_str!("../../../crates/idp-saml/testdata/idp.crt");
const KEY_PEM: &str = include_str!("../../../crates/idp-saml/testdata/idp.key");

/// A running identity provider and a client pointed at it.
pub struct TestEnv {
    /// Base URL of the running server.
    pub base_url: String,
    /// HTTP client for testing. Redirects are not followed.
    pub client: Client,
    /// Server shutdown signal.
    _shutdown_tx: oneshot::Sender<()>,
}

impl TestEnv {
    /// Starts a server with the default test configuration.
    pub async fn new() -> anyhow::Result<Self> {
        Self::with_config(|_| {}).await
    }

    /// Starts a server after letting `customize` adjust the configuration.
    pub async fn with_config(customize: impl FnOnce(&mut IdpConfig)) -> anyhow::Result<Self> {
        // Initialize tracing for tests
        let _ = tracing_subscriber::fmt()
            .with_env_filter("idp_server=debug,idp_saml=debug")
            .try_init();

        // Find available port for server
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let server_port = listener.local_addr()?.port();
        drop(listener);

        let base_url = format!("http://127.0.0.1:{server_port}");

        let mut config = IdpConfig::for_testing(CERT_PEM, KEY_PEM);
        config.port = server_port;
        config.base_url = base_url.clone();
        config
            .users
            .push(User::new("davidbowie", "starman").with_attribute("email", "bowie@example.com"));
        customize(&mut config);

        let (_shutdown_tx, shutdown_rx) = oneshot::channel();

        let server = Server::new(config)?;
        tokio::spawn(async move {
            tokio::select! {
                result = server.run() => {
                    if let Err(e) = result {
                        tracing::error!("Server error: {}", e);
                    }
                }
                _ = shutdown_rx => {
                    tracing::info!("Server shutdown requested");
                }
            }
        });

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .redirect(redirect::Policy::none())
            .build()?;

        wait_for_server(&client, &base_url).await?;

        Ok(Self {
            base_url,
            client,
            _shutdown_tx,
        })
    }

    /// Absolute URL for `path`.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Signs in through the login form and returns the `Cookie` header value
    /// for the new session.
    pub async fn sign_in(&self, username: &str, password: &str) -> anyhow::Result<String> {
        let response = self
            .client
            .post(self.url("/login"))
            .form(&[("username", username), ("password", password)])
            .send()
            .await?;
        anyhow::ensure!(
            response.status().as_u16() == 302,
            "sign-in failed with status {}",
            response.status()
        );
        session_cookie(&response).ok_or_else(|| anyhow::anyhow!("no session cookie set"))
    }

    /// Sends `xml` to `path` over the HTTP-Redirect binding.
    pub async fn send_redirect(
        &self,
        path: &str,
        xml: &str,
        relay_state: Option<&str>,
        cookie: Option<&str>,
    ) -> anyhow::Result<Response> {
        let mut request = self
            .client
            .get(self.url(path))
            .query(&redirect_params(xml, relay_state)?);
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        Ok(request.send().await?)
    }
}

/// The `name=value` part of the `session_id` cookie the response sets.
pub fn session_cookie(response: &Response) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| value.split(';').next())
        .find(|pair| pair.starts_with("session_id="))
        .map(str::to_string)
}

/// Polls `/health` until the server answers, for up to five seconds.
async fn wait_for_server(client: &Client, base_url: &str) -> anyhow::Result<()> {
    let health_url = format!("{base_url}/health");

    for _ in 0..50 {
        let ready = client
            .get(&health_url)
            .send()
            .await
            .is_ok_and(|response| response.status().is_success());
        if ready {
            return Ok(());
        }
        sleep(Duration::from_millis(100)).await;
    }

    anyhow::bail!("identity provider at {base_url} never became healthy")
}
