//! Login page integration tests.
//!
//! Tests for the browser-facing login, sign-out and landing pages.

use idp_integration_tests::{form_action, input_value, posted_message, ACS_URL, SP_ISSUER};

use crate::common::{session_cookie, TestEnv, CERT_PEM};

/// Tests the full SAML login: credentials plus the carried request produce a
/// signed response for the service provider.
#[tokio::test]
async fn test_saml_login_posts_response() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;

    let response = env
        .client
        .post(env.url("/login"))
        .form(&[
            ("username", "taylorswift"),
            ("password", "all2well"),
            ("saml_request_id", "_c0bce021-fa0a-4af6-a1aa-5e4b33e1b2e4"),
            ("destination", ACS_URL),
            ("request_issuer", SP_ISSUER),
            ("relay_state", ""),
        ])
        .send()
        .await?;

    assert_eq!(response.status().as_u16(), 200);
    assert!(
        session_cookie(&response).is_some(),
        "Signing in should start a session"
    );

    let body = response.text().await?;
    assert!(body.contains("SAMLResponse"), "Page should post a SAMLResponse");
    assert!(body.contains(ACS_URL), "Page should post to the ACS URL");
    assert_eq!(form_action(&body).as_deref(), Some(ACS_URL));
    assert!(input_value(&body, "RelayState").is_none());

    let xml = posted_message(&body)?;
    assert!(xml.contains(r#"InResponseTo="_c0bce021-fa0a-4af6-a1aa-5e4b33e1b2e4""#));
    idp_saml::verify(&xml, CERT_PEM)?;

    Ok(())
}

/// Tests that a wrong password re-renders the form with the request intact.
#[tokio::test]
async fn test_saml_login_wrong_password() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;

    let response = env
        .client
        .post(env.url("/login"))
        .form(&[
            ("username", "taylorswift"),
            ("password", "wrong"),
            ("saml_request_id", "_c0bce021-fa0a-4af6-a1aa-5e4b33e1b2e4"),
            ("destination", ACS_URL),
            ("request_issuer", SP_ISSUER),
            ("relay_state", "keep-me"),
        ])
        .send()
        .await?;

    assert_eq!(response.status().as_u16(), 200);
    assert!(session_cookie(&response).is_none(), "No session on failure");

    let body = response.text().await?;
    assert!(body.contains("Invalid username or password."));
    assert!(!body.contains("SAMLResponse"));
    assert_eq!(
        input_value(&body, "saml_request_id").as_deref(),
        Some("_c0bce021-fa0a-4af6-a1aa-5e4b33e1b2e4")
    );
    assert_eq!(input_value(&body, "destination").as_deref(), Some(ACS_URL));
    assert_eq!(input_value(&body, "request_issuer").as_deref(), Some(SP_ISSUER));
    assert_eq!(input_value(&body, "relay_state").as_deref(), Some("keep-me"));

    Ok(())
}

/// Tests that an unknown user gets the same message as a wrong password.
#[tokio::test]
async fn test_unknown_user_rejected() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;

    let response = env
        .client
        .post(env.url("/login"))
        .form(&[("username", "nobody"), ("password", "all2well")])
        .send()
        .await?;

    assert_eq!(response.status().as_u16(), 200);
    assert!(response.text().await?.contains("Invalid username or password."));

    Ok(())
}

/// Tests that a plain login redirects home with a session cookie.
#[tokio::test]
async fn test_plain_login_redirects_home() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;

    let response = env
        .client
        .post(env.url("/login"))
        .form(&[("username", "taylorswift"), ("password", "all2well")])
        .send()
        .await?;

    assert_eq!(response.status().as_u16(), 302);
    assert_eq!(
        response
            .headers()
            .get("location")
            .and_then(|v| v.to_str().ok()),
        Some("/")
    );

    let set_cookie = response
        .headers()
        .get("set-cookie")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    assert!(
        set_cookie.contains("Max-Age=3600"),
        "Session cookie should last an hour, got {}",
        set_cookie
    );

    let cookie = session_cookie(&response).unwrap_or_default();
    let home = env
        .client
        .get(env.url("/"))
        .header("cookie", cookie)
        .send()
        .await?
        .text()
        .await?;
    assert!(home.contains("taylorswift"), "Landing page should greet the user");

    Ok(())
}

/// Tests that the login page lists users only when configured to.
#[tokio::test]
async fn test_login_page_show_users() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let body = env.client.get(env.url("/login")).send().await?.text().await?;
    assert!(body.contains(r#"name="username""#));
    assert!(!body.contains("taylorswift"), "Users hidden by default");

    let env = TestEnv::with_config(|config| config.show_users = true).await?;
    let body = env.client.get(env.url("/login")).send().await?.text().await?;
    assert!(body.contains("taylorswift"));
    assert!(body.contains("davidbowie"));

    Ok(())
}

/// Tests that the sign-out form ends the session.
#[tokio::test]
async fn test_logout_form_clears_session() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let cookie = env.sign_in("taylorswift", "all2well").await?;

    let response = env
        .client
        .post(env.url("/logout-form"))
        .header("cookie", &cookie)
        .send()
        .await?;

    assert_eq!(response.status().as_u16(), 302);
    assert_eq!(session_cookie(&response).as_deref(), Some("session_id="));

    let home = env.client.get(env.url("/")).send().await?.text().await?;
    assert!(home.contains(r#"href="/login""#), "Anonymous home offers sign-in");

    Ok(())
}
