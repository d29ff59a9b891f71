//! SAML endpoint integration tests.
//!
//! Tests for metadata, single sign-on and single logout.

use chrono::{Duration, Utc};

use idp_integration_tests::{
    authn_request_xml, form_action, input_value, logout_request_xml, posted_message, ACS_URL,
    SP_ISSUER,
};

use crate::common::{session_cookie, TestEnv, CERT_PEM};

const SUCCESS: &str = "urn:oasis:names:tc:SAML:2.0:status:Success";
const REQUEST_DENIED: &str = "urn:oasis:names:tc:SAML:2.0:status:RequestDenied";

/// Tests that the metadata endpoint describes this identity provider.
#[tokio::test]
async fn test_metadata_endpoint() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;

    let response = env.client.get(env.url("/metadata.xml")).send().await?;
    assert_eq!(response.status().as_u16(), 200);

    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    assert!(
        content_type.contains("xml"),
        "Expected XML content type, got {}",
        content_type
    );

    let body = response.text().await?;
    assert!(
        body.contains(r#"entityID="http://example.com/saml""#),
        "Metadata should carry the entity ID"
    );
    assert!(
        body.contains(&format!(r#"Location="{}/signin""#, env.base_url)),
        "SingleSignOnService should point at /signin"
    );
    assert!(
        body.contains(&format!(r#"Location="{}/logout""#, env.base_url)),
        "SingleLogoutService should point at /logout"
    );

    let cert_body = idp_saml::strip_pem_armor(CERT_PEM);
    assert!(
        body.contains(&format!("<ds:X509Certificate>{cert_body}</ds:X509Certificate>")),
        "Metadata should embed the signing certificate without PEM armor"
    );

    Ok(())
}

/// Tests that an anonymous sign-in request shows the login page carrying the
/// request along.
#[tokio::test]
async fn test_signin_without_session_shows_login() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let request = authn_request_xml("_anon", Utc::now(), &env.url("/signin"));

    let response = env.send_redirect("/signin", &request, None, None).await?;
    assert_eq!(response.status().as_u16(), 200);

    let body = response.text().await?;
    assert!(!body.contains("SAMLResponse"), "No response before sign-in");
    assert_eq!(input_value(&body, "saml_request_id").as_deref(), Some("_anon"));
    assert_eq!(input_value(&body, "destination").as_deref(), Some(ACS_URL));
    assert_eq!(input_value(&body, "request_issuer").as_deref(), Some(SP_ISSUER));
    assert_eq!(input_value(&body, "relay_state").as_deref(), Some(""));

    Ok(())
}

/// Tests that RelayState survives the detour through the login page.
#[tokio::test]
async fn test_signin_without_session_keeps_relay_state() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let request = authn_request_xml("_relay", Utc::now(), &env.url("/signin"));

    let response = env
        .send_redirect("/signin", &request, Some("https://app.example.com/home"), None)
        .await?;
    assert_eq!(response.status().as_u16(), 200);

    let body = response.text().await?;
    assert_eq!(
        input_value(&body, "relay_state").as_deref(),
        Some("https://app.example.com/home")
    );

    Ok(())
}

/// Tests that a signed-in browser gets a signed response straight away.
#[tokio::test]
async fn test_signin_with_session_posts_signed_response() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let cookie = env.sign_in("taylorswift", "all2well").await?;
    let request = authn_request_xml("_known", Utc::now(), &env.url("/signin"));

    let response = env
        .send_redirect("/signin", &request, Some("state-123"), Some(&cookie))
        .await?;
    assert_eq!(response.status().as_u16(), 200);

    let body = response.text().await?;
    assert_eq!(form_action(&body).as_deref(), Some(ACS_URL));
    assert_eq!(input_value(&body, "RelayState").as_deref(), Some("state-123"));

    let xml = posted_message(&body)?;
    assert!(xml.contains(r#"InResponseTo="_known""#), "Response should answer the request");
    assert!(xml.contains(">taylorswift</NameID>"), "NameID should be the signed-in user");
    assert!(
        xml.contains(&format!("<Audience>{SP_ISSUER}</Audience>")),
        "Audience should be the request issuer"
    );
    assert!(
        !xml.contains("<AttributeStatement>"),
        "A user without attributes gets no AttributeStatement"
    );

    let verified = idp_saml::verify(&xml, CERT_PEM)?;
    assert!(verified.reference_id.starts_with('_'));

    Ok(())
}

/// Tests that no RelayState input is emitted when the request had none.
#[tokio::test]
async fn test_signin_with_session_without_relay_state() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let cookie = env.sign_in("taylorswift", "all2well").await?;
    let request = authn_request_xml("_norelay", Utc::now(), &env.url("/signin"));

    let response = env
        .send_redirect("/signin", &request, None, Some(&cookie))
        .await?;
    let body = response.text().await?;
    assert!(input_value(&body, "SAMLResponse").is_some());
    assert!(input_value(&body, "RelayState").is_none());

    Ok(())
}

/// Tests that user attributes are released in the assertion.
#[tokio::test]
async fn test_signin_releases_attributes() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let cookie = env.sign_in("davidbowie", "starman").await?;
    let request = authn_request_xml("_attrs", Utc::now(), &env.url("/signin"));

    let response = env
        .send_redirect("/signin", &request, None, Some(&cookie))
        .await?;
    let xml = posted_message(&response.text().await?)?;
    assert!(
        xml.contains(
            r#"<AttributeStatement><Attribute Name="email"><AttributeValue>bowie@example.com</AttributeValue></Attribute></AttributeStatement>"#
        ),
        "AttributeStatement should carry the configured attribute"
    );
    idp_saml::verify(&xml, CERT_PEM)?;

    Ok(())
}

/// Tests that a request older than ten minutes is refused.
#[tokio::test]
async fn test_stale_signin_rejected() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let request = authn_request_xml(
        "_stale",
        Utc::now() - Duration::minutes(11),
        &env.url("/signin"),
    );

    let response = env.send_redirect("/signin", &request, None, None).await?;
    assert_eq!(response.status().as_u16(), 400);
    assert_eq!(response.text().await?, "Out of date");

    Ok(())
}

/// Tests that undecodable and structurally wrong requests are refused.
#[tokio::test]
async fn test_malformed_signin_rejected() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;

    let response = env
        .client
        .get(env.url("/signin"))
        .query(&[("SAMLRequest", "this is not deflated base64")])
        .send()
        .await?;
    assert_eq!(response.status().as_u16(), 400);

    let logout = logout_request_xml(
        "_wrong",
        Utc::now(),
        Utc::now() + Duration::minutes(5),
        &env.url("/signin"),
        "taylorswift",
    );
    let response = env.send_redirect("/signin", &logout, None, None).await?;
    assert_eq!(response.status().as_u16(), 400);
    assert_eq!(response.text().await?, "Not an authn request.");

    Ok(())
}

/// Tests that logging out the signed-in user succeeds and ends the session.
#[tokio::test]
async fn test_logout_success() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let cookie = env.sign_in("taylorswift", "all2well").await?;
    let now = Utc::now();
    let request = logout_request_xml(
        "_slo1",
        now,
        now + Duration::minutes(5),
        &env.url("/logout"),
        "taylorswift",
    );

    let response = env
        .send_redirect("/logout", &request, Some("bye"), Some(&cookie))
        .await?;
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(
        session_cookie(&response).as_deref(),
        Some("session_id="),
        "Session cookie should be cleared"
    );

    let body = response.text().await?;
    assert_eq!(form_action(&body).as_deref(), Some(SP_ISSUER));
    assert_eq!(input_value(&body, "RelayState").as_deref(), Some("bye"));

    let xml = posted_message(&body)?;
    assert!(xml.contains(r#"InResponseTo="_slo1""#));
    assert!(xml.contains(&format!(r#"Value="{SUCCESS}""#)));

    Ok(())
}

/// Tests that logging out someone other than the signed-in user is denied.
#[tokio::test]
async fn test_logout_denied() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let now = Utc::now();
    let request = logout_request_xml(
        "_slo2",
        now,
        now + Duration::minutes(5),
        &env.url("/logout"),
        "davidbowie",
    );

    // Anonymous
    let response = env.send_redirect("/logout", &request, None, None).await?;
    assert_eq!(response.status().as_u16(), 200);
    let xml = posted_message(&response.text().await?)?;
    assert!(xml.contains(&format!(r#"Value="{REQUEST_DENIED}""#)));

    // Signed in as somebody else
    let cookie = env.sign_in("taylorswift", "all2well").await?;
    let response = env
        .send_redirect("/logout", &request, None, Some(&cookie))
        .await?;
    assert!(session_cookie(&response).is_none(), "Session must survive");
    let xml = posted_message(&response.text().await?)?;
    assert!(xml.contains(&format!(r#"Value="{REQUEST_DENIED}""#)));

    Ok(())
}

/// Tests that a configured logout URL overrides the request issuer.
#[tokio::test]
async fn test_logout_uses_configured_destination() -> anyhow::Result<()> {
    let env = TestEnv::with_config(|config| {
        config.logout_url = Some("https://sp.example.com/saml/slo".to_string());
    })
    .await?;
    let now = Utc::now();
    let request = logout_request_xml(
        "_slo3",
        now,
        now + Duration::minutes(5),
        &env.url("/logout"),
        "taylorswift",
    );

    let response = env.send_redirect("/logout", &request, None, None).await?;
    let body = response.text().await?;
    assert_eq!(
        form_action(&body).as_deref(),
        Some("https://sp.example.com/saml/slo")
    );
    let xml = posted_message(&body)?;
    assert!(xml.contains(r#"Destination="https://sp.example.com/saml/slo""#));

    Ok(())
}

/// Tests that an expired logout request is refused even when freshly issued.
#[tokio::test]
async fn test_expired_logout_rejected() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let now = Utc::now();
    let request = logout_request_xml(
        "_slo4",
        now - Duration::minutes(2),
        now - Duration::minutes(1),
        &env.url("/logout"),
        "taylorswift",
    );

    let response = env.send_redirect("/logout", &request, None, None).await?;
    assert_eq!(response.status().as_u16(), 400);
    assert_eq!(response.text().await?, "Out of date (not on or after)");

    Ok(())
}

/// Tests that a stale logout request is refused.
#[tokio::test]
async fn test_stale_logout_rejected() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let now = Utc::now();
    let request = logout_request_xml(
        "_slo5",
        now - Duration::minutes(30),
        now + Duration::minutes(30),
        &env.url("/logout"),
        "taylorswift",
    );

    let response = env.send_redirect("/logout", &request, None, None).await?;
    assert_eq!(response.status().as_u16(), 400);
    assert_eq!(response.text().await?, "Out of date");

    Ok(())
}
