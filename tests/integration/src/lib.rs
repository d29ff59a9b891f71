//! Service-provider side helpers for the end-to-end tests.
//!
//! These build the requests a service provider would send and pick apart the
//! HTML the identity provider answers with.

use anyhow::Context;
use base64::Engine;
use chrono::{DateTime, SecondsFormat, Utc};
use idp_saml::bindings::HttpRedirectBinding;

/// Assertion consumer service URL used by the test service provider.
pub const ACS_URL: &str = "https://example.com/saml2/idpresponse";

/// Entity ID of the test service provider.
pub const SP_ISSUER: &str = "http://myissuer.com";

fn instant(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// An AuthnRequest as sent by the test service provider.
#[must_use]
pub fn authn_request_xml(id: &str, issue_instant: DateTime<Utc>, destination: &str) -> String {
    format!(
        concat!(
            r#"<saml2p:AuthnRequest xmlns:saml2p="urn:oasis:names:tc:SAML:2.0:protocol" "#,
            r#"AssertionConsumerServiceURL="{acs}" Destination="{destination}" "#,
            r#"ID="{id}" IssueInstant="{instant}" "#,
            r#"ProtocolBinding="urn:oasis:names:tc:SAML:2.0:bindings:HTTP-POST" Version="2.0">"#,
            r#"<saml2:Issuer xmlns:saml2="urn:oasis:names:tc:SAML:2.0:assertion">{issuer}</saml2:Issuer>"#,
            r#"<saml2p:NameIDPolicy AllowCreate="true" Format="urn:oasis:names:tc:SAML:1.1:nameid-format:unspecified"/>"#,
            "</saml2p:AuthnRequest>",
        ),
        acs = ACS_URL,
        destination = destination,
        id = id,
        instant = instant(issue_instant),
        issuer = SP_ISSUER,
    )
}

/// A LogoutRequest for `name_id` as sent by the test service provider.
#[must_use]
pub fn logout_request_xml(
    id: &str,
    issue_instant: DateTime<Utc>,
    not_on_or_after: DateTime<Utc>,
    destination: &str,
    name_id: &str,
) -> String {
    format!(
        concat!(
            r#"<saml2p:LogoutRequest xmlns:saml2p="urn:oasis:names:tc:SAML:2.0:protocol" "#,
            r#"Destination="{destination}" ID="{id}" IssueInstant="{instant}" "#,
            r#"NotOnOrAfter="{not_on_or_after}" Version="2.0">"#,
            r#"<saml2:Issuer xmlns:saml2="urn:oasis:names:tc:SAML:2.0:assertion">{issuer}</saml2:Issuer>"#,
            r#"<saml2:NameID xmlns:saml2="urn:oasis:names:tc:SAML:2.0:assertion" "#,
            r#"Format="urn:oasis:names:tc:SAML:2.0:nameid-format:persistent">{name_id}</saml2:NameID>"#,
            "<saml2p:SessionIndex>xyxyxyxyxy</saml2p:SessionIndex>",
            "</saml2p:LogoutRequest>",
        ),
        destination = destination,
        id = id,
        instant = instant(issue_instant),
        not_on_or_after = instant(not_on_or_after),
        issuer = SP_ISSUER,
        name_id = name_id,
    )
}

/// Query parameters carrying `xml` over the HTTP-Redirect binding.
pub fn redirect_params(xml: &str, relay_state: Option<&str>) -> anyhow::Result<Vec<(String, String)>> {
    let mut params = vec![("SAMLRequest".to_string(), HttpRedirectBinding::encode(xml)?)];
    if let Some(relay_state) = relay_state {
        params.push(("RelayState".to_string(), relay_state.to_string()));
    }
    Ok(params)
}

/// Value of the input named `name`, with HTML entities decoded.
#[must_use]
pub fn input_value(html: &str, name: &str) -> Option<String> {
    let marker = format!(r#"name="{name}" value=""#);
    let start = html.find(&marker)? + marker.len();
    let end = html[start..].find('"')?;
    Some(html_unescape(&html[start..start + end]))
}

/// Target of the first form on the page.
#[must_use]
pub fn form_action(html: &str) -> Option<String> {
    let marker = r#"action=""#;
    let start = html.find(marker)? + marker.len();
    let end = html[start..].find('"')?;
    Some(html_unescape(&html[start..start + end]))
}

/// Decodes the `SAMLResponse` carried by an auto-submit form.
pub fn posted_message(html: &str) -> anyhow::Result<String> {
    let encoded = input_value(html, "SAMLResponse").context("no SAMLResponse input in page")?;
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .context("SAMLResponse is not base64")?;
    String::from_utf8(bytes).context("SAMLResponse is not UTF-8")
}

/// Decodes the entities HTML template engines emit for attribute values.
#[must_use]
pub fn html_unescape(s: &str) -> String {
    s.replace("&#x2f;", "/")
        .replace("&#x27;", "'")
        .replace("&#39;", "'")
        .replace("&quot;", "\"")
        .replace("&#34;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_escaped_input_values() {
        let html = r#"<input type="hidden" name="destination" value="https:&#x2f;&#x2f;sp.example.com&#x2f;acs?a=1&amp;b=2">"#;
        assert_eq!(
            input_value(html, "destination").as_deref(),
            Some("https://sp.example.com/acs?a=1&b=2")
        );
        assert!(input_value(html, "relay_state").is_none());
    }

    #[test]
    fn generated_requests_parse() {
        let now = Utc::now();
        let request =
            idp_saml::parse_authn_request(&authn_request_xml("_a", now, "http://localhost/signin"))
                .unwrap();
        assert_eq!(request.issuer, SP_ISSUER);
        assert_eq!(request.assertion_consumer_service_url, ACS_URL);

        let logout = idp_saml::parse_logout_request(&logout_request_xml(
            "_b",
            now,
            now,
            "http://localhost/logout",
            "taylorswift",
        ))
        .unwrap();
        assert_eq!(logout.name_id, "taylorswift");
    }
}
