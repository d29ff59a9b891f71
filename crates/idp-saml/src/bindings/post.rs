//! HTTP-POST binding for outbound responses.

use base64::Engine;

use super::SamlMessageType;

/// HTTP-POST binding encoder.
pub struct HttpPostBinding;

impl HttpPostBinding {
    /// Base64 of the serialized response, without compression.
    #[must_use]
    pub fn encode_message(xml: &str) -> String {
        base64::engine::general_purpose::STANDARD.encode(xml)
    }

    /// Renders an HTML page that auto-submits `xml` as `SAMLResponse` (and
    /// `RelayState` when given) to `destination`.
    #[must_use]
    pub fn encode_response(xml: &str, destination: &str, relay_state: Option<&str>) -> String {
        let encoded = Self::encode_message(xml);
        let param_name = SamlMessageType::Response.form_param();

        let relay_state_input = relay_state
            .map(|rs| {
                format!(
                    r#"<input type="hidden" name="RelayState" value="{}"/>"#,
                    html_escape(rs)
                )
            })
            .unwrap_or_default();

        format!(
            concat!(
                "<!DOCTYPE html>\n",
                r#"<html><head><meta charset="UTF-8"><title>Working...</title></head>"#,
                r#"<body onload="document.forms[0].submit()">"#,
                r#"<form method="post" action="{action}">"#,
                r#"<input type="hidden" name="{param}" value="{value}"/>"#,
                "{relay_state}",
                r#"<noscript><p>Script is off; press Continue to finish signing in.</p>"#,
                r#"<input type="submit" value="Continue"/></noscript>"#,
                "</form></body></html>",
            ),
            action = html_escape(destination),
            param = param_name,
            value = encoded,
            relay_state = relay_state_input,
        )
    }
}

/// Escapes HTML special characters.
#[must_use]
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
