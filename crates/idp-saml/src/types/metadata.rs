//! Identity provider metadata.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::time::saml_timestamp;
use crate::xml::escape;

use super::{HTTP_REDIRECT_BINDING, MD_NS, NAMEID_FORMAT_UNSPECIFIED, SAMLP_NS, XMLDSIG_NS};

/// How long published metadata stays valid, in days.
pub const METADATA_VALIDITY_DAYS: i64 = 365;

/// Identity provider metadata. Regenerated on every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdpMetadata {
    /// Entity ID of the identity provider.
    pub entity_id: String,
    /// Single sign-on endpoint.
    pub signon_url: String,
    /// Single logout endpoint.
    pub logout_url: String,
    /// Expiry of this metadata document.
    pub valid_until: DateTime<Utc>,
    /// Base64 certificate body, PEM armor removed.
    pub cert: String,
}

impl IdpMetadata {
    /// Serializes the metadata document.
    #[must_use]
    pub fn to_xml(&self) -> String {
        format!(
            concat!(
                r#"<EntityDescriptor xmlns="{md}" validUntil="{valid_until}" entityID="{entity_id}">"#,
                r#"<IDPSSODescriptor WantAuthnRequestsSigned="false" protocolSupportEnumeration="{samlp}">"#,
                r#"<KeyDescriptor use="signing">"#,
                r#"<ds:KeyInfo xmlns:ds="{ds}"><ds:X509Data><ds:X509Certificate>{cert}</ds:X509Certificate></ds:X509Data></ds:KeyInfo>"#,
                "</KeyDescriptor>",
                r#"<SingleLogoutService Binding="{binding}" Location="{logout_url}"/>"#,
                "<NameIDFormat>{name_id_format}</NameIDFormat>",
                r#"<SingleSignOnService Binding="{binding}" Location="{signon_url}"/>"#,
                "</IDPSSODescriptor>",
                "</EntityDescriptor>",
            ),
            md = MD_NS,
            samlp = SAMLP_NS,
            ds = XMLDSIG_NS,
            binding = HTTP_REDIRECT_BINDING,
            name_id_format = NAMEID_FORMAT_UNSPECIFIED,
            valid_until = saml_timestamp(self.valid_until),
            entity_id = escape(&self.entity_id),
            cert = escape(&self.cert),
            logout_url = escape(&self.logout_url),
            signon_url = escape(&self.signon_url),
        )
    }
}

/// Builds metadata from explicit endpoints.
///
/// `cert` is the certificate body with its PEM armor already removed, see
/// [`strip_pem_armor`].
#[must_use]
pub fn build_metadata(
    entity_id: &str,
    signon_url: &str,
    logout_url: &str,
    valid_until: DateTime<Utc>,
    cert: &str,
) -> IdpMetadata {
    IdpMetadata {
        entity_id: entity_id.to_string(),
        signon_url: signon_url.to_string(),
        logout_url: logout_url.to_string(),
        valid_until,
        cert: cert.to_string(),
    }
}

/// Expiry for metadata published at `now`.
#[must_use]
pub fn metadata_valid_until(now: DateTime<Utc>) -> DateTime<Utc> {
    now + Duration::days(METADATA_VALIDITY_DAYS)
}

/// Joins an absolute path onto the origin of `base_url`.
///
/// Falls back to plain concatenation when `base_url` does not parse.
#[must_use]
pub fn join_url(base_url: &str, path: &str) -> String {
    match url::Url::parse(base_url).and_then(|base| base.join(path)) {
        Ok(joined) => joined.to_string(),
        Err(_) => format!("{}{path}", base_url.trim_end_matches('/')),
    }
}

/// Removes PEM armor: trims every line, drops the first and last, joins the
/// rest.
#[must_use]
pub fn strip_pem_armor(pem: &str) -> String {
    let lines: Vec<&str> = pem
        .trim()
        .lines()
        .map(str::trim)
        .collect();
    if lines.len() < 2 {
        return String::new();
    }
    lines[1..lines.len() - 1].concat()
}
