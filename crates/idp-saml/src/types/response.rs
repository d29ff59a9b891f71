//! AuthnResponse construction.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SamlResult;
use crate::session::User;
use crate::signature::{DocumentSigner, SIGNATURE_PLACEHOLDER};
use crate::time::saml_timestamp;
use crate::xml::escape;

use super::{
    new_id, status_codes, AuthnRequest, AUTHN_CONTEXT_PASSWORD, BEARER_METHOD,
    NAMEID_FORMAT_UNSPECIFIED, SAMLP_NS, SAML_NS,
};

/// How long an issued assertion stays valid, in seconds.
pub const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// The parts of an AuthnRequest a response is built from.
///
/// The login form carries these three values across the password prompt, so
/// they are kept apart from the full request record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseContext {
    /// `ID` of the request being answered.
    pub request_id: String,
    /// Assertion consumer service URL.
    pub destination: String,
    /// Entity ID of the requesting service provider.
    pub sp_issuer: String,
}

impl From<&AuthnRequest> for ResponseContext {
    fn from(request: &AuthnRequest) -> Self {
        Self {
            request_id: request.id.clone(),
            destination: request.assertion_consumer_service_url.clone(),
            sp_issuer: request.issuer.clone(),
        }
    }
}

/// Successful authentication response carrying one assertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthnResponse {
    /// `Response` identifier.
    pub id: String,
    /// `Assertion` identifier; the signature references it.
    pub assertion_id: String,
    /// When the response and assertion were issued.
    pub issue_instant: DateTime<Utc>,
    /// Assertion consumer service URL; also the confirmation recipient.
    pub destination: String,
    /// `ID` of the request being answered.
    pub in_response_to: String,
    /// Entity ID of the identity provider.
    pub issuer: String,
    /// Status code URI.
    pub status_code: String,
    /// `NameID` format URI.
    pub subject_name_id_format: String,
    /// `NameID` value: the username.
    pub subject_name_id: String,
    /// Bearer confirmation expiry.
    pub subject_not_on_or_after: DateTime<Utc>,
    /// Start of the validity window.
    pub conditions_not_before: DateTime<Utc>,
    /// End of the validity window.
    pub conditions_not_on_or_after: DateTime<Utc>,
    /// Audience the assertion is restricted to: the service provider.
    pub audience_restriction: String,
    /// Released attributes, one value each, in order.
    pub attributes: Vec<(String, String)>,
    /// When the user authenticated.
    pub authn_instant: DateTime<Utc>,
    /// Authentication context class URI.
    pub authn_context_class_ref: String,
    /// Session index the service provider echoes back on logout.
    pub session_index: String,
}

/// Builds the response for `user` answering `context`, issued at `now`.
#[must_use]
pub fn build_authn_response(
    idp_issuer: &str,
    context: &ResponseContext,
    user: &User,
    session_index: String,
    now: DateTime<Utc>,
) -> AuthnResponse {
    AuthnResponse {
        id: new_id(),
        assertion_id: new_id(),
        issue_instant: now,
        destination: context.destination.clone(),
        in_response_to: context.request_id.clone(),
        issuer: idp_issuer.to_string(),
        status_code: status_codes::SUCCESS.to_string(),
        subject_name_id_format: NAMEID_FORMAT_UNSPECIFIED.to_string(),
        subject_name_id: user.username.clone(),
        subject_not_on_or_after: now + Duration::seconds(ASSERTION_LIFETIME_SECS),
        conditions_not_before: now,
        conditions_not_on_or_after: now + Duration::seconds(ASSERTION_LIFETIME_SECS),
        audience_restriction: context.sp_issuer.clone(),
        attributes: user.attributes.clone(),
        authn_instant: now,
        authn_context_class_ref: AUTHN_CONTEXT_PASSWORD.to_string(),
        session_index,
    }
}

impl AuthnResponse {
    /// Serializes the response with [`SIGNATURE_PLACEHOLDER`] where the
    /// assertion signature goes.
    #[must_use]
    pub fn to_xml(&self) -> String {
        let attribute_statement = if self.attributes.is_empty() {
            String::new()
        } else {
            let attributes: String = self
                .attributes
                .iter()
                .map(|(name, value)| {
                    format!(
                        r#"<Attribute Name="{}"><AttributeValue>{}</AttributeValue></Attribute>"#,
                        escape(name),
                        escape(value)
                    )
                })
                .collect();
            format!("<AttributeStatement>{attributes}</AttributeStatement>")
        };

        let issue_instant = saml_timestamp(self.issue_instant);

        format!(
            concat!(
                r#"<saml2p:Response xmlns:saml2p="{samlp}" ID="{id}" Version="2.0" InResponseTo="{irt}" IssueInstant="{instant}" Destination="{dest}">"#,
                r#"<Issuer xmlns="{saml}">{issuer}</Issuer>"#,
                r#"<saml2p:Status><saml2p:StatusCode Value="{status}"/></saml2p:Status>"#,
                r#"<Assertion xmlns="{saml}" ID="{assertion_id}" Version="2.0" IssueInstant="{instant}">"#,
                "<Issuer>{issuer}</Issuer>",
                "{signature}",
                "<Subject>",
                r#"<NameID Format="{name_id_format}">{name_id}</NameID>"#,
                r#"<SubjectConfirmation Method="{bearer}">"#,
                r#"<SubjectConfirmationData InResponseTo="{irt}" NotOnOrAfter="{subject_noa}" Recipient="{dest}"/>"#,
                "</SubjectConfirmation>",
                "</Subject>",
                r#"<Conditions NotBefore="{not_before}" NotOnOrAfter="{conditions_noa}">"#,
                "<AudienceRestriction><Audience>{audience}</Audience></AudienceRestriction>",
                "</Conditions>",
                "{attribute_statement}",
                r#"<AuthnStatement AuthnInstant="{authn_instant}" SessionIndex="{session_index}">"#,
                "<AuthnContext><AuthnContextClassRef>{class_ref}</AuthnContextClassRef></AuthnContext>",
                "</AuthnStatement>",
                "</Assertion>",
                "</saml2p:Response>",
            ),
            samlp = SAMLP_NS,
            saml = SAML_NS,
            id = escape(&self.id),
            assertion_id = escape(&self.assertion_id),
            irt = escape(&self.in_response_to),
            instant = issue_instant,
            dest = escape(&self.destination),
            issuer = escape(&self.issuer),
            status = escape(&self.status_code),
            signature = SIGNATURE_PLACEHOLDER,
            name_id_format = escape(&self.subject_name_id_format),
            name_id = escape(&self.subject_name_id),
            bearer = BEARER_METHOD,
            subject_noa = saml_timestamp(self.subject_not_on_or_after),
            not_before = saml_timestamp(self.conditions_not_before),
            conditions_noa = saml_timestamp(self.conditions_not_on_or_after),
            audience = escape(&self.audience_restriction),
            attribute_statement = attribute_statement,
            authn_instant = saml_timestamp(self.authn_instant),
            session_index = escape(&self.session_index),
            class_ref = escape(&self.authn_context_class_ref),
        )
    }

    /// Serializes the response and signs its assertion.
    ///
    /// # Errors
    ///
    /// Returns whatever error `signer` reports.
    pub fn to_signed_xml(&self, signer: &dyn DocumentSigner) -> SamlResult<String> {
        signer.sign_document(&self.to_xml(), &self.assertion_id)
    }
}
