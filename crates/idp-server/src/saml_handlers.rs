//! SAML protocol endpoints.
//!
//! `/signin` answers an AuthnRequest directly when the browser already has a
//! session and otherwise shows the login page carrying the request along in
//! hidden fields. `/logout` always answers with a LogoutResponse.

use axum::{
    extract::{Query, State},
    http::{
        header::{CONTENT_TYPE, SET_COOKIE},
        StatusCode,
    },
    response::{Html, IntoResponse, Response},
};
use chrono::Utc;
use serde::Deserialize;

use idp_saml::bindings::HttpPostBinding;
use idp_saml::{
    build_authn_response, build_logout_response, build_metadata, metadata_valid_until, session,
    status_codes, strip_pem_armor, validity, AuthnRequest, LogoutRequest, ResponseContext,
    SamlError, SamlResult, User,
};

use crate::session::{clear_session_cookie, CurrentUser};
use crate::state::AppState;
use crate::ui::{self, SamlFields};

/// Query parameters of an HTTP-Redirect binding request.
#[derive(Debug, Deserialize)]
pub struct RedirectParams {
    /// Deflated, base64 encoded request.
    #[serde(rename = "SAMLRequest")]
    pub saml_request: String,
    /// Opaque SP state to hand back.
    #[serde(rename = "RelayState")]
    pub relay_state: Option<String>,
}

/// `GET /metadata.xml`
pub async fn metadata(State(state): State<AppState>) -> Response {
    let config = state.config();
    let metadata = build_metadata(
        &config.entity_id,
        &config.signon_url(),
        &config.logout_endpoint_url(),
        metadata_valid_until(Utc::now()),
        &strip_pem_armor(&config.cert_pem),
    );
    ([(CONTENT_TYPE, "text/xml")], metadata.to_xml()).into_response()
}

/// `GET /signin`
pub async fn signin(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<RedirectParams>,
) -> Response {
    let request = match AuthnRequest::from_redirect(&params.saml_request)
        .and_then(|request| validity::check_authn_request(&request, Utc::now()).map(|()| request))
    {
        Ok(request) => request,
        Err(err) => return error_response(&err),
    };

    tracing::debug!(
        request_id = %request.id,
        issuer = %request.issuer,
        signed_in = user.is_some(),
        "authn request accepted"
    );

    let relay_state = params.relay_state.filter(|rs| !rs.is_empty());
    match user {
        Some(user) => saml_post_response(
            &state,
            &ResponseContext::from(&request),
            &user,
            relay_state.as_deref(),
        ),
        None => ui::render_login(&state, None, SamlFields::from_request(&request, relay_state)),
    }
}

/// `GET /logout`
pub async fn logout(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<RedirectParams>,
) -> Response {
    let request = match LogoutRequest::from_redirect(&params.saml_request)
        .and_then(|request| validity::check_logout_request(&request, Utc::now()).map(|()| request))
    {
        Ok(request) => request,
        Err(err) => return error_response(&err),
    };

    let signed_out = user
        .as_ref()
        .is_some_and(|user| user.username == request.name_id);
    let status = if signed_out {
        status_codes::SUCCESS
    } else {
        status_codes::REQUEST_DENIED
    };

    let destination = state
        .config
        .logout_url
        .clone()
        .unwrap_or_else(|| request.issuer.clone());

    tracing::info!(
        request_id = %request.id,
        name_id = %request.name_id,
        signed_out,
        "answering logout request"
    );

    let response = build_logout_response(
        &state.config.entity_id,
        &destination,
        &request.id,
        status,
        Utc::now(),
    );
    let relay_state = params.relay_state.filter(|rs| !rs.is_empty());
    let html = Html(HttpPostBinding::encode_response(
        &response.to_xml(),
        &destination,
        relay_state.as_deref(),
    ));

    if signed_out {
        ([(SET_COOKIE, clear_session_cookie())], html).into_response()
    } else {
        html.into_response()
    }
}

/// Signs a response for `user` and wraps it in the auto-submit form.
pub(crate) fn saml_post_response(
    state: &AppState,
    context: &ResponseContext,
    user: &User,
    relay_state: Option<&str>,
) -> Response {
    match signed_post_page(state, context, user, relay_state) {
        Ok(page) => page.into_response(),
        Err(err) => error_response(&err),
    }
}

/// Builds and signs the response, returning the auto-submit page.
pub(crate) fn signed_post_page(
    state: &AppState,
    context: &ResponseContext,
    user: &User,
    relay_state: Option<&str>,
) -> SamlResult<Html<String>> {
    let response = build_authn_response(
        &state.config.entity_id,
        context,
        user,
        session::new_session_index(user),
        Utc::now(),
    );
    let xml = response.to_signed_xml(state.signer.as_ref())?;

    tracing::info!(
        username = %user.username,
        sp = %context.sp_issuer,
        in_response_to = %context.request_id,
        "issuing SAML response"
    );
    Ok(Html(HttpPostBinding::encode_response(
        &xml,
        &response.destination,
        relay_state,
    )))
}

/// Maps a protocol error onto a plain-text HTTP response.
pub(crate) fn error_response(err: &SamlError) -> Response {
    let status =
        StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        tracing::error!(error = %err, "failed to produce SAML response");
        return (status, "Internal server error").into_response();
    }
    tracing::warn!(error = %err, "rejected SAML request");
    (status, err.to_string()).into_response()
}
