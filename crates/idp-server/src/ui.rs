//! Browser-facing pages: login, sign-out and the landing page.

use askama::Template;
use axum::{
    extract::{Form, State},
    http::{
        header::{LOCATION, SET_COOKIE},
        StatusCode,
    },
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;

use idp_saml::{session, AuthnRequest, ResponseContext, User};

use crate::saml_handlers::{error_response, signed_post_page};
use crate::session::{clear_session_cookie, session_cookie, CurrentUser};
use crate::state::AppState;

/// A pending AuthnRequest carried through the login form.
///
/// Empty strings mean "not part of a SAML flow".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SamlFields {
    /// ID of the AuthnRequest being answered.
    pub saml_request_id: String,
    /// Assertion consumer service URL.
    pub destination: String,
    /// Issuer of the AuthnRequest.
    pub request_issuer: String,
    /// RelayState to hand back.
    pub relay_state: String,
}

impl SamlFields {
    /// Captures the fields of a parsed request.
    #[must_use]
    pub fn from_request(request: &AuthnRequest, relay_state: Option<String>) -> Self {
        Self {
            saml_request_id: request.id.clone(),
            destination: request.assertion_consumer_service_url.clone(),
            request_issuer: request.issuer.clone(),
            relay_state: relay_state.unwrap_or_default(),
        }
    }

    /// The response context, when all three request fields are present.
    #[must_use]
    pub fn context(&self) -> Option<ResponseContext> {
        if self.saml_request_id.is_empty()
            || self.destination.is_empty()
            || self.request_issuer.is_empty()
        {
            return None;
        }
        Some(ResponseContext {
            request_id: self.saml_request_id.clone(),
            destination: self.destination.clone(),
            sp_issuer: self.request_issuer.clone(),
        })
    }

    fn relay_state(&self) -> Option<&str> {
        Some(self.relay_state.as_str()).filter(|rs| !rs.is_empty())
    }
}

/// Login form submission.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    /// Username.
    #[serde(default)]
    pub username: String,
    /// Password.
    #[serde(default)]
    pub password: String,
    /// Pending AuthnRequest ID.
    #[serde(default)]
    pub saml_request_id: String,
    /// Pending ACS URL.
    #[serde(default)]
    pub destination: String,
    /// Pending request issuer.
    #[serde(default)]
    pub request_issuer: String,
    /// Pending RelayState.
    #[serde(default)]
    pub relay_state: String,
}

impl LoginForm {
    fn saml_fields(&self) -> SamlFields {
        SamlFields {
            saml_request_id: self.saml_request_id.clone(),
            destination: self.destination.clone(),
            request_issuer: self.request_issuer.clone(),
            relay_state: self.relay_state.clone(),
        }
    }
}

/// Login page template.
#[derive(Template)]
#[template(path = "login.html")]
struct LoginTemplate {
    error_message: Option<String>,
    saml: SamlFields,
    show_users: bool,
    users: Vec<User>,
}

/// Landing page template.
#[derive(Template)]
#[template(path = "main.html")]
struct MainTemplate {
    username: Option<String>,
}

/// `GET /login`
pub async fn login_page(State(state): State<AppState>) -> Response {
    render_login(&state, None, SamlFields::default())
}

/// `POST /login`
pub async fn login_submit(State(state): State<AppState>, Form(form): Form<LoginForm>) -> Response {
    let saml = form.saml_fields();

    let user = match state
        .directory
        .authenticate(&form.username, &form.password)
        .await
    {
        Ok(user) => user,
        Err(err) => {
            tracing::warn!(username = %form.username, "sign-in failed");
            return render_login(&state, Some(err.to_string()), saml);
        }
    };

    tracing::info!(username = %user.username, "user signed in");
    let cookie = session_cookie(&session::session_token(&user));

    match saml.context() {
        Some(context) => match signed_post_page(&state, &context, &user, saml.relay_state()) {
            Ok(page) => ([(SET_COOKIE, cookie)], page).into_response(),
            Err(err) => error_response(&err),
        },
        None => (
            StatusCode::FOUND,
            [(LOCATION, "/".to_string()), (SET_COOKIE, cookie)],
        )
            .into_response(),
    }
}

/// `POST /logout-form`
pub async fn logout_form(CurrentUser(user): CurrentUser) -> Response {
    if let Some(user) = user {
        tracing::info!(username = %user.username, "user signed out");
    }
    (
        StatusCode::FOUND,
        [(LOCATION, "/".to_string()), (SET_COOKIE, clear_session_cookie())],
    )
        .into_response()
}

/// `GET /`
pub async fn main_page(CurrentUser(user): CurrentUser) -> Response {
    render(&MainTemplate {
        username: user.map(|user| user.username),
    })
}

/// Renders the login page, listing users when configured to.
pub(crate) fn render_login(
    state: &AppState,
    error_message: Option<String>,
    saml: SamlFields,
) -> Response {
    let show_users = state.config.show_users;
    let users = if show_users {
        state.directory.listed_users()
    } else {
        Vec::new()
    };
    render(&LoginTemplate {
        error_message,
        saml,
        show_users,
        users,
    })
}

fn render<T: Template>(template: &T) -> Response {
    match template.render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!("Failed to render template: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
        }
    }
}
