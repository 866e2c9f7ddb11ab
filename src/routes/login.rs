// routes/login.rs
// GET /login renders the form; POST /login exchanges credentials for a session.

use std::sync::Arc;

use askama::Template;
use axum::{
    extract::{Form, State},
    http::{HeaderMap, header::SET_COOKIE},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::{info, warn};

use crate::models::UserRecord;
use crate::routes::helpers::{Nav, page};
use crate::session::{Identity, IdentityProvider, login_cookies};
use crate::state::{ApiError, AppState, login as api_login};

#[derive(Template)]
#[template(path = "login.html")]
struct LoginTemplate {
    nav: Nav,
    username: String,
    errors: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

fn login_page(username: &str, errors: Option<String>) -> Response {
    page(LoginTemplate {
        nav: Nav::anonymous(),
        username: username.to_string(),
        errors,
    })
}

pub async fn login_form(headers: HeaderMap) -> Response {
    let mut provider = IdentityProvider::new();
    if let Identity::Authenticated(_) = provider.restore_session(&headers) {
        return Redirect::to("/").into_response();
    }
    login_page("", None)
}

pub async fn login(
    State(st): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(body): Form<LoginForm>,
) -> Response {
    let username = body.username.trim();
    if username.is_empty() || body.password.is_empty() {
        return login_page(username, Some("Username and password are required".into()));
    }

    let mut provider = IdentityProvider::new();
    provider.restore_session(&headers);
    let api = match provider.api(&st.api) {
        Ok(api) => api,
        Err(err) => return login_page(username, Some(err.user_message())),
    };

    match api_login(&api, username, &body.password).await {
        Ok(granted) => {
            let record = UserRecord {
                user_id: granted.user_id,
                sub: username.to_string(),
                role: granted.role,
            };
            info!(user_id = record.user_id, role = record.role.as_str(), "login succeeded");
            let mut response = Redirect::to("/").into_response();
            for cookie in login_cookies(
                &granted.access_token,
                &record,
                st.config.session_ttl_seconds,
            ) {
                response.headers_mut().append(SET_COOKIE, cookie);
            }
            response
        }
        Err(err) => {
            warn!(error = %err, "login rejected");
            let message = match err {
                ApiError::Unauthenticated | ApiError::Api { status: 400 | 401, .. } => {
                    "Invalid username or password".to_string()
                }
                other => other.user_message(),
            };
            login_page(username, Some(message))
        }
    }
}
