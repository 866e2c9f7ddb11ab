// session.rs
// Identity restored from cookies, the route guard, and the extractor handlers
// use to reach the API with the user's credential.

use axum::{
    extract::{FromRequestParts, Request},
    http::{HeaderMap, HeaderValue, StatusCode, header::COOKIE, request::Parts},
    middleware::Next,
    response::{Html, IntoResponse, Redirect, Response},
};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use futures::future::BoxFuture;
use tracing::{debug, warn};

use crate::models::UserRecord;
use crate::state::{ApiClient, ApiError, AppState};

pub const SESSION_COOKIE_NAME: &str = "session";
pub const USER_COOKIE_NAME: &str = "session_user";

#[derive(Clone, Debug)]
pub struct SessionData {
    pub user: UserRecord,
    pub token: String,
}

#[derive(Clone, Debug, Default)]
pub enum Identity {
    /// Nothing has been read from the request yet.
    #[default]
    Loading,
    Anonymous,
    Authenticated(SessionData),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    Placeholder,
    RedirectToLogin,
    Allow,
}

pub fn route_guard(identity: &Identity) -> Guard {
    match identity {
        Identity::Loading => Guard::Placeholder,
        Identity::Anonymous => Guard::RedirectToLogin,
        Identity::Authenticated(_) => Guard::Allow,
    }
}

#[derive(Debug, Default)]
pub struct IdentityProvider {
    identity: Identity,
}

impl IdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn into_identity(self) -> Identity {
        self.identity
    }

    /// Reads both cookies. A credential without a readable user record (or the
    /// reverse) leaves the visitor anonymous.
    pub fn restore_session(&mut self, headers: &HeaderMap) -> &Identity {
        let tokens = extract_cookies(headers, SESSION_COOKIE_NAME);
        let user = extract_cookies(headers, USER_COOKIE_NAME)
            .iter()
            .find_map(|raw| decode_user(raw));

        self.identity = match (tokens.into_iter().find(|t| !t.is_empty()), user) {
            (Some(token), Some(user)) => Identity::Authenticated(SessionData { user, token }),
            (Some(_), None) => {
                warn!("session cookie present but user record unreadable");
                Identity::Anonymous
            }
            _ => Identity::Anonymous,
        };
        &self.identity
    }

    /// Client carrying the credential of the current identity.
    pub fn api(&self, base: &ApiClient) -> Result<ApiClient, ApiError> {
        match &self.identity {
            Identity::Loading => Err(ApiError::NotReady),
            Identity::Anonymous => Ok(base.anonymous()),
            Identity::Authenticated(session) => Ok(base.with_credential(&session.token)),
        }
    }
}

fn encode_user(user: &UserRecord) -> Option<String> {
    serde_json::to_vec(user)
        .ok()
        .map(|json| URL_SAFE_NO_PAD.encode(json))
}

fn decode_user(raw: &str) -> Option<UserRecord> {
    let bytes = URL_SAFE_NO_PAD.decode(raw.trim()).ok()?;
    serde_json::from_slice(&bytes).ok()
}

fn cookie(name: &str, value: &str, max_age: u64) -> Option<HeaderValue> {
    HeaderValue::from_str(&format!(
        "{name}={value}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}"
    ))
    .ok()
}

/// `Set-Cookie` values persisting a fresh login.
pub fn login_cookies(token: &str, user: &UserRecord, ttl_seconds: u64) -> Vec<HeaderValue> {
    let Some(encoded) = encode_user(user) else {
        return Vec::new();
    };
    [
        cookie(SESSION_COOKIE_NAME, token, ttl_seconds),
        cookie(USER_COOKIE_NAME, &encoded, ttl_seconds),
    ]
    .into_iter()
    .flatten()
    .collect()
}

/// `Set-Cookie` values clearing both cookies.
pub fn logout_cookies() -> Vec<HeaderValue> {
    [
        cookie(SESSION_COOKIE_NAME, "", 0),
        cookie(USER_COOKIE_NAME, "", 0),
    ]
    .into_iter()
    .flatten()
    .collect()
}

pub async fn require_session(mut request: Request, next: Next) -> Response {
    let mut provider = IdentityProvider::new();
    provider.restore_session(request.headers());

    match route_guard(provider.identity()) {
        Guard::Allow => {
            if let Identity::Authenticated(session) = provider.into_identity() {
                request.extensions_mut().insert(session);
            }
            next.run(request).await
        }
        Guard::RedirectToLogin => {
            debug!(path = %request.uri().path(), "no session, redirecting to login");
            Redirect::to("/login").into_response()
        }
        Guard::Placeholder => (StatusCode::SERVICE_UNAVAILABLE, Html("Loading...")).into_response(),
    }
}

pub struct SessionUser(pub SessionData);

impl SessionUser {
    pub fn user(&self) -> &UserRecord {
        &self.0.user
    }

    pub fn username(&self) -> &str {
        &self.0.user.sub
    }

    pub fn token(&self) -> &str {
        &self.0.token
    }

    pub fn is_admin(&self) -> bool {
        self.0.user.role.is_admin()
    }

    /// API client that authenticates as this user.
    pub fn api(&self, state: &AppState) -> ApiClient {
        state.api.with_credential(&self.0.token)
    }
}

#[allow(refining_impl_trait)]
impl<S> FromRequestParts<S> for SessionUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> BoxFuture<'static, Result<Self, Self::Rejection>> {
        let data = parts
            .extensions
            .get::<SessionData>()
            .cloned()
            .ok_or_else(|| Redirect::to("/login").into_response());

        Box::pin(async move { data.map(SessionUser) })
    }
}

pub fn extract_cookies(headers: &HeaderMap, name: &str) -> Vec<String> {
    headers
        .get_all(COOKIE)
        .into_iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| {
            let mut split = pair.trim().splitn(2, '=');
            let key = split.next()?.trim();
            let value = split.next()?.trim();
            if key == name {
                Some(value.to_owned())
            } else {
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRole;

    fn record() -> UserRecord {
        UserRecord {
            user_id: 7,
            sub: "asha".into(),
            role: UserRole::Admin,
        }
    }

    fn headers_from(cookies: &[HeaderValue]) -> HeaderMap {
        let pairs: Vec<String> = cookies
            .iter()
            .filter_map(|c| c.to_str().ok())
            .filter_map(|c| c.split(';').next().map(str::to_string))
            .collect();
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(&pairs.join("; ")).unwrap());
        headers
    }

    #[test]
    fn login_cookies_restore_to_authenticated() {
        let cookies = login_cookies("tok-1", &record(), 3600);
        assert_eq!(cookies.len(), 2);
        assert!(cookies.iter().all(|c| {
            let s = c.to_str().unwrap();
            s.contains("HttpOnly") && s.contains("Max-Age=3600")
        }));

        let mut provider = IdentityProvider::new();
        match provider.restore_session(&headers_from(&cookies)) {
            Identity::Authenticated(session) => {
                assert_eq!(session.token, "tok-1");
                assert_eq!(session.user, record());
            }
            other => panic!("expected authenticated, got {other:?}"),
        }
    }

    #[test]
    fn guard_follows_identity() {
        let provider = IdentityProvider::new();
        assert_eq!(route_guard(provider.identity()), Guard::Placeholder);
        assert_eq!(route_guard(&Identity::Anonymous), Guard::RedirectToLogin);
    }

    #[test]
    fn api_is_refused_until_restored() {
        let base = ApiClient::new("http://localhost:8000").unwrap();
        let mut provider = IdentityProvider::new();
        assert!(matches!(provider.api(&base), Err(ApiError::NotReady)));

        provider.restore_session(&HeaderMap::new());
        let anon = provider.api(&base).unwrap();
        assert!(anon.credential().is_none());
    }

    #[test]
    fn token_without_user_record_is_anonymous() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("session=tok; session_user=%%%"));
        let mut provider = IdentityProvider::new();
        assert!(matches!(
            provider.restore_session(&headers),
            Identity::Anonymous
        ));
    }

    #[test]
    fn logout_clears_both_cookies() {
        let cleared = logout_cookies();
        assert_eq!(cleared.len(), 2);
        assert!(cleared.iter().all(|c| c.to_str().unwrap().contains("Max-Age=0")));
    }
}
