// routes/logout.rs
// POST /logout -> clears both session cookies and returns to the login page.

use axum::{
    http::header::SET_COOKIE,
    response::{IntoResponse, Redirect, Response},
};
use tracing::info;

use crate::session::{SessionUser, logout_cookies};

pub async fn logout(session: SessionUser) -> Response {
    info!(user_id = session.user().user_id, "logged out");

    let mut response = Redirect::to("/login").into_response();
    for cookie in logout_cookies() {
        response.headers_mut().append(SET_COOKIE, cookie);
    }
    response
}
