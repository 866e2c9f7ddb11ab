use reqwest::Method;
use serde::Serialize;

use crate::models::{LoginResponse, NewStaffUser, StaffUser};

use super::{ApiClient, ApiError};

/// Exchanges username/password (form-encoded, OAuth2 password style) for a credential.
pub async fn login(api: &ApiClient, username: &str, password: &str) -> Result<LoginResponse, ApiError> {
    api.anonymous()
        .post_form("/auth/login", &[("username", username), ("password", password)])
        .await
}

pub async fn list_users(api: &ApiClient) -> Result<Vec<StaffUser>, ApiError> {
    api.get_json("/auth/users").await
}

pub async fn create_user(api: &ApiClient, user: &NewStaffUser) -> Result<(), ApiError> {
    api.send_json_discard(Method::POST, "/auth/register", user)
        .await
}

#[derive(Serialize)]
struct Assignment {
    user_id: i64,
    company_id: i64,
}

pub async fn add_user_to_company(api: &ApiClient, user_id: i64, company_id: i64) -> Result<(), ApiError> {
    api.send_json_discard(
        Method::POST,
        "/auth/assign",
        &Assignment {
            user_id,
            company_id,
        },
    )
    .await
}
