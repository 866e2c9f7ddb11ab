use std::sync::Arc;

use askama::Template;
use axum::{
    extract::{Form, Path, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::info;

use crate::{
    models::{NewStaffUser, UserRole},
    routes::helpers::{Choice, Nav, page, parse_id, require_admin},
    sections::Section,
    session::SessionUser,
    state::{ApiClient, AppState, add_user_to_company, create_user, list_companies, list_users},
    validation::{self, ValidationError},
};

#[derive(Template)]
#[template(path = "admin/staff.html")]
struct StaffTemplate {
    nav: Nav,
    users: Vec<StaffRow>,
    roles: Vec<Choice>,
    companies: Vec<Choice>,
    username: String,
    errors: Option<String>,
}

struct StaffRow {
    id: i64,
    username: String,
    role: &'static str,
    companies: String,
}

#[derive(Deserialize, Default)]
pub struct StaffFormData {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    role: String,
}

impl StaffFormData {
    fn validate(&self) -> Result<NewStaffUser, ValidationError> {
        let username = validation::required("username", &self.username)?;
        if self.password.is_empty() {
            return Err(ValidationError::Required("password"));
        }
        let role = UserRole::parse(&self.role).ok_or(ValidationError::InvalidChoice("role"))?;
        Ok(NewStaffUser {
            username,
            password: self.password.clone(),
            role,
        })
    }
}

#[derive(Deserialize)]
pub struct AssignFormData {
    #[serde(default)]
    company_id: String,
}

async fn staff_page(nav: Nav, api: &ApiClient, username: String, errors: Option<String>) -> Response {
    let (users, companies) = futures::join!(list_users(api), list_companies(api));
    let users = Section::from_result("staff", users);
    let companies = Section::from_result("companies", companies);

    page(StaffTemplate {
        nav,
        users: users
            .items()
            .iter()
            .map(|u| StaffRow {
                id: u.id,
                username: u.username.clone(),
                role: u.role.as_str(),
                companies: u
                    .assigned_companies
                    .iter()
                    .map(|c| c.legal_name.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
            .collect(),
        roles: [UserRole::Staff, UserRole::Admin]
            .iter()
            .map(|r| Choice::new(r.as_str(), r.as_str(), false))
            .collect(),
        companies: companies
            .items()
            .iter()
            .map(|c| Choice::new(c.id.to_string(), c.legal_name.clone(), false))
            .collect(),
        username,
        errors: errors
            .or_else(|| users.error().map(str::to_string))
            .or_else(|| companies.error().map(str::to_string)),
    })
}

pub async fn staff_index(session_user: SessionUser, State(state): State<Arc<AppState>>) -> Response {
    if let Err(status) = require_admin(session_user.is_admin()) {
        return status.into_response();
    }
    let api = session_user.api(&state);
    staff_page(Nav::of(&session_user), &api, String::new(), None).await
}

pub async fn staff_create(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Form(form): Form<StaffFormData>,
) -> Response {
    if let Err(status) = require_admin(session_user.is_admin()) {
        return status.into_response();
    }
    let api = session_user.api(&state);
    let user = match form.validate() {
        Ok(user) => user,
        Err(err) => {
            return staff_page(Nav::of(&session_user), &api, form.username, Some(err.to_string())).await;
        }
    };
    match create_user(&api, &user).await {
        Ok(()) => {
            info!(username = %user.username, role = user.role.as_str(), "staff user created");
            Redirect::to("/staff").into_response()
        }
        Err(err) => staff_page(Nav::of(&session_user), &api, form.username, Some(err.user_message())).await,
    }
}

pub async fn staff_assign(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
    Form(form): Form<AssignFormData>,
) -> Response {
    if let Err(status) = require_admin(session_user.is_admin()) {
        return status.into_response();
    }
    let api = session_user.api(&state);
    let Some(company_id) = parse_id(&form.company_id) else {
        let message = ValidationError::Required("company").to_string();
        return staff_page(Nav::of(&session_user), &api, String::new(), Some(message)).await;
    };
    match add_user_to_company(&api, user_id, company_id).await {
        Ok(()) => {
            info!(user_id, company_id, "company assigned");
            Redirect::to("/staff").into_response()
        }
        Err(err) => staff_page(Nav::of(&session_user), &api, String::new(), Some(err.user_message())).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staff_form_requires_known_role_and_password() {
        let mut form = StaffFormData {
            username: " asha ".into(),
            password: "s3cret".into(),
            role: "STAFF".into(),
        };
        let user = form.validate().unwrap();
        assert_eq!(user.username, "asha");
        assert_eq!(user.role, UserRole::Staff);

        form.role = "OWNER".into();
        assert_eq!(form.validate().unwrap_err(), ValidationError::InvalidChoice("role"));

        form.password.clear();
        assert_eq!(form.validate().unwrap_err(), ValidationError::Required("password"));
    }
}
