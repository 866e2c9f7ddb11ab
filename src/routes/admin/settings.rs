use std::sync::Arc;

use askama::Template;
use axum::{
    extract::{Form, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::info;

use crate::{
    models::FirmSettings,
    routes::helpers::{Nav, href, page, require_admin},
    session::SessionUser,
    state::{AppState, get_settings, save_settings, seed_default_templates},
    validation,
};

#[derive(Template)]
#[template(path = "admin/settings.html")]
struct SettingsTemplate {
    nav: Nav,
    settings: FirmSettings,
    notice: Option<String>,
    errors: Option<String>,
}

#[derive(Deserialize, Default)]
pub struct SettingsQuery {
    notice: Option<String>,
}

fn settings_page(nav: Nav, settings: FirmSettings, notice: Option<String>, errors: Option<String>) -> Response {
    page(SettingsTemplate {
        nav,
        settings,
        notice,
        errors,
    })
}

pub async fn settings_show(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Query(query): Query<SettingsQuery>,
) -> Response {
    if let Err(status) = require_admin(session_user.is_admin()) {
        return status.into_response();
    }
    let api = session_user.api(&state);
    // A firm that never saved its settings still gets an empty form.
    let (settings, errors) = match get_settings(&api).await {
        Ok(settings) => (settings, None),
        Err(err) => (FirmSettings::default(), Some(err.user_message())),
    };
    settings_page(Nav::of(&session_user), settings, query.notice, errors)
}

pub async fn settings_save(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Form(form): Form<FirmSettings>,
) -> Response {
    if let Err(status) = require_admin(session_user.is_admin()) {
        return status.into_response();
    }
    let api = session_user.api(&state);
    let settings = match validation::required("firm name", &form.firm_name) {
        Ok(firm_name) => FirmSettings {
            firm_name,
            firm_registration_number: form.firm_registration_number.trim().to_string(),
            email: form.email.trim().to_string(),
            address: form.address.trim().to_string(),
        },
        Err(err) => return settings_page(Nav::of(&session_user), form, None, Some(err.to_string())),
    };
    match save_settings(&api, &settings).await {
        Ok(()) => {
            info!(firm = %settings.firm_name, "firm settings saved");
            Redirect::to(&href("/settings", &[("notice", "Settings saved")])).into_response()
        }
        Err(err) => settings_page(Nav::of(&session_user), settings, None, Some(err.user_message())),
    }
}

pub async fn seed_defaults(session_user: SessionUser, State(state): State<Arc<AppState>>) -> Response {
    if let Err(status) = require_admin(session_user.is_admin()) {
        return status.into_response();
    }
    let api = session_user.api(&state);
    match seed_default_templates(&api).await {
        Ok(summary) => {
            info!(added = summary.templates_added, "default compliance templates seeded");
            let notice = format!("{} default document templates added", summary.templates_added);
            Redirect::to(&href("/settings", &[("notice", &notice)])).into_response()
        }
        Err(err) => {
            let settings = get_settings(&api).await.unwrap_or_default();
            settings_page(Nav::of(&session_user), settings, None, Some(err.user_message()))
        }
    }
}
