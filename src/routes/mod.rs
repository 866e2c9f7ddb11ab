// routes/mod.rs
// Route handlers and the router that wires them.
//
// Public:
// - GET/POST /login
// Everything else sits behind the session guard.

use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::session;
use crate::state::AppState;

mod accounts;
mod admin;
mod companies;
mod documents;
mod home;
mod login;
mod logout;
mod templates;
mod works;
mod workspace;

mod editor;
mod helpers;

pub fn app(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route("/", get(home::home))
        .route("/logout", post(logout::logout))
        .route("/companies", get(companies::companies_index).post(companies::companies_create))
        .route("/companies/{id}", get(companies::company_show))
        .route("/companies/{id}/works", post(companies::company_works_create))
        .route("/companies/{id}/signatories", post(companies::company_signatories_create))
        .route("/works", get(works::works_index).post(works::works_create))
        .route("/works/{id}", get(workspace::workspace_show))
        .route("/works/{id}/units", post(workspace::units_create))
        .route("/works/{id}/trial-balance", post(workspace::trial_balance_upload))
        .route("/works/{id}/map", post(workspace::map_entry))
        .route("/works/{id}/finalize", post(workspace::finalize))
        .route("/works/{id}/notes", post(workspace::note_save))
        .route(
            "/works/{id}/statements/{template_id}/download",
            get(workspace::statement_download),
        )
        .route(
            "/works/{id}/documents/{template_id}/download",
            get(workspace::document_download),
        )
        .route("/accounts", get(accounts::accounts_index).post(accounts::accounts_create))
        .route("/accounts/bulk", post(accounts::accounts_bulk_upload))
        .route("/templates", get(templates::templates_index))
        .route("/templates/new", get(templates::template_new))
        .route("/templates/editor", post(templates::template_editor))
        .route("/templates/{id}", get(templates::template_edit))
        .route("/templates/{id}/duplicate", post(templates::template_duplicate))
        .route("/documents", get(documents::documents_index))
        .route("/documents/new", get(documents::document_new))
        .route("/documents/editor", post(documents::document_editor))
        .route("/documents/{id}", get(documents::document_edit))
        .route("/documents/{id}/duplicate", post(documents::document_duplicate))
        .route("/staff", get(admin::staff_index).post(admin::staff_create))
        .route("/staff/{id}/assign", post(admin::staff_assign))
        .route("/settings", get(admin::settings_show).post(admin::settings_save))
        .route("/settings/seed-defaults", post(admin::seed_defaults))
        .route_layer(middleware::from_fn(session::require_session));

    Router::new()
        .route("/login", get(login::login_form).post(login::login))
        .merge(protected)
        .with_state(state)
}
