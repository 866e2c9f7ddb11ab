// routes/workspace.rs
// The work workspace page and every action posted from it.

use std::sync::Arc;

use askama::Template;
use axum::{
    extract::{Form, Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::{info, warn};

use crate::{
    preview::{NoteView, Page, format_amount},
    routes::helpers::{Choice, Nav, api_status, forward_file, href, page, parse_id, read_multipart},
    session::SessionUser,
    state::{ApiClient, AppState, download_document, download_statement},
    validation::ValidationError,
    workspace::{
        FinalizeRequest, MappingScope, VersionRow, ViewLifetime, ViewMode, Workspace, WorkspaceError,
        load_workspace, save_note,
    },
};

#[derive(Template)]
#[template(path = "works/workspace.html")]
struct WorkspaceTemplate {
    nav: Nav,
    work_id: i64,
    view: u64,
    company_id: i64,
    company_name: String,
    company_error: Option<String>,
    period: String,
    status: &'static str,
    is_finalized: bool,
    udin: String,
    signing_date: String,
    mode: &'static str,
    mode_tabs: Vec<Tab>,
    scope_tabs: Vec<Tab>,
    scope: String,
    search: String,
    stats: Option<StatsView>,
    stats_error: Option<String>,
    can_map: bool,
    can_upload: bool,
    is_consolidated: bool,
    selected_unit: String,
    entries: Vec<EntryRow>,
    entries_error: Option<String>,
    sub_heads: Vec<Choice>,
    accounts_error: Option<String>,
    versions: Vec<VersionRow>,
    versions_error: Option<String>,
    recommended: Vec<TemplateLink>,
    other_templates: Vec<TemplateLink>,
    templates_error: Option<String>,
    documents: Vec<DocumentLink>,
    documents_error: Option<String>,
    statement: Option<StatementPanel>,
    document: Option<DocumentModal>,
    alert: Option<String>,
}

struct Tab {
    label: String,
    href: String,
    active: bool,
}

struct StatsView {
    total: u32,
    mapped: u32,
    unmapped: u32,
    debit: String,
    credit: String,
    balanced: bool,
    ready: bool,
}

struct EntryRow {
    id: i64,
    account_name: String,
    debit: String,
    credit: String,
    closing: String,
    unit_name: String,
}

struct TemplateLink {
    name: String,
    statement_type: &'static str,
    preview_href: String,
}

struct DocumentLink {
    name: String,
    preview_href: String,
    download_href: String,
}

struct StatementPanel {
    template_name: String,
    pages: Vec<Page>,
    notes: Vec<NoteView>,
    page_count: usize,
    pdf_href: String,
    xlsx_href: String,
    notes_action: String,
    return_href: String,
}

struct DocumentModal {
    name: String,
    html: String,
    download_href: String,
    close_href: String,
}

#[derive(Deserialize, Default)]
pub struct WorkspaceQuery {
    mode: Option<String>,
    unit: Option<String>,
    q: Option<String>,
    template: Option<i64>,
    document: Option<i64>,
    view: Option<String>,
    alert: Option<String>,
}

fn workspace_href(work_id: i64, mode: ViewMode, scope: MappingScope, search: &str, view: Option<u64>) -> String {
    let scope = scope.unit_id().map(|id| id.to_string()).unwrap_or_default();
    let view = view.map(|v| v.to_string()).unwrap_or_default();
    href(
        &format!("/works/{work_id}"),
        &[("mode", mode.as_str()), ("unit", &scope), ("q", search), ("view", &view)],
    )
}

/// View id posted back by a workspace form, if any.
fn posted_view(raw: &str) -> Option<u64> {
    raw.trim().parse().ok()
}

fn workspace_page(nav: Nav, ws: &Workspace, view: u64, alert: Option<String>) -> Response {
    let work_id = ws.work.id;
    let view_param = view.to_string();
    let (recommended, other) = ws.template_groups();
    let template_link = |t: &&crate::models::StatementTemplate| TemplateLink {
        name: t.name.clone(),
        statement_type: t.statement_type.label(),
        preview_href: href(
            &format!("/works/{work_id}"),
            &[("mode", "preview"), ("template", &t.id.to_string()), ("view", &view_param)],
        ),
    };

    let mut scope_tabs = vec![Tab {
        label: "Consolidated".into(),
        href: workspace_href(work_id, ViewMode::Mapping, MappingScope::Consolidated, "", Some(view)),
        active: ws.scope.is_consolidated(),
    }];
    scope_tabs.extend(ws.work.units.iter().map(|u| Tab {
        label: u.unit_name.clone(),
        href: workspace_href(work_id, ViewMode::Mapping, MappingScope::Unit(u.id), "", Some(view)),
        active: ws.scope == MappingScope::Unit(u.id),
    }));

    let unit_name = |unit_id: Option<i64>| {
        unit_id
            .and_then(|id| ws.work.units.iter().find(|u| u.id == id))
            .map(|u| u.unit_name.clone())
            .unwrap_or_default()
    };

    page(WorkspaceTemplate {
        nav,
        work_id,
        view,
        company_id: ws.work.company_id,
        company_name: ws
            .company
            .loaded()
            .map(|c| c.legal_name.clone())
            .unwrap_or_else(|| format!("Company #{}", ws.work.company_id)),
        company_error: ws.company.error().map(str::to_string),
        period: ws.work.period_label(),
        status: ws.work.status.as_str(),
        is_finalized: ws.is_finalized(),
        udin: ws.work.udin.clone().unwrap_or_default(),
        signing_date: ws
            .work
            .signing_date
            .map(|d| d.format("%d %b %Y").to_string())
            .unwrap_or_default(),
        mode: ws.mode.as_str(),
        mode_tabs: ViewMode::ALL
            .iter()
            .filter(|m| **m != ViewMode::Preview || ws.statement.is_some())
            .map(|m| Tab {
                label: m.label().into(),
                href: workspace_href(work_id, *m, ws.scope, "", Some(view)),
                active: *m == ws.mode,
            })
            .collect(),
        scope_tabs,
        scope: ws.scope.to_string(),
        search: ws.search.clone(),
        stats: ws.stats.loaded().map(|s| StatsView {
            total: s.total_entries,
            mapped: s.mapped_entries,
            unmapped: s.unmapped_entries,
            debit: format_amount(s.total_debit),
            credit: format_amount(s.total_credit),
            balanced: s.is_balanced(),
            ready: s.ready_for_reporting(),
        }),
        stats_error: ws.stats.error().map(str::to_string),
        can_map: ws.can_map(),
        can_upload: ws.can_upload(),
        is_consolidated: ws.scope.is_consolidated(),
        selected_unit: ws.selected_unit().map(|u| u.unit_name.clone()).unwrap_or_default(),
        entries: ws
            .visible_entries()
            .into_iter()
            .map(|e| EntryRow {
                id: e.id,
                account_name: e.account_name.clone(),
                debit: format_amount(e.debit),
                credit: format_amount(e.credit),
                closing: format_amount(e.closing_balance),
                unit_name: unit_name(e.unit_id),
            })
            .collect(),
        entries_error: ws.unmapped.error().map(str::to_string),
        sub_heads: ws
            .sub_heads()
            .into_iter()
            .map(|a| Choice::new(a.id.to_string(), a.name.clone(), false))
            .collect(),
        accounts_error: ws.accounts.error().map(str::to_string),
        versions: ws.version_rows(),
        versions_error: ws.versions.error().map(str::to_string),
        recommended: recommended.iter().map(&template_link).collect(),
        other_templates: other.iter().map(&template_link).collect(),
        templates_error: ws.templates.error().map(str::to_string),
        documents: ws
            .compliance
            .items()
            .iter()
            .map(|t| DocumentLink {
                name: t.name.clone(),
                preview_href: href(
                    &format!("/works/{work_id}"),
                    &[("mode", "documents"), ("document", &t.id.to_string()), ("view", &view_param)],
                ),
                download_href: format!("/works/{work_id}/documents/{}/download", t.id),
            })
            .collect(),
        documents_error: ws.compliance.error().map(str::to_string),
        statement: ws.statement.as_ref().map(|s| StatementPanel {
            template_name: s.template_name.clone(),
            pages: s.rendered.pages.clone(),
            notes: s.rendered.notes.clone(),
            page_count: s.rendered.page_count(),
            pdf_href: format!("/works/{work_id}/statements/{}/download?format=pdf", s.template_id),
            xlsx_href: format!("/works/{work_id}/statements/{}/download?format=xlsx", s.template_id),
            notes_action: format!("/works/{work_id}/notes"),
            return_href: href(
                &format!("/works/{work_id}"),
                &[("mode", "preview"), ("template", &s.template_id.to_string()), ("view", &view_param)],
            ),
        }),
        document: ws.document.as_ref().map(|d| DocumentModal {
            name: d.template_name.clone(),
            html: d.html.clone(),
            download_href: format!("/works/{work_id}/documents/{}/download", d.template_id),
            close_href: workspace_href(work_id, ViewMode::Documents, ws.scope, "", Some(view)),
        }),
        alert,
    })
}

/// Loads the workspace for a posted action. Actions always run to completion,
/// whatever page loads are in flight for the same session.
async fn open(api: &ApiClient, work_id: i64, scope: MappingScope) -> Result<Workspace, Response> {
    load_workspace(api, work_id, scope, &ViewLifetime::detached())
        .await
        .map_err(|err| failure_status(&err).into_response())
}

fn failure_status(err: &WorkspaceError) -> StatusCode {
    match err {
        WorkspaceError::Api(api) => api_status(api),
        WorkspaceError::Stale => StatusCode::CONFLICT,
        _ => StatusCode::BAD_REQUEST,
    }
}

pub async fn workspace_show(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(query): Query<WorkspaceQuery>,
) -> Response {
    let api = session_user.api(&state);
    let scope = MappingScope::parse(query.unit.as_deref());
    let view = query
        .view
        .as_deref()
        .and_then(posted_view)
        .unwrap_or_else(|| state.views.issue());
    let lifetime = state.views.begin(&format!("{}:{view}", session_user.token()));
    let mut ws = match load_workspace(&api, id, scope, &lifetime).await {
        Ok(ws) => ws,
        Err(err) => return failure_status(&err).into_response(),
    };
    ws.mode = ViewMode::parse(query.mode.as_deref());
    ws.search = query.q.unwrap_or_default();

    let mut alert = query.alert.filter(|a| !a.trim().is_empty());
    match (ws.mode, query.template, query.document) {
        (ViewMode::Preview, Some(template_id), _) => {
            if let Err(err) = ws.preview_statement(&api, template_id).await {
                warn!(work_id = id, template_id, error = %err, "statement preview failed");
                alert = Some(err.user_message());
                ws.mode = ViewMode::Reports;
            }
        }
        (ViewMode::Preview, None, _) => ws.mode = ViewMode::Reports,
        (ViewMode::Documents, _, Some(document_id)) => {
            if let Err(err) = ws.preview_document(&api, document_id).await {
                warn!(work_id = id, document_id, error = %err, "document preview failed");
                alert = Some(err.user_message());
            }
        }
        _ => {}
    }
    workspace_page(Nav::of(&session_user), &ws, view, alert)
}

#[derive(Deserialize)]
pub struct UnitForm {
    #[serde(default)]
    unit_name: String,
    #[serde(default)]
    view: String,
}

pub async fn units_create(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Form(form): Form<UnitForm>,
) -> Response {
    let api = session_user.api(&state);
    let view = posted_view(&form.view);
    let mut ws = match open(&api, id, MappingScope::Consolidated).await {
        Ok(ws) => ws,
        Err(resp) => return resp,
    };
    match ws.create_unit(&api, &form.unit_name).await {
        Ok(unit) => Redirect::to(&workspace_href(id, ViewMode::Mapping, MappingScope::Unit(unit.id), "", view))
            .into_response(),
        Err(err) => {
            let view = view.unwrap_or_else(|| state.views.issue());
            workspace_page(Nav::of(&session_user), &ws, view, Some(err.user_message()))
        }
    }
}

pub async fn trial_balance_upload(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Response {
    let form = match read_multipart(multipart).await {
        Ok(form) => form,
        Err(status) => return status.into_response(),
    };
    let api = session_user.api(&state);
    let scope = MappingScope::parse(Some(form.field("unit")));
    let view = posted_view(form.field("view"));
    let mut ws = match open(&api, id, scope).await {
        Ok(ws) => ws,
        Err(resp) => return resp,
    };
    match ws.upload_trial_balance(&api, form.file).await {
        Ok(()) => Redirect::to(&workspace_href(id, ViewMode::Mapping, ws.scope, "", view)).into_response(),
        Err(err) => {
            let view = view.unwrap_or_else(|| state.views.issue());
            workspace_page(Nav::of(&session_user), &ws, view, Some(err.user_message()))
        }
    }
}

#[derive(Deserialize)]
pub struct MapForm {
    #[serde(default)]
    entry_id: String,
    #[serde(default)]
    account_id: String,
    #[serde(default)]
    q: String,
    #[serde(default)]
    view: String,
}

pub async fn map_entry(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Form(form): Form<MapForm>,
) -> Response {
    let api = session_user.api(&state);
    let view = posted_view(&form.view);
    let mut ws = match open(&api, id, MappingScope::Consolidated).await {
        Ok(ws) => ws,
        Err(resp) => return resp,
    };
    ws.search = form.q.clone();

    let result = match (parse_id(&form.entry_id), parse_id(&form.account_id)) {
        (Some(entry_id), Some(account_id)) => ws.map_entry(&api, entry_id, account_id).await,
        (None, _) => Err(ValidationError::Required("entry").into()),
        (_, None) => Err(ValidationError::Required("account").into()),
    };
    match result {
        Ok(()) => Redirect::to(&workspace_href(id, ViewMode::Mapping, MappingScope::Consolidated, &form.q, view))
            .into_response(),
        Err(err) => {
            let view = view.unwrap_or_else(|| state.views.issue());
            workspace_page(Nav::of(&session_user), &ws, view, Some(err.user_message()))
        }
    }
}

pub async fn finalize(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Response {
    let form = match read_multipart(multipart).await {
        Ok(form) => form,
        Err(status) => return status.into_response(),
    };
    let udin = form.field("udin").to_string();
    let signing_date = form.field("signing_date").to_string();
    let view = posted_view(form.field("view"));
    // Rejected input goes straight back to the page; nothing is sent upstream.
    let request = match FinalizeRequest::validate(&udin, &signing_date, form.file) {
        Ok(request) => request,
        Err(err) => {
            let view = view.map(|v| v.to_string()).unwrap_or_default();
            let back = href(
                &format!("/works/{id}"),
                &[("mode", "mapping"), ("view", &view), ("alert", &err.to_string())],
            );
            return Redirect::to(&back).into_response();
        }
    };

    let api = session_user.api(&state);
    let mut ws = match open(&api, id, MappingScope::Consolidated).await {
        Ok(ws) => ws,
        Err(resp) => return resp,
    };
    match ws.finalize(&api, request).await {
        Ok(()) => {
            info!(work_id = id, "finalized from workspace");
            Redirect::to(&format!("/works/{id}")).into_response()
        }
        Err(err) => {
            let view = view.unwrap_or_else(|| state.views.issue());
            workspace_page(Nav::of(&session_user), &ws, view, Some(err.user_message()))
        }
    }
}

#[derive(Deserialize)]
pub struct NoteForm {
    #[serde(default)]
    note_ref: String,
    #[serde(default)]
    text: String,
    /// Where a plain form submission returns to; background saves leave it out.
    #[serde(default)]
    redirect: Option<String>,
}

pub async fn note_save(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Form(form): Form<NoteForm>,
) -> Response {
    let api = session_user.api(&state);
    match save_note(&api, id, &form.note_ref, &form.text).await {
        Ok(_) => match form.redirect.filter(|r| r.starts_with('/')) {
            Some(target) => Redirect::to(&target).into_response(),
            None => StatusCode::NO_CONTENT.into_response(),
        },
        Err(err) => {
            warn!(work_id = id, error = %err, "note save failed");
            (failure_status(&err), err.user_message()).into_response()
        }
    }
}

#[derive(Deserialize)]
pub struct DownloadQuery {
    #[serde(default)]
    format: String,
}

pub async fn statement_download(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Path((id, template_id)): Path<(i64, i64)>,
    Query(query): Query<DownloadQuery>,
) -> Response {
    let format = match query.format.as_str() {
        "pdf" | "xlsx" => query.format.as_str(),
        _ => return StatusCode::BAD_REQUEST.into_response(),
    };
    let api = session_user.api(&state);
    match download_statement(&api, id, template_id, format).await {
        Ok(file) => forward_file(file),
        Err(err) => api_status(&err).into_response(),
    }
}

pub async fn document_download(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Path((id, template_id)): Path<(i64, i64)>,
) -> Response {
    let api = session_user.api(&state);
    match download_document(&api, id, template_id).await {
        Ok(file) => forward_file(file),
        Err(err) => api_status(&err).into_response(),
    }
}
