// routes/templates.rs
// Statement template list and block editor.

use std::sync::Arc;

use askama::Template;
use axum::{
    extract::{Form, Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use tracing::{info, warn};

use crate::{
    blocks::{BlockList, EditorAction},
    models::{Account, ClientType, StatementTemplate, StatementType, TemplateBlock, TemplatePayload},
    routes::editor::EditorForm,
    routes::helpers::{Choice, Nav, api_status, page, render},
    sections::Section,
    session::SessionUser,
    state::{
        AppState, create_template, duplicate_template, get_template_by_id, list_accounts,
        list_templates, update_template,
    },
    validation,
};

#[derive(Template)]
#[template(path = "templates/index.html")]
struct TemplatesIndexTemplate {
    nav: Nav,
    templates: Vec<TemplateRow>,
    errors: Option<String>,
}

struct TemplateRow {
    id: i64,
    name: String,
    statement_type: String,
    client_types: String,
    block_count: usize,
}

#[derive(Template)]
#[template(path = "templates/editor.html")]
struct TemplateEditorTemplate {
    nav: Nav,
    id: String,
    is_edit: bool,
    name: String,
    statement_types: Vec<Choice>,
    client_types: Vec<Choice>,
    definition: String,
    blocks: Vec<BlockRow>,
    kinds: Vec<Choice>,
    errors: Option<String>,
}

struct BlockRow {
    index: usize,
    kind_label: &'static str,
    is_header: bool,
    is_title: bool,
    is_line: bool,
    is_subtotal: bool,
    text: String,
    label: String,
    note_ref: String,
    mandatory: bool,
    subtotal_id: i64,
    is_first: bool,
    is_last: bool,
    accounts: Vec<Choice>,
}

const BLOCK_KINDS: [(&str, &str); 4] = [
    ("header_block", "Page header"),
    ("title", "Section title"),
    ("financial_line_item", "Line item"),
    ("subtotal", "Subtotal"),
];

/// Editor state between two form posts.
struct Draft {
    id: Option<i64>,
    name: String,
    statement_type: StatementType,
    client_types: Vec<ClientType>,
    blocks: BlockList<TemplateBlock>,
}

impl Draft {
    fn empty() -> Self {
        Draft {
            id: None,
            name: String::new(),
            statement_type: StatementType::BalanceSheet,
            client_types: Vec::new(),
            blocks: BlockList::default(),
        }
    }

    fn from_template(template: StatementTemplate) -> Self {
        Draft {
            id: Some(template.id),
            name: template.name,
            statement_type: template.statement_type,
            client_types: template.applicable_client_types,
            blocks: BlockList::new(template.template_definition),
        }
    }

    fn payload(&self) -> Result<TemplatePayload, String> {
        let name = validation::required("template name", &self.name).map_err(|e| e.to_string())?;
        Ok(TemplatePayload {
            name,
            statement_type: self.statement_type,
            template_definition: self.blocks.blocks().to_vec(),
            applicable_client_types: self.client_types.clone(),
        })
    }
}

fn block_rows(blocks: &[TemplateBlock], accounts: &[Account]) -> Vec<BlockRow> {
    let mut sorted: Vec<&Account> = accounts.iter().collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));
    let last = blocks.len().saturating_sub(1);

    blocks
        .iter()
        .enumerate()
        .map(|(index, block)| {
            let mut row = BlockRow {
                index,
                kind_label: "",
                is_header: false,
                is_title: false,
                is_line: false,
                is_subtotal: false,
                text: String::new(),
                label: String::new(),
                note_ref: String::new(),
                mandatory: false,
                subtotal_id: 0,
                is_first: index == 0,
                is_last: index == last,
                accounts: Vec::new(),
            };
            match block {
                TemplateBlock::HeaderBlock { text } => {
                    row.kind_label = "Page header";
                    row.is_header = true;
                    row.text = text.clone();
                }
                TemplateBlock::Title { text } => {
                    row.kind_label = "Section title";
                    row.is_title = true;
                    row.text = text.clone();
                }
                TemplateBlock::FinancialLineItem {
                    label,
                    account_head_id,
                    note_ref,
                    mandatory,
                } => {
                    row.kind_label = "Line item";
                    row.is_line = true;
                    row.label = label.clone();
                    row.note_ref = note_ref.clone().unwrap_or_default();
                    row.mandatory = *mandatory;
                    row.accounts = sorted
                        .iter()
                        .map(|a| {
                            Choice::new(
                                a.id.to_string(),
                                format!("{} ({})", a.name, a.account_type.as_str()),
                                a.id == *account_head_id,
                            )
                        })
                        .collect();
                }
                TemplateBlock::Subtotal { label, id, mandatory } => {
                    row.kind_label = "Subtotal";
                    row.is_subtotal = true;
                    row.label = label.clone();
                    row.subtotal_id = *id;
                    row.mandatory = *mandatory;
                }
            }
            row
        })
        .collect()
}

fn editor_page(nav: Nav, draft: &Draft, accounts: &[Account], errors: Option<String>) -> Response {
    let definition = serde_json::to_string(draft.blocks.blocks()).unwrap_or_else(|_| "[]".into());
    page(TemplateEditorTemplate {
        nav,
        id: draft.id.map(|id| id.to_string()).unwrap_or_default(),
        is_edit: draft.id.is_some(),
        name: draft.name.clone(),
        statement_types: StatementType::ALL
            .iter()
            .map(|t| Choice::new(t.as_str(), t.label(), *t == draft.statement_type))
            .collect(),
        client_types: ClientType::ALL
            .iter()
            .map(|c| Choice::new(c.as_str(), c.label(), draft.client_types.contains(c)))
            .collect(),
        definition,
        blocks: block_rows(draft.blocks.blocks(), accounts),
        kinds: BLOCK_KINDS
            .iter()
            .map(|(value, label)| Choice::new(*value, *label, false))
            .collect(),
        errors,
    })
}

pub async fn templates_index(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
) -> Result<Html<String>, StatusCode> {
    let api = session_user.api(&state);
    let section = Section::from_result("statement templates", list_templates(&api).await);

    let templates = section
        .items()
        .iter()
        .map(|t| TemplateRow {
            id: t.id,
            name: t.name.clone(),
            statement_type: t.statement_type.label().to_string(),
            client_types: if t.applicable_client_types.is_empty() {
                "All".into()
            } else {
                t.applicable_client_types
                    .iter()
                    .map(ClientType::label)
                    .collect::<Vec<_>>()
                    .join(", ")
            },
            block_count: t.template_definition.len(),
        })
        .collect();

    render(TemplatesIndexTemplate {
        nav: Nav::of(&session_user),
        templates,
        errors: section.error().map(str::to_string),
    })
}

pub async fn template_new(session_user: SessionUser, State(state): State<Arc<AppState>>) -> Response {
    let api = session_user.api(&state);
    let accounts = Section::from_result("accounts", list_accounts(&api).await);
    editor_page(
        Nav::of(&session_user),
        &Draft::empty(),
        accounts.items(),
        accounts.error().map(str::to_string),
    )
}

pub async fn template_edit(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Response {
    let api = session_user.api(&state);
    let (template, accounts) = futures::join!(get_template_by_id(&api, id), list_accounts(&api));
    let template = match template {
        Ok(Some(t)) => t,
        Ok(None) => return StatusCode::NOT_FOUND.into_response(),
        Err(err) => return api_status(&err).into_response(),
    };
    let accounts = Section::from_result("accounts", accounts);
    editor_page(
        Nav::of(&session_user),
        &Draft::from_template(template),
        accounts.items(),
        accounts.error().map(str::to_string),
    )
}

/// Every editor button posts here; `action` says which one.
pub async fn template_editor(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Response {
    let api = session_user.api(&state);
    let form = EditorForm::from_pairs(pairs);
    let blocks = match form.blocks::<TemplateBlock>() {
        Ok(blocks) => blocks,
        Err(message) => {
            warn!(%message, "template editor posted a broken definition");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };
    let accounts = Section::from_result("accounts", list_accounts(&api).await);

    let mut draft = Draft {
        id: form.id,
        name: form.name.clone(),
        statement_type: StatementType::parse(form.value("statement_type"))
            .unwrap_or(StatementType::BalanceSheet),
        client_types: form
            .values("client_type")
            .into_iter()
            .filter_map(ClientType::parse)
            .collect(),
        blocks: BlockList::new(blocks),
    };

    let mut errors = None;
    let edited = form
        .apply_edits(&mut draft.blocks, &["account_head_id"])
        .and_then(|()| {
            for (index, raw) in form.edits_for("account_head_id") {
                let Ok(account_id) = raw.trim().parse::<i64>() else {
                    continue;
                };
                let current = match draft.blocks.blocks().get(index) {
                    Some(TemplateBlock::FinancialLineItem { account_head_id, .. }) => *account_head_id,
                    _ => continue,
                };
                if current != account_id {
                    draft
                        .blocks
                        .set_line_item_account(index, account_id, accounts.items())?;
                }
            }
            Ok(())
        })
        .and_then(|()| match &form.action {
            Some(action) => draft.blocks.apply(action),
            None => Ok(()),
        });
    if let Err(err) = edited {
        errors = Some(err.to_string());
    }

    if errors.is_none() && form.action == Some(EditorAction::Save) {
        match draft.payload() {
            Ok(payload) => {
                let saved = match draft.id {
                    Some(id) => update_template(&api, id, &payload).await,
                    None => create_template(&api, &payload).await,
                };
                match saved {
                    Ok(()) => {
                        info!(name = %payload.name, id = ?draft.id, "statement template saved");
                        return Redirect::to("/templates").into_response();
                    }
                    Err(err) => errors = Some(err.user_message()),
                }
            }
            Err(message) => errors = Some(message),
        }
    }

    editor_page(Nav::of(&session_user), &draft, accounts.items(), errors)
}

pub async fn template_duplicate(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Response {
    let api = session_user.api(&state);
    let source = match get_template_by_id(&api, id).await {
        Ok(Some(t)) => t,
        Ok(None) => return StatusCode::NOT_FOUND.into_response(),
        Err(err) => return api_status(&err).into_response(),
    };
    match duplicate_template(&api, &source).await {
        Ok(()) => Redirect::to("/templates").into_response(),
        Err(err) => api_status(&err).into_response(),
    }
}
