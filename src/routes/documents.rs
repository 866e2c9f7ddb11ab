// routes/documents.rs
// Compliance document templates: list, block editor, duplicate.

use std::sync::Arc;

use askama::Template;
use axum::{
    extract::{Form, Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use tracing::{info, warn};

use crate::{
    blocks::{BlockList, DOCUMENT_VARIABLES, EditorAction},
    models::{ComplianceTemplate, CompliancePayload, DocBlock},
    routes::editor::EditorForm,
    routes::helpers::{Choice, Nav, api_status, page, render},
    sections::Section,
    session::SessionUser,
    state::{
        AppState, create_compliance_template, duplicate_compliance_template,
        get_compliance_template_by_id, list_compliance_templates, update_compliance_template,
    },
    validation,
};

#[derive(Template)]
#[template(path = "documents/index.html")]
struct DocumentsIndexTemplate {
    nav: Nav,
    documents: Vec<DocumentRow>,
    errors: Option<String>,
}

struct DocumentRow {
    id: i64,
    name: String,
    block_count: usize,
}

#[derive(Template)]
#[template(path = "documents/editor.html")]
struct DocumentEditorTemplate {
    nav: Nav,
    id: String,
    is_edit: bool,
    name: String,
    definition: String,
    blocks: Vec<DocBlockRow>,
    variables: Vec<Choice>,
    errors: Option<String>,
}

struct DocBlockRow {
    index: usize,
    is_text: bool,
    content: String,
    title: String,
    is_first: bool,
    is_last: bool,
}

struct Draft {
    id: Option<i64>,
    name: String,
    blocks: BlockList<DocBlock>,
}

impl Draft {
    fn from_template(template: &ComplianceTemplate) -> Self {
        Draft {
            id: Some(template.id),
            name: template.name.clone(),
            blocks: BlockList::new(template.blocks()),
        }
    }

    fn payload(&self) -> Result<CompliancePayload, String> {
        let name = validation::required("document name", &self.name).map_err(|e| e.to_string())?;
        Ok(CompliancePayload {
            name,
            template_definition: self.blocks.blocks().to_vec(),
            content_html: String::new(),
        })
    }
}

fn editor_page(nav: Nav, draft: &Draft, errors: Option<String>) -> Response {
    let blocks = draft.blocks.blocks();
    let last = blocks.len().saturating_sub(1);
    page(DocumentEditorTemplate {
        nav,
        id: draft.id.map(|id| id.to_string()).unwrap_or_default(),
        is_edit: draft.id.is_some(),
        name: draft.name.clone(),
        definition: serde_json::to_string(blocks).unwrap_or_else(|_| "[]".into()),
        blocks: blocks
            .iter()
            .enumerate()
            .map(|(index, block)| {
                let (is_text, content, title) = match block {
                    DocBlock::Text { content } => (true, content.clone(), String::new()),
                    DocBlock::Signatories { title } => (false, String::new(), title.clone()),
                };
                DocBlockRow {
                    index,
                    is_text,
                    content,
                    title,
                    is_first: index == 0,
                    is_last: index == last,
                }
            })
            .collect(),
        variables: DOCUMENT_VARIABLES
            .iter()
            .enumerate()
            .map(|(i, (label, _))| Choice::new(i.to_string(), *label, false))
            .collect(),
        errors,
    })
}

pub async fn documents_index(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
) -> Result<Html<String>, StatusCode> {
    let api = session_user.api(&state);
    let section = Section::from_result("compliance templates", list_compliance_templates(&api).await);
    let documents = section
        .items()
        .iter()
        .map(|t| DocumentRow {
            id: t.id,
            name: t.name.clone(),
            block_count: t.blocks().len(),
        })
        .collect();

    render(DocumentsIndexTemplate {
        nav: Nav::of(&session_user),
        documents,
        errors: section.error().map(str::to_string),
    })
}

pub async fn document_new(session_user: SessionUser) -> Response {
    let draft = Draft {
        id: None,
        name: String::new(),
        blocks: BlockList::default(),
    };
    editor_page(Nav::of(&session_user), &draft, None)
}

pub async fn document_edit(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Response {
    let api = session_user.api(&state);
    match get_compliance_template_by_id(&api, id).await {
        Ok(Some(template)) => editor_page(Nav::of(&session_user), &Draft::from_template(&template), None),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => api_status(&err).into_response(),
    }
}

pub async fn document_editor(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Response {
    let form = EditorForm::from_pairs(pairs);
    let blocks = match form.blocks::<DocBlock>() {
        Ok(blocks) => blocks,
        Err(message) => {
            warn!(%message, "document editor posted a broken definition");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };
    let mut draft = Draft {
        id: form.id,
        name: form.name.clone(),
        blocks: BlockList::new(blocks),
    };

    let edited = form.apply_edits(&mut draft.blocks, &[]).and_then(|()| match &form.action {
        Some(EditorAction::InsertVariable(index, variable)) => {
            draft.blocks.insert_known_variable(*index, *variable)
        }
        Some(action) => draft.blocks.apply(action),
        None => Ok(()),
    });
    let mut errors = edited.err().map(|e| e.to_string());

    if errors.is_none() && form.action == Some(EditorAction::Save) {
        let api = session_user.api(&state);
        match draft.payload() {
            Ok(payload) => {
                let saved = match draft.id {
                    Some(id) => update_compliance_template(&api, id, &payload).await,
                    None => create_compliance_template(&api, &payload).await,
                };
                match saved {
                    Ok(()) => {
                        info!(name = %payload.name, id = ?draft.id, "compliance template saved");
                        return Redirect::to("/documents").into_response();
                    }
                    Err(err) => errors = Some(err.user_message()),
                }
            }
            Err(message) => errors = Some(message),
        }
    }

    editor_page(Nav::of(&session_user), &draft, errors)
}

pub async fn document_duplicate(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Response {
    let api = session_user.api(&state);
    let source = match get_compliance_template_by_id(&api, id).await {
        Ok(Some(t)) => t,
        Ok(None) => return StatusCode::NOT_FOUND.into_response(),
        Err(err) => return api_status(&err).into_response(),
    };
    match duplicate_compliance_template(&api, &source).await {
        Ok(()) => Redirect::to("/documents").into_response(),
        Err(err) => api_status(&err).into_response(),
    }
}
