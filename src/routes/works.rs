// routes/works.rs
// Works across all companies, plus the create form.

use std::{collections::HashMap, sync::Arc};

use askama::Template;
use axum::{
    extract::{Form, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::info;

use crate::{
    models::NewWork,
    routes::helpers::{Choice, Nav, page, parse_id},
    sections::Section,
    session::SessionUser,
    state::{ApiClient, AppState, create_work, list_companies, list_works},
    validation::{self, ValidationError},
};

#[derive(Template)]
#[template(path = "works/index.html")]
struct WorksIndexTemplate {
    nav: Nav,
    works: Vec<WorkRow>,
    companies: Vec<Choice>,
    errors: Option<String>,
}

struct WorkRow {
    id: i64,
    company_id: i64,
    company_name: String,
    period: String,
    status: &'static str,
    is_finalized: bool,
}

#[derive(Deserialize)]
pub(crate) struct WorkFormData {
    #[serde(default)]
    company_id: String,
    #[serde(default)]
    start_date: String,
    #[serde(default)]
    end_date: String,
}

impl WorkFormData {
    fn validate(&self) -> Result<NewWork, ValidationError> {
        let company_id = parse_id(&self.company_id).ok_or(ValidationError::Required("company"))?;
        let (start_date, end_date) = validation::parse_period(&self.start_date, &self.end_date)?;
        Ok(NewWork {
            company_id,
            start_date,
            end_date,
        })
    }
}

async fn index_page(nav: Nav, api: &ApiClient, errors: Option<String>) -> Response {
    let (works, companies) = futures::join!(list_works(api), list_companies(api));
    let works = Section::from_result("works", works);
    let companies = Section::from_result("companies", companies);

    let names: HashMap<i64, &str> = companies
        .items()
        .iter()
        .map(|c| (c.id, c.legal_name.as_str()))
        .collect();

    let rows = works
        .items()
        .iter()
        .map(|w| WorkRow {
            id: w.id,
            company_id: w.company_id,
            company_name: names
                .get(&w.company_id)
                .map(|n| n.to_string())
                .unwrap_or_else(|| format!("Company #{}", w.company_id)),
            period: w.period_label(),
            status: w.status.as_str(),
            is_finalized: w.status.is_finalized(),
        })
        .collect();

    let errors = errors
        .or_else(|| works.error().map(str::to_string))
        .or_else(|| companies.error().map(str::to_string));

    page(WorksIndexTemplate {
        nav,
        works: rows,
        companies: companies
            .items()
            .iter()
            .map(|c| Choice::new(c.id.to_string(), c.legal_name.clone(), false))
            .collect(),
        errors,
    })
}

pub async fn works_index(session_user: SessionUser, State(state): State<Arc<AppState>>) -> Response {
    let api = session_user.api(&state);
    index_page(Nav::of(&session_user), &api, None).await
}

pub async fn works_create(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Form(form): Form<WorkFormData>,
) -> Response {
    let api = session_user.api(&state);
    let work = match form.validate() {
        Ok(w) => w,
        Err(err) => return index_page(Nav::of(&session_user), &api, Some(err.to_string())).await,
    };
    match create_work(&api, &work).await {
        Ok(()) => {
            info!(company_id = work.company_id, "work created");
            Redirect::to("/works").into_response()
        }
        Err(err) => index_page(Nav::of(&session_user), &api, Some(err.user_message())).await,
    }
}
