// routes/companies.rs
// Client companies: list + create, detail page with works and signatories.

use std::sync::Arc;

use askama::Template;
use axum::{
    extract::{Form, Path, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::info;

use crate::{
    models::{ClientType, Company, DESIGNATIONS, NewCompany, NewSignatory, NewWork},
    routes::helpers::{Choice, Nav, api_status, page},
    sections::Section,
    session::SessionUser,
    state::{
        AppState, ApiClient, create_company, create_signatory, create_work, get_company_by_id,
        list_companies, list_company_works, list_signatories,
    },
    validation::{self, ValidationError},
};

#[derive(Template)]
#[template(path = "companies/index.html")]
struct CompaniesIndexTemplate {
    nav: Nav,
    companies: Vec<CompanyRow>,
    client_types: Vec<Choice>,
    form: CompanyFormValues,
    errors: Option<String>,
}

/// Form inputs echoed back after a failed submission.
struct CompanyFormValues {
    legal_name: String,
    cin: String,
    pan: String,
    tan: String,
    gstin: String,
    registered_address: String,
}

struct CompanyRow {
    id: i64,
    legal_name: String,
    client_type: &'static str,
    pan: String,
}

#[derive(Template)]
#[template(path = "companies/show.html")]
struct CompanyShowTemplate {
    nav: Nav,
    company: CompanyDetail,
    works: Vec<WorkRow>,
    works_error: Option<String>,
    signatories: Vec<SignatoryRow>,
    signatories_error: Option<String>,
    designations: Vec<Choice>,
    errors: Option<String>,
}

struct CompanyDetail {
    id: i64,
    legal_name: String,
    client_type: &'static str,
    cin: String,
    pan: String,
    tan: String,
    gstin: String,
    registered_address: String,
}

struct WorkRow {
    id: i64,
    period: String,
    status: &'static str,
    unit_count: usize,
}

struct SignatoryRow {
    name: String,
    designation: String,
    identifier: String,
}

#[derive(Deserialize, Default)]
pub(crate) struct CompanyFormData {
    #[serde(default)]
    legal_name: String,
    #[serde(default)]
    client_type: String,
    #[serde(default)]
    cin: Option<String>,
    #[serde(default)]
    pan: Option<String>,
    #[serde(default)]
    tan: Option<String>,
    #[serde(default)]
    gstin: Option<String>,
    #[serde(default)]
    registered_address: Option<String>,
}

impl CompanyFormData {
    fn validate(&self) -> Result<NewCompany, ValidationError> {
        Ok(NewCompany {
            legal_name: validation::required("legal name", &self.legal_name)?,
            client_type: ClientType::parse(&self.client_type)
                .ok_or(ValidationError::InvalidChoice("client type"))?,
            cin: validation::optional(self.cin.clone()),
            pan: validation::optional(self.pan.clone()),
            tan: validation::optional(self.tan.clone()),
            gstin: validation::optional(self.gstin.clone()),
            registered_address: validation::optional(self.registered_address.clone()),
        })
    }

    fn field(value: &Option<String>) -> String {
        value.clone().unwrap_or_default()
    }
}

#[derive(Deserialize)]
pub(crate) struct WorkFormData {
    #[serde(default)]
    start_date: String,
    #[serde(default)]
    end_date: String,
}

#[derive(Deserialize)]
pub(crate) struct SignatoryFormData {
    #[serde(default)]
    name: String,
    #[serde(default)]
    designation: String,
    #[serde(default)]
    din_number: Option<String>,
    #[serde(default)]
    pan_number: Option<String>,
}

async fn index_page(nav: Nav, api: &ApiClient, form: CompanyFormData, errors: Option<String>) -> Response {
    let section = Section::from_result("companies", list_companies(api).await);
    let companies = section
        .items()
        .iter()
        .map(|c| CompanyRow {
            id: c.id,
            legal_name: c.legal_name.clone(),
            client_type: c.client_type.label(),
            pan: c.pan.clone().unwrap_or_default(),
        })
        .collect();
    let selected = ClientType::parse(&form.client_type).unwrap_or(ClientType::Company);

    page(CompaniesIndexTemplate {
        nav,
        companies,
        client_types: ClientType::ALL
            .iter()
            .map(|c| Choice::new(c.as_str(), c.label(), *c == selected))
            .collect(),
        form: CompanyFormValues {
            legal_name: form.legal_name.clone(),
            cin: CompanyFormData::field(&form.cin),
            pan: CompanyFormData::field(&form.pan),
            tan: CompanyFormData::field(&form.tan),
            gstin: CompanyFormData::field(&form.gstin),
            registered_address: CompanyFormData::field(&form.registered_address),
        },
        errors: errors.or_else(|| section.error().map(str::to_string)),
    })
}

pub async fn companies_index(session_user: SessionUser, State(state): State<Arc<AppState>>) -> Response {
    let api = session_user.api(&state);
    index_page(Nav::of(&session_user), &api, CompanyFormData::default(), None).await
}

pub async fn companies_create(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Form(form): Form<CompanyFormData>,
) -> Response {
    let api = session_user.api(&state);
    let new_company = match form.validate() {
        Ok(c) => c,
        Err(err) => {
            return index_page(Nav::of(&session_user), &api, form, Some(err.to_string())).await;
        }
    };
    match create_company(&api, &new_company).await {
        Ok(company) => {
            info!(company_id = company.id, "company created");
            Redirect::to(&format!("/companies/{}", company.id)).into_response()
        }
        Err(err) => index_page(Nav::of(&session_user), &api, form, Some(err.user_message())).await,
    }
}

fn detail(company: Company) -> CompanyDetail {
    CompanyDetail {
        id: company.id,
        legal_name: company.legal_name,
        client_type: company.client_type.label(),
        cin: CompanyFormData::field(&company.cin),
        pan: CompanyFormData::field(&company.pan),
        tan: CompanyFormData::field(&company.tan),
        gstin: CompanyFormData::field(&company.gstin),
        registered_address: CompanyFormData::field(&company.registered_address),
    }
}

async fn show_page(nav: Nav, api: &ApiClient, id: i64, errors: Option<String>) -> Response {
    let (company, works, signatories) = futures::join!(
        get_company_by_id(api, id),
        list_company_works(api, id),
        list_signatories(api, id),
    );
    let company = match company {
        Ok(company) => company,
        Err(err) => return api_status(&err).into_response(),
    };
    let works = Section::from_result("company works", works);
    let signatories = Section::from_result("signatories", signatories);

    page(CompanyShowTemplate {
        nav,
        company: detail(company),
        works: works
            .items()
            .iter()
            .map(|w| WorkRow {
                id: w.id,
                period: w.period_label(),
                status: w.status.as_str(),
                unit_count: w.units.len(),
            })
            .collect(),
        works_error: works.error().map(str::to_string),
        signatories: signatories
            .items()
            .iter()
            .map(|s| SignatoryRow {
                name: s.name.clone(),
                designation: s.designation.clone(),
                identifier: s.identifier(),
            })
            .collect(),
        signatories_error: signatories.error().map(str::to_string),
        designations: DESIGNATIONS
            .iter()
            .map(|d| Choice::new(*d, *d, false))
            .collect(),
        errors,
    })
}

pub async fn company_show(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Response {
    let api = session_user.api(&state);
    show_page(Nav::of(&session_user), &api, id, None).await
}

pub async fn company_works_create(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Form(form): Form<WorkFormData>,
) -> Response {
    let api = session_user.api(&state);
    let work = match validation::parse_period(&form.start_date, &form.end_date) {
        Ok((start_date, end_date)) => NewWork {
            company_id: id,
            start_date,
            end_date,
        },
        Err(err) => return show_page(Nav::of(&session_user), &api, id, Some(err.to_string())).await,
    };
    match create_work(&api, &work).await {
        Ok(()) => {
            info!(company_id = id, "work created");
            Redirect::to(&format!("/companies/{id}")).into_response()
        }
        Err(err) => show_page(Nav::of(&session_user), &api, id, Some(err.user_message())).await,
    }
}

pub async fn company_signatories_create(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Form(form): Form<SignatoryFormData>,
) -> Response {
    let api = session_user.api(&state);
    let signatory = validation::required("name", &form.name).and_then(|name| {
        let designation = validation::required("designation", &form.designation)?;
        Ok(NewSignatory {
            company_id: id,
            name,
            designation,
            din_number: validation::optional(form.din_number.clone()),
            pan_number: validation::optional(form.pan_number.clone()),
        })
    });
    let signatory = match signatory {
        Ok(s) => s,
        Err(err) => return show_page(Nav::of(&session_user), &api, id, Some(err.to_string())).await,
    };
    match create_signatory(&api, &signatory).await {
        Ok(()) => Redirect::to(&format!("/companies/{id}")).into_response(),
        Err(err) => show_page(Nav::of(&session_user), &api, id, Some(err.user_message())).await,
    }
}
