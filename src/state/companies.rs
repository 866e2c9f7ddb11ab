use reqwest::Method;

use crate::models::{Company, NewCompany, NewSignatory, Signatory};

use super::{ApiClient, ApiError};

pub async fn list_companies(api: &ApiClient) -> Result<Vec<Company>, ApiError> {
    api.get_json("/companies/").await
}

pub async fn get_company_by_id(api: &ApiClient, id: i64) -> Result<Company, ApiError> {
    api.get_json(&format!("/companies/{id}")).await
}

pub async fn create_company(api: &ApiClient, company: &NewCompany) -> Result<Company, ApiError> {
    api.send_json(Method::POST, "/companies/", company).await
}

pub async fn list_signatories(api: &ApiClient, company_id: i64) -> Result<Vec<Signatory>, ApiError> {
    api.get_json(&format!("/signatories/{company_id}")).await
}

pub async fn create_signatory(api: &ApiClient, signatory: &NewSignatory) -> Result<(), ApiError> {
    api.send_json_discard(Method::POST, "/signatories/", signatory)
        .await
}
