use chrono::NaiveDate;
use reqwest::{Method, multipart};
use serde::Serialize;

use crate::models::{
    NewWork, StatementPreview, TrialBalanceEntry, TrialBalanceVersion, Unit, ValidationStats, Work,
};

use super::{ApiClient, ApiError, FileDownload, Upload};

pub async fn list_works(api: &ApiClient) -> Result<Vec<Work>, ApiError> {
    api.get_json("/works/").await
}

pub async fn list_company_works(api: &ApiClient, company_id: i64) -> Result<Vec<Work>, ApiError> {
    api.get_json_query("/works/", &[("company_id", company_id)])
        .await
}

pub async fn get_work_by_id(api: &ApiClient, id: i64) -> Result<Work, ApiError> {
    api.get_json(&format!("/works/{id}")).await
}

pub async fn create_work(api: &ApiClient, work: &NewWork) -> Result<(), ApiError> {
    api.send_json_discard(Method::POST, "/works/", work).await
}

#[derive(Serialize)]
struct NewUnit<'a> {
    unit_name: &'a str,
}

pub async fn create_unit(api: &ApiClient, work_id: i64, unit_name: &str) -> Result<Unit, ApiError> {
    api.send_json(
        Method::POST,
        &format!("/works/{work_id}/units"),
        &NewUnit { unit_name },
    )
    .await
}

pub async fn upload_trial_balance(
    api: &ApiClient,
    work_id: i64,
    unit_id: i64,
    file: Upload,
) -> Result<(), ApiError> {
    let form = multipart::Form::new().part("file", file.into_part()?);
    api.post_multipart_discard(
        &format!("/works/{work_id}/units/{unit_id}/trial-balance"),
        form,
    )
    .await
}

pub async fn list_unit_versions(
    api: &ApiClient,
    work_id: i64,
    unit_id: i64,
) -> Result<Vec<TrialBalanceVersion>, ApiError> {
    api.get_json(&format!("/works/{work_id}/units/{unit_id}/versions"))
        .await
}

pub async fn list_unmapped_entries(api: &ApiClient, work_id: i64) -> Result<Vec<TrialBalanceEntry>, ApiError> {
    api.get_json(&format!("/works/{work_id}/unmapped-entries"))
        .await
}

#[derive(Serialize)]
struct MapEntry {
    trial_balance_entry_id: i64,
    account_sub_head_id: i64,
}

pub async fn map_entry(api: &ApiClient, work_id: i64, entry_id: i64, account_id: i64) -> Result<(), ApiError> {
    api.send_json_discard(
        Method::POST,
        &format!("/works/{work_id}/map-entry"),
        &MapEntry {
            trial_balance_entry_id: entry_id,
            account_sub_head_id: account_id,
        },
    )
    .await
}

pub async fn validation_stats(api: &ApiClient, work_id: i64) -> Result<ValidationStats, ApiError> {
    api.get_json(&format!("/works/{work_id}/validation-stats"))
        .await
}

pub async fn preview_statement(
    api: &ApiClient,
    work_id: i64,
    template_id: i64,
) -> Result<StatementPreview, ApiError> {
    api.get_json(&format!("/works/{work_id}/preview/{template_id}"))
        .await
}

pub async fn download_statement(
    api: &ApiClient,
    work_id: i64,
    template_id: i64,
    format: &str,
) -> Result<FileDownload, ApiError> {
    api.get_file(
        &format!("/works/{work_id}/statements/{template_id}"),
        &[("format", format)],
    )
    .await
}

pub async fn finalize_work(
    api: &ApiClient,
    work_id: i64,
    udin: &str,
    signing_date: NaiveDate,
    certificate: Upload,
) -> Result<(), ApiError> {
    let form = multipart::Form::new()
        .text("udin", udin.to_string())
        .text("signing_date", signing_date.format("%Y-%m-%d").to_string())
        .part("file", certificate.into_part()?);
    api.post_multipart_discard(&format!("/works/{work_id}/finalize"), form)
        .await
}
