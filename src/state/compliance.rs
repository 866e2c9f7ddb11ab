use reqwest::Method;

use crate::models::{
    CompliancePayload, ComplianceTemplate, RenderedDocument, SeedSummary,
};

use super::{ApiClient, ApiError, FileDownload};

pub async fn list_compliance_templates(api: &ApiClient) -> Result<Vec<ComplianceTemplate>, ApiError> {
    api.get_json("/compliance/templates").await
}

pub async fn get_compliance_template_by_id(
    api: &ApiClient,
    id: i64,
) -> Result<Option<ComplianceTemplate>, ApiError> {
    Ok(list_compliance_templates(api)
        .await?
        .into_iter()
        .find(|t| t.id == id))
}

pub async fn create_compliance_template(api: &ApiClient, template: &CompliancePayload) -> Result<(), ApiError> {
    api.send_json_discard(Method::POST, "/compliance/templates", template)
        .await
}

pub async fn update_compliance_template(
    api: &ApiClient,
    id: i64,
    template: &CompliancePayload,
) -> Result<(), ApiError> {
    api.send_json_discard(Method::PUT, &format!("/compliance/templates/{id}"), template)
        .await
}

pub async fn duplicate_compliance_template(api: &ApiClient, source: &ComplianceTemplate) -> Result<(), ApiError> {
    let payload = CompliancePayload {
        name: format!("{} (Copy)", source.name),
        template_definition: source.blocks(),
        content_html: String::new(),
    };
    create_compliance_template(api, &payload).await
}

pub async fn preview_document(
    api: &ApiClient,
    work_id: i64,
    template_id: i64,
) -> Result<RenderedDocument, ApiError> {
    api.get_json(&format!("/compliance/{work_id}/preview/{template_id}"))
        .await
}

pub async fn download_document(api: &ApiClient, work_id: i64, template_id: i64) -> Result<FileDownload, ApiError> {
    api.get_file(
        &format!("/compliance/{work_id}/download/{template_id}"),
        &[] as &[(&str, &str)],
    )
    .await
}

pub async fn seed_default_templates(api: &ApiClient) -> Result<SeedSummary, ApiError> {
    api.post_empty("/compliance/seed-defaults").await
}
