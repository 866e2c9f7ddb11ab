use reqwest::Method;

use crate::models::{StatementTemplate, TemplatePayload};

use super::{ApiClient, ApiError};

pub async fn list_templates(api: &ApiClient) -> Result<Vec<StatementTemplate>, ApiError> {
    api.get_json("/templates/").await
}

/// There is no single-template endpoint; the record is picked out of the list.
pub async fn get_template_by_id(api: &ApiClient, id: i64) -> Result<Option<StatementTemplate>, ApiError> {
    Ok(list_templates(api).await?.into_iter().find(|t| t.id == id))
}

pub async fn create_template(api: &ApiClient, template: &TemplatePayload) -> Result<(), ApiError> {
    api.send_json_discard(Method::POST, "/templates/", template)
        .await
}

pub async fn update_template(api: &ApiClient, id: i64, template: &TemplatePayload) -> Result<(), ApiError> {
    api.send_json_discard(Method::PUT, &format!("/templates/{id}"), template)
        .await
}

/// Creates a copy of `source` named "<name> (Copy)".
pub async fn duplicate_template(api: &ApiClient, source: &StatementTemplate) -> Result<(), ApiError> {
    let payload = TemplatePayload {
        name: format!("{} (Copy)", source.name),
        statement_type: source.statement_type,
        template_definition: source.template_definition.clone(),
        applicable_client_types: source.applicable_client_types.clone(),
    };
    create_template(api, &payload).await
}
