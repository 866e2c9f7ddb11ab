use reqwest::Method;

use crate::models::ReportConfig;

use super::{ApiClient, ApiError};

pub async fn get_report_config(api: &ApiClient, work_id: i64) -> Result<ReportConfig, ApiError> {
    api.get_json(&format!("/reports/{work_id}/config")).await
}

pub async fn save_report_config(api: &ApiClient, work_id: i64, config: &ReportConfig) -> Result<(), ApiError> {
    api.send_json_discard(Method::POST, &format!("/reports/{work_id}/config"), config)
        .await
}
