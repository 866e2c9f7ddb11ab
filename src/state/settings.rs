use reqwest::Method;

use crate::models::FirmSettings;

use super::{ApiClient, ApiError};

pub async fn get_settings(api: &ApiClient) -> Result<FirmSettings, ApiError> {
    api.get_json("/settings/").await
}

pub async fn save_settings(api: &ApiClient, settings: &FirmSettings) -> Result<(), ApiError> {
    api.send_json_discard(Method::POST, "/settings/", settings)
        .await
}
