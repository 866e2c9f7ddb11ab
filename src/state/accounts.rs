use reqwest::{Method, multipart};

use crate::models::{Account, BulkUploadSummary, NewAccount};

use super::{ApiClient, ApiError, Upload};

pub async fn list_accounts(api: &ApiClient) -> Result<Vec<Account>, ApiError> {
    api.get_json("/accounts/").await
}

pub async fn create_account(api: &ApiClient, account: &NewAccount) -> Result<(), ApiError> {
    api.send_json_discard(Method::POST, "/accounts/", account)
        .await
}

/// Uploads a chart-of-accounts CSV (columns: Category, HEAD, Sub head).
pub async fn bulk_upload_accounts(api: &ApiClient, file: Upload) -> Result<BulkUploadSummary, ApiError> {
    let form = multipart::Form::new().part("file", file.into_part()?);
    api.post_multipart("/accounts/bulk-upload", form).await
}
