//! The API gateway client.
//!
//! One `ApiClient` is built at start-up. Handlers never mutate it; a request
//! made on behalf of a logged-in user goes through [`ApiClient::with_credential`],
//! which returns a copy carrying that user's bearer token. A client without a
//! credential never sends an `Authorization` header.

use std::sync::Arc;

use reqwest::{
    Method, RequestBuilder, Response, StatusCode,
    header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    multipart,
};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

use super::ApiError;

/// A file received from the browser and forwarded to the API.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub(crate) fn into_part(self) -> Result<multipart::Part, ApiError> {
        let part = multipart::Part::bytes(self.bytes).file_name(self.file_name);
        match self.content_type {
            Some(ct) => part.mime_str(&ct).map_err(ApiError::from),
            None => Ok(part),
        }
    }
}

/// A file returned by the API (statement PDF/XLSX, compliance document).
#[derive(Debug, Clone)]
pub struct FileDownload {
    pub content_type: String,
    pub content_disposition: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Arc<str>,
    credential: Option<Arc<str>>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("authenticated", &self.credential.is_some())
            .finish()
    }
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder().build()?;
        Ok(ApiClient {
            http,
            base_url: Arc::from(base_url.trim_end_matches('/')),
            credential: None,
        })
    }

    /// A client attaching `token` to every request it issues.
    pub fn with_credential(&self, token: &str) -> Self {
        ApiClient {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            credential: Some(Arc::from(token)),
        }
    }

    /// The same transport without any credential.
    pub fn anonymous(&self) -> Self {
        ApiClient {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            credential: None,
        }
    }

    pub fn credential(&self) -> Option<&str> {
        self.credential.as_deref()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, self.url(path));
        match &self.credential {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn execute(&self, method: Method, path: &str, builder: RequestBuilder) -> Result<Response, ApiError> {
        debug!(%method, path, "api request");
        let response = builder.send().await.map_err(|err| {
            warn!(%method, path, error = %err, "api transport failure");
            ApiError::from(err)
        })?;
        check_response(response).await.inspect_err(|err| {
            warn!(%method, path, error = %err, "api request failed");
        })
    }

    async fn decode<T: DeserializeOwned>(path: &str, response: Response) -> Result<T, ApiError> {
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|err| ApiError::Decode {
            path: path.to_string(),
            message: err.to_string(),
        })
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self
            .execute(Method::GET, path, self.request(Method::GET, path))
            .await?;
        Self::decode(path, response).await
    }

    pub(crate) async fn get_json_query<T, Q>(&self, path: &str, query: &Q) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let builder = self.request(Method::GET, path).query(query);
        let response = self.execute(Method::GET, path, builder).await?;
        Self::decode(path, response).await
    }

    pub(crate) async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let builder = self.request(method.clone(), path).json(body);
        let response = self.execute(method, path, builder).await?;
        Self::decode(path, response).await
    }

    /// Sends a JSON body and ignores whatever the API answers on success.
    pub(crate) async fn send_json_discard<B>(&self, method: Method, path: &str, body: &B) -> Result<(), ApiError>
    where
        B: Serialize + ?Sized,
    {
        let builder = self.request(method.clone(), path).json(body);
        self.execute(method, path, builder).await.map(|_| ())
    }

    pub(crate) async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self
            .execute(Method::POST, path, self.request(Method::POST, path))
            .await?;
        Self::decode(path, response).await
    }

    pub(crate) async fn post_form<T, F>(&self, path: &str, form: &F) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        F: Serialize + ?Sized,
    {
        let builder = self.request(Method::POST, path).form(form);
        let response = self.execute(Method::POST, path, builder).await?;
        Self::decode(path, response).await
    }

    pub(crate) async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: multipart::Form,
    ) -> Result<T, ApiError> {
        let builder = self.request(Method::POST, path).multipart(form);
        let response = self.execute(Method::POST, path, builder).await?;
        Self::decode(path, response).await
    }

    pub(crate) async fn post_multipart_discard(&self, path: &str, form: multipart::Form) -> Result<(), ApiError> {
        let builder = self.request(Method::POST, path).multipart(form);
        self.execute(Method::POST, path, builder).await.map(|_| ())
    }

    pub(crate) async fn get_file<Q>(&self, path: &str, query: &Q) -> Result<FileDownload, ApiError>
    where
        Q: Serialize + ?Sized,
    {
        let builder = self.request(Method::GET, path).query(query);
        let response = self.execute(Method::GET, path, builder).await?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        let content_disposition = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await?.to_vec();
        Ok(FileDownload {
            content_type,
            content_disposition,
            bytes,
        })
    }
}

/// Maps non-success responses to [`ApiError`]; 401 becomes `Unauthenticated`.
pub async fn check_response(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        return Err(ApiError::Unauthenticated);
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ApiError::Api {
            status: status.as_u16(),
            message: error_detail(&body),
        });
    }
    Ok(response)
}

/// Pulls `detail` out of a JSON error body, falling back to the raw text.
fn error_detail(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| match v.get("detail") {
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
            None => None,
        })
        .unwrap_or_else(|| body.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_field_is_preferred_over_raw_body() {
        assert_eq!(error_detail(r#"{"detail":"Username taken"}"#), "Username taken");
        assert_eq!(error_detail("plain failure"), "plain failure");
        assert_eq!(error_detail(""), "");
    }

    #[test]
    fn credential_is_scoped_to_the_derived_client() {
        let base = ApiClient::new("http://api.local/").unwrap();
        let authed = base.with_credential("tok-1");
        assert_eq!(base.credential(), None);
        assert_eq!(authed.credential(), Some("tok-1"));
        assert_eq!(authed.anonymous().credential(), None);
        assert_eq!(authed.url("/companies/"), "http://api.local/companies/");
    }

    #[tokio::test]
    async fn unauthorized_maps_to_unauthenticated() {
        let response = Response::from(
            axum::http::Response::builder()
                .status(401)
                .body("")
                .unwrap(),
        );
        assert!(matches!(
            check_response(response).await,
            Err(ApiError::Unauthenticated)
        ));
    }
}
