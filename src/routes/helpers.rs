use std::collections::HashMap;

use askama::Template;
use axum::{
    extract::Multipart,
    http::{HeaderValue, StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use tracing::{error, warn};

use crate::state::{ApiError, FileDownload, Upload};

pub(crate) fn render<T: Template>(tpl: T) -> Result<Html<String>, StatusCode> {
    tpl.render().map(Html).map_err(|err| {
        error!(error = %err, "template render failed");
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

/// Renders to a response, collapsing render failures into a status.
pub(crate) fn page<T: Template>(tpl: T) -> Response {
    render(tpl)
        .map(IntoResponse::into_response)
        .unwrap_or_else(|status| status.into_response())
}

/// Status a handler answers with when a required fetch fails.
pub(crate) fn api_status(err: &ApiError) -> StatusCode {
    match err {
        ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
        ApiError::Api { status: 403, .. } => StatusCode::FORBIDDEN,
        ApiError::Api { status: 404, .. } => StatusCode::NOT_FOUND,
        ApiError::NotReady => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::BAD_GATEWAY,
    }
}

pub(crate) fn require_admin(is_admin: bool) -> Result<(), StatusCode> {
    if is_admin {
        Ok(())
    } else {
        Err(StatusCode::FORBIDDEN)
    }
}

/// Text fields and the first file field of a multipart form.
#[derive(Debug, Default)]
pub(crate) struct MultipartForm {
    pub fields: HashMap<String, String>,
    pub file: Option<Upload>,
}

impl MultipartForm {
    pub fn field(&self, name: &str) -> &str {
        self.fields.get(name).map(String::as_str).unwrap_or_default()
    }
}

pub(crate) async fn read_multipart(mut multipart: Multipart) -> Result<MultipartForm, StatusCode> {
    let mut form = MultipartForm::default();
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => {
                warn!(error = %err, "malformed multipart body");
                return Err(StatusCode::BAD_REQUEST);
            }
        };
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map_err(|_| StatusCode::BAD_REQUEST)?;

        match file_name {
            Some(file_name) if !file_name.is_empty() => {
                if form.file.is_none() {
                    form.file = Some(Upload {
                        file_name,
                        content_type,
                        bytes: bytes.to_vec(),
                    });
                }
            }
            // A file input left empty still arrives, with an empty file name.
            Some(_) => {}
            None => {
                form.fields
                    .insert(name, String::from_utf8_lossy(&bytes).into_owned());
            }
        }
    }
    Ok(form)
}

/// Streams a file from the API back to the browser unchanged.
pub(crate) fn forward_file(file: FileDownload) -> Response {
    let mut response = (StatusCode::OK, file.bytes).into_response();
    if let Ok(value) = HeaderValue::from_str(&file.content_type) {
        response.headers_mut().insert(header::CONTENT_TYPE, value);
    }
    if let Some(disposition) = file
        .content_disposition
        .and_then(|d| HeaderValue::from_str(&d).ok())
    {
        response
            .headers_mut()
            .insert(header::CONTENT_DISPOSITION, disposition);
    }
    response
}

pub(crate) fn parse_id(raw: &str) -> Option<i64> {
    raw.trim().parse().ok()
}

/// Who is looking at the page, for the layout's navigation bar.
pub(crate) struct Nav {
    pub username: String,
    pub is_admin: bool,
}

impl Nav {
    pub fn of(user: &crate::session::SessionUser) -> Self {
        Nav {
            username: user.username().to_string(),
            is_admin: user.is_admin(),
        }
    }

    pub fn anonymous() -> Self {
        Nav {
            username: String::new(),
            is_admin: false,
        }
    }

    pub fn signed_in(&self) -> bool {
        !self.username.is_empty()
    }
}

/// One entry of a `<select>` or checkbox group.
pub(crate) struct Choice {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

impl Choice {
    pub fn new(value: impl Into<String>, label: impl Into<String>, selected: bool) -> Self {
        Choice {
            value: value.into(),
            label: label.into(),
            selected,
        }
    }
}

/// `path` with URL-encoded query parameters; empty values are left out.
pub(crate) fn href(path: &str, params: &[(&str, &str)]) -> String {
    let kept: Vec<&(&str, &str)> = params.iter().filter(|(_, v)| !v.is_empty()).collect();
    if kept.is_empty() {
        return path.to_string();
    }
    let Ok(mut url) = reqwest::Url::parse("http://local.invalid/") else {
        return path.to_string();
    };
    url.query_pairs_mut()
        .extend_pairs(kept.iter().map(|(k, v)| (*k, *v)));
    format!("{path}?{}", url.query().unwrap_or_default())
}
