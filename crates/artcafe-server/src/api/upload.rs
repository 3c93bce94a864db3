//! Request bodies that arrive either as JSON or as `multipart/form-data`.

use axum::extract::multipart::MultipartError;
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::error::ApiError;
use crate::state::AppState;

/// A file pulled out of a multipart body.
#[derive(Debug)]
pub(crate) struct UploadedFile {
    pub file_name: String,
    pub data: Vec<u8>,
}

pub(crate) fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(e.body_text())
    } else {
        ApiError::BadRequest(format!("Multipart error: {}", e.body_text()))
    }
}

/// Read the first file field called `name`. Other fields are skipped.
pub(crate) async fn read_file_field(
    multipart: &mut Multipart,
    name: &str,
) -> Result<Option<UploadedFile>, ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(name) {
            continue;
        }
        let file_name = field.file_name().unwrap_or("image").to_string();
        let data = field.bytes().await.map_err(multipart_error)?;
        return Ok(Some(UploadedFile {
            file_name,
            data: data.to_vec(),
        }));
    }
    Ok(None)
}

/// Body of post create/update.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PostForm {
    pub title: Option<String>,
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub image_name: Option<String>,
    /// Only set for multipart bodies carrying an `image` part.
    #[serde(skip)]
    pub image: Option<UploadedFile>,
}

impl FromRequest<AppState> for PostForm {
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("multipart/form-data"));

        if !is_multipart {
            let Json(form) = Json::<PostForm>::from_request(req, state)
                .await
                .map_err(|e| ApiError::BadRequest(e.body_text()))?;
            return Ok(form);
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;

        let mut form = PostForm::default();
        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = field.name().map(str::to_owned);
            match name.as_deref() {
                Some("title") => form.title = Some(field.text().await.map_err(multipart_error)?),
                Some("content") => {
                    form.content = Some(field.text().await.map_err(multipart_error)?)
                }
                Some("image") => {
                    let file_name = field.file_name().unwrap_or("image").to_string();
                    let data = field.bytes().await.map_err(multipart_error)?;
                    if !data.is_empty() {
                        form.image = Some(UploadedFile {
                            file_name,
                            data: data.to_vec(),
                        });
                    }
                }
                _ => {}
            }
        }
        Ok(form)
    }
}
