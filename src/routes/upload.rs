use crate::{error::AppError, state::AppState, upload::receive_file};
use actix_multipart::Multipart;
use actix_web::{post, web, HttpResponse, Responder};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub file_path: String,
}

/// Accepts one file in the multipart field `file` and returns where it was stored.
///
/// ## Responses:
/// - `201 Created`: `{ filePath }`.
/// - `400 Bad Request`: no file, a disallowed extension, or a file over the size limit.
#[post("")]
pub async fn upload_file(
    state: web::Data<AppState>,
    payload: Multipart,
) -> Result<impl Responder, AppError> {
    let file = receive_file(payload, state.max_upload_bytes).await?;
    let file_path = state.blobs.put(&file.extension, file.bytes).await?;
    Ok(HttpResponse::Created().json(UploadResponse { file_path }))
}
