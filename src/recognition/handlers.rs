use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    routing::post,
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use tracing::{instrument, warn};

use super::dto::{RecognitionData, RecognizeBase64Request};
use super::services::{image_format, recognize_food, RecognitionOutcome};
use crate::error::{ApiResponse, AppError, AppResult};
use crate::state::AppState;

// multipart framing on top of the file itself
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn upload_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        .route("/upload/recognize", post(recognize_upload))
        .route("/upload/recognize/base64", post(recognize_base64))
        // base64 inflates the payload by a third
        .layer(DefaultBodyLimit::max(max_upload_size / 3 * 4 + MULTIPART_OVERHEAD))
}

/// POST /upload/recognize (multipart, field `file`)
#[instrument(skip(state, mp))]
pub async fn recognize_upload(
    State(state): State<AppState>,
    mut mp: Multipart,
) -> AppResult<Json<ApiResponse<RecognitionData>>> {
    while let Some(field) = mp
        .next_field()
        .await
        .map_err(|e| AppError::validation(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let extension = field
            .file_name()
            .and_then(|n| n.rsplit_once('.'))
            .map(|(_, ext)| ext.to_string())
            .unwrap_or_default();
        let format = image_format(&extension).ok_or_else(|| {
            warn!(%extension, "unsupported image type");
            AppError::validation("unsupported image format, use jpg, jpeg, png or webp")
        })?;
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::validation(e.to_string()))?;
        return run(&state, data, format).await;
    }
    Err(AppError::validation("file is required"))
}

/// POST /upload/recognize/base64 { image_base64, format? }
#[instrument(skip(state, body))]
pub async fn recognize_base64(
    State(state): State<AppState>,
    Json(body): Json<RecognizeBase64Request>,
) -> AppResult<Json<ApiResponse<RecognitionData>>> {
    let format = image_format(body.format.as_deref().unwrap_or("jpeg"))
        .ok_or_else(|| AppError::validation("unsupported image format"))?;
    let encoded = strip_data_url(body.image_base64.trim());
    let data = STANDARD
        .decode(encoded)
        .map_err(|_| AppError::validation("invalid base64"))?;
    run(&state, Bytes::from(data), format).await
}

async fn run(
    state: &AppState,
    data: Bytes,
    format: &str,
) -> AppResult<Json<ApiResponse<RecognitionData>>> {
    if data.is_empty() {
        return Err(AppError::validation("image is empty"));
    }
    if data.len() > state.config.max_upload_size {
        warn!(size = data.len(), "upload too large");
        return Err(AppError::Validation(format!(
            "file too large, max {} bytes",
            state.config.max_upload_size
        )));
    }

    let RecognitionOutcome {
        success,
        foods,
        error,
    } = recognize_food(state.vision.as_ref(), data, format).await;

    if !success {
        return Ok(Json(ApiResponse {
            success: false,
            message: error,
            data: None,
        }));
    }
    Ok(Json(ApiResponse::ok_with_message(
        "recognition succeeded",
        RecognitionData { foods },
    )))
}

fn strip_data_url(s: &str) -> &str {
    match s.split_once(";base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => s,
    }
}
