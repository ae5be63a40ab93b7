use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    routing,
};
use serde::{Deserialize, Serialize};

use crate::{
    common::{ApiError, ApiResult, AppState},
    store::{Photo, is_safe_filename},
};

const MSG_MISSING_IMAGE: &str = "No se recibió imagen";
const MSG_NOT_FOUND: &str = "Foto no encontrada";
const MSG_DELETED: &str = "Foto eliminada";
const MSG_INVALID_NAME: &str = "Nombre de archivo inválido";

#[derive(Deserialize)]
pub struct SavePhotoRequest {
    pub imagen: Option<String>,
}

#[derive(Serialize)]
pub struct PhotoList {
    pub success: bool,
    pub fotos: Vec<Photo>,
}

#[derive(Serialize)]
pub struct SavedPhoto {
    pub success: bool,
    #[serde(flatten)]
    pub photo: Photo,
}

#[derive(Serialize)]
pub struct Deleted {
    pub success: bool,
    pub message: String,
}

pub fn photo_routes() -> Router<AppState> {
    Router::new()
        .route("/api/fotos", routing::get(list_photos))
        .route("/api/fotos/{filename}", routing::delete(delete_photo))
        .route("/api/guardar-foto", routing::post(save_photo))
        .method_not_allowed_fallback(unknown_route)
}

/// Known path, unsupported method: answered like an unknown path.
async fn unknown_route() -> StatusCode {
    StatusCode::NOT_FOUND
}

async fn list_photos(State(state): State<AppState>) -> ApiResult<Json<PhotoList>> {
    let fotos = state.store.list_photos().await?;
    Ok(Json(PhotoList {
        success: true,
        fotos,
    }))
}

async fn save_photo(
    State(state): State<AppState>,
    body: Result<Json<SavePhotoRequest>, JsonRejection>,
) -> ApiResult<Json<SavedPhoto>> {
    let req = match body {
        Ok(Json(req)) => req,
        // a non-JSON body carries no image
        Err(JsonRejection::MissingJsonContentType(_)) => SavePhotoRequest { imagen: None },
        Err(e) => return Err(e.into()),
    };
    let imagen = req
        .imagen
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::BadRequest(MSG_MISSING_IMAGE.to_string()))?;

    let photo = state.store.save_photo(&imagen).await?;
    tracing::info!("stored {}", photo.filename);

    Ok(Json(SavedPhoto {
        success: true,
        photo,
    }))
}

async fn delete_photo(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> ApiResult<Json<Deleted>> {
    if !is_safe_filename(&filename) {
        tracing::warn!("rejected delete of {filename:?}");
        return Err(ApiError::BadRequest(MSG_INVALID_NAME.to_string()));
    }

    if !state.store.delete_photo(&filename).await? {
        return Err(ApiError::NotFound(MSG_NOT_FOUND.to_string()));
    }

    Ok(Json(Deleted {
        success: true,
        message: MSG_DELETED.to_string(),
    }))
}
