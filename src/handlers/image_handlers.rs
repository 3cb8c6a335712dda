use crate::{
    errors::AppError, handlers::form::FormData, models::asset::Image, state::AppState,
};
use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

pub async fn list_images(State(state): State<AppState>) -> Result<Json<Vec<Image>>, AppError> {
    Ok(Json(state.media.list_images().await?))
}

pub async fn get_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Image>, AppError> {
    Ok(Json(state.media.get_image(&id).await?))
}

/// POST `/images`: multipart `name` and `file`.
pub async fn upload_image(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let mut form = FormData::read(multipart).await?;
    let file = form
        .take_file("file")
        .ok_or_else(|| AppError::bad_request("missing image part `file`"))?;
    let name = form.text("name").unwrap_or_else(|| file.file_name.clone());
    let image = state.media.upload_image(name, file).await?;
    Ok((StatusCode::CREATED, Json(image)).into_response())
}

pub async fn delete_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.media.delete_image(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
