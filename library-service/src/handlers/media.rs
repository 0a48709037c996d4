//! Media registration, listing, editing, and lifecycle transitions.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::dtos::{
    DeletedMediaListResponse, DeletedMediaResponse, MediaListResponse, MediaResponse,
    RegisterMediaRequest, UpdateMediaRequest,
};
use crate::middleware::RequesterId;
use crate::models::{FileKind, Media, MediaDetail, MediaFile, MediaKind};
use crate::AppState;
use service_core::error::AppError;

async fn detail_or_not_found(state: &AppState, media_id: Uuid) -> Result<MediaDetail, AppError> {
    state
        .store
        .get_media_detail(media_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Media not found")))
}

/// Upsert tag names and point the entry's tag links at them.
async fn apply_tags(state: &AppState, media_id: Uuid, tags: &[String]) -> Result<(), AppError> {
    let mut tag_ids = Vec::new();
    for name in tags {
        let name = name.trim();
        if name.is_empty() {
            continue;
        }
        let tag = state.store.upsert_tag(name).await?;
        tag_ids.push(tag.tag_id);
    }
    state.store.set_media_tags(media_id, &tag_ids).await
}

fn normalize(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Register an uploaded artifact: create a new entry, or attach the file to
/// an existing one.
///
/// POST /media
#[tracing::instrument(skip_all, fields(user_id = %requester.0))]
pub async fn register_media(
    State(state): State<AppState>,
    requester: RequesterId,
    Json(req): Json<RegisterMediaRequest>,
) -> Result<(StatusCode, Json<MediaResponse>), AppError> {
    req.validate()?;

    let file_kind = FileKind::from_str_opt(&req.file_kind).ok_or_else(|| {
        AppError::BadRequest(anyhow::anyhow!("Only epub and pdf files are allowed"))
    })?;

    if let Some(media_id) = req.media_id {
        let existing = state
            .store
            .find_media_by_id(media_id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Media not found")))?;

        if existing.uploaded_by != requester.0 {
            return Err(AppError::Forbidden(anyhow::anyhow!(
                "You can only add files to your own media"
            )));
        }

        let file = MediaFile::new(media_id, req.file_url.clone(), file_kind);
        state.store.insert_media_file(&file).await?;

        tracing::info!(media_id = %media_id, file_kind = %req.file_kind, "File attached to media");

        let detail = detail_or_not_found(&state, media_id).await?;
        return Ok((StatusCode::OK, Json(detail.into())));
    }

    let title = req
        .title
        .as_deref()
        .and_then(normalize)
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Title is required for new media")))?;

    let media = Media::new(
        title,
        req.author.clone(),
        req.description.clone(),
        req.language.clone(),
        req.publication_date.clone(),
        MediaKind::parse_or_default(req.media_kind.as_deref()),
        requester.0,
    );
    state.store.insert_media(&media).await?;

    let file = MediaFile::new(media.media_id, req.file_url.clone(), file_kind);
    state.store.insert_media_file(&file).await?;

    if let Some(tags) = &req.tags {
        apply_tags(&state, media.media_id, tags).await?;
    }

    tracing::info!(media_id = %media.media_id, "Media registered");

    let detail = detail_or_not_found(&state, media.media_id).await?;
    Ok((StatusCode::CREATED, Json(detail.into())))
}

/// Active listing, library-wide, newest upload first.
///
/// GET /media
#[tracing::instrument(skip_all)]
pub async fn list_media(
    State(state): State<AppState>,
    _requester: RequesterId,
) -> Result<Json<MediaListResponse>, AppError> {
    let media = state.store.list_active_media().await?;
    Ok(Json(MediaListResponse {
        media: media.into_iter().map(MediaResponse::from).collect(),
    }))
}

/// GET /media/{id}
#[tracing::instrument(skip_all)]
pub async fn get_media(
    State(state): State<AppState>,
    _requester: RequesterId,
    Path(media_id): Path<Uuid>,
) -> Result<Json<MediaResponse>, AppError> {
    let detail = detail_or_not_found(&state, media_id).await?;
    Ok(Json(detail.into()))
}

/// Owner metadata edit.
///
/// PUT /media/{id}
#[tracing::instrument(skip_all, fields(user_id = %requester.0))]
pub async fn update_media(
    State(state): State<AppState>,
    requester: RequesterId,
    Path(media_id): Path<Uuid>,
    Json(req): Json<UpdateMediaRequest>,
) -> Result<Json<MediaResponse>, AppError> {
    req.validate()?;

    let mut media = state
        .store
        .find_media_by_id(media_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Media not found")))?;

    if media.uploaded_by != requester.0 {
        return Err(AppError::Forbidden(anyhow::anyhow!(
            "You can only edit your own media"
        )));
    }

    if let Some(title) = req.title.as_deref().and_then(normalize) {
        media.title = title;
    }
    if let Some(author) = req.author.as_deref() {
        media.author = normalize(author);
    }
    if let Some(description) = req.description.as_deref() {
        media.description = normalize(description);
    }
    if let Some(language) = req.language.as_deref() {
        media.language = normalize(language);
    }
    if let Some(publication_date) = req.publication_date.as_deref() {
        media.publication_date = normalize(publication_date);
    }
    // Unknown kinds keep the current value rather than erroring.
    if let Some(kind) = req.media_kind.as_deref().and_then(MediaKind::from_str_opt) {
        media.media_kind = kind.as_str().to_string();
    }

    state.store.update_media(&media).await?;

    if let Some(tags) = &req.tags {
        apply_tags(&state, media_id, tags).await?;
    }

    let detail = detail_or_not_found(&state, media_id).await?;
    Ok(Json(detail.into()))
}

/// Soft delete. Owner-only, and not idempotent: deleting an already-deleted
/// entry is an error.
///
/// DELETE /media/{id}
#[tracing::instrument(skip_all, fields(user_id = %requester.0))]
pub async fn delete_media(
    State(state): State<AppState>,
    requester: RequesterId,
    Path(media_id): Path<Uuid>,
) -> Result<Json<MediaResponse>, AppError> {
    let media = state
        .store
        .find_media_by_id(media_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Media not found")))?;

    if media.uploaded_by != requester.0 {
        return Err(AppError::Forbidden(anyhow::anyhow!(
            "You can only delete your own media"
        )));
    }

    if !state.store.soft_delete_media(media_id, Utc::now()).await? {
        return Err(AppError::NotFound(anyhow::anyhow!("Media not found")));
    }

    tracing::info!(media_id = %media_id, "Media soft deleted");

    let detail = detail_or_not_found(&state, media_id).await?;
    Ok(Json(detail.into()))
}

/// Clear the deletion mark within the grace window.
///
/// POST /media/{id}/restore
#[tracing::instrument(skip_all, fields(user_id = %requester.0))]
pub async fn restore_media(
    State(state): State<AppState>,
    requester: RequesterId,
    Path(media_id): Path<Uuid>,
) -> Result<Json<MediaResponse>, AppError> {
    let media = state
        .store
        .find_media_by_id(media_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Media not found")))?;

    if media.uploaded_by != requester.0 {
        return Err(AppError::Forbidden(anyhow::anyhow!(
            "You can only restore your own media"
        )));
    }

    if !state.store.restore_media(media_id).await? {
        return Err(AppError::InvalidState(anyhow::anyhow!(
            "Media is not deleted"
        )));
    }

    tracing::info!(media_id = %media_id, "Media restored");

    let detail = detail_or_not_found(&state, media_id).await?;
    Ok(Json(detail.into()))
}

/// The caller's own trash, newest deletion first.
///
/// GET /media/deleted
#[tracing::instrument(skip_all, fields(user_id = %requester.0))]
pub async fn list_deleted_media(
    State(state): State<AppState>,
    requester: RequesterId,
) -> Result<Json<DeletedMediaListResponse>, AppError> {
    let now = Utc::now();
    let grace_days = state.config.retention.grace_days;

    let media = state.store.list_deleted_media_for(requester.0).await?;
    let media = media
        .into_iter()
        .map(|detail| {
            let days_remaining = detail
                .media
                .remaining_grace_days(grace_days, now)
                .unwrap_or(0);
            DeletedMediaResponse {
                media: detail.into(),
                days_remaining,
            }
        })
        .collect();

    Ok(Json(DeletedMediaListResponse { media }))
}
