//! Collection CRUD and membership.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;
use validator::Validate;

use crate::dtos::{
    AddCollectionMediaRequest, CollectionListResponse, CollectionResponse,
    CreateCollectionRequest, UpdateCollectionRequest,
};
use crate::middleware::RequesterId;
use crate::models::Collection;
use crate::AppState;
use service_core::error::AppError;

async fn owned_collection(
    state: &AppState,
    collection_id: Uuid,
    requester: RequesterId,
    action: &str,
) -> Result<Collection, AppError> {
    let collection = state
        .store
        .find_collection_by_id(collection_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Collection not found")))?;

    if collection.owner_id != requester.0 {
        return Err(AppError::Forbidden(anyhow::anyhow!(
            "You can only {} your own collections",
            action
        )));
    }

    Ok(collection)
}

async fn collection_response(
    state: &AppState,
    collection_id: Uuid,
) -> Result<CollectionResponse, AppError> {
    state
        .store
        .get_collection_detail(collection_id)
        .await?
        .map(CollectionResponse::from)
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Collection not found")))
}

/// POST /collections
#[tracing::instrument(skip_all, fields(user_id = %requester.0))]
pub async fn create_collection(
    State(state): State<AppState>,
    requester: RequesterId,
    Json(req): Json<CreateCollectionRequest>,
) -> Result<(StatusCode, Json<CollectionResponse>), AppError> {
    req.validate()?;

    let name = req.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Collection name is required"
        )));
    }

    let collection = Collection::new(name, req.description.clone(), requester.0);
    state.store.insert_collection(&collection).await?;

    tracing::info!(collection_id = %collection.collection_id, "Collection created");

    Ok((
        StatusCode::CREATED,
        Json(collection_response(&state, collection.collection_id).await?),
    ))
}

/// The caller's collections, name order, with non-deleted members.
///
/// GET /collections
#[tracing::instrument(skip_all, fields(user_id = %requester.0))]
pub async fn list_collections(
    State(state): State<AppState>,
    requester: RequesterId,
) -> Result<Json<CollectionListResponse>, AppError> {
    let collections = state.store.list_collections_for(requester.0).await?;
    Ok(Json(CollectionListResponse {
        collections: collections
            .into_iter()
            .map(CollectionResponse::from)
            .collect(),
    }))
}

/// GET /collections/{id}
#[tracing::instrument(skip_all, fields(user_id = %requester.0))]
pub async fn get_collection(
    State(state): State<AppState>,
    requester: RequesterId,
    Path(collection_id): Path<Uuid>,
) -> Result<Json<CollectionResponse>, AppError> {
    owned_collection(&state, collection_id, requester, "view").await?;
    Ok(Json(collection_response(&state, collection_id).await?))
}

/// PUT /collections/{id}
#[tracing::instrument(skip_all, fields(user_id = %requester.0))]
pub async fn update_collection(
    State(state): State<AppState>,
    requester: RequesterId,
    Path(collection_id): Path<Uuid>,
    Json(req): Json<UpdateCollectionRequest>,
) -> Result<Json<CollectionResponse>, AppError> {
    req.validate()?;

    let mut collection = owned_collection(&state, collection_id, requester, "edit").await?;

    if let Some(name) = req.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        collection.collection_name = name.to_string();
    }
    if let Some(description) = req.description.as_deref() {
        let trimmed = description.trim();
        collection.description = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
    }

    state.store.update_collection(&collection).await?;
    Ok(Json(collection_response(&state, collection_id).await?))
}

/// DELETE /collections/{id}
#[tracing::instrument(skip_all, fields(user_id = %requester.0))]
pub async fn delete_collection(
    State(state): State<AppState>,
    requester: RequesterId,
    Path(collection_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    owned_collection(&state, collection_id, requester, "delete").await?;
    state.store.delete_collection(collection_id).await?;

    tracing::info!(collection_id = %collection_id, "Collection deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// Add a media entry to a collection. Soft-deleted media cannot be added;
/// re-adding an existing member is a no-op.
///
/// POST /collections/{id}/media
#[tracing::instrument(skip_all, fields(user_id = %requester.0))]
pub async fn add_collection_media(
    State(state): State<AppState>,
    requester: RequesterId,
    Path(collection_id): Path<Uuid>,
    Json(req): Json<AddCollectionMediaRequest>,
) -> Result<Json<CollectionResponse>, AppError> {
    owned_collection(&state, collection_id, requester, "modify").await?;

    let media = state.store.find_media_by_id(req.media_id).await?;
    let active = media.map(|m| !m.is_deleted()).unwrap_or(false);
    if !active {
        return Err(AppError::NotFound(anyhow::anyhow!("Media not found")));
    }

    state
        .store
        .add_collection_media(collection_id, req.media_id)
        .await?;

    Ok(Json(collection_response(&state, collection_id).await?))
}

/// DELETE /collections/{id}/media/{media_id}
#[tracing::instrument(skip_all, fields(user_id = %requester.0))]
pub async fn remove_collection_media(
    State(state): State<AppState>,
    requester: RequesterId,
    Path((collection_id, media_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<CollectionResponse>, AppError> {
    owned_collection(&state, collection_id, requester, "modify").await?;

    state
        .store
        .remove_collection_media(collection_id, media_id)
        .await?;

    Ok(Json(collection_response(&state, collection_id).await?))
}
