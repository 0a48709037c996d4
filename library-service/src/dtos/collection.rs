//! Collection DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::CollectionDetail;

use super::media::MediaResponse;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCollectionRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCollectionRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddCollectionMediaRequest {
    pub media_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct CollectionResponse {
    pub collection_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: Uuid,
    pub created_utc: DateTime<Utc>,
    pub media_count: usize,
    pub media: Vec<MediaResponse>,
}

impl From<CollectionDetail> for CollectionResponse {
    fn from(d: CollectionDetail) -> Self {
        let media_count = d.media_count();
        Self {
            collection_id: d.collection.collection_id,
            name: d.collection.collection_name,
            description: d.collection.description,
            owner_id: d.collection.owner_id,
            created_utc: d.collection.created_utc,
            media_count,
            media: d.media.into_iter().map(MediaResponse::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CollectionListResponse {
    pub collections: Vec<CollectionResponse>,
}
