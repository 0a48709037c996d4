//! Collection model - per-user named groupings of media.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::media::MediaDetail;

/// Collection entity. Names are unique per owner.
#[derive(Debug, Clone, FromRow)]
pub struct Collection {
    pub collection_id: Uuid,
    pub collection_name: String,
    pub description: Option<String>,
    pub owner_id: Uuid,
    pub created_utc: DateTime<Utc>,
}

impl Collection {
    pub fn new(collection_name: String, description: Option<String>, owner_id: Uuid) -> Self {
        Self {
            collection_id: Uuid::new_v4(),
            collection_name,
            description,
            owner_id,
            created_utc: Utc::now(),
        }
    }
}

/// A collection with its non-deleted member media. Soft-deleted members stay
/// linked but are filtered out of this view.
#[derive(Debug, Clone)]
pub struct CollectionDetail {
    pub collection: Collection,
    pub media: Vec<MediaDetail>,
}

impl CollectionDetail {
    pub fn media_count(&self) -> usize {
        self.media.len()
    }
}
