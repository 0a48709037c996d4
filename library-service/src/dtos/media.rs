//! Media DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::{MediaDetail, MediaFile, Tag};

/// Register an uploaded artifact as a media entry, or attach it to an
/// existing one. These are exactly the recognized metadata fields; the upload
/// collaborator has already stored the binary and hands us its URL.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterMediaRequest {
    #[validate(url)]
    pub file_url: String,
    /// "epub" or "pdf".
    pub file_kind: String,
    /// When set, attach the file to this existing entry instead of creating
    /// a new one.
    pub media_id: Option<Uuid>,
    #[validate(length(min = 1, max = 500))]
    pub title: Option<String>,
    pub author: Option<String>,
    pub description: Option<String>,
    pub language: Option<String>,
    pub publication_date: Option<String>,
    pub media_kind: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// Owner metadata edit. Provided fields replace, absent fields keep; `tags`,
/// when present, replaces the whole tag set.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateMediaRequest {
    #[validate(length(min = 1, max = 500))]
    pub title: Option<String>,
    pub author: Option<String>,
    pub description: Option<String>,
    pub language: Option<String>,
    pub publication_date: Option<String>,
    pub media_kind: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct MediaResponse {
    pub media_id: Uuid,
    pub title: String,
    pub author: Option<String>,
    pub description: Option<String>,
    pub language: Option<String>,
    pub publication_date: Option<String>,
    pub media_kind: String,
    pub cover_url: Option<String>,
    pub uploaded_by: Uuid,
    pub uploaded_utc: DateTime<Utc>,
    pub deleted_utc: Option<DateTime<Utc>>,
    pub files: Vec<MediaFile>,
    pub tags: Vec<Tag>,
}

impl From<MediaDetail> for MediaResponse {
    fn from(d: MediaDetail) -> Self {
        Self {
            media_id: d.media.media_id,
            title: d.media.title,
            author: d.media.author,
            description: d.media.description,
            language: d.media.language,
            publication_date: d.media.publication_date,
            media_kind: d.media.media_kind,
            cover_url: d.media.cover_url,
            uploaded_by: d.media.uploaded_by,
            uploaded_utc: d.media.uploaded_utc,
            deleted_utc: d.media.deleted_utc,
            files: d.files,
            tags: d.tags,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MediaListResponse {
    pub media: Vec<MediaResponse>,
}

/// A trash listing entry: the media plus the informational count of whole
/// days left before the sweeper may purge it.
#[derive(Debug, Serialize)]
pub struct DeletedMediaResponse {
    #[serde(flatten)]
    pub media: MediaResponse,
    pub days_remaining: i64,
}

#[derive(Debug, Serialize)]
pub struct DeletedMediaListResponse {
    pub media: Vec<DeletedMediaResponse>,
}
