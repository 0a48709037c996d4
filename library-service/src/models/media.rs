//! Media models - library entries, their files, and tags.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Media kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaKind {
    Book,
    Magazine,
    Paper,
    Article,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Book => "Book",
            MediaKind::Magazine => "Magazine",
            MediaKind::Paper => "Paper",
            MediaKind::Article => "Article",
        }
    }

    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s {
            "Book" => Some(MediaKind::Book),
            "Magazine" => Some(MediaKind::Magazine),
            "Paper" => Some(MediaKind::Paper),
            "Article" => Some(MediaKind::Article),
            _ => None,
        }
    }

    /// Unknown or absent kinds fall back to `Book` rather than being rejected.
    pub fn parse_or_default(s: Option<&str>) -> Self {
        s.and_then(Self::from_str_opt).unwrap_or(MediaKind::Book)
    }
}

/// File kinds attachable to a media entry. At most one of each per entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Epub,
    Pdf,
}

impl FileKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Epub => "epub",
            FileKind::Pdf => "pdf",
        }
    }

    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s {
            "epub" => Some(FileKind::Epub),
            "pdf" => Some(FileKind::Pdf),
            _ => None,
        }
    }
}

/// Media entity.
///
/// `deleted_utc == None` means active; `Some` means soft-deleted and excluded
/// from default listings until restored or purged.
#[derive(Debug, Clone, FromRow)]
pub struct Media {
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
}

impl Media {
    /// Create a new active media entry.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        title: String,
        author: Option<String>,
        description: Option<String>,
        language: Option<String>,
        publication_date: Option<String>,
        media_kind: MediaKind,
        uploaded_by: Uuid,
    ) -> Self {
        Self {
            media_id: Uuid::new_v4(),
            title,
            author,
            description,
            language,
            publication_date,
            media_kind: media_kind.as_str().to_string(),
            cover_url: None,
            uploaded_by,
            uploaded_utc: Utc::now(),
            deleted_utc: None,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_utc.is_some()
    }

    /// Whole days left in the grace window, rounded up; 0 once purgeable.
    /// None for active entries.
    pub fn remaining_grace_days(&self, grace_days: i64, now: DateTime<Utc>) -> Option<i64> {
        let deleted_utc = self.deleted_utc?;
        let deadline = deleted_utc + Duration::days(grace_days);
        let secs = (deadline - now).num_seconds();
        if secs <= 0 {
            return Some(0);
        }
        Some((secs + 86_399) / 86_400)
    }
}

/// A file attached to a media entry.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MediaFile {
    pub file_id: Uuid,
    pub media_id: Uuid,
    pub file_url: String,
    pub file_kind: String,
}

impl MediaFile {
    pub fn new(media_id: Uuid, file_url: String, file_kind: FileKind) -> Self {
        Self {
            file_id: Uuid::new_v4(),
            media_id,
            file_url,
            file_kind: file_kind.as_str().to_string(),
        }
    }
}

/// Globally shared tag, created on first use, never deleted here.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Tag {
    pub tag_id: Uuid,
    pub tag_name: String,
}

/// A media entry together with its attached files and tags.
#[derive(Debug, Clone)]
pub struct MediaDetail {
    pub media: Media,
    pub files: Vec<MediaFile>,
    pub tags: Vec<Tag>,
}
