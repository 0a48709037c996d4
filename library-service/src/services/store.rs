//! Store traits: the persistence seams the handlers and background jobs
//! depend on. The PostgreSQL implementation lives in `services::database`;
//! tests substitute an in-memory implementation the same way mock email and
//! blob collaborators are substituted.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use service_core::error::AppError;
use uuid::Uuid;

use crate::models::{Collection, CollectionDetail, Invitation, Media, MediaDetail, MediaFile, Tag, User};

#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<User>, AppError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn find_user_by_provider_subject(
        &self,
        subject: &str,
    ) -> Result<Option<User>, AppError>;
    async fn insert_user(&self, user: &User) -> Result<(), AppError>;
}

#[async_trait]
pub trait InvitationStore: Send + Sync {
    async fn insert_invitation(&self, invitation: &Invitation) -> Result<(), AppError>;
    async fn find_invitation_by_token(&self, token: &str)
        -> Result<Option<Invitation>, AppError>;
    async fn list_invitations_by_creator(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<Invitation>, AppError>;

    /// Guarded consume of one specific token: sets `used_utc` iff the full
    /// consumability predicate (unused, unexpired, email scope) holds, as a
    /// single conditional update. Returns whether this caller won.
    async fn consume_invitation_by_token(
        &self,
        token: &str,
        candidate_email: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<bool, AppError>;

    /// Consume any one open invitation scoped to `email`.
    async fn consume_invitation_for_email(
        &self,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, AppError>;

    /// Consume any one open invitation with no email scope.
    async fn consume_general_invitation(&self, now: DateTime<Utc>) -> Result<bool, AppError>;
}

/// A soft-deleted entry due for purging, with the artifact URLs the blob
/// collaborator must be asked to delete.
#[derive(Debug, Clone)]
pub struct PurgeCandidate {
    pub media_id: Uuid,
    pub cover_url: Option<String>,
    pub file_urls: Vec<String>,
}

#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn insert_media(&self, media: &Media) -> Result<(), AppError>;
    /// Attach a file; a second file of the same kind maps to `Conflict`.
    async fn insert_media_file(&self, file: &MediaFile) -> Result<(), AppError>;
    async fn find_media_by_id(&self, media_id: Uuid) -> Result<Option<Media>, AppError>;
    async fn get_media_detail(&self, media_id: Uuid) -> Result<Option<MediaDetail>, AppError>;
    async fn list_active_media(&self) -> Result<Vec<MediaDetail>, AppError>;
    async fn list_deleted_media_for(&self, owner_id: Uuid)
        -> Result<Vec<MediaDetail>, AppError>;
    async fn update_media(&self, media: &Media) -> Result<(), AppError>;

    /// Conditional soft delete guarded by `deleted_utc IS NULL`. Returns
    /// whether a row transitioned.
    async fn soft_delete_media(&self, media_id: Uuid, now: DateTime<Utc>)
        -> Result<bool, AppError>;

    /// Conditional restore guarded by `deleted_utc IS NOT NULL`.
    async fn restore_media(&self, media_id: Uuid) -> Result<bool, AppError>;

    async fn upsert_tag(&self, tag_name: &str) -> Result<Tag, AppError>;
    /// Replace the tag link set of a media entry.
    async fn set_media_tags(&self, media_id: Uuid, tag_ids: &[Uuid]) -> Result<(), AppError>;

    /// One bounded page of entries whose deletion aged past the cutoff.
    async fn select_purgeable(
        &self,
        cutoff: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<PurgeCandidate>, AppError>;

    /// Destroy the given entries and their file/tag/collection link rows,
    /// re-checking the purge predicate at delete time so a concurrent restore
    /// wins. Returns the number of entries actually purged.
    async fn purge_media(&self, media_ids: &[Uuid], cutoff: DateTime<Utc>)
        -> Result<u64, AppError>;
}

#[async_trait]
pub trait CollectionStore: Send + Sync {
    /// Duplicate name for the same owner maps to `Conflict`.
    async fn insert_collection(&self, collection: &Collection) -> Result<(), AppError>;
    async fn find_collection_by_id(
        &self,
        collection_id: Uuid,
    ) -> Result<Option<Collection>, AppError>;
    async fn get_collection_detail(
        &self,
        collection_id: Uuid,
    ) -> Result<Option<CollectionDetail>, AppError>;
    async fn list_collections_for(
        &self,
        owner_id: Uuid,
    ) -> Result<Vec<CollectionDetail>, AppError>;
    /// Rename/redescribe; duplicate name maps to `Conflict`.
    async fn update_collection(&self, collection: &Collection) -> Result<(), AppError>;
    async fn delete_collection(&self, collection_id: Uuid) -> Result<(), AppError>;
    /// Adding an existing member is a no-op.
    async fn add_collection_media(
        &self,
        collection_id: Uuid,
        media_id: Uuid,
    ) -> Result<(), AppError>;
    async fn remove_collection_media(
        &self,
        collection_id: Uuid,
        media_id: Uuid,
    ) -> Result<(), AppError>;
}

/// The full persistence surface, as one object the application state can hold.
#[async_trait]
pub trait LibraryStore:
    IdentityStore + InvitationStore + MediaStore + CollectionStore
{
    async fn health_check(&self) -> Result<(), AppError>;
}
