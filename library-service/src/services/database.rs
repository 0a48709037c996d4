//! PostgreSQL implementation of the store traits.
//!
//! Every state transition with an invariant (invitation consumption,
//! soft delete, restore, purge) is a conditional update scoped by primary key
//! plus a guard predicate, so racing writers produce one winner and one
//! rejected/no-op outcome.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use service_core::error::AppError;
use sqlx::postgres::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use crate::models::{
    Collection, CollectionDetail, Invitation, Media, MediaDetail, MediaFile, Tag, User,
};
use crate::services::store::{
    CollectionStore, IdentityStore, InvitationStore, LibraryStore, MediaStore, PurgeCandidate,
};

/// PostgreSQL database wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database wrapper from a connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Attach files and tags to a batch of media rows.
    async fn load_details(&self, media_rows: Vec<Media>) -> Result<Vec<MediaDetail>, AppError> {
        if media_rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = media_rows.iter().map(|m| m.media_id).collect();

        let files = sqlx::query_as::<_, MediaFile>(
            "SELECT * FROM media_files WHERE media_id = ANY($1) ORDER BY file_kind",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let tag_rows = sqlx::query_as::<_, (Uuid, Uuid, String)>(
            r#"
            SELECT mt.media_id, t.tag_id, t.tag_name
            FROM media_tags mt
            JOIN tags t ON t.tag_id = mt.tag_id
            WHERE mt.media_id = ANY($1)
            ORDER BY t.tag_name
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let mut file_map: HashMap<Uuid, Vec<MediaFile>> = HashMap::new();
        for file in files {
            file_map.entry(file.media_id).or_default().push(file);
        }

        let mut tag_map: HashMap<Uuid, Vec<Tag>> = HashMap::new();
        for (media_id, tag_id, tag_name) in tag_rows {
            tag_map
                .entry(media_id)
                .or_default()
                .push(Tag { tag_id, tag_name });
        }

        Ok(media_rows
            .into_iter()
            .map(|media| {
                let files = file_map.remove(&media.media_id).unwrap_or_default();
                let tags = tag_map.remove(&media.media_id).unwrap_or_default();
                MediaDetail { media, files, tags }
            })
            .collect())
    }
}

fn db_err(e: sqlx::Error) -> AppError {
    AppError::DatabaseError(anyhow::anyhow!(e))
}

/// Map a unique-constraint violation to `Conflict`, everything else to
/// `DatabaseError`.
fn conflict_on_unique(e: sqlx::Error, message: &str) -> AppError {
    match &e {
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
            AppError::Conflict(anyhow::anyhow!("{}", message))
        }
        _ => db_err(e),
    }
}

#[async_trait]
impl IdentityStore for Database {
    async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)
    }

    async fn find_user_by_provider_subject(
        &self,
        subject: &str,
    ) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE provider_subject = $1")
            .bind(subject)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)
    }

    async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO users (user_id, email, provider_subject, display_name, created_utc)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(user.user_id)
        .bind(&user.email)
        .bind(&user.provider_subject)
        .bind(&user.display_name)
        .bind(user.created_utc)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "Identity already exists"))?;
        Ok(())
    }
}

#[async_trait]
impl InvitationStore for Database {
    async fn insert_invitation(&self, invitation: &Invitation) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO invitations
                (invitation_id, token, email, created_by, created_utc, expiry_utc, used_utc)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(invitation.invitation_id)
        .bind(&invitation.token)
        .bind(&invitation.email)
        .bind(invitation.created_by)
        .bind(invitation.created_utc)
        .bind(invitation.expiry_utc)
        .bind(invitation.used_utc)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn find_invitation_by_token(
        &self,
        token: &str,
    ) -> Result<Option<Invitation>, AppError> {
        sqlx::query_as::<_, Invitation>("SELECT * FROM invitations WHERE token = $1")
            .bind(token)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)
    }

    async fn list_invitations_by_creator(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<Invitation>, AppError> {
        sqlx::query_as::<_, Invitation>(
            "SELECT * FROM invitations WHERE created_by = $1 ORDER BY created_utc DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)
    }

    async fn consume_invitation_by_token(
        &self,
        token: &str,
        candidate_email: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE invitations
            SET used_utc = $1
            WHERE token = $2
              AND used_utc IS NULL
              AND expiry_utc >= $1
              AND (email IS NULL OR email = $3)
            "#,
        )
        .bind(now)
        .bind(token)
        .bind(candidate_email)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(result.rows_affected() == 1)
    }

    async fn consume_invitation_for_email(
        &self,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE invitations
            SET used_utc = $1
            WHERE invitation_id = (
                SELECT invitation_id FROM invitations
                WHERE email = $2 AND used_utc IS NULL AND expiry_utc >= $1
                ORDER BY created_utc
                LIMIT 1
                FOR UPDATE SKIP LOCKED
            )
            "#,
        )
        .bind(now)
        .bind(email)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(result.rows_affected() == 1)
    }

    async fn consume_general_invitation(&self, now: DateTime<Utc>) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE invitations
            SET used_utc = $1
            WHERE invitation_id = (
                SELECT invitation_id FROM invitations
                WHERE email IS NULL AND used_utc IS NULL AND expiry_utc >= $1
                ORDER BY created_utc
                LIMIT 1
                FOR UPDATE SKIP LOCKED
            )
            "#,
        )
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(result.rows_affected() == 1)
    }
}

#[async_trait]
impl MediaStore for Database {
    async fn insert_media(&self, media: &Media) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO media
                (media_id, title, author, description, language, publication_date,
                 media_kind, cover_url, uploaded_by, uploaded_utc, deleted_utc)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(media.media_id)
        .bind(&media.title)
        .bind(&media.author)
        .bind(&media.description)
        .bind(&media.language)
        .bind(&media.publication_date)
        .bind(&media.media_kind)
        .bind(&media.cover_url)
        .bind(media.uploaded_by)
        .bind(media.uploaded_utc)
        .bind(media.deleted_utc)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn insert_media_file(&self, file: &MediaFile) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO media_files (file_id, media_id, file_url, file_kind)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(file.file_id)
        .bind(file.media_id)
        .bind(&file.file_url)
        .bind(&file.file_kind)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            conflict_on_unique(e, "A file of this type already exists for this media")
        })?;
        Ok(())
    }

    async fn find_media_by_id(&self, media_id: Uuid) -> Result<Option<Media>, AppError> {
        sqlx::query_as::<_, Media>("SELECT * FROM media WHERE media_id = $1")
            .bind(media_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)
    }

    async fn get_media_detail(&self, media_id: Uuid) -> Result<Option<MediaDetail>, AppError> {
        let media = match self.find_media_by_id(media_id).await? {
            Some(media) => media,
            None => return Ok(None),
        };
        let mut details = self.load_details(vec![media]).await?;
        Ok(details.pop())
    }

    async fn list_active_media(&self) -> Result<Vec<MediaDetail>, AppError> {
        let rows = sqlx::query_as::<_, Media>(
            "SELECT * FROM media WHERE deleted_utc IS NULL ORDER BY uploaded_utc DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        self.load_details(rows).await
    }

    async fn list_deleted_media_for(
        &self,
        owner_id: Uuid,
    ) -> Result<Vec<MediaDetail>, AppError> {
        let rows = sqlx::query_as::<_, Media>(
            r#"
            SELECT * FROM media
            WHERE deleted_utc IS NOT NULL AND uploaded_by = $1
            ORDER BY deleted_utc DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        self.load_details(rows).await
    }

    async fn update_media(&self, media: &Media) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE media
            SET title = $2, author = $3, description = $4, language = $5,
                publication_date = $6, media_kind = $7, cover_url = $8
            WHERE media_id = $1
            "#,
        )
        .bind(media.media_id)
        .bind(&media.title)
        .bind(&media.author)
        .bind(&media.description)
        .bind(&media.language)
        .bind(&media.publication_date)
        .bind(&media.media_kind)
        .bind(&media.cover_url)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn soft_delete_media(
        &self,
        media_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE media SET deleted_utc = $2 WHERE media_id = $1 AND deleted_utc IS NULL",
        )
        .bind(media_id)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(result.rows_affected() == 1)
    }

    async fn restore_media(&self, media_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE media SET deleted_utc = NULL WHERE media_id = $1 AND deleted_utc IS NOT NULL",
        )
        .bind(media_id)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(result.rows_affected() == 1)
    }

    async fn upsert_tag(&self, tag_name: &str) -> Result<Tag, AppError> {
        sqlx::query_as::<_, Tag>(
            r#"
            INSERT INTO tags (tag_id, tag_name)
            VALUES ($1, $2)
            ON CONFLICT (tag_name) DO UPDATE SET tag_name = EXCLUDED.tag_name
            RETURNING tag_id, tag_name
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(tag_name)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)
    }

    async fn set_media_tags(&self, media_id: Uuid, tag_ids: &[Uuid]) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        sqlx::query("DELETE FROM media_tags WHERE media_id = $1")
            .bind(media_id)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        for tag_id in tag_ids {
            sqlx::query(
                r#"
                INSERT INTO media_tags (media_id, tag_id)
                VALUES ($1, $2)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(media_id)
            .bind(tag_id)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        }

        tx.commit().await.map_err(db_err)
    }

    async fn select_purgeable(
        &self,
        cutoff: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<PurgeCandidate>, AppError> {
        let media_rows = sqlx::query_as::<_, (Uuid, Option<String>)>(
            r#"
            SELECT media_id, cover_url FROM media
            WHERE deleted_utc IS NOT NULL AND deleted_utc < $1
            ORDER BY deleted_utc
            LIMIT $2
            "#,
        )
        .bind(cutoff)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        if media_rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = media_rows.iter().map(|(id, _)| *id).collect();
        let file_rows = sqlx::query_as::<_, (Uuid, String)>(
            "SELECT media_id, file_url FROM media_files WHERE media_id = ANY($1)",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let mut url_map: HashMap<Uuid, Vec<String>> = HashMap::new();
        for (media_id, file_url) in file_rows {
            url_map.entry(media_id).or_default().push(file_url);
        }

        Ok(media_rows
            .into_iter()
            .map(|(media_id, cover_url)| PurgeCandidate {
                media_id,
                cover_url,
                file_urls: url_map.remove(&media_id).unwrap_or_default(),
            })
            .collect())
    }

    async fn purge_media(
        &self,
        media_ids: &[Uuid],
        cutoff: DateTime<Utc>,
    ) -> Result<u64, AppError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        // Re-check the purge predicate under lock: anything restored since
        // selection drops out here and survives.
        let confirmed = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT media_id FROM media
            WHERE media_id = ANY($1) AND deleted_utc IS NOT NULL AND deleted_utc < $2
            FOR UPDATE
            "#,
        )
        .bind(media_ids)
        .bind(cutoff)
        .fetch_all(&mut *tx)
        .await
        .map_err(db_err)?;

        if confirmed.is_empty() {
            tx.commit().await.map_err(db_err)?;
            return Ok(0);
        }

        // Link arenas first, then owned file rows, then the entries.
        sqlx::query("DELETE FROM media_tags WHERE media_id = ANY($1)")
            .bind(&confirmed)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        sqlx::query("DELETE FROM collection_media WHERE media_id = ANY($1)")
            .bind(&confirmed)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        sqlx::query("DELETE FROM media_files WHERE media_id = ANY($1)")
            .bind(&confirmed)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        let result = sqlx::query("DELETE FROM media WHERE media_id = ANY($1)")
            .bind(&confirmed)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl CollectionStore for Database {
    async fn insert_collection(&self, collection: &Collection) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO collections
                (collection_id, collection_name, description, owner_id, created_utc)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(collection.collection_id)
        .bind(&collection.collection_name)
        .bind(&collection.description)
        .bind(collection.owner_id)
        .bind(collection.created_utc)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "A collection with this name already exists"))?;
        Ok(())
    }

    async fn find_collection_by_id(
        &self,
        collection_id: Uuid,
    ) -> Result<Option<Collection>, AppError> {
        sqlx::query_as::<_, Collection>("SELECT * FROM collections WHERE collection_id = $1")
            .bind(collection_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)
    }

    async fn get_collection_detail(
        &self,
        collection_id: Uuid,
    ) -> Result<Option<CollectionDetail>, AppError> {
        let collection = match self.find_collection_by_id(collection_id).await? {
            Some(collection) => collection,
            None => return Ok(None),
        };

        let members = sqlx::query_as::<_, Media>(
            r#"
            SELECT m.* FROM media m
            JOIN collection_media cm ON cm.media_id = m.media_id
            WHERE cm.collection_id = $1 AND m.deleted_utc IS NULL
            ORDER BY m.uploaded_utc DESC
            "#,
        )
        .bind(collection_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let media = self.load_details(members).await?;
        Ok(Some(CollectionDetail { collection, media }))
    }

    async fn list_collections_for(
        &self,
        owner_id: Uuid,
    ) -> Result<Vec<CollectionDetail>, AppError> {
        let collections = sqlx::query_as::<_, Collection>(
            "SELECT * FROM collections WHERE owner_id = $1 ORDER BY collection_name",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let mut details = Vec::with_capacity(collections.len());
        for collection in collections {
            if let Some(detail) = self.get_collection_detail(collection.collection_id).await? {
                details.push(detail);
            }
        }
        Ok(details)
    }

    async fn update_collection(&self, collection: &Collection) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE collections
            SET collection_name = $2, description = $3
            WHERE collection_id = $1
            "#,
        )
        .bind(collection.collection_id)
        .bind(&collection.collection_name)
        .bind(&collection.description)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "A collection with this name already exists"))?;
        Ok(())
    }

    async fn delete_collection(&self, collection_id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        sqlx::query("DELETE FROM collection_media WHERE collection_id = $1")
            .bind(collection_id)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        sqlx::query("DELETE FROM collections WHERE collection_id = $1")
            .bind(collection_id)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        tx.commit().await.map_err(db_err)
    }

    async fn add_collection_media(
        &self,
        collection_id: Uuid,
        media_id: Uuid,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO collection_media (collection_id, media_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(collection_id)
        .bind(media_id)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn remove_collection_media(
        &self,
        collection_id: Uuid,
        media_id: Uuid,
    ) -> Result<(), AppError> {
        sqlx::query("DELETE FROM collection_media WHERE collection_id = $1 AND media_id = $2")
            .bind(collection_id)
            .bind(media_id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }
}

#[async_trait]
impl LibraryStore for Database {
    async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Database health check failed: {}", e);
                AppError::DatabaseError(anyhow::anyhow!("Database health check failed: {}", e))
            })?;
        Ok(())
    }
}
