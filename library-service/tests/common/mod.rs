//! Test helper module for library-service integration tests.
//!
//! Spawns the real axum application on an ephemeral port and drives it over
//! HTTP. Stores and collaborators are swapped for in-memory implementations,
//! so the suite runs without PostgreSQL, SMTP, or a blob store.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use library_service::config::{
    DatabaseConfig, EmailConfig, Environment, InviteConfig, LibraryConfig, RetentionConfig,
    SecurityConfig,
};
use library_service::models::{
    Collection, CollectionDetail, Invitation, Media, MediaDetail, MediaFile, Tag, User,
};
use library_service::services::store::{
    CollectionStore, IdentityStore, InvitationStore, LibraryStore, MediaStore, PurgeCandidate,
};
use library_service::services::{EmailProvider, HandoffCodec, Storage};
use library_service::{build_router, AppState};
use service_core::error::AppError;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use uuid::Uuid;

pub const TEST_HANDOFF_SECRET: &str = "test-handoff-secret";
pub const TEST_BASE_URL: &str = "http://localhost:8080";

// ============================================================================
// In-memory store
// ============================================================================

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    invitations: Vec<Invitation>,
    media: Vec<Media>,
    files: Vec<MediaFile>,
    tags: Vec<Tag>,
    media_tags: Vec<(Uuid, Uuid)>,
    collections: Vec<Collection>,
    collection_media: Vec<(Uuid, Uuid)>,
}

impl Tables {
    fn detail(&self, media: Media) -> MediaDetail {
        let files = self
            .files
            .iter()
            .filter(|f| f.media_id == media.media_id)
            .cloned()
            .collect();
        let mut tags: Vec<Tag> = self
            .media_tags
            .iter()
            .filter(|(m, _)| *m == media.media_id)
            .filter_map(|(_, t)| self.tags.iter().find(|tag| tag.tag_id == *t))
            .cloned()
            .collect();
        tags.sort_by(|a, b| a.tag_name.cmp(&b.tag_name));
        MediaDetail { media, files, tags }
    }
}

/// All conditional transitions happen under one lock, which gives the same
/// one-winner semantics the SQL guard predicates do.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    /// Test backdoor: age a deletion so sweep cutoffs can be exercised.
    pub fn backdate_media_deletion(&self, media_id: Uuid, deleted_utc: DateTime<Utc>) {
        let mut t = self.tables.lock().unwrap();
        if let Some(media) = t.media.iter_mut().find(|m| m.media_id == media_id) {
            media.deleted_utc = Some(deleted_utc);
        }
    }

    /// Test backdoor: expire an invitation in place.
    pub fn backdate_invitation_expiry(&self, token: &str, expiry_utc: DateTime<Utc>) {
        let mut t = self.tables.lock().unwrap();
        if let Some(inv) = t.invitations.iter_mut().find(|i| i.token == token) {
            inv.expiry_utc = expiry_utc;
        }
    }

    /// Test backdoor: attach a cover artifact.
    pub fn set_media_cover(&self, media_id: Uuid, cover_url: &str) {
        let mut t = self.tables.lock().unwrap();
        if let Some(media) = t.media.iter_mut().find(|m| m.media_id == media_id) {
            media.cover_url = Some(cover_url.to_string());
        }
    }

    pub fn invitation_by_token(&self, token: &str) -> Option<Invitation> {
        let t = self.tables.lock().unwrap();
        t.invitations.iter().find(|i| i.token == token).cloned()
    }

    pub fn media_row(&self, media_id: Uuid) -> Option<Media> {
        let t = self.tables.lock().unwrap();
        t.media.iter().find(|m| m.media_id == media_id).cloned()
    }

    pub fn tag_names(&self) -> Vec<String> {
        let t = self.tables.lock().unwrap();
        t.tags.iter().map(|tag| tag.tag_name.clone()).collect()
    }

    pub fn collection_count(&self) -> usize {
        self.tables.lock().unwrap().collections.len()
    }

    pub fn media_tag_link_count(&self) -> usize {
        self.tables.lock().unwrap().media_tags.len()
    }

    pub fn collection_media_link_count(&self) -> usize {
        self.tables.lock().unwrap().collection_media.len()
    }
}

#[async_trait]
impl IdentityStore for MemoryStore {
    async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<User>, AppError> {
        let t = self.tables.lock().unwrap();
        Ok(t.users.iter().find(|u| u.user_id == user_id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let t = self.tables.lock().unwrap();
        Ok(t.users
            .iter()
            .find(|u| {
                u.email
                    .as_deref()
                    .is_some_and(|e| e.eq_ignore_ascii_case(email))
            })
            .cloned())
    }

    async fn find_user_by_provider_subject(
        &self,
        subject: &str,
    ) -> Result<Option<User>, AppError> {
        let t = self.tables.lock().unwrap();
        Ok(t.users
            .iter()
            .find(|u| u.provider_subject.as_deref() == Some(subject))
            .cloned())
    }

    async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        let mut t = self.tables.lock().unwrap();
        let duplicate = t.users.iter().any(|u| {
            (user.email.is_some() && u.email == user.email)
                || (user.provider_subject.is_some() && u.provider_subject == user.provider_subject)
        });
        if duplicate {
            return Err(AppError::Conflict(anyhow::anyhow!("Identity already exists")));
        }
        t.users.push(user.clone());
        Ok(())
    }
}

#[async_trait]
impl InvitationStore for MemoryStore {
    async fn insert_invitation(&self, invitation: &Invitation) -> Result<(), AppError> {
        let mut t = self.tables.lock().unwrap();
        t.invitations.push(invitation.clone());
        Ok(())
    }

    async fn find_invitation_by_token(
        &self,
        token: &str,
    ) -> Result<Option<Invitation>, AppError> {
        let t = self.tables.lock().unwrap();
        Ok(t.invitations.iter().find(|i| i.token == token).cloned())
    }

    async fn list_invitations_by_creator(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<Invitation>, AppError> {
        let t = self.tables.lock().unwrap();
        let mut list: Vec<Invitation> = t
            .invitations
            .iter()
            .filter(|i| i.created_by == user_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| b.created_utc.cmp(&a.created_utc));
        Ok(list)
    }

    async fn consume_invitation_by_token(
        &self,
        token: &str,
        candidate_email: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let mut t = self.tables.lock().unwrap();
        if let Some(inv) = t.invitations.iter_mut().find(|i| i.token == token) {
            if inv.is_consumable(candidate_email, now) {
                inv.used_utc = Some(now);
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn consume_invitation_for_email(
        &self,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let mut t = self.tables.lock().unwrap();
        let mut open: Vec<&mut Invitation> = t
            .invitations
            .iter_mut()
            .filter(|i| i.email.as_deref() == Some(email) && i.is_open(now))
            .collect();
        open.sort_by_key(|i| i.created_utc);
        if let Some(inv) = open.into_iter().next() {
            inv.used_utc = Some(now);
            return Ok(true);
        }
        Ok(false)
    }

    async fn consume_general_invitation(&self, now: DateTime<Utc>) -> Result<bool, AppError> {
        let mut t = self.tables.lock().unwrap();
        let mut open: Vec<&mut Invitation> = t
            .invitations
            .iter_mut()
            .filter(|i| i.email.is_none() && i.is_open(now))
            .collect();
        open.sort_by_key(|i| i.created_utc);
        if let Some(inv) = open.into_iter().next() {
            inv.used_utc = Some(now);
            return Ok(true);
        }
        Ok(false)
    }
}

#[async_trait]
impl MediaStore for MemoryStore {
    async fn insert_media(&self, media: &Media) -> Result<(), AppError> {
        let mut t = self.tables.lock().unwrap();
        t.media.push(media.clone());
        Ok(())
    }

    async fn insert_media_file(&self, file: &MediaFile) -> Result<(), AppError> {
        let mut t = self.tables.lock().unwrap();
        let duplicate = t
            .files
            .iter()
            .any(|f| f.media_id == file.media_id && f.file_kind == file.file_kind);
        if duplicate {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "A file of this type already exists for this media"
            )));
        }
        t.files.push(file.clone());
        Ok(())
    }

    async fn find_media_by_id(&self, media_id: Uuid) -> Result<Option<Media>, AppError> {
        let t = self.tables.lock().unwrap();
        Ok(t.media.iter().find(|m| m.media_id == media_id).cloned())
    }

    async fn get_media_detail(&self, media_id: Uuid) -> Result<Option<MediaDetail>, AppError> {
        let t = self.tables.lock().unwrap();
        Ok(t.media
            .iter()
            .find(|m| m.media_id == media_id)
            .cloned()
            .map(|m| t.detail(m)))
    }

    async fn list_active_media(&self) -> Result<Vec<MediaDetail>, AppError> {
        let t = self.tables.lock().unwrap();
        let mut rows: Vec<Media> = t
            .media
            .iter()
            .filter(|m| m.deleted_utc.is_none())
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.uploaded_utc.cmp(&a.uploaded_utc));
        Ok(rows.into_iter().map(|m| t.detail(m)).collect())
    }

    async fn list_deleted_media_for(
        &self,
        owner_id: Uuid,
    ) -> Result<Vec<MediaDetail>, AppError> {
        let t = self.tables.lock().unwrap();
        let mut rows: Vec<Media> = t
            .media
            .iter()
            .filter(|m| m.deleted_utc.is_some() && m.uploaded_by == owner_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.deleted_utc.cmp(&a.deleted_utc));
        Ok(rows.into_iter().map(|m| t.detail(m)).collect())
    }

    async fn update_media(&self, media: &Media) -> Result<(), AppError> {
        let mut t = self.tables.lock().unwrap();
        if let Some(row) = t.media.iter_mut().find(|m| m.media_id == media.media_id) {
            *row = media.clone();
        }
        Ok(())
    }

    async fn soft_delete_media(
        &self,
        media_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let mut t = self.tables.lock().unwrap();
        if let Some(row) = t
            .media
            .iter_mut()
            .find(|m| m.media_id == media_id && m.deleted_utc.is_none())
        {
            row.deleted_utc = Some(now);
            return Ok(true);
        }
        Ok(false)
    }

    async fn restore_media(&self, media_id: Uuid) -> Result<bool, AppError> {
        let mut t = self.tables.lock().unwrap();
        if let Some(row) = t
            .media
            .iter_mut()
            .find(|m| m.media_id == media_id && m.deleted_utc.is_some())
        {
            row.deleted_utc = None;
            return Ok(true);
        }
        Ok(false)
    }

    async fn upsert_tag(&self, tag_name: &str) -> Result<Tag, AppError> {
        let mut t = self.tables.lock().unwrap();
        if let Some(tag) = t.tags.iter().find(|tag| tag.tag_name == tag_name) {
            return Ok(tag.clone());
        }
        let tag = Tag {
            tag_id: Uuid::new_v4(),
            tag_name: tag_name.to_string(),
        };
        t.tags.push(tag.clone());
        Ok(tag)
    }

    async fn set_media_tags(&self, media_id: Uuid, tag_ids: &[Uuid]) -> Result<(), AppError> {
        let mut t = self.tables.lock().unwrap();
        t.media_tags.retain(|(m, _)| *m != media_id);
        for tag_id in tag_ids {
            if !t.media_tags.contains(&(media_id, *tag_id)) {
                t.media_tags.push((media_id, *tag_id));
            }
        }
        Ok(())
    }

    async fn select_purgeable(
        &self,
        cutoff: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<PurgeCandidate>, AppError> {
        let t = self.tables.lock().unwrap();
        let mut rows: Vec<&Media> = t
            .media
            .iter()
            .filter(|m| m.deleted_utc.is_some_and(|d| d < cutoff))
            .collect();
        rows.sort_by_key(|m| m.deleted_utc);
        Ok(rows
            .into_iter()
            .take(limit as usize)
            .map(|m| PurgeCandidate {
                media_id: m.media_id,
                cover_url: m.cover_url.clone(),
                file_urls: t
                    .files
                    .iter()
                    .filter(|f| f.media_id == m.media_id)
                    .map(|f| f.file_url.clone())
                    .collect(),
            })
            .collect())
    }

    async fn purge_media(
        &self,
        media_ids: &[Uuid],
        cutoff: DateTime<Utc>,
    ) -> Result<u64, AppError> {
        let mut t = self.tables.lock().unwrap();
        // Same predicate as selection, re-checked at delete time.
        let confirmed: Vec<Uuid> = t
            .media
            .iter()
            .filter(|m| {
                media_ids.contains(&m.media_id) && m.deleted_utc.is_some_and(|d| d < cutoff)
            })
            .map(|m| m.media_id)
            .collect();

        t.media_tags.retain(|(m, _)| !confirmed.contains(m));
        t.collection_media.retain(|(_, m)| !confirmed.contains(m));
        t.files.retain(|f| !confirmed.contains(&f.media_id));
        t.media.retain(|m| !confirmed.contains(&m.media_id));

        Ok(confirmed.len() as u64)
    }
}

#[async_trait]
impl CollectionStore for MemoryStore {
    async fn insert_collection(&self, collection: &Collection) -> Result<(), AppError> {
        let mut t = self.tables.lock().unwrap();
        let duplicate = t.collections.iter().any(|c| {
            c.owner_id == collection.owner_id && c.collection_name == collection.collection_name
        });
        if duplicate {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "A collection with this name already exists"
            )));
        }
        t.collections.push(collection.clone());
        Ok(())
    }

    async fn find_collection_by_id(
        &self,
        collection_id: Uuid,
    ) -> Result<Option<Collection>, AppError> {
        let t = self.tables.lock().unwrap();
        Ok(t.collections
            .iter()
            .find(|c| c.collection_id == collection_id)
            .cloned())
    }

    async fn get_collection_detail(
        &self,
        collection_id: Uuid,
    ) -> Result<Option<CollectionDetail>, AppError> {
        let t = self.tables.lock().unwrap();
        let collection = match t
            .collections
            .iter()
            .find(|c| c.collection_id == collection_id)
        {
            Some(c) => c.clone(),
            None => return Ok(None),
        };

        let mut members: Vec<Media> = t
            .collection_media
            .iter()
            .filter(|(c, _)| *c == collection_id)
            .filter_map(|(_, m)| t.media.iter().find(|media| media.media_id == *m))
            .filter(|media| media.deleted_utc.is_none())
            .cloned()
            .collect();
        members.sort_by(|a, b| b.uploaded_utc.cmp(&a.uploaded_utc));

        let media = members.into_iter().map(|m| t.detail(m)).collect();
        Ok(Some(CollectionDetail { collection, media }))
    }

    async fn list_collections_for(
        &self,
        owner_id: Uuid,
    ) -> Result<Vec<CollectionDetail>, AppError> {
        let ids: Vec<Uuid> = {
            let t = self.tables.lock().unwrap();
            let mut rows: Vec<&Collection> = t
                .collections
                .iter()
                .filter(|c| c.owner_id == owner_id)
                .collect();
            rows.sort_by(|a, b| a.collection_name.cmp(&b.collection_name));
            rows.into_iter().map(|c| c.collection_id).collect()
        };

        let mut details = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(detail) = self.get_collection_detail(id).await? {
                details.push(detail);
            }
        }
        Ok(details)
    }

    async fn update_collection(&self, collection: &Collection) -> Result<(), AppError> {
        let mut t = self.tables.lock().unwrap();
        let duplicate = t.collections.iter().any(|c| {
            c.collection_id != collection.collection_id
                && c.owner_id == collection.owner_id
                && c.collection_name == collection.collection_name
        });
        if duplicate {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "A collection with this name already exists"
            )));
        }
        if let Some(row) = t
            .collections
            .iter_mut()
            .find(|c| c.collection_id == collection.collection_id)
        {
            *row = collection.clone();
        }
        Ok(())
    }

    async fn delete_collection(&self, collection_id: Uuid) -> Result<(), AppError> {
        let mut t = self.tables.lock().unwrap();
        t.collection_media.retain(|(c, _)| *c != collection_id);
        t.collections.retain(|c| c.collection_id != collection_id);
        Ok(())
    }

    async fn add_collection_media(
        &self,
        collection_id: Uuid,
        media_id: Uuid,
    ) -> Result<(), AppError> {
        let mut t = self.tables.lock().unwrap();
        if !t.collection_media.contains(&(collection_id, media_id)) {
            t.collection_media.push((collection_id, media_id));
        }
        Ok(())
    }

    async fn remove_collection_media(
        &self,
        collection_id: Uuid,
        media_id: Uuid,
    ) -> Result<(), AppError> {
        let mut t = self.tables.lock().unwrap();
        t.collection_media
            .retain(|(c, m)| !(*c == collection_id && *m == media_id));
        Ok(())
    }
}

#[async_trait]
impl LibraryStore for MemoryStore {
    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }
}

// ============================================================================
// Collaborator doubles
// ============================================================================

/// Records invitation emails instead of sending them.
#[derive(Default)]
pub struct RecordingEmailService {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingEmailService {
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmailProvider for RecordingEmailService {
    fn is_configured(&self) -> bool {
        true
    }

    async fn send_invitation_email(
        &self,
        to_email: &str,
        invite_link: &str,
        _expiry_utc: DateTime<Utc>,
    ) -> Result<(), AppError> {
        self.sent
            .lock()
            .unwrap()
            .push((to_email.to_string(), invite_link.to_string()));
        Ok(())
    }
}

/// Configured but broken transport.
pub struct FailingEmailService;

#[async_trait]
impl EmailProvider for FailingEmailService {
    fn is_configured(&self) -> bool {
        true
    }

    async fn send_invitation_email(
        &self,
        _to_email: &str,
        _invite_link: &str,
        _expiry_utc: DateTime<Utc>,
    ) -> Result<(), AppError> {
        Err(AppError::EmailError("SMTP connection refused".to_string()))
    }
}

/// Records artifact deletions instead of performing them.
#[derive(Default)]
pub struct RecordingStorage {
    deleted: Mutex<Vec<String>>,
}

impl RecordingStorage {
    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl Storage for RecordingStorage {
    async fn delete_artifact(&self, url: &str) -> Result<(), AppError> {
        self.deleted.lock().unwrap().push(url.to_string());
        Ok(())
    }
}

/// Every artifact deletion fails; purge must proceed regardless.
pub struct FailingStorage;

#[async_trait]
impl Storage for FailingStorage {
    async fn delete_artifact(&self, url: &str) -> Result<(), AppError> {
        Err(AppError::InternalError(anyhow::anyhow!(
            "Blob delete for {} returned 503",
            url
        )))
    }
}

// ============================================================================
// Test application
// ============================================================================

pub fn test_config() -> LibraryConfig {
    LibraryConfig {
        common: service_core::config::Config { port: 0 },
        environment: Environment::Dev,
        service_name: "library-service-test".to_string(),
        service_version: "0.0.0".to_string(),
        log_level: "debug".to_string(),
        database: DatabaseConfig {
            url: "postgres://unused-in-tests".to_string(),
            max_connections: 5,
            min_connections: 1,
        },
        email: EmailConfig {
            host: String::new(),
            port: 587,
            user: String::new(),
            pass: String::new(),
            from: "noreply@secret-library.local".to_string(),
        },
        invite: InviteConfig {
            base_url: TEST_BASE_URL.to_string(),
            default_expiry_days: 7,
            handoff_ttl_seconds: 600,
            handoff_secret: TEST_HANDOFF_SECRET.to_string(),
        },
        retention: RetentionConfig {
            grace_days: 7,
            sweep_page_size: 100,
            sweep_interval_seconds: 3600,
        },
        security: SecurityConfig {
            allowed_origins: vec!["http://localhost:3000".to_string()],
        },
    }
}

/// Test application with a running HTTP server.
pub struct TestApp {
    pub base_url: String,
    pub client: reqwest::Client,
    pub store: Arc<MemoryStore>,
    pub state: AppState,
}

impl TestApp {
    /// Spawn with recording email and storage doubles.
    pub async fn spawn() -> (Self, Arc<RecordingEmailService>, Arc<RecordingStorage>) {
        let email = Arc::new(RecordingEmailService::default());
        let storage = Arc::new(RecordingStorage::default());
        let app = Self::spawn_with(email.clone(), storage.clone()).await;
        (app, email, storage)
    }

    /// Spawn with explicit collaborator doubles.
    pub async fn spawn_with(
        email: Arc<dyn EmailProvider>,
        storage: Arc<dyn Storage>,
    ) -> Self {
        service_core::observability::logging::init_for_tests();

        let store = Arc::new(MemoryStore::default());
        let config = test_config();
        let handoff = HandoffCodec::new(TEST_HANDOFF_SECRET, 600);

        let state = AppState {
            config,
            store: store.clone(),
            email,
            storage,
            handoff,
        };

        let router = build_router(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let port = listener.local_addr().unwrap().port();

        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("Failed to build HTTP client");

        TestApp {
            base_url: format!("http://127.0.0.1:{}", port),
            client,
            store,
            state,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// The codec tests use to mint or inspect handoff cookie values.
    pub fn handoff(&self) -> HandoffCodec {
        HandoffCodec::new(TEST_HANDOFF_SECRET, 600)
    }

    /// Insert a member directly; admission flows are exercised separately.
    pub async fn seed_user(&self, email: &str) -> Uuid {
        let user = User::new(
            Some(email.to_string()),
            Some(format!("subject-{}", email)),
            None,
        );
        let user_id = user.user_id;
        self.store.insert_user(&user).await.unwrap();
        user_id
    }

    pub async fn get(&self, path: &str, user: Option<Uuid>) -> reqwest::Response {
        let mut req = self.client.get(self.url(path));
        if let Some(user) = user {
            req = req.header("X-User-ID", user.to_string());
        }
        req.send().await.expect("request failed")
    }

    pub async fn post_json(
        &self,
        path: &str,
        user: Option<Uuid>,
        body: &serde_json::Value,
    ) -> reqwest::Response {
        let mut req = self.client.post(self.url(path)).json(body);
        if let Some(user) = user {
            req = req.header("X-User-ID", user.to_string());
        }
        req.send().await.expect("request failed")
    }

    pub async fn put_json(
        &self,
        path: &str,
        user: Option<Uuid>,
        body: &serde_json::Value,
    ) -> reqwest::Response {
        let mut req = self.client.put(self.url(path)).json(body);
        if let Some(user) = user {
            req = req.header("X-User-ID", user.to_string());
        }
        req.send().await.expect("request failed")
    }

    pub async fn delete(&self, path: &str, user: Option<Uuid>) -> reqwest::Response {
        let mut req = self.client.delete(self.url(path));
        if let Some(user) = user {
            req = req.header("X-User-ID", user.to_string());
        }
        req.send().await.expect("request failed")
    }

    /// POST /auth/callback with an optional raw handoff cookie value.
    pub async fn sign_in_callback(
        &self,
        email: Option<&str>,
        subject: &str,
        cookie_value: Option<&str>,
    ) -> reqwest::Response {
        let mut body = serde_json::json!({ "provider_subject_id": subject });
        if let Some(email) = email {
            body["email"] = serde_json::Value::String(email.to_string());
        }

        let mut req = self.client.post(self.url("/auth/callback")).json(&body);
        if let Some(value) = cookie_value {
            req = req.header("Cookie", format!("inviteToken={}", value));
        }
        req.send().await.expect("request failed")
    }

    /// Create an invitation as `creator`; returns (token, invite_link).
    pub async fn create_invitation(
        &self,
        creator: Uuid,
        email: Option<&str>,
    ) -> (String, String) {
        let mut body = serde_json::json!({});
        if let Some(email) = email {
            body["email"] = serde_json::Value::String(email.to_string());
        }

        let response = self.post_json("/invitations", Some(creator), &body).await;
        assert_eq!(response.status(), 201, "invitation creation failed");

        let payload: serde_json::Value = response.json().await.unwrap();
        let link = payload["invite_link"].as_str().unwrap().to_string();
        let token = link.rsplit('/').next().unwrap().to_string();
        (token, link)
    }

    /// Register a single-file media entry; returns its id.
    pub async fn seed_media(&self, owner: Uuid, title: &str, file_kind: &str) -> Uuid {
        let body = serde_json::json!({
            "file_url": format!("https://blobs.example.com/{}.{}", Uuid::new_v4(), file_kind),
            "file_kind": file_kind,
            "title": title,
        });
        let response = self.post_json("/media", Some(owner), &body).await;
        assert_eq!(response.status(), 201, "media registration failed");

        let payload: serde_json::Value = response.json().await.unwrap();
        payload["media_id"].as_str().unwrap().parse().unwrap()
    }
}

/// Pull the `inviteToken` cookie value out of a redirect response.
pub fn invite_cookie(response: &reqwest::Response) -> Option<String> {
    let header = response.headers().get("set-cookie")?.to_str().ok()?;
    let value = header.strip_prefix("inviteToken=")?;
    Some(value.split(';').next()?.to_string())
}
