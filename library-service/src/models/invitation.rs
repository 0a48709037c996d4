//! Invitation model - single-use, time-boxed admission credentials.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Invitation entity.
///
/// `used_utc` transitions `None -> Some(timestamp)` at most once, ever; the
/// store enforces this with a conditional update guarded by `used_utc IS NULL`.
/// Rows are never hard-deleted; expiry is a derived state.
#[derive(Debug, Clone, FromRow)]
pub struct Invitation {
    pub invitation_id: Uuid,
    /// Opaque, unguessable, unique. Stored as issued so the invite link stays
    /// retrievable.
    pub token: String,
    /// None means the invitation is usable by any new identity.
    pub email: Option<String>,
    pub created_by: Uuid,
    pub created_utc: DateTime<Utc>,
    pub expiry_utc: DateTime<Utc>,
    pub used_utc: Option<DateTime<Utc>>,
}

impl Invitation {
    /// Create a new invitation.
    pub fn new(
        token: String,
        email: Option<String>,
        created_by: Uuid,
        expires_in_days: i64,
    ) -> Self {
        let now = Utc::now();
        Self {
            invitation_id: Uuid::new_v4(),
            token,
            email,
            created_by,
            created_utc: now,
            expiry_utc: now + Duration::days(expires_in_days),
            used_utc: None,
        }
    }

    /// Unused and unexpired. What a link click can check before any candidate
    /// identity is known.
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        self.used_utc.is_none() && self.expiry_utc >= now
    }

    /// Open, and either unscoped or scoped to the candidate email.
    pub fn is_consumable(&self, candidate_email: Option<&str>, now: DateTime<Utc>) -> bool {
        self.is_open(now)
            && match self.email.as_deref() {
                None => true,
                Some(scope) => candidate_email == Some(scope),
            }
    }

    /// Check if the invitation has expired.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiry_utc < now
    }
}

/// Invitation response for API.
#[derive(Debug, Serialize)]
pub struct InvitationResponse {
    pub invitation_id: Uuid,
    pub email: Option<String>,
    pub created_utc: DateTime<Utc>,
    pub expiry_utc: DateTime<Utc>,
    pub used_utc: Option<DateTime<Utc>>,
}

impl From<Invitation> for InvitationResponse {
    fn from(i: Invitation) -> Self {
        Self {
            invitation_id: i.invitation_id,
            email: i.email,
            created_utc: i.created_utc,
            expiry_utc: i.expiry_utc,
            used_utc: i.used_utc,
        }
    }
}
