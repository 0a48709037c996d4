//! Access gate: the admit/deny decision at sign-in completion.

use chrono::Utc;
use service_core::error::AppError;
use std::sync::Arc;

use crate::services::store::LibraryStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Admitted,
    Denied,
}

/// The authenticating identity, as reported by the identity provider plus the
/// caller's own registration lookup.
#[derive(Debug, Clone)]
pub struct Candidate<'a> {
    pub email: Option<&'a str>,
    pub already_registered: bool,
}

pub struct AccessGate {
    store: Arc<dyn LibraryStore>,
}

impl AccessGate {
    pub fn new(store: Arc<dyn LibraryStore>) -> Self {
        Self { store }
    }

    /// Decide admission, consuming an invitation where one gates entry.
    ///
    /// Priority order: the handoff token first (honored even for returning
    /// members re-using a stale invite link), then existing membership, then
    /// the compatibility fallback over open invitations scoped to the
    /// candidate email, then open general invitations. Each consume is a
    /// single conditional update, so two sign-ins racing on one token yield
    /// exactly one admission by that token.
    pub async fn decide(
        &self,
        candidate: Candidate<'_>,
        handoff_token: Option<&str>,
    ) -> Result<Decision, AppError> {
        let now = Utc::now();

        if let Some(token) = handoff_token {
            if self
                .store
                .consume_invitation_by_token(token, candidate.email, now)
                .await?
            {
                tracing::info!("Invitation consumed via handoff token");
                return Ok(Decision::Admitted);
            }
            // Unknown, used, expired, or scoped to another email: fall through.
        }

        if candidate.already_registered {
            return Ok(Decision::Admitted);
        }

        if let Some(email) = candidate.email {
            if self.store.consume_invitation_for_email(email, now).await? {
                tracing::info!("Email-scoped invitation consumed via fallback");
                return Ok(Decision::Admitted);
            }
        }

        if self.store.consume_general_invitation(now).await? {
            tracing::info!("General invitation consumed via fallback");
            return Ok(Decision::Admitted);
        }

        Ok(Decision::Denied)
    }
}
