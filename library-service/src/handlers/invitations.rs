//! Invitation issuance and listing.

use axum::{extract::State, http::StatusCode, Json};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::middleware::RequesterId;
use crate::models::invitation::{Invitation, InvitationResponse};
use crate::AppState;
use service_core::error::AppError;

// ============================================================================
// Request/Response DTOs
// ============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct CreateInvitationRequest {
    /// Omit to issue a general invitation usable by any new identity.
    #[validate(email)]
    pub email: Option<String>,
    #[validate(range(min = 1, max = 365))]
    pub expires_in_days: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct CreateInvitationResponse {
    pub invitation: InvitationResponse,
    pub invite_link: String,
}

#[derive(Debug, Serialize)]
pub struct InvitationListResponse {
    pub invitations: Vec<InvitationResponse>,
}

// ============================================================================
// Handlers
// ============================================================================

const INVITE_TOKEN_LEN: usize = 32;

/// Random alphanumeric token, independent of email and time.
fn generate_invite_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(INVITE_TOKEN_LEN)
        .map(char::from)
        .collect()
}

/// Create a new invitation.
///
/// POST /invitations
#[tracing::instrument(skip_all, fields(user_id = %requester.0))]
pub async fn create_invitation(
    State(state): State<AppState>,
    requester: RequesterId,
    Json(req): Json<CreateInvitationRequest>,
) -> Result<(StatusCode, Json<CreateInvitationResponse>), AppError> {
    req.validate()?;

    // Inviting an existing member is meaningless.
    if let Some(email) = &req.email {
        if state.store.find_user_by_email(email).await?.is_some() {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "Email already registered"
            )));
        }
    }

    let token = generate_invite_token();
    let expires_in_days = req
        .expires_in_days
        .unwrap_or(state.config.invite.default_expiry_days);

    let invitation = Invitation::new(
        token.clone(),
        req.email.clone(),
        requester.0,
        expires_in_days,
    );
    state.store.insert_invitation(&invitation).await?;

    let invite_link = format!("{}/invite/{}", state.config.invite.base_url, token);

    tracing::info!(invitation_id = %invitation.invitation_id, "Invitation created");

    // Delivery is best-effort: the link stays valid and retrievable whether
    // or not the email goes out.
    if let Some(to_email) = &invitation.email {
        if state.email.is_configured() {
            if let Err(e) = state
                .email
                .send_invitation_email(to_email, &invite_link, invitation.expiry_utc)
                .await
            {
                tracing::warn!(error = %e, "Invitation email delivery failed");
            }
        }
    }

    Ok((
        StatusCode::CREATED,
        Json(CreateInvitationResponse {
            invitation: invitation.into(),
            invite_link,
        }),
    ))
}

/// List the caller's invitations, newest first.
///
/// GET /invitations
#[tracing::instrument(skip_all, fields(user_id = %requester.0))]
pub async fn list_invitations(
    State(state): State<AppState>,
    requester: RequesterId,
) -> Result<Json<InvitationListResponse>, AppError> {
    let invitations = state.store.list_invitations_by_creator(requester.0).await?;
    Ok(Json(InvitationListResponse {
        invitations: invitations
            .into_iter()
            .map(InvitationResponse::from)
            .collect(),
    }))
}
