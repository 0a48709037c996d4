//! Sign-in completion: the access gate runs here.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use validator::Validate;

use crate::dtos::{SignInCallbackRequest, SignInDecisionResponse};
use crate::models::User;
use crate::services::{AccessGate, Candidate, Decision};
use crate::AppState;
use service_core::error::AppError;

pub const INVITE_COOKIE: &str = "inviteToken";
pub const UNAUTHORIZED_PATH: &str = "/auth/unauthorized";

/// Complete an external sign-in: decide admission, and create the identity
/// row on first admission. The identity provider has already authenticated
/// the human; this is the only place invitations are consumed.
///
/// POST /auth/callback
#[tracing::instrument(skip_all)]
pub async fn sign_in_callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<SignInCallbackRequest>,
) -> Result<Response, AppError> {
    req.validate()?;

    let now = Utc::now();

    let mut existing = state
        .store
        .find_user_by_provider_subject(&req.provider_subject_id)
        .await?;
    if existing.is_none() {
        if let Some(email) = &req.email {
            existing = state.store.find_user_by_email(email).await?;
        }
    }

    // The handoff cookie is read exactly once, here. Malformed, forged, or
    // expired values count as absent and fall through to the other checks.
    let handoff_token = jar
        .get(INVITE_COOKIE)
        .and_then(|cookie| state.handoff.verify(cookie.value(), now));

    let gate = AccessGate::new(state.store.clone());
    let candidate = Candidate {
        email: req.email.as_deref(),
        already_registered: existing.is_some(),
    };

    match gate.decide(candidate, handoff_token.as_deref()).await? {
        Decision::Admitted => {
            let user = match existing {
                Some(user) => user,
                None => {
                    let user = User::new(
                        req.email.clone(),
                        Some(req.provider_subject_id.clone()),
                        req.display_name.clone(),
                    );
                    state.store.insert_user(&user).await?;
                    tracing::info!(user_id = %user.user_id, "New identity admitted");
                    user
                }
            };

            Ok((
                StatusCode::OK,
                Json(SignInDecisionResponse::admitted(user.into())),
            )
                .into_response())
        }
        Decision::Denied => {
            tracing::info!("Sign-in denied: no valid invitation");
            Ok((
                StatusCode::UNAUTHORIZED,
                Json(SignInDecisionResponse::denied(UNAUTHORIZED_PATH)),
            )
                .into_response())
        }
    }
}
