//! Invitation link clicks: validate, stash the handoff cookie, redirect.

use axum::extract::{Path, State};
use axum::response::Redirect;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;

use crate::config::Environment;
use crate::handlers::auth::INVITE_COOKIE;
use crate::AppState;
use service_core::error::AppError;

pub const SIGN_IN_PATH: &str = "/auth/signin";
pub const INVALID_INVITE_PATH: &str = "/invite/invalid";

/// GET /invite/{token}
///
/// The only side effect of a valid click is the handoff cookie; the
/// invitation itself is consumed later, at sign-in completion.
#[tracing::instrument(skip_all)]
pub async fn follow_invite_link(
    State(state): State<AppState>,
    Path(token): Path<String>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), AppError> {
    let now = Utc::now();

    let invitation = state.store.find_invitation_by_token(&token).await?;
    let open = invitation.map(|i| i.is_open(now)).unwrap_or(false);

    if !open {
        // No cookie for unknown, used, or expired invitations: a token must
        // not reach the browser unless it could still admit someone.
        return Ok((jar, Redirect::to(INVALID_INVITE_PATH)));
    }

    let value = state.handoff.issue(&token, now);
    let cookie = Cookie::build((INVITE_COOKIE, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.environment == Environment::Prod)
        .max_age(time::Duration::seconds(state.handoff.ttl_seconds()))
        .build();

    Ok((jar.add(cookie), Redirect::to(SIGN_IN_PATH)))
}
