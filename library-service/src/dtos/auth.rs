//! Sign-in completion DTOs.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::user::UserResponse;

/// What the identity provider reports when external authentication completes.
#[derive(Debug, Deserialize, Validate)]
pub struct SignInCallbackRequest {
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub provider_subject_id: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SignInDecisionResponse {
    pub admitted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_to: Option<String>,
}

impl SignInDecisionResponse {
    pub fn admitted(user: UserResponse) -> Self {
        Self {
            admitted: true,
            user: Some(user),
            redirect_to: None,
        }
    }

    pub fn denied(redirect_to: &str) -> Self {
        Self {
            admitted: false,
            user: None,
            redirect_to: Some(redirect_to.to_string()),
        }
    }
}
