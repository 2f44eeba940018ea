//! Authentication endpoint.
//!
//! ```text
//! POST /api/auth {"username":"alice","password":"password123"} -> {"token":"..."}
//! ```

use actix_web::{post, web};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{Error, Username, UsernameValidationError};

use super::state::HttpState;
use super::ApiResult;

/// Minimum accepted password length.
pub const PASSWORD_MIN: usize = 8;

/// Login request body.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthRequest {
    pub username: String,
    pub password: String,
}

/// Login response body carrying the identity token.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
}

fn map_username_error(err: UsernameValidationError) -> Error {
    Error::invalid_request(err.to_string())
}

fn validate_password(password: &str) -> Result<(), Error> {
    if password.chars().count() < PASSWORD_MIN {
        return Err(Error::invalid_request(format!(
            "password must be at least {PASSWORD_MIN} characters"
        )));
    }
    Ok(())
}

/// Authenticate a username, creating the account on first sight, and issue
/// an identity token for the protected endpoints.
#[post("/auth")]
pub async fn auth(
    state: web::Data<HttpState>,
    payload: web::Json<AuthRequest>,
) -> ApiResult<web::Json<AuthResponse>> {
    let AuthRequest { username, password } = payload.into_inner();
    let username = Username::new(&username).map_err(map_username_error)?;
    validate_password(&password)?;

    let account = state.economy().authenticate(&username, &password).await?;

    // Signing failures surface as 400, matching the auth endpoint contract.
    let token = state.tokens().issue(account.username()).map_err(|err| {
        debug!(error = %err, "token issuance failed");
        Error::invalid_request("failed to issue identity token")
    })?;

    Ok(web::Json(AuthResponse { token }))
}
