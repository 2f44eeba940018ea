//! JWT-backed `IdentityTokens` adapter.
//!
//! HS256 with a shared secret; the token subject carries the username and
//! expiry is validated on the way back in.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::domain::ports::{IdentityTokens, TokenError};
use crate::domain::Username;

/// How long an issued token stays valid.
pub const TOKEN_LIFETIME_DAYS: i64 = 7;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: i64,
    exp: i64,
}

/// HS256 token issuer/verifier over a shared secret.
pub struct JwtIdentityTokens {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl JwtIdentityTokens {
    /// Create an adapter from the shared signing secret.
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation: Validation::new(Algorithm::HS256),
        }
    }
}

impl IdentityTokens for JwtIdentityTokens {
    fn issue(&self, username: &Username) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: username.as_ref().to_owned(),
            iat: now.timestamp(),
            exp: (now + Duration::days(TOKEN_LIFETIME_DAYS)).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|err| TokenError::signing(err.to_string()))
    }

    fn verify(&self, token: &str) -> Result<Username, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|err| TokenError::invalid(err.to_string()))?;
        Username::new(data.claims.sub)
            .map_err(|err| TokenError::invalid(format!("token subject: {err}")))
    }
}
