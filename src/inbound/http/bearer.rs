//! Bearer-token identity extraction.
//!
//! Handlers receive the authenticated username as an explicit [`Identity`]
//! parameter rather than fishing it out of ambient request state. Extraction
//! verifies the token before any workflow runs.

use std::future::{ready, Ready};

use actix_web::http::header;
use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use tracing::debug;

use crate::domain::{Error, Username};

use super::state::HttpState;

/// The verified identity behind a request.
#[derive(Debug, Clone)]
pub struct Identity(Username);

impl Identity {
    /// The authenticated username.
    pub fn username(&self) -> &Username {
        &self.0
    }
}

fn extract(req: &HttpRequest) -> Result<Identity, Error> {
    let state = req
        .app_data::<web::Data<HttpState>>()
        .ok_or_else(|| Error::internal("http state not configured"))?;

    let raw = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or_else(|| Error::unauthorized("missing authorization header"))?
        .to_str()
        .map_err(|_| Error::unauthorized("malformed authorization header"))?;
    let token = raw
        .strip_prefix("Bearer ")
        .ok_or_else(|| Error::unauthorized("authorization header must use the Bearer scheme"))?;

    match state.tokens().verify(token) {
        Ok(username) => Ok(Identity(username)),
        Err(err) => {
            debug!(error = %err, "token verification failed");
            Err(Error::unauthorized("invalid or expired token"))
        }
    }
}

impl FromRequest for Identity {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(extract(req))
    }
}
