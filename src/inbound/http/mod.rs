//! HTTP inbound adapter exposing the REST endpoints.

pub mod auth;
pub mod bearer;
pub mod error;
pub mod state;
pub mod store;

pub use error::ApiResult;
