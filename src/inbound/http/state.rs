//! Shared application state for HTTP handlers.

use std::sync::Arc;

use crate::domain::ports::IdentityTokens;
use crate::domain::EconomyService;

/// State injected into every handler: the workflow service and the token
/// collaborator. Holds no per-request data.
#[derive(Clone)]
pub struct HttpState {
    economy: Arc<EconomyService>,
    tokens: Arc<dyn IdentityTokens>,
}

impl HttpState {
    /// Assemble the handler state.
    pub fn new(economy: Arc<EconomyService>, tokens: Arc<dyn IdentityTokens>) -> Self {
        Self { economy, tokens }
    }

    /// The workflow service.
    pub fn economy(&self) -> &EconomyService {
        &self.economy
    }

    /// The identity-token collaborator.
    pub fn tokens(&self) -> &dyn IdentityTokens {
        self.tokens.as_ref()
    }
}
