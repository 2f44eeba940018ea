//! Domain ports for the hexagonal boundary.

mod identity;
mod ledger;

pub use identity::{IdentityTokens, TokenError};
pub use ledger::{Ledger, LedgerError};
