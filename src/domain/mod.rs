//! Domain primitives, workflows, and ports.
//!
//! Types in this module are transport agnostic: inbound adapters map them to
//! HTTP, outbound adapters map them to storage rows. Invariants live on the
//! types themselves, never in the adapters.

pub mod account;
pub mod catalog;
pub mod economy;
pub mod error;
pub mod ports;
pub mod summary;

pub use self::account::{Account, AccountId, Username, UsernameValidationError, STARTING_BALANCE};
pub use self::catalog::{CatalogItem, ItemId};
pub use self::economy::EconomyService;
pub use self::error::{Error, ErrorCode};
pub use self::summary::AccountSummary;
