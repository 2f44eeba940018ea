//! PostgreSQL persistence adapter for the ledger.

mod diesel_ledger;
mod models;
mod pool;
pub mod schema;

pub use diesel_ledger::DieselLedger;
pub use pool::{DbPool, PoolConfig, PoolError};
