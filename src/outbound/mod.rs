//! Outbound adapters: persistence, in-memory ledger, identity tokens.

pub mod jwt;
pub mod memory;
pub mod persistence;
