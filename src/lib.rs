//! Coinshop library modules.

pub mod domain;
pub mod inbound;
pub mod outbound;
