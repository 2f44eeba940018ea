//! Ledger capability port.
//!
//! The ledger is the single source of truth for balances, inventories, and
//! transfer history. Every mutating operation executes inside exactly one
//! atomic unit of work owned by the adapter; a failure inside the unit rolls
//! back every mutation attempted since it began, so partial effects are
//! never observable. The finer-grained ledger operations (debit, credit,
//! inventory increment, history append, balance re-read) are composed over
//! the live unit of work inside each adapter, because a port call boundary
//! cannot hold a transaction open.

use async_trait::async_trait;

use crate::domain::summary::AccountSummary;
use crate::domain::{Account, AccountId, CatalogItem, ItemId, Username};

/// Failures raised by ledger adapters.
///
/// The first four variants are domain outcomes; `Connection` and `Query`
/// are storage failures, reported only after the unit of work rolled back.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// No account exists for the given username.
    #[error("unknown account: {username}")]
    UnknownAccount { username: String },
    /// No catalog entry exists for the given item name.
    #[error("unknown item: {name}")]
    UnknownItem { name: String },
    /// The committed balance cannot cover the requested amount.
    #[error("insufficient funds: balance {balance}, required {required}")]
    InsufficientFunds { balance: i64, required: i64 },
    /// The stored credential does not match the supplied one.
    #[error("wrong credential")]
    WrongCredential,
    /// The backing store could not be reached.
    #[error("ledger connection failed: {message}")]
    Connection { message: String },
    /// A read or mutation failed during execution.
    #[error("ledger query failed: {message}")]
    Query { message: String },
}

impl LedgerError {
    /// Build an [`LedgerError::UnknownAccount`] from any name-like input.
    pub fn unknown_account(username: impl Into<String>) -> Self {
        Self::UnknownAccount {
            username: username.into(),
        }
    }

    /// Build an [`LedgerError::UnknownItem`] from any name-like input.
    pub fn unknown_item(name: impl Into<String>) -> Self {
        Self::UnknownItem { name: name.into() }
    }

    /// Build an [`LedgerError::Connection`] from any message-like input.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Build an [`LedgerError::Query`] from any message-like input.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// Authoritative store of account balances, inventories, and history.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Authenticate a username, creating the account with the starting
    /// balance on first sight. Any credential is accepted on creation; an
    /// existing account with a mismatched credential fails
    /// [`LedgerError::WrongCredential`]. Concurrent first-auths for the same
    /// username must yield exactly one account.
    async fn authenticate_or_create(
        &self,
        username: &Username,
        credential: &str,
    ) -> Result<Account, LedgerError>;

    /// Resolve a username to its account id.
    async fn resolve_account(&self, username: &Username) -> Result<AccountId, LedgerError>;

    /// Resolve a catalog item by name. Side-effect free.
    async fn resolve_item(&self, name: &str) -> Result<CatalogItem, LedgerError>;

    /// Read the committed balance of an account.
    async fn balance(&self, account: AccountId) -> Result<i64, LedgerError>;

    /// Purchase one unit of an item: within a single unit of work, re-read
    /// the balance and price, fail [`LedgerError::InsufficientFunds`] if
    /// short, otherwise debit the price and upsert the inventory row
    /// (quantity + 1, never a second row for the same account/item pair).
    async fn purchase(&self, account: AccountId, item: ItemId) -> Result<(), LedgerError>;

    /// Transfer coins between two accounts: within a single unit of work,
    /// re-read the sender balance, fail [`LedgerError::InsufficientFunds`]
    /// if short, otherwise debit the sender, credit the receiver, and append
    /// the matching sent/received history facts. Adapters must take account
    /// locks in a fixed order to stay deadlock free under contention.
    async fn transfer(&self, from: AccountId, to: AccountId, amount: i64)
        -> Result<(), LedgerError>;

    /// Read the full account view: balance, inventory, transfer history.
    async fn summary(&self, account: AccountId) -> Result<AccountSummary, LedgerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_carry_context() {
        let err = LedgerError::unknown_account("alice");
        assert_eq!(err.to_string(), "unknown account: alice");

        let err = LedgerError::InsufficientFunds {
            balance: 10,
            required: 50,
        };
        assert_eq!(err.to_string(), "insufficient funds: balance 10, required 50");

        let err = LedgerError::connection("pool exhausted");
        assert_eq!(err.to_string(), "ledger connection failed: pool exhausted");
    }
}
