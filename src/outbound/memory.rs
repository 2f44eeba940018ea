//! In-memory `Ledger` used by tests.
//!
//! One mutex guards the whole state, so every ledger operation — including
//! its check-then-act sequence — runs as a single atomic unit, matching the
//! isolation the relational adapter gets from its transactions.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::ports::{Ledger, LedgerError};
use crate::domain::summary::{
    AccountSummary, CoinHistory, InventoryEntry, ReceivedRecord, SentRecord,
};
use crate::domain::{Account, AccountId, CatalogItem, ItemId, Username, STARTING_BALANCE};

#[derive(Debug)]
struct AccountState {
    username: Username,
    credential: String,
    balance: i64,
    inventory: HashMap<i32, i32>,
    received: Vec<(i32, i64)>,
    sent: Vec<(i32, i64)>,
}

#[derive(Debug, Default)]
struct MemoryState {
    accounts: HashMap<i32, AccountState>,
    account_names: HashMap<String, i32>,
    items: HashMap<i32, CatalogItem>,
    item_names: HashMap<String, i32>,
    next_account_id: i32,
}

/// Mutex-guarded in-memory ledger.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    state: Mutex<MemoryState>,
}

impl MemoryLedger {
    /// Create an empty ledger with no catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a ledger seeded with the given catalog entries, assigning ids
    /// in iteration order starting at 1.
    pub fn with_items<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = (S, i64)>,
        S: Into<String>,
    {
        let ledger = Self::new();
        {
            let mut state = ledger.lock();
            let mut id = 0;
            for (name, price) in items {
                id += 1;
                let name = name.into();
                state.item_names.insert(name.clone(), id);
                state
                    .items
                    .insert(id, CatalogItem::new(ItemId::new(id), name, price));
            }
        }
        ledger
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().expect("memory ledger state lock")
    }
}

fn account<'a>(
    state: &'a MemoryState,
    id: AccountId,
) -> Result<&'a AccountState, LedgerError> {
    state
        .accounts
        .get(&id.get())
        .ok_or_else(|| LedgerError::query(format!("no account row for id {id}")))
}

fn account_mut<'a>(
    state: &'a mut MemoryState,
    id: AccountId,
) -> Result<&'a mut AccountState, LedgerError> {
    state
        .accounts
        .get_mut(&id.get())
        .ok_or_else(|| LedgerError::query(format!("no account row for id {id}")))
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn authenticate_or_create(
        &self,
        username: &Username,
        credential: &str,
    ) -> Result<Account, LedgerError> {
        let mut state = self.lock();
        if let Some(&id) = state.account_names.get(username.as_ref()) {
            let existing = account(&state, AccountId::new(id))?;
            if existing.credential != credential {
                return Err(LedgerError::WrongCredential);
            }
            return Ok(Account::new(
                AccountId::new(id),
                existing.username.clone(),
                existing.balance,
            ));
        }

        let id = state.next_account_id + 1;
        state.next_account_id = id;
        state.account_names.insert(username.as_ref().to_owned(), id);
        state.accounts.insert(
            id,
            AccountState {
                username: username.clone(),
                credential: credential.to_owned(),
                balance: STARTING_BALANCE,
                inventory: HashMap::new(),
                received: Vec::new(),
                sent: Vec::new(),
            },
        );
        Ok(Account::new(
            AccountId::new(id),
            username.clone(),
            STARTING_BALANCE,
        ))
    }

    async fn resolve_account(&self, username: &Username) -> Result<AccountId, LedgerError> {
        let state = self.lock();
        state
            .account_names
            .get(username.as_ref())
            .map(|&id| AccountId::new(id))
            .ok_or_else(|| LedgerError::unknown_account(username.as_ref()))
    }

    async fn resolve_item(&self, name: &str) -> Result<CatalogItem, LedgerError> {
        let state = self.lock();
        state
            .item_names
            .get(name)
            .and_then(|id| state.items.get(id))
            .cloned()
            .ok_or_else(|| LedgerError::unknown_item(name))
    }

    async fn balance(&self, account_id: AccountId) -> Result<i64, LedgerError> {
        let state = self.lock();
        account(&state, account_id).map(|a| a.balance)
    }

    async fn purchase(&self, account_id: AccountId, item: ItemId) -> Result<(), LedgerError> {
        let mut state = self.lock();
        let price = state
            .items
            .get(&item.get())
            .map(CatalogItem::price)
            .ok_or_else(|| LedgerError::query(format!("no item row for id {item}")))?;
        let entry = account_mut(&mut state, account_id)?;
        if entry.balance < price {
            return Err(LedgerError::InsufficientFunds {
                balance: entry.balance,
                required: price,
            });
        }
        entry.balance -= price;
        *entry.inventory.entry(item.get()).or_insert(0) += 1;
        Ok(())
    }

    async fn transfer(
        &self,
        from: AccountId,
        to: AccountId,
        amount: i64,
    ) -> Result<(), LedgerError> {
        let mut state = self.lock();
        let sender_balance = account(&state, from)?.balance;
        account(&state, to)?;
        if sender_balance < amount {
            return Err(LedgerError::InsufficientFunds {
                balance: sender_balance,
                required: amount,
            });
        }
        {
            let sender = account_mut(&mut state, from)?;
            sender.balance -= amount;
            sender.sent.push((to.get(), amount));
        }
        let receiver = account_mut(&mut state, to)?;
        receiver.balance += amount;
        receiver.received.push((from.get(), amount));
        Ok(())
    }

    async fn summary(&self, account_id: AccountId) -> Result<AccountSummary, LedgerError> {
        let state = self.lock();
        let entry = account(&state, account_id)?;

        let mut inventory: Vec<InventoryEntry> = entry
            .inventory
            .iter()
            .filter_map(|(item_id, &quantity)| {
                state.items.get(item_id).map(|item| InventoryEntry {
                    item_type: item.name().to_owned(),
                    quantity,
                })
            })
            .collect();
        inventory.sort_by(|a, b| a.item_type.cmp(&b.item_type));

        let counterparty = |id: i32| -> Result<String, LedgerError> {
            account(&state, AccountId::new(id)).map(|a| a.username.as_ref().to_owned())
        };
        let received = entry
            .received
            .iter()
            .map(|&(from_id, amount)| {
                Ok(ReceivedRecord {
                    from_user: counterparty(from_id)?,
                    amount,
                })
            })
            .collect::<Result<Vec<_>, LedgerError>>()?;
        let sent = entry
            .sent
            .iter()
            .map(|&(to_id, amount)| {
                Ok(SentRecord {
                    to_user: counterparty(to_id)?,
                    amount,
                })
            })
            .collect::<Result<Vec<_>, LedgerError>>()?;

        Ok(AccountSummary {
            coins: entry.balance,
            inventory,
            coin_history: CoinHistory { received, sent },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn username(name: &str) -> Username {
        Username::new(name).expect("valid test username")
    }

    #[tokio::test]
    async fn seeded_items_resolve_by_name() {
        let ledger = MemoryLedger::with_items([("pen", 20), ("book", 50)]);
        let pen = ledger.resolve_item("pen").await.expect("pen exists");
        assert_eq!(pen.price(), 20);
        let book = ledger.resolve_item("book").await.expect("book exists");
        assert_eq!(book.price(), 50);
        assert_ne!(pen.id(), book.id());

        let err = ledger.resolve_item("sword").await.expect_err("missing");
        assert_eq!(err, LedgerError::unknown_item("sword"));
    }

    #[tokio::test]
    async fn repeat_purchases_stack_in_one_inventory_entry() {
        let ledger = MemoryLedger::with_items([("pen", 20)]);
        let alice = ledger
            .authenticate_or_create(&username("alice"), "password123")
            .await
            .expect("auth");
        let pen = ledger.resolve_item("pen").await.expect("pen");

        ledger.purchase(alice.id(), pen.id()).await.expect("buy 1");
        ledger.purchase(alice.id(), pen.id()).await.expect("buy 2");

        let summary = ledger.summary(alice.id()).await.expect("summary");
        assert_eq!(summary.coins, STARTING_BALANCE - 40);
        assert_eq!(summary.inventory.len(), 1);
        assert_eq!(summary.inventory[0].quantity, 2);
    }

    #[tokio::test]
    async fn unknown_usernames_do_not_resolve() {
        let ledger = MemoryLedger::new();
        let err = ledger
            .resolve_account(&username("ghost"))
            .await
            .expect_err("missing account");
        assert_eq!(err, LedgerError::unknown_account("ghost"));
    }
}
