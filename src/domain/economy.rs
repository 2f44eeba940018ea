//! Economy workflows: authentication, purchases, transfers, account info.
//!
//! Each workflow resolves identities first, then hands the mutation to the
//! ledger as one atomic operation. The service holds no state between calls;
//! the ledger is the single source of truth at rest.

use std::sync::Arc;

use tracing::debug;

use crate::domain::ports::{Ledger, LedgerError};
use crate::domain::summary::AccountSummary;
use crate::domain::{Account, Error, Username};

/// Orchestrates ledger operations into the business workflows.
#[derive(Clone)]
pub struct EconomyService {
    ledger: Arc<dyn Ledger>,
}

impl EconomyService {
    /// Create a service over any ledger implementation.
    pub fn new(ledger: Arc<dyn Ledger>) -> Self {
        Self { ledger }
    }

    /// Authenticate a username, creating the account on first sight.
    pub async fn authenticate(
        &self,
        username: &Username,
        credential: &str,
    ) -> Result<Account, Error> {
        self.ledger
            .authenticate_or_create(username, credential)
            .await
            .map_err(map_ledger_error)
    }

    /// Purchase workflow: resolve the account and item, then debit the price
    /// and increment the inventory as one atomic operation.
    pub async fn buy_item(&self, username: &Username, item_name: &str) -> Result<(), Error> {
        let account = self
            .ledger
            .resolve_account(username)
            .await
            .map_err(map_ledger_error)?;
        let item = self
            .ledger
            .resolve_item(item_name)
            .await
            .map_err(map_ledger_error)?;
        self.ledger
            .purchase(account, item.id())
            .await
            .map_err(map_ledger_error)
    }

    /// Transfer workflow: validate the request, resolve both accounts, then
    /// move the coins and append both history facts as one atomic operation.
    pub async fn send_coins(
        &self,
        from: &Username,
        to: &Username,
        amount: i64,
    ) -> Result<(), Error> {
        if amount <= 0 {
            return Err(Error::invalid_request("transfer amount must be positive"));
        }
        if from == to {
            return Err(Error::invalid_request(
                "cannot transfer coins to your own account",
            ));
        }
        let from_id = self
            .ledger
            .resolve_account(from)
            .await
            .map_err(map_ledger_error)?;
        let to_id = self
            .ledger
            .resolve_account(to)
            .await
            .map_err(map_ledger_error)?;
        self.ledger
            .transfer(from_id, to_id, amount)
            .await
            .map_err(map_ledger_error)
    }

    /// Info workflow: balance, inventory, and transfer history.
    pub async fn account_info(&self, username: &Username) -> Result<AccountSummary, Error> {
        let account = self
            .ledger
            .resolve_account(username)
            .await
            .map_err(map_ledger_error)?;
        self.ledger.summary(account).await.map_err(map_ledger_error)
    }
}

/// Map port failures to the transport-facing error taxonomy.
fn map_ledger_error(error: LedgerError) -> Error {
    match error {
        LedgerError::UnknownAccount { username } => {
            Error::not_found(format!("no such account: {username}"))
        }
        LedgerError::UnknownItem { name } => Error::not_found(format!("no such item: {name}")),
        LedgerError::InsufficientFunds { balance, required } => Error::insufficient_funds(format!(
            "insufficient funds: balance {balance}, required {required}"
        )),
        LedgerError::WrongCredential => Error::unauthorized("wrong username or password"),
        LedgerError::Connection { message } => {
            debug!(%message, "ledger connection failure");
            Error::service_unavailable("ledger unavailable")
        }
        LedgerError::Query { message } => {
            debug!(%message, "ledger query failure");
            Error::internal("ledger failure")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::summary::{ReceivedRecord, SentRecord};
    use crate::domain::{ErrorCode, STARTING_BALANCE};
    use crate::outbound::memory::MemoryLedger;
    use rstest::rstest;

    fn username(name: &str) -> Username {
        Username::new(name).expect("valid test username")
    }

    fn service_with_items(items: &[(&str, i64)]) -> (Arc<MemoryLedger>, EconomyService) {
        let ledger = Arc::new(MemoryLedger::with_items(items.iter().copied()));
        let service = EconomyService::new(ledger.clone());
        (ledger, service)
    }

    #[rstest]
    #[case(LedgerError::unknown_account("alice"), ErrorCode::NotFound)]
    #[case(LedgerError::unknown_item("sword"), ErrorCode::NotFound)]
    #[case(
        LedgerError::InsufficientFunds { balance: 0, required: 50 },
        ErrorCode::InsufficientFunds
    )]
    #[case(LedgerError::WrongCredential, ErrorCode::Unauthorized)]
    #[case(LedgerError::connection("pool down"), ErrorCode::ServiceUnavailable)]
    #[case(LedgerError::query("bad row"), ErrorCode::InternalError)]
    fn ledger_errors_map_to_expected_codes(
        #[case] error: LedgerError,
        #[case] expected: ErrorCode,
    ) {
        assert_eq!(map_ledger_error(error).code(), expected);
    }

    #[tokio::test]
    async fn first_authentication_creates_account_with_starting_balance() {
        let (_, service) = service_with_items(&[]);
        let account = service
            .authenticate(&username("alice"), "password123")
            .await
            .expect("first auth succeeds");
        assert_eq!(account.username().as_ref(), "alice");
        assert_eq!(account.balance(), STARTING_BALANCE);
    }

    #[tokio::test]
    async fn wrong_credential_fails_without_touching_the_balance() {
        let (_, service) = service_with_items(&[]);
        let alice = username("alice");
        service
            .authenticate(&alice, "password123")
            .await
            .expect("first auth succeeds");

        let err = service
            .authenticate(&alice, "different")
            .await
            .expect_err("second auth with a different credential must fail");
        assert_eq!(err.code(), ErrorCode::Unauthorized);

        let account = service
            .authenticate(&alice, "password123")
            .await
            .expect("original credential still works");
        assert_eq!(account.balance(), STARTING_BALANCE);
    }

    #[tokio::test]
    async fn purchases_debit_balance_and_stack_inventory() {
        let (_, service) = service_with_items(&[("book", 50)]);
        let alice = username("alice");
        service
            .authenticate(&alice, "password123")
            .await
            .expect("auth");

        service.buy_item(&alice, "book").await.expect("first buy");
        let info = service.account_info(&alice).await.expect("info");
        assert_eq!(info.coins, 50);
        assert_eq!(info.inventory.len(), 1);
        assert_eq!(info.inventory[0].item_type, "book");
        assert_eq!(info.inventory[0].quantity, 1);

        service.buy_item(&alice, "book").await.expect("second buy");
        let info = service.account_info(&alice).await.expect("info");
        assert_eq!(info.coins, 0);
        // Still one row for the pair, quantity bumped.
        assert_eq!(info.inventory.len(), 1);
        assert_eq!(info.inventory[0].quantity, 2);

        let err = service
            .buy_item(&alice, "book")
            .await
            .expect_err("third buy must fail");
        assert_eq!(err.code(), ErrorCode::InsufficientFunds);

        // Failed purchase left no partial effects behind.
        let info = service.account_info(&alice).await.expect("info");
        assert_eq!(info.coins, 0);
        assert_eq!(info.inventory[0].quantity, 2);
    }

    #[tokio::test]
    async fn buying_an_unknown_item_is_not_found() {
        let (_, service) = service_with_items(&[("book", 50)]);
        let alice = username("alice");
        service
            .authenticate(&alice, "password123")
            .await
            .expect("auth");

        let err = service
            .buy_item(&alice, "sword")
            .await
            .expect_err("unknown item");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn transfer_moves_coins_and_appends_both_histories() {
        let (_, service) = service_with_items(&[]);
        let alice = username("alice");
        let bob = username("bob");
        service
            .authenticate(&alice, "password123")
            .await
            .expect("auth alice");
        service
            .authenticate(&bob, "password456")
            .await
            .expect("auth bob");

        service
            .send_coins(&alice, &bob, 30)
            .await
            .expect("transfer succeeds");

        let alice_info = service.account_info(&alice).await.expect("alice info");
        assert_eq!(alice_info.coins, 70);
        assert_eq!(
            alice_info.coin_history.sent,
            vec![SentRecord {
                to_user: "bob".into(),
                amount: 30,
            }]
        );
        assert!(alice_info.coin_history.received.is_empty());

        let bob_info = service.account_info(&bob).await.expect("bob info");
        assert_eq!(bob_info.coins, 130);
        assert_eq!(
            bob_info.coin_history.received,
            vec![ReceivedRecord {
                from_user: "alice".into(),
                amount: 30,
            }]
        );
        assert!(bob_info.coin_history.sent.is_empty());
    }

    #[tokio::test]
    async fn short_transfer_changes_nothing_on_either_side() {
        let (_, service) = service_with_items(&[]);
        let alice = username("alice");
        let bob = username("bob");
        service
            .authenticate(&alice, "password123")
            .await
            .expect("auth alice");
        service
            .authenticate(&bob, "password456")
            .await
            .expect("auth bob");

        let err = service
            .send_coins(&alice, &bob, STARTING_BALANCE + 1)
            .await
            .expect_err("overdraw must fail");
        assert_eq!(err.code(), ErrorCode::InsufficientFunds);

        let alice_info = service.account_info(&alice).await.expect("alice info");
        let bob_info = service.account_info(&bob).await.expect("bob info");
        assert_eq!(alice_info.coins, STARTING_BALANCE);
        assert_eq!(bob_info.coins, STARTING_BALANCE);
        assert!(alice_info.coin_history.sent.is_empty());
        assert!(bob_info.coin_history.received.is_empty());
    }

    #[rstest]
    #[case(0)]
    #[case(-5)]
    #[tokio::test]
    async fn non_positive_transfer_amounts_are_rejected(#[case] amount: i64) {
        let (_, service) = service_with_items(&[]);
        let err = service
            .send_coins(&username("alice"), &username("bob"), amount)
            .await
            .expect_err("must be rejected before any lookup");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }

    #[tokio::test]
    async fn self_transfer_is_rejected() {
        let (_, service) = service_with_items(&[]);
        let alice = username("alice");
        service
            .authenticate(&alice, "password123")
            .await
            .expect("auth");

        let err = service
            .send_coins(&alice, &alice, 10)
            .await
            .expect_err("self transfer must be rejected");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);

        let info = service.account_info(&alice).await.expect("info");
        assert_eq!(info.coins, STARTING_BALANCE);
        assert!(info.coin_history.sent.is_empty());
        assert!(info.coin_history.received.is_empty());
    }

    #[tokio::test]
    async fn transfer_to_unknown_account_is_not_found() {
        let (_, service) = service_with_items(&[]);
        let alice = username("alice");
        service
            .authenticate(&alice, "password123")
            .await
            .expect("auth");

        let err = service
            .send_coins(&alice, &username("nobody"), 10)
            .await
            .expect_err("unknown recipient");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn concurrent_purchases_with_exact_balance_yield_one_success() {
        let (_, service) = service_with_items(&[("relic", STARTING_BALANCE)]);
        let service = Arc::new(service);
        let alice = username("alice");
        service
            .authenticate(&alice, "password123")
            .await
            .expect("auth");

        let mut handles = Vec::new();
        for _ in 0..2 {
            let service = service.clone();
            let buyer = alice.clone();
            handles.push(tokio::spawn(async move {
                service.buy_item(&buyer, "relic").await
            }));
        }

        let mut successes = 0;
        let mut shortfalls = 0;
        for handle in handles {
            match handle.await.expect("purchase task") {
                Ok(()) => successes += 1,
                Err(err) if err.code() == ErrorCode::InsufficientFunds => shortfalls += 1,
                Err(err) => panic!("unexpected purchase error: {err}"),
            }
        }
        assert_eq!((successes, shortfalls), (1, 1));

        let info = service.account_info(&alice).await.expect("info");
        assert_eq!(info.coins, 0);
        assert_eq!(info.inventory.len(), 1);
        assert_eq!(info.inventory[0].quantity, 1);
    }
}
