//! PostgreSQL-backed `Ledger` adapter.
//!
//! Every mutating operation runs inside one `conn.transaction` so it commits
//! entirely or rolls back entirely. Balance checks re-read the row under a
//! `FOR UPDATE` lock inside the same transaction that performs the write, so
//! two concurrent purchases cannot both pass the check against a stale
//! balance. Transfers lock both account rows in ascending id order before
//! writing anything, which keeps overlapping transfer pairs deadlock free.

use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use tracing::debug;

use crate::domain::ports::{Ledger, LedgerError};
use crate::domain::summary::{
    AccountSummary, CoinHistory, InventoryEntry, ReceivedRecord, SentRecord,
};
use crate::domain::{Account, AccountId, CatalogItem, ItemId, Username, STARTING_BALANCE};

use super::models::{AccountRow, NewAccountRow, NewExchangeRow, NewPurchaseRow};
use super::pool::{DbPool, PoolError};
use super::schema::{exchanges, items, purchases, users};

/// Diesel implementation of the [`Ledger`] port.
#[derive(Clone)]
pub struct DieselLedger {
    pool: DbPool,
}

impl DieselLedger {
    /// Create an adapter over the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Error local to one unit of work: either a domain outcome decided inside
/// the transaction (which still rolls it back) or a database failure.
#[derive(Debug)]
enum TxError {
    Ledger(LedgerError),
    Diesel(diesel::result::Error),
}

impl From<diesel::result::Error> for TxError {
    fn from(error: diesel::result::Error) -> Self {
        Self::Diesel(error)
    }
}

fn resolve_tx_error(error: TxError) -> LedgerError {
    match error {
        TxError::Ledger(error) => error,
        TxError::Diesel(error) => map_diesel_error(error),
    }
}

fn map_pool_error(error: PoolError) -> LedgerError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            LedgerError::connection(message)
        }
    }
}

fn map_diesel_error(error: diesel::result::Error) -> LedgerError {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        other => debug!(error = %other, "diesel operation failed"),
    }

    match error {
        DieselError::NotFound => LedgerError::query("record not found"),
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            LedgerError::connection("database connection error")
        }
        _ => LedgerError::query("database error"),
    }
}

fn row_to_account(row: AccountRow) -> Result<Account, LedgerError> {
    let username = Username::new(&row.username)
        .map_err(|err| LedgerError::query(format!("stored username rejected: {err}")))?;
    Ok(Account::new(AccountId::new(row.id), username, row.balance))
}

/// Re-read an account balance under a row lock, inside an open transaction.
async fn locked_balance(
    conn: &mut AsyncPgConnection,
    account: AccountId,
) -> Result<i64, diesel::result::Error> {
    users::table
        .find(account.get())
        .select(users::balance)
        .for_update()
        .first(conn)
        .await
}

/// Read an item price; callable inside an ongoing transaction.
async fn item_price(
    conn: &mut AsyncPgConnection,
    item: ItemId,
) -> Result<i64, diesel::result::Error> {
    items::table
        .find(item.get())
        .select(items::price)
        .first(conn)
        .await
}

async fn debit(
    conn: &mut AsyncPgConnection,
    account: AccountId,
    amount: i64,
) -> Result<(), diesel::result::Error> {
    diesel::update(users::table.find(account.get()))
        .set(users::balance.eq(users::balance - amount))
        .execute(conn)
        .await
        .map(|_| ())
}

async fn credit(
    conn: &mut AsyncPgConnection,
    account: AccountId,
    amount: i64,
) -> Result<(), diesel::result::Error> {
    diesel::update(users::table.find(account.get()))
        .set(users::balance.eq(users::balance + amount))
        .execute(conn)
        .await
        .map(|_| ())
}

/// Upsert the (account, item) inventory row: insert at quantity 1, bump on
/// conflict. The composite primary key guarantees a single row per pair.
async fn increment_inventory(
    conn: &mut AsyncPgConnection,
    account: AccountId,
    item: ItemId,
) -> Result<(), diesel::result::Error> {
    diesel::insert_into(purchases::table)
        .values(&NewPurchaseRow {
            user_id: account.get(),
            item_id: item.get(),
            quantity: 1,
        })
        .on_conflict((purchases::user_id, purchases::item_id))
        .do_update()
        .set(purchases::quantity.eq(purchases::quantity + 1))
        .execute(conn)
        .await
        .map(|_| ())
}

/// Append one transfer fact, visible as "sent" to the sender and
/// "received" to the receiver.
async fn append_transfer_record(
    conn: &mut AsyncPgConnection,
    from: AccountId,
    to: AccountId,
    amount: i64,
) -> Result<(), diesel::result::Error> {
    diesel::insert_into(exchanges::table)
        .values(&NewExchangeRow {
            from_id: from.get(),
            to_id: to.get(),
            amount,
        })
        .execute(conn)
        .await
        .map(|_| ())
}

#[async_trait::async_trait]
impl Ledger for DieselLedger {
    async fn authenticate_or_create(
        &self,
        username: &Username,
        credential: &str,
    ) -> Result<Account, LedgerError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let name = username.as_ref().to_owned();
        let credential = credential.to_owned();

        let row = conn
            .transaction::<AccountRow, TxError, _>(|conn| {
                async move {
                    // Insert-first keeps concurrent first-auths race free:
                    // exactly one insert wins the unique username, the loser
                    // falls through to the credential check.
                    let inserted: Option<AccountRow> = diesel::insert_into(users::table)
                        .values(&NewAccountRow {
                            username: &name,
                            credential: &credential,
                            balance: STARTING_BALANCE,
                        })
                        .on_conflict(users::username)
                        .do_nothing()
                        .returning(AccountRow::as_returning())
                        .get_result(conn)
                        .await
                        .optional()?;

                    if let Some(row) = inserted {
                        return Ok(row);
                    }

                    let row: AccountRow = users::table
                        .filter(users::username.eq(&name))
                        .select(AccountRow::as_select())
                        .first(conn)
                        .await?;
                    if row.credential != credential {
                        return Err(TxError::Ledger(LedgerError::WrongCredential));
                    }
                    Ok(row)
                }
                .scope_boxed()
            })
            .await
            .map_err(resolve_tx_error)?;

        row_to_account(row)
    }

    async fn resolve_account(&self, username: &Username) -> Result<AccountId, LedgerError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let id: Option<i32> = users::table
            .filter(users::username.eq(username.as_ref()))
            .select(users::id)
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        id.map(AccountId::new)
            .ok_or_else(|| LedgerError::unknown_account(username.as_ref()))
    }

    async fn resolve_item(&self, name: &str) -> Result<CatalogItem, LedgerError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<(i32, String, i64)> = items::table
            .filter(items::name.eq(name))
            .select((items::id, items::name, items::price))
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(|(id, name, price)| CatalogItem::new(ItemId::new(id), name, price))
            .ok_or_else(|| LedgerError::unknown_item(name))
    }

    async fn balance(&self, account: AccountId) -> Result<i64, LedgerError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        users::table
            .find(account.get())
            .select(users::balance)
            .first(&mut conn)
            .await
            .map_err(map_diesel_error)
    }

    async fn purchase(&self, account: AccountId, item: ItemId) -> Result<(), LedgerError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction::<(), TxError, _>(|conn| {
            async move {
                let balance = locked_balance(conn, account).await?;
                let price = item_price(conn, item).await?;
                if balance < price {
                    return Err(TxError::Ledger(LedgerError::InsufficientFunds {
                        balance,
                        required: price,
                    }));
                }
                debit(conn, account, price).await?;
                increment_inventory(conn, account, item).await?;
                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(resolve_tx_error)
    }

    async fn transfer(
        &self,
        from: AccountId,
        to: AccountId,
        amount: i64,
    ) -> Result<(), LedgerError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction::<(), TxError, _>(|conn| {
            async move {
                // Lock both rows in ascending id order before any write.
                let rows: Vec<(i32, i64)> = users::table
                    .filter(users::id.eq_any([from.get(), to.get()]))
                    .order(users::id.asc())
                    .select((users::id, users::balance))
                    .for_update()
                    .load(conn)
                    .await?;
                let sender_balance = rows
                    .iter()
                    .find(|(id, _)| *id == from.get())
                    .map(|(_, balance)| *balance)
                    .ok_or(TxError::Diesel(diesel::result::Error::NotFound))?;
                if !rows.iter().any(|(id, _)| *id == to.get()) {
                    return Err(TxError::Diesel(diesel::result::Error::NotFound));
                }
                if sender_balance < amount {
                    return Err(TxError::Ledger(LedgerError::InsufficientFunds {
                        balance: sender_balance,
                        required: amount,
                    }));
                }
                debit(conn, from, amount).await?;
                credit(conn, to, amount).await?;
                append_transfer_record(conn, from, to, amount).await?;
                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(resolve_tx_error)
    }

    async fn summary(&self, account: AccountId) -> Result<AccountSummary, LedgerError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction::<AccountSummary, TxError, _>(|conn| {
            // One transaction so every SELECT observes the same snapshot.
            async move {
                let coins: i64 = users::table
                    .find(account.get())
                    .select(users::balance)
                    .first(conn)
                    .await?;

                let inventory: Vec<(String, i32)> = purchases::table
                    .inner_join(items::table)
                    .filter(purchases::user_id.eq(account.get()))
                    .order(items::name.asc())
                    .select((items::name, purchases::quantity))
                    .load(conn)
                    .await?;

                let received: Vec<(String, i64)> = exchanges::table
                    .inner_join(users::table.on(users::id.eq(exchanges::from_id)))
                    .filter(exchanges::to_id.eq(account.get()))
                    .order(exchanges::id.asc())
                    .select((users::username, exchanges::amount))
                    .load(conn)
                    .await?;

                let sent: Vec<(String, i64)> = exchanges::table
                    .inner_join(users::table.on(users::id.eq(exchanges::to_id)))
                    .filter(exchanges::from_id.eq(account.get()))
                    .order(exchanges::id.asc())
                    .select((users::username, exchanges::amount))
                    .load(conn)
                    .await?;

                Ok(AccountSummary {
                    coins,
                    inventory: inventory
                        .into_iter()
                        .map(|(item_type, quantity)| InventoryEntry {
                            item_type,
                            quantity,
                        })
                        .collect(),
                    coin_history: CoinHistory {
                        received: received
                            .into_iter()
                            .map(|(from_user, amount)| ReceivedRecord { from_user, amount })
                            .collect(),
                        sent: sent
                            .into_iter()
                            .map(|(to_user, amount)| SentRecord { to_user, amount })
                            .collect(),
                    },
                })
            }
            .scope_boxed()
        })
        .await
        .map_err(resolve_tx_error)
    }
}
