//! Row structs bridging Diesel and the domain types.

use diesel::prelude::*;

use super::schema::{exchanges, purchases, users};

/// Full account row as stored.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AccountRow {
    pub id: i32,
    pub username: String,
    pub credential: String,
    pub balance: i64,
}

/// Insert payload for first-time authentication.
#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewAccountRow<'a> {
    pub username: &'a str,
    pub credential: &'a str,
    pub balance: i64,
}

/// Insert payload for the inventory upsert.
#[derive(Debug, Insertable)]
#[diesel(table_name = purchases)]
pub struct NewPurchaseRow {
    pub user_id: i32,
    pub item_id: i32,
    pub quantity: i32,
}

/// Insert payload for one transfer history fact.
#[derive(Debug, Insertable)]
#[diesel(table_name = exchanges)]
pub struct NewExchangeRow {
    pub from_id: i32,
    pub to_id: i32,
    pub amount: i64,
}
