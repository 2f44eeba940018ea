//! Diesel table definitions for the PostgreSQL schema.
//!
//! These must match the SQL in `migrations/` exactly; Diesel uses them for
//! compile-time query validation.

diesel::table! {
    /// Account rows: unique username, stored credential, coin balance.
    users (id) {
        id -> Int4,
        username -> Varchar,
        credential -> Varchar,
        balance -> Int8,
    }
}

diesel::table! {
    /// Catalog rows: unique item name and fixed price. Read-only at runtime.
    items (id) {
        id -> Int4,
        name -> Varchar,
        price -> Int8,
    }
}

diesel::table! {
    /// Inventory rows, one per (account, item) pair, upserted on purchase.
    purchases (user_id, item_id) {
        user_id -> Int4,
        item_id -> Int4,
        quantity -> Int4,
    }
}

diesel::table! {
    /// Append-only transfer history.
    exchanges (id) {
        id -> Int4,
        from_id -> Int4,
        to_id -> Int4,
        amount -> Int8,
    }
}

diesel::joinable!(purchases -> items (item_id));

diesel::allow_tables_to_appear_in_same_query!(users, items, purchases, exchanges);
