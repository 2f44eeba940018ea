//! Account summary read model served by `GET /api/info`.
//!
//! Field names follow the wire contract: camelCase keys, with the inventory
//! item kind serialised as `type`.

use serde::{Deserialize, Serialize};

/// One inventory line: how many of a given item kind the account owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryEntry {
    #[serde(rename = "type")]
    pub item_type: String,
    pub quantity: i32,
}

/// An incoming transfer as seen by the receiver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceivedRecord {
    pub from_user: String,
    pub amount: i64,
}

/// An outgoing transfer as seen by the sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentRecord {
    pub to_user: String,
    pub amount: i64,
}

/// Both sides of an account's transfer history, in append order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinHistory {
    pub received: Vec<ReceivedRecord>,
    pub sent: Vec<SentRecord>,
}

/// Full account view: balance, inventory, and transfer history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    pub coins: i64,
    pub inventory: Vec<InventoryEntry>,
    pub coin_history: CoinHistory,
}
