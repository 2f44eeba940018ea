//! Coin-economy endpoints: account info, transfers, purchases.
//!
//! ```text
//! GET  /api/info
//! POST /api/sendCoin {"toUser":"bob","amount":30}
//! POST /api/buy/{item}
//! ```
//!
//! All three require a verified bearer token; see [`super::bearer`].

use actix_web::{get, post, web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::domain::{AccountSummary, Error, Username};

use super::bearer::Identity;
use super::state::HttpState;
use super::ApiResult;

/// Transfer request body.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendCoinRequest {
    pub to_user: String,
    pub amount: i64,
}

/// Balance, inventory, and transfer history for the authenticated account.
#[get("/info")]
pub async fn info(
    state: web::Data<HttpState>,
    identity: Identity,
) -> ApiResult<web::Json<AccountSummary>> {
    let summary = state.economy().account_info(identity.username()).await?;
    Ok(web::Json(summary))
}

/// Transfer coins from the authenticated account to another user.
#[post("/sendCoin")]
pub async fn send_coin(
    state: web::Data<HttpState>,
    identity: Identity,
    payload: web::Json<SendCoinRequest>,
) -> ApiResult<HttpResponse> {
    let SendCoinRequest { to_user, amount } = payload.into_inner();
    let to_user =
        Username::new(&to_user).map_err(|err| Error::invalid_request(err.to_string()))?;
    state
        .economy()
        .send_coins(identity.username(), &to_user, amount)
        .await?;
    Ok(HttpResponse::Ok().finish())
}

/// Purchase one unit of the named catalog item.
#[post("/buy/{item}")]
pub async fn buy_item(
    state: web::Data<HttpState>,
    identity: Identity,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let item = path.into_inner();
    state.economy().buy_item(identity.username(), &item).await?;
    Ok(HttpResponse::Ok().finish())
}
