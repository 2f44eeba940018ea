//! Service entry-point: wires the ledger, token adapter, and REST endpoints.

use std::env;
use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use tracing::warn;
use tracing_subscriber::{fmt, EnvFilter};

use coinshop::domain::EconomyService;
use coinshop::domain::ports::IdentityTokens;
use coinshop::inbound::http::state::HttpState;
use coinshop::inbound::http::{auth, store};
use coinshop::outbound::jwt::JwtIdentityTokens;
use coinshop::outbound::persistence::{DbPool, DieselLedger, PoolConfig};

fn token_secret() -> std::io::Result<Vec<u8>> {
    match env::var("TOKEN_SECRET") {
        Ok(secret) => Ok(secret.into_bytes()),
        Err(_) if cfg!(debug_assertions) => {
            warn!("TOKEN_SECRET not set, using a development-only secret");
            Ok(b"development-secret".to_vec())
        }
        Err(_) => Err(std::io::Error::other("TOKEN_SECRET must be set")),
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let database_url = env::var("DATABASE_URL")
        .map_err(|_| std::io::Error::other("DATABASE_URL must be set"))?;
    let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".into());
    let secret = token_secret()?;

    let pool = DbPool::new(PoolConfig::new(database_url))
        .await
        .map_err(std::io::Error::other)?;
    let ledger = Arc::new(DieselLedger::new(pool));
    let economy = Arc::new(EconomyService::new(ledger));
    let tokens: Arc<dyn IdentityTokens> = Arc::new(JwtIdentityTokens::new(&secret));
    let state = web::Data::new(HttpState::new(economy, tokens));

    HttpServer::new(move || {
        App::new().app_data(state.clone()).service(
            web::scope("/api")
                .service(auth::auth)
                .service(store::info)
                .service(store::send_coin)
                .service(store::buy_item),
        )
    })
    .bind(bind_addr.as_str())?
    .run()
    .await
}
