//! Feedback backend entry point: wires the public form endpoints, the admin
//! review surface, and health probes.

mod server;

use std::env;
use std::net::SocketAddr;

use actix_web::cookie::Key;
use actix_web::web;
use tracing::warn;
use tracing_subscriber::{fmt, EnvFilter};
use zeroize::Zeroize;

use backend::inbound::http::health::HealthState;
use backend::outbound::persistence::{run_migrations, DbPool, PoolConfig};
use server::ServerConfig;

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let key = load_session_key()?;
    let cookie_secure = env::var("SESSION_COOKIE_SECURE")
        .map(|v| v != "0")
        .unwrap_or(true);
    let bind_addr: SocketAddr = env::var("BIND_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:8080".into())
        .parse()
        .map_err(|e| std::io::Error::other(format!("invalid BIND_ADDR: {e}")))?;

    let mut config = ServerConfig::new(key, cookie_secure, bind_addr);
    if let Some(secret) = form_token_secret() {
        config = config.with_form_token_secret(secret);
    }

    match env::var("DATABASE_URL") {
        Ok(database_url) => {
            run_migrations(&database_url)
                .await
                .map_err(|e| std::io::Error::other(format!("migrations failed: {e}")))?;
            let pool = DbPool::new(PoolConfig::new(&database_url))
                .await
                .map_err(|e| std::io::Error::other(e.to_string()))?;
            config = config.with_db_pool(pool);
        }
        Err(_) => warn!("DATABASE_URL not set; running without persistence"),
    }

    let health_state = web::Data::new(HealthState::new());
    let srv = server::create_server(health_state, config)?;
    srv.await
}

fn load_session_key() -> std::io::Result<Key> {
    let key_path =
        env::var("SESSION_KEY_FILE").unwrap_or_else(|_| "/var/run/secrets/session_key".into());
    match std::fs::read(&key_path) {
        Ok(mut bytes) => {
            let key = Key::derive_from(&bytes);
            bytes.zeroize();
            Ok(key)
        }
        Err(e) => {
            let allow_dev = env::var("SESSION_ALLOW_EPHEMERAL").ok().as_deref() == Some("1");
            if cfg!(debug_assertions) || allow_dev {
                warn!(path = %key_path, error = %e, "using temporary session key (dev only)");
                Ok(Key::generate())
            } else {
                Err(std::io::Error::other(format!(
                    "failed to read session key at {key_path}: {e}"
                )))
            }
        }
    }
}

fn form_token_secret() -> Option<Vec<u8>> {
    match env::var("FORM_TOKEN_SECRET") {
        Ok(secret) => Some(secret.into_bytes()),
        Err(_) => {
            warn!("FORM_TOKEN_SECRET not set; form tokens will not survive a restart");
            None
        }
    }
}
