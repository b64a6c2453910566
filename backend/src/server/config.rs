//! HTTP server configuration object and helpers.

use actix_web::cookie::Key;
use backend::outbound::persistence::DbPool;
use std::net::SocketAddr;

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) session_key: Key,
    pub(crate) cookie_secure: bool,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) db_pool: Option<DbPool>,
    pub(crate) form_token_secret: Vec<u8>,
}

impl ServerConfig {
    /// Construct a configuration with a freshly generated form-token secret.
    ///
    /// A generated secret means issued form tokens die with the process;
    /// override it with [`with_form_token_secret`] for stable deployments.
    ///
    /// [`with_form_token_secret`]: Self::with_form_token_secret
    #[must_use]
    pub fn new(session_key: Key, cookie_secure: bool, bind_addr: SocketAddr) -> Self {
        Self {
            session_key,
            cookie_secure,
            bind_addr,
            db_pool: None,
            form_token_secret: rand::random::<[u8; 32]>().to_vec(),
        }
    }

    /// Attach a database connection pool for the persistence adapter.
    ///
    /// Without a pool the server falls back to the fixture repository, which
    /// stores nothing; that mode exists for tests and local smoke runs.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    /// Use a stable secret for anti-forgery token derivation.
    #[must_use]
    pub fn with_form_token_secret(mut self, secret: Vec<u8>) -> Self {
        self.form_token_secret = secret;
        self
    }
}
