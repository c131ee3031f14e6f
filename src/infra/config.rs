//! Centralized configuration (environment variables + defaults).

use std::time::Duration;

/// Database URL must be provided (no default) for safety.
pub fn database_url() -> String {
    std::env::var("DATABASE_URL").expect("DATABASE_URL must be set")
}

/// JWT signing secret (required).
pub fn secret_key() -> String {
    std::env::var("SECRET_KEY").expect("SECRET_KEY must be set")
}

/// Access token lifetime in minutes.
pub fn access_token_expire_minutes() -> i64 {
    env_or("ACCESS_TOKEN_EXPIRE_MINUTES", 60)
}

/// TTL for the in-process identity cache, in seconds. Advisory only: a
/// revoked or role-changed user may be stale for up to this long.
pub fn cache_expiration_seconds() -> u64 {
    env_or("CACHE_EXPIRATION_SECONDS", 3600)
}

/// Blockchain RPC endpoint (required for the chain client).
pub fn blockchain_rpc() -> String {
    std::env::var("BLOCKCHAIN_RPC").expect("BLOCKCHAIN_RPC must be set")
}

/// Deployed TrueTag contract address (required for the chain client).
pub fn contract_address() -> String {
    std::env::var("CONTRACT_ADDRESS").expect("CONTRACT_ADDRESS must be set")
}

/// Expected owner of warehouse and verified tokens.
pub fn admin_wallet() -> String {
    std::env::var("ADMIN_WALLET").expect("ADMIN_WALLET must be set")
}

/// Minting authority key (required for the chain client).
pub fn admin_private_key() -> String {
    std::env::var("ADMIN_PRIVATE_KEY").expect("ADMIN_PRIVATE_KEY must be set")
}

/// Socket address the HTTP server binds to.
pub fn bind_addr() -> String {
    std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".to_string())
}

/// Directory where uploaded product images are stored.
pub fn static_dir() -> String {
    std::env::var("STATIC_DIR").unwrap_or_else(|_| "static/uploads".to_string())
}

/// Upper bound on a single outbound contract call, send to confirmation.
pub fn chain_call_timeout() -> Duration {
    Duration::from_secs(env_or("CHAIN_CALL_TIMEOUT_SECS", 120))
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

/// Snapshot of the settings the request path needs, resolved once at startup.
#[derive(Clone)]
pub struct Settings {
    pub secret_key: String,
    pub access_token_expire_minutes: i64,
    pub cache_expiration: Duration,
    pub static_dir: String,
    pub admin_wallet: String,
}

impl Settings {
    pub fn from_env() -> Self {
        Self {
            secret_key: secret_key(),
            access_token_expire_minutes: access_token_expire_minutes(),
            cache_expiration: Duration::from_secs(cache_expiration_seconds()),
            static_dir: static_dir(),
            admin_wallet: admin_wallet(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_or_falls_back_on_missing_or_bad_values() {
        std::env::remove_var("TRUETAG_TEST_MISSING");
        assert_eq!(env_or::<u64>("TRUETAG_TEST_MISSING", 7), 7);
        std::env::set_var("TRUETAG_TEST_BAD", "not-a-number");
        assert_eq!(env_or::<u64>("TRUETAG_TEST_BAD", 9), 9);
        std::env::set_var("TRUETAG_TEST_OK", "42");
        assert_eq!(env_or::<u64>("TRUETAG_TEST_OK", 9), 42);
    }
}
