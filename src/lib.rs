pub mod app;
pub mod auth;
pub mod domain;
pub mod infra;
pub mod storage;
pub mod transport;

// Convenience re-exports (keeps call-sites clean)
pub use app::{MintingService, VerificationService};
pub use domain::verify::{DuplicateCheckPolicy, OnChainPolicy, VerificationPolicy};
pub use infra::chain::{ChainError, EvmTagMinter, TagMinter};
pub use infra::config::Settings;
