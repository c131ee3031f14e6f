//! Application workflows orchestrating the stores and the chain client.

pub mod minting;
pub mod verification;

pub use minting::MintingService;
pub use verification::VerificationService;
