pub mod policy;

pub use policy::{DuplicateCheckPolicy, OnChainPolicy, TagFacts, VerificationPolicy};
