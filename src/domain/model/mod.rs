//! Database entities and their status enums.

pub mod entities;
pub mod status;

pub use entities::{Batch, PasswordResetToken, Product, Scan, Tag, User};
pub use status::{BatchStatus, MintType, ProductStatus, Role, TagStatus, VerificationResult};
