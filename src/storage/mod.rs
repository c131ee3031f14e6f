//! Repositories over the Postgres pool.
//!
//! One module per store: credentials, catalog, tag/batch ledger, scan ledger.
//! All queries go through the runtime sqlx API; multi-row inserts and
//! filtered listings use `QueryBuilder`.

pub mod products;
pub mod scans;
pub mod tags;
pub mod users;
