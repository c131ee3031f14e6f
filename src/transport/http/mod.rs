pub mod error;
pub mod extract;
pub mod router;
pub mod types;
pub mod handlers {
    pub mod auth;
    pub mod dashboard;
    pub mod health;
    pub mod products;
    pub mod tags;
    pub mod users;
    pub mod verify;
}

pub use router::{create_router, ApiDoc};
pub use types::AppState;
