pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod routes;

pub use extract::TrustedProxies;
pub use routes::{create_app, AppState};
