//! docchat HTTP server library: state, routes and error responses.

pub mod error;
pub mod routes;
pub mod state;

pub use routes::build_router;
pub use state::AppState;
