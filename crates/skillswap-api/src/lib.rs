pub mod error;
pub mod extract;
pub mod interactions;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod swap_requests;
pub mod users;

pub use error::ApiError;
pub use routes::router;
pub use state::{AppState, AppStateInner};
