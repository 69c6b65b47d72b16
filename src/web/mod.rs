//! Web server module
//!
//! JSON API over search, trends and history for the rendering front end.

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
