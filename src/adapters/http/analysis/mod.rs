//! Analysis endpoints.

mod dto;
mod extract;
mod handlers;
mod routes;

pub use routes::analysis_router;
