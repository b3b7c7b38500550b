//! HTTP API.
//!
//! Upload a whitepaper, poll its task and fetch the analysis. Routes are
//! nested under `/api/`; errors use the `{"error": {"code", "message"}}`
//! body from [`error::ApiError`].

pub mod endpoints;
pub mod error;
pub mod router;
pub mod server;
pub mod types;

pub use router::api_router;
pub use server::{start_api_server, ApiServer, ServerError, ServerInfo};
pub use types::ApiContext;
