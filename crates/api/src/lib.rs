//! HTTP layer of the operations dashboard: configuration, shared state,
//! handlers, routes and the middleware stack.

pub mod attachments;
pub mod config;
pub mod error;
pub mod export;
pub mod handlers;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
