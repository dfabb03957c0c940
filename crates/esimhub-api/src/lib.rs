//! HTTP layer for the eSIM marketplace backend.
//!
//! Public so integration tests can assemble the router and state the same
//! way `main` does.

pub mod api_doc;
pub mod auth;
pub mod constants;
pub mod error;
pub mod handlers;
pub mod services;
pub mod setup;
pub mod state;
