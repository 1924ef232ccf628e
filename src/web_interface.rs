//! Local dashboard API over the history store.
//!
//! - `routes`: response types, handlers and the composed `warp` filter.
//! - `web_server`: binds the filter to an address.

pub mod routes;
pub mod web_server;

pub use routes::*;
pub use web_server::*;
