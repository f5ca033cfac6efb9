//! HTTP front end for tledger.
//!
//! Routes live in [`routes`]; [`dump`] writes the cache snapshot taken on
//! shutdown. The binary in `main.rs` wires both to a store and a listener.

pub mod dump;
pub mod routes;

pub use dump::write_snapshot;
pub use routes::{router, AppState};
