//! Application controller: wires configuration, storage, the classifier
//! client and the session workflow together for the CLI and the dashboard.

pub mod controller_handler;

pub use controller_handler::{parse_record_id, Controller};
