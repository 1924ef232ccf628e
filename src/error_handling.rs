//! Error types shared by the codec, storage, workflow and controller layers.

pub mod types;

pub use types::*;
