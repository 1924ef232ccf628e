//! Binary codec
//!
//! Converts raw file bytes to and from the self-describing text form used to
//! persist previews (`data:<media type>;base64,<payload>`), and rebuilds a
//! file-like value from a stored encoding when a history record is reopened.
//!
//! Components:
//! - `data_url`: the `Encoding` type with `encode`, `encode_reader` and `decode`.
//! - `file_handle`: `FileHandle`, media type detection and `reconstruct_file`.

pub mod data_url;
pub mod file_handle;

pub use data_url::{decode, encode, encode_reader, Encoding};
pub use file_handle::{media_type_for, reconstruct_file, FileHandle};
