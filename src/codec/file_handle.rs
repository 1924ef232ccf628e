use std::path::Path;
use std::sync::Arc;

use log::debug;

use super::data_url::{decode, encode, Encoding};
use crate::error_handling::types::DecodeError;

/// In-memory file: name, declared media type and contents.
///
/// Contents are shared, so cloning a handle to pass it to the encoder or
/// the classifier does not copy the bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHandle {
    name: String,
    media_type: String,
    bytes: Arc<[u8]>,
}

impl FileHandle {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Builds a handle whose media type is guessed from `name`.
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let media_type = media_type_for(&name);
        Self::new(name, media_type, bytes)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Encodes the contents for persistence and display.
    pub fn preview(&self) -> Encoding {
        encode(&self.bytes, &self.media_type)
    }
}

/// Media type for a file name, `application/octet-stream` when unknown.
pub fn media_type_for(name: &str) -> String {
    mime_guess::from_path(Path::new(name))
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

/// Rebuilds the original file from a stored encoding.
pub fn reconstruct_file(encoding: &Encoding, file_name: &str) -> Result<FileHandle, DecodeError> {
    let (bytes, media_type) = decode(encoding)?;
    debug!(
        "Reconstructed {} ({} byte(s), {})",
        file_name,
        bytes.len(),
        media_type
    );
    Ok(FileHandle::new(file_name, media_type, bytes))
}
