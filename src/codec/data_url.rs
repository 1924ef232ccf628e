use std::fmt;
use std::io::{self, Read};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::write::EncoderStringWriter;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::error_handling::types::DecodeError;

const SCHEME: &str = "data:";
const BASE64_MARKER: &str = ";base64";

/// A textual, self-describing encoding of some bytes and their media type.
///
/// The wrapped string is not validated on construction; [`decode`] is the
/// only place that checks its shape, so stored values that were corrupted
/// on disk still load and fail later, where the caller can report it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Encoding(String);

impl Encoding {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Media type from the header, without decoding the payload.
    pub fn media_type(&self) -> Option<&str> {
        split(&self.0).ok().map(|(media_type, _)| media_type)
    }
}

impl From<String> for Encoding {
    fn from(raw: String) -> Self {
        Encoding(raw)
    }
}

impl From<&str> for Encoding {
    fn from(raw: &str) -> Self {
        Encoding(raw.to_string())
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn header(media_type: &str) -> String {
    format!("{SCHEME}{media_type}{BASE64_MARKER},")
}

/// Encodes `bytes` tagged with `media_type`. Never fails.
pub fn encode(bytes: &[u8], media_type: &str) -> Encoding {
    let mut out = header(media_type);
    out.reserve(bytes.len().div_ceil(3) * 4);
    BASE64.encode_string(bytes, &mut out);
    Encoding(out)
}

/// Streams `reader` into an encoding, so only the base64 output is held in memory.
pub fn encode_reader<R: Read>(reader: &mut R, media_type: &str) -> io::Result<Encoding> {
    let mut writer = EncoderStringWriter::from_consumer(header(media_type), &BASE64);
    io::copy(reader, &mut writer)?;
    Ok(Encoding(writer.into_inner()))
}

/// Recovers the original bytes and media type.
pub fn decode(encoding: &Encoding) -> Result<(Vec<u8>, String), DecodeError> {
    let (media_type, payload) = split(encoding.as_str())?;
    let bytes = BASE64
        .decode(payload)
        .map_err(|e| DecodeError::MalformedPayload(e.to_string()))?;
    Ok((bytes, media_type.to_string()))
}

// The payload alphabet has no `,`, so the last comma is always the separator
// even when the media type itself contains one.
fn split(raw: &str) -> Result<(&str, &str), DecodeError> {
    let rest = raw.strip_prefix(SCHEME).ok_or(DecodeError::MissingScheme)?;
    let (head, payload) = rest.rsplit_once(',').ok_or(DecodeError::MissingSeparator)?;
    let media_type = head
        .strip_suffix(BASE64_MARKER)
        .ok_or(DecodeError::NotBase64)?;
    Ok((media_type, payload))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_produces_data_url() {
        let encoding = encode(b"hello", "text/plain");
        assert_eq!(encoding.as_str(), "data:text/plain;base64,aGVsbG8=");
        assert_eq!(encoding.media_type(), Some("text/plain"));
    }

    #[test]
    fn round_trip_covers_empty_and_binary_input() {
        let all_bytes: Vec<u8> = (0..=255u8).collect();
        let inputs: [&[u8]; 4] = [b"", b"a", &[0, 0, 0xff], &all_bytes];
        for (i, bytes) in inputs.iter().enumerate() {
            let media_type = if i % 2 == 0 { "image/png" } else { "" };
            let (decoded, decoded_type) = decode(&encode(bytes, media_type)).unwrap();
            assert_eq!(&decoded[..], *bytes);
            assert_eq!(decoded_type, media_type);
        }
    }

    #[test]
    fn media_type_with_comma_and_parameters_survives() {
        let media_type = "text/plain;charset=utf-8;note=a,b";
        let (bytes, decoded_type) = decode(&encode(b"x,y", media_type)).unwrap();
        assert_eq!(bytes, b"x,y");
        assert_eq!(decoded_type, media_type);
    }

    #[test]
    fn streaming_encode_matches_in_memory_encode() {
        let payload: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
        let streamed = encode_reader(&mut payload.as_slice(), "application/pdf").unwrap();
        assert_eq!(streamed, encode(&payload, "application/pdf"));
    }

    #[test]
    fn decode_rejects_structural_faults() {
        assert_eq!(
            decode(&Encoding::from("text/plain;base64,aGk=")),
            Err(DecodeError::MissingScheme)
        );
        assert_eq!(
            decode(&Encoding::from("data:text/plain;base64")),
            Err(DecodeError::MissingSeparator)
        );
        assert_eq!(
            decode(&Encoding::from("data:text/plain,aGk=")),
            Err(DecodeError::NotBase64)
        );
        assert!(matches!(
            decode(&Encoding::from("data:text/plain;base64,!!not base64!!")),
            Err(DecodeError::MalformedPayload(_))
        ));
    }

    #[test]
    fn serializes_as_plain_string() {
        let encoding = encode(b"hi", "text/plain");
        let json = serde_json::to_string(&encoding).unwrap();
        assert_eq!(json, "\"data:text/plain;base64,aGk=\"");
        let back: Encoding = serde_json::from_str(&json).unwrap();
        assert_eq!(back, encoding);
    }
}
