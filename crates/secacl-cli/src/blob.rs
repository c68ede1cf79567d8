//! Text encodings for binary blobs on the command line.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// How blobs are written as text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BlobEncoding {
    /// Lowercase hexadecimal
    #[default]
    Hex,
    /// Standard base64 with padding
    Base64,
}

/// Decodes blob text, ignoring surrounding and embedded ASCII whitespace.
pub fn decode_blob(text: &str, encoding: BlobEncoding) -> Result<Vec<u8>> {
    let compact: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    if compact.is_empty() {
        return Err(Error::Blob("empty input".to_string()));
    }
    match encoding {
        BlobEncoding::Hex => hex::decode(&compact).map_err(|e| Error::Blob(format!("hex: {e}"))),
        BlobEncoding::Base64 => STANDARD
            .decode(compact.as_bytes())
            .map_err(|e| Error::Blob(format!("base64: {e}"))),
    }
}

/// Encodes bytes as blob text.
pub fn encode_blob(bytes: &[u8], encoding: BlobEncoding) -> String {
    match encoding {
        BlobEncoding::Hex => hex::encode(bytes),
        BlobEncoding::Base64 => STANDARD.encode(bytes),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_round_trip() {
        let text = encode_blob(&[0x53, 0x41, 0x00, 0xff], BlobEncoding::Hex);
        assert_eq!(text, "534100ff");
        assert_eq!(
            decode_blob(" 5341\n00ff ", BlobEncoding::Hex).unwrap(),
            vec![0x53, 0x41, 0x00, 0xff]
        );
    }

    #[test]
    fn test_base64_round_trip() {
        let text = encode_blob(b"SACL", BlobEncoding::Base64);
        assert_eq!(text, "U0FDTA==");
        assert_eq!(decode_blob(&text, BlobEncoding::Base64).unwrap(), b"SACL");
    }

    #[test]
    fn test_rejects_bad_text() {
        assert!(decode_blob("zz", BlobEncoding::Hex).is_err());
        assert!(decode_blob("!!!", BlobEncoding::Base64).is_err());
        assert!(decode_blob("   ", BlobEncoding::Hex).is_err());
    }
}
