//! Attachment encoding: raw document bytes → base64 inline part.
//!
//! The generative-content API accepts files inline as base64 strings inside
//! the JSON request body. Nothing about the document is interpreted locally;
//! PDFs and spreadsheets are shipped opaquely and read by the model.

use crate::provider::Part;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::debug;

/// Length of the padded base64 text for `n` input bytes.
pub fn encoded_len(n: u64) -> u64 {
    n.div_ceil(3).saturating_mul(4)
}

/// Encode a document as an inline attachment part.
pub fn encode_attachment(bytes: &[u8], mime_type: &str) -> Part {
    let data = STANDARD.encode(bytes);
    debug!(
        "Encoded {} bytes of {} → {} bytes base64",
        bytes.len(),
        mime_type,
        data.len()
    );
    Part::InlineData {
        mime_type: mime_type.to_string(),
        data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_csv() {
        let part = encode_attachment(b"channel,spend\n", "text/csv");
        match part {
            Part::InlineData { mime_type, data } => {
                assert_eq!(mime_type, "text/csv");
                assert_eq!(data, "Y2hhbm5lbCxzcGVuZAo=");
                let decoded = STANDARD.decode(&data).expect("valid base64");
                assert_eq!(decoded, b"channel,spend\n");
            }
            other => panic!("expected inline data, got {other:?}"),
        }
    }

    #[test]
    fn encoded_len_matches_engine() {
        for n in [0usize, 1, 2, 3, 4, 14, 1000] {
            let data = STANDARD.encode(vec![7u8; n]);
            assert_eq!(encoded_len(n as u64), data.len() as u64, "n = {n}");
        }
    }

    #[test]
    fn encode_empty_file() {
        match encode_attachment(&[], "application/pdf") {
            Part::InlineData { data, .. } => assert!(data.is_empty()),
            other => panic!("expected inline data, got {other:?}"),
        }
    }
}
