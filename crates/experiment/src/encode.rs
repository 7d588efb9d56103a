//! Result payload encoding.
//!
//! The payload is the JSON array
//! `[entropy_mean, kld_mean, "<entropy cummean>", "<kld cummean>"]`,
//! where each trace is base64 over little-endian `f64` bytes, compressed with
//! zlib at level 9.

use std::io::{Read, Write};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::error::ExperimentError;

/// zlib level used for payloads.
pub const COMPRESSION_LEVEL: u32 = 9;

/// The two summary means and the two running-mean traces of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSummary {
    pub entropy_mean: f64,
    pub kld_mean: f64,
    pub entropy_cummean: Vec<f64>,
    pub kld_cummean: Vec<f64>,
}

/// Base64 (standard alphabet, padded) of the raw little-endian bytes.
pub fn encode_array(values: &[f64]) -> String {
    let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
    STANDARD.encode(bytes)
}

/// Inverse of [`encode_array`].
pub fn decode_array(encoded: &str) -> Result<Vec<f64>, ExperimentError> {
    let bytes = STANDARD.decode(encoded)?;
    if bytes.len() % 8 != 0 {
        return Err(ExperimentError::ArrayLength { len: bytes.len() });
    }
    Ok(bytes
        .chunks_exact(8)
        .map(|chunk| {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(chunk);
            f64::from_le_bytes(raw)
        })
        .collect())
}

/// Serialize and compress a summary for the result store.
///
/// The means travel as JSON numbers, so NaN or infinite means are rejected.
pub fn prepare_data(summary: &ResultSummary) -> Result<Vec<u8>, ExperimentError> {
    for (name, value) in [
        ("entropy_mean", summary.entropy_mean),
        ("kld_mean", summary.kld_mean),
    ] {
        if !value.is_finite() {
            return Err(ExperimentError::NonFiniteSummary { name, value });
        }
    }

    let tuple = (
        summary.entropy_mean,
        summary.kld_mean,
        encode_array(&summary.entropy_cummean),
        encode_array(&summary.kld_cummean),
    );
    let json = serde_json::to_vec(&tuple)?;

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::new(COMPRESSION_LEVEL));
    encoder.write_all(&json)?;
    Ok(encoder.finish()?)
}

/// Decompress and parse a payload produced by [`prepare_data`].
pub fn decode_payload(payload: &[u8]) -> Result<ResultSummary, ExperimentError> {
    let mut json = Vec::new();
    ZlibDecoder::new(payload).read_to_end(&mut json)?;
    let (entropy_mean, kld_mean, entropy_b64, kld_b64): (f64, f64, String, String) =
        serde_json::from_slice(&json)?;
    Ok(ResultSummary {
        entropy_mean,
        kld_mean,
        entropy_cummean: decode_array(&entropy_b64)?,
        kld_cummean: decode_array(&kld_b64)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_array_layout() {
        // 1.0 is 0x3FF0000000000000, little-endian
        let encoded = encode_array(&[1.0]);
        let raw = STANDARD.decode(&encoded).unwrap();
        assert_eq!(raw, vec![0, 0, 0, 0, 0, 0, 0xF0, 0x3F]);
        assert_eq!(encoded, "AAAAAAAA8D8=");
        assert_eq!(encode_array(&[]), "");
    }

    #[test]
    fn test_decode_array_rejects_partial_values() {
        let encoded = STANDARD.encode([1u8, 2, 3]);
        assert!(matches!(
            decode_array(&encoded),
            Err(ExperimentError::ArrayLength { len: 3 })
        ));
        assert!(matches!(decode_array("@@@"), Err(ExperimentError::Base64(_))));
    }

    #[test]
    fn test_payload_is_zlib_json() {
        let summary = ResultSummary {
            entropy_mean: 2.5,
            kld_mean: 0.25,
            entropy_cummean: vec![2.0, 2.5],
            kld_cummean: vec![0.5, 0.25],
        };
        let payload = prepare_data(&summary).unwrap();

        let mut json = String::new();
        ZlibDecoder::new(&payload[..])
            .read_to_string(&mut json)
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let items = value.as_array().unwrap();
        assert_eq!(items.len(), 4);
        assert_eq!(items[0].as_f64(), Some(2.5));
        assert_eq!(items[1].as_f64(), Some(0.25));
        assert_eq!(items[2].as_str(), Some(encode_array(&[2.0, 2.5]).as_str()));

        assert_eq!(decode_payload(&payload).unwrap(), summary);
    }

    #[test]
    fn test_non_finite_mean_rejected() {
        let summary = ResultSummary {
            entropy_mean: 1.0,
            kld_mean: f64::NAN,
            entropy_cummean: vec![],
            kld_cummean: vec![],
        };
        assert!(matches!(
            prepare_data(&summary),
            Err(ExperimentError::NonFiniteSummary { name: "kld_mean", .. })
        ));
    }

    #[test]
    fn test_garbage_payload_fails() {
        assert!(decode_payload(b"not zlib").is_err());
    }
}
