//! Opaque external identifiers.
//!
//! Internal keys are encoded with Sqids over a configurable alphabet. The
//! unsalted form mixes in random and time-derived noise, so the same key
//! never yields the same string twice. Decoding keeps only the first number,
//! which is always the key.

use chrono::Utc;
use rand::rngs::OsRng;
use rand::Rng;
use service_core::error::AppError;
use sqids::Sqids;
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

pub const DEFAULT_ALPHABET: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

#[derive(Debug, Error)]
pub enum IdentifierError {
    #[error("minimum length must not exceed 255")]
    MinLengthTooLarge,

    #[error("negative identifiers cannot be encoded")]
    NegativeId,

    #[error(transparent)]
    Sqids(#[from] sqids::Error),
}

impl From<IdentifierError> for AppError {
    fn from(err: IdentifierError) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

pub struct IdentifierCodec {
    sqids: Sqids,
    min_length: u8,
}

impl fmt::Debug for IdentifierCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentifierCodec")
            .field("min_length", &self.min_length)
            .finish_non_exhaustive()
    }
}

impl IdentifierCodec {
    pub fn new<I, S>(alphabet: &str, min_length: usize, blocklist: I) -> Result<Self, IdentifierError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let min_length =
            u8::try_from(min_length).map_err(|_| IdentifierError::MinLengthTooLarge)?;

        let blocklist: HashSet<String> = blocklist
            .into_iter()
            .map(|word| word.as_ref().to_string())
            .collect();

        let sqids = Sqids::builder()
            .alphabet(alphabet.chars().collect())
            .min_length(min_length)
            .blocklist(blocklist)
            .build()?;

        Ok(Self { sqids, min_length })
    }

    /// Encode `id` with fresh noise. Two calls never agree.
    pub fn encode(&self, id: i64) -> Result<String, IdentifierError> {
        let id = non_negative(id)?;
        let mut rng = OsRng;
        let small: u64 = rng.gen_range(0..1_000);
        let large: u64 = rng.gen_range(0..10_000);
        let clock = Utc::now().timestamp_millis().rem_euclid(100_000) as u64;

        Ok(self.sqids.encode(&[id, small, large, clock])?)
    }

    /// Encode `id` together with `salt`. Stable for a fixed salt.
    pub fn encode_with_salt(&self, id: i64, salt: u64) -> Result<String, IdentifierError> {
        Ok(self.sqids.encode(&[non_negative(id)?, salt])?)
    }

    /// Recover the key from an opaque id, or `None` if it is not one of ours.
    pub fn decode(&self, opaque: &str) -> Option<i64> {
        let decoded = self
            .sqids
            .decode(opaque)
            .first()
            .and_then(|&n| i64::try_from(n).ok());

        if decoded.is_none() {
            tracing::debug!("Rejected malformed opaque identifier");
        }
        decoded
    }
}

fn non_negative(id: i64) -> Result<u64, IdentifierError> {
    u64::try_from(id).map_err(|_| IdentifierError::NegativeId)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec(min_length: usize) -> IdentifierCodec {
        IdentifierCodec::new(DEFAULT_ALPHABET, min_length, Vec::<String>::new()).unwrap()
    }

    #[test]
    fn test_salted_round_trip() {
        let codec = codec(8);
        for id in [0, 1, 7, 42, 1_000_000, i64::MAX] {
            for salt in [0, 1, 999, u64::MAX] {
                let opaque = codec.encode_with_salt(id, salt).unwrap();
                assert_eq!(codec.decode(&opaque), Some(id), "id {} salt {}", id, salt);
            }
        }
    }

    #[test]
    fn test_salted_encoding_is_stable() {
        let codec = codec(8);
        assert_eq!(
            codec.encode_with_salt(42, 5).unwrap(),
            codec.encode_with_salt(42, 5).unwrap()
        );
        assert_ne!(
            codec.encode_with_salt(42, 5).unwrap(),
            codec.encode_with_salt(42, 6).unwrap()
        );
    }

    #[test]
    fn test_unsalted_encoding_differs_but_decodes() {
        let codec = codec(8);

        // Noise collisions are possible but vanishingly rare across a handful of draws.
        let encodings: HashSet<String> = (0..5).map(|_| codec.encode(7).unwrap()).collect();
        assert!(encodings.len() > 1);

        for opaque in &encodings {
            assert_eq!(codec.decode(opaque), Some(7));
        }
    }

    #[test]
    fn test_min_length_is_respected() {
        let codec = codec(12);
        assert!(codec.encode_with_salt(1, 1).unwrap().len() >= 12);
        assert!(codec.encode(1).unwrap().len() >= 12);
    }

    #[test]
    fn test_malformed_input_decodes_to_none() {
        let codec = codec(8);
        assert_eq!(codec.decode("not-a-valid-id"), None);
        assert_eq!(codec.decode(""), None);
        assert_eq!(codec.decode("ümlaut"), None);
    }

    #[test]
    fn test_overflowing_input_decodes_to_none() {
        let codec = codec(0);
        let sqids = Sqids::builder()
            .blocklist(HashSet::new())
            .build()
            .unwrap();
        let huge = sqids.encode(&[u64::MAX]).unwrap();

        // Valid Sqids, but it does not fit the signed key space.
        assert_eq!(codec.decode(&huge), None);
    }

    #[test]
    fn test_negative_id_is_rejected() {
        assert!(matches!(
            codec(0).encode(-1).unwrap_err(),
            IdentifierError::NegativeId
        ));
        assert!(matches!(
            codec(0).encode_with_salt(-5, 1).unwrap_err(),
            IdentifierError::NegativeId
        ));
    }

    #[test]
    fn test_invalid_configuration() {
        let empty = Vec::<String>::new();
        for alphabet in ["ab", "abca", "abcé"] {
            assert!(
                matches!(
                    IdentifierCodec::new(alphabet, 0, empty.clone()).unwrap_err(),
                    IdentifierError::Sqids(_)
                ),
                "{}",
                alphabet
            );
        }
        assert!(matches!(
            IdentifierCodec::new(DEFAULT_ALPHABET, 256, empty).unwrap_err(),
            IdentifierError::MinLengthTooLarge
        ));
    }
}
