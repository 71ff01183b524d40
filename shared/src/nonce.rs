//! Single-use nonce for federated sign-in.
//!
//! One nonce binds one sign-in attempt: the provider's authorization request
//! carries the SHA-256 digest, the identity assertion is exchanged together
//! with the raw value, and the raw value is consumed in the process so it can
//! never be replayed across attempts.

use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};
use thiserror::Error;

pub const NONCE_LEN: usize = 32;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NonceError {
    #[error("secure randomness unavailable")]
    RandomUnavailable,
}

pub trait RandomProvider {
    fn fill(&self, out: &mut [u8]) -> Result<(), NonceError>;
}

pub struct OsRng;

impl RandomProvider for OsRng {
    fn fill(&self, out: &mut [u8]) -> Result<(), NonceError> {
        getrandom::getrandom(out).map_err(|_| NonceError::RandomUnavailable)
    }
}

pub struct Nonce {
    raw: SecretString,
}

impl Nonce {
    pub fn generate(rng: &dyn RandomProvider) -> Result<Self, NonceError> {
        let mut bytes = [0u8; NONCE_LEN];
        rng.fill(&mut bytes)?;
        Ok(Self {
            raw: SecretString::new(hex::encode(bytes)),
        })
    }

    /// Digest sent with the authorization request, hex-encoded.
    #[must_use]
    pub fn sha256_hex(&self) -> String {
        hex::encode(Sha256::digest(self.raw.expose_secret().as_bytes()))
    }

    /// Consumes the nonce, yielding the raw value for the credential
    /// exchange. Taking `self` by value is what makes reuse impossible.
    #[must_use]
    pub fn into_raw(self) -> String {
        self.raw.expose_secret().clone()
    }
}

impl fmt::Debug for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Nonce([REDACTED])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedRng(u8);

    impl RandomProvider for FixedRng {
        fn fill(&self, out: &mut [u8]) -> Result<(), NonceError> {
            out.fill(self.0);
            Ok(())
        }
    }

    struct FailingRng;

    impl RandomProvider for FailingRng {
        fn fill(&self, _out: &mut [u8]) -> Result<(), NonceError> {
            Err(NonceError::RandomUnavailable)
        }
    }

    #[test]
    fn raw_value_is_hex_of_the_random_bytes() {
        let nonce = Nonce::generate(&FixedRng(0xab)).unwrap();
        assert_eq!(nonce.into_raw(), "ab".repeat(NONCE_LEN));
    }

    #[test]
    fn digest_is_sha256_of_the_raw_value() {
        let nonce = Nonce {
            raw: SecretString::new("abc".into()),
        };
        assert_eq!(
            nonce.sha256_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn os_rng_nonces_are_distinct() {
        let a = Nonce::generate(&OsRng).unwrap().into_raw();
        let b = Nonce::generate(&OsRng).unwrap().into_raw();
        assert_ne!(a, b);
        assert_eq!(a.len(), NONCE_LEN * 2);
    }

    #[test]
    fn generation_surfaces_rng_failure() {
        assert_eq!(
            Nonce::generate(&FailingRng).err(),
            Some(NonceError::RandomUnavailable)
        );
    }

    #[test]
    fn debug_output_is_redacted() {
        let nonce = Nonce::generate(&FixedRng(1)).unwrap();
        assert_eq!(format!("{nonce:?}"), "Nonce([REDACTED])");
    }
}
