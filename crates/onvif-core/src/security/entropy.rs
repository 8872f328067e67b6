//! Randomness and wall-clock capabilities.
//!
//! Every source of per-call variation in the two protocol engines (token
//! nonces, `Created` timestamps, WS-Discovery message IDs) goes through one of
//! the traits in this module.  Production code uses [`OsEntropy`] and
//! [`SystemClock`]; tests inject fixed values so digests and probe payloads
//! can be asserted byte-for-byte.

use chrono::{DateTime, Utc};
use rand::{rngs::OsRng, RngCore};
use uuid::Uuid;

use super::token::TokenGenerationError;

/// Source of nonces and message identifiers.
pub trait Entropy: Send + Sync {
    /// Fills `buf` with fresh random bytes.
    ///
    /// # Errors
    ///
    /// Returns [`TokenGenerationError`] when the underlying random source is
    /// unavailable.  Callers must not fall back to an empty nonce.
    fn fill_nonce(&self, buf: &mut [u8]) -> Result<(), TokenGenerationError>;

    /// Returns a new WS-Addressing message ID, unique for the process lifetime.
    fn message_id(&self) -> String;
}

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// [`Entropy`] backed by the operating system CSPRNG and UUID v4.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsEntropy;

impl Entropy for OsEntropy {
    fn fill_nonce(&self, buf: &mut [u8]) -> Result<(), TokenGenerationError> {
        OsRng
            .try_fill_bytes(buf)
            .map_err(|e| TokenGenerationError::RandomSource(e.to_string()))
    }

    fn message_id(&self) -> String {
        format!("uuid:{}", Uuid::new_v4())
    }
}

/// [`Clock`] that reads the system time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
