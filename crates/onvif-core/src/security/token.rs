//! WS-Security `UsernameToken` with password digest.
//!
//! The digest proves knowledge of the device secret without sending it:
//!
//! ```text
//! PasswordDigest = Base64( SHA-1( nonce_raw || created || secret ) )
//! ```
//!
//! The raw 16 nonce bytes feed the hash; the nonce travels in the header
//! base64-encoded.  A token is single use: every call to
//! [`SecurityToken::generate`] draws a fresh nonce.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{Duration, SecondsFormat};
use sha1::{Digest, Sha1};
use thiserror::Error;

use super::entropy::{Clock, Entropy};

/// Length of the random nonce in bytes.
pub const NONCE_LEN: usize = 16;

pub const WSSE_NS: &str =
    "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-secext-1.0.xsd";
pub const WSU_NS: &str =
    "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-utility-1.0.xsd";
pub const PASSWORD_DIGEST_TYPE: &str =
    "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-username-token-profile-1.0#PasswordDigest";
pub const BASE64_ENCODING_TYPE: &str =
    "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-soap-message-security-1.0#Base64Binary";

/// Failure to produce a security token.  Fatal for the request being built.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenGenerationError {
    /// The random source could not supply nonce bytes.
    #[error("random source unavailable: {0}")]
    RandomSource(String),

    /// `now + offset` does not fit in the representable date range.
    #[error("token freshness offset {offset_secs}s puts the timestamp out of range")]
    TimestampOutOfRange { offset_secs: i64 },
}

/// A freshly generated, single-use security token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityToken {
    nonce: [u8; NONCE_LEN],
    created: String,
    digest: String,
}

impl SecurityToken {
    /// Generates a token for `secret`, timestamped `clock.now() + offset`.
    ///
    /// # Errors
    ///
    /// Returns [`TokenGenerationError`] if the entropy source fails or the
    /// offset timestamp overflows.
    pub fn generate(
        secret: &str,
        offset: Duration,
        entropy: &dyn Entropy,
        clock: &dyn Clock,
    ) -> Result<Self, TokenGenerationError> {
        let mut nonce = [0u8; NONCE_LEN];
        entropy.fill_nonce(&mut nonce)?;

        let created = clock
            .now()
            .checked_add_signed(offset)
            .ok_or(TokenGenerationError::TimestampOutOfRange {
                offset_secs: offset.num_seconds(),
            })?
            .to_rfc3339_opts(SecondsFormat::Secs, true);

        let digest = password_digest(&nonce, &created, secret);
        Ok(Self {
            nonce,
            created,
            digest,
        })
    }

    /// The raw nonce bytes.
    pub fn nonce(&self) -> &[u8; NONCE_LEN] {
        &self.nonce
    }

    /// The nonce as it appears on the wire.
    pub fn nonce_base64(&self) -> String {
        STANDARD.encode(self.nonce)
    }

    /// RFC 3339 UTC creation timestamp, e.g. `2024-05-01T12:00:00Z`.
    pub fn created(&self) -> &str {
        &self.created
    }

    /// Base64 SHA-1 password digest.
    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// Renders the `Security` header block for `username`.
    ///
    /// `env_prefix` is the namespace prefix bound to the SOAP envelope
    /// namespace, used for the `mustUnderstand` attribute.
    pub fn to_header(&self, username: &str, env_prefix: &str) -> String {
        format!(
            r#"<Security {env_prefix}:mustUnderstand="1" xmlns="{WSSE_NS}">
  <UsernameToken>
    <Username>{username}</Username>
    <Password Type="{PASSWORD_DIGEST_TYPE}">{digest}</Password>
    <Nonce EncodingType="{BASE64_ENCODING_TYPE}">{nonce}</Nonce>
    <Created xmlns="{WSU_NS}">{created}</Created>
  </UsernameToken>
</Security>"#,
            username = quick_xml::escape::escape(username),
            digest = self.digest,
            nonce = self.nonce_base64(),
            created = self.created,
        )
    }
}

/// Computes `base64(sha1(nonce || created || secret))`.
pub fn password_digest(nonce: &[u8], created: &str, secret: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(nonce);
    hasher.update(created.as_bytes());
    hasher.update(secret.as_bytes());
    STANDARD.encode(hasher.finalize())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::entropy::OsEntropy;
    use base64::Engine as _;
    use chrono::{DateTime, TimeZone, Utc};

    struct FixedEntropy([u8; NONCE_LEN]);

    impl Entropy for FixedEntropy {
        fn fill_nonce(&self, buf: &mut [u8]) -> Result<(), TokenGenerationError> {
            buf.copy_from_slice(&self.0);
            Ok(())
        }
        fn message_id(&self) -> String {
            "uuid:fixed".to_string()
        }
    }

    struct BrokenEntropy;

    impl Entropy for BrokenEntropy {
        fn fill_nonce(&self, _buf: &mut [u8]) -> Result<(), TokenGenerationError> {
            Err(TokenGenerationError::RandomSource("entropy pool closed".into()))
        }
        fn message_id(&self) -> String {
            unreachable!()
        }
    }

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    fn noon() -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap())
    }

    #[test]
    fn test_password_digest_matches_ws_security_reference_vector() {
        // Worked example from the ONVIF Application Programmer's Guide.
        let nonce = STANDARD.decode("LKqI6G/AikKCQrN0zqZFlg==").unwrap();
        let digest = password_digest(&nonce, "2010-09-16T07:50:45Z", "userpassword");
        assert_eq!(digest, "tuOSpGlFlIXsozq4HFNeeGeFLEI=");
    }

    #[test]
    fn test_password_digest_is_deterministic() {
        let a = password_digest(&[7u8; 16], "2024-05-01T12:00:00Z", "secret");
        let b = password_digest(&[7u8; 16], "2024-05-01T12:00:00Z", "secret");
        assert_eq!(a, b);
    }

    #[test]
    fn test_password_digest_changes_with_each_input() {
        // Arrange
        let base = password_digest(&[7u8; 16], "2024-05-01T12:00:00Z", "secret");

        // Act
        let other_nonce = password_digest(&[8u8; 16], "2024-05-01T12:00:00Z", "secret");
        let other_time = password_digest(&[7u8; 16], "2024-05-01T12:00:01Z", "secret");
        let other_secret = password_digest(&[7u8; 16], "2024-05-01T12:00:00Z", "secreT");

        // Assert
        assert_ne!(base, other_nonce);
        assert_ne!(base, other_time);
        assert_ne!(base, other_secret);
    }

    #[test]
    fn test_generate_uses_raw_nonce_and_offset_timestamp() {
        // Arrange
        let entropy = FixedEntropy([0xAB; NONCE_LEN]);

        // Act
        let token =
            SecurityToken::generate("pass", Duration::seconds(30), &entropy, &noon()).unwrap();

        // Assert
        assert_eq!(token.created(), "2024-05-01T12:00:30Z");
        assert_eq!(token.nonce(), &[0xAB; NONCE_LEN]);
        assert_eq!(token.nonce_base64(), STANDARD.encode([0xAB; NONCE_LEN]));
        assert_eq!(
            token.digest(),
            password_digest(&[0xAB; NONCE_LEN], "2024-05-01T12:00:30Z", "pass")
        );
    }

    #[test]
    fn test_generate_accepts_negative_offset() {
        let entropy = FixedEntropy([1; NONCE_LEN]);
        let token =
            SecurityToken::generate("pass", Duration::minutes(-2), &entropy, &noon()).unwrap();
        assert_eq!(token.created(), "2024-05-01T11:58:00Z");
    }

    #[test]
    fn test_generate_fails_when_random_source_fails() {
        let result = SecurityToken::generate("pass", Duration::zero(), &BrokenEntropy, &noon());
        assert!(matches!(result, Err(TokenGenerationError::RandomSource(_))));
    }

    #[test]
    fn test_consecutive_tokens_have_distinct_nonces() {
        let a = SecurityToken::generate("p", Duration::zero(), &OsEntropy, &noon()).unwrap();
        let b = SecurityToken::generate("p", Duration::zero(), &OsEntropy, &noon()).unwrap();
        assert_ne!(a.nonce(), b.nonce());
        assert_ne!(a.digest(), b.digest());
    }

    #[test]
    fn test_header_contains_all_token_fields() {
        // Arrange
        let token = SecurityToken::generate(
            "hunter2-secret",
            Duration::zero(),
            &FixedEntropy([2; NONCE_LEN]),
            &noon(),
        )
        .unwrap();

        // Act
        let header = token.to_header("admin", "s");

        // Assert
        assert!(header.starts_with(r#"<Security s:mustUnderstand="1""#));
        assert!(header.contains("<Username>admin</Username>"));
        assert!(header.contains(&format!("{}</Password>", token.digest())));
        assert!(header.contains(&format!("{}</Nonce>", token.nonce_base64())));
        assert!(header.contains("2024-05-01T12:00:00Z</Created>"));
        assert!(!header.contains("hunter2"), "secret must never appear in plaintext");
    }

    #[test]
    fn test_header_escapes_username() {
        let token =
            SecurityToken::generate("p", Duration::zero(), &FixedEntropy([3; 16]), &noon())
                .unwrap();
        let header = token.to_header("a<b&c", "s");
        assert!(header.contains("<Username>a&lt;b&amp;c</Username>"));
    }
}
