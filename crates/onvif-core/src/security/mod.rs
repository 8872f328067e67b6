//! Message-level security: WS-Security `UsernameToken` generation.
//!
//! - **`token`** – builds the single-use password-digest token and renders its
//!   header block.
//! - **`entropy`** – the randomness and clock capabilities the token (and the
//!   discovery probe) draw from.

pub mod entropy;
pub mod token;

pub use entropy::{Clock, Entropy, OsEntropy, SystemClock};
pub use token::{password_digest, SecurityToken, TokenGenerationError, NONCE_LEN};
