//! PKCE verifier/challenge/state generation.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;
use sha2::{Digest, Sha256};

pub const CODE_CHALLENGE_METHOD: &str = "S256";

/// One flow's PKCE parameters. Immutable once generated and never persisted
/// beyond the flow that created them.
#[derive(Debug, Clone)]
pub struct PkceParams {
    pub code_verifier: String,
    pub code_challenge: String,
    pub state: String,
}

impl PkceParams {
    /// Generate a fresh verifier/challenge/state triple.
    pub fn generate() -> Self {
        let code_verifier = generate_code_verifier();
        let code_challenge = generate_code_challenge(&code_verifier);
        let state = generate_state();

        Self {
            code_verifier,
            code_challenge,
            state,
        }
    }
}

/// 32 CSPRNG bytes, base64url-encoded without padding (43 characters).
pub fn generate_code_verifier() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// base64url(SHA-256(verifier)), the S256 challenge the provider checks the
/// verifier against during code exchange.
pub fn generate_code_challenge(code_verifier: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(code_verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}

/// 16 CSPRNG bytes for CSRF binding, base64url-encoded without padding.
pub fn generate_state() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_url_safe(s: &str) -> bool {
        s.chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    }

    #[test]
    fn challenge_is_sha256_of_verifier() {
        let params = PkceParams::generate();

        let mut hasher = Sha256::new();
        hasher.update(params.code_verifier.as_bytes());
        let expected = URL_SAFE_NO_PAD.encode(hasher.finalize());

        assert_eq!(params.code_challenge, expected);
        assert_eq!(params.code_challenge, generate_code_challenge(&params.code_verifier));
    }

    #[test]
    fn challenge_is_deterministic_for_a_given_verifier() {
        assert_eq!(
            generate_code_challenge("fixed-verifier"),
            generate_code_challenge("fixed-verifier"),
        );
    }

    #[test]
    fn verifier_meets_pkce_length_and_charset() {
        let verifier = generate_code_verifier();
        // 32 bytes base64url without padding.
        assert_eq!(verifier.len(), 43);
        assert!(verifier.len() >= 43 && verifier.len() <= 128);
        assert!(is_url_safe(&verifier));
    }

    #[test]
    fn state_is_16_bytes_url_safe() {
        let state = generate_state();
        // 16 bytes base64url without padding.
        assert_eq!(state.len(), 22);
        assert!(is_url_safe(&state));
    }

    #[test]
    fn generated_values_are_unique_across_calls() {
        let a = PkceParams::generate();
        let b = PkceParams::generate();

        assert_ne!(a.code_verifier, b.code_verifier);
        assert_ne!(a.code_challenge, b.code_challenge);
        assert_ne!(a.state, b.state);
    }
}
