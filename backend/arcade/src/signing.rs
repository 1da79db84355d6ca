//! HMAC-SHA256 play-token signatures, shared by the issuer and the validator.
//!
//! The signed payload is `slug|seed|issued_at`. Score and run length are
//! supplied by the client later and are deliberately not covered.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Process-wide signing key, built once from [`crate::config::Config`].
#[derive(Clone)]
pub struct PlaySigner {
    key: Vec<u8>,
}

impl std::fmt::Debug for PlaySigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaySigner").finish_non_exhaustive()
    }
}

impl PlaySigner {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            key: secret.as_ref().to_vec(),
        }
    }

    fn mac(&self, slug: &str, seed: &str, issued_at: &str) -> HmacSha256 {
        // HMAC accepts keys of any length.
        let mut mac = HmacSha256::new_from_slice(&self.key).expect("any key size");
        mac.update(payload(slug, seed, issued_at).as_bytes());
        mac
    }

    /// Hex-encoded signature over the token triple.
    pub fn sign(&self, slug: &str, seed: &str, issued_at: &str) -> String {
        hex::encode(self.mac(slug, seed, issued_at).finalize().into_bytes())
    }

    /// Constant-time check of a client-supplied hex signature.
    /// Anything but the lowercase hex form [`Self::sign`] emits is a mismatch.
    pub fn verify(&self, slug: &str, seed: &str, issued_at: &str, play_sig: &str) -> bool {
        if play_sig.bytes().any(|b| b.is_ascii_uppercase()) {
            return false;
        }
        let Ok(claimed) = hex::decode(play_sig) else {
            return false;
        };
        let mac = self.mac(slug, seed, issued_at);
        mac.verify_slice(&claimed).is_ok()
    }
}

fn payload(slug: &str, seed: &str, issued_at: &str) -> String {
    format!("{slug}|{seed}|{issued_at}")
}
