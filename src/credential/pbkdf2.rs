//! PBKDF2-HMAC-SHA256 credential scheme.

use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use tracing::warn;

use super::CredentialVerifier;
use crate::store::CredentialHash;

type HmacSha256 = Hmac<Sha256>;

const SCHEME_NAME: &str = "PBKDF2_SHA256";
const SALT_LEN: usize = 16;
const HASH_LEN: usize = 32;

/// Iterated HMAC-SHA256 key derivation (RFC 2898), one derived block.
pub struct Pbkdf2Sha256Verifier {
    /// Iteration count applied to newly provisioned credentials.
    default_iterations: u32,
}

impl Pbkdf2Sha256Verifier {
    pub fn new(default_iterations: u32) -> Self {
        assert!(default_iterations > 0, "iteration count must be positive");
        Self { default_iterations }
    }
}

impl Default for Pbkdf2Sha256Verifier {
    fn default() -> Self {
        Self::new(10_000)
    }
}

impl CredentialVerifier for Pbkdf2Sha256Verifier {
    fn scheme(&self) -> &str {
        SCHEME_NAME
    }

    fn verify(&self, stored: &CredentialHash, submitted: &str) -> bool {
        if stored.scheme != SCHEME_NAME {
            warn!(scheme = %stored.scheme, "Credential carries an unsupported scheme");
            return false;
        }
        if stored.iterations == 0 || stored.hash.len() != HASH_LEN {
            warn!("Credential hash is malformed");
            return false;
        }

        let derived = derive(submitted.as_bytes(), &stored.salt, stored.iterations);
        constant_time_eq(&derived, &stored.hash)
    }

    fn hash_credential(&self, password: &str) -> CredentialHash {
        let mut salt = vec![0u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut salt);

        let hash = derive(password.as_bytes(), &salt, self.default_iterations);
        CredentialHash {
            scheme: SCHEME_NAME.to_string(),
            iterations: self.default_iterations,
            salt,
            hash: hash.to_vec(),
        }
    }
}

/// PBKDF2 F(P, S, c, 1): U1 = HMAC(P, S || INT(1)), Ui = HMAC(P, Ui-1),
/// result is the XOR of all Ui. One block suffices for a 32-byte output.
fn derive(password: &[u8], salt: &[u8], iterations: u32) -> [u8; HASH_LEN] {
    let mut mac = HmacSha256::new_from_slice(password).expect("HMAC accepts any key length");
    mac.update(salt);
    mac.update(&1u32.to_be_bytes());
    let mut u = mac.finalize().into_bytes();

    let mut output = [0u8; HASH_LEN];
    output.copy_from_slice(&u);

    for _ in 1..iterations {
        let mut mac = HmacSha256::new_from_slice(password).expect("HMAC accepts any key length");
        mac.update(&u);
        u = mac.finalize().into_bytes();
        for (out_byte, u_byte) in output.iter_mut().zip(u.iter()) {
            *out_byte ^= u_byte;
        }
    }

    output
}

/// Comparison without an early exit on the first differing byte.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
