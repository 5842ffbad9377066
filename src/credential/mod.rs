//! Credential verification.

mod pbkdf2;

pub use pbkdf2::Pbkdf2Sha256Verifier;

use crate::store::CredentialHash;

/// Pluggable credential hashing scheme.
///
/// The scheme name and iteration count are stored with each account, so a
/// verifier must only accept hashes carrying its own scheme name and must
/// honor the stored iteration count rather than its provisioning default.
pub trait CredentialVerifier: Send + Sync {
    /// Scheme name written into newly provisioned credentials.
    fn scheme(&self) -> &str;

    /// Whether `submitted` derives to the stored hash.
    fn verify(&self, stored: &CredentialHash, submitted: &str) -> bool;

    /// Derive a storable credential for a new password.
    fn hash_credential(&self, password: &str) -> CredentialHash;
}
