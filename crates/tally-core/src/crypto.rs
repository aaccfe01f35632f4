// crates/tally-core/src/crypto.rs
//
// ed25519 helpers backing the identity collaborator. The ledger engine only
// ever sees the boolean outcome of `SignatureVerifier::verify`.

use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;

use crate::error::TallyError;
use crate::traits::SignatureVerifier;

/// An ed25519 keypair for signing and verification.
pub struct Keypair {
    pub signing_key: SigningKey,
    pub verifying_key: VerifyingKey,
}

impl Keypair {
    /// Generate a new random ed25519 keypair.
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        let verifying_key = signing_key.verifying_key();
        Keypair {
            signing_key,
            verifying_key,
        }
    }

    /// Get the public key bytes (32 bytes).
    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.verifying_key.to_bytes()
    }

    /// Sign a message and return the signature bytes.
    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        let signature = self.signing_key.sign(message);
        signature.to_bytes().to_vec()
    }
}

/// Verify an ed25519 signature.
///
/// Malformed key or signature bytes are errors; a well-formed signature that
/// does not match is `Ok(false)`.
pub fn verify_signature(
    public_key_bytes: &[u8],
    message: &[u8],
    signature_bytes: &[u8],
) -> Result<bool, TallyError> {
    let key_array: [u8; 32] = public_key_bytes
        .try_into()
        .map_err(|_| TallyError::Crypto("Public key must be exactly 32 bytes".to_string()))?;
    let verifying_key = VerifyingKey::from_bytes(&key_array)?;

    let signature_array: [u8; 64] = signature_bytes
        .try_into()
        .map_err(|_| TallyError::Crypto("Signature must be exactly 64 bytes".to_string()))?;

    let signature = ed25519_dalek::Signature::from_bytes(&signature_array);

    match verifying_key.verify(message, &signature) {
        Ok(()) => Ok(true),
        Err(_) => Ok(false),
    }
}

/// `SignatureVerifier` backed by ed25519-dalek. Malformed input is treated as
/// an unauthentic submitter.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519Verifier;

impl SignatureVerifier for Ed25519Verifier {
    fn verify(&self, message: &[u8], signature: &[u8], public_key: &[u8]) -> bool {
        verify_signature(public_key, message, signature).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keypair_sign_verify() {
        let keypair = Keypair::generate();
        let message = b"register peer-1";

        let signature = keypair.sign(message);
        let pubkey = keypair.public_key_bytes();

        assert!(verify_signature(&pubkey, message, &signature).unwrap());
        assert!(!verify_signature(&pubkey, b"wrong message", &signature).unwrap());
    }

    #[test]
    fn test_malformed_signature_is_error() {
        let keypair = Keypair::generate();
        let result = verify_signature(&keypair.public_key_bytes(), b"m", &[0u8; 10]);
        assert!(matches!(result, Err(TallyError::Crypto(_))));
    }

    #[test]
    fn test_verifier_collapses_errors_to_false() {
        let keypair = Keypair::generate();
        let verifier = Ed25519Verifier;
        let sig = keypair.sign(b"hello");
        assert!(verifier.verify(b"hello", &sig, &keypair.public_key_bytes()));
        assert!(!verifier.verify(b"hello", &sig, &[1u8; 5]));
        assert!(!verifier.verify(b"hello", &sig[..10], &keypair.public_key_bytes()));
    }
}
