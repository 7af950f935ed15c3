mod ed25519;

pub use ed25519::Ed25519Signer;

/// Capability to produce and check detached ed25519 signatures.
///
/// Mirrors the shape of a long-term key holder: `sign` always uses this
/// holder's own key; `verify_with_key` checks an arbitrary detached
/// signature against a named external public key (used by the
/// consumer to check the address-specific signer's half of an envelope).
pub trait Signer: Send + Sync {
    /// Signs `message` with this signer's private key. Returns the
    /// detached signature bytes.
    fn sign(&self, message: &[u8]) -> Vec<u8>;

    /// This signer's public key, hex-encoded.
    fn public_key_hex(&self) -> String;
}

/// Verifies a detached ed25519 `signature` over `message` against a
/// hex-encoded public key. Never panics; returns `false` on any
/// malformed input rather than propagating an error, per C5.
pub fn verify_with_key_hex(message: &[u8], signature_hex: &str, public_key_hex: &str) -> bool {
    use ed25519_dalek::{Signature, Verifier, VerifyingKey};

    let Ok(pk_bytes) = hex::decode(public_key_hex) else {
        return false;
    };
    let Ok(pk_bytes): Result<[u8; 32], _> = pk_bytes.try_into() else {
        return false;
    };
    let Ok(verifying_key) = VerifyingKey::from_bytes(&pk_bytes) else {
        return false;
    };

    let Ok(sig_bytes) = hex::decode(signature_hex) else {
        return false;
    };
    let Ok(signature) = Signature::from_slice(&sig_bytes) else {
        return false;
    };

    verifying_key.verify(message, &signature).is_ok()
}
