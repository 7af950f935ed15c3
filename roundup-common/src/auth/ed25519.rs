use ed25519_dalek::{Signer as DalekSigner, SigningKey};

use super::Signer;

/// An ed25519 key pair held in-process, read-only after construction.
/// Process-wide and shared across workers, per §5 "Shared resources".
pub struct Ed25519Signer {
    signing_key: SigningKey,
}

impl Ed25519Signer {
    pub fn from_bytes(bytes: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(bytes),
        }
    }

    /// Loads a signing key from a hex-encoded 32-byte seed, the format
    /// `SERVER_PRIVATE_KEY` is expected to carry.
    pub fn from_hex(hex_seed: &str) -> Result<Self, String> {
        let bytes = hex::decode(hex_seed).map_err(|e| format!("invalid hex key: {e}"))?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| "private key must be 32 bytes".to_string())?;
        Ok(Self::from_bytes(&bytes))
    }

    /// Generates a fresh random key pair. Used by test fixtures across
    /// the workspace; `cfg(test)` doesn't help here since those fixtures
    /// live in other crates, so this stays a plain public constructor.
    pub fn generate() -> Self {
        use rand::rngs::OsRng;
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }
}

impl Signer for Ed25519Signer {
    fn sign(&self, message: &[u8]) -> Vec<u8> {
        self.signing_key.sign(message).to_bytes().to_vec()
    }

    fn public_key_hex(&self) -> String {
        hex::encode(self.signing_key.verifying_key().to_bytes())
    }
}
