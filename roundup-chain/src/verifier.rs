use roundup_common::auth::verify_with_key_hex;
use roundup_common::canonical::canonical_hash;
use roundup_common::domain::ChainEnvelope;

/// Verifies a single signature over a canonical hash.
///
/// Recomputes the canonical hash over `envelope.payload`; a mismatch
/// against `envelope.hash.value` fails closed. Otherwise verifies the
/// *last* signature in `envelope.signatures` against `public_key_hex`.
/// Never panics — any malformed input simply fails verification.
pub fn verify(envelope: &ChainEnvelope, public_key_hex: &str) -> bool {
    let Ok(recomputed) = canonical_hash(&envelope.payload) else {
        return false;
    };
    if recomputed != envelope.hash.value {
        return false;
    }

    let Some(last_signature) = envelope.signatures.last() else {
        return false;
    };

    verify_with_key_hex(recomputed.as_bytes(), &last_signature.signature, public_key_hex)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signer;
    use roundup_common::auth::Ed25519Signer;
    use roundup_common::domain::{ChainEntry, ChainHash, EnvelopePayload};
    use rust_decimal_macros::dec;

    fn envelope() -> ChainEnvelope {
        let previous = ChainEntry::genesis("addr-1".to_string(), "USD".to_string(), dec!(-10));
        ChainEnvelope {
            hash: ChainHash::sha256(String::new()),
            payload: EnvelopePayload {
                address: "addr-1".to_string(),
                previous,
                transactions: Vec::new(),
            },
            signatures: Vec::new(),
        }
    }

    #[test]
    fn s4_round_trip_sign_then_verify_succeeds() {
        let signer_key = Ed25519Signer::generate();
        let mut env = envelope();
        signer::sign(&mut env, &signer_key, "server").unwrap();

        assert!(verify(&env, &signer_key.public_key_hex()));
    }

    #[test]
    fn verify_fails_against_a_different_key() {
        let signer_key = Ed25519Signer::generate();
        let other_key = Ed25519Signer::generate();
        let mut env = envelope();
        signer::sign(&mut env, &signer_key, "server").unwrap();

        assert!(!verify(&env, &other_key.public_key_hex()));
    }

    #[test]
    fn verify_fails_when_payload_was_tampered_with() {
        let signer_key = Ed25519Signer::generate();
        let mut env = envelope();
        signer::sign(&mut env, &signer_key, "server").unwrap();

        env.payload.address = "tampered".to_string();
        assert!(!verify(&env, &signer_key.public_key_hex()));
    }

    #[test]
    fn verify_fails_with_no_signatures() {
        let signer_key = Ed25519Signer::generate();
        let mut env = envelope();
        env.hash = ChainHash::sha256(canonical_hash(&env.payload).unwrap());
        assert!(!verify(&env, &signer_key.public_key_hex()));
    }
}
