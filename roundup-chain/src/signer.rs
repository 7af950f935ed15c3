use roundup_common::auth::Signer;
use roundup_common::canonical::canonical_hash;
use roundup_common::domain::{ChainEnvelope, ChainHash, ChainSignature, SignatureHeader};
use roundup_common::{Result, RoundupError};

/// Computes the canonical hash over `envelope.payload` and appends a
/// detached ed25519 signature to `envelope.signatures`, under `kid`.
///
/// The hash is recomputed here rather than trusted from the caller, so
/// a signed envelope's `hash.value` is always consistent with its payload.
pub fn sign(envelope: &mut ChainEnvelope, signer: &dyn Signer, kid: &str) -> Result<()> {
    let hash_value = canonical_hash(&envelope.payload)?;
    let signature_bytes = signer.sign(hash_value.as_bytes());
    if signature_bytes.is_empty() {
        return Err(RoundupError::InvalidSignature(
            "signer returned no signature bytes".to_string(),
        ));
    }

    envelope.hash = ChainHash::sha256(hash_value);
    envelope.signatures.push(ChainSignature {
        header: SignatureHeader {
            alg: "ed25519".to_string(),
            kid: kid.to_string(),
        },
        signature: hex::encode(signature_bytes),
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use roundup_common::auth::Ed25519Signer;
    use roundup_common::domain::{ChainEntry, EnvelopePayload};
    use rust_decimal_macros::dec;

    fn envelope() -> ChainEnvelope {
        let previous = ChainEntry::genesis("addr-1".to_string(), "USD".to_string(), dec!(-10));
        ChainEnvelope {
            hash: roundup_common::domain::ChainHash::sha256(String::new()),
            payload: EnvelopePayload {
                address: "addr-1".to_string(),
                previous,
                transactions: Vec::new(),
            },
            signatures: Vec::new(),
        }
    }

    #[test]
    fn sign_appends_a_server_signature_and_sets_the_hash() {
        let signer = Ed25519Signer::generate();
        let mut env = envelope();

        sign(&mut env, &signer, "server").unwrap();

        assert_eq!(env.signatures.len(), 1);
        assert_eq!(env.signatures[0].header.kid, "server");
        assert_eq!(env.hash.value, canonical_hash(&env.payload).unwrap());
    }
}
