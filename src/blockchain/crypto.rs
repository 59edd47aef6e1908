use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use thiserror::Error;

/// Length in bytes of an ed25519 private key.
pub const PRIVATE_KEY_LEN: usize = 32;
/// Length in bytes of an ed25519 public key.
pub const PUBLIC_KEY_LEN: usize = 32;
/// Length in bytes of an ed25519 signature.
pub const SIGNATURE_LEN: usize = 64;

/// Errors that can occur during cryptographic operations
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),
}

/// Why a verification attempt did not succeed.
///
/// Crate-internal only: the public [`verify`] collapses every variant to
/// `false`, so outside callers cannot distinguish malformed material from a
/// signature that simply does not match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum VerifyFailure {
    MalformedPublicKey,
    MalformedSignature,
    Mismatch,
}

/// An ed25519 keypair. The public key doubles as the account identifier.
#[derive(Debug, Clone)]
pub struct KeyPair {
    signing_key: SigningKey,
}

impl KeyPair {
    /// Generates a fresh keypair from the OS randomness source.
    pub fn generate() -> Self {
        let mut csprng = OsRng;
        KeyPair {
            signing_key: SigningKey::generate(&mut csprng),
        }
    }

    /// Reconstructs a keypair from raw private key bytes.
    pub fn from_private_key(bytes: &[u8]) -> Result<Self, CryptoError> {
        let bytes: [u8; PRIVATE_KEY_LEN] = bytes.try_into().map_err(|_| {
            CryptoError::InvalidPrivateKey(format!(
                "expected {} bytes, got {}",
                PRIVATE_KEY_LEN,
                bytes.len()
            ))
        })?;
        Ok(KeyPair {
            signing_key: SigningKey::from_bytes(&bytes),
        })
    }

    /// Raw private key bytes. Callers own the key lifecycle.
    pub fn private_key(&self) -> [u8; PRIVATE_KEY_LEN] {
        self.signing_key.to_bytes()
    }

    /// Raw public key bytes.
    pub fn public_key(&self) -> [u8; PUBLIC_KEY_LEN] {
        self.signing_key.verifying_key().to_bytes()
    }
}

/// Generates a fresh keypair and returns its `(private_key, public_key)` bytes.
pub fn generate_key_pair() -> ([u8; PRIVATE_KEY_LEN], [u8; PUBLIC_KEY_LEN]) {
    let keypair = KeyPair::generate();
    (keypair.private_key(), keypair.public_key())
}

/// Signs `message` with the given raw private key.
pub fn sign(private_key: &[u8], message: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let keypair = KeyPair::from_private_key(private_key)?;
    let signature = keypair.signing_key.sign(message);
    Ok(signature.to_bytes().to_vec())
}

/// Verification with the failure reason preserved. Internal code routes
/// through this so rejection reasons can still be logged.
pub(crate) fn verify_strict(
    public_key: &[u8],
    message: &[u8],
    signature: &[u8],
) -> Result<(), VerifyFailure> {
    let key_bytes: [u8; PUBLIC_KEY_LEN] = public_key
        .try_into()
        .map_err(|_| VerifyFailure::MalformedPublicKey)?;
    let key =
        VerifyingKey::from_bytes(&key_bytes).map_err(|_| VerifyFailure::MalformedPublicKey)?;

    let sig_bytes: [u8; SIGNATURE_LEN] = signature
        .try_into()
        .map_err(|_| VerifyFailure::MalformedSignature)?;
    let sig = Signature::from_bytes(&sig_bytes);

    key.verify(message, &sig)
        .map_err(|_| VerifyFailure::Mismatch)
}

/// Verifies `signature` over `message` against the given raw public key.
///
/// Returns `false` for malformed keys, malformed signatures, and signature
/// mismatch alike; the caller is told nothing about which it was.
pub fn verify(public_key: &[u8], message: &[u8], signature: &[u8]) -> bool {
    verify_strict(public_key, message, signature).is_ok()
}
