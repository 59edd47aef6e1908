use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::crypto::{self, CryptoError, KeyPair, VerifyFailure};

/// Version tag of the canonical transaction encoding.
pub(crate) const CANONICAL_VERSION: u8 = 1;

/// Errors that can occur while building or signing a transaction
#[derive(Debug, Error)]
pub enum TransactionError {
    #[error("Transaction already signed")]
    AlreadySigned,

    #[error("Signing key does not correspond to the sender public key")]
    KeyMismatch,

    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),
}

/// Why a transaction failed validation.
///
/// Internal only; [`Transaction::is_valid`] collapses every variant to
/// `false` at the public boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub(crate) enum InvalidTransaction {
    #[error("amount must be positive")]
    NonPositiveAmount,
    #[error("transaction is not signed")]
    NotSigned,
    #[error("sender public key is malformed")]
    MalformedPublicKey,
    #[error("signature is malformed")]
    MalformedSignature,
    #[error("signature does not match")]
    SignatureMismatch,
}

/// Appends `bytes` to `buf` with a u32 little-endian length prefix.
///
/// Every variable-length field in a canonical encoding goes through this, so
/// no pair of adjacent fields can be re-split into a second valid message.
pub(crate) fn put_length_prefixed(buf: &mut Vec<u8>, bytes: &[u8]) {
    buf.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
    buf.extend_from_slice(bytes);
}

/// A transfer instruction: `amount` units from the holder of
/// `sender_public_key` to `recipient_address`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Sender's public key; doubles as the sending account identifier
    pub sender_public_key: Vec<u8>,

    /// Recipient's account identifier
    pub recipient_address: Vec<u8>,

    /// Amount being transferred; must be positive to validate
    pub amount: u64,

    /// Signature over the canonical message, set by [`Transaction::sign`]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<Vec<u8>>,
}

impl Transaction {
    /// Creates a new unsigned transaction.
    pub fn new(
        sender_public_key: impl Into<Vec<u8>>,
        recipient_address: impl Into<Vec<u8>>,
        amount: u64,
    ) -> Self {
        Transaction {
            sender_public_key: sender_public_key.into(),
            recipient_address: recipient_address.into(),
            amount,
            signature: None,
        }
    }

    /// The canonical signing message: a versioned, length-prefixed encoding
    /// of `(sender_public_key, recipient_address, amount)`.
    pub fn canonical_message(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(
            1 + 4 + self.sender_public_key.len() + 4 + self.recipient_address.len() + 8,
        );
        buf.push(CANONICAL_VERSION);
        put_length_prefixed(&mut buf, &self.sender_public_key);
        put_length_prefixed(&mut buf, &self.recipient_address);
        buf.extend_from_slice(&self.amount.to_le_bytes());
        buf
    }

    /// The full canonical encoding including the signature, used in block
    /// hash preimages so post-mining signature swaps are detectable.
    pub(crate) fn canonical_bytes(&self) -> Vec<u8> {
        let mut buf = self.canonical_message();
        match &self.signature {
            Some(signature) => {
                buf.push(1);
                put_length_prefixed(&mut buf, signature);
            }
            None => buf.push(0),
        }
        buf
    }

    /// Signs the transaction with the given raw private key.
    ///
    /// Fails with [`TransactionError::KeyMismatch`] if the key does not
    /// correspond to `sender_public_key`, and with
    /// [`TransactionError::AlreadySigned`] on a second signing attempt.
    pub fn sign(&mut self, private_key: &[u8]) -> Result<(), TransactionError> {
        if self.signature.is_some() {
            return Err(TransactionError::AlreadySigned);
        }

        let keypair = KeyPair::from_private_key(private_key)?;
        if keypair.public_key().as_slice() != self.sender_public_key.as_slice() {
            return Err(TransactionError::KeyMismatch);
        }

        let signature = crypto::sign(private_key, &self.canonical_message())?;
        self.signature = Some(signature);
        Ok(())
    }

    /// Validation with the rejection reason preserved, for internal logging.
    pub(crate) fn validate(&self) -> Result<(), InvalidTransaction> {
        if self.amount == 0 {
            return Err(InvalidTransaction::NonPositiveAmount);
        }
        let signature = self
            .signature
            .as_deref()
            .ok_or(InvalidTransaction::NotSigned)?;

        crypto::verify_strict(&self.sender_public_key, &self.canonical_message(), signature)
            .map_err(|failure| match failure {
                VerifyFailure::MalformedPublicKey => InvalidTransaction::MalformedPublicKey,
                VerifyFailure::MalformedSignature => InvalidTransaction::MalformedSignature,
                VerifyFailure::Mismatch => InvalidTransaction::SignatureMismatch,
            })
    }

    /// Whether the transaction is valid: positive amount, signed, and the
    /// signature verifies against `sender_public_key`. Malformed key or
    /// signature material yields `false`, never an error.
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}
