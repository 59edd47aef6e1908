use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::transaction::{put_length_prefixed, Transaction, CANONICAL_VERSION};

/// Sentinel `previous_hash` of the genesis block.
pub const GENESIS_PREVIOUS_HASH: &str = "0";

/// Represents a block in the chain: an ordered batch of transactions plus
/// the linkage metadata that chains it to its predecessor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    /// Index of the block in the chain
    pub index: u64,

    /// Transactions included in this block
    pub transactions: Vec<Transaction>,

    /// Unix timestamp in milliseconds when the block was created
    pub timestamp: i64,

    /// Hash of the previous block
    pub previous_hash: String,

    /// Proof-of-work nonce
    pub nonce: u64,

    /// Hash of this block, set once mining succeeds
    #[serde(skip_serializing_if = "String::is_empty")]
    pub hash: String,
}

impl Block {
    /// Creates the genesis block. Its hash is computed immediately; genesis
    /// predates consensus and is exempt from the difficulty predicate.
    pub fn genesis() -> Self {
        let mut block = Block {
            index: 0,
            transactions: Vec::new(),
            timestamp: Utc::now().timestamp_millis(),
            previous_hash: GENESIS_PREVIOUS_HASH.to_string(),
            nonce: 0,
            hash: String::new(),
        };
        block.hash = block.compute_hash();
        block
    }

    /// Creates a new, not yet mined block.
    pub fn new(index: u64, transactions: Vec<Transaction>, previous_hash: String) -> Self {
        Block {
            index,
            transactions,
            timestamp: Utc::now().timestamp_millis(),
            previous_hash,
            nonce: 0,
            hash: String::new(),
        }
    }

    /// The canonical hash preimage: versioned, fixed field order, every
    /// variable-length field length-prefixed. Stable across implementations;
    /// never derived from a map or serde representation.
    fn hash_preimage(&self, nonce: u64) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.push(CANONICAL_VERSION);
        buf.extend_from_slice(&self.index.to_le_bytes());
        buf.extend_from_slice(&self.timestamp.to_le_bytes());
        buf.extend_from_slice(&(self.transactions.len() as u32).to_le_bytes());
        for tx in &self.transactions {
            put_length_prefixed(&mut buf, &tx.canonical_bytes());
        }
        put_length_prefixed(&mut buf, self.previous_hash.as_bytes());
        buf.extend_from_slice(&nonce.to_le_bytes());
        buf
    }

    /// SHA-256 of the canonical serialization, as lowercase hex.
    pub fn compute_hash(&self) -> String {
        self.hash_with_nonce(self.nonce)
    }

    /// Hash of the block with `nonce` substituted for the stored one.
    /// The mining inner loop; no allocation beyond the preimage, no
    /// external state.
    pub fn hash_with_nonce(&self, nonce: u64) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.hash_preimage(nonce));
        hex::encode(hasher.finalize())
    }

    /// Whether the stored hash has at least `difficulty` leading zero hex
    /// characters.
    pub fn meets_difficulty(&self, difficulty: usize) -> bool {
        hash_meets_difficulty(&self.hash, difficulty)
    }
}

/// The difficulty predicate shared by mining and validation.
pub(crate) fn hash_meets_difficulty(hash: &str, difficulty: usize) -> bool {
    hash.len() >= difficulty && hash.bytes().take(difficulty).all(|b| b == b'0')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::crypto::generate_key_pair;

    fn sample_transaction() -> Transaction {
        let (private_key, public_key) = generate_key_pair();
        let (_, recipient) = generate_key_pair();
        let mut tx = Transaction::new(public_key, recipient, 7);
        tx.sign(&private_key).unwrap();
        tx
    }

    #[test]
    fn test_genesis_shape() {
        let genesis = Block::genesis();
        assert_eq!(genesis.index, 0);
        assert!(genesis.transactions.is_empty());
        assert_eq!(genesis.previous_hash, GENESIS_PREVIOUS_HASH);
        assert_eq!(genesis.hash, genesis.compute_hash());
    }

    #[test]
    fn test_compute_hash_is_deterministic() {
        let block = Block::new(1, vec![sample_transaction()], "prev".to_string());
        assert_eq!(block.compute_hash(), block.compute_hash());
        assert_eq!(block.compute_hash().len(), 64);
    }

    #[test]
    fn test_hash_changes_with_every_field() {
        let block = Block::new(1, vec![sample_transaction()], "prev".to_string());
        let base = block.compute_hash();

        let mut changed = block.clone();
        changed.index = 2;
        assert_ne!(base, changed.compute_hash());

        let mut changed = block.clone();
        changed.timestamp += 1;
        assert_ne!(base, changed.compute_hash());

        let mut changed = block.clone();
        changed.previous_hash.push('0');
        assert_ne!(base, changed.compute_hash());

        let mut changed = block.clone();
        changed.transactions[0].amount += 1;
        assert_ne!(base, changed.compute_hash());

        assert_ne!(base, block.hash_with_nonce(block.nonce + 1));
    }

    #[test]
    fn test_hash_with_nonce_matches_stored_nonce() {
        let mut block = Block::new(3, Vec::new(), "prev".to_string());
        block.nonce = 42;
        assert_eq!(block.compute_hash(), block.hash_with_nonce(42));
    }

    #[test]
    fn test_difficulty_predicate() {
        assert!(hash_meets_difficulty("00abc", 2));
        assert!(hash_meets_difficulty("000", 3));
        assert!(!hash_meets_difficulty("0abc", 2));
        assert!(!hash_meets_difficulty("0", 2));
        assert!(hash_meets_difficulty("anything", 0));
    }
}
