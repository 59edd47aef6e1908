// Ledger core
//
// This module contains the proof-of-work ledger engine:
// - Key/signature service
// - Transaction structure and validation
// - Block structure and canonical hashing
// - Cancellable proof-of-work search
// - Chain aggregate with the pending-transaction pool

pub mod block;
pub mod chain;
pub mod crypto;
pub mod miner;
pub mod transaction;

// Re-export main components for easier access
pub use block::Block;
pub use chain::{Blockchain, MineOutcome};
pub use crypto::{generate_key_pair, KeyPair};
pub use miner::CancelToken;
pub use transaction::Transaction;
