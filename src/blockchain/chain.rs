use std::sync::{Arc, Mutex};

use log::{debug, info, warn};

use super::block::Block;
use super::miner::{self, CancelToken, PowOutcome};
use super::transaction::Transaction;

/// Default number of leading zero hex characters a block hash must have.
pub const DEFAULT_DIFFICULTY: usize = 2;

/// Result of a mining attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MineOutcome {
    /// A block was mined and appended at this index.
    Mined { index: u64 },
    /// The pool was empty; nothing to mine, nothing changed.
    EmptyPool,
    /// The search was cancelled (or the tip moved under a concurrent miner);
    /// the snapshot stays pooled for the next attempt.
    Cancelled,
}

/// Blocks and pool live behind one mutex so that a mining snapshot is
/// exactly "pool contents at that instant" and appends are atomic with the
/// matching pool drain.
#[derive(Debug)]
struct ChainState {
    blocks: Vec<Block>,
    pool: Vec<Transaction>,
}

impl ChainState {
    fn tip(&self) -> &Block {
        self.blocks
            .last()
            .expect("chain always contains the genesis block")
    }
}

/// The ledger aggregate: the append-only block sequence, the
/// pending-transaction pool, and the consensus parameters.
///
/// Cloning is cheap and shares the underlying state, so producers can keep
/// submitting transactions while another handle mines.
#[derive(Debug, Clone)]
pub struct Blockchain {
    state: Arc<Mutex<ChainState>>,
    difficulty: usize,
    workers: usize,
}

impl Default for Blockchain {
    fn default() -> Self {
        Self::new()
    }
}

impl Blockchain {
    /// Creates a chain holding only the genesis block, with the default
    /// difficulty and one mining worker per available core.
    pub fn new() -> Self {
        Self::with_config(DEFAULT_DIFFICULTY, miner::default_workers())
    }

    /// Creates a chain with the given difficulty.
    pub fn with_difficulty(difficulty: usize) -> Self {
        Self::with_config(difficulty, miner::default_workers())
    }

    /// Creates a chain with the given difficulty and mining worker count.
    pub fn with_config(difficulty: usize, workers: usize) -> Self {
        Blockchain {
            state: Arc::new(Mutex::new(ChainState {
                blocks: vec![Block::genesis()],
                pool: Vec::new(),
            })),
            difficulty,
            workers: workers.max(1),
        }
    }

    /// Appends `transaction` to the pool iff it is valid.
    ///
    /// This is the only validation gate before mining, so an accepted
    /// transaction is mined as-is. Returns `false` on rejection; the reason
    /// is logged but not disclosed to the caller.
    pub fn add_transaction(&self, transaction: Transaction) -> bool {
        match transaction.validate() {
            Ok(()) => {
                let mut state = self.state.lock().unwrap();
                state.pool.push(transaction);
                debug!("Accepted transaction, pool size {}", state.pool.len());
                true
            }
            Err(reason) => {
                warn!("Rejected transaction: {}", reason);
                false
            }
        }
    }

    /// Mines the pending transactions into a new block. See
    /// [`Blockchain::mine_block_with`]; this variant cannot be cancelled.
    pub fn mine_block(&self) -> MineOutcome {
        self.mine_block_with(&CancelToken::new())
    }

    /// Mines the pending transactions into a new block, searching for a
    /// proof-of-work until one is found or `cancel` fires.
    ///
    /// The pool is snapshotted under the lock, but the CPU-bound search runs
    /// without it: transactions submitted while mining is in flight are
    /// neither included in this block nor lost, they stay pooled for the
    /// next one.
    pub fn mine_block_with(&self, cancel: &CancelToken) -> MineOutcome {
        let (candidate, snapshot_len) = {
            let state = self.state.lock().unwrap();
            if state.pool.is_empty() {
                debug!("Nothing to mine, pool is empty");
                return MineOutcome::EmptyPool;
            }
            let tip = state.tip();
            let candidate = Block::new(tip.index + 1, state.pool.clone(), tip.hash.clone());
            (candidate, state.pool.len())
        };

        match miner::search(&candidate, self.difficulty, self.workers, cancel) {
            PowOutcome::Cancelled => {
                info!(
                    "Mining of block {} cancelled, {} transaction(s) stay pooled",
                    candidate.index, snapshot_len
                );
                MineOutcome::Cancelled
            }
            PowOutcome::Found { nonce, hash } => {
                let mut block = candidate;
                block.nonce = nonce;
                block.hash = hash;

                let mut state = self.state.lock().unwrap();
                if state.tip().hash != block.previous_hash {
                    warn!(
                        "Discarding stale block {}: tip moved while mining",
                        block.index
                    );
                    return MineOutcome::Cancelled;
                }

                let index = block.index;
                info!(
                    "Mined block {} with {} transaction(s), hash {}",
                    index, snapshot_len, block.hash
                );
                state.blocks.push(block);
                // Drop exactly the mined snapshot; later arrivals stay.
                state.pool.drain(..snapshot_len);
                MineOutcome::Mined { index }
            }
        }
    }

    /// Verifies the whole chain from the block after genesis to the tip.
    ///
    /// For each block, in order: the stored hash matches a recomputation,
    /// the linkage matches the predecessor, every embedded transaction is
    /// valid, and the hash meets the difficulty. Genesis predates consensus
    /// and is exempt. Read-only; safe to call repeatedly.
    pub fn is_chain_valid(&self) -> bool {
        let state = self.state.lock().unwrap();

        for i in 1..state.blocks.len() {
            let current = &state.blocks[i];
            let previous = &state.blocks[i - 1];

            if current.hash != current.compute_hash() {
                debug!("Block {} hash does not match its contents", current.index);
                return false;
            }

            if current.previous_hash != previous.hash {
                debug!("Block {} is not linked to its predecessor", current.index);
                return false;
            }

            for tx in &current.transactions {
                if let Err(reason) = tx.validate() {
                    debug!("Block {} holds an invalid transaction: {}", current.index, reason);
                    return false;
                }
            }

            if !current.meets_difficulty(self.difficulty) {
                debug!("Block {} does not satisfy the difficulty", current.index);
                return false;
            }
        }

        true
    }

    /// Number of blocks in the chain, genesis included.
    pub fn len(&self) -> usize {
        self.state.lock().unwrap().blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        // A chain always holds at least the genesis block.
        false
    }

    /// A snapshot of all blocks in the chain.
    pub fn blocks(&self) -> Vec<Block> {
        self.state.lock().unwrap().blocks.clone()
    }

    /// A snapshot of the current block at the tip.
    pub fn tip(&self) -> Block {
        self.state.lock().unwrap().tip().clone()
    }

    /// A snapshot of the not-yet-mined transactions.
    pub fn pending_transactions(&self) -> Vec<Transaction> {
        self.state.lock().unwrap().pool.clone()
    }

    pub fn difficulty(&self) -> usize {
        self.difficulty
    }
}
