use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use log::debug;

use super::block::{hash_meets_difficulty, Block};

/// Cooperative cancellation flag for an in-progress proof-of-work search.
///
/// Clones share the flag; any holder may cancel. Workers check it every
/// iteration, so cancellation takes effect within one hash computation.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        CancelToken::default()
    }

    /// Requests that the search stop at the next iteration.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Result of a proof-of-work search: either a satisfying nonce was found or
/// the search was cancelled before one turned up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PowOutcome {
    Found { nonce: u64, hash: String },
    Cancelled,
}

/// Number of workers to use when the caller does not care.
pub fn default_workers() -> usize {
    thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
}

/// Searches for a nonce whose block hash has at least `difficulty` leading
/// zero hex characters.
///
/// Each of the `workers` threads scans a disjoint nonce stride (worker `w`
/// tries `w, w + workers, w + 2 * workers, ...`), so with one worker the scan
/// is the linear 0, 1, 2, ... sequence. The first worker to find a satisfying
/// nonce wins and flags the others down. The search holds no locks and
/// touches no state outside the shared found/cancel flags.
pub fn search(block: &Block, difficulty: usize, workers: usize, cancel: &CancelToken) -> PowOutcome {
    let workers = workers.max(1);
    let found = AtomicBool::new(false);
    let result: Mutex<Option<(u64, String)>> = Mutex::new(None);

    thread::scope(|scope| {
        for worker in 0..workers {
            let found = &found;
            let result = &result;
            scope.spawn(move || {
                let stride = workers as u64;
                let mut nonce = worker as u64;
                loop {
                    if found.load(Ordering::Relaxed) || cancel.is_cancelled() {
                        return;
                    }
                    let hash = block.hash_with_nonce(nonce);
                    if hash_meets_difficulty(&hash, difficulty) {
                        // Exactly one worker records the winning nonce.
                        if !found.swap(true, Ordering::SeqCst) {
                            *result.lock().unwrap() = Some((nonce, hash));
                        }
                        return;
                    }
                    nonce = nonce.wrapping_add(stride);
                }
            });
        }
    });

    match result.into_inner().unwrap() {
        Some((nonce, hash)) => {
            debug!(
                "Proof-of-work for block {} found at nonce {}: {}",
                block.index, nonce, hash
            );
            PowOutcome::Found { nonce, hash }
        }
        None => {
            debug!("Proof-of-work search for block {} cancelled", block.index);
            PowOutcome::Cancelled
        }
    }
}
