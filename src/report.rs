//! Read-only, human-readable view of a chain. Presentation only: everything
//! here goes through the chain's public accessors and mutates nothing.

use std::fmt::Write;

use serde_json::json;

use crate::blockchain::{Blockchain, Transaction};

/// Base58 rendering of an identifier, truncated for display.
fn short_id(bytes: &[u8]) -> String {
    let encoded = bs58::encode(bytes).into_string();
    if encoded.len() > 10 {
        format!("{}...", &encoded[..10])
    } else {
        encoded
    }
}

fn render_transaction(out: &mut String, tx: &Transaction) {
    let _ = writeln!(
        out,
        "  From: {}  To: {}  Amount: {}  Valid: {}",
        short_id(&tx.sender_public_key),
        short_id(&tx.recipient_address),
        tx.amount,
        tx.is_valid()
    );
}

/// Renders every block with its hash, linkage, and transactions.
pub fn render(chain: &Blockchain) -> String {
    let mut out = String::new();
    for block in chain.blocks() {
        let _ = writeln!(out, "Block {}", block.index);
        let _ = writeln!(out, "Hash: {}", block.hash);
        let _ = writeln!(out, "Previous hash: {}", block.previous_hash);
        if block.transactions.is_empty() {
            let _ = writeln!(out, "Transactions: none");
        } else {
            let _ = writeln!(out, "Transactions:");
            for tx in &block.transactions {
                render_transaction(&mut out, tx);
            }
        }
        let _ = writeln!(out);
    }
    out
}

/// Machine-readable rendering of the chain and its validity.
pub fn render_json(chain: &Blockchain) -> serde_json::Result<String> {
    let value = json!({
        "difficulty": chain.difficulty(),
        "length": chain.len(),
        "valid": chain.is_chain_valid(),
        "blocks": chain.blocks(),
    });
    serde_json::to_string_pretty(&value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::{generate_key_pair, Blockchain};

    fn mined_chain() -> Blockchain {
        let chain = Blockchain::with_config(1, 2);
        let (private1, public1) = generate_key_pair();
        let (_, public2) = generate_key_pair();
        let mut tx = Transaction::new(public1, public2, 5);
        tx.sign(&private1).unwrap();
        chain.add_transaction(tx);
        chain.mine_block();
        chain
    }

    #[test]
    fn test_render_lists_every_block() {
        let chain = mined_chain();
        let rendered = render(&chain);
        assert!(rendered.contains("Block 0"));
        assert!(rendered.contains("Block 1"));
        assert!(rendered.contains("Amount: 5"));
        assert!(rendered.contains("Valid: true"));
    }

    #[test]
    fn test_render_does_not_mutate_the_chain() {
        let chain = mined_chain();
        let before = chain.blocks();
        let _ = render(&chain);
        let _ = render_json(&chain).unwrap();
        let after = chain.blocks();
        assert_eq!(before.len(), after.len());
        assert_eq!(before[1].hash, after[1].hash);
    }

    #[test]
    fn test_render_json_shape() {
        let chain = mined_chain();
        let rendered = render_json(&chain).unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value["length"], 2);
        assert_eq!(value["valid"], true);
        assert_eq!(value["blocks"][1]["index"], 1);
    }
}
