use anyhow::Result;
use log::info;

mod blockchain;
mod report;

use blockchain::{generate_key_pair, Blockchain, MineOutcome, Transaction};

fn main() -> Result<()> {
    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let chain = Blockchain::new();

    // Two accounts; the public key doubles as the address.
    let (private_key1, public_key1) = generate_key_pair();
    let (_, public_key2) = generate_key_pair();

    let mut transaction = Transaction::new(public_key1, public_key2, 5);
    transaction.sign(&private_key1)?;

    if !chain.add_transaction(transaction) {
        anyhow::bail!("freshly signed transaction was rejected");
    }

    match chain.mine_block() {
        MineOutcome::Mined { index } => info!("Mined block {}", index),
        MineOutcome::EmptyPool => info!("Pool was empty, nothing to mine"),
        MineOutcome::Cancelled => info!("Mining was cancelled"),
    }

    println!("Blockchain valid: {}", chain.is_chain_valid());
    println!();

    if std::env::args().any(|arg| arg == "--json") {
        println!("{}", report::render_json(&chain)?);
    } else {
        print!("{}", report::render(&chain));
    }

    Ok(())
}
