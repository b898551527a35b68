use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "node", about = "Run a blockchain node")]
pub struct NodeOpt {
    /// Port for the HTTP listener; also keys the chain file name
    #[arg(long)]
    pub port: u16,

    /// Comma-separated peer base URLs, e.g. http://localhost:8002
    #[arg(long, value_delimiter = ',')]
    pub peers: Vec<String>,
}

#[derive(Debug, Parser)]
#[command(name = "wallet", about = "Generate keys and send transactions")]
pub struct WalletOpt {
    #[command(subcommand)]
    pub command: WalletCommand,
}

#[derive(Subcommand, Debug)]
pub enum WalletCommand {
    #[command(name = "gen", about = "Generate a key pair and print its address")]
    Gen {
        /// Where to write the private key
        #[arg(long, default_value = "wallet_key.p8")]
        out: PathBuf,
    },
    #[command(name = "send", about = "Sign a transaction and submit it to a node")]
    Send {
        /// Base URL of the node to submit to
        #[arg(long, default_value = "http://localhost:8001")]
        node: String,
        /// Path of the private key file
        #[arg(long, default_value = "wallet_key.p8")]
        sk: PathBuf,
        /// Recipient address
        #[arg(long)]
        to: String,
        /// Amount to transfer
        #[arg(long)]
        value: u32,
    },
}
