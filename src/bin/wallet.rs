// Wallet CLI: generate a key pair, or sign a transfer and submit it to a
// node's /newtx endpoint.
use clap::Parser;
use log::{error, LevelFilter};
use minichain::{Transaction, Wallet, WalletCommand, WalletOpt};
use std::path::Path;
use std::process;
use std::time::Duration;

fn main() {
    env_logger::builder().filter_level(LevelFilter::Info).init();

    let opt = WalletOpt::parse();
    if let Err(e) = run_command(opt.command) {
        error!("Error: {e}");
        process::exit(1);
    }
}

fn run_command(command: WalletCommand) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        WalletCommand::Gen { out } => {
            let wallet = Wallet::new()?;
            wallet.save_key_file(&out)?;

            println!("New wallet generated.");
            println!("Address: {}", wallet.get_address());
            println!("Private key saved to {} - keep it safe, it cannot be recovered.", out.display());
        }
        WalletCommand::Send {
            node,
            sk,
            to,
            value,
        } => {
            if value == 0 {
                return Err("value must be positive".into());
            }

            let tx = build_signed_transfer(&sk, to, value)?;
            let url = format!("{node}/newtx");
            println!("Sending transaction to {url}");
            println!("From : {}", tx.get_from());
            println!("To   : {}", tx.get_to());
            println!("Value: {}", tx.get_value());

            let client = reqwest::blocking::Client::builder()
                .timeout(Duration::from_secs(5))
                .build()?;
            let resp = client.post(&url).json(&tx).send()?;

            println!("Node returned status: {}", resp.status());
            println!("Node returned body  : {}", resp.text()?);
        }
    }
    Ok(())
}

fn build_signed_transfer(
    sk: &Path,
    to: String,
    value: u32,
) -> Result<Transaction, Box<dyn std::error::Error>> {
    let wallet = Wallet::load_key_file(sk)?;
    let mut tx = Transaction::new(wallet.get_address(), to, value)?;
    tx.sign(wallet.get_pkcs8())?;
    Ok(tx)
}
