// Node entrypoint: parse flags, build the node, serve until killed.
use clap::Parser;
use log::{error, LevelFilter};
use minichain::{Config, Node, NodeOpt};
use std::process;

fn main() {
    env_logger::builder().filter_level(LevelFilter::Info).init();

    let opt = NodeOpt::parse();
    let peers: Vec<String> = opt
        .peers
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect();

    let config = Config::new(opt.port, peers);
    let node = match Node::new(config) {
        Ok(node) => node,
        Err(e) => {
            error!("failed to initialize node: {e}");
            process::exit(1);
        }
    };

    node.start();
}
