//! Peer-facing side of the node: the HTTP server, the broadcast/sync
//! client, node lifecycle and the nickname registry.

pub mod nickname;
pub mod node;
pub mod peers;
pub mod server;

pub use node::Node;
pub use server::{NodeState, PeerServer, BLOCK_REWARD, MAX_TX_PER_BLOCK};
