//! Durable chain snapshot and the in-memory pending-transaction pool.

pub mod file_db;
pub mod memory_pool;

pub use file_db::FileStorage;
pub use memory_pool::Mempool;
