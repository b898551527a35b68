use crate::core::Transaction;

/// Ordered pool of accepted but not-yet-mined transactions.
///
/// Owned exclusively by the peer server and only ever touched under its
/// state mutex, together with the chain; the pool itself carries no lock.
/// Order is admission order, and mining always packs from the front.
#[derive(Debug, Default)]
pub struct Mempool {
    txs: Vec<Transaction>,
}

impl Mempool {
    pub fn new() -> Mempool {
        Mempool::default()
    }

    pub fn push(&mut self, tx: Transaction) {
        self.txs.push(tx);
    }

    pub fn len(&self) -> usize {
        self.txs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.txs.is_empty()
    }

    /// Total value already promised by pending transactions from `from`.
    /// Admission subtracts this from the confirmed balance.
    pub fn pending_outgoing(&self, from: &str) -> i64 {
        self.txs
            .iter()
            .filter(|tx| tx.get_from() == from)
            .map(|tx| i64::from(tx.get_value()))
            .sum()
    }

    /// Remove and return the first `n` transactions, keeping the rest in
    /// their original order.
    pub fn take_front(&mut self, n: usize) -> Vec<Transaction> {
        let n = n.min(self.txs.len());
        self.txs.drain(..n).collect()
    }

    /// Put drained transactions back at the front, ahead of anything that
    /// arrived meanwhile. Used when a mined block turns out stale.
    pub fn restore_front(&mut self, mut txs: Vec<Transaction>) {
        txs.append(&mut self.txs);
        self.txs = txs;
    }
}
