use crate::utils::sha256_digest;

/// Merkle root over an ordered list of transaction hashes.
///
/// Pairs hashes left to right, duplicating the last element on odd
/// levels; each parent is `sha256(left || right)`. An empty list yields
/// an empty root and a single element is returned unchanged. The
/// duplicated-tail construction is open to second-preimage tricks, but
/// every block hash on the network depends on these exact bytes, so the
/// construction must not change.
pub fn calculate_merkle_root(tx_hashes: &[Vec<u8>]) -> Vec<u8> {
    if tx_hashes.is_empty() {
        return Vec::new();
    }
    if tx_hashes.len() == 1 {
        return tx_hashes[0].clone();
    }

    let mut level = tx_hashes.to_vec();
    while level.len() > 1 {
        let mut next_level = Vec::with_capacity(level.len().div_ceil(2));
        for pair in level.chunks(2) {
            let left = &pair[0];
            let right = pair.get(1).unwrap_or(left);

            let mut combined = Vec::with_capacity(left.len() + right.len());
            combined.extend_from_slice(left);
            combined.extend_from_slice(right);
            next_level.push(sha256_digest(&combined));
        }
        level = next_level;
    }

    level.into_iter().next().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(byte: u8) -> Vec<u8> {
        vec![byte; 32]
    }

    fn parent(left: &[u8], right: &[u8]) -> Vec<u8> {
        let mut combined = left.to_vec();
        combined.extend_from_slice(right);
        sha256_digest(&combined)
    }

    #[test]
    fn test_empty_list_gives_empty_root() {
        assert!(calculate_merkle_root(&[]).is_empty());
    }

    #[test]
    fn test_single_hash_is_returned_unchanged() {
        let h = leaf(1);
        assert_eq!(calculate_merkle_root(&[h.clone()]), h);
    }

    #[test]
    fn test_two_hashes_pair_once() {
        let (a, b) = (leaf(1), leaf(2));
        assert_eq!(calculate_merkle_root(&[a.clone(), b.clone()]), parent(&a, &b));
    }

    #[test]
    fn test_odd_count_duplicates_tail() {
        let (a, b, c) = (leaf(1), leaf(2), leaf(3));
        let expected = parent(&parent(&a, &b), &parent(&c, &c));
        assert_eq!(calculate_merkle_root(&[a, b, c]), expected);
    }

    #[test]
    fn test_root_depends_only_on_hash_sequence() {
        let hashes = vec![leaf(1), leaf(2), leaf(3), leaf(4)];
        assert_eq!(calculate_merkle_root(&hashes), calculate_merkle_root(&hashes));

        let mut reordered = hashes.clone();
        reordered.swap(0, 1);
        assert_ne!(calculate_merkle_root(&hashes), calculate_merkle_root(&reordered));
    }
}
