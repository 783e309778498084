//! Deterministic state hashing
//!
//! FNV-1a over a canonical byte encoding. Used to chain commits and to check
//! that a replayed state matches the live one.

use banker_core::{ProcessId, SystemState};

/// 32-byte hash of a commit or a state
pub type Hash32 = [u8; 32];

/// FNV-1a over counts, ids and hashes.
///
/// Feeds both commit ids (previous id, seq, payload) and state hashes
/// (dimensions, every Allocation and Max row, Available).
pub struct StateHasher {
    hash: u64,
}

impl StateHasher {
    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;

    /// Create a new hasher.
    pub fn new() -> Self {
        Self {
            hash: Self::FNV_OFFSET,
        }
    }

    /// Write a single byte.
    pub fn write_u8(&mut self, v: u8) {
        self.hash ^= u64::from(v);
        self.hash = self.hash.wrapping_mul(Self::FNV_PRIME);
    }

    /// Write a u32.
    pub fn write_u32(&mut self, v: u32) {
        for b in v.to_le_bytes() {
            self.write_u8(b);
        }
    }

    /// Write a u64.
    pub fn write_u64(&mut self, v: u64) {
        for b in v.to_le_bytes() {
            self.write_u8(b);
        }
    }

    /// Write a length-prefixed vector of counts.
    pub fn write_counts(&mut self, values: &[u32]) {
        self.write_u64(values.len() as u64);
        for &v in values {
            self.write_u32(v);
        }
    }

    /// Write a 32-byte hash.
    pub fn write_hash(&mut self, hash: &Hash32) {
        for &b in hash {
            self.write_u8(b);
        }
    }

    /// Digest for a commit id or state hash.
    ///
    /// Four successive FNV products of the running hash, little-endian.
    pub fn finalize(&self) -> Hash32 {
        let mut result = [0u8; 32];
        let mut h = self.hash;

        for chunk in result.chunks_mut(8) {
            chunk.copy_from_slice(&h.to_le_bytes());
            h = h.wrapping_mul(Self::FNV_PRIME);
        }

        result
    }
}

impl Default for StateHasher {
    fn default() -> Self {
        Self::new()
    }
}

/// Hash every matrix and vector of a state.
pub fn state_hash(state: &SystemState) -> Hash32 {
    let mut hasher = StateHasher::new();

    hasher.write_u64(state.process_count() as u64);
    hasher.write_u64(state.resource_count() as u64);
    for pid in state.processes() {
        hasher.write_u64(pid.0 as u64);
        hasher.write_counts(state.allocation_of(pid).unwrap_or_default());
        hasher.write_counts(state.max_of(pid).unwrap_or_default());
    }
    hasher.write_counts(state.available());

    hasher.finalize()
}

/// Lowercase hex of the first 8 bytes, for logs
pub fn short_hex(hash: &Hash32) -> String {
    hash[..8].iter().map(|b| format!("{:02x}", b)).collect()
}

/// Write a process id into a hasher.
pub(crate) fn write_pid(hasher: &mut StateHasher, pid: ProcessId) {
    hasher.write_u64(pid.0 as u64);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_state(free: u32) -> SystemState {
        SystemState::new(2, 1, vec![vec![1], vec![0]], vec![vec![2], vec![1]], vec![free]).unwrap()
    }

    #[test]
    fn test_state_hash_is_deterministic() {
        assert_eq!(state_hash(&small_state(1)), state_hash(&small_state(1)));
    }

    #[test]
    fn test_state_hash_changes_with_available() {
        assert_ne!(state_hash(&small_state(1)), state_hash(&small_state(2)));
    }

    #[test]
    fn test_state_hash_distinguishes_allocation_moves() {
        let a = SystemState::new(2, 1, vec![vec![1], vec![0]], vec![vec![1], vec![1]], vec![0])
            .unwrap();
        let b = SystemState::new(2, 1, vec![vec![0], vec![1]], vec![vec![1], vec![1]], vec![0])
            .unwrap();
        assert_ne!(state_hash(&a), state_hash(&b));
    }

    #[test]
    fn test_finalize_widens_to_distinct_words() {
        let mut hasher = StateHasher::new();
        hasher.write_counts(&[3, 3, 2]);
        let digest = hasher.finalize();

        let words: Vec<&[u8]> = digest.chunks(8).collect();
        assert_eq!(words.len(), 4);
        for i in 0..4 {
            for j in i + 1..4 {
                assert_ne!(words[i], words[j]);
            }
        }
        assert_eq!(digest, hasher.finalize());
    }

    #[test]
    fn test_short_hex_width() {
        assert_eq!(short_hex(&[0xab; 32]), "abababababababab");
    }
}
