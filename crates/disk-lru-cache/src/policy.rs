//! Eviction decisions

/// Entries evicted by a single flush at most
pub const DEFAULT_EVICTION_BUDGET: usize = 4;

/// True when either limit is exceeded
pub fn should_evict(item_count: usize, total_bytes: u64, max_items: usize, max_bytes: u64) -> bool {
    item_count > max_items || total_bytes > max_bytes
}

/// Decides whether a flush should keep evicting.
///
/// A flush removes at most [`eviction_budget`](Self::eviction_budget) entries
/// and does not loop further, so one large insertion can leave the cache
/// over quota until later flushes catch up. Bounding the work per flush
/// bounds the pause seen by the caller that triggered it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvictionPolicy {
    max_items: usize,
    max_bytes: u64,
    budget: usize,
}

impl EvictionPolicy {
    pub fn new(max_items: usize, max_bytes: u64, budget: usize) -> Self {
        Self {
            max_items,
            max_bytes,
            budget,
        }
    }

    pub fn should_evict(&self, item_count: usize, total_bytes: u64) -> bool {
        should_evict(item_count, total_bytes, self.max_items, self.max_bytes)
    }

    pub fn eviction_budget(&self) -> usize {
        self.budget
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_within_limits() {
        assert!(!should_evict(2, 10, 2, 10));
        assert!(!should_evict(0, 0, 0, 0));
    }

    #[test]
    fn test_item_limit_exceeded() {
        assert!(should_evict(3, 0, 2, 10));
    }

    #[test]
    fn test_byte_limit_exceeded() {
        assert!(should_evict(1, 11, 2, 10));
    }

    #[test]
    fn test_policy_uses_configured_limits() {
        let policy = EvictionPolicy::new(64, 1024, DEFAULT_EVICTION_BUDGET);
        assert!(!policy.should_evict(64, 1024));
        assert!(policy.should_evict(65, 0));
        assert!(policy.should_evict(1, 1025));
        assert_eq!(policy.eviction_budget(), 4);
    }
}
