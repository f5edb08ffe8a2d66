use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identifies one enqueued query within its context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryId(u64);

/// Local identity of an entity handle, used to detach it from its parent collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityKey(u64);

impl QueryId {
    pub fn new(value: u64) -> Self {
        QueryId(value)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl EntityKey {
    pub fn new(value: u64) -> Self {
        EntityKey(value)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for QueryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QueryId({})", self.0)
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityKey({})", self.0)
    }
}

impl From<u64> for QueryId {
    fn from(value: u64) -> Self {
        QueryId::new(value)
    }
}

#[derive(Debug)]
pub struct QueryIdAllocator {
    next: AtomicU64,
}

impl QueryIdAllocator {
    pub fn new() -> Self {
        QueryIdAllocator {
            next: AtomicU64::new(1),
        }
    }

    pub fn allocate(&self) -> QueryId {
        let id = self.next.fetch_add(1, Ordering::Relaxed);
        QueryId::new(id)
    }

    pub fn peek_next(&self) -> u64 {
        self.next.load(Ordering::Relaxed)
    }
}

impl Default for QueryIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

static NEXT_ENTITY_KEY: AtomicU64 = AtomicU64::new(1);

impl EntityKey {
    /// Process-unique key.
    pub fn allocate() -> Self {
        EntityKey(NEXT_ENTITY_KEY.fetch_add(1, Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_id_allocation_starts_at_one() {
        let allocator = QueryIdAllocator::new();
        assert_eq!(allocator.allocate(), QueryId::new(1));
        assert_eq!(allocator.allocate(), QueryId::new(2));
        assert_eq!(allocator.peek_next(), 3);
    }

    #[test]
    fn test_entity_keys_are_distinct() {
        let a = EntityKey::allocate();
        let b = EntityKey::allocate();
        assert_ne!(a, b);
    }

    #[test]
    fn test_display() {
        assert_eq!(QueryId::new(7).to_string(), "QueryId(7)");
        assert_eq!(EntityKey::new(3).to_string(), "EntityKey(3)");
    }

    #[test]
    fn test_serde_transparent() {
        let json = serde_json::to_string(&QueryId::new(42)).unwrap();
        assert_eq!(json, "42");
    }
}
