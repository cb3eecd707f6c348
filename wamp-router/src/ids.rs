use std::sync::atomic::{AtomicI64, Ordering};

/// Identifier of a client session within the realm.
pub type SessionId = i64;
/// Identifier of a topic subscription. Shared by every subscriber of the
/// topic; identifies the topic on the wire.
pub type SubscriptionId = i64;
/// Identifier of a procedure registration.
pub type RegistrationId = i64;
/// Identifier of one in-flight invocation between router and callee.
pub type RequestId = i64;
/// Identifier of a single publication.
pub type PublicationId = i64;

/// Hands out subscription, registration and invocation-request ids.
///
/// One allocator is shared per router instance so broker and dealer never
/// mint the same id twice within a process lifetime. Ids are sequential,
/// start at 1 and stay in the positive 63-bit range the protocol allots;
/// they are never reused, which lets teardown paths key on them without
/// aliasing concerns.
#[derive(Debug)]
pub struct IdAllocator {
    next: AtomicI64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self {
            next: AtomicI64::new(1),
        }
    }

    /// Returns an id no prior or concurrent call has returned.
    pub fn next_id(&self) -> i64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn ids_start_at_one_and_grow() {
        let allocator = IdAllocator::new();
        assert_eq!(allocator.next_id(), 1);
        assert_eq!(allocator.next_id(), 2);
        assert_eq!(allocator.next_id(), 3);
    }

    #[test]
    fn concurrent_allocation_never_repeats() {
        let allocator = Arc::new(IdAllocator::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let allocator = allocator.clone();
                std::thread::spawn(move || (0..1_000).map(|_| allocator.next_id()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(id >= 1);
                assert!(seen.insert(id), "id {id} issued twice");
            }
        }
        assert_eq!(seen.len(), 8_000);
    }
}
