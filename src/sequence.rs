//! Sequence counters.
//!
//! A `SequenceRegistry` owns one counter per (factory, field) pair. Counters are created on
//! first use at the seed declared by the sequence rule, hand out consecutive values, and are
//! never decremented or reset while the registry lives. The registry is the only mutable state
//! shared by concurrent builds; it is handed to `Fixtures` explicitly so tests can use an
//! isolated one.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::definition::FactoryId;

/// Identity of one counter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SequenceKey {
    pub factory: FactoryId,
    pub field: String,
}

impl SequenceKey {
    pub fn new(factory: FactoryId, field: impl Into<String>) -> Self {
        Self {
            factory,
            field: field.into(),
        }
    }
}

#[derive(Debug, Default)]
pub struct SequenceRegistry {
    /// Next value to hand out, per counter.
    counters: Mutex<HashMap<SequenceKey, i64>>,
}

impl SequenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draws the next value of a counter.
    ///
    /// The first draw of a counter returns `seed`; every later draw returns the previous value
    /// plus one. A seed passed after the counter exists is ignored.
    ///
    /// # Arguments
    /// - `key` - Counter identity
    /// - `seed` - Starting value used when the counter does not exist yet
    ///
    /// # Returns
    /// - `i64` - A value no other caller of this registry has received for `key`
    pub fn next(&self, key: &SequenceKey, seed: i64) -> i64 {
        let mut counters = self.counters.lock();
        let next = counters.entry(key.clone()).or_insert(seed);
        let value = *next;
        *next += 1;
        value
    }

    /// Returns the value the next draw would hand out, without drawing it.
    ///
    /// # Returns
    /// - `Some(i64)` - Next value of an existing counter
    /// - `None` - The counter has not been drawn from yet
    pub fn peek(&self, key: &SequenceKey) -> Option<i64> {
        self.counters.lock().get(key).copied()
    }

    /// Number of counters created so far.
    pub fn len(&self) -> usize {
        self.counters.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::{definition::Factory, test::model::User};

    fn user_factory_id() -> FactoryId {
        Factory::<User>::builder("test_user").build().unwrap().id()
    }

    #[test]
    fn starts_at_seed_and_increments() {
        let registry = SequenceRegistry::new();
        let key = SequenceKey::new(user_factory_id(), "id");

        assert_eq!(registry.peek(&key), None);
        assert_eq!(registry.next(&key, 5), 5);
        assert_eq!(registry.next(&key, 5), 6);
        // Seed is only used on first draw
        assert_eq!(registry.next(&key, 100), 7);
        assert_eq!(registry.peek(&key), Some(8));
    }

    #[test]
    fn keeps_counters_per_factory_and_field() {
        let registry = SequenceRegistry::new();
        let first = user_factory_id();
        let second = user_factory_id();
        assert_ne!(first, second);

        assert_eq!(registry.next(&SequenceKey::new(first, "id"), 1), 1);
        assert_eq!(registry.next(&SequenceKey::new(first, "age"), 1), 1);
        assert_eq!(registry.next(&SequenceKey::new(second, "id"), 1), 1);
        assert_eq!(registry.next(&SequenceKey::new(first, "id"), 1), 2);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn concurrent_draws_never_repeat() {
        let registry = SequenceRegistry::new();
        let key = SequenceKey::new(user_factory_id(), "id");

        let drawn: Vec<i64> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    scope.spawn(|| (0..250).map(|_| registry.next(&key, 1)).collect::<Vec<_>>())
                })
                .collect();
            handles
                .into_iter()
                .flat_map(|handle| handle.join().unwrap())
                .collect()
        });

        let unique: HashSet<i64> = drawn.iter().copied().collect();
        assert_eq!(drawn.len(), 2000);
        assert_eq!(unique.len(), 2000);
        assert_eq!(registry.peek(&key), Some(2001));
    }
}
