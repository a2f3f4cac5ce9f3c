//! Sequential identifier allocation over a shared counter.
//!
//! The observable contract is read, add one, write back, return
//! `prefix + value`. How the write lands depends on [`CounterMode`].

use tracing::{debug, error, warn};

use crate::config::{CounterKey, CounterMode, DEFAULT_CID_PREFIX};
use crate::error::{GenerationError, PortError, Service};
use crate::ports::CounterStore;

/// Result of one successful allocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    /// Formatted identifier, `prefix + value`.
    pub identifier: String,
    /// Counter value before the increment.
    pub previous: i64,
    /// Counter value now stored.
    pub value: i64,
    /// Compare-and-replace conflicts absorbed along the way.
    pub conflicts: u32,
}

/// Allocates identifiers from a [`CounterStore`].
pub struct SequentialCounterAllocator<'a> {
    store: &'a dyn CounterStore,
    mode: CounterMode,
    conflict_retries: u32,
}

impl<'a> SequentialCounterAllocator<'a> {
    /// Creates an allocator writing through `store` in `mode`.
    #[must_use]
    pub fn new(store: &'a dyn CounterStore, mode: CounterMode, conflict_retries: u32) -> Self {
        Self { store, mode, conflict_retries }
    }

    /// Reads the counter at `key`, increments it, stores the new value and
    /// returns it formatted with `prefix`. An empty prefix falls back to
    /// [`DEFAULT_CID_PREFIX`].
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::InvalidCounterState`] when the stored value
    /// is not an integer or cannot be incremented, and
    /// [`GenerationError::ExternalService`] when the store fails, refuses the
    /// atomic update in strict mode, or keeps conflicting.
    pub fn allocate(&self, key: &CounterKey, prefix: &str) -> Result<Allocation, GenerationError> {
        let prefix = if prefix.is_empty() { DEFAULT_CID_PREFIX } else { prefix };
        let mut conflicts = 0u32;

        loop {
            let raw = self
                .store
                .get_attribute_value(&key.object, &key.attribute, &key.environment)
                .map_err(|e| external(key, e))?;
            let previous = parse_counter(key, &raw)?;
            let value = previous.checked_add(1).ok_or_else(|| {
                error!(key = %key, value = %raw, "counter cannot be incremented");
                GenerationError::InvalidCounterState { key: key.to_string(), value: raw.clone() }
            })?;
            let next = value.to_string();

            let stored = match self.mode {
                CounterMode::Legacy => self.replace(key, &next).map(|()| true),
                CounterMode::Atomic | CounterMode::Strict => self.compare_and_replace(key, &raw, &next),
            }?;

            if stored {
                debug!(key = %key, previous, value, "allocated counter value");
                return Ok(Allocation {
                    identifier: format!("{prefix}{value}"),
                    previous,
                    value,
                    conflicts,
                });
            }

            conflicts += 1;
            if conflicts > self.conflict_retries {
                error!(key = %key, conflicts, "counter kept changing underneath the allocation");
                return Err(external(key, PortError::Conflict { attempts: conflicts }));
            }
            warn!(key = %key, conflicts, "counter changed concurrently, re-reading");
        }
    }

    fn replace(&self, key: &CounterKey, next: &str) -> Result<(), GenerationError> {
        self.store
            .replace_attribute_value(&key.object, &key.attribute, next, &key.environment)
            .map_err(|e| external(key, e))
    }

    /// Returns `Ok(false)` on a lost race.
    fn compare_and_replace(
        &self,
        key: &CounterKey,
        expected: &str,
        next: &str,
    ) -> Result<bool, GenerationError> {
        match self.store.compare_and_replace(
            &key.object,
            &key.attribute,
            expected,
            next,
            &key.environment,
        ) {
            Ok(swapped) => Ok(swapped),
            Err(PortError::Unsupported(reason)) if self.mode == CounterMode::Atomic => {
                warn!(key = %key, %reason, "store has no atomic update, using plain replace");
                self.replace(key, next).map(|()| true)
            }
            Err(e) => Err(external(key, e)),
        }
    }
}

fn parse_counter(key: &CounterKey, raw: &str) -> Result<i64, GenerationError> {
    raw.parse::<i64>().map_err(|_| {
        error!(key = %key, value = %raw, "counter value is not an integer");
        GenerationError::InvalidCounterState { key: key.to_string(), value: raw.to_string() }
    })
}

fn external(key: &CounterKey, source: PortError) -> GenerationError {
    error!(key = %key, environment = %key.environment, error = %source, "counter store call failed");
    GenerationError::ExternalService {
        service: Service::CounterStore,
        context: key.to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    use super::*;
    use crate::error::ErrorKind;

    /// Single-value store. `races` makes that many compare-and-replace
    /// calls lose to a simulated concurrent writer.
    struct MemoryCounter {
        value: Mutex<String>,
        atomic: bool,
        races: AtomicU32,
    }

    impl MemoryCounter {
        fn new(value: &str, atomic: bool) -> Self {
            Self { value: Mutex::new(value.into()), atomic, races: AtomicU32::new(0) }
        }

        fn value(&self) -> String {
            self.value.lock().unwrap().clone()
        }
    }

    impl CounterStore for MemoryCounter {
        fn get_attribute_value(&self, _: &str, _: &str, _: &str) -> Result<String, PortError> {
            Ok(self.value())
        }

        fn replace_attribute_value(
            &self,
            _: &str,
            _: &str,
            new_value: &str,
            _: &str,
        ) -> Result<(), PortError> {
            *self.value.lock().unwrap() = new_value.to_string();
            Ok(())
        }

        fn compare_and_replace(
            &self,
            _: &str,
            _: &str,
            expected: &str,
            new_value: &str,
            _: &str,
        ) -> Result<bool, PortError> {
            if !self.atomic {
                return Err(PortError::Unsupported("no atomic update".into()));
            }
            let mut value = self.value.lock().unwrap();
            if self.races.load(Ordering::SeqCst) > 0 {
                self.races.fetch_sub(1, Ordering::SeqCst);
                let bumped: i64 = value.parse().unwrap();
                *value = (bumped + 1).to_string();
                return Ok(false);
            }
            if *value != expected {
                return Ok(false);
            }
            *value = new_value.to_string();
            Ok(true)
        }
    }

    fn key() -> CounterKey {
        CounterKey {
            environment: "corp".into(),
            object: "CN=CID Counter,DC=corp".into(),
            attribute: "employeeNumber".into(),
        }
    }

    #[test]
    fn allocates_next_value_with_prefix() {
        for mode in [CounterMode::Legacy, CounterMode::Atomic, CounterMode::Strict] {
            let store = MemoryCounter::new("100", true);
            let allocator = SequentialCounterAllocator::new(&store, mode, 5);
            assert_eq!(allocator.allocate(&key(), "c").unwrap().identifier, "c101");
            assert_eq!(store.value(), "101");
            assert_eq!(allocator.allocate(&key(), "c").unwrap().identifier, "c102");
            assert_eq!(store.value(), "102");
        }
    }

    #[test]
    fn empty_prefix_uses_default() {
        let store = MemoryCounter::new("7", true);
        let allocator = SequentialCounterAllocator::new(&store, CounterMode::Atomic, 5);
        assert_eq!(allocator.allocate(&key(), "").unwrap().identifier, "c8");
    }

    #[test]
    fn non_numeric_value_is_invalid_state() {
        let store = MemoryCounter::new("abc", true);
        let allocator = SequentialCounterAllocator::new(&store, CounterMode::Atomic, 5);
        let err = allocator.allocate(&key(), "c").unwrap_err();
        assert!(matches!(err, GenerationError::InvalidCounterState { ref value, .. } if value == "abc"));
        assert_eq!(err.kind(), ErrorKind::ExternalService);
        assert_eq!(store.value(), "abc");
    }

    #[test]
    fn overflow_is_invalid_state() {
        let store = MemoryCounter::new(&i64::MAX.to_string(), true);
        let allocator = SequentialCounterAllocator::new(&store, CounterMode::Legacy, 5);
        let err = allocator.allocate(&key(), "c").unwrap_err();
        assert!(matches!(err, GenerationError::InvalidCounterState { .. }));
    }

    #[test]
    fn conflict_rereads_and_skips_taken_value() {
        let store = MemoryCounter::new("100", true);
        store.races.store(1, Ordering::SeqCst);
        let allocator = SequentialCounterAllocator::new(&store, CounterMode::Atomic, 5);
        let allocation = allocator.allocate(&key(), "c").unwrap();
        assert_eq!(allocation.identifier, "c102");
        assert_eq!(allocation.conflicts, 1);
        assert_eq!(store.value(), "102");
    }

    #[test]
    fn persistent_conflicts_fail() {
        let store = MemoryCounter::new("100", true);
        store.races.store(10, Ordering::SeqCst);
        let allocator = SequentialCounterAllocator::new(&store, CounterMode::Strict, 2);
        let err = allocator.allocate(&key(), "c").unwrap_err();
        match err {
            GenerationError::ExternalService { source, .. } => {
                assert_eq!(source, PortError::Conflict { attempts: 3 });
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn atomic_mode_falls_back_when_unsupported() {
        let store = MemoryCounter::new("41", false);
        let allocator = SequentialCounterAllocator::new(&store, CounterMode::Atomic, 5);
        assert_eq!(allocator.allocate(&key(), "x").unwrap().identifier, "x42");
        assert_eq!(store.value(), "42");
    }

    #[test]
    fn strict_mode_requires_atomic_update() {
        let store = MemoryCounter::new("41", false);
        let allocator = SequentialCounterAllocator::new(&store, CounterMode::Strict, 5);
        let err = allocator.allocate(&key(), "c").unwrap_err();
        assert!(matches!(
            err,
            GenerationError::ExternalService { source: PortError::Unsupported(_), .. }
        ));
        assert_eq!(store.value(), "41");
    }
}
