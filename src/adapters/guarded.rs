//! Timeout and transport-retry decorators for collaborator ports.
//!
//! Reads retry on any transient failure. Writes retry only when the service
//! was unreachable, since a timed-out write may already have landed.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::warn;

use crate::config::CallPolicy;
use crate::error::PortError;
use crate::ports::{CounterStore, DirectoryClient, DirectoryEntry, Filter};

/// Whether a call may be repeated after a timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Idempotence {
    Read,
    Write,
}

fn should_retry(error: &PortError, kind: Idempotence) -> bool {
    match error {
        PortError::Unavailable(_) => true,
        PortError::Timeout { .. } => kind == Idempotence::Read,
        _ => false,
    }
}

fn call_with_policy<T, F>(
    policy: &CallPolicy,
    operation: &'static str,
    kind: Idempotence,
    call: F,
) -> Result<T, PortError>
where
    T: Send + 'static,
    F: Fn() -> Result<T, PortError> + Send + Sync + 'static,
{
    let call = Arc::new(call);
    let mut attempt = 0u32;
    loop {
        match run_once(policy.timeout, Arc::clone(&call)) {
            Ok(value) => return Ok(value),
            Err(error) if attempt < policy.retries && should_retry(&error, kind) => {
                attempt += 1;
                warn!(operation, attempt, %error, "transient failure, retrying");
                thread::sleep(policy.backoff);
            }
            Err(error) => return Err(error),
        }
    }
}

fn run_once<T, F>(timeout: Option<Duration>, call: Arc<F>) -> Result<T, PortError>
where
    T: Send + 'static,
    F: Fn() -> Result<T, PortError> + Send + Sync + 'static,
{
    let Some(timeout) = timeout else {
        return call();
    };

    let (tx, rx) = mpsc::channel();
    thread::Builder::new()
        .name("idmint-call".into())
        .spawn(move || {
            // The receiver is gone if the caller already timed out.
            let _ = tx.send(call());
        })
        .map_err(|e| PortError::Unavailable(format!("failed to spawn call thread: {e}")))?;

    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => Err(PortError::timeout(timeout)),
        Err(RecvTimeoutError::Disconnected) => {
            Err(PortError::Unavailable("call aborted without a result".into()))
        }
    }
}

/// Directory client with timeout and retry applied to every query.
pub struct GuardedDirectory {
    inner: Arc<dyn DirectoryClient>,
    policy: CallPolicy,
}

impl GuardedDirectory {
    /// Wraps `inner` with `policy`.
    #[must_use]
    pub fn new(inner: Arc<dyn DirectoryClient>, policy: CallPolicy) -> Self {
        Self { inner, policy }
    }
}

impl DirectoryClient for GuardedDirectory {
    fn query(
        &self,
        environment: &str,
        filter: &Filter,
        attributes: &[String],
    ) -> Result<Vec<DirectoryEntry>, PortError> {
        let inner = Arc::clone(&self.inner);
        let environment = environment.to_string();
        let filter = filter.clone();
        let attributes = attributes.to_vec();
        call_with_policy(&self.policy, "directory.query", Idempotence::Read, move || {
            inner.query(&environment, &filter, &attributes)
        })
    }
}

/// Counter store with timeout and retry applied to every call.
pub struct GuardedCounterStore {
    inner: Arc<dyn CounterStore>,
    policy: CallPolicy,
}

impl GuardedCounterStore {
    /// Wraps `inner` with `policy`.
    #[must_use]
    pub fn new(inner: Arc<dyn CounterStore>, policy: CallPolicy) -> Self {
        Self { inner, policy }
    }
}

impl CounterStore for GuardedCounterStore {
    fn get_attribute_value(
        &self,
        object: &str,
        attribute: &str,
        environment: &str,
    ) -> Result<String, PortError> {
        let inner = Arc::clone(&self.inner);
        let (object, attribute, environment) =
            (object.to_string(), attribute.to_string(), environment.to_string());
        call_with_policy(&self.policy, "counter.get", Idempotence::Read, move || {
            inner.get_attribute_value(&object, &attribute, &environment)
        })
    }

    fn replace_attribute_value(
        &self,
        object: &str,
        attribute: &str,
        new_value: &str,
        environment: &str,
    ) -> Result<(), PortError> {
        let inner = Arc::clone(&self.inner);
        let (object, attribute, new_value, environment) = (
            object.to_string(),
            attribute.to_string(),
            new_value.to_string(),
            environment.to_string(),
        );
        call_with_policy(&self.policy, "counter.replace", Idempotence::Write, move || {
            inner.replace_attribute_value(&object, &attribute, &new_value, &environment)
        })
    }

    fn compare_and_replace(
        &self,
        object: &str,
        attribute: &str,
        expected: &str,
        new_value: &str,
        environment: &str,
    ) -> Result<bool, PortError> {
        let inner = Arc::clone(&self.inner);
        let (object, attribute, expected, new_value, environment) = (
            object.to_string(),
            attribute.to_string(),
            expected.to_string(),
            new_value.to_string(),
            environment.to_string(),
        );
        call_with_policy(&self.policy, "counter.compare_and_replace", Idempotence::Write, move || {
            inner.compare_and_replace(&object, &attribute, &expected, &new_value, &environment)
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    /// Directory that fails a fixed number of times before answering.
    struct Flaky {
        failures: u32,
        calls: AtomicU32,
        error: PortError,
        delay: Duration,
    }

    impl Flaky {
        fn new(failures: u32, error: PortError) -> Self {
            Self { failures, calls: AtomicU32::new(0), error, delay: Duration::ZERO }
        }
    }

    impl DirectoryClient for Flaky {
        fn query(
            &self,
            _environment: &str,
            _filter: &Filter,
            _attributes: &[String],
        ) -> Result<Vec<DirectoryEntry>, PortError> {
            thread::sleep(self.delay);
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                Err(self.error.clone())
            } else {
                Ok(Vec::new())
            }
        }
    }

    impl CounterStore for Flaky {
        fn get_attribute_value(&self, _: &str, _: &str, _: &str) -> Result<String, PortError> {
            Ok("1".into())
        }

        fn replace_attribute_value(
            &self,
            _: &str,
            _: &str,
            _: &str,
            _: &str,
        ) -> Result<(), PortError> {
            thread::sleep(self.delay);
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(self.error.clone())
        }
    }

    fn policy(retries: u32, timeout_ms: Option<u64>) -> CallPolicy {
        CallPolicy {
            timeout: timeout_ms.map(Duration::from_millis),
            retries,
            backoff: Duration::from_millis(1),
        }
    }

    #[test]
    fn retries_unavailable_until_success() {
        let inner = Arc::new(Flaky::new(2, PortError::Unavailable("refused".into())));
        let guarded = GuardedDirectory::new(inner.clone(), policy(2, None));
        assert!(guarded.query("corp", &Filter::equals("cn", "x"), &[]).is_ok());
        assert_eq!(inner.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn gives_up_after_configured_retries() {
        let inner = Arc::new(Flaky::new(5, PortError::Unavailable("refused".into())));
        let guarded = GuardedDirectory::new(inner.clone(), policy(1, None));
        let err = guarded.query("corp", &Filter::equals("cn", "x"), &[]).unwrap_err();
        assert!(matches!(err, PortError::Unavailable(_)));
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn rejected_is_not_retried() {
        let inner = Arc::new(Flaky::new(5, PortError::Rejected("bad filter".into())));
        let guarded = GuardedDirectory::new(inner.clone(), policy(3, None));
        assert!(guarded.query("corp", &Filter::equals("cn", "x"), &[]).is_err());
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn slow_query_times_out() {
        let mut flaky = Flaky::new(0, PortError::Unavailable(String::new()));
        flaky.delay = Duration::from_millis(300);
        let guarded = GuardedDirectory::new(Arc::new(flaky), policy(0, Some(20)));
        let err = guarded.query("corp", &Filter::equals("cn", "x"), &[]).unwrap_err();
        assert_eq!(err, PortError::Timeout { after_ms: 20 });
    }

    #[test]
    fn timed_out_write_is_not_repeated() {
        let mut flaky = Flaky::new(0, PortError::Rejected("late".into()));
        flaky.delay = Duration::from_millis(300);
        let inner = Arc::new(flaky);
        let guarded = GuardedCounterStore::new(inner.clone(), policy(3, Some(20)));
        let err = guarded.replace_attribute_value("CN=c", "n", "2", "corp").unwrap_err();
        assert!(matches!(err, PortError::Timeout { .. }));
        // Only the first attempt was dispatched.
        thread::sleep(Duration::from_millis(400));
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unsupported_compare_and_replace_passes_through() {
        let inner = Arc::new(Flaky::new(0, PortError::Rejected(String::new())));
        let guarded = GuardedCounterStore::new(inner, policy(3, Some(500)));
        let err = guarded.compare_and_replace("CN=c", "n", "1", "2", "corp").unwrap_err();
        assert!(matches!(err, PortError::Unsupported(_)));
    }
}
