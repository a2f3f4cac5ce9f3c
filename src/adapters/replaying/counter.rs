//! Replaying adapter for the `CounterStore` port.

use std::sync::{Arc, Mutex};

use super::{next_output, replay_result};
use crate::adapters::recording::counter::CounterInput;
use crate::cassette::replayer::CassetteReplayer;
use crate::error::PortError;
use crate::ports::CounterStore;

/// Serves recorded counter store results.
pub struct ReplayingCounterStore {
    replayer: Arc<Mutex<CassetteReplayer>>,
}

impl ReplayingCounterStore {
    /// Creates a replaying counter store backed by `replayer`.
    #[must_use]
    pub fn new(replayer: Arc<Mutex<CassetteReplayer>>) -> Self {
        Self { replayer }
    }

    fn replay<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        input: &CounterInput<'_>,
    ) -> Result<T, PortError> {
        let input = serde_json::to_value(input).expect("counter input serializes");
        replay_result(next_output(&self.replayer, "counter", method, &input))
    }
}

impl CounterStore for ReplayingCounterStore {
    fn get_attribute_value(
        &self,
        object: &str,
        attribute: &str,
        environment: &str,
    ) -> Result<String, PortError> {
        let input = CounterInput { object, attribute, expected: None, new_value: None, environment };
        self.replay("get_attribute_value", &input)
    }

    fn replace_attribute_value(
        &self,
        object: &str,
        attribute: &str,
        new_value: &str,
        environment: &str,
    ) -> Result<(), PortError> {
        let input = CounterInput {
            object,
            attribute,
            expected: None,
            new_value: Some(new_value),
            environment,
        };
        self.replay("replace_attribute_value", &input)
    }

    fn compare_and_replace(
        &self,
        object: &str,
        attribute: &str,
        expected: &str,
        new_value: &str,
        environment: &str,
    ) -> Result<bool, PortError> {
        let input = CounterInput {
            object,
            attribute,
            expected: Some(expected),
            new_value: Some(new_value),
            environment,
        };
        self.replay("compare_and_replace", &input)
    }
}
