//! Recording adapter for the `CounterStore` port.

use std::sync::{Arc, Mutex};

use serde::Serialize;

use super::record_result;
use crate::cassette::recorder::CassetteRecorder;
use crate::error::PortError;
use crate::ports::CounterStore;

/// Records counter store calls while delegating to an inner store.
pub struct RecordingCounterStore {
    inner: Arc<dyn CounterStore>,
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingCounterStore {
    /// Wraps `inner`, appending every call to `recorder`.
    pub fn new(inner: Arc<dyn CounterStore>, recorder: Arc<Mutex<CassetteRecorder>>) -> Self {
        Self { inner, recorder }
    }
}

/// Recorded arguments of a counter call.
#[derive(Serialize)]
pub(crate) struct CounterInput<'a> {
    pub(crate) object: &'a str,
    pub(crate) attribute: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) expected: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) new_value: Option<&'a str>,
    pub(crate) environment: &'a str,
}

impl CounterStore for RecordingCounterStore {
    fn get_attribute_value(
        &self,
        object: &str,
        attribute: &str,
        environment: &str,
    ) -> Result<String, PortError> {
        let result = self.inner.get_attribute_value(object, attribute, environment);
        let input = CounterInput { object, attribute, expected: None, new_value: None, environment };
        record_result(&self.recorder, "counter", "get_attribute_value", &input, &result);
        result
    }

    fn replace_attribute_value(
        &self,
        object: &str,
        attribute: &str,
        new_value: &str,
        environment: &str,
    ) -> Result<(), PortError> {
        let result = self.inner.replace_attribute_value(object, attribute, new_value, environment);
        let input = CounterInput {
            object,
            attribute,
            expected: None,
            new_value: Some(new_value),
            environment,
        };
        record_result(&self.recorder, "counter", "replace_attribute_value", &input, &result);
        result
    }

    fn compare_and_replace(
        &self,
        object: &str,
        attribute: &str,
        expected: &str,
        new_value: &str,
        environment: &str,
    ) -> Result<bool, PortError> {
        let result =
            self.inner.compare_and_replace(object, attribute, expected, new_value, environment);
        let input = CounterInput {
            object,
            attribute,
            expected: Some(expected),
            new_value: Some(new_value),
            environment,
        };
        record_result(&self.recorder, "counter", "compare_and_replace", &input, &result);
        result
    }
}
