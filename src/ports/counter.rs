//! Counter store port for sequential identifier allocation.

use crate::error::PortError;

/// Holds named counter values as attributes of directory objects.
pub trait CounterStore: Send + Sync {
    /// Reads the current value of `attribute` on `object`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unreachable or the value is absent.
    fn get_attribute_value(
        &self,
        object: &str,
        attribute: &str,
        environment: &str,
    ) -> Result<String, PortError>;

    /// Unconditionally replaces the value of `attribute` on `object`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unreachable or refuses the write.
    fn replace_attribute_value(
        &self,
        object: &str,
        attribute: &str,
        new_value: &str,
        environment: &str,
    ) -> Result<(), PortError>;

    /// Replaces the value only if it still equals `expected`.
    ///
    /// Returns `Ok(false)` when another writer changed the value first.
    /// Stores without an atomic update keep the default, which reports
    /// [`PortError::Unsupported`].
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unreachable or lacks the operation.
    fn compare_and_replace(
        &self,
        object: &str,
        attribute: &str,
        expected: &str,
        new_value: &str,
        environment: &str,
    ) -> Result<bool, PortError> {
        let _ = (object, attribute, expected, new_value, environment);
        Err(PortError::Unsupported("compare_and_replace".into()))
    }
}
