//! Identity record port.

use crate::error::PortError;

/// The identity record being created or updated.
///
/// The engine reads name and override inputs from it and writes generated
/// values back. It never owns the record.
pub trait IdentityRecordStore {
    /// Returns `true` if the record carries `name`.
    fn has_attribute(&self, name: &str) -> bool;

    /// Returns the value of `name`, if present.
    fn get_attribute(&self, name: &str) -> Option<String>;

    /// Sets `name` to `value`.
    ///
    /// # Errors
    ///
    /// Returns an error if the record refuses the write.
    fn set_attribute(&mut self, name: &str, value: &str) -> Result<(), PortError>;

    /// Value of `name`, or the empty string when absent.
    fn read(&self, name: &str) -> String {
        if self.has_attribute(name) {
            self.get_attribute(name).unwrap_or_default()
        } else {
            String::new()
        }
    }
}
