//! Uniqueness oracle answered by a directory query.

use std::sync::Arc;

use crate::config::LanidTarget;
use crate::error::PortError;
use crate::naming::Candidate;
use crate::ports::{DirectoryClient, Filter, UniquenessOracle};

/// Treats a candidate as taken when any entry of the configured object
/// class carries it in the user id attribute.
pub struct DirectoryOracle {
    directory: Arc<dyn DirectoryClient>,
    environment: String,
    user_id_attribute: String,
    user_object_class: String,
}

impl DirectoryOracle {
    /// Creates an oracle querying `directory` with the settings in `target`.
    #[must_use]
    pub fn new(directory: Arc<dyn DirectoryClient>, target: &LanidTarget) -> Self {
        Self {
            directory,
            environment: target.environment.clone(),
            user_id_attribute: target.user_id_attribute.clone(),
            user_object_class: target.user_object_class.clone(),
        }
    }

    /// Filter matching accounts that already use `candidate`.
    #[must_use]
    pub fn filter_for(&self, candidate: &Candidate) -> Filter {
        Filter::And(vec![
            Filter::equals("objectClass", &self.user_object_class),
            Filter::equals(&self.user_id_attribute, candidate.as_str()),
        ])
    }
}

impl UniquenessOracle for DirectoryOracle {
    fn exists(&self, candidate: &Candidate) -> Result<bool, PortError> {
        let filter = self.filter_for(candidate);
        let hits = self.directory.query(
            &self.environment,
            &filter,
            std::slice::from_ref(&self.user_id_attribute),
        )?;
        Ok(!hits.is_empty())
    }
}
