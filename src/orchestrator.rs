//! Per-identity generation policy.
//!
//! Each operation checks the override attributes, resolves its settings,
//! runs the generator and commits every output attribute or none of them.

use std::sync::Arc;

use tracing::{debug, error, info, info_span, warn};
use uuid::Uuid;

use crate::adapters::DirectoryOracle;
use crate::config::GeneratorConfig;
use crate::counter::SequentialCounterAllocator;
use crate::error::{GenerationError, Operation, Service};
use crate::fullname::{format_full_name, needs_full_name};
use crate::naming::{CandidateGenerator, NameParts, RetryController, RetryFailure};
use crate::ports::{CounterStore, DirectoryClient, IdentityRecordStore};

/// What an operation did to the record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// Attributes written, as `(name, value)` in write order.
    Generated(Vec<(String, String)>),
    /// An override was already present; nothing was touched.
    Skipped {
        /// Attribute holding the override.
        attribute: String,
        /// The override value.
        value: String,
    },
}

impl GenerationOutcome {
    /// Value written to `attribute`, if any.
    #[must_use]
    pub fn written(&self, attribute: &str) -> Option<&str> {
        match self {
            Self::Generated(values) => {
                values.iter().find(|(name, _)| name == attribute).map(|(_, v)| v.as_str())
            }
            Self::Skipped { .. } => None,
        }
    }
}

/// Runs LANID, CID and full-name generation against one identity record.
pub struct GenerationOrchestrator<'a> {
    config: &'a GeneratorConfig,
    directory: Arc<dyn DirectoryClient>,
    counter: Arc<dyn CounterStore>,
}

impl<'a> GenerationOrchestrator<'a> {
    /// Creates an orchestrator over the given ports.
    #[must_use]
    pub fn new(
        config: &'a GeneratorConfig,
        directory: Arc<dyn DirectoryClient>,
        counter: Arc<dyn CounterStore>,
    ) -> Self {
        Self { config, directory, counter }
    }

    /// Generates a unique LANID and its email address.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::Configuration`] before any directory call
    /// when settings are missing, [`GenerationError::CandidatesExhausted`]
    /// when every candidate is taken, and
    /// [`GenerationError::ExternalService`] when the directory or the record
    /// fails.
    pub fn generate_lanid(
        &self,
        record: &mut dyn IdentityRecordStore,
    ) -> Result<GenerationOutcome, GenerationError> {
        let span = info_span!("generate", op = Operation::Lanid.label(), op_id = %Uuid::new_v4());
        let _guard = span.enter();
        let attrs = &self.config.attributes;

        for attribute in [&attrs.lanid, &attrs.email] {
            let value = record.read(attribute);
            if !value.is_empty() {
                info!(attribute = %attribute, value = %value, "override present, skipping");
                return Ok(GenerationOutcome::Skipped { attribute: attribute.clone(), value });
            }
        }

        let target = self
            .config
            .lanid
            .resolve()
            .inspect_err(|e| warn!(error = %e, "LANID settings incomplete"))?;
        let name = read_name(self.config, record);
        debug!(first = %name.first, middle = %name.middle, last = %name.last, "read name");

        let generator = CandidateGenerator::new(name.normalize(), self.config.lanid.padding);
        let oracle = DirectoryOracle::new(Arc::clone(&self.directory), &target);
        let accepted = match RetryController::new(&generator).run(&oracle) {
            Ok(attempt) => attempt,
            Err(RetryFailure::Exhausted { checks }) => {
                warn!(checks, "every candidate is taken");
                return Err(GenerationError::CandidatesExhausted { attempts: checks });
            }
            Err(RetryFailure::ServiceFailed { attempt, error }) => {
                error!(
                    environment = %target.environment,
                    candidate = %attempt.candidate,
                    cycle = attempt.cycle,
                    error = %error,
                    "uniqueness check failed"
                );
                return Err(GenerationError::ExternalService {
                    service: Service::Directory,
                    context: format!(
                        "environment={} candidate={}",
                        target.environment, attempt.candidate
                    ),
                    source: error,
                });
            }
        };

        let lanid = accepted.candidate.into_string();
        let email = format!("{lanid}@{}", target.email_domain);
        info!(lanid = %lanid, cycle = accepted.cycle, "accepted LANID");
        commit(record, vec![(attrs.lanid.clone(), lanid), (attrs.email.clone(), email)])
    }

    /// Allocates the next CID and writes it to both CID attributes.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::Configuration`] before any counter call
    /// when settings are missing, [`GenerationError::InvalidCounterState`]
    /// when the stored counter is unusable, and
    /// [`GenerationError::ExternalService`] when the counter store or the
    /// record fails.
    pub fn generate_cid(
        &self,
        record: &mut dyn IdentityRecordStore,
    ) -> Result<GenerationOutcome, GenerationError> {
        let span = info_span!("generate", op = Operation::Cid.label(), op_id = %Uuid::new_v4());
        let _guard = span.enter();
        let attrs = &self.config.attributes;

        for attribute in [&attrs.cid, &attrs.cid_legacy] {
            let value = record.read(attribute);
            if !value.is_empty() {
                info!(attribute = %attribute, value = %value, "override present, skipping");
                return Ok(GenerationOutcome::Skipped { attribute: attribute.clone(), value });
            }
        }

        let key = self
            .config
            .cid
            .resolve()
            .inspect_err(|e| warn!(error = %e, "CID settings incomplete"))?;
        let settings = &self.config.cid;
        let allocator = SequentialCounterAllocator::new(
            self.counter.as_ref(),
            settings.mode,
            settings.conflict_retries,
        );
        let allocation = allocator.allocate(&key, &settings.prefix)?;
        info!(cid = %allocation.identifier, key = %key, "allocated CID");

        let cid = allocation.identifier;
        commit(record, vec![(attrs.cid.clone(), cid.clone()), (attrs.cid_legacy.clone(), cid)])
    }

    /// Formats the display name unless one is already set.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::ExternalService`] when the record refuses
    /// the write.
    pub fn format_full_name(
        &self,
        record: &mut dyn IdentityRecordStore,
    ) -> Result<GenerationOutcome, GenerationError> {
        let span =
            info_span!("generate", op = Operation::FullName.label(), op_id = %Uuid::new_v4());
        let _guard = span.enter();
        let attribute = &self.config.attributes.full_name;

        let existing = record.read(attribute);
        if !needs_full_name(&existing) {
            info!(attribute = %attribute, value = %existing, "full name already set, skipping");
            return Ok(GenerationOutcome::Skipped { attribute: attribute.clone(), value: existing });
        }

        let full_name = format_full_name(&self.config.fullname, &read_name(self.config, record));
        info!(full_name = %full_name, "formatted full name");
        commit(record, vec![(attribute.clone(), full_name)])
    }
}

fn read_name(config: &GeneratorConfig, record: &dyn IdentityRecordStore) -> NameParts {
    let attrs = &config.attributes;
    NameParts {
        first: record.read(&attrs.first_name),
        middle: record.read(&attrs.middle_name),
        last: record.read(&attrs.last_name),
    }
}

/// Writes `values` in order. If a write fails, the attributes already
/// written get their previous values back.
///
/// The record store has no removal, so an attribute that was absent before
/// the commit is left present and empty after a rollback.
fn commit(
    record: &mut dyn IdentityRecordStore,
    values: Vec<(String, String)>,
) -> Result<GenerationOutcome, GenerationError> {
    let mut written: Vec<(&str, Option<String>)> = Vec::new();

    for (name, value) in &values {
        let previous = record.has_attribute(name).then(|| record.get_attribute(name)).flatten();
        if let Err(source) = record.set_attribute(name, value) {
            error!(attribute = %name, error = %source, "attribute write failed");
            rollback(record, &written);
            return Err(GenerationError::ExternalService {
                service: Service::IdentityRecord,
                context: format!("attribute={name}"),
                source,
            });
        }
        written.push((name.as_str(), previous));
    }

    debug!(count = values.len(), "committed attributes");
    Ok(GenerationOutcome::Generated(values))
}

fn rollback(record: &mut dyn IdentityRecordStore, written: &[(&str, Option<String>)]) {
    for (name, previous) in written.iter().rev() {
        let restored = previous.as_deref().unwrap_or_default();
        warn!(attribute = %name, "rolling back attribute");
        if let Err(e) = record.set_attribute(name, restored) {
            error!(attribute = %name, error = %e, "rollback failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::adapters::live::{AttributeRecord, DirectoryStore, Environment, LocalDirectory};
    use crate::error::{ErrorKind, PortError};
    use crate::ports::DirectoryEntry;

    const COUNTER_DN: &str = "CN=CID Counter,DC=corp";

    fn config() -> GeneratorConfig {
        let props: BTreeMap<String, String> = [
            ("EMAIL_DOMAIN", "corp.example"),
            ("LDAP_ENVIRONMENT", "corp"),
            ("LDAP_USERID", "sAMAccountName"),
            ("LDAP_COUNTER_ENVIRONMENT", "corp"),
            ("LDAP_COUNTER_OBJECT", COUNTER_DN),
            ("LDAP_COUNTER_ATTRIBUTE", "employeeNumber"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        GeneratorConfig::from_properties(&props).unwrap()
    }

    fn user(id: &str) -> DirectoryEntry {
        DirectoryEntry {
            dn: format!("CN={id},DC=corp"),
            attributes: BTreeMap::from([
                ("objectClass".to_string(), vec!["user".to_string()]),
                ("sAMAccountName".to_string(), vec![id.to_string()]),
            ]),
        }
    }

    fn directory(taken: &[&str]) -> Arc<LocalDirectory> {
        let mut entries: Vec<DirectoryEntry> = taken.iter().map(|id| user(id)).collect();
        entries.push(DirectoryEntry {
            dn: COUNTER_DN.into(),
            attributes: BTreeMap::from([("employeeNumber".to_string(), vec!["100".to_string()])]),
        });
        let store = DirectoryStore {
            environments: BTreeMap::from([("corp".to_string(), Environment { entries })]),
        };
        Arc::new(LocalDirectory::in_memory(store))
    }

    fn orchestrator<'a>(
        config: &'a GeneratorConfig,
        dir: &Arc<LocalDirectory>,
    ) -> GenerationOrchestrator<'a> {
        GenerationOrchestrator::new(config, dir.clone(), dir.clone())
    }

    fn john_doe() -> AttributeRecord {
        AttributeRecord::from_pairs([("%FIRST_NAME%", "John"), ("%LAST_NAME%", "Doe")])
    }

    /// Record that refuses writes to one attribute.
    struct FailingRecord {
        inner: AttributeRecord,
        refuse: &'static str,
    }

    impl IdentityRecordStore for FailingRecord {
        fn has_attribute(&self, name: &str) -> bool {
            self.inner.has_attribute(name)
        }

        fn get_attribute(&self, name: &str) -> Option<String> {
            self.inner.get_attribute(name)
        }

        fn set_attribute(&mut self, name: &str, value: &str) -> Result<(), PortError> {
            if name == self.refuse {
                return Err(PortError::Rejected(format!("{name} is read-only")));
            }
            self.inner.set_attribute(name, value)
        }
    }

    #[test]
    fn lanid_takes_first_free_candidate() {
        let config = config();
        let dir = directory(&["DOEJ"]);
        let mut record = john_doe();
        let outcome = orchestrator(&config, &dir).generate_lanid(&mut record).unwrap();
        assert_eq!(outcome.written("eTCustomField02"), Some("DOEJO"));
        assert_eq!(record.read("eTCustomField02"), "DOEJO");
        assert_eq!(record.read("%EMAIL%"), "DOEJO@corp.example");
    }

    #[test]
    fn email_override_skips_lanid() {
        let config = config();
        let dir = directory(&[]);
        let mut record = john_doe();
        record.set_attribute("%EMAIL%", "jd@corp.example").unwrap();
        let outcome = orchestrator(&config, &dir).generate_lanid(&mut record).unwrap();
        assert!(matches!(outcome, GenerationOutcome::Skipped { ref attribute, .. } if attribute == "%EMAIL%"));
        assert!(!record.has_attribute("eTCustomField02"));
    }

    #[test]
    fn missing_settings_fail_before_any_query() {
        let config = GeneratorConfig::default();
        let dir = directory(&[]);
        let mut record = john_doe();
        let err = orchestrator(&config, &dir).generate_lanid(&mut record).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        let err = orchestrator(&config, &dir).generate_cid(&mut record).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn directory_failure_is_external() {
        let mut config = config();
        config.lanid.environment = Some("lab".into());
        let dir = directory(&[]);
        let mut record = john_doe();
        let err = orchestrator(&config, &dir).generate_lanid(&mut record).unwrap_err();
        assert!(matches!(err, GenerationError::ExternalService { service: Service::Directory, .. }));
        assert!(record.read("eTCustomField02").is_empty());
    }

    #[test]
    fn cid_writes_both_attributes() {
        let config = config();
        let dir = directory(&[]);
        let mut record = john_doe();
        orchestrator(&config, &dir).generate_cid(&mut record).unwrap();
        assert_eq!(record.read("eTCustomField01"), "c101");
        assert_eq!(record.read("%USER_ID%"), "c101");
        assert_eq!(dir.get_attribute_value(COUNTER_DN, "employeeNumber", "corp").unwrap(), "101");
    }

    #[test]
    fn failed_second_write_rolls_back_first() {
        let config = config();
        let dir = directory(&[]);
        let mut record = FailingRecord { inner: john_doe(), refuse: "%EMAIL%" };
        let err = orchestrator(&config, &dir).generate_lanid(&mut record).unwrap_err();
        assert!(matches!(
            err,
            GenerationError::ExternalService { service: Service::IdentityRecord, .. }
        ));
        assert!(record.has_attribute("eTCustomField02"));
        assert_eq!(record.get_attribute("eTCustomField02").as_deref(), Some(""));
        assert!(!record.has_attribute("%EMAIL%"));
    }

    #[test]
    fn full_name_replaces_default_only() {
        let config = config();
        let dir = directory(&[]);
        let mut record = john_doe();
        record.set_attribute("%FULL_NAME%", "default").unwrap();
        orchestrator(&config, &dir).format_full_name(&mut record).unwrap();
        assert_eq!(record.read("%FULL_NAME%"), "Doe, John");

        let outcome = orchestrator(&config, &dir).format_full_name(&mut record).unwrap();
        assert!(matches!(outcome, GenerationOutcome::Skipped { .. }));
    }

    #[test]
    fn exhaustion_writes_nothing() {
        let config = config();
        let taken: Vec<String> = CandidateGenerator::new(
            NameParts::new("John", "", "Doe").normalize(),
            config.lanid.padding,
        )
        .attempts()
        .map(|a| a.candidate.into_string())
        .collect();
        let taken: Vec<&str> = taken.iter().map(String::as_str).collect();
        let dir = directory(&taken);
        let mut record = john_doe();
        let err = orchestrator(&config, &dir).generate_lanid(&mut record).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CandidatesExhausted);
        assert!(!record.has_attribute("eTCustomField02"));
        assert!(!record.has_attribute("%EMAIL%"));
    }
}
