//! Generator configuration.
//!
//! Built once from defaults, an optional YAML properties file, and the
//! process environment (a `.env` file is honoured), then passed by reference
//! to every component. Nothing here is mutated after construction.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{GenerationError, Operation};

/// Every option name the loader recognizes.
pub const KNOWN_OPTIONS: &[&str] = &[
    "CID_PREFIX",
    "LDAP_COUNTER_ENVIRONMENT",
    "LDAP_COUNTER_OBJECT",
    "LDAP_COUNTER_ATTRIBUTE",
    "EMAIL_DOMAIN",
    "LDAP_ENVIRONMENT",
    "LDAP_USERID",
    "LDAP_USER_OBJECT_CLASS",
    "DIRECTORY_STORE",
    "CALL_TIMEOUT_MS",
    "CALL_RETRIES",
    "CALL_BACKOFF_MS",
    "COUNTER_MODE",
    "COUNTER_CONFLICT_RETRIES",
    "SHORT_NAME_PADDING",
    "FULLNAME_FORMAT",
    "USE_INITIAL",
    "ATTR_FIRST_NAME",
    "ATTR_MIDDLE_NAME",
    "ATTR_LAST_NAME",
    "ATTR_LANID",
    "ATTR_EMAIL",
    "ATTR_CID",
    "ATTR_CID_LEGACY",
    "ATTR_FULL_NAME",
];

/// Prefix used when `CID_PREFIX` is unset.
pub const DEFAULT_CID_PREFIX: &str = "c";
const DEFAULT_FULLNAME_FORMAT: &str = "<<last>>, <<first>>";

/// How fallback cycles treat a first name shorter than the cycle requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShortNamePadding {
    /// Use every letter of the short first name and nothing more.
    #[default]
    Letters,
    /// Append the decimal shortfall (`JO` at cycle 3 becomes `JO2`),
    /// reproducing legacy output. Candidates may then contain digits.
    LegacyNumeral,
}

/// How the counter allocator writes the incremented value back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CounterMode {
    /// Plain read then replace. Concurrent callers can collide.
    Legacy,
    /// Compare-and-replace; falls back to `Legacy` if the store cannot.
    #[default]
    Atomic,
    /// Compare-and-replace or fail.
    Strict,
}

/// Timeout and transport-level retry policy for collaborator calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallPolicy {
    /// Per-call timeout; `None` waits indefinitely.
    pub timeout: Option<Duration>,
    /// Additional attempts after a transient failure.
    pub retries: u32,
    /// Pause between attempts.
    pub backoff: Duration,
}

impl Default for CallPolicy {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_millis(5000)),
            retries: 2,
            backoff: Duration::from_millis(200),
        }
    }
}

impl CallPolicy {
    /// A policy with no timeout and no retries.
    #[must_use]
    pub fn passthrough() -> Self {
        Self { timeout: None, retries: 0, backoff: Duration::ZERO }
    }
}

/// Names of the identity-record attributes read and written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeNames {
    /// First name input.
    pub first_name: String,
    /// Middle name input.
    pub middle_name: String,
    /// Last name input.
    pub last_name: String,
    /// LANID output.
    pub lanid: String,
    /// Email output derived from the LANID.
    pub email: String,
    /// CID output.
    pub cid: String,
    /// Duplicate CID slot kept for legacy consumers.
    pub cid_legacy: String,
    /// Display-name output.
    pub full_name: String,
}

impl Default for AttributeNames {
    fn default() -> Self {
        Self {
            first_name: "%FIRST_NAME%".into(),
            middle_name: "eTMiddleInitial".into(),
            last_name: "%LAST_NAME%".into(),
            lanid: "eTCustomField02".into(),
            email: "%EMAIL%".into(),
            cid: "eTCustomField01".into(),
            cid_legacy: "%USER_ID%".into(),
            full_name: "%FULL_NAME%".into(),
        }
    }
}

/// LANID path settings as configured; may be incomplete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanidSettings {
    /// Domain appended to the LANID to form the email address.
    pub email_domain: Option<String>,
    /// Directory environment queried for uniqueness.
    pub environment: Option<String>,
    /// Directory attribute holding account identifiers.
    pub user_id_attribute: Option<String>,
    /// Object class constraining the uniqueness filter.
    pub user_object_class: String,
    /// Short first-name handling in fallback cycles.
    pub padding: ShortNamePadding,
}

/// Fully-specified LANID settings, produced by [`LanidSettings::resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanidTarget {
    /// Domain appended to the LANID to form the email address.
    pub email_domain: String,
    /// Directory environment queried for uniqueness.
    pub environment: String,
    /// Directory attribute holding account identifiers.
    pub user_id_attribute: String,
    /// Object class constraining the uniqueness filter.
    pub user_object_class: String,
}

impl LanidSettings {
    /// Checks that every required option is present.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::Configuration`] naming each missing option.
    pub fn resolve(&self) -> Result<LanidTarget, GenerationError> {
        let mut missing = Vec::new();
        if self.email_domain.is_none() {
            missing.push("EMAIL_DOMAIN");
        }
        if self.environment.is_none() {
            missing.push("LDAP_ENVIRONMENT");
        }
        if self.user_id_attribute.is_none() {
            missing.push("LDAP_USERID");
        }
        match (&self.email_domain, &self.environment, &self.user_id_attribute) {
            (Some(domain), Some(env), Some(attr)) => Ok(LanidTarget {
                email_domain: domain.clone(),
                environment: env.clone(),
                user_id_attribute: attr.clone(),
                user_object_class: self.user_object_class.clone(),
            }),
            _ => Err(GenerationError::Configuration { operation: Operation::Lanid, missing }),
        }
    }
}

/// Location of a counter value in the counter store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterKey {
    /// Store environment.
    pub environment: String,
    /// DN of the object carrying the counter.
    pub object: String,
    /// Attribute holding the counter value.
    pub attribute: String,
}

impl std::fmt::Display for CounterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}@{}", self.object, self.attribute, self.environment)
    }
}

/// CID path settings as configured; may be incomplete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CidSettings {
    /// Prefix placed before the number.
    pub prefix: String,
    /// Counter store environment.
    pub environment: Option<String>,
    /// DN of the counter object.
    pub object: Option<String>,
    /// Counter attribute.
    pub attribute: Option<String>,
    /// Write-back strategy.
    pub mode: CounterMode,
    /// Compare-and-replace conflicts tolerated per allocation.
    pub conflict_retries: u32,
}

impl CidSettings {
    /// Checks that every required option is present.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::Configuration`] naming each missing option.
    pub fn resolve(&self) -> Result<CounterKey, GenerationError> {
        let mut missing = Vec::new();
        if self.environment.is_none() {
            missing.push("LDAP_COUNTER_ENVIRONMENT");
        }
        if self.object.is_none() {
            missing.push("LDAP_COUNTER_OBJECT");
        }
        if self.attribute.is_none() {
            missing.push("LDAP_COUNTER_ATTRIBUTE");
        }
        match (&self.environment, &self.object, &self.attribute) {
            (Some(environment), Some(object), Some(attribute)) => Ok(CounterKey {
                environment: environment.clone(),
                object: object.clone(),
                attribute: attribute.clone(),
            }),
            _ => Err(GenerationError::Configuration { operation: Operation::Cid, missing }),
        }
    }
}

/// Display-name formatting settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FullNameSettings {
    /// Template with `<<first>>`, `<<middle>>`, `<<last>>` placeholders.
    pub format: String,
    /// Reduce the middle name to its initial.
    pub use_initial: bool,
}

/// Immutable configuration shared by every generation component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// LANID path.
    pub lanid: LanidSettings,
    /// CID path.
    pub cid: CidSettings,
    /// Full-name formatting.
    pub fullname: FullNameSettings,
    /// Record attribute names.
    pub attributes: AttributeNames,
    /// Collaborator call policy.
    pub call_policy: CallPolicy,
    /// Local directory store backing the live adapters.
    pub directory_store: Option<PathBuf>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self::from_properties(&BTreeMap::new()).expect("empty properties always parse")
    }
}

impl GeneratorConfig {
    /// Builds a configuration from a flat option map.
    ///
    /// Values are trimmed and empty values are treated as absent.
    ///
    /// # Errors
    ///
    /// Returns an error string when a numeric or enumerated option cannot be
    /// parsed.
    pub fn from_properties(props: &BTreeMap<String, String>) -> Result<Self, String> {
        let get = |key: &str| -> Option<String> {
            props.get(key).map(|v| v.trim()).filter(|v| !v.is_empty()).map(str::to_string)
        };
        let get_or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let defaults = AttributeNames::default();
        let attributes = AttributeNames {
            first_name: get_or("ATTR_FIRST_NAME", &defaults.first_name),
            middle_name: get_or("ATTR_MIDDLE_NAME", &defaults.middle_name),
            last_name: get_or("ATTR_LAST_NAME", &defaults.last_name),
            lanid: get_or("ATTR_LANID", &defaults.lanid),
            email: get_or("ATTR_EMAIL", &defaults.email),
            cid: get_or("ATTR_CID", &defaults.cid),
            cid_legacy: get_or("ATTR_CID_LEGACY", &defaults.cid_legacy),
            full_name: get_or("ATTR_FULL_NAME", &defaults.full_name),
        };

        let padding = match get("SHORT_NAME_PADDING").as_deref() {
            None => ShortNamePadding::default(),
            Some(v) => parse_padding(v)?,
        };
        let mode = match get("COUNTER_MODE").as_deref() {
            None => CounterMode::default(),
            Some(v) => parse_counter_mode(v)?,
        };

        let policy_defaults = CallPolicy::default();
        let timeout_ms = parse_number(get("CALL_TIMEOUT_MS"), "CALL_TIMEOUT_MS")?;
        let call_policy = CallPolicy {
            timeout: match timeout_ms {
                None => policy_defaults.timeout,
                Some(0) => None,
                Some(ms) => Some(Duration::from_millis(ms)),
            },
            retries: parse_number(get("CALL_RETRIES"), "CALL_RETRIES")?
                .map_or(Ok(policy_defaults.retries), u32::try_from)
                .map_err(|e| format!("CALL_RETRIES: {e}"))?,
            backoff: parse_number(get("CALL_BACKOFF_MS"), "CALL_BACKOFF_MS")?
                .map_or(policy_defaults.backoff, Duration::from_millis),
        };

        let conflict_retries =
            parse_number(get("COUNTER_CONFLICT_RETRIES"), "COUNTER_CONFLICT_RETRIES")?
                .map_or(Ok(5), u32::try_from)
                .map_err(|e| format!("COUNTER_CONFLICT_RETRIES: {e}"))?;

        let use_initial = match get("USE_INITIAL").as_deref() {
            None => false,
            Some(v) => v.eq_ignore_ascii_case("true"),
        };

        Ok(Self {
            lanid: LanidSettings {
                email_domain: get("EMAIL_DOMAIN"),
                environment: get("LDAP_ENVIRONMENT"),
                user_id_attribute: get("LDAP_USERID"),
                user_object_class: get_or("LDAP_USER_OBJECT_CLASS", "user"),
                padding,
            },
            cid: CidSettings {
                prefix: get_or("CID_PREFIX", DEFAULT_CID_PREFIX),
                environment: get("LDAP_COUNTER_ENVIRONMENT"),
                object: get("LDAP_COUNTER_OBJECT"),
                attribute: get("LDAP_COUNTER_ATTRIBUTE"),
                mode,
                conflict_retries,
            },
            fullname: FullNameSettings {
                format: get_or("FULLNAME_FORMAT", DEFAULT_FULLNAME_FORMAT),
                use_initial,
            },
            attributes,
            call_policy,
            directory_store: get("DIRECTORY_STORE").map(PathBuf::from),
        })
    }

    /// Loads configuration from an optional YAML properties file and the
    /// process environment. Environment variables win over file values.
    ///
    /// # Errors
    ///
    /// Returns an error string if the file cannot be read or parsed, or if an
    /// option value is invalid.
    pub fn load(path: Option<&Path>) -> Result<Self, String> {
        // A missing .env file is not an error.
        let _ = dotenvy::dotenv();

        let mut props = match path {
            Some(path) => read_properties_file(path)?,
            None => BTreeMap::new(),
        };
        for key in KNOWN_OPTIONS {
            if let Ok(value) = std::env::var(key) {
                props.insert((*key).to_string(), value);
            }
        }
        Self::from_properties(&props)
    }
}

/// Reads a flat YAML map of option names to scalar values.
///
/// # Errors
///
/// Returns an error string if the file is unreadable, is not a map, or holds
/// a non-scalar value.
pub fn read_properties_file(path: &Path) -> Result<BTreeMap<String, String>, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config file {}: {e}", path.display()))?;
    let raw: BTreeMap<String, serde_yaml::Value> = serde_yaml::from_str(&content)
        .map_err(|e| format!("Failed to parse config file {}: {e}", path.display()))?;

    let mut props = BTreeMap::new();
    for (key, value) in raw {
        let text = match value {
            serde_yaml::Value::Null => String::new(),
            serde_yaml::Value::Bool(b) => b.to_string(),
            serde_yaml::Value::Number(n) => n.to_string(),
            serde_yaml::Value::String(s) => s,
            _ => return Err(format!("Config option {key} must be a scalar value")),
        };
        if !KNOWN_OPTIONS.contains(&key.as_str()) {
            tracing::warn!(option = %key, "ignoring unknown config option");
            continue;
        }
        props.insert(key, text);
    }
    Ok(props)
}

fn parse_number(value: Option<String>, key: &str) -> Result<Option<u64>, String> {
    value.map(|v| v.parse::<u64>().map_err(|e| format!("{key}: invalid number {v:?}: {e}"))).transpose()
}

fn parse_padding(value: &str) -> Result<ShortNamePadding, String> {
    match value.to_ascii_lowercase().as_str() {
        "letters" => Ok(ShortNamePadding::Letters),
        "legacy-numeral" | "legacy" => Ok(ShortNamePadding::LegacyNumeral),
        other => Err(format!("SHORT_NAME_PADDING: unknown value {other:?}")),
    }
}

fn parse_counter_mode(value: &str) -> Result<CounterMode, String> {
    match value.to_ascii_lowercase().as_str() {
        "legacy" => Ok(CounterMode::Legacy),
        "atomic" => Ok(CounterMode::Atomic),
        "strict" => Ok(CounterMode::Strict),
        other => Err(format!("COUNTER_MODE: unknown value {other:?}")),
    }
}
