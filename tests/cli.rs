//! Integration tests for top-level CLI behavior.

use std::path::{Path, PathBuf};
use std::process::Command;

use idmint::config::KNOWN_OPTIONS;

const STORE: &str = r#"
environments:
  corp:
    entries:
      - dn: CN=jdoe,OU=Users,DC=corp
        attributes:
          objectClass: [user]
          sAMAccountName: [DOEJ]
      - dn: CN=CID Counter,OU=System,DC=corp
        attributes:
          employeeNumber: ["100"]
"#;

/// Scratch directory holding a directory store and a config file.
struct Fixture {
    dir: tempfile::TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let store = dir.path().join("directory.yaml");
        std::fs::write(&store, STORE).unwrap();
        let config = format!(
            "EMAIL_DOMAIN: corp.example\n\
             LDAP_ENVIRONMENT: corp\n\
             LDAP_USERID: sAMAccountName\n\
             LDAP_COUNTER_ENVIRONMENT: corp\n\
             LDAP_COUNTER_OBJECT: \"CN=CID Counter,OU=System,DC=corp\"\n\
             LDAP_COUNTER_ATTRIBUTE: employeeNumber\n\
             CALL_TIMEOUT_MS: 0\n\
             DIRECTORY_STORE: {}\n",
            store.display()
        );
        std::fs::write(dir.path().join("idmint.yaml"), config).unwrap();
        Self { dir }
    }

    fn config(&self) -> PathBuf {
        self.dir.path().join("idmint.yaml")
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

fn idmint(args: &[&str], env: &[(&str, &Path)]) -> std::process::Output {
    let bin = env!("CARGO_BIN_EXE_idmint");
    let mut command = Command::new(bin);
    // Keep the caller's environment from leaking configuration in.
    for key in KNOWN_OPTIONS.iter().chain(&["IDMINT_RECORD", "IDMINT_REPLAY", "RUST_LOG"]) {
        command.env_remove(key);
    }
    for (key, value) in env {
        command.env(key, value);
    }
    command.args(args).output().expect("failed to run idmint binary")
}

fn stdout(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn normalize_strips_suffix_and_punctuation() {
    let output = idmint(&["normalize", "--last", "O'Brien III"], &[]);
    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), "OBRIEN");
}

#[test]
fn candidates_lists_sequence_without_configuration() {
    let output = idmint(&["candidates", "--first", "John", "--last", "Doe-Smith"], &[]);
    let out = stdout(&output);
    assert!(output.status.success());
    assert!(out.contains("DOESMITH"));
    assert!(out.contains("DOESMITHJ"));
    assert!(out.contains("DOESMITHJO"));
}

#[test]
fn lanid_skips_taken_candidate() {
    let fx = Fixture::new();
    let config = fx.config();
    let output = idmint(
        &["lanid", "--config", config.to_str().unwrap(), "--first", "John", "--last", "Doe"],
        &[],
    );
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("eTCustomField02: DOEJO"));
    assert!(out.contains("DOEJO@corp.example"));
}

#[test]
fn cid_allocations_are_sequential() {
    let fx = Fixture::new();
    let config = fx.config();
    let args = ["cid", "--config", config.to_str().unwrap(), "--first", "Ann", "--last", "Lee"];

    let first = idmint(&args, &[]);
    assert!(first.status.success(), "stderr: {}", stderr(&first));
    assert!(stdout(&first).contains("eTCustomField01: c101"));

    let second = idmint(&args, &[]);
    assert!(stdout(&second).contains("eTCustomField01: c102"));
}

#[test]
fn lanid_without_configuration_fails() {
    let output = idmint(&["lanid", "--first", "John", "--last", "Doe"], &[]);
    assert!(!output.status.success());
    let err = stderr(&output);
    assert!(err.contains("error[configuration]"));
    assert!(err.contains("LANID generation is not configured properly"));
}

#[test]
fn override_is_left_untouched() {
    let fx = Fixture::new();
    let config = fx.config();
    let output = idmint(
        &[
            "lanid",
            "--config",
            config.to_str().unwrap(),
            "--first",
            "John",
            "--last",
            "Doe",
            "--set",
            "eTCustomField02=JDOE7",
        ],
        &[],
    );
    assert!(output.status.success());
    assert!(stderr(&output).contains("already set"));
    assert!(stdout(&output).contains("eTCustomField02: JDOE7"));
}

#[test]
fn fullname_uses_template() {
    let output =
        idmint(&["fullname", "--first", "John", "--middle", "Jacob", "--last", "Smith"], &[]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("Smith, John"));
}

#[test]
fn recorded_session_replays_without_the_store() {
    let fx = Fixture::new();
    let config = fx.config();
    let cassette = fx.path("cid.cassette.yaml");
    let args = ["cid", "--config", config.to_str().unwrap(), "--first", "Ann", "--last", "Lee"];

    let recorded = idmint(&args, &[("IDMINT_RECORD", cassette.as_path())]);
    assert!(recorded.status.success(), "stderr: {}", stderr(&recorded));
    assert!(cassette.exists());

    // Replay never touches the store.
    std::fs::remove_file(fx.path("directory.yaml")).unwrap();
    let replayed = idmint(&args, &[("IDMINT_REPLAY", cassette.as_path())]);
    assert!(replayed.status.success(), "stderr: {}", stderr(&replayed));
    assert!(stdout(&replayed).contains("eTCustomField01: c101"));
}

#[test]
fn unknown_subcommand_fails() {
    let output = idmint(&["unknown"], &[]);
    assert!(!output.status.success());
}
