use std::path::PathBuf;

use parley_core::config::*;
use parley_core::errors::ConfigError;

#[test]
fn config_loads_from_empty_toml_with_all_defaults() {
    let config = ParleyConfig::from_toml("").unwrap();

    // Session defaults
    assert_eq!(config.session.max_turns, 20);
    assert_eq!(config.session.max_duration_ms, 600_000);
    assert_eq!(config.session.idle_timeout_ms, 120_000);
    assert_eq!(config.session.max_concurrent_sessions, 10);
    assert_eq!(config.session.max_sessions_per_target, 2);
    assert_eq!(config.session.max_consecutive_empty_replies, 2);
    assert_eq!(config.session.end_marker, "[END]");
    assert!(config.session.append_end_marker_on_close);

    // Group defaults
    assert_eq!(config.group.group_buffer_gate_ms, 3_000);
    assert_eq!(config.group.group_dispatch_cooldown_ms, 10_000);
    assert_eq!(config.group.vitality_window_ms, 300_000);
    assert_eq!(config.group.max_reply_chars, 500);
    assert_eq!(config.group.reaction_max_chars, 40);

    // Credit + scoring defaults
    assert_eq!(config.credit.reject_below, 20);
    assert_eq!(config.credit.success_threshold, 50);
    assert!(config.scoring.ai_refinement);
    assert_eq!(config.scoring.ai_timeout_ms, 8_000);
    assert_eq!(config.scoring.summary_history, 500);

    // Runtime defaults
    assert_eq!(config.reconnect.base_ms, 1_000);
    assert_eq!(config.reconnect.max_ms, 60_000);
    assert_eq!(config.reconnect.max_attempts, None);
    assert_eq!(config.storage.backend, StorageBackend::Json);
    assert_eq!(config.storage.data_dir, PathBuf::from(".parley"));
    assert_eq!(config.observability.log_level, "info");
    assert_eq!(config.observability.log_format, "text");
    assert!(config.accounts.is_empty());
}

#[test]
fn config_loads_partial_toml_with_overrides() {
    let toml = r#"
[session]
max_turns = 6
idle_timeout_ms = 1000

[storage]
backend = "sqlite"

[[accounts]]
id = "main"
aid = "alice.agents.example"
name = "Alice"
aliases = ["al"]
"#;
    let config = ParleyConfig::from_toml(toml).unwrap();
    assert_eq!(config.session.max_turns, 6);
    assert_eq!(config.session.idle_timeout_ms, 1000);
    // Non-overridden fields keep defaults
    assert_eq!(config.session.max_concurrent_sessions, 10);
    assert_eq!(config.storage.backend, StorageBackend::Sqlite);
    assert_eq!(config.accounts.len(), 1);
    assert_eq!(config.accounts[0].aliases, vec!["al".to_string()]);
}

#[test]
fn config_serde_roundtrip() {
    let config = ParleyConfig::default();
    let toml_str = config.to_toml().unwrap();
    let roundtripped = ParleyConfig::from_toml(&toml_str).unwrap();
    assert_eq!(roundtripped.session.end_marker, config.session.end_marker);
    assert_eq!(
        roundtripped.group.group_dispatch_cooldown_ms,
        config.group.group_dispatch_cooldown_ms
    );
    assert_eq!(roundtripped.storage.data_dir, config.storage.data_dir);
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn field_of(err: ConfigError) -> String {
    match err {
        ConfigError::ValidationFailed { field, .. } => field,
        other => panic!("expected validation failure, got {other:?}"),
    }
}

#[test]
fn zero_concurrent_sessions_is_rejected() {
    let err = ParleyConfig::from_toml("[session]\nmax_concurrent_sessions = 0").unwrap_err();
    assert_eq!(field_of(err), "session.max_concurrent_sessions");
}

#[test]
fn per_target_bound_above_global_bound_is_rejected() {
    let toml = "[session]\nmax_concurrent_sessions = 2\nmax_sessions_per_target = 3";
    let err = ParleyConfig::from_toml(toml).unwrap_err();
    assert_eq!(field_of(err), "session.max_sessions_per_target");
}

#[test]
fn mention_delay_longer_than_buffer_window_is_rejected() {
    let toml = "[group]\ngroup_buffer_gate_ms = 100\nmention_delay_ms = 500";
    let err = ParleyConfig::from_toml(toml).unwrap_err();
    assert_eq!(field_of(err), "group.mention_delay_ms");
}

#[test]
fn weights_outside_unit_interval_are_rejected() {
    let err = ParleyConfig::from_toml("[scoring]\nrule_weight = 1.5").unwrap_err();
    assert_eq!(field_of(err), "scoring.rule_weight");
    let err = ParleyConfig::from_toml("[credit]\nhistory_weight = -0.1").unwrap_err();
    assert_eq!(field_of(err), "credit.history_weight");
}

#[test]
fn unknown_log_format_is_rejected() {
    let err = ParleyConfig::from_toml("[observability]\nlog_format = \"xml\"").unwrap_err();
    assert_eq!(field_of(err), "observability.log_format");
}

#[test]
fn duplicate_account_aid_is_rejected() {
    let toml = r#"
[[accounts]]
id = "a"
aid = "same.example"

[[accounts]]
id = "b"
aid = "same.example"
"#;
    let err = ParleyConfig::from_toml(toml).unwrap_err();
    assert_eq!(field_of(err), "accounts");
}

#[test]
fn malformed_toml_is_a_parse_error() {
    let err = ParleyConfig::from_toml("[session\nmax_turns = ").unwrap_err();
    assert!(matches!(err, ConfigError::ParseError { .. }));
}

// ---------------------------------------------------------------------------
// Layered loading
// ---------------------------------------------------------------------------

#[test]
fn load_reads_project_file_and_applies_cli_overrides() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("parley.toml"),
        "[session]\nmax_turns = 7\nmax_concurrent_sessions = 4\n",
    )
    .unwrap();

    let cli = CliOverrides {
        data_dir: Some(PathBuf::from("/var/lib/parley")),
        log_level: Some("debug".into()),
        max_concurrent_sessions: Some(3),
    };
    let config = ParleyConfig::load(dir.path(), Some(&cli)).unwrap();
    assert_eq!(config.session.max_turns, 7);
    assert_eq!(config.session.max_concurrent_sessions, 3);
    assert_eq!(config.storage.data_dir, PathBuf::from("/var/lib/parley"));
    assert_eq!(config.observability.log_level, "debug");
}

#[test]
fn load_without_project_file_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = ParleyConfig::load(dir.path(), None).unwrap();
    assert_eq!(config.session.end_marker, "[END]");
}

#[test]
fn load_validates_after_cli_overrides() {
    let dir = tempfile::tempdir().unwrap();
    let cli = CliOverrides {
        max_concurrent_sessions: Some(0),
        ..Default::default()
    };
    let err = ParleyConfig::load(dir.path(), Some(&cli)).unwrap_err();
    assert_eq!(field_of(err), "session.max_concurrent_sessions");
}

#[test]
fn load_reports_broken_project_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("parley.toml"), "[session\n").unwrap();
    let err = ParleyConfig::load(dir.path(), None).unwrap_err();
    assert!(matches!(err, ConfigError::ParseError { .. }));
}
