//! Environment overrides live in their own test binary so the variables
//! never leak into the other config tests.

use parley_core::config::{CliOverrides, ParleyConfig};

#[test]
fn env_overrides_sit_between_project_file_and_cli() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("parley.toml"),
        "[session]\nmax_turns = 7\n\n[group]\ngroup_dispatch_cooldown_ms = 100\n",
    )
    .unwrap();

    std::env::set_var("PARLEY_SESSION_MAX_TURNS", "11");
    std::env::set_var("PARLEY_GROUP_DISPATCH_COOLDOWN_MS", "2500");
    std::env::set_var("PARLEY_SCORING_AI_REFINEMENT", "false");
    std::env::set_var("PARLEY_SESSION_MAX_CONCURRENT", "8");

    let cli = CliOverrides {
        max_concurrent_sessions: Some(5),
        ..Default::default()
    };
    let config = ParleyConfig::load(dir.path(), Some(&cli)).unwrap();

    std::env::remove_var("PARLEY_SESSION_MAX_TURNS");
    std::env::remove_var("PARLEY_GROUP_DISPATCH_COOLDOWN_MS");
    std::env::remove_var("PARLEY_SCORING_AI_REFINEMENT");
    std::env::remove_var("PARLEY_SESSION_MAX_CONCURRENT");

    assert_eq!(config.session.max_turns, 11);
    assert_eq!(config.group.group_dispatch_cooldown_ms, 2500);
    assert!(!config.scoring.ai_refinement);
    // CLI wins over env.
    assert_eq!(config.session.max_concurrent_sessions, 5);
}

#[test]
fn unparsable_env_value_is_ignored() {
    // Distinct variable from the test above so the two can run in parallel.
    std::env::set_var("PARLEY_SESSION_IDLE_TIMEOUT_MS", "soon");
    let dir = tempfile::tempdir().unwrap();
    let config = ParleyConfig::load(dir.path(), None).unwrap();
    std::env::remove_var("PARLEY_SESSION_IDLE_TIMEOUT_MS");
    assert_eq!(config.session.idle_timeout_ms, 120_000);
}
