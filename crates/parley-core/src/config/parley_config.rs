//! Top-level Parley configuration with layered resolution.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{
    AccountConfig, CreditConfig, GroupConfig, ObservabilityConfig, ReconnectConfig,
    ScoringConfig, SessionConfig, StorageConfig,
};
use crate::errors::ConfigError;

/// Top-level configuration aggregating all sub-configs.
///
/// Resolution order (highest priority first):
/// 1. CLI flags (applied via `CliOverrides`)
/// 2. Environment variables (`PARLEY_*`)
/// 3. Project config (`parley.toml` in the project root)
/// 4. User config (`~/.parley/config.toml`)
/// 5. Compiled defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ParleyConfig {
    pub session: SessionConfig,
    pub group: GroupConfig,
    pub credit: CreditConfig,
    pub scoring: ScoringConfig,
    pub reconnect: ReconnectConfig,
    pub storage: StorageConfig,
    pub observability: ObservabilityConfig,
    pub accounts: Vec<AccountConfig>,
}

/// CLI override arguments that can be applied to a config.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub data_dir: Option<PathBuf>,
    pub log_level: Option<String>,
    pub max_concurrent_sessions: Option<usize>,
}

impl ParleyConfig {
    /// Load configuration with layered resolution rooted at `root`.
    pub fn load(root: &Path, cli_overrides: Option<&CliOverrides>) -> Result<Self, ConfigError> {
        let mut merged = toml::Value::Table(toml::map::Map::new());

        // Lowest file layer: user config. Only a parse error is fatal here.
        if let Some(user_path) = user_config_path() {
            if user_path.exists() {
                let layer = read_toml_file(&user_path)?;
                merge_values(&mut merged, layer);
            }
        }

        let project_path = root.join("parley.toml");
        if project_path.exists() {
            let layer = read_toml_file(&project_path)?;
            merge_values(&mut merged, layer);
        }

        let mut config: ParleyConfig =
            merged.try_into().map_err(|e: toml::de::Error| ConfigError::ParseError {
                path: project_path.display().to_string(),
                message: e.to_string(),
            })?;

        config.apply_env_overrides();
        if let Some(cli) = cli_overrides {
            config.apply_cli_overrides(cli);
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML string (for testing).
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: ParleyConfig = toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
            path: "<string>".to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the config back to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError {
            path: "<serialization>".to_string(),
            message: e.to_string(),
        })
    }

    /// Validate the configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.session;
        if s.max_concurrent_sessions == 0 {
            return Err(invalid("session.max_concurrent_sessions", "must be greater than 0"));
        }
        if s.max_sessions_per_target == 0 {
            return Err(invalid("session.max_sessions_per_target", "must be greater than 0"));
        }
        if s.max_sessions_per_target > s.max_concurrent_sessions {
            return Err(invalid(
                "session.max_sessions_per_target",
                "must not exceed session.max_concurrent_sessions",
            ));
        }
        if s.max_turns == 0 {
            return Err(invalid("session.max_turns", "must be greater than 0"));
        }
        if s.max_consecutive_empty_replies == 0 {
            return Err(invalid(
                "session.max_consecutive_empty_replies",
                "must be greater than 0",
            ));
        }
        if s.end_marker.trim().is_empty() {
            return Err(invalid("session.end_marker", "must not be blank"));
        }
        if s.idle_check_interval_ms == 0 {
            return Err(invalid("session.idle_check_interval_ms", "must be greater than 0"));
        }

        let g = &self.group;
        if g.mention_delay_ms > g.group_buffer_gate_ms {
            return Err(invalid(
                "group.mention_delay_ms",
                "must not exceed group.group_buffer_gate_ms",
            ));
        }
        if g.vitality_window_ms == 0 {
            return Err(invalid("group.vitality_window_ms", "must be greater than 0"));
        }
        if g.max_reply_chars == 0 || g.reaction_max_chars == 0 {
            return Err(invalid("group.max_reply_chars", "budgets must be greater than 0"));
        }

        if self.credit.reject_below > 100 || self.credit.success_threshold > 100 {
            return Err(invalid("credit", "thresholds must be between 0 and 100"));
        }
        if !(0.0..=1.0).contains(&self.credit.history_weight) {
            return Err(invalid("credit.history_weight", "must be between 0.0 and 1.0"));
        }
        if !(0.0..=1.0).contains(&self.scoring.rule_weight) {
            return Err(invalid("scoring.rule_weight", "must be between 0.0 and 1.0"));
        }
        if self.scoring.engagement_turn_cap == 0 {
            return Err(invalid("scoring.engagement_turn_cap", "must be greater than 0"));
        }

        if self.reconnect.base_ms == 0 || self.reconnect.base_ms > self.reconnect.max_ms {
            return Err(invalid("reconnect.base_ms", "must be in 1..=reconnect.max_ms"));
        }

        match self.observability.log_format.as_str() {
            "text" | "json" => {}
            other => {
                return Err(invalid(
                    "observability.log_format",
                    &format!("unknown format '{other}' (expected 'text' or 'json')"),
                ))
            }
        }

        let mut ids = std::collections::HashSet::new();
        let mut aids = std::collections::HashSet::new();
        for account in &self.accounts {
            if account.id.is_empty() || account.aid.is_empty() {
                return Err(invalid("accounts", "every account needs an id and an aid"));
            }
            if !ids.insert(account.id.as_str()) {
                return Err(invalid("accounts", &format!("duplicate id '{}'", account.id)));
            }
            if !aids.insert(account.aid.as_str()) {
                return Err(invalid("accounts", &format!("duplicate aid '{}'", account.aid)));
            }
        }
        Ok(())
    }

    /// Apply environment variable overrides.
    /// Pattern: `PARLEY_SESSION_MAX_TURNS`, `PARLEY_GROUP_DISPATCH_COOLDOWN_MS`, etc.
    fn apply_env_overrides(&mut self) {
        if let Some(v) = env_parse::<u32>("PARLEY_SESSION_MAX_TURNS") {
            self.session.max_turns = v;
        }
        if let Some(v) = env_parse::<u64>("PARLEY_SESSION_IDLE_TIMEOUT_MS") {
            self.session.idle_timeout_ms = v;
        }
        if let Some(v) = env_parse::<usize>("PARLEY_SESSION_MAX_CONCURRENT") {
            self.session.max_concurrent_sessions = v;
        }
        if let Some(v) = env_parse::<u64>("PARLEY_GROUP_BUFFER_GATE_MS") {
            self.group.group_buffer_gate_ms = v;
        }
        if let Some(v) = env_parse::<u64>("PARLEY_GROUP_DISPATCH_COOLDOWN_MS") {
            self.group.group_dispatch_cooldown_ms = v;
        }
        if let Some(v) = env_parse::<bool>("PARLEY_SCORING_AI_REFINEMENT") {
            self.scoring.ai_refinement = v;
        }
        if let Ok(v) = std::env::var("PARLEY_DATA_DIR") {
            if !v.is_empty() {
                self.storage.data_dir = PathBuf::from(v);
            }
        }
        if let Ok(v) = std::env::var("PARLEY_LOG_FORMAT") {
            self.observability.log_format = v;
        }
    }

    /// Apply CLI overrides (highest priority).
    fn apply_cli_overrides(&mut self, cli: &CliOverrides) {
        if let Some(ref dir) = cli.data_dir {
            self.storage.data_dir = dir.clone();
        }
        if let Some(ref level) = cli.log_level {
            self.observability.log_level = level.clone();
        }
        if let Some(v) = cli.max_concurrent_sessions {
            self.session.max_concurrent_sessions = v;
        }
    }
}

fn invalid(field: &str, message: &str) -> ConfigError {
    ConfigError::ValidationFailed {
        field: field.to_string(),
        message: message.to_string(),
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

fn read_toml_file(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.display().to_string(),
    })?;
    content.parse::<toml::Value>().map_err(|e| ConfigError::ParseError {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

/// Deep-merge `layer` into `base`; tables merge key by key, everything else replaces.
fn merge_values(base: &mut toml::Value, layer: toml::Value) {
    match (base, layer) {
        (toml::Value::Table(base_table), toml::Value::Table(layer_table)) => {
            for (key, value) in layer_table {
                match base_table.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base_table.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

/// Returns the user config path: `~/.parley/config.toml`.
fn user_config_path() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(|h| PathBuf::from(h).join(".parley").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_overrides_leaves_and_keeps_siblings() {
        let mut base: toml::Value = "[session]\nmax_turns = 5\nidle_timeout_ms = 10".parse().unwrap();
        let layer: toml::Value = "[session]\nmax_turns = 9".parse().unwrap();
        merge_values(&mut base, layer);
        assert_eq!(base["session"]["max_turns"].as_integer(), Some(9));
        assert_eq!(base["session"]["idle_timeout_ms"].as_integer(), Some(10));
    }
}
