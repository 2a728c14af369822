use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::db::DEFAULT_BUSY_TIMEOUT;

/// Directory holding the store and project config, relative to the root.
pub const KANBAN_DIR: &str = ".kanban";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub signup: SignupConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

/// The board seeded for every new account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignupConfig {
    #[serde(default = "default_board_name")]
    pub default_board: String,
    #[serde(default = "default_column_names")]
    pub default_columns: Vec<String>,
}

impl Default for SignupConfig {
    fn default() -> Self {
        Self {
            default_board: default_board_name(),
            default_columns: default_column_names(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

impl StoreConfig {
    #[must_use]
    pub const fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct UserConfig {
    #[serde(default)]
    pub output: Option<String>,
    /// Email of the account commands act as when `--user` is not given.
    #[serde(default)]
    pub user: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveConfig {
    pub project: ProjectConfig,
    pub user: UserConfig,
    pub resolved_output: String,
}

/// Path of the store database under `project_root`.
#[must_use]
pub fn store_path(project_root: &Path) -> PathBuf {
    project_root
        .join(KANBAN_DIR)
        .join(crate::db::STORE_FILE_NAME)
}

/// Load `<root>/.kanban/config.toml`, falling back to defaults when absent.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
    let path = project_root.join(KANBAN_DIR).join("config.toml");
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<ProjectConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Load the per-user config from the platform config directory.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_user_config() -> Result<UserConfig> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(UserConfig::default());
    };

    let path = config_dir.join("kanban/config.toml");
    if !path.exists() {
        return Ok(UserConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<UserConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Merge project config, user config, and the `FORMAT` environment variable.
///
/// `cli_format` is the already-parsed `--format`/`--json` choice, if any.
///
/// # Errors
///
/// Returns an error if either config file is malformed.
pub fn resolve_config(project_root: &Path, cli_format: Option<&str>) -> Result<EffectiveConfig> {
    let project = load_project_config(project_root)?;
    let user = load_user_config()?;

    let env_format = env::var("FORMAT").ok();
    let resolved_output = resolve_output(cli_format, user.output.as_deref(), env_format.as_deref());

    Ok(EffectiveConfig {
        project,
        user,
        resolved_output,
    })
}

fn resolve_output(
    cli_format: Option<&str>,
    user_output: Option<&str>,
    env_format: Option<&str>,
) -> String {
    fn normalize_output_mode(raw: &str) -> Option<&'static str> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pretty" | "human" => Some("pretty"),
            "text" | "table" => Some("text"),
            "json" => Some("json"),
            _ => None,
        }
    }

    [cli_format, env_format, user_output]
        .into_iter()
        .flatten()
        .find_map(normalize_output_mode)
        .map_or_else(
            || {
                if std::io::stdout().is_terminal() {
                    "pretty".to_string()
                } else {
                    "text".to_string()
                }
            },
            str::to_string,
        )
}

fn default_board_name() -> String {
    "My First Board".to_string()
}

fn default_column_names() -> Vec<String> {
    ["TODO", "DOING", "DONE"].map(String::from).to_vec()
}

fn default_busy_timeout_ms() -> u64 {
    u64::try_from(DEFAULT_BUSY_TIMEOUT.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_project_config_uses_defaults() {
        let root = tempfile::tempdir().expect("temp dir");
        let cfg = load_project_config(root.path()).expect("load should succeed");
        assert_eq!(cfg.signup.default_board, "My First Board");
        assert_eq!(cfg.signup.default_columns, vec!["TODO", "DOING", "DONE"]);
        assert_eq!(cfg.store.busy_timeout(), DEFAULT_BUSY_TIMEOUT);
    }

    #[test]
    fn partial_project_config_keeps_other_defaults() {
        let root = tempfile::tempdir().expect("temp dir");
        let dir = root.path().join(KANBAN_DIR);
        std::fs::create_dir_all(&dir).expect("create .kanban");
        std::fs::write(
            dir.join("config.toml"),
            "[signup]\ndefault_columns = [\"Backlog\", \"Shipped\"]\n\n[store]\nbusy_timeout_ms = 250\n",
        )
        .expect("write config");

        let cfg = load_project_config(root.path()).expect("load should succeed");
        assert_eq!(cfg.signup.default_board, "My First Board");
        assert_eq!(cfg.signup.default_columns, vec!["Backlog", "Shipped"]);
        assert_eq!(cfg.store.busy_timeout(), Duration::from_millis(250));
    }

    #[test]
    fn malformed_project_config_is_an_error() {
        let root = tempfile::tempdir().expect("temp dir");
        let dir = root.path().join(KANBAN_DIR);
        std::fs::create_dir_all(&dir).expect("create .kanban");
        std::fs::write(dir.join("config.toml"), "[signup\n").expect("write config");

        let err = load_project_config(root.path()).expect_err("parse must fail");
        assert!(err.to_string().contains("Failed to parse"));
    }

    #[test]
    fn cli_format_overrides_env_and_config() {
        let output = resolve_output(Some("json"), Some("pretty"), Some("text"));
        assert_eq!(output, "json");
    }

    #[test]
    fn env_beats_user_config() {
        assert_eq!(resolve_output(None, Some("json"), Some("text")), "text");
    }

    #[test]
    fn legacy_aliases_are_normalized() {
        assert_eq!(resolve_output(None, Some("table"), Some("human")), "pretty");
        assert_eq!(resolve_output(None, Some("human"), Some("table")), "text");
    }

    #[test]
    fn unknown_values_fall_through() {
        assert_eq!(resolve_output(Some("yaml"), Some("json"), Some("nope")), "json");
    }

    #[test]
    fn user_config_parses_default_user() {
        let cfg: UserConfig =
            toml::from_str("output = \"json\"\nuser = \"ada@example.com\"\n").expect("parse");
        assert_eq!(cfg.output.as_deref(), Some("json"));
        assert_eq!(cfg.user.as_deref(), Some("ada@example.com"));
    }

    #[test]
    fn store_path_lives_under_kanban_dir() {
        let path = store_path(Path::new("/srv/team"));
        assert_eq!(path, PathBuf::from("/srv/team/.kanban/kanban.db"));
    }
}
