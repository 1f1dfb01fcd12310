use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use roster_engine::{AdminSession, ImportSettings};
use serde::{Deserialize, Serialize};

use crate::logging::LogDestination;

pub const CONFIG_FILENAME: &str = "roster_console.ron";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub base_url: String,
    pub connect_timeout_secs: u64,
    pub auth_token: Option<String>,
    pub log_destination: LogDestination,
    pub report_dir: PathBuf,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        let defaults = ImportSettings::default();
        Self {
            base_url: defaults.session.base_url,
            connect_timeout_secs: defaults.connect_timeout.as_secs(),
            auth_token: None,
            log_destination: LogDestination::default(),
            report_dir: PathBuf::from("."),
        }
    }
}

impl ConsoleConfig {
    pub fn import_settings(&self) -> ImportSettings {
        let mut session = AdminSession::new(self.base_url.clone());
        if let Some(token) = self.auth_token.as_deref().filter(|t| !t.is_empty()) {
            session = session.with_token(token);
        }
        ImportSettings {
            session,
            connect_timeout: Duration::from_secs(self.connect_timeout_secs.max(1)),
        }
    }
}

/// `Ok(None)` when there is no config file; defaults apply.
pub fn load(path: &Path) -> anyhow::Result<Option<ConsoleConfig>> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err).with_context(|| format!("reading {}", path.display())),
    };
    let config = ron::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
    Ok(Some(config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_means_defaults() {
        let temp = tempfile::tempdir().unwrap();
        let loaded = load(&temp.path().join(CONFIG_FILENAME)).unwrap();
        assert_eq!(loaded, None);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join(CONFIG_FILENAME);
        fs::write(
            &path,
            r#"(base_url: "https://admin.example.com", auth_token: Some("abc"), log_destination: Terminal)"#,
        )
        .unwrap();

        let config = load(&path).unwrap().unwrap();
        assert_eq!(config.base_url, "https://admin.example.com");
        assert_eq!(config.log_destination, LogDestination::Terminal);
        assert_eq!(config.connect_timeout_secs, 10);

        let settings = config.import_settings();
        assert_eq!(settings.session.auth_token.as_deref(), Some("abc"));
    }

    #[test]
    fn broken_file_is_an_error() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join(CONFIG_FILENAME);
        fs::write(&path, "(base_url: ").unwrap();

        assert!(load(&path).is_err());
    }

    #[test]
    fn empty_token_is_not_sent() {
        let config = ConsoleConfig {
            auth_token: Some(String::new()),
            ..ConsoleConfig::default()
        };
        assert_eq!(config.import_settings().session.auth_token, None);
    }
}
