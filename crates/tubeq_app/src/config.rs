//! Application configuration: a RON file overridden by command-line flags.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use tubeq_engine::{BackendSettings, BackendVariant};

use crate::platform::logging::LogDestination;

#[derive(Debug, Parser)]
#[command(
    name = "tubeq",
    version,
    about = "Queue YouTube links on an MP3 download backend and follow their progress"
)]
pub struct Cli {
    /// Configuration file; missing file means defaults.
    #[arg(long, default_value = "tubeq.ron")]
    pub config: PathBuf,
    /// Backend base URL, e.g. http://127.0.0.1:5000
    #[arg(long)]
    pub backend: Option<String>,
    #[arg(long, value_enum)]
    pub variant: Option<VariantSetting>,
    #[arg(long)]
    pub poll_interval_ms: Option<u64>,
    #[arg(long)]
    pub storage_dir: Option<PathBuf>,
    #[arg(long, value_enum)]
    pub log: Option<LogSetting>,
    /// Links submitted as the first batch.
    pub links: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
pub enum VariantSetting {
    #[default]
    EventStream,
    TaskPoll,
}

impl From<VariantSetting> for BackendVariant {
    fn from(value: VariantSetting) -> Self {
        match value {
            VariantSetting::EventStream => BackendVariant::EventStream,
            VariantSetting::TaskPoll => BackendVariant::TaskPoll,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
pub enum LogSetting {
    #[default]
    File,
    Terminal,
    Both,
}

impl From<LogSetting> for LogDestination {
    fn from(value: LogSetting) -> Self {
        match value {
            LogSetting::File => LogDestination::File,
            LogSetting::Terminal => LogDestination::Terminal,
            LogSetting::Both => LogDestination::Both,
        }
    }
}

/// Path overrides for backends that do not use the stock routes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointOverrides {
    pub submit: Option<String>,
    pub progress: Option<String>,
    pub download: Option<String>,
    pub oembed: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub backend_url: String,
    pub variant: VariantSetting,
    /// Unset means the variant's own default.
    pub poll_interval_ms: Option<u64>,
    pub request_timeout_secs: u64,
    pub storage_dir: PathBuf,
    pub log: LogSetting,
    pub endpoints: EndpointOverrides,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend_url: "http://127.0.0.1:5000".to_string(),
            variant: VariantSetting::default(),
            poll_interval_ms: None,
            request_timeout_secs: 30,
            storage_dir: PathBuf::from("tubeq_data"),
            log: LogSetting::default(),
            endpoints: EndpointOverrides::default(),
        }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn parse(text: &str) -> anyhow::Result<Self> {
        Ok(ron::from_str(text)?)
    }

    pub fn with_cli(mut self, cli: &Cli) -> Self {
        if let Some(backend) = &cli.backend {
            self.backend_url = backend.clone();
        }
        if let Some(variant) = cli.variant {
            self.variant = variant;
        }
        if let Some(ms) = cli.poll_interval_ms {
            self.poll_interval_ms = Some(ms);
        }
        if let Some(dir) = &cli.storage_dir {
            self.storage_dir = dir.clone();
        }
        if let Some(log) = cli.log {
            self.log = log;
        }
        self
    }

    pub fn backend_settings(&self) -> BackendSettings {
        let base_url = self.backend_url.trim_end_matches('/');
        let mut settings = BackendSettings::for_variant(base_url, self.variant.into());
        if let Some(ms) = self.poll_interval_ms {
            settings.poll_interval = Duration::from_millis(ms.max(1));
        }
        settings.request_timeout = Duration::from_secs(self.request_timeout_secs.max(1));
        let overrides = &self.endpoints;
        if let Some(path) = &overrides.submit {
            settings.submit_path = path.clone();
        }
        if let Some(path) = &overrides.progress {
            settings.progress_path = path.clone();
        }
        if let Some(path) = &overrides.download {
            settings.download_path = path.clone();
        }
        if let Some(url) = &overrides.oembed {
            settings.oembed_endpoint = url.clone();
        }
        settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_file_gives_defaults() {
        let config = AppConfig::parse("()").unwrap();
        assert_eq!(config, AppConfig::default());
        let settings = config.backend_settings();
        assert_eq!(settings.variant, BackendVariant::EventStream);
        assert_eq!(settings.poll_interval, Duration::from_millis(1000));
    }

    #[test]
    fn file_values_and_overrides_apply() {
        let config = AppConfig::parse(
            r#"(
                backend_url: "http://media.local:8080/",
                variant: TaskPoll,
                poll_interval_ms: Some(500),
                endpoints: (progress: Some("/v2/progress")),
            )"#,
        )
        .unwrap();

        let settings = config.backend_settings();
        assert_eq!(settings.base_url, "http://media.local:8080");
        assert_eq!(settings.variant, BackendVariant::TaskPoll);
        assert_eq!(settings.poll_interval, Duration::from_millis(500));
        assert_eq!(settings.progress_path, "/v2/progress");
        assert_eq!(settings.submit_path, "/api/downloads");
    }

    #[test]
    fn task_poll_defaults_to_its_own_interval() {
        let config = AppConfig {
            variant: VariantSetting::TaskPoll,
            ..AppConfig::default()
        };
        assert_eq!(
            config.backend_settings().poll_interval,
            Duration::from_millis(1400)
        );
    }

    #[test]
    fn cli_flags_override_file() {
        let cli = Cli::parse_from([
            "tubeq",
            "--backend",
            "http://10.0.0.2:5000",
            "--variant",
            "task-poll",
            "--log",
            "both",
            "https://youtu.be/abc123",
        ]);
        let config = AppConfig::default().with_cli(&cli);

        assert_eq!(config.backend_url, "http://10.0.0.2:5000");
        assert_eq!(config.variant, VariantSetting::TaskPoll);
        assert_eq!(config.log, LogSetting::Both);
        assert_eq!(config.storage_dir, PathBuf::from("tubeq_data"));
        assert_eq!(cli.links, vec!["https://youtu.be/abc123".to_string()]);
    }

    #[test]
    fn malformed_file_is_an_error() {
        assert!(AppConfig::parse("(variant: Sideways)").is_err());
    }

    #[test]
    fn missing_file_gives_defaults() {
        let temp = tempfile::TempDir::new().unwrap();
        let config = AppConfig::load(&temp.path().join("absent.ron")).unwrap();
        assert_eq!(config, AppConfig::default());
    }
}
