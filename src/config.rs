use crate::error::{ClientError, ErrorContext, Result};
use crate::job_monitor::PollPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_SERVER_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(rename = "serverUrl", default = "default_server_url")]
    pub server_url: String,
    /// Value of the `hardlink_session` cookie issued after login + 2FA
    #[serde(rename = "sessionCookie", default)]
    pub session_cookie: Option<String>,
    #[serde(rename = "logLevel", default = "default_log_level")]
    pub log_level: String, // "info", "debug" or "trace"
    #[serde(default)]
    pub monitor: MonitorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    #[serde(rename = "pollBaseDelayMs")]
    pub poll_base_delay_ms: u64,
    #[serde(rename = "pollMaxDelayMs")]
    pub poll_max_delay_ms: u64,
    #[serde(rename = "maxPollAttempts")]
    pub max_poll_attempts: u32,
    #[serde(rename = "deadlineSecs")]
    pub deadline_secs: u64,
}

fn default_server_url() -> String {
    DEFAULT_SERVER_URL.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            session_cookie: None,
            log_level: default_log_level(),
            monitor: MonitorConfig::default(),
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        let policy = PollPolicy::default();
        Self {
            poll_base_delay_ms: policy.base_delay.as_millis() as u64,
            poll_max_delay_ms: policy.max_delay.as_millis() as u64,
            max_poll_attempts: policy.max_attempts,
            deadline_secs: policy.deadline.as_secs(),
        }
    }
}

impl MonitorConfig {
    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            base_delay: Duration::from_millis(self.poll_base_delay_ms),
            max_delay: Duration::from_millis(self.poll_max_delay_ms),
            max_attempts: self.max_poll_attempts.max(1),
            deadline: Duration::from_secs(self.deadline_secs),
        }
    }
}

pub fn get_config_dir() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(".hardlink-ui"))
        .ok_or_else(|| ClientError::Config("Could not find home directory".to_string()))
}

pub fn get_config_file_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join("config.json"))
}

pub fn get_logs_dir() -> Result<PathBuf> {
    Ok(get_config_dir()?.join("logs"))
}

/// Create `dir` if missing, restricted to the owner on Unix systems
pub fn ensure_private_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        fs::create_dir_all(dir)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut permissions = fs::metadata(dir)?.permissions();
            permissions.set_mode(0o700);
            fs::set_permissions(dir, permissions)?;
        }
    }
    Ok(())
}

pub fn load_config() -> Result<ClientConfig> {
    load_config_from(&get_config_file_path()?)
}

pub fn load_config_from(config_file: &Path) -> Result<ClientConfig> {
    if !config_file.exists() {
        return Ok(ClientConfig::default());
    }

    let content = fs::read_to_string(config_file)?;
    let config: ClientConfig =
        serde_json::from_str(&content).context("Failed to parse config file")?;
    Ok(config)
}

pub fn save_config(config: &ClientConfig) -> Result<()> {
    save_config_to(config, &get_config_file_path()?)
}

pub fn save_config_to(config: &ClientConfig, config_file: &Path) -> Result<()> {
    if let Some(parent) = config_file.parent() {
        ensure_private_dir(parent)?;
    }

    let content = serde_json::to_string_pretty(config)?;
    fs::write(config_file, content)?;

    // The session cookie grants full access; keep the file owner-only
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut permissions = fs::metadata(config_file)?.permissions();
        permissions.set_mode(0o600);
        fs::set_permissions(config_file, permissions)?;
    }

    Ok(())
}
