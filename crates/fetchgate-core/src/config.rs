use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable overriding `max_download_bytes`.
pub const ENV_MAX_DOWNLOAD_BYTES: &str = "MAX_DOWNLOAD_BYTES";
/// Environment variable overriding `total_timeout_secs`.
pub const ENV_TOTAL_TIMEOUT: &str = "TOTAL_TIMEOUT";

/// Upper bound for `total_timeout_secs` (30 days).
pub const MAX_TOTAL_TIMEOUT_SECS: u64 = 30 * 24 * 60 * 60;

/// Gate configuration loaded from `~/.config/fetchgate/config.toml`,
/// then overridden from the environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    /// Hard cap on a single download, in bytes.
    pub max_download_bytes: u64,
    /// Wall-clock budget for one gate call (resolution, redirects, transfer).
    pub total_timeout_secs: u64,
    /// Connect timeout per hop.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// libcurl receive buffer size (largest chunk per write).
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Redirect hops followed before giving up; each hop is screened again.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: u32,
    /// Connect to the screened addresses instead of resolving again.
    #[serde(default = "default_true")]
    pub pin_resolved_addresses: bool,
    /// Where temp files go (None = system temp dir).
    #[serde(default)]
    pub temp_dir: Option<PathBuf>,
    /// Hostnames exempt from the private-address check. They must still resolve.
    #[serde(default)]
    pub trusted_hosts: Vec<String>,
}

fn default_connect_timeout_secs() -> u64 {
    30
}

fn default_chunk_size() -> usize {
    64 * 1024
}

fn default_max_redirects() -> u32 {
    10
}

fn default_true() -> bool {
    true
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            max_download_bytes: 100 * 1024 * 1024,
            total_timeout_secs: 30 * 60,
            connect_timeout_secs: default_connect_timeout_secs(),
            chunk_size: default_chunk_size(),
            max_redirects: default_max_redirects(),
            pin_resolved_addresses: true,
            temp_dir: None,
            trusted_hosts: Vec::new(),
        }
    }
}

impl GateConfig {
    pub fn total_timeout(&self) -> Duration {
        Duration::from_secs(self.total_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn temp_dir(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    /// Applies `MAX_DOWNLOAD_BYTES` / `TOTAL_TIMEOUT` from `lookup`.
    /// Unset or blank values are ignored; anything else must be a positive integer.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(n) = read_positive(&lookup, ENV_MAX_DOWNLOAD_BYTES)? {
            self.max_download_bytes = n;
        }
        if let Some(n) = read_positive(&lookup, ENV_TOTAL_TIMEOUT)? {
            if n > MAX_TOTAL_TIMEOUT_SECS {
                anyhow::bail!(
                    "{} must be at most {} seconds, got {}",
                    ENV_TOTAL_TIMEOUT,
                    MAX_TOTAL_TIMEOUT_SECS,
                    n
                );
            }
            self.total_timeout_secs = n;
        }
        Ok(())
    }

    /// Applies overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Rejects values the gate cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.max_download_bytes == 0 {
            anyhow::bail!("max_download_bytes must be greater than zero");
        }
        if self.total_timeout_secs == 0 || self.total_timeout_secs > MAX_TOTAL_TIMEOUT_SECS {
            anyhow::bail!(
                "total_timeout_secs must be between 1 and {}, got {}",
                MAX_TOTAL_TIMEOUT_SECS,
                self.total_timeout_secs
            );
        }
        Ok(())
    }
}

fn read_positive<F>(lookup: &F, name: &str) -> Result<Option<u64>>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = match lookup(name) {
        Some(v) if !v.trim().is_empty() => v,
        _ => return Ok(None),
    };
    let n: u64 = raw
        .trim()
        .parse()
        .with_context(|| format!("{} must be a positive integer, got {:?}", name, raw))?;
    if n == 0 {
        anyhow::bail!("{} must be greater than zero", name);
    }
    Ok(Some(n))
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("fetchgate")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<GateConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = GateConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: GateConfig =
        toml::from_str(&data).with_context(|| format!("parse {}", path.display()))?;
    Ok(cfg)
}

/// Config file plus environment overrides: what the CLI runs with.
pub fn load() -> Result<GateConfig> {
    let mut cfg = load_or_init()?;
    cfg.apply_env_overrides()?;
    cfg.validate().context("invalid configuration")?;
    Ok(cfg)
}
