// src/config.rs
//! Collector configuration.
//!
//! TOML is the native format. Files with any other extension are read as the
//! legacy `Key = "value"` format still used by deployed data generators.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::ingest::http::DEFAULT_MAX_BODY_BYTES;

const ENV_PATH: &str = "COLLECTOR_CONFIG_PATH";
const DEFAULT_TOML: &str = "config/collector.toml";
const DEFAULT_LEGACY: &str = "config.cfg";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    pub sources: SourcesConfig,
    pub collect: CollectConfig,
    pub server: ServerConfig,
}

/// A `;`-separated file and its expected column count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileSource {
    pub path: PathBuf,
    pub columns: usize,
}

impl FileSource {
    fn new(path: &str, columns: usize) -> Self {
        Self {
            path: PathBuf::from(path),
            columns,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub sms: FileSource,
    pub voice: FileSource,
    pub email: FileSource,
    pub billing: PathBuf,
    pub mms_url: String,
    pub support_url: String,
    pub incident_url: String,
    /// Upper bound for any file source.
    pub max_file_bytes: u64,
    /// Upper bound for any HTTP response body.
    pub max_body_bytes: u64,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            sms: FileSource::new("sms.data", 4),
            voice: FileSource::new("voice.data", 8),
            email: FileSource::new("email.data", 3),
            billing: PathBuf::from("billing.data"),
            mms_url: "http://127.0.0.1:8383/mms".into(),
            support_url: "http://127.0.0.1:8383/support".into(),
            incident_url: "http://127.0.0.1:8383/accendent".into(),
            max_file_bytes: 10 << 12,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectConfig {
    /// Per-domain task timeout; 0 inherits the caller's deadline.
    pub task_timeout_ms: u64,
    pub concurrency_limit: usize,
    pub http_timeout_ms: u64,
    /// Abort an HTTP source on its first bad element instead of skipping it.
    pub json_fail_fast: bool,
}

impl Default for CollectConfig {
    fn default() -> Self {
        Self {
            task_timeout_ms: 3_000,
            concurrency_limit: 7,
            http_timeout_ms: 5_000,
            json_fail_fast: false,
        }
    }
}

impl CollectConfig {
    pub fn task_timeout(&self) -> Duration {
        Duration::from_millis(self.task_timeout_ms)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: String,
    pub request_timeout_ms: u64,
    pub cache_ttl_ms: u64,
    pub shutdown_grace_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:8282".into(),
            request_timeout_ms: 10_000,
            cache_ttl_ms: 10_000,
            shutdown_grace_ms: 5_000,
        }
    }
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}

/// Load from an explicit path; `.toml` is parsed as TOML, anything else as
/// the legacy key/value format.
pub fn load_from(path: &Path) -> Result<CollectorConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading collector config from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    if ext == "toml" {
        toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))
    } else {
        parse_legacy(&content).with_context(|| format!("parsing {}", path.display()))
    }
}

/// Load using env var + fallbacks:
/// 1) $COLLECTOR_CONFIG_PATH (must exist)
/// 2) config/collector.toml
/// 3) config.cfg
/// 4) built-in defaults
pub fn load_default() -> Result<CollectorConfig> {
    if let Ok(p) = std::env::var(ENV_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_from(&pb);
        }
        return Err(anyhow!("{ENV_PATH} points to non-existent path"));
    }
    for candidate in [DEFAULT_TOML, DEFAULT_LEGACY] {
        let p = PathBuf::from(candidate);
        if p.exists() {
            return load_from(&p);
        }
    }
    Ok(CollectorConfig::default())
}

/// `Key = "value"` lines; `//` comments, blank lines, unknown keys and lines
/// without `=` are skipped. Keys not present keep their defaults.
pub fn parse_legacy(s: &str) -> Result<CollectorConfig> {
    let mut cfg = CollectorConfig::default();
    for line in s.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with("//") {
            continue;
        }
        let Some((key, val)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        let val = val.trim().trim_matches(['"', '\'']);

        let src = &mut cfg.sources;
        match key {
            "FileSms" => src.sms.path = PathBuf::from(val),
            "QuantSMSDataCol" => src.sms.columns = parse_columns(key, val)?,
            "PathMmsData" => src.mms_url = val.to_string(),
            "FileVoice" => src.voice.path = PathBuf::from(val),
            "QuantVoiceDataCol" => src.voice.columns = parse_columns(key, val)?,
            "FileEmail" => src.email.path = PathBuf::from(val),
            "QuantEmailDataCol" => src.email.columns = parse_columns(key, val)?,
            "FileBillingState" => src.billing = PathBuf::from(val),
            "PathSupportData" => src.support_url = val.to_string(),
            "PathIncidentData" => src.incident_url = val.to_string(),
            "HTTPAddr" => cfg.server.addr = val.to_string(),
            _ => {}
        }
    }
    Ok(cfg)
}

fn parse_columns(key: &str, val: &str) -> Result<usize> {
    val.parse::<usize>()
        .with_context(|| format!("{key}: {val:?} is not a column count"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{env, fs};

    #[test]
    fn legacy_format_overrides_defaults() {
        let s = r#"
            // data files
            FileSms = "data/sms.data"
            QuantSMSDataCol = 4
            PathMmsData = 'http://localhost:9000/mms'
            QuantVoiceDataCol = 8
            FileBillingState = "billing.state"
            HTTPAddr = ":8080"
            Unknown = 1
            not a pair
        "#;
        let cfg = parse_legacy(s).unwrap();
        assert_eq!(cfg.sources.sms.path, PathBuf::from("data/sms.data"));
        assert_eq!(cfg.sources.sms.columns, 4);
        assert_eq!(cfg.sources.mms_url, "http://localhost:9000/mms");
        assert_eq!(cfg.sources.billing, PathBuf::from("billing.state"));
        assert_eq!(cfg.server.addr, ":8080");
        // untouched keys keep defaults
        assert_eq!(cfg.sources.email, SourcesConfig::default().email);
        assert_eq!(cfg.collect, CollectConfig::default());
    }

    #[test]
    fn legacy_rejects_bad_column_count() {
        let err = parse_legacy("QuantEmailDataCol = three").unwrap_err();
        assert!(format!("{err:#}").contains("QuantEmailDataCol"));
    }

    #[test]
    fn toml_sections_are_optional() {
        let cfg: CollectorConfig = toml::from_str(
            r#"
            [collect]
            concurrency_limit = 2

            [sources.sms]
            path = "fixtures/sms.data"
            columns = 4
            "#,
        )
        .unwrap();
        assert_eq!(cfg.collect.concurrency_limit, 2);
        assert_eq!(cfg.collect.task_timeout_ms, 3_000);
        assert_eq!(cfg.sources.sms.path, PathBuf::from("fixtures/sms.data"));
        assert_eq!(cfg.sources.max_file_bytes, 40_960);
        assert_eq!(cfg.sources.max_body_bytes, 1 << 20);
        assert_eq!(cfg.server, ServerConfig::default());
    }

    #[serial_test::serial]
    #[test]
    fn default_uses_env_then_fallbacks() {
        let old = env::current_dir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        env::set_current_dir(tmp.path()).unwrap();
        env::remove_var(ENV_PATH);

        assert_eq!(load_default().unwrap(), CollectorConfig::default());

        fs::write(tmp.path().join("config.cfg"), "HTTPAddr = \"0.0.0.0:1\"\n").unwrap();
        assert_eq!(load_default().unwrap().server.addr, "0.0.0.0:1");

        fs::create_dir_all(tmp.path().join("config")).unwrap();
        fs::write(
            tmp.path().join("config/collector.toml"),
            "[server]\naddr = \"0.0.0.0:2\"\n",
        )
        .unwrap();
        assert_eq!(load_default().unwrap().server.addr, "0.0.0.0:2");

        let explicit = tmp.path().join("explicit.toml");
        fs::write(&explicit, "[server]\naddr = \"0.0.0.0:3\"\n").unwrap();
        env::set_var(ENV_PATH, explicit.display().to_string());
        assert_eq!(load_default().unwrap().server.addr, "0.0.0.0:3");

        env::set_var(ENV_PATH, tmp.path().join("missing.toml").display().to_string());
        assert!(load_default().is_err());
        env::remove_var(ENV_PATH);

        env::set_current_dir(&old).unwrap();
    }
}
