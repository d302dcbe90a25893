//! Shared configuration for the `lfctl` tools.
//!
//! TOML profiles describing a controller (manager host, resource, radio,
//! SSID credentials) plus `[defaults]` for poll, timeout and step-delay
//! policies. Values are merged from built-in defaults, the config file and
//! `LFCTL_`-prefixed environment variables, then translated into the
//! transport and lifecycle types the other crates consume.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use lfctl_api::{DEFAULT_MGR_PORT, TransportConfig, manager_url};
use lfctl_core::{CrossConnectPolicy, LifecyclePolicy, PollPolicy, RemovalPolicy, Security};

/// Environment variable consulted for the SSID passphrase.
pub const PASSWD_ENV: &str = "LFCTL_PASSWD";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found")]
    ProfileNotFound { name: String, available: Vec<String> },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when `--profile` is not given.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named controller profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Look up a profile by name.
    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::ProfileNotFound {
                name: name.into(),
                available: self.profile_names(),
            })
    }

    /// Profile names, sorted.
    pub fn profile_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.profiles.keys().cloned().collect();
        names.sort();
        names
    }
}

/// Timing and output defaults shared by every profile.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    /// Interval between convergence checks.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Upper bound on waiting for a created entity to appear.
    #[serde(default = "default_create_timeout_secs")]
    pub create_timeout_secs: u64,

    /// Upper bound on waiting for a removed entity to disappear.
    #[serde(default = "default_remove_timeout_secs")]
    pub remove_timeout_secs: u64,

    /// Upper bound on waiting for an admin up/down to show.
    #[serde(default = "default_admin_timeout_secs")]
    pub admin_timeout_secs: u64,

    /// Fixed settle delay between cross-connect build steps.
    #[serde(default = "default_step_delay_ms")]
    pub step_delay_ms: u64,

    /// Remove a connection's endpoints together with it.
    #[serde(default = "default_true")]
    pub cascade_endpoints: bool,

    /// Check that a name is unused on the controller before creating it.
    #[serde(default = "default_true")]
    pub preflight: bool,

    /// Per-request HTTP timeout.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            poll_interval_ms: default_poll_interval_ms(),
            create_timeout_secs: default_create_timeout_secs(),
            remove_timeout_secs: default_remove_timeout_secs(),
            admin_timeout_secs: default_admin_timeout_secs(),
            step_delay_ms: default_step_delay_ms(),
            cascade_endpoints: true,
            preflight: true,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_poll_interval_ms() -> u64 {
    500
}
fn default_create_timeout_secs() -> u64 {
    60
}
fn default_remove_timeout_secs() -> u64 {
    30
}
fn default_admin_timeout_secs() -> u64 {
    30
}
fn default_step_delay_ms() -> u64 {
    500
}
fn default_request_timeout_secs() -> u64 {
    30
}
fn default_true() -> bool {
    true
}

impl Defaults {
    fn poll(&self, timeout_secs: u64) -> PollPolicy {
        PollPolicy::new(
            Duration::from_millis(self.poll_interval_ms),
            Duration::from_secs(timeout_secs),
        )
    }

    pub fn lifecycle_policy(&self) -> LifecyclePolicy {
        LifecyclePolicy {
            create: self.poll(self.create_timeout_secs),
            remove: self.poll(self.remove_timeout_secs),
            admin: self.poll(self.admin_timeout_secs),
            preflight: self.preflight,
            ..LifecyclePolicy::default()
        }
    }

    pub fn cross_connect_policy(&self) -> CrossConnectPolicy {
        CrossConnectPolicy {
            step_delay: Duration::from_millis(self.step_delay_ms),
            confirm: Some(self.poll(self.create_timeout_secs)),
            ..CrossConnectPolicy::default()
        }
    }

    pub fn removal_policy(&self) -> RemovalPolicy {
        if self.cascade_endpoints {
            RemovalPolicy::CascadeEndpoints
        } else {
            RemovalPolicy::ConnectionOnly
        }
    }
}

/// A named controller profile.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Profile {
    /// Manager host name, address or full URL.
    pub mgr: String,

    #[serde(default = "default_mgr_port")]
    pub mgr_port: u16,

    /// Resource (machine) hosting the radios.
    #[serde(default = "default_resource")]
    pub resource: u32,

    /// Radio port new stations attach to, e.g. "wiphy0".
    pub radio: Option<String>,

    pub ssid: Option<String>,

    #[serde(default)]
    pub security: Security,

    /// SSID passphrase (plaintext, prefer `passwd_env`).
    pub passwd: Option<String>,

    /// Environment variable holding the SSID passphrase.
    pub passwd_env: Option<String>,

    /// Accept self-signed certificates on HTTPS managers.
    pub insecure: Option<bool>,
}

fn default_mgr_port() -> u16 {
    DEFAULT_MGR_PORT
}
fn default_resource() -> u32 {
    1
}

impl Profile {
    /// A profile pointing at `mgr` with everything else defaulted.
    pub fn new(mgr: impl Into<String>) -> Self {
        Self {
            mgr: mgr.into(),
            mgr_port: DEFAULT_MGR_PORT,
            resource: default_resource(),
            radio: None,
            ssid: None,
            security: Security::Open,
            passwd: None,
            passwd_env: None,
            insecure: None,
        }
    }

    pub fn manager_url(&self) -> Result<url::Url, ConfigError> {
        manager_url(&self.mgr, self.mgr_port).map_err(|e| ConfigError::Validation {
            field: "mgr".into(),
            reason: e.to_string(),
        })
    }

    pub fn transport(&self, defaults: &Defaults) -> TransportConfig {
        TransportConfig {
            timeout: Duration::from_secs(defaults.request_timeout_secs),
            accept_invalid_certs: self.insecure.unwrap_or(false),
            ..TransportConfig::default()
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "lfctl", "lfctl").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("lfctl");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path` + environment. A missing file yields the defaults.
///
/// Environment keys nest on a double underscore, e.g.
/// `LFCTL_DEFAULTS__POLL_INTERVAL_MS=250`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("LFCTL_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(&config_path(), cfg)
}

pub fn save_config_to(path: &Path, cfg: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Secret resolution ───────────────────────────────────────────────

/// Resolve the SSID passphrase: the profile's `passwd_env`, then
/// [`PASSWD_ENV`], then the plaintext `passwd`.
pub fn resolve_passwd(profile: &Profile) -> Option<SecretString> {
    if let Some(ref env_name) = profile.passwd_env {
        if let Ok(val) = std::env::var(env_name) {
            return Some(SecretString::from(val));
        }
    }
    if let Ok(val) = std::env::var(PASSWD_ENV) {
        return Some(SecretString::from(val));
    }
    profile.passwd.clone().map(SecretString::from)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"
default_profile = "lab"

[defaults]
poll_interval_ms = 250
create_timeout_secs = 20
cascade_endpoints = false

[profiles.lab]
mgr = "192.168.100.1"
radio = "wiphy1"
ssid = "lab-net"
security = "wpa2"
passwd_env = "LAB_NET_PASSPHRASE"

[profiles.bench]
mgr = "https://bench:8443"
resource = 2
insecure = true
"#;

    fn write_sample(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("config.toml");
        std::fs::write(&path, SAMPLE).unwrap();
        path
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.default_profile.as_deref(), Some("default"));
        assert_eq!(cfg.defaults, Defaults::default());
        assert!(cfg.profiles.is_empty());
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = TempDir::new().unwrap();
        let cfg = load_config_from(&write_sample(&dir)).unwrap();

        assert_eq!(cfg.default_profile.as_deref(), Some("lab"));
        assert_eq!(cfg.defaults.poll_interval_ms, 250);
        assert_eq!(cfg.defaults.create_timeout_secs, 20);
        assert_eq!(cfg.defaults.remove_timeout_secs, 30);
        assert_eq!(cfg.defaults.output, "table");

        let lab = cfg.profile("lab").unwrap();
        assert_eq!(lab.mgr_port, DEFAULT_MGR_PORT);
        assert_eq!(lab.resource, 1);
        assert_eq!(lab.radio.as_deref(), Some("wiphy1"));
        assert_eq!(lab.security, Security::Wpa2);

        let bench = cfg.profile("bench").unwrap();
        assert_eq!(bench.resource, 2);
        assert_eq!(bench.security, Security::Open);
    }

    #[test]
    fn unknown_profile_lists_available() {
        let dir = TempDir::new().unwrap();
        let cfg = load_config_from(&write_sample(&dir)).unwrap();
        match cfg.profile("nope") {
            Err(ConfigError::ProfileNotFound { available, .. }) => {
                assert_eq!(available, ["bench", "lab"]);
            }
            other => panic!("expected ProfileNotFound, got {other:?}"),
        }
    }

    #[test]
    fn defaults_translate_into_policies() {
        let dir = TempDir::new().unwrap();
        let cfg = load_config_from(&write_sample(&dir)).unwrap();

        let lifecycle = cfg.defaults.lifecycle_policy();
        assert_eq!(lifecycle.create.interval, Duration::from_millis(250));
        assert_eq!(lifecycle.create.timeout, Duration::from_secs(20));
        assert_eq!(lifecycle.remove.timeout, Duration::from_secs(30));
        assert!(lifecycle.preflight);

        let cx = cfg.defaults.cross_connect_policy();
        assert_eq!(cx.step_delay, Duration::from_millis(500));
        assert_eq!(cfg.defaults.removal_policy(), RemovalPolicy::ConnectionOnly);
    }

    #[test]
    fn manager_url_and_transport_follow_profile() {
        let dir = TempDir::new().unwrap();
        let cfg = load_config_from(&write_sample(&dir)).unwrap();

        let lab = cfg.profile("lab").unwrap();
        assert_eq!(lab.manager_url().unwrap().as_str(), "http://192.168.100.1:8080/");
        assert!(!lab.transport(&cfg.defaults).accept_invalid_certs);

        let bench = cfg.profile("bench").unwrap();
        assert_eq!(bench.manager_url().unwrap().as_str(), "https://bench:8443/");
        assert!(bench.transport(&cfg.defaults).accept_invalid_certs);
    }

    #[test]
    fn bad_manager_is_a_validation_error() {
        let profile = Profile::new("not a host");
        assert!(matches!(
            profile.manager_url(),
            Err(ConfigError::Validation { .. })
        ));
    }

    #[test]
    fn save_then_load_keeps_profiles() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        let mut profile = Profile::new("lf1");
        profile.ssid = Some("open-net".into());
        cfg.profiles.insert("default".into(), profile);
        save_config_to(&path, &cfg).unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.profile("default").unwrap().ssid.as_deref(), Some("open-net"));
    }

    #[test]
    fn plaintext_passwd_is_the_last_resort() {
        use secrecy::ExposeSecret;

        let mut profile = Profile::new("lf1");
        profile.passwd = Some("hunter22".into());
        profile.passwd_env = Some("LFCTL_TEST_UNSET_PASSPHRASE_VAR".into());
        if std::env::var(PASSWD_ENV).is_err() {
            let secret = resolve_passwd(&profile).unwrap();
            assert_eq!(secret.expose_secret(), "hunter22");
        }
    }
}
