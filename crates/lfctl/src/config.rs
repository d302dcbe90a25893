//! CLI configuration: thin layer over `lfctl_config`.
//!
//! Picks the active profile and applies `GlobalOpts` flag overrides
//! (--mgr, --mgr_port, --resource, --insecure) and per-command WiFi
//! overrides on top of it. Flags beat the profile, the profile beats
//! `[defaults]`.

use clap::ValueEnum;
use secrecy::SecretString;

use lfctl_api::HttpClient;
use lfctl_core::{Eid, Security};

use crate::cli::{GlobalOpts, OutputFormat, WifiOpts};
use crate::error::CliError;

pub use lfctl_config::{Config, Defaults, Profile, config_path, load_config, save_config};

/// Manager used when neither a profile nor `--mgr` names one.
pub const FALLBACK_MGR: &str = "localhost";

/// The profile in effect for this invocation, overrides applied.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub profile_name: String,
    pub profile: Profile,
    pub defaults: Defaults,
}

/// WiFi settings after merging command flags into the profile.
#[derive(Debug, Clone)]
pub struct WifiSettings {
    pub radio: Eid,
    pub ssid: String,
    pub security: Security,
    pub passwd: Option<SecretString>,
}

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Load the config file and apply global flag overrides.
///
/// A missing implicit profile falls back to [`FALLBACK_MGR`]; a profile
/// named with `--profile` must exist.
pub fn resolve(global: &GlobalOpts) -> Result<Resolved, CliError> {
    let cfg = load_config()?;
    let profile_name = active_profile_name(global, &cfg);

    let mut profile = match cfg.profile(&profile_name) {
        Ok(profile) => profile.clone(),
        Err(_) if global.profile.is_none() => Profile::new(FALLBACK_MGR),
        Err(err) => return Err(err.into()),
    };

    if let Some(ref mgr) = global.mgr {
        profile.mgr.clone_from(mgr);
    }
    if let Some(port) = global.mgr_port {
        profile.mgr_port = port;
    }
    if let Some(resource) = global.resource {
        profile.resource = resource;
    }
    if global.insecure {
        profile.insecure = Some(true);
    }

    Ok(Resolved {
        profile_name,
        profile,
        defaults: cfg.defaults,
    })
}

impl Resolved {
    /// `--output` if given, else the config default, else table.
    pub fn output(&self, global: &GlobalOpts) -> OutputFormat {
        global.output.unwrap_or_else(|| {
            OutputFormat::from_str(&self.defaults.output, true).unwrap_or(OutputFormat::Table)
        })
    }

    pub fn client(&self) -> Result<HttpClient, CliError> {
        let url = self.profile.manager_url()?;
        let transport = self.profile.transport(&self.defaults);
        HttpClient::new(url.clone(), &transport).map_err(|source| CliError::ConnectionFailed {
            url: url.to_string(),
            source,
        })
    }

    /// A port on this profile's resource. Full EIDs are taken as given.
    pub fn port_eid(&self, name: &str) -> Result<Eid, CliError> {
        if name.contains('.') {
            return Ok(Eid::parse(name)?);
        }
        Ok(Eid::new(
            lfctl_core::eid::DEFAULT_SHELF,
            self.profile.resource,
            name,
        ))
    }

    /// Merge command-line WiFi flags into the profile's settings.
    pub fn wifi(&self, opts: &WifiOpts) -> Result<WifiSettings, CliError> {
        let radio = opts
            .radio
            .as_deref()
            .or(self.profile.radio.as_deref())
            .ok_or_else(|| CliError::Validation {
                field: "radio".into(),
                reason: "no radio given; pass --radio or set radio in the profile".into(),
            })?;
        let ssid = opts
            .ssid
            .clone()
            .or_else(|| self.profile.ssid.clone())
            .ok_or_else(|| CliError::Validation {
                field: "ssid".into(),
                reason: "no SSID given; pass --ssid or set ssid in the profile".into(),
            })?;
        let passwd = opts
            .passwd
            .clone()
            .map(SecretString::from)
            .or_else(|| lfctl_config::resolve_passwd(&self.profile));

        Ok(WifiSettings {
            radio: self.port_eid(radio)?,
            ssid,
            security: opts.security.unwrap_or(self.profile.security),
            passwd,
        })
    }

    /// The radio for commands that need nothing else from [`WifiOpts`].
    pub fn radio(&self, radio: Option<&str>) -> Result<Eid, CliError> {
        let radio = radio
            .or(self.profile.radio.as_deref())
            .ok_or_else(|| CliError::Validation {
                field: "radio".into(),
                reason: "no radio given; pass --radio or set radio in the profile".into(),
            })?;
        self.port_eid(radio)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn resolved() -> Resolved {
        let mut profile = Profile::new("lf1");
        profile.resource = 2;
        profile.radio = Some("wiphy1".into());
        profile.ssid = Some("lab-net".into());
        profile.security = Security::Wpa2;
        Resolved {
            profile_name: "lab".into(),
            profile,
            defaults: Defaults::default(),
        }
    }

    fn no_overrides() -> WifiOpts {
        WifiOpts {
            radio: None,
            ssid: None,
            security: None,
            passwd: Some("passphrase".into()),
        }
    }

    #[test]
    fn bare_port_names_land_on_the_profile_resource() {
        assert_eq!(resolved().port_eid("wiphy0").unwrap(), Eid::new(1, 2, "wiphy0"));
        assert_eq!(resolved().port_eid("1.3.eth1").unwrap(), Eid::new(1, 3, "eth1"));
    }

    #[test]
    fn wifi_flags_override_the_profile() {
        let mut opts = no_overrides();
        opts.ssid = Some("other".into());
        opts.security = Some(Security::Wpa3);
        let wifi = resolved().wifi(&opts).unwrap();
        assert_eq!(wifi.radio, Eid::new(1, 2, "wiphy1"));
        assert_eq!(wifi.ssid, "other");
        assert_eq!(wifi.security, Security::Wpa3);

        let wifi = resolved().wifi(&no_overrides()).unwrap();
        assert_eq!(wifi.ssid, "lab-net");
        assert_eq!(wifi.security, Security::Wpa2);
    }

    #[test]
    fn missing_radio_is_a_validation_error() {
        let mut r = resolved();
        r.profile.radio = None;
        assert!(matches!(
            r.wifi(&no_overrides()),
            Err(CliError::Validation { ref field, .. }) if field == "radio"
        ));
    }
}
