//! Config subcommand handlers. These work without a controller.

use std::fmt::Write as _;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, save_config};
use crate::error::CliError;

/// Format config for display, masking the passphrase.
fn format_config_redacted(cfg: &Config) -> String {
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let d = &cfg.defaults;
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", d.output);
    let _ = writeln!(out, "poll_interval_ms = {}", d.poll_interval_ms);
    let _ = writeln!(out, "create_timeout_secs = {}", d.create_timeout_secs);
    let _ = writeln!(out, "remove_timeout_secs = {}", d.remove_timeout_secs);
    let _ = writeln!(out, "admin_timeout_secs = {}", d.admin_timeout_secs);
    let _ = writeln!(out, "step_delay_ms = {}", d.step_delay_ms);
    let _ = writeln!(out, "cascade_endpoints = {}", d.cascade_endpoints);
    let _ = writeln!(out, "preflight = {}", d.preflight);
    let _ = writeln!(out, "request_timeout_secs = {}", d.request_timeout_secs);

    for name in cfg.profile_names() {
        let p = &cfg.profiles[&name];
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        let _ = writeln!(out, "mgr = \"{}\"", p.mgr);
        let _ = writeln!(out, "mgr_port = {}", p.mgr_port);
        let _ = writeln!(out, "resource = {}", p.resource);
        if let Some(ref radio) = p.radio {
            let _ = writeln!(out, "radio = \"{radio}\"");
        }
        if let Some(ref ssid) = p.ssid {
            let _ = writeln!(out, "ssid = \"{ssid}\"");
        }
        let _ = writeln!(out, "security = \"{}\"", p.security);
        if p.passwd.is_some() {
            let _ = writeln!(out, "passwd = \"****\"");
        }
        if let Some(ref env) = p.passwd_env {
            let _ = writeln!(out, "passwd_env = \"{env}\"");
        }
        if let Some(insecure) = p.insecure {
            let _ = writeln!(out, "insecure = {insecure}");
        }
    }

    out
}

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            println!("{}", config::config_path().display());
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = config::load_config()?;
            let active = config::active_profile_name(global, &cfg);
            eprintln!("# {} (active profile: {active})", config::config_path().display());
            print!("{}", format_config_redacted(&cfg));
            Ok(())
        }

        ConfigCommand::Profiles => {
            let cfg = config::load_config()?;
            let default = cfg.default_profile.as_deref().unwrap_or("default");
            let names = cfg.profile_names();
            if names.is_empty() {
                eprintln!(
                    "No profiles configured. Add a [profiles.<name>] table to {}",
                    config::config_path().display()
                );
            }
            for name in names {
                let marker = if name == default { " *" } else { "" };
                println!("{name}{marker}");
            }
            Ok(())
        }

        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config()?;
            cfg.profile(&name)?;
            cfg.default_profile = Some(name.clone());
            save_config(&cfg)?;
            eprintln!("✓ Default profile set to '{name}'");
            Ok(())
        }
    }
}
