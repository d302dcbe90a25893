//! Shared helpers for command handlers.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tabled::Tabled;

use lfctl_core::eid::DEFAULT_PADDING;
use lfctl_core::{Eid, ManagedEntity, StationSlot, generate_series};

use crate::cli::StationSelection;
use crate::config::Resolved;
use crate::error::CliError;
use crate::output;

use super::Context;

// ── Entity table ─────────────────────────────────────────────────────

#[derive(Tabled)]
pub struct EntityRow {
    #[tabled(rename = "EID")]
    eid: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Alias")]
    alias: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Admin")]
    admin: String,
}

impl EntityRow {
    pub fn new(entity: &ManagedEntity, color: bool) -> Self {
        Self {
            eid: entity.eid.to_string(),
            kind: entity.kind.to_string(),
            alias: entity.alias.clone(),
            state: output::paint_state(&entity.state.to_string(), color),
            admin: entity
                .admin_state
                .map_or_else(|| "-".into(), |s| output::paint_state(&s.to_string(), color)),
        }
    }
}

/// Render managed entities in the session's output format.
pub fn print_entities(ctx: &Context, entities: &[ManagedEntity]) -> Result<(), CliError> {
    let out = output::render_list(
        ctx.output,
        entities,
        |e| EntityRow::new(e, ctx.color),
        |e| e.eid.to_string(),
    )?;
    ctx.print(&out);
    Ok(())
}

// ── Station selection ────────────────────────────────────────────────

/// Station names selected by `select`, as bare port names.
pub fn station_names(select: &StationSelection) -> Vec<String> {
    if !select.sta_name.is_empty() {
        return select.sta_name.clone();
    }
    if select.num_stations == 0 {
        return Vec::new();
    }
    let end_id = select.start_id.saturating_add(select.num_stations - 1);
    generate_series(&select.sta_prefix, select.start_id, end_id, DEFAULT_PADDING)
        .iter()
        .collect()
}

/// Selected stations as EIDs on the profile's resource.
pub fn station_eids(resolved: &Resolved, select: &StationSelection) -> Result<Vec<Eid>, CliError> {
    station_names(select)
        .iter()
        .map(|name| resolved.port_eid(name))
        .collect()
}

/// Selected stations bound to `radio`, on the radio's shelf and resource.
pub fn station_slots(select: &StationSelection, radio: &Eid) -> Vec<StationSlot> {
    station_names(select)
        .into_iter()
        .map(|name| StationSlot {
            eid: radio.sibling(name),
            radio: radio.port.clone(),
        })
        .collect()
}

// ── Interaction ──────────────────────────────────────────────────────

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// A progress bar over `len` steps, hidden in quiet mode.
pub fn progress(ctx: &Context, len: usize, message: &'static str) -> ProgressBar {
    if ctx.quiet {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(u64::try_from(len).unwrap_or(u64::MAX));
    bar.set_style(
        ProgressStyle::with_template("{spinner} {msg} [{bar:30}] {pos}/{len} {wide_msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );
    bar.set_message(message);
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}
