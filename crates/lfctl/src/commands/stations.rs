//! Station command handlers.

use lfctl_core::{
    AdminState, EntityKind, EntityRequest, ManagedEntity, PortChanges, StationSpec,
};
use tracing::info;

use crate::cli::{StationSelection, StationsArgs, StationsCommand, WaitOpts, WifiOpts};
use crate::error::CliError;

use super::{Context, util};

pub async fn handle(ctx: &Context, args: StationsArgs) -> Result<(), CliError> {
    match args.command {
        StationsCommand::Create {
            select,
            wifi,
            admin_down,
            no_dhcp,
            wait,
        } => create(ctx, &select, &wifi, admin_down, !no_dhcp, &wait).await,
        StationsCommand::Remove { select, wait } => remove(ctx, &select, &wait).await,
        StationsCommand::Up { select, wait } => set_admin(ctx, &select, AdminState::Up, &wait).await,
        StationsCommand::Down { select, wait } => {
            set_admin(ctx, &select, AdminState::Down, &wait).await
        }
    }
}

/// Create every selected station admin-down, confirm them all, enable
/// DHCP, then bring them up.
async fn create(
    ctx: &Context,
    select: &StationSelection,
    wifi: &WifiOpts,
    admin_down: bool,
    dhcp: bool,
    wait: &WaitOpts,
) -> Result<(), CliError> {
    let wifi = ctx.resolved.wifi(wifi)?;
    let slots = util::station_slots(select, &wifi.radio);
    let lifecycle = ctx.lifecycle()?;

    let bar = util::progress(ctx, slots.len(), "requesting");
    let mut stations: Vec<ManagedEntity> = Vec::with_capacity(slots.len());
    for slot in slots {
        let spec = StationSpec::new(slot, wifi.ssid.clone())
            .with_security(wifi.security, wifi.passwd.clone());
        stations.push(lifecycle.create(&EntityRequest::Station(spec)).await?);
        bar.inc(1);
    }
    bar.finish_and_clear();

    if wait.no_wait {
        return util::print_entities(ctx, &stations);
    }

    let bar = util::progress(ctx, stations.len(), "confirming");
    for station in &mut stations {
        lifecycle.await_presence(station).await?;
        bar.inc(1);
    }
    bar.finish_and_clear();

    let changes = PortChanges {
        dhcp: Some(dhcp),
        ..PortChanges::default()
    };
    for station in &mut stations {
        lifecycle.configure(station, &changes).await?;
    }

    if !admin_down {
        for station in &mut stations {
            lifecycle.admin_up(station).await?;
        }
        let bar = util::progress(ctx, stations.len(), "bringing up");
        for station in &mut stations {
            lifecycle.await_admin_state(station, AdminState::Up).await?;
            bar.inc(1);
        }
        bar.finish_and_clear();
    }

    info!(count = stations.len(), ssid = %wifi.ssid, "stations ready");
    util::print_entities(ctx, &stations)
}

/// Adopt the selected stations the controller knows about.
async fn adopt_selected(
    ctx: &Context,
    lifecycle: &lfctl_core::LifecycleController<lfctl_api::HttpClient>,
    select: &StationSelection,
) -> Result<Vec<ManagedEntity>, CliError> {
    let mut found = Vec::new();
    for eid in util::station_eids(&ctx.resolved, select)? {
        match lifecycle.adopt_port(EntityKind::Station, &eid).await? {
            Some(entity) => found.push(entity),
            None => info!(%eid, "station not present, skipping"),
        }
    }
    Ok(found)
}

async fn remove(ctx: &Context, select: &StationSelection, wait: &WaitOpts) -> Result<(), CliError> {
    let mut lifecycle = ctx.lifecycle()?;
    let mut stations = adopt_selected(ctx, &lifecycle, select).await?;
    if stations.is_empty() {
        eprintln!("No matching stations");
        return Ok(());
    }
    if !util::confirm(&format!("Remove {} station(s)?", stations.len()), ctx.yes)? {
        return Ok(());
    }

    for station in &mut stations {
        lifecycle.remove(station).await?;
    }
    if !wait.no_wait {
        let bar = util::progress(ctx, stations.len(), "confirming removal");
        for station in &mut stations {
            lifecycle.await_absence(station).await?;
            bar.inc(1);
        }
        bar.finish_and_clear();
    }
    util::print_entities(ctx, &stations)
}

async fn set_admin(
    ctx: &Context,
    select: &StationSelection,
    target: AdminState,
    wait: &WaitOpts,
) -> Result<(), CliError> {
    let lifecycle = ctx.lifecycle()?;
    let mut stations = adopt_selected(ctx, &lifecycle, select).await?;
    if stations.is_empty() {
        return Err(CliError::NotFound {
            resource_type: "station".into(),
            identifier: util::station_names(select).join(", "),
            list_command: "ports list".into(),
        });
    }

    for station in &mut stations {
        match target {
            AdminState::Up => lifecycle.admin_up(station).await?,
            AdminState::Down => lifecycle.admin_down(station).await?,
        }
    }
    if !wait.no_wait {
        for station in &mut stations {
            lifecycle.await_admin_state(station, target).await?;
        }
    }
    util::print_entities(ctx, &stations)
}
