//! Port inventory command handlers.

use tabled::Tabled;
use tracing::warn;

use lfctl_core::inventory;
use lfctl_core::{EntityKind, NamePattern, PortRecord};

use crate::cli::{PortsArgs, PortsCommand, WaitOpts};
use crate::error::CliError;
use crate::output;

use super::{Context, util};

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct PortRow {
    #[tabled(rename = "EID")]
    eid: String,
    #[tabled(rename = "Alias")]
    alias: String,
    #[tabled(rename = "Type")]
    port_type: String,
    #[tabled(rename = "Admin")]
    admin: String,
    #[tabled(rename = "IP")]
    ip: String,
    #[tabled(rename = "MAC")]
    mac: String,
}

impl PortRow {
    fn new(p: &PortRecord, color: bool) -> Self {
        let admin = if p.phantom {
            "phantom".to_owned()
        } else {
            p.admin_state().to_string()
        };
        Self {
            eid: p.eid.to_string(),
            alias: p.alias.clone(),
            port_type: p.port_type.clone().unwrap_or_default(),
            admin: output::paint_state(&admin, color),
            ip: p.ip.clone().unwrap_or_default(),
            mac: p.mac.clone().unwrap_or_default(),
        }
    }
}

/// Entity kind for a port-table type string; `None` for ports that are
/// not removable virtual interfaces.
fn virtual_kind(port_type: Option<&str>) -> Option<EntityKind> {
    let port_type = port_type?.to_ascii_uppercase();
    if port_type.contains("STA") {
        Some(EntityKind::Station)
    } else if port_type.contains("MON") {
        Some(EntityKind::Monitor)
    } else if port_type.contains("AP") {
        Some(EntityKind::VirtualAp)
    } else {
        None
    }
}

async fn matching_ports(ctx: &Context, pattern: Option<&str>) -> Result<Vec<PortRecord>, CliError> {
    let pattern = pattern.map(NamePattern::parse);
    let mut ports = inventory::list_ports(&ctx.client).await?;
    if let Some(pattern) = pattern {
        ports.retain(|p| pattern.matches(&p.eid.port));
    }
    ports.sort_by(|a, b| a.eid.cmp(&b.eid));
    Ok(ports)
}

pub async fn handle(ctx: &Context, args: PortsArgs) -> Result<(), CliError> {
    match args.command {
        PortsCommand::List { pattern } => {
            let ports = matching_ports(ctx, pattern.as_deref()).await?;
            let out = output::render_list(
                ctx.output,
                &ports,
                |p| PortRow::new(p, ctx.color),
                |p| p.eid.to_string(),
            )?;
            ctx.print(&out);
            Ok(())
        }

        PortsCommand::Remove { pattern, wait } => remove(ctx, &pattern, &wait).await,
    }
}

async fn remove(ctx: &Context, pattern: &str, wait: &WaitOpts) -> Result<(), CliError> {
    let ports = matching_ports(ctx, Some(pattern)).await?;
    let mut lifecycle = ctx.lifecycle()?;

    let mut doomed = Vec::new();
    for port in &ports {
        let Some(kind) = virtual_kind(port.port_type.as_deref()) else {
            warn!(eid = %port.eid, port_type = ?port.port_type, "not a virtual port, skipping");
            continue;
        };
        doomed.extend(lifecycle.adopt_port(kind, &port.eid).await?);
    }
    if doomed.is_empty() {
        eprintln!("No removable ports match '{pattern}'");
        return Ok(());
    }
    if !util::confirm(&format!("Remove {} port(s)?", doomed.len()), ctx.yes)? {
        return Ok(());
    }

    for entity in &mut doomed {
        lifecycle.remove(entity).await?;
    }
    if !wait.no_wait {
        for entity in &mut doomed {
            lifecycle.await_absence(entity).await?;
        }
    }
    util::print_entities(ctx, &doomed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_types_map_to_virtual_kinds() {
        assert_eq!(virtual_kind(Some("WIFI-STA")), Some(EntityKind::Station));
        assert_eq!(virtual_kind(Some("WIFI-AP")), Some(EntityKind::VirtualAp));
        assert_eq!(virtual_kind(Some("WIFI-MONITOR")), Some(EntityKind::Monitor));
        assert_eq!(virtual_kind(Some("Ethernet")), None);
        assert_eq!(virtual_kind(None), None);
    }
}
