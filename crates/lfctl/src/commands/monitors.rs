//! Monitor command handlers.

use lfctl_core::{EntityKind, EntityRequest, MonitorSpec};

use crate::cli::{MonitorsArgs, MonitorsCommand};
use crate::error::CliError;

use super::{Context, util};

pub async fn handle(ctx: &Context, args: MonitorsArgs) -> Result<(), CliError> {
    match args.command {
        MonitorsCommand::Create {
            name,
            radio,
            channel,
            frequency,
            country,
            flags,
            wait,
        } => {
            let radio = ctx.resolved.radio(radio.as_deref())?;
            let lifecycle = ctx.lifecycle()?;
            let mut spec =
                MonitorSpec::new(radio.sibling(name), radio.port.clone()).on_channel(channel, frequency);
            spec.country = country;
            for flag in flags {
                spec.set_flag(flag, true);
            }
            let mut monitor = lifecycle.create(&EntityRequest::Monitor(spec)).await?;
            if !wait.no_wait {
                lifecycle.await_presence(&mut monitor).await?;
            }
            util::print_entities(ctx, std::slice::from_ref(&monitor))
        }

        MonitorsCommand::Sniff {
            name,
            duration,
            pcap_name,
        } => {
            let eid = ctx.resolved.port_eid(&name)?;
            let lifecycle = ctx.lifecycle()?;
            let monitor = lifecycle
                .adopt_port(EntityKind::Monitor, &eid)
                .await?
                .ok_or_else(|| CliError::NotFound {
                    resource_type: "monitor".into(),
                    identifier: eid.to_string(),
                    list_command: "ports list".into(),
                })?;
            lifecycle.start_sniff(&monitor, duration, &pcap_name).await?;
            ctx.print(&format!(
                "Capturing on {eid} for {} into {pcap_name}",
                humantime::format_duration(duration)
            ));
            Ok(())
        }
    }
}
