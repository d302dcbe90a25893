//! Entity id command handlers. These never contact the controller.

use serde::Serialize;
use tabled::Tabled;

use lfctl_core::Eid;

use crate::cli::{EidArgs, EidCommand};
use crate::error::CliError;
use crate::output;

use super::{Context, util};

#[derive(Tabled)]
struct EidRow {
    #[tabled(rename = "EID")]
    eid: String,
    #[tabled(rename = "Shelf")]
    shelf: u32,
    #[tabled(rename = "Resource")]
    resource: u32,
    #[tabled(rename = "Port")]
    port: String,
}

impl From<&Eid> for EidRow {
    fn from(e: &Eid) -> Self {
        Self {
            eid: e.to_string(),
            shelf: e.shelf,
            resource: e.resource,
            port: e.port.clone(),
        }
    }
}

#[derive(Serialize)]
struct SlotView {
    eid: Eid,
    radio: String,
}

#[derive(Tabled)]
struct SlotRow {
    #[tabled(rename = "EID")]
    eid: String,
    #[tabled(rename = "Radio")]
    radio: String,
}

pub fn handle(ctx: &Context, args: &EidArgs) -> Result<(), CliError> {
    match &args.command {
        EidCommand::Parse { eids } => {
            let parsed = eids
                .iter()
                .map(|text| Eid::parse(text))
                .collect::<Result<Vec<_>, _>>()?;
            let out = output::render_list(ctx.output, &parsed, |e| EidRow::from(e), |e| e.to_string())?;
            ctx.print(&out);
            Ok(())
        }

        EidCommand::Series { select, radio } => {
            let radio = ctx.resolved.radio(radio.as_deref())?;
            let slots: Vec<SlotView> = util::station_slots(select, &radio)
                .into_iter()
                .map(|s| SlotView {
                    eid: s.eid,
                    radio: s.radio,
                })
                .collect();
            let out = output::render_list(
                ctx.output,
                &slots,
                |s| SlotRow {
                    eid: s.eid.to_string(),
                    radio: s.radio.clone(),
                },
                |s| s.eid.to_string(),
            )?;
            ctx.print(&out);
            Ok(())
        }
    }
}
