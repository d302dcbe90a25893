//! Virtual AP command handlers.

use lfctl_core::{EntityRequest, VapSpec};

use crate::cli::{VapsArgs, VapsCommand};
use crate::error::CliError;

use super::{Context, util};

pub async fn handle(ctx: &Context, args: VapsArgs) -> Result<(), CliError> {
    match args.command {
        VapsCommand::Create { name, wifi, wait } => {
            let wifi = ctx.resolved.wifi(&wifi)?;
            let lifecycle = ctx.lifecycle()?;
            let spec = VapSpec {
                eid: wifi.radio.sibling(name),
                radio: wifi.radio.port.clone(),
                ssid: wifi.ssid,
                passwd: wifi.passwd,
            };
            let mut vap = lifecycle.create(&EntityRequest::VirtualAp(spec)).await?;
            if !wait.no_wait {
                lifecycle.await_presence(&mut vap).await?;
            }
            util::print_entities(ctx, std::slice::from_ref(&vap))
        }
    }
}
