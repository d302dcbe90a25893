//! Event command handlers.

use tabled::Tabled;

use lfctl_core::EventRecord;
use lfctl_core::inventory;

use crate::cli::{EventsArgs, EventsCommand};
use crate::error::CliError;
use crate::output;

use super::Context;

#[derive(Tabled)]
struct EventRow {
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Entity")]
    entity: String,
    #[tabled(rename = "Event")]
    event: String,
    #[tabled(rename = "Description")]
    description: String,
}

impl From<&EventRecord> for EventRow {
    fn from(e: &EventRecord) -> Self {
        Self {
            time: e.time_stamp.clone().unwrap_or_default(),
            entity: e.entity.clone().unwrap_or_default(),
            event: e.event.clone().unwrap_or_default(),
            description: e.description.clone().unwrap_or_default(),
        }
    }
}

pub async fn handle(ctx: &Context, args: EventsArgs) -> Result<(), CliError> {
    match args.command {
        EventsCommand::List { limit } => {
            let mut events = inventory::list_events(&ctx.client).await?;
            let skip = events.len().saturating_sub(limit);
            events.drain(..skip);
            let out = output::render_list(ctx.output, &events, |e| EventRow::from(e), |e| e.id.clone())?;
            ctx.print(&out);
            Ok(())
        }
    }
}
