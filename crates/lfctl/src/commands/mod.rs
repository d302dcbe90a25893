//! Command dispatch: bridges CLI args -> core operations -> output formatting.

pub mod config_cmd;
pub mod eid;
pub mod events;
pub mod flags;
pub mod generic;
pub mod monitors;
pub mod phantom;
pub mod ports;
pub mod stations;
pub mod util;
pub mod vaps;

use lfctl_api::HttpClient;
use lfctl_core::{FlagComposer, LifecycleController};

use crate::cli::{Command, GlobalOpts, OutputFormat};
use crate::config::Resolved;
use crate::error::CliError;
use crate::output;

/// Everything a handler needs: the resolved profile, a client for its
/// manager, and output settings.
pub struct Context {
    pub resolved: Resolved,
    pub client: HttpClient,
    pub output: OutputFormat,
    pub color: bool,
    pub quiet: bool,
    pub yes: bool,
}

impl Context {
    pub fn new(resolved: Resolved, global: &GlobalOpts) -> Result<Self, CliError> {
        Ok(Self {
            client: resolved.client()?,
            output: resolved.output(global),
            color: output::should_color(global.color),
            quiet: global.quiet,
            yes: global.yes,
            resolved,
        })
    }

    /// A lifecycle controller using the profile's poll policies.
    pub fn lifecycle(&self) -> Result<LifecycleController<HttpClient>, CliError> {
        Ok(LifecycleController::new(
            self.client.clone(),
            FlagComposer::standard()?.clone(),
            self.resolved.defaults.lifecycle_policy(),
        ))
    }

    pub fn print(&self, rendered: &str) {
        output::print_output(rendered, self.quiet);
    }
}

/// Dispatch a controller-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, ctx: &Context) -> Result<(), CliError> {
    match cmd {
        Command::Stations(args) => stations::handle(ctx, args).await,
        Command::Vaps(args) => vaps::handle(ctx, args).await,
        Command::Monitors(args) => monitors::handle(ctx, args).await,
        Command::Ports(args) => ports::handle(ctx, args).await,
        Command::Generic(args) => generic::handle(ctx, args).await,
        Command::Phantom(args) => phantom::handle(ctx, args).await,
        Command::Events(args) => events::handle(ctx, args).await,
        Command::Flags(args) => flags::handle(ctx, args),
        Command::Eid(args) => eid::handle(ctx, &args),
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
