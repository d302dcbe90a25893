//! Generic traffic connection command handlers.

use tabled::Tabled;

use lfctl_core::{
    CrossConnectBuilder, CrossConnectPlan, CrossConnectRecord, CrossConnection, GenericCommand,
    RemovalPolicy, inventory,
};

use crate::cli::{GenericArgs, GenericCommandArgs, GenericKind};
use crate::error::CliError;
use crate::output;

use super::{Context, util};

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct ConnectionRow {
    #[tabled(rename = "Alias")]
    alias: String,
    #[tabled(rename = "TX")]
    tx: String,
    #[tabled(rename = "RX")]
    rx: String,
    #[tabled(rename = "State")]
    state: String,
}

impl ConnectionRow {
    fn new(c: &CrossConnection, color: bool) -> Self {
        Self {
            alias: c.alias.clone(),
            tx: c.tx_endpoint.clone(),
            rx: c.rx_endpoint.clone(),
            state: output::paint_state(&c.run_state.to_string(), color),
        }
    }
}

#[derive(Tabled)]
struct RecordRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    cx_type: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Phantom")]
    phantom: String,
}

impl RecordRow {
    fn new(cx: &CrossConnectRecord, color: bool) -> Self {
        Self {
            name: cx.name.clone(),
            cx_type: cx.cx_type.clone().unwrap_or_default(),
            state: output::paint_state(&cx.state, color),
            phantom: if cx.phantom { "yes".into() } else { String::new() },
        }
    }
}

fn print_connections(ctx: &Context, connections: &[CrossConnection]) -> Result<(), CliError> {
    let out = output::render_list(
        ctx.output,
        connections,
        |c| ConnectionRow::new(c, ctx.color),
        |c| c.alias.clone(),
    )?;
    ctx.print(&out);
    Ok(())
}

// ── Argument translation ────────────────────────────────────────────

struct CommandOpts {
    kind: GenericKind,
    dest: Option<String>,
    interval: u32,
    cmd: Option<String>,
    file_output: Option<String>,
    loop_count: u32,
}

impl CommandOpts {
    /// Missing strings become empty and are rejected by the core's own
    /// validation, before anything is posted.
    fn into_command(self) -> GenericCommand {
        let dest = self.dest.unwrap_or_default();
        match self.kind {
            GenericKind::Lfping => GenericCommand::Lfping {
                interval: self.interval,
                dest,
            },
            GenericKind::Generic => GenericCommand::Generic {
                command: self.cmd.unwrap_or_default(),
            },
            GenericKind::Speedtest => GenericCommand::Speedtest,
            GenericKind::Iperf3 => GenericCommand::Iperf3 { dest },
            GenericKind::Lfcurl => GenericCommand::Lfcurl {
                dest,
                file_output: self.file_output.unwrap_or_default(),
                loop_count: self.loop_count,
            },
        }
    }
}

/// Endpoint names for a connection built with the conventional layout.
fn conventional_endpoints(alias: &str) -> (String, String) {
    let tx = alias.strip_prefix("CX_").unwrap_or(alias).to_owned();
    let rx = format!("D_{tx}");
    (tx, rx)
}

// ── Handlers ────────────────────────────────────────────────────────

pub async fn handle(ctx: &Context, args: GenericArgs) -> Result<(), CliError> {
    let mut lifecycle = ctx.lifecycle()?;
    let mut builder =
        CrossConnectBuilder::new(&mut lifecycle, ctx.resolved.defaults.cross_connect_policy());

    match args.command {
        GenericCommandArgs::List => {
            let records = inventory::list_cross_connects(&ctx.client).await?;
            let out = output::render_list(
                ctx.output,
                &records,
                |cx| RecordRow::new(cx, ctx.color),
                |cx| cx.name.clone(),
            )?;
            ctx.print(&out);
            Ok(())
        }

        GenericCommandArgs::Create {
            ports,
            kind,
            dest,
            interval,
            cmd,
            file_output,
            loop_count,
            prefix,
            start,
        } => {
            let command = CommandOpts {
                kind,
                dest,
                interval,
                cmd,
                file_output,
                loop_count,
            }
            .into_command();
            let plans = ports
                .iter()
                .map(|p| {
                    let eid = ctx.resolved.port_eid(p)?;
                    Ok(CrossConnectPlan::generic(&prefix, &eid, command.clone()))
                })
                .collect::<Result<Vec<_>, CliError>>()?;

            let mut built = builder.build(&plans).await?;
            if start {
                for connection in &mut built {
                    builder.start(&connection.alias).await?;
                    connection.run_state = lfctl_core::RunState::Running;
                }
            }
            print_connections(ctx, &built)
        }

        GenericCommandArgs::Start { aliases } => {
            for alias in &aliases {
                builder.start(alias).await?;
            }
            Ok(())
        }

        GenericCommandArgs::Stop { aliases } => {
            for alias in &aliases {
                builder.stop(alias).await?;
            }
            Ok(())
        }

        GenericCommandArgs::Remove {
            aliases,
            connection_only,
            cascade,
        } => {
            let policy = if connection_only {
                RemovalPolicy::ConnectionOnly
            } else if cascade {
                RemovalPolicy::CascadeEndpoints
            } else {
                ctx.resolved.defaults.removal_policy()
            };

            let mut connections = Vec::with_capacity(aliases.len());
            for alias in &aliases {
                let (tx, rx) = conventional_endpoints(alias);
                let connection = builder.adopt(alias, &tx, &rx).await?.ok_or_else(|| {
                    CliError::NotFound {
                        resource_type: "cross-connect".into(),
                        identifier: alias.clone(),
                        list_command: "generic list".into(),
                    }
                })?;
                connections.push(connection);
            }

            let prompt = format!("Remove {} connection(s) ({policy})?", connections.len());
            if !util::confirm(&prompt, ctx.yes)? {
                return Ok(());
            }
            for connection in &mut connections {
                builder.teardown(connection, policy).await?;
            }
            print_connections(ctx, &connections)
        }
    }
}
