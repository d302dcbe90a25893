//! Flag mask command handlers. These never contact the controller.

use serde::Serialize;
use tabled::Tabled;

use lfctl_core::{FlagComposer, Namespace};

use crate::cli::{FlagsArgs, FlagsCommand};
use crate::error::CliError;
use crate::output;

use super::Context;

#[derive(Debug, Serialize)]
struct Mask {
    namespace: Namespace,
    value: u64,
    hex: String,
    names: Vec<&'static str>,
    /// Set bits no symbol in the namespace accounts for.
    unknown: u64,
}

#[derive(Tabled)]
struct NameRow {
    #[tabled(rename = "Flag")]
    name: &'static str,
    #[tabled(rename = "Bit")]
    bit: String,
}

fn parse_mask(text: &str) -> Result<u64, CliError> {
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => text.parse::<u64>(),
    };
    parsed.map_err(|e| CliError::Validation {
        field: "value".into(),
        reason: format!("'{text}' is not a decimal or 0x-prefixed mask: {e}"),
    })
}

fn describe(flags: &FlagComposer, namespace: Namespace, value: u64) -> Mask {
    Mask {
        namespace,
        value,
        hex: format!("{value:#x}"),
        names: flags.decompose(namespace, value).into_iter().collect(),
        unknown: flags.unknown_bits(namespace, value),
    }
}

fn detail(mask: &Mask) -> String {
    let mut lines = vec![
        format!("Namespace: {}", mask.namespace),
        format!("Value:     {} ({})", mask.value, mask.hex),
        format!("Flags:     {}", mask.names.join(" | ")),
    ];
    if mask.unknown != 0 {
        lines.push(format!("Unknown:   {:#x}", mask.unknown));
    }
    lines.join("\n")
}

pub fn handle(ctx: &Context, args: FlagsArgs) -> Result<(), CliError> {
    let flags = FlagComposer::standard()?;
    match args.command {
        FlagsCommand::Compose { namespace, names } => {
            let value = flags.compose(namespace, &names)?;
            let mask = describe(flags, namespace, value);
            let out = output::render_single(ctx.output, &mask, detail, |m| m.value.to_string())?;
            ctx.print(&out);
            Ok(())
        }

        FlagsCommand::Decompose { namespace, value } => {
            let value = parse_mask(&value)?;
            let mask = describe(flags, namespace, value);
            if ctx.output == crate::cli::OutputFormat::Table {
                let rows: Vec<NameRow> = mask
                    .names
                    .iter()
                    .map(|&name| NameRow {
                        name,
                        bit: flags
                            .compose(namespace, [name])
                            .map_or_else(|_| "?".into(), |bit| format!("{bit:#x}")),
                    })
                    .collect();
                let mut out = tabled::Table::new(rows)
                    .with(tabled::settings::Style::rounded())
                    .to_string();
                if mask.unknown != 0 {
                    out.push_str(&format!("\nunknown bits: {:#x}", mask.unknown));
                }
                ctx.print(&out);
                return Ok(());
            }
            let out = output::render_single(ctx.output, &mask, detail, |m| m.names.join("\n"))?;
            ctx.print(&out);
            Ok(())
        }
    }
}
