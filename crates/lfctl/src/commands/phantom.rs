//! Phantom record command handlers.

use serde::Serialize;
use tabled::Tabled;

use lfctl_core::{PhantomReaper, PhantomRecord, SWEEP_ORDER, SweepCategory, SweepReport};

use crate::cli::{PhantomArgs, PhantomCommand};
use crate::error::CliError;
use crate::output;

use super::{Context, util};

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Serialize)]
struct Finding {
    category: SweepCategory,
    record: PhantomRecord,
}

#[derive(Tabled)]
struct FindingRow {
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Record")]
    record: String,
}

#[derive(Tabled)]
struct ReportRow {
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Scanned")]
    scanned: usize,
    #[tabled(rename = "Removed")]
    removed: usize,
    #[tabled(rename = "Failed")]
    failed: String,
}

impl From<&SweepReport> for ReportRow {
    fn from(r: &SweepReport) -> Self {
        Self {
            category: r.category.to_string(),
            scanned: r.scanned,
            removed: r.removed.len(),
            failed: if r.failed.is_empty() {
                "0".into()
            } else {
                r.failed
                    .iter()
                    .map(|(record, reason)| format!("{record}: {reason}"))
                    .collect::<Vec<_>>()
                    .join("\n")
            },
        }
    }
}

/// The requested categories, or every category in sweep order.
fn selected(categories: Vec<SweepCategory>) -> Vec<SweepCategory> {
    if categories.is_empty() {
        SWEEP_ORDER.to_vec()
    } else {
        categories
    }
}

// ── Handlers ────────────────────────────────────────────────────────

pub async fn handle(ctx: &Context, args: PhantomArgs) -> Result<(), CliError> {
    let reaper = PhantomReaper::new(&ctx.client)
        .with_test_mgr(ctx.resolved.defaults.cross_connect_policy().test_mgr);

    match args.command {
        PhantomCommand::List { categories } => {
            let mut findings = Vec::new();
            for category in selected(categories) {
                let (_, phantoms) = reaper.scan(category).await?;
                findings.extend(phantoms.into_iter().map(|record| Finding { category, record }));
            }
            let out = output::render_list(
                ctx.output,
                &findings,
                |f| FindingRow {
                    category: f.category.to_string(),
                    record: f.record.to_string(),
                },
                |f| f.record.to_string(),
            )?;
            ctx.print(&out);
            Ok(())
        }

        PhantomCommand::Sweep { categories } => {
            let categories = selected(categories);
            let names: Vec<String> = categories.iter().map(ToString::to_string).collect();
            let prompt = format!("Remove phantom records in {}?", names.join(", "));
            if !util::confirm(&prompt, ctx.yes)? {
                return Ok(());
            }

            let mut reports = Vec::with_capacity(categories.len());
            for category in categories {
                reports.push(reaper.sweep(category).await?);
            }
            let out = output::render_list(ctx.output, &reports, |r| ReportRow::from(r), |r| {
                format!("{}\t{}", r.category, r.removed.len())
            })?;
            ctx.print(&out);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_category_means_all_in_order() {
        assert_eq!(selected(Vec::new()), SWEEP_ORDER);
        assert_eq!(
            selected(vec![SweepCategory::Ports]),
            [SweepCategory::Ports]
        );
    }
}
