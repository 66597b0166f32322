use anyhow::{Result, bail};
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use tally_core::service::{ActivityProgress, TallyService};

use super::found;
use super::helpers::{format_quantity, period_start, progress_bar};

fn status(p: &ActivityProgress) -> String {
    match (p.canonical.achieved, p.progress.fraction()) {
        (Some(true), _) => "done".to_string(),
        (Some(false), Some(f)) => format!("{} {:.0}%", progress_bar(f), f * 100.0),
        (Some(false), None) => "open".to_string(),
        (None, _) => "no goal".to_string(),
    }
}

pub(crate) fn cmd_progress(
    service: &TallyService,
    activity: Option<&str>,
    days: Option<u32>,
    since: Option<&str>,
    unit: Option<&str>,
    json: bool,
) -> Result<()> {
    let since = period_start(days, since)?;

    let progress = match activity {
        Some(name) => {
            let activity = found(service.resolve_activity_type(name), json)?;
            let unit_id = match unit {
                Some(u) => Some(found(service.resolve_unit(u), json)?.id),
                None => None,
            };
            vec![service.goal_progress(activity.id, since, unit_id)?]
        }
        None if unit.is_some() => bail!("--unit needs an activity"),
        None => service.all_progress(since)?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&progress)?);
        return Ok(());
    }
    if progress.is_empty() {
        eprintln!("No activities yet. Use `tally activity add <name> <group>`.");
        return Ok(());
    }

    #[derive(Tabled)]
    struct ProgressRow {
        #[tabled(rename = "Activity")]
        activity: String,
        #[tabled(rename = "Logs")]
        logs: usize,
        #[tabled(rename = "Total")]
        total: String,
        #[tabled(rename = "Goal")]
        goal: String,
        #[tabled(rename = "Remaining")]
        remaining: String,
        #[tabled(rename = "Unit")]
        unit: String,
        #[tabled(rename = "Status")]
        status: String,
    }

    let rows: Vec<ProgressRow> = progress
        .iter()
        .map(|p| ProgressRow {
            activity: p.activity.name.clone(),
            logs: p.log_count,
            total: format_quantity(p.progress.total),
            goal: p.progress.goal.map_or_else(|| "-".to_string(), format_quantity),
            remaining: p
                .progress
                .remaining
                .map_or_else(|| "-".to_string(), format_quantity),
            unit: p.unit.name.clone(),
            status: status(p),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..5)).with(Alignment::right()))
        .to_string();
    println!("{table}");

    Ok(())
}
