use anyhow::{Result, bail};
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use tally_core::models::{ActivityType, DisplayedLog, NewActivityLog, UpdateActivityLog};
use tally_core::service::TallyService;

use super::found;
use super::helpers::{format_quantity, parse_quantity_with_unit, period_start, pick_unit, truncate};

/// Resolve an optional unit name; `None` lets the service use the canonical unit.
fn resolve_unit_id(service: &TallyService, unit: Option<&str>, json: bool) -> Result<Option<i64>> {
    match unit {
        Some(name) => Ok(Some(found(service.resolve_unit(name), json)?.id)),
        None => Ok(None),
    }
}

fn print_log(log: &DisplayedLog, activity: &ActivityType) {
    println!(
        "[{}] {}: {} {} ({})",
        log.log.id,
        activity.name,
        format_quantity(log.display_quantity),
        log.display_unit_name,
        log.log.timestamp.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M")
    );
    if let Some(ref n) = log.log.note {
        println!("  Note: {n}");
    }
}

pub(crate) fn cmd_log(
    service: &TallyService,
    activity: &str,
    quantity: &str,
    unit: Option<String>,
    note: Option<String>,
    json: bool,
) -> Result<()> {
    let activity = found(service.resolve_activity_type(activity), json)?;
    let (quantity, embedded) = parse_quantity_with_unit(quantity)?;
    let unit = pick_unit(embedded, unit)?;
    let unit_id = match resolve_unit_id(service, unit.as_deref(), json)? {
        Some(id) => id,
        None => service.canonical_unit(activity.unit_group_id)?.id,
    };

    let log = service.log_activity(&NewActivityLog {
        activity_type_id: activity.id,
        quantity,
        unit_id,
        note,
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&log)?);
    } else {
        print!("Logged ");
        print_log(&log, &activity);
    }

    Ok(())
}

pub(crate) fn cmd_logs(
    service: &TallyService,
    activity: &str,
    unit: Option<&str>,
    days: Option<u32>,
    since: Option<&str>,
    json: bool,
) -> Result<()> {
    let activity = found(service.resolve_activity_type(activity), json)?;
    let unit_id = resolve_unit_id(service, unit, json)?;
    let since = period_start(days, since)?;
    let logs = service.list_logs(activity.id, unit_id, since)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&logs)?);
        return Ok(());
    }
    if logs.is_empty() {
        eprintln!(
            "No logs for '{}'. Use `tally log {} <quantity>` to add one.",
            activity.name, activity.name
        );
        return Ok(());
    }

    #[derive(Tabled)]
    struct LogRow {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "When")]
        when: String,
        #[tabled(rename = "Quantity")]
        quantity: String,
        #[tabled(rename = "Unit")]
        unit: String,
        #[tabled(rename = "Note")]
        note: String,
    }

    let rows: Vec<LogRow> = logs
        .iter()
        .map(|l| LogRow {
            id: l.log.id,
            when: l
                .log
                .timestamp
                .with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M")
                .to_string(),
            quantity: format_quantity(l.display_quantity),
            unit: l.display_unit_name.clone(),
            note: truncate(l.log.note.as_deref().unwrap_or_default(), 40),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(2..3)).with(Alignment::right()))
        .to_string();
    println!("{table}");

    Ok(())
}

pub(crate) fn cmd_log_update(
    service: &TallyService,
    id: i64,
    quantity: Option<&str>,
    unit: Option<String>,
    note: Option<String>,
    clear_note: bool,
    json: bool,
) -> Result<()> {
    if quantity.is_none() && note.is_none() && !clear_note {
        bail!("Nothing to update. Provide a quantity, --note, or --clear-note");
    }
    if note.is_some() && clear_note {
        bail!("Use either --note or --clear-note, not both");
    }

    let (quantity, unit) = match quantity {
        Some(q) => {
            let (q, embedded) = parse_quantity_with_unit(q)?;
            (Some(q), pick_unit(embedded, unit)?)
        }
        None => (None, unit),
    };
    let unit_id = resolve_unit_id(service, unit.as_deref(), json)?;
    let note = if clear_note { Some(None) } else { note.map(Some) };

    let updated = found(
        service.update_log(
            id,
            &UpdateActivityLog {
                quantity,
                unit_id,
                note,
            },
        ),
        json,
    )?;

    if json {
        println!("{}", serde_json::to_string_pretty(&updated)?);
    } else {
        let activity = service.get_activity_type(updated.log.activity_type_id)?;
        print!("Updated ");
        print_log(&updated, &activity);
    }

    Ok(())
}

pub(crate) fn cmd_log_delete(service: &TallyService, id: i64, json: bool) -> Result<()> {
    found(service.delete_log(id), json)?;

    if json {
        println!("{}", serde_json::json!({ "deleted": id }));
    } else {
        println!("Deleted log {id}");
    }

    Ok(())
}
