use anyhow::{Result, bail};
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use tally_core::models::{ActivityType, NewActivityType, UpdateActivityType};
use tally_core::service::TallyService;

use super::found;
use super::helpers::{format_quantity, parse_quantity_with_unit, pick_unit};

/// Split a `--goal` value like "20km" into a quantity and the id of the unit
/// it is expressed in (`None` means canonical).
fn parse_goal(
    service: &TallyService,
    goal: &str,
    goal_unit: Option<String>,
    json: bool,
) -> Result<(f64, Option<i64>)> {
    let (quantity, embedded) = parse_quantity_with_unit(goal)?;
    let unit_id = match pick_unit(embedded, goal_unit)? {
        Some(name) => Some(found(service.resolve_unit(&name), json)?.id),
        None => None,
    };
    Ok((quantity, unit_id))
}

fn describe_goal(service: &TallyService, activity: &ActivityType) -> Result<String> {
    let canonical = service.canonical_unit(activity.unit_group_id)?;
    Ok(match activity.goal_quantity {
        Some(goal) => format!("{} {}", format_quantity(goal), canonical.name),
        None => "-".to_string(),
    })
}

pub(crate) fn cmd_activity_add(
    service: &TallyService,
    name: &str,
    group: &str,
    goal: Option<&str>,
    goal_unit: Option<String>,
    json: bool,
) -> Result<()> {
    let group = found(service.resolve_group(group), json)?;
    let (goal_quantity, goal_unit) = match goal {
        Some(g) => {
            let (q, u) = parse_goal(service, g, goal_unit, json)?;
            (Some(q), u)
        }
        None if goal_unit.is_some() => bail!("--goal-unit needs --goal"),
        None => (None, None),
    };

    let activity = service.create_activity_type(
        &NewActivityType {
            name: name.to_string(),
            unit_group_id: group.id,
            goal_quantity,
        },
        goal_unit,
    )?;

    if json {
        println!("{}", serde_json::to_string_pretty(&activity)?);
    } else {
        println!(
            "Created activity '{}' (ID: {}) measured in '{}', goal: {}",
            activity.name,
            activity.id,
            group.name,
            describe_goal(service, &activity)?
        );
    }

    Ok(())
}

pub(crate) fn cmd_activity_list(service: &TallyService, json: bool) -> Result<()> {
    let activities = service.list_activity_types()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&activities)?);
        return Ok(());
    }
    if activities.is_empty() {
        eprintln!("No activities yet. Use `tally activity add <name> <group>`.");
        return Ok(());
    }

    #[derive(Tabled)]
    struct ActivityRow {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Activity")]
        name: String,
        #[tabled(rename = "Group")]
        group: String,
        #[tabled(rename = "Goal")]
        goal: String,
    }

    let mut rows = Vec::with_capacity(activities.len());
    for a in &activities {
        rows.push(ActivityRow {
            id: a.id,
            name: a.name.clone(),
            group: service.get_group(a.unit_group_id)?.name,
            goal: describe_goal(service, a)?,
        });
    }

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(3..4)).with(Alignment::right()))
        .to_string();
    println!("{table}");

    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn cmd_activity_update(
    service: &TallyService,
    activity: &str,
    name: Option<String>,
    group: Option<&str>,
    goal: Option<&str>,
    goal_unit: Option<String>,
    clear_goal: bool,
    json: bool,
) -> Result<()> {
    if name.is_none() && group.is_none() && goal.is_none() && !clear_goal {
        bail!("Nothing to update. Provide at least one of --name, --group, --goal, or --clear-goal");
    }
    if goal.is_none() && goal_unit.is_some() {
        bail!("--goal-unit needs --goal");
    }

    let current = found(service.resolve_activity_type(activity), json)?;
    let unit_group_id = match group {
        Some(g) => Some(found(service.resolve_group(g), json)?.id),
        None => None,
    };
    let (goal_quantity, goal_unit) = match (goal, clear_goal) {
        (Some(_), true) => bail!("Use either --goal or --clear-goal, not both"),
        (Some(g), false) => {
            let (q, u) = parse_goal(service, g, goal_unit, json)?;
            (Some(Some(q)), u)
        }
        (None, true) => (Some(None), None),
        (None, false) => (None, None),
    };

    let updated = service.update_activity_type(
        current.id,
        &UpdateActivityType {
            name,
            unit_group_id,
            goal_quantity,
        },
        goal_unit,
    )?;

    if json {
        println!("{}", serde_json::to_string_pretty(&updated)?);
    } else {
        println!(
            "Updated activity '{}', goal: {}",
            updated.name,
            describe_goal(service, &updated)?
        );
    }

    Ok(())
}

pub(crate) fn cmd_activity_delete(service: &TallyService, activity: &str, json: bool) -> Result<()> {
    let current = found(service.resolve_activity_type(activity), json)?;
    service.delete_activity_type(current.id)?;

    if json {
        println!("{}", serde_json::json!({ "deleted": current.id }));
    } else {
        println!("Deleted activity '{}' and its logs", current.name);
    }

    Ok(())
}
