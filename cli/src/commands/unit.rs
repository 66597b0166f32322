use std::collections::HashMap;

use anyhow::{Result, bail};
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use tally_core::models::{NewUnit, UpdateUnit};
use tally_core::service::TallyService;

use super::found;
use super::helpers::format_quantity;

pub(crate) fn cmd_unit_add(
    service: &TallyService,
    group: &str,
    name: &str,
    factor: f64,
    offset: f64,
    json: bool,
) -> Result<()> {
    let group = found(service.resolve_group(group), json)?;
    let unit = service.add_unit(&NewUnit {
        group_id: group.id,
        name: name.to_string(),
        factor,
        offset,
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&unit)?);
    } else {
        let canonical = service.canonical_unit(group.id)?;
        println!(
            "Added unit '{}' (ID: {}) to '{}': 1 {} = {} {}",
            unit.name,
            unit.id,
            group.name,
            unit.name,
            format_quantity(unit.to_canonical(1.0)),
            canonical.name
        );
    }

    Ok(())
}

pub(crate) fn cmd_unit_list(service: &TallyService, group: Option<&str>, json: bool) -> Result<()> {
    let group_id = match group {
        Some(g) => Some(found(service.resolve_group(g), json)?.id),
        None => None,
    };
    let units = found(service.list_units(group_id), json)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&units)?);
        return Ok(());
    }
    if units.is_empty() {
        eprintln!("No units yet. Use `tally group create` to start a group.");
        return Ok(());
    }

    #[derive(Tabled)]
    struct UnitRow {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Unit")]
        name: String,
        #[tabled(rename = "Group")]
        group: String,
        #[tabled(rename = "Factor")]
        factor: String,
        #[tabled(rename = "Offset")]
        offset: String,
        #[tabled(rename = "")]
        canonical: &'static str,
    }

    let group_names: HashMap<i64, String> = service
        .list_groups()?
        .into_iter()
        .map(|g| (g.id, g.name))
        .collect();

    let rows: Vec<UnitRow> = units
        .iter()
        .map(|u| UnitRow {
            id: u.id,
            name: u.name.clone(),
            group: group_names.get(&u.group_id).cloned().unwrap_or_default(),
            factor: format!("{}", u.factor),
            offset: format!("{}", u.offset),
            canonical: if u.is_canonical { "canonical" } else { "" },
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(3..5)).with(Alignment::right()))
        .to_string();
    println!("{table}");

    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn cmd_unit_update(
    service: &TallyService,
    unit: &str,
    name: Option<String>,
    group: Option<&str>,
    factor: Option<f64>,
    offset: Option<f64>,
    json: bool,
) -> Result<()> {
    let group_id = match group {
        Some(g) => Some(found(service.resolve_group(g), json)?.id),
        None => None,
    };
    let update = UpdateUnit {
        name,
        group_id,
        factor,
        offset,
    };
    if update.is_empty() {
        bail!("Nothing to update. Provide at least one of --name, --group, --factor, or --offset");
    }

    let current = found(service.resolve_unit(unit), json)?;
    let updated = service.update_unit(current.id, &update)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&updated)?);
    } else {
        println!(
            "Updated unit '{}': factor {}, offset {}",
            updated.name, updated.factor, updated.offset
        );
    }

    Ok(())
}

pub(crate) fn cmd_unit_delete(service: &TallyService, unit: &str, json: bool) -> Result<()> {
    let current = found(service.resolve_unit(unit), json)?;
    let deleted = service.delete_unit(current.id)?;

    if json {
        println!("{}", serde_json::json!({ "deleted": deleted.id }));
    } else {
        println!("Deleted unit '{}'", deleted.name);
    }

    Ok(())
}

pub(crate) fn cmd_convert(
    service: &TallyService,
    quantity: f64,
    from: &str,
    to: &str,
    json: bool,
) -> Result<()> {
    let from = found(service.resolve_unit(from), json)?;
    let to = found(service.resolve_unit(to), json)?;
    let result = service.convert(quantity, from.id, to.id)?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "quantity": quantity,
                "from": from.name,
                "to": to.name,
                "result": result,
            })
        );
    } else {
        println!(
            "{} {} = {} {}",
            format_quantity(quantity),
            from.name,
            format_quantity(result),
            to.name
        );
    }

    Ok(())
}
