use anyhow::Result;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use tally_core::service::TallyService;

use super::found;

pub(crate) fn cmd_group_create(
    service: &TallyService,
    name: &str,
    canonical_unit: &str,
    json: bool,
) -> Result<()> {
    let group = service.create_group(name, canonical_unit)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&group)?);
    } else {
        println!(
            "Created group '{}' (ID: {}) with canonical unit '{}'",
            group.name, group.id, group.canonical_unit_name
        );
    }

    Ok(())
}

pub(crate) fn cmd_group_list(service: &TallyService, json: bool) -> Result<()> {
    let groups = service.list_groups()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&groups)?);
    } else if groups.is_empty() {
        eprintln!("No unit groups yet. Use `tally group create <name> <canonical-unit>`.");
    } else {
        #[derive(Tabled)]
        struct GroupRow {
            #[tabled(rename = "ID")]
            id: i64,
            #[tabled(rename = "Group")]
            name: String,
            #[tabled(rename = "Canonical unit")]
            canonical: String,
            #[tabled(rename = "Units")]
            units: i64,
        }

        let rows: Vec<GroupRow> = groups
            .into_iter()
            .map(|g| GroupRow {
                id: g.id,
                name: g.name,
                canonical: g.canonical_unit_name,
                units: g.unit_count,
            })
            .collect();

        let table = Table::new(&rows)
            .with(Style::rounded())
            .with(Modify::new(Columns::new(3..4)).with(Alignment::right()))
            .to_string();
        println!("{table}");
    }

    Ok(())
}

pub(crate) fn cmd_group_rename(
    service: &TallyService,
    group: &str,
    new_name: &str,
    json: bool,
) -> Result<()> {
    let current = found(service.resolve_group(group), json)?;
    let renamed = service.rename_group(current.id, new_name)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&renamed)?);
    } else {
        println!("Renamed group '{}' to '{}'", current.name, renamed.name);
    }

    Ok(())
}

pub(crate) fn cmd_group_delete(service: &TallyService, group: &str, json: bool) -> Result<()> {
    let current = found(service.resolve_group(group), json)?;
    service.delete_group(current.id)?;

    if json {
        println!("{}", serde_json::json!({ "deleted": current.id }));
    } else {
        println!(
            "Deleted group '{}' with its units, activities and logs",
            current.name
        );
    }

    Ok(())
}
