mod activity;
mod group;
mod helpers;
mod log;
mod progress;
mod unit;

use std::process;

use anyhow::Result;

use helpers::json_error;

pub(crate) use activity::{
    cmd_activity_add, cmd_activity_delete, cmd_activity_list, cmd_activity_update,
};
pub(crate) use group::{cmd_group_create, cmd_group_delete, cmd_group_list, cmd_group_rename};
pub(crate) use log::{cmd_log, cmd_log_delete, cmd_log_update, cmd_logs};
pub(crate) use progress::cmd_progress;
pub(crate) use unit::{cmd_convert, cmd_unit_add, cmd_unit_delete, cmd_unit_list, cmd_unit_update};

/// Report a missing record and exit with status 2.
pub(super) fn exit_not_found(message: &str, json: bool) -> ! {
    if json {
        println!("{}", json_error(message));
    } else {
        eprintln!("{message}");
    }
    process::exit(2);
}

/// Pass a lookup through, turning the not-found family into exit status 2.
pub(super) fn found<T>(result: tally_core::Result<T>, json: bool) -> Result<T> {
    match result {
        Err(e) if e.is_not_found() => exit_not_found(&e.to_string(), json),
        other => Ok(other?),
    }
}
