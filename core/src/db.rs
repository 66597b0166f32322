use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, info};

use crate::error::{Result, TallyError};
use crate::models::{
    ActivityLog, ActivityType, ActivityTypeId, GroupId, GroupOverview, LogId, NewActivityType,
    NewUnit, Unit, UnitGroup, UnitId, UpdateActivityType, UpdateUnit, validate_factor,
    validate_goal, validate_name, validate_offset, validate_quantity,
};
use crate::registry::UnitRegistry;

const UNIT_COLUMNS: &str = "id, name, group_id, factor, unit_offset, is_canonical";
const ACTIVITY_TYPE_COLUMNS: &str = "id, name, unit_group_id, goal_quantity";
const LOG_COLUMNS: &str = "id, activity_type_id, canonical_quantity, note, timestamp";

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Database { conn };
        db.migrate()?;
        info!(path = %path.display(), "opened database");
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        // Cascades rely on this; SQLite leaves it off per connection.
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        let version: i64 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;

        if version < 1 {
            self.conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS unit_groups (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL UNIQUE
                );

                CREATE TABLE IF NOT EXISTS units (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL UNIQUE,
                    group_id INTEGER NOT NULL REFERENCES unit_groups(id) ON DELETE CASCADE,
                    factor REAL NOT NULL CHECK (factor > 0),
                    unit_offset REAL NOT NULL DEFAULT 0,
                    is_canonical INTEGER NOT NULL DEFAULT 0
                );

                CREATE UNIQUE INDEX IF NOT EXISTS one_canonical_per_group
                    ON units(group_id) WHERE is_canonical = 1;

                CREATE TABLE IF NOT EXISTS activity_types (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL UNIQUE,
                    unit_group_id INTEGER NOT NULL REFERENCES unit_groups(id) ON DELETE CASCADE,
                    goal_quantity REAL CHECK (goal_quantity IS NULL OR goal_quantity >= 0)
                );

                CREATE TABLE IF NOT EXISTS activity_logs (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    activity_type_id INTEGER NOT NULL REFERENCES activity_types(id) ON DELETE CASCADE,
                    canonical_quantity REAL NOT NULL,
                    timestamp TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_units_group ON units(group_id);
                CREATE INDEX IF NOT EXISTS idx_activity_logs_type
                    ON activity_logs(activity_type_id, timestamp);

                PRAGMA user_version = 1;",
            )?;
        }

        if version < 2 {
            self.conn.execute_batch(
                "ALTER TABLE activity_logs ADD COLUMN note TEXT;
                 PRAGMA user_version = 2;",
            )?;
        }

        Ok(())
    }

    // --- Row mapping helpers ---

    fn unit_from_row(row: &rusqlite::Row) -> rusqlite::Result<Unit> {
        Ok(Unit {
            id: row.get(0)?,
            name: row.get(1)?,
            group_id: row.get(2)?,
            factor: row.get(3)?,
            offset: row.get(4)?,
            is_canonical: row.get(5)?,
        })
    }

    fn activity_type_from_row(row: &rusqlite::Row) -> rusqlite::Result<ActivityType> {
        Ok(ActivityType {
            id: row.get(0)?,
            name: row.get(1)?,
            unit_group_id: row.get(2)?,
            goal_quantity: row.get(3)?,
        })
    }

    fn log_from_row(row: &rusqlite::Row) -> rusqlite::Result<ActivityLog> {
        let raw: String = row.get(4)?;
        let timestamp = DateTime::parse_from_rfc3339(&raw)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
            })?;
        Ok(ActivityLog {
            id: row.get(0)?,
            activity_type_id: row.get(1)?,
            canonical_quantity: row.get(2)?,
            note: row.get(3)?,
            timestamp,
        })
    }

    // --- Unit groups ---

    /// Create a group and its canonical unit in one transaction.
    pub fn create_group(&self, name: &str, canonical_unit_name: &str) -> Result<GroupOverview> {
        let name = validate_name(name)?;
        let unit_name = validate_name(canonical_unit_name)?;

        let tx = self.conn.unchecked_transaction()?;
        tx.execute("INSERT INTO unit_groups (name) VALUES (?1)", params![name])
            .map_err(|e| map_unique(e, &name))?;
        let group_id = tx.last_insert_rowid();
        tx.execute(
            "INSERT INTO units (name, group_id, factor, unit_offset, is_canonical)
             VALUES (?1, ?2, 1.0, 0.0, 1)",
            params![unit_name, group_id],
        )
        .map_err(|e| map_unique(e, &unit_name))?;
        let unit_id = tx.last_insert_rowid();
        tx.commit()?;

        info!(group_id, unit_id, group = %name, canonical = %unit_name, "created unit group");
        Ok(GroupOverview {
            id: group_id,
            name,
            canonical_unit_id: unit_id,
            canonical_unit_name: unit_name,
            unit_count: 1,
        })
    }

    pub fn get_group(&self, id: GroupId) -> Result<UnitGroup> {
        self.conn
            .query_row(
                "SELECT id, name FROM unit_groups WHERE id = ?1",
                params![id],
                |row| {
                    Ok(UnitGroup {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    })
                },
            )
            .optional()?
            .ok_or(TallyError::UnknownGroup(id))
    }

    pub fn find_group_by_name(&self, name: &str) -> Result<Option<UnitGroup>> {
        let group = self
            .conn
            .query_row(
                "SELECT id, name FROM unit_groups WHERE name = ?1",
                params![name.trim()],
                |row| {
                    Ok(UnitGroup {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(group)
    }

    pub fn get_group_overview(&self, id: GroupId) -> Result<GroupOverview> {
        self.conn
            .query_row(
                "SELECT g.id, g.name, u.id, u.name,
                        (SELECT COUNT(*) FROM units WHERE group_id = g.id)
                 FROM unit_groups g
                 JOIN units u ON u.group_id = g.id AND u.is_canonical = 1
                 WHERE g.id = ?1",
                params![id],
                Self::group_overview_from_row,
            )
            .optional()?
            .ok_or(TallyError::UnknownGroup(id))
    }

    pub fn list_groups(&self) -> Result<Vec<GroupOverview>> {
        let mut stmt = self.conn.prepare(
            "SELECT g.id, g.name, u.id, u.name,
                    (SELECT COUNT(*) FROM units WHERE group_id = g.id)
             FROM unit_groups g
             JOIN units u ON u.group_id = g.id AND u.is_canonical = 1
             ORDER BY g.name",
        )?;
        let groups = stmt
            .query_map([], Self::group_overview_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(groups)
    }

    fn group_overview_from_row(row: &rusqlite::Row) -> rusqlite::Result<GroupOverview> {
        Ok(GroupOverview {
            id: row.get(0)?,
            name: row.get(1)?,
            canonical_unit_id: row.get(2)?,
            canonical_unit_name: row.get(3)?,
            unit_count: row.get(4)?,
        })
    }

    pub fn rename_group(&self, id: GroupId, name: &str) -> Result<UnitGroup> {
        let name = validate_name(name)?;
        let rows = self
            .conn
            .execute(
                "UPDATE unit_groups SET name = ?1 WHERE id = ?2",
                params![name, id],
            )
            .map_err(|e| map_unique(e, &name))?;
        if rows == 0 {
            return Err(TallyError::UnknownGroup(id));
        }
        debug!(group_id = id, %name, "renamed unit group");
        Ok(UnitGroup { id, name })
    }

    /// Delete a group. Its units, activity types and their logs go with it.
    pub fn delete_group(&self, id: GroupId) -> Result<()> {
        let rows = self
            .conn
            .execute("DELETE FROM unit_groups WHERE id = ?1", params![id])?;
        if rows == 0 {
            return Err(TallyError::UnknownGroup(id));
        }
        info!(group_id = id, "deleted unit group");
        Ok(())
    }

    // --- Units ---

    pub fn add_unit(&self, unit: &NewUnit) -> Result<Unit> {
        let factor = validate_factor(unit.factor)?;
        let offset = validate_offset(unit.offset)?;
        let name = validate_name(&unit.name)?;
        self.get_group(unit.group_id)?;

        self.conn
            .execute(
                "INSERT INTO units (name, group_id, factor, unit_offset, is_canonical)
                 VALUES (?1, ?2, ?3, ?4, 0)",
                params![name, unit.group_id, factor, offset],
            )
            .map_err(|e| map_unique(e, &name))?;
        let id = self.conn.last_insert_rowid();
        debug!(unit_id = id, group_id = unit.group_id, factor, offset, "added unit");
        self.get_unit(id)
    }

    pub fn get_unit(&self, id: UnitId) -> Result<Unit> {
        self.conn
            .query_row(
                &format!("SELECT {UNIT_COLUMNS} FROM units WHERE id = ?1"),
                params![id],
                Self::unit_from_row,
            )
            .optional()?
            .ok_or_else(|| TallyError::unknown_unit_id(id))
    }

    pub fn find_unit_by_name(&self, name: &str) -> Result<Option<Unit>> {
        let unit = self
            .conn
            .query_row(
                &format!("SELECT {UNIT_COLUMNS} FROM units WHERE name = ?1"),
                params![name.trim()],
                Self::unit_from_row,
            )
            .optional()?;
        Ok(unit)
    }

    pub fn canonical_unit(&self, group_id: GroupId) -> Result<Unit> {
        self.conn
            .query_row(
                &format!("SELECT {UNIT_COLUMNS} FROM units WHERE group_id = ?1 AND is_canonical = 1"),
                params![group_id],
                Self::unit_from_row,
            )
            .optional()?
            .ok_or(TallyError::UnknownGroup(group_id))
    }

    /// All units, or one group's units, canonical unit first within a group.
    pub fn list_units(&self, group_id: Option<GroupId>) -> Result<Vec<Unit>> {
        let units = if let Some(group_id) = group_id {
            self.get_group(group_id)?;
            let mut stmt = self.conn.prepare(&format!(
                "SELECT {UNIT_COLUMNS} FROM units WHERE group_id = ?1
                 ORDER BY is_canonical DESC, name"
            ))?;
            stmt.query_map(params![group_id], Self::unit_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?
        } else {
            let mut stmt = self.conn.prepare(&format!(
                "SELECT {UNIT_COLUMNS} FROM units ORDER BY group_id, is_canonical DESC, name"
            ))?;
            stmt.query_map([], Self::unit_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?
        };
        Ok(units)
    }

    pub fn update_unit(&self, id: UnitId, update: &UpdateUnit) -> Result<Unit> {
        let current = self.get_unit(id)?;
        if current.is_canonical {
            return Err(TallyError::CanonicalUnitLocked(current.name));
        }
        let factor = update.factor.map(validate_factor).transpose()?;
        let offset = update.offset.map(validate_offset).transpose()?;
        let name = update.name.as_deref().map(validate_name).transpose()?;
        if let Some(group_id) = update.group_id {
            self.get_group(group_id)?;
        }

        self.conn
            .execute(
                "UPDATE units SET
                    name = COALESCE(?1, name),
                    group_id = COALESCE(?2, group_id),
                    factor = COALESCE(?3, factor),
                    unit_offset = COALESCE(?4, unit_offset)
                 WHERE id = ?5",
                params![name, update.group_id, factor, offset, id],
            )
            .map_err(|e| map_unique(e, name.as_deref().unwrap_or(&current.name)))?;
        debug!(unit_id = id, "updated unit");
        self.get_unit(id)
    }

    pub fn delete_unit(&self, id: UnitId) -> Result<Unit> {
        let unit = self.get_unit(id)?;
        if unit.is_canonical {
            return Err(TallyError::CanonicalUnitLocked(unit.name));
        }
        self.conn
            .execute("DELETE FROM units WHERE id = ?1", params![id])?;
        debug!(unit_id = id, "deleted unit");
        Ok(unit)
    }

    /// Snapshot every group and unit into an in-memory registry.
    pub fn load_registry(&self) -> Result<UnitRegistry> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM unit_groups ORDER BY id")?;
        let groups = stmt
            .query_map([], |row| {
                Ok(UnitGroup {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        UnitRegistry::from_records(groups, self.list_units(None)?)
    }

    // --- Activity types ---

    pub fn insert_activity_type(&self, activity: &NewActivityType) -> Result<ActivityType> {
        let name = validate_name(&activity.name)?;
        let goal = validate_goal(activity.goal_quantity)?;
        self.get_group(activity.unit_group_id)?;

        self.conn
            .execute(
                "INSERT INTO activity_types (name, unit_group_id, goal_quantity)
                 VALUES (?1, ?2, ?3)",
                params![name, activity.unit_group_id, goal],
            )
            .map_err(|e| map_unique(e, &name))?;
        let id = self.conn.last_insert_rowid();
        info!(activity_type_id = id, %name, "created activity type");
        self.get_activity_type(id)
    }

    pub fn get_activity_type(&self, id: ActivityTypeId) -> Result<ActivityType> {
        self.conn
            .query_row(
                &format!("SELECT {ACTIVITY_TYPE_COLUMNS} FROM activity_types WHERE id = ?1"),
                params![id],
                Self::activity_type_from_row,
            )
            .optional()?
            .ok_or_else(|| TallyError::unknown_activity_type_id(id))
    }

    pub fn find_activity_type_by_name(&self, name: &str) -> Result<Option<ActivityType>> {
        let activity = self
            .conn
            .query_row(
                &format!("SELECT {ACTIVITY_TYPE_COLUMNS} FROM activity_types WHERE name = ?1"),
                params![name.trim()],
                Self::activity_type_from_row,
            )
            .optional()?;
        Ok(activity)
    }

    pub fn list_activity_types(&self) -> Result<Vec<ActivityType>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ACTIVITY_TYPE_COLUMNS} FROM activity_types ORDER BY name"
        ))?;
        let activities = stmt
            .query_map([], Self::activity_type_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(activities)
    }

    pub fn update_activity_type(
        &self,
        id: ActivityTypeId,
        update: &UpdateActivityType,
    ) -> Result<ActivityType> {
        let current = self.get_activity_type(id)?;
        let name = update.name.as_deref().map(validate_name).transpose()?;
        if let Some(goal) = update.goal_quantity {
            validate_goal(goal)?;
        }
        let moved = matches!(update.unit_group_id, Some(g) if g != current.unit_group_id);
        if let (true, Some(group_id)) = (moved, update.unit_group_id) {
            self.get_group(group_id)?;
            if self.count_logs(id)? > 0 {
                return Err(TallyError::ActivityTypeHasLogs(id));
            }
        }
        // A goal is canonical in its group; moving without a new one drops it.
        let goal = match update.goal_quantity {
            None if moved => Some(None),
            other => other,
        };

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "UPDATE activity_types SET
                name = COALESCE(?1, name),
                unit_group_id = COALESCE(?2, unit_group_id)
             WHERE id = ?3",
            params![name, update.unit_group_id, id],
        )
        .map_err(|e| map_unique(e, name.as_deref().unwrap_or(&current.name)))?;
        if let Some(goal) = goal {
            tx.execute(
                "UPDATE activity_types SET goal_quantity = ?1 WHERE id = ?2",
                params![goal, id],
            )?;
        }
        tx.commit()?;
        debug!(activity_type_id = id, "updated activity type");
        self.get_activity_type(id)
    }

    /// Delete an activity type and all of its logs.
    pub fn delete_activity_type(&self, id: ActivityTypeId) -> Result<()> {
        let rows = self
            .conn
            .execute("DELETE FROM activity_types WHERE id = ?1", params![id])?;
        if rows == 0 {
            return Err(TallyError::unknown_activity_type_id(id));
        }
        info!(activity_type_id = id, "deleted activity type");
        Ok(())
    }

    // --- Activity logs ---

    /// Store a log whose quantity is already in canonical units.
    pub fn insert_log(
        &self,
        activity_type_id: ActivityTypeId,
        canonical_quantity: f64,
        note: Option<&str>,
    ) -> Result<ActivityLog> {
        let canonical_quantity = validate_quantity(canonical_quantity)?;
        self.get_activity_type(activity_type_id)?;
        let now = format_timestamp(Utc::now());
        self.conn.execute(
            "INSERT INTO activity_logs (activity_type_id, canonical_quantity, note, timestamp)
             VALUES (?1, ?2, ?3, ?4)",
            params![activity_type_id, canonical_quantity, note, now],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!(log_id = id, activity_type_id, canonical_quantity, "inserted activity log");
        self.get_log(id)
    }

    pub fn get_log(&self, id: LogId) -> Result<ActivityLog> {
        self.conn
            .query_row(
                &format!("SELECT {LOG_COLUMNS} FROM activity_logs WHERE id = ?1"),
                params![id],
                Self::log_from_row,
            )
            .optional()?
            .ok_or(TallyError::UnknownLog(id))
    }

    /// Logs of one activity type, oldest first, optionally from `since` on.
    pub fn list_logs(
        &self,
        activity_type_id: ActivityTypeId,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<ActivityLog>> {
        self.get_activity_type(activity_type_id)?;
        let since = since.map(format_timestamp);
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {LOG_COLUMNS} FROM activity_logs
             WHERE activity_type_id = ?1 AND (?2 IS NULL OR timestamp >= ?2)
             ORDER BY timestamp, id"
        ))?;
        let logs = stmt
            .query_map(params![activity_type_id, since], Self::log_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(logs)
    }

    pub fn count_logs(&self, activity_type_id: ActivityTypeId) -> Result<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM activity_logs WHERE activity_type_id = ?1",
            params![activity_type_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Change a log's canonical quantity and/or note. The timestamp stays.
    pub fn update_log(
        &self,
        id: LogId,
        canonical_quantity: Option<f64>,
        note: Option<Option<&str>>,
    ) -> Result<ActivityLog> {
        self.get_log(id)?;
        let canonical_quantity = canonical_quantity.map(validate_quantity).transpose()?;

        let tx = self.conn.unchecked_transaction()?;
        if let Some(quantity) = canonical_quantity {
            tx.execute(
                "UPDATE activity_logs SET canonical_quantity = ?1 WHERE id = ?2",
                params![quantity, id],
            )?;
        }
        if let Some(note) = note {
            tx.execute(
                "UPDATE activity_logs SET note = ?1 WHERE id = ?2",
                params![note, id],
            )?;
        }
        tx.commit()?;
        debug!(log_id = id, "updated activity log");
        self.get_log(id)
    }

    pub fn delete_log(&self, id: LogId) -> Result<()> {
        let rows = self
            .conn
            .execute("DELETE FROM activity_logs WHERE id = ?1", params![id])?;
        if rows == 0 {
            return Err(TallyError::UnknownLog(id));
        }
        debug!(log_id = id, "deleted activity log");
        Ok(())
    }
}

/// Fixed-width UTC so that text comparison in SQL orders chronologically.
fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn map_unique(err: rusqlite::Error, name: &str) -> TallyError {
    if let rusqlite::Error::SqliteFailure(ref e, _) = err {
        if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE {
            return TallyError::DuplicateName(name.to_string());
        }
    }
    TallyError::Storage(err)
}
