use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::convert;
use crate::db::Database;
use crate::error::{Result, TallyError};
use crate::goal::{self, GoalProgress};
use crate::models::{
    ActivityLog, ActivityType, ActivityTypeId, DisplayedLog, GroupId, GroupOverview, LogId,
    NewActivityLog, NewActivityType, NewUnit, Unit, UnitGroup, UnitId, UpdateActivityLog,
    UpdateActivityType, UpdateUnit, canonical_quantity, validate_goal,
};

/// Progress of one activity type over a period.
#[derive(Debug, Clone, Serialize)]
pub struct ActivityProgress {
    pub activity: ActivityType,
    /// Unit the `progress` figures are expressed in.
    pub unit: Unit,
    pub log_count: usize,
    pub canonical: GoalProgress,
    pub progress: GoalProgress,
}

pub struct TallyService {
    db: Database,
}

impl TallyService {
    pub fn new(db_path: &Path) -> Result<Self> {
        let db = Database::open(db_path)?;
        Ok(Self { db })
    }

    pub fn new_in_memory() -> Result<Self> {
        let db = Database::open_in_memory()?;
        Ok(Self { db })
    }

    pub fn from_database(db: Database) -> Self {
        Self { db }
    }

    // --- Unit groups ---

    pub fn create_group(&self, name: &str, canonical_unit_name: &str) -> Result<GroupOverview> {
        self.db.create_group(name, canonical_unit_name)
    }

    pub fn get_group(&self, id: GroupId) -> Result<GroupOverview> {
        self.db.get_group_overview(id)
    }

    pub fn list_groups(&self) -> Result<Vec<GroupOverview>> {
        self.db.list_groups()
    }

    /// Look a group up by name, falling back to a numeric id.
    pub fn resolve_group(&self, reference: &str) -> Result<UnitGroup> {
        if let Some(group) = self.db.find_group_by_name(reference)? {
            return Ok(group);
        }
        match reference.trim().parse::<GroupId>() {
            Ok(id) => self.db.get_group(id),
            Err(_) => Err(TallyError::UnknownGroupName(reference.trim().to_string())),
        }
    }

    pub fn rename_group(&self, id: GroupId, name: &str) -> Result<UnitGroup> {
        self.db.rename_group(id, name)
    }

    pub fn delete_group(&self, id: GroupId) -> Result<()> {
        self.db.delete_group(id)
    }

    // --- Units ---

    pub fn add_unit(&self, unit: &NewUnit) -> Result<Unit> {
        self.db.add_unit(unit)
    }

    pub fn get_unit(&self, id: UnitId) -> Result<Unit> {
        self.db.get_unit(id)
    }

    pub fn canonical_unit(&self, group_id: GroupId) -> Result<Unit> {
        self.db.canonical_unit(group_id)
    }

    pub fn list_units(&self, group_id: Option<GroupId>) -> Result<Vec<Unit>> {
        self.db.list_units(group_id)
    }

    /// Look a unit up by name, falling back to a numeric id.
    pub fn resolve_unit(&self, reference: &str) -> Result<Unit> {
        if let Some(unit) = self.db.find_unit_by_name(reference)? {
            return Ok(unit);
        }
        match reference.trim().parse::<UnitId>() {
            Ok(id) => self.db.get_unit(id),
            Err(_) => Err(TallyError::UnknownUnit(reference.trim().to_string())),
        }
    }

    pub fn update_unit(&self, id: UnitId, update: &UpdateUnit) -> Result<Unit> {
        self.db.update_unit(id, update)
    }

    pub fn delete_unit(&self, id: UnitId) -> Result<Unit> {
        self.db.delete_unit(id)
    }

    pub fn convert(&self, quantity: f64, from: UnitId, to: UnitId) -> Result<f64> {
        let from = self.db.get_unit(from)?;
        let to = self.db.get_unit(to)?;
        convert::convert(quantity, &from, &to)
    }

    // --- Activity types ---

    /// Create an activity type. A goal given in `goal_unit` is stored in the
    /// group's canonical unit.
    pub fn create_activity_type(
        &self,
        activity: &NewActivityType,
        goal_unit: Option<UnitId>,
    ) -> Result<ActivityType> {
        let goal_quantity =
            self.goal_to_canonical(activity.unit_group_id, activity.goal_quantity, goal_unit)?;
        self.db.insert_activity_type(&NewActivityType {
            goal_quantity,
            ..activity.clone()
        })
    }

    pub fn get_activity_type(&self, id: ActivityTypeId) -> Result<ActivityType> {
        self.db.get_activity_type(id)
    }

    pub fn list_activity_types(&self) -> Result<Vec<ActivityType>> {
        self.db.list_activity_types()
    }

    /// Look an activity type up by name, falling back to a numeric id.
    pub fn resolve_activity_type(&self, reference: &str) -> Result<ActivityType> {
        if let Some(activity) = self.db.find_activity_type_by_name(reference)? {
            return Ok(activity);
        }
        match reference.trim().parse::<ActivityTypeId>() {
            Ok(id) => self.db.get_activity_type(id),
            Err(_) => Err(TallyError::UnknownActivityType(reference.trim().to_string())),
        }
    }

    pub fn update_activity_type(
        &self,
        id: ActivityTypeId,
        update: &UpdateActivityType,
        goal_unit: Option<UnitId>,
    ) -> Result<ActivityType> {
        let current = self.db.get_activity_type(id)?;
        let group_id = update.unit_group_id.unwrap_or(current.unit_group_id);
        let goal_quantity = match update.goal_quantity {
            Some(goal) => Some(self.goal_to_canonical(group_id, goal, goal_unit)?),
            None => None,
        };
        self.db.update_activity_type(
            id,
            &UpdateActivityType {
                goal_quantity,
                ..update.clone()
            },
        )
    }

    pub fn delete_activity_type(&self, id: ActivityTypeId) -> Result<()> {
        self.db.delete_activity_type(id)
    }

    fn goal_to_canonical(
        &self,
        group_id: GroupId,
        goal: Option<f64>,
        goal_unit: Option<UnitId>,
    ) -> Result<Option<f64>> {
        let (Some(goal), Some(unit_id)) = (goal, goal_unit) else {
            return Ok(goal);
        };
        let unit = self.unit_in_group(unit_id, group_id)?;
        validate_goal(Some(unit.to_canonical(goal)))
    }

    // --- Activity logs ---

    /// Record a log. The quantity is normalized to the canonical unit before
    /// it reaches the store; the result is shown in the unit it was entered in.
    pub fn log_activity(&self, entry: &NewActivityLog) -> Result<DisplayedLog> {
        let activity = self.db.get_activity_type(entry.activity_type_id)?;
        let unit = self.unit_in_group(entry.unit_id, activity.unit_group_id)?;
        let canonical = canonical_quantity(entry.quantity, &unit)?;
        debug!(
            activity = %activity.name,
            quantity = entry.quantity,
            unit = %unit.name,
            canonical,
            "normalized activity log"
        );
        let log = self
            .db
            .insert_log(activity.id, canonical, entry.note.as_deref())?;
        Ok(DisplayedLog::new(log, &unit))
    }

    pub fn get_log(&self, id: LogId, display_unit: Option<UnitId>) -> Result<DisplayedLog> {
        let log = self.db.get_log(id)?;
        let activity = self.db.get_activity_type(log.activity_type_id)?;
        let unit = self.display_unit(&activity, display_unit)?;
        Ok(DisplayedLog::new(log, &unit))
    }

    pub fn list_logs(
        &self,
        activity_type_id: ActivityTypeId,
        display_unit: Option<UnitId>,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<DisplayedLog>> {
        let activity = self.db.get_activity_type(activity_type_id)?;
        let unit = self.display_unit(&activity, display_unit)?;
        let logs = self.db.list_logs(activity.id, since)?;
        Ok(logs
            .into_iter()
            .map(|log| DisplayedLog::new(log, &unit))
            .collect())
    }

    /// Change a log's quantity and/or note. The timestamp is kept.
    pub fn update_log(&self, id: LogId, update: &UpdateActivityLog) -> Result<DisplayedLog> {
        let log = self.db.get_log(id)?;
        let activity = self.db.get_activity_type(log.activity_type_id)?;
        let unit = self.display_unit(&activity, update.unit_id)?;
        let canonical = match update.quantity {
            Some(quantity) => Some(canonical_quantity(quantity, &unit)?),
            None => None,
        };
        let note = update.note.as_ref().map(Option::as_deref);
        let log = self.db.update_log(id, canonical, note)?;
        Ok(DisplayedLog::new(log, &unit))
    }

    pub fn delete_log(&self, id: LogId) -> Result<()> {
        self.db.delete_log(id)
    }

    // --- Goals ---

    pub fn goal_progress(
        &self,
        activity_type_id: ActivityTypeId,
        since: Option<DateTime<Utc>>,
        display_unit: Option<UnitId>,
    ) -> Result<ActivityProgress> {
        let activity = self.db.get_activity_type(activity_type_id)?;
        self.progress_for(activity, since, display_unit)
    }

    /// Progress of every activity type, in each type's canonical unit.
    pub fn all_progress(&self, since: Option<DateTime<Utc>>) -> Result<Vec<ActivityProgress>> {
        self.db
            .list_activity_types()?
            .into_iter()
            .map(|activity| self.progress_for(activity, since, None))
            .collect()
    }

    fn progress_for(
        &self,
        activity: ActivityType,
        since: Option<DateTime<Utc>>,
        display_unit: Option<UnitId>,
    ) -> Result<ActivityProgress> {
        let unit = self.display_unit(&activity, display_unit)?;
        let logs = self.db.list_logs(activity.id, since)?;
        let canonical = goal::evaluate(
            activity.goal_quantity,
            logs.iter().map(|log: &ActivityLog| log.canonical_quantity),
        );
        Ok(ActivityProgress {
            progress: canonical.expressed_in(&unit),
            log_count: logs.len(),
            canonical,
            activity,
            unit,
        })
    }

    // --- Helpers ---

    /// The requested unit if it belongs to the activity's group, otherwise the
    /// group's canonical unit when none was requested.
    fn display_unit(&self, activity: &ActivityType, unit_id: Option<UnitId>) -> Result<Unit> {
        match unit_id {
            Some(id) => self.unit_in_group(id, activity.unit_group_id),
            None => self.db.canonical_unit(activity.unit_group_id),
        }
    }

    fn unit_in_group(&self, unit_id: UnitId, group_id: GroupId) -> Result<Unit> {
        let unit = self.db.get_unit(unit_id)?;
        if unit.group_id != group_id {
            let canonical = self.db.canonical_unit(group_id)?;
            return Err(TallyError::IncompatibleUnits {
                from: unit.name,
                to: canonical.name,
            });
        }
        Ok(unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        service: TallyService,
        distance: GroupOverview,
        time: GroupOverview,
        kilometers: Unit,
        hours: Unit,
    }

    fn fixture() -> Fixture {
        let service = TallyService::new_in_memory().unwrap();
        let distance = service.create_group("distance", "meters").unwrap();
        let time = service.create_group("time", "minutes").unwrap();
        let kilometers = service
            .add_unit(&NewUnit {
                group_id: distance.id,
                name: "kilometers".to_string(),
                factor: 1000.0,
                offset: 0.0,
            })
            .unwrap();
        let hours = service
            .add_unit(&NewUnit {
                group_id: time.id,
                name: "hours".to_string(),
                factor: 60.0,
                offset: 0.0,
            })
            .unwrap();
        Fixture {
            service,
            distance,
            time,
            kilometers,
            hours,
        }
    }

    fn activity(f: &Fixture, name: &str, group_id: GroupId, goal: Option<f64>) -> ActivityType {
        f.service
            .create_activity_type(
                &NewActivityType {
                    name: name.to_string(),
                    unit_group_id: group_id,
                    goal_quantity: goal,
                },
                None,
            )
            .unwrap()
    }

    #[test]
    fn test_log_is_stored_canonical() {
        let f = fixture();
        let cycling = activity(&f, "cycling", f.distance.id, None);
        let shown = f
            .service
            .log_activity(&NewActivityLog {
                activity_type_id: cycling.id,
                quantity: 5.0,
                unit_id: f.kilometers.id,
                note: Some("commute".to_string()),
            })
            .unwrap();
        assert!((shown.log.canonical_quantity - 5000.0).abs() < f64::EPSILON);
        assert!((shown.display_quantity - 5.0).abs() < f64::EPSILON);
        assert_eq!(shown.display_unit_name, "kilometers");

        let canonical = f.service.get_log(shown.log.id, None).unwrap();
        assert_eq!(canonical.display_unit_name, "meters");
        assert!((canonical.display_quantity - 5000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_log_in_foreign_unit_writes_nothing() {
        let f = fixture();
        let yoga = activity(&f, "yoga", f.time.id, Some(60.0));
        let err = f
            .service
            .log_activity(&NewActivityLog {
                activity_type_id: yoga.id,
                quantity: 5.0,
                unit_id: f.kilometers.id,
                note: None,
            })
            .unwrap_err();
        assert!(matches!(err, TallyError::IncompatibleUnits { .. }));
        assert!(f.service.list_logs(yoga.id, None, None).unwrap().is_empty());
    }

    #[test]
    fn test_log_rejects_bad_quantity() {
        let f = fixture();
        let yoga = activity(&f, "yoga", f.time.id, None);
        for quantity in [-1.0, f64::NAN] {
            let err = f
                .service
                .log_activity(&NewActivityLog {
                    activity_type_id: yoga.id,
                    quantity,
                    unit_id: f.time.canonical_unit_id,
                    note: None,
                })
                .unwrap_err();
            assert!(matches!(err, TallyError::InvalidQuantity(_)));
        }
    }

    fn temperature(f: &Fixture) -> (ActivityType, Unit, Unit) {
        let group = f.service.create_group("temperature", "kelvin").unwrap();
        let celsius = f
            .service
            .add_unit(&NewUnit {
                group_id: group.id,
                name: "celsius".to_string(),
                factor: 1.0,
                offset: 273.15,
            })
            .unwrap();
        let shifted = f
            .service
            .add_unit(&NewUnit {
                group_id: group.id,
                name: "shifted".to_string(),
                factor: 1.0,
                offset: -10.0,
            })
            .unwrap();
        let sauna = activity(f, "sauna", group.id, None);
        (sauna, celsius, shifted)
    }

    #[test]
    fn test_affine_log_checked_after_conversion() {
        let f = fixture();
        let (sauna, celsius, shifted) = temperature(&f);

        let cold = f
            .service
            .log_activity(&NewActivityLog {
                activity_type_id: sauna.id,
                quantity: -5.0,
                unit_id: celsius.id,
                note: None,
            })
            .unwrap();
        assert!((cold.log.canonical_quantity - 268.15).abs() < 1e-9);
        assert!((cold.display_quantity + 5.0).abs() < 1e-9);

        let err = f
            .service
            .log_activity(&NewActivityLog {
                activity_type_id: sauna.id,
                quantity: 5.0,
                unit_id: shifted.id,
                note: None,
            })
            .unwrap_err();
        assert!(matches!(err, TallyError::InvalidQuantity(_)));
        assert_eq!(f.service.list_logs(sauna.id, None, None).unwrap().len(), 1);

        let err = f
            .service
            .update_log(
                cold.log.id,
                &UpdateActivityLog {
                    quantity: Some(5.0),
                    unit_id: Some(shifted.id),
                    note: None,
                },
            )
            .unwrap_err();
        assert!(matches!(err, TallyError::InvalidQuantity(_)));

        let warmer = f
            .service
            .update_log(
                cold.log.id,
                &UpdateActivityLog {
                    quantity: Some(-1.0),
                    unit_id: Some(celsius.id),
                    note: None,
                },
            )
            .unwrap();
        assert!((warmer.log.canonical_quantity - 272.15).abs() < 1e-9);
    }

    #[test]
    fn test_goal_checked_after_conversion() {
        let f = fixture();
        let (sauna, celsius, shifted) = temperature(&f);

        let set = |goal, unit_id| {
            f.service.update_activity_type(
                sauna.id,
                &UpdateActivityType {
                    goal_quantity: Some(Some(goal)),
                    ..UpdateActivityType::default()
                },
                Some(unit_id),
            )
        };
        let updated = set(-10.0, celsius.id).unwrap();
        assert!((updated.goal_quantity.unwrap() - 263.15).abs() < 1e-9);
        assert!(matches!(set(5.0, shifted.id), Err(TallyError::InvalidGoal(_))));
        assert!(matches!(set(f64::NAN, celsius.id), Err(TallyError::InvalidGoal(_))));
    }

    #[test]
    fn test_move_activity_with_goal_in_new_group() {
        let f = fixture();
        let yoga = activity(&f, "yoga", f.time.id, Some(60.0));

        let moved = f
            .service
            .update_activity_type(
                yoga.id,
                &UpdateActivityType {
                    unit_group_id: Some(f.distance.id),
                    ..UpdateActivityType::default()
                },
                None,
            )
            .unwrap();
        assert_eq!(moved.goal_quantity, None);

        let back = f
            .service
            .update_activity_type(
                yoga.id,
                &UpdateActivityType {
                    unit_group_id: Some(f.time.id),
                    goal_quantity: Some(Some(1.5)),
                    ..UpdateActivityType::default()
                },
                Some(f.hours.id),
            )
            .unwrap();
        assert_eq!(back.goal_quantity, Some(90.0));
    }

    #[test]
    fn test_yoga_goal_progress() {
        let f = fixture();
        let yoga = activity(&f, "yoga", f.time.id, Some(60.0));
        let log = |quantity, unit_id| {
            f.service
                .log_activity(&NewActivityLog {
                    activity_type_id: yoga.id,
                    quantity,
                    unit_id,
                    note: None,
                })
                .unwrap()
        };

        log(45.0, f.time.canonical_unit_id);
        let progress = f.service.goal_progress(yoga.id, None, None).unwrap();
        assert_eq!(progress.canonical.achieved, Some(false));
        assert!((progress.canonical.total - 45.0).abs() < f64::EPSILON);
        assert!((progress.canonical.remaining.unwrap() - 15.0).abs() < f64::EPSILON);

        // A third of an hour is 20 minutes.
        log(1.0 / 3.0, f.hours.id);
        let progress = f
            .service
            .goal_progress(yoga.id, None, Some(f.hours.id))
            .unwrap();
        assert_eq!(progress.log_count, 2);
        assert_eq!(progress.canonical.achieved, Some(true));
        assert!((progress.canonical.total - 65.0).abs() < 1e-9);
        assert_eq!(progress.canonical.remaining, Some(0.0));
        assert_eq!(progress.unit.name, "hours");
        assert!((progress.progress.total - 65.0 / 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_progress_since_filters_period() {
        let f = fixture();
        let yoga = activity(&f, "yoga", f.time.id, Some(30.0));
        f.service
            .log_activity(&NewActivityLog {
                activity_type_id: yoga.id,
                quantity: 30.0,
                unit_id: f.time.canonical_unit_id,
                note: None,
            })
            .unwrap();
        let hour_ago = Utc::now() - chrono::Duration::hours(1);
        let recent = f.service.goal_progress(yoga.id, Some(hour_ago), None).unwrap();
        assert_eq!(recent.canonical.achieved, Some(true));

        let later = Utc::now() + chrono::Duration::hours(1);
        let none = f.service.goal_progress(yoga.id, Some(later), None).unwrap();
        assert_eq!(none.log_count, 0);
        assert_eq!(none.canonical.achieved, Some(false));
    }

    #[test]
    fn test_all_progress() {
        let f = fixture();
        activity(&f, "yoga", f.time.id, Some(60.0));
        activity(&f, "cycling", f.distance.id, None);
        let all = f.service.all_progress(None).unwrap();
        let names: Vec<&str> = all.iter().map(|p| p.activity.name.as_str()).collect();
        assert_eq!(names, ["cycling", "yoga"]);
        assert_eq!(all[0].canonical.achieved, None);
        assert_eq!(all[1].unit.name, "minutes");
    }

    #[test]
    fn test_goal_in_other_unit() {
        let f = fixture();
        let cycling = f
            .service
            .create_activity_type(
                &NewActivityType {
                    name: "cycling".to_string(),
                    unit_group_id: f.distance.id,
                    goal_quantity: Some(20.0),
                },
                Some(f.kilometers.id),
            )
            .unwrap();
        assert_eq!(cycling.goal_quantity, Some(20_000.0));

        let err = f
            .service
            .create_activity_type(
                &NewActivityType {
                    name: "running".to_string(),
                    unit_group_id: f.distance.id,
                    goal_quantity: Some(1.0),
                },
                Some(f.hours.id),
            )
            .unwrap_err();
        assert!(matches!(err, TallyError::IncompatibleUnits { .. }));

        let updated = f
            .service
            .update_activity_type(
                cycling.id,
                &UpdateActivityType {
                    goal_quantity: Some(Some(5.0)),
                    ..UpdateActivityType::default()
                },
                Some(f.kilometers.id),
            )
            .unwrap();
        assert_eq!(updated.goal_quantity, Some(5000.0));
    }

    #[test]
    fn test_update_log_renormalizes() {
        let f = fixture();
        let cycling = activity(&f, "cycling", f.distance.id, None);
        let shown = f
            .service
            .log_activity(&NewActivityLog {
                activity_type_id: cycling.id,
                quantity: 1500.0,
                unit_id: f.distance.canonical_unit_id,
                note: Some("loop".to_string()),
            })
            .unwrap();

        let updated = f
            .service
            .update_log(
                shown.log.id,
                &UpdateActivityLog {
                    quantity: Some(2.5),
                    unit_id: Some(f.kilometers.id),
                    note: None,
                },
            )
            .unwrap();
        assert!((updated.log.canonical_quantity - 2500.0).abs() < f64::EPSILON);
        assert_eq!(updated.log.note.as_deref(), Some("loop"));
        assert_eq!(updated.log.timestamp, shown.log.timestamp);

        let err = f
            .service
            .update_log(
                shown.log.id,
                &UpdateActivityLog {
                    quantity: Some(1.0),
                    unit_id: Some(f.hours.id),
                    note: None,
                },
            )
            .unwrap_err();
        assert!(matches!(err, TallyError::IncompatibleUnits { .. }));
    }

    #[test]
    fn test_list_logs_display_unit() {
        let f = fixture();
        let cycling = activity(&f, "cycling", f.distance.id, None);
        for meters in [500.0, 1500.0] {
            f.service
                .log_activity(&NewActivityLog {
                    activity_type_id: cycling.id,
                    quantity: meters,
                    unit_id: f.distance.canonical_unit_id,
                    note: None,
                })
                .unwrap();
        }
        let logs = f
            .service
            .list_logs(cycling.id, Some(f.kilometers.id), None)
            .unwrap();
        let shown: Vec<f64> = logs.iter().map(|l| l.display_quantity).collect();
        assert!((shown[0] - 0.5).abs() < f64::EPSILON);
        assert!((shown[1] - 1.5).abs() < f64::EPSILON);

        assert!(matches!(
            f.service.list_logs(cycling.id, Some(f.hours.id), None),
            Err(TallyError::IncompatibleUnits { .. })
        ));
    }

    #[test]
    fn test_convert() {
        let f = fixture();
        let m = f
            .service
            .convert(5.0, f.kilometers.id, f.distance.canonical_unit_id)
            .unwrap();
        assert!((m - 5000.0).abs() < f64::EPSILON);
        assert!(matches!(
            f.service.convert(1.0, f.kilometers.id, f.hours.id),
            Err(TallyError::IncompatibleUnits { .. })
        ));
    }

    #[test]
    fn test_resolve_by_name_or_id() {
        let f = fixture();
        assert_eq!(f.service.resolve_group("time").unwrap().id, f.time.id);
        assert_eq!(
            f.service.resolve_group(&f.distance.id.to_string()).unwrap().name,
            "distance"
        );
        assert!(matches!(
            f.service.resolve_group("mass"),
            Err(TallyError::UnknownGroupName(_))
        ));
        assert_eq!(
            f.service.resolve_unit("kilometers").unwrap().id,
            f.kilometers.id
        );
        assert!(matches!(
            f.service.resolve_unit("furlongs"),
            Err(TallyError::UnknownUnit(_))
        ));
        let yoga = activity(&f, "yoga", f.time.id, None);
        assert_eq!(
            f.service.resolve_activity_type(&yoga.id.to_string()).unwrap().name,
            "yoga"
        );
    }

    #[test]
    fn test_delete_group_removes_activities() {
        let f = fixture();
        let cycling = activity(&f, "cycling", f.distance.id, Some(1000.0));
        f.service.delete_group(f.distance.id).unwrap();
        assert!(matches!(
            f.service.get_activity_type(cycling.id),
            Err(TallyError::UnknownActivityType(_))
        ));
        assert!(matches!(
            f.service.get_unit(f.kilometers.id),
            Err(TallyError::UnknownUnit(_))
        ));
        assert_eq!(f.service.list_activity_types().unwrap().len(), 0);
    }
}
