use thiserror::Error;

use crate::models::{ActivityTypeId, GroupId, LogId, UnitId};

pub type Result<T> = std::result::Result<T, TallyError>;

/// Every failure the core can report. Variants carry the offending identifier
/// or value so callers can render a message without another lookup.
#[derive(Debug, Error)]
pub enum TallyError {
    #[error("name '{0}' is already in use")]
    DuplicateName(String),
    #[error("invalid conversion factor {0}: must be a finite number greater than 0")]
    InvalidFactor(f64),
    #[error("invalid offset {0}: must be a finite number")]
    InvalidOffset(f64),
    #[error("invalid quantity {0}: must be finite and come to 0 or more in the canonical unit")]
    InvalidQuantity(f64),
    #[error("invalid goal {0}: must be finite and come to 0 or more in the canonical unit")]
    InvalidGoal(f64),
    #[error("name must not be empty")]
    InvalidName,
    #[error("unit group {0} not found")]
    UnknownGroup(GroupId),
    #[error("unit group '{0}' not found")]
    UnknownGroupName(String),
    #[error("unit {0} not found")]
    UnknownUnit(String),
    #[error("activity type {0} not found")]
    UnknownActivityType(String),
    #[error("activity log {0} not found")]
    UnknownLog(LogId),
    #[error("cannot convert between '{from}' and '{to}': units belong to different groups")]
    IncompatibleUnits { from: String, to: String },
    #[error("unit '{0}' is the canonical unit of its group and cannot be changed or deleted")]
    CanonicalUnitLocked(String),
    #[error("activity type {0} has logs; its unit group cannot change")]
    ActivityTypeHasLogs(ActivityTypeId),
    #[error("unit group {group} has {count} canonical units")]
    CorruptRegistry { group: GroupId, count: usize },
    #[error("database error: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl TallyError {
    pub(crate) fn unknown_unit_id(id: UnitId) -> Self {
        TallyError::UnknownUnit(id.to_string())
    }

    pub(crate) fn unknown_activity_type_id(id: ActivityTypeId) -> Self {
        TallyError::UnknownActivityType(id.to_string())
    }

    /// True for the not-found family, which callers usually map to exit code 2.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            TallyError::UnknownGroup(_)
                | TallyError::UnknownGroupName(_)
                | TallyError::UnknownUnit(_)
                | TallyError::UnknownActivityType(_)
                | TallyError::UnknownLog(_)
        )
    }
}
