use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::convert;
use crate::error::{Result, TallyError};

pub type GroupId = i64;
pub type UnitId = i64;
pub type ActivityTypeId = i64;
pub type LogId = i64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitGroup {
    pub id: GroupId,
    pub name: String,
}

/// A group joined with its canonical unit, for listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupOverview {
    pub id: GroupId,
    pub name: String,
    pub canonical_unit_id: UnitId,
    pub canonical_unit_name: String,
    pub unit_count: i64,
}

/// A unit of measure. Values in this unit map onto the group's canonical unit
/// with `canonical = raw * factor + offset`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    pub name: String,
    pub group_id: GroupId,
    pub factor: f64,
    #[serde(default)]
    pub offset: f64,
    pub is_canonical: bool,
}

impl Unit {
    #[must_use]
    pub fn to_canonical(&self, quantity: f64) -> f64 {
        convert::to_canonical(quantity, self)
    }

    #[must_use]
    pub fn from_canonical(&self, canonical: f64) -> f64 {
        convert::from_canonical(canonical, self)
    }
}

#[derive(Debug, Clone)]
pub struct NewUnit {
    pub group_id: GroupId,
    pub name: String,
    pub factor: f64,
    pub offset: f64,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateUnit {
    pub name: Option<String>,
    pub group_id: Option<GroupId>,
    pub factor: Option<f64>,
    pub offset: Option<f64>,
}

impl UpdateUnit {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.group_id.is_none() && self.factor.is_none() && self.offset.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityType {
    pub id: ActivityTypeId,
    pub name: String,
    pub unit_group_id: GroupId,
    /// Target cumulative quantity, in the group's canonical unit.
    pub goal_quantity: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct NewActivityType {
    pub name: String,
    pub unit_group_id: GroupId,
    pub goal_quantity: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateActivityType {
    pub name: Option<String>,
    pub unit_group_id: Option<GroupId>,
    /// `Some(None)` clears the goal.
    pub goal_quantity: Option<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityLog {
    pub id: LogId,
    pub activity_type_id: ActivityTypeId,
    pub canonical_quantity: f64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub note: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Input for a new log. `quantity` is expressed in `unit_id`; the store only
/// ever sees the canonical value.
#[derive(Debug, Clone)]
pub struct NewActivityLog {
    pub activity_type_id: ActivityTypeId,
    pub quantity: f64,
    pub unit_id: UnitId,
    pub note: Option<String>,
}

/// Changes to an existing log. A new quantity without a unit is read in the
/// group's canonical unit. The timestamp is never touched.
#[derive(Debug, Clone, Default)]
pub struct UpdateActivityLog {
    pub quantity: Option<f64>,
    pub unit_id: Option<UnitId>,
    /// `Some(None)` clears the note.
    pub note: Option<Option<String>>,
}

/// A log converted out of canonical form for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayedLog {
    #[serde(flatten)]
    pub log: ActivityLog,
    pub display_unit_id: UnitId,
    pub display_unit_name: String,
    pub display_quantity: f64,
}

impl DisplayedLog {
    #[must_use]
    pub fn new(log: ActivityLog, unit: &Unit) -> Self {
        let display_quantity = unit.from_canonical(log.canonical_quantity);
        Self {
            log,
            display_unit_id: unit.id,
            display_unit_name: unit.name.clone(),
            display_quantity,
        }
    }
}

// --- Validation ---

/// Trim a name and reject it if nothing is left.
pub fn validate_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(TallyError::InvalidName);
    }
    Ok(trimmed.to_string())
}

pub fn validate_factor(factor: f64) -> Result<f64> {
    if !factor.is_finite() || factor <= 0.0 {
        return Err(TallyError::InvalidFactor(factor));
    }
    Ok(factor)
}

pub fn validate_offset(offset: f64) -> Result<f64> {
    if !offset.is_finite() {
        return Err(TallyError::InvalidOffset(offset));
    }
    Ok(offset)
}

/// A stored quantity is canonical, finite, and never below zero.
pub fn validate_quantity(canonical: f64) -> Result<f64> {
    if !canonical.is_finite() || canonical < 0.0 {
        return Err(TallyError::InvalidQuantity(canonical));
    }
    Ok(canonical)
}

/// Normalize a quantity entered in `unit`. The entered value only has to be
/// finite; the zero floor applies after conversion, so "-5 celsius" is fine
/// and "5" in a unit with offset -10 is not.
pub fn canonical_quantity(quantity: f64, unit: &Unit) -> Result<f64> {
    if !quantity.is_finite() {
        return Err(TallyError::InvalidQuantity(quantity));
    }
    validate_quantity(unit.to_canonical(quantity))
}

pub fn validate_goal(goal: Option<f64>) -> Result<Option<f64>> {
    match goal {
        Some(g) if !g.is_finite() || g < 0.0 => Err(TallyError::InvalidGoal(g)),
        other => Ok(other),
    }
}
