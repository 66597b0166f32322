//! In-memory unit group registry.
//!
//! Holds groups and their units and enforces the same rules as the SQLite
//! store: unique names, positive finite factors, and exactly one canonical
//! unit per group that can never be changed or removed. Use it directly as a
//! library object, or snapshot a database with [`UnitRegistry::from_records`]
//! to run many conversions without further queries.

use std::collections::BTreeMap;

use tracing::debug;

use crate::convert;
use crate::error::{Result, TallyError};
use crate::models::{
    GroupId, Unit, UnitGroup, UnitId, UpdateUnit, validate_factor, validate_name, validate_offset,
};

#[derive(Debug, Clone, Default)]
pub struct UnitRegistry {
    groups: BTreeMap<GroupId, UnitGroup>,
    units: BTreeMap<UnitId, Unit>,
    next_id: i64,
}

impl UnitRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: 1,
            ..Self::default()
        }
    }

    /// Build a registry from stored records, refusing data that breaks the
    /// one-canonical-unit-per-group invariant.
    pub fn from_records(groups: Vec<UnitGroup>, units: Vec<Unit>) -> Result<Self> {
        let mut registry = Self::new();
        for group in groups {
            registry.next_id = registry.next_id.max(group.id + 1);
            registry.groups.insert(group.id, group);
        }
        for unit in units {
            if !registry.groups.contains_key(&unit.group_id) {
                return Err(TallyError::UnknownGroup(unit.group_id));
            }
            registry.next_id = registry.next_id.max(unit.id + 1);
            registry.units.insert(unit.id, unit);
        }
        registry.check_invariant()?;
        Ok(registry)
    }

    /// Verify every group has exactly one canonical unit.
    pub fn check_invariant(&self) -> Result<()> {
        for &group in self.groups.keys() {
            let count = self
                .units
                .values()
                .filter(|u| u.group_id == group && u.is_canonical)
                .count();
            if count != 1 {
                return Err(TallyError::CorruptRegistry { group, count });
            }
        }
        Ok(())
    }

    fn allocate_id(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn ensure_unit_name_free(&self, name: &str, except: Option<UnitId>) -> Result<()> {
        if self
            .units
            .values()
            .any(|u| u.name == name && Some(u.id) != except)
        {
            return Err(TallyError::DuplicateName(name.to_string()));
        }
        Ok(())
    }

    fn ensure_group_name_free(&self, name: &str, except: Option<GroupId>) -> Result<()> {
        if self
            .groups
            .values()
            .any(|g| g.name == name && Some(g.id) != except)
        {
            return Err(TallyError::DuplicateName(name.to_string()));
        }
        Ok(())
    }

    // --- Groups ---

    /// Create a group together with its canonical unit (factor 1, offset 0).
    /// Nothing is inserted unless both names are free.
    pub fn create_group(&mut self, name: &str, canonical_unit_name: &str) -> Result<GroupId> {
        let name = validate_name(name)?;
        let unit_name = validate_name(canonical_unit_name)?;
        self.ensure_group_name_free(&name, None)?;
        self.ensure_unit_name_free(&unit_name, None)?;

        let group_id = self.allocate_id();
        let unit_id = self.allocate_id();
        self.groups.insert(
            group_id,
            UnitGroup {
                id: group_id,
                name,
            },
        );
        self.units.insert(
            unit_id,
            Unit {
                id: unit_id,
                name: unit_name,
                group_id,
                factor: 1.0,
                offset: 0.0,
                is_canonical: true,
            },
        );
        debug!(group_id, unit_id, "created unit group");
        Ok(group_id)
    }

    pub fn group(&self, id: GroupId) -> Result<&UnitGroup> {
        self.groups.get(&id).ok_or(TallyError::UnknownGroup(id))
    }

    pub fn group_by_name(&self, name: &str) -> Option<&UnitGroup> {
        self.groups.values().find(|g| g.name == name)
    }

    pub fn groups(&self) -> impl Iterator<Item = &UnitGroup> {
        self.groups.values()
    }

    pub fn rename_group(&mut self, id: GroupId, name: &str) -> Result<()> {
        let name = validate_name(name)?;
        self.group(id)?;
        self.ensure_group_name_free(&name, Some(id))?;
        if let Some(group) = self.groups.get_mut(&id) {
            group.name = name;
        }
        Ok(())
    }

    /// Remove a group and every unit in it. Returns the number of units removed.
    pub fn delete_group(&mut self, id: GroupId) -> Result<usize> {
        if self.groups.remove(&id).is_none() {
            return Err(TallyError::UnknownGroup(id));
        }
        let before = self.units.len();
        self.units.retain(|_, u| u.group_id != id);
        let removed = before - self.units.len();
        debug!(group_id = id, removed, "deleted unit group");
        Ok(removed)
    }

    pub fn canonical_unit(&self, group_id: GroupId) -> Result<&Unit> {
        self.group(group_id)?;
        self.units
            .values()
            .find(|u| u.group_id == group_id && u.is_canonical)
            .ok_or(TallyError::CorruptRegistry {
                group: group_id,
                count: 0,
            })
    }

    // --- Units ---

    /// Add a non-canonical unit to a group.
    pub fn add_unit(
        &mut self,
        group_id: GroupId,
        name: &str,
        factor: f64,
        offset: f64,
    ) -> Result<UnitId> {
        let factor = validate_factor(factor)?;
        let offset = validate_offset(offset)?;
        let name = validate_name(name)?;
        self.group(group_id)?;
        self.ensure_unit_name_free(&name, None)?;

        let id = self.allocate_id();
        self.units.insert(
            id,
            Unit {
                id,
                name,
                group_id,
                factor,
                offset,
                is_canonical: false,
            },
        );
        debug!(unit_id = id, group_id, factor, offset, "added unit");
        Ok(id)
    }

    pub fn unit(&self, id: UnitId) -> Result<&Unit> {
        self.units
            .get(&id)
            .ok_or_else(|| TallyError::unknown_unit_id(id))
    }

    pub fn unit_by_name(&self, name: &str) -> Result<&Unit> {
        self.units
            .values()
            .find(|u| u.name == name)
            .ok_or_else(|| TallyError::UnknownUnit(name.to_string()))
    }

    /// Units of one group, canonical unit first.
    pub fn units_in_group(&self, group_id: GroupId) -> Result<Vec<&Unit>> {
        self.group(group_id)?;
        let mut units: Vec<&Unit> = self
            .units
            .values()
            .filter(|u| u.group_id == group_id)
            .collect();
        units.sort_by_key(|u| (!u.is_canonical, u.id));
        Ok(units)
    }

    pub fn update_unit(&mut self, id: UnitId, update: &UpdateUnit) -> Result<&Unit> {
        let current = self.unit(id)?;
        if current.is_canonical {
            return Err(TallyError::CanonicalUnitLocked(current.name.clone()));
        }
        let factor = update.factor.map(validate_factor).transpose()?;
        let offset = update.offset.map(validate_offset).transpose()?;
        let name = update.name.as_deref().map(validate_name).transpose()?;
        if let Some(group_id) = update.group_id {
            self.group(group_id)?;
        }
        if let Some(ref name) = name {
            self.ensure_unit_name_free(name, Some(id))?;
        }

        let unit = self
            .units
            .get_mut(&id)
            .ok_or_else(|| TallyError::unknown_unit_id(id))?;
        if let Some(name) = name {
            unit.name = name;
        }
        if let Some(group_id) = update.group_id {
            unit.group_id = group_id;
        }
        if let Some(factor) = factor {
            unit.factor = factor;
        }
        if let Some(offset) = offset {
            unit.offset = offset;
        }
        Ok(unit)
    }

    pub fn delete_unit(&mut self, id: UnitId) -> Result<Unit> {
        let unit = self.unit(id)?;
        if unit.is_canonical {
            return Err(TallyError::CanonicalUnitLocked(unit.name.clone()));
        }
        self.units
            .remove(&id)
            .ok_or_else(|| TallyError::unknown_unit_id(id))
    }

    // --- Conversion ---

    pub fn convert_by_id(&self, quantity: f64, from: UnitId, to: UnitId) -> Result<f64> {
        convert::convert(quantity, self.unit(from)?, self.unit(to)?)
    }

    pub fn convert_by_name(&self, quantity: f64, from: &str, to: &str) -> Result<f64> {
        convert::convert(quantity, self.unit_by_name(from)?, self.unit_by_name(to)?)
    }
}
