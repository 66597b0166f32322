//! Affine unit conversion through the group's canonical unit.
//!
//! Every unit stores `factor` and `offset` relative to its group's canonical
//! unit, so any two units of one group convert by going to canonical form and
//! back out again. Nothing here rounds; display precision is the caller's
//! business. Factors are validated when a unit is created, so `from_canonical`
//! never divides by zero on stored data.

use crate::error::{Result, TallyError};
use crate::models::Unit;

/// `canonical = quantity * factor + offset`
#[must_use]
pub fn to_canonical(quantity: f64, unit: &Unit) -> f64 {
    quantity * unit.factor + unit.offset
}

/// `quantity = (canonical - offset) / factor`
#[must_use]
pub fn from_canonical(canonical: f64, unit: &Unit) -> f64 {
    (canonical - unit.offset) / unit.factor
}

/// Convert `quantity` from one unit to another unit of the same group.
///
/// Converting a unit to itself returns the input untouched.
pub fn convert(quantity: f64, from: &Unit, to: &Unit) -> Result<f64> {
    if from.group_id != to.group_id {
        return Err(TallyError::IncompatibleUnits {
            from: from.name.clone(),
            to: to.name.clone(),
        });
    }
    if from.id == to.id {
        return Ok(quantity);
    }
    Ok(from_canonical(to_canonical(quantity, from), to))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(id: i64, name: &str, group_id: i64, factor: f64, offset: f64) -> Unit {
        Unit {
            id,
            name: name.to_string(),
            group_id,
            factor,
            offset,
            is_canonical: factor == 1.0 && offset == 0.0,
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
    }

    #[test]
    fn test_kilometers_to_meters() {
        let meters = unit(1, "meters", 1, 1.0, 0.0);
        let km = unit(2, "kilometers", 1, 1000.0, 0.0);
        assert!((convert(5.0, &km, &meters).unwrap() - 5000.0).abs() < f64::EPSILON);
        assert!((convert(5000.0, &meters, &km).unwrap() - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_affine_unit() {
        let unit_a = unit(3, "unitA", 1, 2.0, 10.0);
        assert!((to_canonical(5.0, &unit_a) - 20.0).abs() < f64::EPSILON);
        assert!((from_canonical(20.0, &unit_a) - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_fahrenheit_to_celsius_through_kelvin() {
        let kelvin = unit(1, "kelvin", 1, 1.0, 0.0);
        let celsius = unit(2, "celsius", 1, 1.0, 273.15);
        let fahrenheit = unit(3, "fahrenheit", 1, 5.0 / 9.0, 255.372_222_222_222_2);
        let c = convert(212.0, &fahrenheit, &celsius).unwrap();
        assert!(close(c, 100.0), "got {c}");
        let k = convert(-40.0, &celsius, &kelvin).unwrap();
        assert!(close(k, 233.15), "got {k}");
    }

    #[test]
    fn test_round_trip() {
        let units = [
            unit(1, "meters", 1, 1.0, 0.0),
            unit(2, "miles", 1, 1609.344, 0.0),
            unit(3, "tiny", 1, 1e-6, 0.0),
            unit(4, "shifted", 1, 0.001, -2.5),
            unit(5, "affine", 1, 2.0, 10.0),
        ];
        let quantities = [0.0, 1.0, 0.1, 5.5, 123_456.789, 1e-9, 3.0e7];
        for u in &units {
            for &q in &quantities {
                let back = from_canonical(to_canonical(q, u), u);
                assert!(
                    (back - q).abs() <= 1e-9 * q.abs().max(1.0),
                    "{} round trip of {q} gave {back}",
                    u.name
                );
            }
        }
    }

    #[test]
    fn test_identity() {
        let odd = unit(5, "odd", 1, 3.0, 0.7);
        for q in [0.1, 1.0 / 3.0, 42.0, -7.25] {
            assert_eq!(convert(q, &odd, &odd).unwrap().to_bits(), q.to_bits());
        }
    }

    #[test]
    fn test_canonical_unit_is_noop() {
        let minutes = unit(1, "minutes", 1, 1.0, 0.0);
        for q in [0.0, 0.1, 45.0, 1e12] {
            assert_eq!(to_canonical(q, &minutes).to_bits(), q.to_bits());
            assert_eq!(from_canonical(q, &minutes).to_bits(), q.to_bits());
        }
    }

    #[test]
    fn test_cross_group_rejected() {
        let meters = unit(1, "meters", 1, 1.0, 0.0);
        let minutes = unit(2, "minutes", 2, 1.0, 0.0);
        let err = convert(1.0, &meters, &minutes).unwrap_err();
        assert!(matches!(
            err,
            TallyError::IncompatibleUnits { ref from, ref to } if from == "meters" && to == "minutes"
        ));
    }

    #[test]
    fn test_unit_methods_delegate() {
        let hours = unit(2, "hours", 1, 60.0, 0.0);
        assert!((hours.to_canonical(1.5) - 90.0).abs() < f64::EPSILON);
        assert!((hours.from_canonical(90.0) - 1.5).abs() < f64::EPSILON);
    }
}
