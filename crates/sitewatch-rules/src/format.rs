//! Canonical one-line rendering of rule conditions, shown in rule lists
//! and embedded in notification payloads.

use serde_json::Value;
use sitewatch_common::types::Condition;

/// Rendering used when condition JSON does not match any known type.
pub const UNKNOWN_CONDITION: &str = "Unknown condition";

/// Render a typed condition as its canonical `IF ...` sentence.
///
/// Deterministic and total: equal conditions always produce equal strings.
///
/// # Examples
///
/// ```
/// use sitewatch_common::types::{CompareOp, Condition};
/// use sitewatch_rules::format_condition;
///
/// let cond = Condition::Proximity {
///     object1: "forklift".into(),
///     object2: "person".into(),
///     operator: CompareOp::GreaterThan,
///     threshold: 10.0,
///     unit: "ft".into(),
/// };
/// assert_eq!(format_condition(&cond), "IF forklift > 10ft TO person");
/// ```
pub fn format_condition(condition: &Condition) -> String {
    match condition {
        Condition::Proximity {
            object1,
            object2,
            operator,
            threshold,
            unit,
        } => format!(
            "IF {object1} {operator} {}{unit} TO {object2}",
            fmt_num(*threshold)
        ),
        Condition::Speed {
            object1,
            operator,
            threshold,
            unit,
        } => format!(
            "IF {object1} SPEED {operator} {}{unit}",
            fmt_num(*threshold)
        ),
        Condition::AreaEntry { object1, area } => format!("IF {object1} ENTERS {area}"),
        Condition::AreaExit { object1, area } => format!("IF {object1} LEAVES {area}"),
        Condition::IdleTime {
            equipment,
            duration,
            unit,
        } => format!("IF {equipment} IDLE > {} {unit}", fmt_num(*duration)),
        Condition::UnauthorizedAccess { area } => {
            format!("IF UNAUTHORIZED ACCESS TO {area}")
        }
        Condition::EquipmentUsage {
            equipment,
            operator,
        } => format!("IF {equipment} USED BY {operator}"),
        Condition::SafetyZone { object1, area } => format!("IF {object1} VIOLATES {area}"),
        Condition::CrowdDensity { area, max_count } => {
            format!("IF CROWD IN {area} > {max_count} PEOPLE")
        }
        Condition::PpeDetection { ppe_type, area } => {
            format!("IF {ppe_type} NOT WORN IN {area}")
        }
    }
}

/// Render condition JSON as loaded from storage.
///
/// Rows written by older schema versions may carry a type that is no
/// longer in the table; those render as [`UNKNOWN_CONDITION`] instead of
/// failing the whole listing.
pub fn format_condition_value(value: &Value) -> String {
    match serde_json::from_value::<Condition>(value.clone()) {
        Ok(cond) => format_condition(&cond),
        Err(_) => UNKNOWN_CONDITION.to_string(),
    }
}

/// Integral thresholds print without a trailing `.0`.
fn fmt_num(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}
