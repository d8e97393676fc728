//! Table-driven parameter schema for rule conditions, and the validation
//! gate that turns an untrusted draft into a typed [`Condition`].

use serde::Serialize;
use serde_json::Value;
use sitewatch_common::types::{CompareOp, Condition, ConditionType, RawCondition, Severity};

/// What kind of value a condition parameter takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Free text.
    Text,
    /// A number (JSON number, or a numeric string as HTML forms send).
    Number,
    /// One value out of a fixed option list. The list drives pickers and
    /// the AI prompt; validation only requires a non-empty value.
    OneOf(&'static [&'static str]),
}

/// One parameter slot of a condition type.
#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: ParamKind,
}

const fn one_of(
    key: &'static str,
    label: &'static str,
    options: &'static [&'static str],
) -> ParamSpec {
    ParamSpec {
        key,
        label,
        kind: ParamKind::OneOf(options),
    }
}

const fn number(key: &'static str, label: &'static str) -> ParamSpec {
    ParamSpec {
        key,
        label,
        kind: ParamKind::Number,
    }
}

const OPERATORS: &[&str] = &[">", "<", "="];

const PROXIMITY_SPECS: &[ParamSpec] = &[
    one_of("object1", "First Object", &["forklift", "person", "vehicle", "equipment"]),
    one_of("object2", "Second Object", &["person", "forklift", "vehicle", "equipment", "wall"]),
    one_of("operator", "Operator", OPERATORS),
    number("threshold", "Distance"),
    one_of("unit", "Unit", &["ft", "m"]),
];

const SPEED_SPECS: &[ParamSpec] = &[
    one_of("object1", "Object", &["forklift", "vehicle", "person"]),
    one_of("operator", "Operator", OPERATORS),
    number("threshold", "Speed"),
    one_of("unit", "Unit", &["mph", "km/h"]),
];

const AREA_ENTRY_SPECS: &[ParamSpec] = &[
    one_of("object1", "Object", &["person", "forklift", "vehicle"]),
    one_of("area", "Area", &["warehouse", "loading_dock", "storage_area", "maintenance_zone"]),
];

const AREA_EXIT_SPECS: &[ParamSpec] = &[
    one_of("object1", "Object", &["person", "forklift", "vehicle"]),
    one_of("area", "Area", &["work_zone", "safety_zone", "restricted_area"]),
];

const IDLE_TIME_SPECS: &[ParamSpec] = &[
    one_of("equipment", "Equipment", &["forklift", "vehicle", "machine"]),
    number("duration", "Duration"),
    one_of("unit", "Unit", &["minutes", "hours"]),
];

const UNAUTHORIZED_ACCESS_SPECS: &[ParamSpec] = &[one_of(
    "area",
    "Restricted Area",
    &["server_room", "electrical_room", "chemical_storage", "maintenance_zone"],
)];

const EQUIPMENT_USAGE_SPECS: &[ParamSpec] = &[
    one_of("equipment", "Equipment", &["forklift", "crane", "ladder", "scaffold"]),
    one_of("operator", "Operator Status", &["unauthorized", "unqualified"]),
];

const SAFETY_ZONE_SPECS: &[ParamSpec] = &[
    one_of("object1", "Object", &["person", "forklift", "vehicle"]),
    one_of("area", "Safety Zone", &["emergency_exit", "fire_equipment", "first_aid_station"]),
];

const CROWD_DENSITY_SPECS: &[ParamSpec] = &[
    one_of("area", "Area", &["entrance", "exit", "common_area", "work_zone"]),
    number("max_count", "Max People"),
];

const PPE_DETECTION_SPECS: &[ParamSpec] = &[
    one_of("ppe_type", "PPE Type", &["hard_hat", "safety_vest", "safety_glasses", "gloves", "boots"]),
    one_of("area", "Area", &["construction_zone", "warehouse", "loading_dock", "maintenance_area"]),
];

/// The parameter table for every [`ConditionType`], in display order.
pub fn parameter_specs(t: ConditionType) -> &'static [ParamSpec] {
    match t {
        ConditionType::Proximity => PROXIMITY_SPECS,
        ConditionType::Speed => SPEED_SPECS,
        ConditionType::AreaEntry => AREA_ENTRY_SPECS,
        ConditionType::AreaExit => AREA_EXIT_SPECS,
        ConditionType::IdleTime => IDLE_TIME_SPECS,
        ConditionType::UnauthorizedAccess => UNAUTHORIZED_ACCESS_SPECS,
        ConditionType::EquipmentUsage => EQUIPMENT_USAGE_SPECS,
        ConditionType::SafetyZone => SAFETY_ZONE_SPECS,
        ConditionType::CrowdDensity => CROWD_DENSITY_SPECS,
        ConditionType::PpeDetection => PPE_DETECTION_SPECS,
    }
}

/// One rejected field with a human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// All field errors found in one validation pass. Validation never stops
/// at the first problem, so a client can fix everything in one round trip.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{}", self.join())]
pub struct ValidationError {
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    pub fn join(&self) -> String {
        self.errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Reads parameters out of a draft map, accumulating errors instead of
/// failing fast. Values returned on error are placeholders; the caller
/// discards the built condition whenever `errors` is non-empty.
struct ParamReader<'a> {
    params: &'a serde_json::Map<String, Value>,
    errors: Vec<FieldError>,
}

impl<'a> ParamReader<'a> {
    fn new(params: &'a serde_json::Map<String, Value>) -> Self {
        Self {
            params,
            errors: Vec::new(),
        }
    }

    fn text(&mut self, key: &str) -> String {
        match self.params.get(key) {
            Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
            Some(Value::String(_)) | None => {
                self.errors.push(FieldError::new(key, "is required"));
                String::new()
            }
            Some(_) => {
                self.errors.push(FieldError::new(key, "must be a string"));
                String::new()
            }
        }
    }

    fn number(&mut self, key: &str) -> f64 {
        match self.params.get(key) {
            Some(Value::Number(n)) => match n.as_f64() {
                Some(v) => v,
                None => {
                    self.errors.push(FieldError::new(key, "must be a number"));
                    0.0
                }
            },
            // Form clients submit numbers as strings.
            Some(Value::String(s)) if !s.trim().is_empty() => match s.trim().parse::<f64>() {
                Ok(v) => v,
                Err(_) => {
                    self.errors.push(FieldError::new(key, "must be a number"));
                    0.0
                }
            },
            Some(Value::String(_)) | None => {
                self.errors.push(FieldError::new(key, "is required"));
                0.0
            }
            Some(_) => {
                self.errors.push(FieldError::new(key, "must be a number"));
                0.0
            }
        }
    }

    fn count(&mut self, key: &str) -> u32 {
        let before = self.errors.len();
        let v = self.number(key);
        if self.errors.len() > before {
            return 0;
        }
        if v < 0.0 || v.fract() != 0.0 || v > u32::MAX as f64 {
            self.errors
                .push(FieldError::new(key, "must be a non-negative whole number"));
            return 0;
        }
        v as u32
    }

    fn compare_op(&mut self, key: &str) -> CompareOp {
        let before = self.errors.len();
        let raw = self.text(key);
        if self.errors.len() > before {
            return CompareOp::GreaterThan;
        }
        match raw.parse() {
            Ok(op) => op,
            Err(_) => {
                self.errors
                    .push(FieldError::new(key, "must be one of >, <, ="));
                CompareOp::GreaterThan
            }
        }
    }

    fn finish<T>(self, value: T) -> Result<T, Vec<FieldError>> {
        if self.errors.is_empty() {
            Ok(value)
        } else {
            Err(self.errors)
        }
    }
}

/// Validate a raw condition draft into a typed [`Condition`].
///
/// Unknown type tags fail with a single `type` error; known types check
/// every parameter slot and report all failures at once. Extra keys in the
/// draft are dropped, not rejected.
pub fn validate_condition(raw: &RawCondition) -> Result<Condition, Vec<FieldError>> {
    let Ok(condition_type) = raw.condition_type.parse::<ConditionType>() else {
        let known = ConditionType::ALL
            .iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        return Err(vec![FieldError::new(
            "type",
            format!("must be one of: {known}"),
        )]);
    };

    let mut r = ParamReader::new(&raw.parameters);
    match condition_type {
        ConditionType::Proximity => {
            let cond = Condition::Proximity {
                object1: r.text("object1"),
                object2: r.text("object2"),
                operator: r.compare_op("operator"),
                threshold: r.number("threshold"),
                unit: r.text("unit"),
            };
            r.finish(cond)
        }
        ConditionType::Speed => {
            let cond = Condition::Speed {
                object1: r.text("object1"),
                operator: r.compare_op("operator"),
                threshold: r.number("threshold"),
                unit: r.text("unit"),
            };
            r.finish(cond)
        }
        ConditionType::AreaEntry => {
            let cond = Condition::AreaEntry {
                object1: r.text("object1"),
                area: r.text("area"),
            };
            r.finish(cond)
        }
        ConditionType::AreaExit => {
            let cond = Condition::AreaExit {
                object1: r.text("object1"),
                area: r.text("area"),
            };
            r.finish(cond)
        }
        ConditionType::IdleTime => {
            let cond = Condition::IdleTime {
                equipment: r.text("equipment"),
                duration: r.number("duration"),
                unit: r.text("unit"),
            };
            r.finish(cond)
        }
        ConditionType::UnauthorizedAccess => {
            let cond = Condition::UnauthorizedAccess {
                area: r.text("area"),
            };
            r.finish(cond)
        }
        ConditionType::EquipmentUsage => {
            let cond = Condition::EquipmentUsage {
                equipment: r.text("equipment"),
                operator: r.text("operator"),
            };
            r.finish(cond)
        }
        ConditionType::SafetyZone => {
            let cond = Condition::SafetyZone {
                object1: r.text("object1"),
                area: r.text("area"),
            };
            r.finish(cond)
        }
        ConditionType::CrowdDensity => {
            let cond = Condition::CrowdDensity {
                area: r.text("area"),
                max_count: r.count("max_count"),
            };
            r.finish(cond)
        }
        ConditionType::PpeDetection => {
            let cond = Condition::PpeDetection {
                ppe_type: r.text("ppe_type"),
                area: r.text("area"),
            };
            r.finish(cond)
        }
    }
}

/// Validate a whole rule draft: name, description, severity and condition
/// together.
///
/// The manual API path and the AI translation path both go through here,
/// so no rule reaches the store without passing the same checks.
pub fn validate_rule(
    name: &str,
    description: &str,
    severity: Option<&str>,
    condition: &RawCondition,
) -> Result<(Severity, Condition), ValidationError> {
    let mut errors = Vec::new();

    if name.trim().is_empty() {
        errors.push(FieldError::new("name", "is required"));
    }
    if description.trim().is_empty() {
        errors.push(FieldError::new("description", "is required"));
    }

    let severity = match severity {
        Some(s) => match s.parse::<Severity>() {
            Ok(sev) => Some(sev),
            Err(_) => {
                errors.push(FieldError::new(
                    "severity",
                    "must be one of LOW, MEDIUM, HIGH, CRITICAL",
                ));
                None
            }
        },
        None => {
            errors.push(FieldError::new("severity", "is required"));
            None
        }
    };

    let condition = match validate_condition(condition) {
        Ok(c) => Some(c),
        Err(mut field_errors) => {
            for e in &mut field_errors {
                e.field = format!("condition.{}", e.field);
            }
            errors.extend(field_errors);
            None
        }
    };

    match (severity, condition) {
        (Some(sev), Some(cond)) if errors.is_empty() => Ok((sev, cond)),
        _ => Err(ValidationError { errors }),
    }
}
