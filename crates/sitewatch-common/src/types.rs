use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Rule and alert severity, ordered from lowest to highest.
///
/// # Examples
///
/// ```
/// use sitewatch_common::types::Severity;
///
/// let sev: Severity = "HIGH".parse().unwrap();
/// assert_eq!(sev, Severity::High);
/// assert_eq!(sev.to_string(), "HIGH");
/// assert!(Severity::Critical > Severity::Low);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "LOW"),
            Severity::Medium => write!(f, "MEDIUM"),
            Severity::High => write!(f, "HIGH"),
            Severity::Critical => write!(f, "CRITICAL"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "LOW" => Ok(Severity::Low),
            "MEDIUM" => Ok(Severity::Medium),
            "HIGH" => Ok(Severity::High),
            "CRITICAL" => Ok(Severity::Critical),
            _ => Err(format!("unknown severity: {s}")),
        }
    }
}

/// Alert lifecycle status.
///
/// `Resolved` is terminal; the legal edges are enforced by
/// `sitewatch_rules::lifecycle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlertStatus {
    Active,
    Acknowledged,
    Escalated,
    Resolved,
}

impl std::fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertStatus::Active => write!(f, "ACTIVE"),
            AlertStatus::Acknowledged => write!(f, "ACKNOWLEDGED"),
            AlertStatus::Escalated => write!(f, "ESCALATED"),
            AlertStatus::Resolved => write!(f, "RESOLVED"),
        }
    }
}

impl std::str::FromStr for AlertStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ACTIVE" => Ok(AlertStatus::Active),
            "ACKNOWLEDGED" => Ok(AlertStatus::Acknowledged),
            "ESCALATED" => Ok(AlertStatus::Escalated),
            "RESOLVED" => Ok(AlertStatus::Resolved),
            _ => Err(format!("unknown alert status: {s}")),
        }
    }
}

/// The closed set of condition types a safety rule can express.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ConditionType {
    Proximity,
    Speed,
    AreaEntry,
    AreaExit,
    IdleTime,
    UnauthorizedAccess,
    EquipmentUsage,
    SafetyZone,
    CrowdDensity,
    PpeDetection,
}

impl ConditionType {
    /// All condition types, in schema-table order.
    pub const ALL: [ConditionType; 10] = [
        ConditionType::Proximity,
        ConditionType::Speed,
        ConditionType::AreaEntry,
        ConditionType::AreaExit,
        ConditionType::IdleTime,
        ConditionType::UnauthorizedAccess,
        ConditionType::EquipmentUsage,
        ConditionType::SafetyZone,
        ConditionType::CrowdDensity,
        ConditionType::PpeDetection,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionType::Proximity => "proximity",
            ConditionType::Speed => "speed",
            ConditionType::AreaEntry => "area_entry",
            ConditionType::AreaExit => "area_exit",
            ConditionType::IdleTime => "idle_time",
            ConditionType::UnauthorizedAccess => "unauthorized_access",
            ConditionType::EquipmentUsage => "equipment_usage",
            ConditionType::SafetyZone => "safety_zone",
            ConditionType::CrowdDensity => "crowd_density",
            ConditionType::PpeDetection => "ppe_detection",
        }
    }
}

impl std::fmt::Display for ConditionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ConditionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "proximity" => Ok(ConditionType::Proximity),
            "speed" => Ok(ConditionType::Speed),
            "area_entry" => Ok(ConditionType::AreaEntry),
            "area_exit" => Ok(ConditionType::AreaExit),
            "idle_time" => Ok(ConditionType::IdleTime),
            "unauthorized_access" => Ok(ConditionType::UnauthorizedAccess),
            "equipment_usage" => Ok(ConditionType::EquipmentUsage),
            "safety_zone" => Ok(ConditionType::SafetyZone),
            "crowd_density" => Ok(ConditionType::CrowdDensity),
            "ppe_detection" => Ok(ConditionType::PpeDetection),
            _ => Err(format!("unknown condition type: {s}")),
        }
    }
}

/// Comparison operator used by proximity and speed conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = "=")]
    Equal,
}

impl std::fmt::Display for CompareOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompareOp::GreaterThan => write!(f, ">"),
            CompareOp::LessThan => write!(f, "<"),
            CompareOp::Equal => write!(f, "="),
        }
    }
}

impl std::str::FromStr for CompareOp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            ">" => Ok(CompareOp::GreaterThan),
            "<" => Ok(CompareOp::LessThan),
            "=" => Ok(CompareOp::Equal),
            _ => Err(format!("unknown compare operator: {s}")),
        }
    }
}

/// A fully-validated rule condition.
///
/// Each variant carries exactly the parameters its type requires, so an
/// invalid type/parameter combination cannot be constructed. The serialized
/// form is `{"type": "...", "parameters": {...}}`, matching what the store
/// persists in `condition_json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "parameters", rename_all = "snake_case")]
pub enum Condition {
    Proximity {
        object1: String,
        object2: String,
        operator: CompareOp,
        threshold: f64,
        unit: String,
    },
    Speed {
        object1: String,
        operator: CompareOp,
        threshold: f64,
        unit: String,
    },
    AreaEntry {
        object1: String,
        area: String,
    },
    AreaExit {
        object1: String,
        area: String,
    },
    IdleTime {
        equipment: String,
        duration: f64,
        unit: String,
    },
    UnauthorizedAccess {
        area: String,
    },
    EquipmentUsage {
        equipment: String,
        operator: String,
    },
    SafetyZone {
        object1: String,
        area: String,
    },
    CrowdDensity {
        area: String,
        max_count: u32,
    },
    PpeDetection {
        ppe_type: String,
        area: String,
    },
}

impl Condition {
    pub fn condition_type(&self) -> ConditionType {
        match self {
            Condition::Proximity { .. } => ConditionType::Proximity,
            Condition::Speed { .. } => ConditionType::Speed,
            Condition::AreaEntry { .. } => ConditionType::AreaEntry,
            Condition::AreaExit { .. } => ConditionType::AreaExit,
            Condition::IdleTime { .. } => ConditionType::IdleTime,
            Condition::UnauthorizedAccess { .. } => ConditionType::UnauthorizedAccess,
            Condition::EquipmentUsage { .. } => ConditionType::EquipmentUsage,
            Condition::SafetyZone { .. } => ConditionType::SafetyZone,
            Condition::CrowdDensity { .. } => ConditionType::CrowdDensity,
            Condition::PpeDetection { .. } => ConditionType::PpeDetection,
        }
    }
}

/// An unvalidated condition as submitted by a client or produced by the
/// AI translator: a type tag plus a free-form parameter map.
///
/// `sitewatch_rules::schema::validate_condition` turns a draft into a
/// typed [`Condition`] or a full list of field errors.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct RawCondition {
    #[serde(rename = "type")]
    pub condition_type: String,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub parameters: serde_json::Map<String, serde_json::Value>,
}

/// Coordinates of the camera detection that produced an alert, when known.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Location {
    pub x: f64,
    pub y: f64,
}

/// A stored safety rule: named condition plus severity and active flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRule {
    pub id: String,
    pub name: String,
    pub description: String,
    pub condition: Condition,
    pub severity: Severity,
    pub is_active: bool,
    pub site_id: Option<String>,
    /// Where the rule came from: `api` (manual) or `ai` (translated).
    pub source: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A concrete alert occurrence, optionally linked to the rule that fired.
///
/// Alerts are never deleted; the only mutation path is a status transition,
/// each of which appends one [`AlertResponse`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub title: String,
    pub description: String,
    pub severity: Severity,
    pub status: AlertStatus,
    pub source: String,
    pub location: Option<Location>,
    pub site_id: Option<String>,
    /// May reference a deleted rule; the stale id is kept on purpose.
    pub rule_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

/// One immutable audit record of a status transition on an alert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertResponse {
    pub id: String,
    pub alert_id: String,
    pub action: AlertStatus,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_ordering() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
        assert!(Severity::High < Severity::Critical);
    }

    #[test]
    fn condition_json_shape() {
        let cond = Condition::Proximity {
            object1: "forklift".into(),
            object2: "person".into(),
            operator: CompareOp::GreaterThan,
            threshold: 10.0,
            unit: "ft".into(),
        };
        let json = serde_json::to_value(&cond).unwrap();
        assert_eq!(json["type"], "proximity");
        assert_eq!(json["parameters"]["object1"], "forklift");
        assert_eq!(json["parameters"]["operator"], ">");
        assert_eq!(json["parameters"]["threshold"], 10.0);

        let back: Condition = serde_json::from_value(json).unwrap();
        assert_eq!(back, cond);
    }

    #[test]
    fn condition_type_round_trip() {
        for t in ConditionType::ALL {
            let parsed: ConditionType = t.as_str().parse().unwrap();
            assert_eq!(parsed, t);
        }
        assert!("drone_swarm".parse::<ConditionType>().is_err());
    }
}
