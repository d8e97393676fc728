use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, Order, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sitewatch_common::types::Severity;

use crate::entities::alert_rule::{self, Column, Entity};
use crate::error::{Result, StorageError};
use crate::store::SafetyStore;

/// Alert rule data row (alert_rules table).
///
/// `condition` is kept as JSON rather than the typed enum so rows written
/// under a retired condition type still load and list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleRow {
    pub id: String,
    pub name: String,
    pub description: String,
    pub condition: Value,
    pub severity: Severity,
    pub is_active: bool,
    pub site_id: Option<String>,
    pub source: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial rule update; `None` fields keep their stored value.
#[derive(Debug, Clone, Default)]
pub struct RuleUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub condition: Option<Value>,
    pub severity: Option<Severity>,
    pub is_active: Option<bool>,
    pub site_id: Option<Option<String>>,
}

/// Rule list filter; set fields compose with AND.
#[derive(Debug, Clone, Default)]
pub struct RuleFilter {
    pub search: Option<String>,
    pub severity_eq: Option<Severity>,
    pub is_active_eq: Option<bool>,
    pub site_id_eq: Option<String>,
}

fn to_row(m: alert_rule::Model) -> Result<RuleRow> {
    let severity = m
        .severity
        .parse::<Severity>()
        .map_err(|_| StorageError::InvalidEnum {
            column: "severity",
            value: m.severity.clone(),
        })?;
    Ok(RuleRow {
        id: m.id,
        name: m.name,
        description: m.description,
        condition: serde_json::from_str(&m.condition_json)?,
        severity,
        is_active: m.is_active,
        site_id: m.site_id,
        source: m.source,
        created_at: m.created_at.with_timezone(&Utc),
        updated_at: m.updated_at.with_timezone(&Utc),
    })
}

fn apply_filter(
    mut q: sea_orm::Select<Entity>,
    filter: &RuleFilter,
) -> sea_orm::Select<Entity> {
    if let Some(search) = &filter.search {
        q = q.filter(
            sea_orm::Condition::any()
                .add(Column::Name.contains(search))
                .add(Column::Description.contains(search)),
        );
    }
    if let Some(sev) = filter.severity_eq {
        q = q.filter(Column::Severity.eq(sev.to_string()));
    }
    if let Some(active) = filter.is_active_eq {
        q = q.filter(Column::IsActive.eq(active));
    }
    if let Some(site) = &filter.site_id_eq {
        q = q.filter(Column::SiteId.eq(site.clone()));
    }
    q
}

impl SafetyStore {
    pub async fn insert_rule(&self, row: &RuleRow) -> Result<RuleRow> {
        let now = Utc::now().fixed_offset();
        let am = alert_rule::ActiveModel {
            id: Set(row.id.clone()),
            name: Set(row.name.clone()),
            description: Set(row.description.clone()),
            condition_json: Set(serde_json::to_string(&row.condition)?),
            severity: Set(row.severity.to_string()),
            is_active: Set(row.is_active),
            site_id: Set(row.site_id.clone()),
            source: Set(row.source.clone()),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let model = am
            .insert(self.db())
            .await
            .map_err(|e| StorageError::from_write(e, "alert_rule", "name"))?;
        to_row(model)
    }

    pub async fn get_rule_by_id(&self, id: &str) -> Result<Option<RuleRow>> {
        let model = Entity::find_by_id(id).one(self.db()).await?;
        model.map(to_row).transpose()
    }

    pub async fn list_rules(
        &self,
        filter: &RuleFilter,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<RuleRow>> {
        let rows = apply_filter(Entity::find(), filter)
            .order_by(Column::CreatedAt, Order::Desc)
            .limit(limit as u64)
            .offset(offset as u64)
            .all(self.db())
            .await?;
        rows.into_iter().map(to_row).collect()
    }

    pub async fn count_rules(&self, filter: &RuleFilter) -> Result<u64> {
        Ok(apply_filter(Entity::find(), filter).count(self.db()).await?)
    }

    pub async fn update_rule(&self, id: &str, update: &RuleUpdate) -> Result<RuleRow> {
        let model = Entity::find_by_id(id)
            .one(self.db())
            .await?
            .ok_or_else(|| StorageError::NotFound {
                entity: "alert_rule",
                id: id.to_string(),
            })?;

        let mut am: alert_rule::ActiveModel = model.into();
        if let Some(name) = &update.name {
            am.name = Set(name.clone());
        }
        if let Some(description) = &update.description {
            am.description = Set(description.clone());
        }
        if let Some(condition) = &update.condition {
            am.condition_json = Set(serde_json::to_string(condition)?);
        }
        if let Some(severity) = update.severity {
            am.severity = Set(severity.to_string());
        }
        if let Some(active) = update.is_active {
            am.is_active = Set(active);
        }
        if let Some(site_id) = &update.site_id {
            am.site_id = Set(site_id.clone());
        }
        am.updated_at = Set(Utc::now().fixed_offset());

        let model = am
            .update(self.db())
            .await
            .map_err(|e| StorageError::from_write(e, "alert_rule", "name"))?;
        to_row(model)
    }

    pub async fn set_rule_active(&self, id: &str, active: bool) -> Result<RuleRow> {
        self.update_rule(
            id,
            &RuleUpdate {
                is_active: Some(active),
                ..Default::default()
            },
        )
        .await
    }

    /// Hard delete. Alerts that referenced the rule keep their `rule_id`.
    pub async fn delete_rule(&self, id: &str) -> Result<()> {
        let res = Entity::delete_by_id(id).exec(self.db()).await?;
        if res.rows_affected == 0 {
            return Err(StorageError::NotFound {
                entity: "alert_rule",
                id: id.to_string(),
            });
        }
        Ok(())
    }
}
