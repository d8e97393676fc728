use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, Order, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use sitewatch_common::id::next_id;
use sitewatch_common::types::{AlertStatus, Location, Severity};
use sitewatch_rules::check_transition;

use crate::entities::alert::{self, Column, Entity};
use crate::entities::alert_response;
use crate::error::{Result, StorageError};
use crate::store::SafetyStore;

/// Alert data row (alerts table).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRow {
    pub id: String,
    pub title: String,
    pub description: String,
    pub severity: Severity,
    pub status: AlertStatus,
    pub source: String,
    pub location: Option<Location>,
    pub site_id: Option<String>,
    pub rule_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

/// One status-transition audit record (alert_responses table).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseRow {
    pub id: String,
    pub alert_id: String,
    pub action: AlertStatus,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

/// Alert list filter; set fields compose with AND.
#[derive(Debug, Clone, Default)]
pub struct AlertFilter {
    pub search: Option<String>,
    pub severity_eq: Option<Severity>,
    pub status_eq: Option<AlertStatus>,
    pub site_id_eq: Option<String>,
    pub rule_id_eq: Option<String>,
}

fn to_row(m: alert::Model) -> Result<AlertRow> {
    let severity = m
        .severity
        .parse::<Severity>()
        .map_err(|_| StorageError::InvalidEnum {
            column: "severity",
            value: m.severity.clone(),
        })?;
    let status = m
        .status
        .parse::<AlertStatus>()
        .map_err(|_| StorageError::InvalidEnum {
            column: "status",
            value: m.status.clone(),
        })?;
    let location = m
        .location_json
        .as_deref()
        .map(serde_json::from_str::<Location>)
        .transpose()?;
    Ok(AlertRow {
        id: m.id,
        title: m.title,
        description: m.description,
        severity,
        status,
        source: m.source,
        location,
        site_id: m.site_id,
        rule_id: m.rule_id,
        created_at: m.created_at.with_timezone(&Utc),
        updated_at: m.updated_at.with_timezone(&Utc),
        resolved_at: m.resolved_at.map(|t| t.with_timezone(&Utc)),
    })
}

fn response_to_row(m: alert_response::Model) -> Result<ResponseRow> {
    let action = m
        .action
        .parse::<AlertStatus>()
        .map_err(|_| StorageError::InvalidEnum {
            column: "action",
            value: m.action.clone(),
        })?;
    Ok(ResponseRow {
        id: m.id,
        alert_id: m.alert_id,
        action,
        user_id: m.user_id,
        created_at: m.created_at.with_timezone(&Utc),
    })
}

fn apply_filter(mut q: sea_orm::Select<Entity>, filter: &AlertFilter) -> sea_orm::Select<Entity> {
    if let Some(search) = &filter.search {
        // SQLite LIKE is case-insensitive for ASCII
        q = q.filter(
            sea_orm::Condition::any()
                .add(Column::Title.contains(search))
                .add(Column::Description.contains(search)),
        );
    }
    if let Some(sev) = filter.severity_eq {
        q = q.filter(Column::Severity.eq(sev.to_string()));
    }
    if let Some(status) = filter.status_eq {
        q = q.filter(Column::Status.eq(status.to_string()));
    }
    if let Some(site) = &filter.site_id_eq {
        q = q.filter(Column::SiteId.eq(site.clone()));
    }
    if let Some(rule) = &filter.rule_id_eq {
        q = q.filter(Column::RuleId.eq(rule.clone()));
    }
    q
}

impl SafetyStore {
    pub async fn insert_alert(&self, row: &AlertRow) -> Result<AlertRow> {
        let now = Utc::now().fixed_offset();
        let location_json = row
            .location
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let am = alert::ActiveModel {
            id: Set(row.id.clone()),
            title: Set(row.title.clone()),
            description: Set(row.description.clone()),
            severity: Set(row.severity.to_string()),
            status: Set(row.status.to_string()),
            source: Set(row.source.clone()),
            location_json: Set(location_json),
            site_id: Set(row.site_id.clone()),
            rule_id: Set(row.rule_id.clone()),
            created_at: Set(now),
            updated_at: Set(now),
            resolved_at: Set(None),
        };
        let model = am.insert(self.db()).await?;
        to_row(model)
    }

    pub async fn get_alert_by_id(&self, id: &str) -> Result<Option<AlertRow>> {
        let model = Entity::find_by_id(id).one(self.db()).await?;
        model.map(to_row).transpose()
    }

    pub async fn list_alerts(
        &self,
        filter: &AlertFilter,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<AlertRow>> {
        let rows = apply_filter(Entity::find(), filter)
            .order_by(Column::CreatedAt, Order::Desc)
            .limit(limit as u64)
            .offset(offset as u64)
            .all(self.db())
            .await?;
        rows.into_iter().map(to_row).collect()
    }

    pub async fn count_alerts(&self, filter: &AlertFilter) -> Result<u64> {
        Ok(apply_filter(Entity::find(), filter).count(self.db()).await?)
    }

    /// Response history for one alert, oldest first.
    pub async fn list_alert_responses(&self, alert_id: &str) -> Result<Vec<ResponseRow>> {
        let rows = alert_response::Entity::find()
            .filter(alert_response::Column::AlertId.eq(alert_id))
            .order_by(alert_response::Column::CreatedAt, Order::Asc)
            .all(self.db())
            .await?;
        rows.into_iter().map(response_to_row).collect()
    }

    /// Move an alert along the status state machine.
    ///
    /// The status update and the appended response record commit in one
    /// transaction, so an illegal edge can never leave a partial write.
    /// RESOLVED stamps `resolved_at`.
    pub async fn transition_alert(
        &self,
        id: &str,
        to: AlertStatus,
        user_id: &str,
    ) -> Result<(AlertRow, ResponseRow)> {
        let txn = self.db().begin().await?;

        let model = Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| StorageError::NotFound {
                entity: "alert",
                id: id.to_string(),
            })?;
        let current = model
            .status
            .parse::<AlertStatus>()
            .map_err(|_| StorageError::InvalidEnum {
                column: "status",
                value: model.status.clone(),
            })?;
        check_transition(current, to)?;

        let now = Utc::now().fixed_offset();
        let mut am: alert::ActiveModel = model.into();
        am.status = Set(to.to_string());
        am.updated_at = Set(now);
        if to == AlertStatus::Resolved {
            am.resolved_at = Set(Some(now));
        }
        let updated = am.update(&txn).await?;

        let response = alert_response::ActiveModel {
            id: Set(next_id()),
            alert_id: Set(id.to_string()),
            action: Set(to.to_string()),
            user_id: Set(user_id.to_string()),
            created_at: Set(now),
        };
        let response = response.insert(&txn).await?;

        txn.commit().await?;
        Ok((to_row(updated)?, response_to_row(response)?))
    }
}
