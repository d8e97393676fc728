use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};

use crate::error::Result;

pub mod alert;
pub mod rule;

pub use alert::{AlertFilter, AlertRow, ResponseRow};
pub use rule::{RuleFilter, RuleRow, RuleUpdate};

/// Unified access layer over the safety database.
///
/// All methods are `async fn` backed by SeaORM + SQLite.
pub struct SafetyStore {
    pub(crate) db: DatabaseConnection,
}

impl SafetyStore {
    /// Connect and initialize the database.
    ///
    /// `db_url` is a full connection URL provided by server config,
    /// e.g. `sqlite:///data/sitewatch.db?mode=rwc` or `sqlite::memory:`.
    /// Pending `sea-orm-migration` migrations run on every start.
    pub async fn new(db_url: &str) -> Result<Self> {
        let mut opts = ConnectOptions::new(db_url);
        if db_url.contains(":memory:") {
            // every pooled connection would otherwise get its own empty db
            opts.max_connections(1);
        }
        let db = Database::connect(opts).await?;

        // WAL only applies to file-backed SQLite
        if db_url.starts_with("sqlite://") {
            db.execute_unprepared("PRAGMA journal_mode=WAL;").await?;
        }

        Migrator::up(&db, None).await?;

        tracing::info!(db_url = %db_url, "Initialized safety store (SeaORM)");
        Ok(Self { db })
    }

    pub(crate) fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}
