//! Database connection and migrations for the service crates.
//!
//! Each service binds `Database` to its own migrator, so the pool, the
//! migration commands and the health check are written once.

use std::collections::HashSet;
use std::marker::PhantomData;
use std::time::Duration;

use async_trait::async_trait;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database as SeaDatabase, DatabaseConnection, DbErr,
    EntityTrait, QueryOrder, Statement,
};
use sea_orm_migration::{seaql_migrations, MigratorTrait};
use tracing::info;

use crate::health::HealthCheck;

/// Migration action type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrateAction {
    Up,
    Down,
    Status,
    Fresh,
}

/// Database wrapper for connection management
pub struct Database<M> {
    connection: DatabaseConnection,
    migrator: PhantomData<fn() -> M>,
}

impl<M> Clone for Database<M> {
    fn clone(&self) -> Self {
        Self {
            connection: self.connection.clone(),
            migrator: PhantomData,
        }
    }
}

impl<M: MigratorTrait> Database<M> {
    /// Open a pool of at most `max_connections` and run pending migrations.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, DbErr> {
        let db = Self::connect_without_migrations(database_url, max_connections).await?;

        M::up(&db.connection, None).await?;
        info!("Database connected and migrations applied");

        Ok(db)
    }

    /// Connect without running migrations (for CLI commands).
    pub async fn connect_without_migrations(
        database_url: &str,
        max_connections: u32,
    ) -> Result<Self, DbErr> {
        let mut options = ConnectOptions::new(database_url.to_owned());
        options
            .max_connections(max_connections)
            .connect_timeout(Duration::from_secs(5))
            .sqlx_logging(false);

        Ok(Self {
            connection: SeaDatabase::connect(options).await?,
            migrator: PhantomData,
        })
    }

    /// Get a clone of the database connection.
    pub fn get_connection(&self) -> DatabaseConnection {
        self.connection.clone()
    }

    /// Apply a migration command.
    pub async fn migrate(&self, action: MigrateAction) -> Result<(), DbErr> {
        match action {
            MigrateAction::Up => {
                M::up(&self.connection, None).await?;
                info!("Migrations applied successfully");
            }
            MigrateAction::Down => {
                M::down(&self.connection, Some(1)).await?;
                info!("Rolled back last migration");
            }
            MigrateAction::Status => {
                for (name, applied) in self.migration_status().await? {
                    let marker = if applied { "[x]" } else { "[ ]" };
                    println!("{} {}", marker, name);
                }
            }
            MigrateAction::Fresh => {
                M::fresh(&self.connection).await?;
                info!("Database reset and migrations applied");
            }
        }
        Ok(())
    }

    /// Every defined migration with its applied flag.
    pub async fn migration_status(&self) -> Result<Vec<(String, bool)>, DbErr> {
        let applied: HashSet<String> = seaql_migrations::Entity::find()
            .order_by_asc(seaql_migrations::Column::Version)
            .all(&self.connection)
            .await?
            .into_iter()
            .map(|m| m.version)
            .collect();

        Ok(M::migrations()
            .iter()
            .map(|m| {
                let name = m.name().to_string();
                let is_applied = applied.contains(&name);
                (name, is_applied)
            })
            .collect())
    }
}

impl<M> Database<M> {
    /// Check database connectivity by executing a simple query.
    pub async fn ping(&self) -> Result<(), DbErr> {
        self.connection
            .execute(Statement::from_string(
                self.connection.get_database_backend(),
                "SELECT 1".to_string(),
            ))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl<M: 'static> HealthCheck for Database<M> {
    fn name(&self) -> &'static str {
        "database"
    }

    async fn check(&self) -> Result<(), String> {
        self.ping().await.map_err(|e| e.to_string())
    }
}
