//! Infrastructure layer - database and external services.

pub mod migrations;

pub use migrations::Migrator;

/// Connection pool bound to this service's migrations.
pub type Database = common::Database<Migrator>;
