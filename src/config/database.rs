//! Database configuration module.
//!
//! This module handles the `SQLite` connection standing in for the document store and
//! creates the tables from the entity definitions with `SeaORM`'s
//! `Schema::create_table_from_entity`, so the schema always matches the Rust structs.

use crate::entities::{Consultant, Consultation, User};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};
use tracing::{debug, info, instrument};

const DEFAULT_DATABASE_URL: &str = "sqlite://data/campus_desk.sqlite?mode=rwc";

/// Gets the database URL from the `DATABASE_URL` environment variable or returns the
/// default local `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database named by [`get_database_url`].
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    debug!("Connecting to database at {}", database_url);
    Database::connect(&database_url).await.map_err(Into::into)
}

/// Creates the consultation, consultant and user tables if they do not exist yet.
#[instrument(skip(db))]
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut consultation_table = schema.create_table_from_entity(Consultation);
    let mut consultant_table = schema.create_table_from_entity(Consultant);
    let mut user_table = schema.create_table_from_entity(User);
    consultation_table.if_not_exists();
    consultant_table.if_not_exists();
    user_table.if_not_exists();

    db.execute(builder.build(&consultation_table)).await?;
    db.execute(builder.build(&consultant_table)).await?;
    db.execute(builder.build(&user_table)).await?;

    info!("Database tables ensured");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{ConsultantModel, ConsultationModel, UserModel};
    use sea_orm::{EntityTrait, QuerySelect};

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        let _: Vec<ConsultationModel> = Consultation::find().limit(1).all(&db).await?;
        let _: Vec<ConsultantModel> = Consultant::find().limit(1).all(&db).await?;
        let _: Vec<UserModel> = User::find().limit(1).all(&db).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_create_tables_is_idempotent() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;
        create_tables(&db).await?;
        Ok(())
    }
}
