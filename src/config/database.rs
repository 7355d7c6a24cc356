//! Database configuration module.
//!
//! Handles `SQLite` database connection and table creation using `SeaORM`.
//! Table creation uses `Schema::create_table_from_entity` to generate SQL
//! from the entity definitions, so the database schema always matches the
//! Rust struct definitions without manual SQL.

use crate::entities::{Account, AccountEntry, AccountRule, Deal, FriendLink};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};

/// Gets the database URL from the environment or returns the default
/// `SQLite` path.
///
/// A `.env` file is honored when present; `DATABASE_URL` set externally
/// always wins.
pub fn get_database_url() -> String {
    dotenvy::dotenv().ok();
    std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://data/dealbook.sqlite".to_string())
}

/// Establishes a connection to the database named by [`get_database_url`].
pub async fn create_connection() -> Result<DatabaseConnection> {
    Database::connect(get_database_url())
        .await
        .map_err(Into::into)
}

/// Creates all necessary database tables from the entity definitions.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let account_table = schema.create_table_from_entity(Account);
    let account_rule_table = schema.create_table_from_entity(AccountRule);
    let friend_link_table = schema.create_table_from_entity(FriendLink);
    let deal_table = schema.create_table_from_entity(Deal);
    let account_entry_table = schema.create_table_from_entity(AccountEntry);

    // referenced tables first: account_entries carries foreign keys to all of them
    db.execute(builder.build(&account_table)).await?;
    db.execute(builder.build(&account_rule_table)).await?;
    db.execute(builder.build(&friend_link_table)).await?;
    db.execute(builder.build(&deal_table)).await?;
    db.execute(builder.build(&account_entry_table)).await?;

    Ok(())
}
