//! Shared test utilities for `Dealbook`.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    core::{account, deal::AmountInput, deal::DealInput},
    entities::{AccountEntry, AssetType, FriendLink, account_entry, deal, friend_link},
    errors::Result,
};
use chrono::NaiveDate;
use sea_orm::{DatabaseConnection, Set, prelude::*};

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Initializes test tracing once; repeated calls are harmless.
pub fn init_test_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_test_writer()
        .try_init();
}

/// Creates a test account owned by user 1.
///
/// # Arguments
/// * `db` - Database connection
/// * `name` - Account name
/// * `asset_type` - Asset-type classification
pub async fn create_test_account(
    db: &DatabaseConnection,
    name: &str,
    asset_type: AssetType,
) -> Result<crate::entities::account::Model> {
    account::create_account(db, 1, name, asset_type).await
}

/// Sets up a complete test environment with two ordinary accounts.
/// Returns (db, wallet, bank) for common deal scenarios.
pub async fn setup_with_accounts() -> Result<(
    DatabaseConnection,
    crate::entities::account::Model,
    crate::entities::account::Model,
)> {
    let db = setup_test_db().await?;
    let wallet = create_test_account(&db, "Wallet", AssetType::Ordinary).await?;
    let bank = create_test_account(&db, "Bank", AssetType::Ordinary).await?;
    Ok((db, wallet, bank))
}

/// Builds a deal request with sensible defaults.
///
/// # Defaults
/// * `date`: 2024-04-01
/// * `summary`: `"Test deal"`
/// * `user_id`: 1
/// * `confirmed`: true
/// * friend links: none
pub fn deal_input(minus_account_id: i64, plus_account_id: i64, amount: i64) -> DealInput {
    DealInput {
        minus_account_id,
        plus_account_id,
        amount: AmountInput::Minor(amount),
        date: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap_or_default(),
        summary: "Test deal".to_string(),
        user_id: 1,
        confirmed: true,
        minus_link_id: None,
        plus_link_id: None,
    }
}

/// Inserts a deal row directly, bypassing the reconciliation pipeline.
/// Use this to stage malformed or partial states the pipeline would refuse.
pub async fn insert_bare_deal(
    db: &DatabaseConnection,
    user_id: i64,
    date: &str,
) -> Result<deal::Model> {
    let row = deal::ActiveModel {
        user_id: Set(user_id),
        date: Set(date.parse().unwrap_or_default()),
        summary: Set(String::new()),
        confirmed: Set(true),
        parent_deal_id: Set(None),
        ..Default::default()
    };
    row.insert(db).await.map_err(Into::into)
}

/// Inserts an entry row directly, bypassing the reconciliation pipeline.
pub async fn insert_bare_entry(
    db: &DatabaseConnection,
    deal_id: i64,
    account_id: i64,
    amount: i64,
    friend_link_id: Option<i64>,
) -> Result<account_entry::Model> {
    let row = account_entry::ActiveModel {
        deal_id: Set(deal_id),
        account_id: Set(account_id),
        amount: Set(amount),
        friend_link_id: Set(friend_link_id),
        ..Default::default()
    };
    row.insert(db).await.map_err(Into::into)
}

/// Inserts a friend link row and returns its id.
pub async fn insert_bare_link(db: &DatabaseConnection) -> Result<i64> {
    let inserted = FriendLink::insert(<friend_link::ActiveModel as sea_orm::ActiveModelTrait>::default())
        .exec(db)
        .await?;
    Ok(inserted.last_insert_id)
}

/// Points an entry at a friend link (or detaches it with None).
pub async fn relink_entry(
    db: &DatabaseConnection,
    entry_id: i64,
    friend_link_id: Option<i64>,
) -> Result<()> {
    let entry = AccountEntry::find_by_id(entry_id)
        .one(db)
        .await?
        .ok_or_else(|| crate::errors::Error::Config {
            message: format!("no entry {entry_id} to relink"),
        })?;
    let mut active: account_entry::ActiveModel = entry.into();
    active.friend_link_id = Set(friend_link_id);
    active.update(db).await?;
    Ok(())
}
