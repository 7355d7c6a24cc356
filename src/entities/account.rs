//! Account entity - A node in the chart of accounts.
//!
//! Each account carries an asset-type classification that drives settlement
//! behavior, and may own at most one [`super::account_rule`] describing how
//! postings against it settle.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Asset-type classification of an account.
///
/// The classification decides whether an attached settlement rule fires for
/// outgoing postings (`CreditCard`), incoming postings (`CreditReceivable`),
/// or never (`Ordinary`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum AssetType {
    /// Cash, bank deposits, and anything else without settlement behavior
    #[sea_orm(string_value = "ordinary")]
    Ordinary,
    /// Credit card - settles charges (negative postings) later
    #[sea_orm(string_value = "credit_card")]
    CreditCard,
    /// Receivable - settles collections (positive postings) later
    #[sea_orm(string_value = "credit_receivable")]
    CreditReceivable,
}

/// Account database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    /// Unique identifier for the account
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owner of this ledger
    pub user_id: i64,
    /// Human-readable name of the account (e.g., "Wallet", "Visa")
    pub name: String,
    /// Asset-type classification driving settlement-rule direction
    pub asset_type: AssetType,
}

/// Defines relationships between Account and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One account appears in many ledger entries
    #[sea_orm(has_many = "super::account_entry::Entity")]
    Entries,
    /// An account owns at most one settlement rule
    #[sea_orm(has_one = "super::account_rule::Entity")]
    Rule,
}

impl Related<super::account_entry::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Entries.def()
    }
}

impl Related<super::account_rule::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Rule.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
