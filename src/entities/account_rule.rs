//! AccountRule entity - A declarative settlement trigger.
//!
//! A rule declares that postings to its owning account automatically generate
//! a payment deal against an associated account, dated by a month-shift plus
//! day-of-month function.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// AccountRule database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "account_rules")]
pub struct Model {
    /// Unique identifier for the rule
    #[sea_orm(primary_key)]
    pub id: i64,
    /// The account this rule belongs to (one rule per account)
    #[sea_orm(unique)]
    pub account_id: i64,
    /// The account the generated settlement deal posts against
    pub associated_account_id: i64,
    /// Calendar months between the triggering deal and its settlement
    pub month_shift: i32,
    /// Day of month the settlement falls on, clamped to the month's length
    pub payment_day: u32,
}

/// Defines relationships between AccountRule and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each rule belongs to exactly one account
    #[sea_orm(
        belongs_to = "super::account::Entity",
        from = "Column::AccountId",
        to = "super::account::Column::Id"
    )]
    Account,
}

impl Related<super::account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
