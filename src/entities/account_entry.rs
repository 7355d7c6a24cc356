//! AccountEntry entity - One ledger leg of a deal.
//!
//! Amounts are signed integer minor currency units. An entry with
//! `amount >= 0` is the left (debit) leg, `amount < 0` the right (credit)
//! leg. `friend_link_id` is a non-owning join key shared with the matching
//! entry of the paired deal on the other side of a transfer.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// AccountEntry database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "account_entries")]
pub struct Model {
    /// Unique identifier for the entry
    #[sea_orm(primary_key)]
    pub id: i64,
    /// The deal this entry belongs to
    pub deal_id: i64,
    /// The account this entry posts against
    pub account_id: i64,
    /// Signed amount in minor currency units (>= 0 debit, < 0 credit)
    pub amount: i64,
    /// Join key to the paired entry in the counterpart deal, None when unlinked
    pub friend_link_id: Option<i64>,
}

/// Defines relationships between AccountEntry and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each entry belongs to exactly one deal
    #[sea_orm(
        belongs_to = "super::deal::Entity",
        from = "Column::DealId",
        to = "super::deal::Column::Id"
    )]
    Deal,
    /// Each entry posts against exactly one account
    #[sea_orm(
        belongs_to = "super::account::Entity",
        from = "Column::AccountId",
        to = "super::account::Column::Id"
    )]
    Account,
    /// Optional membership in a friend link
    #[sea_orm(
        belongs_to = "super::friend_link::Entity",
        from = "Column::FriendLinkId",
        to = "super::friend_link::Column::Id"
    )]
    FriendLink,
}

impl Related<super::deal::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Deal.def()
    }
}

impl Related<super::account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl Related<super::friend_link::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FriendLink.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
