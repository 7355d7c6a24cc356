//! Deal entity - One economic event in the ledger.
//!
//! A deal owns exactly two account entries whose amounts sum to zero. Deals
//! generated by a settlement rule ("subordinate deals") carry a non-null
//! `parent_deal_id` pointing at the deal whose posting triggered them; the
//! desired (minus, plus, amount) intent is never stored on the row, it is
//! derived from the entries on demand.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Deal database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "deals")]
pub struct Model {
    /// Unique identifier for the deal
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owner of this ledger
    pub user_id: i64,
    /// Posting date of the deal
    pub date: Date,
    /// Free-text summary shown in listings and searched by prefix
    pub summary: String,
    /// Whether the user has confirmed this deal (rule-generated deals start unconfirmed)
    pub confirmed: bool,
    /// Parent deal when this row was generated by a settlement rule, None for top-level deals
    pub parent_deal_id: Option<i64>,
}

/// Defines relationships between Deal and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each deal owns its two ledger entries
    #[sea_orm(has_many = "super::account_entry::Entity")]
    Entries,
    /// A subordinate deal belongs to the deal that triggered it
    #[sea_orm(belongs_to = "Entity", from = "Column::ParentDealId", to = "Column::Id")]
    Parent,
}

impl Related<super::account_entry::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Entries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
