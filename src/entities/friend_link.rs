//! FriendLink entity - The join key for the two sides of a transfer.
//!
//! A friend link is nothing but an identity row: the entry pairs of the two
//! deals recording one inter-ledger transfer share its id. Severing a link
//! nulls the key out of every surviving entry before the row is deleted.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// FriendLink database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "friend_links")]
pub struct Model {
    /// Unique identifier shared by the linked entries
    #[sea_orm(primary_key)]
    pub id: i64,
}

/// Defines relationships between FriendLink and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// The entries sharing this link id
    #[sea_orm(has_many = "super::account_entry::Entity")]
    Entries,
}

impl Related<super::account_entry::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Entries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
