//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod account;
pub mod account_entry;
pub mod account_rule;
pub mod deal;
pub mod friend_link;

// Re-export specific types to avoid conflicts
pub use account::{AssetType, Column as AccountColumn, Entity as Account, Model as AccountModel};
pub use account_entry::{
    Column as AccountEntryColumn, Entity as AccountEntry, Model as AccountEntryModel,
};
pub use account_rule::{
    Column as AccountRuleColumn, Entity as AccountRule, Model as AccountRuleModel,
};
pub use deal::{Column as DealColumn, Entity as Deal, Model as DealModel};
pub use friend_link::{Column as FriendLinkColumn, Entity as FriendLink, Model as FriendLinkModel};
