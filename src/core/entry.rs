//! Entry and friend-link management - The leg-level half of deal reconciliation.
//!
//! A deal posts as two legs. The leg whose final amount is non-negative is
//! written first and may mint a fresh friend link; the second leg adopts that
//! link when it is created new without an explicit override. Processing legs
//! in amount order makes the stored state independent of which way round the
//! caller phrased the deal: (minus, plus, amount) and (plus, minus, -amount)
//! reconcile to the same pair of rows.

use crate::{
    entities::{AccountEntry, FriendLink, account_entry, deal, friend_link},
    errors::{Error, Result},
};
use chrono::NaiveDate;
use sea_orm::{ConnectionTrait, QueryOrder, Set, prelude::*};
use tracing::{debug, error};

/// The desired posted state of one deal, already validated and normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostingPlan {
    /// Account money moves out of
    pub minus_account_id: i64,
    /// Account money moves into
    pub plus_account_id: i64,
    /// Signed amount in minor units; the plus side posts `amount`, the minus side `-amount`
    pub amount: i64,
    /// Caller-supplied friend link for the minus leg, when joining an existing transfer
    pub minus_link_id: Option<i64>,
    /// Caller-supplied friend link for the plus leg
    pub plus_link_id: Option<i64>,
}

/// One side of a deal as the reconciler processes it.
#[derive(Debug, Clone, Copy)]
struct Leg {
    account_id: i64,
    amount: i64,
    link_override: Option<i64>,
}

/// Fetches a deal's entries, ordered by account id ascending.
///
/// The ordering is nothing but a stable iteration order for rule evaluation;
/// it carries no sign guarantee.
pub async fn entries_of<C>(db: &C, deal_id: i64) -> Result<Vec<account_entry::Model>>
where
    C: ConnectionTrait,
{
    AccountEntry::find()
        .filter(account_entry::Column::DealId.eq(deal_id))
        .order_by_asc(account_entry::Column::AccountId)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds the entry paired with this one through its friend link.
///
/// The paired side lives in a different deal and posts the opposite amount.
pub async fn linked_entry<C>(
    db: &C,
    entry: &account_entry::Model,
) -> Result<Option<account_entry::Model>>
where
    C: ConnectionTrait,
{
    let Some(link_id) = entry.friend_link_id else {
        return Ok(None);
    };
    AccountEntry::find()
        .filter(account_entry::Column::FriendLinkId.eq(link_id))
        .filter(account_entry::Column::DealId.ne(entry.deal_id))
        .filter(account_entry::Column::Amount.eq(-entry.amount))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Destroys one entry, severing its friend link first so the paired side
/// never dangles.
pub(crate) async fn destroy_entry<C>(db: &C, entry: account_entry::Model) -> Result<()>
where
    C: ConnectionTrait,
{
    if let Some(link_id) = entry.friend_link_id {
        sever_link(db, link_id).await?;
    }
    AccountEntry::delete_by_id(entry.id).exec(db).await?;
    Ok(())
}

/// Nulls the link id out of every member entry, then drops the link row.
///
/// Every member, the caller's own entry included: the link row cannot go
/// while an entry still references it.
async fn sever_link<C>(db: &C, link_id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    use sea_orm::sea_query::Expr;

    AccountEntry::update_many()
        .col_expr(
            account_entry::Column::FriendLinkId,
            Expr::value(sea_orm::Value::BigInt(None)),
        )
        .filter(account_entry::Column::FriendLinkId.eq(link_id))
        .exec(db)
        .await?;

    FriendLink::delete_by_id(link_id).exec(db).await?;
    debug!(link_id, "severed friend link");
    Ok(())
}

/// Inserts a fresh friend link row and returns its id.
async fn mint_link<C>(db: &C) -> Result<i64>
where
    C: ConnectionTrait,
{
    let inserted = FriendLink::insert(<friend_link::ActiveModel as sea_orm::ActiveModelTrait>::default())
        .exec(db)
        .await?;
    Ok(inserted.last_insert_id)
}

/// Reconciles a deal's persisted entries against a posting plan.
///
/// Creates missing legs, rewrites amount-or-date-changed ones, destroys legs
/// whose account is no longer part of the deal, and keeps friend links sane
/// throughout. `prev_date` is the deal date as of the previous save (None on
/// first save); a leg whose amount and date are both unchanged is left
/// untouched. Returns the re-read entries, ascending by account id.
pub(crate) async fn reconcile<C>(
    db: &C,
    deal: &deal::Model,
    prev_date: Option<NaiveDate>,
    plan: &PostingPlan,
) -> Result<Vec<account_entry::Model>>
where
    C: ConnectionTrait,
{
    // retire legs pointing at accounts no longer on the deal
    for stale in entries_of(db, deal.id).await? {
        if stale.account_id != plan.minus_account_id && stale.account_id != plan.plus_account_id {
            debug!(
                deal_id = deal.id,
                entry_id = stale.id,
                account_id = stale.account_id,
                "destroying entry for account no longer on deal"
            );
            destroy_entry(db, stale).await?;
        }
    }

    let minus_leg = Leg {
        account_id: plan.minus_account_id,
        amount: -plan.amount,
        link_override: plan.minus_link_id,
    };
    let plus_leg = Leg {
        account_id: plan.plus_account_id,
        amount: plan.amount,
        link_override: plan.plus_link_id,
    };

    // non-negative leg first; its minted link feeds the second leg
    let (first, second) = if plan.amount >= 0 {
        (plus_leg, minus_leg)
    } else {
        (minus_leg, plus_leg)
    };

    let minted = save_leg(db, deal, prev_date, first, true, None).await?;
    save_leg(db, deal, prev_date, second, false, minted).await?;

    let entries = entries_of(db, deal.id).await?;
    if entries.len() != 2 {
        error!(
            deal_id = deal.id,
            count = entries.len(),
            "deal reconciled to an entry count other than two"
        );
        return Err(Error::EntryCountViolation {
            deal_id: deal.id,
            count: entries.len(),
        });
    }
    Ok(entries)
}

/// Writes one leg, returning the id of a friend link minted along the way.
async fn save_leg<C>(
    db: &C,
    deal: &deal::Model,
    prev_date: Option<NaiveDate>,
    leg: Leg,
    is_first: bool,
    inherited_link: Option<i64>,
) -> Result<Option<i64>>
where
    C: ConnectionTrait,
{
    let existing = AccountEntry::find()
        .filter(account_entry::Column::DealId.eq(deal.id))
        .filter(account_entry::Column::AccountId.eq(leg.account_id))
        .one(db)
        .await?;

    let Some(entry) = existing else {
        // a freshly created second leg without an override adopts the link
        // minted by the first leg
        let link = leg
            .link_override
            .or(if is_first { None } else { inherited_link });
        let row = account_entry::ActiveModel {
            deal_id: Set(deal.id),
            account_id: Set(leg.account_id),
            amount: Set(leg.amount),
            friend_link_id: Set(link),
            ..Default::default()
        };
        let inserted = row.insert(db).await?;
        debug!(
            deal_id = deal.id,
            entry_id = inserted.id,
            account_id = leg.account_id,
            amount = leg.amount,
            "created entry"
        );
        return Ok(None);
    };

    // amount and date both unchanged: a pure no-op, the entry keeps its
    // identity and its link
    if entry.amount == leg.amount && prev_date == Some(deal.date) {
        return Ok(None);
    }

    // an amount or date change on a linked entry invalidates the pairing;
    // remember which account it pointed at so a rebuilt link prefers
    // reconnecting there
    let reconnect_hint = linked_entry(db, &entry)
        .await?
        .map(|paired| paired.account_id);

    let mut minted = None;
    let new_link = if !is_first && inherited_link.is_some() {
        if let Some(old) = entry.friend_link_id {
            sever_link(db, old).await?;
        }
        inherited_link
    } else if let Some(old) = entry.friend_link_id {
        sever_link(db, old).await?;
        let fresh = mint_link(db).await?;
        minted = Some(fresh);
        Some(fresh)
    } else {
        None
    };

    if let Some(account_id) = reconnect_hint {
        debug!(
            deal_id = deal.id,
            entry_id = entry.id,
            preferred_account_id = account_id,
            "rebuilding entry link; preferring previous counterpart account"
        );
    }

    let entry_id = entry.id;
    let mut active: account_entry::ActiveModel = entry.into();
    active.amount = Set(leg.amount);
    active.friend_link_id = Set(new_link);
    active.update(db).await?;
    debug!(
        deal_id = deal.id,
        entry_id,
        amount = leg.amount,
        "updated entry"
    );

    Ok(minted)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    use crate::entities::AssetType;
    use crate::entities::account;

    async fn three_accounts(
        db: &sea_orm::DatabaseConnection,
    ) -> Result<(account::Model, account::Model, account::Model)> {
        let a = create_test_account(db, "Wallet", AssetType::Ordinary).await?;
        let b = create_test_account(db, "Bank", AssetType::Ordinary).await?;
        let c = create_test_account(db, "Friend bank", AssetType::Ordinary).await?;
        Ok((a, b, c))
    }

    #[tokio::test]
    async fn test_entries_of_orders_by_account_id() -> Result<()> {
        let db = setup_test_db().await?;
        let (wallet, bank, _) = three_accounts(&db).await?;
        let deal = insert_bare_deal(&db, 1, "2024-04-01").await?;
        insert_bare_entry(&db, deal.id, bank.id, 5000, None).await?;
        insert_bare_entry(&db, deal.id, wallet.id, -5000, None).await?;

        let entries = entries_of(&db, deal.id).await?;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].account_id, wallet.id);
        assert_eq!(entries[1].account_id, bank.id);

        Ok(())
    }

    #[tokio::test]
    async fn test_linked_entry_finds_opposite_side() -> Result<()> {
        let db = setup_test_db().await?;
        let (wallet, bank, friend_bank) = three_accounts(&db).await?;
        let mine = insert_bare_deal(&db, 1, "2024-04-01").await?;
        let theirs = insert_bare_deal(&db, 2, "2024-04-01").await?;
        let link = insert_bare_link(&db).await?;

        let my_entry = insert_bare_entry(&db, mine.id, wallet.id, -5000, Some(link)).await?;
        // my own other leg shares the link and must not be returned
        insert_bare_entry(&db, mine.id, bank.id, 5000, Some(link)).await?;
        let their_entry = insert_bare_entry(&db, theirs.id, friend_bank.id, 5000, Some(link)).await?;

        let paired = linked_entry(&db, &my_entry).await?.unwrap();
        assert_eq!(paired.id, their_entry.id);

        Ok(())
    }

    #[tokio::test]
    async fn test_linked_entry_none_when_unlinked() -> Result<()> {
        let db = setup_test_db().await?;
        let (wallet, _, _) = three_accounts(&db).await?;
        let deal = insert_bare_deal(&db, 1, "2024-04-01").await?;
        let entry = insert_bare_entry(&db, deal.id, wallet.id, -5000, None).await?;

        assert!(linked_entry(&db, &entry).await?.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn test_destroy_entry_severs_link() -> Result<()> {
        let db = setup_test_db().await?;
        let (wallet, _, friend_bank) = three_accounts(&db).await?;
        let mine = insert_bare_deal(&db, 1, "2024-04-01").await?;
        let theirs = insert_bare_deal(&db, 2, "2024-04-01").await?;
        let link = insert_bare_link(&db).await?;
        let my_entry = insert_bare_entry(&db, mine.id, wallet.id, -5000, Some(link)).await?;
        let their_entry = insert_bare_entry(&db, theirs.id, friend_bank.id, 5000, Some(link)).await?;

        destroy_entry(&db, my_entry).await?;

        // the paired entry survives, unlinked instead of dangling
        let survivor = AccountEntry::find_by_id(their_entry.id)
            .one(&db)
            .await?
            .unwrap();
        assert_eq!(survivor.friend_link_id, None);
        assert!(FriendLink::find_by_id(link).one(&db).await?.is_none());

        Ok(())
    }
}
