//! Deal business logic - The reconciliation pipeline.
//!
//! A save runs `validate -> normalize -> reconcile -> derive_subordinates`
//! inside one database transaction; a delete destroys entries (severing their
//! friend links) and then children. There are no lifecycle hooks: previous
//! persisted state is passed into reconciliation explicitly, and the
//! (minus, plus, amount) intent is derived from the entries on demand rather
//! than cached anywhere.

use crate::{
    core::{account, entry},
    entities::{AssetType, Deal, account_entry, account_rule, deal},
    errors::{Error, Result, ValidationIssue},
};
use chrono::NaiveDate;
use sea_orm::{
    ConnectionTrait, DatabaseConnection, QueryOrder, Set, TransactionTrait, prelude::*,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

/// An amount as supplied by a caller: either ready minor units or text that
/// still carries grouping separators ("5,000").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AmountInput {
    /// Signed minor currency units
    Minor(i64),
    /// Text form, normalized before use
    Text(String),
}

/// A deal-shaped request: what the caller wants posted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DealInput {
    /// Account money moves out of
    pub minus_account_id: i64,
    /// Account money moves into
    pub plus_account_id: i64,
    /// Signed amount; positive debits the plus account
    pub amount: AmountInput,
    /// Posting date
    pub date: NaiveDate,
    /// Free-text summary
    pub summary: String,
    /// Owner of the ledger
    pub user_id: i64,
    /// Whether the user has confirmed the deal
    pub confirmed: bool,
    /// Friend link for the minus leg, when recording the second side of a transfer
    pub minus_link_id: Option<i64>,
    /// Friend link for the plus leg
    pub plus_link_id: Option<i64>,
}

/// The intent behind a persisted deal, derived from its two entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DealIntent {
    /// Account money moves out of
    pub minus_account_id: i64,
    /// Account money moves into
    pub plus_account_id: i64,
    /// Signed amount as posted on the plus side
    pub amount: i64,
}

/// Strips grouping separators out of a textual amount and parses it.
pub fn normalize_amount(input: &AmountInput) -> std::result::Result<i64, ValidationIssue> {
    match input {
        AmountInput::Minor(value) => Ok(*value),
        AmountInput::Text(text) => text
            .trim()
            .replace(',', "")
            .parse::<i64>()
            .map_err(|_| ValidationIssue::MalformedAmount { input: text.clone() }),
    }
}

fn check_pair(minus_account_id: i64, plus_account_id: i64, amount: i64) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    if minus_account_id == plus_account_id {
        issues.push(ValidationIssue::SameAccount {
            account_id: minus_account_id,
        });
    }
    if amount == 0 {
        issues.push(ValidationIssue::ZeroAmount);
    }
    issues
}

/// Validates a deal request, collecting every issue, and returns the
/// normalized amount. Nothing is persisted on failure.
pub fn validate(input: &DealInput) -> Result<i64> {
    let mut issues = Vec::new();
    let amount = match normalize_amount(&input.amount) {
        Ok(value) => Some(value),
        Err(issue) => {
            issues.push(issue);
            None
        }
    };
    issues.extend(check_pair(
        input.minus_account_id,
        input.plus_account_id,
        amount.unwrap_or(1),
    ));

    match amount {
        Some(value) if issues.is_empty() => Ok(value),
        _ => Err(Error::Validation { issues }),
    }
}

fn plan_for(input: &DealInput, amount: i64) -> entry::PostingPlan {
    entry::PostingPlan {
        minus_account_id: input.minus_account_id,
        plus_account_id: input.plus_account_id,
        amount,
        minus_link_id: input.minus_link_id,
        plus_link_id: input.plus_link_id,
    }
}

/// Creates a new deal: validates, posts the two entries, and derives any
/// rule-generated settlement children, all in one transaction.
#[instrument(skip(db, input))]
pub async fn create_deal(db: &DatabaseConnection, input: &DealInput) -> Result<deal::Model> {
    let amount = validate(input)?;

    let txn = db.begin().await?;

    // both sides must resolve before anything is written
    account::get_account(&txn, input.minus_account_id).await?;
    account::get_account(&txn, input.plus_account_id).await?;

    let row = deal::ActiveModel {
        user_id: Set(input.user_id),
        date: Set(input.date),
        summary: Set(input.summary.clone()),
        confirmed: Set(input.confirmed),
        parent_deal_id: Set(None),
        ..Default::default()
    };
    let created = row.insert(&txn).await?;

    let entries = entry::reconcile(&txn, &created, None, &plan_for(input, amount)).await?;
    derive_subordinates(&txn, &created, &entries).await?;

    txn.commit().await?;
    info!(deal_id = created.id, amount, "created deal");
    Ok(created)
}

/// Updates an existing deal against a fresh request.
///
/// Entries are reconciled against the previous persisted state (passed in
/// explicitly as the prior date and the rows already on the deal), and the
/// settlement children are cleared and regenerated wholesale.
#[instrument(skip(db, input))]
pub async fn update_deal(
    db: &DatabaseConnection,
    deal_id: i64,
    input: &DealInput,
) -> Result<deal::Model> {
    let amount = validate(input)?;

    let txn = db.begin().await?;

    let prior = Deal::find_by_id(deal_id)
        .one(&txn)
        .await?
        .ok_or(Error::DealNotFound { id: deal_id })?;
    let prev_date = prior.date;

    account::get_account(&txn, input.minus_account_id).await?;
    account::get_account(&txn, input.plus_account_id).await?;

    let mut active: deal::ActiveModel = prior.into();
    active.date = Set(input.date);
    active.summary = Set(input.summary.clone());
    active.confirmed = Set(input.confirmed);
    let updated = active.update(&txn).await?;

    // children are never patched in place
    destroy_children(&txn, updated.id).await?;
    let entries = entry::reconcile(&txn, &updated, Some(prev_date), &plan_for(input, amount)).await?;
    derive_subordinates(&txn, &updated, &entries).await?;

    txn.commit().await?;
    info!(deal_id = updated.id, amount, "updated deal");
    Ok(updated)
}

/// Destroys a deal: entries first (each severing its friend link), then the
/// settlement children, then the row itself.
#[instrument(skip(db))]
pub async fn destroy_deal(db: &DatabaseConnection, deal_id: i64) -> Result<()> {
    let txn = db.begin().await?;

    let existing = Deal::find_by_id(deal_id)
        .one(&txn)
        .await?
        .ok_or(Error::DealNotFound { id: deal_id })?;

    for e in entry::entries_of(&txn, existing.id).await? {
        entry::destroy_entry(&txn, e).await?;
    }
    destroy_children(&txn, existing.id).await?;
    existing.delete(&txn).await?;

    txn.commit().await?;
    info!(deal_id, "destroyed deal");
    Ok(())
}

/// Destroys every settlement child of a deal, entries first.
///
/// Subordinate deals never own children of their own, so one level covers the
/// whole subtree.
async fn destroy_children<C>(db: &C, parent_id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    for child in children_of(db, parent_id).await? {
        for e in entry::entries_of(db, child.id).await? {
            entry::destroy_entry(db, e).await?;
        }
        child.delete(db).await?;
    }
    Ok(())
}

/// Evaluates the settlement rule of each posted account and materializes one
/// subordinate deal per firing rule.
async fn derive_subordinates<C>(
    db: &C,
    parent: &deal::Model,
    entries: &[account_entry::Model],
) -> Result<()>
where
    C: ConnectionTrait,
{
    for posted in entries {
        let Some(rule) = account::rule_for(db, posted.account_id).await? else {
            continue;
        };
        let rule_account = account::get_account(db, rule.account_id).await?;
        // a credit card settles what left it, a receivable settles what
        // arrived; nothing else fires
        let fires = match rule_account.asset_type {
            AssetType::CreditCard => posted.amount < 0,
            AssetType::CreditReceivable => posted.amount > 0,
            AssetType::Ordinary => false,
        };
        if fires {
            save_subordinate(db, parent, &rule, posted.amount).await?;
        }
    }
    Ok(())
}

/// Posts one rule-generated settlement deal under a parent.
///
/// Runs the same pair validation and entry reconciliation as a top-level
/// deal, but never derives children of its own. A failure here (e.g. a rule
/// routing an account to itself) aborts the parent's whole save.
async fn save_subordinate<C>(
    db: &C,
    parent: &deal::Model,
    rule: &account_rule::Model,
    amount: i64,
) -> Result<deal::Model>
where
    C: ConnectionTrait,
{
    let issues = check_pair(rule.account_id, rule.associated_account_id, amount);
    if !issues.is_empty() {
        return Err(Error::Validation { issues });
    }
    account::get_account(db, rule.associated_account_id).await?;

    let row = deal::ActiveModel {
        user_id: Set(parent.user_id),
        date: Set(account::payment_date(rule, parent.date)),
        summary: Set(String::new()),
        confirmed: Set(false),
        parent_deal_id: Set(Some(parent.id)),
        ..Default::default()
    };
    let child = row.insert(db).await?;

    let plan = entry::PostingPlan {
        minus_account_id: rule.account_id,
        plus_account_id: rule.associated_account_id,
        amount,
        minus_link_id: None,
        plus_link_id: None,
    };
    entry::reconcile(db, &child, None, &plan).await?;

    info!(
        parent_deal_id = parent.id,
        child_deal_id = child.id,
        amount,
        "derived settlement deal"
    );
    Ok(child)
}

/// Finds a deal by id, failing with [`Error::DealNotFound`] when absent.
pub async fn get_deal<C>(db: &C, deal_id: i64) -> Result<deal::Model>
where
    C: ConnectionTrait,
{
    Deal::find_by_id(deal_id)
        .one(db)
        .await?
        .ok_or(Error::DealNotFound { id: deal_id })
}

/// Returns a deal's settlement children in child order (ascending id).
pub async fn children_of<C>(db: &C, parent_id: i64) -> Result<Vec<deal::Model>>
where
    C: ConnectionTrait,
{
    Deal::find()
        .filter(deal::Column::ParentDealId.eq(parent_id))
        .order_by_asc(deal::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Returns the deal's entry posting against `account_id`, if any.
pub async fn entry_for<C>(
    db: &C,
    deal_id: i64,
    account_id: i64,
) -> Result<Option<account_entry::Model>>
where
    C: ConnectionTrait,
{
    Ok(entry::entries_of(db, deal_id)
        .await?
        .into_iter()
        .find(|e| e.account_id == account_id))
}

/// True iff either of the deal's entries posts against `account_id`.
pub async fn contains_account<C>(db: &C, deal_id: i64, account_id: i64) -> Result<bool>
where
    C: ConnectionTrait,
{
    Ok(entry_for(db, deal_id, account_id).await?.is_some())
}

/// Returns the first settlement child containing `account_id`, if any.
pub async fn child_containing<C>(
    db: &C,
    parent_id: i64,
    account_id: i64,
) -> Result<Option<deal::Model>>
where
    C: ConnectionTrait,
{
    for child in children_of(db, parent_id).await? {
        if contains_account(db, child.id, account_id).await? {
            return Ok(Some(child));
        }
    }
    Ok(None)
}

/// Derives the (minus, plus, amount) intent from a deal's persisted entries.
///
/// Pure: entries ordered by account id ascending, the first is the minus
/// side, the second the plus side carrying the signed amount. Swapped-and-
/// negated representations of the same deal derive to equivalent intents.
pub fn derive_intent(entries: &[account_entry::Model]) -> Result<DealIntent> {
    if entries.len() != 2 {
        let deal_id = entries.first().map_or(0, |e| e.deal_id);
        error!(
            deal_id,
            count = entries.len(),
            "deal does not have exactly two entries"
        );
        return Err(Error::EntryCountViolation {
            deal_id,
            count: entries.len(),
        });
    }
    let mut pair = [&entries[0], &entries[1]];
    pair.sort_by_key(|e| e.account_id);
    Ok(DealIntent {
        minus_account_id: pair[0].account_id,
        plus_account_id: pair[1].account_id,
        amount: pair[1].amount,
    })
}
